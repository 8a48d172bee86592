use super::frame::FrameIndexEntry;
use serde::Serialize;

/// Time steps larger than this are treated as corrupted timestamps.
const MAX_PLAUSIBLE_DELTA: f64 = 1e10;
const DEFAULT_DELTA_TIME: f64 = 1.0;

/// Summary of an indexed trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryInfo {
    pub frame_count: u64,
    pub atom_count: u32,
    /// Time of frame 0.
    pub time_offset: f64,
    pub delta_time: f64,
    pub times: Vec<f64>,
    /// Whether indexing stopped at corrupt or truncated data before end-of-file.
    pub truncated: bool,
}

impl TrajectoryInfo {
    /// Derives the summary from an index table; `None` when the table is empty.
    pub fn from_index(entries: &[FrameIndexEntry], truncated: bool) -> Option<Self> {
        let first = entries.first()?;
        let times: Vec<f64> = entries.iter().map(|e| e.time).collect();
        Some(Self {
            frame_count: entries.len() as u64,
            atom_count: first.atom_count,
            time_offset: first.time,
            delta_time: estimate_delta_time(&times),
            times,
            truncated,
        })
    }
}

/// Time step from the first two frames, falling back to the mean step over the whole trajectory
/// when early timestamps are garbage.
pub fn estimate_delta_time(times: &[f64]) -> f64 {
    if times.len() < 2 {
        return 0.0;
    }
    let delta = times[1] - times[0];
    if delta.is_finite() && delta.abs() <= MAX_PLAUSIBLE_DELTA {
        return delta;
    }
    let span = times[times.len() - 1] - times[0];
    if span.is_finite() && span >= 0.0 {
        span / (times.len() - 1) as f64
    } else {
        DEFAULT_DELTA_TIME
    }
}
