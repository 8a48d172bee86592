use std::io::{self, Read, Seek, SeekFrom};

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::progress::{Progress, ProgressReporter};
use crate::core::io::traits::TrajectoryFormat;
use crate::core::models::frame::FrameIndexEntry;

/// How a scan over the file ended.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanStatus {
    /// Every byte of the file belongs to an indexed frame.
    #[default]
    Complete,
    /// Scanning stopped at `offset` because the data there could not be parsed as a frame.
    Truncated { offset: u64, reason: String },
}

impl ScanStatus {
    pub fn is_truncated(&self) -> bool {
        matches!(self, ScanStatus::Truncated { .. })
    }
}

/// Ordered table of frame locations together with how the scan that built it ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameIndex {
    entries: Vec<FrameIndexEntry>,
    status: ScanStatus,
    file_size: u64,
}

impl FrameIndex {
    pub fn entries(&self) -> &[FrameIndexEntry] {
        &self.entries
    }

    pub fn get(&self, frame_number: u64) -> Option<&FrameIndexEntry> {
        usize::try_from(frame_number)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self) -> &ScanStatus {
        &self.status
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

/// Walks the file frame by frame, reading only the header bytes needed to learn each frame's
/// size, and records where every frame lives.
///
/// Unparseable data ends the scan without an error: the frames collected so far form the index
/// and the returned [`ScanStatus`] records where and why scanning stopped. Only genuine I/O
/// failures are returned as errors.
pub fn scan<F, R>(
    source: &mut R,
    file_size: u64,
    reporter: &ProgressReporter,
) -> io::Result<FrameIndex>
where
    F: TrajectoryFormat,
    R: Read + Seek,
{
    reporter.report(Progress::ScanStart {
        total_bytes: file_size,
    });

    let mut entries = Vec::new();
    let mut header = vec![0u8; F::MAX_HEADER_LEN];
    let mut offset = 0u64;

    let status = loop {
        if offset >= file_size {
            break ScanStatus::Complete;
        }

        let want = (file_size - offset).min(F::MAX_HEADER_LEN as u64) as usize;
        source.seek(SeekFrom::Start(offset))?;
        source.read_exact(&mut header[..want])?;

        let probe = match F::probe_frame(&header[..want]) {
            Ok(probe) => probe,
            Err(e) => {
                break ScanStatus::Truncated {
                    offset,
                    reason: e.to_string(),
                };
            }
        };

        let end = offset.saturating_add(probe.size);
        if end > file_size {
            break ScanStatus::Truncated {
                offset,
                reason: format!(
                    "frame of {} bytes extends past the end of the file",
                    probe.size
                ),
            };
        }
        let Some(size) = u32::try_from(probe.size).ok().filter(|&s| s > 0) else {
            break ScanStatus::Truncated {
                offset,
                reason: format!("unusable frame size {}", probe.size),
            };
        };

        trace!(
            frame = entries.len(),
            offset,
            size,
            time = probe.time,
            atoms = probe.atom_count,
            "Indexed frame."
        );
        entries.push(FrameIndexEntry {
            frame_number: entries.len() as u64,
            offset,
            size,
            time: probe.time,
            atom_count: probe.atom_count,
        });
        offset = end;
        reporter.report(Progress::ScanAdvance { offset });
    };

    match &status {
        ScanStatus::Complete => debug!(
            format = F::NAME,
            frames = entries.len(),
            "Scan reached end of file."
        ),
        ScanStatus::Truncated { offset, reason } => warn!(
            format = F::NAME,
            frames = entries.len(),
            offset,
            file_size,
            "Indexing stopped before end of file: {}",
            reason
        ),
    }

    if let Some(first) = entries.first() {
        let differing = entries
            .iter()
            .filter(|e| e.atom_count != first.atom_count)
            .count();
        if differing > 0 {
            warn!(
                expected = first.atom_count,
                differing, "Atom count varies between frames."
            );
        }
    }

    reporter.report(Progress::ScanFinish {
        frames: entries.len() as u64,
    });
    Ok(FrameIndex {
        entries,
        status,
        file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::fixtures::{TrrFixture, XtcFixture, xtc_frame};
    use crate::core::io::trr::Trr;
    use crate::core::io::xtc::Xtc;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    fn trr_frames(n: usize) -> Vec<Vec<u8>> {
        (0..n)
            .map(|i| {
                TrrFixture {
                    step: i as i32 * 10,
                    time: i as f64 * 2.0,
                    box_nm: Some([2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]),
                    coords_nm: vec![[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]],
                    velocities: i % 2 == 1,
                    double: false,
                }
                .to_bytes()
            })
            .collect()
    }

    fn xtc_frames(n: usize, atoms: usize) -> Vec<Vec<u8>> {
        (0..n)
            .map(|i| {
                xtc_frame(&XtcFixture {
                    step: i as i32,
                    time: i as f32,
                    box_nm: [4.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0],
                    coords_nm: (0..atoms)
                        .map(|a| [a as f32 * 0.1, 0.5 + i as f32 * 0.01, 1.0])
                        .collect(),
                    precision: 1000.0,
                })
            })
            .collect()
    }

    fn run<F: TrajectoryFormat>(bytes: Vec<u8>) -> FrameIndex {
        let len = bytes.len() as u64;
        scan::<F, _>(&mut Cursor::new(bytes), len, &ProgressReporter::new()).unwrap()
    }

    #[test]
    fn trr_scan_indexes_contiguous_frames() {
        let frames = trr_frames(3);
        let index = run::<Trr>(frames.concat());

        assert_eq!(index.len(), 3);
        assert_eq!(index.status(), &ScanStatus::Complete);
        let entries = index.entries();
        for (i, pair) in entries.windows(2).enumerate() {
            assert_eq!(pair[1].offset, pair[0].end(), "gap after frame {}", i);
        }
        assert_eq!(entries[1].size as usize, frames[1].len());
        assert_eq!(entries[2].time, 4.0);
        assert!(entries.iter().all(|e| e.atom_count == 2));
    }

    #[test]
    fn xtc_scan_handles_plain_and_compressed_frames() {
        let plain = run::<Xtc>(xtc_frames(4, 3).concat());
        assert_eq!(plain.len(), 4);
        assert_eq!(plain.status(), &ScanStatus::Complete);

        let compressed = run::<Xtc>(xtc_frames(5, 25).concat());
        assert_eq!(compressed.len(), 5);
        assert_eq!(compressed.get(4).unwrap().time, 4.0);
        assert_eq!(compressed.get(4).unwrap().end(), compressed.file_size());
    }

    #[test]
    fn trailing_garbage_stops_scan_and_is_recorded() {
        let mut bytes = xtc_frames(3, 12).concat();
        let good_len = bytes.len() as u64;
        bytes.extend_from_slice(&[0xab; 64]);

        let index = run::<Xtc>(bytes);
        assert_eq!(index.len(), 3);
        match index.status() {
            ScanStatus::Truncated { offset, reason } => {
                assert_eq!(*offset, good_len);
                assert!(reason.contains("magic"));
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn partial_final_frame_is_not_indexed() {
        let frames = trr_frames(3);
        let mut bytes = frames.concat();
        bytes.truncate(bytes.len() - 10);

        let index = run::<Trr>(bytes);
        assert_eq!(index.len(), 2);
        assert!(index.status().is_truncated());
    }

    #[test]
    fn short_final_frame_smaller_than_header_window_is_indexed() {
        let frames = xtc_frames(2, 1);
        assert!(frames[1].len() < Xtc::MAX_HEADER_LEN);
        let index = run::<Xtc>(frames.concat());
        assert_eq!(index.len(), 2);
        assert_eq!(index.status(), &ScanStatus::Complete);
    }

    #[test]
    fn empty_file_yields_empty_complete_index() {
        let index = run::<Trr>(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.status(), &ScanStatus::Complete);
    }

    #[test]
    fn scan_reports_progress_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p: Progress| {
            sink.lock().unwrap().push(p);
        }));
        let bytes = trr_frames(2).concat();
        let len = bytes.len() as u64;
        scan::<Trr, _>(&mut Cursor::new(bytes), len, &reporter).unwrap();

        let events = events.lock().unwrap();
        assert!(matches!(events[0], Progress::ScanStart { total_bytes } if total_bytes == len));
        assert!(matches!(events[2], Progress::ScanAdvance { offset } if offset == len));
        assert!(matches!(events[3], Progress::ScanFinish { frames: 2 }));
    }
}
