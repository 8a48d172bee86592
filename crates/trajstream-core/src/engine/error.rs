use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::error::DecodeError;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("I/O error on '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported trajectory format: '{extension}' (expected .trr or .xtc)")]
    UnsupportedFormat { extension: String },

    #[error("Trajectory file is not open; call initialize() first")]
    NotOpen,

    #[error("No frames found in trajectory file '{path}'", path = path.display())]
    EmptyTrajectory { path: PathBuf },

    #[error("Frame {requested} out of range [0, {frame_count}) ({frame_count} frames indexed)")]
    FrameOutOfRange { requested: u64, frame_count: u64 },

    #[error("Invalid frame range: start {start} is after end {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("Read beyond end of file: offset={offset}, length={len}, file size={file_size}")]
    ReadBeyondEof {
        offset: u64,
        len: u64,
        file_size: u64,
    },

    #[error("Failed to decode {format} frame {frame} at byte offset {offset}: {source}")]
    Decode {
        format: &'static str,
        frame: u64,
        offset: u64,
        #[source]
        source: DecodeError,
    },

    #[error(
        "Indexing of '{path}' stopped at byte {offset} of {file_size} after {frames} frame(s): {reason}",
        path = path.display()
    )]
    TruncatedIndex {
        path: PathBuf,
        frames: u64,
        offset: u64,
        file_size: u64,
        reason: String,
    },

    #[error("Invalid reader configuration: {0}")]
    Config(#[from] ConfigError),
}
