//! # trajstream Core Library
//!
//! Streaming, random-access decoding of GROMACS molecular-dynamics trajectories (TRR and XTC)
//! that never loads a whole file into memory.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`FrameData`, `FrameIndexEntry`,
//!   `TrajectoryInfo`) and the binary codecs: a big-endian byte cursor, the XTC bitstream
//!   decoder, and one frame codec per file format.
//!
//! - **[`engine`]: The Logic Core.** The stateful machinery that turns codecs into random access:
//!   the frame indexer, the bounded LRU frame cache and the per-format `StreamingReader` that owns
//!   the open file handle.
//!
//! - **[`provider`]: The Public API.** `TrajectoryProvider` selects the right reader from the file
//!   extension and exposes a single interface to callers such as viewers or command-line tools.

pub mod core;
pub mod engine;
pub mod provider;
