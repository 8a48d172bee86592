//! # Provider Module
//!
//! The public entry point of the library. [`TrajectoryProvider`] inspects the file extension
//! once, at construction, and wraps the matching [`StreamingReader`] behind the
//! [`TrajectoryReader`] interface so callers never deal with format-specific types.
//!
//! ```no_run
//! use trajstream::engine::reader::TrajectoryReader;
//! use trajstream::provider::TrajectoryProvider;
//!
//! # fn main() -> Result<(), trajstream::engine::error::TrajectoryError> {
//! let mut provider = TrajectoryProvider::new("run/md.xtc")?.with_topology("run/md.gro");
//! let info = provider.info()?;
//! let last = provider.frame(info.frame_count - 1)?;
//! println!("{} atoms at t = {} ps", last.count, last.time);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::core::io::traits::TrajectoryFormat;
use crate::core::io::trr::Trr;
use crate::core::io::xtc::Xtc;
use crate::core::models::frame::FrameData;
use crate::core::models::info::TrajectoryInfo;
use crate::engine::config::ReaderConfig;
use crate::engine::error::TrajectoryError;
use crate::engine::indexer::ScanStatus;
use crate::engine::progress::ProgressReporter;
use crate::engine::reader::{ReaderStats, StreamingReader, TrajectoryReader};

/// Trajectory file formats understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrajectoryFormatKind {
    /// Full-precision trajectory (`.trr`).
    Trr,
    /// Compressed trajectory (`.xtc`).
    Xtc,
}

impl TrajectoryFormatKind {
    /// Detects the format from the file extension, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::UnsupportedFormat`] for any other extension, including none.
    pub fn from_path(path: &Path) -> Result<Self, TrajectoryError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if extension == Trr::EXTENSION {
            Ok(Self::Trr)
        } else if extension == Xtc::EXTENSION {
            Ok(Self::Xtc)
        } else {
            Err(TrajectoryError::UnsupportedFormat { extension })
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Trr => Trr::EXTENSION,
            Self::Xtc => Xtc::EXTENSION,
        }
    }
}

impl fmt::Display for TrajectoryFormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trr => Trr::NAME,
            Self::Xtc => Xtc::NAME,
        };
        f.write_str(name)
    }
}

enum FormatReader {
    Trr(StreamingReader<Trr>),
    Xtc(StreamingReader<Xtc>),
}

macro_rules! dispatch {
    ($reader:expr, $r:ident => $body:expr) => {
        match $reader {
            FormatReader::Trr($r) => $body,
            FormatReader::Xtc($r) => $body,
        }
    };
}

/// Format-agnostic access to a trajectory file and its optional topology companion.
///
/// Construction performs no I/O; the file is opened and indexed on the first call that needs it.
pub struct TrajectoryProvider {
    topology_path: Option<PathBuf>,
    kind: TrajectoryFormatKind,
    reader: FormatReader,
}

impl TrajectoryProvider {
    /// Creates a provider with the default [`ReaderConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::UnsupportedFormat`] if the extension is neither `.trr` nor
    /// `.xtc`. The file itself is not touched.
    pub fn new(coordinates_path: impl Into<PathBuf>) -> Result<Self, TrajectoryError> {
        Self::with_config(coordinates_path, ReaderConfig::default())
    }

    /// Creates a provider with an explicit reader configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::UnsupportedFormat`] for unknown extensions.
    pub fn with_config(
        coordinates_path: impl Into<PathBuf>,
        config: ReaderConfig,
    ) -> Result<Self, TrajectoryError> {
        let path = coordinates_path.into();
        let kind = TrajectoryFormatKind::from_path(&path)?;
        debug!(path = %path.display(), format = %kind, "Selected trajectory reader.");
        let reader = match kind {
            TrajectoryFormatKind::Trr => FormatReader::Trr(StreamingReader::new(path, config)),
            TrajectoryFormatKind::Xtc => FormatReader::Xtc(StreamingReader::new(path, config)),
        };
        Ok(Self {
            topology_path: None,
            kind,
            reader,
        })
    }

    /// Records the structure file (`.gro`, `.pdb`, ...) that accompanies the trajectory.
    pub fn with_topology(mut self, topology_path: impl Into<PathBuf>) -> Self {
        self.topology_path = Some(topology_path.into());
        self
    }

    /// Forwards scan progress events to `reporter`.
    pub fn with_progress(self, reporter: ProgressReporter<'static>) -> Self {
        let reader = match self.reader {
            FormatReader::Trr(r) => FormatReader::Trr(r.with_progress(reporter)),
            FormatReader::Xtc(r) => FormatReader::Xtc(r.with_progress(reporter)),
        };
        Self { reader, ..self }
    }

    pub fn format(&self) -> TrajectoryFormatKind {
        self.kind
    }

    pub fn coordinates_path(&self) -> &Path {
        dispatch!(&self.reader, r => r.path())
    }

    pub fn topology_path(&self) -> Option<&Path> {
        self.topology_path.as_deref()
    }

    pub fn config(&self) -> &ReaderConfig {
        dispatch!(&self.reader, r => r.config())
    }
}

impl TrajectoryReader for TrajectoryProvider {
    fn initialize(&mut self) -> Result<(), TrajectoryError> {
        dispatch!(&mut self.reader, r => r.initialize())
    }

    fn info(&mut self) -> Result<TrajectoryInfo, TrajectoryError> {
        dispatch!(&mut self.reader, r => r.info())
    }

    fn frame(&mut self, frame_number: u64) -> Result<Arc<FrameData>, TrajectoryError> {
        dispatch!(&mut self.reader, r => r.frame(frame_number))
    }

    fn close(&mut self) -> Result<(), TrajectoryError> {
        dispatch!(&mut self.reader, r => r.close())
    }

    fn scan_status(&self) -> Option<&ScanStatus> {
        dispatch!(&self.reader, r => r.scan_status())
    }

    fn stats(&self) -> ReaderStats {
        dispatch!(&self.reader, r => r.stats())
    }
}
