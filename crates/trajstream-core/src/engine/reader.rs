use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::cache::LruCache;
use super::config::{IndexPolicy, ReaderConfig};
use super::error::TrajectoryError;
use super::indexer::{self, FrameIndex, ScanStatus};
use super::progress::{Progress, ProgressReporter};
use crate::core::io::traits::TrajectoryFormat;
use crate::core::models::frame::{FrameData, FrameIndexEntry};
use crate::core::models::info::TrajectoryInfo;

/// Counters describing how frame requests were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    /// Frames decoded from disk.
    pub decodes: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// Random access to the frames of one trajectory file.
///
/// Every operation takes `&mut self`, so calls on a single reader are serialised by the borrow
/// checker: initialisation can never race and no two decodes share scratch state.
pub trait TrajectoryReader {
    /// Opens the file and builds the frame index.
    ///
    /// Idempotent: once the reader is open, further calls return immediately without touching
    /// the file.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::Io`] if the file cannot be opened or read, and
    /// [`TrajectoryError::TruncatedIndex`] when the strict index policy is configured and the
    /// scan stopped before end-of-file.
    fn initialize(&mut self) -> Result<(), TrajectoryError>;

    /// Summarises the indexed trajectory, initialising the reader first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::EmptyTrajectory`] when no frame could be indexed, or any error
    /// from [`initialize`](Self::initialize).
    fn info(&mut self) -> Result<TrajectoryInfo, TrajectoryError>;

    /// Returns frame `frame_number`, decoding it on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::FrameOutOfRange`] for indices outside `0..frame_count`, and
    /// [`TrajectoryError::Decode`] if the frame bytes are corrupt.
    fn frame(&mut self, frame_number: u64) -> Result<Arc<FrameData>, TrajectoryError>;

    /// Fetches the requested frames in the given order.
    fn frames(&mut self, frame_numbers: &[u64]) -> Result<Vec<Arc<FrameData>>, TrajectoryError> {
        frame_numbers.iter().map(|&n| self.frame(n)).collect()
    }

    /// Fetches frames `start..=end` in ascending order.
    fn frame_range(
        &mut self,
        start: u64,
        end: u64,
    ) -> Result<Vec<Arc<FrameData>>, TrajectoryError> {
        if start > end {
            return Err(TrajectoryError::InvalidRange { start, end });
        }
        (start..=end).map(|n| self.frame(n)).collect()
    }

    /// Releases the file handle and drops the index and all cached frames.
    ///
    /// The reader can be initialised again afterwards.
    fn close(&mut self) -> Result<(), TrajectoryError>;

    /// How the index scan ended, or `None` while the reader is not open.
    fn scan_status(&self) -> Option<&ScanStatus>;

    fn stats(&self) -> ReaderStats;
}

struct OpenTrajectory {
    file: File,
    index: FrameIndex,
}

/// Reader for a single trajectory file in format `F`.
///
/// The file stays open between calls; each frame request reads exactly the bytes of that frame
/// at the offset recorded by the indexer.
pub struct StreamingReader<F: TrajectoryFormat> {
    path: PathBuf,
    config: ReaderConfig,
    open: Option<OpenTrajectory>,
    cache: LruCache<u64, Arc<FrameData>>,
    stats: ReaderStats,
    reporter: ProgressReporter<'static>,
    _format: PhantomData<fn() -> F>,
}

impl<F: TrajectoryFormat> StreamingReader<F> {
    pub fn new(path: impl Into<PathBuf>, config: ReaderConfig) -> Self {
        Self {
            path: path.into(),
            cache: LruCache::new(config.cache_capacity),
            config,
            open: None,
            stats: ReaderStats::default(),
            reporter: ProgressReporter::new(),
            _format: PhantomData,
        }
    }

    /// Attaches a progress reporter that receives scan events during
    /// [`initialize`](TrajectoryReader::initialize).
    pub fn with_progress(mut self, reporter: ProgressReporter<'static>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// The frame index of the open file.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::NotOpen`] if the reader has not been initialised or was closed.
    pub fn index(&self) -> Result<&FrameIndex, TrajectoryError> {
        self.open
            .as_ref()
            .map(|open| &open.index)
            .ok_or(TrajectoryError::NotOpen)
    }

    fn io_error(&self, source: io::Error) -> TrajectoryError {
        TrajectoryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_frame_bytes(&mut self, entry: &FrameIndexEntry) -> Result<Vec<u8>, TrajectoryError> {
        let open = self.open.as_mut().ok_or(TrajectoryError::NotOpen)?;
        let file_size = open.index.file_size();
        if entry.end() > file_size {
            return Err(TrajectoryError::ReadBeyondEof {
                offset: entry.offset,
                len: u64::from(entry.size),
                file_size,
            });
        }

        let mut buffer = vec![0u8; entry.size as usize];
        let result = open
            .file
            .seek(SeekFrom::Start(entry.offset))
            .and_then(|_| open.file.read_exact(&mut buffer));
        result.map_err(|e| self.io_error(e))?;
        Ok(buffer)
    }
}

impl<F: TrajectoryFormat> TrajectoryReader for StreamingReader<F> {
    #[instrument(skip_all, name = "initialize", fields(format = F::NAME, path = %self.path.display()))]
    fn initialize(&mut self) -> Result<(), TrajectoryError> {
        if self.open.is_some() {
            return Ok(());
        }
        self.config.validate()?;

        let mut file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let file_size = file.metadata().map_err(|e| self.io_error(e))?.len();
        let index = indexer::scan::<F, _>(&mut file, file_size, &self.reporter)
            .map_err(|e| self.io_error(e))?;

        if let ScanStatus::Truncated { offset, reason } = index.status() {
            if self.config.index_policy == IndexPolicy::Strict {
                return Err(TrajectoryError::TruncatedIndex {
                    path: self.path.clone(),
                    frames: index.len(),
                    offset: *offset,
                    file_size,
                    reason: reason.clone(),
                });
            }
            self.reporter.report(Progress::Message(format!(
                "Indexing stopped at byte {} of {}",
                offset, file_size
            )));
        }

        info!(frames = index.len(), file_size, "Trajectory opened and indexed.");
        self.open = Some(OpenTrajectory { file, index });
        Ok(())
    }

    fn info(&mut self) -> Result<TrajectoryInfo, TrajectoryError> {
        self.initialize()?;
        let index = self.index()?;
        TrajectoryInfo::from_index(index.entries(), index.status().is_truncated()).ok_or_else(
            || TrajectoryError::EmptyTrajectory {
                path: self.path.clone(),
            },
        )
    }

    #[instrument(skip(self), fields(format = F::NAME))]
    fn frame(&mut self, frame_number: u64) -> Result<Arc<FrameData>, TrajectoryError> {
        self.initialize()?;
        let index = self.index()?;
        let entry = *index
            .get(frame_number)
            .ok_or(TrajectoryError::FrameOutOfRange {
                requested: frame_number,
                frame_count: index.len(),
            })?;

        if let Some(frame) = self.cache.get(&frame_number) {
            self.stats.cache_hits += 1;
            debug!("Cache hit.");
            return Ok(frame);
        }
        self.stats.cache_misses += 1;

        let bytes = self.read_frame_bytes(&entry)?;
        let frame = F::decode_frame(&bytes, frame_number).map_err(|source| {
            TrajectoryError::Decode {
                format: F::NAME,
                frame: frame_number,
                offset: entry.offset,
                source,
            }
        })?;
        self.stats.decodes += 1;
        debug!(size = entry.size, atoms = frame.count, "Decoded frame.");

        let frame = Arc::new(frame);
        if let Some(evicted) = self.cache.set(frame_number, Arc::clone(&frame)) {
            debug!(evicted, cached = self.cache.len(), "Evicted least recently used frame.");
        }
        Ok(frame)
    }

    fn close(&mut self) -> Result<(), TrajectoryError> {
        if self.open.take().is_some() {
            debug!(path = %self.path.display(), "Closed trajectory.");
        }
        self.cache.clear();
        Ok(())
    }

    fn scan_status(&self) -> Option<&ScanStatus> {
        self.open.as_ref().map(|open| open.index.status())
    }

    fn stats(&self) -> ReaderStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::fixtures::{TrrFixture, XtcFixture, xtc_frame};
    use crate::core::io::trr::Trr;
    use crate::core::io::xtc::Xtc;
    use crate::engine::config::{ConfigError, ReaderConfigBuilder};
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const IDENTITY_2NM: [f64; 9] = [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0];

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    fn trr_bytes(frames: usize) -> Vec<u8> {
        (0..frames)
            .map(|i| {
                TrrFixture {
                    step: i as i32,
                    time: i as f64 * 0.5,
                    box_nm: Some(IDENTITY_2NM),
                    coords_nm: vec![[0.1, 0.2, 0.3 + i as f64 * 0.1], [1.0, 1.1, 1.2]],
                    velocities: false,
                    double: false,
                }
                .to_bytes()
            })
            .collect::<Vec<_>>()
            .concat()
    }

    fn xtc_bytes(frames: usize, atoms: usize) -> Vec<u8> {
        (0..frames)
            .map(|i| {
                xtc_frame(&XtcFixture {
                    step: i as i32,
                    time: i as f32 * 2.0,
                    box_nm: [3.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 3.0],
                    coords_nm: (0..atoms)
                        .map(|a| [0.5 + a as f32 * 0.002, 1.0 + i as f32 * 0.1, 2.0])
                        .collect(),
                    precision: 1000.0,
                })
            })
            .collect::<Vec<_>>()
            .concat()
    }

    fn trr_reader(dir: &TempDir, frames: usize, config: ReaderConfig) -> StreamingReader<Trr> {
        StreamingReader::new(write(dir, "traj.trr", &trr_bytes(frames)), config)
    }

    #[test]
    fn small_trr_fixture_converts_box_to_angstrom() {
        let dir = tempdir().unwrap();
        let mut reader = trr_reader(&dir, 3, ReaderConfig::default());

        let info = reader.info().unwrap();
        assert_eq!(info.frame_count, 3);
        assert_eq!(info.atom_count, 2);
        assert_eq!(info.delta_time, 0.5);
        assert!(!info.truncated);
        assert!(info.times.windows(2).all(|w| w[0] <= w[1]));

        for n in 0..3 {
            let frame = reader.frame(n).unwrap();
            assert_eq!(frame.box_vectors[0], 20.0);
            assert_eq!(frame.count, info.atom_count);
            assert_eq!(frame.frame_number, n);
        }
        assert_eq!(reader.index().unwrap().len(), info.frame_count);
    }

    #[test]
    fn frame_range_is_inclusive_and_ordered() {
        let dir = tempdir().unwrap();
        let mut reader = trr_reader(&dir, 6, ReaderConfig::default());

        let frames = reader.frame_range(2, 4).unwrap();
        let numbers: Vec<u64> = frames.iter().map(|f| f.frame_number).collect();
        assert_eq!(numbers, vec![2, 3, 4]);

        let picked = reader.frames(&[5, 0, 3]).unwrap();
        let numbers: Vec<u64> = picked.iter().map(|f| f.frame_number).collect();
        assert_eq!(numbers, vec![5, 0, 3]);

        assert!(matches!(
            reader.frame_range(4, 2),
            Err(TrajectoryError::InvalidRange { start: 4, end: 2 })
        ));
    }

    #[test]
    fn out_of_range_requests_report_frame_count() {
        let dir = tempdir().unwrap();
        let mut reader = trr_reader(&dir, 3, ReaderConfig::default());

        for requested in [3, u64::MAX] {
            match reader.frame(requested) {
                Err(TrajectoryError::FrameOutOfRange {
                    requested: r,
                    frame_count,
                }) => {
                    assert_eq!(r, requested);
                    assert_eq!(frame_count, 3);
                }
                other => panic!("expected out-of-range error, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn hand_built_zero_capacity_config_fails_initialisation() {
        let dir = tempdir().unwrap();
        let config = ReaderConfig {
            cache_capacity: 0,
            ..ReaderConfig::default()
        };
        let mut reader = trr_reader(&dir, 2, config);

        assert!(matches!(
            reader.initialize(),
            Err(TrajectoryError::Config(ConfigError::InvalidParameter {
                name: "cache_capacity",
                ..
            }))
        ));
        assert!(matches!(reader.frame(0), Err(TrajectoryError::Config(_))));
    }

    #[test]
    fn maximal_cache_capacity_opens_and_caches() {
        let dir = tempdir().unwrap();
        let config = ReaderConfigBuilder::new()
            .cache_capacity(usize::MAX)
            .build()
            .unwrap();
        let mut reader = trr_reader(&dir, 2, config);

        reader.frame(0).unwrap();
        reader.frame(0).unwrap();
        assert_eq!(reader.stats().cache_hits, 1);
    }

    #[test]
    fn repeated_requests_return_identical_data_from_cache() {
        let dir = tempdir().unwrap();
        let mut reader = trr_reader(&dir, 3, ReaderConfig::default());

        let first = reader.frame(1).unwrap();
        let second = reader.frame(1).unwrap();
        assert_eq!(first.x, second.x);
        assert_eq!(first.y, second.y);
        assert_eq!(first.z, second.z);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            reader.stats(),
            ReaderStats {
                decodes: 1,
                cache_hits: 1,
                cache_misses: 1
            }
        );
    }

    #[test]
    fn least_recently_used_frame_is_decoded_again() {
        let k = 3u64;
        let dir = tempdir().unwrap();
        let config = ReaderConfigBuilder::new()
            .cache_capacity(k as usize)
            .build()
            .unwrap();
        let mut reader = trr_reader(&dir, 5, config);

        for n in 0..=k {
            reader.frame(n).unwrap();
        }
        assert_eq!(reader.stats().decodes, k + 1);

        reader.frame(0).unwrap();
        assert_eq!(reader.stats().decodes, k + 2);

        reader.frame(k).unwrap();
        assert_eq!(reader.stats().decodes, k + 2);
        assert_eq!(reader.stats().cache_hits, 1);
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut reader = trr_reader(&dir, 2, ReaderConfig::default());
        reader.initialize().unwrap();
        let before = reader.index().unwrap().clone();

        fs::write(reader.path(), trr_bytes(5)).unwrap();
        reader.initialize().unwrap();
        assert_eq!(reader.index().unwrap(), &before);
    }

    #[test]
    fn compressed_xtc_frames_decode_within_precision() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "traj.xtc", &xtc_bytes(3, 40));
        let mut reader = StreamingReader::<Xtc>::new(path, ReaderConfig::default());

        let info = reader.info().unwrap();
        assert_eq!(info.frame_count, 3);
        assert_eq!(info.atom_count, 40);
        assert_eq!(info.delta_time, 2.0);

        let frame = reader.frame(2).unwrap();
        let tolerance = 10.0 / 1000.0 + 1e-4;
        for (a, p) in frame.positions().enumerate() {
            assert!((p.x - (0.5 + a as f32 * 0.002) * 10.0).abs() <= tolerance);
            assert!((p.y - 12.0).abs() <= tolerance);
            assert!((p.z - 20.0).abs() <= tolerance);
        }
        assert_eq!(frame.box_vectors[4], 30.0);
    }

    #[test]
    fn close_drops_state_and_reopens_lazily() {
        let dir = tempdir().unwrap();
        let mut reader = trr_reader(&dir, 3, ReaderConfig::default());
        reader.frame(0).unwrap();
        assert!(reader.is_open());

        reader.close().unwrap();
        assert!(!reader.is_open());
        assert!(reader.scan_status().is_none());
        assert!(matches!(reader.index(), Err(TrajectoryError::NotOpen)));

        reader.frame(0).unwrap();
        assert_eq!(reader.stats().decodes, 2);
        assert_eq!(reader.scan_status(), Some(&ScanStatus::Complete));
    }

    #[test]
    fn truncated_file_is_lenient_by_default_and_fatal_when_strict() {
        let dir = tempdir().unwrap();
        let mut bytes = trr_bytes(4);
        bytes.truncate(bytes.len() - 7);
        let path = write(&dir, "cut.trr", &bytes);

        let mut lenient = StreamingReader::<Trr>::new(&path, ReaderConfig::default());
        let info = lenient.info().unwrap();
        assert_eq!(info.frame_count, 3);
        assert!(info.truncated);
        assert!(lenient.scan_status().unwrap().is_truncated());

        let strict = ReaderConfigBuilder::new().strict(true).build().unwrap();
        let mut strict = StreamingReader::<Trr>::new(&path, strict);
        match strict.initialize() {
            Err(TrajectoryError::TruncatedIndex { frames, .. }) => assert_eq!(frames, 3),
            other => panic!("expected truncated index, got {:?}", other),
        }
        assert!(!strict.is_open());
    }

    #[test]
    fn empty_file_has_no_info() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "empty.xtc", &[]);
        let mut reader = StreamingReader::<Xtc>::new(path, ReaderConfig::default());
        assert!(matches!(
            reader.info(),
            Err(TrajectoryError::EmptyTrajectory { .. })
        ));
        assert!(matches!(
            reader.frame(0),
            Err(TrajectoryError::FrameOutOfRange {
                requested: 0,
                frame_count: 0
            })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let mut reader =
            StreamingReader::<Trr>::new(dir.path().join("absent.trr"), ReaderConfig::default());
        assert!(matches!(
            reader.initialize(),
            Err(TrajectoryError::Io { .. })
        ));
    }

    #[test]
    fn corrupt_frame_body_surfaces_decode_error_with_offset() {
        let dir = tempdir().unwrap();
        let mut bytes = xtc_bytes(2, 20);
        let second = bytes.len() / 2;
        // Zero the precision of the second frame's compressed preamble.
        let precision_at = second + 52 + 4;
        bytes[precision_at..precision_at + 4].copy_from_slice(&0f32.to_be_bytes());
        let path = write(&dir, "bad.xtc", &bytes);

        let mut reader = StreamingReader::<Xtc>::new(path, ReaderConfig::default());
        reader.frame(0).unwrap();
        match reader.frame(1) {
            Err(TrajectoryError::Decode {
                format, frame, offset, ..
            }) => {
                assert_eq!(format, "XTC");
                assert_eq!(frame, 1);
                assert_eq!(offset, second as u64);
            }
            other => panic!("expected decode error, got {:?}", other.map(|_| ())),
        }
    }
}
