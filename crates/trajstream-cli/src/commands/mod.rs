pub mod check;
pub mod frames;
pub mod info;

use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use trajstream::engine::config::ReaderConfig;
use trajstream::engine::progress::ProgressReporter;
use trajstream::provider::TrajectoryProvider;

/// Builds a provider for `input` whose scan progress is rendered by `progress`.
pub(crate) fn open_provider(
    input: &Path,
    topology: Option<PathBuf>,
    config: ReaderConfig,
    progress: &CliProgressHandler,
) -> Result<TrajectoryProvider> {
    let mut provider = TrajectoryProvider::with_config(input, config)?
        .with_progress(ProgressReporter::with_callback(progress.get_callback()));
    if let Some(topology) = topology {
        provider = provider.with_topology(topology);
    }
    info!(
        "Opening {} trajectory {:?}",
        provider.format(),
        provider.coordinates_path()
    );
    Ok(provider)
}

/// Standard output, or a buffered file when `path` is given.
pub(crate) fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            info!("Writing output to {:?}", path);
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    /// Writes an uncompressed XTC file with `frames` frames of `coords_nm.len()` atoms.
    ///
    /// Frame `i` has time `i * 2.0` ps and every coordinate shifted by `i * 0.1` nm along x.
    pub fn write_plain_xtc(
        dir: &Path,
        name: &str,
        frames: usize,
        coords_nm: &[[f32; 3]],
    ) -> PathBuf {
        assert!(coords_nm.len() <= 9);
        let mut bytes = Vec::new();
        for i in 0..frames {
            let mut push = |v: [u8; 4]| bytes.extend_from_slice(&v);
            push(1995i32.to_be_bytes());
            push((coords_nm.len() as i32).to_be_bytes());
            push((i as i32).to_be_bytes());
            push((i as f32 * 2.0).to_be_bytes());
            for v in [3.0f32, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 3.0] {
                push(v.to_be_bytes());
            }
            push((coords_nm.len() as i32).to_be_bytes());
            for c in coords_nm {
                push((c[0] + i as f32 * 0.1).to_be_bytes());
                push(c[1].to_be_bytes());
                push(c[2].to_be_bytes());
            }
        }
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }
}
