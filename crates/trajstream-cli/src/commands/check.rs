use super::open_provider;
use crate::cli::CheckArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use tracing::{error, info};
use trajstream::engine::config::{IndexPolicy, ReaderConfig};
use trajstream::engine::error::TrajectoryError;
use trajstream::engine::indexer::ScanStatus;
use trajstream::engine::reader::TrajectoryReader;

/// Indexes the trajectory to the end and fails if it is empty, truncated or, with `--decode`,
/// contains a frame that does not decode.
pub fn run(args: CheckArgs, config: AppConfig, progress: &CliProgressHandler) -> Result<()> {
    let reader_config = ReaderConfig {
        index_policy: IndexPolicy::Lenient,
        ..config.reader
    };
    let mut provider = open_provider(&args.input, None, reader_config, progress)?;
    provider.initialize()?;
    let status = provider.scan_status().cloned().unwrap_or_default();
    let info = provider.info()?;

    println!(
        "{}: {} frame(s), {} atom(s), {:.3} ps to {:.3} ps",
        args.input.display(),
        info.frame_count,
        info.atom_count,
        info.time_offset,
        info.times.last().copied().unwrap_or(info.time_offset)
    );

    if args.decode {
        progress.start_task(info.frame_count, "Decoding frames");
        for n in 0..info.frame_count {
            if let Err(e) = provider.frame(n) {
                progress.finish_task();
                error!("Frame {} failed to decode: {}", n, e);
                return Err(e.into());
            }
            progress.increment();
        }
        progress.finish_task();
        info!("All {} frame(s) decoded.", info.frame_count);
        println!("✓ All {} frame(s) decode cleanly", info.frame_count);
    }

    match status {
        ScanStatus::Complete => {
            println!("✓ Scan reached end of file");
            Ok(())
        }
        ScanStatus::Truncated { offset, reason } => {
            println!("✗ Scan stopped at byte {}: {}", offset, reason);
            Err(CliError::Truncated {
                path: args.input,
                offset,
            })
        }
    }
}

/// Maps a failed check onto its process exit code.
pub fn exit_code(error: &CliError) -> i32 {
    match error {
        CliError::Truncated { .. } => 2,
        CliError::Trajectory(TrajectoryError::Decode { .. }) => 3,
        _ => 1,
    }
}
