use super::{open_output, open_provider};
use crate::cli::{FrameSelection, FramesArgs, OutputFormat};
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use std::io::Write;
use tracing::{debug, info};
use trajstream::core::models::frame::FrameData;
use trajstream::engine::reader::TrajectoryReader;

impl FrameSelection {
    /// Frame numbers to decode, in output order.
    fn frame_numbers(&self, frame_count: u64) -> Result<Vec<u64>> {
        if let Some(range) = self.range {
            if range.end >= frame_count {
                return Err(CliError::Argument(format!(
                    "frame range {}..{} exceeds the {} frame(s) in the trajectory",
                    range.start, range.end, frame_count
                )));
            }
            return Ok((range.start..=range.end).collect());
        }
        if !self.frames.is_empty() {
            return Ok(self.frames.clone());
        }
        Ok((0..frame_count).collect())
    }
}

/// Streams decoded frames to a writer in one of the output formats.
enum FrameSink<W: Write> {
    Table { out: W, decimals: usize },
    Json { out: W, written: usize },
    Csv { writer: csv::Writer<W>, decimals: usize },
}

impl<W: Write> FrameSink<W> {
    fn new(out: W, format: OutputFormat, decimals: usize) -> Result<Self> {
        Ok(match format {
            OutputFormat::Table => Self::Table { out, decimals },
            OutputFormat::Json => {
                let mut out = out;
                write!(out, "[")?;
                Self::Json { out, written: 0 }
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(out);
                writer.write_record(["frame", "time", "atom", "x", "y", "z"])?;
                Self::Csv { writer, decimals }
            }
        })
    }

    fn write_frame(&mut self, frame: &FrameData) -> Result<()> {
        match self {
            Self::Table { out, decimals } => write_table_frame(out, frame, *decimals),
            Self::Json { out, written } => {
                if *written > 0 {
                    write!(out, ",")?;
                }
                writeln!(out)?;
                serde_json::to_writer(&mut *out, frame)?;
                *written += 1;
                Ok(())
            }
            Self::Csv { writer, decimals } => {
                let d = *decimals;
                let frame_number = frame.frame_number.to_string();
                let time = format!("{:.*}", d, frame.time);
                for (atom, p) in frame.positions().enumerate() {
                    writer.write_record([
                        frame_number.clone(),
                        time.clone(),
                        atom.to_string(),
                        format!("{:.*}", d, p.x),
                        format!("{:.*}", d, p.y),
                        format!("{:.*}", d, p.z),
                    ])?;
                }
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<()> {
        match self {
            Self::Table { mut out, .. } => out.flush()?,
            Self::Json { mut out, .. } => {
                writeln!(out, "\n]")?;
                out.flush()?;
            }
            Self::Csv { mut writer, .. } => writer.flush()?,
        }
        Ok(())
    }
}

fn write_table_frame<W: Write>(out: &mut W, frame: &FrameData, decimals: usize) -> Result<()> {
    writeln!(
        out,
        "# frame {}  time = {:.*} ps  atoms = {}",
        frame.frame_number, decimals, frame.time, frame.count
    )?;
    let cell = frame.box_matrix();
    for row in cell.row_iter() {
        writeln!(
            out,
            "# box {:>12.*} {:>12.*} {:>12.*}",
            decimals, row[0], decimals, row[1], decimals, row[2]
        )?;
    }
    writeln!(out, "{:>8} {:>12} {:>12} {:>12}", "atom", "x (Å)", "y (Å)", "z (Å)")?;
    for (atom, p) in frame.positions().enumerate() {
        writeln!(
            out,
            "{:>8} {:>12.*} {:>12.*} {:>12.*}",
            atom, decimals, p.x, decimals, p.y, decimals, p.z
        )?;
    }
    writeln!(out)?;
    Ok(())
}

/// Decodes `numbers` in order into `sink`, advancing `progress` when one is given.
fn stream_frames<R: TrajectoryReader, W: Write>(
    reader: &mut R,
    numbers: &[u64],
    sink: &mut FrameSink<W>,
    progress: Option<&CliProgressHandler>,
) -> Result<()> {
    if let Some(progress) = progress {
        progress.start_task(numbers.len() as u64, "Decoding frames");
    }
    for &n in numbers {
        let frame = reader.frame(n)?;
        sink.write_frame(&frame)?;
        if let Some(progress) = progress {
            progress.increment();
        }
    }
    if let Some(progress) = progress {
        progress.finish_task();
    }
    Ok(())
}

pub fn run(args: FramesArgs, config: AppConfig, progress: &CliProgressHandler) -> Result<()> {
    let mut provider = open_provider(&args.input, None, config.reader, progress)?;
    let trajectory = provider.info()?;
    let numbers = args.selection.frame_numbers(trajectory.frame_count)?;
    info!("Decoding {} frame(s).", numbers.len());

    let out = open_output(args.output.as_deref())?;
    let mut sink = FrameSink::new(out, config.output.format, config.output.decimals)?;

    // Frames written to stdout would interleave with the bar.
    let task_progress = args.output.is_some().then_some(progress);
    stream_frames(&mut provider, &numbers, &mut sink, task_progress)?;
    sink.finish()?;

    let stats = provider.stats();
    debug!(
        decodes = stats.decodes,
        hits = stats.cache_hits,
        misses = stats.cache_misses,
        "Reader statistics."
    );
    Ok(())
}
