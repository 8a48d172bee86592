use super::{open_output, open_provider};
use crate::cli::{InfoArgs, OutputFormat};
use crate::config::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};
use trajstream::core::models::info::TrajectoryInfo;
use trajstream::engine::indexer::ScanStatus;
use trajstream::engine::reader::TrajectoryReader;
use trajstream::provider::TrajectoryFormatKind;

#[derive(Serialize, Debug)]
struct InfoReport<'a> {
    path: &'a Path,
    format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    topology: Option<&'a Path>,
    frame_count: u64,
    atom_count: u32,
    time_offset: f64,
    delta_time: f64,
    scan: &'a ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    times: Option<&'a [f64]>,
}

impl<'a> InfoReport<'a> {
    fn new(
        path: &'a Path,
        format: TrajectoryFormatKind,
        topology: Option<&'a Path>,
        info: &'a TrajectoryInfo,
        scan: &'a ScanStatus,
        include_times: bool,
    ) -> Self {
        Self {
            path,
            format: format.to_string(),
            topology,
            frame_count: info.frame_count,
            atom_count: info.atom_count,
            time_offset: info.time_offset,
            delta_time: info.delta_time,
            scan,
            times: include_times.then_some(info.times.as_slice()),
        }
    }
}

pub fn run(args: InfoArgs, config: AppConfig, progress: &CliProgressHandler) -> Result<()> {
    let mut provider = open_provider(&args.input, args.topology.clone(), config.reader, progress)?;
    let info = provider.info()?;
    let scan = provider.scan_status().cloned().unwrap_or_default();
    if let ScanStatus::Truncated { offset, reason } = &scan {
        warn!("Trajectory is truncated at byte {}: {}", offset, reason);
    }
    info!(
        "Indexed {} frame(s) of {} atom(s).",
        info.frame_count, info.atom_count
    );

    let report = InfoReport::new(
        provider.coordinates_path(),
        provider.format(),
        provider.topology_path(),
        &info,
        &scan,
        args.times || config.output.format == OutputFormat::Csv,
    );
    let mut out = open_output(None)?;
    write_report(&mut out, &report, config.output.format, config.output.decimals)?;
    out.flush()?;
    Ok(())
}

fn write_report<W: Write>(
    out: &mut W,
    report: &InfoReport<'_>,
    format: OutputFormat,
    decimals: usize,
) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(out, report, decimals),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
            Ok(())
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["frame", "time"])?;
            for (frame, time) in report.times.unwrap_or_default().iter().enumerate() {
                writer.write_record([frame.to_string(), format!("{:.*}", decimals, time)])?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

fn write_table<W: Write>(out: &mut W, report: &InfoReport<'_>, decimals: usize) -> Result<()> {
    writeln!(out, "{:<14}{}", "File:", report.path.display())?;
    writeln!(out, "{:<14}{}", "Format:", report.format)?;
    if let Some(topology) = report.topology {
        writeln!(out, "{:<14}{}", "Topology:", topology.display())?;
    }
    writeln!(out, "{:<14}{}", "Frames:", report.frame_count)?;
    writeln!(out, "{:<14}{}", "Atoms:", report.atom_count)?;
    writeln!(out, "{:<14}{:.*} ps", "Start time:", decimals, report.time_offset)?;
    writeln!(out, "{:<14}{:.*} ps", "Time step:", decimals, report.delta_time)?;
    match report.scan {
        ScanStatus::Complete => writeln!(out, "{:<14}complete", "Scan:")?,
        ScanStatus::Truncated { offset, reason } => writeln!(
            out,
            "{:<14}truncated at byte {} ({})",
            "Scan:", offset, reason
        )?,
    }
    if let Some(times) = report.times {
        writeln!(out)?;
        writeln!(out, "{:>8}  {:>14}", "frame", "time (ps)")?;
        for (frame, time) in times.iter().enumerate() {
            writeln!(out, "{:>8}  {:>14.*}", frame, decimals, time)?;
        }
    }
    Ok(())
}
