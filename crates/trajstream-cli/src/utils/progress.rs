use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use tracing::warn;
use trajstream::engine::progress::{Progress, ProgressCallback};

#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A handler that tracks state but never draws, used with `--quiet`.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(target);
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::ScanStart { total_bytes } => {
                    pb_guard.reset();
                    pb_guard.set_length(total_bytes);
                    pb_guard.set_position(0);
                    pb_guard.set_style(Self::scan_style());
                    pb_guard.set_message("Indexing frames");
                }
                Progress::ScanAdvance { offset } => {
                    pb_guard.set_position(offset);
                }
                Progress::ScanFinish { frames } => {
                    pb_guard.finish_with_message(format!("✓ Indexed {} frame(s)", frames));
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    /// Switches the bar to counting `total_steps` units of work.
    pub fn start_task(&self, total_steps: u64, message: &str) {
        if let Ok(pb) = self.pb.lock() {
            pb.reset();
            pb.set_length(total_steps);
            pb.set_position(0);
            pb.set_style(Self::bar_style());
            pb.set_message(message.to_string());
        }
    }

    pub fn increment(&self) {
        if let Ok(pb) = self.pb.lock() {
            pb.inc(1);
        }
    }

    pub fn finish_task(&self) {
        if let Ok(pb) = self.pb.lock() {
            pb.finish_and_clear();
        }
    }

    #[cfg(test)]
    pub(crate) fn message(&self) -> String {
        self.pb.lock().map(|pb| pb.message()).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> u64 {
        self.pb.lock().map(|pb| pb.position()).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.pb.lock().map(|pb| pb.is_finished()).unwrap_or_default()
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Failed to create spinner style template")
    }

    fn scan_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{msg:<20} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({binary_bytes_per_sec})",
        )
        .expect("Failed to create scan style template")
        .progress_chars("##-")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("Failed to create bar style template")
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
