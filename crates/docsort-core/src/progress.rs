/// Trait for reporting run progress.
///
/// The CLI implements it with indicatif bars; tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_classify_start(&self, _total_files: usize) {}
    fn on_classify_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_classify_complete(&self, _classified: usize, _duration_secs: f64) {}
    fn on_recovery_pass_start(&self, _pass: &str) {}
    fn on_recovery_pass_complete(&self, _pass: &str, _examined: usize, _changed: usize) {}
    fn on_place_start(&self, _total_files: usize) {}
    fn on_place_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_place_complete(&self, _placed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
