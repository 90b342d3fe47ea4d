//! Progress reporting for long-running passes.

/// Receives progress of a long-running pass.
///
/// Passes running in parallel report from several threads at once.
pub trait ProgressListener: Sync {
    /// A pass of `total` steps starts.
    fn init(&self, total: usize, title: &str);

    /// Step `n` of the current pass is done.
    fn step(&self, n: usize, label: &str);
}

/// A listener that ignores all progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressListener for NoopProgress {
    fn init(&self, _total: usize, _title: &str) {}

    fn step(&self, _n: usize, _label: &str) {}
}
