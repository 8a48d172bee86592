/// Events emitted while a trajectory file is being indexed.
#[derive(Debug, Clone)]
pub enum Progress {
    ScanStart { total_bytes: u64 },
    /// Byte offset just past the most recently indexed frame.
    ScanAdvance { offset: u64 },
    ScanFinish { frames: u64 },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
