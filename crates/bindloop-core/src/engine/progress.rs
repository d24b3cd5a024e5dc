#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: String },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

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

    pub(crate) fn phase(&self, name: impl Into<String>) {
        self.report(Progress::PhaseStart { name: name.into() });
    }

    pub(crate) fn message(&self, text: impl Into<String>) {
        self.report(Progress::Message(text.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn reporter_forwards_events_to_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(format!("{:?}", event));
        }));

        reporter.phase("Trajectory PDL1_l72_s1");
        reporter.report(Progress::TaskIncrement);
        reporter.message("accepted");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].contains("PDL1_l72_s1"));
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().message("ignored");
    }
}
