use std::sync::Arc;

/// Observer invoked with human-readable progress text
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Owned progress counter with a single invocation point
///
/// Advanced once per prepared input item; emits "<completed> / <total>"
/// while work remains and "done" when the last item is in. Purely
/// observational, no backpressure implications.
pub struct ProgressReporter {
    completed: usize,
    total: usize,
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub fn new(total: usize, callback: Option<ProgressCallback>) -> Self {
        Self {
            completed: 0,
            total,
            callback,
        }
    }

    /// Record one completed item and notify the observer
    pub fn advance(&mut self) {
        self.completed += 1;
        let status = if self.completed == self.total {
            "done".to_string()
        } else {
            format!("{} / {}", self.completed, self.total)
        };

        if let Some(callback) = &self.callback {
            callback(&status);
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reports_counts_then_done() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut reporter = ProgressReporter::new(
            3,
            Some(Arc::new(move |status: &str| {
                sink.lock().unwrap().push(status.to_string());
            })),
        );

        for _ in 0..3 {
            reporter.advance();
        }

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &["1 / 3".to_string(), "2 / 3".to_string(), "done".to_string()]
        );
        assert_eq!(reporter.completed(), 3);
    }

    #[test]
    fn works_without_an_observer() {
        let mut reporter = ProgressReporter::new(2, None);
        reporter.advance();
        reporter.advance();
        assert_eq!(reporter.completed(), 2);
    }
}
