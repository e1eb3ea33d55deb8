use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use wpclient_core::progress::ProgressSink;

use crate::output;

/// Terminal spinner showing the current task name. Hidden in JSON mode.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        if output::is_json() {
            return Self::hidden();
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for SpinnerProgress {
    fn set_task_name(&self, name: &str) {
        self.bar.set_message(name.replace('\n', " "));
    }

    fn report(&self, message: &str) {
        self.bar.set_message(message.replace('\n', " "));
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}
