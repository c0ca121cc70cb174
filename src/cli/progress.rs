//! Terminal display of job progress messages
//!
//! A [`ProgressDisplay`] turns the messages relayed by the job runner into
//! a percentage bar plus log lines printed above it.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use crate::jobs::ProgressMessage;
use crate::schema::SchemaMap;

/// Progress bar for one background job
pub struct ProgressDisplay {
    /// Start time of the job
    start_time: Instant,
    /// Progress bar (optional, can be disabled)
    bar: Option<ProgressBar>,
    /// Schema map delivered by a schema scan
    schema: Option<SchemaMap>,
}

impl ProgressDisplay {
    /// Create a new display
    ///
    /// # Arguments
    /// * `enable_bar` - Whether to draw a progress bar
    pub fn new(enable_bar: bool) -> Self {
        let bar = if enable_bar {
            let bar = ProgressBar::new(100);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            Some(bar)
        } else {
            None
        };

        Self {
            start_time: Instant::now(),
            bar,
            schema: None,
        }
    }

    /// Render one message
    pub fn handle(&mut self, message: &ProgressMessage) {
        match message {
            ProgressMessage::Progress {
                description,
                percent,
            } => {
                if let Some(ref bar) = self.bar {
                    bar.set_position(u64::from(*percent));
                    bar.set_message(description.clone());
                }
            }
            ProgressMessage::Log(text) => self.println(text),
            ProgressMessage::SchemaResult(schema) => self.schema = Some(schema.clone()),
            ProgressMessage::Finished(summary) => {
                self.finish();
                println!(
                    "{} ({:.1}s)",
                    summary,
                    self.start_time.elapsed().as_secs_f64()
                );
            }
            // Reported by the caller
            ProgressMessage::Error(_) => self.finish(),
        }
    }

    /// Schema map received so far
    pub fn take_schema(&mut self) -> Option<SchemaMap> {
        self.schema.take()
    }

    fn println(&self, text: &str) {
        match self.bar {
            Some(ref bar) => bar.println(text),
            None => eprintln!("{}", text),
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
