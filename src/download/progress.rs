use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::ProgressObserver;
use crate::utils::format_megabytes;

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

/// Terminal progress indicator for downloads.
///
/// Starts as a spinner and switches to a bar once a total size is known. The
/// indicator is cleared when this value is dropped, whatever the outcome.
pub struct ConsoleProgress {
    bar: ProgressBar,
    determinate: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        bar.set_style(
            ProgressStyle::default_spinner()
                .template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Downloading...");
        bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            bar,
            determinate: false,
        }
    }

    fn switch_to_bar(&mut self, total: u64) {
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        self.bar.set_length(total);
        self.determinate = true;
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&mut self, downloaded: u64, total: Option<u64>) {
        match total {
            Some(total) => {
                if !self.determinate {
                    self.switch_to_bar(total);
                }
                self.bar.set_position(downloaded.min(total));
            }
            None => self.bar.set_position(downloaded),
        }
        self.bar
            .set_message(format!("Downloading... {}", format_megabytes(downloaded)));
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switches_to_bar_on_known_total() {
        let mut progress = ConsoleProgress::new(true);
        progress.on_progress(1_000, None);
        assert!(!progress.determinate);

        progress.on_progress(2_000, Some(10_000));
        assert!(progress.determinate);
        assert_eq!(progress.bar.length(), Some(10_000));
        assert_eq!(progress.bar.position(), 2_000);
    }

    #[test]
    fn test_position_is_clamped_to_total() {
        let mut progress = ConsoleProgress::new(true);
        progress.on_progress(12_000, Some(10_000));
        assert_eq!(progress.bar.position(), 10_000);
        assert_eq!(progress.bar.message(), "Downloading... 0.0 MB");
    }
}
