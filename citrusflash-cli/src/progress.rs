//! Terminal progress bar for block transfers.

use {
    crate::use_fancy_output,
    citrusflash::Progress,
    indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle},
};

/// Progress bar counting frames, with the byte total as its message.
pub(crate) struct BarProgress {
    bar: ProgressBar,
    bytes: usize,
}

impl BarProgress {
    /// Create a bar, hidden when quiet or when stderr is not a terminal.
    pub(crate) fn new(quiet: bool) -> Self {
        let bar = if quiet || !use_fancy_output() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar
        };
        Self { bar, bytes: 0 }
    }

    /// Leave the bar where it stopped after a failed transfer.
    pub(crate) fn abandon(&self) {
        self.bar
            .abandon();
    }
}

impl Progress for BarProgress {
    fn set_total(&mut self, blocks: usize) {
        self.bar
            .set_length(u64::try_from(blocks).unwrap_or(u64::MAX));
    }

    fn increment(&mut self, bytes: usize) {
        self.bytes += bytes;
        self.bar
            .inc(1);
        self.bar
            .set_message(format!("{} bytes", self.bytes));
    }

    fn finish(&mut self) {
        self.bar
            .finish_with_message(format!("{} bytes sent", self.bytes));
    }
}
