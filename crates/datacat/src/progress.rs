use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

pub(crate) struct ProgressBarBuilder {
    template: &'static str,
    quiet: bool,
    tick: Duration,
}

impl ProgressBarBuilder {
    pub(crate) fn new(template: &'static str, quiet: bool) -> Self {
        Self {
            template,
            quiet,
            tick: Duration::from_millis(200),
        }
    }

    /// Builds a spinner, which is hidden if the builder is quiet.
    pub(crate) fn build(self) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::with_template(self.template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let pbar = ProgressBar::new_spinner();
        pbar.set_draw_target(ProgressDrawTarget::stderr());
        pbar.set_style(style);
        pbar.enable_steady_tick(self.tick);
        pbar
    }
}
