//! Spinners and the per-VPC progress bar

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A single-task spinner with plain-text fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress over the VPCs of a subnet run.
///
/// Compiles run concurrently, so every method takes `&self`.
pub struct MapProgress {
    bar: Option<ProgressBar>,
}

impl MapProgress {
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {spinner:.cyan} Mapping subnets  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .progress_chars("━╸─"),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Mapping subnets for {} VPC(s)...", total);
            None
        };
        Self { bar }
    }

    /// Record one VPC as mapped
    pub fn vpc_done(&self, vpc_id: &str) {
        match self.bar {
            Some(ref bar) => {
                bar.set_message(vpc_id.to_string());
                bar.inc(1);
            }
            None => println!("  {} {}", style("[OK]").green(), vpc_id),
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Fetching VPCs...");
        spinner.stop("Found 2 VPCs");
        spinner.start("Fetching subnets...");
        spinner.stop_error("Access denied");
    }

    #[test]
    fn map_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = MapProgress::new(&ctx, 2);
        progress.vpc_done("vpc-1");
        progress.vpc_done("vpc-2");
        progress.finish();
    }
}
