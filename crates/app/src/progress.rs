use docmerge_core::{Stage, StageProgress};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::cell::RefCell;

/// One terminal bar per stage, drawn on stderr.
pub struct TerminalProgress {
    visible: bool,
    bar: RefCell<Option<ProgressBar>>,
}

impl TerminalProgress {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            bar: RefCell::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed_precise})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }
}

impl StageProgress for TerminalProgress {
    fn on_stage_start(&self, stage: Stage, total: usize) {
        let target = if self.visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };

        let bar = ProgressBar::with_draw_target(Some(total as u64), target);
        bar.set_style(Self::style());
        bar.set_prefix(stage.label());

        // A stage that failed part-way never finished its bar.
        if let Some(previous) = self.bar.replace(Some(bar)) {
            previous.abandon();
        }
    }

    fn on_item_done(&self, _stage: Stage) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.inc(1);
        }
    }

    fn on_stage_finish(&self, _stage: Stage) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
