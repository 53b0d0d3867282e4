//! Progress events for the per-item loops of a run.
//!
//! The library only reports; the binary decides how to draw. Every method has
//! a no-op default.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// One step per input file.
    Converting,
    /// One step per PDF loaded into the merged document.
    Merging,
    /// One step per page of the merged PDF.
    Counting,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Converting => "Converting to PDF",
            Stage::Merging => "Merging PDFs",
            Stage::Counting => "Counting words",
        }
    }
}

pub trait StageProgress {
    /// Called once before the first item of `stage`.
    fn on_stage_start(&self, stage: Stage, total: usize) {
        let _ = (stage, total);
    }

    /// Called after each item, whether it succeeded or not.
    fn on_item_done(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when the loop completes. Not called when the stage fails early.
    fn on_stage_finish(&self, stage: Stage) {
        let _ = stage;
    }
}

pub struct NoopProgress;

impl StageProgress for NoopProgress {}
