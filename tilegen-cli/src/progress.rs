//! Terminal progress bar for pyramid runs.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tilegen::pyramid::{ProgressObserver, TileOutcome};

const TEMPLATE: &str =
    "{prefix:>12} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles ({per_sec}, eta {eta})";

/// Progress observer backed by an `indicatif` bar on stderr.
///
/// The bar hides itself when stderr is not a terminal.
pub struct TileProgress {
    bar: ProgressBar,
}

impl TileProgress {
    pub fn new(label: &str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(label.to_string());
        Arc::new(Self { bar })
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for TileProgress {
    fn on_planned(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn on_tile(&self, outcome: &TileOutcome) {
        self.bar.inc(1);
        if let TileOutcome::Failed(failure) = outcome {
            self.bar.println(format!("  failed {}: {}", failure.tile, failure.message));
        }
    }
}
