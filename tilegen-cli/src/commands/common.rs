//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use tilegen::config::ConfigFile;
use tilegen::coord::{BoundingBox, ZoomRange};
use tilegen::pyramid::{PyramidConfig, PyramidError, RenderSummary};
use tilegen::tile::RowScheme;

/// Whether every planned tile was resolved without failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    Incomplete,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Complete => 0,
            RunStatus::Incomplete => crate::error::EXIT_INCOMPLETE,
        }
    }

    pub fn from_summary(summary: &RenderSummary) -> Self {
        if summary.is_clean() {
            RunStatus::Complete
        } else {
            RunStatus::Incomplete
        }
    }
}

/// Output options shared by `render` and `batch`.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Output root directory (default from config, else ./tiles)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Number of render threads (default from config, else CPU cores)
    #[arg(long, short = 'j')]
    pub threads: Option<usize>,

    /// Write rows in TMS order (origin bottom-left)
    #[arg(long)]
    pub tms: bool,

    /// Config file (default: ~/.tilegen/config.ini)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Mirror log output to stdout
    #[arg(long, short)]
    pub verbose: bool,
}

impl OutputArgs {
    /// Build a run configuration. CLI values take precedence over config.
    pub fn pyramid_config(
        &self,
        config: &ConfigFile,
        bbox: BoundingBox,
        zooms: ZoomRange,
        region: &str,
    ) -> PyramidConfig {
        let render = &config.render;
        let output = self.output.as_ref().unwrap_or(&render.output_dir);
        let scheme = if self.tms {
            RowScheme::Tms
        } else {
            render.row_scheme()
        };

        PyramidConfig::new(bbox, zooms, output, region)
            .with_workers(self.threads.unwrap_or(render.threads))
            .with_queue_capacity(render.queue_capacity)
            .with_row_scheme(scheme)
            .with_buffer_size(render.buffer_size)
            .with_empty_tiles(render.empty_tile_policy())
    }
}

/// Print the run summary and any failed tiles.
pub fn print_summary(region: &str, summary: &RenderSummary) {
    println!("{}: {}", region, summary);
    for failure in &summary.failures {
        println!("  failed {}", failure);
    }
    for error in &summary.worker_errors {
        println!("  worker error: {}", error);
    }
}

/// Interpret a finished run: summaries for complete or cancelled runs,
/// errors for everything else.
pub fn settle(
    region: &str,
    result: Result<RenderSummary, PyramidError>,
) -> Result<(RenderSummary, bool), PyramidError> {
    match result {
        Ok(summary) => {
            print_summary(region, &summary);
            Ok((summary, false))
        }
        Err(PyramidError::Cancelled { summary }) => {
            println!("{}: interrupted", region);
            print_summary(region, &summary);
            Ok((summary, true))
        }
        Err(e) => Err(e),
    }
}
