//! Render command - build the pyramid for one bounding box.

use tilegen::coord::{BoundingBox, ZoomRange};
use tilegen::pyramid::PyramidRenderer;
use tilegen::render::GraticuleRendererFactory;

use super::common::{settle, OutputArgs, RunStatus};
use crate::error::CliError;
use crate::progress::TileProgress;
use crate::runner::CliRunner;

/// Arguments for the render command.
pub struct RenderArgs {
    pub bbox: BoundingBox,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub name: String,
    pub output: OutputArgs,
}

/// Run the render command.
pub fn run(args: RenderArgs) -> Result<RunStatus, CliError> {
    let zooms = ZoomRange::new(args.min_zoom, args.max_zoom)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let runner = CliRunner::new(args.output.config.as_deref(), args.output.verbose)?;
    runner.log_startup("render");
    let config = runner.config();

    let pyramid = args.output.pyramid_config(config, args.bbox, zooms, &args.name);

    println!("tilegen v{}", tilegen::VERSION);
    println!("Region:  {}", args.name);
    println!("Bounds:  {}", args.bbox);
    println!("Zooms:   {}", zooms);
    println!(
        "Output:  {} ({})",
        pyramid.output_root().join(&args.name).display(),
        pyramid.row_scheme()
    );
    println!("Threads: {}", pyramid.workers());
    println!();
    println!("Press Ctrl+C to stop after the tiles in flight");
    println!();

    let progress = TileProgress::new(&args.name);
    let renderer = PyramidRenderer::new(pyramid, GraticuleRendererFactory::new(config.style.clone()))
        .with_observer(progress.clone())
        .with_cancellation(runner.cancellation());

    let result = renderer.run();
    progress.finish();

    let (summary, interrupted) = settle(&args.name, result)?;
    if interrupted {
        return Ok(RunStatus::Incomplete);
    }
    Ok(RunStatus::from_summary(&summary))
}
