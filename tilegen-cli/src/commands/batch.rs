//! Batch command - render every zone listed in a zone file.

use std::path::PathBuf;
use std::sync::Arc;

use tilegen::config::{ConfigFile, Zone, ZoneFile};
use tilegen::pyramid::{PyramidRenderer, RenderSummary};
use tilegen::render::GraticuleRendererFactory;
use tilegen::CancellationToken;
use tracing::info;

use super::common::{settle, OutputArgs, RunStatus};
use crate::error::CliError;
use crate::progress::TileProgress;
use crate::runner::CliRunner;

/// Arguments for the batch command.
pub struct BatchArgs {
    pub zone_file: PathBuf,
    pub only: Vec<String>,
    pub output: OutputArgs,
}

/// Pick the zones to render.
///
/// Without `only`, every enabled zone. With `only`, exactly the named zones,
/// disabled or not; unknown names are an error.
fn select_zones<'a>(file: &'a ZoneFile, only: &[String]) -> Result<Vec<&'a Zone>, CliError> {
    if only.is_empty() {
        return Ok(file.enabled().collect());
    }

    only.iter()
        .map(|name| {
            file.get(name)
                .ok_or_else(|| CliError::Config(format!("zone '{}' not found in zone file", name)))
        })
        .collect()
}

/// Label for one box of a zone in progress output.
fn box_label(zone: &Zone, index: usize) -> String {
    match zone.bboxes().len() {
        1 => zone.name().to_string(),
        n => format!("{} [{}/{}]", zone.name(), index + 1, n),
    }
}

/// Render every box of `zone` at every zoom range into the zone's region
/// directory. Boxes overlap freely; tiles already written by an earlier
/// box are skipped.
///
/// Returns the merged summary and whether rendering was interrupted.
fn render_zone(
    zone: &Zone,
    output: &OutputArgs,
    config: &ConfigFile,
    factory: &Arc<GraticuleRendererFactory>,
    cancel: &CancellationToken,
) -> Result<(RenderSummary, bool), CliError> {
    let mut total = RenderSummary::default();

    for zooms in zone.zoom_ranges() {
        info!(zone = zone.name(), zooms = %zooms, boxes = zone.bboxes().len(), "Starting zone");

        for (index, bbox) in zone.bboxes().iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok((total, true));
            }

            let label = box_label(zone, index);
            let pyramid = output.pyramid_config(config, *bbox, *zooms, zone.name());
            let progress = TileProgress::new(&label);
            let result = PyramidRenderer::with_shared_factory(pyramid, Arc::clone(factory))
                .with_observer(progress.clone())
                .with_cancellation(cancel.clone())
                .run();
            progress.finish();

            let (summary, interrupted) = settle(&label, result)?;
            total.merge(summary);
            if interrupted {
                return Ok((total, true));
            }
        }
    }

    Ok((total, false))
}

/// Run the batch command.
pub fn run(args: BatchArgs) -> Result<RunStatus, CliError> {
    let zone_file = ZoneFile::load(&args.zone_file)?;
    let zones = select_zones(&zone_file, &args.only)?;
    if zones.is_empty() {
        println!("No enabled zones in {}", args.zone_file.display());
        return Ok(RunStatus::Complete);
    }

    let runner = CliRunner::new(args.output.config.as_deref(), args.output.verbose)?;
    runner.log_startup("batch");
    let config = runner.config();
    let cancel = runner.cancellation();
    let factory = Arc::new(GraticuleRendererFactory::new(config.style.clone()));

    println!("tilegen v{}", tilegen::VERSION);
    println!("Zone file: {} ({} zones)", args.zone_file.display(), zones.len());
    println!();

    let mut total = RenderSummary::default();
    let mut status = RunStatus::Complete;

    for zone in zones {
        let (summary, interrupted) = render_zone(zone, &args.output, config, &factory, &cancel)?;
        if !summary.is_clean() {
            status = RunStatus::Incomplete;
        }
        total.merge(summary);
        if interrupted {
            status = RunStatus::Incomplete;
            break;
        }
    }

    println!();
    println!("Batch total: {}", total);
    Ok(status)
}
