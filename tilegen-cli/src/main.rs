//! Tilegen CLI - command-line interface
//!
//! Renders slippy-map tile pyramids for a bounding box or for every region
//! in a zone file.

mod commands;
mod error;
mod progress;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tilegen::coord::BoundingBox;

use commands::common::OutputArgs;
use error::EXIT_USAGE;

#[derive(Parser)]
#[command(name = "tilegen")]
#[command(version, about = "Render slippy-map tile pyramids", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the pyramid for one bounding box
    Render {
        /// Bounding box as west,south,east,north in degrees
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,

        /// Lowest zoom level to render
        #[arg(long, default_value = "0")]
        min_zoom: u8,

        /// Highest zoom level to render
        #[arg(long)]
        max_zoom: u8,

        /// Region name; tiles go to <output>/<name>/<z>/<x>/<y>.png
        #[arg(long)]
        name: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Render every region listed in a zone file
    Batch {
        /// Zone file (INI, one section per region)
        zone_file: PathBuf,

        /// Render only these regions (repeatable)
        #[arg(long)]
        only: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Config file to write (default: ~/.tilegen/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    let result = match cli.command {
        Commands::Render {
            bbox,
            min_zoom,
            max_zoom,
            name,
            output,
        } => commands::render::run(commands::render::RenderArgs {
            bbox,
            min_zoom,
            max_zoom,
            name,
            output,
        }),
        Commands::Batch {
            zone_file,
            only,
            output,
        } => commands::batch::run(commands::batch::BatchArgs {
            zone_file,
            only,
            output,
        }),
        Commands::Init { force, config } => commands::init::run(force, config),
    };

    match result {
        Ok(status) => process::exit(status.exit_code()),
        Err(e) => e.exit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render_with_negative_bbox() {
        let cli = Cli::try_parse_from([
            "tilegen",
            "render",
            "--bbox",
            "-90,40,-89,41",
            "--max-zoom",
            "2",
            "--name",
            "midwest",
            "--tms",
        ])
        .unwrap();

        match cli.command {
            Commands::Render {
                bbox,
                min_zoom,
                max_zoom,
                name,
                output,
            } => {
                assert_eq!(bbox.west(), -90.0);
                assert_eq!(bbox.north(), 41.0);
                assert_eq!((min_zoom, max_zoom), (0, 2));
                assert_eq!(name, "midwest");
                assert!(output.tms);
                assert!(output.output.is_none());
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_parse_rejects_invalid_bbox() {
        let result = Cli::try_parse_from([
            "tilegen", "render", "--bbox", "10,0,1,1", "--max-zoom", "2", "--name", "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_batch_only_repeatable() {
        let cli = Cli::try_parse_from([
            "tilegen",
            "batch",
            "zones.ini",
            "--only",
            "ie-ireland",
            "--only",
            "is-iceland",
            "-j",
            "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Batch {
                zone_file,
                only,
                output,
            } => {
                assert_eq!(zone_file, PathBuf::from("zones.ini"));
                assert_eq!(only, vec!["ie-ireland", "is-iceland"]);
                assert_eq!(output.threads, Some(4));
            }
            _ => panic!("expected batch"),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
