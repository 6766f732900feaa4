use s3d_scene::read::ReadSettings;

use crate::prelude::*;

#[allow(unused_imports)]
mod prelude {
    pub use std::path::{Path, PathBuf};

    pub use anyhow::{Context, Result as AnyResult, bail};
}

mod cmd {
    pub mod crop;
    pub mod cube;
    pub mod info;
    pub mod merge;
    pub mod prune;
    pub mod verify;
}

mod util;

#[derive(clap::Parser, Debug)]
#[command(about = "Tool for working with s3d scene files.")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    /// Operation to perform
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Print extra info about what the tool is doing
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args, Debug)]
struct ReadArgs {
    /// Treat a scene container whose declared size is wrong as an error
    #[arg(long)]
    strict_length: bool,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Overwrite output file if it exists
    #[arg(short, long)]
    overwrite: bool,
}

#[derive(clap::Args, Debug)]
struct InputPath {
    /// Path to the input file
    in_file: PathBuf,
}

#[derive(clap::Args, Debug)]
struct InputPaths {
    /// Paths to the input files
    in_files: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct OutputPath {
    /// Path where to save the output file
    out_file: PathBuf,
}

#[derive(clap::Args, Debug)]
struct InOutPaths {
    /// Path to the input file
    in_file: PathBuf,
    /// Path to the output file (if unspecified, overwrite the input)
    out_file: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum CliCommand {
    /// Print information about the tool
    Version,
    /// Show resource and animation counts of a file
    Info(cmd::info::InfoArgs),
    /// Try loading the file to check for errors
    Verify(cmd::verify::VerifyArgs),
    /// Remove animation channels that nothing in the scene exposes
    Prune(cmd::prune::PruneArgs),
    /// Combine the animation of several files onto the scene of the first
    Merge(cmd::merge::MergeArgs),
    /// Write a scene holding a single spinning cube
    Cube(cmd::cube::CubeArgs),
    /// Drop every keyframe at or after a given time
    Crop(cmd::crop::CropArgs),
}

impl From<&ReadArgs> for ReadSettings {
    fn from(args: &ReadArgs) -> Self {
        Self {
            strict_length: args.strict_length,
        }
    }
}

fn run_command(cli: &Cli) -> AnyResult<()> {
    match &cli.command {
        CliCommand::Version => {
            // Verbose always prints version anyway
            if !cli.common.verbose {
                print_version();
            }
            Ok(())
        }
        CliCommand::Info(args) => cmd::info::run(&cli.common, args),
        CliCommand::Verify(args) => cmd::verify::run(&cli.common, args),
        CliCommand::Prune(args) => cmd::prune::run(&cli.common, args),
        CliCommand::Merge(args) => cmd::merge::run(&cli.common, args),
        CliCommand::Cube(args) => cmd::cube::run(&cli.common, args),
        CliCommand::Crop(args) => cmd::crop::run(&cli.common, args),
    }
}

fn print_version() {
    eprintln!(
        "{} version {}. Works with container version {}.",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        s3d_scene::FORMAT_VERSION,
    );
    eprintln!();
}

fn main() {
    use clap::Parser;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.common.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    if cli.common.verbose {
        print_version();
    }

    if let Err(e) = run_command(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(2);
    }
}
