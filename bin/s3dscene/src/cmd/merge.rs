use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::read::ReadSettings;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{load_document, save_document};

#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    /// Also drop channels that the first file's scene does not expose
    #[arg(short, long)]
    prune: bool,
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    oarg: crate::OutputArgs,
    #[command(flatten)]
    outpath: crate::OutputPath,
    #[command(flatten)]
    inpaths: crate::InputPaths,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &MergeArgs,
) -> AnyResult<()> {
    let Some((first, rest)) = args_cmd.inpaths.in_files.split_first() else {
        bail!("No input files provided.");
    };
    let settings = ReadSettings::from(&args_cmd.rarg);
    let mut diagnostics = Diagnostics::new();

    let (scene, mut animator) = load_document(first, &settings, &mut diagnostics)?;
    // Later files win where channels overlap.
    for inpath in rest {
        let (_, other) = load_document(inpath, &settings, &mut diagnostics)?;
        animator.merge(other);
    }
    if args_cmd.prune {
        animator.remove_unused_channels(&scene, &mut diagnostics);
    }

    save_document(
        &args_cmd.outpath.out_file,
        &scene,
        &animator,
        args_cmd.oarg.overwrite,
        &mut diagnostics,
    )
}
