use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::read::ReadSettings;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{load_document, save_document};

#[derive(clap::Args, Debug)]
pub struct PruneArgs {
    /// Print the path of every removed channel
    #[arg(short, long)]
    list: bool,
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    oarg: crate::OutputArgs,
    #[command(flatten)]
    paths: crate::InOutPaths,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &PruneArgs,
) -> AnyResult<()> {
    let mut diagnostics = Diagnostics::new();
    let (scene, mut animator) = load_document(
        &args_cmd.paths.in_file,
        &ReadSettings::from(&args_cmd.rarg),
        &mut diagnostics,
    )?;

    let removed = animator.remove_unused_channels(&scene, &mut diagnostics);
    if args_cmd.list {
        for (path, _) in &removed {
            println!("{}", path);
        }
    }

    let outpath = args_cmd.paths.out_file.as_ref().unwrap_or(&args_cmd.paths.in_file);
    let overwrite = args_cmd.oarg.overwrite || args_cmd.paths.out_file.is_none();
    save_document(outpath, &scene, &animator, overwrite, &mut diagnostics)
}
