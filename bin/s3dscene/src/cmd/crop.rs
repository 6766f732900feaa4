use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::read::ReadSettings;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{load_document, save_document};

#[derive(clap::Args, Debug)]
pub struct CropArgs {
    /// Keyframes at or after this time (in seconds) are removed
    #[arg(short, long)]
    time: f32,
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    oarg: crate::OutputArgs,
    #[command(flatten)]
    paths: crate::InOutPaths,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &CropArgs,
) -> AnyResult<()> {
    if !args_cmd.time.is_finite() {
        bail!("Crop time must be a finite number of seconds.");
    }
    let mut diagnostics = Diagnostics::new();
    let (scene, mut animator) = load_document(
        &args_cmd.paths.in_file,
        &ReadSettings::from(&args_cmd.rarg),
        &mut diagnostics,
    )?;

    let before = animator.len();
    animator.crop(args_cmd.time);
    log::info!(
        "Cropped at {}s; {} of {} channels still have keys",
        args_cmd.time,
        animator.len(),
        before
    );

    let outpath = args_cmd.paths.out_file.as_ref().unwrap_or(&args_cmd.paths.in_file);
    let overwrite = args_cmd.oarg.overwrite || args_cmd.paths.out_file.is_none();
    save_document(outpath, &scene, &animator, overwrite, &mut diagnostics)
}
