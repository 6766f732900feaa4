use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::read::ReadSettings;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::load_document;

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Fail if loading produced any warning
    #[arg(long)]
    strict: bool,
    #[command(flatten)]
    inarg: crate::ReadArgs,
    #[command(flatten)]
    inpath: crate::InputPath,
}

pub fn run(
    args_common: &CommonArgs,
    args_cmd: &VerifyArgs,
) -> AnyResult<()> {
    let mut diagnostics = Diagnostics::new();
    let (scene, animator) = load_document(
        &args_cmd.inpath.in_file,
        &ReadSettings::from(&args_cmd.inarg),
        &mut diagnostics,
    )?;
    if args_common.verbose {
        eprintln!("File successfully decoded.");
    }

    // Saving runs the same checks a later edit would hit.
    let mut reencoded = Vec::new();
    s3d_scene::write::write_document(&mut reencoded, &scene, &animator, &mut diagnostics)
        .context("File loads, but cannot be saved again")?;
    if args_common.verbose {
        eprintln!("File successfully re-encoded ({} bytes).", reencoded.len());
    }

    let warnings = diagnostics.warnings().count();
    if args_cmd.strict && warnings > 0 {
        bail!("{} warning(s) while loading", warnings);
    }
    Ok(())
}
