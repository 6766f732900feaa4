use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::io::{load_with_settings, save};
use s3d_scene::read::ReadSettings;
use s3d_scene::{Animator, Scene};

use crate::prelude::*;

pub fn load_document(
    path: &Path,
    settings: &ReadSettings,
    diagnostics: &mut Diagnostics,
) -> AnyResult<(Scene, Animator)> {
    let document = load_with_settings(path, settings, diagnostics)?;
    log::info!(
        "Loaded {}: {} resources, {} instances, {} animated channels",
        path.display(),
        document.0.resource_count(),
        document.0.instance_count(),
        document.1.len(),
    );
    Ok(document)
}

/// Save over `path`, refusing to replace an existing file unless allowed.
pub fn save_document(
    path: &Path,
    scene: &Scene,
    animator: &Animator,
    overwrite: bool,
    diagnostics: &mut Diagnostics,
) -> AnyResult<()> {
    if !overwrite && path.exists() {
        bail!("Output file {} exists (use --overwrite to replace it)", path.display());
    }
    save(path, scene, animator, None, diagnostics)
        .with_context(|| format!("Cannot save {}", path.display()))
}
