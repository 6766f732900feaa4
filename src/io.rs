//! Loading and saving whole documents by path.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::animator::Animator;
use crate::diagnostics::Diagnostics;
use crate::read::{ReadError, ReadSettings, read_document};
use crate::scene::Scene;
use crate::write::{WriteError, WriteSettings, write_document};

/// Extension of the binary encoding.
pub const BINARY_EXTENSION: &str = "s3d";
/// Extension of the structured (text) encoding.
pub const STRUCTURED_EXTENSION: &str = "js3d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Chunked binary containers.
    Binary,
    /// Text encoding, handled outside this crate.
    Structured,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Format::Binary => "binary",
            Format::Structured => "structured",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("Failed to load '{}' as s3d:", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
    #[error("Cannot pick a format for '{}': expected a .s3d or .js3d extension", path.display())]
    UnknownExtension { path: PathBuf },
    #[error("The {0} format is not supported by this build")]
    UnsupportedFormat(Format),
}

/// Pick the encoding of a stream from its first significant byte.
///
/// Leading ASCII whitespace is skipped. Anything that is neither a binary
/// container nor an object opener is assumed to be structured, with a note.
pub fn detect_format(bytes: &[u8], diagnostics: &mut Diagnostics) -> Format {
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b's') => Format::Binary,
        Some(b'{') => Format::Structured,
        Some(other) => {
            diagnostics.info(format!(
                "Unrecognized leading byte '{}'; assuming structured format",
                other.escape_ascii()
            ));
            Format::Structured
        }
        None => {
            diagnostics.info("File is empty; assuming structured format");
            Format::Structured
        }
    }
}

/// Encoding implied by the extension of `path`.
pub fn format_for_path(path: &Path) -> Result<Format, Error> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(BINARY_EXTENSION) => Ok(Format::Binary),
        Some(STRUCTURED_EXTENSION) => Ok(Format::Structured),
        _ => Err(Error::UnknownExtension {
            path: path.to_owned(),
        }),
    }
}

pub fn load(path: &Path, diagnostics: &mut Diagnostics) -> Result<(Scene, Animator), Error> {
    load_with_settings(path, &ReadSettings::default(), diagnostics)
}

pub fn load_with_settings(
    path: &Path,
    settings: &ReadSettings,
    diagnostics: &mut Diagnostics,
) -> Result<(Scene, Animator), Error> {
    load_inner(path, settings, diagnostics).map_err(|e| Error::Load {
        path: path.to_owned(),
        source: Box::new(e),
    })
}

fn load_inner(
    path: &Path,
    settings: &ReadSettings,
    diagnostics: &mut Diagnostics,
) -> Result<(Scene, Animator), Error> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    log::debug!("Loading {} bytes from {}", bytes.len(), path.display());
    match detect_format(&bytes, diagnostics) {
        Format::Binary => {
            let start = bytes
                .iter()
                .position(|b| !b.is_ascii_whitespace())
                .unwrap_or(bytes.len());
            let mut input = &bytes[start..];
            let document = read_document(&mut input, settings, diagnostics)?;
            if !input.is_empty() {
                diagnostics.warn(format!(
                    "{} trailing bytes after the animator were ignored",
                    input.len()
                ));
            }
            Ok(document)
        }
        format => Err(Error::UnsupportedFormat(format)),
    }
}

pub fn save(
    path: &Path,
    scene: &Scene,
    animator: &Animator,
    format: Option<Format>,
    diagnostics: &mut Diagnostics,
) -> Result<(), Error> {
    save_with_settings(path, scene, animator, &WriteSettings { format }, diagnostics)
}

/// Encode the document in memory, then replace `path` through a temporary
/// sibling file so a failed save never leaves a half-written file behind.
pub fn save_with_settings(
    path: &Path,
    scene: &Scene,
    animator: &Animator,
    settings: &WriteSettings,
    diagnostics: &mut Diagnostics,
) -> Result<(), Error> {
    let format = match settings.format {
        Some(format) => format,
        None => format_for_path(path)?,
    };
    if format != Format::Binary {
        return Err(Error::UnsupportedFormat(format));
    }

    let mut bytes = Vec::new();
    write_document(&mut bytes, scene, animator, diagnostics)?;

    let temp = temp_path(path);
    if let Err(e) = fs::write(&temp, &bytes).and_then(|()| fs::rename(&temp, path)) {
        if let Err(cleanup) = fs::remove_file(&temp) {
            log::debug!("Could not remove {}: {}", temp.display(), cleanup);
        }
        return Err(e.into());
    }
    log::debug!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".temp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_from_leading_byte() {
        let mut diag = Diagnostics::new();
        assert_eq!(detect_format(b"s3ds....", &mut diag), Format::Binary);
        assert_eq!(detect_format(b" \n\t{\"a\":1}", &mut diag), Format::Structured);
        assert!(diag.is_empty());
        assert_eq!(detect_format(b"garbage", &mut diag), Format::Structured);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn formats_from_extension() {
        assert_eq!(format_for_path(Path::new("a/b.s3d")).unwrap(), Format::Binary);
        assert_eq!(format_for_path(Path::new("b.js3d")).unwrap(), Format::Structured);
        assert!(matches!(
            format_for_path(Path::new("b.obj")),
            Err(Error::UnknownExtension { .. })
        ));
        assert!(format_for_path(Path::new("noext")).is_err());
    }

    #[test]
    fn temp_file_sits_next_to_target() {
        assert_eq!(temp_path(Path::new("dir/scene.s3d")), Path::new("dir/scene.s3d.temp"));
    }
}
