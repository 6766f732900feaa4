//! Decoding of the scene and animator containers.
//!
//! Loading is all or nothing: the first problem aborts the whole load with
//! a [`ReadError`] naming the byte offset where it was found. Problems that
//! do not make the result unusable are reported to [`Diagnostics`] instead.

use std::io::Read;

use crate::animator::{Animator, Path};
use crate::chunk::{ChunkReader, FORMAT_VERSION};
use crate::diagnostics::Diagnostics;
use crate::header::{HeaderParseError, Tag};
use crate::mesh::MeshError;
use crate::records::NONE;
use crate::scene::{Id, ResourceKind, Scene, Table};

mod animator;
mod scene;

pub use animator::read_animator;
pub use scene::read_scene;

#[derive(Debug, thiserror::Error)]
#[error("[at {offset}] {kind}")]
pub struct ReadError {
    /// Position in the stream where the problem was detected.
    pub offset: u64,
    pub kind: ReadErrorKind,
}

impl ReadError {
    pub fn new(offset: u64, kind: ReadErrorKind) -> Self {
        Self { offset, kind }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReadErrorKind {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Out of bytes reading header of '{tag}' chunk")]
    TruncatedHeader { tag: Tag },
    #[error("'{tag}' chunk should hold {expected} bytes, but only {found} remain")]
    TruncatedChunk { tag: Tag, expected: u32, found: u64 },
    #[error("Expected '{expected}' chunk, but read '{found}' chunk")]
    TagMismatch { expected: Tag, found: Tag },
    #[error("'{tag}' chunk holds {bytes} bytes, not a multiple of its {record_size} byte records")]
    Misaligned {
        tag: Tag,
        bytes: usize,
        record_size: usize,
    },
    #[error("Cannot decode header: {0}")]
    Header(#[from] HeaderParseError),
    #[error("'{tag}' version {version} is newer than latest supported ({})", FORMAT_VERSION)]
    UnsupportedVersion { tag: Tag, version: u32 },
    #[error("'{tag}' declares {declared} bytes, but its chunks hold {actual}")]
    LengthMismatch { tag: Tag, declared: u64, actual: u64 },
    #[error("{what} has invalid {pool} range [{begin},{end}) of {len}")]
    BadRange {
        what: &'static str,
        pool: &'static str,
        begin: u32,
        end: u32,
        len: usize,
    },
    #[error("{what} has out-of-range {field} {index} (there are {len})")]
    BadIndex {
        what: &'static str,
        field: &'static str,
        index: u32,
        len: usize,
    },
    #[error("{what} {index} is stored before its parent {parent}")]
    NotTopological {
        what: &'static str,
        index: u32,
        parent: u32,
    },
    #[error("{what} '{name}' is malformed: {source}")]
    Mesh {
        what: &'static str,
        name: String,
        source: MeshError,
    },
    #[error("{kind} has duplicated name '{name}'")]
    DuplicateName { kind: ResourceKind, name: String },
    #[error("{what} has unknown {field} '{}'", .value.escape_ascii())]
    UnknownEnumerant {
        what: &'static str,
        field: &'static str,
        value: u8,
    },
    #[error("{what} has unknown {field} bits {bits:#04x}")]
    UnknownFlags {
        what: &'static str,
        field: &'static str,
        bits: u32,
    },
    #[error("{what} name is not valid UTF-8: {source}")]
    InvalidName {
        what: &'static str,
        source: std::str::Utf8Error,
    },
    #[error("{what} texture has {bytes} bytes of data; expected {expected}")]
    BadTextureData {
        what: &'static str,
        bytes: u32,
        expected: &'static str,
    },
    #[error("Channel '{path}' is stored more than once")]
    DuplicatePath { path: Path },
}

/// Attach the offset of the chunk being decoded.
pub(crate) trait AtOffset<T> {
    fn at(self, offset: u64) -> Result<T, ReadError>;
}

impl<T> AtOffset<T> for Result<T, ReadErrorKind> {
    fn at(self, offset: u64) -> Result<T, ReadError> {
        self.map_err(|kind| ReadError::new(offset, kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadSettings {
    /// Fail instead of warning when the scene container's declared length
    /// disagrees with what its chunks hold. The animator container is
    /// always checked strictly.
    pub strict_length: bool,
}

impl Default for ReadSettings {
    fn default() -> Self {
        Self {
            strict_length: false,
        }
    }
}

/// The string chunk of a container.
pub(crate) struct Strings(pub Vec<u8>);

impl Strings {
    pub fn get(&self, what: &'static str, begin: u32, end: u32) -> Result<&str, ReadErrorKind> {
        let bytes = self.bytes(what, begin, end)?;
        std::str::from_utf8(bytes).map_err(|source| ReadErrorKind::InvalidName { what, source })
    }

    pub fn bytes(&self, what: &'static str, begin: u32, end: u32) -> Result<&[u8], ReadErrorKind> {
        checked_range(what, "string", begin, end, self.0.len())?;
        Ok(&self.0[begin as usize..end as usize])
    }
}

pub(crate) fn checked_range(
    what: &'static str,
    pool: &'static str,
    begin: u32,
    end: u32,
    len: usize,
) -> Result<(), ReadErrorKind> {
    if begin > end || end as usize > len {
        return Err(ReadErrorKind::BadRange {
            what,
            pool,
            begin,
            end,
            len,
        });
    }
    Ok(())
}

/// Resolve a stored index into an id of an already loaded table.
pub(crate) fn reference<T>(
    table: &Table<T>,
    what: &'static str,
    field: &'static str,
    index: u32,
) -> Result<Option<Id<T>>, ReadErrorKind> {
    if index == NONE {
        return Ok(None);
    }
    if index as usize >= table.len() {
        return Err(ReadErrorKind::BadIndex {
            what,
            field,
            index,
            len: table.len(),
        });
    }
    Ok(Some(Id::from_index(index)))
}

pub(crate) fn insert<T>(
    table: &mut Table<T>,
    kind: ResourceKind,
    name: &str,
    value: T,
) -> Result<Id<T>, ReadErrorKind> {
    table
        .insert(name, value)
        .map_err(|e| ReadErrorKind::DuplicateName { kind, name: e.name })
}

/// Check a container's declared length against what was consumed.
pub(crate) fn check_length(
    tag: Tag,
    declared: u32,
    actual: u64,
) -> Result<(), ReadErrorKind> {
    if u64::from(declared) != actual {
        return Err(ReadErrorKind::LengthMismatch {
            tag,
            declared: declared.into(),
            actual,
        });
    }
    Ok(())
}

/// Read a scene container followed by an animator container.
pub fn read_document(
    read: &mut dyn Read,
    settings: &ReadSettings,
    diagnostics: &mut Diagnostics,
) -> Result<(Scene, Animator), ReadError> {
    let mut r = ChunkReader::new(read);
    let scene = read_scene(&mut r, settings, diagnostics)?;
    let animator = read_animator(&mut r)?;
    Ok((scene, animator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_checked() {
        let strings = Strings(b"rock\xffcam".to_vec());
        assert_eq!(strings.get("Texture", 0, 4).unwrap(), "rock");
        assert!(matches!(
            strings.get("Texture", 3, 2),
            Err(ReadErrorKind::BadRange { .. })
        ));
        assert!(matches!(
            strings.get("Texture", 5, 9),
            Err(ReadErrorKind::BadRange { end: 9, len: 8, .. })
        ));
        assert!(matches!(
            strings.get("Texture", 0, 5),
            Err(ReadErrorKind::InvalidName { .. })
        ));
    }

    #[test]
    fn sentinel_and_one_past_end() {
        let mut table = Table::new();
        table.insert("a", ()).unwrap();
        assert_eq!(reference(&table, "Material", "albedo", NONE).unwrap(), None);
        assert_eq!(
            reference(&table, "Material", "albedo", 0).unwrap(),
            Some(Id::from_index(0))
        );
        let err = reference(&table, "Material", "albedo", 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Material has out-of-range albedo 1 (there are 1)"
        );
    }

    #[test]
    fn unknown_enumerant_is_escaped() {
        let err = ReadErrorKind::UnknownEnumerant {
            what: "Material",
            field: "type",
            value: 0x07,
        };
        assert_eq!(err.to_string(), "Material has unknown type '\\x07'");
    }
}
