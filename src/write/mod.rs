//! Encoding of the scene and animator containers.

use std::io::Write;

use crate::animator::Animator;
use crate::chunk::ChunkWriter;
use crate::diagnostics::Diagnostics;
use crate::header::Tag;
use crate::io::Format;
use crate::mesh::MeshError;
use crate::records::{NONE, tags};
use crate::scene::{Id, Scene, Table};

mod animator;
mod scene;

pub use animator::write_animator;
pub use scene::write_scene;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("'{tag}' chunk would hold {bytes} bytes, more than its length field can count")]
    TooLarge { tag: Tag, bytes: u64 },
    #[error("{what} '{name}': {field} refers to something that is not in the scene")]
    MissingReference {
        what: &'static str,
        name: String,
        field: &'static str,
    },
    #[error("{what} '{name}' cannot be saved: {source}")]
    Mesh {
        what: &'static str,
        name: String,
        source: MeshError,
    },
    #[error("Skinned mesh '{name}' has bone {bone} stored before its parent")]
    BoneOrder { name: String, bone: usize },
    #[error("Skinned mesh '{name}' has an IK handle on bone {bone}, but only {bones} bones")]
    HandleBone { name: String, bone: u32, bones: usize },
    #[error("Transform '{name}' is its own ancestor")]
    TransformCycle { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteSettings {
    /// Encoding to use. When unset, it is picked from the file extension.
    pub format: Option<Format>,
}

impl Default for WriteSettings {
    fn default() -> Self {
        Self { format: None }
    }
}

/// Byte offset into a chunk payload, checked to fit the format.
pub(crate) fn offset(tag: Tag, len: usize) -> Result<u32, WriteError> {
    u32::try_from(len).map_err(|_| WriteError::TooLarge {
        tag,
        bytes: len as u64,
    })
}

/// The string chunk of a container being built.
#[derive(Debug, Default)]
pub(crate) struct StringTable {
    pub bytes: Vec<u8>,
}

impl StringTable {
    /// Append `s`, returning its `[begin, end)` range.
    pub fn push(&mut self, s: &str) -> Result<(u32, u32), WriteError> {
        let begin = offset(tags::STRINGS, self.bytes.len())?;
        self.bytes.extend_from_slice(s.as_bytes());
        let end = offset(tags::STRINGS, self.bytes.len())?;
        Ok((begin, end))
    }
}

/// File index of an optional reference into `table`.
pub(crate) fn index_of<T>(
    table: &Table<T>,
    id: Option<Id<T>>,
    what: &'static str,
    name: &str,
    field: &'static str,
) -> Result<u32, WriteError> {
    match id {
        None => Ok(NONE),
        Some(id) if table.contains(id) => Ok(id.raw()),
        Some(_) => Err(WriteError::MissingReference {
            what,
            name: name.to_owned(),
            field,
        }),
    }
}

/// Write a scene container followed by an animator container.
pub fn write_document(
    write: &mut dyn Write,
    scene: &Scene,
    animator: &Animator,
    diagnostics: &mut Diagnostics,
) -> Result<(), WriteError> {
    let mut w = ChunkWriter::new(write);
    write_scene(&mut w, scene, diagnostics)?;
    write_animator(&mut w, animator)?;
    log::debug!("Wrote {} bytes", w.written());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Texture;

    #[test]
    fn strings_are_appended() {
        let mut strings = StringTable::default();
        assert_eq!(strings.push("rock").unwrap(), (0, 4));
        assert_eq!(strings.push("").unwrap(), (4, 4));
        assert_eq!(strings.push("cam").unwrap(), (4, 7));
        assert_eq!(strings.bytes, b"rockcam");
    }

    #[test]
    fn references_must_exist() {
        let mut table = Table::new();
        let id = table.insert("sky", Texture::default()).unwrap();
        assert_eq!(index_of(&table, None, "Material", "m", "albedo").unwrap(), NONE);
        assert_eq!(index_of(&table, Some(id), "Material", "m", "albedo").unwrap(), 0);
        let err = index_of(&table, Some(Id::from_index(3)), "Material", "m", "albedo")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Material 'm': albedo refers to something that is not in the scene"
        );
    }
}
