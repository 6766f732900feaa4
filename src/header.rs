use std::fmt;

/// Four character code identifying a chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{}\")", self)
    }
}

/// Header in front of every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct ChunkHeader {
    pub tag: Tag,
    pub bytes: u32,
}

/// Header of a top level container.
///
/// `bytes` counts everything after the tag and the length field itself,
/// so it includes `version` and all the sub-chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct ContainerHeader {
    pub tag: Tag,
    pub bytes: u32,
    pub version: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum HeaderParseError {
    #[error("Bytes array cannot be reinterpreted/cast: {0}")]
    Bytemuck(bytemuck::PodCastError),
}

impl ChunkHeader {
    pub const fn encoded_len() -> usize {
        std::mem::size_of::<Self>()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, HeaderParseError> {
        let raw: &ChunkHeader = bytemuck::try_from_bytes(buf)
            .map_err(HeaderParseError::Bytemuck)?;
        Ok(raw.to_le())
    }

    pub fn to_le(&self) -> Self {
        Self {
            tag: self.tag,
            bytes: self.bytes.to_le(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl ContainerHeader {
    pub const fn encoded_len() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Bytes covered by the length field that precede the first sub-chunk.
    pub const fn version_len() -> u32 {
        std::mem::size_of::<u32>() as u32
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, HeaderParseError> {
        let raw: &ContainerHeader = bytemuck::try_from_bytes(buf)
            .map_err(HeaderParseError::Bytemuck)?;
        Ok(raw.to_le())
    }

    pub fn to_le(&self) -> Self {
        Self {
            tag: self.tag,
            bytes: self.bytes.to_le(),
            version: self.version.to_le(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
