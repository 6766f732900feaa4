//! Reading and writing of tagged, length-prefixed chunks.
//!
//! ```text
//! +------+--------+--------------------------+
//! | tag  | bytes  | payload (bytes long)     |
//! | [u8;4] | u32 LE |                        |
//! +------+--------+--------------------------+
//! ```
//!
//! A container is a chunk whose payload starts with a `u32` version, followed
//! by the sub-chunks. Record arrays are packed with no padding.

use std::io::{ErrorKind, Read, Write};

use bytemuck::Pod;

use crate::header::{ChunkHeader, ContainerHeader, Tag};
use crate::read::{ReadError, ReadErrorKind};
use crate::write::WriteError;

/// Highest container version this crate understands.
pub const FORMAT_VERSION: u32 = 0;

/// Size of a chunk on disk, header included.
pub const fn chunk_len(payload: usize) -> u64 {
    ChunkHeader::encoded_len() as u64 + payload as u64
}

pub struct ChunkReader<'s> {
    read: &'s mut dyn Read,
    offset: u64,
}

impl<'s> ChunkReader<'s> {
    pub fn new(read: &'s mut dyn Read) -> Self {
        Self { read, offset: 0 }
    }

    /// Absolute position in the stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Fill `buf` as far as the stream allows, returning how much was read.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(ReadError::new(
                        self.offset + filled as u64,
                        ReadErrorKind::Io(e),
                    ));
                }
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    fn read_header<const N: usize>(
        &mut self,
        tag: Tag,
    ) -> Result<[u8; N], ReadError> {
        let start = self.offset;
        let mut buf = [0u8; N];
        if self.read_full(&mut buf)? < N {
            return Err(ReadError::new(start, ReadErrorKind::TruncatedHeader { tag }));
        }
        let found = Tag([buf[0], buf[1], buf[2], buf[3]]);
        if found != tag {
            return Err(ReadError::new(
                start,
                ReadErrorKind::TagMismatch { expected: tag, found },
            ));
        }
        Ok(buf)
    }

    /// Read the header of a top level container.
    ///
    /// The caller is responsible for checking the declared length against
    /// what the sub-chunks actually consumed.
    pub fn read_container(&mut self, tag: Tag) -> Result<ContainerHeader, ReadError> {
        let start = self.offset;
        let buf = self.read_header::<12>(tag)?;
        let header = ContainerHeader::from_bytes(&buf)
            .map_err(|e| ReadError::new(start, ReadErrorKind::Header(e)))?;
        if header.version > FORMAT_VERSION {
            return Err(ReadError::new(
                start,
                ReadErrorKind::UnsupportedVersion {
                    tag,
                    version: header.version,
                },
            ));
        }
        Ok(header)
    }

    /// Read a chunk of raw bytes.
    pub fn read_bytes(&mut self, tag: Tag) -> Result<Vec<u8>, ReadError> {
        let start = self.offset;
        let buf = self.read_header::<8>(tag)?;
        let header = ChunkHeader::from_bytes(&buf)
            .map_err(|e| ReadError::new(start, ReadErrorKind::Header(e)))?;
        let expected = header.bytes;
        // Grow as data arrives instead of trusting the declared size.
        let mut payload = Vec::new();
        let result = (&mut *self.read)
            .take(u64::from(expected))
            .read_to_end(&mut payload);
        let got = result.map_err(|e| ReadError::new(start, ReadErrorKind::Io(e)))?;
        self.offset += got as u64;
        if got < expected as usize {
            return Err(ReadError::new(
                start,
                ReadErrorKind::TruncatedChunk {
                    tag,
                    expected,
                    found: got as u64,
                },
            ));
        }
        Ok(payload)
    }

    /// Read a chunk holding an array of fixed size records.
    pub fn read_records<T: Pod>(&mut self, tag: Tag) -> Result<Vec<T>, ReadError> {
        let start = self.offset;
        let payload = self.read_bytes(tag)?;
        let record_size = std::mem::size_of::<T>();
        if payload.len() % record_size != 0 {
            return Err(ReadError::new(
                start,
                ReadErrorKind::Misaligned {
                    tag,
                    bytes: payload.len(),
                    record_size,
                },
            ));
        }
        Ok(bytemuck::pod_collect_to_vec(&payload))
    }
}

pub struct ChunkWriter<'s> {
    write: &'s mut dyn Write,
    written: u64,
}

impl<'s> ChunkWriter<'s> {
    pub fn new(write: &'s mut dyn Write) -> Self {
        Self { write, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.write.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Write a container header whose sub-chunks total `children` bytes.
    pub fn write_container(&mut self, tag: Tag, children: u64) -> Result<(), WriteError> {
        let bytes = children + u64::from(ContainerHeader::version_len());
        let bytes = u32::try_from(bytes)
            .map_err(|_| WriteError::TooLarge { tag, bytes })?;
        let header = ContainerHeader {
            tag,
            bytes,
            version: FORMAT_VERSION,
        }
        .to_le();
        self.emit(header.as_bytes())
    }

    /// Write a container whose sub-chunks are produced by `body`.
    ///
    /// The body is encoded to memory first so the header can carry its
    /// exact length.
    pub fn write_container_with(
        &mut self,
        tag: Tag,
        body: impl FnOnce(&mut ChunkWriter<'_>) -> Result<(), WriteError>,
    ) -> Result<(), WriteError> {
        let mut buf = Vec::new();
        body(&mut ChunkWriter::new(&mut buf))?;
        self.write_container(tag, buf.len() as u64)?;
        self.emit(&buf)
    }

    pub fn write_bytes(&mut self, tag: Tag, payload: &[u8]) -> Result<(), WriteError> {
        let bytes = u32::try_from(payload.len()).map_err(|_| WriteError::TooLarge {
            tag,
            bytes: payload.len() as u64,
        })?;
        let header = ChunkHeader { tag, bytes }.to_le();
        self.emit(header.as_bytes())?;
        self.emit(payload)
    }

    pub fn write_records<T: Pod>(&mut self, tag: Tag, records: &[T]) -> Result<(), WriteError> {
        self.write_bytes(tag, bytemuck::cast_slice(records))
    }
}
