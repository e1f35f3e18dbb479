use std::fmt;
use std::io::{Read, Seek};
use std::sync::Arc;
use tracing::debug;

use crate::directory::StreamDirectory;
use crate::error::Result;
use crate::io_stream::MsfStream;
use crate::source::{ByteSource, SeekSource};
use crate::superblock::{read_magic, Superblock};

/// An opened container: the decoded header plus its streams.
///
/// Most callers only need the streams; see [`open`].
pub struct Msf<S> {
    pub superblock:  Superblock,
    pub base_offset: u64,
    pub streams:     Vec<MsfStream<S>>,
}

impl<S> fmt::Debug for Msf<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Msf")
            .field("superblock", &self.superblock)
            .field("base_offset", &self.base_offset)
            .field("streams", &self.streams)
            .finish()
    }
}

impl<S: ByteSource> Msf<S> {
    /// Open the container whose magic sits at `base_offset` in `source`.
    ///
    /// Either every stream is returned or the whole open fails; there is no
    /// partial result.
    pub fn open_at(source: Arc<S>, base_offset: u64) -> Result<Self> {
        let after_magic = read_magic(&*source, base_offset)?;
        let superblock = Superblock::read_at(&*source, after_magic)?;
        debug!(
            base_offset,
            block_size = superblock.block_size,
            block_count = superblock.block_count,
            directory_bytes = superblock.directory_byte_count,
            block_map = superblock.block_map_address,
            "read msf superblock"
        );

        let directory = StreamDirectory::load(&source, &superblock, base_offset)?;
        let streams = directory.into_streams(&source, base_offset)?;
        Ok(Self { superblock, base_offset, streams })
    }

    pub fn open(source: S) -> Result<Self> {
        Self::open_at(Arc::new(source), 0)
    }

    pub fn into_streams(self) -> Vec<MsfStream<S>> {
        self.streams
    }
}

/// Open a container that starts at offset 0 of `source` and return its
/// streams in directory order.
pub fn open<S: ByteSource>(source: S) -> Result<Vec<MsfStream<S>>> {
    Msf::open(source).map(Msf::into_streams)
}

/// Open a container embedded at `base_offset`.  Block indices are resolved
/// relative to that offset.
pub fn open_at<S: ByteSource>(source: Arc<S>, base_offset: u64) -> Result<Vec<MsfStream<S>>> {
    Msf::open_at(source, base_offset).map(Msf::into_streams)
}

/// Open a container from a cursor-based reader, starting at the reader's
/// current position.
pub fn open_reader<R: Read + Seek>(mut reader: R) -> Result<Vec<MsfStream<SeekSource<R>>>> {
    let base_offset = reader.stream_position()?;
    open_at(Arc::new(SeekSource::new(reader)), base_offset)
}
