//! Random-access byte providers.
//!
//! Every physical read the crate performs goes through [`ByteSource::read_at`],
//! which takes an explicit offset and `&self`.  No ambient cursor is shared
//! between streams, so any number of [`MsfStream`](crate::MsfStream)s over one
//! source can be read in any interleaving.
//!
//! Sources that only offer a cursor (`Read + Seek`) are adapted by
//! [`SeekSource`], which holds a lock across each paired seek+read.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

pub trait ByteSource {
    /// Read up to `buf.len()` bytes starting at absolute `offset`.
    ///
    /// May return fewer bytes than requested; `Ok(0)` for a non-empty buffer
    /// means `offset` is at or past the end of the source.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Like `read_at`, but keeps reading until `buf` is full or the source
    /// is exhausted.  Returns the number of bytes read.
    fn read_full_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.read_at(offset + filled as u64, &mut buf[filled..]) {
                Ok(0)  => break,
                Ok(n)  => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

// ── In-memory ────────────────────────────────────────────────────────────────

impl ByteSource for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = match usize::try_from(offset) {
            Ok(s) if s < self.len() => s,
            _ => return Ok(0),
        };
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl ByteSource for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_slice().read_at(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &T {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Arc<T> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

// ── Files ────────────────────────────────────────────────────────────────────

#[cfg(unix)]
impl ByteSource for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }
}

// seek_read moves the OS cursor, but never depends on it.
#[cfg(windows)]
impl ByteSource for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

// ── Cursor-based readers ─────────────────────────────────────────────────────

/// Adapts a `Read + Seek` reader into a [`ByteSource`].
///
/// The reader's cursor is shared state, so each `read_at` holds the mutex for
/// the duration of its seek and read.  Nothing assumes where the cursor is
/// left between calls.
pub struct SeekSource<R> {
    inner: Mutex<R>,
}

impl<R: Read + Seek> SeekSource<R> {
    pub fn new(reader: R) -> Self {
        Self { inner: Mutex::new(reader) }
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read + Seek> ByteSource for SeekSource<R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut reader = self.inner.lock();
        reader.seek(SeekFrom::Start(offset))?;
        reader.read(buf)
    }
}
