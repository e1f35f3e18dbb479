//! Whole-stream reads.
//!
//! [`read_streams`] pulls the full contents of many streams at once.  With the
//! `parallel` feature each stream is read on its own Rayon task; this is safe
//! because streams only issue positional reads against the shared source and
//! never move a shared cursor.  Without the feature the streams are read one
//! after another.  Either way the output order matches the input order.
//!
//! [`hash_stream`] digests a stream without holding its contents in memory.

use std::io::{self, Seek, SeekFrom};
use crate::io_stream::MsfStream;
use crate::source::ByteSource;

/// Read a stream's full contents from logical offset 0.  The stream's cursor
/// is left untouched.
///
/// The result is shorter than `stream.len()` only if the source ends before
/// the stream's last block.
pub fn read_stream<S: ByteSource>(stream: &MsfStream<S>) -> io::Result<Vec<u8>> {
    let mut out = vec![0u8; stream.len() as usize];
    let mut done = 0usize;
    while done < out.len() {
        let n = stream.read_at(done as u64, &mut out[done..])?;
        if n == 0 { break; }
        done += n;
    }
    out.truncate(done);
    Ok(out)
}

/// BLAKE3 digest of a stream's contents, fed through a cloned cursor so the
/// caller's position is untouched.
pub fn hash_stream<S: ByteSource>(stream: &MsfStream<S>) -> io::Result<blake3::Hash> {
    let mut s = stream.clone();
    s.seek(SeekFrom::Start(0))?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut s, &mut hasher)?;
    Ok(hasher.finalize())
}

/// Read every stream in `streams`.  The first error aborts the batch.
pub fn read_streams<S>(streams: &[MsfStream<S>]) -> io::Result<Vec<Vec<u8>>>
where
    S: ByteSource + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        streams.par_iter().map(read_stream).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        streams.iter().map(read_stream).collect()
    }
}
