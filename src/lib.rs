pub mod error;
pub mod source;
pub mod superblock;
pub mod block;
pub mod io_stream;
pub mod directory;
pub mod container;
pub mod perf;

pub use error::{MsfError, Result, Section};
pub use source::{ByteSource, SeekSource};
pub use superblock::Superblock;
pub use block::{BlockList, BlockSpan};
pub use io_stream::{MsfStream, ReadOutcome};
pub use directory::{StreamDirectory, StreamEntry};
pub use container::{open, open_at, open_reader, Msf};
