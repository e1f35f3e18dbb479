use std::fmt;
use std::io;
use thiserror::Error;

/// Part of the container that was being decoded when input ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Magic,
    Superblock,
    BlockMap,
    Directory,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::Magic      => "file magic",
            Section::Superblock => "superblock",
            Section::BlockMap   => "block map",
            Section::Directory  => "stream directory",
        })
    }
}

#[derive(Error, Debug)]
pub enum MsfError {
    #[error("Invalid file magic, the source might not be a valid MSF container")]
    InvalidMagic,
    #[error("Truncated {section}: expected {expected} bytes, got {actual}")]
    TruncatedInput {
        section:  Section,
        expected: u64,
        actual:   u64,
    },
    #[error("Invalid block size in superblock (expected 512, 1024, 2048 or 4096, got {0})")]
    InvalidSuperblock(u32),
    #[error("MSF streams are read-only")]
    Unsupported,
    #[error("Block {block} cannot be addressed: physical offset overflows u64")]
    AddressOverflow { block: u32 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl MsfError {
    pub(crate) fn truncated(section: Section, expected: u64, actual: u64) -> Self {
        MsfError::TruncatedInput { section, expected, actual }
    }

    /// True for the failures that mean "this is not (or no longer) a whole
    /// MSF container", as opposed to a fault of the underlying source.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, MsfError::Io(_) | MsfError::Unsupported)
    }
}

impl From<MsfError> for io::Error {
    fn from(err: MsfError) -> Self {
        match err {
            MsfError::Io(e)                   => e,
            MsfError::Unsupported             => io::Error::new(io::ErrorKind::Unsupported, err),
            MsfError::TruncatedInput { .. }   => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            other                             => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, MsfError>;
