use std::path::PathBuf;

/// Errors produced while creating, writing, or reading a frame log.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Every candidate name (`base`, `base.1`, ... `base.N`) already exists.
    #[error("no free log name left for {base:?} after {attempts} attempts")]
    NameSpaceExhausted { base: PathBuf, attempts: usize },

    /// A frame ended before all of its bytes were available.
    #[error("truncated frame: expected {expected} bytes, found {found}")]
    DecodeTruncated { expected: usize, found: usize },

    #[error("not a frame log: bad magic {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported frame layout version {found}")]
    UnsupportedLayout { found: u16 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
