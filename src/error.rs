use thiserror::Error;

/// Errors shared by all decoders in this crate. Decoding fails fast: a failed
/// parse yields no partial result.
#[derive(Debug, Error)]
pub enum Error {
    #[error("end of data")]
    EndOfData,

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("{0}")]
    Format(&'static str),

    #[error("unknown unpack command {command:#04x} at position {position}")]
    Corrupt { command: u8, position: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Png(#[from] png::EncodingError),
}

pub type Result<T> = std::result::Result<T, Error>;
