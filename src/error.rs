use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Session construction failures.
///
/// Hot-path problems (framing mismatches, checksum failures, buffer
/// exhaustion) are never surfaced as `Err` values: the stream is assumed to
/// be lossy and the parser recovers locally by rescanning, reporting through
/// the configured sinks instead.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("parser registry is empty")]
    ErrEmptyRegistry,
    #[error("an end of message handler is required")]
    ErrMissingMessageHandler,
    #[error("buffer capacity {0} is below the 256 byte minimum")]
    ErrBufferTooSmall(usize),
}
