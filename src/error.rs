//! Error type definitions.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::convert::TryFrom;
use std::error;
use std::fmt;

pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;


/// A result that may contain a gif error.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains a gif error.
pub type UnitResult = Result<()>;


/// An error that may happen while reading or writing a gif file.
/// Distinguishes between three types of errors:
/// a stream that could not be opened, an invalid or truncated gif structure,
/// and transient io errors on an otherwise well-formed stream.
#[derive(Debug)]
pub enum Error {

    /// The input or output stream could not be established,
    /// for example because the file does not exist.
    Open(IoError),

    /// The contents of the stream are not supported by
    /// this specific implementation of gif,
    /// even though the data may be valid.
    NotSupported(Cow<'static, str>),

    /// The contents of the stream are not a valid gif,
    /// or the stream ended in the middle of a block.
    Invalid(Cow<'static, str>),

    /// The underlying byte stream could not be read or written.
    Io(IoError),
}


impl Error {

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `NotSupported`.
    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Error::NotSupported(message.into())
    }
}

/// Enable using the `?` operator on `std::io::Result`.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        if error.kind() == ErrorKind::UnexpectedEof {
            Error::invalid("reference to missing bytes")
        }
        else {
            Error::Io(error)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Open(err) => write!(formatter, "cannot open stream: {}", err),
            Error::NotSupported(message) => write!(formatter, "not supported: {}", message),
            Error::Invalid(message) => write!(formatter, "invalid: {}", message),
            Error::Io(err) => write!(formatter, "{}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Open(ref err) | Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}


/// The outcome of reading a gif stream with the `Decoder`.
/// Once an error status is set, it stays set until the next read,
/// but all frames decoded up to that point remain available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {

    /// No errors.
    Ok,

    /// The stream is malformed or truncated. It may have been decoded partially.
    FormatError,

    /// The stream could not be opened.
    OpenError,
}

impl Status {

    /// Whether this status reports an error.
    pub fn is_err(self) -> bool {
        self != Status::Ok
    }

    /// The numeric status code: `0` for no errors, `1` for a format error, `2` for an open error.
    pub fn code(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::FormatError => 1,
            Status::OpenError => 2,
        }
    }
}

impl From<&Error> for Status {
    fn from(error: &Error) -> Self {
        match error {
            Error::Open(_) => Status::OpenError,
            _ => Status::FormatError,
        }
    }
}


/// Return error on invalid range.
#[inline]
pub(crate) fn usize_to_u16(value: usize, error_message: &'static str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::invalid(error_message))
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_bytes_are_invalid(){
        let error = Error::from(IoError::new(ErrorKind::UnexpectedEof, "eof"));
        assert!(matches!(error, Error::Invalid(_)));
        assert_eq!(Status::from(&error), Status::FormatError);

        let error = Error::from(IoError::new(ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn status_codes(){
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::FormatError.code(), 1);
        assert_eq!(Status::OpenError.code(), 2);
        assert!(!Status::Ok.is_err());
        assert!(Status::OpenError.is_err());
    }

    #[test]
    fn u16_range(){
        assert_eq!(usize_to_u16(65535, "size").unwrap(), 65535);
        assert!(usize_to_u16(65536, "size").is_err());
    }
}
