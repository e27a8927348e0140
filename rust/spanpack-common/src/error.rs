use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if the error was raised because a decoder asked for more
    /// bits or bytes than the buffer holds.
    pub fn is_stream_exhausted(&self) -> bool {
        matches!(self.kind(), ErrorKind::StreamExhausted { .. })
    }

    #[cold]
    pub fn stream_exhausted(bit_position: usize) -> Error {
        Error(ErrorKind::StreamExhausted { bit_position }.into())
    }

    #[cold]
    pub fn integer_overflow(element: impl Into<String>) -> Error {
        Error(
            ErrorKind::IntegerOverflow {
                element: element.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The stream ran out of input while a bit or byte was still required.
    /// `bit_position` is the number of bits consumed before the failing read.
    #[error("stream exhausted after {bit_position} bits")]
    StreamExhausted { bit_position: usize },

    /// A decoded quantity does not fit in 64 bits. Only reported once every bit
    /// of the offending code is present.
    #[error("integer overflow while decoding '{element}'")]
    IntegerOverflow { element: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
