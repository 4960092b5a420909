//! Error taxonomy shared by the loader, the conversion engine, and the
//! leaf codecs.
//!
//! Every failure is classified by an [`ErrorKind`]; the engine and the
//! loader wrap kinds into a [`CodecError`], attaching the path at which
//! the failure occurred (a value path such as
//! `transfer.authorization[0].actor`, or a document path such as
//! `structs[3].fields[1].type`) and, for binary input, the byte offset
//! of the first unconsumable byte. A conversion aborts at the first
//! error; partial output is discarded by the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

/// Classification of every failure the codec can produce.
///
/// Variants carry the data needed to render an actionable message; they
/// deliberately never name Rust types, only wire-level concepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Malformed input text (JSON syntax, unparsable literals, stray
    /// members).
    #[error("parse error: {0}")]
    Parse(String),

    /// Binary underrun: the reader could not supply the requested bytes.
    #[error("stream underrun: requested {requested} byte(s) at offset {offset}, {remaining} remaining")]
    Stream {
        offset: usize,
        requested: usize,
        remaining: usize,
    },

    /// A value falls outside the domain of its wire type.
    #[error("value out of range: {0}")]
    Range(String),

    /// A variable-length integer ran too long or overflowed its width.
    #[error("integer overflow: {0}")]
    Overflow(String),

    /// A required (non-extension) struct field is absent from the input.
    #[error("missing field '{0}'")]
    MissingField(String),

    /// An extension field appeared after an earlier extension was absent.
    #[error("extension field '{0}' present after an absent extension")]
    ExtensionGap(String),

    /// A fixed-size array received the wrong number of elements.
    #[error("length mismatch: expected {expected} element(s), found {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A type name could not be resolved against the installed schema.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// A variant tag named none of the declared alternatives, or a
    /// decoded discriminant was out of bounds.
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),

    /// Alias resolution re-entered a name already being resolved.
    #[error("circular reference through type '{0}'")]
    CircularReference(String),

    /// Nesting exceeded the engine's fixed depth budget.
    #[error("recursion limit exceeded")]
    RecursionLimit,

    /// A textual name violates the base-32 identifier rules.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A public or private key could not be parsed or re-encoded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A signature could not be parsed or re-encoded.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Checksum text was malformed or a key/signature checksum did not
    /// match its payload.
    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    /// The ABI document declares a version this codec does not accept.
    #[error("unsupported ABI version '{0}'")]
    UnsupportedAbiVersion(String),

    /// Contract violation inside the codec itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Promotes the bare kind into a [`CodecError`] with no location.
    pub fn into_error(self) -> CodecError {
        CodecError {
            kind: self,
            path: None,
            offset: None,
        }
    }
}

/// An [`ErrorKind`] located within the input that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
    kind: ErrorKind,
    path: Option<String>,
    offset: Option<usize>,
}

impl CodecError {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Path into the value or document at which the failure occurred,
    /// if one was recorded.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Byte offset of the failure, recorded for binary input only.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Attaches a path unless one was already recorded deeper in the
    /// recursion.
    pub(crate) fn with_path(mut self, path: impl Into<String>) -> Self {
        if self.path.is_none() {
            self.path = Some(path.into());
        }
        self
    }

    /// Attaches a byte offset unless one was already recorded.
    pub(crate) fn with_offset(mut self, offset: usize) -> Self {
        if self.offset.is_none() {
            self.offset = Some(offset);
        }
        self
    }
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)?;
        if let Some(path) = &self.path {
            write!(f, " (at {})", path)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (byte offset {})", offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for CodecError {
    fn from(kind: ErrorKind) -> Self {
        kind.into_error()
    }
}
