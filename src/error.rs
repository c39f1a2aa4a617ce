use core::fmt;

/// The class of an error.
///
/// Every [`ErrorCode`] belongs to exactly one kind; callers that only care about the
/// broad category match on [`Error::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input bytes violate the expected grammar (JSON, CBOR or collation).
    Malformed,
    /// Input uses a feature this crate does not implement.
    Unsupported,
    /// Output buffer capacity or scratch sizing exhausted.
    Overflow,
    /// Pointer addressed a map key that is absent.
    NotFound,
    /// Pointer addressed an array index past the end.
    IndexOutOfRange,
    /// Pointer is syntactically invalid or descends into a non-container.
    InvalidPointer,
    /// A number does not fit the requested representation.
    NumberOutOfRange,
    /// The addressed container does not support the operation.
    UnsupportedContainer,
}

/// A stable, string-free error code identifying why an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Unexpected end of input.
    UnexpectedEof,
    /// Non-space bytes follow the top-level value.
    TrailingBytes,
    /// Arithmetic overflow while computing a length or offset.
    LengthOverflow,
    /// Nesting depth limit exceeded.
    DepthLimitExceeded,
    /// Reserved CBOR additional-info value (28..30).
    ReservedAdditionalInfo,
    /// Break-stop outside an indefinite-length container.
    UnexpectedBreak,
    /// Tag payload does not have the shape its tag number requires.
    MalformedTag,
    /// Tag 0 payload is not an RFC-3339 date-time.
    InvalidDateTime,
    /// Tag 35 payload is not a valid regular expression.
    InvalidRegex,
    /// Invalid UTF-8 in text.
    Utf8Invalid,
    /// JSON text violates the grammar.
    JsonSyntax,
    /// Invalid escape sequence inside a JSON string.
    InvalidEscape,
    /// Numeric text does not follow the JSON number grammar.
    InvalidNumber,
    /// Map key is not a text string.
    MapKeyMustBeText,
    /// Collated datum is missing its terminator.
    Unterminated,
    /// Unknown collation type byte.
    UnknownCollationType,
    /// Collated container terminator where a datum was expected.
    UnexpectedTerminator,
    /// Collated length prefix disagrees with the element count.
    LengthPrefixMismatch,

    /// CBOR float16 is not supported.
    Float16,
    /// Indefinite-length header on major type 0, 1 or 6.
    IndefiniteInvalid,
    /// Indefinite-length byte or text string chunks.
    IndefiniteChunks,
    /// Value has no JSON representation.
    NotJsonRepresentable,
    /// Value has no collation representation.
    NotCollatable,
    /// Simple value outside the encodable ranges 0..19 and 32..255.
    InvalidSimpleValue,
    /// NaN or infinity where a finite number is required.
    NonFiniteNumber,
    /// Decode-only marker passed to an encoder.
    UnexpectedMarker,

    /// Output buffer full.
    BufferFull,
    /// Map has more keys than `Config::max_keys`.
    TooManyKeys,

    /// Map key absent.
    KeyNotFound,
    /// Array index past the end.
    IndexOutOfRange,
    /// Pointer text is not RFC-6901.
    PointerSyntax,
    /// Array index segment is not a non-negative decimal.
    BadIndex,
    /// Pointer descends into a scalar.
    NotAContainer,

    /// Negative CBOR integer below `i64::MIN`, or an integer too large for its target.
    IntegerOverflow,
    /// Fractional number where an integer is required.
    FractionalInteger,
    /// Decimal exponent outside the `i64` range.
    ExponentOverflow,

    /// Prepend or append on a map.
    NotAnArray,
}

impl ErrorCode {
    /// Returns the class this code belongs to.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::UnexpectedEof
            | Self::TrailingBytes
            | Self::LengthOverflow
            | Self::DepthLimitExceeded
            | Self::ReservedAdditionalInfo
            | Self::UnexpectedBreak
            | Self::MalformedTag
            | Self::InvalidDateTime
            | Self::InvalidRegex
            | Self::Utf8Invalid
            | Self::JsonSyntax
            | Self::InvalidEscape
            | Self::InvalidNumber
            | Self::MapKeyMustBeText
            | Self::Unterminated
            | Self::UnknownCollationType
            | Self::UnexpectedTerminator
            | Self::LengthPrefixMismatch => ErrorKind::Malformed,

            Self::Float16
            | Self::IndefiniteInvalid
            | Self::IndefiniteChunks
            | Self::NotJsonRepresentable
            | Self::NotCollatable
            | Self::InvalidSimpleValue
            | Self::NonFiniteNumber
            | Self::UnexpectedMarker => ErrorKind::Unsupported,

            Self::BufferFull | Self::TooManyKeys => ErrorKind::Overflow,

            Self::KeyNotFound => ErrorKind::NotFound,
            Self::IndexOutOfRange => ErrorKind::IndexOutOfRange,
            Self::PointerSyntax | Self::BadIndex | Self::NotAContainer => {
                ErrorKind::InvalidPointer
            }
            Self::IntegerOverflow | Self::FractionalInteger | Self::ExponentOverflow => {
                ErrorKind::NumberOutOfRange
            }
            Self::NotAnArray => ErrorKind::UnsupportedContainer,
        }
    }

    /// Returns a brief, human-readable cause.
    #[must_use]
    pub const fn cause(self) -> &'static str {
        match self {
            Self::UnexpectedEof => "unexpected end of input",
            Self::TrailingBytes => "trailing bytes after value",
            Self::LengthOverflow => "length overflow",
            Self::DepthLimitExceeded => "nesting depth limit exceeded",
            Self::ReservedAdditionalInfo => "reserved additional info value",
            Self::UnexpectedBreak => "break-stop outside indefinite container",
            Self::MalformedTag => "malformed tag payload",
            Self::InvalidDateTime => "tag 0 payload is not an RFC-3339 date-time",
            Self::InvalidRegex => "tag 35 payload is not a valid regular expression",
            Self::Utf8Invalid => "text must be valid UTF-8",
            Self::JsonSyntax => "invalid JSON",
            Self::InvalidEscape => "invalid JSON string escape",
            Self::InvalidNumber => "invalid numeric text",
            Self::MapKeyMustBeText => "map keys must be text strings",
            Self::Unterminated => "collated datum is not terminated",
            Self::UnknownCollationType => "unknown collation type byte",
            Self::UnexpectedTerminator => "terminator where a collated datum was expected",
            Self::LengthPrefixMismatch => "collated length prefix mismatch",

            Self::Float16 => "float16 is not supported",
            Self::IndefiniteInvalid => "indefinite length on integer or tag",
            Self::IndefiniteChunks => "indefinite-length string chunks are not supported",
            Self::NotJsonRepresentable => "value has no JSON representation",
            Self::NotCollatable => "value has no collation representation",
            Self::InvalidSimpleValue => "simple value out of range",
            Self::NonFiniteNumber => "number must be finite",
            Self::UnexpectedMarker => "decode-time marker cannot be encoded here",

            Self::BufferFull => "output buffer full",
            Self::TooManyKeys => "map has more keys than max_keys",

            Self::KeyNotFound => "map key not found",
            Self::IndexOutOfRange => "array index out of range",
            Self::PointerSyntax => "invalid JSON pointer",
            Self::BadIndex => "invalid array index segment",
            Self::NotAContainer => "pointer descends into a non-container",

            Self::IntegerOverflow => "integer out of range",
            Self::FractionalInteger => "fractional number where integer required",
            Self::ExponentOverflow => "decimal exponent out of range",

            Self::NotAnArray => "target container is not an array",
        }
    }
}

/// An error with a stable code and the byte offset where it was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Error {
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset into the input where the error was detected (0 when not meaningful).
    pub offset: usize,
}

impl Error {
    /// Construct an error at `offset`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }

    /// Returns the class of this error.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        self.code.kind()
    }

    /// Returns a brief cause string.
    #[inline]
    #[must_use]
    pub const fn cause(self) -> &'static str {
        self.code.cause()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Malformed => "malformed",
            Self::Unsupported => "unsupported",
            Self::Overflow => "overflow",
            Self::NotFound => "not found",
            Self::IndexOutOfRange => "index out of range",
            Self::InvalidPointer => "invalid pointer",
            Self::NumberOutOfRange => "number out of range",
            Self::UnsupportedContainer => "unsupported container",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind(), self.offset, self.cause())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cold]
#[inline(never)]
pub(crate) const fn err(code: ErrorCode, offset: usize) -> Error {
    Error::new(code, offset)
}
