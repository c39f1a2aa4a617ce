use crate::error::{err, Error, ErrorCode};

/// Default maximum nesting depth for recursive transcoding.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default per-map key limit used to size collation scratch.
pub const DEFAULT_MAX_KEYS: usize = 1000;

/// The text that collates as `Missing` when [`Config::do_missing`] is set.
pub const MISSING_LITERAL: &str = "~[]{}falsenilNA~";

/// How JSON numeric literals are carried and how collation normalizes numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    /// Keep numbers as raw JSON text (CBOR tag 38); collate exact decimal digits.
    JsonNumber,
    /// Every number is a signed 64-bit integer.
    IntNumber,
    /// Every number is an IEEE-754 double.
    FloatNumber,
    /// Every number is an IEEE-754 single.
    FloatNumber32,
    /// Integers stay integers; anything with a fraction or exponent is a double.
    SmartNumber,
    /// Integers stay integers; anything with a fraction or exponent is a single.
    SmartNumber32,
}

/// Which byte classes are skipped between JSON tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceKind {
    /// Space, tab, newline, carriage return, vertical tab and form feed.
    AnsiSpace,
    /// Every Unicode `White_Space` code point.
    UnicodeSpace,
}

/// CBOR container framing used by encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerEncoding {
    /// Emit the element count in the container header.
    LengthPrefix,
    /// Emit an indefinite-length header, the items, then a break-stop.
    Stream,
}

/// Options shared by every transcoder and pointer operation.
///
/// `Config` is a small `Copy` record; operations borrow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
    /// Number handling.
    pub number_kind: NumberKind,
    /// Whitespace handling in JSON text.
    pub space_kind: SpaceKind,
    /// CBOR container framing on encode.
    pub container_encoding: ContainerEncoding,
    /// Collate arrays by length first.
    pub array_len_prefix: bool,
    /// Collate maps by size first.
    pub property_len_prefix: bool,
    /// Collate [`MISSING_LITERAL`] as `Missing`.
    pub do_missing: bool,
    /// Maximum keys per map during collation.
    pub max_keys: usize,
    /// Reject lossy operations.
    pub strict: bool,
    /// Maximum nesting depth.
    pub max_depth: usize,
}

impl Config {
    /// Construct the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            number_kind: NumberKind::FloatNumber,
            space_kind: SpaceKind::UnicodeSpace,
            container_encoding: ContainerEncoding::LengthPrefix,
            array_len_prefix: false,
            property_len_prefix: true,
            do_missing: true,
            max_keys: DEFAULT_MAX_KEYS,
            strict: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the number kind.
    #[must_use]
    pub const fn with_number_kind(mut self, kind: NumberKind) -> Self {
        self.number_kind = kind;
        self
    }

    /// Set the whitespace kind.
    #[must_use]
    pub const fn with_space_kind(mut self, kind: SpaceKind) -> Self {
        self.space_kind = kind;
        self
    }

    /// Set the CBOR container encoding.
    #[must_use]
    pub const fn with_container_encoding(mut self, encoding: ContainerEncoding) -> Self {
        self.container_encoding = encoding;
        self
    }

    /// Set whether arrays collate by length first.
    #[must_use]
    pub const fn with_array_len_prefix(mut self, on: bool) -> Self {
        self.array_len_prefix = on;
        self
    }

    /// Set whether maps collate by size first.
    #[must_use]
    pub const fn with_property_len_prefix(mut self, on: bool) -> Self {
        self.property_len_prefix = on;
        self
    }

    /// Set whether the missing literal collates as `Missing`.
    #[must_use]
    pub const fn with_do_missing(mut self, on: bool) -> Self {
        self.do_missing = on;
        self
    }

    /// Set the per-map key limit.
    ///
    /// A limit of zero is treated as one.
    #[must_use]
    pub const fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = if max_keys == 0 { 1 } else { max_keys };
        self
    }

    /// Set strict mode.
    #[must_use]
    pub const fn with_strict(mut self, on: bool) -> Self {
        self.strict = on;
        self
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Config {
    /// Step one nesting level below `depth`.
    ///
    /// # Errors
    ///
    /// Returns `DepthLimitExceeded` at `offset` once `max_depth` levels are open.
    #[inline]
    pub(crate) const fn descend(&self, depth: usize, offset: usize) -> Result<usize, Error> {
        if depth >= self.max_depth {
            return Err(err(ErrorCode::DepthLimitExceeded, offset));
        }
        Ok(depth + 1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
