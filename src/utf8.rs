#[cfg(feature = "simdutf8")]
use simdutf8::basic as simd_utf8;

use crate::error::{err, Error, ErrorCode};

/// Validates UTF-8 bytes and returns a borrowed `&str` on success.
///
/// `offset` is reported in the error; it should be the position of `bytes` in the input.
#[inline]
pub fn validate(bytes: &[u8], offset: usize) -> Result<&str, Error> {
    #[cfg(feature = "simdutf8")]
    {
        simd_utf8::from_utf8(bytes).map_err(|_| err(ErrorCode::Utf8Invalid, offset))
    }

    #[cfg(not(feature = "simdutf8"))]
    {
        core::str::from_utf8(bytes).map_err(|_| err(ErrorCode::Utf8Invalid, offset))
    }
}
