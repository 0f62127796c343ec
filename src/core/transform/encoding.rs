//! Header token encoding
//!
//! Replay headers carry text as base64, then percent-encoded, so the token is
//! safe in a URL as well as in a header.

use base64::{engine::general_purpose, Engine as _};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is by the percent-encoding step
const HEADER_TOKEN_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// UTF-8 text -> base64 -> percent-encoded token
pub fn encode_header_token(text: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(text.as_bytes());
    utf8_percent_encode(&encoded, HEADER_TOKEN_SET).to_string()
}

/// Reverses [`encode_header_token`]
///
/// Also accepts plain base64 that was never percent-encoded. Returns `None`
/// when the input is not valid base64 of UTF-8 text.
pub fn decode_header_token(token: &str) -> Option<String> {
    let unescaped = percent_decode_str(token.trim()).decode_utf8().ok()?;
    let bytes = general_purpose::STANDARD.decode(unescaped.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}
