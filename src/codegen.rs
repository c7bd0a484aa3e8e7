use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

pub const DEFAULT_CODE_LENGTH: usize = 6;
/// Width of the `short_links.short_code` column.
pub const MAX_CODE_LENGTH: usize = 32;

#[derive(Error, Debug)]
pub enum CodeGenError {
    #[error("entropy source unavailable: {0}")]
    Entropy(getrandom::Error),
}

/// Produces a random short code of exactly `length` characters from the
/// URL-safe base64 alphabet (`A-Z`, `a-z`, `0-9`, `-`, `_`).
///
/// Every 3 bytes encode to 4 characters, so `ceil(length * 3 / 4)` bytes
/// always yield at least `length` characters.
pub fn generate_code(length: usize) -> Result<String, CodeGenError> {
    let mut buf = vec![0u8; (length * 3).div_ceil(4)];
    getrandom::fill(&mut buf).map_err(CodeGenError::Entropy)?;

    let mut code = URL_SAFE_NO_PAD.encode(&buf);
    code.truncate(length);

    Ok(code)
}
