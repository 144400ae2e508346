//! Pinning code block content with `contentHash`.

use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// Lower-case hex SHA-1 of `content`.
pub fn content_digest(content: &str) -> String {
    hex::encode(Sha1::digest(content.as_bytes()))
}

/// Check `content` against an expected digest, if there is one.
pub fn verify(content: &str, expected: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = content_digest(content);
    if actual != expected {
        return Err(Error::IntegrityMismatch {
            actual,
            expected: expected.to_string(),
        });
    }
    Ok(())
}
