//! Project identifiers and the object-store key layout derived from them.
//!
//! Public links embed the base-36 form of the numeric project id, so the
//! encoding here must stay stable: changing it orphans every published URL.

use std::fmt;

use url::Url;

use super::error::DomainError;

const RADIX: u32 = 36;
const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode a positive project id as lowercase base-36 text without padding.
pub fn encode_id(id: i64) -> Result<String, DomainError> {
    if id <= 0 {
        return Err(DomainError::invalid_id(id));
    }
    Ok(encode_positive(id as u64))
}

fn encode_positive(mut value: u64) -> String {
    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[(value % u64::from(RADIX)) as usize]);
        value /= u64::from(RADIX);
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Decode canonical base-36 text back into a project id.
///
/// Only the exact output of [`encode_id`] is accepted: uppercase digits,
/// leading zeros, signs and out-of-range values are all rejected so that
/// every id has exactly one textual form.
pub fn decode_id(text: &str) -> Result<i64, DomainError> {
    let canonical = !text.is_empty()
        && !text.starts_with('0')
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase());
    if !canonical {
        return Err(DomainError::invalid_id(text));
    }

    match i64::from_str_radix(text, RADIX) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DomainError::invalid_id(text)),
    }
}

/// A validated, positive project id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectId(i64);

impl ProjectId {
    pub fn new(id: i64) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::invalid_id(id));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn base36(self) -> String {
        encode_positive(self.0 as u64)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A username that is safe to use as the first segment of a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() {
            return Err(DomainError::invalid_username(raw, "must not be empty"));
        }
        if raw == "." || raw == ".." {
            return Err(DomainError::invalid_username(raw, "reserved path segment"));
        }
        let allowed = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !allowed {
            return Err(DomainError::invalid_username(
                raw,
                "only ASCII letters, digits, `-`, `_` and `.` are allowed",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key layout of one user's published project inside the bucket.
///
/// ```text
/// {user}/popcorn/{id36}_          embed fragment
/// {user}/popcorn/{id36}_/edit     redirect stub
/// {user}/popcorn/{id36}_/remix    redirect stub
/// {user}/popcorn/{id36}           embed shell
/// {user}/popcorn/{id36}/edit      redirect stub
/// {user}/popcorn/{id36}/remix     redirect stub
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    public_base: Url,
}

impl ArtifactLayout {
    /// `public_base` is the URL the bucket root is served from.
    pub fn new(public_base: Url) -> Result<Self, DomainError> {
        if public_base.cannot_be_a_base() {
            return Err(DomainError::InvalidPublicBase {
                value: public_base.to_string(),
            });
        }
        Ok(Self { public_base })
    }

    pub fn embed_path(&self, username: &Username, id_base36: &str) -> String {
        format!("{}_", self.embed_shell_path(username, id_base36))
    }

    pub fn embed_shell_path(&self, username: &Username, id_base36: &str) -> String {
        format!("{}/popcorn/{id_base36}", username.as_str())
    }

    pub fn embed_url(&self, username: &Username, id_base36: &str) -> Url {
        self.public_url(&self.embed_path(username, id_base36))
    }

    pub fn embed_shell_url(&self, username: &Username, id_base36: &str) -> Url {
        self.public_url(&self.embed_shell_path(username, id_base36))
    }

    fn public_url(&self, key: &str) -> Url {
        let mut url = self.public_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(key.split('/'));
        }
        url
    }
}
