//! Composite key encoding.
//!
//! A key is laid out as:
//!
//! ```text
//! NUL tag NUL field_1 NUL field_2 NUL ... field_n NUL
//! ```
//!
//! Every field is terminated by `NUL`, so the encoding of
//! `(tag, f_1..f_k)` is a prefix of exactly the keys whose first `k` fields
//! are `f_1..f_k`. Fields are escaped before encoding so that a `NUL` inside
//! a field can never be mistaken for a terminator:
//!
//! - `\u{1}` becomes `\u{1}1`
//! - `\u{0}` becomes `\u{1}0`
//!
//! Escaping is injective, so `("ds", "ab", "c")` and `("ds", "a", "bc")`
//! always produce different keys.

use std::fmt;

use crate::error::KeyError;

const DELIMITER: char = '\u{0}';
const ESCAPE: char = '\u{1}';

/// An encoded, prefix-scannable ledger key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Encode `tag` and `fields` into one key.
    ///
    /// Passing fewer fields than an entity's full key yields the prefix used
    /// to scan every entity sharing those leading fields. Passing none
    /// yields the prefix for every entity under `tag`.
    pub fn new<S: AsRef<str>>(tag: &str, fields: &[S]) -> Result<Self, KeyError> {
        if tag.is_empty() || tag.contains(DELIMITER) || tag.contains(ESCAPE) {
            return Err(KeyError::InvalidTag(tag.to_string()));
        }

        let mut key = String::with_capacity(
            2 + tag.len() + fields.iter().map(|f| f.as_ref().len() + 1).sum::<usize>(),
        );
        key.push(DELIMITER);
        key.push_str(tag);
        key.push(DELIMITER);

        for (index, field) in fields.iter().enumerate() {
            let field = field.as_ref();
            if field.is_empty() {
                return Err(KeyError::EmptyField {
                    tag: tag.to_string(),
                    index,
                });
            }
            for ch in field.chars() {
                match ch {
                    DELIMITER => {
                        key.push(ESCAPE);
                        key.push('0');
                    }
                    ESCAPE => {
                        key.push(ESCAPE);
                        key.push('1');
                    }
                    other => key.push(other),
                }
            }
            key.push(DELIMITER);
        }

        Ok(Self(key))
    }

    /// Key prefix covering every entity under `tag`.
    pub fn tag_prefix(tag: &str) -> Result<Self, KeyError> {
        Self::new::<&str>(tag, &[])
    }

    /// The raw key as handed to the ledger.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `other` shares every field encoded in `self`.
    pub fn is_prefix_of(&self, other: &CompositeKey) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Split a raw key back into its tag and unescaped fields.
    ///
    /// Returns `None` if `raw` was not produced by [`CompositeKey::new`].
    pub fn decode(raw: &str) -> Option<(String, Vec<String>)> {
        let body = raw.strip_prefix(DELIMITER)?;
        let body = body.strip_suffix(DELIMITER)?;
        let mut parts = body.split(DELIMITER);
        let tag = parts.next()?.to_string();
        if tag.is_empty() {
            return None;
        }

        let mut fields = Vec::new();
        for part in parts {
            let mut field = String::with_capacity(part.len());
            let mut chars = part.chars();
            while let Some(ch) = chars.next() {
                if ch == ESCAPE {
                    match chars.next()? {
                        '0' => field.push(DELIMITER),
                        '1' => field.push(ESCAPE),
                        _ => return None,
                    }
                } else {
                    field.push(ch);
                }
            }
            fields.push(field);
        }
        Some((tag, fields))
    }
}

impl fmt::Debug for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositeKey({self})")
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::decode(&self.0) {
            Some((tag, fields)) => write!(f, "{tag}[{}]", fields.join(", ")),
            None => write!(f, "{}", self.0.escape_debug()),
        }
    }
}

impl AsRef<str> for CompositeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
