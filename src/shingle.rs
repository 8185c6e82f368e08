//! The atomic unit of a record's feature bag.
//!
//! A [`Shingle`] is always paired with the field label it was extracted
//! under, so that the same token surfacing from two different columns never
//! collides unless the caller explicitly unifies the labels (§4.1).

/// A labeled shingle: `("bass", "instrument")` and `("bass", "voice")` are
/// distinct shingles even though their tokens are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shingle {
    label: Box<str>,
    token: Box<[u8]>,
}

impl Shingle {
    pub fn new(label: impl Into<Box<str>>, token: impl Into<Box<[u8]>>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }

    pub fn from_str(label: &str, token: &str) -> Self {
        Self::new(label, token.as_bytes())
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn token(&self) -> &[u8] {
        &self.token
    }

    /// The bytes that get hashed: `label || 0x00 || token` (§4.2).
    pub(crate) fn hash_key(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.label.len() + 1 + self.token.len());
        buf.extend_from_slice(self.label.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&self.token);
        buf
    }
}

/// An ordered sequence of shingles for one record. Duplicates are preserved:
/// multiplicity does not affect the Bloom embedding (a bit is either set or
/// not) but is kept here since `features` is retained for debugging and a
/// caller may care about raw counts.
pub type FeatureBag = Vec<Shingle>;
