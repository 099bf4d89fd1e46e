use crate::error::Rejection;
use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Text with a fixed byte capacity.
///
/// On disk the value takes exactly `N` bytes, NUL padded, which keeps every
/// record of a store the same size.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedStr<const N: usize>(String);

pub type UserId = FixedStr<30>;
pub type Password = FixedStr<30>;
pub type UserName = FixedStr<30>;
pub type Isbn = FixedStr<20>;
pub type Text = FixedStr<60>;

impl<const N: usize> FixedStr<N> {
    pub fn new(value: &str) -> Result<Self, Rejection> {
        if value.len() > N {
            return Err(Rejection::FieldTooLong);
        }
        if value.contains('\0') {
            return Err(Rejection::Malformed);
        }

        Ok(FixedStr(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> fmt::Display for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> Serialize for FixedStr<N> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = self.0.as_bytes();
        let mut padded = serializer.serialize_tuple(N)?;
        for i in 0..N {
            padded.serialize_element(&bytes.get(i).copied().unwrap_or(0))?;
        }
        padded.end()
    }
}

struct PaddedVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for PaddedVisitor<N> {
    type Value = FixedStr<N>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} NUL padded bytes", N)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(N);
        for i in 0..N {
            let byte: u8 = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
            bytes.push(byte);
        }
        if let Some(end) = bytes.iter().position(|&b| b == 0) {
            bytes.truncate(end);
        }
        let text = String::from_utf8(bytes).map_err(de::Error::custom)?;
        Ok(FixedStr(text))
    }
}

impl<'de, const N: usize> Deserialize<'de> for FixedStr<N> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_tuple(N, PaddedVisitor::<N>)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Privilege(u8);

impl Privilege {
    /// Nobody logged in. Never stored on an account.
    pub const ANONYMOUS: Privilege = Privilege(0);
    pub const CUSTOMER: Privilege = Privilege(1);
    pub const STAFF: Privilege = Privilege(3);
    pub const ROOT: Privilege = Privilege(7);
}

impl TryFrom<i64> for Privilege {
    type Error = Rejection;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        match level {
            1..=7 => Ok(Privilege(level as u8)),
            _ => Err(Rejection::Malformed),
        }
    }
}

/// Pipe separated keyword list with no empty and no repeated segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Keywords(Text);

impl Keywords {
    pub fn new(value: &str) -> Result<Self, Rejection> {
        let text = Text::new(value)?;
        let mut seen = HashSet::new();
        for segment in value.split('|') {
            if segment.is_empty() || !seen.insert(segment) {
                return Err(Rejection::Malformed);
            }
        }

        Ok(Keywords(text))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.as_str().split('|').filter(|s| !s.is_empty())
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.segments().any(|segment| segment == keyword)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
