//! Strongly-typed identifiers used across the locator.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// Identifier of an inventory record.
///
/// Opaque to the client. The remote store may hand out integer or text keys;
/// both decode into the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

/// Code of a floor-plan zone (`A`, `DD`, `Fr`, ...), matching a record's `section`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionCode(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build the identifier, rejecting blank input.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_newtype!(ItemId, "ItemId");
impl_string_newtype!(SectionCode, "SectionCode");

impl TryFrom<String> for SectionCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SectionCode> for String {
    fn from(value: SectionCode) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Uint(u64),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Int(n) => n.to_string(),
            Raw::Uint(n) => n.to_string(),
        };
        ItemId::new(text).map_err(serde::de::Error::custom)
    }
}

/// A shelf row inside a cabinet (1-based, six rows per cabinet).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct ShelfRow(u8);

impl ShelfRow {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    /// Every selectable row, in display order.
    pub const ALL: [ShelfRow; 6] = [
        ShelfRow(1),
        ShelfRow(2),
        ShelfRow(3),
        ShelfRow(4),
        ShelfRow(5),
        ShelfRow(6),
    ];

    pub const FIRST: ShelfRow = ShelfRow(1);

    pub fn new(row: i32) -> Result<Self, DomainError> {
        if row < Self::MIN as i32 || row > Self::MAX as i32 {
            return Err(DomainError::invalid_id(format!(
                "ShelfRow: {row} outside {}..={}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(row as u8))
    }

    pub fn get(self) -> i32 {
        self.0 as i32
    }

    /// Label shown on the row selector.
    pub fn label(self) -> String {
        format!("Row {}", self.0)
    }
}

impl TryFrom<i32> for ShelfRow {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShelfRow> for i32 {
    fn from(value: ShelfRow) -> Self {
        value.get()
    }
}

impl core::fmt::Display for ShelfRow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
