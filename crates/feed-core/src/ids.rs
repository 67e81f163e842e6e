//! Opaque identifiers shared across the feed stack.

use core::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Identifier of a feed consumer.
///
/// Kept as an opaque string rather than a `Uuid`: callers mint user ids from
/// whatever identity system they already have (numeric primary keys, handles,
/// external auth subjects), so the feed layer must not assume a shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Arc<str>);

/// Identifier of a registered feed (e.g. `"timeline"`, `"notifications"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedName(Arc<str>);

macro_rules! impl_str_newtype {
    ($t:ty, $label:literal) => {
        impl $t {
            /// Build from any owned/borrowed string, rejecting empty values.
            pub fn new(raw: impl Into<Arc<str>>) -> Result<Self, FeedError> {
                let raw = raw.into();
                if raw.is_empty() {
                    return Err(FeedError::argument(format!("{} must not be empty", $label)));
                }
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = FeedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl TryFrom<String> for $t {
            type Error = FeedError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $t {
            type Error = FeedError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }
    };
}

impl_str_newtype!(UserId, "user_id");
impl_str_newtype!(FeedName, "feed name");
