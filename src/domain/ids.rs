//! Strongly-typed identifier value objects.
//!
//! All ids in the document store are opaque strings (Firestore-style document
//! ids, Stripe-assigned object ids), so these newtypes wrap `String` rather
//! than `Uuid`. A `Uuid` is still used to mint fresh local ids where we own
//! the id space (notifications).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an id from a non-empty string.
            pub fn new(value: impl Into<String>) -> Result<Self, InvalidId> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(InvalidId(stringify!($name)));
                }
                Ok(Self(value))
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// A user document id. Hosts are users, so host ids are `UserId`s too.
    UserId
}

string_id! {
    /// An event document id.
    EventId
}

string_id! {
    /// A Stripe payment-intent id (`pi_...`). Doubles as the idempotency key
    /// for webhook reconciliation and the key of the payments collection.
    IntentId
}

string_id! {
    /// A Stripe connect account id (`acct_...`).
    AccountId
}

/// Error for empty or whitespace-only id strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidId(pub &'static str);

impl fmt::Display for InvalidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} must not be empty", self.0)
    }
}

impl std::error::Error for InvalidId {}
