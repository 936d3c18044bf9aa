//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a UUID-backed ID newtype wrapper.
///
/// Generates: struct, `new()` (UUID v4), `from_string()`, `as_str()`, Default,
/// Display, Serialize, Deserialize.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn from_string(s: String) -> Result<Self, &'static str> {
                if s.is_empty() {
                    return Err(concat!(stringify!($name), " cannot be empty"));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// Correlates the log events of one dispatch.
define_id!(CorrelationId);
// Identifies one pipeline, batch or retry run.
define_id!(RunId);
