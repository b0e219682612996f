//! Integer primary-key newtypes shared by the persisted aggregates.

use std::fmt;

/// Validation failure for a record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIdError {
    /// Rejected raw value.
    pub value: i64,
}

impl fmt::Display for RecordIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identifier must be a positive integer, got {}", self.value)
    }
}

impl std::error::Error for RecordIdError {}

/// Generate a positive `i64` identifier newtype.
macro_rules! define_record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// Validate and wrap a raw database identifier.
            pub fn new(value: i64) -> Result<Self, $crate::domain::RecordIdError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err($crate::domain::RecordIdError { value })
                }
            }

            /// Raw identifier value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = $crate::domain::RecordIdError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

pub(crate) use define_record_id;
