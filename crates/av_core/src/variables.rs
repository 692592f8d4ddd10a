//! variables.rs: tally method domain and lock parameters with safe defaults.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Version tag written as `v` into every seal pre-image.
pub const SEAL_VERSION: u32 = 1;

/// Define an enum with explicit wire tokens (serde derives are feature-aware).
macro_rules! token_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:literal),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token))]
                $variant,
            )+
        }

        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    _ => Err(CoreError::UnknownMethod),
                }
            }
        }
    };
}

token_enum!(
    /// Ranked-choice method. The token is the `method` field of the seal.
    TallyMethod => {
        Schulze = "schulze"
    }
);

impl Default for TallyMethod {
    fn default() -> Self {
        TallyMethod::Schulze
    }
}

/// Parameters of the lock step (everything besides candidates and ballots).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct LockParams {
    pub method: TallyMethod,
    /// Members entitled to vote; `None` leaves participation unknown (`null`).
    pub eligible_count: Option<u64>,
}
