//! Macro for implementing wire-name conversions on tag enums
//!
//! Operation kinds, entity types and trigger reasons all travel as lowercase
//! strings in the durable record, HTTP paths and log fields. This macro gives
//! each of them `as_str`, `Display` and a case-insensitive `FromStr` from a
//! single mapping.
//!
//! # Example
//!
//! ```rust
//! use ferry_domain::impl_tag_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Push,
//!     Poll,
//! }
//!
//! impl_tag_conversions!(Channel {
//!     Push => "push",
//!     Poll => "poll",
//! });
//!
//! assert_eq!(Channel::Push.as_str(), "push");
//! assert_eq!("POLL".parse::<Channel>().unwrap(), Channel::Poll);
//! ```

/// Implements `as_str`, Display and FromStr for tag enums
///
/// Parsing is case-insensitive; output is always the mapped string.
#[macro_export]
macro_rules! impl_tag_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire name of this tag.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
