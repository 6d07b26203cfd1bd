//! Utility macros for the semantic analyser.
//!
//! This module defines helper macros used throughout the crate:
//!
//! - `MK_ERROR!` - Creates an Error at a position
//! - `MK_KNOWN_PROTOCOLS!` - Declares the compiler-known protocol table
//!
//! These macros reduce boilerplate where the same shape repeats per entry.

/// Creates an Error instance.
///
/// # Arguments
///
/// * `$kind` - The ErrorImpl variant
/// * `$position` - The source position
///
/// # Example
///
/// ```ignore
/// let error = MK_ERROR!(ErrorImpl::ExtensionMetatype, span.start.clone());
/// ```
#[macro_export]
macro_rules! MK_ERROR {
    ($kind:expr, $position:expr) => {
        $crate::errors::errors::Error::new($kind, $position)
    };
}

/// Declares the `KnownProtocolKind` enum together with the source name of
/// every kind.
///
/// Every entry becomes one enum variant; `ALL` lists them in declaration
/// order and `name()` returns the spelling the conformance gate and the
/// stdlib recorder match against.
///
/// # Example
///
/// ```ignore
/// MK_KNOWN_PROTOCOLS! {
///     Equatable => "Equatable",
///     Hashable => "Hashable",
/// }
/// ```
#[macro_export]
macro_rules! MK_KNOWN_PROTOCOLS {
    ($($kind:ident => $name:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KnownProtocolKind {
            $($kind),*
        }

        impl KnownProtocolKind {
            pub const ALL: &'static [KnownProtocolKind] = &[$(KnownProtocolKind::$kind),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(KnownProtocolKind::$kind => $name),*
                }
            }
        }
    };
}
