use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::MK_KNOWN_PROTOCOLS;

MK_KNOWN_PROTOCOLS! {
    Sequence => "Sequence",
    Generator => "Generator",
    RawRepresentable => "RawRepresentable",
    Equatable => "Equatable",
    Hashable => "Hashable",
    Comparable => "Comparable",
    ErrorType => "ErrorType",
    OptionSet => "OptionSet",
    AnyObject => "AnyObject",
    ObjectiveCBridgeable => "_ObjectiveCBridgeable",

    ArrayLiteralConstructible => "ArrayLiteralConstructible",
    BooleanLiteralConstructible => "BooleanLiteralConstructible",
    CharacterLiteralConstructible => "CharacterLiteralConstructible",
    DictionaryLiteralConstructible => "DictionaryLiteralConstructible",
    ExtendedGraphemeClusterLiteralConstructible => "ExtendedGraphemeClusterLiteralConstructible",
    FloatLiteralConstructible => "FloatLiteralConstructible",
    IntegerLiteralConstructible => "IntegerLiteralConstructible",
    NilLiteralConstructible => "NilLiteralConstructible",
    StringInterpolationConstructible => "StringInterpolationConstructible",
    StringLiteralConstructible => "StringLiteralConstructible",
    UnicodeScalarLiteralConstructible => "UnicodeScalarLiteralConstructible",

    BuiltinBooleanLiteralConstructible => "_BuiltinBooleanLiteralConstructible",
    BuiltinFloatLiteralConstructible => "_BuiltinFloatLiteralConstructible",
    BuiltinIntegerLiteralConstructible => "_BuiltinIntegerLiteralConstructible",
    BuiltinStringLiteralConstructible => "_BuiltinStringLiteralConstructible",
}

lazy_static! {
    pub static ref KNOWN_PROTOCOL_LOOKUP: HashMap<&'static str, KnownProtocolKind> = {
        let mut map = HashMap::new();
        for kind in KnownProtocolKind::ALL {
            map.insert(kind.name(), *kind);
        }
        map
    };
}

impl KnownProtocolKind {
    /// Exact, case-sensitive lookup of a protocol by its source name.
    pub fn from_name(name: &str) -> Option<KnownProtocolKind> {
        KNOWN_PROTOCOL_LOOKUP.get(name).copied()
    }
}
