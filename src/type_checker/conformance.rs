use crate::ast::{declarations::Decl, known_protocols::KnownProtocolKind};

/// Whether the written inheritance clause of `decl` names a compiler-known
/// protocol.
///
/// Purely syntactic: the last component of each entry is compared by exact
/// name, without resolving aliases. A false answer only delays validation.
pub fn may_conform_to_known_protocol(decl: &Decl) -> bool {
    decl.inherited().iter().any(|inherited| match inherited.components().last() {
        Some(last) if last.is_simple() => KnownProtocolKind::from_name(&last.name).is_some(),
        _ => false,
    })
}
