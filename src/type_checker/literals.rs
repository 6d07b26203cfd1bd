use crate::{
    ast::{
        ast::DeclId,
        expressions::{is_single_extended_grapheme_cluster, Expr, ExprKind, LiteralExpr, MagicIdentifierKind},
        known_protocols::KnownProtocolKind,
    },
    errors::errors::Error,
};

use super::{collaborator::SemanticCollaborator, type_checker::TypeChecker};

/// The protocol a type has to conform to in order to be the default type of
/// a literal. `None` for anything that is not a literal.
pub fn literal_protocol_kind(expr: &Expr) -> Option<KnownProtocolKind> {
    let ExprKind::Literal(literal) = &expr.kind else {
        return None;
    };

    let kind = match literal {
        LiteralExpr::Nil => KnownProtocolKind::NilLiteralConstructible,
        LiteralExpr::Integer(_) => KnownProtocolKind::IntegerLiteralConstructible,
        LiteralExpr::Float(_) => KnownProtocolKind::FloatLiteralConstructible,
        LiteralExpr::Boolean(_) => KnownProtocolKind::BooleanLiteralConstructible,
        LiteralExpr::Character(_) => KnownProtocolKind::CharacterLiteralConstructible,
        LiteralExpr::String(value) if is_single_extended_grapheme_cluster(value) => {
            KnownProtocolKind::ExtendedGraphemeClusterLiteralConstructible
        }
        LiteralExpr::String(_) => KnownProtocolKind::StringLiteralConstructible,
        LiteralExpr::InterpolatedString(_) => KnownProtocolKind::StringInterpolationConstructible,
        LiteralExpr::Array(_) => KnownProtocolKind::ArrayLiteralConstructible,
        LiteralExpr::Dictionary(_) => KnownProtocolKind::DictionaryLiteralConstructible,
        LiteralExpr::MagicIdentifier(MagicIdentifierKind::File | MagicIdentifierKind::Function) => {
            KnownProtocolKind::StringLiteralConstructible
        }
        LiteralExpr::MagicIdentifier(MagicIdentifierKind::Line | MagicIdentifierKind::Column) => {
            KnownProtocolKind::IntegerLiteralConstructible
        }
    };
    Some(kind)
}

impl<'a> TypeChecker<'a> {
    /// Resolves the protocol declaration a literal's default type must
    /// conform to. A missing protocol is diagnosed at the literal.
    pub fn get_literal_protocol(
        &mut self,
        collab: &mut dyn SemanticCollaborator,
        expr: &Expr,
    ) -> Result<Option<DeclId>, Error> {
        match literal_protocol_kind(expr) {
            Some(kind) => self.get_protocol(collab, &expr.span, kind),
            None => Ok(None),
        }
    }
}
