use unicode_segmentation::UnicodeSegmentation;

use crate::Span;

use super::ast::DeclId;

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn literal(literal: LiteralExpr, span: Span) -> Self {
        Expr {
            kind: ExprKind::Literal(literal),
            span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(LiteralExpr),
    DeclRef(DeclId),
    /// Any expression the driver has no special knowledge of.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicIdentifierKind {
    File,
    Function,
    Line,
    Column,
}

#[derive(Debug, Clone)]
pub enum LiteralExpr {
    Nil,
    Integer(String),
    Float(String),
    Boolean(bool),
    Character(char),
    String(String),
    InterpolatedString(Vec<Expr>),
    Array(Vec<Expr>),
    Dictionary(Vec<(Expr, Expr)>),
    MagicIdentifier(MagicIdentifierKind),
}

/// Whether a string literal is exactly one user-perceived character, i.e.
/// one extended grapheme cluster.
pub fn is_single_extended_grapheme_cluster(value: &str) -> bool {
    let mut clusters = value.graphemes(true);
    clusters.next().is_some() && clusters.next().is_none()
}
