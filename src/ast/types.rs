//! Type system definitions for the AST.
//!
//! This module defines the semantic types the checker assigns and the
//! written type representations it resolves, including:
//!
//! - Resolved types, with a distinguished error type
//! - Generic parameter lists, which can chain to an outer list
//! - Identifier type representations and their per-component bindings
//! - Options controlling type resolution

use crate::Span;

use super::ast::{DeclId, GenericParamListId};

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Stands in wherever resolution failed.
    Error,
    Nominal(DeclId),
    /// A generic nominal referenced without arguments.
    UnboundGeneric(DeclId),
    BoundGeneric { decl: DeclId, args: Vec<Type> },
    Builtin(String),
    Function { params: Vec<Type>, result: Box<Type> },
    Metatype(Box<Type>),
}

impl Type {
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn any_nominal(&self) -> Option<DeclId> {
        match self {
            Type::Nominal(decl) | Type::UnboundGeneric(decl) | Type::BoundGeneric { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// Only plain nominal types and unbound generics can be extended; a
    /// bound generic reached through an alias cannot.
    pub fn is_extensible(&self) -> bool {
        matches!(self, Type::Nominal(_) | Type::UnboundGeneric(_))
    }
}

#[derive(Debug, Clone)]
pub struct GenericParam {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct GenericParamList {
    pub params: Vec<GenericParam>,
    /// The list of the enclosing generic context, set when extension
    /// components are chained together.
    pub outer: Option<GenericParamListId>,
    pub span: Span,
}

impl GenericParamList {
    pub fn new(names: &[&str], span: Span) -> Self {
        GenericParamList {
            params: names
                .iter()
                .map(|name| GenericParam {
                    name: name.to_string(),
                    span: span.clone(),
                })
                .collect(),
            outer: None,
            span,
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// What a single identifier component resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentBinding {
    Type(Type),
    Decl(DeclId),
}

#[derive(Debug, Clone)]
pub struct ComponentIdentTypeRepr {
    pub name: String,
    pub span: Span,
    pub generic_args: Vec<TypeRepr>,
    /// Filled in by type validation.
    pub binding: Option<ComponentBinding>,
}

impl ComponentIdentTypeRepr {
    pub fn simple(name: &str, span: Span) -> Self {
        ComponentIdentTypeRepr {
            name: name.to_string(),
            span,
            generic_args: vec![],
            binding: None,
        }
    }

    /// A component without generic arguments.
    pub fn is_simple(&self) -> bool {
        self.generic_args.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum TypeRepr {
    /// A possibly dotted identifier path such as `Outer.Inner<T>`.
    Ident(Vec<ComponentIdentTypeRepr>),
    /// Function, tuple, composition and other structural spellings.
    Other(Span),
}

impl TypeRepr {
    pub fn ident(path: &[&str], span: Span) -> Self {
        TypeRepr::Ident(
            path.iter()
                .map(|name| ComponentIdentTypeRepr::simple(name, span.clone()))
                .collect(),
        )
    }
}

/// A written type together with the type it resolved to.
#[derive(Debug, Clone, Default)]
pub struct TypeLoc {
    pub repr: Option<TypeRepr>,
    pub ty: Option<Type>,
}

impl TypeLoc {
    pub fn from_repr(repr: TypeRepr) -> Self {
        TypeLoc { repr: Some(repr), ty: None }
    }

    pub fn components(&self) -> &[ComponentIdentTypeRepr] {
        match &self.repr {
            Some(TypeRepr::Ident(components)) => components,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeResolutionOptions {
    pub allow_unbound_generics: bool,
    pub sil_type: bool,
}
