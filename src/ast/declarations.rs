//! Declaration definitions.
//!
//! Every declaration is one `Decl` record carrying the state shared by all
//! kinds (validation progress, resolved type, accessibility, attributes) and
//! a closed `DeclKind` for what is specific to functions, storage, nominal
//! types, extensions and top-level code.

use std::fmt::Display;

use crate::Span;

use super::{
    ast::{DeclContext, DeclId, GenericParamListId},
    expressions::Expr,
    types::{Type, TypeLoc},
};

/// Progress of a declaration through validation.
///
/// Moves `Unchecked -> Validating -> Valid | Invalid`. A `Valid` declaration
/// can still be demoted to `Invalid` by a later failing pass; `Invalid` is
/// final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Unchecked,
    Validating,
    Valid,
    Invalid,
}

impl ValidationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ValidationState::Valid | ValidationState::Invalid)
    }
}

impl Display for ValidationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationState::Unchecked => write!(f, "unchecked"),
            ValidationState::Validating => write!(f, "validating"),
            ValidationState::Valid => write!(f, "valid"),
            ValidationState::Invalid => write!(f, "invalid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Accessibility {
    Private,
    Internal,
    Public,
}

/// Whether an attribute was written by the user or added by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOrigin {
    Explicit,
    Implicit,
}

#[derive(Debug, Clone, Default)]
pub struct DeclAttributes {
    pub final_attr: Option<AttrOrigin>,
    pub dynamic: Option<AttrOrigin>,
    pub objc: bool,
}

/// Which passes already ran over a declaration, so each runs once.
#[derive(Debug, Clone, Default)]
pub(crate) struct CheckProgress {
    pub members_checked: bool,
    pub second_pass_checked: bool,
    pub body_checked: bool,
    pub captures_computed: bool,
}

#[derive(Debug)]
pub struct Decl {
    pub name: String,
    pub span: Span,
    pub context: DeclContext,
    pub kind: DeclKind,
    pub state: ValidationState,
    pub ty: Option<Type>,
    /// `None` until accessibility has been computed.
    pub access: Option<Accessibility>,
    pub attrs: DeclAttributes,
    pub overridden_decl: Option<DeclId>,
    pub is_overridden: bool,
    pub implicit: bool,
    pub(crate) progress: CheckProgress,
}

impl Decl {
    pub(crate) fn new(name: &str, span: Span, context: DeclContext, kind: DeclKind) -> Self {
        Decl {
            name: name.to_string(),
            span,
            context,
            kind,
            state: ValidationState::Unchecked,
            ty: None,
            access: None,
            attrs: DeclAttributes::default(),
            overridden_decl: None,
            is_overridden: false,
            implicit: false,
            progress: CheckProgress::default(),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.state == ValidationState::Invalid
    }

    pub fn is_final(&self) -> bool {
        self.attrs.final_attr.is_some()
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, DeclKind::Func(_))
    }

    /// Value declarations are the ones that can be referenced by name and
    /// carry accessibility.
    pub fn is_value_decl(&self) -> bool {
        matches!(self.kind, DeclKind::Func(_) | DeclKind::Var(_) | DeclKind::Nominal(_))
    }

    /// The resolved type, or the error type when none was assigned.
    pub fn interface_type(&self) -> Type {
        self.ty.clone().unwrap_or(Type::Error)
    }

    pub fn inherited(&self) -> &[TypeLoc] {
        match &self.kind {
            DeclKind::Nominal(nominal) => &nominal.inherited,
            DeclKind::Extension(extension) => &extension.inherited,
            _ => &[],
        }
    }

    pub fn body(&self) -> Option<&Body> {
        match &self.kind {
            DeclKind::Func(func) => func.body.as_ref(),
            DeclKind::TopLevelCode(code) => Some(&code.body),
            _ => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut Body> {
        match &mut self.kind {
            DeclKind::Func(func) => func.body.as_mut(),
            DeclKind::TopLevelCode(code) => Some(&mut code.body),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncDecl> {
        match &self.kind {
            DeclKind::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_nominal(&self) -> Option<&NominalDecl> {
        match &self.kind {
            DeclKind::Nominal(nominal) => Some(nominal),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&ExtensionDecl> {
        match &self.kind {
            DeclKind::Extension(extension) => Some(extension),
            _ => None,
        }
    }

    /// Declarations nested directly under this one: members, pattern
    /// variables and body locals.
    pub fn children(&self) -> Vec<DeclId> {
        match &self.kind {
            DeclKind::Nominal(nominal) => nominal.members.clone(),
            DeclKind::Extension(extension) => extension.members.clone(),
            DeclKind::PatternBinding(binding) => binding.vars.clone(),
            DeclKind::Func(func) => func.body.as_ref().map(|b| b.decls.clone()).unwrap_or_default(),
            DeclKind::TopLevelCode(code) => code.body.decls.clone(),
            DeclKind::Var(_) => vec![],
        }
    }
}

#[derive(Debug)]
pub enum DeclKind {
    Func(FuncDecl),
    Var(VarDecl),
    PatternBinding(PatternBindingDecl),
    Nominal(NominalDecl),
    Extension(ExtensionDecl),
    TopLevelCode(TopLevelCodeDecl),
}

impl DeclKind {
    pub fn function(body: Body) -> Self {
        DeclKind::Func(FuncDecl {
            kind: FuncKind::Function,
            body: Some(body),
            captures: vec![],
        })
    }

    pub fn func(kind: FuncKind, body: Option<Body>) -> Self {
        DeclKind::Func(FuncDecl {
            kind,
            body,
            captures: vec![],
        })
    }

    pub fn var() -> Self {
        DeclKind::Var(VarDecl::default())
    }

    pub fn pattern_binding() -> Self {
        DeclKind::PatternBinding(PatternBindingDecl { vars: vec![] })
    }

    pub fn nominal(kind: NominalKind) -> Self {
        DeclKind::Nominal(NominalDecl::new(kind))
    }

    pub fn extension(ref_components: Vec<RefComponent>) -> Self {
        DeclKind::Extension(ExtensionDecl {
            ref_components,
            extended_type: None,
            inherited: vec![],
            members: vec![],
        })
    }

    pub fn top_level_code(body: Body) -> Self {
        DeclKind::TopLevelCode(TopLevelCodeDecl { body })
    }

    pub fn descriptive_kind(&self) -> &'static str {
        match self {
            DeclKind::Func(func) => match func.kind {
                FuncKind::Function => "function",
                FuncKind::Constructor => "initializer",
                FuncKind::Destructor => "deinitializer",
                FuncKind::Accessor { .. } => "accessor",
            },
            DeclKind::Var(_) => "var",
            DeclKind::PatternBinding(_) => "pattern binding",
            DeclKind::Nominal(nominal) => match nominal.kind {
                NominalKind::Struct => "struct",
                NominalKind::Class => "class",
                NominalKind::Enum => "enum",
                NominalKind::Protocol => "protocol",
            },
            DeclKind::Extension(_) => "extension",
            DeclKind::TopLevelCode(_) => "top-level code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Getter,
    Setter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    Function,
    Constructor,
    Destructor,
    Accessor { kind: AccessorKind, storage: DeclId },
}

#[derive(Debug)]
pub struct FuncDecl {
    pub kind: FuncKind,
    pub body: Option<Body>,
    /// Declarations from enclosing scopes this function uses, including
    /// whatever its nested functions use.
    pub captures: Vec<DeclId>,
}

impl FuncDecl {
    pub fn accessor_storage(&self) -> Option<DeclId> {
        match self.kind {
            FuncKind::Accessor { storage, .. } => Some(storage),
            _ => None,
        }
    }

    pub fn is_setter(&self) -> bool {
        matches!(self.kind, FuncKind::Accessor { kind: AccessorKind::Setter, .. })
    }
}

#[derive(Debug, Default)]
pub struct VarDecl {
    pub type_loc: Option<TypeLoc>,
    pub has_initial_value: bool,
}

#[derive(Debug)]
pub struct PatternBindingDecl {
    pub vars: Vec<DeclId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalKind {
    Struct,
    Class,
    Enum,
    Protocol,
}

#[derive(Debug, Clone)]
pub struct EnumCase {
    pub name: String,
    pub has_payload: bool,
}

#[derive(Debug)]
pub struct NominalDecl {
    pub kind: NominalKind,
    pub generic_params: Option<GenericParamListId>,
    pub inherited: Vec<TypeLoc>,
    pub members: Vec<DeclId>,
    /// Extensions bound to this type, in binding order.
    pub extensions: Vec<DeclId>,
    /// Protocols this type conforms to, written or synthesized.
    pub conformances: Vec<DeclId>,
    pub cases: Vec<EnumCase>,
}

impl NominalDecl {
    pub fn new(kind: NominalKind) -> Self {
        NominalDecl {
            kind,
            generic_params: None,
            inherited: vec![],
            members: vec![],
            extensions: vec![],
            conformances: vec![],
            cases: vec![],
        }
    }
}

/// One dotted component of the name an extension was written against,
/// e.g. `Outer<T>` in `extension Outer<T>.Inner`.
#[derive(Debug, Clone)]
pub struct RefComponent {
    pub name: String,
    pub span: Span,
    pub generic_params: Option<GenericParamListId>,
}

#[derive(Debug)]
pub struct ExtensionDecl {
    pub ref_components: Vec<RefComponent>,
    /// Set exactly once by extension binding.
    pub extended_type: Option<Type>,
    pub inherited: Vec<TypeLoc>,
    pub members: Vec<DeclId>,
}

#[derive(Debug)]
pub struct TopLevelCodeDecl {
    pub body: Body,
}

#[derive(Debug, Default)]
pub struct Body {
    /// Local declarations in source order.
    pub decls: Vec<DeclId>,
    pub exprs: Vec<Expr>,
    /// Value declarations referenced from this body.
    pub refs: Vec<DeclId>,
}
