use std::fmt::Display;

use thiserror::Error;

use crate::{Position, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Note,
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
    highlights: Vec<Span>,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
            highlights: vec![],
        }
    }

    /// Attaches a highlighted source range, mirroring a diagnostic's
    /// secondary underline.
    pub fn highlight(mut self, span: Span) -> Self {
        self.highlights.push(span);
        self
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_highlights(&self) -> &[Span] {
        &self.highlights
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_severity(&self) -> Severity {
        match &self.internal_error {
            ErrorImpl::ExtendedTypeHere { .. } | ErrorImpl::FoundCandidateType { .. } => Severity::Note,
            _ => Severity::Error,
        }
    }

    /// Internal errors mean an earlier pass broke its contract. They abort
    /// checking instead of being reported against user code.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::ReentrantValidation { .. }
                | ErrorImpl::UnhandledExternalDefinition { .. }
                | ErrorImpl::UncheckedDeclaration { .. }
                | ErrorImpl::FileNotTypeChecked { .. }
        )
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::ExtensionMetatype => "ExtensionMetatype",
            ErrorImpl::ExtensionGenericParamsForNonGeneric { .. } => "ExtensionGenericParamsForNonGeneric",
            ErrorImpl::ExtensionGenericParamsForNonGenericType { .. } => "ExtensionGenericParamsForNonGenericType",
            ErrorImpl::ExtendedTypeHere { .. } => "ExtendedTypeHere",
            ErrorImpl::ExtensionGenericWrongNumberOfParameters { .. } => "ExtensionGenericWrongNumberOfParameters",
            ErrorImpl::NonNominalExtension { .. } => "NonNominalExtension",
            ErrorImpl::MissingProtocol { .. } => "MissingProtocol",
            ErrorImpl::BoolTypeBroken => "BoolTypeBroken",
            ErrorImpl::ObjcDeclUsedWithoutRequiredModule { .. } => "ObjcDeclUsedWithoutRequiredModule",
            ErrorImpl::AmbiguousMemberType { .. } => "AmbiguousMemberType",
            ErrorImpl::FoundCandidateType { .. } => "FoundCandidateType",
            ErrorImpl::ReentrantValidation { .. } => "ReentrantValidation",
            ErrorImpl::UnhandledExternalDefinition { .. } => "UnhandledExternalDefinition",
            ErrorImpl::UncheckedDeclaration { .. } => "UncheckedDeclaration",
            ErrorImpl::FileNotTypeChecked { .. } => "FileNotTypeChecked",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ExtensionMetatype => ErrorTip::Suggestion(String::from(
                "Extend the type itself rather than its `.Type`",
            )),
            ErrorImpl::ExtensionGenericParamsForNonGeneric { name } => ErrorTip::Suggestion(format!(
                "`{}` does not name a type, remove the generic parameters",
                name
            )),
            ErrorImpl::ExtensionGenericParamsForNonGenericType { type_ } => {
                ErrorTip::Suggestion(format!("`{}` is not generic, remove the generic parameters", type_))
            }
            ErrorImpl::ExtendedTypeHere { .. } => ErrorTip::None,
            ErrorImpl::ExtensionGenericWrongNumberOfParameters { type_, too_many, have, expected } => {
                ErrorTip::Suggestion(format!(
                    "`{}` has {} generic parameters, the extension declares {} ({})",
                    type_,
                    expected,
                    have,
                    if *too_many { "too many" } else { "too few" }
                ))
            }
            ErrorImpl::NonNominalExtension { type_ } => ErrorTip::Suggestion(format!(
                "Only structs, classes and enums can be extended, found `{}`",
                type_
            )),
            ErrorImpl::MissingProtocol { protocol } => ErrorTip::Suggestion(format!(
                "Protocol `{}` is missing, is the standard library loaded?",
                protocol
            )),
            ErrorImpl::BoolTypeBroken => ErrorTip::Suggestion(String::from(
                "The standard library does not declare a usable `Bool` type",
            )),
            ErrorImpl::ObjcDeclUsedWithoutRequiredModule { attr, module } => ErrorTip::Suggestion(format!(
                "`@{}` requires importing `{}`",
                attr, module
            )),
            ErrorImpl::AmbiguousMemberType { .. } => ErrorTip::None,
            ErrorImpl::FoundCandidateType { .. } => ErrorTip::None,
            ErrorImpl::ReentrantValidation { .. }
            | ErrorImpl::UnhandledExternalDefinition { .. }
            | ErrorImpl::UncheckedDeclaration { .. }
            | ErrorImpl::FileNotTypeChecked { .. } => ErrorTip::Suggestion(String::from(
                "This is a compiler bug, an earlier pass left the declarations inconsistent",
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("cannot extend a metatype")]
    ExtensionMetatype,
    #[error("generic parameters on non-generic reference {name:?}")]
    ExtensionGenericParamsForNonGeneric { name: String },
    #[error("extension of non-generic type {type_:?} cannot declare generic parameters")]
    ExtensionGenericParamsForNonGenericType { type_: String },
    #[error("extended type {type_:?} declared here")]
    ExtendedTypeHere { type_: String },
    #[error("extension of generic type {type_:?} declares {have} generic parameters, expected {expected}")]
    ExtensionGenericWrongNumberOfParameters {
        type_: String,
        too_many: bool,
        have: usize,
        expected: usize,
    },
    #[error("non-nominal type {type_:?} cannot be extended")]
    NonNominalExtension { type_: String },
    #[error("missing protocol {protocol:?}")]
    MissingProtocol { protocol: String },
    #[error("standard library does not provide a valid Bool type")]
    BoolTypeBroken,
    #[error("@{attr} attribute used without importing module {module:?}")]
    ObjcDeclUsedWithoutRequiredModule { attr: String, module: String },
    #[error("ambiguous type name {name:?} in {base:?}")]
    AmbiguousMemberType { name: String, base: String },
    #[error("found candidate type {type_:?}")]
    FoundCandidateType { type_: String },
    #[error("declaration {decl:?} re-entered validation")]
    ReentrantValidation { decl: String },
    #[error("unhandled external definition kind for {decl:?}")]
    UnhandledExternalDefinition { decl: String },
    #[error("declaration {decl:?} left in state {state} after type checking")]
    UncheckedDeclaration { decl: String, state: String },
    #[error("source file {file:?} has not been type checked")]
    FileNotTypeChecked { file: String },
}
