use crate::{
    ast::{
        ast::{AstContext, DeclContext, DeclId, ModuleId, SourceFileId},
        types::{Type, TypeLoc, TypeResolutionOptions},
    },
    errors::errors::Error,
};

use super::type_checker::TypeChecker;

/// The semantic passes the driver schedules but does not implement.
///
/// Every method receives the checker so an implementation can call back into
/// it, e.g. validate a declaration it depends on or register a nested
/// function. An `Err` that is not internal is reported as a diagnostic and
/// marks the declaration being checked invalid; an internal `Err` aborts
/// checking.
pub trait SemanticCollaborator {
    /// Name binding for a file, starting at top-level element `start_elem`.
    fn bind_names(&mut self, _tc: &mut TypeChecker<'_>, _file: SourceFileId, _start_elem: usize) -> Result<(), Error> {
        Ok(())
    }

    /// Resolves a written type. Implementations record what every identifier
    /// component bound to on `loc`'s representation.
    fn validate_type(
        &mut self,
        tc: &mut TypeChecker<'_>,
        loc: &mut TypeLoc,
        dc: DeclContext,
        options: TypeResolutionOptions,
    ) -> Result<Type, Error>;

    fn check_decl_first_pass(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error>;

    fn check_decl_second_pass(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error>;

    fn check_function_body(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error>;

    fn check_top_level_code(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error>;

    /// The declarations `func` itself captures from enclosing scopes. What
    /// nested functions capture is merged in by the scheduler.
    fn compute_captures(&mut self, tc: &mut TypeChecker<'_>, func: DeclId) -> Vec<DeclId>;

    fn lookup_unqualified(
        &mut self,
        tc: &mut TypeChecker<'_>,
        name: &str,
        module: ModuleId,
        dc: Option<DeclContext>,
        is_type_lookup: bool,
    ) -> LookupResult;
}

#[derive(Debug, Clone, Default)]
pub struct LookupResult {
    pub results: Vec<DeclId>,
}

impl LookupResult {
    pub fn is_success(&self) -> bool {
        !self.results.is_empty()
    }

    /// The only result, if it is a type declaration.
    pub fn single_type_result(&self, ctx: &AstContext) -> Option<DeclId> {
        match self.results.as_slice() {
            [decl] if ctx[*decl].as_nominal().is_some() => Some(*decl),
            _ => None,
        }
    }
}
