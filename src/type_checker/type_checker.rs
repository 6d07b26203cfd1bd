use std::collections::{HashSet, VecDeque};

use once_cell::unsync::OnceCell;
use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{AstContext, DeclContext, DeclId, ModuleId},
        declarations::{Body, DeclKind, FuncKind, NominalKind, ValidationState},
        known_protocols::KnownProtocolKind,
        types::Type,
    },
    errors::{
        diagnostics::DiagnosticEngine,
        errors::{Error, ErrorImpl},
    },
    Span, MK_ERROR,
};

use super::collaborator::SemanticCollaborator;

/// Checking state for one compilation.
///
/// Owns the work queues of the scheduler and borrows the AST and the
/// diagnostic sink for as long as checking runs.
pub struct TypeChecker<'a> {
    pub ctx: &'a mut AstContext,
    pub diags: &'a mut DiagnosticEngine,
    /// Functions of the current unit whose bodies still need checking, in
    /// discovery order.
    pub defined_functions: Vec<DeclId>,
    /// Functions synthesized during the current scheduler iteration.
    pub implicitly_defined_functions: Vec<DeclId>,
    /// Nominal types validated on demand whose members still need a first
    /// pass.
    pub validated_types: Vec<DeclId>,
    scheduled: HashSet<DeclId>,
    stdlib_module: OnceCell<ModuleId>,
    bool_type: OnceCell<Type>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(ctx: &'a mut AstContext, diags: &'a mut DiagnosticEngine) -> Self {
        TypeChecker {
            ctx,
            diags,
            defined_functions: vec![],
            implicitly_defined_functions: vec![],
            validated_types: vec![],
            scheduled: HashSet::new(),
            stdlib_module: OnceCell::new(),
            bool_type: OnceCell::new(),
        }
    }

    pub fn diagnose(&mut self, error: Error) {
        self.diags.diagnose(error);
    }

    /// Queues a function body for checking. A function is queued at most
    /// once.
    pub fn add_defined_function(&mut self, decl: DeclId) {
        if self.scheduled.insert(decl) {
            trace!(decl = %self.ctx[decl].name, "function scheduled");
            self.defined_functions.push(decl);
        }
    }

    /// Stages a compiler-synthesized function; it joins the defined
    /// functions at the end of the current scheduler iteration.
    pub fn add_implicitly_defined_function(&mut self, decl: DeclId) {
        self.implicitly_defined_functions.push(decl);
    }

    pub fn flush_implicitly_defined_functions(&mut self) {
        let implicit = std::mem::take(&mut self.implicitly_defined_functions);
        for decl in implicit {
            self.add_defined_function(decl);
        }
    }

    pub fn mark_invalid(&mut self, decl: DeclId) {
        let decl = &mut self.ctx[decl];
        decl.state = ValidationState::Invalid;
        decl.ty = Some(Type::Error);
    }

    /// Marks `decl` and everything nested in it invalid without consulting
    /// the collaborator, and retires all pending passes over them.
    pub fn invalidate_subtree(&mut self, decl: DeclId) {
        let mut subtree = vec![];
        self.ctx.collect_subtree(decl, &mut subtree);
        for d in subtree {
            self.mark_invalid(d);
            let progress = &mut self.ctx[d].progress;
            progress.members_checked = true;
            progress.second_pass_checked = true;
            progress.body_checked = true;
            progress.captures_computed = true;
        }
    }

    /// Records the outcome of a collaborator call against `decl`.
    ///
    /// Returns whether the call succeeded. Internal errors are handed back
    /// to abort checking.
    pub(crate) fn absorb(&mut self, decl: DeclId, result: Result<(), Error>) -> Result<bool, Error> {
        match result {
            Ok(()) => Ok(true),
            Err(error) if error.is_internal() => Err(error),
            Err(error) => {
                debug!(decl = %self.ctx[decl].name, error = %error, "declaration invalid");
                self.diagnose(error);
                self.mark_invalid(decl);
                Ok(false)
            }
        }
    }

    /// The type a type declaration declares.
    pub fn declared_type(&self, decl: DeclId) -> Type {
        match self.ctx[decl].as_nominal() {
            Some(nominal) if nominal.generic_params.is_some() => Type::UnboundGeneric(decl),
            Some(_) => Type::Nominal(decl),
            None => Type::Error,
        }
    }

    /// Validates the declaration itself (not its members or body).
    ///
    /// Does nothing for declarations already in a terminal state. Entering
    /// validation of a declaration that is being validated is an internal
    /// error.
    pub fn validate_decl(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        match self.ctx[decl].state {
            ValidationState::Valid | ValidationState::Invalid => return Ok(()),
            ValidationState::Validating => {
                return Err(MK_ERROR!(
                    ErrorImpl::ReentrantValidation { decl: self.ctx[decl].name.clone() },
                    self.ctx[decl].span.start.clone()
                ));
            }
            ValidationState::Unchecked => {}
        }

        if let DeclKind::Extension(_) = self.ctx[decl].kind {
            self.bind_extension_decl(collab, decl)?;
            if self.ctx[decl].is_invalid() {
                return Ok(());
            }
        }

        self.ctx[decl].state = ValidationState::Validating;
        let result = collab.check_decl_first_pass(self, decl);
        self.absorb(decl, result)?;

        if self.ctx[decl].state == ValidationState::Validating {
            self.ctx[decl].state = ValidationState::Valid;
            if self.ctx[decl].ty.is_none() {
                let ty = match &self.ctx[decl].kind {
                    DeclKind::Nominal(_) => Some(self.declared_type(decl)),
                    DeclKind::Extension(extension) => extension.extended_type.clone(),
                    _ => None,
                };
                self.ctx[decl].ty = ty;
            }
        }
        trace!(decl = %self.ctx[decl].name, state = %self.ctx[decl].state, "validated");

        if let DeclKind::Nominal(_) = self.ctx[decl].kind {
            self.validated_types.push(decl);
        }
        Ok(())
    }

    /// Runs the first or second checking pass over a declaration.
    ///
    /// The first pass validates the declaration, recurses into members and
    /// queues function bodies. The second pass runs once the first pass of
    /// every top-level declaration is done.
    pub fn type_check_decl(
        &mut self,
        collab: &mut dyn SemanticCollaborator,
        decl: DeclId,
        is_first_pass: bool,
    ) -> Result<(), Error> {
        if let DeclKind::TopLevelCode(_) = self.ctx[decl].kind {
            return self.type_check_top_level_code(collab, decl);
        }

        if is_first_pass {
            return self.type_check_decl_first_pass(collab, decl);
        }

        if !self.ctx[decl].progress.members_checked {
            self.type_check_decl_first_pass(collab, decl)?;
        }
        if self.ctx[decl].progress.second_pass_checked {
            return Ok(());
        }
        self.ctx[decl].progress.second_pass_checked = true;

        if self.ctx[decl].state == ValidationState::Valid {
            let result = collab.check_decl_second_pass(self, decl);
            self.absorb(decl, result)?;
        }

        let members = match &self.ctx[decl].kind {
            DeclKind::Nominal(nominal) => nominal.members.clone(),
            DeclKind::Extension(extension) => extension.members.clone(),
            _ => vec![],
        };
        for member in members {
            self.type_check_decl(collab, member, false)?;
        }
        Ok(())
    }

    fn type_check_decl_first_pass(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        self.validate_decl(collab, decl)?;
        if self.ctx[decl].progress.members_checked {
            return Ok(());
        }
        self.ctx[decl].progress.members_checked = true;

        let invalid = self.ctx[decl].is_invalid();
        let children = self.ctx[decl].children();
        match self.ctx[decl].kind {
            DeclKind::Extension(_) if invalid => {
                for member in children {
                    self.invalidate_subtree(member);
                }
            }
            DeclKind::Nominal(_) | DeclKind::Extension(_) => {
                for member in children {
                    self.type_check_decl(collab, member, true)?;
                }
            }
            DeclKind::PatternBinding(_) => {
                for var in children {
                    self.validate_decl(collab, var)?;
                }
            }
            DeclKind::Func(_) => {
                if self.ctx[decl].body().is_some() {
                    self.add_defined_function(decl);
                }
            }
            DeclKind::Var(_) | DeclKind::TopLevelCode(_) => {}
        }
        Ok(())
    }

    /// Checks a function body once, then the declarations local to it.
    ///
    /// Local functions found here are appended to the defined functions,
    /// so they are checked after the function that contains them.
    pub fn type_check_function_body(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        if self.ctx[decl].progress.body_checked {
            return Ok(());
        }
        self.ctx[decl].progress.body_checked = true;

        self.validate_decl(collab, decl)?;
        if self.ctx[decl].is_invalid() {
            for local in self.ctx[decl].children() {
                self.invalidate_subtree(local);
            }
            return Ok(());
        }

        trace!(decl = %self.ctx[decl].name, "checking function body");
        let result = collab.check_function_body(self, decl);
        self.absorb(decl, result)?;

        self.type_check_locals(collab, decl)
    }

    pub fn type_check_top_level_code(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        if self.ctx[decl].progress.body_checked {
            return Ok(());
        }
        if self.ctx[decl].state == ValidationState::Validating {
            return Err(MK_ERROR!(
                ErrorImpl::ReentrantValidation { decl: self.ctx[decl].name.clone() },
                self.ctx[decl].span.start.clone()
            ));
        }
        self.ctx[decl].progress.body_checked = true;
        self.ctx[decl].progress.members_checked = true;
        self.ctx[decl].progress.second_pass_checked = true;

        self.ctx[decl].state = ValidationState::Validating;
        let result = collab.check_top_level_code(self, decl);
        self.absorb(decl, result)?;
        if self.ctx[decl].state == ValidationState::Validating {
            self.ctx[decl].state = ValidationState::Valid;
        }

        self.type_check_locals(collab, decl)
    }

    fn type_check_locals(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        for local in self.ctx[decl].children() {
            self.type_check_decl(collab, local, true)?;
            self.type_check_decl(collab, local, false)?;
        }
        Ok(())
    }

    /// Synthesizes the implicit members an imported nominal type needs.
    pub fn handle_external_decl(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        self.validate_decl(collab, decl)?;
        let Some(kind) = self.ctx[decl].as_nominal().map(|n| n.kind) else {
            return Ok(());
        };

        match kind {
            NominalKind::Struct => {
                self.add_implicit_constructors(decl);
                self.add_implicit_struct_conformances(collab, decl)?;
            }
            NominalKind::Class => self.add_implicit_destructor(decl),
            NominalKind::Enum => self.add_implicit_enum_conformances(collab, decl)?,
            NominalKind::Protocol => {}
        }
        Ok(())
    }

    fn has_member_of_kind(&self, decl: DeclId, kind: FuncKind) -> bool {
        self.ctx[decl]
            .children()
            .iter()
            .any(|m| matches!(self.ctx[*m].as_func(), Some(func) if func.kind == kind))
    }

    fn add_implicit_member(&mut self, parent: DeclId, name: &str, kind: FuncKind) {
        let span = self.ctx[parent].span.clone();
        let access = self.ctx[parent].access;
        let member = self.ctx.add_member(parent, name, span, DeclKind::func(kind, Some(Body::default())));
        self.ctx[member].implicit = true;
        self.ctx[member].access = access;
        debug!(parent = %self.ctx[parent].name, member = name, "implicit member synthesized");
        self.add_implicitly_defined_function(member);
    }

    pub fn add_implicit_constructors(&mut self, decl: DeclId) {
        if !self.has_member_of_kind(decl, FuncKind::Constructor) {
            self.add_implicit_member(decl, "init", FuncKind::Constructor);
        }
    }

    pub fn add_implicit_destructor(&mut self, decl: DeclId) {
        if !self.has_member_of_kind(decl, FuncKind::Destructor) {
            self.add_implicit_member(decl, "deinit", FuncKind::Destructor);
        }
    }

    /// Enums whose cases carry no payload are equatable and hashable.
    pub fn add_implicit_enum_conformances(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        let simple = match self.ctx[decl].as_nominal() {
            Some(nominal) => !nominal.cases.is_empty() && nominal.cases.iter().all(|c| !c.has_payload),
            None => false,
        };
        if !simple {
            return Ok(());
        }
        self.add_implicit_equatable_hashable(collab, decl)
    }

    /// Structs wrapping a raw value (`RawRepresentable` or `OptionSet`
    /// written in their inheritance clause) are equatable and hashable.
    pub fn add_implicit_struct_conformances(
        &mut self,
        collab: &mut dyn SemanticCollaborator,
        decl: DeclId,
    ) -> Result<(), Error> {
        let wraps_raw_value = self.ctx[decl].inherited().iter().any(|inherited| {
            matches!(
                inherited.components().last().and_then(|c| KnownProtocolKind::from_name(&c.name)),
                Some(KnownProtocolKind::RawRepresentable | KnownProtocolKind::OptionSet)
            )
        });
        if !wraps_raw_value {
            return Ok(());
        }
        self.add_implicit_equatable_hashable(collab, decl)
    }

    fn add_implicit_equatable_hashable(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        for kind in [KnownProtocolKind::Equatable, KnownProtocolKind::Hashable] {
            let Some(protocol) = self.get_protocol(collab, &Span::null(), kind)? else {
                continue;
            };
            if let DeclKind::Nominal(nominal) = &mut self.ctx[decl].kind {
                if !nominal.conformances.contains(&protocol) {
                    nominal.conformances.push(protocol);
                }
            }
        }
        Ok(())
    }

    /// The module that provides the standard library, looked up once.
    ///
    /// Falls back to `module` when no standard library is loaded. Recording
    /// the known protocols happens on first lookup.
    pub fn get_stdlib_module(&mut self, module: ModuleId) -> ModuleId {
        if let Some(stdlib) = self.stdlib_module.get() {
            return *stdlib;
        }

        let stdlib = self.ctx.stdlib_module.unwrap_or(module);
        self.record_known_protocols(stdlib);
        let _ = self.stdlib_module.set(stdlib);
        stdlib
    }

    fn record_known_protocols(&mut self, module: ModuleId) {
        let mut found = vec![];
        for file in &self.ctx.module(module).files {
            for decl in &self.ctx.file(*file).decls {
                let decl_ref = &self.ctx[*decl];
                if let Some(nominal) = decl_ref.as_nominal() {
                    if nominal.kind != NominalKind::Protocol {
                        continue;
                    }
                    if let Some(kind) = KnownProtocolKind::from_name(&decl_ref.name) {
                        found.push((kind, *decl));
                    }
                }
            }
        }
        debug!(module = %self.ctx.module(module).name, protocols = found.len(), "known protocols recorded");
        for (kind, decl) in found {
            self.ctx.record_known_protocol(kind, decl);
        }
    }

    /// Resolves a compiler-known protocol.
    ///
    /// A missing protocol is diagnosed at `loc` (unless it is null) and
    /// yields `None`, as does a protocol declaration that fails validation.
    pub fn get_protocol(
        &mut self,
        collab: &mut dyn SemanticCollaborator,
        loc: &Span,
        kind: KnownProtocolKind,
    ) -> Result<Option<DeclId>, Error> {
        if self.stdlib_module.get().is_none() {
            if let Some(stdlib) = self.ctx.stdlib_module {
                self.get_stdlib_module(stdlib);
            }
        }

        let Some(protocol) = self.ctx.known_protocol(kind) else {
            if loc.is_valid() {
                self.diagnose(MK_ERROR!(
                    ErrorImpl::MissingProtocol { protocol: kind.name().to_string() },
                    loc.start.clone()
                ));
            }
            return Ok(None);
        };

        if self.ctx[protocol].state == ValidationState::Unchecked {
            self.validate_decl(collab, protocol)?;
        }
        if self.ctx[protocol].is_invalid() {
            return Ok(None);
        }
        Ok(Some(protocol))
    }

    /// The standard library's `Bool`, looked up once per checker.
    ///
    /// When the lookup fails the failure is diagnosed once and the error
    /// type is cached instead.
    pub fn lookup_bool_type(&mut self, collab: &mut dyn SemanticCollaborator, dc: DeclContext) -> Type {
        if let Some(ty) = self.bool_type.get() {
            return ty.clone();
        }

        let module = self.ctx.parent_module(dc);
        let stdlib = self.get_stdlib_module(module);
        let lookup = collab.lookup_unqualified(self, "Bool", stdlib, None, true);
        let ty = match lookup.single_type_result(self.ctx) {
            Some(decl) if lookup.is_success() => self.declared_type(decl),
            _ => {
                self.diagnose(MK_ERROR!(ErrorImpl::BoolTypeBroken, crate::Position::null()));
                Type::Error
            }
        };

        let _ = self.bool_type.set(ty.clone());
        ty
    }

    pub fn diagnose_ambiguous_member_type(
        &mut self,
        base: &Type,
        base_range: &Span,
        name: &str,
        name_loc: &Span,
        candidates: &[DeclId],
    ) {
        let base_name = self.ctx.type_name(base);
        self.diagnose(
            MK_ERROR!(
                ErrorImpl::AmbiguousMemberType {
                    name: name.to_string(),
                    base: base_name,
                },
                name_loc.start.clone()
            )
            .highlight(base_range.clone()),
        );
        for candidate in candidates {
            let type_ = self.ctx.type_name(&self.declared_type(*candidate));
            let position = self.ctx[*candidate].span.start.clone();
            self.diagnose(MK_ERROR!(ErrorImpl::FoundCandidateType { type_ }, position));
        }
    }

    /// `module` followed by everything it imports, transitively, each once.
    pub fn visible_modules(&self, module: ModuleId) -> Vec<ModuleId> {
        let mut seen = HashSet::new();
        let mut order = vec![];
        let mut queue = VecDeque::from([module]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            queue.extend(self.ctx.module(next).imports.iter().copied());
        }
        order
    }
}
