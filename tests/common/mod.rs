//! A scripted semantic collaborator and AST builders shared by the
//! integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use sema::{
    ast::{
        ast::{AstContext, DeclContext, DeclId, ModuleId, SourceFileId, SourceFileKind},
        declarations::{Body, DeclKind, NominalKind},
        types::{ComponentBinding, Type, TypeLoc, TypeRepr, TypeResolutionOptions},
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::{
        collaborator::{LookupResult, SemanticCollaborator},
        type_checker::TypeChecker,
    },
    Span,
};

pub fn span(start: u32) -> Span {
    Span::new(&Rc::new("main.lang".to_string()), start, start + 1)
}

pub fn find_nominal(ctx: &AstContext, name: &str) -> Option<DeclId> {
    ctx.decl_ids()
        .find(|d| ctx[*d].name == name && ctx[*d].as_nominal().is_some())
}

#[derive(Default)]
pub struct ScriptedCollaborator {
    /// Names of declarations whose first pass fails.
    pub failing: HashSet<String>,
    /// Names of functions whose body check fails.
    pub failing_bodies: HashSet<String>,
    /// Checking the body of the named function synthesizes this many
    /// implicit functions.
    pub synthesize: HashMap<String, usize>,
    /// The named declaration asks for its own validation while validating.
    pub reenter: Option<String>,
    /// Type names that resolve to something other than their declaration.
    pub aliases: HashMap<String, Type>,

    pub first_passes: Vec<String>,
    pub second_passes: Vec<String>,
    pub checked_bodies: Vec<String>,
    pub capture_order: Vec<String>,
    pub literal_protocols: Vec<Option<DeclId>>,
}

impl ScriptedCollaborator {
    pub fn new() -> Self {
        ScriptedCollaborator::default()
    }

    fn check_literals(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error> {
        let exprs = tc.ctx[decl].body().map(|b| b.exprs.clone()).unwrap_or_default();
        for expr in exprs {
            let protocol = tc.get_literal_protocol(self, &expr)?;
            self.literal_protocols.push(protocol);
        }
        Ok(())
    }

    fn type_mismatch(tc: &TypeChecker<'_>, decl: DeclId) -> Error {
        Error::new(
            ErrorImpl::TypeMatchError {
                expected: "Int".to_string(),
                received: tc.ctx[decl].name.clone(),
            },
            tc.ctx[decl].span.start.clone(),
        )
    }
}

impl SemanticCollaborator for ScriptedCollaborator {
    fn validate_type(
        &mut self,
        tc: &mut TypeChecker<'_>,
        loc: &mut TypeLoc,
        _dc: DeclContext,
        _options: TypeResolutionOptions,
    ) -> Result<Type, Error> {
        let mut result = Type::Error;
        if let Some(TypeRepr::Ident(components)) = &mut loc.repr {
            for component in components.iter_mut() {
                // Module names qualify a path but bind to nothing.
                if tc.ctx.modules().any(|(_, m)| m.name == component.name) {
                    continue;
                }

                let ty = if let Some(alias) = self.aliases.get(&component.name) {
                    alias.clone()
                } else if let Some(decl) = find_nominal(tc.ctx, &component.name) {
                    tc.declared_type(decl)
                } else {
                    return Err(Error::new(
                        ErrorImpl::UnknownType {
                            type_: component.name.clone(),
                        },
                        component.span.start.clone(),
                    ));
                };
                component.binding = Some(ComponentBinding::Type(ty.clone()));
                result = ty;
            }
        }
        loc.ty = Some(result.clone());
        Ok(result)
    }

    fn check_decl_first_pass(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error> {
        let name = tc.ctx[decl].name.clone();
        self.first_passes.push(name.clone());
        if self.reenter.as_deref() == Some(name.as_str()) {
            tc.validate_decl(self, decl)?;
        }
        if self.failing.contains(&name) {
            return Err(Self::type_mismatch(tc, decl));
        }
        Ok(())
    }

    fn check_decl_second_pass(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error> {
        self.second_passes.push(tc.ctx[decl].name.clone());
        Ok(())
    }

    fn check_function_body(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error> {
        let name = tc.ctx[decl].name.clone();
        self.checked_bodies.push(name.clone());

        if let Some(count) = self.synthesize.get(&name).copied() {
            for i in 0..count {
                let span = tc.ctx[decl].span.clone();
                let implicit = tc.ctx.add_decl(
                    &format!("{}_implicit_{}", name, i),
                    span,
                    DeclContext::Decl(decl),
                    DeclKind::function(Body::default()),
                );
                tc.ctx[implicit].implicit = true;
                tc.add_implicitly_defined_function(implicit);
            }
        }

        self.check_literals(tc, decl)?;
        if self.failing_bodies.contains(&name) {
            return Err(Self::type_mismatch(tc, decl));
        }
        Ok(())
    }

    fn check_top_level_code(&mut self, tc: &mut TypeChecker<'_>, decl: DeclId) -> Result<(), Error> {
        self.checked_bodies.push(tc.ctx[decl].name.clone());
        self.check_literals(tc, decl)
    }

    fn compute_captures(&mut self, tc: &mut TypeChecker<'_>, func: DeclId) -> Vec<DeclId> {
        self.capture_order.push(tc.ctx[func].name.clone());
        let refs = tc.ctx[func].body().map(|b| b.refs.clone()).unwrap_or_default();
        refs.into_iter()
            .filter(|r| *r != func && !tc.ctx.is_declared_within(*r, func))
            .collect()
    }

    fn lookup_unqualified(
        &mut self,
        tc: &mut TypeChecker<'_>,
        name: &str,
        module: ModuleId,
        _dc: Option<DeclContext>,
        is_type_lookup: bool,
    ) -> LookupResult {
        let results = tc
            .ctx
            .decl_ids()
            .filter(|d| {
                let decl = &tc.ctx[*d];
                decl.name == name
                    && tc.ctx.parent_module(decl.context) == module
                    && (!is_type_lookup || decl.as_nominal().is_some())
            })
            .collect();
        LookupResult { results }
    }
}

/// A main module with one main file.
pub struct Fixture {
    pub ctx: AstContext,
    pub module: ModuleId,
    pub file: SourceFileId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut ctx = AstContext::new();
        let module = ctx.add_module("main");
        let file = ctx.add_source_file(module, "main.lang", SourceFileKind::Main);
        Fixture { ctx, module, file }
    }

    /// Loads a standard library declaring the given protocols plus `Bool`,
    /// and imports it into the main module.
    pub fn with_stdlib(mut self, protocols: &[&str]) -> Self {
        let stdlib = self.ctx.add_module("Swift");
        let file = self.ctx.add_source_file(stdlib, "Swift.lang", SourceFileKind::Library);
        for (i, name) in protocols.iter().enumerate() {
            self.ctx
                .add_top_level_decl(file, name, span(1000 + i as u32), DeclKind::nominal(NominalKind::Protocol));
        }
        self.ctx
            .add_top_level_decl(file, "Bool", span(999), DeclKind::nominal(NominalKind::Struct));
        self.ctx.stdlib_module = Some(stdlib);
        self.ctx.add_import(self.module, stdlib);
        self
    }

    pub fn stdlib(&self) -> ModuleId {
        self.ctx.stdlib_module.expect("stdlib not loaded")
    }

    pub fn function(&mut self, name: &str, start: u32) -> DeclId {
        self.ctx
            .add_top_level_decl(self.file, name, span(start), DeclKind::function(Body::default()))
    }

    pub fn local_function(&mut self, parent: DeclId, name: &str, start: u32) -> DeclId {
        self.ctx
            .add_local_decl(parent, name, span(start), DeclKind::function(Body::default()))
    }

    pub fn nominal(&mut self, name: &str, kind: NominalKind, start: u32) -> DeclId {
        self.ctx
            .add_top_level_decl(self.file, name, span(start), DeclKind::nominal(kind))
    }

    pub fn refs(&mut self, func: DeclId, refs: &[DeclId]) {
        if let Some(body) = self.ctx[func].body_mut() {
            body.refs.extend_from_slice(refs);
        }
    }

    pub fn all_terminal(&self) -> bool {
        self.ctx.decl_ids().all(|d| self.ctx[d].state.is_terminal())
    }
}
