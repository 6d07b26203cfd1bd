//! Implicit `final` inference.
//!
//! Members that provably have no overrides are marked final so later
//! stages can devirtualize calls to them. Only declarations and binding
//! patterns are visited; bodies and written types are skipped.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::ast::{
    ast::{AstContext, DeclContext, DeclId, ModuleId, SourceFileId},
    declarations::{Accessibility, AttrOrigin, DeclKind, FuncKind},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SealingOptions {
    /// The whole module is visible, so internal members can be sealed.
    pub whole_module: bool,
    /// Drop an inferred `dynamic` from members that get sealed.
    pub apply_sealing: bool,
}

/// Walks declarations and marks the ones nothing overrides `final`.
///
/// A setter is sealed only once its storage is. Setters met before their
/// storage are held back and resolved by `finish`.
pub struct SealingWalker<'a> {
    ctx: &'a mut AstContext,
    options: SealingOptions,
    sealed: Vec<DeclId>,
    visited: HashSet<DeclId>,
    pending_setters: Vec<(DeclId, bool)>,
}

impl<'a> SealingWalker<'a> {
    pub fn new(ctx: &'a mut AstContext, options: SealingOptions) -> Self {
        SealingWalker {
            ctx,
            options,
            sealed: vec![],
            visited: HashSet::new(),
            pending_setters: vec![],
        }
    }

    pub fn walk(&mut self, decl: DeclId) {
        if !self.walk_to_decl_pre(decl) {
            return;
        }
        let children = match &self.ctx[decl].kind {
            DeclKind::Nominal(_) | DeclKind::Extension(_) | DeclKind::PatternBinding(_) => self.ctx[decl].children(),
            _ => vec![],
        };
        for child in children {
            self.walk(child);
        }
    }

    /// Seals held-back setters whose storage got sealed, then returns every
    /// sealed declaration in the order it was sealed.
    pub fn finish(mut self) -> Vec<DeclId> {
        let pending = std::mem::take(&mut self.pending_setters);
        for (setter, remove_dynamic) in pending {
            let storage = self.ctx[setter].as_func().and_then(|f| f.accessor_storage());
            if storage.is_some_and(|storage| self.ctx[storage].is_final()) {
                self.add_final(setter, remove_dynamic);
            } else {
                trace!(setter = %self.ctx[setter].name, "storage not sealed, setter skipped");
            }
        }
        self.sealed
    }

    /// Whether `dynamic` on `decl` and on everything it overrides was
    /// inferred rather than written.
    fn is_inferred_dynamic(&self, decl: Option<DeclId>) -> bool {
        let Some(decl) = decl else {
            return true;
        };

        if let Some(storage) = self.ctx[decl].as_func().and_then(|f| f.accessor_storage()) {
            if !self.is_inferred_dynamic(Some(storage)) {
                return false;
            }
        }

        match self.ctx[decl].attrs.dynamic {
            Some(AttrOrigin::Implicit) => self.is_inferred_dynamic(self.ctx[decl].overridden_decl),
            Some(AttrOrigin::Explicit) => false,
            None => true,
        }
    }

    fn is_in_class(&self, context: DeclContext) -> bool {
        self.ctx.nominal_in_context(context).is_some_and(|nominal| self.ctx.is_class(nominal))
    }

    /// Returns whether the children of `decl` should be visited.
    fn walk_to_decl_pre(&mut self, id: DeclId) -> bool {
        self.visited.insert(id);
        let decl = &self.ctx[id];
        if !decl.is_value_decl() {
            return true;
        }
        if let Some(func) = decl.as_func() {
            if matches!(func.kind, FuncKind::Constructor | FuncKind::Destructor) {
                return true;
            }
        }

        let Some(access) = decl.access else {
            return false;
        };
        if decl.is_final() || decl.is_invalid() {
            return false;
        }

        let mut remove_dynamic = false;
        if decl.attrs.dynamic.is_some() {
            if !self.is_inferred_dynamic(Some(id)) {
                return false;
            }
            remove_dynamic = true;
        }

        if access == Accessibility::Public {
            return true;
        }
        if access == Accessibility::Internal && !self.options.whole_module {
            return true;
        }

        let decl = &self.ctx[id];
        match &decl.kind {
            DeclKind::Var(_) => {
                if !decl.is_overridden && self.is_in_class(decl.context) {
                    self.add_final(id, remove_dynamic);
                }
            }
            DeclKind::Func(func) => {
                if !decl.is_overridden && self.is_in_class(decl.context) {
                    if func.is_setter() {
                        if let Some(storage) = func.accessor_storage() {
                            if !self.visited.contains(&storage) {
                                self.pending_setters.push((id, remove_dynamic));
                                return true;
                            }
                            if !self.ctx[storage].is_final() {
                                trace!(setter = %decl.name, "storage not sealed, setter skipped");
                                return true;
                            }
                        }
                    }
                    self.add_final(id, remove_dynamic);
                }
            }
            // Classes stay open; `@objc` classes can be subclassed from
            // outside the module anyway.
            _ => {}
        }
        true
    }

    fn add_final(&mut self, id: DeclId, remove_dynamic: bool) {
        let decl = &mut self.ctx[id];
        decl.attrs.final_attr = Some(AttrOrigin::Implicit);
        if remove_dynamic && self.options.apply_sealing {
            decl.attrs.dynamic = None;
        }
        trace!(decl = %decl.name, "sealed");
        self.sealed.push(id);
    }
}

/// Seals what can be sealed in `module`: every file in whole-module mode,
/// only `primary_file` otherwise. Returns the sealed declarations.
pub fn perform_whole_module_checks(
    ctx: &mut AstContext,
    module: ModuleId,
    primary_file: Option<SourceFileId>,
    options: SealingOptions,
) -> Vec<DeclId> {
    let files: Vec<SourceFileId> = ctx
        .module(module)
        .files
        .iter()
        .copied()
        .filter(|file| options.whole_module || Some(*file) == primary_file)
        .collect();

    let mut walker = SealingWalker::new(ctx, options);
    for file in files {
        let decls = walker.ctx.file(file).decls.clone();
        for decl in decls {
            walker.walk(decl);
        }
    }

    let sealed = walker.finish();
    debug!(sealed = sealed.len(), whole_module = options.whole_module, "sealing finished");
    sealed
}
