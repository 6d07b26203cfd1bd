use tracing::{debug, trace};

use crate::{
    ast::{
        ast::DeclId,
        declarations::{DeclKind, ValidationState},
    },
    errors::errors::{Error, ErrorImpl},
    MK_ERROR,
};

use super::{collaborator::SemanticCollaborator, type_checker::TypeChecker};

/// What one run of the scheduler did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorklistStats {
    pub iterations: usize,
    pub functions_checked: usize,
    pub external_checked: usize,
    /// Cursor into the defined functions when the loop exited.
    pub function_cursor: usize,
    /// Cursor into the external definitions when the loop exited.
    pub external_cursor: usize,
}

impl<'a> TypeChecker<'a> {
    /// Runs the scheduler until no queue has an unprocessed tail.
    ///
    /// Each iteration drains external definitions, then defined functions
    /// (including any appended while draining), then computes captures for
    /// the functions just checked, newest first, so nested functions are
    /// finished before the functions that contain them. Types validated on
    /// demand get their first pass, and synthesized functions join the
    /// queue for the next iteration.
    pub fn type_check_functions_and_external_decls(
        &mut self,
        collab: &mut dyn SemanticCollaborator,
    ) -> Result<WorklistStats, Error> {
        let mut stats = WorklistStats::default();
        let mut current_external = self.ctx.last_checked_external_definition;
        let mut current_function = 0;

        loop {
            stats.iterations += 1;

            while current_external < self.ctx.external_definitions.len() {
                let decl = self.ctx.external_definitions[current_external];
                current_external += 1;
                self.check_external_definition(collab, decl)?;
                stats.external_checked += 1;
            }

            let previous_function = current_function;
            while current_function < self.defined_functions.len() {
                let decl = self.defined_functions[current_function];
                current_function += 1;
                self.type_check_function_body(collab, decl)?;
                stats.functions_checked += 1;
            }

            for index in (previous_function..current_function).rev() {
                let func = self.defined_functions[index];
                self.compute_captures(collab, func);
            }

            while let Some(nominal) = self.validated_types.pop() {
                self.type_check_decl(collab, nominal, true)?;
            }

            self.flush_implicitly_defined_functions();

            trace!(
                iteration = stats.iterations,
                functions = current_function,
                externals = current_external,
                "scheduler iteration finished"
            );

            if current_function == self.defined_functions.len()
                && current_external == self.ctx.external_definitions.len()
            {
                break;
            }
        }

        self.ctx.last_checked_external_definition = current_external;
        stats.function_cursor = current_function;
        stats.external_cursor = current_external;
        debug!(
            iterations = stats.iterations,
            functions = stats.functions_checked,
            externals = stats.external_checked,
            "scheduler reached a fixed point"
        );
        Ok(stats)
    }

    fn check_external_definition(&mut self, collab: &mut dyn SemanticCollaborator, decl: DeclId) -> Result<(), Error> {
        match self.ctx[decl].kind {
            DeclKind::Func(_) => self.type_check_function_body(collab, decl),
            DeclKind::Nominal(_) => self.handle_external_decl(collab, decl),
            _ => Err(MK_ERROR!(
                ErrorImpl::UnhandledExternalDefinition { decl: self.ctx[decl].name.clone() },
                self.ctx[decl].span.start.clone()
            )),
        }
    }

    /// Finalizes what `func` captures.
    ///
    /// Nested local functions must already be finalized; whatever they
    /// capture from outside `func` is captured by `func` too.
    pub fn compute_captures(&mut self, collab: &mut dyn SemanticCollaborator, func: DeclId) {
        if self.ctx[func].progress.captures_computed {
            return;
        }
        self.ctx[func].progress.captures_computed = true;
        if self.ctx[func].state == ValidationState::Invalid {
            return;
        }

        let mut captures: Vec<DeclId> = vec![];
        for decl in collab.compute_captures(self, func) {
            if !captures.contains(&decl) {
                captures.push(decl);
            }
        }

        for local in self.ctx[func].children() {
            let Some(nested) = self.ctx[local].as_func() else {
                continue;
            };
            for decl in &nested.captures {
                if *decl != func && !self.ctx.is_declared_within(*decl, func) && !captures.contains(decl) {
                    captures.push(*decl);
                }
            }
        }

        trace!(func = %self.ctx[func].name, captures = captures.len(), "captures computed");
        if let DeclKind::Func(f) = &mut self.ctx[func].kind {
            f.captures = captures;
        }
    }
}
