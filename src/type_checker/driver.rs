use tracing::{debug, info};

use crate::{
    ast::{
        ast::{AstContext, AstStage, DeclContext, DeclId, ModuleId, SourceFileId, SourceFileKind},
        declarations::DeclKind,
        types::{Type, TypeLoc, TypeResolutionOptions},
    },
    errors::{
        diagnostics::DiagnosticEngine,
        errors::{Error, ErrorImpl},
    },
    MK_ERROR,
};

use super::{
    collaborator::SemanticCollaborator,
    conformance::may_conform_to_known_protocol,
    sealing::{perform_whole_module_checks, SealingOptions},
    type_checker::TypeChecker,
    worklist::WorklistStats,
};

const FOUNDATION_MODULE: &str = "Foundation";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCheckOutcome {
    /// The file contains top-level code that needs separate lowering.
    pub has_top_level_code: bool,
    pub stats: WorklistStats,
}

/// Type checks `file` from top-level element `start_elem` on.
///
/// Runs name binding, binds every extension visible from the file, checks
/// the top-level declarations in two passes and then runs the scheduler to
/// a fixed point. Does nothing if the file was already checked.
pub fn perform_type_checking(
    ctx: &mut AstContext,
    diags: &mut DiagnosticEngine,
    collab: &mut dyn SemanticCollaborator,
    file: SourceFileId,
    start_elem: usize,
) -> Result<TypeCheckOutcome, Error> {
    if ctx.file(file).stage == AstStage::TypeChecked {
        return Ok(TypeCheckOutcome::default());
    }

    let module = ctx.file(file).module;
    let file_name = ctx.file(file).name.clone();
    let mut tc = TypeChecker::new(ctx, diags);

    collab.bind_names(&mut tc, file, start_elem)?;
    tc.ctx.file_mut(file).stage = AstStage::NameBound;
    debug!(file = %file_name, start_elem, "names bound");

    tc.get_stdlib_module(module);

    let imports_foundation = tc.bind_visible_extensions(collab, module)?;

    let decls: Vec<DeclId> = tc.ctx.file(file).decls.iter().skip(start_elem).copied().collect();
    for decl in &decls {
        if let DeclKind::TopLevelCode(_) = tc.ctx[*decl].kind {
            continue;
        }
        tc.type_check_decl(collab, *decl, true)?;
    }

    let mut has_top_level_code = false;
    for decl in &decls {
        if let DeclKind::TopLevelCode(_) = tc.ctx[*decl].kind {
            has_top_level_code = true;
            tc.type_check_top_level_code(collab, *decl)?;
        } else {
            tc.type_check_decl(collab, *decl, false)?;
        }
    }

    tc.flush_implicitly_defined_functions();

    let stats = tc.type_check_functions_and_external_decls(collab)?;

    tc.ctx.file_mut(file).stage = AstStage::TypeChecked;

    let source = tc.ctx.file(file);
    if tc.ctx.lang_opts.enable_objc_attr_requires_foundation
        && source.kind == SourceFileKind::Main
        && start_elem == 0
        && !imports_foundation
    {
        if let Some(attr) = source.first_objc_attr.clone() {
            tc.diagnose(
                MK_ERROR!(
                    ErrorImpl::ObjcDeclUsedWithoutRequiredModule {
                        attr: String::from("objc"),
                        module: String::from(FOUNDATION_MODULE),
                    },
                    attr.start.clone()
                )
                .highlight(attr),
            );
        }
    }

    verify_file(tc.ctx, file, start_elem)?;

    info!(
        file = %file_name,
        functions = stats.functions_checked,
        iterations = stats.iterations,
        "type checking finished"
    );
    Ok(TypeCheckOutcome {
        has_top_level_code,
        stats,
    })
}

impl<'a> TypeChecker<'a> {
    /// Binds the extensions of every module visible from `module` and
    /// eagerly validates types that may conform to a known protocol.
    ///
    /// Returns whether Foundation is among the visible modules.
    fn bind_visible_extensions(
        &mut self,
        collab: &mut dyn SemanticCollaborator,
        module: ModuleId,
    ) -> Result<bool, Error> {
        let mut imports_foundation = false;
        for visible in self.visible_modules(module) {
            if self.ctx.module(visible).name == FOUNDATION_MODULE {
                imports_foundation = true;
            }

            let decls: Vec<DeclId> = self
                .ctx
                .module(visible)
                .files
                .iter()
                .flat_map(|f| self.ctx.file(*f).decls.iter().copied())
                .collect();

            for decl in decls {
                match self.ctx[decl].kind {
                    DeclKind::Extension(_) => {
                        self.bind_extension_decl(collab, decl)?;
                        if !may_conform_to_known_protocol(&self.ctx[decl]) {
                            continue;
                        }
                        let nominal = self.ctx[decl]
                            .as_extension()
                            .and_then(|e| e.extended_type.as_ref())
                            .and_then(|ty| ty.any_nominal());
                        if let Some(nominal) = nominal {
                            self.validate_decl(collab, nominal)?;
                        }
                    }
                    DeclKind::Nominal(_) => {
                        if may_conform_to_known_protocol(&self.ctx[decl]) {
                            self.validate_decl(collab, decl)?;
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(imports_foundation)
    }
}

/// Checks declarations introduced by module loading after `file` was
/// already type checked.
pub fn type_check_external_definitions(
    ctx: &mut AstContext,
    diags: &mut DiagnosticEngine,
    collab: &mut dyn SemanticCollaborator,
    file: SourceFileId,
) -> Result<WorklistStats, Error> {
    if ctx.file(file).stage != AstStage::TypeChecked {
        return Err(MK_ERROR!(
            ErrorImpl::FileNotTypeChecked {
                file: ctx.file(file).name.to_string()
            },
            crate::Position::null()
        ));
    }

    let mut tc = TypeChecker::new(ctx, diags);
    tc.type_check_functions_and_external_decls(collab)
}

/// Every declaration in `file` from `start_elem` on must have reached a
/// terminal state.
pub fn verify_file(ctx: &AstContext, file: SourceFileId, start_elem: usize) -> Result<(), Error> {
    let mut decls = vec![];
    for decl in ctx.file(file).decls.iter().skip(start_elem) {
        ctx.collect_subtree(*decl, &mut decls);
    }

    match decls.into_iter().find(|d| !ctx[*d].state.is_terminal()) {
        Some(decl) => Err(MK_ERROR!(
            ErrorImpl::UncheckedDeclaration {
                decl: ctx[decl].name.clone(),
                state: ctx[decl].state.to_string(),
            },
            ctx[decl].span.start.clone()
        )),
        None => Ok(()),
    }
}

/// Resolves a single written type outside of any declaration check.
///
/// With `produce_diagnostics` unset, diagnostics are swallowed. A type that
/// fails to resolve comes back as the error type.
pub fn perform_type_loc_checking(
    ctx: &mut AstContext,
    diags: &mut DiagnosticEngine,
    collab: &mut dyn SemanticCollaborator,
    loc: &mut TypeLoc,
    dc: DeclContext,
    is_sil_type: bool,
    produce_diagnostics: bool,
) -> Result<Type, Error> {
    let options = TypeResolutionOptions {
        sil_type: is_sil_type,
        ..Default::default()
    };

    let mut swallowed = DiagnosticEngine::suppressed();
    let sink = if produce_diagnostics { diags } else { &mut swallowed };
    let mut tc = TypeChecker::new(ctx, sink);

    let ty = match collab.validate_type(&mut tc, loc, dc, options) {
        Ok(ty) => ty,
        Err(error) if error.is_internal() => return Err(error),
        Err(error) => {
            tc.diagnose(error);
            Type::Error
        }
    };
    loc.ty = Some(ty.clone());
    Ok(ty)
}

/// First-pass checks one declaration for code completion, swallowing all
/// diagnostics.
pub fn type_check_completion_decl(
    ctx: &mut AstContext,
    collab: &mut dyn SemanticCollaborator,
    decl: DeclId,
) -> Result<(), Error> {
    let mut swallowed = DiagnosticEngine::suppressed();
    let mut tc = TypeChecker::new(ctx, &mut swallowed);
    tc.type_check_decl(collab, decl, true)
}

pub fn type_check_top_level_code_decl(
    ctx: &mut AstContext,
    collab: &mut dyn SemanticCollaborator,
    decl: DeclId,
) -> Result<(), Error> {
    let mut swallowed = DiagnosticEngine::suppressed();
    let mut tc = TypeChecker::new(ctx, &mut swallowed);
    tc.type_check_top_level_code(collab, decl)
}

/// Type checks every file of `module`, then seals what can be sealed.
pub fn check_module(
    ctx: &mut AstContext,
    diags: &mut DiagnosticEngine,
    collab: &mut dyn SemanticCollaborator,
    module: ModuleId,
    options: SealingOptions,
) -> Result<Vec<DeclId>, Error> {
    let files = ctx.module(module).files.clone();
    for file in &files {
        perform_type_checking(ctx, diags, collab, *file, 0)?;
    }

    let primary = files.first().copied();
    Ok(perform_whole_module_checks(ctx, module, primary, options))
}
