use std::{
    collections::HashMap,
    ops::{Index, IndexMut},
    rc::Rc,
};

use crate::Span;

use super::{
    declarations::{Decl, DeclKind, NominalKind, ValidationState},
    known_protocols::KnownProtocolKind,
    types::{GenericParamList, Type},
};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            fn from_index(index: usize) -> Self {
                $name(index as u32)
            }
        }
    };
}

define_id!(
    /// Index of a declaration in its `AstContext`.
    DeclId
);
define_id!(ModuleId);
define_id!(SourceFileId);
define_id!(GenericParamListId);

/// The lexical parent of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclContext {
    File(SourceFileId),
    Decl(DeclId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFileKind {
    Main,
    Library,
    Repl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AstStage {
    Parsed,
    NameBound,
    TypeChecked,
}

#[derive(Debug)]
pub struct SourceFile {
    pub name: Rc<String>,
    pub module: ModuleId,
    pub kind: SourceFileKind,
    pub stage: AstStage,
    pub decls: Vec<DeclId>,
    /// Location of the first `@objc` attribute written in this file.
    pub first_objc_attr: Option<Span>,
}

#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub files: Vec<SourceFileId>,
    pub imports: Vec<ModuleId>,
}

#[derive(Debug, Clone, Default)]
pub struct LangOptions {
    pub enable_objc_attr_requires_foundation: bool,
}

/// Per-compilation storage for everything the checker reads and annotates.
///
/// Declarations, generic parameter lists, modules and files live in
/// append-only vectors and are addressed through typed ids.
#[derive(Debug, Default)]
pub struct AstContext {
    decls: Vec<Decl>,
    generic_params: Vec<GenericParamList>,
    modules: Vec<Module>,
    files: Vec<SourceFile>,
    known_protocols: HashMap<KnownProtocolKind, DeclId>,
    /// Declarations introduced by module loading that still need checking.
    pub external_definitions: Vec<DeclId>,
    /// How far previous checker runs got through `external_definitions`.
    pub last_checked_external_definition: usize,
    pub stdlib_module: Option<ModuleId>,
    pub lang_opts: LangOptions,
}

impl AstContext {
    pub fn new() -> Self {
        AstContext::default()
    }

    pub fn add_module(&mut self, name: &str) -> ModuleId {
        self.modules.push(Module {
            name: name.to_string(),
            files: vec![],
            imports: vec![],
        });
        ModuleId::from_index(self.modules.len() - 1)
    }

    pub fn add_import(&mut self, module: ModuleId, imported: ModuleId) {
        self.modules[module.index()].imports.push(imported);
    }

    pub fn add_source_file(&mut self, module: ModuleId, name: &str, kind: SourceFileKind) -> SourceFileId {
        self.files.push(SourceFile {
            name: Rc::new(name.to_string()),
            module,
            kind,
            stage: AstStage::Parsed,
            decls: vec![],
            first_objc_attr: None,
        });
        let id = SourceFileId::from_index(self.files.len() - 1);
        self.modules[module.index()].files.push(id);
        id
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter().enumerate().map(|(i, m)| (ModuleId::from_index(i), m))
    }

    pub fn file(&self, id: SourceFileId) -> &SourceFile {
        &self.files[id.index()]
    }

    pub fn file_mut(&mut self, id: SourceFileId) -> &mut SourceFile {
        &mut self.files[id.index()]
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn decl_ids(&self) -> impl Iterator<Item = DeclId> {
        (0..self.decls.len()).map(DeclId::from_index)
    }

    /// Adds a declaration without linking it into any parent.
    pub fn add_decl(&mut self, name: &str, span: Span, context: DeclContext, kind: DeclKind) -> DeclId {
        self.decls.push(Decl::new(name, span, context, kind));
        DeclId::from_index(self.decls.len() - 1)
    }

    pub fn add_top_level_decl(&mut self, file: SourceFileId, name: &str, span: Span, kind: DeclKind) -> DeclId {
        let id = self.add_decl(name, span, DeclContext::File(file), kind);
        self.files[file.index()].decls.push(id);
        id
    }

    /// Adds a member to a nominal type or extension, or a variable to a
    /// binding pattern.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a nominal type, extension or binding pattern.
    pub fn add_member(&mut self, parent: DeclId, name: &str, span: Span, kind: DeclKind) -> DeclId {
        let id = self.add_decl(name, span, DeclContext::Decl(parent), kind);
        match &mut self.decls[parent.index()].kind {
            DeclKind::Nominal(nominal) => nominal.members.push(id),
            DeclKind::Extension(extension) => extension.members.push(id),
            DeclKind::PatternBinding(binding) => binding.vars.push(id),
            other => panic!("Attempted to add member to {:?}", other.descriptive_kind()),
        }
        id
    }

    /// Adds a declaration local to a function or top-level code body.
    ///
    /// # Panics
    ///
    /// Panics if `parent` has no body.
    pub fn add_local_decl(&mut self, parent: DeclId, name: &str, span: Span, kind: DeclKind) -> DeclId {
        let id = self.add_decl(name, span, DeclContext::Decl(parent), kind);
        match self.decls[parent.index()].body_mut() {
            Some(body) => body.decls.push(id),
            None => panic!("Attempted to add local declaration to a declaration without a body"),
        }
        id
    }

    pub fn add_generic_params(&mut self, list: GenericParamList) -> GenericParamListId {
        self.generic_params.push(list);
        GenericParamListId::from_index(self.generic_params.len() - 1)
    }

    pub fn add_external_definition(&mut self, decl: DeclId) {
        self.external_definitions.push(decl);
    }

    pub fn record_known_protocol(&mut self, kind: KnownProtocolKind, decl: DeclId) {
        self.known_protocols.entry(kind).or_insert(decl);
    }

    pub fn known_protocol(&self, kind: KnownProtocolKind) -> Option<DeclId> {
        self.known_protocols.get(&kind).copied()
    }

    pub fn parent_module(&self, context: DeclContext) -> ModuleId {
        match context {
            DeclContext::File(file) => self.files[file.index()].module,
            DeclContext::Decl(decl) => self.parent_module(self[decl].context),
        }
    }

    pub fn parent_file(&self, context: DeclContext) -> SourceFileId {
        match context {
            DeclContext::File(file) => file,
            DeclContext::Decl(decl) => self.parent_file(self[decl].context),
        }
    }

    /// Whether `decl` sits lexically somewhere inside `ancestor`.
    pub fn is_declared_within(&self, decl: DeclId, ancestor: DeclId) -> bool {
        let mut context = self[decl].context;
        while let DeclContext::Decl(parent) = context {
            if parent == ancestor {
                return true;
            }
            context = self[parent].context;
        }
        false
    }

    /// The nominal type a context declares members of, looking through
    /// bound extensions and binding patterns.
    pub fn nominal_in_context(&self, context: DeclContext) -> Option<DeclId> {
        let DeclContext::Decl(decl) = context else {
            return None;
        };
        match &self[decl].kind {
            DeclKind::Nominal(_) => Some(decl),
            DeclKind::Extension(extension) => extension.extended_type.as_ref().and_then(|ty| ty.any_nominal()),
            DeclKind::PatternBinding(_) => self.nominal_in_context(self[decl].context),
            _ => None,
        }
    }

    pub fn is_class(&self, decl: DeclId) -> bool {
        matches!(&self[decl].kind, DeclKind::Nominal(nominal) if nominal.kind == NominalKind::Class)
    }

    pub fn generic_param_list(&self, id: GenericParamListId) -> &GenericParamList {
        &self.generic_params[id.index()]
    }

    pub fn generic_param_list_mut(&mut self, id: GenericParamListId) -> &mut GenericParamList {
        &mut self.generic_params[id.index()]
    }

    /// Number of generic parameters a nominal declares, if it is generic.
    pub fn generic_arity(&self, decl: DeclId) -> Option<usize> {
        match &self[decl].kind {
            DeclKind::Nominal(nominal) => nominal.generic_params.map(|list| self.generic_param_list(list).params.len()),
            _ => None,
        }
    }

    /// Every declaration reachable from `decl` through members, binding
    /// patterns and bodies, `decl` included.
    pub fn collect_subtree(&self, decl: DeclId, out: &mut Vec<DeclId>) {
        out.push(decl);
        for child in self[decl].children() {
            self.collect_subtree(child, out);
        }
    }

    pub fn states_of(&self, decls: &[DeclId]) -> Vec<ValidationState> {
        decls.iter().map(|d| self[*d].state).collect()
    }

    /// Renders a type for diagnostics.
    pub fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Error => String::from("<<error type>>"),
            Type::Nominal(decl) | Type::UnboundGeneric(decl) => self[*decl].name.clone(),
            Type::BoundGeneric { decl, args } => format!(
                "{}<{}>",
                self[*decl].name,
                args.iter().map(|a| self.type_name(a)).collect::<Vec<_>>().join(", ")
            ),
            Type::Builtin(name) => name.clone(),
            Type::Function { params, result } => format!(
                "({}) -> {}",
                params.iter().map(|p| self.type_name(p)).collect::<Vec<_>>().join(", "),
                self.type_name(result)
            ),
            Type::Metatype(inner) => format!("{}.Type", self.type_name(inner)),
        }
    }
}

impl Index<DeclId> for AstContext {
    type Output = Decl;

    fn index(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }
}

impl IndexMut<DeclId> for AstContext {
    fn index_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }
}
