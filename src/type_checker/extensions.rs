use tracing::debug;

use crate::{
    ast::{
        ast::{DeclId, GenericParamListId},
        declarations::DeclKind,
        types::{ComponentBinding, ComponentIdentTypeRepr, Type, TypeLoc, TypeRepr, TypeResolutionOptions},
    },
    errors::errors::{Error, ErrorImpl},
    MK_ERROR,
};

use super::{collaborator::SemanticCollaborator, type_checker::TypeChecker};

impl<'a> TypeChecker<'a> {
    /// Resolves the nominal type an extension extends.
    ///
    /// Does nothing if the extension is already bound. On failure the
    /// extension is invalid and extends the error type; it is never left
    /// unbound.
    pub fn bind_extension_decl(&mut self, collab: &mut dyn SemanticCollaborator, ext: DeclId) -> Result<(), Error> {
        let Some(extension) = self.ctx[ext].as_extension() else {
            return Ok(());
        };
        if extension.extended_type.is_some() {
            return Ok(());
        }
        let refs = extension.ref_components.clone();

        let mut components = vec![];
        for (i, component) in refs.iter().enumerate() {
            if i > 0 && component.name == "Type" {
                self.diagnose(MK_ERROR!(ErrorImpl::ExtensionMetatype, component.span.start.clone()));
                self.invalidate_extension(ext);
                return Ok(());
            }
            components.push(ComponentIdentTypeRepr::simple(&component.name, component.span.clone()));
        }

        let mut loc = TypeLoc::from_repr(TypeRepr::Ident(components));
        let options = TypeResolutionOptions {
            allow_unbound_generics: true,
            ..Default::default()
        };
        let context = self.ctx[ext].context;
        let extended = match collab.validate_type(self, &mut loc, context, options) {
            Ok(ty) => ty,
            Err(error) if error.is_internal() => return Err(error),
            Err(error) => {
                self.diagnose(error);
                self.invalidate_extension(ext);
                return Ok(());
            }
        };
        if extended.is_error() {
            self.invalidate_extension(ext);
            return Ok(());
        }

        let mut outer: Option<GenericParamListId> = None;
        for (i, component) in refs.iter().enumerate() {
            let type_decl = match loc.components().get(i).and_then(|c| c.binding.as_ref()) {
                Some(ComponentBinding::Type(Type::Nominal(decl) | Type::UnboundGeneric(decl))) => Some(*decl),
                Some(ComponentBinding::Decl(decl)) if self.ctx[*decl].as_nominal().is_some() => Some(*decl),
                _ => None,
            };

            let Some(type_decl) = type_decl else {
                if component.generic_params.is_some() {
                    self.diagnose(MK_ERROR!(
                        ErrorImpl::ExtensionGenericParamsForNonGeneric {
                            name: component.name.clone()
                        },
                        component.span.start.clone()
                    ));
                    self.clear_component_generic_params(ext, i);
                }
                continue;
            };

            let declared = self.ctx.generic_arity(type_decl);
            let written = component.generic_params;
            match (declared, written) {
                (_, None) => continue,
                (None, Some(params)) => {
                    let type_ = self.ctx.type_name(&self.declared_type(type_decl));
                    let params_span = self.ctx.generic_param_list(params).span.clone();
                    self.diagnose(
                        MK_ERROR!(
                            ErrorImpl::ExtensionGenericParamsForNonGenericType { type_: type_.clone() },
                            component.span.start.clone()
                        )
                        .highlight(params_span),
                    );
                    self.diagnose(MK_ERROR!(
                        ErrorImpl::ExtendedTypeHere { type_ },
                        self.ctx[type_decl].span.start.clone()
                    ));
                    self.clear_component_generic_params(ext, i);
                }
                (Some(expected), Some(params)) => {
                    let have = self.ctx.generic_param_list(params).len();
                    if have != expected {
                        let type_ = self.ctx.type_name(&self.declared_type(type_decl));
                        let params_span = self.ctx.generic_param_list(params).span.clone();
                        self.diagnose(
                            MK_ERROR!(
                                ErrorImpl::ExtensionGenericWrongNumberOfParameters {
                                    type_,
                                    too_many: have > expected,
                                    have,
                                    expected,
                                },
                                component.span.start.clone()
                            )
                            .highlight(params_span),
                        );
                        self.invalidate_extension(ext);
                        return Ok(());
                    }

                    self.ctx.generic_param_list_mut(params).outer = outer;
                    outer = Some(params);
                }
            }
        }

        if !extended.is_extensible() {
            let type_ = self.ctx.type_name(&extended);
            self.diagnose(MK_ERROR!(
                ErrorImpl::NonNominalExtension { type_ },
                self.ctx[ext].span.start.clone()
            ));
            self.invalidate_extension(ext);
            return Ok(());
        }

        let nominal = extended.any_nominal();
        if let DeclKind::Extension(extension) = &mut self.ctx[ext].kind {
            extension.extended_type = Some(extended);
        }
        if let Some(nominal) = nominal {
            if let DeclKind::Nominal(target) = &mut self.ctx[nominal].kind {
                target.extensions.push(ext);
            }
            debug!(extension = %self.ctx[ext].name, target = %self.ctx[nominal].name, "extension bound");
        }
        Ok(())
    }

    fn invalidate_extension(&mut self, ext: DeclId) {
        if let DeclKind::Extension(extension) = &mut self.ctx[ext].kind {
            extension.extended_type = Some(Type::Error);
        }
        self.mark_invalid(ext);
        debug!(extension = %self.ctx[ext].name, "extension invalid");
    }

    fn clear_component_generic_params(&mut self, ext: DeclId, index: usize) {
        if let DeclKind::Extension(extension) = &mut self.ctx[ext].kind {
            if let Some(component) = extension.ref_components.get_mut(index) {
                component.generic_params = None;
            }
        }
    }
}
