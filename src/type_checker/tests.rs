//! Unit tests for the pure parts of the type checker: the known-protocol
//! gate, the literal table and sealing.

use std::rc::Rc;

use crate::ast::ast::{AstContext, DeclContext, DeclId, SourceFileId, SourceFileKind};
use crate::ast::declarations::{
    Accessibility, AccessorKind, AttrOrigin, Body, DeclKind, FuncKind, NominalKind,
};
use crate::ast::expressions::{Expr, ExprKind, LiteralExpr, MagicIdentifierKind};
use crate::ast::known_protocols::KnownProtocolKind;
use crate::ast::types::{ComponentIdentTypeRepr, TypeLoc, TypeRepr};
use crate::type_checker::conformance::may_conform_to_known_protocol;
use crate::type_checker::literals::literal_protocol_kind;
use crate::type_checker::sealing::{perform_whole_module_checks, SealingOptions};
use crate::Span;

fn span(start: u32) -> Span {
    Span::new(&Rc::new("test.lang".to_string()), start, start + 1)
}

fn literal(literal: LiteralExpr) -> Expr {
    Expr::literal(literal, span(0))
}

fn setup() -> (AstContext, SourceFileId) {
    let mut ctx = AstContext::new();
    let module = ctx.add_module("main");
    let file = ctx.add_source_file(module, "main.lang", SourceFileKind::Library);
    (ctx, file)
}

fn inherit(ctx: &mut AstContext, decl: DeclId, repr: TypeRepr) {
    match &mut ctx[decl].kind {
        DeclKind::Nominal(nominal) => nominal.inherited.push(TypeLoc::from_repr(repr)),
        DeclKind::Extension(extension) => extension.inherited.push(TypeLoc::from_repr(repr)),
        _ => panic!("Declaration has no inheritance clause"),
    }
}

#[test]
fn test_gate_matches_known_protocol() {
    let (mut ctx, file) = setup();
    let point = ctx.add_top_level_decl(file, "Point", span(0), DeclKind::nominal(NominalKind::Struct));
    inherit(&mut ctx, point, TypeRepr::ident(&["Drawable"], span(10)));
    assert!(!may_conform_to_known_protocol(&ctx[point]));

    inherit(&mut ctx, point, TypeRepr::ident(&["Swift", "Hashable"], span(20)));
    assert!(may_conform_to_known_protocol(&ctx[point]));
}

#[test]
fn test_gate_is_exact_and_syntactic() {
    let (mut ctx, file) = setup();
    let point = ctx.add_top_level_decl(file, "Point", span(0), DeclKind::nominal(NominalKind::Struct));
    inherit(&mut ctx, point, TypeRepr::ident(&["equatable"], span(10)));
    inherit(&mut ctx, point, TypeRepr::Other(span(20)));

    let mut generic = ComponentIdentTypeRepr::simple("Sequence", span(30));
    generic.generic_args.push(TypeRepr::ident(&["Int"], span(31)));
    inherit(&mut ctx, point, TypeRepr::Ident(vec![generic]));

    assert!(!may_conform_to_known_protocol(&ctx[point]));

    let no_clause = ctx.add_top_level_decl(file, "Empty", span(40), DeclKind::nominal(NominalKind::Enum));
    assert!(!may_conform_to_known_protocol(&ctx[no_clause]));
}

#[test]
fn test_literal_table() {
    let cases = vec![
        (LiteralExpr::Nil, KnownProtocolKind::NilLiteralConstructible),
        (LiteralExpr::Integer("42".to_string()), KnownProtocolKind::IntegerLiteralConstructible),
        (LiteralExpr::Float("4.2".to_string()), KnownProtocolKind::FloatLiteralConstructible),
        (LiteralExpr::Boolean(true), KnownProtocolKind::BooleanLiteralConstructible),
        (LiteralExpr::Character('c'), KnownProtocolKind::CharacterLiteralConstructible),
        (
            LiteralExpr::String("hello".to_string()),
            KnownProtocolKind::StringLiteralConstructible,
        ),
        (
            LiteralExpr::String("x".to_string()),
            KnownProtocolKind::ExtendedGraphemeClusterLiteralConstructible,
        ),
        (
            LiteralExpr::String("\u{1F1FA}\u{1F1F8}".to_string()),
            KnownProtocolKind::ExtendedGraphemeClusterLiteralConstructible,
        ),
        (
            LiteralExpr::String("\u{915}\u{94D}".to_string()),
            KnownProtocolKind::ExtendedGraphemeClusterLiteralConstructible,
        ),
        (
            LiteralExpr::InterpolatedString(vec![]),
            KnownProtocolKind::StringInterpolationConstructible,
        ),
        (LiteralExpr::Array(vec![]), KnownProtocolKind::ArrayLiteralConstructible),
        (LiteralExpr::Dictionary(vec![]), KnownProtocolKind::DictionaryLiteralConstructible),
        (
            LiteralExpr::MagicIdentifier(MagicIdentifierKind::File),
            KnownProtocolKind::StringLiteralConstructible,
        ),
        (
            LiteralExpr::MagicIdentifier(MagicIdentifierKind::Function),
            KnownProtocolKind::StringLiteralConstructible,
        ),
        (
            LiteralExpr::MagicIdentifier(MagicIdentifierKind::Line),
            KnownProtocolKind::IntegerLiteralConstructible,
        ),
        (
            LiteralExpr::MagicIdentifier(MagicIdentifierKind::Column),
            KnownProtocolKind::IntegerLiteralConstructible,
        ),
    ];

    for (lit, expected) in cases {
        let expr = literal(lit);
        assert_eq!(literal_protocol_kind(&expr), Some(expected), "Wrong protocol for {:?}", expr);
    }
}

#[test]
fn test_non_literal_has_no_protocol() {
    let (mut ctx, file) = setup();
    let x = ctx.add_top_level_decl(file, "x", span(0), DeclKind::var());

    let reference = Expr {
        kind: ExprKind::DeclRef(x),
        span: span(3),
    };
    let other = Expr {
        kind: ExprKind::Other,
        span: span(5),
    };
    assert_eq!(literal_protocol_kind(&reference), None);
    assert_eq!(literal_protocol_kind(&other), None);
}

/// A class with a stored property, its getter and setter, a method and an
/// initializer, all with the given accessibility.
struct Shape {
    class: DeclId,
    radius: DeclId,
    getter: DeclId,
    setter: DeclId,
    area: DeclId,
    init: DeclId,
}

fn make_shape(ctx: &mut AstContext, file: SourceFileId, access: Accessibility) -> Shape {
    let class = ctx.add_top_level_decl(file, "Shape", span(0), DeclKind::nominal(NominalKind::Class));
    let radius = ctx.add_member(class, "radius", span(10), DeclKind::var());
    let getter = ctx.add_member(
        class,
        "get",
        span(20),
        DeclKind::func(
            FuncKind::Accessor {
                kind: AccessorKind::Getter,
                storage: radius,
            },
            Some(Body::default()),
        ),
    );
    let setter = ctx.add_member(
        class,
        "set",
        span(30),
        DeclKind::func(
            FuncKind::Accessor {
                kind: AccessorKind::Setter,
                storage: radius,
            },
            Some(Body::default()),
        ),
    );
    let area = ctx.add_member(class, "area", span(40), DeclKind::function(Body::default()));
    let init = ctx.add_member(class, "init", span(50), DeclKind::func(FuncKind::Constructor, Some(Body::default())));

    for decl in [class, radius, getter, setter, area, init] {
        ctx[decl].access = Some(access);
    }
    Shape {
        class,
        radius,
        getter,
        setter,
        area,
        init,
    }
}

fn options(whole_module: bool, apply_sealing: bool) -> SealingOptions {
    SealingOptions {
        whole_module,
        apply_sealing,
    }
}

#[test]
fn test_public_members_never_sealed() {
    for whole_module in [false, true] {
        let (mut ctx, file) = setup();
        let module = ctx.file(file).module;
        let shape = make_shape(&mut ctx, file, Accessibility::Public);

        let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(whole_module, true));
        assert!(sealed.is_empty());
        assert!(!ctx[shape.area].is_final());
        assert!(!ctx[shape.radius].is_final());
    }
}

#[test]
fn test_internal_members_sealed_only_in_whole_module_mode() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let shape = make_shape(&mut ctx, file, Accessibility::Internal);

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(false, false));
    assert!(sealed.is_empty());
    assert!(!ctx[shape.area].is_final());

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(true, false));
    assert_eq!(sealed, vec![shape.radius, shape.getter, shape.setter, shape.area]);
    assert_eq!(ctx[shape.area].attrs.final_attr, Some(AttrOrigin::Implicit));
    assert!(!ctx[shape.class].is_final(), "Classes are never sealed");
    assert!(!ctx[shape.init].is_final(), "Initializers are never sealed");
}

#[test]
fn test_private_members_sealed_in_primary_file() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let shape = make_shape(&mut ctx, file, Accessibility::Private);

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(false, false));
    assert!(sealed.contains(&shape.area));

    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let shape = make_shape(&mut ctx, file, Accessibility::Private);
    let sealed = perform_whole_module_checks(&mut ctx, module, None, options(false, false));
    assert!(sealed.is_empty(), "Files other than the primary one are not walked");
    assert!(!ctx[shape.area].is_final());
}

#[test]
fn test_setter_not_sealed_while_storage_unsealed() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let shape = make_shape(&mut ctx, file, Accessibility::Internal);
    ctx[shape.radius].is_overridden = true;

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(true, true));
    assert!(!ctx[shape.radius].is_final());
    assert!(!ctx[shape.setter].is_final());
    assert!(ctx[shape.getter].is_final());
    assert!(!sealed.contains(&shape.setter));
}

#[test]
fn test_setter_before_its_storage_is_sealed() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let class = ctx.add_top_level_decl(file, "Counter", span(0), DeclKind::nominal(NominalKind::Class));
    let count = ctx.add_decl(
        "count",
        span(20),
        DeclContext::Decl(class),
        DeclKind::var(),
    );
    let setter = ctx.add_member(
        class,
        "set",
        span(10),
        DeclKind::func(
            FuncKind::Accessor {
                kind: AccessorKind::Setter,
                storage: count,
            },
            Some(Body::default()),
        ),
    );
    if let DeclKind::Nominal(nominal) = &mut ctx[class].kind {
        nominal.members.push(count);
    }
    for decl in [class, count, setter] {
        ctx[decl].access = Some(Accessibility::Internal);
    }

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(true, true));
    assert_eq!(sealed, vec![count, setter]);
    assert!(ctx[setter].is_final());
}

#[test]
fn test_setter_before_overridden_storage_not_sealed() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let class = ctx.add_top_level_decl(file, "Counter", span(0), DeclKind::nominal(NominalKind::Class));
    let count = ctx.add_decl(
        "count",
        span(20),
        DeclContext::Decl(class),
        DeclKind::var(),
    );
    let setter = ctx.add_member(
        class,
        "set",
        span(10),
        DeclKind::func(
            FuncKind::Accessor {
                kind: AccessorKind::Setter,
                storage: count,
            },
            Some(Body::default()),
        ),
    );
    if let DeclKind::Nominal(nominal) = &mut ctx[class].kind {
        nominal.members.push(count);
    }
    for decl in [class, count, setter] {
        ctx[decl].access = Some(Accessibility::Internal);
    }
    ctx[count].is_overridden = true;

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(true, true));
    assert!(sealed.is_empty());
    assert!(!ctx[setter].is_final());
}

#[test]
fn test_pattern_bound_storage_in_class_sealed() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let class = ctx.add_top_level_decl(file, "Frame", span(0), DeclKind::nominal(NominalKind::Class));
    let binding = ctx.add_member(class, "origin", span(5), DeclKind::pattern_binding());
    let x = ctx.add_member(binding, "x", span(6), DeclKind::var());
    let y = ctx.add_member(class, "y", span(10), DeclKind::var());
    for decl in [class, x, y] {
        ctx[decl].access = Some(Accessibility::Internal);
    }

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(true, false));
    assert_eq!(sealed, vec![x, y]);
    assert_eq!(ctx[x].attrs.final_attr, Some(AttrOrigin::Implicit));

    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let point = ctx.add_top_level_decl(file, "Point", span(0), DeclKind::nominal(NominalKind::Struct));
    let binding = ctx.add_member(point, "coords", span(5), DeclKind::pattern_binding());
    let x = ctx.add_member(binding, "x", span(6), DeclKind::var());
    for decl in [point, x] {
        ctx[decl].access = Some(Accessibility::Internal);
    }
    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(true, false));
    assert!(sealed.is_empty(), "Storage of a struct is never sealed");
}

#[test]
fn test_overridden_and_invalid_members_not_sealed() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let shape = make_shape(&mut ctx, file, Accessibility::Internal);
    ctx[shape.area].is_overridden = true;
    ctx[shape.getter].state = crate::ast::declarations::ValidationState::Invalid;

    perform_whole_module_checks(&mut ctx, module, Some(file), options(true, true));
    assert!(!ctx[shape.area].is_final());
    assert!(!ctx[shape.getter].is_final());
    assert!(ctx[shape.radius].is_final());
}

#[test]
fn test_members_outside_classes_not_sealed() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let point = ctx.add_top_level_decl(file, "Point", span(0), DeclKind::nominal(NominalKind::Struct));
    let norm = ctx.add_member(point, "norm", span(5), DeclKind::function(Body::default()));
    let free = ctx.add_top_level_decl(file, "helper", span(20), DeclKind::function(Body::default()));
    for decl in [point, norm, free] {
        ctx[decl].access = Some(Accessibility::Private);
    }

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(true, true));
    assert!(sealed.is_empty());
}

#[test]
fn test_missing_accessibility_skips_subtree() {
    let (mut ctx, file) = setup();
    let module = ctx.file(file).module;
    let shape = make_shape(&mut ctx, file, Accessibility::Internal);
    ctx[shape.class].access = None;

    let sealed = perform_whole_module_checks(&mut ctx, module, Some(file), options(true, true));
    assert!(sealed.is_empty());
}

#[test]
fn test_inferred_dynamic_cleared_only_when_applying() {
    for apply_sealing in [false, true] {
        let (mut ctx, file) = setup();
        let module = ctx.file(file).module;
        let shape = make_shape(&mut ctx, file, Accessibility::Internal);
        ctx[shape.area].attrs.dynamic = Some(AttrOrigin::Implicit);

        perform_whole_module_checks(&mut ctx, module, Some(file), options(true, apply_sealing));
        assert!(ctx[shape.area].is_final());
        if apply_sealing {
            assert_eq!(ctx[shape.area].attrs.dynamic, None);
        } else {
            assert_eq!(ctx[shape.area].attrs.dynamic, Some(AttrOrigin::Implicit));
        }
    }
}

#[test]
fn test_explicit_dynamic_blocks_sealing() {
    for apply_sealing in [false, true] {
        let (mut ctx, file) = setup();
        let module = ctx.file(file).module;
        let base = make_shape(&mut ctx, file, Accessibility::Internal);
        let derived = make_shape(&mut ctx, file, Accessibility::Internal);

        ctx[base.area].attrs.dynamic = Some(AttrOrigin::Explicit);
        ctx[base.area].is_overridden = true;
        ctx[derived.area].attrs.dynamic = Some(AttrOrigin::Implicit);
        ctx[derived.area].overridden_decl = Some(base.area);

        ctx[derived.radius].attrs.dynamic = Some(AttrOrigin::Explicit);
        ctx[derived.getter].attrs.dynamic = Some(AttrOrigin::Implicit);

        perform_whole_module_checks(&mut ctx, module, Some(file), options(true, apply_sealing));
        assert!(!ctx[derived.area].is_final(), "Overrides an explicitly dynamic method");
        assert_eq!(ctx[derived.area].attrs.dynamic, Some(AttrOrigin::Implicit));
        assert!(!ctx[derived.radius].is_final());
        assert!(!ctx[derived.getter].is_final(), "Storage is explicitly dynamic");
        assert!(ctx[base.getter].is_final());
    }
}
