use super::*;
use cextract_ir::{ConstantValue, NativeLayout, Primitive, ScopedKind};

/// Utility to easily build up a translation unit with the given members.
struct UnitBuilder {
    unit: Unit,
    members: Vec<DeclId>,
}

impl UnitBuilder {
    fn new() -> UnitBuilder {
        UnitBuilder {
            unit: Unit::new(),
            members: Vec::new(),
        }
    }

    /// Adds a declaration to the arena without listing it as a unit member
    /// (parameters, anonymous aggregates).
    fn hidden(&mut self, decl: Decl) -> DeclId {
        self.unit.add(decl)
    }

    /// Adds a top-level member of the translation unit.
    fn member(&mut self, decl: Decl) -> DeclId {
        let id = self.unit.add(decl);
        self.members.push(id);
        id
    }

    fn build(self) -> (Unit, DeclId) {
        let UnitBuilder { mut unit, members } = self;
        let root = unit.add(Decl::scoped(ScopedKind::TranslationUnit, "", members));
        (unit, root)
    }
}

fn scan(unit: &Unit, root: DeclId) -> (SkipSet, Vec<String>) {
    let mut diags = Vec::new();
    let skips = UnsupportedFilter::new(unit, &NativeLayout, &mut diags).scan(root);
    (skips, diags)
}

fn int() -> Type {
    Type::Primitive(Primitive::Int)
}

fn void() -> Type {
    Type::Primitive(Primitive::Void)
}

#[test]
fn supported_struct_is_eligible() {
    let mut b = UnitBuilder::new();
    let x = b.hidden(Decl::variable("x", int()));
    b.member(Decl::scoped(ScopedKind::Struct, "s", vec![x]));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert!(skips.is_empty());
    assert!(diags.is_empty());
}

#[test]
fn bitfield_member_skipped_struct_kept() {
    let mut b = UnitBuilder::new();
    let a = b.hidden(Decl::variable("a", int()));
    let flags = b.hidden(Decl::bitfield("flags", int()));
    let s = b.member(Decl::scoped(ScopedKind::Struct, "s", vec![a, flags]));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert!(!skips.is_skipped(s));
    assert!(!skips.is_skipped(a));
    assert_eq!(skips.reason(flags), Some(&SkipReason::Bitfield));
    assert_eq!(diags, vec!["skipping s.flags: type is bitfield"]);
}

#[test]
fn pointer_cycle_terminates_and_struct_is_eligible() {
    let mut b = UnitBuilder::new();
    let node = b.unit.reserve();
    let next = b.hidden(Decl::variable("next", Type::pointer(Type::Declared(node))));
    let value = b.hidden(Decl::variable("value", int()));
    b.unit
        .fill(node, Decl::scoped(ScopedKind::Struct, "node", vec![next, value]));
    b.members.push(node);
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert!(skips.is_empty());
    assert!(diags.is_empty());
}

#[test]
fn empty_struct_skipped_for_missing_layout() {
    let mut b = UnitBuilder::new();
    let e = b.member(Decl::scoped(ScopedKind::Struct, "e", vec![]));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert_eq!(skips.reason(e), Some(&SkipReason::MissingLayout));
    assert_eq!(diags, vec!["skipping e: does not have a valid memory layout"]);
}

#[test]
fn flexible_array_struct_skipped_but_members_still_checked() {
    let mut b = UnitBuilder::new();
    let n = b.hidden(Decl::variable("n", int()));
    let tail = b.hidden(Decl::variable("tail", Type::array(int(), None)));
    let f = b.member(Decl::scoped(ScopedKind::Struct, "f", vec![n, tail]));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert_eq!(skips.reason(f), Some(&SkipReason::MissingLayout));
    assert!(!skips.is_skipped(n));
    assert_eq!(skips.reason(tail), Some(&SkipReason::MissingLayout));
    assert_eq!(
        diags,
        vec![
            "skipping f: does not have a valid memory layout",
            "skipping f.tail: does not have a valid memory layout",
        ]
    );
}

#[test]
fn function_with_unsupported_return_type() {
    let mut b = UnitBuilder::new();
    let f = b.member(Decl::function(
        "f",
        FunctionType {
            params: vec![],
            ret: Type::Primitive(Primitive::LongDouble),
            variadic: false,
        },
        vec![],
    ));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert_eq!(
        skips.reason(f),
        Some(&SkipReason::UnsupportedType("long double".to_string()))
    );
    assert_eq!(diags, vec!["skipping f: unsupported type usage: long double"]);
}

#[test]
fn function_taking_empty_struct_by_value_has_no_descriptor() {
    let mut b = UnitBuilder::new();
    let e = b.hidden(Decl::scoped(ScopedKind::Struct, "e", vec![]));
    let p = b.hidden(Decl::variable("arg", Type::Declared(e)));
    let f = b.member(Decl::function(
        "f",
        FunctionType {
            params: vec![Type::Declared(e)],
            ret: void(),
            variadic: false,
        },
        vec![p],
    ));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert_eq!(skips.reason(f), Some(&SkipReason::MissingDescriptor));
    assert_eq!(
        diags,
        vec!["skipping f: does not have a valid function descriptor"]
    );
}

#[test]
fn variadic_callback_parameter_skips_enclosing_function() {
    let mut b = UnitBuilder::new();
    let cb_ty = Type::pointer(Type::function(vec![int()], void(), true));
    let cb = b.hidden(Decl::variable("cb", cb_ty.clone()));
    let f = b.member(Decl::function(
        "f",
        FunctionType {
            params: vec![cb_ty],
            ret: void(),
            variadic: false,
        },
        vec![cb],
    ));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert_eq!(
        skips.reason(f),
        Some(&SkipReason::VariadicCallback("void cb(int, ...)".to_string()))
    );
    assert_eq!(
        diags,
        vec!["skipping f: varargs in callbacks is not supported: void cb(int, ...)"]
    );
}

#[test]
fn fully_variadic_callback_is_allowed() {
    let mut b = UnitBuilder::new();
    let cb_ty = Type::pointer(Type::function(vec![], void(), true));
    let cb = b.hidden(Decl::variable("cb", cb_ty.clone()));
    b.member(Decl::function(
        "f",
        FunctionType {
            params: vec![cb_ty],
            ret: void(),
            variadic: false,
        },
        vec![cb],
    ));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert!(skips.is_empty());
    assert!(diags.is_empty());
}

#[test]
fn variadic_callback_in_return_type_skips_function() {
    let mut b = UnitBuilder::new();
    let ret_ty = Type::pointer(Type::function(vec![int()], void(), true));
    let f = b.member(Decl::function(
        "make_handler",
        FunctionType {
            params: vec![],
            ret: ret_ty,
            variadic: false,
        },
        vec![],
    ));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert!(matches!(
        skips.reason(f),
        Some(SkipReason::VariadicCallback(_))
    ));
    assert_eq!(diags.len(), 1);
    assert!(diags[0].starts_with("skipping make_handler: varargs in callbacks"));
}

#[test]
fn callback_without_binding_name_fails_closed() {
    let mut b = UnitBuilder::new();
    // A perfectly bindable callback, except the naming pass produced
    // nothing for the parameter.
    let cb_ty = Type::pointer(Type::function(vec![int()], void(), false));
    let mut param = Decl::variable("cb", cb_ty.clone());
    param.binding_name = None;
    let cb = b.hidden(param);
    let f = b.member(Decl::function(
        "f",
        FunctionType {
            params: vec![cb_ty],
            ret: void(),
            variadic: false,
        },
        vec![cb],
    ));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert!(matches!(
        skips.reason(f),
        Some(SkipReason::UnsupportedType(_))
    ));
    assert_eq!(diags.len(), 1);
}

#[test]
fn global_variadic_function_pointer_variable_skipped() {
    let mut b = UnitBuilder::new();
    let fp = b.member(Decl::variable(
        "handler",
        Type::pointer(Type::function(vec![int()], void(), true)),
    ));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert!(matches!(
        skips.reason(fp),
        Some(SkipReason::VariadicCallback(_))
    ));
    assert_eq!(
        diags,
        vec!["skipping handler: varargs in callbacks is not supported: void handler(int, ...)"]
    );
}

#[test]
fn variable_with_erroneous_type_skipped() {
    let mut b = UnitBuilder::new();
    let g = b.member(Decl::variable("g", Type::Erroneous("__weird_t".to_string())));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert_eq!(
        skips.reason(g),
        Some(&SkipReason::UnsupportedType("__weird_t".to_string()))
    );
    assert_eq!(diags, vec!["skipping g: unsupported type usage: __weird_t"]);
}

#[test]
fn typedef_of_variadic_function_pointer_skipped() {
    let mut b = UnitBuilder::new();
    let t = b.member(Decl::typedef(
        "handler_t",
        Type::pointer(Type::function(vec![int()], void(), true)),
    ));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert_eq!(
        skips.reason(t),
        Some(&SkipReason::VariadicCallback(
            "void handler_t(int, ...)".to_string()
        ))
    );
    assert_eq!(
        diags,
        vec!["skipping handler_t: varargs in callbacks is not supported: void handler_t(int, ...)"]
    );
}

#[test]
fn typedef_of_anonymous_struct_with_wide_integer_field() {
    let mut b = UnitBuilder::new();
    let w = b.hidden(Decl::variable("w", Type::Primitive(Primitive::Int128)));
    let anon = b.hidden(Decl::scoped(ScopedKind::Struct, "", vec![w]));
    let t = b.member(Decl::typedef("wide_t", Type::Declared(anon)));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    // The typedef is skipped, and the anonymous struct independently
    // receives its own layout check and member descent.
    assert_eq!(
        skips.reason(t),
        Some(&SkipReason::UnsupportedType("__int128".to_string()))
    );
    assert_eq!(skips.reason(anon), Some(&SkipReason::MissingLayout));
    assert_eq!(
        skips.reason(w),
        Some(&SkipReason::UnsupportedType("__int128".to_string()))
    );
    assert_eq!(
        diags,
        vec![
            "skipping wide_t: unsupported type usage: __int128",
            "skipping <anonymous>: does not have a valid memory layout",
            "skipping <anonymous>.w: unsupported type usage: __int128",
        ]
    );
}

#[test]
fn aggregate_reached_directly_and_via_typedef_validated_once() {
    let mut b = UnitBuilder::new();
    let e = b.member(Decl::scoped(ScopedKind::Struct, "e", vec![]));
    let t = b.member(Decl::typedef("empty_t", Type::Declared(e)));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert_eq!(skips.reason(e), Some(&SkipReason::MissingLayout));
    assert_eq!(skips.reason(t), Some(&SkipReason::MissingLayout));
    let struct_lines = diags.iter().filter(|d| d.starts_with("skipping e:")).count();
    assert_eq!(struct_lines, 1);
    assert_eq!(diags.len(), 2);
}

#[test]
fn enums_and_constants_are_never_skipped() {
    let mut b = UnitBuilder::new();
    let a = b.hidden(Decl::constant("RED", ConstantValue::Int(0)));
    let c = b.hidden(Decl::constant("GREEN", ConstantValue::Int(1)));
    b.member(Decl::scoped(ScopedKind::Enum, "color", vec![a, c]));
    b.member(Decl::constant("MAX_PATH", ConstantValue::Int(4096)));
    let (unit, root) = b.build();
    let (skips, diags) = scan(&unit, root);
    assert!(skips.is_empty());
    assert!(diags.is_empty());
}

#[test]
fn identical_trees_produce_identical_results() {
    fn build() -> (Unit, DeclId) {
        let mut b = UnitBuilder::new();
        let w = b.hidden(Decl::variable("w", Type::Primitive(Primitive::LongDouble)));
        let bits = b.hidden(Decl::bitfield("bits", int()));
        b.member(Decl::scoped(ScopedKind::Struct, "s", vec![w, bits]));
        b.member(Decl::function(
            "f",
            FunctionType {
                params: vec![],
                ret: Type::Primitive(Primitive::Int128),
                variadic: false,
            },
            vec![],
        ));
        b.build()
    }
    let (unit_a, root_a) = build();
    let (unit_b, root_b) = build();
    let (skips_a, diags_a) = scan(&unit_a, root_a);
    let (skips_b, diags_b) = scan(&unit_b, root_b);
    assert_eq!(skips_a, skips_b);
    assert_eq!(diags_a, diags_b);
}

#[test]
fn write_sink_prefixes_warning() {
    let mut buf = Vec::new();
    {
        let mut sink = WriteSink(&mut buf);
        sink.warn("skipping x: type is bitfield");
    }
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "WARNING: skipping x: type is bitfield\n"
    );
}
