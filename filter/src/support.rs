//! Type-support walk: find the first leaf type in a type that bindings
//! generation cannot represent.

use cextract_ir::{DeclKind, FunctionType, LayoutOracle, Type, Unit};

/// Returns the C name of the first unsupported leaf type reachable from
/// `ty`, or `None` if every reachable leaf is supported. Pure; callable
/// repeatedly with identical results.
pub fn first_unsupported_type(
    unit: &Unit,
    oracle: &dyn LayoutOracle,
    ty: &Type,
) -> Option<String> {
    match ty {
        Type::Primitive(p) => match oracle.layout_of(unit, ty) {
            Some(layout) if layout.is_padding() => Some(p.type_name().to_string()),
            _ => None,
        },
        Type::Function(func) => first_unsupported_in_signature(unit, oracle, func),
        Type::Declared(id) => {
            let scoped = unit.get(*id).scoped_decl()?;
            for &member in &scoped.members {
                if let DeclKind::Variable(var) = &unit.get(member).kind {
                    let unsupported = first_unsupported_type(unit, oracle, &var.ty);
                    if unsupported.is_some() {
                        return unsupported;
                    }
                }
            }
            None
        }
        // Never recurse through a pointer: the pointee can be anything
        // (including the enclosing aggregate itself) while the pointer keeps
        // its fixed platform width. An unsupported pointee, e.g.
        // `long double *`, is therefore not reported here.
        Type::Pointer(_) => None,
        Type::Alias { inner, .. } => first_unsupported_type(unit, oracle, inner),
        Type::Array { elem, .. } => first_unsupported_type(unit, oracle, elem),
        Type::Erroneous(name) => Some(name.clone()),
    }
}

/// [first_unsupported_type] over a signature that is not wrapped in a
/// [Type]: arguments left to right, then the return type, first failure
/// wins.
pub fn first_unsupported_in_signature(
    unit: &Unit,
    oracle: &dyn LayoutOracle,
    func: &FunctionType,
) -> Option<String> {
    for arg in &func.params {
        let unsupported = first_unsupported_type(unit, oracle, arg);
        if unsupported.is_some() {
            return unsupported;
        }
    }
    first_unsupported_type(unit, oracle, &func.ret)
}
