//! Renders types and declarators back to C source, for diagnostics.

use crate::decl::{ScopedKind, Unit};
use crate::ty::{FunctionType, Type};

/// Renders `ty name` as a C declaration, e.g. `int (*cb)(int, char *)`.
/// An empty `name` produces an abstract declarator, as used for parameters.
pub fn declaration(unit: &Unit, ty: &Type, name: &str) -> String {
    render(unit, ty, name.to_string())
}

/// Renders a function signature as a C declaration of `name`.
pub fn function_declaration(unit: &Unit, func: &FunctionType, name: &str) -> String {
    render(unit, &func.ret, format!("{name}({})", param_list(unit, func)))
}

fn param_list(unit: &Unit, func: &FunctionType) -> String {
    let mut parts: Vec<String> = func
        .params
        .iter()
        .map(|p| render(unit, p, String::new()))
        .collect();
    if func.variadic {
        parts.push("...".to_string());
    }
    if parts.is_empty() {
        "void".to_string()
    } else {
        parts.join(", ")
    }
}

// Builds the declarator inside out: `decl` is the declarator accumulated so
// far, each wrapping type adds its own syntax around it.
fn render(unit: &Unit, ty: &Type, decl: String) -> String {
    match ty {
        Type::Primitive(p) => joined(p.type_name(), &decl),
        Type::Declared(id) => {
            let target = unit.get(*id);
            let tag = match target.scoped_decl().map(|s| s.kind) {
                Some(ScopedKind::Union) => "union",
                Some(ScopedKind::Enum) => "enum",
                _ => "struct",
            };
            joined(&format!("{tag} {}", target.display_name()), &decl)
        }
        Type::Pointer(inner) => {
            let wrapped = match inner.as_ref() {
                Type::Function(_) | Type::Array { .. } => format!("(*{decl})"),
                _ => format!("*{decl}"),
            };
            render(unit, inner, wrapped)
        }
        Type::Alias { name, .. } => joined(name, &decl),
        Type::Array { elem, len } => {
            let dim = len.map(|n| n.to_string()).unwrap_or_default();
            render(unit, elem, format!("{decl}[{dim}]"))
        }
        Type::Function(func) => {
            render(unit, &func.ret, format!("{decl}({})", param_list(unit, func)))
        }
        Type::Erroneous(name) => joined(name, &decl),
    }
}

fn joined(type_name: &str, decl: &str) -> String {
    if decl.is_empty() {
        type_name.to_string()
    } else {
        format!("{type_name} {decl}")
    }
}
