//! Declarations and the arena (`Unit`) they live in.

use crate::ty::{FunctionType, Type};
use serde::{Deserialize, Serialize};

/// Index of a declaration inside its [Unit].
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Copy, Clone, Serialize, Deserialize)]
pub struct DeclId(pub u32);

/// Arena holding every declaration of one translation unit.
///
/// The tree is append-only: analyses never mutate it, they record their
/// results in side tables keyed by [DeclId].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Unit {
    decls: Vec<Decl>,
}

impl Unit {
    pub fn new() -> Unit {
        Unit { decls: Vec::new() }
    }

    /// Adds a declaration and returns its id.
    pub fn add(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    /// Reserves an id so mutually-referential declarations (a struct whose
    /// member points back to the struct) can be linked up during
    /// construction. The slot must be filled with [Unit::fill] before use.
    pub fn reserve(&mut self) -> DeclId {
        self.add(Decl::other(""))
    }

    /// Fills a slot previously obtained from [Unit::reserve].
    pub fn fill(&mut self, id: DeclId, decl: Decl) {
        self.decls[id.0 as usize] = decl;
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }

    /// Iterates over every declaration in insertion order.
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId(i as u32), d))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// A named element parsed from a header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decl {
    /// Source name. Empty for anonymous declarations.
    pub name: String,
    /// Binding identifier assigned by the upstream naming pass, if any.
    /// Analyses that need to render a declaration and find `None` here must
    /// fail closed rather than invent a name.
    pub binding_name: Option<String>,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeclKind {
    Function(FunctionDecl),
    Variable(VariableDecl),
    Scoped(ScopedDecl),
    Typedef(TypedefDecl),
    Constant(ConstantValue),
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub ty: FunctionType,
    /// Parameter declarations, one `Variable` per fixed parameter of `ty`.
    pub params: Vec<DeclId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    pub ty: Type,
    pub kind: VariableKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    Normal,
    Bitfield,
}

/// A declaration that owns other declarations: aggregates, enums, and the
/// translation unit itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopedDecl {
    pub kind: ScopedKind,
    pub members: Vec<DeclId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopedKind {
    Struct,
    Union,
    Enum,
    TranslationUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub ty: Type,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConstantValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

/*
 *
 *  Constructors
 *
 */

impl Decl {
    fn new(name: impl Into<String>, kind: DeclKind) -> Decl {
        let name = name.into();
        let binding_name = (!name.is_empty()).then(|| name.clone());
        Decl {
            name,
            binding_name,
            kind,
        }
    }

    pub fn function(name: impl Into<String>, ty: FunctionType, params: Vec<DeclId>) -> Decl {
        Decl::new(name, DeclKind::Function(FunctionDecl { ty, params }))
    }

    pub fn variable(name: impl Into<String>, ty: Type) -> Decl {
        Decl::new(
            name,
            DeclKind::Variable(VariableDecl {
                ty,
                kind: VariableKind::Normal,
            }),
        )
    }

    pub fn bitfield(name: impl Into<String>, ty: Type) -> Decl {
        Decl::new(
            name,
            DeclKind::Variable(VariableDecl {
                ty,
                kind: VariableKind::Bitfield,
            }),
        )
    }

    pub fn scoped(kind: ScopedKind, name: impl Into<String>, members: Vec<DeclId>) -> Decl {
        Decl::new(name, DeclKind::Scoped(ScopedDecl { kind, members }))
    }

    pub fn typedef(name: impl Into<String>, ty: Type) -> Decl {
        Decl::new(name, DeclKind::Typedef(TypedefDecl { ty }))
    }

    pub fn constant(name: impl Into<String>, value: ConstantValue) -> Decl {
        Decl::new(name, DeclKind::Constant(value))
    }

    pub fn other(name: impl Into<String>) -> Decl {
        Decl::new(name, DeclKind::Other)
    }
}

/*
 *
 *  Accessors
 *
 */

impl Decl {
    /// Returns the contained [FunctionDecl] if this is a function.
    pub fn function_decl(&self) -> Option<&FunctionDecl> {
        match &self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the contained [VariableDecl] if this is a variable.
    pub fn variable_decl(&self) -> Option<&VariableDecl> {
        match &self.kind {
            DeclKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the contained [ScopedDecl] if this is a scoped declaration.
    pub fn scoped_decl(&self) -> Option<&ScopedDecl> {
        match &self.kind {
            DeclKind::Scoped(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the contained [TypedefDecl] if this is a typedef.
    pub fn typedef_decl(&self) -> Option<&TypedefDecl> {
        match &self.kind {
            DeclKind::Typedef(t) => Some(t),
            _ => None,
        }
    }

    /// Source name, with a placeholder for anonymous declarations.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<anonymous>"
        } else {
            &self.name
        }
    }
}
