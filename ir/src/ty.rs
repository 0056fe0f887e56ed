//! The structural shape of declarations: primitives, functions, pointers,
//! arrays, and references to aggregate declarations.

use crate::decl::DeclId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Type {
    Primitive(Primitive),
    Function(Box<FunctionType>),
    /// Reference to a scoped (struct/union/enum) declaration in the arena.
    Declared(DeclId),
    Pointer(Box<Type>),
    /// Transparent named wrapper, e.g. a typedef reference. Unlike pointers,
    /// aliases do not change representation and analyses see through them.
    Alias { name: String, inner: Box<Type> },
    Array { elem: Box<Type>, len: Option<u64> },
    /// Placeholder recorded by the front end when resolution failed. The
    /// string is the source spelling of the unresolvable type.
    Erroneous(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
    pub variadic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Void,
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Int128,
    UInt128,
    Float,
    Double,
    LongDouble,
}

impl Primitive {
    /// The C source spelling of this primitive.
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::SChar => "signed char",
            Primitive::UChar => "unsigned char",
            Primitive::Short => "short",
            Primitive::UShort => "unsigned short",
            Primitive::Int => "int",
            Primitive::UInt => "unsigned int",
            Primitive::Long => "long",
            Primitive::ULong => "unsigned long",
            Primitive::LongLong => "long long",
            Primitive::ULongLong => "unsigned long long",
            Primitive::Int128 => "__int128",
            Primitive::UInt128 => "unsigned __int128",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::LongDouble => "long double",
        }
    }
}

impl Type {
    pub fn pointer(inner: Type) -> Type {
        Type::Pointer(Box::new(inner))
    }

    pub fn alias(name: impl Into<String>, inner: Type) -> Type {
        Type::Alias {
            name: name.into(),
            inner: Box::new(inner),
        }
    }

    pub fn array(elem: Type, len: Option<u64>) -> Type {
        Type::Array {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn function(params: Vec<Type>, ret: Type, variadic: bool) -> Type {
        Type::Function(Box::new(FunctionType {
            params,
            ret,
            variadic,
        }))
    }

    /// Strips transparent aliases, yielding the representation-carrying type.
    pub fn resolved(&self) -> &Type {
        let mut ty = self;
        while let Type::Alias { inner, .. } = ty {
            ty = inner;
        }
        ty
    }

    /// The signature behind this type if it is a (possibly aliased) pointer
    /// to function, `None` otherwise.
    pub fn as_function_pointer(&self) -> Option<&FunctionType> {
        match self.resolved() {
            Type::Pointer(inner) => match inner.resolved() {
                Type::Function(f) => Some(f),
                _ => None,
            },
            _ => None,
        }
    }
}
