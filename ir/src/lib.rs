/*
 *  This crate contains the data structures for cextract's view of parsed
 *  C header declarations.
 *
 *  Conventions:
 *  - Code for building this representation from clang output lives in the
 *    front-end crates, not here.
 *  - Declarations live in an arena (`Unit`) and reference each other through
 *    copyable `DeclId` indices. This is what allows self-referential types
 *    (a struct containing a pointer to itself) without reference cycles.
 *  - Layout and call-descriptor computation is behind the `LayoutOracle`
 *    trait; analyses must not assume a particular platform model.
 */

pub mod decl;
pub mod layout;
pub mod printer;
pub mod ty;

pub use decl::{
    ConstantValue, Decl, DeclId, DeclKind, FunctionDecl, ScopedDecl, ScopedKind, TypedefDecl,
    Unit, VariableDecl, VariableKind,
};
pub use layout::{FunctionDescriptor, LayoutOracle, MemoryLayout, NativeLayout};
pub use ty::{FunctionType, Primitive, Type};
