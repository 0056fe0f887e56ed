//! Memory layouts, call descriptors, and the oracle seam that computes them.
//!
//! Absence of a layout or descriptor (`None`) means the type or signature is
//! not representable on the target. A [MemoryLayout::Padding] result is
//! present but content-less: the platform reserves space for the type but
//! there is no expressible native representation for its value.

use crate::decl::{DeclId, ScopedKind, Unit};
use crate::ty::{FunctionType, Primitive, Type};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryLayout {
    /// A directly addressable scalar value.
    Value { size: u64, align: u64 },
    /// An aggregate or array of other layouts.
    Group { size: u64, align: u64 },
    /// Reserved space with no addressable content.
    Padding { size: u64 },
}

impl MemoryLayout {
    pub fn is_padding(&self) -> bool {
        matches!(self, MemoryLayout::Padding { .. })
    }

    pub fn size(&self) -> u64 {
        match *self {
            MemoryLayout::Value { size, .. }
            | MemoryLayout::Group { size, .. }
            | MemoryLayout::Padding { size } => size,
        }
    }

    pub fn align(&self) -> u64 {
        match *self {
            MemoryLayout::Value { align, .. } | MemoryLayout::Group { align, .. } => align,
            MemoryLayout::Padding { .. } => 1,
        }
    }
}

/// Description of a function signature sufficient to perform a native call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub args: Vec<MemoryLayout>,
    /// `None` for a void return.
    pub ret: Option<MemoryLayout>,
}

/// Computes layouts and call descriptors for one target platform.
///
/// Analyses query this trait and must treat every `None` as authoritative:
/// there is no fallback model to consult.
pub trait LayoutOracle {
    /// Memory layout for a type; `None` means non-representable.
    fn layout_of(&self, unit: &Unit, ty: &Type) -> Option<MemoryLayout>;

    /// Call descriptor for a function signature; `None` means the signature
    /// shape cannot be called natively even if every leaf type has a layout.
    fn descriptor_of(&self, unit: &Unit, func: &FunctionType) -> Option<FunctionDescriptor>;

    /// Aggregate layout for a struct/union declaration.
    fn record_layout(&self, unit: &Unit, decl: DeclId) -> Option<MemoryLayout>;
}

/// Host-platform layout model (LP64, SysV-flavoured).
///
/// `__int128` and `long double` have storage but no clean native
/// representation, so they resolve to padding layouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLayout;

const POINTER: MemoryLayout = MemoryLayout::Value { size: 8, align: 8 };

impl NativeLayout {
    fn primitive_layout(p: Primitive) -> Option<MemoryLayout> {
        use Primitive::*;
        let scalar = |size| MemoryLayout::Value { size, align: size };
        Some(match p {
            Void => return None,
            Bool | Char | SChar | UChar => scalar(1),
            Short | UShort => scalar(2),
            Int | UInt | Float => scalar(4),
            Long | ULong | LongLong | ULongLong | Double => scalar(8),
            Int128 | UInt128 | LongDouble => MemoryLayout::Padding { size: 16 },
        })
    }
}

impl LayoutOracle for NativeLayout {
    fn layout_of(&self, unit: &Unit, ty: &Type) -> Option<MemoryLayout> {
        match ty {
            Type::Primitive(p) => Self::primitive_layout(*p),
            Type::Function(_) => None,
            Type::Declared(id) => self.record_layout(unit, *id),
            Type::Pointer(_) => Some(POINTER),
            Type::Alias { inner, .. } => self.layout_of(unit, inner),
            Type::Array { elem, len: Some(len) } => {
                let elem = self.layout_of(unit, elem)?;
                Some(MemoryLayout::Group {
                    // An array too large to address has no usable layout.
                    size: elem.size().checked_mul(*len)?,
                    align: elem.align(),
                })
            }
            // Incomplete array, e.g. a flexible array member.
            Type::Array { len: None, .. } => None,
            Type::Erroneous(_) => None,
        }
    }

    fn descriptor_of(&self, unit: &Unit, func: &FunctionType) -> Option<FunctionDescriptor> {
        let mut args = Vec::with_capacity(func.params.len());
        for param in &func.params {
            args.push(self.layout_of(unit, param)?);
        }
        let ret = match func.ret.resolved() {
            Type::Primitive(Primitive::Void) => None,
            ret => Some(self.layout_of(unit, ret)?),
        };
        Some(FunctionDescriptor { args, ret })
    }

    fn record_layout(&self, unit: &Unit, decl: DeclId) -> Option<MemoryLayout> {
        let scoped = unit.get(decl).scoped_decl()?;
        match scoped.kind {
            ScopedKind::Struct | ScopedKind::Union => {}
            // C enums are int-sized on this target.
            ScopedKind::Enum => return Some(MemoryLayout::Value { size: 4, align: 4 }),
            ScopedKind::TranslationUnit => return None,
        }
        let mut size = 0u64;
        let mut align = 1u64;
        let mut fields = 0usize;
        let mut representable = 0usize;
        for &member in &scoped.members {
            let Some(var) = unit.get(member).variable_decl() else {
                continue;
            };
            let layout = self.layout_of(unit, &var.ty)?;
            fields += 1;
            if !layout.is_padding() {
                representable += 1;
            }
            match scoped.kind {
                ScopedKind::Union => size = size.max(layout.size()),
                _ => {
                    size = round_up(size, layout.align())?;
                    size = size.checked_add(layout.size())?;
                }
            }
            align = align.max(layout.align());
        }
        // Empty aggregates and aggregates whose every field is content-less
        // have no usable layout.
        if fields == 0 || representable == 0 {
            return None;
        }
        Some(MemoryLayout::Group {
            size: round_up(size, align)?,
            align,
        })
    }
}

fn round_up(offset: u64, align: u64) -> Option<u64> {
    offset.div_ceil(align).checked_mul(align)
}
