//! Marks declarations that code generation cannot support, so that it skips
//! them. A declaration is unsupported when:
//! - it uses an unsupported leaf type (e.g. `__int128`);
//! - it is a struct/union or variable for which no memory layout exists;
//! - it is a function or function pointer for which no call descriptor
//!   exists;
//! - it takes or returns a variadic function pointer with fixed parameters;
//! - it is a bitfield struct member.
//!
//! Every skip is recorded once in a [SkipSet] keyed by declaration id and
//! reported as one `skipping <name>: <reason>` line on the diagnostic sink,
//! in traversal order. Downstream generation treats the skip set as
//! authoritative: skipped declarations are omitted, nothing else changes.

mod support;
#[cfg(test)]
mod tests;

pub use support::{first_unsupported_in_signature, first_unsupported_type};

use cextract_ir::{
    Decl, DeclId, DeclKind, FunctionDecl, FunctionType, LayoutOracle, ScopedDecl, ScopedKind,
    Type, TypedefDecl, Unit, VariableDecl, VariableKind, printer,
};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a declaration was excluded from generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("unsupported type usage: {0}")]
    UnsupportedType(String),
    #[error("does not have a valid memory layout")]
    MissingLayout,
    #[error("does not have a valid function descriptor")]
    MissingDescriptor,
    #[error("type is bitfield")]
    Bitfield,
    #[error("varargs in callbacks is not supported: {0}")]
    VariadicCallback(String),
}

/// Per-declaration skip markers. Written once by [UnsupportedFilter],
/// consulted by the generator before emitting each declaration.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SkipSet {
    skips: BTreeMap<DeclId, SkipReason>,
}

impl SkipSet {
    pub fn is_skipped(&self, id: DeclId) -> bool {
        self.skips.contains_key(&id)
    }

    pub fn reason(&self, id: DeclId) -> Option<&SkipReason> {
        self.skips.get(&id)
    }

    /// Iterates in declaration-id order.
    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &SkipReason)> {
        self.skips.iter().map(|(&id, reason)| (id, reason))
    }

    pub fn len(&self) -> usize {
        self.skips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skips.is_empty()
    }

    // First reason wins; a marker is never overwritten or cleared.
    fn mark(&mut self, id: DeclId, reason: SkipReason) {
        self.skips.entry(id).or_insert(reason);
    }
}

/// Ordered receiver for `skipping ...` warning lines.
pub trait DiagnosticSink {
    fn warn(&mut self, line: &str);
}

impl DiagnosticSink for Vec<String> {
    fn warn(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Adapter that prints each diagnostic as `WARNING: <line>` to a writer,
/// the way the surrounding pipeline reports to its warning stream. Write
/// errors are swallowed; diagnostics never abort a run.
pub struct WriteSink<W: io::Write>(pub W);

impl<W: io::Write> DiagnosticSink for WriteSink<W> {
    fn warn(&mut self, line: &str) {
        let _ = writeln!(self.0, "WARNING: {line}");
    }
}

/// Single-pass eligibility visitor over a translation unit.
///
/// Decisions are made per declaration, parents first, and children are
/// always descended into afterwards so that diagnostics are exhaustive.
/// Markers never propagate between parent and child; a typedef re-validates
/// its aliased aggregate explicitly instead.
pub struct UnsupportedFilter<'a> {
    unit: &'a Unit,
    oracle: &'a dyn LayoutOracle,
    sink: &'a mut dyn DiagnosticSink,
    skips: SkipSet,
    // Aggregates already validated. A struct reachable both directly and
    // through a typedef is validated once.
    validated_scopes: BTreeSet<DeclId>,
}

impl<'a> UnsupportedFilter<'a> {
    pub fn new(
        unit: &'a Unit,
        oracle: &'a dyn LayoutOracle,
        sink: &'a mut dyn DiagnosticSink,
    ) -> UnsupportedFilter<'a> {
        UnsupportedFilter {
            unit,
            oracle,
            sink,
            skips: SkipSet::default(),
            validated_scopes: BTreeSet::new(),
        }
    }

    /// Scans the members of `root` (the translation unit) and returns the
    /// resulting skip set. Each tree must be scanned exactly once.
    pub fn scan(mut self, root: DeclId) -> SkipSet {
        if let DeclKind::Scoped(scoped) = &self.unit.get(root).kind {
            for &member in &scoped.members {
                self.visit(member, None);
            }
        }
        debug!(
            "eligibility scan done: {} of {} declarations skipped",
            self.skips.len(),
            self.unit.len()
        );
        self.skips
    }

    fn visit(&mut self, id: DeclId, parent: Option<DeclId>) {
        let decl = self.unit.get(id);
        debug!("checking {}", self.qualified_name(decl, parent));
        match &decl.kind {
            DeclKind::Function(func) => self.visit_function(id, decl, func),
            DeclKind::Variable(var) => self.visit_variable(id, decl, var, parent),
            DeclKind::Scoped(scoped) => self.visit_scoped(id, scoped, parent),
            DeclKind::Typedef(typedef) => self.visit_typedef(id, decl, typedef),
            // Constants have no runtime memory representation to fail, and
            // unclassified declarations are not generated at all.
            DeclKind::Constant(_) | DeclKind::Other => {}
        }
    }

    fn visit_function(&mut self, id: DeclId, decl: &Decl, func: &FunctionDecl) {
        let name = decl.display_name();
        if let Some(unsupported) =
            first_unsupported_in_signature(self.unit, self.oracle, &func.ty)
        {
            self.skip(id, name, SkipReason::UnsupportedType(unsupported));
            return;
        }
        if self.oracle.descriptor_of(self.unit, &func.ty).is_none() {
            self.skip(id, name, SkipReason::MissingDescriptor);
            return;
        }

        // Function pointers among the parameters and in the return type must
        // be bindable as callbacks; any failure skips the whole function.
        for &param in &func.params {
            let Some(var) = self.unit.get(param).variable_decl() else {
                continue;
            };
            if let Some(callback) = var.ty.as_function_pointer() {
                if let Err(reason) = self.check_callback(param, callback) {
                    self.skip(id, name, reason);
                    return;
                }
            }
        }
        if let Some(callback) = func.ty.ret.as_function_pointer() {
            if let Err(reason) = self.check_callback(id, callback) {
                self.skip(id, name, reason);
            }
        }
    }

    fn visit_variable(
        &mut self,
        id: DeclId,
        decl: &Decl,
        var: &VariableDecl,
        parent: Option<DeclId>,
    ) {
        let name = self.qualified_name(decl, parent);
        if let Some(unsupported) = first_unsupported_type(self.unit, self.oracle, &var.ty) {
            self.skip(id, &name, SkipReason::UnsupportedType(unsupported));
            return;
        }
        if self.oracle.layout_of(self.unit, &var.ty).is_none() {
            self.skip(id, &name, SkipReason::MissingLayout);
            return;
        }
        if var.kind == VariableKind::Bitfield {
            self.skip(id, &name, SkipReason::Bitfield);
            return;
        }
        if let Some(callback) = var.ty.as_function_pointer() {
            if let Err(reason) = self.check_callback(id, callback) {
                self.skip(id, &name, reason);
            }
        }
    }

    fn visit_scoped(&mut self, id: DeclId, scoped: &ScopedDecl, parent: Option<DeclId>) {
        if !self.validated_scopes.insert(id) {
            return;
        }
        if matches!(scoped.kind, ScopedKind::Struct | ScopedKind::Union)
            && self.oracle.record_layout(self.unit, id).is_none()
        {
            let name = self.qualified_name(self.unit.get(id), parent);
            self.skip(id, &name, SkipReason::MissingLayout);
        }
        // Members are checked independently of the decision above, so every
        // unsupported member is reported even inside a skipped aggregate.
        for &member in &scoped.members {
            self.visit(member, Some(id));
        }
    }

    fn visit_typedef(&mut self, id: DeclId, decl: &Decl, typedef: &TypedefDecl) {
        self.typedef_decision(id, decl, typedef);
        // The aliased aggregate gets its own validation pass whether or not
        // the typedef survived, so anonymous structs that appear nowhere
        // else still receive their layout check and member descent.
        if let Type::Declared(target) = typedef.ty.resolved() {
            if let Some(scoped) = self.unit.get(*target).scoped_decl() {
                self.visit_scoped(*target, scoped, None);
            }
        }
    }

    fn typedef_decision(&mut self, id: DeclId, decl: &Decl, typedef: &TypedefDecl) {
        let name = decl.display_name();
        if let Some(unsupported) = first_unsupported_type(self.unit, self.oracle, &typedef.ty) {
            self.skip(id, name, SkipReason::UnsupportedType(unsupported));
            return;
        }
        if let Some(callback) = typedef.ty.as_function_pointer() {
            if let Err(reason) = self.check_callback(id, callback) {
                self.skip(id, name, reason);
                return;
            }
        }
        if self.oracle.layout_of(self.unit, &typedef.ty).is_none() {
            self.skip(id, name, SkipReason::MissingLayout);
        }
    }

    /// Shared validation for a function-pointer-typed parameter, return
    /// type, variable, or typedef alias. `decl` is the declaration whose
    /// binding name labels the callback in diagnostics; when the naming pass
    /// produced nothing for it the check fails closed, since a callback we
    /// cannot name is a callback we cannot bind.
    fn check_callback(&self, decl: DeclId, func: &FunctionType) -> Result<(), SkipReason> {
        let Some(binding) = &self.unit.get(decl).binding_name else {
            return Err(SkipReason::UnsupportedType(printer::function_declaration(
                self.unit, func, "",
            )));
        };
        if let Some(unsupported) = first_unsupported_in_signature(self.unit, self.oracle, func) {
            return Err(SkipReason::UnsupportedType(unsupported));
        }
        if self.oracle.descriptor_of(self.unit, func).is_none() {
            return Err(SkipReason::MissingDescriptor);
        }
        // A callback taking only varargs is bindable (the fixed part of the
        // call is fully described); varargs after fixed parameters are not.
        if func.variadic && !func.params.is_empty() {
            return Err(SkipReason::VariadicCallback(printer::function_declaration(
                self.unit, func, binding,
            )));
        }
        Ok(())
    }

    fn qualified_name(&self, decl: &Decl, parent: Option<DeclId>) -> String {
        match parent {
            Some(parent) => format!(
                "{}.{}",
                self.unit.get(parent).display_name(),
                decl.display_name()
            ),
            None => decl.display_name().to_string(),
        }
    }

    fn skip(&mut self, id: DeclId, name: &str, reason: SkipReason) {
        let line = format!("skipping {name}: {reason}");
        warn!("{line}");
        self.sink.warn(&line);
        self.skips.mark(id, reason);
    }
}
