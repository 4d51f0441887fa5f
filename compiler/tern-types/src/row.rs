//! Polymorphic variant rows. A row accumulates the labels a variant type has
//! been seen with during inference, together with a per-label status and an
//! open/closed flag. Pattern analysis reads rows to decide completeness, and
//! closes a row (through [`VariantRow::close`]) once a match over it has been
//! proven exhaustive.
use std::cell::Cell;

use tern_source::identifier::Identifier;

use crate::store::TyId;

/// The knowledge the type checker has about one label of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFieldStatus {
    /// The label definitely inhabits the row.
    Present,
    /// The label is statically excluded; patterns naming it match nothing.
    Absent,
    /// Not yet pinned either way by inference.
    Unresolved,
}

/// One labelled alternative of a [VariantRow].
#[derive(Debug, Clone)]
pub struct RowField {
    pub label: Identifier,
    /// The payload type, if the alternative carries one.
    pub arg: Option<TyId>,
    status: Cell<RowFieldStatus>,
}

impl RowField {
    pub fn new(label: impl Into<Identifier>, arg: Option<TyId>, status: RowFieldStatus) -> Self {
        Self { label: label.into(), arg, status: Cell::new(status) }
    }

    pub fn status(&self) -> RowFieldStatus {
        self.status.get()
    }

    pub fn is_absent(&self) -> bool {
        self.status.get() == RowFieldStatus::Absent
    }
}

/// A variant row: the labels seen so far and whether more may still appear.
#[derive(Debug, Clone)]
pub struct VariantRow {
    fields: Vec<RowField>,
    closed: Cell<bool>,
}

impl VariantRow {
    pub fn new(fields: Vec<RowField>, closed: bool) -> Self {
        Self { fields, closed: Cell::new(closed) }
    }

    pub fn fields(&self) -> &[RowField] {
        &self.fields
    }

    pub fn field(&self, label: Identifier) -> Option<&RowField> {
        self.fields.iter().find(|field| field.label == label)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Close the row: no further labels may appear, and every label that
    /// inference never pinned is committed to [RowFieldStatus::Absent].
    /// Closing an already-closed row changes nothing.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }

        for field in &self.fields {
            if field.status.get() == RowFieldStatus::Unresolved {
                field.status.set(RowFieldStatus::Absent);
            }
        }
    }
}
