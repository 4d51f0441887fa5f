//! Pattern stack data structure, which represents [super::matrix::Matrix]
//! rows. This file contains some utilities on the [PatStack] to perform
//! transformations that the usefulness and exhaustiveness traversals rely
//! on, in particular expanding or-pattern heads and specialising a row
//! against a discriminator.
use tern_utils::smallvec::{smallvec, SmallVec};

use crate::{
    diagnostics::Result,
    storage::PatId,
    ExhaustivenessChecker, ExhaustivenessEnv,
};

/// A row of a [super::matrix::Matrix]. Rows of len 1 are very common, which
/// is why `SmallVec<[_; 2]>` works well.
#[derive(Clone, Debug)]
pub struct PatStack {
    /// The stored patterns in the row.
    pub pats: SmallVec<[PatId; 2]>,
}

impl PatStack {
    /// Construct a [PatStack] with a single pattern.
    pub fn singleton(pat: PatId) -> Self {
        Self::from_vec(smallvec![pat])
    }

    /// Construct a [PatStack] from a [SmallVec].
    pub fn from_vec(vec: SmallVec<[PatId; 2]>) -> Self {
        PatStack { pats: vec }
    }

    /// Construct a [PatStack] from a slice of patterns.
    pub fn from_slice(pats: &[PatId]) -> Self {
        Self::from_vec(SmallVec::from_slice(pats))
    }

    /// Check whether the current [PatStack] is empty.
    pub fn is_empty(&self) -> bool {
        self.pats.is_empty()
    }

    /// Get the length of the [PatStack].
    pub fn len(&self) -> usize {
        self.pats.len()
    }

    /// Get the head of the current [PatStack].
    pub fn head(&self) -> PatId {
        self.pats[0]
    }

    /// The row without its head.
    pub fn tail(&self) -> &[PatId] {
        &self.pats[1..]
    }

    /// Iterate over the items within the [PatStack].
    pub fn iter(&self) -> impl Iterator<Item = &PatId> {
        self.pats.iter()
    }

    /// Build a new row from a head position followed by this row's tail.
    pub fn replace_head(&self, pats: Vec<PatId>) -> Self {
        let mut row: SmallVec<[PatId; 2]> = SmallVec::from_vec(pats);
        row.extend_from_slice(self.tail());
        Self::from_vec(row)
    }
}

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Expand the head of the row into its or-alternatives, stripping
    /// aliases as it goes. A row whose head has no or-node expands to a
    /// single row with an alias-free head, which is how every row enters a
    /// matrix.
    ///
    /// Panics if the row is empty.
    pub(crate) fn expand_or_row(&self, row: &PatStack) -> Vec<PatStack> {
        self.flatten_or(row.head())
            .into_iter()
            .map(|alternative| {
                let mut expanded = PatStack::singleton(alternative);
                expanded.pats.extend_from_slice(row.tail());
                expanded
            })
            .collect()
    }

    /// Specialise the row against a discriminator: if the head can stand for
    /// the discriminator's shape, replace it with its sub-patterns followed
    /// by the rest of the row. Rows that commit to a different shape drop
    /// out with `None`.
    pub(crate) fn specialize_row(
        &mut self,
        discr: PatId,
        row: &PatStack,
    ) -> Result<Option<PatStack>> {
        let head = row.head();
        if !self.simple_match(discr, head)? {
            return Ok(None);
        }

        let args = self.simple_match_args(discr, head)?;
        Ok(Some(row.replace_head(args)))
    }
}
