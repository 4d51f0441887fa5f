//! The satisfiability oracle and the or-aware usefulness walk built on top
//! of it. `satisfiable` answers whether some value matches a query row while
//! escaping every row of a matrix; the or-aware walk answers the finer
//! question of which alternatives of a clause's or-patterns can still be the
//! first to match, without ever expanding the clause into disjunctive
//! normal form.
//!
//! Rows in the walk are kept partitioned into three zones: columns already
//! handed to the oracle, or-patterns deferred for branch-wise analysis, and
//! the columns still to visit. Preserving this partitioning instead of
//! eagerly multiplying out or-patterns is what keeps the walk close to
//! linear on deeply nested or-patterns.
use std::iter::once;

use tern_utils::stack::ensure_sufficient_stack;

use crate::{
    diagnostics::Result,
    matrix::Matrix,
    pat::{PatKind, PatOrigin},
    stack::PatStack,
    storage::PatId,
    ExhaustivenessChecker, ExhaustivenessEnv,
};

/// Result of the or-aware usefulness walk for one clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Usefulness {
    /// The clause can match something no earlier clause matches.
    Used,
    /// The clause can never be the one that matches.
    Unused,
    /// The clause is reachable, but the listed or-alternatives are not.
    UnusedBranches(Vec<PatId>),
}

impl Usefulness {
    /// Whether the clause as a whole is reachable.
    pub fn is_used(&self) -> bool {
        !matches!(self, Usefulness::Unused)
    }

    /// Combine the verdicts of two independent or-positions of the same
    /// clause. Any dead position kills the whole clause; otherwise dead
    /// branches accumulate by concatenation.
    pub(crate) fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Usefulness::Unused, _) | (_, Usefulness::Unused) => Usefulness::Unused,
            (Usefulness::Used, other) => other,
            (other, Usefulness::Used) => other,
            (Usefulness::UnusedBranches(mut lhs), Usefulness::UnusedBranches(rhs)) => {
                lhs.extend(rhs);
                Usefulness::UnusedBranches(lhs)
            }
        }
    }
}

/// One row of the or-aware walk, partitioned into its three zones. The
/// zones of every row stay aligned with the query's, since each step of the
/// walk applies the same move to all of them.
#[derive(Debug, Clone)]
pub(crate) struct OrSplitRow {
    /// Columns already resolved, in visiting order.
    pub skipped: Vec<PatId>,
    /// Or-patterns held back for branch-wise analysis.
    pub deferred: Vec<PatId>,
    /// Columns still to visit.
    pub active: Vec<PatId>,
}

impl OrSplitRow {
    pub fn new(pats: Vec<PatId>) -> Self {
        Self { skipped: Vec::new(), deferred: Vec::new(), active: pats }
    }
}

/// Move the row's active head into its skipped zone.
fn shift_to_skipped(row: &OrSplitRow) -> OrSplitRow {
    let mut skipped = row.skipped.clone();
    skipped.push(row.active[0]);
    OrSplitRow { skipped, deferred: row.deferred.clone(), active: row.active[1..].to_vec() }
}

/// Move the row's active head into its deferred zone.
fn shift_to_deferred(row: &OrSplitRow) -> OrSplitRow {
    let mut deferred = row.deferred.clone();
    deferred.push(row.active[0]);
    OrSplitRow { skipped: row.skipped.clone(), deferred, active: row.active[1..].to_vec() }
}

/// Drop the row's active head entirely.
fn drop_head(row: &OrSplitRow) -> OrSplitRow {
    OrSplitRow {
        skipped: row.skipped.clone(),
        deferred: row.deferred.clone(),
        active: row.active[1..].to_vec(),
    }
}

/// Fold every deferred column except `focus` back into the skipped zone,
/// leaving the focused or-pattern as the sole active column.
fn refocus_deferred(row: &OrSplitRow, focus: usize) -> OrSplitRow {
    let mut skipped = row.skipped.clone();
    skipped.extend(
        row.deferred
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != focus)
            .map(|(_, &pat)| pat),
    );

    OrSplitRow { skipped, deferred: Vec::new(), active: vec![row.deferred[focus]] }
}

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Whether some value matches `q` and matches no row of `matrix`.
    pub(crate) fn satisfiable(&mut self, matrix: &Matrix, q: &[PatId]) -> Result<bool> {
        ensure_sufficient_stack(|| self.satisfiable_inner(matrix, q))
    }

    fn satisfiable_inner(&mut self, matrix: &Matrix, q: &[PatId]) -> Result<bool> {
        if matrix.is_empty() {
            // nothing forbids anything, some value fits unless a position
            // is uninhabited
            return Ok(q.iter().all(|&pat| self.has_instance(pat)));
        }

        let Some((&focus, rest)) = q.split_first() else {
            // a fully consumed row of the matrix matches everything left
            return Ok(false);
        };

        let focus = self.unalias(focus);
        let focus_ty = self.get_pat(focus).ty;

        match self.get_pat(focus).kind.clone() {
            PatKind::Or(lhs, rhs) => {
                let with_lhs: Vec<PatId> = once(lhs).chain(rest.iter().copied()).collect();
                if self.satisfiable(matrix, &with_lhs)? {
                    return Ok(true);
                }

                let with_rhs: Vec<PatId> = once(rhs).chain(rest.iter().copied()).collect();
                self.satisfiable(matrix, &with_rhs)
            }
            PatKind::Wild => {
                let discr = self.pick_discriminator(focus_ty, matrix)?;
                let groups = self.specialize_all(discr, matrix)?;

                if self.is_full_match(&groups) {
                    for (group_discr, group_matrix) in &groups {
                        // a group headed by an absent label has no instances
                        if self.is_absent_variant(*group_discr) {
                            continue;
                        }

                        let mut sub = self.discr_args(*group_discr);
                        sub.extend_from_slice(rest);
                        if self.satisfiable(group_matrix, &sub)? {
                            return Ok(true);
                        }
                    }

                    Ok(false)
                } else {
                    // a value escaping the matrix escapes its wildcard rows
                    // in particular, so with an unlisted head available the
                    // default branch alone decides
                    let default = self.default_matrix(matrix);
                    self.satisfiable(&default, rest)
                }
            }
            PatKind::Variant { .. } if self.is_absent_variant(focus) => Ok(false),
            PatKind::Alias(..) => unreachable!("unalias left an alias behind"),
            _ => {
                let discr = self.normalize_head(focus)?;
                let specialized = self.specialize(discr, matrix)?;
                let mut sub = self.simple_match_args(discr, focus)?;
                sub.extend_from_slice(rest);
                self.satisfiable(&specialized, &sub)
            }
        }
    }

    /// The or-aware usefulness walk: decide whether `q` is useful against
    /// `rows`, and which of its or-alternatives are individually dead.
    pub(crate) fn every_satisfiable(
        &mut self,
        rows: &[OrSplitRow],
        q: &OrSplitRow,
    ) -> Result<Usefulness> {
        ensure_sufficient_stack(|| self.every_satisfiable_inner(rows, q))
    }

    fn every_satisfiable_inner(
        &mut self,
        rows: &[OrSplitRow],
        q: &OrSplitRow,
    ) -> Result<Usefulness> {
        let Some((&focus, active_rest)) = q.active.split_first() else {
            return self.decide_row(rows, q);
        };

        let focus = self.unalias(focus);
        match self.get_pat(focus).kind.clone() {
            PatKind::Wild => {
                if self.is_var_column(rows) {
                    // forget about all-variable columns
                    let rows: Vec<OrSplitRow> = rows.iter().map(drop_head).collect();
                    let q = OrSplitRow {
                        skipped: q.skipped.clone(),
                        deferred: q.deferred.clone(),
                        active: active_rest.to_vec(),
                    };
                    self.every_satisfiable(&rows, &q)
                } else {
                    self.shift_column(rows, q, focus, active_rest)
                }
            }
            PatKind::Or(lhs, rhs) => {
                let synthetic = self.get_pat(lhs).origin == PatOrigin::Generated
                    && self.get_pat(rhs).origin == PatOrigin::Generated;

                if synthetic {
                    // desugaring artifacts stay opaque, no branch reports
                    self.shift_column(rows, q, focus, active_rest)
                } else {
                    let rows: Vec<OrSplitRow> = rows.iter().map(shift_to_deferred).collect();
                    let mut deferred = q.deferred.clone();
                    deferred.push(focus);
                    let q = OrSplitRow {
                        skipped: q.skipped.clone(),
                        deferred,
                        active: active_rest.to_vec(),
                    };
                    self.every_satisfiable(&rows, &q)
                }
            }
            PatKind::Variant { .. } if self.is_absent_variant(focus) => Ok(Usefulness::Unused),
            PatKind::Alias(..) => unreachable!("unalias left an alias behind"),
            _ => {
                let discr = self.normalize_head(focus)?;
                let rows = self.or_split_specialize(discr, rows)?;
                let mut active = self.simple_match_args(discr, focus)?;
                active.extend_from_slice(active_rest);
                let q = OrSplitRow {
                    skipped: q.skipped.clone(),
                    deferred: q.deferred.clone(),
                    active,
                };
                self.every_satisfiable(&rows, &q)
            }
        }
    }

    /// Push the current column into the skipped zone of every row and of
    /// the query, leaving it to the oracle.
    fn shift_column(
        &mut self,
        rows: &[OrSplitRow],
        q: &OrSplitRow,
        focus: PatId,
        active_rest: &[PatId],
    ) -> Result<Usefulness> {
        let rows: Vec<OrSplitRow> = rows.iter().map(shift_to_skipped).collect();
        let mut skipped = q.skipped.clone();
        skipped.push(focus);
        let q = OrSplitRow {
            skipped,
            deferred: q.deferred.clone(),
            active: active_rest.to_vec(),
        };

        self.every_satisfiable(&rows, &q)
    }

    fn is_var_column(&self, rows: &[OrSplitRow]) -> bool {
        rows.iter().all(|row| self.is_wild(row.active[0]))
    }

    /// Expand row or-heads and specialise the surviving rows against the
    /// discriminator, keeping each row's zones intact.
    fn or_split_specialize(
        &mut self,
        discr: PatId,
        rows: &[OrSplitRow],
    ) -> Result<Vec<OrSplitRow>> {
        let mut out = Vec::new();

        for row in rows {
            for alternative in self.flatten_or(row.active[0]) {
                if !self.simple_match(discr, alternative)? {
                    continue;
                }

                let mut active = self.simple_match_args(discr, alternative)?;
                active.extend_from_slice(&row.active[1..]);
                out.push(OrSplitRow {
                    skipped: row.skipped.clone(),
                    deferred: row.deferred.clone(),
                    active,
                });
            }
        }

        Ok(out)
    }

    /// All columns are consumed: hand the plain part to the oracle, then
    /// evaluate each deferred or-pattern branch-wise.
    fn decide_row(&mut self, rows: &[OrSplitRow], q: &OrSplitRow) -> Result<Usefulness> {
        if q.deferred.is_empty() {
            debug_assert!(rows.iter().all(|row| row.deferred.is_empty()));

            let mut matrix = Matrix::empty();
            for row in rows {
                self.push_row(&mut matrix, PatStack::from_slice(&row.skipped));
            }

            return Ok(if self.satisfiable(&matrix, &q.skipped)? {
                Usefulness::Used
            } else {
                Usefulness::Unused
            });
        }

        let mut verdict = Usefulness::Used;
        for focus in 0..q.deferred.len() {
            let rows_here: Vec<OrSplitRow> =
                rows.iter().map(|row| refocus_deferred(row, focus)).collect();
            let context = refocus_deferred(q, focus);

            let or_pat = self.unalias(q.deferred[focus]);
            let (lhs, rhs) = match self.get_pat(or_pat).kind {
                PatKind::Or(lhs, rhs) => (lhs, rhs),
                _ => unreachable!("deferred a pattern with no alternatives"),
            };

            let here = self.evaluate_branch(&rows_here, &context, lhs, rhs)?;
            verdict = verdict.combine(here);
            if verdict == Usefulness::Unused {
                break;
            }
        }

        Ok(verdict)
    }

    /// Decide both sides of one or-pattern. The right side is checked with
    /// the left added to the matrix only when the two are compatible: an
    /// incompatible left never shadows the right's values, so adding it
    /// would only mask genuine uses.
    fn evaluate_branch(
        &mut self,
        rows: &[OrSplitRow],
        context: &OrSplitRow,
        lhs: PatId,
        rhs: PatId,
    ) -> Result<Usefulness> {
        let q1 = OrSplitRow {
            skipped: context.skipped.clone(),
            deferred: Vec::new(),
            active: vec![lhs],
        };
        let q2 = OrSplitRow {
            skipped: context.skipped.clone(),
            deferred: Vec::new(),
            active: vec![rhs],
        };

        let left = self.every_satisfiable(rows, &q1)?;

        let shadowed: Vec<OrSplitRow>;
        let rows_for_rhs: &[OrSplitRow] = if self.compatible(lhs, rhs)? {
            shadowed = once(q1).chain(rows.iter().cloned()).collect();
            &shadowed
        } else {
            rows
        };
        let right = self.every_satisfiable(rows_for_rhs, &q2)?;

        Ok(match (left, right) {
            (Usefulness::Unused, Usefulness::Unused) => Usefulness::Unused,
            (Usefulness::Unused, Usefulness::Used) => Usefulness::UnusedBranches(vec![lhs]),
            (Usefulness::Unused, Usefulness::UnusedBranches(mut branches)) => {
                branches.insert(0, lhs);
                Usefulness::UnusedBranches(branches)
            }
            (Usefulness::Used, Usefulness::Unused) => Usefulness::UnusedBranches(vec![rhs]),
            (Usefulness::Used, Usefulness::Used) => Usefulness::Used,
            (Usefulness::Used, Usefulness::UnusedBranches(branches)) => {
                Usefulness::UnusedBranches(branches)
            }
            (Usefulness::UnusedBranches(mut branches), Usefulness::Unused) => {
                branches.push(rhs);
                Usefulness::UnusedBranches(branches)
            }
            (Usefulness::UnusedBranches(branches), Usefulness::Used) => {
                Usefulness::UnusedBranches(branches)
            }
            (Usefulness::UnusedBranches(mut lhs_branches), Usefulness::UnusedBranches(rhs_branches)) => {
                lhs_branches.extend(rhs_branches);
                Usefulness::UnusedBranches(lhs_branches)
            }
        })
    }
}
