//! Clause-level reachability checks: dead clauses, dead or-alternatives,
//! and the fragility lint for matches that would silently absorb a newly
//! declared constructor. Everything here is advisory; a clause the analysis
//! cannot handle keeps quiet instead of failing the caller.
use fxhash::FxHashSet;

use tern_types::TyId;
use tern_utils::log;

use crate::{
    diagnostics::{ExhaustivenessWarning, Result},
    matrix::Matrix,
    pat::{MatchArm, PatKind},
    stack::PatStack,
    storage::PatId,
    usefulness::{OrSplitRow, Usefulness},
    ExhaustivenessChecker, ExhaustivenessEnv,
};

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Check every clause for reachability, in source order. A clause that
    /// can never be the matching one earns a warning, and so does every
    /// individually dead alternative of a reachable clause's or-patterns.
    /// With the fragile-match lint enabled, the clauses are afterwards
    /// probed against a hypothetical extra constructor of every sum type
    /// they name.
    pub fn check_redundant(&mut self, arms: &[MatchArm]) {
        let mut seen: Vec<PatId> = Vec::new();

        for arm in arms {
            match self.clause_usefulness(&seen, arm.pat) {
                Ok(Usefulness::Used) => {}
                Ok(Usefulness::Unused) => {
                    let location = self.get_pat(arm.pat).span;
                    let pat = self.render_pat(arm.pat);
                    self.diagnostics
                        .add_warning(ExhaustivenessWarning::UnusedMatchCase { location, pat });
                }
                Ok(Usefulness::UnusedBranches(branches)) => {
                    for branch in branches {
                        let location = self.get_pat(branch).span;
                        let pat = self.render_pat(branch);
                        self.diagnostics
                            .add_warning(ExhaustivenessWarning::UnusedOrAlternative { location, pat });
                    }
                }
                Err(error) => {
                    // dead-code advice must never block compilation
                    log::debug!("cannot evaluate usefulness of clause: {error}");
                }
            }

            // guarded clauses are checked above but never suppress a later
            // clause, since their guard may fail at runtime
            if !arm.has_guard {
                let merged = self.collapse_or(arm.pat).unwrap_or(arm.pat);
                seen.push(merged);
            }
        }

        if self.warn_fragile {
            self.check_fragile(arms);
        }
    }

    /// Whether the clause is reachable given the unguarded clauses before
    /// it, with per-alternative answers for its or-patterns.
    fn clause_usefulness(&mut self, seen: &[PatId], q: PatId) -> Result<Usefulness> {
        let mut relevant = Vec::new();
        for &prev in seen {
            if self.compatible(prev, q)? {
                relevant.push(prev);
            }
        }

        let rows: Vec<OrSplitRow> = self
            .minimal_rows(&relevant)?
            .into_iter()
            .map(|pat| OrSplitRow::new(vec![pat]))
            .collect();

        self.every_satisfiable(&rows, &OrSplitRow::new(vec![q]))
    }

    /// Warn when the match would silently stay total after one of the sum
    /// types it names grows a new constructor. The warning lands on the
    /// latest clause from which the remaining clauses absorb the
    /// hypothetical constructor.
    fn check_fragile(&mut self, arms: &[MatchArm]) {
        let mut seen = FxHashSet::default();
        let mut probed = Vec::new();
        for arm in arms {
            self.collect_fragile_tys(arm.pat, &mut seen, &mut probed);
        }

        for ty in probed {
            let mut suffix = Matrix::empty();

            for arm in arms.iter().rev() {
                if arm.has_guard {
                    continue;
                }

                self.push_row(&mut suffix, PatStack::singleton(arm.pat));
                match self.find_witness(&suffix, 1, Some(ty)) {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        let location = self.get_pat(arm.pat).span;
                        let ty = self.ty_name(ty);
                        self.diagnostics
                            .add_warning(ExhaustivenessWarning::FragileMatch { location, ty });
                        break;
                    }
                    Err(error) => {
                        log::debug!("cannot evaluate fragility: {error}");
                        break;
                    }
                }
            }
        }
    }

    /// Collect every type named by a declared-constructor pattern, in
    /// first-encounter order. Extension constructors contribute no type;
    /// an extensible population already requires a catch-all.
    fn collect_fragile_tys(
        &self,
        pat: PatId,
        seen: &mut FxHashSet<TyId>,
        out: &mut Vec<TyId>,
    ) {
        match &self.get_pat(pat).kind {
            PatKind::Wild | PatKind::Const(_) => {}
            PatKind::Ctor(desc, args) => {
                if !desc.is_extension() {
                    let ty = self.get_pat(pat).ty;
                    if seen.insert(ty) {
                        out.push(ty);
                    }
                }

                for &arg in args {
                    self.collect_fragile_tys(arg, seen, out);
                }
            }
            PatKind::Tuple(args) | PatKind::Array(args) => {
                for &arg in args {
                    self.collect_fragile_tys(arg, seen, out);
                }
            }
            PatKind::Variant { arg, .. } => {
                if let Some(arg) = arg {
                    self.collect_fragile_tys(*arg, seen, out);
                }
            }
            PatKind::Record(fields) => {
                for &(_, field) in fields {
                    self.collect_fragile_tys(field, seen, out);
                }
            }
            PatKind::Alias(inner, _) => self.collect_fragile_tys(*inner, seen, out),
            PatKind::Or(lhs, rhs) => {
                self.collect_fragile_tys(*lhs, seen, out);
                self.collect_fragile_tys(*rhs, seen, out);
            }
        }
    }
}
