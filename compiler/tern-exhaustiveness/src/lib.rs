//! Tern pattern exhaustiveness module. This module contains all of the
//! machinery that is responsible for validating the exhaustiveness and
//! usefulness of pattern matching.
//!
//! Usefulness and exhaustiveness are inherently linked concepts, and are
//! computed with the same machinery. In terms of usefulness, we compute
//! whether a pattern `p` can ever be the matching one given the patterns
//! written before it; a pattern that cannot is dead code worth a warning.
//! Exhaustiveness asks the dual question: does the clause list as a whole
//! cover every value of the subject type? For example, in the match block:
//! ```ignore
//! x := Some(3); // ty: Option<i32>
//! match x {
//!     Some(_) => print("there is a number");
//!     None => print("there is no number");
//! };
//! ```
//! the patterns `[Some(_), None]` cover every `Option<i32>`, so the match is
//! total. Replace `Some(_)` with `Some(3)` and the checker instead produces
//! a concrete counterexample, such as `Some(4)`.
//!
//! Rather than enumerating values, both questions are answered by a
//! satisfiability oracle over pattern matrices: a matrix is specialised
//! column by column against the constructors that actually occur, and
//! completeness of a column is decided by counting against the type's
//! declared population. Open populations, i.e. extension constructors and
//! open polymorphic-variant rows, can never be completed by counting; rows
//! that turn out to be fully handled anyway are closed through a narrow
//! callback on the environment, which is the one side effect the analysis
//! performs.
//!
//! The algorithm follows the classical treatment in:
//!
//! <http://moscova.inria.fr/~maranget/papers/warn/warn.pdf>
pub mod diagnostics;
pub mod matrix;
pub mod order;
pub mod pat;
pub mod redundancy;
pub mod stack;
pub mod storage;
pub mod usefulness;
pub mod witness;

#[cfg(test)]
mod tests;

use derive_more::Deref;
use tern_source::location::Span;
use tern_types::{HasTyStore, RowId, Ty, TyId, TyStore};
use tern_utils::{itertools::Itertools, log};

use crate::{
    diagnostics::{ExhaustivenessDiagnostics, ExhaustivenessError, Result},
    matrix::Matrix,
    pat::{Constant, MatchArm, PatKind},
    stack::PatStack,
    storage::{PatId, PatStore},
};

/// The verdict of an exhaustiveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every value of the subject type is matched by some clause.
    Total,
    /// Some value falls through every clause.
    Partial,
}

/// The environment a checker runs against. Everything the analysis asks of
/// the outside world goes through here: type shapes via [HasTyStore], and
/// the single side effect of the analysis via
/// [`ExhaustivenessEnv::close_variant_row`]. Exhaustiveness checking is the
/// point in the pipeline where an open variant row can be proven complete,
/// and the callback is how that proof is reported; the default forwards
/// straight to the store.
pub trait ExhaustivenessEnv: HasTyStore {
    /// Called exactly when an open variant row has been determined
    /// complete. Closing is idempotent, so being told twice is harmless.
    fn close_variant_row(&self, row: RowId) {
        self.tys().close_row(row);
    }
}

/// Checks the clauses of one match expression for exhaustiveness and
/// reachability. Each checker owns its pattern arena: separate match
/// expressions are fully independent analyses that share nothing but the
/// type environment.
#[derive(Deref)]
pub struct ExhaustivenessChecker<'env, E> {
    /// The span of the subject that is being checked for exhaustiveness or
    /// usefulness.
    subject_span: Span,

    /// The patterns this checker works on: the lowered clause patterns,
    /// plus everything the analysis synthesises along the way, i.e.
    /// wildcards, discriminators and witnesses.
    pats: PatStore,

    /// Any diagnostics that are generated during the check are stored
    /// here.
    diagnostics: ExhaustivenessDiagnostics,

    /// Whether to probe matches for fragility against hypothetical new
    /// constructors of the types they name.
    warn_fragile: bool,

    /// The ambient environment.
    #[deref]
    env: &'env E,
}

impl<E: ExhaustivenessEnv> HasTyStore for ExhaustivenessChecker<'_, E> {
    fn tys(&self) -> &TyStore {
        self.env.tys()
    }
}

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Create a new checker for one match expression.
    pub fn new(subject_span: Span, env: &'env E) -> Self {
        Self {
            subject_span,
            pats: PatStore::new(),
            diagnostics: ExhaustivenessDiagnostics::new(),
            warn_fragile: false,
            env,
        }
    }

    /// Enable the fragile-match lint on this checker.
    pub fn with_fragile_lint(mut self) -> Self {
        self.warn_fragile = true;
        self
    }

    /// The span of the subject being checked.
    pub fn subject_span(&self) -> Span {
        self.subject_span
    }

    /// The diagnostics accumulated so far.
    pub fn diagnostics(&self) -> &ExhaustivenessDiagnostics {
        &self.diagnostics
    }

    /// Convert the checker into its accumulated diagnostics.
    pub fn into_diagnostics(self) -> ExhaustivenessDiagnostics {
        self.diagnostics
    }

    /// Run the full battery over a match expression: exhaustiveness with
    /// witness reporting, then clause reachability.
    pub fn check_match(&mut self, arms: &[MatchArm], ty: TyId) -> Result<Coverage> {
        let verdict = self.check_exhaustive(arms, ty)?;
        self.check_redundant(arms);
        Ok(verdict)
    }

    /// Decide whether the clauses cover every value of the subject type.
    /// Guarded clauses are excluded up front, since their guard may fail at
    /// runtime. On a partial match, an error naming rendered witnesses is
    /// recorded, with a note when a guarded clause would have caught the
    /// witness. Row-closing pressure runs over the same matrix regardless
    /// of the verdict.
    pub fn check_exhaustive(&mut self, arms: &[MatchArm], ty: TyId) -> Result<Coverage> {
        let unguarded: Vec<PatId> =
            arms.iter().filter(|arm| !arm.has_guard).map(|arm| arm.pat).collect();
        let minimal = self.minimal_rows(&unguarded)?;

        let mut matrix = Matrix::empty();
        for pat in minimal {
            self.push_row(&mut matrix, PatStack::singleton(pat));
        }

        let verdict = if matrix.is_empty() {
            // no unguarded clause at all, everything may fall through
            let witness = self.wildcard(ty);
            self.report_uncovered(arms, witness);
            Coverage::Partial
        } else {
            match self.find_witness(&matrix, 1, None)? {
                None => Coverage::Total,
                Some(witness_row) => {
                    let witness = witness_row[0];
                    self.report_uncovered(arms, witness);
                    Coverage::Partial
                }
            }
        };

        log::debug!("match at {} found to be {verdict:?}", self.subject_span);
        self.pressure_rows(&matrix)?;

        Ok(verdict)
    }

    /// Check that a single binding pattern matches every value of its type,
    /// as required in declaration and for-loop positions. Records a
    /// refutable-pattern error with the uncovered witnesses otherwise.
    pub fn check_irrefutable(&mut self, pat: PatId, ty: TyId) -> Result<Coverage> {
        debug_assert_eq!(self.get_pat(pat).ty, ty);
        let mut matrix = Matrix::empty();
        self.push_row(&mut matrix, PatStack::singleton(pat));

        let verdict = match self.find_witness(&matrix, 1, None)? {
            None => Coverage::Total,
            Some(witness_row) => {
                let uncovered = self.render_witness(witness_row[0]);
                let location = self.get_pat(pat).span;
                self.diagnostics
                    .add_error(ExhaustivenessError::RefutablePat { location, uncovered });
                Coverage::Partial
            }
        };

        self.pressure_rows(&matrix)?;
        Ok(verdict)
    }

    /// Record the non-exhaustive error for a witness no clause covers.
    fn report_uncovered(&mut self, arms: &[MatchArm], witness: PatId) {
        let may_be_guarded = arms
            .iter()
            .filter(|arm| arm.has_guard)
            .any(|arm| self.compatible(arm.pat, witness).unwrap_or(false));

        let uncovered = self.render_witness(witness);
        self.diagnostics.add_error(ExhaustivenessError::NonExhaustiveMatch {
            location: self.subject_span,
            uncovered,
            may_be_guarded,
        });
    }

    /// Render a witness as one entry per top-level alternative, the shape
    /// diagnostics take uncovered patterns in.
    fn render_witness(&self, witness: PatId) -> Vec<String> {
        self.flatten_or(witness).into_iter().map(|alt| self.render_pat(alt)).collect()
    }

    /// Render a pattern back into surface syntax.
    pub fn render_pat(&self, pat: PatId) -> String {
        match &self.get_pat(pat).kind {
            PatKind::Wild => "_".into(),
            PatKind::Const(constant) => match constant {
                Constant::Int(_, value) => value.to_string(),
                Constant::Char(value) => format!("{:?}", *value as char),
                Constant::Str(lit) => format!("{:?}", lit.as_str()),
                Constant::Float(lit) => lit.as_str().into(),
            },
            PatKind::Tuple(args) => format!("({})", self.render_args(args)),
            PatKind::Ctor(desc, args) => {
                if args.is_empty() {
                    desc.name.to_string()
                } else {
                    format!("{}({})", desc.name, self.render_args(args))
                }
            }
            PatKind::Variant { label, arg } => match arg {
                Some(arg) => format!("`{label}({})", self.render_pat(*arg)),
                None => format!("`{label}"),
            },
            PatKind::Record(fields) => {
                let layout = self.env.tys().record_fields(self.get_pat(pat).ty);
                let rendered = fields
                    .iter()
                    .map(|&(index, field)| {
                        let name = layout
                            .and_then(|layout| layout.get(index as usize))
                            .map(|field| field.name.to_string())
                            .unwrap_or_else(|| format!("#{index}"));
                        format!("{name}: {}", self.render_pat(field))
                    })
                    .join(", ");

                if layout.is_some_and(|layout| fields.len() < layout.len()) {
                    format!("{{{rendered}, ..}}")
                } else {
                    format!("{{{rendered}}}")
                }
            }
            PatKind::Array(elems) => format!("[{}]", self.render_args(elems)),
            PatKind::Alias(inner, name) => format!("{} as {name}", self.render_pat(*inner)),
            PatKind::Or(lhs, rhs) => {
                format!("{} | {}", self.render_pat(*lhs), self.render_pat(*rhs))
            }
        }
    }

    fn render_args(&self, args: &[PatId]) -> String {
        args.iter().map(|&arg| self.render_pat(arg)).join(", ")
    }

    /// The display name of a type, as used by the fragility lint.
    pub(crate) fn ty_name(&self, ty: TyId) -> String {
        match self.env.tys().get(ty) {
            Ty::Data(data) => data.name.to_string(),
            Ty::Record(record) => record.name.to_string(),
            Ty::Int(_) => "int".into(),
            Ty::Char => "char".into(),
            Ty::Str => "str".into(),
            Ty::Float => "float".into(),
            Ty::Tuple(_) => "tuple".into(),
            Ty::Variant(_) => "variant".into(),
            Ty::Array(_) => "array".into(),
            Ty::Unknown => "_".into(),
        }
    }
}
