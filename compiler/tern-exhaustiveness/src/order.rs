//! Orderings between patterns: compatibility (do two patterns share an
//! instance), coverage (does one pattern match everything another does), and
//! the join of two compatible patterns. On top of those this file builds the
//! antichain reduction used to strip dominated rows before analysis and to
//! collapse redundant or-alternatives.
//!
//! Coverage of an or-pattern on the left is not decided structurally; it
//! falls back to the satisfiability oracle with a singleton matrix, which is
//! an exhaustiveness query in miniature.
use crate::{
    diagnostics::{CheckError, Result},
    matrix::Matrix,
    pat::{Pat, PatKind},
    stack::PatStack,
    storage::PatId,
    ExhaustivenessChecker, ExhaustivenessEnv,
};

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Whether some value matches both patterns. Wildcards are compatible
    /// with everything, or-patterns distribute, and same-shape patterns
    /// recurse component-wise. Two shapes that could never share a column
    /// are malformed input, not `false`.
    pub(crate) fn compatible(&mut self, p: PatId, q: PatId) -> Result<bool> {
        let p = self.unalias(p);
        let q = self.unalias(q);

        let (p_kind, q_kind) = (self.get_pat(p).kind.clone(), self.get_pat(q).kind.clone());
        match (p_kind, q_kind) {
            (PatKind::Wild, _) | (_, PatKind::Wild) => Ok(true),
            (PatKind::Or(p1, p2), _) => {
                Ok(self.compatible(p1, q)? || self.compatible(p2, q)?)
            }
            (_, PatKind::Or(q1, q2)) => {
                Ok(self.compatible(p, q1)? || self.compatible(p, q2)?)
            }
            (PatKind::Const(lhs), PatKind::Const(rhs)) => {
                if lhs.same_kind(&rhs) {
                    Ok(lhs == rhs)
                } else {
                    Err(CheckError::ConstantMismatch)
                }
            }
            (PatKind::Tuple(ps), PatKind::Tuple(qs)) => {
                if ps.len() != qs.len() {
                    return Err(CheckError::ShapeMismatch {
                        expected: ps.len(),
                        found: qs.len(),
                    });
                }
                self.compatible_args(&ps, &qs)
            }
            (PatKind::Ctor(p_desc, ps), PatKind::Ctor(q_desc, qs)) => {
                Ok(p_desc.tag == q_desc.tag && self.compatible_args(&ps, &qs)?)
            }
            (
                PatKind::Variant { label: p_label, arg: p_arg },
                PatKind::Variant { label: q_label, arg: q_arg },
            ) => {
                if p_label != q_label || self.is_absent_variant(p) {
                    return Ok(false);
                }
                match (p_arg, q_arg) {
                    (Some(p_arg), Some(q_arg)) => self.compatible(p_arg, q_arg),
                    (None, None) => Ok(true),
                    // one spelling carries a payload and the other does not
                    _ => Ok(false),
                }
            }
            (PatKind::Record(ps), PatKind::Record(qs)) => {
                let (p_ty, q_ty) = (self.get_pat(p).ty, self.get_pat(q).ty);
                let ps = self.record_args(&ps, p_ty)?;
                let qs = self.record_args(&qs, q_ty)?;
                self.compatible_args(&ps, &qs)
            }
            (PatKind::Array(ps), PatKind::Array(qs)) => {
                Ok(ps.len() == qs.len() && self.compatible_args(&ps, &qs)?)
            }
            (lhs, rhs) => Err(CheckError::ShapeMismatch {
                expected: self.kind_width(&lhs),
                found: self.kind_width(&rhs),
            }),
        }
    }

    fn compatible_args(&mut self, ps: &[PatId], qs: &[PatId]) -> Result<bool> {
        for (&p, &q) in ps.iter().zip(qs.iter()) {
            if !self.compatible(p, q)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Whether every value matched by `q` is matched by `p`. A variant
    /// alternative that admits no value is vacuously covered by anything.
    /// Or on the right distributes as a conjunction; or on the left (and
    /// any remaining mixed case) is decided by the satisfiability oracle
    /// over the singleton matrix `[p]`.
    pub(crate) fn covers(&mut self, p: PatId, q: PatId) -> Result<bool> {
        let p = self.unalias(p);
        let q = self.unalias(q);

        if self.is_absent_variant(q) {
            return Ok(true);
        }

        let (p_kind, q_kind) = (self.get_pat(p).kind.clone(), self.get_pat(q).kind.clone());
        match (p_kind, q_kind) {
            (PatKind::Wild, _) => Ok(true),
            (_, PatKind::Or(q1, q2)) => Ok(self.covers(p, q1)? && self.covers(p, q2)?),
            (PatKind::Const(lhs), PatKind::Const(rhs)) => {
                if lhs.same_kind(&rhs) {
                    Ok(lhs == rhs)
                } else {
                    Err(CheckError::ConstantMismatch)
                }
            }
            (PatKind::Tuple(ps), PatKind::Tuple(qs)) => {
                if ps.len() != qs.len() {
                    return Err(CheckError::ShapeMismatch {
                        expected: ps.len(),
                        found: qs.len(),
                    });
                }
                self.covers_args(&ps, &qs)
            }
            (PatKind::Ctor(p_desc, ps), PatKind::Ctor(q_desc, qs)) => {
                Ok(p_desc.tag == q_desc.tag && self.covers_args(&ps, &qs)?)
            }
            (
                PatKind::Variant { label: p_label, arg: p_arg },
                PatKind::Variant { label: q_label, arg: q_arg },
            ) => match (p_arg, q_arg) {
                (Some(p_arg), Some(q_arg)) => {
                    Ok(p_label == q_label && self.covers(p_arg, q_arg)?)
                }
                (None, None) => Ok(p_label == q_label),
                _ => Ok(false),
            },
            (PatKind::Record(ps), PatKind::Record(qs)) => {
                let (p_ty, q_ty) = (self.get_pat(p).ty, self.get_pat(q).ty);
                let ps = self.record_args(&ps, p_ty)?;
                let qs = self.record_args(&qs, q_ty)?;
                self.covers_args(&ps, &qs)
            }
            (PatKind::Array(ps), PatKind::Array(qs)) => {
                Ok(ps.len() == qs.len() && self.covers_args(&ps, &qs)?)
            }
            // or on the left, or a concrete shape against a wildcard
            _ => {
                let mut matrix = Matrix::empty();
                self.push_row(&mut matrix, PatStack::singleton(p));
                Ok(!self.satisfiable(&matrix, &[q])?)
            }
        }
    }

    fn covers_args(&mut self, ps: &[PatId], qs: &[PatId]) -> Result<bool> {
        for (&p, &q) in ps.iter().zip(qs.iter()) {
            if !self.covers(p, q)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// The join of two compatible patterns: a pattern matching everything
    /// either side matches. A wildcard absorbs the other side, and
    /// component-wise joins widen a product towards the full product of the
    /// component joins. Incompatible patterns have no join.
    pub(crate) fn lub(&mut self, p: PatId, q: PatId) -> Result<PatId> {
        if !self.compatible(p, q)? {
            return Err(CheckError::IncompatiblePatterns);
        }

        let p = self.unalias(p);
        let q = self.unalias(q);
        self.lub_inner(p, q)
    }

    fn lub_inner(&mut self, p: PatId, q: PatId) -> Result<PatId> {
        let (p_kind, q_kind) = (self.get_pat(p).kind.clone(), self.get_pat(q).kind.clone());
        match (p_kind, q_kind) {
            (PatKind::Wild, _) => Ok(p),
            (_, PatKind::Wild) => Ok(q),
            (PatKind::Or(..), _) | (_, PatKind::Or(..)) => {
                if self.covers(p, q)? {
                    Ok(p)
                } else if self.covers(q, p)? {
                    Ok(q)
                } else {
                    let ty = self.get_pat(p).ty;
                    Ok(self.make_pat(Pat::generated(PatKind::Or(p, q), ty)))
                }
            }
            // compatible constants are equal
            (PatKind::Const(_), PatKind::Const(_)) => Ok(p),
            (PatKind::Tuple(ps), PatKind::Tuple(qs)) => {
                let args = self.lub_args(&ps, &qs)?;
                let ty = self.get_pat(p).ty;
                Ok(self.make_pat(Pat::generated(PatKind::Tuple(args), ty)))
            }
            (PatKind::Ctor(desc, ps), PatKind::Ctor(_, qs)) => {
                let args = self.lub_args(&ps, &qs)?;
                let ty = self.get_pat(p).ty;
                Ok(self.make_pat(Pat::generated(PatKind::Ctor(desc, args), ty)))
            }
            (
                PatKind::Variant { label, arg: Some(p_arg) },
                PatKind::Variant { arg: Some(q_arg), .. },
            ) => {
                let arg = self.lub(p_arg, q_arg)?;
                let ty = self.get_pat(p).ty;
                Ok(self.make_pat(Pat::generated(
                    PatKind::Variant { label, arg: Some(arg) },
                    ty,
                )))
            }
            (PatKind::Variant { arg: None, .. }, PatKind::Variant { arg: None, .. }) => Ok(p),
            (PatKind::Record(ps), PatKind::Record(qs)) => {
                let (p_ty, q_ty) = (self.get_pat(p).ty, self.get_pat(q).ty);
                let ps = self.record_args(&ps, p_ty)?;
                let qs = self.record_args(&qs, q_ty)?;
                let args = self.lub_args(&ps, &qs)?;
                let fields = (0..).zip(args).collect();
                Ok(self.make_pat(Pat::generated(PatKind::Record(fields), p_ty)))
            }
            (PatKind::Array(ps), PatKind::Array(qs)) => {
                let args = self.lub_args(&ps, &qs)?;
                let ty = self.get_pat(p).ty;
                Ok(self.make_pat(Pat::generated(PatKind::Array(args), ty)))
            }
            _ => unreachable!("incompatible shapes slipped past the compatibility check"),
        }
    }

    fn lub_args(&mut self, ps: &[PatId], qs: &[PatId]) -> Result<Vec<PatId>> {
        ps.iter().zip(qs.iter()).map(|(&p, &q)| self.lub(p, q)).collect()
    }

    /// The subset of `pats` with no pattern dominated by another: a minimal
    /// antichain under coverage, in the original order. Dominated rows can
    /// never matter for the question "is everything covered", so this is
    /// applied to clause lists before exhaustiveness analysis as well as to
    /// or-alternatives.
    pub(crate) fn minimal_rows(&mut self, pats: &[PatId]) -> Result<Vec<PatId>> {
        // one pass only removes patterns dominated by a later one, so run it
        // twice, using the reversal to catch earlier dominators
        let once = self.minimal_pass(pats)?;
        self.minimal_pass(&once)
    }

    fn minimal_pass(&mut self, pats: &[PatId]) -> Result<Vec<PatId>> {
        let mut kept = Vec::new();

        for (index, &pat) in pats.iter().enumerate() {
            let mut dominated = false;
            for &later in &pats[index + 1..] {
                if self.covers(later, pat)? {
                    dominated = true;
                    break;
                }
            }

            if !dominated {
                kept.push(pat);
            }
        }

        kept.reverse();
        Ok(kept)
    }

    /// Collapse redundant alternatives of an or-pattern into fewer, more
    /// general ones: dominated alternatives are dropped, and two
    /// alternatives are joined when their join matches nothing beyond the
    /// pair itself. A pattern with nothing to collapse is returned as is.
    pub(crate) fn collapse_or(&mut self, pat: PatId) -> Result<PatId> {
        let alternatives = self.flatten_or(pat);
        if alternatives.len() == 1 {
            return Ok(pat);
        }

        let minimal = self.minimal_rows(&alternatives)?;
        let mut reps: Vec<PatId> = Vec::new();

        'alternatives: for alt in minimal {
            for index in 0..reps.len() {
                if !self.compatible(reps[index], alt)? {
                    continue;
                }

                let joined = self.lub(reps[index], alt)?;
                let mut pair = Matrix::empty();
                self.push_row(&mut pair, PatStack::singleton(reps[index]));
                self.push_row(&mut pair, PatStack::singleton(alt));

                // join only when it is exact
                if !self.satisfiable(&pair, &[joined])? {
                    reps[index] = joined;
                    continue 'alternatives;
                }
            }

            reps.push(alt);
        }

        if reps.len() == alternatives.len() {
            return Ok(pat);
        }

        let ty = self.get_pat(pat).ty;
        let mut reps = reps.into_iter().rev();
        let Some(mut rebuilt) = reps.next() else { return Ok(pat) };
        for lhs in reps {
            rebuilt = self.make_pat(Pat::generated(PatKind::Or(lhs, rebuilt), ty));
        }

        Ok(rebuilt)
    }
}
