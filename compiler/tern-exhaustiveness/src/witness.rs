//! Witness construction for partial matches. `find_witness` drives the
//! exhaustiveness side of the analysis: it either proves that a matrix
//! covers every value of its column types, or synthesises a concrete
//! counterexample pattern per column. The synthesised witnesses aim to be
//! readable rather than canonical, so constant columns get the friendliest
//! missing constant the type allows.
//!
//! This is also where coverage feeds back into inference: `pressure_rows`
//! re-walks every checked matrix and closes the open variant rows whose
//! alternatives turned out to be fully handled.
use fxhash::FxHashSet;

use tern_source::identifier::Identifier;
use tern_types::{CtorDesc, CtorTag, TyId};
use tern_utils::stack::ensure_sufficient_stack;

use crate::{
    diagnostics::Result,
    matrix::Matrix,
    pat::{Constant, Pat, PatKind},
    storage::PatId,
    ExhaustivenessChecker, ExhaustivenessEnv,
};

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Whether the given specialised groups exhaust the population of their
    /// column type. Purely a counting question; extensible populations are
    /// never full.
    pub(crate) fn is_full_match(&self, groups: &[(PatId, Matrix)]) -> bool {
        let Some(&(first, _)) = groups.first() else { return false };
        let ty = self.get_pat(first).ty;

        match &self.get_pat(first).kind {
            PatKind::Ctor(desc, _) => {
                if desc.is_extension() {
                    return false;
                }

                let mut consts = FxHashSet::default();
                let mut blocks = FxHashSet::default();
                for &(discr, _) in groups {
                    if let PatKind::Ctor(desc, _) = &self.get_pat(discr).kind {
                        match desc.tag {
                            CtorTag::Const(tag) => {
                                consts.insert(tag);
                            }
                            CtorTag::Block(tag) => {
                                blocks.insert(tag);
                            }
                            CtorTag::Extension(_) => return false,
                        }
                    }
                }

                consts.len() as u32 == desc.consts && blocks.len() as u32 == desc.blocks
            }
            PatKind::Variant { .. } => {
                let Some(row_id) = self.env.tys().variant_row(ty) else { return false };
                let row = self.env.tys().row(row_id);
                if !row.is_closed() {
                    return false;
                }

                let seen: FxHashSet<Identifier> = groups
                    .iter()
                    .filter_map(|&(discr, _)| match &self.get_pat(discr).kind {
                        PatKind::Variant { label, .. } => Some(*label),
                        _ => None,
                    })
                    .collect();

                row.fields().iter().all(|field| field.is_absent() || seen.contains(&field.label))
            }
            PatKind::Const(Constant::Char(_)) => {
                let seen: FxHashSet<u8> = groups
                    .iter()
                    .filter_map(|&(discr, _)| match self.get_pat(discr).kind {
                        PatKind::Const(Constant::Char(value)) => Some(value),
                        _ => None,
                    })
                    .collect();

                seen.len() == 256
            }
            // a tuple or record column only ever has the one shape
            PatKind::Tuple(_) | PatKind::Record(_) => true,
            // ints, strings, floats and array lengths are unbounded
            PatKind::Const(_) | PatKind::Array(_) => false,
            PatKind::Wild | PatKind::Alias(..) | PatKind::Or(..) => {
                unreachable!("specialised groups carry constructor discriminators")
            }
        }
    }

    /// Whether a full-looking match should still be treated as incomplete
    /// because the probed type could grow another declared constructor.
    /// Only plain constructor groups extend this way; extension populations
    /// are never full to begin with, and variant rows track their own
    /// openness.
    pub(crate) fn should_extend(&self, ext: Option<TyId>, groups: &[(PatId, Matrix)]) -> bool {
        let Some(ext_ty) = ext else { return false };
        let Some(&(first, _)) = groups.first() else { return false };

        match &self.get_pat(first).kind {
            PatKind::Ctor(desc, _) if !desc.is_extension() => self.get_pat(first).ty == ext_ty,
            _ => false,
        }
    }

    /// Find a value row matched by none of the matrix rows, as one witness
    /// pattern per column, or `None` when the matrix covers everything.
    /// `width` is the current column count; `ext` asks for columns of the
    /// given type to be treated as incomplete even when every declared
    /// constructor is listed, as if the type had grown one more.
    pub(crate) fn find_witness(
        &mut self,
        matrix: &Matrix,
        width: usize,
        ext: Option<TyId>,
    ) -> Result<Option<Vec<PatId>>> {
        ensure_sufficient_stack(|| self.find_witness_inner(matrix, width, ext))
    }

    fn find_witness_inner(
        &mut self,
        matrix: &Matrix,
        width: usize,
        ext: Option<TyId>,
    ) -> Result<Option<Vec<PatId>>> {
        if matrix.is_empty() {
            // no rows left to dodge
            let unknown = self.env.tys().common.unknown;
            let row = (0..width).map(|_| self.wildcard(unknown)).collect();
            return Ok(Some(row));
        }

        if matrix.column_count() == Some(0) {
            // a row with no columns matches every remaining value
            return Ok(None);
        }

        let column_ty = self.get_pat(matrix.rows[0].head()).ty;
        let discr = self.pick_discriminator(column_ty, matrix)?;
        let groups = self.specialize_all(discr, matrix)?;

        if groups.is_empty() {
            // the column is all wildcards
            let default = self.default_matrix(matrix);
            let Some(mut rest) = self.find_witness(&default, width - 1, ext)? else {
                return Ok(None);
            };

            rest.insert(0, discr);
            return Ok(Some(rest));
        }

        if self.is_full_match(&groups) && !self.should_extend(ext, &groups) {
            // every head of the population is listed, so a witness, if
            // any, hides under one of them
            for (group_discr, group_matrix) in &groups {
                if self.is_absent_variant(*group_discr) {
                    continue;
                }

                let arity = self.kind_width(&self.get_pat(*group_discr).kind);
                if let Some(sub) = self.find_witness(group_matrix, arity + width - 1, ext)? {
                    return Ok(Some(self.set_args(*group_discr, sub)));
                }
            }

            return Ok(None);
        }

        // some head is missing (or pretended missing, for fragility
        // probes); a witness starting with it exists iff the wildcard rows
        // fail to cover the remaining columns
        let default = self.default_matrix(matrix);
        match self.find_witness(&default, width - 1, ext)? {
            None => Ok(None),
            Some(mut rest) => {
                let missing = self.synthesize_missing(column_ty, ext, &groups);
                rest.insert(0, missing);
                Ok(Some(rest))
            }
        }
    }

    /// Synthesise a pattern matching values that none of the groups match.
    /// Callers guarantee that such values exist.
    pub(crate) fn synthesize_missing(
        &mut self,
        ty: TyId,
        ext: Option<TyId>,
        groups: &[(PatId, Matrix)],
    ) -> PatId {
        let Some(&(first, _)) = groups.first() else {
            return self.wildcard(ty);
        };

        match self.get_pat(first).kind.clone() {
            PatKind::Ctor(desc, _) if desc.is_extension() => {
                let tag = CtorTag::Extension(self.env.tys().fresh_extension());
                let desc = CtorDesc {
                    name: "*extension*".into(),
                    tag,
                    arity: 0,
                    consts: 0,
                    blocks: 0,
                };
                self.make_pat(Pat::generated(PatKind::Ctor(desc, Vec::new()), ty))
            }
            PatKind::Ctor(..) => {
                if ext == Some(ty) {
                    // the probe's hypothetical extra constructor; probes
                    // discard the witness itself
                    self.wildcard(ty)
                } else {
                    self.missing_ctor(ty, groups)
                }
            }
            PatKind::Variant { .. } => self.missing_variant(ty, groups),
            PatKind::Const(Constant::Char(_)) => self.missing_char(ty, groups),
            PatKind::Const(Constant::Int(width, _)) => {
                let mut largest = i64::MIN;
                for &(discr, _) in groups {
                    if let PatKind::Const(Constant::Int(_, value)) = &self.get_pat(discr).kind {
                        largest = largest.max(*value);
                    }
                }

                let constant = Constant::Int(width, largest.wrapping_add(1));
                self.make_pat(Pat::generated(PatKind::Const(constant), ty))
            }
            PatKind::Const(Constant::Str(_)) => {
                let mut longest = 0;
                for &(discr, _) in groups {
                    if let PatKind::Const(Constant::Str(lit)) = &self.get_pat(discr).kind {
                        longest = longest.max(lit.as_str().len());
                    }
                }

                // one asterisk longer than anything listed
                let lit = Identifier::from("*".repeat(longest + 1));
                self.make_pat(Pat::generated(PatKind::Const(Constant::Str(lit)), ty))
            }
            PatKind::Const(Constant::Float(_)) => {
                let mut largest = 0.0f64;
                for &(discr, _) in groups {
                    if let PatKind::Const(Constant::Float(lit)) = &self.get_pat(discr).kind {
                        largest = largest.max(lit.as_str().parse().unwrap_or(0.0));
                    }
                }

                let lit = Identifier::from(format!("{:?}", largest + 1.0));
                self.make_pat(Pat::generated(PatKind::Const(Constant::Float(lit)), ty))
            }
            PatKind::Array(_) => self.missing_array(ty, groups),
            _ => self.wildcard(ty),
        }
    }

    /// The first declared constructor no group matches, constants before
    /// blocks so that witnesses stay small.
    fn missing_ctor(&mut self, ty: TyId, groups: &[(PatId, Matrix)]) -> PatId {
        let mut seen = FxHashSet::default();
        for &(discr, _) in groups {
            if let PatKind::Ctor(desc, _) = &self.get_pat(discr).kind {
                seen.insert(desc.tag);
            }
        }

        let Some(descs) = self.env.tys().ctor_descs(ty) else {
            return self.wildcard(ty);
        };

        let missing = descs
            .iter()
            .find(|desc| matches!(desc.tag, CtorTag::Const(_)) && !seen.contains(&desc.tag))
            .or_else(|| descs.iter().find(|desc| !seen.contains(&desc.tag)));
        let Some(&desc) = missing else {
            unreachable!("witness requested for a full constructor match")
        };

        let arg_tys = self.env.tys().ctor_args(ty, desc.tag).unwrap_or_default();
        let args = self.wildcards(&arg_tys);
        self.make_pat(Pat::generated(PatKind::Ctor(desc, args), ty))
    }

    /// An or-pattern of every unhandled label of the row, or the
    /// hypothetical extra label when an open row has no unhandled ones.
    fn missing_variant(&mut self, ty: TyId, groups: &[(PatId, Matrix)]) -> PatId {
        let mut seen = FxHashSet::default();
        for &(discr, _) in groups {
            if let PatKind::Variant { label, .. } = &self.get_pat(discr).kind {
                seen.insert(*label);
            }
        }

        let missing: Vec<(Identifier, Option<TyId>)> = match self.env.tys().variant_row(ty) {
            Some(row_id) => self
                .env
                .tys()
                .row(row_id)
                .fields()
                .iter()
                .filter(|field| !field.is_absent() && !seen.contains(&field.label))
                .map(|field| (field.label, field.arg))
                .collect(),
            None => Vec::new(),
        };

        if missing.is_empty() {
            let label = Identifier::from("AnyExtraTag");
            return self.make_pat(Pat::generated(PatKind::Variant { label, arg: None }, ty));
        }

        let mut alternatives: Vec<PatId> = missing
            .into_iter()
            .map(|(label, arg_ty)| {
                let arg = arg_ty.map(|arg_ty| self.wildcard(arg_ty));
                self.make_pat(Pat::generated(PatKind::Variant { label, arg }, ty))
            })
            .collect();

        let Some(mut witness) = alternatives.pop() else {
            unreachable!("missing labels were checked non-empty")
        };
        for lhs in alternatives.into_iter().rev() {
            witness = self.make_pat(Pat::generated(PatKind::Or(lhs, witness), ty));
        }

        witness
    }

    /// The first character no group matches, searching the ranges a human
    /// would pick a witness from before falling back to the whole byte
    /// space.
    fn missing_char(&mut self, ty: TyId, groups: &[(PatId, Matrix)]) -> PatId {
        let seen: FxHashSet<u8> = groups
            .iter()
            .filter_map(|&(discr, _)| match self.get_pat(discr).kind {
                PatKind::Const(Constant::Char(value)) => Some(value),
                _ => None,
            })
            .collect();

        let ranges = [(b'a', b'z'), (b'A', b'Z'), (b'0', b'9'), (b' ', b'~'), (0, 255)];
        for (lo, hi) in ranges {
            if let Some(value) = (lo..=hi).find(|value| !seen.contains(value)) {
                return self.make_pat(Pat::generated(PatKind::Const(Constant::Char(value)), ty));
            }
        }

        self.wildcard(ty)
    }

    /// An array pattern of the smallest length no group matches.
    fn missing_array(&mut self, ty: TyId, groups: &[(PatId, Matrix)]) -> PatId {
        let lengths: FxHashSet<usize> = groups
            .iter()
            .filter_map(|&(discr, _)| match &self.get_pat(discr).kind {
                PatKind::Array(elems) => Some(elems.len()),
                _ => None,
            })
            .collect();

        let mut len = 0;
        while lengths.contains(&len) {
            len += 1;
        }

        let elem_ty = self.env.tys().array_elem(ty).unwrap_or(self.env.tys().common.unknown);
        let elems = (0..len).map(|_| self.wildcard(elem_ty)).collect();
        self.make_pat(Pat::generated(PatKind::Array(elems), ty))
    }

    /// Re-walk a checked matrix and close every open variant row whose
    /// column turned out to be covered. Returns whether the walked matrix
    /// covers its columns; a column counts as covered when every
    /// constructor group is covered and either the groups are full or the
    /// wildcard rows cover the rest. Unlike the witness search, this walk
    /// visits every group of every column, so rows close even under columns
    /// the verdict never needed.
    pub(crate) fn pressure_rows(&mut self, matrix: &Matrix) -> Result<bool> {
        ensure_sufficient_stack(|| self.pressure_rows_inner(matrix))
    }

    fn pressure_rows_inner(&mut self, matrix: &Matrix) -> Result<bool> {
        if matrix.is_empty() {
            return Ok(false);
        }

        if matrix.column_count() == Some(0) {
            return Ok(true);
        }

        let column_ty = self.get_pat(matrix.rows[0].head()).ty;
        let discr = self.pick_discriminator(column_ty, matrix)?;
        let groups = self.specialize_all(discr, matrix)?;

        let covered = if groups.is_empty() {
            // an all-wildcard column covers whatever the rest of the rows
            // cover
            let default = self.default_matrix(matrix);
            self.pressure_rows(&default)?
        } else {
            // every group is walked even after one fails: sub-columns of
            // the later groups may still close rows of their own
            let mut all_covered = true;
            for (_, group_matrix) in &groups {
                let group_covered = self.pressure_rows(group_matrix)?;
                all_covered = all_covered && group_covered;
            }

            let default = self.default_matrix(matrix);
            let default_covered = self.pressure_rows(&default)?;

            all_covered && (self.is_full_match(&groups) || default_covered)
        };

        if covered {
            if let Some(row_id) = self.env.tys().variant_row(column_ty) {
                if !self.env.tys().row(row_id).is_closed() {
                    self.env.close_variant_row(row_id);
                }
            }
        }

        Ok(covered)
    }
}
