//! This file contains definitions for the pattern matrix that is used when
//! computing the usefulness and exhaustiveness of a set of patterns,
//! together with the specialisation engine that splits a matrix by the head
//! constructors of its first column.
//!
//! Matrices maintain one invariant throughout: the head of every row is
//! alias-free and or-free. [ExhaustivenessChecker::push_row] establishes it
//! on entry, and every operation that exposes a new first column re-routes
//! rows through `push_row`.
use tern_types::{Ty, TyId};

use crate::{
    diagnostics::{CheckError, Result},
    pat::{Pat, PatKind},
    stack::PatStack,
    storage::PatId,
    ExhaustivenessChecker, ExhaustivenessEnv,
};

/// A 2D matrix which represents a stack of match rows. Each row can be
/// thought of as a match arm, however most rows in the [Matrix] are
/// generated when patterns are specialised or expanded.
#[derive(Clone, Debug)]
pub struct Matrix {
    /// The inner rows of the [Matrix].
    pub rows: Vec<PatStack>,
}

impl Matrix {
    /// Create a new [Matrix] with zero rows and columns.
    pub fn empty() -> Self {
        Matrix { rows: vec![] }
    }

    /// Whether the matrix has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns of this matrix. `None` if the matrix is empty.
    pub fn column_count(&self) -> Option<usize> {
        self.rows.first().map(|row| row.len())
    }

    /// Iterate over the first component of each row.
    pub fn heads(&self) -> impl Iterator<Item = PatId> + '_ {
        self.rows.iter().map(|row| row.head())
    }
}

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Push a new row to the matrix. If the row starts with an or-pattern
    /// this expands it into one row per alternative, and aliases on the head
    /// are stripped, which keeps the matrix invariant.
    pub(crate) fn push_row(&self, matrix: &mut Matrix, row: PatStack) {
        if row.is_empty() {
            matrix.rows.push(row);
            return;
        }

        matrix.rows.extend(self.expand_or_row(&row));
    }

    /// Reduce a pattern to its discriminator shape: the head constructor
    /// with every immediate sub-pattern replaced by a typed wildcard. Record
    /// patterns normalise to the full field set of their type, however the
    /// pattern spelled its fields.
    pub(crate) fn normalize_head(&mut self, pat: PatId) -> Result<PatId> {
        let pat = self.unalias(pat);
        let Pat { kind, ty, .. } = self.get_pat(pat).clone();

        let kind = match kind {
            PatKind::Wild | PatKind::Const(_) => return Ok(pat),
            PatKind::Tuple(args) => {
                let tys = self.arg_tys(&args);
                PatKind::Tuple(self.wildcards(&tys))
            }
            PatKind::Ctor(desc, args) => {
                let tys = self.arg_tys(&args);
                PatKind::Ctor(desc, self.wildcards(&tys))
            }
            PatKind::Variant { label, arg } => {
                let arg = arg.map(|arg| {
                    let arg_ty = self.get_pat(arg).ty;
                    self.wildcard(arg_ty)
                });
                PatKind::Variant { label, arg }
            }
            PatKind::Record(fields) => {
                return self
                    .full_shape_of(ty)
                    .ok_or(CheckError::ShapeMismatch { expected: 0, found: fields.len() })
            }
            PatKind::Array(args) => {
                let tys = self.arg_tys(&args);
                PatKind::Array(self.wildcards(&tys))
            }
            PatKind::Or(..) => return Err(CheckError::UnresolvedOr),
            PatKind::Alias(..) => unreachable!("unalias left an alias behind"),
        };

        Ok(self.make_pat(Pat::generated(kind, ty)))
    }

    /// The single-alternative shape of a tuple or record type, with every
    /// position wild. Other types have no such shape.
    pub(crate) fn full_shape_of(&mut self, ty: TyId) -> Option<PatId> {
        match self.env.tys().get(ty) {
            Ty::Tuple(member_tys) => {
                let args = member_tys.iter().map(|member| self.wildcard(*member)).collect();
                Some(self.make_pat(Pat::generated(PatKind::Tuple(args), ty)))
            }
            Ty::Record(record) => {
                let fields = record
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(index, field)| (index as u32, self.wildcard(field.ty)))
                    .collect();
                Some(self.make_pat(Pat::generated(PatKind::Record(fields), ty)))
            }
            _ => None,
        }
    }

    fn arg_tys(&self, args: &[PatId]) -> Vec<TyId> {
        args.iter().map(|arg| self.get_pat(*arg).ty).collect()
    }

    /// The immediate sub-patterns of a discriminator, in column order.
    pub(crate) fn discr_args(&self, discr: PatId) -> Vec<PatId> {
        match &self.get_pat(discr).kind {
            PatKind::Wild | PatKind::Const(_) => vec![],
            PatKind::Tuple(args) | PatKind::Ctor(_, args) | PatKind::Array(args) => args.clone(),
            PatKind::Variant { arg, .. } => arg.iter().copied().collect(),
            PatKind::Record(fields) => fields.iter().map(|(_, field)| *field).collect(),
            PatKind::Alias(..) | PatKind::Or(..) => {
                unreachable!("discriminator is not normalised")
            }
        }
    }

    /// Whether a row head can stand for the discriminator's shape. Wildcard
    /// heads stand for every shape; concrete heads must carry the same head
    /// constructor. Shapes that could never share a column mean the input
    /// was malformed upstream and are reported as such.
    pub(crate) fn simple_match(&self, discr: PatId, head: PatId) -> Result<bool> {
        match (&self.get_pat(discr).kind, &self.get_pat(head).kind) {
            (_, PatKind::Wild) => Ok(true),
            (PatKind::Const(lhs), PatKind::Const(rhs)) => {
                if lhs.same_kind(rhs) {
                    Ok(lhs == rhs)
                } else {
                    Err(CheckError::ConstantMismatch)
                }
            }
            (PatKind::Ctor(lhs, _), PatKind::Ctor(rhs, _)) => Ok(lhs.tag == rhs.tag),
            (PatKind::Variant { label: lhs, .. }, PatKind::Variant { label: rhs, .. }) => {
                Ok(lhs == rhs)
            }
            (PatKind::Tuple(lhs), PatKind::Tuple(rhs)) => {
                if lhs.len() == rhs.len() {
                    Ok(true)
                } else {
                    Err(CheckError::ShapeMismatch { expected: lhs.len(), found: rhs.len() })
                }
            }
            (PatKind::Record(_), PatKind::Record(_)) => Ok(true),
            // arrays of different lengths share a column, they just never
            // match the same values
            (PatKind::Array(lhs), PatKind::Array(rhs)) => Ok(lhs.len() == rhs.len()),
            (lhs, rhs) => Err(CheckError::ShapeMismatch {
                expected: self.kind_width(lhs),
                found: self.kind_width(rhs),
            }),
        }
    }

    pub(crate) fn kind_width(&self, kind: &PatKind) -> usize {
        match kind {
            PatKind::Wild | PatKind::Const(_) => 0,
            PatKind::Tuple(args) | PatKind::Ctor(_, args) | PatKind::Array(args) => args.len(),
            PatKind::Variant { arg, .. } => usize::from(arg.is_some()),
            PatKind::Record(fields) => fields.len(),
            PatKind::Alias(..) | PatKind::Or(..) => 0,
        }
    }

    /// The sub-patterns a row head contributes when specialised against the
    /// discriminator. Wildcard heads contribute the discriminator's own
    /// argument positions; record heads are reconciled to the full field
    /// set of their type.
    pub(crate) fn simple_match_args(&mut self, discr: PatId, head: PatId) -> Result<Vec<PatId>> {
        let head = self.unalias(head);
        let Pat { kind, ty, .. } = self.get_pat(head).clone();

        match kind {
            PatKind::Wild => Ok(self.discr_args(discr)),
            PatKind::Const(_) => Ok(vec![]),
            PatKind::Tuple(args) | PatKind::Ctor(_, args) | PatKind::Array(args) => Ok(args),
            PatKind::Variant { arg, .. } => Ok(arg.into_iter().collect()),
            PatKind::Record(fields) => self.record_args(&fields, ty),
            PatKind::Or(..) => Err(CheckError::UnresolvedOr),
            PatKind::Alias(..) => unreachable!("unalias left an alias behind"),
        }
    }

    /// Rebuild the discriminator's shape around freshly computed
    /// sub-patterns, returning the rebuilt pattern followed by whatever of
    /// `args` it did not consume. This is the inverse of specialisation and
    /// is used when assembling witnesses.
    pub(crate) fn set_args(&mut self, discr: PatId, mut args: Vec<PatId>) -> Vec<PatId> {
        let Pat { kind, ty, .. } = self.get_pat(discr).clone();
        let arity = self.discr_args(discr).len();
        let rest = args.split_off(arity);

        let kind = match kind {
            PatKind::Wild | PatKind::Const(_) => {
                let mut out = vec![discr];
                out.extend(rest);
                return out;
            }
            PatKind::Tuple(_) => PatKind::Tuple(args),
            PatKind::Ctor(desc, _) => PatKind::Ctor(desc, args),
            PatKind::Variant { label, arg } => {
                PatKind::Variant { label, arg: arg.map(|_| args[0]) }
            }
            PatKind::Record(fields) => {
                PatKind::Record(fields.into_iter().map(|(index, _)| index).zip(args).collect())
            }
            PatKind::Array(_) => PatKind::Array(args),
            PatKind::Alias(..) | PatKind::Or(..) => {
                unreachable!("discriminator is not normalised")
            }
        };

        let built = self.make_pat(Pat::generated(kind, ty));
        let mut out = Vec::with_capacity(1 + rest.len());
        out.push(built);
        out.extend(rest);
        out
    }

    /// Pick the pattern the matrix is split on for its first column. Tuple
    /// and record columns always split on the full shape of the column
    /// type; otherwise the first concrete head decides, and an all-wildcard
    /// column yields a wildcard.
    pub(crate) fn pick_discriminator(&mut self, ty: TyId, matrix: &Matrix) -> Result<PatId> {
        if let Some(full) = self.full_shape_of(ty) {
            return Ok(full);
        }

        let mut concrete = None;
        for head in matrix.heads() {
            if !matches!(self.get_pat(head).kind, PatKind::Wild) {
                concrete = Some(head);
                break;
            }
        }

        match concrete {
            Some(head) => self.normalize_head(head),
            None => Ok(self.wildcard(ty)),
        }
    }

    /// This computes `S(discr, matrix)`: the rows whose head can stand for
    /// the discriminator, with their heads replaced by sub-patterns.
    pub(crate) fn specialize(&mut self, discr: PatId, matrix: &Matrix) -> Result<Matrix> {
        let mut specialized = Matrix::empty();

        for row in &matrix.rows {
            if let Some(new_row) = self.specialize_row(discr, row)? {
                self.push_row(&mut specialized, new_row);
            }
        }

        Ok(specialized)
    }

    /// Split the matrix into one specialised sub-matrix per distinct head
    /// constructor of its first column, in first-seen order. Wildcard rows
    /// contribute to every group. A tuple or record discriminator seeds a
    /// single group which then holds every row, so those columns always
    /// split one way.
    pub(crate) fn specialize_all(
        &mut self,
        discr: PatId,
        matrix: &Matrix,
    ) -> Result<Vec<(PatId, Matrix)>> {
        let mut groups: Vec<(PatId, Matrix)> = Vec::new();

        if matches!(self.get_pat(discr).kind, PatKind::Tuple(_) | PatKind::Record(_)) {
            groups.push((discr, Matrix::empty()));
        }

        // concrete heads find (or start) their groups first
        for row in &matrix.rows {
            let head = row.head();
            if matches!(self.get_pat(head).kind, PatKind::Wild) {
                continue;
            }

            let mut target = None;
            for (index, (group_discr, _)) in groups.iter().enumerate() {
                if self.simple_match(*group_discr, head)? {
                    target = Some(index);
                    break;
                }
            }

            match target {
                Some(index) => {
                    let args = self.simple_match_args(groups[index].0, head)?;
                    let new_row = row.replace_head(args);
                    self.push_row(&mut groups[index].1, new_row);
                }
                None => {
                    let group_discr = self.normalize_head(head)?;
                    let args = self.simple_match_args(group_discr, head)?;
                    let mut group = Matrix::empty();
                    self.push_row(&mut group, row.replace_head(args));
                    groups.push((group_discr, group));
                }
            }
        }

        // then wildcard rows land in every group, including the ones first
        // seen below them
        for row in &matrix.rows {
            let head = row.head();
            if !matches!(self.get_pat(head).kind, PatKind::Wild) {
                continue;
            }

            for index in 0..groups.len() {
                let args = self.simple_match_args(groups[index].0, head)?;
                let new_row = row.replace_head(args);
                self.push_row(&mut groups[index].1, new_row);
            }
        }

        Ok(groups)
    }

    /// This computes `D(matrix)`: the rows that place no constraint on the
    /// first column, with that column removed.
    pub(crate) fn default_matrix(&self, matrix: &Matrix) -> Matrix {
        let mut default = Matrix::empty();

        for row in &matrix.rows {
            if matches!(self.get_pat(row.head()).kind, PatKind::Wild) {
                self.push_row(&mut default, PatStack::from_slice(row.tail()));
            }
        }

        default
    }
}
