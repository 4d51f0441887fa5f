//! Definitions of the pattern representation that the analysis runs on. The
//! desugaring stages hand the checker a fully resolved [Pat] tree: names are
//! interned, constructors carry their [CtorDesc], record fields are keyed by
//! declared position, and guard expressions have been reduced to a flag on
//! the [MatchArm]. Everything in here is shape; no pattern ever refers back
//! to syntax other than through its [Span].
use tern_source::{identifier::Identifier, location::Span};
use tern_types::{CtorDesc, IntWidth, TyId};

use crate::{
    diagnostics::{CheckError, Result},
    storage::PatId,
    ExhaustivenessChecker, ExhaustivenessEnv,
};

/// Where a pattern came from. Desugaring synthesises patterns (e.g. when it
/// expands tuple bindings into or-patterns), and the analysis itself
/// synthesises wildcards, discriminators and witnesses. Generated or-patterns
/// are deliberately not split apart when reporting unused alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatOrigin {
    /// Written by the user in the source program.
    User,
    /// Synthesised by the compiler.
    Generated,
}

/// A constant literal inside a pattern. Identity is by value within one
/// constant kind; two constants of different kinds never share a column in a
/// well-typed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    /// Integer constants of any width. The width takes part in identity.
    Int(IntWidth, i64),
    /// A byte-sized character.
    Char(u8),
    /// A string literal, interned.
    Str(Identifier),
    /// A float literal, identified by its spelling rather than its value.
    Float(Identifier),
}

impl Constant {
    pub fn int(value: i64) -> Self {
        Constant::Int(IntWidth::Int, value)
    }

    /// Whether `self` and `other` are the same kind of constant, i.e. could
    /// legally appear in the same column.
    pub fn same_kind(&self, other: &Constant) -> bool {
        matches!(
            (self, other),
            (Constant::Int(lhs, _), Constant::Int(rhs, _)) if lhs == rhs
        ) || matches!(
            (self, other),
            (Constant::Char(_), Constant::Char(_))
                | (Constant::Str(_), Constant::Str(_))
                | (Constant::Float(_), Constant::Float(_))
        )
    }
}

/// The shape of a [Pat].
#[derive(Debug, Clone)]
pub enum PatKind {
    /// Matches anything. Binding patterns are represented as wildcards too,
    /// since a binding constrains nothing.
    Wild,

    /// A constant literal.
    Const(Constant),

    /// A tuple of sub-patterns, one per member.
    Tuple(Vec<PatId>),

    /// A constructor application. The [CtorDesc] carries the constructor
    /// population counts of its parent type, and `args` always has exactly
    /// `desc.arity` entries.
    Ctor(CtorDesc, Vec<PatId>),

    /// A polymorphic variant alternative, with its payload pattern if the
    /// alternative carries one. The row lives behind the pattern's type.
    Variant { label: Identifier, arg: Option<PatId> },

    /// A record pattern: `(position, sub-pattern)` pairs for the fields the
    /// source listed. Unlisted fields match anything.
    Record(Vec<(u32, PatId)>),

    /// An array of a fixed length, matching length first and then the
    /// elements.
    Array(Vec<PatId>),

    /// `p as x`; matches exactly what `p` matches.
    Alias(PatId, Identifier),

    /// `p | q`, in source order.
    Or(PatId, PatId),
}

/// A pattern: a shape, the type it matches against, and its provenance.
#[derive(Debug, Clone)]
pub struct Pat {
    pub kind: PatKind,
    pub ty: TyId,
    pub span: Span,
    pub origin: PatOrigin,
}

impl Pat {
    pub fn new(kind: PatKind, ty: TyId, span: Span) -> Self {
        Self { kind, ty, span, origin: PatOrigin::User }
    }

    /// Make a compiler-synthesised pattern with a dummy span.
    pub fn generated(kind: PatKind, ty: TyId) -> Self {
        Self { kind, ty, span: Span::default(), origin: PatOrigin::Generated }
    }
}

/// One clause of a match expression, as the checker sees it. The guard
/// expression itself stays with the caller; the analysis only needs to know
/// that one exists, since a guard can fail at runtime and therefore removes
/// the clause from every completeness argument.
#[derive(Debug, Clone, Copy)]
pub struct MatchArm {
    pub pat: PatId,
    pub has_guard: bool,
}

impl MatchArm {
    pub fn new(pat: PatId) -> Self {
        Self { pat, has_guard: false }
    }

    pub fn guarded(pat: PatId) -> Self {
        Self { pat, has_guard: true }
    }
}

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Make a fresh wildcard of the given type.
    pub(crate) fn wildcard(&mut self, ty: TyId) -> PatId {
        self.make_pat(Pat::generated(PatKind::Wild, ty))
    }

    /// Make one fresh wildcard per given type.
    pub(crate) fn wildcards(&mut self, tys: &[TyId]) -> Vec<PatId> {
        tys.iter().map(|ty| self.wildcard(*ty)).collect()
    }

    /// Strip aliases until a non-alias pattern is reached.
    pub(crate) fn unalias(&self, pat: PatId) -> PatId {
        let mut current = pat;
        while let PatKind::Alias(inner, _) = &self.get_pat(current).kind {
            current = *inner;
        }

        current
    }

    /// Whether the pattern is effectively a wildcard once aliases are
    /// stripped.
    pub(crate) fn is_wild(&self, pat: PatId) -> bool {
        matches!(self.get_pat(self.unalias(pat)).kind, PatKind::Wild)
    }

    /// Whether the pattern is a variant alternative that no value can carry:
    /// its label is pinned absent, or a closed row never listed it. Such a
    /// pattern has an empty coverage set, which several traversals
    /// short-circuit on.
    pub(crate) fn is_absent_variant(&self, pat: PatId) -> bool {
        let pat = self.unalias(pat);
        let Pat { kind: PatKind::Variant { label, .. }, ty, .. } = self.get_pat(pat) else {
            return false;
        };

        let Some(row_id) = self.env.tys().variant_row(*ty) else { return false };
        let row = self.env.tys().row(row_id);

        match row.field(*label) {
            Some(field) => field.is_absent(),
            None => row.is_closed(),
        }
    }

    /// Collect the non-or leaves of a (possibly aliased) or-pattern tree, in
    /// left-to-right source order. A pattern with no or-nodes yields itself.
    pub(crate) fn flatten_or(&self, pat: PatId) -> Vec<PatId> {
        let mut leaves = Vec::new();
        self.collect_or_leaves(pat, &mut leaves);
        leaves
    }

    fn collect_or_leaves(&self, pat: PatId, leaves: &mut Vec<PatId>) {
        match &self.get_pat(pat).kind {
            PatKind::Alias(inner, _) => self.collect_or_leaves(*inner, leaves),
            PatKind::Or(lhs, rhs) => {
                self.collect_or_leaves(*lhs, leaves);
                self.collect_or_leaves(*rhs, leaves);
            }
            _ => leaves.push(pat),
        }
    }

    /// Reconcile a record pattern's listed fields against the full field
    /// list of its type, producing one sub-pattern per declared field in
    /// declaration order. Unlisted fields become wildcards of the field
    /// type.
    pub(crate) fn record_args(&mut self, fields: &[(u32, PatId)], ty: TyId) -> Result<Vec<PatId>> {
        let layout = self
            .env
            .tys()
            .record_fields(ty)
            .ok_or(CheckError::ShapeMismatch { expected: 0, found: fields.len() })?;

        let mut args: Vec<Option<PatId>> = vec![None; layout.len()];
        for &(index, pat) in fields {
            let slot = args.get_mut(index as usize).ok_or_else(|| CheckError::UnknownTag {
                name: format!("field #{index}"),
            })?;
            *slot = Some(pat);
        }

        let field_tys: Vec<TyId> = layout.iter().map(|field| field.ty).collect();
        Ok(args
            .into_iter()
            .zip(field_tys)
            .map(|(arg, field_ty)| match arg {
                Some(pat) => pat,
                None => self.wildcard(field_ty),
            })
            .collect())
    }

    /// Whether at least one runtime value matches the pattern. Only variant
    /// alternatives can be uninhabited: a label that the row has pinned
    /// [`Absent`], or a label a closed row never saw, matches nothing.
    ///
    /// [`Absent`]: tern_types::RowFieldStatus::Absent
    pub(crate) fn has_instance(&self, pat: PatId) -> bool {
        let pat = self.unalias(pat);
        match &self.get_pat(pat).kind {
            PatKind::Wild | PatKind::Const(_) => true,
            PatKind::Or(lhs, rhs) => self.has_instance(*lhs) || self.has_instance(*rhs),
            PatKind::Tuple(args) | PatKind::Ctor(_, args) | PatKind::Array(args) => {
                args.iter().all(|arg| self.has_instance(*arg))
            }
            PatKind::Record(fields) => fields.iter().all(|(_, field)| self.has_instance(*field)),
            PatKind::Variant { arg, .. } => {
                !self.is_absent_variant(pat) && arg.map_or(true, |arg| self.has_instance(arg))
            }
            PatKind::Alias(..) => unreachable!("unalias left an alias behind"),
        }
    }
}
