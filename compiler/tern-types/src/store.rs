//! Stores [Ty]s and [VariantRow]s behind copyable ids.
use std::cell::Cell;

use tern_utils::index_vec::{define_index_type, IndexVec};

use crate::{
    row::VariantRow,
    ty::{CtorDesc, CtorTag, DataCtors, ExtTag, FieldDef, IntWidth, Ty},
};

define_index_type! {
    /// Id of a [Ty] in the [TyStore].
    pub struct TyId = u32;

    MAX_INDEX = u32::max_value() as usize;
    DISABLE_MAX_INDEX_CHECK = cfg!(not(debug_assertions));
}

define_index_type! {
    /// Id of a [VariantRow] in the [TyStore].
    pub struct RowId = u32;

    MAX_INDEX = u32::max_value() as usize;
    DISABLE_MAX_INDEX_CHECK = cfg!(not(debug_assertions));
}

/// Types that get used all over the place, pre-interned so that nobody needs
/// mutable access to the store just to name `int`.
#[derive(Debug, Clone, Copy)]
pub struct CommonTys {
    pub unknown: TyId,
    pub int: TyId,
    pub char: TyId,
    pub str: TyId,
    pub float: TyId,
}

/// Access to the ambient [TyStore]. Analysis stages thread their environment
/// through this trait rather than holding the store directly.
pub trait HasTyStore {
    fn tys(&self) -> &TyStore;
}

/// The store of every type shape in the current compilation unit. The store
/// is built up by the type checker; pattern analysis only reads it, except
/// for the two interior-mutable bits: closing variant rows and minting fresh
/// extension tags.
#[derive(Debug)]
pub struct TyStore {
    tys: IndexVec<TyId, Ty>,
    rows: IndexVec<RowId, VariantRow>,
    ext_counter: Cell<u32>,
    pub common: CommonTys,
}

impl Default for TyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TyStore {
    pub fn new() -> Self {
        let mut tys = IndexVec::new();
        let common = CommonTys {
            unknown: tys.push(Ty::Unknown),
            int: tys.push(Ty::Int(IntWidth::Int)),
            char: tys.push(Ty::Char),
            str: tys.push(Ty::Str),
            float: tys.push(Ty::Float),
        };

        Self { tys, rows: IndexVec::new(), ext_counter: Cell::new(0), common }
    }

    pub fn create(&mut self, ty: Ty) -> TyId {
        self.tys.push(ty)
    }

    pub fn create_row(&mut self, row: VariantRow) -> RowId {
        self.rows.push(row)
    }

    pub fn get(&self, id: TyId) -> &Ty {
        &self.tys[id]
    }

    pub fn row(&self, id: RowId) -> &VariantRow {
        &self.rows[id]
    }

    /// Close the given row. Idempotent; see [VariantRow::close].
    pub fn close_row(&self, id: RowId) {
        self.rows[id].close();
    }

    /// Mint an [ExtTag] distinct from every tag handed out before, for
    /// synthesising the hypothetical "one more" extensible constructor.
    pub fn fresh_extension(&self) -> ExtTag {
        let next = self.ext_counter.get();
        self.ext_counter.set(next + 1);
        ExtTag(next)
    }

    /// The declared constructors of a closed data type, described in tag
    /// order. `None` for extensible data types and non-data types.
    pub fn ctor_descs(&self, id: TyId) -> Option<Vec<CtorDesc>> {
        let Ty::Data(data) = self.get(id) else { return None };
        let DataCtors::Defined(ctors) = &data.ctors else { return None };

        let consts = ctors.iter().filter(|ctor| ctor.args.is_empty()).count() as u32;
        let blocks = ctors.len() as u32 - consts;

        let (mut next_const, mut next_block) = (0, 0);
        let descs = ctors
            .iter()
            .map(|ctor| {
                let tag = if ctor.args.is_empty() {
                    let tag = CtorTag::Const(next_const);
                    next_const += 1;
                    tag
                } else {
                    let tag = CtorTag::Block(next_block);
                    next_block += 1;
                    tag
                };

                CtorDesc { name: ctor.name, tag, arity: ctor.args.len() as u32, consts, blocks }
            })
            .collect();

        Some(descs)
    }

    /// Look up a constructor of `id` by tag.
    pub fn ctor_by_tag(&self, id: TyId, tag: CtorTag) -> Option<CtorDesc> {
        self.ctor_descs(id)?.into_iter().find(|desc| desc.tag == tag)
    }

    /// Look up a constructor of `id` by name. Mostly a convenience for the
    /// stages that build patterns from resolved names.
    pub fn ctor_named(&self, id: TyId, name: impl Into<tern_source::Identifier>) -> Option<CtorDesc> {
        let name = name.into();
        self.ctor_descs(id)?.into_iter().find(|desc| desc.name == name)
    }

    /// The argument types of the constructor of `id` with the given tag.
    pub fn ctor_args(&self, id: TyId, tag: CtorTag) -> Option<Vec<TyId>> {
        let Ty::Data(data) = self.get(id) else { return None };
        let DataCtors::Defined(ctors) = &data.ctors else { return None };

        let descs = self.ctor_descs(id)?;
        let index = descs.iter().position(|desc| desc.tag == tag)?;
        Some(ctors[index].args.clone())
    }

    /// The field layout of a record type.
    pub fn record_fields(&self, id: TyId) -> Option<&[FieldDef]> {
        match self.get(id) {
            Ty::Record(record) => Some(&record.fields),
            _ => None,
        }
    }

    /// The member types of a tuple type.
    pub fn tuple_tys(&self, id: TyId) -> Option<&[TyId]> {
        match self.get(id) {
            Ty::Tuple(members) => Some(members),
            _ => None,
        }
    }

    /// The element type of an array type.
    pub fn array_elem(&self, id: TyId) -> Option<TyId> {
        match self.get(id) {
            Ty::Array(elem) => Some(*elem),
            _ => None,
        }
    }

    /// The row behind a variant type.
    pub fn variant_row(&self, id: TyId) -> Option<RowId> {
        match self.get(id) {
            Ty::Variant(row) => Some(*row),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use tern_source::Identifier;

    use super::*;
    use crate::ty::{CtorDef, DataTy};

    #[test]
    fn ctor_tags_number_consts_and_blocks_independently() {
        let mut store = TyStore::new();
        let int = store.common.int;
        let ty = store.create(Ty::Data(DataTy {
            name: "shape".into(),
            ctors: DataCtors::Defined(vec![
                CtorDef::unit("Point"),
                CtorDef::new("Circle", vec![int]),
                CtorDef::unit("Empty"),
                CtorDef::new("Rect", vec![int, int]),
            ]),
        }));

        let descs = store.ctor_descs(ty).unwrap();
        assert_eq!(descs.len(), 4);
        assert_eq!(descs[0].tag, CtorTag::Const(0));
        assert_eq!(descs[1].tag, CtorTag::Block(0));
        assert_eq!(descs[2].tag, CtorTag::Const(1));
        assert_eq!(descs[3].tag, CtorTag::Block(1));

        for desc in &descs {
            assert_eq!(desc.consts, 2);
            assert_eq!(desc.blocks, 2);
        }

        assert_eq!(store.ctor_named(ty, "Rect").unwrap().arity, 2);
        assert_eq!(
            store.ctor_args(ty, CtorTag::Block(1)).unwrap(),
            vec![int, int],
        );
        assert_eq!(store.ctor_named(ty, Identifier::from("Missing")), None);
    }

    #[test]
    fn fresh_extensions_are_distinct() {
        let store = TyStore::new();
        assert_ne!(store.fresh_extension(), store.fresh_extension());
    }
}
