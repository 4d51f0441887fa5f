//! The Tern type model that the later stages of the compiler consume. This
//! crate deliberately only describes the *shape* of types: which constructors
//! a data type declares, how wide a tuple is, which labels a polymorphic
//! variant row has seen, and so on. Anything that needs unification or
//! inference happens before values of these types are ever created.

pub mod row;
pub mod store;
pub mod ty;

pub use row::{RowField, RowFieldStatus, VariantRow};
pub use store::{CommonTys, HasTyStore, RowId, TyId, TyStore};
pub use ty::{CtorDef, CtorDesc, CtorTag, DataCtors, DataTy, ExtTag, FieldDef, IntWidth, RecordTy, Ty};
