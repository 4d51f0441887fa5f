//! Definitions of the Tern type shapes. Pattern analysis only ever asks
//! structural questions of a type: what are the constructors, how many of
//! them take arguments, what are the field types. The [Ty] representation
//! here answers exactly those questions and nothing more.
use tern_source::identifier::Identifier;

use crate::store::{RowId, TyId};

/// The width of a primitive integer type. All integer constants are stored
/// as an `i64` payload regardless of width, the width only participates in
/// constant identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// The default platform integer.
    Int,
    I32,
    I64,
    /// Native-width integer, distinct from `Int` for historical reasons.
    Native,
}

/// A Tern type, as seen by pattern analysis.
#[derive(Debug, Clone)]
pub enum Ty {
    /// Primitive integers of the given width. Never complete when
    /// enumerating constants.
    Int(IntWidth),

    /// A byte-sized character, and hence complete once all 256 values have
    /// been listed.
    Char,

    /// String literals. Never complete.
    Str,

    /// Float literals, identified by their literal spelling. Never complete.
    Float,

    /// A product of the given member types.
    Tuple(Vec<TyId>),

    /// A nominal record; field identity is the declared position.
    Record(RecordTy),

    /// A nominal sum type.
    Data(DataTy),

    /// A polymorphic variant, described by its row.
    Variant(RowId),

    /// Arrays of the element type. Every length is a distinct shape, so the
    /// type is never complete.
    Array(TyId),

    /// A type the analysis knows nothing about. Used for the witness
    /// wildcards that are produced when no column type is in scope.
    Unknown,
}

/// A record type: a named, fixed sequence of field definitions.
#[derive(Debug, Clone)]
pub struct RecordTy {
    pub name: Identifier,
    pub fields: Vec<FieldDef>,
}

/// A single field of a [RecordTy].
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Identifier,
    pub ty: TyId,
}

/// A data (sum) type declaration.
#[derive(Debug, Clone)]
pub struct DataTy {
    pub name: Identifier,
    pub ctors: DataCtors,
}

/// The constructor population of a [DataTy].
#[derive(Debug, Clone)]
pub enum DataCtors {
    /// A closed declaration: exactly these constructors, in declaration
    /// order. Completeness is decided by counting.
    Defined(Vec<CtorDef>),

    /// An extensible declaration: new constructors can be added anywhere, so
    /// the population is unbounded and matching over it is never complete.
    Extensible,
}

/// A declared constructor of a closed data type.
#[derive(Debug, Clone)]
pub struct CtorDef {
    pub name: Identifier,
    pub args: Vec<TyId>,
}

impl CtorDef {
    /// Make a constructor which holds no data.
    pub fn unit(name: impl Into<Identifier>) -> Self {
        Self { name: name.into(), args: Vec::new() }
    }

    /// Make a constructor holding the given argument types.
    pub fn new(name: impl Into<Identifier>, args: Vec<TyId>) -> Self {
        Self { name: name.into(), args }
    }
}

/// The identity of an extensible constructor. Two extension constructors are
/// the same constructor iff their [ExtTag]s are equal; names are for display
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtTag(pub u32);

/// The runtime tag of a constructor. Constant (nullary) and block (carrying)
/// constructors are numbered independently, which is what the completeness
/// arithmetic counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtorTag {
    /// The n-th constant constructor of its type.
    Const(u32),
    /// The n-th block constructor of its type.
    Block(u32),
    /// An extensible constructor, identified rather than numbered.
    Extension(ExtTag),
}

/// Everything a constructor pattern needs to know about its constructor. The
/// total constant/block counts of the parent type ride along so that
/// completeness checks need no further type lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtorDesc {
    pub name: Identifier,
    pub tag: CtorTag,
    pub arity: u32,
    /// How many constant constructors the parent type declares.
    pub consts: u32,
    /// How many block constructors the parent type declares.
    pub blocks: u32,
}

impl CtorDesc {
    /// Whether this constructor lives in an open, extensible population
    /// rather than the counted space that `consts`/`blocks` describe.
    pub fn is_extension(&self) -> bool {
        matches!(self.tag, CtorTag::Extension(_))
    }
}
