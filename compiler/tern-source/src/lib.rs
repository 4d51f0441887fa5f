//! Tern compiler source location and identifier definitions. These are the
//! pieces of source information that survive all the way into the later
//! stages of the pipeline, where diagnostics need to point back at the
//! program text that produced them.

pub mod identifier;
pub mod location;

pub use identifier::Identifier;
pub use location::Span;
