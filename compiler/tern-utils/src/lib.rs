//! Tern compiler general utilities

pub mod printing;
pub mod stack;

// Re-export commonly used vector packages
pub use index_vec;
pub use itertools;
// Re-export logging utility
pub use log;
pub use smallvec;
