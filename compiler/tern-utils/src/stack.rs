//! Utilities for dealing with deeply recursive operations that might
//! otherwise overflow the stack, e.g. when walking deeply nested pattern
//! trees.

/// The amount of stack that must remain free before we commit to a further
/// level of recursion.
const RED_ZONE: usize = 100 * 1024;

/// The size of each new stack segment that is allocated when the red zone is
/// hit.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run the given closure, growing the stack if the remaining space has
/// dropped below [`RED_ZONE`]. Recursive algorithms should call this at every
/// level of recursion that can be driven by user input.
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
