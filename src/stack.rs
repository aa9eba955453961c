//! Stack growth for deeply nested rule applications.
//!
//! Every [`Rule::apply`](crate::Rule::apply) recurses natively. The depth guard
//! bounds that recursion, but the cap is configurable, so `apply` runs its
//! body through [`ensure_sufficient_stack`] to keep large caps from
//! overflowing the thread's stack.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 64 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
