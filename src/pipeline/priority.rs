//! Hook ordering.
//!
//! Within a phase, hooks run in ascending priority. Hooks with equal
//! priority run in the order they were registered.

/// Position of a hook within its phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Priority(pub i32);

impl Priority {
    /// Runs before every other hook in the phase.
    pub const FIRST: Priority = Priority(i32::MIN);
    /// Runs after every other hook in the phase.
    pub const LAST: Priority = Priority(i32::MAX);
    pub const DEFAULT: Priority = Priority(0);
}

/// A hook tagged with its priority and registration sequence.
pub(crate) struct Ordered<H: ?Sized> {
    pub priority: Priority,
    pub seq: usize,
    pub hook: std::sync::Arc<H>,
}

/// Sort hooks into execution order.
pub(crate) fn sort<H: ?Sized>(hooks: &mut [Ordered<H>]) {
    hooks.sort_by_key(|h| (h.priority, h.seq));
}
