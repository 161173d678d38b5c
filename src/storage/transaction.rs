//! Staged copy-on-write transactions for the in-memory backends
//!
//! A [`Transaction`] holds the store's write lock for its whole lifetime
//! and mutates a private copy of the state. [`Transaction::commit`] swaps
//! the copy in; dropping the transaction without committing discards it.

use parking_lot::{RwLock, RwLockWriteGuard};

/// All-or-nothing mutation scope over `T`
pub struct Transaction<'a, T: Clone> {
    guard: RwLockWriteGuard<'a, T>,
    staged: T,
}

impl<'a, T: Clone> Transaction<'a, T> {
    /// Lock `state` and stage a copy of it
    pub fn begin(state: &'a RwLock<T>) -> Self {
        let guard = state.write();
        let staged = guard.clone();
        Self { guard, staged }
    }

    /// Staged state
    pub fn staged(&mut self) -> &mut T {
        &mut self.staged
    }

    /// Publish the staged state
    pub fn commit(mut self) {
        *self.guard = self.staged;
    }
}
