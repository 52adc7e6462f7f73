//! Thread identity helpers used for diagnostics.
//!
//! Nothing in here takes part in synchronization: the registry has its own lock
//! and the monitor only consults it to make log lines readable.

use std::{
    collections::HashMap,
    thread::{self, ThreadId},
};

use parking_lot::Mutex;

/// Name reported for threads that never registered one.
pub const UNKNOWN_THREAD: &str = "(unknown)";

pub fn current_thread_id() -> ThreadId {
    thread::current().id()
}

/// Registry of human-readable thread names, keyed by thread identity.
#[derive(Default)]
pub struct ThreadNames {
    names: Mutex<HashMap<ThreadId, String>>,
}

impl ThreadNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` for the calling thread.
    ///
    /// A thread can be registered only once; registering it again is a
    /// contract violation and aborts the process.
    pub fn register(&self, name: impl Into<String>) {
        let name = name.into();
        let id = current_thread_id();
        let mut names = self.names.lock();
        if let Some(existing) = names.get(&id) {
            let existing = existing.clone();
            drop(names);
            contract_violation!(
                "thread {:?} is already registered as '{}', cannot register it as '{}'",
                id,
                existing,
                name
            );
        }
        log::trace!("registered thread {:?} as '{}'", id, name);
        names.insert(id, name);
    }

    /// Register the calling thread as `"{role} {number}"`.
    pub fn register_role(&self, role: &str, number: usize) {
        self.register(format!("{role} {number}"));
    }

    /// Name of the calling thread, or [`UNKNOWN_THREAD`].
    pub fn current(&self) -> String {
        self.name_of(current_thread_id())
            .unwrap_or_else(|| UNKNOWN_THREAD.to_string())
    }

    pub(crate) fn name_of(&self, id: ThreadId) -> Option<String> {
        self.names.lock().get(&id).cloned()
    }

    /// Number of registered threads.
    pub(crate) fn len(&self) -> usize {
        self.names.lock().len()
    }
}
