use std::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use super::{
    condition::Condition,
    monitor::{Conditions, Monitor},
};

/// A scoped call into a [`Monitor`].
///
/// Creating a call enters the monitor and dropping it leaves the monitor, on
/// every exit path including early returns and unwinding. While the call is
/// alive the calling thread occupies the monitor and can reach the client state
/// through `Deref`/`DerefMut`.
///
/// `wait` and `signal` take `&mut self`: the monitor may be handed to another
/// thread while they block, so no borrow of the client state may live across
/// them.
///
/// A call is bound to the thread that entered the monitor and cannot be sent
/// to another thread.
pub struct MonitorCall<'a, T> {
    monitor: &'a Monitor<T>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, T> MonitorCall<'a, T> {
    /// The calling thread must have just entered `monitor`.
    pub(super) fn new(monitor: &'a Monitor<T>) -> Self {
        Self {
            monitor,
            _not_send: PhantomData,
        }
    }

    pub fn monitor(&self) -> &'a Monitor<T> {
        self.monitor
    }

    /// Block on `condition` until signalled. See [`Condition::wait`].
    pub fn wait(&mut self, condition: Condition) {
        self.monitor.wait(condition);
    }

    /// Signal `condition` with urgent-wait semantics. See [`Condition::signal`].
    pub fn signal(&mut self, condition: Condition) {
        self.monitor.signal(condition);
    }

    pub fn waiters(&self, condition: Condition) -> usize {
        self.monitor.waiters(condition)
    }

    pub fn is_empty(&self, condition: Condition) -> bool {
        self.waiters(condition) == 0
    }
}

impl<T> Deref for MonitorCall<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: the calling thread occupies the monitor for as long as this
        // call exists, except inside `wait`/`signal`, which borrow the call
        // mutably and so cannot overlap with this borrow.
        unsafe { &*self.monitor.data_ptr() }
    }
}

impl<T> DerefMut for MonitorCall<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: see `deref`.
        unsafe { &mut *self.monitor.data_ptr() }
    }
}

impl<T> Drop for MonitorCall<'_, T> {
    fn drop(&mut self) {
        self.monitor.leave();
    }
}

impl<T: fmt::Debug> fmt::Debug for MonitorCall<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorCall")
            .field("monitor", &self.monitor.name())
            .field("state", &**self)
            .finish()
    }
}

/// Shared handle to a [`Monitor`].
///
/// All threads working with a monitor hold a `MonitorRef` to it. The monitor
/// is dropped when the last handle goes away; since every [`MonitorCall`]
/// borrows a handle, that can never happen while a thread is inside it.
pub struct MonitorRef<T> {
    monitor: Arc<Monitor<T>>,
}

impl<T> MonitorRef<T> {
    pub fn new(monitor: Monitor<T>) -> Self {
        Self {
            monitor: Arc::new(monitor),
        }
    }

    /// Build a monitor and return a shared handle to it. Takes the same
    /// arguments as [`Monitor::new`].
    pub fn create<F>(name: impl Into<String>, init: F) -> Self
    where
        F: FnOnce(&mut Conditions<'_>) -> T,
    {
        Self::new(Monitor::new(name, init))
    }

    /// Enter the monitor. See [`Monitor::call`].
    pub fn call(&self) -> MonitorCall<'_, T> {
        self.monitor.call()
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.monitor, &other.monitor)
    }

    /// Number of handles sharing this monitor.
    pub fn handle_count(this: &Self) -> usize {
        Arc::strong_count(&this.monitor)
    }
}

impl<T> Clone for MonitorRef<T> {
    fn clone(&self) -> Self {
        Self {
            monitor: self.monitor.clone(),
        }
    }
}

impl<T> Deref for MonitorRef<T> {
    type Target = Monitor<T>;

    fn deref(&self) -> &Self::Target {
        &self.monitor
    }
}

impl<T> From<Monitor<T>> for MonitorRef<T> {
    fn from(monitor: Monitor<T>) -> Self {
        Self::new(monitor)
    }
}

impl<T> fmt::Debug for MonitorRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.monitor, f)
    }
}
