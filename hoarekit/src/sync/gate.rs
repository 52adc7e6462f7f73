use parking_lot::{Condvar, MutexGuard};

/// Open flag and waiter count of a [`Gate`].
///
/// The state lives inside the data of the mutex the gate is paired with, so it
/// can only be read or changed while that mutex is held.
#[derive(Debug)]
pub struct GateState {
    open: bool,
    waiters: usize,
}

impl GateState {
    pub const fn new(open: bool) -> Self {
        Self { open, waiters: 0 }
    }

    /// Number of threads currently blocked in [`Gate::wait`].
    pub fn waiters(&self) -> usize {
        self.waiters
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// A two-state (open/closed) blocking gate with explicit waiter accounting.
///
/// This is a binary semaphore whose single permit is handed off: [`signal`](Gate::signal)
/// opens the gate and wakes one waiter, which closes the gate again on its way
/// out of [`wait`](Gate::wait). When nobody is waiting the gate simply stays open and the
/// next thread calling `wait` passes straight through.
///
/// A gate only owns the condvar. Its [`GateState`] is stored in the data of the
/// mutex the gate is paired with, and `wait` projects it out of the guard.
pub struct Gate {
    cvar: Condvar,
}

impl Gate {
    pub const fn new() -> Self {
        Self {
            cvar: Condvar::new(),
        }
    }

    /// Pass the gate, blocking while it is closed. `state` selects this gate's
    /// state inside the locked data.
    ///
    /// `lock` is released while blocked and re-acquired before returning. The
    /// gate is always closed when this returns.
    pub fn wait<S, F>(&self, lock: &mut MutexGuard<'_, S>, state: F)
    where
        F: Fn(&mut S) -> &mut GateState,
    {
        state(&mut **lock).waiters += 1;
        while !state(&mut **lock).open {
            self.cvar.wait(lock);
        }
        let gate = state(&mut **lock);
        gate.waiters -= 1;
        gate.open = false;
    }

    /// Open the gate. Returns `true` if a waiter was woken to consume it,
    /// `false` if the gate was left open for a future waiter.
    pub fn signal(&self, state: &mut GateState) -> bool {
        state.open = true;
        if state.waiters > 0 {
            self.cvar.notify_one();
            true
        } else {
            false
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
