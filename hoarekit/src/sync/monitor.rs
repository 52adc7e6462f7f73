use std::{
    cell::UnsafeCell,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    thread::ThreadId,
};

use parking_lot::Mutex;

use super::{
    call::MonitorCall,
    condition::Condition,
    gate::{Gate, GateState},
};
use crate::threading::{current_thread_id, ThreadNames};

static ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a [`Monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorId(u64);

impl MonitorId {
    fn next() -> Self {
        Self(ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything guarded by the monitor's lock: the occupancy and the state of
/// every gate. The gates' condvars live next to it in [`Monitor`].
struct State {
    occupant: Option<ThreadId>,
    entry: GateState,
    urgent: GateState,
    queues: Vec<GateState>,
}

/// Factory handed to the initializer of [`Monitor::new`], used to create the
/// monitor's condition queues before the monitor is shared.
pub struct Conditions<'a> {
    monitor: MonitorId,
    queues: &'a mut Vec<Gate>,
}

impl Conditions<'_> {
    /// Create a new condition queue bound to the monitor under construction.
    pub fn create_condition(&mut self) -> Condition {
        self.queues.push(Gate::new());
        Condition::new(self.monitor, self.queues.len() - 1)
    }
}

/// Hoare-style monitor with "urgent wait" signal semantics.
///
/// A monitor is a mutual-exclusion region around client state `T`, plus any
/// number of condition queues. Only one thread at a time occupies the monitor;
/// a thread becomes the occupant by obtaining a [`MonitorCall`] and stops being
/// it when the call is dropped or while it waits on a condition.
///
/// Unlike a `Mutex`/`Condvar` pair, signalling a condition hands the monitor to
/// the woken thread immediately:
/// <ul>
/// <li>The signaller is parked on the *urgent* gate until the woken thread
///     leaves the monitor or waits again.</li>
/// <li>Whenever the monitor is released, threads parked on the urgent gate are
///     resumed before any thread waiting to enter through the *entry* gate.</li>
/// <li>So the state a signaller established is exactly the state the woken
///     thread observes, and a condition checked with `if` instead of `while`
///     stays true after `wait` returns.</li>
/// </ul>
///
/// All gates and the occupancy are guarded by a single `parking_lot` mutex.
/// The monitor is not reentrant.
///
/// Misuse is not reported through return values. Operating the monitor from a
/// thread that does not occupy it, using a condition of another monitor,
/// re-entering an occupied monitor or dropping a monitor that is occupied or
/// still has waiters aborts the process.
pub struct Monitor<T> {
    id: MonitorId,
    name: String,
    state: Mutex<State>,
    entry: Gate,
    urgent: Gate,
    queues: Vec<Gate>,
    names: ThreadNames,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Sync for Monitor<T> {}

impl<T> Monitor<T> {
    /// Create a monitor named `name`. `init` builds the client state and
    /// creates the condition queues it needs.
    pub fn new<F>(name: impl Into<String>, init: F) -> Self
    where
        F: FnOnce(&mut Conditions<'_>) -> T,
    {
        let id = MonitorId::next();
        let mut queues = Vec::new();
        let data = init(&mut Conditions {
            monitor: id,
            queues: &mut queues,
        });
        let name = name.into();
        log::debug!(
            "created monitor '{}' {} with {} condition(s)",
            name,
            id,
            queues.len()
        );
        Self {
            id,
            name,
            state: Mutex::new(State {
                occupant: None,
                entry: GateState::new(true),
                urgent: GateState::new(false),
                queues: queues.iter().map(|_| GateState::new(false)).collect(),
            }),
            entry: Gate::new(),
            urgent: Gate::new(),
            queues,
            names: ThreadNames::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Create a new condition queue. Only possible while the monitor is not
    /// shared yet.
    pub fn create_condition(&mut self) -> Condition {
        self.state.get_mut().queues.push(GateState::new(false));
        Conditions {
            monitor: self.id,
            queues: &mut self.queues,
        }
        .create_condition()
    }

    /// Mutable access to the client state while the monitor is not shared.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn id(&self) -> MonitorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conditions(&self) -> usize {
        self.queues.len()
    }

    /// Enter the monitor, blocking until it is free.
    ///
    /// The returned call gives access to the client state and leaves the
    /// monitor when dropped.
    pub fn call(&self) -> MonitorCall<'_, T> {
        self.enter();
        MonitorCall::new(self)
    }

    /// Thread currently occupying the monitor. This is a snapshot meant for
    /// diagnostics.
    pub fn occupant(&self) -> Option<ThreadId> {
        self.state.lock().occupant
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant().is_some()
    }

    /// Number of threads blocked trying to enter the monitor.
    pub fn entry_waiters(&self) -> usize {
        self.state.lock().entry.waiters()
    }

    /// Number of signallers waiting to get the monitor back.
    pub fn urgent_waiters(&self) -> usize {
        self.state.lock().urgent.waiters()
    }

    /// Register a debug name for the calling thread in this monitor.
    pub fn register_thread_name(&self, name: impl Into<String>) {
        self.names.register(name);
    }

    /// Register the calling thread as `"{role} {number}"`.
    pub fn register_thread_role(&self, role: &str, number: usize) {
        self.names.register_role(role, number);
    }

    /// Registered name of the calling thread, or `"(unknown)"`.
    pub fn thread_name(&self) -> String {
        self.names.current()
    }

    pub(super) fn data_ptr(&self) -> *mut T {
        self.data.get()
    }

    fn enter(&self) {
        let me = current_thread_id();
        let mut state = self.state.lock();
        if state.occupant == Some(me) {
            drop(state);
            contract_violation!(
                "thread '{}' tried to re-enter monitor '{}' it already occupies",
                self.thread_name(),
                self.name
            );
        }
        self.entry.wait(&mut state, |state: &mut State| &mut state.entry);
        assert!(
            state.occupant.is_none(),
            "entry gate admitted a thread into an occupied monitor"
        );
        state.occupant = Some(me);
        log::trace!("{}: entered monitor '{}'", self.thread_name(), self.name);
    }

    pub(super) fn leave(&self) {
        let mut state = self.state.lock();
        self.check_occupant(&state, "leave");
        state.occupant = None;
        log::trace!("{}: left monitor '{}'", self.thread_name(), self.name);
        self.admit_next(&mut state);
    }

    pub(super) fn wait(&self, condition: Condition) {
        let index = self.queue(condition);
        let me = current_thread_id();
        let mut state = self.state.lock();
        self.check_occupant(&state, "wait");
        self.admit_next(&mut state);
        state.occupant = None;
        log::trace!(
            "{}: waiting on condition {} of monitor '{}'",
            self.thread_name(),
            condition.index(),
            self.name
        );
        self.queues[index].wait(&mut state, |state: &mut State| &mut state.queues[index]);
        // the signaller keeps the monitor occupied while handing it over
        assert!(
            state.occupant.is_some(),
            "condition waiter resumed in a monitor nobody handed over"
        );
        state.occupant = Some(me);
        log::trace!(
            "{}: resumed from condition {} of monitor '{}'",
            self.thread_name(),
            condition.index(),
            self.name
        );
    }

    pub(super) fn signal(&self, condition: Condition) {
        let index = self.queue(condition);
        let me = current_thread_id();
        let mut state = self.state.lock();
        self.check_occupant(&state, "signal");
        if state.queues[index].waiters() == 0 {
            log::trace!(
                "{}: signalled empty condition {} of monitor '{}'",
                self.thread_name(),
                condition.index(),
                self.name
            );
            return;
        }
        self.queues[index].signal(&mut state.queues[index]);
        log::trace!(
            "{}: signalled condition {} of monitor '{}', waiting as urgent",
            self.thread_name(),
            condition.index(),
            self.name
        );
        self.urgent.wait(&mut state, |state: &mut State| &mut state.urgent);
        assert!(
            state.occupant.is_none(),
            "urgent gate admitted a signaller into an occupied monitor"
        );
        state.occupant = Some(me);
        log::trace!(
            "{}: resumed after signal in monitor '{}'",
            self.thread_name(),
            self.name
        );
    }

    pub(super) fn waiters(&self, condition: Condition) -> usize {
        let index = self.queue(condition);
        let state = self.state.lock();
        self.check_occupant(&state, "query");
        state.queues[index].waiters()
    }

    /// Admission policy: a parked signaller takes precedence over threads
    /// waiting to enter.
    fn admit_next(&self, state: &mut State) {
        if state.urgent.waiters() > 0 {
            self.urgent.signal(&mut state.urgent);
            log::trace!("monitor '{}': resuming urgent waiter", self.name);
        } else if self.entry.signal(&mut state.entry) {
            log::trace!("monitor '{}': admitting entrant", self.name);
        }
    }

    fn check_occupant(&self, state: &State, operation: &str) {
        let me = current_thread_id();
        if state.occupant != Some(me) {
            let occupant = state.occupant;
            contract_violation!(
                "thread '{}' ({:?}) attempted to {} monitor '{}' occupied by {:?}",
                self.thread_name(),
                me,
                operation,
                self.name,
                occupant
            );
        }
    }

    /// Index of `condition`'s gate, checked against this monitor.
    fn queue(&self, condition: Condition) -> usize {
        if condition.monitor_id() != self.id {
            contract_violation!(
                "condition {} of monitor {} used with monitor '{}' {}",
                condition.index(),
                condition.monitor_id(),
                self.name,
                self.id
            );
        }
        if condition.index() >= self.queues.len() {
            contract_violation!(
                "condition index {} out of range for monitor '{}'",
                condition.index(),
                self.name
            );
        }
        condition.index()
    }
}

impl<T> Drop for Monitor<T> {
    fn drop(&mut self) {
        let state = self.state.lock();
        if let Some(occupant) = state.occupant {
            contract_violation!(
                "monitor '{}' dropped while occupied by {:?}",
                self.name,
                occupant
            );
        }
        let entering = state.entry.waiters();
        let urgent = state.urgent.waiters();
        let waiting: usize = state.queues.iter().map(GateState::waiters).sum();
        if entering + urgent + waiting != 0 {
            contract_violation!(
                "monitor '{}' dropped with {} entering, {} urgent and {} condition waiter(s)",
                self.name,
                entering,
                urgent,
                waiting
            );
        }
        log::debug!("dropped monitor '{}' {}", self.name, self.id);
    }
}

impl<T> fmt::Debug for Monitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Monitor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("occupant", &state.occupant)
            .field("entry_open", &state.entry.is_open())
            .field("entering", &state.entry.waiters())
            .field("urgent", &state.urgent.waiters())
            .field(
                "waiting",
                &state
                    .queues
                    .iter()
                    .map(GateState::waiters)
                    .collect::<Vec<_>>(),
            )
            .field("named_threads", &self.names.len())
            .finish()
    }
}
