use super::{call::MonitorCall, monitor::MonitorId};

/// A condition queue of a [`Monitor`](super::Monitor) with "urgent wait" signal semantics.
///
/// A `Condition` is a plain handle: the owning monitor's identity plus the
/// index of its gate inside that monitor. It can only be obtained from the
/// monitor's factory ([`Conditions::create_condition`](super::Conditions::create_condition)
/// or [`Monitor::create_condition`](super::Monitor::create_condition)), and
/// using it with any other monitor aborts the process.
///
/// Every operation requires a [`MonitorCall`] on the owning monitor, which
/// proves the calling thread occupies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Condition {
    monitor: MonitorId,
    index: usize,
}

impl Condition {
    pub(super) fn new(monitor: MonitorId, index: usize) -> Self {
        Self { monitor, index }
    }

    pub fn monitor_id(&self) -> MonitorId {
        self.monitor
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Unconditionally block until another occupant signals this condition.
    ///
    /// The monitor is released while blocked. When this returns the calling
    /// thread occupies the monitor again.
    pub fn wait<T>(self, call: &mut MonitorCall<'_, T>) {
        call.wait(self);
    }

    /// Wake one waiter and hand the monitor to it right away.
    ///
    /// The caller is suspended until the woken thread leaves the monitor or
    /// waits again, and then resumes ahead of any thread trying to enter.
    /// Signalling a condition nobody waits on does nothing.
    pub fn signal<T>(self, call: &mut MonitorCall<'_, T>) {
        call.signal(self);
    }

    /// Number of threads currently waiting on this condition.
    pub fn waiters<T>(self, call: &MonitorCall<'_, T>) -> usize {
        call.waiters(self)
    }

    pub fn is_empty<T>(self, call: &MonitorCall<'_, T>) -> bool {
        self.waiters(call) == 0
    }
}
