//! Hoare monitors.
//!
//! A [`Monitor`] is built from three kinds of [`gate::Gate`]s guarded by one
//! mutex: the *entry* gate admitting new callers, the *urgent* gate where
//! signallers wait to get the monitor back, and one gate per [`Condition`].
//! Callers go through a [`MonitorRef`] and a scoped [`MonitorCall`], so every
//! enter is paired with a leave.
pub mod call;
pub mod condition;
pub mod gate;
pub mod monitor;

pub use call::*;
pub use condition::*;
pub use monitor::*;
