//! Classic Hoare monitors for OS threads.
//!
//! ```
//! use hoarekit::{Condition, MonitorRef};
//!
//! struct Slot {
//!     value: Option<u32>,
//!     filled: Condition,
//! }
//!
//! let slot = MonitorRef::create("slot", |conditions| Slot {
//!     value: None,
//!     filled: conditions.create_condition(),
//! });
//!
//! let consumer = {
//!     let slot = slot.clone();
//!     std::thread::spawn(move || {
//!         let mut call = slot.call();
//!         if call.value.is_none() {
//!             call.filled.wait(&mut call);
//!         }
//!         // with urgent-wait semantics the value is still there
//!         call.value.take().unwrap()
//!     })
//! };
//!
//! {
//!     let mut call = slot.call();
//!     call.value = Some(42);
//!     call.filled.signal(&mut call);
//! }
//! assert_eq!(consumer.join().unwrap(), 42);
//! ```
#[macro_use]
mod macros;

pub mod sync;
pub mod threading;

pub use sync::{Condition, Conditions, Monitor, MonitorCall, MonitorId, MonitorRef};
