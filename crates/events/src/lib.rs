//! Change notifications and their in-process fan-out.

pub mod bus;
pub mod change;
pub mod in_memory_bus;

pub use bus::{BusError, ChangeBus, Delivery, Subscription};
pub use change::Change;
pub use in_memory_bus::{DEFAULT_SUBSCRIBER_CAPACITY, InMemoryChangeBus};
