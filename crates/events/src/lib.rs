//! Domain events and their distribution.
//!
//! Business operations announce facts (e.g. "a converted attachment was
//! stored") on an [`EventBus`]; interested parties subscribe and react.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
