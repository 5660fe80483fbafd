pub mod event_bus;
pub mod frame;
pub mod timers;

pub use event_bus::*;
pub use frame::*;
pub use timers::*;
