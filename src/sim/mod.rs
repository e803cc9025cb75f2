//! Concurrent device simulation.
//!
//! One actor thread per device, exchanging messages through crossbeam
//! mailboxes, under the control of a single coordinator.

pub mod actor;
pub mod coordinator;
pub mod message;
pub mod scenario;
pub mod types;

pub use actor::{DeviceActor, Directory};
pub use coordinator::SimulationCoordinator;
pub use message::{Message, Payload};
pub use scenario::run_scenario;
pub use types::*;
