//! ALTAIR Node - flight supervisor for the balloon telemetry link
//!
//! Loads the node configuration, builds the three radios, and runs the
//! [`LinkSupervisor`] schedule. Instruments are simulated on the bench by
//! [`SimulatedInstrument`].

pub mod config;
pub mod link;
pub mod radios;
pub mod sim;

pub use config::NodeConfig;
pub use link::{LinkSupervisor, TickReport};
pub use radios::{build_radios, driver_for};
pub use sim::SimulatedInstrument;
