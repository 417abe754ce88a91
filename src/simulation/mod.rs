//! Sequential simulation of grounded events.
//!
//! A [`SequentialSimulator`] turns the actions of a problem into [`Event`]s,
//! checks them against a [`State`](crate::State) and produces successor
//! states. States are never modified in place.

pub mod config;
pub mod event;
mod resolve;
pub mod simulator;

pub use config::SimulatorConfig;
pub use event::Event;
pub use simulator::SequentialSimulator;
