//! Common test utilities.
//!
//! Shell-script stand-ins for the collaborators and an event recorder for
//! asserting on what reached the bus.

pub mod fixtures;
pub mod recorder;
