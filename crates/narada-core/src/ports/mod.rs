//! Port definitions (trait abstractions) for the runtime.
//!
//! Ports keep the supervision logic independent of how events reach the UI
//! and of where the license state lives, so tests can substitute fakes.

mod event_emitter;
mod license_gate;
mod store_error;

pub use event_emitter::{NoopEmitter, StatusEmitter};
pub use license_gate::{LicenseGate, StaticLicenseGate};
pub use store_error::StoreError;
