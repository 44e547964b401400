//! JSON-file stores for user state under the data root.
//!
//! Every store reads the whole document and writes the whole document back;
//! there are no partial updates and concurrent writers get last-write-wins.

mod document;
mod presets;
mod settings;
mod streams;

pub use presets::PresetStore;
pub use settings::SettingsStore;
pub use streams::StreamStore;
