//! Terminal rendering of events, snapshots and tables.

mod events;
mod tables;

pub use events::{render_event, render_license_state, render_snapshot, render_verdict};
pub use tables::{format_optional, print_separator, truncate_string};
