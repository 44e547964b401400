//! License checking through the external checker process.

mod parse;
mod reconciler;

pub use parse::{ParseError, parse_checker_output};
pub use reconciler::{CheckSchedule, CheckerCommand, LicenseCell, LicenseError, LicenseReconciler};
