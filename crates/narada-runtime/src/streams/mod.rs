//! Stream reachability.

mod probe;

pub use probe::{DEFAULT_PROBE_PORT, PROBE_TIMEOUT, ProbeError, ProbeReport, probe_stream};
