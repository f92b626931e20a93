// Probes: cheap feasibility checks gating each control step

pub mod composite;
pub mod threshold;
pub mod traits;

pub use composite::ProbeSet;
pub use threshold::{ENTROPY, HITS, MISSING_METRIC, RangeProbe};
pub use traits::{Probe, ProbeCapabilities, ProbeMetrics, ProbeResult};
