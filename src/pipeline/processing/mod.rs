// Pipeline processing: feature derivation, anomaly detection and aggregation

pub mod aggregate;
pub mod anomaly;
pub mod features;

pub use aggregate::{AggregateSummary, CorrelationMatrix, GroupSummary};
pub use anomaly::{AnomalyLabel, Detection};
pub use features::{Derivation, ExclusionReason, FeatureDeriver};
