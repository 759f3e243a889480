use serde::{Deserialize, Serialize};

use crate::collision::CollisionConfig;
use crate::navigability::NavigabilityConfig;
use crate::opening_clearance::OpeningClearanceConfig;
use crate::out_of_bound::OutOfBoundConfig;

/// One config section per analyzer; missing sections take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub collision: CollisionConfig,
    pub out_of_bound: OutOfBoundConfig,
    pub navigability: NavigabilityConfig,
    pub opening_clearance: OpeningClearanceConfig,
}
