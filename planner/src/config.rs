//! Top-level planner configuration: one [`ModuleConfig`] per pipeline stage
//! plus the cross-stage knobs (`beam_width`).

use crate::registry::ModuleConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct PlannerConfig {
    pub opportunity_calculators: ModuleConfig,
    pub pattern_generators: ModuleConfig,
    pub sequence_generators: ModuleConfig,
    pub filters: ModuleConfig,
    /// Global cap on stage 3's output, shared across every enabled sequence
    /// generator. `None` uses the stage's own default.
    pub beam_width: Option<usize>,
}
