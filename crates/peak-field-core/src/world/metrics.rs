use super::PeakField;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct StepTimings {
    pub graze_us: u64,
    pub advance_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    pub resource_total: f64,
    pub edible_cells: usize,
    pub frozen_layers: usize,
    pub refresh_count: usize,
    pub bite_count: usize,
    pub mean_move_scalar: f64,
    pub peak_centers: Vec<[f64; 2]>,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub layer_count: usize,
    #[serde(default)]
    pub total_refreshes: usize,
    #[serde(default)]
    pub total_bites: usize,
    #[serde(default)]
    pub final_centers: Vec<[f64; 2]>,
    pub samples: Vec<StepMetrics>,
}

impl PeakField {
    pub(crate) fn mean_move_scalar(&self) -> f64 {
        if self.layers.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .layers
            .iter()
            .map(|l| l.controller.move_scalar())
            .sum();
        sum / self.layers.len() as f64
    }

    pub fn collect_step_metrics(&self, step: usize) -> StepMetrics {
        StepMetrics {
            step,
            resource_total: self.resource_total(),
            edible_cells: self.edible_cells(),
            frozen_layers: self.frozen_last_step,
            refresh_count: self.refreshes_last_step,
            bite_count: self.bites_last_step,
            mean_move_scalar: self.mean_move_scalar(),
            peak_centers: self.peak_centers(),
        }
    }
}
