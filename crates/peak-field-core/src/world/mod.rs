pub mod metrics;

pub use metrics::*;

use crate::config::{FieldConfig, FieldConfigError, PeakConfigError};
use crate::constants::EDIBLE_THRESHOLD;
use crate::peak::{PeakController, TickOutcome};
use crate::resource::{GridError, ResourceGrid};
use crate::rng::derive_layer_rng;
use log::debug;
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use std::time::Instant;
use std::{error::Error, fmt};

/// One peak together with the grid it paints and its own random stream.
#[derive(Clone, Debug)]
pub struct PeakLayer {
    controller: PeakController,
    grid: ResourceGrid,
    rng: ChaCha12Rng,
    refresh_count: usize,
    last_outcome: TickOutcome,
}

impl PeakLayer {
    pub fn controller(&self) -> &PeakController {
        &self.controller
    }

    pub fn grid(&self) -> &ResourceGrid {
        &self.grid
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    pub fn last_outcome(&self) -> TickOutcome {
        self.last_outcome
    }

    fn advance(&mut self) -> TickOutcome {
        let outcome = self.controller.advance(&mut self.grid, &mut self.rng);
        if outcome == TickOutcome::Refreshed {
            self.refresh_count += 1;
        }
        self.last_outcome = outcome;
        outcome
    }

    /// Withdraw from the layer's grid and mark the peak bitten if anything was taken.
    fn bite(&mut self, x: f64, y: f64, amount: f64) -> f64 {
        let removed = self.grid.take(x, y, amount);
        if removed > 0.0 {
            self.controller.set_modified(true);
        }
        removed
    }
}

pub struct PeakField {
    pub(crate) layers: Vec<PeakLayer>,
    pub(crate) config: FieldConfig,
    pub(crate) step_index: usize,
    pub(crate) refreshes_last_step: usize,
    pub(crate) frozen_last_step: usize,
    pub(crate) bites_last_step: usize,
    pub(crate) total_refreshes: usize,
    pub(crate) total_bites: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldInitError {
    Config(FieldConfigError),
    Grid(GridError),
    Layer {
        index: usize,
        source: PeakConfigError,
    },
}

impl fmt::Display for FieldInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldInitError::Config(e) => write!(f, "{}", e),
            FieldInitError::Grid(e) => write!(f, "{}", e),
            FieldInitError::Layer { index, source } => {
                write!(f, "failed to construct layer {index}: {source}")
            }
        }
    }
}

impl From<FieldConfigError> for FieldInitError {
    fn from(err: FieldConfigError) -> Self {
        FieldInitError::Config(err)
    }
}

impl From<GridError> for FieldInitError {
    fn from(err: GridError) -> Self {
        FieldInitError::Grid(err)
    }
}

impl Error for FieldInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FieldInitError::Config(e) => Some(e),
            FieldInitError::Grid(e) => Some(e),
            FieldInitError::Layer { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentError {
    InvalidSampleEvery,
    TooManySteps { max: usize, actual: usize },
    TooManySamples { max: usize, actual: usize },
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            ExperimentError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            ExperimentError::TooManySamples { max, actual } => {
                write!(
                    f,
                    "sample count ({actual}) exceeds supported maximum ({max})"
                )
            }
        }
    }
}

impl Error for ExperimentError {}

impl PeakField {
    pub const MAX_EXPERIMENT_STEPS: usize = 1_000_000;
    pub const MAX_EXPERIMENT_SAMPLES: usize = 50_000;

    pub fn new(config: FieldConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(config: FieldConfig) -> Result<Self, FieldInitError> {
        config.validate()?;

        let mut layers = Vec::with_capacity(config.layers.len());
        for (index, layer_config) in config.layers.iter().enumerate() {
            let mut grid = ResourceGrid::try_new(config.world_x, config.world_y, config.geometry)?;
            let mut rng = derive_layer_rng(config.seed, index);
            let controller = PeakController::try_new(
                layer_config.peak.clone(),
                layer_config.start,
                &mut grid,
                &mut rng,
            )
            .map_err(|source| FieldInitError::Layer { index, source })?;
            layers.push(PeakLayer {
                controller,
                grid,
                rng,
                refresh_count: 0,
                last_outcome: TickOutcome::Moved,
            });
        }
        debug!(
            "peak field ready: {} layers on {}x{} grid",
            layers.len(),
            config.world_x,
            config.world_y
        );

        Ok(Self {
            layers,
            config,
            step_index: 0,
            refreshes_last_step: 0,
            frozen_last_step: 0,
            bites_last_step: 0,
            total_refreshes: 0,
            total_bites: 0,
        })
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn layers(&self) -> &[PeakLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&PeakLayer> {
        self.layers.get(index)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn total_refreshes(&self) -> usize {
        self.total_refreshes
    }

    /// Withdraw up to `amount` from one layer at a world position.
    ///
    /// Returns `None` for an unknown layer, otherwise the amount actually withdrawn.
    pub fn consume(&mut self, layer: usize, x: f64, y: f64, amount: f64) -> Option<f64> {
        let layer = self.layers.get_mut(layer)?;
        Some(layer.bite(x, y, amount))
    }

    /// Resource at a world position summed over every layer.
    pub fn combined_amount(&self, x: f64, y: f64) -> f64 {
        self.layers.iter().map(|l| l.grid.amount_at(x, y)).sum()
    }

    pub fn resource_total(&self) -> f64 {
        self.layers.iter().map(|l| l.grid.total()).sum()
    }

    pub fn edible_cells(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.grid.edible_cells(EDIBLE_THRESHOLD))
            .sum()
    }

    pub fn peak_centers(&self) -> Vec<[f64; 2]> {
        self.layers.iter().map(|l| l.controller.center()).collect()
    }

    pub fn step(&mut self) -> StepTimings {
        let total_start = Instant::now();
        self.step_index += 1;

        // 1. Grazing probe
        let t0 = Instant::now();
        self.bites_last_step = 0;
        if self.config.bite_every > 0 && self.step_index % self.config.bite_every == 0 {
            self.graze();
        }
        let graze_us = t0.elapsed().as_micros() as u64;

        // 2. Advance layers; each owns its grid and rng so they run independently
        let t1 = Instant::now();
        let outcomes: Vec<TickOutcome> = self
            .layers
            .par_iter_mut()
            .map(PeakLayer::advance)
            .collect();
        let advance_us = t1.elapsed().as_micros() as u64;

        self.refreshes_last_step = outcomes
            .iter()
            .filter(|&&o| o == TickOutcome::Refreshed)
            .count();
        self.frozen_last_step = outcomes
            .iter()
            .filter(|&&o| o == TickOutcome::Frozen)
            .count();
        self.total_refreshes += self.refreshes_last_step;

        StepTimings {
            graze_us,
            advance_us,
            total_us: total_start.elapsed().as_micros() as u64,
        }
    }

    fn graze(&mut self) {
        let amount = self.config.bite_amount;
        for layer in &mut self.layers {
            let [x, y] = layer.controller.center();
            if layer.bite(x, y, amount) > 0.0 {
                self.bites_last_step += 1;
            }
        }
        self.total_bites += self.bites_last_step;
    }

    pub fn run_experiment(&mut self, steps: usize, sample_every: usize) -> RunSummary {
        self.try_run_experiment(steps, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_run_experiment(
        &mut self,
        steps: usize,
        sample_every: usize,
    ) -> Result<RunSummary, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if steps > Self::MAX_EXPERIMENT_STEPS {
            return Err(ExperimentError::TooManySteps {
                max: Self::MAX_EXPERIMENT_STEPS,
                actual: steps,
            });
        }
        let estimated_samples = if steps == 0 {
            0
        } else {
            ((steps - 1) / sample_every) + 1
        };
        if estimated_samples > Self::MAX_EXPERIMENT_SAMPLES {
            return Err(ExperimentError::TooManySamples {
                max: Self::MAX_EXPERIMENT_SAMPLES,
                actual: estimated_samples,
            });
        }

        let refreshes_before = self.total_refreshes;
        let bites_before = self.total_bites;
        let mut samples = Vec::with_capacity(estimated_samples);
        for step in 1..=steps {
            self.step();
            if step % sample_every == 0 || step == steps {
                samples.push(self.collect_step_metrics(step));
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            layer_count: self.layers.len(),
            total_refreshes: self.total_refreshes - refreshes_before,
            total_bites: self.total_bites - bites_before,
            final_centers: self.peak_centers(),
            samples,
        })
    }
}
