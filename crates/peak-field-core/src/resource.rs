use crate::constants::MAX_GRID_DIM;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// How world coordinates outside the grid are mapped back onto a cell.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GridGeometry {
    /// Out-of-range coordinates clamp to the nearest edge cell.
    #[default]
    Bounded,
    /// Coordinates wrap around both axes.
    Toroidal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    ZeroDimension,
    TooLarge { max: usize, actual: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::ZeroDimension => write!(f, "grid width and height must be greater than 0"),
            GridError::TooLarge { max, actual } => {
                write!(f, "grid extent ({actual}) exceeds supported maximum ({max})")
            }
        }
    }
}

impl Error for GridError {}

/// 2D grid of resource cells.
/// Each cell holds a current amount and the initial value it was last refreshed to.
#[derive(Clone, Debug)]
pub struct ResourceGrid {
    width: usize,
    height: usize,
    geometry: GridGeometry,
    amounts: Vec<f64>,
    initials: Vec<f64>,
    total: f64,
}

impl ResourceGrid {
    pub fn new(width: usize, height: usize, geometry: GridGeometry) -> Self {
        Self::try_new(width, height, geometry).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(width: usize, height: usize, geometry: GridGeometry) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroDimension);
        }
        let largest = width.max(height);
        if largest > MAX_GRID_DIM {
            return Err(GridError::TooLarge {
                max: MAX_GRID_DIM,
                actual: largest,
            });
        }
        let cells = width * height;
        Ok(Self {
            width,
            height,
            geometry,
            amounts: vec![0.0; cells],
            initials: vec![0.0; cells],
            total: 0.0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn amount(&self, x: usize, y: usize) -> f64 {
        self.amounts[self.index(x, y)]
    }

    pub fn initial(&self, x: usize, y: usize) -> f64 {
        self.initials[self.index(x, y)]
    }

    /// Set the current amount of a cell, keeping the running total in step.
    pub fn set_amount(&mut self, x: usize, y: usize, value: f64) {
        let idx = self.index(x, y);
        self.total += value - self.amounts[idx];
        self.amounts[idx] = value;
    }

    pub fn set_initial(&mut self, x: usize, y: usize, value: f64) {
        let idx = self.index(x, y);
        self.initials[idx] = value;
    }

    /// Bulk write of both the amount and the initial value of a cell.
    ///
    /// The running total is not maintained here; call [`Self::reset_resource_counts`]
    /// once the batch of writes is complete.
    pub fn set_cell(&mut self, x: usize, y: usize, value: f64) {
        let idx = self.index(x, y);
        self.amounts[idx] = value;
        self.initials[idx] = value;
    }

    /// Recompute the running total from the stored cell amounts.
    pub fn reset_resource_counts(&mut self) {
        self.total = self.amounts.iter().sum();
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// True if any cell holds at least `threshold`. Stops at the first hit.
    pub fn has_edible(&self, threshold: f64) -> bool {
        self.amounts.iter().any(|&a| a >= threshold)
    }

    pub fn edible_cells(&self, threshold: f64) -> usize {
        self.amounts.iter().filter(|&&a| a >= threshold).count()
    }

    /// Get resource amount at a world position, mapped through the grid geometry.
    pub fn amount_at(&self, x: f64, y: f64) -> f64 {
        let (cx, cy) = self.locate(x, y);
        self.amounts[cy * self.width + cx]
    }

    /// Remove up to `amount` resource from the addressed cell and return actual amount withdrawn.
    pub fn take(&mut self, x: f64, y: f64, amount: f64) -> f64 {
        let (cx, cy) = self.locate(x, y);
        let idx = cy * self.width + cx;
        let removed = self.amounts[idx].min(amount.max(0.0));
        self.amounts[idx] -= removed;
        self.total -= removed;
        removed
    }

    pub fn data(&self) -> &[f64] {
        &self.amounts
    }

    pub fn initials(&self) -> &[f64] {
        &self.initials
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        y * self.width + x
    }

    fn locate(&self, x: f64, y: f64) -> (usize, usize) {
        match self.geometry {
            GridGeometry::Toroidal => self.wrap_coords(x, y),
            GridGeometry::Bounded => self.clamp_coords(x, y),
        }
    }

    fn wrap_coords(&self, x: f64, y: f64) -> (usize, usize) {
        let cx = (x.floor() as isize).rem_euclid(self.width as isize) as usize;
        let cy = (y.floor() as isize).rem_euclid(self.height as isize) as usize;
        (cx, cy)
    }

    fn clamp_coords(&self, x: f64, y: f64) -> (usize, usize) {
        let cx = (x.max(0.0) as usize).min(self.width - 1);
        let cy = (y.max(0.0) as usize).min(self.height - 1);
        (cx, cy)
    }
}
