use crate::resource::GridGeometry;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Circular band confinement around an anchor cell.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HaloConfig {
    pub anchor_x: i64,
    pub anchor_y: i64,
    /// Radius of the inner edge of the band.
    pub inner_radius: i64,
    /// Radial thickness of the band beyond the inner radius.
    pub width: i64,
}

impl Default for HaloConfig {
    fn default() -> Self {
        Self {
            anchor_x: 25,
            anchor_y: 25,
            inner_radius: 10,
            width: 4,
        }
    }
}

impl HaloConfig {
    pub fn anchor(&self) -> [f64; 2] {
        [self.anchor_x as f64, self.anchor_y as f64]
    }

    pub fn outer_radius(&self) -> i64 {
        self.inner_radius.saturating_add(self.width)
    }

    /// Inclusive cell extent `(x_lo, x_hi, y_lo, y_hi)` covered by the outer edge of the band,
    /// or `None` if it falls outside the `i64` coordinate range.
    pub fn extent(&self) -> Option<(i64, i64, i64, i64)> {
        let outer = self.inner_radius.checked_add(self.width)?;
        Some((
            self.anchor_x.checked_sub(outer)?,
            self.anchor_x.checked_add(outer)?,
            self.anchor_y.checked_sub(outer)?,
            self.anchor_y.checked_add(outer)?,
        ))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PeakConfig {
    /// Peak height; also the radius of the edible (>= 1) region.
    pub height: f64,
    /// Radius of the whole peak, including the sensed-only slope.
    pub spread: f64,
    /// Flat-top value applied wherever the slope reaches 1. Negative disables flattening.
    pub plateau: f64,
    /// Ticks a bitten peak lingers before it is refreshed.
    pub decay: u32,
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
    /// Logistic map coefficient in [1, 4]; ~1..3 moves smoothly, larger values are chaotic.
    pub move_a_scaler: f64,
    /// Confine movement to a circular band instead of the bounding box.
    pub halo: Option<HaloConfig>,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            height: 5.0,
            spread: 10.0,
            plateau: -1.0,
            decay: 50,
            min_x: 0,
            max_x: 49,
            min_y: 0,
            max_y: 49,
            move_a_scaler: 3.0,
            halo: None,
        }
    }
}

macro_rules! define_peak_config_error {
    (
        $(
            $variant:ident $( { $($field:ident : $type:ty),* } )? => $fmt:literal $(, $arg:expr)*
        );* $(;)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum PeakConfigError {
            $(
                $variant $( { $($field : $type),* } )?,
            )*
        }

        impl std::fmt::Display for PeakConfigError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$variant $( { $($field),* } )? => write!(f, $fmt $(, $arg)*),
                    )*
                }
            }
        }
    };
}

define_peak_config_error! {
    InvalidHeight => "height must be finite and non-negative";
    InvalidSpread => "spread must be finite and non-negative";
    InvalidPlateau => "plateau must be finite";
    InvalidDecay => "decay must be greater than 0";
    InvalidMoveScaler { actual: f64 } => "move_a_scaler ({actual}) must be finite and within [1,4]";
    InvertedBoundingBox => "bounding box requires min_x <= max_x and min_y <= max_y";
    BoxTooSmall { axis: char } => "bounding box is too small along {axis} to fit a peak of this height";
    InvalidHaloRadius => "halo inner_radius must be greater than 0";
    InvalidHaloWidth => "halo width must be non-negative";
    HaloOverflow => "halo anchor and radii exceed the coordinate range";
    HaloOutsideGrid { width: usize, height: usize } => "halo band does not fit inside the {width}x{height} grid";
    BoxOutsideGrid { width: usize, height: usize } => "bounding box does not fit inside the {width}x{height} grid";
    InvalidStart => "start position must be finite";
    StartOutsideBox { x: f64, y: f64 } => "start ({x}, {y}) lies outside the bounding box";
    StartOutsideHalo { distance: f64 } => "start lies {distance} from the halo anchor, outside the band";
}

impl Error for PeakConfigError {}

impl PeakConfig {
    const START_TOLERANCE: f64 = 1e-6;

    pub fn validate(&self) -> Result<(), PeakConfigError> {
        self.validate_shape()?;
        self.validate_motion()?;
        match &self.halo {
            Some(halo) => Self::validate_halo(halo),
            None => self.validate_box(),
        }
    }

    fn validate_shape(&self) -> Result<(), PeakConfigError> {
        if !(self.height.is_finite() && self.height >= 0.0) {
            return Err(PeakConfigError::InvalidHeight);
        }
        if !(self.spread.is_finite() && self.spread >= 0.0) {
            return Err(PeakConfigError::InvalidSpread);
        }
        if !self.plateau.is_finite() {
            return Err(PeakConfigError::InvalidPlateau);
        }
        Ok(())
    }

    fn validate_motion(&self) -> Result<(), PeakConfigError> {
        if self.decay == 0 {
            return Err(PeakConfigError::InvalidDecay);
        }
        if !(self.move_a_scaler.is_finite() && (1.0..=4.0).contains(&self.move_a_scaler)) {
            return Err(PeakConfigError::InvalidMoveScaler {
                actual: self.move_a_scaler,
            });
        }
        Ok(())
    }

    fn validate_box(&self) -> Result<(), PeakConfigError> {
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(PeakConfigError::InvertedBoundingBox);
        }
        let ((x_lo, x_hi), (y_lo, y_hi)) = self.refresh_ranges();
        if x_lo > x_hi {
            return Err(PeakConfigError::BoxTooSmall { axis: 'x' });
        }
        if y_lo > y_hi {
            return Err(PeakConfigError::BoxTooSmall { axis: 'y' });
        }
        Ok(())
    }

    fn validate_halo(halo: &HaloConfig) -> Result<(), PeakConfigError> {
        if halo.inner_radius <= 0 {
            return Err(PeakConfigError::InvalidHaloRadius);
        }
        if halo.width < 0 {
            return Err(PeakConfigError::InvalidHaloWidth);
        }
        if halo.extent().is_none() {
            return Err(PeakConfigError::HaloOverflow);
        }
        Ok(())
    }

    /// Check that the halo band, or the bounding box when there is no halo, lies
    /// entirely on a `width` x `height` grid.
    pub fn validate_for_grid(&self, width: usize, height: usize) -> Result<(), PeakConfigError> {
        let (w, h) = (width as i64, height as i64);
        match &self.halo {
            Some(halo) => {
                let fits = halo.extent().is_some_and(|(x_lo, x_hi, y_lo, y_hi)| {
                    x_lo >= 0 && y_lo >= 0 && x_hi < w && y_hi < h
                });
                if !fits {
                    return Err(PeakConfigError::HaloOutsideGrid { width, height });
                }
            }
            None => {
                let fits = self.min_x >= 0 && self.min_y >= 0 && self.max_x < w && self.max_y < h;
                if !fits {
                    return Err(PeakConfigError::BoxOutsideGrid { width, height });
                }
            }
        }
        Ok(())
    }

    pub fn validate_start(&self, start: [f64; 2]) -> Result<(), PeakConfigError> {
        let [x, y] = start;
        if !(x.is_finite() && y.is_finite()) {
            return Err(PeakConfigError::InvalidStart);
        }
        match &self.halo {
            Some(halo) => {
                let [ax, ay] = halo.anchor();
                let distance = ((x - ax).powi(2) + (y - ay).powi(2)).sqrt();
                let inner = halo.inner_radius as f64 - Self::START_TOLERANCE;
                let outer = halo.outer_radius() as f64 + Self::START_TOLERANCE;
                if distance < inner || distance > outer {
                    return Err(PeakConfigError::StartOutsideHalo { distance });
                }
            }
            None => {
                let inside_x = (self.min_x as f64..=self.max_x as f64).contains(&x);
                let inside_y = (self.min_y as f64..=self.max_y as f64).contains(&y);
                if !(inside_x && inside_y) {
                    return Err(PeakConfigError::StartOutsideBox { x, y });
                }
            }
        }
        Ok(())
    }

    /// Inclusive integer ranges a refreshed peak center is drawn from, per axis,
    /// so the whole edible plateau fits inside the bounding box.
    pub fn refresh_ranges(&self) -> ((i64, i64), (i64, i64)) {
        let inset = |lo: i64, hi: i64| {
            (
                (lo as f64 + self.height).ceil() as i64,
                (hi as f64 - self.height).floor() as i64,
            )
        };
        (
            inset(self.min_x, self.max_x),
            inset(self.min_y, self.max_y),
        )
    }

    pub fn plateau_enabled(&self) -> bool {
        self.plateau >= 0.0
    }
}

/// One peak layer hosted by a [`crate::world::PeakField`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PeakLayerConfig {
    /// Initial peak center in cell coordinates.
    pub start: [f64; 2],
    pub peak: PeakConfig,
}

impl Default for PeakLayerConfig {
    fn default() -> Self {
        Self {
            start: [25.0, 25.0],
            peak: PeakConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Deterministic seed for reproducible runs.
    pub seed: u64,
    /// Grid width in cells.
    pub world_x: usize,
    /// Grid height in cells.
    pub world_y: usize,
    pub geometry: GridGeometry,
    /// Step interval of the grazing probe that bites each peak center. 0 disables it.
    pub bite_every: usize,
    /// Amount withdrawn by each grazing bite.
    pub bite_amount: f64,
    pub layers: Vec<PeakLayerConfig>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world_x: 50,
            world_y: 50,
            geometry: GridGeometry::Bounded,
            bite_every: 0,
            bite_amount: 1.0,
            layers: vec![PeakLayerConfig::default()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldConfigError {
    InvalidWorldSize,
    NoLayers,
    TooManyLayers { max: usize, actual: usize },
    InvalidBiteAmount,
    Layer {
        index: usize,
        source: PeakConfigError,
    },
}

impl fmt::Display for FieldConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldConfigError::InvalidWorldSize => {
                write!(f, "world_x and world_y must be greater than 0")
            }
            FieldConfigError::NoLayers => write!(f, "at least one peak layer is required"),
            FieldConfigError::TooManyLayers { max, actual } => {
                write!(f, "layer count ({actual}) exceeds supported maximum ({max})")
            }
            FieldConfigError::InvalidBiteAmount => {
                write!(f, "bite_amount must be finite and non-negative")
            }
            FieldConfigError::Layer { index, source } => write!(f, "layer {index}: {source}"),
        }
    }
}

impl Error for FieldConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FieldConfigError::Layer { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl FieldConfig {
    pub const MAX_LAYERS: usize = crate::constants::MAX_LAYERS;

    pub fn validate(&self) -> Result<(), FieldConfigError> {
        if self.world_x == 0 || self.world_y == 0 {
            return Err(FieldConfigError::InvalidWorldSize);
        }
        if self.layers.is_empty() {
            return Err(FieldConfigError::NoLayers);
        }
        if self.layers.len() > Self::MAX_LAYERS {
            return Err(FieldConfigError::TooManyLayers {
                max: Self::MAX_LAYERS,
                actual: self.layers.len(),
            });
        }
        if !(self.bite_amount.is_finite() && self.bite_amount >= 0.0) {
            return Err(FieldConfigError::InvalidBiteAmount);
        }
        for (index, layer) in self.layers.iter().enumerate() {
            Self::validate_layer(layer, self.world_x, self.world_y)
                .map_err(|source| FieldConfigError::Layer { index, source })?;
        }
        Ok(())
    }

    fn validate_layer(
        layer: &PeakLayerConfig,
        world_x: usize,
        world_y: usize,
    ) -> Result<(), PeakConfigError> {
        layer.peak.validate()?;
        layer.peak.validate_for_grid(world_x, world_y)?;
        layer.peak.validate_start(layer.start)
    }
}
