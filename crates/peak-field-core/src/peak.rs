//! A single mobile resource peak.
//!
//! Peaks are inverse-distance cones, optionally capped with a plateau, that wander
//! inside a bounding box or a circular halo band. A peak stops moving once it is
//! bitten and is refreshed at a random location when its edible cells are gone or
//! its decay clock runs out, whichever comes first.

use crate::config::{HaloConfig, PeakConfig, PeakConfigError};
use crate::constants::{DIRECTION_PERIOD, EDIBLE_THRESHOLD, INITIAL_MOVE_SCALAR};
use crate::motion::{
    bounce, initial_signs, lattice_step, logistic_step, orthogonal_on_circle, AxisChoice, MoveSign,
};
use crate::resource::ResourceGrid;
use log::{debug, trace};
use rand::Rng;

/// What a call to [`PeakController::advance`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Peak is being eaten: nothing moved and the grid was left untouched.
    Frozen,
    /// Peak moved and the height field was redrawn.
    Moved,
    /// Peak was relocated, then moved and redrawn.
    Refreshed,
}

/// Resource height of `cell` for a peak centered at `center`.
pub fn peak_height(config: &PeakConfig, center: [f64; 2], cell: [f64; 2]) -> f64 {
    let dist = ((cell[0] - center[0]).powi(2) + (cell[1] - center[1]).powi(2)).sqrt();
    if dist > config.spread {
        return 0.0;
    }
    // +1 so the center cell sits at radius 1 rather than 0
    let height = config.height / (dist + 1.0);
    if height >= 1.0 && config.plateau_enabled() {
        config.plateau
    } else {
        height
    }
}

#[derive(Clone, Debug)]
pub struct PeakController {
    config: PeakConfig,
    center: [f64; 2],
    signs: [MoveSign; 2],
    move_scalar: f64,
    step_counter: u32,
    decay_counter: u32,
    modified: bool,
}

impl PeakController {
    pub fn new<R: Rng + ?Sized>(
        config: PeakConfig,
        start: [f64; 2],
        grid: &mut ResourceGrid,
        rng: &mut R,
    ) -> Self {
        Self::try_new(config, start, grid, rng).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Validate `config`, then run the two warm-up passes: the first settles direction
    /// and amplitude, the second starts again from `start` and paints the first field.
    pub fn try_new<R: Rng + ?Sized>(
        config: PeakConfig,
        start: [f64; 2],
        grid: &mut ResourceGrid,
        rng: &mut R,
    ) -> Result<Self, PeakConfigError> {
        config.validate()?;
        config.validate_for_grid(grid.width(), grid.height())?;
        config.validate_start(start)?;

        let mut controller = Self {
            config,
            center: start,
            signs: initial_signs(rng),
            move_scalar: INITIAL_MOVE_SCALAR,
            step_counter: 1,
            decay_counter: 0,
            modified: false,
        };
        controller.advance(grid, rng);
        controller.center = start;
        controller.advance(grid, rng);
        Ok(controller)
    }

    pub fn config(&self) -> &PeakConfig {
        &self.config
    }

    pub fn center(&self) -> [f64; 2] {
        self.center
    }

    pub fn signs(&self) -> [MoveSign; 2] {
        self.signs
    }

    pub fn move_scalar(&self) -> f64 {
        self.move_scalar
    }

    pub fn step_counter(&self) -> u32 {
        self.step_counter
    }

    pub fn decay_counter(&self) -> u32 {
        self.decay_counter
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Called by the feeding side whenever it withdraws resource from this peak.
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn height_at(&self, x: f64, y: f64) -> f64 {
        peak_height(&self.config, self.center, [x, y])
    }

    /// Run one simulation tick against `grid`.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        grid: &mut ResourceGrid,
        rng: &mut R,
    ) -> TickOutcome {
        let has_edible = grid.has_edible(EDIBLE_THRESHOLD);

        // a bitten peak with food left rots for `decay` ticks before it is replaced
        if has_edible && self.modified {
            self.decay_counter += 1;
        }
        if has_edible && self.modified && self.decay_counter < self.config.decay {
            trace!(
                "peak frozen at {:?}, decay {}/{}",
                self.center,
                self.decay_counter,
                self.config.decay
            );
            return TickOutcome::Frozen;
        }

        let refreshed = self.decay_counter == self.config.decay;
        if refreshed {
            self.relocate(rng);
        }

        self.move_scalar = logistic_step(self.config.move_a_scaler, self.move_scalar);
        let choice = AxisChoice::draw(rng);
        self.update_direction(choice, rng);
        match self.config.halo {
            Some(halo) => self.displace_in_halo(&halo, choice),
            None => self.displace_in_box(),
        }

        self.paint(grid);
        grid.reset_resource_counts();
        self.decay_counter = 0;

        if refreshed {
            TickOutcome::Refreshed
        } else {
            TickOutcome::Moved
        }
    }

    pub(crate) fn relocate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.center = match self.config.halo {
            None => {
                let ((x_lo, x_hi), (y_lo, y_hi)) = self.config.refresh_ranges();
                [
                    rng.random_range(x_lo..=x_hi) as f64,
                    rng.random_range(y_lo..=y_hi) as f64,
                ]
            }
            Some(halo) => Self::halo_refresh_point(&halo, rng),
        };
        self.signs = initial_signs(rng);
        self.modified = false;
        debug!("peak refreshed at {:?}", self.center);
    }

    /// Random point on the inner circle of the band, on the upper half.
    fn halo_refresh_point<R: Rng + ?Sized>(halo: &HaloConfig, rng: &mut R) -> [f64; 2] {
        let outer = halo.outer_radius();
        let drawn = rng.random_range(halo.anchor_x - outer..=halo.anchor_x + outer);
        let x = drawn.clamp(
            halo.anchor_x - halo.inner_radius,
            halo.anchor_x + halo.inner_radius,
        );
        if x != drawn {
            debug!("halo refresh draw {drawn} clamped to {x}");
        }
        let [ax, ay] = halo.anchor();
        let x = x as f64;
        let y = orthogonal_on_circle(x - ax, ay, halo.inner_radius as f64, 1.0);
        [x, y]
    }

    fn update_direction<R: Rng + ?Sized>(&mut self, choice: AxisChoice, rng: &mut R) {
        if self.step_counter != DIRECTION_PERIOD {
            self.step_counter += 1;
            return;
        }
        self.step_counter = 1;
        match choice {
            AxisChoice::X => self.signs[0] = self.signs[0].resample(rng),
            AxisChoice::Y => self.signs[1] = self.signs[1].resample(rng),
            AxisChoice::Neither => {}
        }
    }

    fn displace_in_box(&mut self) {
        let c = &self.config;
        let box_lo = [c.min_x as f64, c.min_y as f64];
        let box_hi = [c.max_x as f64, c.max_y as f64];
        let m = self.move_scalar;
        for axis in 0..2 {
            // bounce when the edible plateau would cross the box edge
            let tentative = self.center[axis] + self.signs[axis].value() * m;
            let lo = box_lo[axis] + c.height;
            let hi = box_hi[axis] - c.height;
            self.signs[axis] = bounce(self.signs[axis], tentative, lo, hi);
            self.center[axis] = lattice_step(self.center[axis], self.signs[axis], m)
                .clamp(box_lo[axis], box_hi[axis]);
        }
    }

    /// Under a halo only the chosen axis moves; the other one is solved so the peak
    /// keeps its current distance from the anchor.
    fn displace_in_halo(&mut self, halo: &HaloConfig, choice: AxisChoice) {
        let (axis, other) = match choice {
            AxisChoice::Neither => return,
            AxisChoice::X => (0, 1),
            AxisChoice::Y => (1, 0),
        };
        let anchor = halo.anchor();
        let offset = [self.center[0] - anchor[0], self.center[1] - anchor[1]];
        let radius = offset[0]
            .hypot(offset[1])
            .clamp(halo.inner_radius as f64, halo.outer_radius() as f64);
        let side = if offset[other] < 0.0 { -1.0 } else { 1.0 };

        let m = self.move_scalar;
        let tentative = offset[axis] + self.signs[axis].value() * m;
        self.signs[axis] = bounce(self.signs[axis], tentative, -radius, radius);
        let moved = (lattice_step(self.center[axis], self.signs[axis], m) - anchor[axis])
            .clamp(-radius, radius);

        self.center[axis] = anchor[axis] + moved;
        self.center[other] = orthogonal_on_circle(moved, anchor[other], radius, side);
    }

    fn paint(&self, grid: &mut ResourceGrid) {
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let height = self.height_at(x as f64, y as f64);
                grid.set_cell(x, y, height);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::GridGeometry;
    use crate::rng::create_rng;
    use proptest::prelude::*;

    fn cone(height: f64, spread: f64, plateau: f64) -> PeakConfig {
        PeakConfig {
            height,
            spread,
            plateau,
            ..PeakConfig::default()
        }
    }

    fn halo_config() -> PeakConfig {
        PeakConfig {
            halo: Some(HaloConfig {
                anchor_x: 25,
                anchor_y: 25,
                inner_radius: 10,
                width: 4,
            }),
            ..PeakConfig::default()
        }
    }

    fn build(config: PeakConfig, start: [f64; 2], seed: u64) -> (PeakController, ResourceGrid) {
        let mut grid = ResourceGrid::new(50, 50, GridGeometry::Bounded);
        let mut rng = create_rng(seed);
        let controller = PeakController::new(config, start, &mut grid, &mut rng);
        (controller, grid)
    }

    fn distance_to_anchor(center: [f64; 2]) -> f64 {
        (center[0] - 25.0).hypot(center[1] - 25.0)
    }

    #[test]
    fn cone_heights_follow_inverse_distance() {
        let cfg = cone(5.0, 5.0, -1.0);
        let center = [10.0, 10.0];
        assert!((peak_height(&cfg, center, [10.0, 10.0]) - 5.0).abs() < 1e-12);
        assert!((peak_height(&cfg, center, [15.0, 10.0]) - 5.0 / 6.0).abs() < 1e-12);
        assert!((peak_height(&cfg, center, [13.0, 14.0]) - 5.0 / 6.0).abs() < 1e-12);
        assert_eq!(peak_height(&cfg, center, [16.0, 10.0]), 0.0);
    }

    #[test]
    fn plateau_caps_edible_region() {
        let cfg = cone(3.0, 10.0, 2.0);
        let center = [10.0, 10.0];
        assert!((peak_height(&cfg, center, [11.0, 10.0]) - 2.0).abs() < 1e-12);
        assert!((peak_height(&cfg, center, [10.0, 10.0]) - 2.0).abs() < 1e-12);
        // slope below 1 is left alone
        assert!((peak_height(&cfg, center, [13.0, 10.0]) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn construction_paints_consistent_field() {
        let (controller, grid) = build(PeakConfig::default(), [25.0, 25.0], 1);
        assert_eq!(grid.data(), grid.initials());
        let sum: f64 = grid.data().iter().sum();
        assert!((grid.total() - sum).abs() < 1e-9);
        let [cx, cy] = controller.center();
        assert!((grid.amount(cx as usize, cy as usize) - 5.0).abs() < 1e-12);
        assert_eq!(controller.decay_counter(), 0);
        assert!(!controller.is_modified());
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let mut grid = ResourceGrid::new(50, 50, GridGeometry::Bounded);
        let mut rng = create_rng(0);
        let cfg = PeakConfig {
            move_a_scaler: 5.0,
            ..PeakConfig::default()
        };
        assert!(matches!(
            PeakController::try_new(cfg, [25.0, 25.0], &mut grid, &mut rng),
            Err(PeakConfigError::InvalidMoveScaler { .. })
        ));
        assert!(grid.data().iter().all(|&a| a == 0.0));
    }

    #[test]
    fn construction_rejects_halo_off_grid() {
        let mut grid = ResourceGrid::new(20, 20, GridGeometry::Bounded);
        let mut rng = create_rng(0);
        assert!(matches!(
            PeakController::try_new(halo_config(), [35.0, 25.0], &mut grid, &mut rng),
            Err(PeakConfigError::HaloOutsideGrid { .. })
        ));
    }

    #[test]
    fn bitten_peak_freezes_without_touching_grid() {
        let (mut controller, mut grid) = build(PeakConfig::default(), [25.0, 25.0], 2);
        let [cx, cy] = controller.center();
        let _ = grid.take(cx, cy, 1.0);
        controller.set_modified(true);

        let snapshot = grid.data().to_vec();
        let before = (
            controller.center(),
            controller.signs(),
            controller.move_scalar(),
            controller.step_counter(),
        );
        for tick in 1..=3 {
            assert_eq!(controller.advance(&mut grid, &mut create_rng(tick)), TickOutcome::Frozen);
            assert_eq!(controller.decay_counter(), tick as u32);
        }
        let after = (
            controller.center(),
            controller.signs(),
            controller.move_scalar(),
            controller.step_counter(),
        );
        assert_eq!(before, after);
        assert_eq!(grid.data(), snapshot.as_slice());
    }

    #[test]
    fn decay_threshold_triggers_refresh() {
        let cfg = PeakConfig {
            decay: 5,
            ..PeakConfig::default()
        };
        let (mut controller, mut grid) = build(cfg, [25.0, 25.0], 3);
        let mut rng = create_rng(33);
        controller.set_modified(true);
        let start = controller.center();

        for _ in 1..=4 {
            assert_eq!(controller.advance(&mut grid, &mut rng), TickOutcome::Frozen);
            assert_eq!(controller.center(), start);
        }
        assert_eq!(controller.advance(&mut grid, &mut rng), TickOutcome::Refreshed);
        assert!(!controller.is_modified());
        assert_eq!(controller.decay_counter(), 0);
        assert_eq!(grid.data(), grid.initials());
    }

    #[test]
    fn eaten_peak_moves_on_even_while_bitten() {
        let (mut controller, mut grid) = build(PeakConfig::default(), [25.0, 25.0], 4);
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let a = grid.amount(x, y);
                grid.set_amount(x, y, a.min(0.5));
            }
        }
        controller.set_modified(true);
        let outcome = controller.advance(&mut grid, &mut create_rng(44));
        assert_eq!(outcome, TickOutcome::Moved);
        assert!(controller.is_modified());
        assert_eq!(controller.decay_counter(), 0);
        assert!(grid.has_edible(EDIBLE_THRESHOLD));
    }

    #[test]
    fn refresh_keeps_plateau_inside_box() {
        let cfg = PeakConfig {
            height: 4.0,
            min_x: 5,
            max_x: 30,
            min_y: 10,
            max_y: 20,
            ..PeakConfig::default()
        };
        let (mut controller, _grid) = build(cfg, [15.0, 15.0], 5);
        let mut rng = create_rng(55);
        for _ in 0..500 {
            controller.relocate(&mut rng);
            let [x, y] = controller.center();
            assert!((9.0..=26.0).contains(&x), "x {x} outside refresh range");
            assert!((14.0..=16.0).contains(&y), "y {y} outside refresh range");
        }
    }

    #[test]
    fn halo_refresh_lands_on_inner_circle() {
        let (mut controller, _grid) = build(halo_config(), [35.0, 25.0], 6);
        let mut rng = create_rng(66);
        for _ in 0..500 {
            controller.relocate(&mut rng);
            let d = distance_to_anchor(controller.center());
            assert!((d - 10.0).abs() < 1e-9, "distance {d} off the inner circle");
        }
    }

    #[test]
    fn halo_movement_stays_in_band() {
        let (mut controller, mut grid) = build(halo_config(), [25.0, 37.0], 7);
        let mut rng = create_rng(77);
        for _ in 0..2_000 {
            controller.advance(&mut grid, &mut rng);
            let d = distance_to_anchor(controller.center());
            assert!((10.0 - 1e-9..=14.0 + 1e-9).contains(&d), "distance {d} left band");
        }
    }

    #[test]
    fn direction_counter_rolls_over() {
        let (mut controller, mut grid) = build(PeakConfig::default(), [25.0, 25.0], 8);
        let mut rng = create_rng(88);
        controller.step_counter = DIRECTION_PERIOD - 1;
        controller.advance(&mut grid, &mut rng);
        assert_eq!(controller.step_counter(), DIRECTION_PERIOD);
        controller.advance(&mut grid, &mut rng);
        assert_eq!(controller.step_counter(), 1);
    }

    #[test]
    fn same_seed_reproduces_trajectory() {
        let run = |seed| {
            let (mut controller, mut grid) = build(PeakConfig::default(), [25.0, 25.0], seed);
            let mut rng = create_rng(seed + 100);
            (0..200)
                .map(|_| {
                    controller.advance(&mut grid, &mut rng);
                    controller.center()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    proptest! {
        #[test]
        fn proptest_height_is_rotationally_symmetric(
            cx in 0i32..40,
            cy in 0i32..40,
            dx in -12i32..12,
            dy in -12i32..12,
            height in 0.5f64..8.0,
            spread in 0.0f64..15.0,
        ) {
            let cfg = cone(height, spread, -1.0);
            let center = [cx as f64, cy as f64];
            let at = |ox: i32, oy: i32| peak_height(&cfg, center, [(cx + ox) as f64, (cy + oy) as f64]);
            let h = at(dx, dy);
            prop_assert_eq!(h, at(-dy, dx));
            prop_assert_eq!(h, at(-dx, -dy));
            prop_assert_eq!(h, at(dy, -dx));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn proptest_box_invariant_holds_and_field_is_consistent(
            seed in any::<u64>(),
            a in 1.0f64..=4.0,
            bite_every in 1usize..10,
        ) {
            let cfg = PeakConfig {
                move_a_scaler: a,
                decay: 7,
                ..PeakConfig::default()
            };
            let (mut controller, mut grid) = build(cfg, [25.0, 25.0], seed);
            let mut rng = create_rng(seed ^ 0x5eed);
            for tick in 0..150usize {
                if tick % bite_every == 0 {
                    let [x, y] = controller.center();
                    if grid.take(x, y, 1.0) > 0.0 {
                        controller.set_modified(true);
                    }
                }
                let before = grid.data().to_vec();
                let outcome = controller.advance(&mut grid, &mut rng);
                if outcome == TickOutcome::Frozen {
                    prop_assert_eq!(grid.data(), before.as_slice());
                    prop_assert!(controller.decay_counter() < 7);
                } else {
                    prop_assert_eq!(grid.data(), grid.initials());
                }
                let [x, y] = controller.center();
                prop_assert!((0.0..=49.0).contains(&x) && (0.0..=49.0).contains(&y));
                prop_assert!(controller.move_scalar() > 0.0 && controller.move_scalar() < 1.0);
            }
        }
    }
}
