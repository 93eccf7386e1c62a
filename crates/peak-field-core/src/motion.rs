//! Movement primitives shared by box and halo confinement.

use rand::Rng;
use serde::{Deserialize, Serialize};

const SCALAR_FLOOR: f64 = f64::EPSILON;
const SCALAR_CEIL: f64 = 1.0 - f64::EPSILON;

/// Direction of travel along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveSign {
    Negative,
    Zero,
    Positive,
}

impl MoveSign {
    pub const ALL: [MoveSign; 3] = [MoveSign::Negative, MoveSign::Zero, MoveSign::Positive];

    pub fn value(self) -> f64 {
        match self {
            MoveSign::Negative => -1.0,
            MoveSign::Zero => 0.0,
            MoveSign::Positive => 1.0,
        }
    }

    /// Signs reachable when the direction is reconsidered. A reversal has to pass through `Zero`.
    pub fn successors(self) -> &'static [MoveSign] {
        match self {
            MoveSign::Negative => &[MoveSign::Negative, MoveSign::Zero],
            MoveSign::Zero => &[MoveSign::Negative, MoveSign::Zero, MoveSign::Positive],
            MoveSign::Positive => &[MoveSign::Zero, MoveSign::Positive],
        }
    }

    pub fn resample<R: Rng + ?Sized>(self, rng: &mut R) -> MoveSign {
        let options = self.successors();
        options[rng.random_range(0..options.len())]
    }

    fn draw<R: Rng + ?Sized>(rng: &mut R) -> MoveSign {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Draw a fresh pair of axis signs. At least one axis is always moving.
pub fn initial_signs<R: Rng + ?Sized>(rng: &mut R) -> [MoveSign; 2] {
    let x = MoveSign::draw(rng);
    let y = if x == MoveSign::Zero {
        if rng.random_bool(0.5) {
            MoveSign::Positive
        } else {
            MoveSign::Negative
        }
    } else {
        MoveSign::draw(rng)
    };
    [x, y]
}

/// Axis eligible for a direction change (and, under a halo, for movement) this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisChoice {
    Neither,
    X,
    Y,
}

impl AxisChoice {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> AxisChoice {
        match rng.random_range(0..3u8) {
            0 => AxisChoice::Neither,
            1 => AxisChoice::X,
            _ => AxisChoice::Y,
        }
    }
}

/// One iteration of the logistic map `a * x * (1 - x)`, kept strictly inside (0, 1).
pub fn logistic_step(a: f64, x: f64) -> f64 {
    (a * x * (1.0 - x)).clamp(SCALAR_FLOOR, SCALAR_CEIL)
}

/// Force the sign back toward the allowed interval when the tentative coordinate leaves it.
pub fn bounce(sign: MoveSign, tentative: f64, lo: f64, hi: f64) -> MoveSign {
    if tentative > hi {
        MoveSign::Negative
    } else if tentative < lo {
        MoveSign::Positive
    } else {
        sign
    }
}

/// Commit a move onto the cell lattice, rounding half up.
pub fn lattice_step(old: f64, sign: MoveSign, scalar: f64) -> f64 {
    (old + sign.value() * scalar + 0.5).floor()
}

/// Coordinate on the perpendicular axis that puts a point `offset` away from `anchor`
/// on the moving axis at distance `radius` from the anchor, on the given `side` (+1 / -1).
pub fn orthogonal_on_circle(offset: f64, anchor: f64, radius: f64, side: f64) -> f64 {
    let r_sq = radius * radius;
    let d_sq = offset * offset;
    anchor + side * (r_sq.max(d_sq) - r_sq.min(d_sq)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use proptest::prelude::*;

    #[test]
    fn no_direct_reversal_in_transition_table() {
        assert!(!MoveSign::Negative.successors().contains(&MoveSign::Positive));
        assert!(!MoveSign::Positive.successors().contains(&MoveSign::Negative));
        assert_eq!(MoveSign::Zero.successors().len(), 3);
    }

    #[test]
    fn resample_reaches_every_successor() {
        let mut rng = create_rng(3);
        for sign in MoveSign::ALL {
            let mut seen = Vec::new();
            for _ in 0..200 {
                let next = sign.resample(&mut rng);
                assert!(sign.successors().contains(&next));
                if !seen.contains(&next) {
                    seen.push(next);
                }
            }
            assert_eq!(seen.len(), sign.successors().len());
        }
    }

    #[test]
    fn initial_signs_never_both_zero() {
        let mut rng = create_rng(11);
        for _ in 0..500 {
            let [x, y] = initial_signs(&mut rng);
            assert!(x != MoveSign::Zero || y != MoveSign::Zero);
        }
    }

    #[test]
    fn logistic_at_four_does_not_collapse() {
        let mut x = 0.5;
        for _ in 0..100 {
            x = logistic_step(4.0, x);
            assert!(x > 0.0 && x < 1.0);
        }
    }

    #[test]
    fn logistic_at_two_holds_fixed_point() {
        assert!((logistic_step(2.0, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bounce_reverses_only_outside_interval() {
        assert_eq!(bounce(MoveSign::Positive, 10.5, 5.0, 10.0), MoveSign::Negative);
        assert_eq!(bounce(MoveSign::Negative, 4.5, 5.0, 10.0), MoveSign::Positive);
        assert_eq!(bounce(MoveSign::Zero, 7.0, 5.0, 10.0), MoveSign::Zero);
    }

    #[test]
    fn lattice_step_rounds_half_up() {
        assert!((lattice_step(10.0, MoveSign::Positive, 0.7) - 11.0).abs() < f64::EPSILON);
        assert!((lattice_step(10.0, MoveSign::Positive, 0.3) - 10.0).abs() < f64::EPSILON);
        assert!((lattice_step(10.0, MoveSign::Negative, 0.7) - 9.0).abs() < f64::EPSILON);
        assert!((lattice_step(10.0, MoveSign::Zero, 0.9) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn orthogonal_guards_against_negative_radicand() {
        let y = orthogonal_on_circle(5.0, 0.0, 3.0, 1.0);
        assert!(y.is_finite());
        assert!((y - 4.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn proptest_logistic_stays_in_open_unit_interval(
            a in 1.0f64..=4.0,
            x in 0.0001f64..0.9999,
        ) {
            let next = logistic_step(a, x);
            prop_assert!(next > 0.0 && next < 1.0);
        }

        #[test]
        fn proptest_orthogonal_preserves_radius(
            radius in 0.5f64..50.0,
            frac in -1.0f64..=1.0,
            anchor in -20.0f64..20.0,
            negative_side in any::<bool>(),
        ) {
            let offset = radius * frac;
            let side = if negative_side { -1.0 } else { 1.0 };
            let orth = orthogonal_on_circle(offset, anchor, radius, side);
            let dist = (offset * offset + (orth - anchor).powi(2)).sqrt();
            prop_assert!((dist - radius).abs() < 1e-9);
        }

        #[test]
        fn proptest_resample_respects_table(seed in any::<u64>(), idx in 0usize..3) {
            let mut rng = create_rng(seed);
            let sign = MoveSign::ALL[idx];
            let next = sign.resample(&mut rng);
            prop_assert!(sign.successors().contains(&next));
        }
    }
}
