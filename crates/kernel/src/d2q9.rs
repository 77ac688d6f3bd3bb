//! The D2Q9 velocity set: nine lattice directions, their weights, the
//! equilibrium distribution, and bounce-back reflection tables.

use serde::{Deserialize, Serialize};

/// Number of discrete directions.
pub const Q: usize = 9;

/// Direction vectors `(cx, cy)`: rest, the four axes, then the four diagonals.
pub const VELOCITIES: [(i32, i32); Q] = [
    (0, 0),
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

pub const WEIGHTS: [f32; Q] = [
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// `OPPOSITE[i]` points along `-VELOCITIES[i]`.
pub const OPPOSITE: [usize; Q] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

/// Equilibrium distribution for a given density and velocity.
///
/// `feq_i = w_i * rho * (1 + 3 cu + 4.5 cu^2 - 1.5 u^2)` with `cu = c_i . u`.
pub fn equilibrium(density: f32, ux: f32, uy: f32) -> [f32; Q] {
    let u_sq = ux * ux + uy * uy;
    std::array::from_fn(|i| {
        let (cx, cy) = VELOCITIES[i];
        let cu = cx as f32 * ux + cy as f32 * uy;
        WEIGHTS[i] * density * (1.0 + 3.0 * cu + 4.5 * cu * cu - 1.5 * u_sq)
    })
}

/// First moment `sum_i c_i f_i`, i.e. momentum before dividing by density.
pub fn momentum(f: &[f32; Q]) -> (f32, f32) {
    f.iter()
        .zip(VELOCITIES)
        .fold((0.0, 0.0), |(mx, my), (fi, (cx, cy))| {
            (mx + cx as f32 * fi, my + cy as f32 * fi)
        })
}

/// Scale `(ux, uy)` down to at most `limit` in magnitude, keeping its direction.
///
/// Non-finite input is returned unchanged.
pub fn limit_speed(ux: f32, uy: f32, limit: f32) -> (f32, f32) {
    let speed = (ux * ux + uy * uy).sqrt();
    if speed > limit {
        let k = limit / speed;
        (ux * k, uy * k)
    } else {
        (ux, uy)
    }
}

/// Where mass leaving a cell towards a wall or obstacle is put back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BounceBack {
    /// Full index reversal: every direction returns along its opposite.
    #[default]
    Opposite,
    /// `i` when `i % 4 == 0`, else `(i + 2) % 4`.
    ///
    /// Reverses directions 1 and 3 only. Directions 4 and 8 reflect onto
    /// themselves, direction 2 and the other diagonals land in rest or axis
    /// slots. Kept for parity with older runs; it changes the physics at
    /// every wall.
    Legacy,
}

impl BounceBack {
    /// Slot that receives mass reflected from direction `i`.
    pub const fn reflect(self, i: usize) -> usize {
        match self {
            Self::Opposite => OPPOSITE[i],
            Self::Legacy => {
                if i % 4 == 0 {
                    i
                } else {
                    (i + 2) % 4
                }
            }
        }
    }
}
