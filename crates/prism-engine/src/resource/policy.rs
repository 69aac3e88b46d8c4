use std::ops::Range;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Initial per-object attributes produced by a [`RandomPolicy`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ObjectAttributes {
    /// Straight RGBA.
    pub color: [f32; 4],
    /// Clip-space translation.
    pub offset: [f32; 2],
    /// Scale before aspect correction.
    pub base_scale: f32,
}

/// Source of initial attributes for newly created objects.
pub trait RandomPolicy {
    /// Attributes for the object created at position `index` of its pool.
    fn attributes(&mut self, index: usize) -> ObjectAttributes;
}

impl<F> RandomPolicy for F
where
    F: FnMut(usize) -> ObjectAttributes,
{
    fn attributes(&mut self, index: usize) -> ObjectAttributes {
        self(index)
    }
}

/// Hands every object the same attributes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedPolicy(pub ObjectAttributes);

impl RandomPolicy for FixedPolicy {
    fn attributes(&mut self, _index: usize) -> ObjectAttributes {
        self.0
    }
}

/// Random hue, offset and scale per object.
///
/// - hue uniform in `[0, 1)`, mapped through [`hue_to_rgb`], alpha 1
/// - offset uniform in [`OFFSET_RANGE`] per axis
/// - base scale uniform in [`SCALE_RANGE`]
#[derive(Debug)]
pub struct HuePolicy {
    rng: StdRng,
}

/// Clip-space offset range, per axis.
pub const OFFSET_RANGE: Range<f64> = -0.9..0.9;

/// Base scale range.
pub const SCALE_RANGE: Range<f64> = 0.2..0.5;

impl HuePolicy {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from OS entropy. The chosen seed is logged so a run can be replayed.
    pub fn from_entropy() -> Self {
        let seed: u64 = rand::random();
        log::info!("hue policy seed: {seed}");
        Self::seeded(seed)
    }
}

impl RandomPolicy for HuePolicy {
    fn attributes(&mut self, _index: usize) -> ObjectAttributes {
        let hue = self.rng.random_range(0.0..1.0);
        let [r, g, b] = hue_to_rgb(hue);
        let offset = [
            self.rng.random_range(OFFSET_RANGE) as f32,
            self.rng.random_range(OFFSET_RANGE) as f32,
        ];
        let base_scale = self.rng.random_range(SCALE_RANGE) as f32;

        ObjectAttributes {
            color: [r, g, b, 1.0],
            offset,
            base_scale,
        }
    }
}

/// Six-segment piecewise hue wheel.
///
/// Each channel is `clamp(|6·fract(hue − phase) − 3| − 1, 0, 1)` with phases
/// `1`, `1/3` and `2/3` for red, green and blue. This is not an HSV
/// conversion; callers depend on these exact values.
pub fn hue_to_rgb(hue: f64) -> [f32; 3] {
    const PHASES: [f64; 3] = [1.0, 1.0 / 3.0, 1.0 / 1.5];
    PHASES.map(|phase| {
        let x = fract(hue - phase);
        ((6.0 * x - 3.0).abs() - 1.0).clamp(0.0, 1.0) as f32
    })
}

#[inline]
fn fract(x: f64) -> f64 {
    x - x.floor()
}
