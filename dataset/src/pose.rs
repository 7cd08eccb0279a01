use std::fmt;

use nalgebra::{Matrix3, Rotation3, Vector3};
use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use rand_xoshiro::SplitMix64;

use crate::catalog::{BrickShape, Color};

pub const ANGLE_RANGE: std::ops::RangeInclusive<i32> = -180..=180;

/// Euler angles in whole degrees, applied X then Y then Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rotation {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Rotation {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            x: rng.random_range(ANGLE_RANGE),
            y: rng.random_range(ANGLE_RANGE),
            z: rng.random_range(ANGLE_RANGE),
        }
    }

    /// `I · Rx · Ry · Rz`.
    pub fn matrix(&self) -> Matrix3<f64> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), f64::from(self.x).to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), f64::from(self.y).to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), f64::from(self.z).to_radians());
        Matrix3::<f64>::identity() * (rx * ry * rz).into_inner()
    }
}

/// One placed brick. Lives for a single image.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceInstance {
    pub shape: BrickShape,
    pub color: Color,
    pub position: Vector3<f64>,
    pub rotation: Rotation,
}

impl PieceInstance {
    pub fn new(shape: BrickShape, color: Color, rotation: Rotation) -> Self {
        Self {
            shape,
            color,
            position: Vector3::zeros(),
            rotation,
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Vector3::new(x, y, z);
        self
    }
}

/// LDraw type-1 line: `1 <colour> x y z a b c d e f g h i <part>.dat`.
impl fmt::Display for PieceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1 {}", self.color.code)?;
        for v in self.position.iter() {
            write!(f, " {}", fmt_num(*v))?;
        }
        let m = self.rotation.matrix();
        for r in 0..3 {
            for c in 0..3 {
                write!(f, " {}", fmt_num(m[(r, c)]))?;
            }
        }
        write!(f, " {}.dat", self.shape.part)
    }
}

/// Six decimals, trailing zeros trimmed, no negative zero.
pub(crate) fn fmt_num(v: f64) -> String {
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        _ => s.to_string(),
    }
}

/// Draws poses. A run seed is expanded into one seed per piece so any image's
/// pose can be reproduced from the run seed and the image's position in the run.
pub struct PoseSampler {
    seed: u64,
    stream: SplitMix64,
}

impl PoseSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stream: SplitMix64::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_rotation(&mut self) -> Rotation {
        let mut rng = SmallRng::seed_from_u64(self.stream.next_u64());
        Rotation::sample(&mut rng)
    }

    pub fn next_piece(&mut self, shape: BrickShape, color: Color) -> PieceInstance {
        PieceInstance::new(shape, color, self.next_rotation())
    }
}
