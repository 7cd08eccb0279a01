//! Fixed lighting rigs. Every class is rendered once under each rig per pass.

/// A point light with a fade distance, in scene units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: [f64; 3],
    pub fade_distance: f64,
}

impl PointLight {
    pub const fn new(x: f64, y: f64, z: f64, fade_distance: f64) -> Self {
        Self {
            position: [x, y, z],
            fade_distance,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingRig {
    pub lights: [PointLight; 2],
}

const FADE: f64 = 5000.0;

const fn rig(a: [f64; 3], b: [f64; 3]) -> LightingRig {
    LightingRig {
        lights: [
            PointLight::new(a[0], a[1], a[2], FADE),
            PointLight::new(b[0], b[1], b[2], FADE),
        ],
    }
}

pub const RIGS: [LightingRig; 8] = [
    rig([-200.0, -200.0, -200.0], [-200.0, 200.0, -200.0]),
    rig([200.0, -200.0, -200.0], [-200.0, 200.0, -200.0]),
    rig([-200.0, 200.0, -200.0], [-200.0, -200.0, -200.0]),
    rig([200.0, 200.0, -200.0], [-200.0, -200.0, -200.0]),
    rig([-200.0, -200.0, 200.0], [200.0, 200.0, -200.0]),
    rig([200.0, -200.0, 200.0], [200.0, 200.0, 200.0]),
    rig([-200.0, 200.0, 200.0], [-200.0, -200.0, -200.0]),
    rig([200.0, 200.0, 200.0], [200.0, 200.0, -200.0]),
];

impl LightingRig {
    pub fn catalog() -> &'static [LightingRig] {
        &RIGS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        assert_eq!(LightingRig::catalog().len(), 8);
        for rig in LightingRig::catalog() {
            assert_eq!(rig.lights.len(), 2);
            assert!(rig.lights.iter().all(|l| l.fade_distance == FADE));
        }
    }

    #[test]
    fn test_rigs_are_distinct() {
        for (i, a) in RIGS.iter().enumerate() {
            for b in &RIGS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
