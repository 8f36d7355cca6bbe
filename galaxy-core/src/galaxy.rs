//! Procedural spiral-galaxy point cloud
//!
//! Arm membership is a function of the particle index (`i mod branches`), so
//! every arm receives the same number of particles. Radius, jitter and scale
//! are sampled from the injected random source.

use rand::Rng;
use std::f32::consts::TAU;

use crate::config::GalaxyConfig;
use crate::error::Result;

/// Flat per-particle attribute arrays
///
/// Index `i * 3` addresses particle `i` in every three-wide array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleBuffer {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub scales: Vec<f32>,
    pub randomness: Vec<f32>,
}

impl ParticleBuffer {
    pub fn with_count(count: usize) -> Self {
        Self {
            positions: vec![0.0; count * 3],
            colors: vec![0.0; count * 3],
            scales: vec![0.0; count],
            randomness: vec![0.0; count * 3],
        }
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    pub fn position(&self, i: usize) -> [f32; 3] {
        triple(&self.positions, i)
    }

    pub fn color(&self, i: usize) -> [f32; 3] {
        triple(&self.colors, i)
    }

    pub fn offset(&self, i: usize) -> [f32; 3] {
        triple(&self.randomness, i)
    }

    /// Base position plus the stored jitter, as drawn with no animation
    pub fn jittered_position(&self, i: usize) -> [f32; 3] {
        let p = self.position(i);
        let o = self.offset(i);
        [p[0] + o[0], p[1] + o[1], p[2] + o[2]]
    }

    /// CPU reference of the galaxy vertex stage.
    ///
    /// Rotates the base position around Y by `time * spin_speed / distance`
    /// (inner particles turn faster), then adds the jitter.
    pub fn animated_position(&self, i: usize, time: f32, spin_speed: f32) -> [f32; 3] {
        let [x, y, z] = self.position(i);
        let distance = (x * x + z * z).sqrt();
        let (x, z) = if distance > 1e-6 {
            let angle = z.atan2(x) + time * spin_speed / distance;
            (angle.cos() * distance, angle.sin() * distance)
        } else {
            (x, z)
        };
        let o = self.offset(i);
        [x + o[0], y + o[1], z + o[2]]
    }
}

fn triple(data: &[f32], i: usize) -> [f32; 3] {
    let i3 = i * 3;
    [data[i3], data[i3 + 1], data[i3 + 2]]
}

/// Angle of the arm that particle `index` belongs to
pub fn branch_angle(index: u32, branches: u32) -> f32 {
    (index % branches) as f32 / branches as f32 * TAU
}

/// One jitter component: `±U^power`, sign chosen by a fair coin
fn jitter<R: Rng + ?Sized>(rng: &mut R, power: f32) -> f32 {
    let magnitude = rng.gen::<f32>().powf(power);
    if rng.gen::<f32>() < 0.5 {
        magnitude
    } else {
        -magnitude
    }
}

/// Build a fresh particle buffer for `config`
pub fn generate<R: Rng + ?Sized>(config: &GalaxyConfig, rng: &mut R) -> Result<ParticleBuffer> {
    config.validate()?;

    let count = config.count as usize;
    let mut buffer = ParticleBuffer::with_count(count);

    for i in 0..count {
        let i3 = i * 3;

        let radius = rng.gen::<f32>() * config.radius;
        let spin_angle = radius * config.spin;
        let angle = branch_angle(i as u32, config.branches) + spin_angle;

        buffer.positions[i3] = angle.cos() * radius;
        buffer.positions[i3 + 1] = 0.0;
        buffer.positions[i3 + 2] = angle.sin() * radius;

        for axis in 0..3 {
            buffer.randomness[i3 + axis] = jitter(rng, config.randomness_power);
        }

        let mixed = config
            .inside_color
            .lerp(config.outside_color, radius / config.radius);
        buffer.colors[i3] = mixed.r;
        buffer.colors[i3 + 1] = mixed.g;
        buffer.colors[i3 + 2] = mixed.b;

        buffer.scales[i] = rng.gen::<f32>();
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::error::CoreError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    fn small_config() -> GalaxyConfig {
        GalaxyConfig {
            count: 1_000,
            ..GalaxyConfig::default()
        }
    }

    fn arm_angle(p: [f32; 3]) -> f32 {
        p[2].atan2(p[0]).rem_euclid(TAU)
    }

    #[test]
    fn test_buffer_lengths_match_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let buffer = generate(&small_config(), &mut rng).unwrap();
        assert_eq!(buffer.len(), 1_000);
        assert_eq!(buffer.positions.len(), 3_000);
        assert_eq!(buffer.colors.len(), 3_000);
        assert_eq!(buffer.randomness.len(), 3_000);
        assert_eq!(buffer.scales.len(), 1_000);
    }

    #[test]
    fn test_colors_and_scales_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let buffer = generate(&small_config(), &mut rng).unwrap();
        assert!(buffer.colors.iter().all(|c| (0.0..=1.0).contains(c)));
        assert!(buffer.scales.iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[test]
    fn test_branch_angle_is_periodic() {
        for branches in 1..8 {
            for i in 0..50 {
                assert_eq!(branch_angle(i, branches), branch_angle(i + branches, branches));
            }
        }
    }

    #[test]
    fn test_single_branch_has_zero_angle() {
        assert!((0..100).all(|i| branch_angle(i, 1) == 0.0));

        let config = GalaxyConfig {
            count: 200,
            branches: 1,
            spin: 0.0,
            ..GalaxyConfig::default()
        };
        let buffer = generate(&config, &mut StdRng::seed_from_u64(3)).unwrap();
        for i in 0..buffer.len() {
            let [x, _, z] = buffer.position(i);
            assert!(x >= 0.0);
            assert!(z.abs() < 1e-4);
        }
    }

    #[test]
    fn test_regeneration_differs_but_keeps_shape() {
        let config = small_config();
        let mut rng = rand::thread_rng();
        let a = generate(&config, &mut rng).unwrap();
        let b = generate(&config, &mut rng).unwrap();
        assert_eq!(a.positions.len(), b.positions.len());
        assert_eq!(a.scales.len(), b.scales.len());
        assert_ne!(a.positions, b.positions);
    }

    #[test]
    fn test_two_arm_scenario() {
        let config = GalaxyConfig {
            count: 100,
            branches: 2,
            radius: 5.0,
            spin: 0.0,
            randomness_power: 1.0,
            ..GalaxyConfig::default()
        };
        let buffer = generate(&config, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(buffer.positions.len(), 300);

        let mut arms = [0usize; 2];
        for i in 0..buffer.len() {
            let p = buffer.position(i);
            let r = (p[0] * p[0] + p[2] * p[2]).sqrt();
            assert!(r <= 5.0 + 1e-5);
            if r < 1e-4 {
                arms[i % 2] += 1;
                continue;
            }
            let angle = arm_angle(p);
            if angle.abs() < 1e-3 || (angle - TAU).abs() < 1e-3 {
                arms[0] += 1;
            } else if (angle - PI).abs() < 1e-3 {
                arms[1] += 1;
            } else {
                panic!("particle {} at unexpected angle {}", i, angle);
            }
        }
        assert_eq!(arms, [50, 50]);
    }

    #[test]
    fn test_colour_follows_radius() {
        let config = GalaxyConfig {
            count: 500,
            inside_color: Color::new(1.0, 0.0, 0.0),
            outside_color: Color::new(0.0, 0.0, 1.0),
            ..GalaxyConfig::default()
        };
        let buffer = generate(&config, &mut StdRng::seed_from_u64(5)).unwrap();
        for i in 0..buffer.len() {
            let p = buffer.position(i);
            let t = (p[0] * p[0] + p[2] * p[2]).sqrt() / config.radius;
            let c = buffer.color(i);
            assert!((c[2] - t).abs() < 1e-3, "blue {} vs t {}", c[2], t);
        }
    }

    #[test]
    fn test_jitter_stays_within_unit_spread() {
        let config = GalaxyConfig {
            count: 2_000,
            randomness_power: 3.0,
            ..GalaxyConfig::default()
        };
        let buffer = generate(&config, &mut StdRng::seed_from_u64(9)).unwrap();
        assert!(buffer.randomness.iter().all(|o| o.abs() <= 1.0));
        assert!(buffer.randomness.iter().any(|o| *o > 0.0));
        assert!(buffer.randomness.iter().any(|o| *o < 0.0));
    }

    #[test]
    fn test_linear_power_reaches_full_spread() {
        let config = GalaxyConfig {
            count: 10_000,
            randomness_power: 1.0,
            ..GalaxyConfig::default()
        };
        let buffer = generate(&config, &mut StdRng::seed_from_u64(21)).unwrap();
        let widest = buffer.randomness.iter().fold(0.0f32, |m, o| m.max(o.abs()));
        assert!(widest > 0.5, "widest jitter {}", widest);
        assert!(widest <= 1.0);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        for config in [
            GalaxyConfig { count: 0, ..GalaxyConfig::default() },
            GalaxyConfig { branches: 0, ..GalaxyConfig::default() },
            GalaxyConfig { radius: 0.0, ..GalaxyConfig::default() },
        ] {
            assert!(matches!(
                generate(&config, &mut rng),
                Err(CoreError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn test_animation_preserves_distance() {
        let config = GalaxyConfig {
            count: 50,
            ..GalaxyConfig::default()
        };
        let buffer = generate(&config, &mut StdRng::seed_from_u64(2)).unwrap();
        for i in 0..buffer.len() {
            let p = buffer.position(i);
            let o = buffer.offset(i);
            let q = buffer.animated_position(i, 12.0, 0.2);
            let q = [q[0] - o[0], q[1] - o[1], q[2] - o[2]];
            let before = (p[0] * p[0] + p[2] * p[2]).sqrt();
            let after = (q[0] * q[0] + q[2] * q[2]).sqrt();
            assert!((before - after).abs() < 1e-4);
        }
        let still = buffer.animated_position(0, 0.0, 0.2);
        let base = buffer.jittered_position(0);
        assert!((0..3).all(|k| (still[k] - base[k]).abs() < 1e-4));
    }
}
