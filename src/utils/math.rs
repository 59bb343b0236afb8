//! Additional color and sampling helpers layered on top of `glam`.

use glam::{Vec3, Vec4};

/// Rec.709 luminance of a linear color.
pub fn luminance(color: Vec3) -> f32 {
    color.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn saturate(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = saturate((x - edge0) / (edge1 - edge0).max(1e-6));
    t * t * (3.0 - 2.0 * t)
}

/// sRGB transfer function, applied per channel.
pub fn srgb_to_linear(color: Vec3) -> Vec3 {
    color.map(|c| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
}

pub fn linear_to_srgb(color: Vec3) -> Vec3 {
    color.map(|c| {
        let c = c.max(0.0);
        if c <= 0.003_130_8 {
            c * 12.92
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    })
}

// ALEXA LogC (EI 1000) curve; the color-grading LUT is indexed in this space.
const LOGC_CUT: f32 = 0.011_361;
const LOGC_A: f32 = 5.555_556;
const LOGC_B: f32 = 0.047_996;
const LOGC_C: f32 = 0.244_161;
const LOGC_D: f32 = 0.386_036;
const LOGC_E: f32 = 5.301_883;
const LOGC_F: f32 = 0.092_819;

pub fn linear_to_logc(color: Vec3) -> Vec3 {
    color.map(|x| {
        if x > LOGC_CUT {
            LOGC_C * (LOGC_A * x + LOGC_B).log10() + LOGC_D
        } else {
            LOGC_E * x + LOGC_F
        }
    })
}

pub fn logc_to_linear(color: Vec3) -> Vec3 {
    color.map(|x| {
        if x > LOGC_E * LOGC_CUT + LOGC_F {
            (10f32.powf((x - LOGC_D) / LOGC_C) - LOGC_B) / LOGC_A
        } else {
            (x - LOGC_F) / LOGC_E
        }
    })
}

/// Fitted ACES filmic curve (Narkowicz).
pub fn tonemap_aces(color: Vec3) -> Vec3 {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    ((color * (a * color + b)) / (color * (c * color + d) + e)).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Hable-style neutral curve driven by the `(a, b, c, d)` / `(e, f, white_level, white_clip)`
/// parameter pair the color grading effect writes.
pub fn tonemap_neutral(color: Vec3, params1: Vec4, params2: Vec4) -> Vec3 {
    let curve = |x: Vec3| {
        let (a, b, c, d) = (params1.x, params1.y, params1.z, params1.w);
        let (e, f) = (params2.x, params2.y);
        ((x * (a * x + c * b) + d * e) / (x * (a * x + b) + d * f)) - e / f
    };
    let white_scale = Vec3::ONE / curve(Vec3::splat(params2.z.max(1e-4)));
    let mapped = curve(color * white_scale) * white_scale;
    (mapped / params2.w.max(1e-4)).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Stateless integer hash mapped to `[0, 1)`; drives grain and dithering noise.
pub fn hash_noise(x: u32, y: u32, seed: u32) -> f32 {
    let mut h = x
        .wrapping_mul(0x8da6_b343)
        ^ y.wrapping_mul(0xd816_3841)
        ^ seed.wrapping_mul(0xcb1a_b31f);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Radical inverse in `base`; the TAA jitter sequence samples bases 2 and 3.
pub fn halton(mut index: u32, base: u32) -> f32 {
    let mut f = 1.0f32;
    let mut r = 0.0f32;
    while index > 0 {
        f /= base as f32;
        r += f * (index % base) as f32;
        index /= base;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn srgb_round_trip_is_stable() {
        let color = Vec3::new(0.2, 0.5, 0.9);
        let back = linear_to_srgb(srgb_to_linear(color));
        assert_relative_eq!(back.x, color.x, epsilon = 1e-4);
        assert_relative_eq!(back.z, color.z, epsilon = 1e-4);
    }

    #[test]
    fn logc_decodes_what_it_encodes() {
        let color = Vec3::new(0.0, 0.18, 4.0);
        let back = logc_to_linear(linear_to_logc(color));
        assert_relative_eq!(back.x, color.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, color.y, epsilon = 1e-4);
        assert_relative_eq!(back.z, color.z, epsilon = 1e-3);
    }

    #[test]
    fn halton_base_two_matches_known_values() {
        assert_relative_eq!(halton(1, 2), 0.5);
        assert_relative_eq!(halton(2, 2), 0.25);
        assert_relative_eq!(halton(3, 2), 0.75);
        assert_relative_eq!(halton(1, 3), 1.0 / 3.0);
    }

    #[test]
    fn hash_noise_is_deterministic_and_bounded() {
        let a = hash_noise(3, 7, 11);
        assert_eq!(a, hash_noise(3, 7, 11));
        assert!((0.0..1.0).contains(&a));
        assert_ne!(a, hash_noise(4, 7, 11));
    }
}
