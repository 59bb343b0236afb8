//! Per-texel programs for the built-in post-processing shaders.
//!
//! Each program reads the same parameter names, keywords and passes the
//! effects write, so the stack can be exercised end to end on the CPU.
//! They are reference implementations of each contract, not ports of
//! production shader code.

use glam::{Mat3, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};
use std::collections::HashMap;
use std::f32::consts::TAU;

use super::image::Image;
use crate::config::{shaders as names, DITHERING_TILE_SIZE, GRAIN_LOOKUP_SIZE};
use crate::core::material::{keywords, uniforms, Material};
use crate::core::types::TextureId;
use crate::utils::allocator::Arena;
use crate::utils::math::{
    hash_noise, lerp, linear_to_logc, linear_to_srgb, logc_to_linear, luminance, smoothstep,
    srgb_to_linear, tonemap_aces, tonemap_neutral,
};

/// A shader program: `(inputs, uv, pixel) -> color` for one destination texel.
pub type ShaderProgram = fn(&ShaderInputs<'_>, Vec2, UVec2) -> Vec4;

/// Everything a program can read while shading one blit.
pub struct ShaderInputs<'a> {
    pub source: Option<&'a Image>,
    /// Contents of the destination before the blit.
    pub destination: Option<&'a Image>,
    pub material: &'a Material,
    pub pass: u32,
    pub target_size: UVec2,
    pub(crate) textures: &'a Arena<Image>,
    pub(crate) globals: &'a HashMap<&'static str, TextureId>,
}

impl<'a> ShaderInputs<'a> {
    /// Material texture, falling back to a global texture of the same name.
    pub fn texture(&self, name: &str) -> Option<&'a Image> {
        self.material
            .texture(name)
            .or_else(|| self.globals.get(name).copied())
            .and_then(|texture| self.textures.get(texture.0))
    }

    pub fn float(&self, name: &str) -> f32 {
        self.material.float(name).unwrap_or(0.0)
    }

    pub fn vector(&self, name: &str) -> Vec4 {
        self.material.vector(name).unwrap_or(Vec4::ZERO)
    }

    pub fn keyword(&self, keyword: &str) -> bool {
        self.material.is_keyword_enabled(keyword)
    }

    pub fn sample_source(&self, uv: Vec2) -> Vec4 {
        self.source.map_or(Vec4::ZERO, |image| image.sample(uv))
    }

    pub fn source_texel(&self) -> Vec2 {
        self.source
            .map_or(Vec2::ONE / self.target_size.as_vec2(), Image::texel_size)
    }

    pub fn destination_texel(&self, pixel: UVec2) -> Vec4 {
        self.destination
            .map_or(Vec4::ZERO, |image| image.load(pixel.x as i32, pixel.y as i32))
    }
}

/// Programs registered by [`SoftwareDevice::new`](super::SoftwareDevice::new).
pub fn builtin() -> Vec<(&'static str, ShaderProgram)> {
    vec![
        (names::UBER, uber as ShaderProgram),
        (names::FXAA, fxaa as ShaderProgram),
        (names::TAA, temporal_aa as ShaderProgram),
        (names::EYE_ADAPTATION, eye_adaptation as ShaderProgram),
        (names::DEPTH_OF_FIELD, depth_of_field as ShaderProgram),
        (names::BLOOM, bloom as ShaderProgram),
        (names::LUT_GENERATOR, lut_generator as ShaderProgram),
        (names::AMBIENT_OCCLUSION, ambient_occlusion as ShaderProgram),
        (
            names::SCREEN_SPACE_REFLECTION,
            screen_space_reflection as ShaderProgram,
        ),
        (names::FOG, fog as ShaderProgram),
        (names::MOTION_BLUR, motion_blur as ShaderProgram),
        (names::DEBUG_VIEWS, debug_views as ShaderProgram),
    ]
}

const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];
const CROSS: [(f32, f32); 4] = [(0.0, -1.0), (0.0, 1.0), (-1.0, 0.0), (1.0, 0.0)];
const SKY_DEPTH: f32 = 0.9999;

fn pow3(value: Vec3, exponent: Vec3) -> Vec3 {
    Vec3::new(
        value.x.powf(exponent.x),
        value.y.powf(exponent.y),
        value.z.powf(exponent.z),
    )
}

fn linear_to_lms(color: Vec3) -> Vec3 {
    Mat3::from_cols(
        Vec3::new(3.904_05e-1, 7.084_16e-2, 2.310_82e-2),
        Vec3::new(5.499_41e-1, 9.631_72e-1, 1.280_21e-1),
        Vec3::new(8.926_32e-3, 1.357_75e-3, 9.362_45e-1),
    ) * color
}

fn lms_to_linear(color: Vec3) -> Vec3 {
    Mat3::from_cols(
        Vec3::new(2.858_47, -2.101_82e-1, -4.181_20e-2),
        Vec3::new(-1.628_79, 1.158_20, -1.181_69e-1),
        Vec3::new(-2.489_10e-2, 3.242_81e-4, 1.068_67),
    ) * color
}

/// Trilinear lookup into a `size² × size` LUT strip.
fn sample_lut_strip(lut: &Image, coords: Vec3) -> Vec3 {
    let size = lut.height() as f32;
    if size < 2.0 {
        return coords;
    }
    let scaled = coords.clamp(Vec3::ZERO, Vec3::ONE) * (size - 1.0);
    let slice = scaled.z.floor();
    let next = (slice + 1.0).min(size - 1.0);
    let at = |s: f32| lut.bilinear(Vec2::new(s * size + scaled.x, scaled.y)).truncate();
    at(slice).lerp(at(next), scaled.z - slice)
}

fn grain_and_dither(inputs: &ShaderInputs<'_>, mut color: Vec3, uv: Vec2) -> Vec3 {
    if inputs.keyword(keywords::GRAIN) {
        let params1 = inputs.vector(uniforms::GRAIN_PARAMS1);
        let params2 = inputs.vector(uniforms::GRAIN_PARAMS2);
        let cell = ((uv * params2.xy() + params2.zw()) * GRAIN_LOOKUP_SIZE)
            .floor()
            .as_uvec2();
        let noise = |seed: u32| hash_noise(cell.x, cell.y, seed) - 0.5;
        let grain = if inputs.keyword(keywords::GRAIN_COLORED) {
            Vec3::new(noise(1), noise(2), noise(3))
        } else {
            Vec3::splat(noise(1))
        };
        let response = 1.0 - luminance(color.clamp(Vec3::ZERO, Vec3::ONE)).sqrt();
        let response = lerp(1.0, response, params1.x);
        color += color * grain * params1.y * response;
    }

    if inputs.keyword(keywords::DITHERING) {
        let coords = inputs.vector(uniforms::DITHERING_COORDS);
        let cell = ((uv * coords.xy() + coords.zw()) * DITHERING_TILE_SIZE)
            .floor()
            .as_uvec2();
        let noise = hash_noise(cell.x, cell.y, 7) * 2.0 - 1.0;
        let noise = noise.signum() * (1.0 - (1.0 - noise.abs()).sqrt());
        color += Vec3::splat(noise / 255.0);
    }

    color
}

fn uber(inputs: &ShaderInputs<'_>, uv: Vec2, _pixel: UVec2) -> Vec4 {
    let gamma = inputs.keyword(keywords::COLORSPACE_GAMMA);
    let fetch = |uv: Vec2| {
        let color = inputs.sample_source(uv).truncate();
        if gamma {
            srgb_to_linear(color)
        } else {
            color
        }
    };

    let alpha = inputs.sample_source(uv).w;
    let mut color = fetch(uv);

    if inputs.keyword(keywords::CHROMATIC_ABERRATION) {
        let amount = inputs.float(uniforms::CHROMATIC_ABERRATION_AMOUNT);
        let coords = 2.0 * uv - 1.0;
        let offset = coords * coords.length_squared() * amount;
        color.x = fetch(uv - offset).x;
        color.z = fetch(uv + offset).z;
    }

    let exposure = inputs
        .texture(uniforms::AUTO_EXPOSURE)
        .map_or(1.0, |texture| texture.load(0, 0).x);
    color *= exposure;

    if let Some(dof) = inputs.texture(uniforms::DEPTH_OF_FIELD_TEX) {
        let blurred = dof.sample(uv);
        if inputs.keyword(keywords::DEPTH_OF_FIELD_COC_VIEW) {
            color = Vec3::new(blurred.w, blurred.w, 0.0);
        } else if inputs.keyword(keywords::DEPTH_OF_FIELD) {
            color = color.lerp(blurred.truncate() * exposure, blurred.w);
        }
    }

    if inputs.keyword(keywords::BLOOM) {
        if let Some(bloom) = inputs.texture(uniforms::BLOOM_TEX) {
            let settings = inputs.vector(uniforms::BLOOM_SETTINGS);
            let bloom = bloom.sample(uv).truncate() * settings.y;
            color += bloom;
            if inputs.keyword(keywords::BLOOM_LENS_DIRT) {
                if let Some(dirt) = inputs.texture(uniforms::BLOOM_DIRT_TEX) {
                    let intensity = inputs.float(uniforms::BLOOM_DIRT_INTENSITY);
                    color += bloom * dirt.sample(uv).truncate() * intensity;
                }
            }
        }
    }

    if inputs.keyword(keywords::VIGNETTE_CLASSIC) {
        let settings = inputs.vector(uniforms::VIGNETTE_SETTINGS);
        let center = inputs.vector(uniforms::VIGNETTE_CENTER).xy();
        let mut d = (uv - center).abs() * settings.x;
        if settings.w > 0.5 {
            d.x *= inputs.target_size.x as f32 / inputs.target_size.y.max(1) as f32;
        }
        let d = d.powf(settings.z.max(1e-3));
        let factor = (1.0 - d.length_squared()).clamp(0.0, 1.0).powf(settings.y);
        let tint = inputs.vector(uniforms::VIGNETTE_COLOR).truncate();
        color *= tint.lerp(Vec3::ONE, factor);
    } else if inputs.keyword(keywords::VIGNETTE_MASKED) {
        if let Some(mask) = inputs.texture(uniforms::VIGNETTE_MASK) {
            let factor = mask.sample(uv).w;
            let tint = inputs.vector(uniforms::VIGNETTE_COLOR).truncate();
            let vignetted = color * tint.lerp(Vec3::ONE, factor);
            color = color.lerp(vignetted, inputs.float(uniforms::VIGNETTE_OPACITY));
        }
    }

    if inputs.keyword(keywords::COLOR_GRADING) {
        if let Some(lut) = inputs.texture(uniforms::LOG_LUT) {
            color *= inputs.float(uniforms::EXPOSURE_EV);
            color = sample_lut_strip(lut, linear_to_logc(color));
        }
    } else if inputs.keyword(keywords::COLOR_GRADING_LOG_VIEW) {
        color = linear_to_logc(color);
    }

    if inputs.keyword(keywords::USER_LUT) {
        if let Some(lut) = inputs.texture(uniforms::USER_LUT) {
            let contribution = inputs.vector(uniforms::USER_LUT_PARAMS).w;
            let encoded = linear_to_srgb(color.clamp(Vec3::ZERO, Vec3::ONE));
            let graded = sample_lut_strip(lut, encoded);
            color = srgb_to_linear(encoded.lerp(graded, contribution));
        }
    }

    color = grain_and_dither(inputs, color, uv);

    if gamma {
        color = linear_to_srgb(color);
    }
    color.extend(alpha)
}

fn fxaa(inputs: &ShaderInputs<'_>, uv: Vec2, _pixel: UVec2) -> Vec4 {
    let texel = inputs.source_texel();
    let quality = inputs.vector(uniforms::QUALITY_SETTINGS);
    let luma = |color: Vec4| luminance(color.truncate().clamp(Vec3::ZERO, Vec3::ONE));

    let center = inputs.sample_source(uv);
    let neighbours = CROSS.map(|(x, y)| inputs.sample_source(uv + Vec2::new(x, y) * texel));
    let center_luma = luma(center);
    let (mut lo, mut hi, mut luma_sum) = (center_luma, center_luma, 0.0);
    let mut average = Vec3::ZERO;
    for neighbour in neighbours {
        let l = luma(neighbour);
        lo = lo.min(l);
        hi = hi.max(l);
        luma_sum += l;
        average += neighbour.truncate() * 0.25;
    }

    let range = hi - lo;
    let mut color = center.truncate();
    if range >= quality.z.max(hi * quality.y) {
        let subpixel = ((luma_sum * 0.25 - center_luma).abs() / range).clamp(0.0, 1.0);
        let blend = (smoothstep(0.0, 1.0, subpixel) * quality.x).max(0.25);
        color = color.lerp(average, blend);
    }

    grain_and_dither(inputs, color, uv).extend(center.w)
}

fn temporal_aa(inputs: &ShaderInputs<'_>, uv: Vec2, _pixel: UVec2) -> Vec4 {
    let jitter = inputs.vector(uniforms::JITTER).xy();
    let texel = inputs.source_texel();
    let unjittered = uv - jitter;

    let current = inputs.sample_source(unjittered);
    let motion = inputs
        .texture(uniforms::CAMERA_MOTION_VECTORS_TEXTURE)
        .map_or(Vec2::ZERO, |texture| texture.sample(uv).xy());
    let history = inputs
        .texture(uniforms::HISTORY_TEX)
        .map_or(current, |texture| texture.sample(uv - motion));

    let (mut lo, mut hi, mut sum) = (current, current, Vec4::ZERO);
    for (x, y) in CROSS {
        let neighbour = inputs.sample_source(unjittered + Vec2::new(x, y) * texel);
        lo = lo.min(neighbour);
        hi = hi.max(neighbour);
        sum += neighbour;
    }

    let sharpen = inputs.vector(uniforms::SHARPEN_PARAMETERS).x;
    let sharpened = (current + (current - sum * 0.25) * sharpen).max(Vec4::ZERO);
    let history = history.clamp(lo, hi);

    let blend = inputs.vector(uniforms::FINAL_BLEND_PARAMETERS);
    let weight = lerp(blend.x, blend.y, (motion.length() * blend.z).clamp(0.0, 1.0));
    sharpened.lerp(history, weight)
}

fn eye_adaptation(inputs: &ShaderInputs<'_>, _uv: Vec2, _pixel: UVec2) -> Vec4 {
    let speed = inputs.vector(uniforms::EYE_SPEED);
    let exposure = match inputs.pass {
        0 => {
            // Average log luminance over the kept part of the histogram.
            let Some(source) = inputs.source else {
                return Vec4::ONE;
            };
            let params = inputs.vector(uniforms::EYE_PARAMS);
            let mut ev: Vec<f32> = source
                .pixels
                .iter()
                .map(|texel| {
                    luminance(texel.truncate())
                        .max(1e-5)
                        .log2()
                        .clamp(params.z, params.w.max(params.z))
                })
                .collect();
            ev.sort_by(f32::total_cmp);

            let count = ev.len();
            let low = ((count as f32 * params.x) as usize).min(count - 1);
            let high = ((count as f32 * params.y).ceil() as usize).clamp(low + 1, count);
            let average = (ev[low..high].iter().sum::<f32>() / (high - low) as f32).exp2();

            let key = if speed.w > 0.5 {
                1.03 - 2.0 / (2.0 + (average + 1.0).log10())
            } else {
                inputs.float(uniforms::EYE_EXPOSURE_COMPENSATION)
            };
            key / average
        }
        _ => {
            let target = inputs.source.map_or(1.0, |image| image.load(0, 0).x);
            let previous = inputs
                .texture(uniforms::HISTORY_TEX)
                .map_or(target, |image| image.load(0, 0).x);
            let delta = target - previous;
            let rate = if delta > 0.0 { speed.y } else { speed.x };
            previous + delta * (1.0 - (-speed.z * rate).exp2())
        }
    };
    Vec4::new(exposure, exposure, exposure, 1.0)
}

fn depth_of_field(inputs: &ShaderInputs<'_>, uv: Vec2, _pixel: UVec2) -> Vec4 {
    // (focus distance, lens coefficient, max CoC, 1 / max CoC)
    let params = inputs.vector(uniforms::DEPTH_OF_FIELD_PARAMS);
    // (jitter x, jitter y, history blending, 0)
    let taa = inputs.vector(uniforms::TAA_PARAMS);
    let coc_at = |uv: Vec2| {
        inputs
            .texture(uniforms::COC_TEX)
            .map_or(0.0, |coc| (coc.sample(uv).x * 2.0 - 1.0) * params.z)
    };

    match inputs.pass {
        0 => {
            let far = inputs.float(uniforms::FAR_CLIP);
            let coc = inputs
                .texture(uniforms::CAMERA_DEPTH_TEXTURE)
                .map_or(0.0, |depth| {
                    let distance = depth.sample(uv - taa.xy()).x * far;
                    (distance - params.x) * params.y / distance.max(1e-5)
                });
            let coc = (coc * 0.5 * params.w + 0.5).clamp(0.0, 1.0);
            Vec4::new(coc, coc, coc, 1.0)
        }
        1 => {
            let current = inputs.sample_source(uv).x;
            let history = inputs
                .texture(uniforms::COC_HISTORY)
                .map_or(current, |texture| texture.sample(uv).x);
            let coc = lerp(current, history, taa.z);
            Vec4::new(coc, coc, coc, 1.0)
        }
        2 => inputs.sample_source(uv).truncate().extend(coc_at(uv)),
        3..=6 => bokeh(inputs, uv, params.z, inputs.pass - 2),
        _ => {
            let texel = inputs.source_texel() * 0.5;
            let blurred = CORNERS
                .iter()
                .map(|&(x, y)| inputs.sample_source(uv + Vec2::new(x, y) * texel))
                .sum::<Vec4>()
                * 0.25;
            let pixel_height = 1.0 / inputs.target_size.y.max(1) as f32;
            let alpha = smoothstep(pixel_height * 2.0, pixel_height * 4.0, coc_at(uv).abs());
            blurred.truncate().extend(alpha)
        }
    }
}

/// Gather bokeh over `rings` concentric rings; CoC is stored in alpha in
/// units of screen height.
fn bokeh(inputs: &ShaderInputs<'_>, uv: Vec2, max_coc: f32, rings: u32) -> Vec4 {
    let center = inputs.sample_source(uv);
    let aspect = inputs.target_size.y as f32 / inputs.target_size.x.max(1) as f32;
    let mut sum = center.truncate();
    let mut count = 1.0;
    for ring in 1..=rings {
        let radius = max_coc * ring as f32 / rings as f32;
        let samples = ring * 8;
        for i in 0..samples {
            let angle = TAU * i as f32 / samples as f32;
            let offset = Vec2::new(angle.cos() * aspect, angle.sin()) * radius;
            let tap = inputs.sample_source(uv + offset);
            if tap.w.abs() >= radius {
                sum += tap.truncate();
                count += 1.0;
            }
        }
    }
    (sum / count).extend(center.w)
}

fn bloom(inputs: &ShaderInputs<'_>, uv: Vec2, _pixel: UVec2) -> Vec4 {
    let texel = inputs.source_texel();
    let taps = |scale: f32| {
        CORNERS.map(|(x, y)| inputs.sample_source(uv + Vec2::new(x, y) * texel * scale))
    };

    match inputs.pass {
        0 => {
            let mut color = if inputs.keyword(keywords::ANTI_FLICKER) {
                // Karis average suppresses single bright texels.
                let (mut sum, mut weight) = (Vec3::ZERO, 0.0);
                for tap in taps(1.0) {
                    let w = 1.0 / (1.0 + luminance(tap.truncate()));
                    sum += tap.truncate() * w;
                    weight += w;
                }
                sum / weight
            } else {
                inputs.sample_source(uv).truncate()
            };

            color *= inputs
                .texture(uniforms::AUTO_EXPOSURE)
                .map_or(1.0, |texture| texture.load(0, 0).x);

            let threshold = inputs.float(uniforms::THRESHOLD);
            let curve = inputs.vector(uniforms::CURVE);
            let brightness = color.max_element();
            let soft = (brightness - curve.x).clamp(0.0, curve.y.max(0.0));
            let soft = curve.z * soft * soft;
            color *= soft.max(brightness - threshold) / brightness.max(1e-5);
            color.extend(1.0)
        }
        1 => (taps(1.0).iter().sum::<Vec4>() * 0.25).truncate().extend(1.0),
        _ => {
            let scale = inputs.float(uniforms::SAMPLE_SCALE) * 0.5;
            let upsampled = taps(scale).iter().sum::<Vec4>() * 0.25;
            let base = inputs
                .texture(uniforms::BASE_TEX)
                .map_or(Vec4::ZERO, |texture| texture.sample(uv));
            (base + upsampled).truncate().extend(1.0)
        }
    }
}

fn lut_generator(inputs: &ShaderInputs<'_>, _uv: Vec2, pixel: UVec2) -> Vec4 {
    let size = inputs.target_size.y.max(2);
    let scale = 1.0 / (size - 1) as f32;
    let log = Vec3::new(
        (pixel.x % size) as f32,
        pixel.y as f32,
        (pixel.x / size) as f32,
    ) * scale;
    let mut color = logc_to_linear(log);

    color = lms_to_linear(linear_to_lms(color) * inputs.vector(uniforms::BALANCE).truncate());
    let red = inputs.vector(uniforms::CHANNEL_MIXER_RED).truncate();
    let green = inputs.vector(uniforms::CHANNEL_MIXER_GREEN).truncate();
    let blue = inputs.vector(uniforms::CHANNEL_MIXER_BLUE).truncate();
    color = Vec3::new(red.dot(color), green.dot(color), blue.dot(color));

    let hue = inputs.float(uniforms::HUE_SHIFT);
    if hue != 0.0 {
        color = Mat3::from_axis_angle(Vec3::ONE.normalize(), hue) * color;
    }

    let luma = luminance(color);
    color = Vec3::splat(luma) + (color - luma) * inputs.float(uniforms::SATURATION);

    let mid_grey = linear_to_logc(Vec3::splat(0.18));
    let contrast = inputs.float(uniforms::CONTRAST);
    color = logc_to_linear((linear_to_logc(color.max(Vec3::ZERO)) - mid_grey) * contrast + mid_grey);

    color = color * inputs.vector(uniforms::GAIN).truncate() + inputs.vector(uniforms::LIFT).truncate();
    color = pow3(color.max(Vec3::ZERO), inputs.vector(uniforms::INV_GAMMA).truncate());

    if inputs.keyword(keywords::TONEMAPPING_ACES) {
        color = tonemap_aces(color);
    } else if inputs.keyword(keywords::TONEMAPPING_NEUTRAL) {
        color = tonemap_neutral(
            color,
            inputs.vector(uniforms::NEUTRAL_TONEMAPPER_PARAMS1),
            inputs.vector(uniforms::NEUTRAL_TONEMAPPER_PARAMS2),
        );
    }
    color.extend(1.0)
}

fn ambient_occlusion(inputs: &ShaderInputs<'_>, uv: Vec2, pixel: UVec2) -> Vec4 {
    match inputs.pass {
        0 => {
            let from_normals = inputs.keyword(keywords::SOURCE_DEPTHNORMALS);
            let depth_texture = if from_normals {
                inputs.texture(uniforms::CAMERA_DEPTH_NORMALS_TEXTURE)
            } else {
                inputs.texture(uniforms::CAMERA_DEPTH_TEXTURE)
            };
            let Some(depth_texture) = depth_texture else {
                return Vec4::ONE;
            };
            let depth_at = |uv: Vec2| {
                let texel = depth_texture.sample(uv);
                if from_normals {
                    texel.w
                } else {
                    texel.x
                }
            };

            let depth = depth_at(uv);
            if depth >= SKY_DEPTH {
                return Vec4::ONE;
            }

            let far = inputs.float(uniforms::FAR_CLIP);
            let radius = inputs.float(uniforms::RADIUS).max(1e-4);
            let intensity = inputs.float(uniforms::INTENSITY);
            let samples = (inputs.float(uniforms::SAMPLE_COUNT) as u32).max(1);
            let view_depth = (depth * far).max(1e-3);
            let reach = (radius / view_depth).min(0.25);

            let mut occlusion = 0.0;
            for i in 0..samples {
                let t = (i as f32 + 0.5) / samples as f32;
                // Golden-angle spiral.
                let angle = i as f32 * 2.399_963;
                let offset = Vec2::new(angle.cos(), angle.sin()) * reach * t.sqrt();
                let delta = view_depth - depth_at(uv + offset) * far;
                if delta > 0.01 * radius && delta < radius * 2.0 {
                    occlusion += 1.0 - delta / (radius * 2.0);
                }
            }
            let ao = (1.0 - intensity * occlusion / samples as f32).clamp(0.0, 1.0);
            Vec4::new(ao, ao, ao, 1.0)
        }
        1 => {
            let texel = inputs.source_texel();
            let mut sum = Vec4::ZERO;
            for y in -1..=1 {
                for x in -1..=1 {
                    sum += inputs.sample_source(uv + Vec2::new(x as f32, y as f32) * texel);
                }
            }
            sum / 9.0
        }
        _ => {
            let ao = inputs.sample_source(uv).x;
            let scene = inputs.destination_texel(pixel);
            if inputs.keyword(keywords::AO_DEBUG) {
                Vec4::new(ao, ao, ao, scene.w)
            } else {
                (scene.truncate() * ao).extend(scene.w)
            }
        }
    }
}

fn screen_space_reflection(inputs: &ShaderInputs<'_>, uv: Vec2, pixel: UVec2) -> Vec4 {
    // (intensity, step size in texels, thickness, max distance in uv)
    let params = inputs.vector(uniforms::SSR_PARAMS);
    if inputs.pass != 0 {
        let reflection = inputs.sample_source(uv);
        let scene = inputs.destination_texel(pixel);
        return (scene.truncate() + reflection.truncate() * reflection.w * params.x).extend(scene.w);
    }

    let Some(gbuffer) = inputs.texture(uniforms::CAMERA_DEPTH_NORMALS_TEXTURE) else {
        return Vec4::ZERO;
    };
    let texel = gbuffer.sample(uv);
    let direction = Vec2::new(texel.x, -texel.y);
    if texel.w >= SKY_DEPTH || direction.length_squared() < 1e-6 {
        return Vec4::ZERO;
    }

    let steps = (inputs.float(uniforms::MAX_STEPS) as u32).max(1);
    let step = direction.normalize() * params.y.max(1.0) / inputs.target_size.as_vec2();
    let edge_mask = inputs.float(uniforms::SCREEN_EDGE_MASK).max(1e-3);
    let mut ray_uv = uv;
    let mut ray_depth = texel.w;
    for i in 1..=steps {
        ray_uv += step;
        ray_depth -= params.z * 0.25;
        if ray_uv.min_element() < 0.0 || ray_uv.max_element() > 1.0 {
            break;
        }
        if (ray_uv - uv).length() > params.w {
            break;
        }
        let scene_depth = gbuffer.sample(ray_uv).w;
        if scene_depth < ray_depth && ray_depth - scene_depth < params.z {
            let border = ray_uv.min(Vec2::ONE - ray_uv).min_element();
            let fade = smoothstep(0.0, edge_mask, border) * (1.0 - i as f32 / steps as f32);
            return inputs.sample_source(ray_uv).truncate().extend(fade);
        }
    }
    Vec4::ZERO
}

fn fog(inputs: &ShaderInputs<'_>, uv: Vec2, _pixel: UVec2) -> Vec4 {
    let color = inputs.sample_source(uv);
    let Some(depth) = inputs.texture(uniforms::CAMERA_DEPTH_TEXTURE) else {
        return color;
    };
    let depth = depth.sample(uv).x;
    // Pass 1 leaves the skybox untouched.
    if inputs.pass == 1 && depth >= SKY_DEPTH {
        return color;
    }

    let distance = depth * inputs.float(uniforms::FAR_CLIP);
    let density = inputs.float(uniforms::FOG_DENSITY);
    let factor = if inputs.keyword(keywords::FOG_LINEAR) {
        let start = inputs.float(uniforms::FOG_START);
        let end = inputs.float(uniforms::FOG_END);
        (end - distance) / (end - start).max(1e-4)
    } else if inputs.keyword(keywords::FOG_EXP) {
        (-density * distance).exp()
    } else if inputs.keyword(keywords::FOG_EXP2) {
        (-(density * distance).powi(2)).exp()
    } else {
        1.0
    };

    let fog_color = inputs.vector(uniforms::FOG_COLOR).truncate();
    fog_color
        .lerp(color.truncate(), factor.clamp(0.0, 1.0))
        .extend(color.w)
}

fn motion_blur(inputs: &ShaderInputs<'_>, uv: Vec2, _pixel: UVec2) -> Vec4 {
    if inputs.pass == 0 {
        let Some(motion) = inputs.texture(uniforms::CAMERA_MOTION_VECTORS_TEXTURE) else {
            return inputs.sample_source(uv);
        };
        let velocity = motion.sample(uv).xy() * inputs.float(uniforms::VELOCITY_SCALE);
        let samples = (inputs.float(uniforms::SAMPLE_COUNT) as u32).max(1);
        let sum: Vec4 = (0..samples)
            .map(|i| {
                let t = (i as f32 + 0.5) / samples as f32 - 0.5;
                inputs.sample_source(uv + velocity * t)
            })
            .sum();
        return sum / samples as f32;
    }

    let weights = inputs.vector(uniforms::HISTORY_WEIGHTS);
    let history = [
        (uniforms::HISTORY1_TEX, weights.x),
        (uniforms::HISTORY2_TEX, weights.y),
        (uniforms::HISTORY3_TEX, weights.z),
        (uniforms::HISTORY4_TEX, weights.w),
    ];
    let mut sum = inputs.sample_source(uv);
    let mut total = 1.0;
    for (name, weight) in history {
        if weight <= 0.0 {
            continue;
        }
        if let Some(frame) = inputs.texture(name) {
            sum += frame.sample(uv) * weight;
            total += weight;
        }
    }
    sum / total
}

fn debug_views(inputs: &ShaderInputs<'_>, uv: Vec2, _pixel: UVec2) -> Vec4 {
    let source = inputs.sample_source(uv);
    let view = match inputs.pass {
        0 => inputs.texture(uniforms::CAMERA_DEPTH_TEXTURE).map(|depth| {
            let d = depth.sample(uv).x * inputs.float(uniforms::DEPTH_SCALE);
            Vec3::splat(d.clamp(0.0, 1.0))
        }),
        1 => inputs
            .texture(uniforms::CAMERA_DEPTH_NORMALS_TEXTURE)
            .map(|normals| normals.sample(uv).truncate() * 0.5 + 0.5),
        _ => inputs
            .texture(uniforms::CAMERA_MOTION_VECTORS_TEXTURE)
            .map(|motion| {
                let m = motion.sample(uv).xy() * inputs.float(uniforms::AMPLITUDE);
                Vec3::new(m.x.abs(), m.y.abs(), 0.0)
            }),
    };
    match view {
        Some(view) => source
            .truncate()
            .lerp(view, inputs.float(uniforms::OPACITY))
            .extend(1.0),
        None => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material::ShaderId;
    use crate::core::types::{TextureDesc, TextureFormat};
    use approx::assert_relative_eq;

    fn inputs_for<'a>(
        source: &'a Image,
        material: &'a Material,
        textures: &'a Arena<Image>,
        globals: &'a HashMap<&'static str, TextureId>,
    ) -> ShaderInputs<'a> {
        ShaderInputs {
            source: Some(source),
            destination: None,
            material,
            pass: 0,
            target_size: UVec2::new(source.width(), source.height()),
            textures,
            globals,
        }
    }

    fn flat(value: Vec4) -> Image {
        let mut image = Image::new(TextureDesc::new(4, 4, TextureFormat::RgbaFloat), "flat");
        image.fill(value);
        image
    }

    #[test]
    fn uber_without_keywords_passes_color_through() {
        let source = flat(Vec4::new(0.25, 0.5, 0.75, 1.0));
        let material = Material::new(ShaderId(0), names::UBER);
        let textures = Arena::new();
        let globals = HashMap::new();
        let inputs = inputs_for(&source, &material, &textures, &globals);
        let out = uber(&inputs, Vec2::splat(0.5), UVec2::ZERO);
        assert_relative_eq!(out.x, 0.25);
        assert_relative_eq!(out.z, 0.75);
    }

    #[test]
    fn bloom_prefilter_rejects_values_below_threshold() {
        let source = flat(Vec4::new(0.2, 0.2, 0.2, 1.0));
        let mut material = Material::new(ShaderId(0), names::BLOOM);
        material.set_float(uniforms::THRESHOLD, 1.0);
        material.set_vector(uniforms::CURVE, Vec4::new(0.5, 1.0, 0.5, 0.0));
        let textures = Arena::new();
        let globals = HashMap::new();
        let inputs = inputs_for(&source, &material, &textures, &globals);
        let out = bloom(&inputs, Vec2::splat(0.5), UVec2::ZERO);
        assert_relative_eq!(out.x, 0.0);
    }

    #[test]
    fn identity_lut_strip_is_transparent() {
        let size = 4u32;
        let mut lut = Image::new(TextureDesc::new(size * size, size, TextureFormat::RgbaFloat), "lut");
        let scale = 1.0 / (size - 1) as f32;
        let pixels = (0..size)
            .flat_map(|y| {
                (0..size * size).map(move |x| {
                    Vec4::new((x % size) as f32 * scale, y as f32 * scale, (x / size) as f32 * scale, 1.0)
                })
            })
            .collect();
        lut.store(pixels);

        let color = Vec3::new(0.2, 0.6, 0.9);
        let mapped = sample_lut_strip(&lut, color);
        assert_relative_eq!(mapped.x, color.x, epsilon = 1e-4);
        assert_relative_eq!(mapped.y, color.y, epsilon = 1e-4);
        assert_relative_eq!(mapped.z, color.z, epsilon = 1e-4);
    }
}
