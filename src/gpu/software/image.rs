use glam::{IVec2, Vec2, Vec4};

use crate::core::types::{FilterMode, TextureDesc, TextureFormat};

/// CPU-side texel storage for one texture. Texels are row-major, origin at
/// the top-left.
#[derive(Debug, Clone)]
pub struct Image {
    pub desc: TextureDesc,
    pub label: String,
    pub pixels: Vec<Vec4>,
}

impl Image {
    pub fn new(desc: TextureDesc, label: impl Into<String>) -> Self {
        Self {
            desc,
            label: label.into(),
            pixels: vec![Vec4::ZERO; desc.texel_count()],
        }
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.desc.width as f32, self.desc.height as f32)
    }

    pub fn texel_size(&self) -> Vec2 {
        Vec2::ONE / self.size()
    }

    /// Texel fetch with clamp-to-edge addressing.
    pub fn load(&self, x: i32, y: i32) -> Vec4 {
        let x = x.clamp(0, self.desc.width as i32 - 1) as usize;
        let y = y.clamp(0, self.desc.height as i32 - 1) as usize;
        self.pixels[y * self.desc.width as usize + x]
    }

    /// Filtered lookup at texel-space coordinates where texel centers sit on integers.
    pub fn bilinear(&self, position: Vec2) -> Vec4 {
        let base = position.floor();
        let frac = position - base;
        let base = base.as_ivec2();
        let fetch = |offset: IVec2| {
            let p = base + offset;
            self.load(p.x, p.y)
        };
        let top = fetch(IVec2::new(0, 0)).lerp(fetch(IVec2::new(1, 0)), frac.x);
        let bottom = fetch(IVec2::new(0, 1)).lerp(fetch(IVec2::new(1, 1)), frac.x);
        top.lerp(bottom, frac.y)
    }

    /// Normalized-coordinate lookup honoring the texture's filter mode.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let position = uv * self.size();
        match self.desc.filter {
            FilterMode::Point => {
                let texel = position.floor().as_ivec2();
                self.load(texel.x, texel.y)
            }
            FilterMode::Bilinear => self.bilinear(position - Vec2::splat(0.5)),
        }
    }

    /// Replaces the contents, quantizing to the storage format.
    pub fn store(&mut self, pixels: Vec<Vec4>) {
        let format = self.desc.format;
        self.pixels = pixels.into_iter().map(|texel| encode(format, texel)).collect();
    }

    pub fn fill(&mut self, color: Vec4) {
        let texel = encode(self.desc.format, color);
        self.pixels.iter_mut().for_each(|p| *p = texel);
    }
}

fn encode(format: TextureFormat, texel: Vec4) -> Vec4 {
    match format {
        TextureFormat::Rgba8 => {
            (texel.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round() / 255.0
        }
        TextureFormat::RgbaHalf | TextureFormat::RgbaFloat => texel,
        TextureFormat::RFloat | TextureFormat::RHalf => Vec4::new(texel.x, 0.0, 0.0, 1.0),
        TextureFormat::RgHalf => Vec4::new(texel.x, texel.y, 0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> Image {
        let mut image = Image::new(TextureDesc::new(2, 1, TextureFormat::RgbaFloat), "ramp");
        image.store(vec![Vec4::ZERO, Vec4::ONE]);
        image
    }

    #[test]
    fn bilinear_sample_blends_neighbours() {
        let image = ramp();
        assert_relative_eq!(image.sample(Vec2::new(0.5, 0.5)).x, 0.5);
        assert_relative_eq!(image.sample(Vec2::new(0.25, 0.5)).x, 0.0);
        assert_relative_eq!(image.sample(Vec2::new(0.75, 0.5)).x, 1.0);
    }

    #[test]
    fn rgba8_storage_clamps_and_quantizes() {
        let mut image = Image::new(TextureDesc::new(1, 1, TextureFormat::Rgba8), "ldr");
        image.store(vec![Vec4::new(2.0, -1.0, 0.5, 1.0)]);
        let texel = image.load(0, 0);
        assert_eq!(texel.x, 1.0);
        assert_eq!(texel.y, 0.0);
        assert_relative_eq!(texel.z, 128.0 / 255.0);
    }
}
