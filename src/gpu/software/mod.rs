//! CPU reference device.
//!
//! Textures are `Vec4` texel arrays in a generational arena; shaders are plain
//! functions evaluated once per destination texel. With the `parallel`
//! feature rows are shaded on the rayon pool. Results are identical either way.

mod camera;
mod image;
pub mod shaders;

pub use camera::SoftwareCamera;
pub use image::Image;
pub use shaders::{ShaderInputs, ShaderProgram};

use glam::{UVec2, Vec2, Vec4};
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::material::{Material, ShaderId};
use crate::core::types::{ColorSpace, DeviceCaps, TextureDesc, TextureFormat, TextureId};
use crate::error::{PostFxError, Result};
use crate::gpu::GraphicsDevice;
use crate::utils::allocator::Arena;

/// One executed blit, kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct BlitRecord {
    pub source: Option<TextureId>,
    pub destination: TextureId,
    /// Shader name, `None` for a plain copy.
    pub shader: Option<String>,
    pub pass: u32,
}

pub struct SoftwareDevice {
    caps: DeviceCaps,
    color_space: ColorSpace,
    textures: Arena<Image>,
    shaders: Vec<(String, ShaderProgram)>,
    globals: HashMap<&'static str, TextureId>,
    blit_log: Vec<BlitRecord>,
    texture_limit: Option<usize>,
    textures_created: usize,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    /// Device with every built-in post-processing program registered.
    pub fn new() -> Self {
        let mut device = Self::empty();
        for (name, program) in shaders::builtin() {
            device.register_shader(name, program);
        }
        device
    }

    /// Device without any shader programs.
    pub fn empty() -> Self {
        Self {
            caps: DeviceCaps::default(),
            color_space: ColorSpace::Linear,
            textures: Arena::new(),
            shaders: Vec::new(),
            globals: HashMap::new(),
            blit_log: Vec::new(),
            texture_limit: None,
            textures_created: 0,
        }
    }

    pub fn with_caps(mut self, caps: DeviceCaps) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    /// Unregisters a program so lookups for it fail.
    pub fn without_shader(mut self, name: &str) -> Self {
        self.shaders.retain(|(registered, _)| registered != name);
        self
    }

    /// Makes texture creation fail once `limit` textures are alive.
    pub fn with_texture_limit(mut self, limit: usize) -> Self {
        self.texture_limit = Some(limit);
        self
    }

    /// Registers (or replaces) a program. Existing shader ids stay valid.
    pub fn register_shader(&mut self, name: &str, program: ShaderProgram) {
        if let Some(slot) = self.shaders.iter_mut().find(|(registered, _)| registered == name) {
            slot.1 = program;
        } else {
            self.shaders.push((name.to_string(), program));
        }
    }

    /// Creates a texture and fills it from `pixels` (row-major).
    pub fn upload(&mut self, desc: TextureDesc, pixels: &[Vec4]) -> Result<TextureId> {
        if pixels.len() != desc.texel_count() {
            return Err(PostFxError::InvalidBlit(format!(
                "upload of {} texels into {}x{} texture",
                pixels.len(),
                desc.width,
                desc.height
            )));
        }
        let texture = self.create_texture(desc, "upload")?;
        if let Some(image) = self.textures.get_mut(texture.0) {
            image.store(pixels.to_vec());
        }
        Ok(texture)
    }

    /// Creates a texture whose texels are produced by `f(x, y)`.
    pub fn upload_with<F>(&mut self, desc: TextureDesc, mut f: F) -> Result<TextureId>
    where
        F: FnMut(u32, u32) -> Vec4,
    {
        let mut pixels = Vec::with_capacity(desc.texel_count());
        for y in 0..desc.height {
            for x in 0..desc.width {
                pixels.push(f(x, y));
            }
        }
        self.upload(desc, &pixels)
    }

    pub fn image(&self, texture: TextureId) -> Option<&Image> {
        self.textures.get(texture.0)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    pub fn blit_log(&self) -> &[BlitRecord] {
        &self.blit_log
    }

    pub fn clear_blit_log(&mut self) {
        self.blit_log.clear();
    }

    /// Number of logged blits executed through the named shader.
    pub fn blits_with_shader(&self, shader: &str) -> usize {
        self.blit_log
            .iter()
            .filter(|record| record.shader.as_deref() == Some(shader))
            .count()
    }

    fn image_or_err(&self, texture: TextureId) -> Result<&Image> {
        self.textures
            .get(texture.0)
            .ok_or(PostFxError::InvalidTexture(texture))
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn name(&self) -> &str {
        "cpu-reference"
    }

    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    fn find_shader(&self, name: &str) -> Option<ShaderId> {
        self.shaders
            .iter()
            .position(|(registered, _)| registered == name)
            .map(|index| ShaderId(index as u32))
    }

    fn create_texture(&mut self, desc: TextureDesc, label: &str) -> Result<TextureId> {
        let too_large = desc.width.max(desc.height) > self.caps.max_texture_size;
        let exhausted = self
            .texture_limit
            .is_some_and(|limit| self.textures.len() >= limit);
        if desc.width == 0 || desc.height == 0 || too_large || exhausted {
            return Err(PostFxError::AllocationFailed {
                desc,
                reason: if exhausted {
                    "texture limit reached".to_string()
                } else {
                    "unsupported dimensions".to_string()
                },
            });
        }
        if desc.format.is_half() && !self.caps.supports_half_formats {
            return Err(PostFxError::AllocationFailed {
                desc,
                reason: "half formats unsupported".to_string(),
            });
        }

        self.textures_created += 1;
        let handle = self.textures.insert(Image::new(desc, label));
        log::trace!("created texture '{label}' {}x{}", desc.width, desc.height);
        Ok(TextureId(handle))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(texture.0).is_some() {
            self.globals.retain(|_, bound| *bound != texture);
        }
    }

    fn texture_desc(&self, texture: TextureId) -> Option<TextureDesc> {
        self.textures.get(texture.0).map(|image| image.desc)
    }

    fn clear_texture(&mut self, texture: TextureId, color: Vec4) -> Result<()> {
        let image = self
            .textures
            .get_mut(texture.0)
            .ok_or(PostFxError::InvalidTexture(texture))?;
        image.fill(color);
        Ok(())
    }

    fn blit(
        &mut self,
        source: Option<TextureId>,
        destination: TextureId,
        material: Option<&Material>,
        pass: u32,
    ) -> Result<()> {
        if source == Some(destination) {
            return Err(PostFxError::InvalidBlit(format!(
                "{destination} used as both source and destination"
            )));
        }

        let target_desc = self.image_or_err(destination)?.desc;
        let source_image = match source {
            Some(texture) => Some(self.image_or_err(texture)?),
            None => None,
        };

        let pixels = match material {
            None => {
                let image = source_image.ok_or_else(|| {
                    PostFxError::InvalidBlit("copy without a source".to_string())
                })?;
                copy_pixels(image, target_desc)
            }
            Some(material) => {
                let (_, program) = self
                    .shaders
                    .get(material.shader().0 as usize)
                    .ok_or_else(|| PostFxError::ShaderNotFound(material.shader_name().to_string()))?;
                let inputs = ShaderInputs {
                    source: source_image,
                    destination: self.textures.get(destination.0),
                    material,
                    pass,
                    target_size: UVec2::new(target_desc.width, target_desc.height),
                    textures: &self.textures,
                    globals: &self.globals,
                };
                shade(&inputs, *program)
            }
        };

        if let Some(image) = self.textures.get_mut(destination.0) {
            image.store(pixels);
        }
        log::trace!(
            "blit {:?} -> {destination} via {} pass {pass}",
            source,
            material.map_or("copy", |m| m.shader_name())
        );
        self.blit_log.push(BlitRecord {
            source,
            destination,
            shader: material.map(|m| m.shader_name().to_string()),
            pass,
        });
        Ok(())
    }

    fn set_global_texture(&mut self, name: &'static str, texture: Option<TextureId>) {
        match texture {
            Some(texture) => {
                self.globals.insert(name, texture);
            }
            None => {
                self.globals.remove(name);
            }
        }
    }

    fn global_texture(&self, name: &str) -> Option<TextureId> {
        self.globals.get(name).copied()
    }

    fn read_texture(&self, texture: TextureId) -> Result<Vec<Vec4>> {
        Ok(self.image_or_err(texture)?.pixels.clone())
    }
}

fn copy_pixels(source: &Image, target: TextureDesc) -> Vec<Vec4> {
    if source.width() == target.width && source.height() == target.height {
        return source.pixels.clone();
    }
    let size = Vec2::new(target.width as f32, target.height as f32);
    let mut pixels = Vec::with_capacity(target.texel_count());
    for y in 0..target.height {
        for x in 0..target.width {
            let uv = (Vec2::new(x as f32, y as f32) + 0.5) / size;
            pixels.push(source.sample(uv));
        }
    }
    pixels
}

fn shade(inputs: &ShaderInputs<'_>, program: ShaderProgram) -> Vec<Vec4> {
    let width = inputs.target_size.x;
    let size = inputs.target_size.as_vec2();
    let shade_row = |y: u32| -> Vec<Vec4> {
        (0..width)
            .map(|x| {
                let pixel = UVec2::new(x, y);
                let uv = (pixel.as_vec2() + 0.5) / size;
                program(inputs, uv, pixel)
            })
            .collect()
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<Vec4>> = (0..inputs.target_size.y)
        .into_par_iter()
        .map(shade_row)
        .collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<Vec4>> = (0..inputs.target_size.y).map(shade_row).collect();

    rows.concat()
}

/// Texture format used for images uploaded from 8-bit sources.
pub const LDR_FORMAT: TextureFormat = TextureFormat::Rgba8;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::shaders as shader_names;

    fn checker(device: &mut SoftwareDevice) -> TextureId {
        device
            .upload_with(TextureDesc::new(4, 4, LDR_FORMAT), |x, y| {
                if (x + y) % 2 == 0 {
                    Vec4::ONE
                } else {
                    Vec4::new(0.0, 0.0, 0.0, 1.0)
                }
            })
            .expect("upload")
    }

    #[test]
    fn plain_blit_is_exact_copy() {
        let mut device = SoftwareDevice::new();
        let source = checker(&mut device);
        let target = device
            .create_texture(TextureDesc::new(4, 4, LDR_FORMAT), "target")
            .expect("target");
        device.blit(Some(source), target, None, 0).expect("blit");
        assert_eq!(
            device.read_texture(source).expect("read"),
            device.read_texture(target).expect("read")
        );
        assert_eq!(device.blit_log().len(), 1);
        assert!(device.blit_log()[0].shader.is_none());
    }

    #[test]
    fn blit_into_itself_is_rejected() {
        let mut device = SoftwareDevice::new();
        let source = checker(&mut device);
        let err = device.blit(Some(source), source, None, 0).unwrap_err();
        assert!(matches!(err, PostFxError::InvalidBlit(_)));
    }

    #[test]
    fn texture_limit_fails_allocation() {
        let mut device = SoftwareDevice::new().with_texture_limit(1);
        checker(&mut device);
        let err = device
            .create_texture(TextureDesc::new(4, 4, LDR_FORMAT), "second")
            .unwrap_err();
        assert!(matches!(err, PostFxError::AllocationFailed { .. }));
    }

    #[test]
    fn removed_shader_is_not_found() {
        let device = SoftwareDevice::new().without_shader(shader_names::BLOOM);
        assert!(device.find_shader(shader_names::BLOOM).is_none());
        assert!(device.find_shader(shader_names::UBER).is_some());
    }

    #[test]
    fn destroying_a_texture_unbinds_globals() {
        let mut device = SoftwareDevice::new();
        let texture = checker(&mut device);
        device.set_global_texture("_CameraDepthTexture", Some(texture));
        device.destroy_texture(texture);
        assert!(device.global_texture("_CameraDepthTexture").is_none());
        assert_eq!(device.live_textures(), 0);
    }
}
