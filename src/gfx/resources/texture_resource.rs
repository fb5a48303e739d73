//! Texture resource management for wgpu
//!
//! Provides utilities for creating GPU textures, views and samplers: render
//! targets for the offscreen passes, decoded image uploads, the skybox cube
//! map and the procedural noise texture.

use rand::{rngs::StdRng, Rng, SeedableRng};
use wgpu::util::DeviceExt;

use super::texture_cache::{validate_cube_faces, DecodedImage, TextureError};

/// GPU texture resource containing texture, view, and sampler
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Nearest filtering with clamp-to-edge addressing, used by every render target
fn target_sampler_descriptor(label: &str) -> wgpu::SamplerDescriptor<'_> {
    wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

/// Depth targets are read only through comparisons against a reference
fn depth_sampler_descriptor(label: &str) -> wgpu::SamplerDescriptor<'_> {
    wgpu::SamplerDescriptor {
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..target_sampler_descriptor(label)
    }
}

impl TextureResource {
    /// Depth format of the shadow map and the G-buffer depth attachment
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Format of decoded model textures and the cube map
    pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Depth attachment that later passes can compare against
    pub fn create_depth_target(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        Self::create_target(
            device,
            width,
            height,
            Self::DEPTH_FORMAT,
            &depth_sampler_descriptor(label),
            label,
        )
    }

    /// Color attachment that later passes can read back
    pub fn create_color_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        Self::create_target(
            device,
            width,
            height,
            format,
            &target_sampler_descriptor(label),
            label,
        )
    }

    fn create_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        sampler: &wgpu::SamplerDescriptor,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(sampler);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads RGBA8 pixels into a 2D texture sampled with `sampler`
    pub fn create_from_rgba_data_with_sampler(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
        sampler: &wgpu::SamplerDescriptor,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::IMAGE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(sampler);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Model texture: linear filtering, mirrored repeat
    pub fn create_from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
        label: &str,
    ) -> Self {
        Self::create_from_rgba_data_with_sampler(
            device,
            queue,
            &image.rgba,
            image.width,
            image.height,
            label,
            &wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::MirrorRepeat,
                address_mode_v: wgpu::AddressMode::MirrorRepeat,
                address_mode_w: wgpu::AddressMode::MirrorRepeat,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            },
        )
    }

    /// 1x1 opaque white texture bound for meshes without a diffuse map
    pub fn create_white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = DecodedImage {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        };
        Self::create_from_image(device, queue, &white, "White Fallback Texture")
    }

    /// Random RGBA8 texture read by the composite pass for shadow jitter
    pub fn create_noise(device: &wgpu::Device, queue: &wgpu::Queue, size: u32, seed: u64) -> Self {
        let pixels = noise_pixels(size, seed);
        Self::create_from_rgba_data_with_sampler(
            device,
            queue,
            &pixels,
            size,
            size,
            "Noise Texture",
            &wgpu::SamplerDescriptor {
                label: Some("Noise Sampler"),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                address_mode_w: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            },
        )
    }

    /// Cube map from six faces ordered +X, -X, +Y, -Y, +Z, -Z
    ///
    /// Faces must be square, share one size and fit the device's 2D limit.
    pub fn create_cube_map(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[(std::path::PathBuf, DecodedImage); 6],
        label: &str,
    ) -> Result<Self, TextureError> {
        let (width, height) = validate_cube_faces(faces, device.limits().max_texture_dimension_2d)?;
        let mut data = Vec::with_capacity(width as usize * height as usize * 4 * 6);
        for (_, face) in faces {
            data.extend_from_slice(&face.rgba);
        }

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: Self::IMAGE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Deterministic RGBA noise, `size * size` texels
pub fn noise_pixels(size: u32, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pixels = vec![0u8; size as usize * size as usize * 4];
    rng.fill(pixels.as_mut_slice());
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_deterministic_per_seed() {
        let a = noise_pixels(64, 7);
        let b = noise_pixels(64, 7);
        let c = noise_pixels(64, 8);

        assert_eq!(a.len(), 64 * 64 * 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_noise_is_not_constant() {
        let pixels = noise_pixels(16, 1);
        let first = pixels[0];
        assert!(pixels.iter().any(|&p| p != first));
    }
}
