//! Offscreen render targets
//!
//! Both targets are allocated once at their creation size and never resized.

use super::texture_resource::TextureResource;

/// Usages every G-buffer attachment needs: written by the geometry pass,
/// read by the composite pass
const GBUFFER_USAGES: wgpu::TextureUsages =
    wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

/// Candidates in order of preference with the bytes per sample three
/// attachments of that format take
const GBUFFER_CANDIDATES: [(wgpu::TextureFormat, u32); 2] = [
    (wgpu::TextureFormat::Rgba32Float, 3 * 16),
    (wgpu::TextureFormat::Rgba16Float, 3 * 8),
];

/// Colour format of the G-buffer attachments
///
/// `allowed_usages` reports what the adapter permits for a format. Three
/// `Rgba32Float` targets need 48 bytes per sample and a float32 render
/// target, which many downlevel adapters lack; those fall back to half
/// floats. `None` when neither candidate can be rendered to and read back.
pub fn choose_gbuffer_format(
    max_color_attachment_bytes_per_sample: u32,
    allowed_usages: impl Fn(wgpu::TextureFormat) -> wgpu::TextureUsages,
) -> Option<wgpu::TextureFormat> {
    let chosen = GBUFFER_CANDIDATES
        .iter()
        .find(|&&(format, bytes)| {
            bytes <= max_color_attachment_bytes_per_sample
                && allowed_usages(format).contains(GBUFFER_USAGES)
        })
        .map(|&(format, _)| format)?;

    if chosen != GBUFFER_CANDIDATES[0].0 {
        log::warn!(
            "adapter cannot render three {:?} targets ({max_color_attachment_bytes_per_sample} \
             colour bytes per sample), G-buffer falls back to {chosen:?}",
            GBUFFER_CANDIDATES[0].0
        );
    }
    Some(chosen)
}

/// Depth-only target rendered from the light
pub struct ShadowTarget {
    pub depth: TextureResource,
    resolution: u32,
}

impl ShadowTarget {
    pub fn new(device: &wgpu::Device, resolution: u32) -> Self {
        let depth =
            TextureResource::create_depth_target(device, resolution, resolution, "Shadow Map");
        log::debug!("shadow target {resolution}x{resolution}");
        Self { depth, resolution }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

/// Colour, normal and world-position attachments plus depth
pub struct GBuffer {
    pub color: TextureResource,
    pub normal: TextureResource,
    pub world_pos: TextureResource,
    pub depth: TextureResource,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl GBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        log::debug!("G-buffer {width}x{height} {format:?}");
        Self {
            color: TextureResource::create_color_target(device, width, height, format, "G-Buffer Color"),
            normal: TextureResource::create_color_target(device, width, height, format, "G-Buffer Normal"),
            world_pos: TextureResource::create_color_target(
                device,
                width,
                height,
                format,
                "G-Buffer World Position",
            ),
            depth: TextureResource::create_depth_target(device, width, height, "G-Buffer Depth"),
            format,
            width,
            height,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Attachments in the order the geometry and skybox shaders write them
    ///
    /// With `clear` the colour target clears to white and the normal and
    /// world-position targets to zero, so background texels carry w = 0.
    pub fn color_attachments(
        &self,
        clear: bool,
    ) -> [Option<wgpu::RenderPassColorAttachment<'_>>; 3] {
        let load = |clear_color| {
            if clear {
                wgpu::LoadOp::Clear(clear_color)
            } else {
                wgpu::LoadOp::Load
            }
        };
        [
            color_attachment(&self.color.view, load(wgpu::Color::WHITE)),
            color_attachment(&self.normal.view, load(wgpu::Color::TRANSPARENT)),
            color_attachment(&self.world_pos.view, load(wgpu::Color::TRANSPARENT)),
        ]
    }
}

fn color_attachment(
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
    })
}
