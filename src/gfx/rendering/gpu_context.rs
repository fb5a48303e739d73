use std::sync::Arc;

use super::error::RenderError;
use crate::gfx::resources::render_targets::choose_gbuffer_format;

/// Largest 2D texture the renderer asks for
const MAX_TEXTURE_DIMENSION: u32 = 4096;

/// Device and queue shared by everything that uploads or records GPU work
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    /// Chosen from the adapter's colour attachment byte limit and the
    /// usages it allows for float targets
    pub gbuffer_format: wgpu::TextureFormat,
}

impl GpuContext {
    /// Requests an adapter (compatible with `surface` when given) and a device
    pub async fn new(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<(Self, wgpu::Adapter), RenderError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: MAX_TEXTURE_DIMENSION
                        .min(adapter_limits.max_texture_dimension_2d),
                    max_color_attachment_bytes_per_sample: adapter_limits
                        .max_color_attachment_bytes_per_sample,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let gbuffer_format = choose_gbuffer_format(
            device.limits().max_color_attachment_bytes_per_sample,
            |format| adapter.get_texture_format_features(format).allowed_usages,
        )
        .ok_or(RenderError::NoGBufferFormat)?;

        Ok((
            Self {
                device: Arc::new(device),
                queue: Arc::new(queue),
                gbuffer_format,
            },
            adapter,
        ))
    }

    /// Context without a window, for offscreen rendering
    pub fn headless() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let (context, _adapter) = pollster::block_on(Self::new(&instance, None))?;
        Ok(context)
    }
}
