//! Window surface, device and the depth target shared by the forward pass.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::errors::{PeopleError, Result};
use crate::renderer::settings::RenderSettings;

/// Depth attachment sized to the surface.
pub struct DepthTarget {
    pub format: wgpu::TextureFormat,
    pub view: wgpu::TextureView,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewer Depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            format,
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}

/// GPU handles for the viewer window.
pub struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub depth: DepthTarget,
}

impl WgpuContext {
    /// Opens a device for `window` and configures its surface at
    /// `width` x `height` (clamped to at least one pixel).
    pub async fn new<W>(window: W, settings: &RenderSettings, width: u32, height: u32) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| PeopleError::AdapterRequestFailed(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("People Device"),
                required_features: settings.required_features,
                required_limits: settings.required_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        let (width, height) = (width.max(1), height.max(1));
        let mut config = surface
            .get_default_config(&adapter, width, height)
            .ok_or_else(|| PeopleError::AdapterRequestFailed("surface not supported by adapter".to_string()))?;
        let caps = surface.get_capabilities(&adapter);
        config.format = surface_format(&caps.formats, config.format);
        config.present_mode = present_mode(settings.vsync);
        surface.configure(&device, &config);

        log::debug!("Surface {}x{} {:?} {:?}", width, height, config.format, config.present_mode);

        let depth = DepthTarget::new(&device, settings.depth_format, width, height);

        Ok(Self {
            device,
            queue,
            surface,
            config,
            depth,
        })
    }

    /// Reconfigures the surface and depth target. A zero-sized window
    /// (minimized) keeps the previous size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthTarget::new(&self.device, self.depth.format, width, height);
    }

    #[must_use]
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

/// First sRGB format the surface offers, else `fallback`.
///
/// Lighting runs in linear space, so the surface has to encode to sRGB.
pub(crate) fn surface_format(available: &[wgpu::TextureFormat], fallback: wgpu::TextureFormat) -> wgpu::TextureFormat {
    available.iter().copied().find(wgpu::TextureFormat::is_srgb).unwrap_or_else(|| {
        log::warn!("No sRGB surface format available ({fallback:?}); colors will look dark");
        fallback
    })
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn prefers_srgb_surface() {
        let offered = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb, TextureFormat::Rgba8UnormSrgb];
        assert_eq!(surface_format(&offered, TextureFormat::Bgra8Unorm), TextureFormat::Bgra8UnormSrgb);
    }

    #[test]
    fn falls_back_without_srgb() {
        let offered = [TextureFormat::Rgba16Float];
        assert_eq!(surface_format(&offered, TextureFormat::Rgba16Float), TextureFormat::Rgba16Float);
    }

    #[test]
    fn vsync_maps_to_present_mode() {
        assert_eq!(present_mode(true), wgpu::PresentMode::AutoVsync);
        assert_eq!(present_mode(false), wgpu::PresentMode::AutoNoVsync);
    }
}
