use cgmath::*;
use thiserror::Error;

/// One tagged variant per bootstrap step that can fail. The chain
/// short-circuits on the first failure; there is no retry and no fallback
/// configuration search.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter available")]
    NoAdapter,
    #[error("no surface configuration matches the required pixel format")]
    NoMatchingConfiguration,
    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// The fixed pixel-format requirement set. No fallback: either a surface
/// format satisfies this exactly or bootstrap fails.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SurfaceRequirements {
    pub bits_per_channel: u32,
}

impl Default for SurfaceRequirements {
    fn default() -> Self {
        Self { bits_per_channel: 8 }
    }
}

/// Every GPU handle the application owns, in acquisition order.
/// Released by `teardown::shutdown` in reverse.
#[derive(Debug)]
pub struct ContextBundle<'window> {
    pub(crate) instance: wgpu::Instance,
    pub(crate) adapter: wgpu::Adapter,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) surface: Surface<'window>,
}

/// A window surface and its per-frame presentation state.
#[derive(Debug)]
pub struct Surface<'window> {
    pub(crate) size: Vector2<u32>,
    pub(crate) format: wgpu::TextureFormat,
    pub(crate) wgpu_surface: wgpu::Surface<'window>,
    /// Set to `Some` when `begin_drawing` is called, `None` on `present`.
    pub(crate) surface_texture: Option<wgpu::SurfaceTexture>,
    /// Set to `Some` when `begin_drawing` is called, `None` on `present`.
    pub(crate) texture_view: Option<wgpu::TextureView>,
}

impl Surface<'_> {
    /// Needs to be called before drawing a frame. On error (lost or outdated
    /// swapchain) the caller is expected to skip the frame.
    pub fn begin_drawing(&mut self) -> Result<(), wgpu::SurfaceError> {
        assert!(self.surface_texture.is_none() && self.texture_view.is_none());
        let surface_texture = self.wgpu_surface.get_current_texture()?;
        self.texture_view = Some(
            surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
        );
        self.surface_texture = Some(surface_texture);
        Ok(())
    }

    /// Needs to be called when finish drawing. Does nothing if no frame was
    /// begun.
    pub fn present(&mut self) {
        self.texture_view = None;
        if let Some(surface_texture) = self.surface_texture.take() {
            surface_texture.present();
        }
    }

    /// Begins a render pass that clears the frame to `clear_color`.
    /// Must be called between `begin_drawing` and `present`.
    pub fn create_render_pass<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        clear_color: wgpu::Color,
    ) -> wgpu::RenderPass<'encoder> {
        let view = self
            .texture_view
            .as_ref()
            .expect("begin_drawing must be called before create_render_pass");
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    pub fn size(&self) -> Vector2<u32> {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Acquires instance, surface, adapter, device/queue, then configures the
/// surface with the one configuration matching `SurfaceRequirements`. Each
/// step is a distinct failure point; on failure, handles acquired so far are
/// reclaimed at the failure point in reverse acquisition order.
pub async fn init_context(
    window: &winit::window::Window,
) -> Result<ContextBundle<'_>, ContextError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
    let wgpu_surface = instance.create_surface(window)?;

    let power_preference = wgpu::PowerPreference::from_env()
        .inspect(|p| log::info!("using wgpu power preference `{p:?}`"))
        .unwrap_or_default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            force_fallback_adapter: false,
            compatible_surface: Some(&wgpu_surface),
        })
        .await
        .ok_or(ContextError::NoAdapter)?;
    let adapter_info = adapter.get_info();
    log::info!(
        "using adapter {:?} ({:?})",
        adapter_info.name,
        adapter_info.backend
    );

    let size = {
        let size = window.inner_size();
        vec2(size.width, size.height)
    };
    let capabilities = wgpu_surface.get_capabilities(&adapter);
    let config = select_configuration(
        &capabilities.formats,
        &capabilities.present_modes,
        &capabilities.alpha_modes,
        SurfaceRequirements::default(),
        size,
    )
    .ok_or(ContextError::NoMatchingConfiguration)?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await?;

    wgpu_surface.configure(&device, &config);
    log::info!(
        "surface configured: {:?}, {}x{}",
        config.format,
        config.width,
        config.height
    );

    let surface = Surface {
        size,
        format: config.format,
        wgpu_surface,
        surface_texture: None,
        texture_view: None,
    };
    Ok(ContextBundle {
        instance,
        adapter,
        device,
        queue,
        surface,
    })
}

/// Picks exactly one configuration satisfying `requirements` from the
/// advertised capabilities, or `None` if zero formats match. Presentation is
/// always FIFO; a surface that cannot do FIFO cannot satisfy the requirement
/// set either.
pub(crate) fn select_configuration(
    formats: &[wgpu::TextureFormat],
    present_modes: &[wgpu::PresentMode],
    alpha_modes: &[wgpu::CompositeAlphaMode],
    requirements: SurfaceRequirements,
    size: Vector2<u32>,
) -> Option<wgpu::SurfaceConfiguration> {
    let format = formats
        .iter()
        .copied()
        .find(|&format| channel_bits(format) == Some(requirements.bits_per_channel))?;
    if !present_modes.contains(&wgpu::PresentMode::Fifo) {
        return None;
    }
    let alpha_mode = if alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
        wgpu::CompositeAlphaMode::Opaque
    } else {
        *alpha_modes.first()?
    };
    Some(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.x,
        height: size.y,
        present_mode: wgpu::PresentMode::Fifo,
        desired_maximum_frame_latency: 2,
        alpha_mode,
        view_formats: vec![],
    })
}

/// Bits per color channel for the 4-channel formats a window surface can
/// advertise. `None` for anything that is not plain RGBA/BGRA.
fn channel_bits(format: wgpu::TextureFormat) -> Option<u32> {
    use wgpu::TextureFormat::*;
    match format {
        Rgba8Unorm | Rgba8UnormSrgb | Bgra8Unorm | Bgra8UnormSrgb => Some(8),
        Rgba16Unorm | Rgba16Float => Some(16),
        _ => None,
    }
}
