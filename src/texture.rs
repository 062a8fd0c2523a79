use crate::volume::Volume;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Cannot upload an empty volume")]
    Empty,

    #[error("Volume {width}x{height}x{depth} exceeds the 3D texture limit of {limit}")]
    TooLarge {
        width: usize,
        height: usize,
        depth: usize,
        limit: u32,
    },
}

#[derive(Debug, Error)]
pub enum GpuInitError {
    #[error("No suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("Unable to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("GPU adapter lacks required features: {0:?}")]
    MissingFeatures(wgpu::Features),
}

/// Turns a volume into a GPU-resident texture.
///
/// Every call allocates a new resource. Dropping the returned texture
/// releases it.
pub trait TextureUploader {
    type Texture;

    fn upload(&self, volume: Volume) -> Result<Self::Texture, TextureError>;
}

pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl Gpu {
    /// Border-clamped addressing is not part of the baseline feature set
    pub const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER;

    /// Open a device without a surface.
    pub async fn headless() -> Result<Self, GpuInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await?;

        let missing = Self::REQUIRED_FEATURES.difference(adapter.features());
        if !missing.is_empty() {
            return Err(GpuInitError::MissingFeatures(missing));
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Volume Viewer Device"),
                required_features: Self::REQUIRED_FEATURES,
                ..Default::default()
            })
            .await?;
        debug!(adapter = ?adapter.get_info(), "opened GPU device");

        Ok(Self { device, queue })
    }
}

impl TextureUploader for Gpu {
    type Texture = VolumeTexture;

    fn upload(&self, volume: Volume) -> Result<VolumeTexture, TextureError> {
        let limit = self.device.limits().max_texture_dimension_3d;
        let texture_size = texture_size(&volume, limit)?;

        let texture = self.device.create_texture(&texture_descriptor(texture_size));

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            volume.voxels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texture_size.width),
                rows_per_image: Some(texture_size.height),
            },
            texture_size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&sampler_descriptor());

        let dimensions = (
            texture_size.width,
            texture_size.height,
            texture_size.depth_or_array_layers,
        );
        debug!(?dimensions, "uploaded volume texture");
        Ok(VolumeTexture {
            texture,
            view,
            sampler,
            dimensions,
        })
    }
}

/// Texture extent for `volume`, checked against the device's 3D limit.
pub fn texture_size(volume: &Volume, limit: u32) -> Result<wgpu::Extent3d, TextureError> {
    if volume.is_empty() {
        return Err(TextureError::Empty);
    }

    let (depth, height, width) = volume.dim();
    if [width, height, depth].iter().any(|&d| d > limit as usize) {
        return Err(TextureError::TooLarge {
            width,
            height,
            depth,
            limit,
        });
    }

    Ok(wgpu::Extent3d {
        width: width as u32,
        height: height as u32,
        depth_or_array_layers: depth as u32,
    })
}

/// Single channel, 8-bit, 3D.
pub fn texture_descriptor(size: wgpu::Extent3d) -> wgpu::TextureDescriptor<'static> {
    wgpu::TextureDescriptor {
        label: Some("Volume 3D Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D3,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    }
}

/// Nearest filtering; sampling outside [0, 1] hits the border, never the
/// opposite edge of the volume.
pub fn sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("Volume Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToBorder,
        address_mode_v: wgpu::AddressMode::ClampToBorder,
        address_mode_w: wgpu::AddressMode::ClampToBorder,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        border_color: Some(wgpu::SamplerBorderColor::OpaqueBlack),
        ..Default::default()
    }
}

/// A volume living on the GPU. The texture is destroyed on drop.
pub struct VolumeTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    dimensions: (u32, u32, u32), // (width, height, depth)
}

impl VolumeTexture {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.dimensions
    }
}

impl std::fmt::Debug for VolumeTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeTexture")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl Drop for VolumeTexture {
    fn drop(&mut self) {
        debug!(dimensions = ?self.dimensions, "releasing volume texture");
        self.texture.destroy();
    }
}
