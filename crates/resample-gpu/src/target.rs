use glam::Vec4;
use half::f16;
use resample_core::SourceTexture;
use wgpu::{Device, Queue};

use crate::error::GpuError;

/// Offscreen colour texture, sampled by a later pass and copied back to the
/// CPU. Only ones built with [`OffscreenTarget::new`] can be rendered to.
pub struct OffscreenTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    /// A target that can be drawn into, sampled, and read back.
    pub fn new(
        device: &Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::with_usage(
            device,
            label,
            width,
            height,
            format,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
        )
    }

    /// A sample-only texture filled by copies. Some float formats may not be
    /// render attachments on downlevel devices.
    pub fn source(
        device: &Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::with_usage(
            device,
            label,
            width,
            height,
            format,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
        )
    }

    fn with_usage(
        device: &Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        Self {
            texture,
            view,
            format,
            width: width.max(1),
            height: height.max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Texel encoding
// ---------------------------------------------------------------------------

fn unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn encode_texels(texels: &[Vec4], format: wgpu::TextureFormat) -> Result<Vec<u8>, GpuError> {
    use wgpu::TextureFormat as F;
    let bytes = match format {
        F::Rgba8Unorm => texels
            .iter()
            .flat_map(|c| c.to_array().map(unorm8))
            .collect(),
        F::Bgra8Unorm => texels
            .iter()
            .flat_map(|c| [unorm8(c.z), unorm8(c.y), unorm8(c.x), unorm8(c.w)])
            .collect(),
        F::Rgba16Float => texels
            .iter()
            .flat_map(|c| c.to_array())
            .flat_map(|v| f16::from_f32(v).to_le_bytes())
            .collect(),
        other => return Err(GpuError::UnsupportedFormat(other)),
    };
    Ok(bytes)
}

fn decode_row(row: &[u8], format: wgpu::TextureFormat, out: &mut Vec<Vec4>) {
    use wgpu::TextureFormat as F;
    let unorm = |b: u8| b as f32 / 255.0;
    match format {
        F::Rgba8Unorm => out.extend(
            row.chunks_exact(4)
                .map(|p| Vec4::new(unorm(p[0]), unorm(p[1]), unorm(p[2]), unorm(p[3]))),
        ),
        F::Bgra8Unorm => out.extend(
            row.chunks_exact(4)
                .map(|p| Vec4::new(unorm(p[2]), unorm(p[1]), unorm(p[0]), unorm(p[3]))),
        ),
        _ => out.extend(row.chunks_exact(8).map(|p| {
            let channel = |i: usize| f16::from_le_bytes([p[2 * i], p[2 * i + 1]]).to_f32();
            Vec4::new(channel(0), channel(1), channel(2), channel(3))
        })),
    }
}

fn bytes_per_pixel(format: wgpu::TextureFormat) -> Result<u32, GpuError> {
    use wgpu::TextureFormat as F;
    match format {
        F::Rgba8Unorm | F::Bgra8Unorm => Ok(4),
        F::Rgba16Float => Ok(8),
        other => Err(GpuError::UnsupportedFormat(other)),
    }
}

// ---------------------------------------------------------------------------
// Upload / readback
// ---------------------------------------------------------------------------

/// Create a sampleable texture holding `source`.
///
/// Only linear, filterable formats are accepted (`Rgba8Unorm`, `Bgra8Unorm`,
/// `Rgba16Float`) so channel values reach the shader unconverted and any
/// sampler may read them. `Rgba32Float` needs `FLOAT32_FILTERABLE` and is
/// rejected.
pub fn upload_texture(
    device: &Device,
    queue: &Queue,
    source: &SourceTexture,
    format: wgpu::TextureFormat,
) -> Result<OffscreenTarget, GpuError> {
    let bytes = encode_texels(source.texels(), format)?;
    let bpp = bytes_per_pixel(format)?;
    let (width, height) = source.dimensions();

    let target = OffscreenTarget::source(device, "resample_source", width, height, format);
    queue.write_texture(
        target.texture.as_image_copy(),
        &bytes,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(width * bpp),
            rows_per_image: Some(height),
        },
        target.texture.size(),
    );
    Ok(target)
}

/// Copy `target` back to the CPU, blocking until the GPU is done.
pub fn read_back(
    device: &Device,
    queue: &Queue,
    target: &OffscreenTarget,
) -> Result<SourceTexture, GpuError> {
    let bpp = bytes_per_pixel(target.format)?;
    let unpadded = target.width * bpp;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded = unpadded.div_ceil(align) * align;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("resample_readback"),
        size: u64::from(padded) * u64::from(target.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback-encoder"),
    });
    encoder.copy_texture_to_buffer(
        target.texture.as_image_copy(),
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(target.height),
            },
        },
        target.texture.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    rx.recv().map_err(|_| GpuError::MapCancelled)??;

    let mut texels = Vec::with_capacity((target.width * target.height) as usize);
    {
        let data = slice.get_mapped_range();
        for row in data.chunks_exact(padded as usize) {
            decode_row(&row[..unpadded as usize], target.format, &mut texels);
        }
    }
    buffer.unmap();

    Ok(SourceTexture::new(target.width, target.height, texels)?)
}
