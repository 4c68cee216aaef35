use wgpu::{Device, Extent3d, Queue, Texture, TextureView};

/// Bytes per packed RGBA cell
const BYTES_PER_CELL: u32 = 4;

/// GPU copy of the field's image block.
///
/// One texel per cell in `Rgba8Unorm`, so the kernel's packed words upload
/// as-is on little-endian hosts.
pub struct ImageTexture {
    texture: Texture,
    /// View bound by the render pipeline
    pub view: TextureView,
    size: Extent3d,
}

impl ImageTexture {
    /// Create a texture for a `width` x `height` grid
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("field-image-texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            size,
        }
    }

    /// Upload one frame of pixels (`[R, G, B, A]` per cell, row-major)
    pub fn upload(&self, queue: &Queue, pixels: &[u8]) {
        let expected = (self.size.width * self.size.height * BYTES_PER_CELL) as usize;
        if pixels.len() != expected {
            log::error!(
                "Image size mismatch: got {} bytes, texture needs {}",
                pixels.len(),
                expected
            );
            return;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.size.width * BYTES_PER_CELL),
                rows_per_image: Some(self.size.height),
            },
            self.size,
        );
    }
}
