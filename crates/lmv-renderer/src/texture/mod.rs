//! Data textures: GPU textures used as addressable structured memory.
//!
//! Nothing in here is ever sampled; shaders read texels with
//! `textureLoad` using coordinates derived from vertex indices. The
//! wrapper keeps the row geometry in one place so sub-region updates and
//! whole-mirror flushes agree about the layout.

mod generator;
mod state;

pub use state::{DataTextureState, SharedLayouts};

/// One GPU data texture plus its row geometry.
#[derive(Debug)]
pub struct DataTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    bytes_per_texel: u32,
}

impl DataTexture {
    /// Create a texture of `width` x `height` texels.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let bytes_per_texel = format
            .block_copy_size(None)
            .expect("data texture formats are uncompressed");
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
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            bytes_per_texel,
        }
    }

    /// Texture view for bind groups.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Upload `bytes` over a run of texels starting at linear index
    /// `texel_offset`. The run must not cross a row boundary.
    pub fn upload_texels(&self, queue: &wgpu::Queue, texel_offset: u32, bytes: &[u8]) {
        let count = bytes.len() as u32 / self.bytes_per_texel;
        let x = texel_offset % self.width;
        let y = texel_offset / self.width;
        debug_assert!(x + count <= self.width, "texel run crosses a row");
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(count * self.bytes_per_texel),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: count,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Upload a whole texel-ordered mirror, starting at texel 0. The
    /// mirror may end mid-row; the tail is written separately.
    pub fn upload_all(&self, queue: &wgpu::Queue, bytes: &[u8]) {
        let total_texels = bytes.len() as u32 / self.bytes_per_texel;
        let full_rows = total_texels / self.width;
        let row_bytes = (self.width * self.bytes_per_texel) as usize;
        if full_rows > 0 {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &self.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &bytes[..full_rows as usize * row_bytes],
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.width * self.bytes_per_texel),
                    rows_per_image: None,
                },
                wgpu::Extent3d {
                    width: self.width,
                    height: full_rows,
                    depth_or_array_layers: 1,
                },
            );
        }
        let tail = total_texels % self.width;
        if tail > 0 {
            self.upload_texels(
                queue,
                full_rows * self.width,
                &bytes[full_rows as usize * row_bytes..],
            );
        }
    }
}
