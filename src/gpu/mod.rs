mod context;
mod image;
mod render;

pub use context::GpuContext;
pub use image::ImageTexture;
pub use render::RenderPipeline;
