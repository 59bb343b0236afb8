//! GPU resources owned by one stack: scratch targets, materials and
//! persistent history buffers.

pub mod history;
pub mod material_cache;
pub mod render_texture_pool;

pub use history::HistoryBuffers;
pub use material_cache::{MaterialCache, MaterialId};
pub use render_texture_pool::RenderTexturePool;
