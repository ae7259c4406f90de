use std::path::PathBuf;

use crate::VALIDATION_ENABLED;

/// Everything the view needs to know before it creates its window and Vulkan objects.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,

    /// Compiled SPIR-V, read at startup relative to the working directory.
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,

    /// Used for the swap extent when the surface leaves the choice to us.
    pub fallback_extent: (u32, u32),

    pub clear_color: [f32; 4],
    pub validation: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            title: String::from("Vulkan Window"),
            width: 800,
            height: 600,
            vertex_shader: PathBuf::from("shaders/vert.spv"),
            fragment_shader: PathBuf::from("shaders/frag.spv"),
            fallback_extent: (800, 600),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            validation: VALIDATION_ENABLED,
        }
    }
}
