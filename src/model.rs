use log::debug;

/// Application state. The triangle is hardcoded in the vertex shader, so there is nothing to hold
/// yet.
#[derive(Debug, Default)]
pub struct Model;

impl Model {
    pub fn new() -> Self {
        debug!("Model created");
        Self
    }
}
