use crate::{config::HorizontalScale, Result};

/// Rendering backend abstraction.
///
/// Implementations own every screen-space concern, including how bins are
/// mapped onto the horizontal axis in each [`HorizontalScale`] mode. The
/// number of magnitudes can change between calls (the transform was resized
/// at runtime) and must be handled without re-initialization.
pub trait Renderer {
    fn render(&mut self, magnitudes: &[f32], mode: HorizontalScale) -> Result<()>;
}
