/// Errors returned by [`crate::CrossLocsDetector`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("invalid detector parameters: {0}")]
    InvalidParams(String),
    #[error("image too small for detection ({width}x{height})")]
    ImageTooSmall { width: usize, height: usize },
    #[error("no grid cell found (side {side_min}..={side_max})")]
    SeedNotFound { side_min: u32, side_max: u32 },
    #[error("no cross confirmed around the seed at ({x}, {y})")]
    EmptyMainGrid { x: f32, y: f32 },
}
