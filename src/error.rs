use thiserror::Error;

/// Input problems that abort an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("invalid map dimensions: {tiles:?} tiles with {mini_tiles:?} mini tiles")]
    InvalidDimensions {
        tiles: (usize, usize),
        mini_tiles: (usize, usize),
    },
    #[error("resource {index} at tile ({x}, {y}) does not fit on the map")]
    ResourceOutOfBounds { index: usize, x: i32, y: i32 },
    #[error("starting location at tile ({x}, {y}) is outside the map")]
    StartingLocationOutOfBounds { x: i32, y: i32 },
}
