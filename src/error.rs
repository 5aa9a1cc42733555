//! Level loading errors
//!
//! Everything inside the frame loop reports failure through return values;
//! only loading level geometry can fail outright.

/// Failure to produce a playable level
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    #[error("Failed to read level map {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed level map: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Level map uses {found}px tiles, expected {expected}px")]
    TileSize { found: u32, expected: u32 },

    #[error("Level map has no solid tiles")]
    NoGround,
}
