use crate::ir::ColorId;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene must be a JSON array of records")]
    NotAnArray,
    #[error("scene has no trailing bounding box record")]
    MissingBounds,
    #[error("record {index}: {reason}")]
    BadRecord { index: usize, reason: String },
}

impl SceneError {
    pub(crate) fn record(index: usize, reason: impl Into<String>) -> Self {
        SceneError::BadRecord {
            index,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("couldn't open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store must be a JSON object of keys")]
    NotAnObject,
    #[error("couldn't find key \"{0}\"")]
    MissingKey(String),
    #[error("invalid diagram index: {0}")]
    BadIndex(String),
    #[error("diagram scene \"{key}\": {source}")]
    Scene {
        key: String,
        #[source]
        source: SceneError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("color {id} used before it was declared")]
    UndeclaredColor { id: ColorId },
    #[error("scene bounding box has zero extent")]
    DegenerateBounds,
    #[error("arrowhead segment has zero length")]
    DegenerateArrow,
    #[error("failed to parse generated SVG: {0}")]
    SvgParse(String),
    #[error("failed to allocate {width}x{height} pixmap")]
    PixmapAlloc { width: u32, height: u32 },
    #[error("failed to encode {format}: {reason}")]
    Encode { format: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid diagram")]
    UnknownDiagram(String),
    #[error("no diagrams in database")]
    NoDiagrams,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
