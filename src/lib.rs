pub mod arrow;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod covbar;
pub mod error;
pub mod ir;
pub mod page;
pub mod parser;
pub mod raster;
pub mod render;
pub mod request;
pub mod scenegen;
pub mod store;
pub mod theme;
pub mod thumbnail;
pub mod transform;
pub mod viewport;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, ContractPolicy, load_config};
pub use covbar::{CoverageBar, CoverageCounts, CoverageStatus};
pub use error::{RenderError, RequestError, SceneError, StoreError};
pub use ir::{BoundingBox, ColorId, Point, Primitive, Rgb, Scene};
pub use page::DiagramPage;
pub use parser::parse_scene;
pub use raster::{ImageFormat, RenderedImage};
pub use render::render_svg;
pub use request::{PreparedDiagram, Query, render_covbar, render_diagram, render_viewport};
pub use scenegen::SceneBuilder;
pub use store::{DiagramEntry, DiagramIndex, JsonFileStore, MemoryStore, SceneStore};
pub use theme::Theme;
pub use viewport::ViewportState;
