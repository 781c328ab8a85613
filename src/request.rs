//! Request handling for the diagram image and its viewport thumbnail:
//! query string in, encoded image out.

use crate::config::Config;
use crate::covbar::{CoverageBar, render_coverage_bar};
use crate::error::{RenderError, RequestError};
use crate::ir::Scene;
use crate::raster::{self, ImageFormat, RenderedImage};
use crate::render::render_svg;
use crate::store::{DiagramEntry, SceneStore};
use crate::thumbnail::render_thumbnail;
use crate::viewport::{SizePolicy, ViewportParams, ViewportState};
use resvg::tiny_skia::Pixmap;

/// Decoded query string. Repeated keys keep the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn diagram(&self) -> Option<&str> {
        self.get("d")
    }

    pub fn viewport_params(&self) -> ViewportParams {
        ViewportParams::from_pairs(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// A diagram request with its diagram resolved and scene fetched, ready
/// to paint.
#[derive(Debug, Clone)]
pub struct PreparedDiagram {
    pub entry: DiagramEntry,
    pub viewport: ViewportState,
    pub scene: Scene,
}

impl PreparedDiagram {
    pub fn prepare<S>(store: &S, query: &Query, config: &Config) -> Result<Self, RequestError>
    where
        S: SceneStore + ?Sized,
    {
        let index = store.diagram_index()?;
        let entry = index.resolve(query.diagram())?.clone();
        let viewport = ViewportState::from_params(
            &query.viewport_params(),
            config.diagram.size(),
            SizePolicy::Clamped,
            &config.limits,
        );
        log::debug!(
            "diagram \"{}\" (G{}) at {}x{} zoom {:.3} pan ({:.3}, {:.3})",
            entry.name,
            entry.index,
            viewport.width,
            viewport.height,
            viewport.zoom,
            viewport.pan_x,
            viewport.pan_y
        );
        let scene = store.fetch_scene(&entry)?;
        Ok(Self {
            entry,
            viewport,
            scene,
        })
    }

    pub fn svg(&self, config: &Config) -> Result<String, RenderError> {
        render_svg(&self.scene, &self.viewport, &config.theme, config.policy)
    }

    pub fn pixmap(&self, config: &Config) -> Result<Pixmap, RenderError> {
        let svg = self.svg(config)?;
        raster::svg_to_pixmap(
            &svg,
            self.viewport.width,
            self.viewport.height,
            &config.theme.font_family,
        )
    }

    pub fn image(
        &self,
        config: &Config,
        format: ImageFormat,
    ) -> Result<RenderedImage, RenderError> {
        let pixmap = self.pixmap(config)?;
        raster::encode(&pixmap, format)
    }
}

/// Renders the diagram image for a request.
pub fn render_diagram<S>(
    store: &S,
    query: &Query,
    config: &Config,
    format: Option<ImageFormat>,
) -> Result<RenderedImage, RequestError>
where
    S: SceneStore + ?Sized,
{
    let prepared = PreparedDiagram::prepare(store, query, config)?;
    let format = format.unwrap_or_else(|| config.preferred_format());
    let image = prepared.image(config, format)?;
    log::debug!("rendered {} bytes of {}", image.bytes.len(), image.content_type());
    Ok(image)
}

/// Renders the viewport thumbnail for a request. The diagram name is
/// accepted but not consulted.
pub fn render_viewport(
    query: &Query,
    config: &Config,
    format: Option<ImageFormat>,
) -> Result<RenderedImage, RenderError> {
    let viewport = ViewportState::from_params(
        &query.viewport_params(),
        config.thumbnail.size(),
        SizePolicy::Unclamped,
        &config.limits,
    );
    let format = format.unwrap_or_else(|| config.preferred_format());
    render_thumbnail(&viewport, &config.theme, format)
}

/// Renders the coverage bar for a request. `None` means the counts sum to
/// zero and the response carries no image.
pub fn render_covbar(
    query: &Query,
    config: &Config,
    format: Option<ImageFormat>,
) -> Result<Option<RenderedImage>, RenderError> {
    let bar = CoverageBar::from_query(query, config.covbar.size(), &config.limits);
    log::debug!(
        "coverage bar {}x{} covered {} partial {} uncovered {}",
        bar.width,
        bar.height,
        bar.counts.covered,
        bar.counts.partial,
        bar.counts.uncovered
    );
    let format = format.unwrap_or_else(|| config.preferred_format());
    render_coverage_bar(&bar, &config.theme, format)
}
