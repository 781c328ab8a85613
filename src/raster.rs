use crate::error::RenderError;
use once_cell::sync::Lazy;
use resvg::tiny_skia::{Pixmap, Transform};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use usvg::fontdb;

static FONT_DB: Lazy<Arc<fontdb::Database>> = Lazy::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Gif,
    Png,
}

impl ImageFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Gif => "image/gif",
            ImageFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl RenderedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Rasterizes a pixel-space SVG document at 1:1 scale.
pub fn svg_to_pixmap(
    svg: &str,
    width: u32,
    height: u32,
    font_family: &str,
) -> Result<Pixmap, RenderError> {
    let mut opt = usvg::Options::default();
    opt.fontdb = FONT_DB.clone();
    if let Some(first) = font_family.split(',').map(str::trim).find(|f| !f.is_empty()) {
        opt.font_family = first.trim_matches('"').trim_matches('\'').to_string();
    }

    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|err| RenderError::SvgParse(err.to_string()))?;
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::PixmapAlloc { width, height })?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

pub fn encode(pixmap: &Pixmap, format: ImageFormat) -> Result<RenderedImage, RenderError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let bytes = match format {
        ImageFormat::Png => pixmap.encode_png().map_err(|err| RenderError::Encode {
            format: "png",
            reason: err.to_string(),
        })?,
        ImageFormat::Gif => encode_gif(pixmap)?,
    };
    Ok(RenderedImage {
        format,
        width,
        height,
        bytes,
    })
}

fn encode_gif(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    // Every image starts from an opaque background fill, so the
    // premultiplied RGBA buffer is identical to straight RGBA.
    let mut out = Vec::new();
    {
        let mut encoder = image::codecs::gif::GifEncoder::new(&mut out);
        encoder
            .encode(
                pixmap.data(),
                pixmap.width(),
                pixmap.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|err| RenderError::Encode {
                format: "gif",
                reason: err.to_string(),
            })?;
    }
    Ok(out)
}

pub fn svg_to_image(
    svg: &str,
    width: u32,
    height: u32,
    font_family: &str,
    format: ImageFormat,
) -> Result<RenderedImage, RenderError> {
    let pixmap = svg_to_pixmap(svg, width, height, font_family)?;
    encode(&pixmap, format)
}
