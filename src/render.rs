use crate::arrow::arrowhead;
use crate::config::ContractPolicy;
use crate::error::RenderError;
use crate::ir::{ColorId, Point, Primitive, Rgb, Scene};
use crate::theme::Theme;
use crate::transform::Transform;
use crate::viewport::ViewportState;
use std::collections::HashMap;

/// Paints a scene into a pixel-space SVG document sized to the viewport.
/// Primitives are emitted in scene order so later ones paint over earlier
/// ones.
pub fn render_svg(
    scene: &Scene,
    viewport: &ViewportState,
    theme: &Theme,
    policy: ContractPolicy,
) -> Result<String, RenderError> {
    let mut svg = svg_open(viewport.width, viewport.height, &theme.background);

    let Some(transform) = Transform::new(&scene.bounds, viewport) else {
        match policy {
            ContractPolicy::Strict => return Err(RenderError::DegenerateBounds),
            ContractPolicy::Lenient => {
                log::warn!("scene bounds {:?} have zero extent, drawing nothing", scene.bounds);
                svg.push_str("</svg>");
                return Ok(svg);
            }
        }
    };

    let mut painter = Painter {
        svg,
        colors: ColorTable::default(),
        transform,
        theme,
        policy,
    };
    for primitive in &scene.primitives {
        painter.paint(primitive)?;
    }
    painter.svg.push_str("</svg>");
    Ok(painter.svg)
}

pub(crate) fn svg_open(width: u32, height: u32, background: &str) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" shape-rendering=\"crispEdges\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(background)
    ));
    svg
}

/// Colors declared so far in the current scene.
#[derive(Debug, Default)]
struct ColorTable {
    colors: HashMap<ColorId, Rgb>,
}

impl ColorTable {
    fn declare(&mut self, id: ColorId, rgb: Rgb) {
        self.colors.insert(id, rgb);
    }

    fn lookup(&self, id: ColorId, policy: ContractPolicy) -> Result<Option<String>, RenderError> {
        match self.colors.get(&id) {
            Some(rgb) => Ok(Some(rgb.to_hex())),
            None => match policy {
                ContractPolicy::Strict => Err(RenderError::UndeclaredColor { id }),
                ContractPolicy::Lenient => {
                    log::warn!("color {id} used before it was declared, skipping");
                    Ok(None)
                }
            },
        }
    }

    fn lookup_optional(
        &self,
        id: Option<ColorId>,
        policy: ContractPolicy,
    ) -> Result<Option<String>, RenderError> {
        match id {
            Some(id) => self.lookup(id, policy),
            None => Ok(None),
        }
    }
}

struct Painter<'a> {
    svg: String,
    colors: ColorTable,
    transform: Transform,
    theme: &'a Theme,
    policy: ContractPolicy,
}

impl Painter<'_> {
    fn paint(&mut self, primitive: &Primitive) -> Result<(), RenderError> {
        match primitive {
            Primitive::Color { id, rgb } => {
                self.colors.declare(*id, *rgb);
            }
            Primitive::Rectangle {
                x0,
                y0,
                x1,
                y1,
                fill,
                stroke,
            } => {
                let a = self.transform.apply(Point::new(*x0, *y0));
                let b = self.transform.apply(Point::new(*x1, *y1));
                if let Some(color) = self.colors.lookup_optional(*fill, self.policy)? {
                    self.filled_rect(a, b, &color);
                }
                if let Some(color) = self.colors.lookup_optional(*stroke, self.policy)? {
                    self.outlined_rect(a, b, &color);
                }
            }
            Primitive::Text { x, y, color, text } => {
                if let Some(color) = self.colors.lookup(*color, self.policy)? {
                    let anchor = self.transform.apply(Point::new(*x, *y));
                    self.text_block(anchor, text, &color);
                }
            }
            Primitive::Polyline {
                points,
                start_arrow,
                end_arrow,
                color,
            } => {
                let Some(color) = self.colors.lookup(*color, self.policy)? else {
                    return Ok(());
                };
                let points: Vec<Point> = points.iter().map(|p| self.transform.apply(*p)).collect();
                if points.len() < 2 {
                    return Ok(());
                }
                self.svg.push_str(&format!(
                    "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                    pixel_points(&points),
                    color,
                    self.theme.line_width
                ));
                let n = points.len();
                if let Some(size) = start_arrow {
                    self.arrowhead(points[1], points[0], *size, &color)?;
                }
                if let Some(size) = end_arrow {
                    self.arrowhead(points[n - 2], points[n - 1], *size, &color)?;
                }
            }
            Primitive::Polygon {
                points,
                fill,
                stroke,
            } => {
                let points: Vec<Point> = points.iter().map(|p| self.transform.apply(*p)).collect();
                if let Some(color) = self.colors.lookup_optional(*fill, self.policy)? {
                    self.svg.push_str(&format!(
                        "<polygon points=\"{}\" fill=\"{}\"/>",
                        pixel_points(&points),
                        color
                    ));
                }
                if let Some(color) = self.colors.lookup_optional(*stroke, self.policy)? {
                    self.svg.push_str(&format!(
                        "<polygon points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                        pixel_points(&points),
                        color,
                        self.theme.line_width
                    ));
                }
            }
        }
        Ok(())
    }

    /// Fills every pixel between the two corners, inclusive.
    fn filled_rect(&mut self, a: Point, b: Point, color: &str) {
        let (x, y, w, h) = pixel_span(a, b);
        self.svg.push_str(&format!(
            "<rect x=\"{x}\" y=\"{y}\" width=\"{}\" height=\"{}\" fill=\"{color}\"/>",
            w + 1.0,
            h + 1.0
        ));
    }

    fn outlined_rect(&mut self, a: Point, b: Point, color: &str) {
        let (x, y, w, h) = pixel_span(a, b);
        self.svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{w}\" height=\"{h}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{}\"/>",
            x + 0.5,
            y + 0.5,
            self.theme.line_width
        ));
    }

    fn text_block(&mut self, anchor: Point, text: &str, color: &str) {
        let pitch = f64::from(self.theme.line_pitch());
        let ascent = f64::from(self.theme.font_size);
        for (idx, line) in text.split('\n').enumerate() {
            if line.is_empty() {
                continue;
            }
            let top = anchor.y + idx as f64 * pitch;
            self.svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" xml:space=\"preserve\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                anchor.x,
                top + ascent,
                escape_xml(&self.theme.font_family),
                self.theme.font_size,
                color,
                escape_xml(line)
            ));
        }
    }

    fn arrowhead(
        &mut self,
        from: Point,
        to: Point,
        size: f64,
        color: &str,
    ) -> Result<(), RenderError> {
        let size = self.transform.length(size);
        match arrowhead(from, to, size) {
            Some(head) => {
                self.svg.push_str(&format!(
                    "<polygon points=\"{}\" fill=\"{}\"/>",
                    pixel_points(&head.vertices()),
                    color
                ));
                Ok(())
            }
            None => match self.policy {
                ContractPolicy::Strict => Err(RenderError::DegenerateArrow),
                ContractPolicy::Lenient => {
                    log::warn!("zero-length arrow segment at ({:.1}, {:.1}), skipping", to.x, to.y);
                    Ok(())
                }
            },
        }
    }
}

/// Snaps two corners to whole pixels: origin plus non-negative extent.
fn pixel_span(a: Point, b: Point) -> (f64, f64, f64, f64) {
    let (xa, xb) = (a.x.floor(), b.x.floor());
    let (ya, yb) = (a.y.floor(), b.y.floor());
    (xa.min(xb), ya.min(yb), (xb - xa).abs(), (yb - ya).abs())
}

/// Vertex list with every point moved onto its pixel centre, so filled and
/// stroked shapes cover the same pixels whichever primitive drew them.
fn pixel_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x + 0.5, p.y + 0.5))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Characters XML 1.0 allows in a document. Anything else would make the
/// whole SVG unparseable, so it is dropped before escaping.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
        || c >= '\u{10000}'
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .chars()
        .filter(|c| is_xml_char(*c))
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BoundingBox;

    fn red_square() -> Scene {
        Scene::new(
            vec![
                Primitive::Color {
                    id: 1,
                    rgb: Rgb::new(255, 0, 0),
                },
                Primitive::Rectangle {
                    x0: 0.0,
                    y0: 0.0,
                    x1: 10.0,
                    y1: 10.0,
                    fill: Some(1),
                    stroke: None,
                },
            ],
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        )
    }

    #[test]
    fn declared_colors_resolve() {
        let svg = render_svg(
            &red_square(),
            &ViewportState::show_all(101, 101),
            &Theme::default(),
            ContractPolicy::Strict,
        )
        .unwrap();
        assert!(
            svg.contains("<rect x=\"0\" y=\"0\" width=\"11\" height=\"11\" fill=\"#FF0000\"/>")
        );
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn undeclared_color_follows_policy() {
        let mut scene = red_square();
        scene.primitives.remove(0);
        let viewport = ViewportState::show_all(101, 101);

        let err = render_svg(&scene, &viewport, &Theme::default(), ContractPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, RenderError::UndeclaredColor { id: 1 }));

        let svg = render_svg(&scene, &viewport, &Theme::default(), ContractPolicy::Lenient)
            .unwrap();
        assert!(!svg.contains("#FF0000"));
    }

    #[test]
    fn multi_line_text_uses_line_pitch() {
        let scene = Scene::new(
            vec![
                Primitive::Color {
                    id: 0,
                    rgb: Rgb::BLACK,
                },
                Primitive::Text {
                    x: 10.0,
                    y: 20.0,
                    color: 0,
                    text: "main\n<foo.c>".to_string(),
                },
            ],
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        );
        let theme = Theme::default();
        let svg = render_svg(
            &scene,
            &ViewportState::show_all(101, 101),
            &theme,
            ContractPolicy::Strict,
        )
        .unwrap();
        assert!(svg.contains("y=\"31.00\""));
        assert!(svg.contains("y=\"48.00\""));
        assert!(svg.contains(">&lt;foo.c&gt;</text>"));
    }

    #[test]
    fn polyline_arrows_are_drawn_at_both_ends() {
        let scene = Scene::new(
            vec![
                Primitive::Color {
                    id: 0,
                    rgb: Rgb::BLACK,
                },
                Primitive::Polyline {
                    points: vec![
                        Point::new(0.0, 0.0),
                        Point::new(50.0, 0.0),
                        Point::new(50.0, 50.0),
                    ],
                    start_arrow: Some(4.0),
                    end_arrow: Some(4.0),
                    color: 0,
                },
            ],
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        );
        let svg = render_svg(
            &scene,
            &ViewportState::show_all(101, 101),
            &Theme::default(),
            ContractPolicy::Strict,
        )
        .unwrap();
        assert_eq!(svg.matches("<polygon").count(), 2);
        assert!(svg.contains("<polygon points=\"0.50,0.50 4.50,-0.50 4.50,1.50\""));
    }

    #[test]
    fn zero_length_arrow_follows_policy() {
        let scene = Scene::new(
            vec![
                Primitive::Color {
                    id: 0,
                    rgb: Rgb::BLACK,
                },
                Primitive::Polyline {
                    points: vec![Point::new(5.0, 5.0), Point::new(5.0, 5.0)],
                    start_arrow: None,
                    end_arrow: Some(2.0),
                    color: 0,
                },
            ],
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        );
        let viewport = ViewportState::show_all(64, 64);
        assert!(matches!(
            render_svg(&scene, &viewport, &Theme::default(), ContractPolicy::Strict),
            Err(RenderError::DegenerateArrow)
        ));
        let svg = render_svg(&scene, &viewport, &Theme::default(), ContractPolicy::Lenient)
            .unwrap();
        assert!(svg.contains("<polyline"));
        assert!(!svg.contains("<polygon"));
    }

    fn rgb_at(pixmap: &resvg::tiny_skia::Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
        let px = pixmap.pixel(x, y).unwrap();
        (px.red(), px.green(), px.blue())
    }

    #[test]
    fn later_primitives_paint_over_earlier_ones() {
        let scene = Scene::new(
            vec![
                Primitive::Color {
                    id: 1,
                    rgb: Rgb::new(255, 0, 0),
                },
                Primitive::Color {
                    id: 2,
                    rgb: Rgb::new(0, 0, 255),
                },
                Primitive::Color {
                    id: 3,
                    rgb: Rgb::BLACK,
                },
                Primitive::Rectangle {
                    x0: 10.0,
                    y0: 10.0,
                    x1: 50.0,
                    y1: 50.0,
                    fill: Some(1),
                    stroke: Some(3),
                },
                Primitive::Rectangle {
                    x0: 30.0,
                    y0: 30.0,
                    x1: 70.0,
                    y1: 70.0,
                    fill: Some(2),
                    stroke: None,
                },
                Primitive::Polygon {
                    points: vec![
                        Point::new(60.0, 10.0),
                        Point::new(90.0, 10.0),
                        Point::new(75.0, 25.0),
                    ],
                    fill: Some(1),
                    stroke: Some(3),
                },
            ],
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        );
        let theme = Theme::default();
        let svg = render_svg(
            &scene,
            &ViewportState::show_all(101, 101),
            &theme,
            ContractPolicy::Strict,
        )
        .unwrap();
        assert!(
            svg.contains("points=\"60.50,10.50 90.50,10.50 75.50,25.50\" fill=\"#FF0000\"/>")
        );
        let pixmap = crate::raster::svg_to_pixmap(&svg, 101, 101, &theme.font_family).unwrap();

        // Fill inside, stroke on the outline.
        assert_eq!(rgb_at(&pixmap, 20, 20), (255, 0, 0));
        assert_eq!(rgb_at(&pixmap, 10, 25), (0, 0, 0));
        assert_eq!(rgb_at(&pixmap, 25, 10), (0, 0, 0));
        // The second rectangle covers both the fill and the border of the first.
        assert_eq!(rgb_at(&pixmap, 40, 40), (0, 0, 255));
        assert_eq!(rgb_at(&pixmap, 50, 40), (0, 0, 255));
        assert_eq!(rgb_at(&pixmap, 60, 60), (0, 0, 255));
        assert_eq!(rgb_at(&pixmap, 80, 80), (255, 255, 255));
        // Polygon fill and outline.
        assert_eq!(rgb_at(&pixmap, 75, 15), (255, 0, 0));
        assert_eq!(rgb_at(&pixmap, 75, 10), (0, 0, 0));
    }

    #[test]
    fn control_characters_are_dropped_from_text() {
        assert_eq!(escape_xml("a\u{1}b\u{FFFE}c\t&"), "abc\t&amp;");

        let scene = Scene::new(
            vec![
                Primitive::Color {
                    id: 0,
                    rgb: Rgb::BLACK,
                },
                Primitive::Text {
                    x: 10.0,
                    y: 10.0,
                    color: 0,
                    text: "bad\u{1}name\u{1b}".to_string(),
                },
            ],
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        );
        let theme = Theme::default();
        let svg = render_svg(
            &scene,
            &ViewportState::show_all(101, 101),
            &theme,
            ContractPolicy::Lenient,
        )
        .unwrap();
        assert!(svg.contains(">badname</text>"));
        assert!(crate::raster::svg_to_pixmap(&svg, 101, 101, &theme.font_family).is_ok());
    }

    #[test]
    fn degenerate_bounds_follow_policy() {
        let mut scene = red_square();
        scene.bounds = BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        let viewport = ViewportState::show_all(64, 64);
        assert!(matches!(
            render_svg(&scene, &viewport, &Theme::default(), ContractPolicy::Strict),
            Err(RenderError::DegenerateBounds)
        ));
        let svg = render_svg(&scene, &viewport, &Theme::default(), ContractPolicy::Lenient)
            .unwrap();
        assert!(!svg.contains("#FF0000"));
    }
}
