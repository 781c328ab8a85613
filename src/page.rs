//! The diagram page: where its image and thumbnail come from, and the
//! zoom and pan links around it. Every link carries an already-clamped
//! viewport so bookmarked URLs stay valid.

use crate::config::Config;
use crate::store::DiagramEntry;
use crate::viewport::ViewportState;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub viewport: ViewportState,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramPage {
    pub name: String,
    pub title: String,
    pub viewport: ViewportState,
    pub image_url: String,
    pub thumbnail_url: String,
    pub show_all: NavLink,
    pub zoom_in: NavLink,
    pub zoom_out: NavLink,
    /// Directional pans, row by row from the top left, skipping the centre.
    pub pan: Vec<NavLink>,
}

const PAN_LABELS: [&str; 9] = [
    "pan up-left",
    "pan up",
    "pan up-right",
    "pan left",
    "",
    "pan right",
    "pan down-left",
    "pan down",
    "pan down-right",
];

impl DiagramPage {
    pub fn build(entry: &DiagramEntry, viewport: &ViewportState, config: &Config) -> Self {
        let limits = &config.limits;
        let page = config.urls.page.as_str();
        let link = |label: &'static str, target: ViewportState| NavLink {
            label,
            url: viewport_url(page, &entry.name, &target),
            viewport: target,
        };

        let mut pan = Vec::with_capacity(8);
        for (i, label) in PAN_LABELS.iter().enumerate() {
            let dx = (i % 3) as i32 - 1;
            let dy = (i / 3) as i32 - 1;
            if dx == 0 && dy == 0 {
                continue;
            }
            pan.push(link(*label, viewport.panned(dx, dy, limits)));
        }

        let thumbnail = ViewportState {
            width: config.thumbnail.width,
            height: config.thumbnail.height,
            ..*viewport
        };

        Self {
            name: entry.name.clone(),
            title: entry.title.clone(),
            viewport: *viewport,
            image_url: viewport_url(&config.urls.render, &entry.name, viewport),
            thumbnail_url: viewport_url(&config.urls.viewport, &entry.name, &thumbnail),
            show_all: link("show all", viewport.reset()),
            zoom_in: link("zoom in", viewport.zoom_in(limits)),
            zoom_out: link("zoom out", viewport.zoom_out(limits)),
            pan,
        }
    }
}

pub fn viewport_url(base: &str, diagram: &str, viewport: &ViewportState) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("d", diagram)
        .append_pair("w", &viewport.width.to_string())
        .append_pair("h", &viewport.height.to_string())
        .append_pair("z", &viewport.zoom.to_string())
        .append_pair("px", &format!("{:.6}", viewport.pan_x))
        .append_pair("py", &format!("{:.6}", viewport.pan_y))
        .finish();
    format!("{base}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::request::Query;
    use crate::viewport::SizePolicy;

    fn entry() -> DiagramEntry {
        DiagramEntry {
            name: "callgraph".to_string(),
            index: 0,
            title: "Call Graph".to_string(),
        }
    }

    #[test]
    fn builds_links_for_every_direction() {
        let config = Config::default();
        let viewport = ViewportState {
            width: 450,
            height: 450,
            zoom: 2.0,
            pan_x: 0.25,
            pan_y: 0.25,
        };
        let page = DiagramPage::build(&entry(), &viewport, &config);

        assert_eq!(
            page.image_url,
            "drender?d=callgraph&w=450&h=450&z=2&px=0.250000&py=0.250000"
        );
        assert_eq!(
            page.thumbnail_url,
            "dviewport?d=callgraph&w=64&h=64&z=2&px=0.250000&py=0.250000"
        );
        assert_eq!(page.zoom_in.viewport.zoom, 3.0);
        assert_eq!(page.show_all.viewport, ViewportState::show_all(450, 450));
        assert_eq!(page.pan.len(), 8);
        assert_eq!(page.pan[0].viewport.pan_x, 0.125);
        assert_eq!(page.pan[7].viewport.pan_y, 0.375);
        assert!(page.pan.iter().all(|l| !l.label.is_empty()));
    }

    #[test]
    fn links_parse_back_to_their_viewport() {
        let config = Config::default();
        let viewport = ViewportState::show_all(450, 450).zoom_in(&config.limits);
        let page = DiagramPage::build(&entry(), &viewport, &config);
        for link in page.pan.iter().chain([&page.zoom_in, &page.zoom_out]) {
            let (_, query) = link.url.split_once('?').unwrap();
            let query = Query::parse(query);
            assert_eq!(query.diagram(), Some("callgraph"));
            let parsed = ViewportState::from_params(
                &query.viewport_params(),
                (450, 450),
                SizePolicy::Clamped,
                &Limits::default(),
            );
            assert!((parsed.zoom - link.viewport.zoom).abs() < 1e-9);
            assert!((parsed.pan_x - link.viewport.pan_x).abs() < 1e-6);
            assert!((parsed.pan_y - link.viewport.pan_y).abs() < 1e-6);
        }
    }
}
