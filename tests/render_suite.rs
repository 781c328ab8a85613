use std::path::{Path, PathBuf};

use ggcov_diagram::{
    BoundingBox, Config, ContractPolicy, ImageFormat, JsonFileStore, MemoryStore, PreparedDiagram,
    Primitive, Query, RequestError, Rgb, Scene, SceneBuilder, SceneStore, render_covbar,
    render_diagram, render_viewport,
};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("webdb.json")
}

fn rgb_at(pixmap: &resvg::tiny_skia::Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
    let px = pixmap.pixel(x, y).expect("pixel out of range");
    (px.red(), px.green(), px.blue())
}

fn single_red_rect_store() -> MemoryStore {
    let scene = Scene::new(
        vec![
            Primitive::Color {
                id: 1,
                rgb: Rgb::new(255, 0, 0),
            },
            Primitive::Rectangle {
                x0: 10.0,
                y0: 10.0,
                x1: 20.0,
                y1: 20.0,
                fill: Some(1),
                stroke: None,
            },
        ],
        BoundingBox::new(0.0, 0.0, 100.0, 100.0),
    );
    let mut store = MemoryStore::new();
    store.insert_diagram("callgraph", "Call Graph", &scene);
    store
}

#[test]
fn renders_red_rectangle_end_to_end() {
    let store = single_red_rect_store();
    let config = Config::default();
    let query = Query::parse("d=callgraph&w=450&h=450&z=1&px=0&py=0");

    let prepared = PreparedDiagram::prepare(&store, &query, &config).unwrap();
    assert_eq!(prepared.viewport.width, 450);
    let pixmap = prepared.pixmap(&config).unwrap();

    // Scene (15, 15) maps to 15 * 449 / 100.
    assert_eq!(rgb_at(&pixmap, 67, 67), (255, 0, 0));
    assert_eq!(rgb_at(&pixmap, 0, 0), (255, 255, 255));
    assert_eq!(rgb_at(&pixmap, 449, 449), (255, 255, 255));

    let image = render_diagram(&store, &query, &config, None).unwrap();
    assert_eq!(image.content_type(), "image/gif");
    assert!(image.bytes.starts_with(b"GIF89a"));
}

#[test]
fn unknown_diagram_is_fatal() {
    let store = single_red_rect_store();
    let err = render_diagram(
        &store,
        &Query::parse("d=nosuch"),
        &Config::default(),
        Some(ImageFormat::Png),
    )
    .unwrap_err();
    assert!(matches!(err, RequestError::UnknownDiagram(_)));
    assert_eq!(err.to_string(), "Invalid diagram");
}

#[test]
fn garbage_viewport_parameters_still_render() {
    let store = single_red_rect_store();
    let config = Config::default();
    let query = Query::parse("w=99999&h=-4&z=abc&px=9&py=..");
    let prepared = PreparedDiagram::prepare(&store, &query, &config).unwrap();
    assert_eq!(prepared.entry.name, "callgraph");
    assert_eq!(prepared.viewport.width, 1024);
    assert_eq!(prepared.viewport.height, 450);
    assert_eq!(prepared.viewport.zoom, 1.0);
    assert_eq!(prepared.viewport.pan_x, 0.0);
    let image = prepared.image(&config, ImageFormat::Png).unwrap();
    assert_eq!((image.width, image.height), (1024, 450));
}

#[test]
fn file_store_defaults_to_first_diagram() {
    let store = JsonFileStore::open(fixture());
    let config = Config::default();
    let prepared = PreparedDiagram::prepare(&store, &Query::default(), &config).unwrap();
    assert_eq!(prepared.entry.title, "Call Graph");
    assert_eq!(prepared.viewport.width, 450);

    let pixmap = prepared.pixmap(&config).unwrap();
    // Inside the fill of the "main" box, clear of its label and border.
    assert_eq!(rgb_at(&pixmap, 143, 98), (0, 192, 0));
    // Its black border, drawn over the fill edge.
    assert_eq!(rgb_at(&pixmap, 29, 60), (0, 0, 0));
    assert_eq!(rgb_at(&pixmap, 149, 60), (0, 0, 0));
    assert_eq!(rgb_at(&pixmap, 90, 29), (0, 0, 0));
    // The bordered triangle in the top right corner.
    assert_eq!(rgb_at(&pixmap, 389, 50), (192, 192, 0));
    assert_eq!(rgb_at(&pixmap, 389, 30), (0, 0, 0));
    assert_eq!(rgb_at(&pixmap, 440, 440), (255, 255, 255));
}

#[test]
fn zoom_and_pan_select_part_of_the_scene() {
    let store = JsonFileStore::open(fixture());
    let config = Config::default();
    let index = store.diagram_index().unwrap();
    assert_eq!(index.entries().len(), 2);

    let left = PreparedDiagram::prepare(&store, &Query::parse("d=lego"), &config)
        .unwrap()
        .pixmap(&config)
        .unwrap();
    assert_eq!(rgb_at(&left, 100, 200), (0, 192, 0));
    assert_eq!(rgb_at(&left, 350, 200), (192, 0, 0));

    let right = PreparedDiagram::prepare(&store, &Query::parse("d=lego&z=2&px=0.5"), &config)
        .unwrap()
        .pixmap(&config)
        .unwrap();
    assert_eq!(rgb_at(&right, 10, 200), (192, 0, 0));
    assert_eq!(rgb_at(&right, 440, 440), (192, 0, 0));
}

#[test]
fn built_scenes_render_under_strict_policy() {
    let mut sg = SceneBuilder::new();
    sg.fill(Rgb::new(0, 0, 255)).border(Rgb::BLACK).arrow_size(5.0);
    sg.rect(0.0, 0.0, 40.0, 20.0).text(2.0, 2.0, "node\nfile.c");
    sg.polyline_begin(true)
        .polyline_point(20.0, 20.0)
        .polyline_point(20.0, 60.0)
        .polyline_point(80.0, 60.0)
        .polyline_end(true);
    let scene = sg.finish(BoundingBox::new(0.0, 0.0, 100.0, 100.0));

    let mut store = MemoryStore::new();
    store.insert_diagram("flow", "Flow", &scene);
    let config = Config {
        policy: ContractPolicy::Strict,
        ..Config::default()
    };
    let prepared = PreparedDiagram::prepare(&store, &Query::parse("w=200&h=200"), &config).unwrap();
    let svg = prepared.svg(&config).unwrap();
    assert_eq!(svg.matches("<polygon").count(), 2);
    assert_eq!(svg.matches("<text").count(), 2);

    let pixmap = prepared.pixmap(&config).unwrap();
    assert_eq!(rgb_at(&pixmap, 70, 30), (0, 0, 255));
}

#[test]
fn viewport_thumbnail_marks_visible_window() {
    let config = Config::default();
    let image = render_viewport(
        &Query::parse("d=callgraph&z=2&px=0.25&py=0.25"),
        &config,
        None,
    )
    .unwrap();
    assert_eq!(image.content_type(), "image/gif");
    assert_eq!((image.width, image.height), (64, 64));
    assert!(image.bytes.starts_with(b"GIF89a"));
}

#[test]
fn covbar_request_draws_shares_or_nothing() {
    let config = Config::default();
    let image = render_covbar(
        &Query::parse("w=200&h=20&c=150&pc=0&uc=50"),
        &config,
        Some(ImageFormat::Png),
    )
    .unwrap()
    .expect("non-zero counts draw a bar");
    assert_eq!((image.width, image.height), (200, 20));
    assert!(image.bytes.starts_with(b"\x89PNG"));

    let empty = render_covbar(&Query::parse("c=0&pc=0&uc=0"), &config, None).unwrap();
    assert!(empty.is_none());
}
