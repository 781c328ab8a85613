use crate::config::{Config, load_config};
use crate::page::DiagramPage;
use crate::raster::{ImageFormat, RenderedImage};
use crate::request::{PreparedDiagram, Query, render_covbar, render_diagram, render_viewport};
use crate::store::{JsonFileStore, SceneStore};
use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "ggcov-drender",
    version,
    about = "Render ggcov diagrams from an exported web database"
)]
pub struct Args {
    /// Config JSON file (theme, defaults, limits)
    #[arg(short = 'c', long = "configFile", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a diagram image
    Render {
        #[command(flatten)]
        store: StoreArg,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render the viewport thumbnail
    Viewport {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render a coverage bar from covered/partly covered/uncovered counts
    Covbar {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the diagram page model (image URLs and navigation links) as JSON
    Page {
        #[command(flatten)]
        store: StoreArg,
        /// Request query string, e.g. "d=callgraph&z=1.5&px=0.1"
        #[arg(short = 'q', long = "query", default_value = "")]
        query: String,
    },
    /// Print the diagram index as JSON
    List {
        #[command(flatten)]
        store: StoreArg,
    },
}

#[derive(ClapArgs, Debug)]
pub struct StoreArg {
    /// Exported web database (JSON object of keys)
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
}

#[derive(ClapArgs, Debug)]
pub struct OutputArgs {
    /// Request query string, e.g. "d=callgraph&w=450&h=450&z=1&px=0&py=0"
    #[arg(short = 'q', long = "query", default_value = "")]
    pub query: String,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format. Defaults to the first configured format.
    #[arg(short = 'e', long = "outputFormat", value_enum)]
    pub format: Option<ImageFormat>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Render { store, output } => {
            let store = JsonFileStore::open(store.store);
            let query = Query::parse(&output.query);
            let format = output.format.or_else(|| format_from_path(output.output.as_deref()));
            let image = render_diagram(&store, &query, &config, format)?;
            write_image(&image, output.output.as_deref())?;
        }
        Command::Viewport { output } => {
            let query = Query::parse(&output.query);
            let format = output.format.or_else(|| format_from_path(output.output.as_deref()));
            let image = render_viewport(&query, &config, format)?;
            write_image(&image, output.output.as_deref())?;
        }
        Command::Covbar { output } => {
            let query = Query::parse(&output.query);
            let format = output.format.or_else(|| format_from_path(output.output.as_deref()));
            match render_covbar(&query, &config, format)? {
                Some(image) => write_image(&image, output.output.as_deref())?,
                None => log::info!("coverage counts are all zero, no image written"),
            }
        }
        Command::Page { store, query } => {
            let store = JsonFileStore::open(store.store);
            let page = build_page(&store, &Query::parse(&query), &config)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Command::List { store } => {
            let store = JsonFileStore::open(store.store);
            let index = store.diagram_index()?;
            println!("{}", serde_json::to_string_pretty(&index)?);
        }
    }
    Ok(())
}

fn build_page<S: SceneStore + ?Sized>(
    store: &S,
    query: &Query,
    config: &Config,
) -> Result<DiagramPage> {
    let prepared = PreparedDiagram::prepare(store, query, config)?;
    Ok(DiagramPage::build(&prepared.entry, &prepared.viewport, config))
}

fn format_from_path(path: Option<&Path>) -> Option<ImageFormat> {
    let ext = path?.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "gif" => Some(ImageFormat::Gif),
        "png" => Some(ImageFormat::Png),
        _ => None,
    }
}

fn write_image(image: &RenderedImage, output: Option<&Path>) -> Result<()> {
    log::info!(
        "{}x{} {} ({} bytes)",
        image.width,
        image.height,
        image.content_type(),
        image.bytes.len()
    );
    match output {
        Some(path) => {
            std::fs::write(path, &image.bytes)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&image.bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
