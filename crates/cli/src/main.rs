mod logger;

use anyhow::{Context, Result};
use backends::{
    default_registry, parse, serialize, CanvasTarget, Parsed, Pick, PickTarget,
    RecordingSurface, SvgSurface,
};
use clap::{Parser, Subcommand, ValueEnum};
use command::{KindRegistry, SymbolTable};
use geometry::DVec2;
use handler::{execute_blocking, HandlerContext, Settings};
use log::{info, warn};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::logger::{level_for, QuillLogger};

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Render, hit-test and normalize quill drawing documents", long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write logs to ~/.quill/logs/<run>/log
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RenderFormat {
    /// An SVG document
    Svg,
    /// The surface calls as JSON
    Calls,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document
    Render {
        /// Document file (JSON)
        input: PathBuf,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = 640.0)]
        width: f64,

        #[arg(long, default_value_t = 480.0)]
        height: f64,

        #[arg(long, value_enum, default_value_t = RenderFormat::Svg)]
        format: RenderFormat,
    },
    /// List the commands under a device-space point
    Pick {
        /// Document file (JSON)
        input: PathBuf,

        x: f64,

        y: f64,

        /// Hit tolerance in device units, overrides the settings
        #[arg(long)]
        eps: Option<f64>,

        /// Device height, for y-up views
        #[arg(long, default_value_t = 480.0)]
        height: f64,
    },
    /// Parse a document and write it back out
    Normalize {
        /// Document file (JSON)
        input: PathBuf,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exit with an error when anything had to be skipped
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    QuillLogger::init(level_for(cli.verbose), cli.log_file)?;

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let symbols = SymbolTable::global();

    match cli.command {
        Commands::Render {
            input,
            output,
            width,
            height,
            format,
        } => {
            let parsed = load_document(&input, &symbols)?;
            let context = HandlerContext::new(Rc::clone(&symbols), settings);
            let registry = default_registry();

            let rendered = match format {
                RenderFormat::Svg => {
                    let surface = Rc::new(RefCell::new(SvgSurface::new(width, height)));
                    let target = CanvasTarget(surface.clone());
                    execute_blocking(&registry, &target, &parsed.main, &context);
                    let svg = surface.borrow().to_svg();
                    svg
                }
                RenderFormat::Calls => {
                    let surface = Rc::new(RefCell::new(RecordingSurface::new(height)));
                    let target = CanvasTarget(surface.clone());
                    execute_blocking(&registry, &target, &parsed.main, &context);
                    let calls = surface.borrow_mut().take();
                    serde_json::to_string_pretty(&calls)?
                }
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Pick {
            input,
            x,
            y,
            eps,
            height,
        } => {
            let parsed = load_document(&input, &symbols)?;
            let eps = eps.unwrap_or(settings.hit_eps);
            let context = HandlerContext::new(Rc::clone(&symbols), settings);

            let target = PickTarget::new(Pick::new(DVec2::new(x, y), eps).with_height(height));
            execute_blocking(&default_registry(), &target, &parsed.main, &context);

            let pick = target.0.borrow();
            info!("{} hit(s) at ({}, {})", pick.hits.len(), x, y);
            println!("{}", serde_json::to_string_pretty(&pick.hits)?);
        }
        Commands::Normalize {
            input,
            output,
            strict,
        } => {
            let parsed = load_document(&input, &symbols)?;
            if strict && !parsed.diagnostics.is_empty() {
                anyhow::bail!(
                    "{} problem(s) in {}",
                    parsed.diagnostics.len(),
                    input.display()
                );
            }
            let document = serialize(&parsed.main, Rc::clone(&symbols));
            write_output(output.as_deref(), &document.to_json_pretty()?)?;
        }
    }

    Ok(())
}

/// Reads and parses a document, logging every diagnostic.
fn load_document(path: &Path, symbols: &SymbolTable) -> Result<Parsed> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let parsed = parse(&json, &KindRegistry::new(), symbols)
        .with_context(|| format!("Failed to parse document: {}", path.display()))?;
    for diagnostic in &parsed.diagnostics {
        warn!("{}: {}", path.display(), diagnostic);
    }
    info!(
        "Loaded {} ({} command(s), {} group(s))",
        path.display(),
        parsed.main.len(),
        parsed.groups.len()
    );
    Ok(parsed)
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", contents);
            Ok(())
        }
    }
}
