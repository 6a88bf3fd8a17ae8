//! Headless generation: runs the built-in scatter model through the
//! orchestrator and saves one recording per iteration.
//!
//! Usage: cargo run --release --bin generate_recording -- [OPTIONS]
//!
//! Options:
//!   --config <FILE>    Model config JSON (default: built-in defaults)
//!   --palette <FILE>   Base palette JSON (default: built-in 3-color palette)
//!   --out <DIR>        Output directory (default: "recordings")
//!   --compress         Write LZ4-compressed recordings

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use voxreel::core::{Error, Result};
use voxreel::generation::{GenerationEvent, ModelConfig, Orchestrator, ScatterModel};
use voxreel::palette::{resolve, BasePalette, BlockStateCatalog, PaletteSession};
use voxreel::recording::RecordingStore;
use voxreel::visual::LogSink;

const DEFAULT_PALETTE: &str = r#"[
    {"symbol": "B", "value": "000000"},
    {"symbol": "W", "value": "FFFFFF"},
    {"symbol": "R", "value": "FF0000"}
]"#;

fn main() {
    voxreel::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config = parse_str_arg(&args, "--config").map(PathBuf::from);
    let palette = parse_str_arg(&args, "--palette").map(PathBuf::from);
    let out = PathBuf::from(parse_str_arg(&args, "--out").unwrap_or_else(|| "recordings".to_string()));
    let compress = args.iter().any(|a| a == "--compress");

    if let Err(e) = run(config.as_deref(), palette.as_deref(), out, compress) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config: Option<&Path>, palette: Option<&Path>, out: PathBuf, compress: bool) -> Result<()> {
    let mut config = match config {
        Some(path) => ModelConfig::load_sync(path)?,
        None => ModelConfig { model: "Scatter".into(), steps: 200, steps_per_refresh: 10, ..Default::default() },
    };
    config.record = true;
    config.validate()?;

    let base = match palette {
        Some(path) => BasePalette::load_sync(path)?,
        None => BasePalette::from_json_str(DEFAULT_PALETTE)?,
    };
    let resolved = resolve(&base, &config.custom_mapping, &BlockStateCatalog);
    let session = PaletteSession::new(&base, &resolved);

    let legend: Vec<char> = base.entries().iter().map(|e| e.symbol).take(256).collect();
    if legend.len() < 2 {
        return Err(Error::Config("The base palette needs at least two symbols".into()));
    }
    let model = ScatterModel::new(config.model.clone(), config.size(), legend);

    println!("=== Voxreel Generator ===");
    println!("Model:      {}", config.model);
    println!("Size:       {}", config.size());
    println!("Iterations: {}", config.amount);
    println!("Steps:      {} ({} per tick)", config.steps, config.steps_per_refresh);
    println!("Output:     {}", out.display());
    println!();

    let store = RecordingStore::new(out).compressed(compress);
    let mut orchestrator = Orchestrator::new(Arc::new(model), config, Arc::new(resolved))?
        .with_recording_palette(session.export_palette())
        .with_store(store);

    let start = Instant::now();
    let mut sink = LogSink::default();
    orchestrator.run_to_end(&mut sink);

    for event in orchestrator.drain_events() {
        match event {
            GenerationEvent::RecordingSaved { iteration, path } => {
                println!("Iteration #{}: {}", iteration, path.display());
            }
            GenerationEvent::RecordingFailed { iteration, reason } => {
                println!("Iteration #{}: save failed: {}", iteration, reason);
            }
            _ => {}
        }
    }
    println!(
        "Done in {:.1}s: {} batches, {} instances",
        start.elapsed().as_secs_f32(),
        sink.batches,
        sink.instances
    );
    Ok(())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
