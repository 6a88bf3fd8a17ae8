//! Recording inspector: loads a recording, prints a summary and optionally
//! replays it headless.
//!
//! Usage: cargo run --release --bin inspect_recording -- <FILE> [OPTIONS]
//!
//! Options:
//!   --replay          Replay through a logging sink
//!   --speed <FPS>     Replay speed in frames per second (default: 10)
//!   --mode <MODE>     auto | 2d | 3d (default: auto)

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use voxreel::recording::RecordingStore;
use voxreel::replay::{ReplayConfig, ReplayMode, ReplayScheduler};
use voxreel::visual::LogSink;

fn main() {
    voxreel::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(file) = args.get(1).filter(|a| !a.starts_with("--")).map(PathBuf::from) else {
        eprintln!("Usage: inspect_recording <FILE> [--replay] [--speed <FPS>] [--mode auto|2d|3d]");
        std::process::exit(2);
    };
    let replay = args.iter().any(|a| a == "--replay");
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(10.0);
    let mode = match parse_str_arg(&args, "--mode").as_deref() {
        None | Some("auto") => ReplayMode::Auto,
        Some("2d") => ReplayMode::TwoD,
        Some("3d") => ReplayMode::ThreeD,
        Some(other) => {
            eprintln!("Unknown mode: {}", other);
            std::process::exit(2);
        }
    };

    let dir = file.parent().map(PathBuf::from).unwrap_or_default();
    let store = RecordingStore::new(dir);
    let recording = match store.load_sync(&file) {
        Ok(recording) => Arc::new(recording),
        Err(e) => {
            log::error!("Failed to load {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    println!("=== Recording: {} ===", file.display());
    println!("Size:    {}", recording.size());
    println!("Frames:  {}", recording.frame_count());
    println!("Changes: {}", recording.change_count());
    println!("Palette:");
    for (index, entry) in recording.palette().iter().enumerate() {
        let mesh = recording.meshes()[index];
        println!(
            "  {:>3}  {}  {}  mesh {}{}",
            index,
            entry.symbol.unwrap_or('?'),
            entry.color,
            mesh.mesh_index,
            entry.block_ref().map(|b| format!(" ({})", b)).unwrap_or_default()
        );
    }

    let mut lifetimes: BTreeMap<i32, usize> = BTreeMap::new();
    for change in recording.changes() {
        *lifetimes.entry(change.persistence.max(0)).or_default() += 1;
    }
    println!("Persistence histogram (0 = permanent):");
    for (persistence, count) in &lifetimes {
        println!("  {:>5}: {}", persistence, count);
    }

    if !replay {
        return;
    }

    let config = ReplayConfig { playback_speed: speed, mode };
    let mut scheduler = match ReplayScheduler::from_config(recording, &config) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let start = Instant::now();
    let mut sink = LogSink::default();
    scheduler.run_to_end(&mut sink);
    println!(
        "Replayed {} frames, {} instances in {:.1}s",
        sink.batches,
        sink.instances,
        start.elapsed().as_secs_f32()
    );
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
