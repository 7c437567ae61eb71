use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use fidel_cli::die;

use fidel_core::mapping::{ensure_source, MappingTable};
use fidel_core::settings;
use fidel_engine::hook;
use fidel_engine::{EngineWorker, MappingWatcher, SubstitutionSession, ToggleObserver};

#[derive(Parser)]
#[command(name = "fidel", about = "Type Ethiopic with Latin keys, system-wide")]
struct Cli {
    /// Settings TOML file (default: built-in settings)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Mapping CSV file (overrides mapping.path)
    #[arg(long)]
    mapping: Option<PathBuf>,
    /// Write a JSON trace here instead of logging to stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

struct ModeBanner;

impl ToggleObserver for ModeBanner {
    fn on_toggled(&self, active: bool) {
        print_mode(active);
    }
}

fn print_mode(active: bool) {
    if active {
        println!("Mode: Ethiopic (ENABLED)");
    } else {
        println!("Mode: Latin (DISABLED)");
    }
}

fn main() {
    let cli = Cli::parse();

    match &cli.log_dir {
        Some(dir) => fidel_engine::trace_init::init_tracing(dir),
        None => fidel_engine::trace_init::init_stderr_tracing(),
    }

    if let Some(path) = &cli.settings {
        let content = die!(fs::read_to_string(path), "Error reading settings: {}");
        die!(settings::init_custom(content), "Error in settings: {}");
    }
    let settings = settings::settings();
    let mapping_path = cli.mapping.unwrap_or_else(|| settings.mapping.path.clone());

    if die!(ensure_source(&mapping_path), "Error creating mapping file: {}") {
        println!("Wrote default mapping to {}", mapping_path.display());
    }
    let outcome = die!(MappingTable::load(&mapping_path), "Error loading mapping: {}");
    if let Some(warning) = &outcome.warning {
        eprintln!("Warning: {warning}");
    }
    println!(
        "Loaded {} mappings from {}",
        outcome.table.len(),
        mapping_path.display()
    );

    let start_active = settings.engine.start_active;
    let session = SubstitutionSession::with_active(Arc::new(outcome.table), start_active);
    let worker = EngineWorker::spawn(
        session,
        |_| hook::enigo_injector(),
        Some(Arc::new(ModeBanner) as Arc<dyn ToggleObserver>),
    );
    let handle = worker.handle();

    let _watcher = settings.mapping.watch.then(|| {
        MappingWatcher::spawn(
            mapping_path.clone(),
            settings.mapping.poll_interval(),
            handle.clone(),
        )
    });

    let toggle = settings.engine.toggle_key();
    println!("Press {toggle} to switch between Ethiopic and Latin.");
    print_mode(start_active);

    if let Err(err) = hook::listen(handle, toggle) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
