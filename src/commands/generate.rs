//! Generate static files

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

use crate::generator::Generator;
use crate::Folio;

/// Quiet period that closes a batch of file events
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Load the content table and write every page
pub fn run(folio: &Folio) -> Result<()> {
    let start = Instant::now();

    let table = folio.load_table()?;
    tracing::info!("Loaded {} posts", table.len());

    let generator = Generator::new(folio)?;
    generator.generate(&table)?;

    tracing::info!("Generated in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Regenerate whenever the sources or the configuration change
pub async fn watch(folio: &Folio) -> Result<()> {
    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(DEBOUNCE, tx)?;

    debouncer
        .watcher()
        .watch(&folio.source_dir, RecursiveMode::Recursive)?;
    let config_path = folio.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let base_dir = folio.base_dir.clone();
    tokio::task::block_in_place(|| rebuild_on_changes(&base_dir, rx));

    Ok(())
}

/// Regenerate once per debounced batch until the watcher goes away
fn rebuild_on_changes(base_dir: &Path, rx: Receiver<DebounceEventResult>) {
    for result in rx {
        match result {
            Ok(events) => {
                for event in &events {
                    tracing::debug!("File changed: {}", event.path.display());
                }
                tracing::info!("{} file(s) changed, regenerating...", events.len());
                // The configuration may have changed too
                if let Err(e) = Folio::new(base_dir).and_then(|f| run(&f)) {
                    tracing::error!("Generation failed: {:#}", e);
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }
}
