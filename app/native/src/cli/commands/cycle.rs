//! Commands driving the wallpaper cycler.
//!
//! Each command builds a cycler from the configuration on a single-threaded
//! runtime. Builds run on the runtime's blocking pool; one-shot commands wait
//! for the build to finish before returning.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tokio::runtime::Runtime;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::cli::output::{format_bool, print_highlighted_json};
use crate::config::{ConfigPool, LoadedConfig};
use crate::cycler::{
    BuildSlot, CycleResult, CyclerEvent, CyclerServices, FailureHandling, FixedTopology, Selection,
    Wallpaper, WallpaperCycler,
};
use crate::error::WallcycleError;
use crate::platform::path::expand;
use crate::render::{ImageComposer, SystemDesktop};

/// A cycler wired to the real renderer and desktop.
struct Engine {
    cycler: Arc<WallpaperCycler>,
    runtime: Runtime,
}

impl Engine {
    fn start(loaded: &LoadedConfig) -> Result<Self, WallcycleError> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let base_dir = loaded.base_dir();
        let config = &loaded.config;

        let services = CyclerServices {
            composer: Arc::new(ImageComposer::new()),
            applier: Arc::new(SystemDesktop::new()),
            topology: Arc::new(FixedTopology::new(config.screen_bounds())),
            provider: Some(Arc::new(ConfigPool::new(config, &base_dir))),
            slot: BuildSlot::global(),
        };
        let cycler = WallpaperCycler::new(
            config.to_options(&base_dir),
            config.to_screens(&base_dir),
            services,
            runtime.handle().clone(),
        )?;

        // Failures surface through events and log lines; the process keeps running.
        cycler.build_failures().subscribe(|err| {
            tracing::error!(error = %err, "wallpaper build failed");
            FailureHandling::Handled
        });
        cycler.autocycle_failures().subscribe(|err| {
            tracing::error!(error = %err, "automatic wallpaper cycle failed");
            FailureHandling::Handled
        });

        Ok(Self { cycler, runtime })
    }

    fn cycle_and_wait<F>(&self, cycle: F) -> Result<(Selection, PathBuf), WallcycleError>
    where
        F: FnOnce(&WallpaperCycler) -> CycleResult<Selection>,
    {
        let mut events = self.cycler.subscribe();
        let selection = cycle(&self.cycler)?;
        let output = self.runtime.block_on(wait_for_build(&mut events))?;
        Ok((selection, output))
    }
}

async fn wait_for_build(events: &mut broadcast::Receiver<CyclerEvent>) -> Result<PathBuf, WallcycleError> {
    loop {
        match events.recv().await {
            Ok(CyclerEvent::BuildFinished(path)) => return Ok(path),
            Ok(CyclerEvent::BuildFailed(message)) => return Err(WallcycleError::CycleError(message)),
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => {
                return Err(WallcycleError::CommandError(
                    "the cycler stopped before the build finished".to_string(),
                ));
            }
        }
    }
}

fn print_cycle(selection: &Selection, output: &Path) {
    let wallpapers: Vec<_> = selection.picked().iter().map(|w| w.path.display().to_string()).collect();
    print_highlighted_json(&json!({
        "multiscreen": selection.multiscreen,
        "wallpapers": wallpapers,
        "output": output.display().to_string(),
    }));
}

/// Picks and applies random wallpapers once.
///
/// # Errors
///
/// Returns an error if the pool cannot satisfy the screens or the build fails.
pub fn next(loaded: &LoadedConfig) -> Result<(), WallcycleError> {
    let engine = Engine::start(loaded)?;
    let (selection, output) = engine.cycle_and_wait(|cycler| cycler.cycle_next_randomly(None))?;
    print_cycle(&selection, &output);
    Ok(())
}

/// Applies the given images.
///
/// # Errors
///
/// Returns `InvalidArguments` if an image does not exist, or the build error.
pub fn set(loaded: &LoadedConfig, paths: &[String], multiscreen: bool) -> Result<(), WallcycleError> {
    let pool = paths
        .iter()
        .map(|path| {
            let resolved = expand(path);
            if resolved.is_file() {
                Ok(Wallpaper::new(resolved).with_multiscreen(multiscreen))
            } else {
                Err(WallcycleError::InvalidArguments(format!("Wallpaper not found: {path}")))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let engine = Engine::start(loaded)?;
    let (selection, output) = engine.cycle_and_wait(|cycler| cycler.cycle_next(&pool))?;
    print_cycle(&selection, &output);
    Ok(())
}

/// Checks whether the configured pool can satisfy every screen.
///
/// # Errors
///
/// Returns `CycleError` when it cannot.
pub fn check(loaded: &LoadedConfig) -> Result<(), WallcycleError> {
    let engine = Engine::start(loaded)?;
    let ok = engine.cycler.check_pool_integrity(None);
    println!("{} wallpaper pool covers {} screen(s)", format_bool(ok), loaded.config.screen_count());

    if ok {
        Ok(())
    } else {
        Err(WallcycleError::CycleError(
            "the wallpaper pool cannot satisfy the configured screens".to_string(),
        ))
    }
}

/// Prints the resolved wallpaper pool as JSON.
///
/// # Errors
///
/// Returns an error if the pool cannot be serialized.
pub fn list(loaded: &LoadedConfig) -> Result<(), WallcycleError> {
    let pool = ConfigPool::new(&loaded.config, &loaded.base_dir()).wallpapers();
    print_highlighted_json(&serde_json::to_value(&pool)?);
    Ok(())
}

fn log_event(event: &CyclerEvent) {
    match event {
        CyclerEvent::ActiveWallpapersChanged(active) => {
            let paths: Vec<_> = active.iter().map(|w| w.path.display().to_string()).collect();
            tracing::info!(wallpapers = ?paths, "wallpapers changed");
        }
        CyclerEvent::AutocyclingChanged(enabled) => tracing::info!(enabled, "autocycle toggled"),
        CyclerEvent::BuildFinished(path) => tracing::debug!(path = %path.display(), "build finished"),
        CyclerEvent::BuildFailed(message) => tracing::warn!(%message, "build failed"),
    }
}

/// Cycles once, then keeps autocycling until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the engine cannot start or the signal handler fails.
pub fn run(loaded: &LoadedConfig) -> Result<(), WallcycleError> {
    let engine = Engine::start(loaded)?;
    let cycler = Arc::clone(&engine.cycler);

    engine.runtime.block_on(async {
        let mut events = cycler.subscribe();

        if let Err(err) = cycler.cycle_next_randomly(None) {
            tracing::warn!(error = %err, "initial wallpaper cycle failed");
        }
        if loaded.config.autocycle_on_start {
            cycler.start_autocycle()?;
        }

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    tracing::info!("shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "missed cycler events"),
                    Err(RecvError::Closed) => break,
                },
            }
        }

        Ok::<(), WallcycleError>(())
    })?;

    cycler.dispose();
    Ok(())
}
