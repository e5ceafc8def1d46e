//! Integration tests for the wallpaper cycler.
//!
//! These drive [`WallpaperCycler`] through its public API with an in-memory
//! desktop, covering behaviour that spans several cycles.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use wallcycle_lib::config::{ConfigPool, CyclerConfig, ScreenConfig};
use wallcycle_lib::cycler::{
    Arrangement, BuildError, BuildSlot, ChangeType, Composer, Composition, CompositionPlan,
    CyclerEvent, CyclerOptions, CyclerServices, DesktopApplier, FixedTopology, ScreenBounds,
    ScreenTopology, ScreensSettings, Wallpaper, WallpaperCycler, WallpaperProvider,
};
use wallcycle_lib::render::ImageComposer;

// ============================================================================
// Helpers
// ============================================================================

/// Composer that keeps every plan it was asked to render.
#[derive(Default)]
struct PlanRecorder {
    plans: Mutex<Vec<CompositionPlan>>,
}

impl Composer for PlanRecorder {
    fn compose(&self, plan: &CompositionPlan, _scale_factor: f32) -> Result<RgbaImage, BuildError> {
        self.plans.lock().push(plan.clone());
        Ok(RgbaImage::new(1, 1))
    }
}

/// Desktop that keeps rendered images in memory.
#[derive(Default)]
struct MemoryDesktop {
    saved: Mutex<Vec<(u32, u32)>>,
    applied: Mutex<Vec<PathBuf>>,
}

impl DesktopApplier for MemoryDesktop {
    fn save(&self, image: &RgbaImage, _path: &Path) -> Result<(), BuildError> {
        self.saved.lock().push(image.dimensions());
        Ok(())
    }

    fn apply(&self, path: &Path, _arrangement: Arrangement) -> Result<(), BuildError> {
        self.applied.lock().push(path.to_path_buf());
        Ok(())
    }
}

fn side_by_side(count: usize) -> Vec<ScreenBounds> {
    (0..count)
        .map(|i| ScreenBounds::new(i32::try_from(i).unwrap() * 1920, 0, 1920, 1080))
        .collect()
}

fn options(change_type: ChangeType) -> CyclerOptions {
    CyclerOptions {
        change_type,
        output_path: std::env::temp_dir().join("wallcycle-integration.png"),
        ..CyclerOptions::default()
    }
}

fn cycler(
    screens: ScreensSettings,
    options: CyclerOptions,
    composer: Arc<dyn Composer>,
    desktop: Arc<MemoryDesktop>,
    provider: Option<Arc<dyn WallpaperProvider>>,
) -> Arc<WallpaperCycler> {
    let services = CyclerServices {
        composer,
        applier: desktop,
        topology: Arc::new(FixedTopology::new(screens.bounds())) as Arc<dyn ScreenTopology>,
        provider,
        slot: BuildSlot::new(),
    };
    WallpaperCycler::new(options, screens, services, Handle::current()).unwrap()
}

async fn next_build(events: &mut broadcast::Receiver<CyclerEvent>) -> CyclerEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("build did not finish in time")
            .expect("event channel closed");
        if matches!(event, CyclerEvent::BuildFinished(_) | CyclerEvent::BuildFailed(_)) {
            return event;
        }
    }
}

fn per_screen_layout(plan: &CompositionPlan) -> Vec<Wallpaper> {
    match &plan.composition {
        Composition::PerScreen(layout) => layout.clone(),
        other => panic!("expected a per-screen composition, got {other:?}"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_history_prevents_repeats_across_cycles() {
    let desktop = Arc::new(MemoryDesktop::default());
    let cycler = cycler(
        ScreensSettings::all_random(&side_by_side(1)),
        options(ChangeType::All),
        Arc::new(PlanRecorder::default()),
        Arc::clone(&desktop),
        None,
    );
    let pool: Vec<_> = (0..10).map(|i| Wallpaper::new(format!("{i}.jpg")).with_priority(10)).collect();
    let mut events = cycler.subscribe();

    // 80% of ten wallpapers are remembered, so nine cycles in a row are distinct.
    let mut seen = HashSet::new();
    for _ in 0..9 {
        let selection = cycler.cycle_next_randomly(Some(&pool)).unwrap();
        assert_eq!(selection.picked_count(), 1);
        assert!(seen.insert(selection.picked()[0].id), "a remembered wallpaper was picked again");
        assert!(matches!(next_build(&mut events).await, CyclerEvent::BuildFinished(_)));
    }

    assert_eq!(desktop.applied.lock().len(), 9);
}

#[tokio::test]
async fn test_one_by_one_changes_screens_in_turn() {
    let composer = Arc::new(PlanRecorder::default());
    let cycler = cycler(
        ScreensSettings::all_random(&side_by_side(3)),
        options(ChangeType::OneByOne),
        Arc::clone(&composer) as Arc<dyn Composer>,
        Arc::new(MemoryDesktop::default()),
        None,
    );
    let pool: Vec<_> = (0..6).map(|i| Wallpaper::new(format!("{i}.jpg"))).collect();
    let mut events = cycler.subscribe();

    let first = cycler.cycle_next_randomly(Some(&pool)).unwrap();
    assert_eq!(first.picked_count(), 3);
    next_build(&mut events).await;

    for _ in 0..3 {
        let selection = cycler.cycle_next_randomly(Some(&pool)).unwrap();
        assert_eq!(selection.picked_count(), 1);
        assert_eq!(cycler.active_wallpapers().len(), 3);
        next_build(&mut events).await;
    }

    let plans = composer.plans.lock();
    assert_eq!(plans.len(), 4);
    for (turn, pair) in plans.windows(2).enumerate() {
        let before = per_screen_layout(&pair[0]);
        let after = per_screen_layout(&pair[1]);
        let changed: Vec<_> = (0..3).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed, [turn], "turn {turn} changed the wrong screen");
    }
}

#[tokio::test]
async fn test_configuration_drives_a_full_cycle() {
    let dir = TempDir::new().unwrap();
    let images = dir.path().join("images");
    fs::create_dir_all(&images).unwrap();
    for (name, color) in [("a.png", [255, 0, 0, 255]), ("b.png", [0, 255, 0, 255]), ("c.png", [0, 0, 255, 255])] {
        RgbaImage::from_pixel(16, 9, Rgba(color)).save(images.join(name)).unwrap();
    }
    fs::write(images.join("notes.txt"), b"not an image").unwrap();

    let config = CyclerConfig {
        directories: vec!["images".to_string()],
        screens: vec![
            ScreenConfig { width: 160, height: 90, ..ScreenConfig::default() },
            ScreenConfig { x: 160, width: 160, height: 90, ..ScreenConfig::default() },
        ],
        output_path: Some(dir.path().join("out.png").to_string_lossy().into_owned()),
        ..CyclerConfig::default()
    };
    config.validate().unwrap();

    let desktop = Arc::new(MemoryDesktop::default());
    let provider: Arc<dyn WallpaperProvider> = Arc::new(ConfigPool::new(&config, dir.path()));
    let cycler = cycler(
        config.to_screens(dir.path()),
        config.to_options(dir.path()),
        Arc::new(ImageComposer::new()),
        Arc::clone(&desktop),
        Some(provider),
    );
    assert!(cycler.check_pool_integrity(None));

    let mut events = cycler.subscribe();
    let selection = cycler.cycle_next_randomly(None).unwrap();

    assert_eq!(selection.picked_count(), 2);
    assert!(selection.picked().iter().all(|w| w.path.starts_with(&images)));
    assert!(selection.picked().iter().all(|w| w.path.extension().is_some_and(|ext| ext == "png")));

    match next_build(&mut events).await {
        CyclerEvent::BuildFinished(path) => assert_eq!(path, dir.path().join("out.png")),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(desktop.saved.lock().as_slice(), &[(320, 90)]);
}

#[tokio::test]
async fn test_multiscreen_wallpaper_spans_every_screen() {
    let composer = Arc::new(PlanRecorder::default());
    let cycler = cycler(
        ScreensSettings::all_random(&side_by_side(2)),
        options(ChangeType::All),
        Arc::clone(&composer) as Arc<dyn Composer>,
        Arc::new(MemoryDesktop::default()),
        None,
    );
    let panorama = Wallpaper::new("panorama.jpg").with_multiscreen(true);
    let mut events = cycler.subscribe();

    let selection = cycler.cycle_next(std::slice::from_ref(&panorama)).unwrap();
    assert!(selection.multiscreen);
    next_build(&mut events).await;

    let plans = composer.plans.lock();
    assert_eq!(plans[0].composition, Composition::Spanning(panorama));
    assert_eq!(plans[0].screens, side_by_side(2));
}
