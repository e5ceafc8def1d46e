//! Wallpaper selection and cycling engine.
//!
//! [`WallpaperCycler`] owns the per-instance state (history, screen settings,
//! layout memory, autocycle timer) and turns a candidate pool into a
//! [`CompositionPlan`] that is rendered and applied in the background.

pub mod build;
pub mod channels;
pub mod conditions;
pub mod error;
pub mod history;
pub mod layout;
pub mod manager;
pub mod screens;
pub mod selector;
pub mod sources;
pub mod timer;
pub mod wallpaper;

pub use build::{Arrangement, BuildSlot, Composer, DesktopApplier};
pub use channels::{CyclerEvent, FailureChannel, FailureHandling};
pub use conditions::{CycleConditions, TimeWindow};
pub use error::{BuildError, CycleError, CycleResult, ShortfallStage};
pub use layout::{ChangeType, Composition, CompositionPlan};
pub use manager::{CyclerOptions, CyclerServices, WallpaperCycler};
pub use screens::{ScreenBounds, ScreenSettings, ScreensSettings};
pub use selector::Selection;
pub use sources::{FixedTopology, ScreenTopology, WallpaperProvider};
pub use wallpaper::{Placement, Wallpaper};
