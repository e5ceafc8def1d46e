//! Single-flight build pipeline.
//!
//! Rendering and applying a desktop image runs off the scheduling loop. Only
//! one build may be in flight per process: the [`BuildSlot`] is claimed before
//! selection starts and released when the build finishes, fails or is
//! cancelled. A second claim while the slot is busy fails immediately with
//! [`CycleError::ConcurrentBuildInProgress`]; nothing is queued.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use image::RgbaImage;
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{BuildError, CycleError, CycleResult};
use super::layout::CompositionPlan;

/// How the OS lays the rendered image out on the desktop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Arrangement {
    /// Stretch the image across every screen.
    #[default]
    Span,
    /// Repeat the image from the top-left corner of the virtual desktop.
    Tile,
    /// Stretch the image to each screen.
    Stretch,
    /// Center the image on each screen.
    Center,
}

/// Renders a composition plan into a single image.
pub trait Composer: Send + Sync {
    /// Composes `plan` into one image, scaled by `scale_factor`.
    ///
    /// # Errors
    ///
    /// Returns a `BuildError` if a source image cannot be read or the plan is empty.
    fn compose(&self, plan: &CompositionPlan, scale_factor: f32) -> Result<RgbaImage, BuildError>;
}

/// Persists a rendered image and installs it as the desktop background.
pub trait DesktopApplier: Send + Sync {
    /// Writes `image` to `path`.
    ///
    /// # Errors
    ///
    /// Returns a `BuildError` if the image cannot be written.
    fn save(&self, image: &RgbaImage, path: &Path) -> Result<(), BuildError>;

    /// Sets the image at `path` as the desktop background.
    ///
    /// # Errors
    ///
    /// Returns a `BuildError` if the OS rejects the change.
    fn apply(&self, path: &Path, arrangement: Arrangement) -> Result<(), BuildError>;
}

/// Identifies the cycler owning a claimed build slot.
pub type OwnerId = Uuid;

struct SlotOwner {
    owner: OwnerId,
    cancelled: Arc<AtomicBool>,
}

#[derive(Default)]
struct SlotInner {
    busy: AtomicBool,
    owner: Mutex<Option<SlotOwner>>,
}

/// Process-wide token allowing at most one build in flight.
///
/// Clones share the same slot. [`BuildSlot::global`] is the slot every
/// cycler uses by default; tests create isolated slots with [`BuildSlot::new`].
#[derive(Clone, Default)]
pub struct BuildSlot {
    inner: Arc<SlotInner>,
}

static GLOBAL_SLOT: OnceLock<BuildSlot> = OnceLock::new();

impl BuildSlot {
    /// Creates an independent slot.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns the slot shared by the whole process.
    #[must_use]
    pub fn global() -> Self { GLOBAL_SLOT.get_or_init(Self::new).clone() }

    /// Returns whether a build currently holds the slot.
    #[must_use]
    pub fn is_busy(&self) -> bool { self.inner.busy.load(Ordering::Acquire) }

    /// Claims the slot for `owner`.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::ConcurrentBuildInProgress` if the slot is taken.
    pub fn try_claim(&self, owner: OwnerId) -> CycleResult<BuildClaim> {
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CycleError::ConcurrentBuildInProgress);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        *self.inner.owner.lock() = Some(SlotOwner {
            owner,
            cancelled: Arc::clone(&cancelled),
        });

        Ok(BuildClaim { slot: self.clone(), cancelled })
    }

    /// Requests cancellation of the build held by `owner`, if any.
    ///
    /// Returns whether a build owned by `owner` was in flight.
    pub fn cancel_owned_by(&self, owner: OwnerId) -> bool {
        let guard = self.inner.owner.lock();
        match guard.as_ref() {
            Some(current) if current.owner == owner => {
                current.cancelled.store(true, Ordering::Release);
                true
            }
            _ => false,
        }
    }

    fn release(&self) {
        *self.inner.owner.lock() = None;
        self.inner.busy.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for BuildSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildSlot").field("busy", &self.is_busy()).finish()
    }
}

/// A claimed build slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct BuildClaim {
    slot: BuildSlot,
    cancelled: Arc<AtomicBool>,
}

impl BuildClaim {
    /// Returns whether the owner asked for the build to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Acquire) }
}

impl Drop for BuildClaim {
    fn drop(&mut self) { self.slot.release(); }
}

/// A self-contained build, detached from the cycler's state.
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub plan: CompositionPlan,
    pub output_path: PathBuf,
    pub arrangement: Arrangement,
    pub scale_factor: f32,
}

/// Runs a build to completion on the current thread.
///
/// Save and apply are skipped once the claim has been cancelled.
///
/// # Errors
///
/// Returns `BuildError::Cancelled` when cancelled, or the error of the
/// failing step.
pub fn run_build(
    job: &BuildJob,
    claim: &BuildClaim,
    composer: &dyn Composer,
    applier: &dyn DesktopApplier,
) -> Result<PathBuf, BuildError> {
    if claim.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    let image = composer.compose(&job.plan, job.scale_factor)?;

    if claim.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    applier.save(&image, &job.output_path)?;
    applier.apply(&job.output_path, job.arrangement)?;

    Ok(job.output_path.clone())
}
