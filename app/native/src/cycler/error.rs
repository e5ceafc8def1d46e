//! Errors raised by the cycling engine.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the cycler.
pub type CycleResult<T> = Result<T, CycleError>;

/// Step of the selection algorithm at which the candidate pool ran short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortfallStage {
    /// No wallpaper is both activated and has a non-zero priority.
    NoUsableWallpapers,
    /// The chosen mode (multiscreen or singlescreen) has no candidates left.
    NoWallpapersForMode,
    /// Fewer singlescreen candidates than picks required this cycle.
    TooFewForMode { available: usize, required: usize },
    /// A screen has fewer eligible candidates than it requires.
    ScreenShortfall { screen: usize, available: usize, required: usize },
    /// The pool ran dry while picking.
    PoolExhausted { picked: usize, required: usize },
}

impl ShortfallStage {
    /// Ordinal of the selection step that failed.
    #[must_use]
    pub const fn stage(&self) -> u8 {
        match self {
            Self::NoUsableWallpapers => 1,
            Self::NoWallpapersForMode
            | Self::TooFewForMode { .. }
            | Self::ScreenShortfall { .. } => 3,
            Self::PoolExhausted { .. } => 6,
        }
    }
}

impl fmt::Display for ShortfallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUsableWallpapers => write!(f, "no activated wallpaper with a priority above 0"),
            Self::NoWallpapersForMode => write!(f, "no wallpaper matches the chosen mode"),
            Self::TooFewForMode { available, required } => {
                write!(f, "{available} singlescreen wallpapers available, {required} required")
            }
            Self::ScreenShortfall { screen, available, required } => write!(
                f,
                "screen {screen} has {available} eligible wallpapers, {required} required"
            ),
            Self::PoolExhausted { picked, required } => {
                write!(f, "pool exhausted after picking {picked} of {required} wallpapers")
            }
        }
    }
}

/// Failures of the out-of-process build step (compose, save, apply).
#[derive(Debug, Error)]
pub enum BuildError {
    /// A source image could not be opened or decoded.
    #[error("Failed to read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The composition plan had nothing to draw.
    #[error("Composition plan is empty")]
    EmptyPlan,
    /// The rendered image could not be written.
    #[error("Failed to save rendered image: {0}")]
    Save(#[from] image::ImageError),
    /// The desktop background could not be set.
    #[error("Failed to apply desktop background: {0}")]
    Apply(String),
    /// Filesystem failure around the output path.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The build was cancelled before it finished.
    #[error("Build was cancelled")]
    Cancelled,
}

/// Errors returned by cycling operations.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The request itself was malformed (empty pool, mixed modes, bad value).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The pool does not hold enough usable wallpapers.
    #[error("Not enough wallpapers to cycle (stage {}): {stage}", stage.stage())]
    InsufficientCandidates { stage: ShortfallStage },

    /// Another build is still running somewhere in this process.
    #[error("A wallpaper build is already in progress")]
    ConcurrentBuildInProgress,

    /// Composition, saving or applying the wallpaper failed.
    #[error("Wallpaper build failed: {0}")]
    BuildFailure(#[from] BuildError),

    /// A timer or topology triggered cycle failed.
    #[error("Autocycle failed: {0}")]
    AutocycleFailure(Box<CycleError>),

    /// The cycler was disposed.
    #[error("Wallpaper cycler has been disposed")]
    Disposed,
}

impl CycleError {
    pub(crate) const fn shortfall(stage: ShortfallStage) -> Self {
        Self::InsufficientCandidates { stage }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self { Self::InvalidInput(msg.into()) }

    /// Returns the shortfall stage when this is an `InsufficientCandidates` error.
    #[must_use]
    pub const fn shortfall_stage(&self) -> Option<ShortfallStage> {
        match self {
            Self::InsufficientCandidates { stage } => Some(*stage),
            _ => None,
        }
    }
}
