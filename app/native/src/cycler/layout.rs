//! Layout strategies.
//!
//! A layout strategy decides how many freshly picked wallpapers each screen
//! needs per cycle, and how picked wallpapers are assembled into one
//! desktop-wide composition plan.
//!
//! - **All**: every randomly cycled screen gets its own new wallpaper.
//! - **`AllCloned`**: one new wallpaper is cloned across every randomly cycled screen.
//! - **`OneByOne`**: a single screen changes per cycle, round-robin, while the
//!   other screens keep the wallpaper they showed last time.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::error::{CycleError, CycleResult};
use super::screens::{ScreenBounds, ScreensSettings};
use super::wallpaper::Wallpaper;

/// Number of wallpapers each screen requires this cycle, indexed by screen.
pub type RequiredPerScreen = SmallVec<[usize; 4]>;

/// Layout strategy selection, as found in the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    /// Change every randomly cycled screen at once.
    #[default]
    All,
    /// Show one new wallpaper on every randomly cycled screen.
    AllCloned,
    /// Change one screen per cycle.
    OneByOne,
}

/// What the composer draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// One wallpaper stretched over the whole virtual desktop.
    Spanning(Wallpaper),
    /// One wallpaper per screen, in screen order.
    PerScreen(Vec<Wallpaper>),
}

/// Everything the build step needs to render a desktop image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionPlan {
    pub screens: Vec<ScreenBounds>,
    pub composition: Composition,
}

impl CompositionPlan {
    /// Wallpapers referenced by the plan, in drawing order.
    #[must_use]
    pub fn wallpapers(&self) -> Vec<&Wallpaper> {
        match &self.composition {
            Composition::Spanning(wallpaper) => vec![wallpaper],
            Composition::PerScreen(wallpapers) => wallpapers.iter().collect(),
        }
    }
}

/// State kept by the one-by-one strategy between cycles.
#[derive(Debug, Clone, Default)]
pub struct OneByOneState {
    last_screen_layout: Vec<Wallpaper>,
    last_changed_screen_index: Option<usize>,
}

impl OneByOneState {
    #[must_use]
    pub fn last_screen_layout(&self) -> &[Wallpaper] { &self.last_screen_layout }

    #[must_use]
    pub const fn last_changed_screen_index(&self) -> Option<usize> { self.last_changed_screen_index }

    /// Next screen to change, when the previous layout can be reused.
    fn next_target(&self, screens: &ScreensSettings) -> Option<usize> {
        let count = screens.len();
        if count == 0 || self.last_screen_layout.len() != count {
            return None;
        }

        let start = self.last_changed_screen_index.map_or(0, |index| index + 1);
        (0..count)
            .map(|offset| (start + offset) % count)
            .find(|&index| screens.get(index).is_some_and(|s| s.requires_random()))
    }

    fn remember(&mut self, layout: Vec<Wallpaper>, changed: Option<usize>) {
        self.last_changed_screen_index = changed;
        self.last_screen_layout = layout;
    }

    fn clear(&mut self) {
        self.last_screen_layout.clear();
        self.last_changed_screen_index = None;
    }
}

/// Layout strategy with its per-instance state.
#[derive(Debug, Clone)]
pub enum LayoutStrategy {
    All,
    AllCloned,
    OneByOne(OneByOneState),
}

impl LayoutStrategy {
    #[must_use]
    pub fn new(change_type: ChangeType) -> Self {
        match change_type {
            ChangeType::All => Self::All,
            ChangeType::AllCloned => Self::AllCloned,
            ChangeType::OneByOne => Self::OneByOne(OneByOneState::default()),
        }
    }

    #[must_use]
    pub const fn change_type(&self) -> ChangeType {
        match self {
            Self::All => ChangeType::All,
            Self::AllCloned => ChangeType::AllCloned,
            Self::OneByOne(_) => ChangeType::OneByOne,
        }
    }

    /// Forgets any layout remembered from previous cycles.
    pub fn reset(&mut self) {
        if let Self::OneByOne(state) = self {
            state.clear();
        }
    }

    /// Returns how many new wallpapers each screen needs this cycle.
    #[must_use]
    pub fn required_per_screen(&self, screens: &ScreensSettings) -> RequiredPerScreen {
        if let Self::OneByOne(state) = self {
            if let Some(target) = state.next_target(screens) {
                let mut required: RequiredPerScreen = SmallVec::from_elem(0, screens.len());
                required[target] = 1;
                return required;
            }
        }

        screens.iter().map(|screen| usize::from(screen.requires_random())).collect()
    }

    /// Plans a composition around one wallpaper.
    ///
    /// A multiscreen wallpaper spans the whole desktop. Any other wallpaper is
    /// placed on every randomly cycled screen while static screens keep their
    /// static wallpaper; the placeholder therefore yields the all-static desktop.
    pub fn compose_from_single(
        &mut self,
        wallpaper: &Wallpaper,
        screens: &ScreensSettings,
    ) -> CompositionPlan {
        let bounds = screens.bounds();

        if wallpaper.is_multiscreen {
            self.reset();
            return CompositionPlan {
                screens: bounds,
                composition: Composition::Spanning(wallpaper.clone()),
            };
        }

        let layout: Vec<Wallpaper> = screens
            .iter()
            .map(|screen| {
                if screen.requires_random() {
                    wallpaper.clone()
                } else {
                    screen.static_wallpaper.clone()
                }
            })
            .collect();

        if let Self::OneByOne(state) = self {
            state.remember(layout.clone(), screens.len().checked_sub(1));
        }

        CompositionPlan {
            screens: bounds,
            composition: Composition::PerScreen(layout),
        }
    }

    /// Plans a composition from per-screen picks.
    ///
    /// `per_screen` holds one list per screen; screens that required nothing
    /// carry an empty list and show their static wallpaper.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::InvalidInput` if `per_screen` is empty, does not
    /// match the screen count, or holds no wallpaper at all.
    pub fn compose_from_multiple(
        &mut self,
        per_screen: &[Vec<Wallpaper>],
        screens: &ScreensSettings,
    ) -> CycleResult<CompositionPlan> {
        if per_screen.is_empty() {
            return Err(CycleError::invalid("no per-screen wallpapers supplied"));
        }
        if per_screen.len() != screens.len() {
            return Err(CycleError::invalid(format!(
                "{} per-screen lists supplied for {} screens",
                per_screen.len(),
                screens.len()
            )));
        }
        let Some(first) = per_screen.iter().find_map(|list| list.first()) else {
            return Err(CycleError::invalid("per-screen lists contain no wallpaper"));
        };

        let layout = match self {
            Self::All => assemble(per_screen, screens),
            Self::AllCloned => screens
                .iter()
                .map(|screen| {
                    if screen.requires_random() {
                        first.clone()
                    } else {
                        screen.static_wallpaper.clone()
                    }
                })
                .collect(),
            Self::OneByOne(state) => splice_or_rebuild(state, per_screen, screens),
        };

        Ok(CompositionPlan {
            screens: screens.bounds(),
            composition: Composition::PerScreen(layout),
        })
    }
}

/// First pick of each screen, or its static wallpaper when it picked nothing.
fn assemble(per_screen: &[Vec<Wallpaper>], screens: &ScreensSettings) -> Vec<Wallpaper> {
    per_screen
        .iter()
        .zip(screens)
        .map(|(picked, screen)| {
            picked.first().map_or_else(|| screen.static_wallpaper.clone(), Clone::clone)
        })
        .collect()
}

fn splice_or_rebuild(
    state: &mut OneByOneState,
    per_screen: &[Vec<Wallpaper>],
    screens: &ScreensSettings,
) -> Vec<Wallpaper> {
    let mut changed = per_screen.iter().enumerate().filter(|(_, list)| !list.is_empty());
    let single_change = match (changed.next(), changed.next()) {
        (Some((index, list)), None) => Some((index, &list[0])),
        _ => None,
    };

    if state.last_screen_layout.len() == screens.len() {
        if let Some((target, wallpaper)) = single_change {
            let mut layout = state.last_screen_layout.clone();
            for (index, screen) in screens.iter().enumerate() {
                if index != target && !screen.requires_random() {
                    layout[index] = screen.static_wallpaper.clone();
                }
            }
            layout[target] = wallpaper.clone();
            tracing::debug!(screen = target, "one-by-one layout changed a single screen");
            state.remember(layout.clone(), Some(target));
            return layout;
        }
    }

    let layout = assemble(per_screen, screens);
    tracing::debug!(screens = layout.len(), "one-by-one layout rebuilt");
    state.remember(layout.clone(), screens.len().checked_sub(1));
    layout
}
