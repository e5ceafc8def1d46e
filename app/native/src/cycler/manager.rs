//! Wallpaper cycler: autocycle timing, manual cycles and build dispatch.
//!
//! Every trigger (timer tick, manual call, display change) ends up in
//! [`WallpaperCycler::cycle_next_randomly`] or [`WallpaperCycler::cycle_next`].
//! Both claim the process-wide build slot first, pick wallpapers
//! synchronously under the state lock, hand a deep copy of the composition
//! plan to a blocking task, and return as soon as the build is dispatched.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::build::{
    Arrangement, BuildClaim, BuildJob, BuildSlot, Composer, DesktopApplier, OwnerId, run_build,
};
use super::channels::{CyclerEvent, FailureChannel, FailureHandling};
use super::error::{BuildError, CycleError, CycleResult};
use super::history::CycleHistory;
use super::layout::{ChangeType, CompositionPlan, LayoutStrategy};
use super::screens::ScreensSettings;
use super::selector::{self, Selection, Selector};
use super::sources::{ScreenTopology, WallpaperProvider};
use super::timer::AutocycleTimer;
use super::wallpaper::Wallpaper;
use crate::constants::{
    BUILD_SCALE_FACTOR, DEFAULT_AUTOCYCLE_INTERVAL_SECS, HISTORY_PERCENT_MAX, HISTORY_PERCENT_MIN,
    MIN_AUTOCYCLE_INTERVAL_SECS,
};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Tunable behaviour of a cycler.
#[derive(Debug, Clone)]
pub struct CyclerOptions {
    pub autocycle_interval: Duration,
    /// Share of the live pool kept as history, in percent (1 to 80).
    pub history_size_percent: u8,
    pub cycle_on_topology_change: bool,
    pub change_type: ChangeType,
    pub arrangement: Arrangement,
    /// Where the rendered image is written before it is applied.
    pub output_path: PathBuf,
}

impl Default for CyclerOptions {
    fn default() -> Self {
        Self {
            autocycle_interval: Duration::from_secs(DEFAULT_AUTOCYCLE_INTERVAL_SECS),
            history_size_percent: HISTORY_PERCENT_MAX,
            cycle_on_topology_change: false,
            change_type: ChangeType::default(),
            arrangement: Arrangement::default(),
            output_path: crate::cache::default_output_path(),
        }
    }
}

impl CyclerOptions {
    /// Checks every option against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::InvalidInput` naming the first invalid option.
    pub fn validate(&self) -> CycleResult<()> {
        validate_interval(self.autocycle_interval)?;
        validate_history_percent(self.history_size_percent)
    }
}

fn validate_interval(interval: Duration) -> CycleResult<()> {
    if interval < Duration::from_secs(MIN_AUTOCYCLE_INTERVAL_SECS) {
        return Err(CycleError::invalid(format!(
            "autocycle interval must be at least {MIN_AUTOCYCLE_INTERVAL_SECS} seconds, got {interval:?}"
        )));
    }
    Ok(())
}

fn validate_history_percent(percent: u8) -> CycleResult<()> {
    if !(HISTORY_PERCENT_MIN..=HISTORY_PERCENT_MAX).contains(&percent) {
        return Err(CycleError::invalid(format!(
            "history size must be between {HISTORY_PERCENT_MIN} and {HISTORY_PERCENT_MAX} percent, got {percent}"
        )));
    }
    Ok(())
}

/// Collaborators a cycler works with.
#[derive(Clone)]
pub struct CyclerServices {
    pub composer: Arc<dyn Composer>,
    pub applier: Arc<dyn DesktopApplier>,
    pub topology: Arc<dyn ScreenTopology>,
    /// Consulted when a cycle is triggered without a pool.
    pub provider: Option<Arc<dyn WallpaperProvider>>,
    /// Usually [`BuildSlot::global`].
    pub slot: BuildSlot,
}

struct CyclerState {
    options: CyclerOptions,
    screens: ScreensSettings,
    layout: LayoutStrategy,
    history: CycleHistory,
    active: Vec<Wallpaper>,
    autocycling: bool,
    countdown_started: Option<Instant>,
    last_cycle: Option<Instant>,
    rng: StdRng,
}

/// Cycles the desktop wallpaper(s) on demand or on a timer.
pub struct WallpaperCycler {
    id: OwnerId,
    state: Mutex<CyclerState>,
    services: CyclerServices,
    timer: AutocycleTimer,
    runtime: Handle,
    events: broadcast::Sender<CyclerEvent>,
    autocycle_failures: FailureChannel,
    build_failures: Arc<FailureChannel>,
    disposed: AtomicBool,
}

impl WallpaperCycler {
    /// Creates a cycler whose timer and builds run on `runtime`.
    ///
    /// Screen bounds are synced with the topology right away. Autocycling
    /// starts stopped.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::InvalidInput` if `options` are out of range.
    pub fn new(
        options: CyclerOptions,
        mut screens: ScreensSettings,
        services: CyclerServices,
        runtime: Handle,
    ) -> CycleResult<Arc<Self>> {
        options.validate()?;
        screens.refresh_bounds(&services.topology.screens());

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = CyclerState {
            layout: LayoutStrategy::new(options.change_type),
            options,
            screens,
            history: CycleHistory::default(),
            active: Vec::new(),
            autocycling: false,
            countdown_started: None,
            last_cycle: None,
            rng: StdRng::from_rng(&mut rand::rng()),
        };

        Ok(Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let timer = AutocycleTimer::spawn(
                &runtime,
                Box::new(move || {
                    weak.upgrade().is_some_and(|cycler| {
                        cycler.on_autocycle_tick();
                        !cycler.is_disposed()
                    })
                }),
            );

            Self {
                id: Uuid::now_v7(),
                state: Mutex::new(state),
                services,
                timer,
                runtime,
                events,
                autocycle_failures: FailureChannel::new("autocycle"),
                build_failures: Arc::new(FailureChannel::new("build")),
                disposed: AtomicBool::new(false),
            }
        }))
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Identity used to claim the build slot.
    #[must_use]
    pub const fn id(&self) -> OwnerId { self.id }

    /// Subscribes to state change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CyclerEvent> { self.events.subscribe() }

    /// Failures of timer and display-change triggered cycles.
    #[must_use]
    pub const fn autocycle_failures(&self) -> &FailureChannel { &self.autocycle_failures }

    /// Failures of background builds.
    #[must_use]
    pub fn build_failures(&self) -> &FailureChannel { &self.build_failures }

    #[must_use]
    pub fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }

    #[must_use]
    pub fn is_autocycling(&self) -> bool { self.state.lock().autocycling }

    /// Wallpapers picked by the latest cycle.
    #[must_use]
    pub fn active_wallpapers(&self) -> Vec<Wallpaper> { self.state.lock().active.clone() }

    #[must_use]
    pub fn screen_settings(&self) -> ScreensSettings { self.state.lock().screens.clone() }

    #[must_use]
    pub fn autocycle_interval(&self) -> Duration { self.state.lock().options.autocycle_interval }

    #[must_use]
    pub fn history_size_percent(&self) -> u8 { self.state.lock().options.history_size_percent }

    #[must_use]
    pub fn change_type(&self) -> ChangeType { self.state.lock().layout.change_type() }

    /// Time left until the next automatic cycle, zero when not autocycling.
    #[must_use]
    pub fn time_until_next_cycle(&self) -> Duration {
        let state = self.state.lock();
        if !state.autocycling {
            return Duration::ZERO;
        }
        state.countdown_started.map_or(Duration::ZERO, |started| {
            state.options.autocycle_interval.saturating_sub(started.elapsed())
        })
    }

    /// When the last cycle was dispatched.
    #[must_use]
    pub fn last_cycle(&self) -> Option<Instant> { self.state.lock().last_cycle }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Changes the autocycle interval, restarting the countdown when autocycling.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::InvalidInput` for intervals under the minimum, or
    /// `CycleError::Disposed`.
    pub fn set_autocycle_interval(&self, interval: Duration) -> CycleResult<()> {
        self.ensure_alive()?;
        validate_interval(interval)?;

        let mut state = self.state.lock();
        state.options.autocycle_interval = interval;
        if state.autocycling {
            self.timer.start(interval);
            state.countdown_started = Some(Instant::now());
        }
        Ok(())
    }

    /// Changes the share of the pool remembered as history.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::InvalidInput` outside 1 to 80 percent.
    pub fn set_history_size_percent(&self, percent: u8) -> CycleResult<()> {
        validate_history_percent(percent)?;
        self.state.lock().options.history_size_percent = percent;
        Ok(())
    }

    /// Switches the layout strategy. The new strategy starts without memory.
    pub fn set_change_type(&self, change_type: ChangeType) {
        let mut state = self.state.lock();
        if state.layout.change_type() != change_type {
            tracing::debug!(?change_type, "layout strategy changed");
            state.layout = LayoutStrategy::new(change_type);
        }
    }

    pub fn set_cycle_on_topology_change(&self, enabled: bool) {
        self.state.lock().options.cycle_on_topology_change = enabled;
    }

    pub fn set_arrangement(&self, arrangement: Arrangement) {
        self.state.lock().options.arrangement = arrangement;
    }

    /// Replaces the per-screen settings.
    ///
    /// A different screen count clears the history and the layout memory.
    pub fn set_screen_settings(&self, screens: ScreensSettings) {
        let mut state = self.state.lock();
        if state.screens.len() != screens.len() {
            state.history.clear();
            state.layout.reset();
        }
        state.screens = screens;
    }

    // ========================================================================
    // Autocycle
    // ========================================================================

    /// Starts cycling every `autocycle_interval`. No-op when already running.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::Disposed` if the cycler was disposed.
    pub fn start_autocycle(&self) -> CycleResult<()> {
        self.ensure_alive()?;
        let mut state = self.state.lock();
        if state.autocycling {
            return Ok(());
        }

        state.autocycling = true;
        state.countdown_started = Some(Instant::now());
        self.timer.start(state.options.autocycle_interval);
        tracing::info!(interval = ?state.options.autocycle_interval, "autocycle started");
        self.emit(CyclerEvent::AutocyclingChanged(true));
        Ok(())
    }

    /// Stops automatic cycling. No-op when not running.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::Disposed` if the cycler was disposed.
    pub fn stop_autocycle(&self) -> CycleResult<()> {
        self.ensure_alive()?;
        let mut state = self.state.lock();
        if !state.autocycling {
            return Ok(());
        }

        state.autocycling = false;
        state.countdown_started = None;
        self.timer.stop();
        tracing::info!("autocycle stopped");
        self.emit(CyclerEvent::AutocyclingChanged(false));
        Ok(())
    }

    /// Restarts the autocycle countdown without changing the interval.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::Disposed` if the cycler was disposed.
    pub fn reset_autocycle(&self) -> CycleResult<()> {
        self.ensure_alive()?;
        self.restart_countdown(&mut self.state.lock());
        Ok(())
    }

    fn restart_countdown(&self, state: &mut CyclerState) {
        if state.autocycling {
            self.timer.reset();
            state.countdown_started = Some(Instant::now());
        }
    }

    fn on_autocycle_tick(&self) {
        if self.is_disposed() || !self.is_autocycling() {
            return;
        }
        tracing::debug!("autocycle tick");
        self.cycle_unattended("timer");
    }

    // ========================================================================
    // Cycling
    // ========================================================================

    /// Picks new wallpapers at random and dispatches a build.
    ///
    /// Without `pool`, the registered provider is asked for one. Returns the
    /// picks once the build is dispatched; when every screen is static the
    /// selection is empty and no pool is requested.
    ///
    /// # Errors
    ///
    /// - `CycleError::ConcurrentBuildInProgress` if a build is in flight
    /// - `CycleError::InvalidInput` if no pool is available or it is empty
    /// - `CycleError::InsufficientCandidates` if the pool cannot satisfy the screens
    /// - `CycleError::Disposed` if the cycler was disposed
    pub fn cycle_next_randomly(&self, pool: Option<&[Wallpaper]>) -> CycleResult<Selection> {
        self.ensure_alive()?;
        let claim = self.services.slot.try_claim(self.id)?;

        {
            let mut state = self.state.lock();
            if state.screens.all_static() {
                return Ok(self.cycle_all_static(&mut state, claim));
            }
        }

        let requested;
        let pool = match pool {
            Some(pool) => pool,
            None => {
                requested = self.request_pool()?;
                requested.as_slice()
            }
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let required = state.layout.required_per_screen(&state.screens);
        let percent = state.options.history_size_percent;
        let selection =
            Selector::new(&mut state.rng, &state.screens, &mut state.history, percent).pick(pool, &required)?;

        let plan = compose(&mut state.layout, &selection, &state.screens)?;
        self.dispatch_build(claim, plan, &state.options);
        self.finish_cycle(state, selection.picked());

        Ok(selection)
    }

    /// Shows exactly the given wallpapers.
    ///
    /// The pool must be all multiscreen (the first one spans the desktop) or
    /// all singlescreen (assigned to screens in order, repeating the last one
    /// when too few are given).
    ///
    /// # Errors
    ///
    /// - `CycleError::InvalidInput` if `pool` is empty or mixes both kinds
    /// - `CycleError::ConcurrentBuildInProgress` if a build is in flight
    /// - `CycleError::Disposed` if the cycler was disposed
    pub fn cycle_next(&self, pool: &[Wallpaper]) -> CycleResult<Selection> {
        self.ensure_alive()?;
        let claim = self.services.slot.try_claim(self.id)?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.screens.all_static() {
            return Ok(self.cycle_all_static(state, claim));
        }

        let Some(first) = pool.first() else {
            return Err(CycleError::invalid("no wallpapers given"));
        };
        let multiscreen = first.is_multiscreen;
        if pool.iter().any(|w| w.is_multiscreen != multiscreen) {
            return Err(CycleError::invalid("multiscreen and singlescreen wallpapers cannot be mixed"));
        }

        let selection = if multiscreen {
            Selection {
                multiscreen,
                per_screen: vec![vec![first.clone()]],
            }
        } else {
            let required = state.layout.required_per_screen(&state.screens);
            let mut next = 0;
            let per_screen = required
                .iter()
                .map(|&count| {
                    (0..count)
                        .map(|_| {
                            let wallpaper = pool[next].clone();
                            if next + 1 < pool.len() {
                                next += 1;
                            }
                            wallpaper
                        })
                        .collect()
                })
                .collect();
            Selection { multiscreen, per_screen }
        };

        let plan = compose(&mut state.layout, &selection, &state.screens)?;
        let picked = selection.picked();
        state.history.extend(picked.iter().cloned());
        self.dispatch_build(claim, plan, &state.options);
        self.finish_cycle(state, picked);

        Ok(selection)
    }

    /// Returns whether a random cycle with `pool` (or the provider's pool)
    /// has enough usable wallpapers.
    #[must_use]
    pub fn check_pool_integrity(&self, pool: Option<&[Wallpaper]>) -> bool {
        let (required, screen_count) = {
            let state = self.state.lock();
            if state.screens.all_static() {
                return true;
            }
            (state.layout.required_per_screen(&state.screens), state.screens.len())
        };

        let requested;
        let pool = match pool {
            Some(pool) => pool,
            None => match self.request_pool() {
                Ok(pool) => {
                    requested = pool;
                    requested.as_slice()
                }
                Err(_) => return false,
            },
        };

        selector::check_pool_integrity(pool, &required, screen_count)
    }

    /// Handles a change of the screen geometry.
    ///
    /// Bounds are refreshed from the topology; a changed screen count clears
    /// history and layout memory. When configured, a random cycle follows and
    /// its failure goes to the autocycle failure channel.
    pub fn on_display_settings_changed(&self) {
        if self.is_disposed() {
            return;
        }

        let bounds = self.services.topology.screens();
        let cycle = {
            let mut state = self.state.lock();
            if state.screens.refresh_bounds(&bounds) {
                tracing::info!(screens = bounds.len(), "screen count changed");
                state.history.clear();
                state.layout.reset();
            }
            state.options.cycle_on_topology_change
        };

        if cycle {
            self.cycle_unattended("display change");
        }
    }

    /// Stops the timer and cancels a build dispatched by this cycler.
    ///
    /// Every later call fails with `CycleError::Disposed`.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.timer.shutdown();
        if self.services.slot.cancel_owned_by(self.id) {
            tracing::debug!("cancelled in-flight wallpaper build");
        }
        self.state.lock().autocycling = false;
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_alive(&self) -> CycleResult<()> {
        if self.is_disposed() {
            return Err(CycleError::Disposed);
        }
        Ok(())
    }

    fn request_pool(&self) -> CycleResult<Vec<Wallpaper>> {
        let Some(provider) = &self.services.provider else {
            return Err(CycleError::invalid("no wallpaper pool given and no provider registered"));
        };

        let pool = provider.request_wallpapers();
        if pool.is_empty() {
            return Err(CycleError::invalid("the wallpaper provider returned no wallpapers"));
        }
        Ok(pool)
    }

    fn cycle_unattended(&self, trigger: &'static str) {
        if let Err(err) = self.cycle_next_randomly(None) {
            tracing::warn!(trigger, error = %err, "unattended wallpaper cycle failed");
            let handling = self.autocycle_failures.raise(&CycleError::AutocycleFailure(Box::new(err)));
            // Reached only when the escalation hook returns.
            if handling == FailureHandling::Unhandled
                && self.is_autocycling()
                && self.stop_autocycle().is_ok()
            {
                tracing::warn!(trigger, "autocycle stopped after an unhandled failure");
            }
        }
    }

    fn cycle_all_static(&self, state: &mut CyclerState, claim: BuildClaim) -> Selection {
        tracing::debug!("every screen is static, applying static wallpapers");
        let plan = state.layout.compose_from_single(&Wallpaper::placeholder(), &state.screens);
        self.dispatch_build(claim, plan, &state.options);
        self.finish_cycle(state, Vec::new());

        Selection {
            multiscreen: false,
            per_screen: Vec::new(),
        }
    }

    fn finish_cycle(&self, state: &mut CyclerState, mut picked: Vec<Wallpaper>) {
        let screen_count = state.screens.len();
        if state.layout.change_type() == ChangeType::OneByOne
            && picked.len() == 1
            && state.active.len() >= screen_count
        {
            // Unchanged screens keep their wallpapers ahead of the new one.
            let kept = state.active.iter().take(screen_count).skip(1).cloned();
            picked = kept.chain(picked).collect();
        }

        state.active.clone_from(&picked);
        self.emit(CyclerEvent::ActiveWallpapersChanged(picked));

        self.restart_countdown(state);
        state.last_cycle = Some(Instant::now());
    }

    fn dispatch_build(&self, claim: BuildClaim, plan: CompositionPlan, options: &CyclerOptions) {
        let job = BuildJob {
            plan,
            output_path: options.output_path.clone(),
            arrangement: options.arrangement,
            scale_factor: BUILD_SCALE_FACTOR,
        };
        let composer = Arc::clone(&self.services.composer);
        let applier = Arc::clone(&self.services.applier);
        let events = self.events.clone();
        let failures = Arc::clone(&self.build_failures);

        tracing::debug!(wallpapers = job.plan.wallpapers().len(), "dispatching wallpaper build");

        self.runtime.spawn_blocking(move || {
            let result = run_build(&job, &claim, composer.as_ref(), applier.as_ref());
            drop(claim);

            match result {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "wallpaper applied");
                    let _ = events.send(CyclerEvent::BuildFinished(path));
                }
                Err(BuildError::Cancelled) => {
                    tracing::debug!("wallpaper build cancelled");
                    let _ = events.send(CyclerEvent::BuildFailed(BuildError::Cancelled.to_string()));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "wallpaper build failed");
                    let _ = events.send(CyclerEvent::BuildFailed(err.to_string()));
                    failures.raise(&CycleError::BuildFailure(err));
                }
            }
        });
    }

    fn emit(&self, event: CyclerEvent) {
        tracing::trace!(event = event.name(), "emitting cycler event");
        let _ = self.events.send(event);
    }
}

impl Drop for WallpaperCycler {
    fn drop(&mut self) { self.dispose(); }
}

impl std::fmt::Debug for WallpaperCycler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WallpaperCycler")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

fn compose(
    layout: &mut LayoutStrategy,
    selection: &Selection,
    screens: &ScreensSettings,
) -> CycleResult<CompositionPlan> {
    if selection.multiscreen {
        let Some(wallpaper) = selection.per_screen.first().and_then(|list| list.first()) else {
            return Err(CycleError::invalid("multiscreen selection is empty"));
        };
        return Ok(layout.compose_from_single(wallpaper, screens));
    }
    layout.compose_from_multiple(&selection.per_screen, screens)
}
