//! Weighted-random wallpaper selection.
//!
//! Given a candidate pool, the per-screen requirements of the layout strategy,
//! the screen settings and the cycle history, the selector produces a concrete
//! per-screen assignment:
//!
//! 1. Unusable wallpapers (deactivated or priority 0) are dropped and the rest
//!    is shuffled while priority statistics are gathered.
//! 2. Multiscreen or singlescreen mode is chosen, weighted by summed priority.
//! 3. The pool is narrowed to the chosen mode and sorted by ascending priority.
//! 4. The history capacity is resized from the pool size.
//! 5. History exclusion is enabled only if the pool is big enough for it.
//! 6. Wallpapers are picked with a random priority threshold per pass.
//! 7. The picks are recorded in the history.
//!
//! The selector never blocks or suspends.

use rand::Rng;
use smallvec::SmallVec;

use super::error::{CycleError, CycleResult, ShortfallStage};
use super::history::CycleHistory;
use super::screens::ScreensSettings;
use super::wallpaper::Wallpaper;
use crate::constants::HISTORY_MIN_SIZE;

/// Result of a pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Whether a single multiscreen wallpaper was picked.
    pub multiscreen: bool,
    /// One list for multiscreen picks, one list per screen otherwise.
    pub per_screen: Vec<Vec<Wallpaper>>,
}

impl Selection {
    /// Every picked wallpaper, in screen order.
    #[must_use]
    pub fn picked(&self) -> Vec<Wallpaper> { self.per_screen.iter().flatten().cloned().collect() }

    #[must_use]
    pub fn picked_count(&self) -> usize { self.per_screen.iter().map(Vec::len).sum() }
}

/// Priority statistics of the usable part of a pool.
#[derive(Debug, Default)]
struct PoolStats {
    multi_max: u8,
    multi_sum: u64,
    single_max: u8,
    single_sum: u64,
    eligible_per_screen: SmallVec<[usize; 4]>,
}

impl PoolStats {
    fn record(&mut self, wallpaper: &Wallpaper) {
        let priority = wallpaper.priority;
        if wallpaper.is_multiscreen {
            self.multi_max = self.multi_max.max(priority);
            self.multi_sum += u64::from(priority);
        } else {
            self.single_max = self.single_max.max(priority);
            self.single_sum += u64::from(priority);
            for (screen, eligible) in self.eligible_per_screen.iter_mut().enumerate() {
                if wallpaper.allows_screen(screen) {
                    *eligible += 1;
                }
            }
        }
    }
}

/// Weighted-random picker bound to the state of one cycler.
pub struct Selector<'a, R: Rng> {
    rng: &'a mut R,
    screens: &'a ScreensSettings,
    history: &'a mut CycleHistory,
    history_percent: u8,
}

impl<'a, R: Rng> Selector<'a, R> {
    pub fn new(
        rng: &'a mut R,
        screens: &'a ScreensSettings,
        history: &'a mut CycleHistory,
        history_percent: u8,
    ) -> Self {
        Self { rng, screens, history, history_percent }
    }

    /// Picks wallpapers from `pool` to satisfy `required` (one entry per screen).
    ///
    /// # Errors
    ///
    /// Returns `CycleError::InvalidInput` if the pool is empty and
    /// `CycleError::InsufficientCandidates` if it cannot satisfy the requirements.
    pub fn pick(&mut self, pool: &[Wallpaper], required: &[usize]) -> CycleResult<Selection> {
        if pool.is_empty() {
            return Err(CycleError::invalid("the wallpaper pool is empty"));
        }

        let (shuffled, stats) = self.filter_and_shuffle(pool);
        if shuffled.is_empty() {
            return Err(CycleError::shortfall(ShortfallStage::NoUsableWallpapers));
        }

        let required_total: usize = required.iter().sum();
        let multiscreen = self.decide_mode(&stats, required_total);

        let mut candidates: Vec<&Wallpaper> =
            shuffled.into_iter().filter(|w| w.is_multiscreen == multiscreen).collect();
        candidates.sort_by_key(|w| w.priority);
        check_mode_pool(&candidates, multiscreen, &stats, required)?;

        let history_size = (candidates.len() * usize::from(self.history_percent) / 100).max(HISTORY_MIN_SIZE);
        self.history.set_maximum_size(history_size);

        let (max_priority, required_picks) = if multiscreen {
            (stats.multi_max, 1)
        } else {
            (stats.single_max, required_total)
        };

        let in_history = self.history.count_matching(multiscreen);
        let exclude_history = candidates.len() >= in_history + required_picks;

        tracing::debug!(
            multiscreen,
            candidates = candidates.len(),
            required = required_picks,
            history_size,
            exclude_history,
            "picking wallpapers"
        );

        let per_screen = self.pick_loop(
            candidates,
            multiscreen,
            required,
            required_picks,
            max_priority,
            exclude_history,
        )?;

        if !exclude_history {
            self.history.clear();
        }
        self.history.extend(per_screen.iter().flatten().cloned());

        Ok(Selection { multiscreen, per_screen })
    }

    fn filter_and_shuffle<'p>(&mut self, pool: &'p [Wallpaper]) -> (Vec<&'p Wallpaper>, PoolStats) {
        let mut stats = PoolStats {
            eligible_per_screen: SmallVec::from_elem(0, self.screens.len()),
            ..PoolStats::default()
        };
        let mut shuffled = Vec::with_capacity(pool.len());

        for wallpaper in pool.iter().filter(|w| w.is_usable()) {
            stats.record(wallpaper);
            let position = self.rng.random_range(0..=shuffled.len());
            shuffled.insert(position, wallpaper);
        }

        (shuffled, stats)
    }

    fn decide_mode(&mut self, stats: &PoolStats, required_total: usize) -> bool {
        if stats.multi_sum == 0 || stats.single_sum == 0 {
            return stats.multi_sum != 0;
        }

        let divisor = u64::try_from(required_total.max(1)).unwrap_or(u64::MAX);
        let single_sum = stats.single_sum / divisor;
        let draw = self.rng.random_range(1..=stats.multi_sum + single_sum);

        if self.rng.random_bool(0.5) {
            draw < stats.multi_sum
        } else {
            draw >= single_sum
        }
    }

    fn pick_loop(
        &mut self,
        mut candidates: Vec<&Wallpaper>,
        multiscreen: bool,
        required: &[usize],
        required_picks: usize,
        max_priority: u8,
        exclude_history: bool,
    ) -> CycleResult<Vec<Vec<Wallpaper>>> {
        let slots = if multiscreen { 1 } else { self.screens.len() };
        let mut per_screen: Vec<Vec<Wallpaper>> = vec![Vec::new(); slots];
        let mut picked = 0;

        while picked < required_picks {
            if candidates.is_empty() {
                return Err(CycleError::shortfall(ShortfallStage::PoolExhausted {
                    picked,
                    required: required_picks,
                }));
            }

            let threshold = self.rng.random_range(1..=max_priority.max(1));
            let mut index = 0;

            while index < candidates.len() {
                let wallpaper = candidates[index];

                if !(exclude_history && self.history.contains(wallpaper)) {
                    if wallpaper.priority < threshold {
                        index += 1;
                        continue;
                    }

                    if wallpaper.conditions_hold() && place(wallpaper, multiscreen, required, &mut per_screen) {
                        picked += 1;
                        if picked >= required_picks {
                            break;
                        }
                    }
                }

                candidates.remove(index);
            }
        }

        Ok(per_screen)
    }
}

/// Fills the first open slot that accepts `wallpaper`.
fn place(
    wallpaper: &Wallpaper,
    multiscreen: bool,
    required: &[usize],
    per_screen: &mut [Vec<Wallpaper>],
) -> bool {
    if multiscreen {
        per_screen[0].push(wallpaper.clone());
        return true;
    }

    let open = per_screen.iter().zip(required).enumerate().position(|(screen, (picked, &needed))| {
        wallpaper.allows_screen(screen) && picked.len() < needed
    });

    open.is_some_and(|screen| {
        per_screen[screen].push(wallpaper.clone());
        true
    })
}

fn check_mode_pool(
    candidates: &[&Wallpaper],
    multiscreen: bool,
    stats: &PoolStats,
    required: &[usize],
) -> CycleResult<()> {
    if candidates.is_empty() {
        return Err(CycleError::shortfall(ShortfallStage::NoWallpapersForMode));
    }
    if multiscreen {
        return Ok(());
    }

    let required_total: usize = required.iter().sum();
    if candidates.len() < required_total {
        return Err(CycleError::shortfall(ShortfallStage::TooFewForMode {
            available: candidates.len(),
            required: required_total,
        }));
    }

    for (screen, (&available, &needed)) in stats.eligible_per_screen.iter().zip(required).enumerate() {
        if available < needed {
            return Err(CycleError::shortfall(ShortfallStage::ScreenShortfall {
                screen,
                available,
                required: needed,
            }));
        }
    }

    Ok(())
}

/// Checks whether `pool` can satisfy `required` without picking anything.
///
/// Applies the same filtering and mode rules as [`Selector::pick`], using
/// each wallpaper's conditions as they hold right now. Every mode the random
/// decision could choose must be satisfiable. Returns `true` when no screen
/// requires a new wallpaper.
///
/// `false` means a pick fails. `true` does not guarantee a pick succeeds:
/// the pick loop places each wallpaper on the first open screen it allows,
/// so `disabled_screens` can strand a screen even when every per-screen count
/// is met.
#[must_use]
pub fn check_pool_integrity(pool: &[Wallpaper], required: &[usize], screen_count: usize) -> bool {
    let required_total: usize = required.iter().sum();
    if required_total == 0 {
        return true;
    }
    if pool.is_empty() {
        return false;
    }

    let mut stats = PoolStats {
        eligible_per_screen: SmallVec::from_elem(0, screen_count),
        ..PoolStats::default()
    };
    let mut ready = PoolStats {
        eligible_per_screen: SmallVec::from_elem(0, screen_count),
        ..PoolStats::default()
    };
    let mut ready_multi = 0usize;
    let mut ready_single = 0usize;

    for wallpaper in pool.iter().filter(|w| w.is_usable()) {
        stats.record(wallpaper);
        if wallpaper.conditions_hold() {
            ready.record(wallpaper);
            if wallpaper.is_multiscreen {
                ready_multi += 1;
            } else {
                ready_single += 1;
            }
        }
    }

    if stats.multi_sum == 0 && stats.single_sum == 0 {
        return false;
    }

    let multi_ok = stats.multi_sum == 0 || ready_multi > 0;
    let single_ok = stats.single_sum == 0
        || (ready_single >= required_total
            && ready.eligible_per_screen.iter().zip(required).all(|(&available, &needed)| available >= needed));

    multi_ok && single_ok
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::cycler::conditions::CycleConditions;
    use crate::cycler::screens::ScreenBounds;

    fn screens(count: usize) -> ScreensSettings {
        ScreensSettings::all_random(&vec![ScreenBounds::new(0, 0, 1920, 1080); count])
    }

    fn pool(count: usize, priority: u8) -> Vec<Wallpaper> {
        (0..count).map(|i| Wallpaper::new(format!("{i}.jpg")).with_priority(priority)).collect()
    }

    fn never() -> CycleConditions {
        CycleConditions {
            requires_path: Some("/nonexistent/wallcycle/never".into()),
            ..Default::default()
        }
    }

    fn pick_with(
        seed: u64,
        pool: &[Wallpaper],
        required: &[usize],
        settings: &ScreensSettings,
        history: &mut CycleHistory,
    ) -> CycleResult<Selection> {
        let mut rng = StdRng::seed_from_u64(seed);
        Selector::new(&mut rng, settings, history, 80).pick(pool, required)
    }

    #[test]
    fn test_two_screens_one_pick_each() {
        let settings = screens(2);
        let pool = pool(5, 10);
        let mut history = CycleHistory::default();

        let selection = pick_with(7, &pool, &[1, 1], &settings, &mut history).unwrap();

        assert!(!selection.multiscreen);
        assert_eq!(selection.per_screen.len(), 2);
        assert!(selection.per_screen.iter().all(|list| list.len() == 1));
        let picked = selection.picked();
        assert_ne!(picked[0], picked[1]);
        assert!(picked.iter().all(|w| pool.contains(w)));
    }

    #[test]
    fn test_empty_pool_is_invalid_input() {
        let settings = screens(1);
        let mut history = CycleHistory::default();
        let result = pick_with(1, &[], &[1], &settings, &mut history);
        assert!(matches!(result, Err(CycleError::InvalidInput(_))));
    }

    #[test]
    fn test_priority_zero_pool_fails_first_stage() {
        let settings = screens(1);
        let mut history = CycleHistory::default();
        let result = pick_with(1, &pool(4, 0), &[1], &settings, &mut history);
        let stage = result.unwrap_err().shortfall_stage();
        assert_eq!(stage, Some(ShortfallStage::NoUsableWallpapers));
        assert_eq!(stage.map(|s| s.stage()), Some(1));
    }

    #[test]
    fn test_unusable_wallpapers_never_picked() {
        let settings = screens(2);
        let mut candidates = pool(3, 50);
        let zero = Wallpaper::new("zero.jpg").with_priority(0);
        let off = Wallpaper::new("off.jpg").with_activated(false);
        candidates.push(zero.clone());
        candidates.push(off.clone());

        for seed in 0..50 {
            let mut history = CycleHistory::default();
            let picked = pick_with(seed, &candidates, &[1, 1], &settings, &mut history)
                .unwrap()
                .picked();
            assert!(!picked.contains(&zero));
            assert!(!picked.contains(&off));
        }
    }

    #[test]
    fn test_modes_are_never_mixed() {
        let settings = screens(2);
        let mut candidates = pool(4, 30);
        candidates.extend((0..3).map(|i| Wallpaper::new(format!("wide{i}.jpg")).with_multiscreen(true)));

        let mut saw_multi = false;
        let mut saw_single = false;
        for seed in 0..100 {
            let mut history = CycleHistory::default();
            let selection = pick_with(seed, &candidates, &[1, 1], &settings, &mut history).unwrap();
            let picked = selection.picked();
            assert!(picked.iter().all(|w| w.is_multiscreen == selection.multiscreen));
            if selection.multiscreen {
                assert_eq!(selection.per_screen.len(), 1);
                assert_eq!(picked.len(), 1);
                saw_multi = true;
            } else {
                assert_eq!(picked.len(), 2);
                saw_single = true;
            }
        }
        assert!(saw_multi && saw_single);
    }

    #[test]
    fn test_single_group_decides_mode() {
        let settings = screens(2);
        let wide: Vec<_> = (0..2).map(|i| Wallpaper::new(format!("{i}.jpg")).with_multiscreen(true)).collect();
        let mut history = CycleHistory::default();

        let selection = pick_with(3, &wide, &[1, 1], &settings, &mut history).unwrap();
        assert!(selection.multiscreen);
    }

    #[test]
    fn test_singlescreen_pool_too_small() {
        let settings = screens(3);
        let mut history = CycleHistory::default();
        let err = pick_with(1, &pool(2, 10), &[1, 1, 1], &settings, &mut history).unwrap_err();
        assert_eq!(
            err.shortfall_stage(),
            Some(ShortfallStage::TooFewForMode { available: 2, required: 3 })
        );
    }

    #[test]
    fn test_per_screen_shortfall() {
        let settings = screens(2);
        let candidates: Vec<_> = (0..4)
            .map(|i| Wallpaper::new(format!("{i}.jpg")).with_disabled_screens([1]))
            .collect();
        let mut history = CycleHistory::default();

        let err = pick_with(1, &candidates, &[1, 1], &settings, &mut history).unwrap_err();
        assert_eq!(
            err.shortfall_stage(),
            Some(ShortfallStage::ScreenShortfall { screen: 1, available: 0, required: 1 })
        );
    }

    #[test]
    fn test_disabled_screens_respected() {
        let settings = screens(2);
        let left_only = Wallpaper::new("left.jpg").with_disabled_screens([1]);
        let right_only = Wallpaper::new("right.jpg").with_disabled_screens([0]);

        for seed in 0..30 {
            let mut history = CycleHistory::default();
            let selection = pick_with(
                seed,
                &[left_only.clone(), right_only.clone()],
                &[1, 1],
                &settings,
                &mut history,
            )
            .unwrap();
            assert_eq!(selection.per_screen[0], vec![left_only.clone()]);
            assert_eq!(selection.per_screen[1], vec![right_only.clone()]);
        }
    }

    #[test]
    fn test_conditions_failing_everywhere_exhausts_pool() {
        let settings = screens(1);
        let candidates: Vec<_> = (0..3).map(|i| Wallpaper::new(format!("{i}.jpg")).with_conditions(never())).collect();
        let mut history = CycleHistory::default();

        let err = pick_with(5, &candidates, &[1], &settings, &mut history).unwrap_err();
        assert_eq!(
            err.shortfall_stage(),
            Some(ShortfallStage::PoolExhausted { picked: 0, required: 1 })
        );
    }

    #[test]
    fn test_history_excludes_recent_wallpapers() {
        let settings = screens(1);
        let candidates = pool(10, 10);
        let mut history = CycleHistory::default();
        let mut rng = StdRng::seed_from_u64(11);

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let selection = Selector::new(&mut rng, &settings, &mut history, 50).pick(&candidates, &[1]).unwrap();
            let picked = selection.picked()[0].id;
            assert!(seen.insert(picked), "wallpaper repeated while history was active");
        }
        assert_eq!(history.maximum_size(), 5);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_small_pool_bypasses_history_and_clears_it() {
        let settings = screens(1);
        let candidates = pool(1, 10);
        let mut history = CycleHistory::default();
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..3 {
            let selection = Selector::new(&mut rng, &settings, &mut history, 80).pick(&candidates, &[1]).unwrap();
            assert_eq!(selection.picked(), candidates);
            assert_eq!(history.len(), 1);
        }
    }

    #[test]
    fn test_history_size_has_a_floor() {
        let settings = screens(1);
        let mut history = CycleHistory::new(50);
        pick_with(1, &pool(2, 10), &[1], &settings, &mut history).unwrap();
        assert_eq!(history.maximum_size(), HISTORY_MIN_SIZE);
    }

    #[test]
    fn test_integrity_matches_shortfalls() {
        assert!(check_pool_integrity(&pool(5, 10), &[1, 1], 2));
        assert!(!check_pool_integrity(&pool(5, 0), &[1, 1], 2));
        assert!(!check_pool_integrity(&pool(1, 10), &[1, 1], 2));
        assert!(!check_pool_integrity(&[], &[1], 1));
        assert!(check_pool_integrity(&[], &[0, 0], 2));

        let blocked: Vec<_> = (0..3).map(|i| Wallpaper::new(format!("{i}.jpg")).with_disabled_screens([0])).collect();
        assert!(!check_pool_integrity(&blocked, &[1, 0], 2));
        assert!(check_pool_integrity(&blocked, &[0, 1], 2));
    }

    #[test]
    fn test_integrity_requires_every_possible_mode() {
        let mut mixed = pool(1, 10);
        mixed.push(Wallpaper::new("wide.jpg").with_multiscreen(true));
        // A singlescreen pick could be chosen but cannot fill two screens.
        assert!(!check_pool_integrity(&mixed, &[1, 1], 2));

        let wide = vec![Wallpaper::new("wide.jpg").with_multiscreen(true)];
        assert!(check_pool_integrity(&wide, &[1, 1], 2));

        let gated = vec![Wallpaper::new("wide.jpg").with_multiscreen(true).with_conditions(never())];
        assert!(!check_pool_integrity(&gated, &[1, 1], 2));
    }

    #[test]
    fn test_integrity_false_implies_pick_fails() {
        let settings = screens(2);
        let candidates = pool(1, 10);
        assert!(!check_pool_integrity(&candidates, &[1, 1], 2));
        for seed in 0..20 {
            let mut history = CycleHistory::default();
            let result = pick_with(seed, &candidates, &[1, 1], &settings, &mut history);
            assert!(matches!(result, Err(CycleError::InsufficientCandidates { .. })));
        }
    }

    #[test]
    fn test_integrity_passes_but_disabled_screens_can_strand_a_pick() {
        let settings = screens(2);
        let both = Wallpaper::new("both.jpg").with_priority(10);
        let left = Wallpaper::new("left.jpg").with_priority(10).with_disabled_screens([1]);
        let candidates = vec![both, left];
        assert!(check_pool_integrity(&candidates, &[1, 1], 2));

        let mut successes = 0;
        let mut exhausted = 0;
        for seed in 0..40 {
            let mut history = CycleHistory::default();
            match pick_with(seed, &candidates, &[1, 1], &settings, &mut history) {
                Ok(selection) => {
                    assert_eq!(selection.per_screen[0][0].path, PathBuf::from("left.jpg"));
                    successes += 1;
                }
                Err(err) => {
                    assert!(matches!(
                        err.shortfall_stage(),
                        Some(ShortfallStage::PoolExhausted { picked: 1, required: 2 })
                    ));
                    exhausted += 1;
                }
            }
        }

        // Order after the shuffle decides: "both" taking screen 0 strands screen 1.
        assert!(successes > 0);
        assert!(exhausted > 0);
    }
}
