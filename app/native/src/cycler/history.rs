//! Bounded FIFO of recently applied wallpapers.
//!
//! The selector uses the history to avoid repeating wallpapers until a good
//! part of the pool has been shown. Its capacity is resized on every cycle
//! from the live pool size, and shrinking it evicts the oldest entries.

use std::collections::VecDeque;

use super::wallpaper::Wallpaper;

/// Recently applied wallpapers, oldest first.
#[derive(Debug, Clone)]
pub struct CycleHistory {
    entries: VecDeque<Wallpaper>,
    maximum_size: usize,
}

impl CycleHistory {
    /// Creates an empty history holding at most `maximum_size` entries (at least 1).
    #[must_use]
    pub fn new(maximum_size: usize) -> Self {
        let maximum_size = maximum_size.max(1);
        Self {
            entries: VecDeque::with_capacity(maximum_size),
            maximum_size,
        }
    }

    #[must_use]
    pub const fn maximum_size(&self) -> usize { self.maximum_size }

    /// Changes the capacity, evicting the oldest entries when it shrinks.
    pub fn set_maximum_size(&mut self, maximum_size: usize) {
        self.maximum_size = maximum_size.max(1);
        while self.entries.len() > self.maximum_size {
            self.entries.pop_front();
        }
    }

    /// Appends a wallpaper, evicting the oldest entry when at capacity.
    pub fn push(&mut self, wallpaper: Wallpaper) {
        if self.entries.len() >= self.maximum_size {
            self.entries.pop_front();
        }
        self.entries.push_back(wallpaper);
    }

    pub fn extend<I: IntoIterator<Item = Wallpaper>>(&mut self, wallpapers: I) {
        for wallpaper in wallpapers {
            self.push(wallpaper);
        }
    }

    #[must_use]
    pub fn contains(&self, wallpaper: &Wallpaper) -> bool { self.entries.contains(wallpaper) }

    /// Number of entries whose multiscreen flag equals `multiscreen`.
    #[must_use]
    pub fn count_matching(&self, multiscreen: bool) -> usize {
        self.entries.iter().filter(|w| w.is_multiscreen == multiscreen).count()
    }

    pub fn clear(&mut self) { self.entries.clear(); }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Wallpaper> { self.entries.iter() }
}

impl Default for CycleHistory {
    fn default() -> Self { Self::new(crate::constants::HISTORY_MIN_SIZE) }
}
