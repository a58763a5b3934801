// src/render/palette.rs

use rand::{Rng, seq::SliceRandom};

/// Card background colors.
pub const DEFAULT_POOL: [&str; 7] = [
    "#E74C3C", "#3498DB", "#2ECC71", "#9B59B6", "#F39C12", "#1ABC9C", "#34495E",
];

/// Hands out background colors for package cards.
///
/// The pool is shuffled once; colors are then handed out in order and the
/// cursor wraps, so no color repeats before the whole pool has been used.
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    colors: Vec<String>,
    cursor: usize,
}

impl ColorAllocator {
    pub fn new<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> Self {
        let mut colors: Vec<String> = pool.iter().map(|c| c.to_string()).collect();
        colors.shuffle(rng);
        Self { colors, cursor: 0 }
    }

    pub fn with_default_pool() -> Self {
        Self::new(&DEFAULT_POOL, &mut rand::thread_rng())
    }

    /// Returns the next color, or `None` for an empty pool.
    pub fn next_color(&mut self) -> Option<&str> {
        if self.colors.is_empty() {
            return None;
        }
        if self.cursor >= self.colors.len() {
            self.cursor = 0;
        }
        let color = &self.colors[self.cursor];
        self.cursor += 1;
        Some(color)
    }
}
