/// Ordered set of legal zoom multipliers and the active one.
///
/// The active zoom selects both the pre-scaled tileset and the cache
/// partition. Changing it never invalidates anything.
#[derive(Debug, Clone)]
pub struct ZoomController {
    levels: Vec<u32>,
    index: usize,
}

impl ZoomController {
    /// `levels` are sorted and deduplicated. If `initial` is not a legal
    /// level the nearest level above it (or the largest) is used.
    ///
    /// # Panics
    /// If `levels` contains no positive value.
    pub fn new(levels: &[u32], initial: u32) -> Self {
        let mut levels: Vec<u32> = levels.iter().copied().filter(|z| *z > 0).collect();
        levels.sort_unstable();
        levels.dedup();
        assert!(!levels.is_empty(), "zoom controller needs at least one level");
        let index = levels
            .iter()
            .position(|z| *z >= initial)
            .unwrap_or(levels.len() - 1);
        Self { levels, index }
    }

    pub fn current(&self) -> u32 {
        self.levels[self.index]
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn min(&self) -> u32 {
        self.levels[0]
    }

    pub fn max(&self) -> u32 {
        self.levels[self.levels.len() - 1]
    }

    /// Step to the next larger level. Returns false when already at the top.
    pub fn increment(&mut self) -> bool {
        if self.index + 1 < self.levels.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Step to the next smaller level. Returns false when already at the bottom.
    pub fn decrement(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `level` if it is legal.
    pub fn set(&mut self, level: u32) -> bool {
        match self.levels.iter().position(|z| *z == level) {
            Some(i) => {
                self.index = i;
                true
            }
            None => false,
        }
    }
}
