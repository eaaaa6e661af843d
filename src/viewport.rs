use std::ops::Range;

/// A window of `height` rows over a sequence of `total` rows.
///
/// `offset` always stays in `0..=total.saturating_sub(height)`; every mutation
/// re-clamps it, including resizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    offset: usize,
    height: usize,
    total: usize,
}

impl Viewport {
    pub fn new(height: usize, total: usize) -> Self {
        Self {
            offset: 0,
            height,
            total,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.height)
    }

    /// Returns whether the offset changed; the same holds for the other
    /// scrolling methods.
    pub fn scroll_by(&mut self, delta: isize) -> bool {
        let next = self.offset.saturating_add_signed(delta).min(self.max_offset());
        let changed = next != self.offset;
        self.offset = next;
        changed
    }

    pub fn scroll_to(&mut self, offset: usize) -> bool {
        let next = offset.min(self.max_offset());
        let changed = next != self.offset;
        self.offset = next;
        changed
    }

    /// Scroll just far enough that row `index` is inside the window.
    pub fn reveal(&mut self, index: usize) -> bool {
        if index < self.offset {
            self.scroll_to(index)
        } else if index >= self.offset.saturating_add(self.height) {
            self.scroll_to((index + 1).saturating_sub(self.height))
        } else {
            false
        }
    }

    pub fn scroll_to_top(&mut self) -> bool {
        self.scroll_to(0)
    }

    pub fn scroll_to_bottom(&mut self) -> bool {
        self.scroll_to(self.max_offset())
    }

    pub fn page_down(&mut self) -> bool {
        self.scroll_by(self.page_step())
    }

    pub fn page_up(&mut self) -> bool {
        self.scroll_by(-self.page_step())
    }

    fn page_step(&self) -> isize {
        isize::try_from(self.height.max(1)).unwrap_or(isize::MAX)
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn visible_range(&self) -> Range<usize> {
        let start = self.offset.min(self.total);
        let end = self.offset.saturating_add(self.height).min(self.total);
        start..end
    }

    /// Bounded by `lines.len()` too, so a stale viewport over a shorter
    /// sequence yields a shorter slice.
    pub fn visible_slice<'a, T>(&self, lines: &'a [T]) -> &'a [T] {
        let start = self.offset.min(lines.len());
        let end = self.offset.saturating_add(self.height).min(lines.len());
        &lines[start..end]
    }

    pub fn near_bottom(&self, threshold: usize) -> bool {
        self.offset.saturating_add(self.height) >= self.total.saturating_sub(threshold)
    }

    pub fn can_scroll(&self) -> bool {
        self.total > self.height
    }

    /// `1.0` when there is nothing to scroll.
    pub fn scroll_percent(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 {
            return 1.0;
        }
        self.offset as f64 / max as f64
    }
}
