//! Vertical page layout for continuous scrolling
//!
//! Pages are stacked top to bottom with a fixed gap. The layout answers two
//! questions: where a page starts (for scroll-into-view), and which page is
//! closest to the middle of the viewport (for scroll-driven page tracking).

/// Stacked page geometry plus the scroll container
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageLayout {
    /// Page heights in pixels, index 0 = page 1
    heights: Vec<f32>,
    gap: f32,
    container_width: f32,
    container_height: f32,
    scroll_top: f32,
}

impl PageLayout {
    #[must_use]
    pub fn new(gap: f32) -> Self {
        Self {
            gap,
            ..Self::default()
        }
    }

    pub fn set_page_heights(&mut self, heights: Vec<f32>) {
        self.heights = heights;
    }

    pub fn set_page_height(&mut self, page: usize, height: f32) {
        if let Some(slot) = page.checked_sub(1).and_then(|i| self.heights.get_mut(i)) {
            *slot = height;
        }
    }

    pub fn clear(&mut self) {
        self.heights.clear();
        self.scroll_top = 0.0;
    }

    pub fn set_container(&mut self, width: f32, height: f32) {
        self.container_width = width.max(0.0);
        self.container_height = height.max(0.0);
    }

    #[must_use]
    pub fn container(&self) -> (f32, f32) {
        (self.container_width, self.container_height)
    }

    #[must_use]
    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    pub fn set_scroll_top(&mut self, scroll_top: f32) {
        self.scroll_top = if scroll_top.is_finite() {
            scroll_top.max(0.0)
        } else {
            0.0
        };
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.heights.len()
    }

    /// Offset of the top edge of a page (1-based)
    #[must_use]
    pub fn page_top(&self, page: usize) -> f32 {
        let before = page.saturating_sub(1).min(self.heights.len());
        self.heights[..before].iter().map(|h| h + self.gap).sum()
    }

    /// Scroll so that `page` starts at the top of the viewport
    pub fn scroll_to_page(&mut self, page: usize) {
        self.scroll_top = self.page_top(page);
    }

    /// Page (1-based) whose vertical centre is closest to the viewport centre.
    /// Ties resolve to the earlier page. `None` when there are no pages.
    #[must_use]
    pub fn page_at_viewport_center(&self) -> Option<usize> {
        let viewport_center = self.scroll_top + self.container_height / 2.0;

        let mut best: Option<(usize, f32)> = None;
        let mut top = 0.0;
        for (index, height) in self.heights.iter().enumerate() {
            let distance = (top + height / 2.0 - viewport_center).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((index + 1, distance)),
            }
            top += height + self.gap;
        }

        best.map(|(page, _)| page)
    }
}
