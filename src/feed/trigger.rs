/// Scroll geometry reported by the rendering layer, in its own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    /// Distance scrolled from the top of the content.
    pub offset: f64,
    /// Visible height of the scroll container.
    pub viewport: f64,
    /// Total height of the content.
    pub content: f64,
}

impl ScrollPosition {
    pub fn new(offset: f64, viewport: f64, content: f64) -> Self {
        Self {
            offset,
            viewport,
            content,
        }
    }

    /// Content left below the bottom edge of the viewport.
    pub fn remaining(&self) -> f64 {
        self.content - self.offset - self.viewport
    }
}

/// Fires a fetch-more request when the viewport nears the end of the content.
///
/// There is no throttling here: every qualifying event fires, and the
/// pagination controller ignores requests while loading or exhausted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTrigger {
    threshold: f64,
}

impl ScrollTrigger {
    /// Proximity used by the explore feed.
    pub const EXPLORE_THRESHOLD: f64 = 150.0;
    /// Proximity used by the community feed.
    pub const COMMUNITY_THRESHOLD: f64 = 100.0;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True when less than `threshold` of content remains below the viewport.
    ///
    /// Non-finite geometry never fires.
    pub fn should_fire(&self, position: ScrollPosition) -> bool {
        let remaining = position.remaining();
        remaining.is_finite() && remaining < self.threshold
    }
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new(Self::EXPLORE_THRESHOLD)
    }
}
