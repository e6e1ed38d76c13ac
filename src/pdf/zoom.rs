//! Zoom factor bounds and fit computations
//!
//! All viewer scale changes funnel through [`Zoom::clamp_factor`], so the
//! stored scale is always within `[MIN_SCALE, MAX_SCALE]`.

use super::types::{PageBox, Rotation};
use super::viewport::Viewport;

/// Fit mode requested by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitMode {
    Width,
    Page,
}

/// Zoom policy for the viewer
#[derive(Clone, Copy, Debug)]
pub struct Zoom {
    /// Increment applied by zoom in / zoom out
    pub step: f32,
    /// Padding subtracted from the container before fitting
    pub container_padding: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            step: Self::DEFAULT_STEP,
            container_padding: Self::DEFAULT_PADDING,
        }
    }
}

impl Zoom {
    /// Minimum allowed zoom factor
    pub const MIN_SCALE: f32 = 0.25;
    /// Maximum allowed zoom factor
    pub const MAX_SCALE: f32 = 4.0;
    pub const DEFAULT_STEP: f32 = 0.25;
    pub const DEFAULT_PADDING: f32 = 40.0;

    /// Clamp factor to valid range. NaN falls back to 1.0, infinities
    /// saturate at the nearest bound.
    #[must_use]
    pub fn clamp_factor(factor: f32) -> f32 {
        if factor.is_nan() {
            1.0
        } else {
            factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        }
    }

    /// Narrow a host-supplied `f64` factor, clamping before the cast so
    /// out-of-range requests land on a bound.
    #[must_use]
    pub fn clamp_wide(factor: f64) -> f32 {
        if factor.is_nan() {
            1.0
        } else {
            factor.clamp(f64::from(Self::MIN_SCALE), f64::from(Self::MAX_SCALE)) as f32
        }
    }

    #[must_use]
    pub fn step_in(&self, factor: f32) -> f32 {
        Self::clamp_factor(factor + self.step)
    }

    #[must_use]
    pub fn step_out(&self, factor: f32) -> f32 {
        Self::clamp_factor(factor - self.step)
    }

    /// Scale that fits the first page into the container.
    ///
    /// Uses the page's unscaled viewport at the current rotation. Returns
    /// `None` when the page has no area. The result is not clamped; the
    /// caller routes it through `set_zoom`.
    #[must_use]
    pub fn fit(
        &self,
        mode: FitMode,
        first_page: PageBox,
        rotation: Rotation,
        container: (f32, f32),
    ) -> Option<f32> {
        let unscaled = Viewport::new(first_page, 1.0, rotation);
        if unscaled.width <= 0.0 || unscaled.height <= 0.0 {
            return None;
        }

        let available_width = container.0 - self.container_padding;
        let available_height = container.1 - self.container_padding;
        let scale_width = available_width / unscaled.width;

        match mode {
            FitMode::Width => Some(scale_width),
            FitMode::Page => Some(scale_width.min(available_height / unscaled.height)),
        }
    }
}
