//! State-machine value types owned by the item controller.

use crate::content::SharedImage;
use crate::geometry::Size;

const SCALE_EPSILON: f64 = 1e-9;

/// Content acquisition state for one item.
///
/// `Idle -> Loading -> Loaded | Failed`; `Failed -> Loading` on retry;
/// `release` returns any state to `Idle`.
#[derive(Clone, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded(SharedImage),
    Failed,
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed)
    }

    pub fn content(&self) -> Option<&SharedImage> {
        match self {
            LoadState::Loaded(content) => Some(content),
            _ => None,
        }
    }

    /// Entry guard for `request_load`: nothing displayed and nothing in
    /// flight.
    pub fn can_start_load(&self) -> bool {
        matches!(self, LoadState::Idle | LoadState::Failed)
    }
}

impl std::fmt::Debug for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Idle => write!(f, "Idle"),
            LoadState::Loading => write!(f, "Loading"),
            LoadState::Loaded(c) => write!(f, "Loaded({}x{})", c.width(), c.height()),
            LoadState::Failed => write!(f, "Failed"),
        }
    }
}

/// Zoom bookkeeping. `min_scale <= scale <= max_scale` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    pub content_size: Size,
    pub viewport_size: Size,
    /// Set from the item configuration; cleared once the user zooms
    /// manually so viewport changes stop snapping to max.
    pub zoom_initial: bool,
}

impl ZoomState {
    pub fn new(max_scale: f64, zoom_initial: bool) -> Self {
        Self {
            scale: 1.0,
            min_scale: 1.0,
            max_scale: max_scale.max(1.0),
            content_size: Size::ZERO,
            viewport_size: Size::ZERO,
            zoom_initial,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(self.min_scale, self.max_scale);
    }

    /// Refresh the upper bound, re-clamping the current scale.
    pub fn set_max_scale(&mut self, max_scale: f64) {
        self.max_scale = max_scale.max(self.min_scale);
        self.scale = self.scale.clamp(self.min_scale, self.max_scale);
    }

    /// Whether the user is zoomed away from the fitted scale.
    pub fn zoomed_away(&self) -> bool {
        self.scale > self.min_scale + SCALE_EPSILON
    }

    pub fn at_min(&self) -> bool {
        !self.zoomed_away()
    }
}

/// Video-only overlay: play affordance over the thumbnail until playback
/// is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOverlay {
    pub affordance_visible: bool,
    pub playing: bool,
}

impl Default for PlaybackOverlay {
    fn default() -> Self {
        Self {
            affordance_visible: true,
            playing: false,
        }
    }
}
