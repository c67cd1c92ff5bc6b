//! Pure sizing and centering math for one media item in a viewport.
//!
//! Everything here is deterministic and side-effect free; the controller
//! owns all mutable state and feeds it in explicitly, so these functions
//! stay unit-testable without any surface behind them.

/// A width/height pair in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Symmetric per-axis insets used to center content inside a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insets {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        horizontal: 0.0,
        vertical: 0.0,
    };
}

/// How content is mapped into the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    /// Scale to the largest size that fits both axes, preserving ratio.
    #[default]
    AspectFit,
    /// Stretch to the full viewport.
    Fill,
}

/// Zoom bounds policy. A plain constant today; kept as a struct so an
/// adaptive policy (e.g. per-DPI) can slot in without touching callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomPolicy {
    pub maximum_scale: f64,
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self { maximum_scale: 2.0 }
    }
}

/// Maximum zoom scale for the given policy.
pub fn max_zoom_scale(policy: &ZoomPolicy) -> f64 {
    policy.maximum_scale
}

/// Display size for content of `intrinsic` size inside `viewport`.
///
/// With no intrinsic size yet (nothing loaded) or a degenerate one, the
/// content fills the viewport unchanged. Denominators are guarded so a
/// zero-area viewport or content yields zero-size results, never NaN.
pub fn content_size(viewport: Size, intrinsic: Option<Size>, mode: ContentMode) -> Size {
    let Some(intrinsic) = intrinsic else {
        return viewport;
    };
    if intrinsic.is_degenerate() || viewport.is_degenerate() {
        return viewport;
    }
    match mode {
        ContentMode::Fill => viewport,
        ContentMode::AspectFit => {
            let pic_ratio = intrinsic.width / intrinsic.height;
            let screen_ratio = viewport.width / viewport.height;
            if pic_ratio > screen_ratio {
                // Wider than the viewport: fit width, scale height.
                Size::new(viewport.width, viewport.width / pic_ratio)
            } else {
                // Taller (or equal): fit height, scale width.
                Size::new(viewport.height * pic_ratio, viewport.height)
            }
        }
    }
}

/// Insets that center `content` inside `viewport`; clamped at zero per axis.
pub fn centering_inset(viewport: Size, content: Size) -> Insets {
    Insets {
        horizontal: ((viewport.width - content.width) / 2.0).max(0.0),
        vertical: ((viewport.height - content.height) / 2.0).max(0.0),
    }
}

/// True when content covers the viewport on both axes (boundary inclusive).
pub fn is_full_screen(content: Size, viewport: Size) -> bool {
    content.width >= viewport.width && content.height >= viewport.height
}
