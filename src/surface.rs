//! Traits the controller drives instead of owning widgets directly.

use crate::content::SharedImage;
use crate::geometry::{Insets, Size};

/// Geometry the controller computed for the surface to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    pub content_size: Size,
    pub insets: Insets,
}

/// The per-item display surface.
///
/// Content and geometry calls arrive on the host event loop, one at a
/// time. The playback hooks only matter for video-capable surfaces and
/// default to no-ops.
pub trait DisplaySurface {
    /// Display the given content, or clear the surface.
    fn set_content(&mut self, content: Option<SharedImage>);

    /// Apply computed content size and centering insets.
    fn apply_layout(&mut self, layout: SurfaceLayout);

    /// Apply a zoom scale. `animated` is a hint; a surface without
    /// animation applies it directly.
    fn set_zoom_scale(&mut self, scale: f64, animated: bool);

    /// Horizontally flipped presentation for right-to-left layout hosts.
    fn set_mirrored(&mut self, mirrored: bool);

    fn set_playback_visible(&mut self, _visible: bool) {}

    fn start_playback(&mut self) {}

    fn pause_playback(&mut self) {}
}

/// Spinner shown while a load is in flight. Borrowed weakly by the
/// controller; lifecycle stays with the host.
pub trait ActivityIndicator {
    fn show(&self);
    fn hide(&self);
}
