//! Per-item core of a zoomable media slideshow.
//!
//! The host container supplies a viewport, gestures, and a display
//! surface; this crate supplies the media sources, the aspect-fit
//! geometry, and the per-item load/zoom/playback state machine. Rendering
//! and transport stay on the host side behind the traits in [`surface`]
//! and [`source::fetch`].

pub mod cache;
pub mod content;
pub mod controller;
pub mod geometry;
pub mod image_loader;
pub mod prefetch;
pub mod source;
pub mod surface;

pub use cache::{shared_cache, CacheKey, ContentCache, SharedContentCache};
pub use content::{MediaImage, SharedImage};
pub use controller::{ItemConfig, ItemController, LoadState, PlaybackOverlay, ZoomState};
pub use geometry::{ContentMode, Insets, Size, ZoomPolicy};
pub use prefetch::Prefetcher;
pub use source::{
    AbortHandle, BundleRegistry, FetchReply, LoadDelivery, LoadTicket, MediaSource, NoFetch,
    NoopAbort, RemoteVideo, ResolveError, SourceEnv, ThumbnailFetch,
};
pub use surface::{ActivityIndicator, DisplaySurface, SurfaceLayout};
