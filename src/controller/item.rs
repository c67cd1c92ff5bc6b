//! Per-item orchestrator: one source, one surface, one state machine.
//!
//! The controller is single-threaded and driven by the host event loop:
//! gestures, viewport passes, and `process_results` all run on the same
//! loop, so state mutations never interleave mid-update. Loads complete
//! through an unbounded channel; a generation counter, bumped on every
//! new load and on release, decides at apply time whether a completion is
//! still wanted.

use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::SharedContentCache;
use crate::content::SharedImage;
use crate::controller::state::{LoadState, PlaybackOverlay, ZoomState};
use crate::geometry::{self, ContentMode, Insets, Size, ZoomPolicy};
use crate::source::fetch::{
    AbortHandle, CompletionReceiver, CompletionSender, LoadDelivery, LoadTicket,
};
use crate::source::{MediaSource, SourceEnv};
use crate::surface::{ActivityIndicator, DisplaySurface, SurfaceLayout};

/// Per-item configuration supplied by the container.
#[derive(Debug, Clone, Copy)]
pub struct ItemConfig {
    pub zoom_enabled: bool,
    pub zoom_in_initially: bool,
    pub maximum_scale: f64,
    /// Horizontally flipped presentation for right-to-left hosts.
    pub mirrored: bool,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            zoom_enabled: true,
            zoom_in_initially: false,
            maximum_scale: ZoomPolicy::default().maximum_scale,
            mirrored: false,
        }
    }
}

pub struct ItemController<S: DisplaySurface> {
    source: MediaSource,
    config: ItemConfig,
    surface: S,
    env: SourceEnv,
    indicator: Option<Weak<dyn ActivityIndicator>>,
    cache: Option<SharedContentCache>,
    load_state: LoadState,
    zoom: ZoomState,
    overlay: Option<PlaybackOverlay>,
    generation: u64,
    generation_guard: Arc<AtomicU64>,
    completion_tx: CompletionSender,
    completion_rx: CompletionReceiver,
    abort: Option<Box<dyn AbortHandle>>,
    last_viewport: Option<Size>,
    full_screen: bool,
    on_layout_request: Option<Rc<dyn Fn()>>,
    on_full_screen: Option<Rc<dyn Fn(bool)>>,
}

impl<S: DisplaySurface> ItemController<S> {
    pub fn new(source: MediaSource, mut surface: S, config: ItemConfig, env: SourceEnv) -> Self {
        let (completion_tx, completion_rx) = async_channel::unbounded();
        let overlay = source.wants_playback_overlay().then(PlaybackOverlay::default);
        surface.set_mirrored(config.mirrored);
        if overlay.is_some() {
            // Thumbnail first; playback stays hidden behind the affordance.
            surface.set_playback_visible(false);
        }
        let zoom = ZoomState::new(
            geometry::max_zoom_scale(&ZoomPolicy {
                maximum_scale: config.maximum_scale,
            }),
            config.zoom_in_initially,
        );
        Self {
            source,
            config,
            surface,
            env,
            indicator: None,
            cache: None,
            load_state: LoadState::Idle,
            zoom,
            overlay,
            generation: 0,
            generation_guard: Arc::new(AtomicU64::new(0)),
            completion_tx,
            completion_rx,
            abort: None,
            last_viewport: None,
            full_screen: false,
            on_layout_request: None,
            on_full_screen: None,
        }
    }

    /// Borrow the indicator weakly; its lifecycle stays with the host.
    pub fn set_activity_indicator(&mut self, indicator: Rc<dyn ActivityIndicator>) {
        self.indicator = Some(Rc::downgrade(&indicator));
    }

    pub fn set_cache(&mut self, cache: SharedContentCache) {
        self.cache = Some(cache);
    }

    /// Called whenever displayed content changed such that the container
    /// must re-run layout.
    pub fn connect_layout_request<F: Fn() + 'static>(&mut self, callback: F) {
        self.on_layout_request = Some(Rc::new(callback));
    }

    /// Full-screen state changes, for container chrome-hiding decisions.
    pub fn connect_full_screen_changed<F: Fn(bool) + 'static>(&mut self, callback: F) {
        self.on_full_screen = Some(Rc::new(callback));
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    pub fn overlay(&self) -> Option<&PlaybackOverlay> {
        self.overlay.as_ref()
    }

    pub fn is_full_screen(&self) -> bool {
        self.full_screen
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Single tap retries a failed load; disabled in every other state.
    pub fn single_tap_enabled(&self) -> bool {
        self.load_state.is_failed()
    }

    /// Double tap toggles zoom; disabled while failed so the retry tap
    /// cannot be shadowed.
    pub fn double_tap_enabled(&self) -> bool {
        self.config.zoom_enabled && !self.load_state.is_failed()
    }

    /// Start loading unless content is already displayed or in flight.
    pub fn request_load(&mut self) {
        if !self.load_state.can_start_load() {
            tracing::trace!("load request ignored in state {:?}", self.load_state);
            return;
        }

        let cached = match (self.cache.as_ref(), self.source.cache_key()) {
            (Some(cache), Some(key)) => {
                let hit = cache.lock().get(&key);
                if hit.is_some() {
                    tracing::debug!("serving {:?} from cache", key);
                }
                hit
            }
            _ => None,
        };
        if let Some(content) = cached {
            self.apply_content(content);
            return;
        }

        self.generation = self.generation.wrapping_add(1);
        self.generation_guard.store(self.generation, Ordering::Release);
        self.load_state = LoadState::Loading;
        tracing::debug!("load started (generation {})", self.generation);
        self.indicator_show();

        let ticket = LoadTicket::new(
            self.completion_tx.clone(),
            self.generation,
            self.generation_guard.clone(),
        );
        self.abort = self.source.load(ticket, &self.env);

        // Synchronous variants have already delivered; apply them before
        // returning so their effects are observable immediately.
        self.process_results();
    }

    /// Apply any completions that have arrived. The host pumps this from
    /// its event loop after asynchronous fetches signal completion.
    pub fn process_results(&mut self) {
        while let Ok((generation, delivered)) = self.completion_rx.try_recv() {
            self.apply_completion(generation, delivered);
        }
    }

    /// Discard displayed/pending content and return to `Idle`, e.g. when
    /// the item scrolls far off-screen and memory should be reclaimed.
    pub fn release(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.generation_guard.store(self.generation, Ordering::Release);
        if let Some(handle) = self.abort.take() {
            handle.abort();
        }
        self.load_state = LoadState::Idle;
        self.surface.set_content(None);
        self.indicator_hide();
        self.zoom.set_scale(self.zoom.min_scale());
        self.surface.set_zoom_scale(self.zoom.scale(), false);
        if let Some(overlay) = self.overlay.as_mut() {
            if overlay.playing {
                self.surface.pause_playback();
            }
            // Back to thumbnail-with-affordance for any later reload.
            *overlay = PlaybackOverlay::default();
            self.surface.set_playback_visible(false);
        }
        tracing::debug!("released item content (generation {})", self.generation);
    }

    pub fn on_single_tap(&mut self) {
        if !self.single_tap_enabled() {
            return;
        }
        tracing::debug!("retrying failed load");
        self.request_load();
    }

    pub fn on_double_tap(&mut self) {
        if !self.double_tap_enabled() {
            return;
        }
        // A manual zoom ends the initial-zoom regime.
        self.zoom.zoom_initial = false;
        let target = if self.zoom.zoomed_away() {
            self.zoom.min_scale()
        } else {
            self.zoom.max_scale()
        };
        self.zoom.set_scale(target);
        self.surface.set_zoom_scale(target, true);
        if self.zoom.at_min() {
            // Back at the fitted scale; refresh base geometry.
            self.relayout(false);
        }
    }

    /// Layout pass from the container: the viewport (re)gained a size.
    pub fn set_viewport(&mut self, viewport: Size) {
        let changed = self.last_viewport != Some(viewport);
        self.last_viewport = Some(viewport);
        self.relayout(changed);
    }

    /// Reveal playback and start it. No-op without a playback overlay.
    pub fn play(&mut self) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        if overlay.playing {
            return;
        }
        overlay.affordance_visible = false;
        overlay.playing = true;
        self.surface.set_playback_visible(true);
        self.surface.start_playback();
        tracing::debug!("playback started");
    }

    /// Stop playback without hiding the playback surface.
    pub fn pause(&mut self) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        if !overlay.playing {
            return;
        }
        overlay.playing = false;
        self.surface.pause_playback();
        tracing::debug!("playback paused");
    }

    /// Container signal that this page became the visible one; starts
    /// playback when the source asked for auto-play.
    pub fn notify_page_visible(&mut self) {
        if self.source.auto_play() {
            self.play();
        }
    }

    fn apply_completion(&mut self, generation: u64, delivered: LoadDelivery) {
        if generation != self.generation {
            // Raced with a release or a newer load; the result is dead.
            tracing::debug!(
                "discarding stale load result (generation {} != {})",
                generation,
                self.generation
            );
            return;
        }
        self.abort = None;
        self.indicator_hide();

        match delivered {
            Some(content) => {
                if let (Some(cache), Some(key)) = (self.cache.as_ref(), self.source.cache_key()) {
                    cache.lock().insert(key, content.clone());
                }
                self.apply_content(content);
            }
            None => {
                tracing::debug!("load failed, tap-to-retry enabled");
                self.load_state = LoadState::Failed;
                self.surface.set_content(None);
                // Without content the layout falls back to filling the
                // viewport; drop whatever the previous content left behind.
                self.relayout(false);
            }
        }
    }

    fn apply_content(&mut self, content: SharedImage) {
        self.surface.set_content(Some(content.clone()));
        self.load_state = LoadState::Loaded(content);

        // Base geometry is computed at the fitted scale; the initial-zoom
        // snap is applied on top of it.
        self.zoom.set_scale(self.zoom.min_scale());
        self.relayout(false);
        let scale = if self.zoom.zoom_initial {
            self.zoom.max_scale()
        } else {
            self.zoom.min_scale()
        };
        self.zoom.set_scale(scale);
        self.surface.set_zoom_scale(scale, false);

        if let Some(callback) = &self.on_layout_request {
            callback();
        }
    }

    fn relayout(&mut self, viewport_changed: bool) {
        let Some(viewport) = self.last_viewport else {
            return;
        };

        let intrinsic = self.load_state.content().map(|content| content.size());
        let fitted = geometry::content_size(viewport, intrinsic, ContentMode::AspectFit);
        if self.zoom.at_min() {
            self.zoom.content_size = fitted;
        }
        self.zoom.viewport_size = viewport;

        let full = geometry::is_full_screen(self.zoom.content_size, viewport);
        let insets = if full {
            Insets::ZERO
        } else {
            geometry::centering_inset(viewport, self.zoom.content_size)
        };
        self.surface.apply_layout(SurfaceLayout {
            content_size: self.zoom.content_size,
            insets,
        });

        if self.zoom.zoom_initial && viewport_changed {
            self.zoom.set_scale(self.zoom.max_scale());
            self.surface.set_zoom_scale(self.zoom.scale(), false);
        }
        self.zoom.set_max_scale(geometry::max_zoom_scale(&ZoomPolicy {
            maximum_scale: self.config.maximum_scale,
        }));

        self.set_full_screen(full);
    }

    fn set_full_screen(&mut self, full: bool) {
        if full == self.full_screen {
            return;
        }
        self.full_screen = full;
        if let Some(callback) = &self.on_full_screen {
            callback(full);
        }
    }

    fn indicator_show(&self) {
        if let Some(indicator) = self.indicator.as_ref().and_then(Weak::upgrade) {
            indicator.show();
        }
    }

    fn indicator_hide(&self) {
        if let Some(indicator) = self.indicator.as_ref().and_then(Weak::upgrade) {
            indicator.hide();
        }
    }
}
