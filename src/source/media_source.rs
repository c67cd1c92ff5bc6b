//! Media provenance: where one item's content comes from and how to load it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use thiserror::Error;

use crate::cache::CacheKey;
use crate::content::SharedImage;
use crate::image_loader;
use crate::source::fetch::{AbortHandle, LoadTicket, NoFetch, ThumbnailFetch};

/// Why a source could not produce a fetchable location.
///
/// Resolution failures are never surfaced to the host as errors; they are
/// logged and collapse to the same absence a transport failure produces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no location configured")]
    Empty,
    #[error("malformed url: {0}")]
    Malformed(String),
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

fn validate_url(candidate: &str) -> Result<(), ResolveError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::Empty);
    }
    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return Err(ResolveError::Malformed(trimmed.to_string()));
    };
    match scheme {
        "http" | "https" | "file" => {}
        other => return Err(ResolveError::UnsupportedScheme(other.to_string())),
    }
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(ResolveError::Malformed(trimmed.to_string()));
    }
    Ok(())
}

/// Remote video item: the playable location plus an optional thumbnail
/// URL and placeholder still.
#[derive(Clone)]
pub struct RemoteVideo {
    pub path: String,
    pub auto_play: bool,
    pub thumbnail_url: Option<String>,
    pub placeholder: Option<SharedImage>,
}

impl RemoteVideo {
    /// The URL the thumbnail fetch should use, preferring `thumbnail_url`
    /// over the video location itself.
    fn resolve_fetch_url(&self) -> Result<&str, ResolveError> {
        if let Some(thumb) = self.thumbnail_url.as_deref() {
            if validate_url(thumb).is_ok() {
                return Ok(thumb);
            }
        }
        validate_url(&self.path).map(|_| self.path.as_str())
    }
}

/// Provenance and loading strategy for one item's content.
///
/// Loading always completes through the ticket exactly once. The three
/// local variants complete synchronously within `load`; only `RemoteVideo`
/// goes through the fetch transport and returns an abort handle.
pub enum MediaSource {
    /// Already-decoded content held in memory.
    Static(SharedImage),
    /// Named asset in the embedding application's bundle namespace.
    Bundled { name: String },
    /// Image file on local disk.
    File { path: PathBuf },
    /// Remote video with an optionally fetchable thumbnail.
    RemoteVideo(RemoteVideo),
}

impl MediaSource {
    pub fn is_video(&self) -> bool {
        matches!(self, MediaSource::RemoteVideo(_))
    }

    pub fn auto_play(&self) -> bool {
        matches!(self, MediaSource::RemoteVideo(video) if video.auto_play)
    }

    /// Whether this source gets a playback overlay (video with a thumbnail
    /// or placeholder configured to sit under the play affordance).
    pub fn wants_playback_overlay(&self) -> bool {
        matches!(
            self,
            MediaSource::RemoteVideo(video)
                if video.thumbnail_url.is_some() || video.placeholder.is_some()
        )
    }

    /// Stable cache identity, when the content has one.
    pub fn cache_key(&self) -> Option<CacheKey> {
        match self {
            MediaSource::Static(_) => None,
            MediaSource::Bundled { name } => Some(CacheKey::Asset(name.clone())),
            MediaSource::File { path } => Some(CacheKey::File(path.clone())),
            MediaSource::RemoteVideo(video) => video
                .resolve_fetch_url()
                .ok()
                .map(|url| CacheKey::Remote(url.to_string())),
        }
    }

    /// Load this source's content, completing `ticket` exactly once.
    ///
    /// Returns an abort handle when a cancellable fetch was started;
    /// `None` means the load already completed and there is nothing to
    /// cancel.
    pub fn load(&self, ticket: LoadTicket, env: &SourceEnv) -> Option<Box<dyn AbortHandle>> {
        match self {
            MediaSource::Static(image) => {
                ticket.deliver(Some(image.clone()));
                None
            }
            MediaSource::Bundled { name } => {
                let found = env.bundle.lookup(name);
                if found.is_none() {
                    tracing::warn!("bundled asset not found: {name}");
                }
                ticket.deliver(found);
                None
            }
            MediaSource::File { path } => {
                match image_loader::open_image(path) {
                    Ok(image) => ticket.deliver(Some(Arc::new(image))),
                    Err(err) => {
                        tracing::warn!("failed to load {:?}: {:#}", path, err);
                        ticket.deliver(None);
                    }
                }
                None
            }
            MediaSource::RemoteVideo(video) => match video.resolve_fetch_url() {
                Ok(url) => {
                    tracing::debug!("fetching video thumbnail from {url}");
                    let reply = ticket.into_fetch_reply(video.placeholder.clone());
                    Some(env.fetcher.fetch(url, reply))
                }
                Err(err) => {
                    tracing::debug!("remote video has no fetchable url: {err}");
                    ticket.deliver(video.placeholder.clone());
                    None
                }
            },
        }
    }
}

/// Named assets bundled with the embedding application.
#[derive(Default)]
pub struct BundleRegistry {
    assets: HashMap<String, SharedImage>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, image: SharedImage) {
        self.assets.insert(name.into(), image);
    }

    pub fn lookup(&self, name: &str) -> Option<SharedImage> {
        self.assets.get(name).cloned()
    }
}

/// Collaborators a source may need while loading. Cheap to clone; one env
/// is typically shared by every item in a slideshow.
#[derive(Clone)]
pub struct SourceEnv {
    pub bundle: Rc<BundleRegistry>,
    pub fetcher: Rc<dyn ThumbnailFetch>,
}

impl Default for SourceEnv {
    fn default() -> Self {
        Self {
            bundle: Rc::new(BundleRegistry::new()),
            fetcher: Rc::new(NoFetch),
        }
    }
}

impl SourceEnv {
    pub fn with_fetcher(fetcher: Rc<dyn ThumbnailFetch>) -> Self {
        Self {
            fetcher,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MediaImage;
    use crate::source::fetch::{CompletionReceiver, FetchReply, NoopAbort};
    use std::cell::RefCell;
    use std::sync::atomic::AtomicU64;

    fn image(side: u32) -> SharedImage {
        Arc::new(MediaImage::solid(side, side, [5, 5, 5, 255]).unwrap())
    }

    fn ticket(generation: u64) -> (LoadTicket, CompletionReceiver) {
        let (tx, rx) = async_channel::unbounded();
        let guard = Arc::new(AtomicU64::new(generation));
        (LoadTicket::new(tx, generation, guard), rx)
    }

    /// Records fetch calls without completing them.
    #[derive(Default)]
    struct RecordingFetch {
        urls: RefCell<Vec<String>>,
        pending: RefCell<Vec<FetchReply>>,
    }

    impl ThumbnailFetch for RecordingFetch {
        fn fetch(&self, url: &str, reply: FetchReply) -> Box<dyn AbortHandle> {
            self.urls.borrow_mut().push(url.to_string());
            self.pending.borrow_mut().push(reply);
            Box::new(NoopAbort)
        }
    }

    #[test]
    fn test_static_delivers_held_image_once() {
        let img = image(2);
        let source = MediaSource::Static(img.clone());
        let (ticket, rx) = ticket(1);
        assert!(source.load(ticket, &SourceEnv::default()).is_none());
        assert_eq!(rx.try_recv().unwrap(), (1, Some(img)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_bundled_lookup_hit_and_miss() {
        let mut bundle = BundleRegistry::new();
        bundle.register("hero", image(3));
        let env = SourceEnv {
            bundle: Rc::new(bundle),
            fetcher: Rc::new(NoFetch),
        };

        let (t, rx) = ticket(1);
        MediaSource::Bundled {
            name: "hero".into(),
        }
        .load(t, &env);
        assert!(rx.try_recv().unwrap().1.is_some());

        let (t, rx) = ticket(2);
        MediaSource::Bundled {
            name: "missing".into(),
        }
        .load(t, &env);
        assert_eq!(rx.try_recv().unwrap(), (2, None));
    }

    #[test]
    fn test_file_read_failure_is_absence() {
        let dir = tempfile::tempdir().unwrap();
        let source = MediaSource::File {
            path: dir.path().join("nope.png"),
        };
        let (t, rx) = ticket(1);
        assert!(source.load(t, &SourceEnv::default()).is_none());
        assert_eq!(rx.try_recv().unwrap(), (1, None));
    }

    #[test]
    fn test_file_decodes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        image::RgbaImage::from_pixel(6, 4, image::Rgba([8, 8, 8, 255]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let (t, rx) = ticket(1);
        MediaSource::File { path }.load(t, &SourceEnv::default());
        let (_, delivered) = rx.try_recv().unwrap();
        let delivered = delivered.unwrap();
        assert_eq!((delivered.width(), delivered.height()), (6, 4));
    }

    #[test]
    fn test_unparseable_video_url_delivers_placeholder_without_fetch() {
        let fetcher = Rc::new(RecordingFetch::default());
        let env = SourceEnv::with_fetcher(fetcher.clone());
        let placeholder = image(4);
        let source = MediaSource::RemoteVideo(RemoteVideo {
            path: "bad url".into(),
            auto_play: false,
            thumbnail_url: None,
            placeholder: Some(placeholder.clone()),
        });

        let (t, rx) = ticket(1);
        assert!(source.load(t, &env).is_none());
        assert_eq!(rx.try_recv().unwrap(), (1, Some(placeholder)));
        assert!(fetcher.urls.borrow().is_empty());
    }

    #[test]
    fn test_thumbnail_url_preferred_over_path() {
        let fetcher = Rc::new(RecordingFetch::default());
        let env = SourceEnv::with_fetcher(fetcher.clone());
        let source = MediaSource::RemoteVideo(RemoteVideo {
            path: "https://example.com/clip.mp4".into(),
            auto_play: false,
            thumbnail_url: Some("https://example.com/thumb.jpg".into()),
            placeholder: None,
        });

        let (t, _rx) = ticket(1);
        assert!(source.load(t, &env).is_some());
        assert_eq!(fetcher.urls.borrow().as_slice(), ["https://example.com/thumb.jpg"]);
    }

    #[test]
    fn test_invalid_thumbnail_falls_back_to_path() {
        let fetcher = Rc::new(RecordingFetch::default());
        let env = SourceEnv::with_fetcher(fetcher.clone());
        let source = MediaSource::RemoteVideo(RemoteVideo {
            path: "https://example.com/clip.mp4".into(),
            auto_play: false,
            thumbnail_url: Some("not a url".into()),
            placeholder: None,
        });

        let (t, _rx) = ticket(1);
        source.load(t, &env);
        assert_eq!(fetcher.urls.borrow().as_slice(), ["https://example.com/clip.mp4"]);
    }

    #[test]
    fn test_validate_url_taxonomy() {
        assert_eq!(validate_url(""), Err(ResolveError::Empty));
        assert_eq!(validate_url("   "), Err(ResolveError::Empty));
        assert!(matches!(
            validate_url("bad url"),
            Err(ResolveError::Malformed(_))
        ));
        assert!(matches!(
            validate_url("ftp://example.com/x"),
            Err(ResolveError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_url("https://"),
            Err(ResolveError::Malformed(_))
        ));
        assert!(validate_url("https://example.com/a.jpg").is_ok());
        assert!(validate_url("file:///tmp/a.jpg").is_ok());
    }

    #[test]
    fn test_cache_keys() {
        assert!(MediaSource::Static(image(1)).cache_key().is_none());
        assert_eq!(
            MediaSource::Bundled { name: "x".into() }.cache_key(),
            Some(CacheKey::Asset("x".into()))
        );
        assert_eq!(
            MediaSource::File {
                path: PathBuf::from("/a/b.png")
            }
            .cache_key(),
            Some(CacheKey::File(PathBuf::from("/a/b.png")))
        );
        let video = MediaSource::RemoteVideo(RemoteVideo {
            path: "junk".into(),
            auto_play: false,
            thumbnail_url: None,
            placeholder: None,
        });
        assert!(video.cache_key().is_none());
    }

    #[test]
    fn test_overlay_wanted_only_with_still() {
        let bare = MediaSource::RemoteVideo(RemoteVideo {
            path: "https://example.com/v.mp4".into(),
            auto_play: true,
            thumbnail_url: None,
            placeholder: None,
        });
        assert!(!bare.wants_playback_overlay());

        let with_placeholder = MediaSource::RemoteVideo(RemoteVideo {
            path: "https://example.com/v.mp4".into(),
            auto_play: true,
            thumbnail_url: None,
            placeholder: Some(image(1)),
        });
        assert!(with_placeholder.wants_playback_overlay());
        assert!(with_placeholder.auto_play());
    }
}
