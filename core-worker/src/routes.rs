//! The ordered classification chain.
//!
//! Classification is an explicit table of predicate→route pairs walked in
//! precedence order, first match wins. Each predicate is a plain function so
//! every rule is independently testable; the resolver attaches the caching
//! strategy to the returned [`RouteKind`].

use core_offline::UnitId;

use crate::request::{PageRequest, RequestDestination};

/// Which route a request classified into, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Looping background video; video tier, cache-first, decorative.
    BackgroundVideo,
    /// Audio narration; cache-first across audio tier, offline units, then
    /// network.
    AudioNarration,
    /// User-downloaded offline documents; offline tier with network
    /// fallback.
    OfflineDocs,
    /// Everything else; pages tier, network-first.
    Dynamic,
}

/// Path layout the classifier matches against.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    /// Prefix under which audio narration assets are served.
    pub audio_path_prefix: String,
    /// Prefix under which downloadable document content is served.
    pub offline_docs_prefix: String,
    /// The application shell document served for uncached navigations.
    pub shell_document: String,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            audio_path_prefix: "/audio/".to_string(),
            offline_docs_prefix: "/content/".to_string(),
            shell_document: "/index.html".to_string(),
        }
    }
}

struct Route {
    kind: RouteKind,
    matches: fn(&PageRequest, &RoutePolicy) -> bool,
}

/// Precedence order is load-bearing: audio narration outranks offline docs,
/// and the dynamic route is the catch-all.
static ROUTES: [Route; 4] = [
    Route {
        kind: RouteKind::BackgroundVideo,
        matches: is_background_video,
    },
    Route {
        kind: RouteKind::AudioNarration,
        matches: is_audio_narration,
    },
    Route {
        kind: RouteKind::OfflineDocs,
        matches: is_offline_doc,
    },
    Route {
        kind: RouteKind::Dynamic,
        matches: |_, _| true,
    },
];

fn is_background_video(request: &PageRequest, _policy: &RoutePolicy) -> bool {
    request.destination == RequestDestination::Video
}

fn is_audio_narration(request: &PageRequest, policy: &RoutePolicy) -> bool {
    request.destination == RequestDestination::Audio
        || request.path().starts_with(&policy.audio_path_prefix)
}

fn is_offline_doc(request: &PageRequest, policy: &RoutePolicy) -> bool {
    request.path().starts_with(&policy.offline_docs_prefix)
}

/// Classify a same-origin GET request. First matching route wins.
pub fn classify(request: &PageRequest, policy: &RoutePolicy) -> RouteKind {
    for route in &ROUTES {
        if (route.matches)(request, policy) {
            return route.kind;
        }
    }
    RouteKind::Dynamic
}

/// Recover the content-unit id from a path under `prefix`, dropping any file
/// extension: `"/audio/chapter-1.mp3"` → `chapter-1`.
pub(crate) fn unit_id_for_path(path: &str, prefix: &str) -> Option<UnitId> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    let stem = rest.split('.').next().unwrap_or(rest);
    if stem.is_empty() {
        return None;
    }
    Some(UnitId::new(stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PageRequest;
    use url::Url;

    fn request(path: &str, destination: RequestDestination) -> PageRequest {
        let url = Url::parse("https://reader.example.com").unwrap().join(path).unwrap();
        PageRequest::asset(url, destination)
    }

    #[test]
    fn test_video_destination_outranks_everything() {
        // Even a video served from under the audio prefix is a video.
        let classified = classify(
            &request("/audio/ambient-loop.mp4", RequestDestination::Video),
            &RoutePolicy::default(),
        );
        assert_eq!(classified, RouteKind::BackgroundVideo);
    }

    #[test]
    fn test_audio_matches_by_destination_or_prefix() {
        let policy = RoutePolicy::default();
        assert_eq!(
            classify(&request("/cdn/narration.mp3", RequestDestination::Audio), &policy),
            RouteKind::AudioNarration
        );
        assert_eq!(
            classify(&request("/audio/chapter-1.mp3", RequestDestination::Other), &policy),
            RouteKind::AudioNarration
        );
    }

    #[test]
    fn test_offline_docs_by_prefix() {
        assert_eq!(
            classify(
                &request("/content/chapter-1.json", RequestDestination::Other),
                &RoutePolicy::default()
            ),
            RouteKind::OfflineDocs
        );
    }

    #[test]
    fn test_everything_else_is_dynamic() {
        let policy = RoutePolicy::default();
        assert_eq!(
            classify(&request("/library", RequestDestination::Document), &policy),
            RouteKind::Dynamic
        );
        assert_eq!(
            classify(&request("/app.js", RequestDestination::Script), &policy),
            RouteKind::Dynamic
        );
    }

    #[test]
    fn test_unit_id_extraction() {
        assert_eq!(
            unit_id_for_path("/audio/chapter-1.mp3", "/audio/"),
            Some(UnitId::new("chapter-1"))
        );
        assert_eq!(
            unit_id_for_path("/content/story-9.json", "/content/"),
            Some(UnitId::new("story-9"))
        );
        assert_eq!(unit_id_for_path("/audio/", "/audio/"), None);
        assert_eq!(unit_id_for_path("/audio/a/b.mp3", "/audio/"), None);
        assert_eq!(unit_id_for_path("/elsewhere/x.mp3", "/audio/"), None);
    }
}
