//! Page request and resolution models.

use bytes::Bytes;
use url::Url;

use bridge_traits::fetch::HttpMethod;
use core_store::TierKind;

/// What kind of resource the page is requesting, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDestination {
    /// A page navigation.
    Document,
    Audio,
    Video,
    Script,
    Style,
    Image,
    Font,
    Other,
}

/// One intercepted outbound request from the page process.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub destination: RequestDestination,
}

impl PageRequest {
    pub fn new(method: HttpMethod, url: Url, destination: RequestDestination) -> Self {
        Self {
            method,
            url,
            destination,
        }
    }

    /// A GET for a sub-resource.
    pub fn asset(url: Url, destination: RequestDestination) -> Self {
        Self::new(HttpMethod::Get, url, destination)
    }

    /// A GET page navigation.
    pub fn navigation(url: Url) -> Self {
        Self::new(HttpMethod::Get, url, RequestDestination::Document)
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == RequestDestination::Document
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.scheme() == origin.scheme()
            && self.url.host_str() == origin.host_str()
            && self.url.port_or_known_default() == origin.port_or_known_default()
    }
}

/// Where a served body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Tier(TierKind),
    Network,
    /// The cached application shell document, substituted for an uncached
    /// navigation so the app still boots offline.
    ShellFallback,
}

/// Typed placeholder outcomes. These are valid responses, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Nothing to serve; the resource is decorative or the dynamic route
    /// exhausted every fallback.
    Unavailable,
    /// The resource exists but was never downloaded for offline use.
    NotAvailableOffline,
}

/// The outcome of resolving one intercepted request.
///
/// Resolution never fails: a classification or fetch error inside the worker
/// ends in a placeholder, not an `Err`.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A body to serve to the page.
    Served { body: Bytes, from: ServedFrom },
    /// A typed placeholder response.
    Placeholder(PlaceholderKind),
    /// Not ours to answer (non-GET or cross-origin); the host forwards the
    /// request unmodified.
    PassThrough,
}

impl Resolution {
    pub fn served(body: Bytes, from: ServedFrom) -> Self {
        Resolution::Served { body, from }
    }

    pub fn is_served(&self) -> bool {
        matches!(self, Resolution::Served { .. })
    }

    pub fn placeholder(&self) -> Option<PlaceholderKind> {
        match self {
            Resolution::Placeholder(kind) => Some(*kind),
            _ => None,
        }
    }
}
