//! Host classification.
//!
//! Two disjoint host sets drive the policy: ignored hosts, whose players break
//! when their media is rerouted through an audio graph, and fallback hosts,
//! whose DRM or CORS setup forbids graph attachment so amplification is left
//! to the companion process.

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::{Origin, Url};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostPolicy {
    Normal,
    /// Fallback host: the companion's capture path is authoritative.
    SourceRewriteForbidden,
    /// Ignored host: never build an audio graph for its media.
    AudioGraphForbidden,
}

impl HostPolicy {
    pub fn most_restrictive(self, other: Self) -> Self {
        self.max(other)
    }

    pub fn allows_graph(self) -> bool {
        self != Self::AudioGraphForbidden
    }

    pub fn allows_source_rewrite(self) -> bool {
        self == Self::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostMatchMode {
    /// Exact host or any subdomain of it.
    #[default]
    Suffix,
    /// Any host containing the configured entry. Kept for configurations
    /// written against older releases.
    LegacySubstring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostPolicyConfig {
    pub ignored_hosts: Vec<String>,
    pub fallback_hosts: Vec<String>,
    pub ignored_match: HostMatchMode,
}

const DEFAULT_IGNORED_HOSTS: &[&str] = &[
    "meet.google.com",
    "teams.microsoft.com",
    "discord.com",
    "zoom.us",
];

const DEFAULT_FALLBACK_HOSTS: &[&str] = &[
    "netflix.com",
    "disneyplus.com",
    "hulu.com",
    "primevideo.com",
    "max.com",
    "spotify.com",
    "music.apple.com",
    "tidal.com",
    "deezer.com",
    "soundcloud.com",
    "twitch.tv",
];

impl Default for HostPolicyConfig {
    fn default() -> Self {
        Self {
            ignored_hosts: DEFAULT_IGNORED_HOSTS.iter().map(|v| v.to_string()).collect(),
            fallback_hosts: DEFAULT_FALLBACK_HOSTS.iter().map(|v| v.to_string()).collect(),
            ignored_match: HostMatchMode::Suffix,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostPolicyRegistry {
    ignored: Vec<String>,
    fallback: Vec<String>,
    ignored_match: HostMatchMode,
    document_url: Option<Url>,
}

impl HostPolicyRegistry {
    pub fn new(config: &HostPolicyConfig) -> Self {
        let ignored: Vec<String> = config
            .ignored_hosts
            .iter()
            .filter_map(|v| normalize_host(v))
            .collect();
        let mut fallback = Vec::with_capacity(config.fallback_hosts.len());
        for host in config.fallback_hosts.iter().filter_map(|v| normalize_host(v)) {
            if ignored.contains(&host) {
                warn!(%host, "host listed as both ignored and fallback; treating as ignored");
                continue;
            }
            fallback.push(host);
        }
        Self {
            ignored,
            fallback,
            ignored_match: config.ignored_match,
            document_url: None,
        }
    }

    /// Sets the base used to resolve relative media sources.
    pub fn with_document_url(mut self, document_url: Option<&str>) -> Self {
        self.document_url = document_url.and_then(|v| Url::parse(v).ok());
        self
    }

    pub fn document_url(&self) -> Option<&Url> {
        self.document_url.as_ref()
    }

    /// Policy of the document itself; `Normal` when the document URL is unknown.
    pub fn page_policy(&self) -> HostPolicy {
        self.document_url
            .as_ref()
            .and_then(host_of)
            .map(|host| self.classify_host(&host))
            .unwrap_or(HostPolicy::Normal)
    }

    /// Classifies a URL. Never fails: anything unparseable is `Normal`.
    pub fn classify(&self, url: &str) -> HostPolicy {
        match self.resolve_host(url) {
            Some(host) => self.classify_host(&host),
            None => HostPolicy::Normal,
        }
    }

    pub fn classify_host(&self, host: &str) -> HostPolicy {
        let Some(host) = normalize_host(host) else {
            return HostPolicy::Normal;
        };
        let ignored = match self.ignored_match {
            HostMatchMode::Suffix => self.ignored.iter().any(|v| matches_suffix(&host, v)),
            HostMatchMode::LegacySubstring => {
                self.ignored.iter().any(|v| host.contains(v.as_str()))
            },
        };
        if ignored {
            return HostPolicy::AudioGraphForbidden;
        }
        if self.fallback.iter().any(|v| matches_suffix(&host, v)) {
            return HostPolicy::SourceRewriteForbidden;
        }
        HostPolicy::Normal
    }

    /// Combines the page policy with the policy of an element's source.
    pub fn element_policy(&self, page: HostPolicy, src: Option<&str>) -> HostPolicy {
        let source = src.map(|v| self.classify(v)).unwrap_or(HostPolicy::Normal);
        page.most_restrictive(source)
    }

    fn resolve_host(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.document_url.as_ref()?.join(url).ok()?
            },
            Err(_) => return None,
        };
        host_of(&parsed)
    }
}

/// Host of the URL's origin, so `blob:` URLs report the host that minted them.
fn host_of(url: &Url) -> Option<String> {
    match url.origin() {
        Origin::Tuple(_, host, _) => Some(host.to_string()),
        Origin::Opaque(_) => None,
    }
}

fn normalize_host(raw: &str) -> Option<String> {
    let host = raw.trim().trim_matches('.').to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

fn matches_suffix(host: &str, pattern: &str) -> bool {
    host.strip_suffix(pattern)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
}
