//! Static table of every route the service exposes.
//!
//! The table drives the `/api/endpoints` catalog and supplies the sample
//! queries the endpoint checker uses to probe each scraper route.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ai,
    Random,
    Search,
    Tools,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointSpec {
    pub path: &'static str,
    pub method: HttpMethod,
    pub category: Category,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub upstream: &'static str,
    /// Sample query used by the endpoint checker; `None` keeps the route out of probes
    #[serde(skip)]
    pub probe: Option<&'static [(&'static str, &'static str)]>,
}

/// A single request the endpoint checker issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub path: String,
    pub method: HttpMethod,
    pub category: Category,
    pub query: Vec<(String, String)>,
}

const fn param(name: &'static str, required: bool, description: &'static str) -> ParamSpec {
    ParamSpec { name, required, description }
}

static ENDPOINTS: &[EndpointSpec] = &[
    EndpointSpec {
        path: "/ai/oss",
        method: HttpMethod::Get,
        category: Category::Ai,
        description: "Chat completion from an open-weight model",
        params: &[
            param("text", true, "User message"),
            param("system", false, "Optional system prompt"),
        ],
        upstream: "OpenAI-compatible chat API",
        probe: Some(&[("text", "ping")]),
    },
    EndpointSpec {
        path: "/random/waifu",
        method: HttpMethod::Get,
        category: Category::Random,
        description: "Random waifu image",
        params: &[],
        upstream: "waifu.pics",
        probe: Some(&[]),
    },
    EndpointSpec {
        path: "/random/neko",
        method: HttpMethod::Get,
        category: Category::Random,
        description: "Random neko image",
        params: &[],
        upstream: "waifu.pics",
        probe: Some(&[]),
    },
    EndpointSpec {
        path: "/random/anime",
        method: HttpMethod::Get,
        category: Category::Random,
        description: "Random anime image from a named category",
        params: &[param("category", true, "waifu.pics SFW category, e.g. shinobu")],
        upstream: "waifu.pics",
        probe: Some(&[("category", "shinobu")]),
    },
    EndpointSpec {
        path: "/search/wikipedia",
        method: HttpMethod::Get,
        category: Category::Search,
        description: "Summary of a Wikipedia article",
        params: &[
            param("q", true, "Article title or search phrase"),
            param("lang", false, "Wikipedia language code (default en)"),
        ],
        upstream: "Wikipedia REST API",
        probe: Some(&[("q", "Rust (programming language)")]),
    },
    EndpointSpec {
        path: "/tools/metadata",
        method: HttpMethod::Get,
        category: Category::Tools,
        description: "Title, description and Open Graph tags of a web page",
        params: &[param("url", true, "http(s) URL of the page")],
        upstream: "target page",
        probe: Some(&[("url", "https://example.com")]),
    },
    EndpointSpec {
        path: "/tools/shortlink",
        method: HttpMethod::Get,
        category: Category::Tools,
        description: "Shorten a URL",
        params: &[param("url", true, "http(s) URL to shorten")],
        upstream: "is.gd",
        probe: Some(&[("url", "https://example.com")]),
    },
    EndpointSpec {
        path: "/health",
        method: HttpMethod::Get,
        category: Category::System,
        description: "Liveness and visitor store health",
        params: &[],
        upstream: "internal",
        probe: None,
    },
    EndpointSpec {
        path: "/api/status",
        method: HttpMethod::Get,
        category: Category::System,
        description: "Uptime and request counters",
        params: &[],
        upstream: "internal",
        probe: None,
    },
    EndpointSpec {
        path: "/api/endpoints",
        method: HttpMethod::Get,
        category: Category::System,
        description: "Catalog of every endpoint grouped by category",
        params: &[],
        upstream: "internal",
        probe: None,
    },
    EndpointSpec {
        path: "/api/endpoints/status",
        method: HttpMethod::Get,
        category: Category::System,
        description: "Probe results for every scraper endpoint",
        params: &[param("refresh", false, "Bypass the cached report")],
        upstream: "internal",
        probe: None,
    },
    EndpointSpec {
        path: "/api/cache/stats",
        method: HttpMethod::Get,
        category: Category::System,
        description: "Response cache statistics",
        params: &[],
        upstream: "internal",
        probe: None,
    },
    EndpointSpec {
        path: "/api/cache/clear",
        method: HttpMethod::Post,
        category: Category::System,
        description: "Drop every cached response",
        params: &[],
        upstream: "internal",
        probe: None,
    },
    EndpointSpec {
        path: "/api/visitors",
        method: HttpMethod::Get,
        category: Category::System,
        description: "Visitor total, today's count and recent visits",
        params: &[param("limit", false, "Number of recent visits (1-100)")],
        upstream: "visitor store",
        probe: None,
    },
    EndpointSpec {
        path: "/api/visitors",
        method: HttpMethod::Post,
        category: Category::System,
        description: "Record a page visit",
        params: &[
            param("path", false, "Visited page path (JSON body)"),
            param("referrer", false, "Referring URL (JSON body)"),
        ],
        upstream: "visitor store",
        probe: None,
    },
];

/// Every registered endpoint
pub fn all() -> &'static [EndpointSpec] {
    ENDPOINTS
}

/// First endpoint registered under `path`
pub fn find(path: &str) -> Option<&'static EndpointSpec> {
    ENDPOINTS.iter().find(|e| e.path == path)
}

pub fn by_category() -> BTreeMap<Category, Vec<&'static EndpointSpec>> {
    let mut grouped: BTreeMap<Category, Vec<&'static EndpointSpec>> = BTreeMap::new();
    for endpoint in ENDPOINTS {
        grouped.entry(endpoint.category).or_default().push(endpoint);
    }
    grouped
}

/// Requests the endpoint checker should issue, in registry order
pub fn probe_targets() -> Vec<ProbeTarget> {
    ENDPOINTS
        .iter()
        .filter_map(|endpoint| {
            let sample = endpoint.probe?;
            Some(ProbeTarget {
                path: endpoint.path.to_string(),
                method: endpoint.method,
                category: endpoint.category,
                query: sample
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_system_routes_are_never_probed() {
        let targets = probe_targets();
        assert!(!targets.is_empty());
        assert!(targets.iter().all(|t| t.category != Category::System));
        assert!(targets.iter().all(|t| !t.path.starts_with("/api")));
    }

    #[test]
    fn test_method_and_path_pairs_are_unique() {
        let mut seen = HashSet::new();
        for endpoint in all() {
            assert!(
                seen.insert((endpoint.method, endpoint.path)),
                "duplicate endpoint {} {}",
                endpoint.method.as_str(),
                endpoint.path
            );
        }
    }

    #[test]
    fn test_probe_samples_cover_required_params() {
        for endpoint in all() {
            let Some(sample) = endpoint.probe else { continue };
            for p in endpoint.params.iter().filter(|p| p.required) {
                assert!(
                    sample.iter().any(|(k, _)| *k == p.name),
                    "{} probe is missing required param {}",
                    endpoint.path,
                    p.name
                );
            }
        }
    }

    #[test]
    fn test_by_category_keeps_every_endpoint() {
        let grouped = by_category();
        let count: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(count, all().len());
        assert!(grouped.contains_key(&Category::Random));
    }

    #[test]
    fn test_find() {
        assert_eq!(find("/random/waifu").map(|e| e.upstream), Some("waifu.pics"));
        assert!(find("/download/facebook").is_none());
    }
}
