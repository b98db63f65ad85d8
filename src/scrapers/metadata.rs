use crate::config::UpstreamSettings;
use crate::core::page::{extract_metadata, PageMetadata};
use crate::scrapers::{ensure_success, http_client_builder, ScraperError};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::redirect::{Attempt, Policy};
use reqwest::{header, Client, ClientBuilder, Url};
use std::error::Error as StdError;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;

/// Pages larger than this are refused
const MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

const MAX_REDIRECTS: usize = 10;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Raised from the redirect policy or the resolver when a target is private
#[derive(Debug, Error)]
#[error("refusing to fetch private host {0}")]
struct BlockedTarget(String);

/// Fetches arbitrary pages and scrapes their metadata
#[derive(Clone)]
pub struct PageScraper {
    http: Client,
    allow_private_targets: bool,
}

impl PageScraper {
    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self, ScraperError> {
        Self::with_builder(
            http_client_builder(settings),
            settings.allow_private_targets,
            Arc::new(SystemResolver),
        )
    }

    /// Unless private targets are allowed, every redirect hop and every
    /// resolved address is checked as well as the requested URL
    fn with_builder(
        builder: ClientBuilder,
        allow_private_targets: bool,
        resolver: Arc<dyn Resolve>,
    ) -> Result<Self, ScraperError> {
        let builder = if allow_private_targets {
            builder
        } else {
            builder
                .redirect(Policy::custom(check_redirect))
                .dns_resolver(Arc::new(PublicOnlyResolver { inner: resolver }))
        };

        Ok(Self {
            http: builder.build().map_err(ScraperError::RequestError)?,
            allow_private_targets,
        })
    }

    pub async fn metadata(&self, target: &str) -> Result<PageMetadata, ScraperError> {
        let url = self.validate_target(target)?;
        tracing::debug!("Scraping metadata from: {}", url);

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5")
            .send()
            .await
            .map_err(request_error)?;
        let mut response = ensure_success(response).await?;

        if let Some(len) = response.content_length() {
            if len as usize > MAX_PAGE_BYTES {
                return Err(too_large(len as usize));
            }
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(ScraperError::InvalidInput(format!("not an HTML page ({})", content_type)));
        }

        // Relative links resolve against the post-redirect location
        let final_url = response.url().clone();

        // Chunked responses carry no length, so the cap is enforced while reading
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > MAX_PAGE_BYTES {
                return Err(too_large(body.len() + chunk.len()));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(extract_metadata(&String::from_utf8_lossy(&body), &final_url))
    }

    fn validate_target(&self, target: &str) -> Result<Url, ScraperError> {
        let url = Url::parse(target.trim())
            .map_err(|e| ScraperError::InvalidInput(format!("invalid url: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidInput("only http and https URLs are supported".into()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ScraperError::InvalidInput("url has no host".into()))?;

        if !self.allow_private_targets && is_private_host(host) {
            return Err(ScraperError::InvalidInput(BlockedTarget(host.to_string()).to_string()));
        }

        Ok(url)
    }
}

fn too_large(bytes: usize) -> ScraperError {
    ScraperError::InvalidInput(format!("page is too large (over {} bytes, read {})", MAX_PAGE_BYTES, bytes))
}

/// A blocked redirect or lookup surfaces as `InvalidInput`, anything else as usual
fn request_error(err: reqwest::Error) -> ScraperError {
    let mut source = StdError::source(&err);
    while let Some(cause) = source {
        if let Some(blocked) = cause.downcast_ref::<BlockedTarget>() {
            return ScraperError::InvalidInput(blocked.to_string());
        }
        source = cause.source();
    }
    ScraperError::from(err)
}

fn check_redirect(attempt: Attempt) -> reqwest::redirect::Action {
    if attempt.previous().len() >= MAX_REDIRECTS {
        return attempt.error(format!("more than {} redirects", MAX_REDIRECTS));
    }

    let url = attempt.url();
    if !matches!(url.scheme(), "http" | "https") {
        let scheme = url.scheme().to_string();
        return attempt.error(format!("redirect to unsupported scheme {}", scheme));
    }

    let private_host = url.host_str().filter(|host| is_private_host(host)).map(str::to_owned);
    match private_host {
        Some(host) => attempt.error(BlockedTarget(host)),
        None => attempt.follow(),
    }
}

/// Resolver that fails the lookup when any address is private
struct PublicOnlyResolver {
    inner: Arc<dyn Resolve>,
}

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        let lookup = self.inner.resolve(name);

        Box::pin(async move {
            let addrs: Vec<SocketAddr> = lookup.await?.collect();
            if let Some(addr) = addrs.iter().find(|addr| is_private_ip(addr.ip())) {
                let blocked = BlockedTarget(format!("{} ({})", host, addr.ip()));
                return Err(Box::new(blocked) as BoxError);
            }
            Ok::<_, BoxError>(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// getaddrinfo through tokio
struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0)).await?.collect();
            Ok::<_, BoxError>(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// Loopback, private, link-local and unspecified addresses plus `localhost`
fn is_private_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']').trim_end_matches('.');
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost") {
        return true;
    }

    host.parse::<IpAddr>().map(is_private_ip).unwrap_or(false)
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ip) => {
            ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified() || ip.is_broadcast()
        }
        IpAddr::V6(ip) => {
            let segments = ip.segments();
            ip.is_loopback()
                || ip.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link local
                || (segments[0] & 0xfe00) == 0xfc00
                || (segments[0] & 0xffc0) == 0xfe80
                || ip.to_ipv4_mapped().map(|v4| is_private_ip(IpAddr::V4(v4))).unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn open_scraper() -> PageScraper {
        PageScraper::with_builder(Client::builder(), true, Arc::new(SystemResolver)).unwrap()
    }

    fn guarded_scraper(builder: ClientBuilder, resolver: Arc<dyn Resolve>) -> PageScraper {
        PageScraper::with_builder(builder, false, resolver).unwrap()
    }

    /// Resolves every name to one fixed address
    struct FixedResolver(SocketAddr);

    impl Resolve for FixedResolver {
        fn resolve(&self, _name: Name) -> Resolving {
            let addr = self.0;
            Box::pin(async move { Ok::<_, BoxError>(Box::new(std::iter::once(addr)) as Addrs) })
        }
    }

    fn server_addr(server: &mockito::Server) -> SocketAddr {
        server.host_with_port().parse().unwrap()
    }

    #[test]
    fn test_private_hosts() {
        assert!(is_private_host("localhost"));
        assert!(is_private_host("localhost."));
        assert!(is_private_host("api.localhost"));
        assert!(is_private_host("127.0.0.1"));
        assert!(is_private_host("10.1.2.3"));
        assert!(is_private_host("192.168.0.10"));
        assert!(is_private_host("169.254.169.254"));
        assert!(is_private_host("[::1]"));
        assert!(is_private_host("fd00::1"));
        assert!(is_private_host("::ffff:127.0.0.1"));
        assert!(is_private_host("::ffff:169.254.169.254"));
        assert!(!is_private_host("example.com"));
        assert!(!is_private_host("93.184.216.34"));
    }

    #[tokio::test]
    async fn test_rejects_private_target_by_default() {
        let scraper = guarded_scraper(Client::builder(), Arc::new(SystemResolver));
        let err = scraper.metadata("http://127.0.0.1:8080/").await.unwrap_err();
        assert!(matches!(err, ScraperError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_rejects_non_http_scheme() {
        let scraper = open_scraper();
        let err = scraper.metadata("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(err, ScraperError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_redirect_to_private_address_is_refused() {
        let mut server = mockito::Server::new_async().await;
        let addr = server_addr(&server);
        server
            .mock("GET", "/start")
            .with_status(302)
            .with_header("location", &format!("http://127.0.0.1:{}/secret", addr.port()))
            .create_async()
            .await;
        let secret = server
            .mock("GET", "/secret")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<title>INTERNAL ADMIN</title>")
            .expect(0)
            .create_async()
            .await;

        // The public name is pinned to the local server, only the redirect hop is private
        let builder = Client::builder().resolve("public.test", addr);
        let scraper = guarded_scraper(builder, Arc::new(SystemResolver));
        let err = scraper
            .metadata(&format!("http://public.test:{}/start", addr.port()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScraperError::InvalidInput(ref m) if m.contains("private host 127.0.0.1")));
        secret.assert_async().await;
    }

    #[tokio::test]
    async fn test_name_resolving_to_private_address_is_refused() {
        let mut server = mockito::Server::new_async().await;
        let addr = server_addr(&server);
        let page = server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<title>INTERNAL ADMIN</title>")
            .expect(0)
            .create_async()
            .await;

        let scraper = guarded_scraper(Client::builder(), Arc::new(FixedResolver(addr)));
        let err = scraper
            .metadata(&format!("http://public.test:{}/page", addr.port()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScraperError::InvalidInput(ref m) if m.contains("public.test")));
        page.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolver_passes_public_addresses() {
        let public: SocketAddr = "93.184.216.34:0".parse().unwrap();
        let resolver = PublicOnlyResolver {
            inner: Arc::new(FixedResolver(public)),
        };
        let addrs: Vec<SocketAddr> = resolver.resolve("example.com".parse().unwrap()).await.unwrap().collect();
        assert_eq!(addrs, vec![public]);
    }

    #[tokio::test]
    async fn test_scrapes_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/article")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(r#"<html><head><title>Hello</title><meta property="og:image" content="/a.png"></head></html>"#)
            .create_async()
            .await;

        let meta = open_scraper().metadata(&format!("{}/article", server.url())).await.unwrap();

        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert_eq!(meta.image, Some(format!("{}/a.png", server.url())));
    }

    #[tokio::test]
    async fn test_oversized_chunked_page_is_refused() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/huge")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_chunked_body(|w| {
                let chunk = vec![b'a'; 1024 * 1024];
                w.write_all(b"<html><body>")?;
                for _ in 0..6 {
                    w.write_all(&chunk)?;
                }
                w.write_all(b"</body></html>")
            })
            .create_async()
            .await;

        let err = open_scraper().metadata(&format!("{}/huge", server.url())).await.unwrap_err();
        assert!(matches!(err, ScraperError::InvalidInput(ref m) if m.contains("too large")));
    }

    #[tokio::test]
    async fn test_rejects_non_html() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/data.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let err = open_scraper().metadata(&format!("{}/data.json", server.url())).await.unwrap_err();
        assert!(matches!(err, ScraperError::InvalidInput(ref m) if m.contains("not an HTML page")));
    }
}
