use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of `<h1>` texts kept per page
const MAX_HEADINGS: usize = 10;

/// Structured metadata scraped from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub language: Option<String>,
    pub site_name: Option<String>,
    pub image: Option<String>,
    pub open_graph: BTreeMap<String, String>,
    pub twitter: BTreeMap<String, String>,
    pub icons: Vec<String>,
    pub headings: Vec<String>,
    pub links: LinkCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCounts {
    pub internal: usize,
    pub external: usize,
}

/// Extract title, description, Open Graph/Twitter tags, icons, headings and
/// link counts. Relative URLs are resolved against `page_url`.
pub fn extract_metadata(html: &str, page_url: &Url) -> PageMetadata {
    let doc = Html::parse_document(html);

    let mut open_graph = BTreeMap::new();
    let mut twitter = BTreeMap::new();
    let mut description = None;

    for meta in select_all(&doc, "meta") {
        let el = meta.value();
        let key = el.attr("property").or_else(|| el.attr("name"));
        let (Some(key), Some(content)) = (key, el.attr("content").and_then(clean)) else {
            continue;
        };
        let key = key.to_ascii_lowercase();

        if let Some(name) = key.strip_prefix("og:") {
            open_graph.entry(name.to_string()).or_insert(content);
        } else if let Some(name) = key.strip_prefix("twitter:") {
            twitter.entry(name.to_string()).or_insert(content);
        } else if key == "description" && description.is_none() {
            description = Some(content);
        }
    }

    let title = select_all(&doc, "title")
        .next()
        .and_then(|t| clean(&t.text().collect::<String>()))
        .or_else(|| open_graph.get("title").cloned());

    let description = description.or_else(|| open_graph.get("description").cloned());

    let canonical = select_all(&doc, "link[rel=canonical]")
        .next()
        .and_then(|l| l.value().attr("href"))
        .and_then(|href| resolve(page_url, href));

    let language = select_all(&doc, "html")
        .next()
        .and_then(|h| h.value().attr("lang"))
        .and_then(clean);

    let image = open_graph
        .get("image")
        .or_else(|| twitter.get("image"))
        .and_then(|src| resolve(page_url, src));

    let mut icons = Vec::new();
    for link in select_all(&doc, "link[rel][href]") {
        let el = link.value();
        let is_icon = el
            .attr("rel")
            .map(|rel| rel.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case("icon") || r.eq_ignore_ascii_case("apple-touch-icon")))
            .unwrap_or(false);
        if let Some(href) = el.attr("href").filter(|_| is_icon).and_then(|h| resolve(page_url, h)) {
            if !icons.contains(&href) {
                icons.push(href);
            }
        }
    }

    let headings = select_all(&doc, "h1")
        .filter_map(|h| clean(&h.text().collect::<Vec<_>>().join(" ")))
        .take(MAX_HEADINGS)
        .collect();

    let mut links = LinkCounts::default();
    for anchor in select_all(&doc, "a[href]") {
        let Some(target) = anchor.value().attr("href").and_then(|h| page_url.join(h).ok()) else {
            continue;
        };
        if !matches!(target.scheme(), "http" | "https") {
            continue;
        }
        if target.host_str() == page_url.host_str() {
            links.internal += 1;
        } else {
            links.external += 1;
        }
    }

    PageMetadata {
        url: page_url.to_string(),
        title,
        description,
        canonical,
        language,
        site_name: open_graph.get("site_name").cloned(),
        image,
        open_graph,
        twitter,
        icons,
        headings,
        links,
    }
}

fn select_all<'a>(doc: &'a Html, css: &str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let selector = Selector::parse(css).ok();
    selector
        .into_iter()
        .flat_map(move |s| doc.select(&s).collect::<Vec<_>>())
}

/// Collapse whitespace; empty strings become `None`
fn clean(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <!doctype html>
        <html lang="en-GB">
        <head>
            <title>  Example
                Domain </title>
            <meta name="description" content="An example page">
            <meta property="og:title" content="OG Example">
            <meta property="og:image" content="/img/cover.png">
            <meta property="og:site_name" content="Example">
            <meta name="twitter:card" content="summary">
            <link rel="canonical" href="/home">
            <link rel="icon" href="/favicon.ico">
            <link rel="shortcut icon" href="/favicon.ico">
            <link rel="apple-touch-icon" href="https://cdn.example.org/touch.png">
            <link rel="stylesheet" href="/style.css">
        </head>
        <body>
            <h1>Welcome <em>home</em></h1>
            <h1>   </h1>
            <a href="/about">About</a>
            <a href="https://example.com/contact">Contact</a>
            <a href="https://other.org/">Elsewhere</a>
            <a href="mailto:someone@example.com">Mail</a>
        </body>
        </html>
    "#;

    fn page_url() -> Url {
        Url::parse("https://example.com/start").unwrap()
    }

    #[test]
    fn test_extracts_basic_fields() {
        let meta = extract_metadata(PAGE, &page_url());
        assert_eq!(meta.title.as_deref(), Some("Example Domain"));
        assert_eq!(meta.description.as_deref(), Some("An example page"));
        assert_eq!(meta.language.as_deref(), Some("en-GB"));
        assert_eq!(meta.site_name.as_deref(), Some("Example"));
        assert_eq!(meta.canonical.as_deref(), Some("https://example.com/home"));
    }

    #[test]
    fn test_resolves_relative_image_and_dedups_icons() {
        let meta = extract_metadata(PAGE, &page_url());
        assert_eq!(meta.image.as_deref(), Some("https://example.com/img/cover.png"));
        assert_eq!(
            meta.icons,
            vec![
                "https://example.com/favicon.ico".to_string(),
                "https://cdn.example.org/touch.png".to_string(),
            ]
        );
        assert_eq!(meta.twitter.get("card").map(String::as_str), Some("summary"));
    }

    #[test]
    fn test_headings_and_links() {
        let meta = extract_metadata(PAGE, &page_url());
        assert_eq!(meta.headings, vec!["Welcome home".to_string()]);
        assert_eq!(meta.links, LinkCounts { internal: 2, external: 1 });
    }

    #[test]
    fn test_title_falls_back_to_open_graph() {
        let html = r#"<html><head><meta property="og:title" content="Only OG"></head></html>"#;
        let meta = extract_metadata(html, &page_url());
        assert_eq!(meta.title.as_deref(), Some("Only OG"));
        assert!(meta.description.is_none());
    }
}
