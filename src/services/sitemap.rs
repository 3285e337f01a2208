//! `sitemap.xml` rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::BlogPost;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Serialize)]
#[serde(rename = "urlset")]
struct UrlSet {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    url: Vec<UrlEntry>,
}

#[derive(Debug, Serialize)]
struct UrlEntry {
    loc: String,
    lastmod: String,
    changefreq: &'static str,
    priority: &'static str,
}

/// Site pages listed ahead of the blog posts: `(path, changefreq, priority)`.
const STATIC_ROUTES: [(&str, &str, &str); 2] = [("", "daily", "1.0"), ("/blog", "daily", "0.8")];

/// Renders the sitemap for the home page, the blog index and every published post.
pub fn render(base_url: &str, posts: &[BlogPost], now: DateTime<Utc>) -> anyhow::Result<String> {
    let base = base_url.trim_end_matches('/');
    let today = now.to_rfc3339();

    let mut entries: Vec<UrlEntry> = STATIC_ROUTES
        .iter()
        .map(|&(path, changefreq, priority)| UrlEntry {
            loc: format!("{base}{path}"),
            lastmod: today.clone(),
            changefreq,
            priority,
        })
        .collect();

    entries.extend(posts.iter().filter(|p| p.is_published).map(|post| UrlEntry {
        loc: format!("{base}/blog/{}", urlencoding::encode(&post.slug)),
        lastmod: post.updated_at.clone(),
        changefreq: "weekly",
        priority: "0.7",
    }));

    let body = quick_xml::se::to_string(&UrlSet {
        xmlns: SITEMAP_NS,
        url: entries,
    })?;

    Ok(format!(r#"<?xml version="1.0" encoding="UTF-8"?>{body}"#))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, published: bool) -> BlogPost {
        BlogPost {
            id: 1,
            title: slug.to_string(),
            slug: slug.to_string(),
            content: String::new(),
            excerpt: None,
            image_url: None,
            is_published: published,
            published_at: None,
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            updated_at: "2025-02-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_lists_static_routes_and_published_posts() {
        let xml = render(
            "https://example.com/",
            &[post("hello", true), post("secret-draft", false)],
            Utc::now(),
        )
        .unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://example.com</loc>"));
        assert!(xml.contains("<loc>https://example.com/blog</loc>"));
        assert!(xml.contains("<loc>https://example.com/blog/hello</loc>"));
        assert!(xml.contains("<lastmod>2025-02-01T00:00:00+00:00</lastmod>"));
        assert!(!xml.contains("secret-draft"));
        assert_eq!(xml.matches("<url>").count(), 3);
    }

    #[test]
    fn test_admin_area_never_listed() {
        let xml = render("https://example.com", &[], Utc::now()).unwrap();
        assert!(!xml.contains("adminpanel"));
    }
}
