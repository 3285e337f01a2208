use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use super::gate::is_canonical;

#[derive(RustEmbed)]
#[folder = "web"]
struct Asset;

/// Candidate embedded files for a request path, most specific first.
/// Non-canonical paths match nothing.
fn candidates(path: &str) -> Vec<String> {
    if !is_canonical(path) {
        return Vec::new();
    }

    let path = path.trim_matches('/');

    if path.is_empty() {
        return vec!["index.html".to_string()];
    }

    let mut files = vec![
        path.to_string(),
        format!("{path}.html"),
        format!("{path}/index.html"),
    ];

    // Individual posts are rendered client-side by the blog page.
    if path.starts_with("blog/") {
        files.push("blog.html".to_string());
    }

    files
}

fn respond(path: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    ([(header::CONTENT_TYPE, mime.as_ref())], Body::from(data)).into_response()
}

pub async fn serve_asset(uri: Uri) -> Response {
    for file in candidates(uri.path()) {
        if let Some(content) = Asset::get(&file) {
            return respond(&file, content.data.into_owned());
        }
    }

    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates() {
        assert_eq!(candidates("/"), vec!["index.html"]);
        assert_eq!(
            candidates("/adminpanelR/"),
            vec![
                "adminpanelR",
                "adminpanelR.html",
                "adminpanelR/index.html"
            ]
        );
        assert_eq!(candidates("/blog/hello").last().unwrap(), "blog.html");
        assert!(candidates("//adminpanelR").is_empty());
        assert!(candidates("/blog/../adminpanelR/").is_empty());
    }

    #[test]
    fn test_pages_are_embedded() {
        for page in [
            "index.html",
            "blog.html",
            "adminpanelR/index.html",
            "adminpanelR/login.html",
        ] {
            assert!(Asset::get(page).is_some(), "{page} missing");
        }
    }
}
