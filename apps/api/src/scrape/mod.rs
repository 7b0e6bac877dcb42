//! Page fetching and text extraction.
//!
//! Two consumers: the catalog-scrape demo endpoint (fixed catalog URL, text
//! plus ordered link list) and the JD-from-URL path, which feeds extracted
//! posting text into the recommendation pipeline. The pipeline itself never
//! consumes scraped catalog data.

pub mod handlers;

use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;
use url::Url;

use crate::errors::AppError;

/// The fixed catalog page the demo endpoint scrapes.
pub const CATALOG_URL: &str = "https://www.shl.com/solutions/products/product-catalog/";

/// Maximum response body size (5 MB).
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

/// Maximum extracted text returned to callers (50 KB).
const MAX_TEXT_SIZE: usize = 50 * 1024;

/// Tags whose entire subtree is ignored during text extraction.
const SKIP_TAGS: [&str; 4] = ["script", "style", "noscript", "svg"];

#[derive(Debug, Serialize)]
pub struct ScrapedPage {
    pub text: String,
    pub links: Vec<String>,
}

/// Fetches a page and extracts readable text plus the ordered href list.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<ScrapedPage, AppError> {
    let body = fetch_body(client, url).await?;
    // Parse after the last await: the DOM handle is not Send and must never
    // be held across a suspension point.
    let text = truncate_text(html_to_text(&body));
    let links = collect_links(&body);
    Ok(ScrapedPage { text, links })
}

/// Fetches a job-posting URL and returns its readable text.
pub async fn fetch_job_description(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, AppError> {
    let body = fetch_body(client, url).await?;
    Ok(truncate_text(html_to_text(&body)))
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String, AppError> {
    let parsed =
        Url::parse(url).map_err(|_| AppError::Validation(format!("invalid url '{url}'")))?;

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("failed to fetch {url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "{url} returned HTTP {}",
            status.as_u16()
        )));
    }

    if response.content_length().unwrap_or(0) > MAX_BODY_SIZE as u64 {
        return Err(AppError::Upstream(format!("{url} response too large")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(format!("failed to read {url}: {e}")))?;
    if bytes.len() > MAX_BODY_SIZE {
        return Err(AppError::Upstream(format!("{url} response too large")));
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extracts readable text from HTML, stripping tags, scripts, and styles.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    // Prefer <body>, fall back to the whole document.
    let body_selector = Selector::parse("body").expect("body selector");
    let root = document.select(&body_selector).next();

    let parts = match root {
        Some(body) => collect_element_text(body),
        None => collect_element_text(document.root_element()),
    };

    clean_whitespace(&parts.join(" "))
}

/// All href values of anchor elements, in document order.
pub fn collect_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").expect("anchor selector");

    document
        .select(&anchor_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_owned)
        .collect()
}

fn collect_element_text(element: ElementRef) -> Vec<String> {
    if SKIP_TAGS.contains(&element.value().name()) {
        return Vec::new();
    }

    let mut parts = Vec::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    parts.extend(collect_element_text(child_el));
                }
            }
            _ => {}
        }
    }

    parts
}

/// Collapses runs of whitespace, keeping at most one blank line.
fn clean_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_whitespace = false;
    let mut newline_count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push('\n');
            }
            prev_was_whitespace = true;
        } else if ch.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
            }
            prev_was_whitespace = true;
            newline_count = 0;
        } else {
            result.push(ch);
            prev_was_whitespace = false;
            newline_count = 0;
        }
    }

    result.trim().to_string()
}

fn truncate_text(mut text: String) -> String {
    if text.len() <= MAX_TEXT_SIZE {
        return text;
    }
    let mut cut = MAX_TEXT_SIZE;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text
}
