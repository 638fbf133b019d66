//! Web content extraction for the research agent
//!
//! Fetches a page and reduces its HTML to plain text. Failures come back as
//! an error string in place of the page text.

use crate::http::{HttpRequest, HttpTransport, BROWSER_USER_AGENT};
use scraper::{Html, Node};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Hard cap on returned text, counted in characters
pub const MAX_PAGE_CHARS: usize = 50_000;

pub struct WebExtractor {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl WebExtractor {
    pub fn new(transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Read the text content of `url`
    pub async fn extract(&self, url: &str) -> String {
        info!(url, "Agent visiting webpage");

        let request = HttpRequest::get(url, BROWSER_USER_AGENT).with_timeout(self.timeout);

        match self.transport.get(&request).await {
            Err(e) => {
                warn!(url, error = %e, "Webpage fetch failed");
                format!("Error fetching the webpage: {}", e)
            }
            Ok(response) if !response.is_success() => {
                let class = if response.status >= 500 { "Server" } else { "Client" };
                warn!(url, status = response.status, "Webpage returned error status");
                format!(
                    "Error fetching the webpage: {} {} Error: {} for url: {}",
                    response.status, class, response.reason, url
                )
            }
            Ok(response) => html_to_text(&response.body),
        }
    }
}

fn is_element(node: &Node, names: &[&str]) -> bool {
    node.as_element()
        .is_some_and(|el| names.iter().any(|name| *name == el.name()))
}

/// Non-empty text nodes outside script/style, in document order.
/// The parser keeps `<noscript>` contents as raw markup, so that text is
/// parsed again as a fragment.
fn collect_text(document: &Html, out: &mut Vec<String>) {
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if node
            .ancestors()
            .any(|ancestor| is_element(ancestor.value(), &["script", "style"]))
        {
            continue;
        }

        let in_noscript = node
            .parent()
            .is_some_and(|parent| is_element(parent.value(), &["noscript"]));
        if in_noscript {
            collect_text(&Html::parse_fragment(text), out);
            continue;
        }

        let text = text.trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }
}

/// Strip script/style, keep text one node per line, break on double spaces,
/// drop blank lines, cap at `MAX_PAGE_CHARS`.
pub fn html_to_text(html: &str) -> String {
    let mut node_texts = Vec::new();
    collect_text(&Html::parse_document(html), &mut node_texts);

    let joined = node_texts.join("\n");

    let mut text = joined
        .lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if let Some((cut, _)) = text.char_indices().nth(MAX_PAGE_CHARS) {
        text.truncate(cut);
    }

    text
}
