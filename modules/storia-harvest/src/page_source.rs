//! Rendered-page capability: how the pipeline sees a browser page.
//!
//! `RenderedPage` is the seam between the extraction pipeline and the
//! rendered-DOM acquisition mechanism. The production impl (`RemotePage`)
//! drives a remote render service through `render-client` and holds the
//! returned HTML snapshot; queries parse that snapshot locally. Tests swap in
//! a scripted fake (see `testing`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::normalize::clean_text;
use crate::selectors::Locator;
use render_client::RenderClient;

/// Owned snapshot of one element subtree: visible text, attributes, and the
/// raw markup so card-scoped sub-queries can re-parse the fragment. Snapshots
/// are plain data — safe to hold across awaits, unlike a borrowed DOM node.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    html: String,
    text: String,
    attrs: HashMap<String, String>,
    document: bool,
}

impl ElementHandle {
    /// Collapsed visible text of the subtree (script/style excluded).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// First element in this subtree matching the locator, or `None`.
    pub fn query(&self, locator: &Locator) -> Option<ElementHandle> {
        first_match(&self.parse(), locator)
    }

    /// All elements in this subtree matching a CSS selector.
    pub fn query_all(&self, css: &str) -> Vec<ElementHandle> {
        let Ok(selector) = Selector::parse(css) else {
            return Vec::new();
        };
        let doc = self.parse();
        doc.select(&selector).map(snapshot).collect()
    }

    fn parse(&self) -> Html {
        if self.document {
            Html::parse_document(&self.html)
        } else {
            Html::parse_fragment(&self.html)
        }
    }
}

/// Build a document-level handle from a full markup string.
pub fn document_handle(html: &str) -> ElementHandle {
    let doc = Html::parse_document(html);
    let text = visible_text(doc.root_element());
    ElementHandle {
        html: html.to_string(),
        text,
        attrs: HashMap::new(),
        document: true,
    }
}

fn snapshot(el: ElementRef) -> ElementHandle {
    ElementHandle {
        html: el.html(),
        text: visible_text(el),
        attrs: el
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        document: false,
    }
}

fn first_match(doc: &Html, locator: &Locator) -> Option<ElementHandle> {
    match locator {
        Locator::Css(css) => {
            let selector = Selector::parse(css).ok()?;
            doc.select(&selector).next().map(snapshot)
        }
        Locator::CssContains { css, needle } => {
            let selector = Selector::parse(css).ok()?;
            doc.select(&selector)
                .map(snapshot)
                .find(|h| h.text().contains(needle))
        }
    }
}

/// Visible text of a subtree, whitespace-collapsed. Skips script/style/noscript
/// so free-text pattern scans don't match embedded JS.
fn visible_text(el: ElementRef) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    clean_text(Some(&raw)).unwrap_or_default()
}

fn collect_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                out.push(' ');
                out.push_str(t);
            }
            Node::Element(e) => {
                if matches!(e.name(), "script" | "style" | "noscript") {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// One rendered browser page the pipeline can navigate and inspect.
///
/// Two independent instances are held per run — one for results pages, one
/// for detail pages — so enrichment never disturbs the results page's state.
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// Load a URL, bounded by `timeout`. On success the page's snapshot is
    /// replaced; on failure the previous snapshot is unspecified.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> render_client::Result<()>;

    /// Document-level handle over the current snapshot.
    fn root(&self) -> ElementHandle;

    /// Full raw markup of the current snapshot (for diagnostic capture).
    fn content(&self) -> &str;

    /// Settle pause. Never fails.
    async fn wait(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Production page over a remote render service.
pub struct RemotePage {
    client: RenderClient,
    html: String,
}

impl RemotePage {
    pub fn new(client: RenderClient) -> Self {
        Self {
            client,
            html: String::new(),
        }
    }
}

#[async_trait]
impl RenderedPage for RemotePage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> render_client::Result<()> {
        self.html = self.client.content(url, timeout).await?;
        Ok(())
    }

    fn root(&self) -> ElementHandle {
        document_handle(&self.html)
    }

    fn content(&self) -> &str {
        &self.html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
        <article data-cy="listing-item">
          <a href="/ro/oferta/apartament-2-camere-555.html" title="Apartament 2 camere">
            <h3>Apartament 2 camere Titan</h3>
          </a>
          <p data-cy="listing-item-price">89 000 €</p>
          <script>var tracking = "4 camere fake";</script>
        </article>
    "#;

    #[test]
    fn query_all_finds_anchors_in_fragment() {
        let root = document_handle(CARD);
        let cards = root.query_all("article");
        assert_eq!(cards.len(), 1);
        let anchors = cards[0].query_all("a[href]");
        assert_eq!(anchors.len(), 1);
        assert_eq!(
            anchors[0].attr("href"),
            Some("/ro/oferta/apartament-2-camere-555.html")
        );
        assert_eq!(anchors[0].attr("title"), Some("Apartament 2 camere"));
    }

    #[test]
    fn visible_text_skips_scripts() {
        let root = document_handle(CARD);
        assert!(root.text().contains("Apartament 2 camere Titan"));
        assert!(!root.text().contains("fake"));
    }

    #[test]
    fn css_contains_locator_filters_by_text() {
        let html = r#"
            <div><p>Etaj 3</p><p>București, Sector 4</p></div>
        "#;
        let root = document_handle(html);
        let hit = root.query(&Locator::CssContains {
            css: "p",
            needle: "Sector",
        });
        assert_eq!(hit.unwrap().text(), "București, Sector 4");
    }

    #[test]
    fn missing_selector_yields_none() {
        let root = document_handle(CARD);
        assert!(root.query(&Locator::Css("[data-cy*='address']")).is_none());
    }
}
