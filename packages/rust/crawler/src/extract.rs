//! Readable-text extraction for raw HTML pages.
//!
//! Used by the direct HTTP provider, which has no server-side extractor.
//! The content root is the first of `<main>`, `<article>`, `<body>` that is
//! not itself inside page chrome; text under `script`, `style`, `nav`,
//! `footer` and `header` is dropped.

use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as page content.
const CHROME_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "noscript"];

/// Content roots, most specific first.
const ROOT_SELECTORS: &[&str] = &["main", "article", "body"];

/// Text and title pulled out of an HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    /// Trimmed `<title>` text, empty if the page has none.
    pub title: String,
    /// One line per non-blank text node.
    pub text: String,
}

/// Extract readable text and the document title from `html`.
pub fn extract_text(html: &str) -> ExtractedText {
    let doc = Html::parse_document(html);

    let text = content_root(&doc)
        .map(|root| collect_lines(root).join("\n"))
        .unwrap_or_default();

    ExtractedText {
        title: extract_title(&doc),
        text,
    }
}

fn extract_title(doc: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    doc.select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn content_root(doc: &Html) -> Option<ElementRef<'_>> {
    ROOT_SELECTORS.iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        doc.select(&selector).find(|el| !inside_chrome(el))
    })
}

fn collect_lines(root: ElementRef<'_>) -> Vec<String> {
    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let skipped = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| CHROME_TAGS.contains(&el.name()))
            });
            let trimmed = text.trim();
            (!skipped && !trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

fn inside_chrome(el: &ElementRef<'_>) -> bool {
    el.ancestors().any(|a| {
        a.value()
            .as_element()
            .is_some_and(|e| CHROME_TAGS.contains(&e.name()))
    })
}
