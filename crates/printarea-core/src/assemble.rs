//! Document assembly
//!
//! Wraps annotated content into the printable document:
//!
//! ```text
//! <div class="printarea-disclaimer" role="note">…</div>
//! <main role="main">
//!   <article class="printarea-document">
//!     <h1>{title}</h1>
//!     …content…
//!   </article>
//! </main>
//! ```
//!
//! and collects what render backends need for the PDF structure: outline
//! entries from headings, alternative text from images, and hyperlink
//! targets from links.

use printarea_dom::serialize::escape_text;
use serde::Serialize;
use printarea_dom::{to_html, Document, NodeId, Role};

use crate::config::DocumentSettings;
use crate::error::Result;
use crate::headings::heading_sequence;

/// Print stylesheet embedded in assembled pages
///
/// The `bookmark-level` properties carry outline hints for CSS-driven PDF
/// engines; the Typst backend derives the outline from headings directly.
pub const PRINT_STYLESHEET: &str = r#"@page { size: A4; margin: 20mm 18mm; }
body { font-family: "DejaVu Sans", Arial, sans-serif; font-size: 11pt; line-height: 1.45; color: #000; background: #fff; }
.printarea-disclaimer { border: 1px solid #555; background: #f2f2f2; padding: 6pt 9pt; margin-bottom: 12pt; font-size: 9pt; }
h1, h2, h3, h4, h5, h6 { page-break-after: avoid; break-after: avoid; font-weight: bold; }
h1 { font-size: 20pt; bookmark-level: 1; }
h2 { font-size: 16pt; bookmark-level: 2; }
h3 { font-size: 13pt; bookmark-level: 3; }
h4 { font-size: 12pt; bookmark-level: 4; }
h5 { font-size: 11pt; bookmark-level: 5; }
h6 { font-size: 11pt; font-style: italic; bookmark-level: 6; }
p, li { orphans: 3; widows: 3; }
img { max-width: 100%; height: auto; page-break-inside: avoid; }
a { color: #0645ad; text-decoration: underline; }
table { border-collapse: collapse; width: 100%; page-break-inside: auto; margin: 8pt 0; }
caption { font-weight: bold; text-align: left; padding-bottom: 4pt; }
th, td { border: 1px solid #444; padding: 4pt 6pt; vertical-align: top; text-align: left; }
th { background: #e6e6e6; }
tr { page-break-inside: avoid; }
pre, code { font-family: "DejaVu Sans Mono", monospace; font-size: 9.5pt; }
blockquote { margin: 8pt 0 8pt 12pt; padding-left: 8pt; border-left: 3px solid #999; }
.visually-hidden { position: absolute; width: 1px; height: 1px; padding: 0; margin: -1px; overflow: hidden; clip: rect(0, 0, 0, 0); white-space: nowrap; border: 0; }
"#;

/// Class of the disclaimer banner
pub const DISCLAIMER_CLASS: &str = "printarea-disclaimer";
/// Class of the document container
pub const DOCUMENT_CLASS: &str = "printarea-document";

/// A PDF outline (bookmark) entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    /// Heading level 1-6
    pub level: u8,
    /// Heading text, whitespace-collapsed
    pub title: String,
    /// Inserted by heading normalization
    pub synthetic: bool,
}

/// Alternative text for an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAlt {
    /// Image source
    pub src: String,
    /// Alternative text
    pub alt: String,
    /// Marked presentational
    pub decorative: bool,
}

/// A hyperlink annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkAnnotation {
    /// Link target
    pub href: String,
    /// Accessible label
    pub label: String,
}

/// An assembled document ready for a render backend
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    /// Document title
    pub title: String,
    /// Document language
    pub language: String,
    /// The assembled tree
    pub document: Document,
    /// The `main` region element
    pub main: NodeId,
    /// Outline entries in document order
    pub outline: Vec<OutlineEntry>,
    /// Image alternative texts in document order
    pub images: Vec<ImageAlt>,
    /// Link annotations in document order
    pub links: Vec<LinkAnnotation>,
}

impl AssembledDocument {
    /// Serialize as a complete HTML page
    pub fn to_html(&self) -> String {
        let mut title = String::new();
        escape_text(&self.title, &mut title);
        let mut language = String::new();
        printarea_dom::serialize::escape_attr(&self.language, &mut language);

        format!(
            "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            language,
            title,
            PRINT_STYLESHEET,
            to_html(&self.document)
        )
    }
}

/// Builds [`AssembledDocument`]s
#[derive(Debug, Clone)]
pub struct Assembler {
    disclaimer: String,
    language: String,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(&DocumentSettings::default())
    }
}

impl Assembler {
    /// Create an assembler from document settings
    pub fn new(settings: &DocumentSettings) -> Self {
        Self {
            disclaimer: settings.disclaimer.clone(),
            language: settings.language.clone(),
        }
    }

    /// Wrap the content of `doc` and collect backend metadata
    pub fn assemble(&self, mut doc: Document, title: &str) -> Result<AssembledDocument> {
        let root = doc.root();

        let main = doc.create_element_with("main", &[("role", "main")]);
        let article = doc.create_element_with("article", &[("class", DOCUMENT_CLASS)]);
        let heading = doc.create_element("h1");
        let heading_text = doc.create_text(title);
        doc.append_child(heading, heading_text)?;

        doc.move_children(root, article)?;
        doc.prepend_child(article, heading)?;
        doc.append_child(main, article)?;

        if !self.disclaimer.trim().is_empty() {
            let banner = doc.create_element_with("div", &[("class", DISCLAIMER_CLASS), ("role", "note")]);
            doc.set_role(banner, Role::Disclaimer);
            let paragraph = doc.create_element("p");
            let text = doc.create_text(self.disclaimer.as_str());
            doc.append_child(paragraph, text)?;
            doc.append_child(banner, paragraph)?;
            doc.append_child(root, banner)?;
        }
        doc.append_child(root, main)?;

        let outline = collect_outline(&doc);
        let images = collect_images(&doc);
        let links = collect_links(&doc);
        log::debug!(
            "Assembled '{}': {} outline entries, {} images, {} links",
            title,
            outline.len(),
            images.len(),
            links.len()
        );

        Ok(AssembledDocument {
            title: title.to_string(),
            language: self.language.clone(),
            document: doc,
            main,
            outline,
            images,
            links,
        })
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_outline(doc: &Document) -> Vec<OutlineEntry> {
    heading_sequence(doc)
        .into_iter()
        .map(|entry| OutlineEntry {
            level: entry.level,
            title: collapse(&doc.visible_text(entry.node)),
            synthetic: doc.role(entry.node) == Role::SyntheticHeading,
        })
        .collect()
}

fn collect_images(doc: &Document) -> Vec<ImageAlt> {
    doc.descendants_named(doc.root(), "img")
        .into_iter()
        .map(|img| ImageAlt {
            src: doc.attr(img, "src").unwrap_or("").to_string(),
            alt: doc.attr(img, "alt").unwrap_or("").to_string(),
            decorative: doc.role(img) == Role::Presentational,
        })
        .collect()
}

fn collect_links(doc: &Document) -> Vec<LinkAnnotation> {
    doc.descendants_named(doc.root(), "a")
        .into_iter()
        .filter_map(|link| {
            let href = doc.attr(link, "href")?;
            let label = doc
                .attr(link, "aria-label")
                .map(str::to_string)
                .unwrap_or_else(|| collapse(&doc.visible_text(link)));
            Some(LinkAnnotation {
                href: href.to_string(),
                label,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use printarea_dom::load_fragment;

    fn assembler(disclaimer: &str) -> Assembler {
        Assembler::new(&DocumentSettings {
            disclaimer: disclaimer.to_string(),
            ..DocumentSettings::default()
        })
    }

    #[test]
    fn test_structure() {
        let doc = load_fragment("<p>Body</p>").document;
        let assembled = assembler("Notice").assemble(doc, "Report").unwrap();
        assert_eq!(
            to_html(&assembled.document),
            "<div class=\"printarea-disclaimer\" role=\"note\"><p>Notice</p></div>\
             <main role=\"main\"><article class=\"printarea-document\"><h1>Report</h1><p>Body</p></article></main>"
        );
    }

    #[test]
    fn test_disclaimer_comes_first() {
        let doc = load_fragment("<h2>x</h2>").document;
        let assembled = Assembler::default().assemble(doc, "T").unwrap();
        let doc = &assembled.document;
        let first = doc.children(doc.root())[0];
        assert_eq!(doc.role(first), Role::Disclaimer);
        assert_eq!(doc.children(doc.root())[1], assembled.main);
    }

    #[test]
    fn test_empty_disclaimer_omitted() {
        let doc = load_fragment("<p>x</p>").document;
        let assembled = assembler("  ").assemble(doc, "T").unwrap();
        let doc = &assembled.document;
        assert_eq!(doc.children(doc.root()), &[assembled.main]);
    }

    #[test]
    fn test_outline_includes_title_and_synthetic_flags() {
        let mut doc = load_fragment("<h2>Intro</h2><h4>Deep</h4>").document;
        crate::headings::normalize_headings(&mut doc).unwrap();
        let assembled = Assembler::default().assemble(doc, "Guide").unwrap();
        let outline: Vec<(u8, &str, bool)> = assembled
            .outline
            .iter()
            .map(|e| (e.level, e.title.as_str(), e.synthetic))
            .collect();
        assert_eq!(
            outline,
            vec![
                (1, "Guide", false),
                (2, "Intro", false),
                (3, "", true),
                (4, "Deep", false)
            ]
        );
    }

    #[test]
    fn test_images_and_links_collected() {
        let mut doc = load_fragment(
            "<img src=\"a.png\" alt=\"Chart\"><img src=\"b.png\" alt=\"\"><a href=\"https://x.test\">X site</a>",
        )
        .document;
        crate::annotate::Annotator::new().annotate(&mut doc).unwrap();
        let assembled = Assembler::default().assemble(doc, "T").unwrap();

        assert_eq!(assembled.images.len(), 2);
        assert_eq!(assembled.images[0].alt, "Chart");
        assert!(!assembled.images[0].decorative);
        assert!(assembled.images[1].decorative);
        assert_eq!(
            assembled.links,
            vec![LinkAnnotation {
                href: "https://x.test".to_string(),
                label: "X site".to_string()
            }]
        );
    }

    #[test]
    fn test_full_page_html() {
        let doc = load_fragment("<p>x</p>").document;
        let assembled = Assembler::default().assemble(doc, "A <b> & C").unwrap();
        let html = assembled.to_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.contains("<title>A &lt;b&gt; &amp; C</title>"));
        assert!(html.contains(".visually-hidden {"));
        assert!(html.contains("<h1>A &lt;b&gt; &amp; C</h1>"));
    }
}
