//! Assembled document to Typst markup transpiler
//!
//! Walks the assembled element tree and emits Typst markup. Headings map to
//! `#heading` (PDF outline entries), images to `#image` with alternative
//! text, links to `#link` annotations and tables to captioned figures with
//! a `table.header`. Visually-hidden nodes exist for screen readers of the
//! HTML rendition and are skipped; Typst carries the same information in
//! the PDF structure tree.

use std::path::{Component, Path, PathBuf};

use printarea_core::annotate::{cells, is_header_row, table_rows, LINK_PLACEHOLDER};
use printarea_core::assemble::AssembledDocument;
use printarea_dom::{heading_level, Document, NodeId, NodeKind, Role};

/// Page and element styling shared by every document
const PREAMBLE: &str = "#set page(paper: \"a4\", margin: (x: 18mm, y: 20mm))
#set table(stroke: 0.5pt + luma(120), inset: 5pt)
#show figure.where(kind: table): set figure.caption(position: top)
#show link: underline
";

/// Elements laid out as their own block
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "summary", "table", "ul",
];

/// Image formats Typst can embed
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// Transpiler for converting assembled documents to Typst markup
#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    asset_root: Option<PathBuf>,
}

impl Transpiler {
    /// Create a transpiler that embeds no images
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve local image sources against `root`
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Transpile an assembled document to Typst markup
    pub fn transpile(&self, doc: &AssembledDocument) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "#set document(title: \"{}\")\n",
            escape_string(&doc.title)
        ));
        if let Some(language) = text_language(&doc.language) {
            output.push_str(&language);
        }
        output.push_str(PREAMBLE);
        output.push('\n');

        output.push_str(&self.transpile_blocks(&doc.document, doc.document.root()));
        output
    }

    /// Children of `parent` as a sequence of blocks and paragraphs
    fn transpile_blocks(&self, doc: &Document, parent: NodeId) -> String {
        let mut output = String::new();
        let mut paragraph = String::new();

        for child in doc.children(parent) {
            if is_block(doc, *child) {
                flush_paragraph(&mut paragraph, &mut output);
                output.push_str(&self.transpile_block(doc, *child));
            } else {
                self.transpile_inline(doc, *child, &mut paragraph);
            }
        }
        flush_paragraph(&mut paragraph, &mut output);

        output
    }

    fn transpile_block(&self, doc: &Document, node: NodeId) -> String {
        let Some(name) = doc.tag_name(node) else {
            return String::new();
        };

        match doc.role(node) {
            Role::VisuallyHidden => return String::new(),
            Role::Disclaimer => {
                return format!(
                    "#block(fill: luma(240), inset: 8pt, radius: 4pt, width: 100%)[\n{}]\n\n",
                    self.transpile_blocks(doc, node)
                );
            }
            _ => {}
        }

        if let Some(level) = heading_level(name) {
            return format!(
                "#heading(level: {})[{}]\n\n",
                level,
                self.inline_content(doc, node)
            );
        }

        match name {
            "ul" => self.transpile_list(doc, node, false),
            "ol" => self.transpile_list(doc, node, true),
            "table" => self.transpile_table(doc, node),
            "blockquote" => format!(
                "#quote(block: true)[\n{}]\n\n",
                self.transpile_blocks(doc, node)
            ),
            "pre" => format!(
                "#raw(block: true, \"{}\")\n\n",
                escape_string(doc.text_content(node).trim_end_matches('\n'))
            ),
            "hr" => "#line(length: 100%)\n\n".to_string(),
            "dt" => match self.inline_content(doc, node) {
                term if term.is_empty() => String::new(),
                term => format!("#strong[{}]\n\n", term),
            },
            "dd" => format!(
                "#pad(left: 1.5em)[\n{}]\n\n",
                self.transpile_blocks(doc, node)
            ),
            "figcaption" => match self.inline_content(doc, node) {
                caption if caption.is_empty() => String::new(),
                caption => format!("#emph[{}]\n\n", caption),
            },
            _ => self.transpile_blocks(doc, node),
        }
    }

    /// Transpile a list
    fn transpile_list(&self, doc: &Document, list: NodeId, ordered: bool) -> String {
        let items: Vec<String> = doc
            .element_children(list)
            .into_iter()
            .filter(|item| doc.is_element(*item, "li") && doc.role(*item) != Role::VisuallyHidden)
            .map(|item| format!("  [{}],\n", self.transpile_blocks(doc, item).trim()))
            .collect();
        if items.is_empty() {
            return String::new();
        }

        let function = if ordered { "enum" } else { "list" };
        let start = doc
            .attr(list, "start")
            .filter(|_| ordered)
            .and_then(|start| start.trim().parse::<u32>().ok())
            .map(|start| format!("  start: {},\n", start))
            .unwrap_or_default();
        format!("#{}(\n{}{})\n\n", function, start, items.concat())
    }

    /// Transpile a table into a captioned figure
    fn transpile_table(&self, doc: &Document, table: NodeId) -> String {
        let rows = table_rows(doc, table);
        let caption = doc
            .child_named(table, "caption")
            .map(|caption| self.inline_content(doc, caption))
            .filter(|caption| !caption.is_empty());

        if rows.is_empty() {
            return caption
                .map(|caption| format!("#emph[{}]\n\n", caption))
                .unwrap_or_default();
        }

        let columns = rows
            .iter()
            .map(|row| {
                cells(doc, *row)
                    .iter()
                    .map(|cell| span(doc, *cell, "colspan"))
                    .sum::<u32>()
            })
            .max()
            .unwrap_or(1)
            .max(1);
        let header_rows = rows.iter().take_while(|row| is_header_row(doc, **row)).count();

        let mut output = String::from("#figure(\n");
        output.push_str(&format!("  table(\n    columns: {},\n", columns));

        if header_rows > 0 {
            output.push_str("    table.header(\n");
            for row in &rows[..header_rows] {
                for cell in cells(doc, *row) {
                    output.push_str(&format!("      {},\n", self.transpile_cell(doc, cell)));
                }
            }
            output.push_str("    ),\n");
        }
        for row in &rows[header_rows..] {
            for cell in cells(doc, *row) {
                output.push_str(&format!("    {},\n", self.transpile_cell(doc, cell)));
            }
        }
        output.push_str("  ),\n");

        if let Some(caption) = caption {
            output.push_str(&format!("  caption: [{}],\n", caption));
        }
        output.push_str(")\n\n");
        output
    }

    /// Transpile a table cell, bold for `th`
    fn transpile_cell(&self, doc: &Document, cell: NodeId) -> String {
        let mut content = self.transpile_blocks(doc, cell).trim().to_string();
        if doc.is_element(cell, "th") && !content.is_empty() {
            content = format!("#strong[{}]", content);
        }

        let colspan = span(doc, cell, "colspan");
        let rowspan = span(doc, cell, "rowspan");
        if colspan > 1 || rowspan > 1 {
            format!(
                "table.cell(colspan: {}, rowspan: {})[{}]",
                colspan, rowspan, content
            )
        } else {
            format!("[{}]", content)
        }
    }

    /// Inline children of `node`, trimmed
    fn inline_content(&self, doc: &Document, node: NodeId) -> String {
        let mut output = String::new();
        for child in doc.children(node) {
            self.transpile_inline(doc, *child, &mut output);
        }
        output.trim().to_string()
    }

    fn transpile_inline(&self, doc: &Document, node: NodeId, output: &mut String) {
        let element = match doc.kind(node) {
            NodeKind::Text(text) => {
                push_text(output, text);
                return;
            }
            NodeKind::Element(element) => element,
            NodeKind::Root | NodeKind::Comment(_) => return,
        };
        if element.role == Role::VisuallyHidden {
            return;
        }

        match element.name.as_str() {
            "br" => output.push_str("#linebreak()"),
            "img" => self.transpile_image(doc, node, output),
            "a" => self.transpile_link(doc, node, output),
            "strong" | "b" => self.wrap(doc, node, "#strong", output),
            "em" | "i" | "cite" | "dfn" | "var" => self.wrap(doc, node, "#emph", output),
            "sub" => self.wrap(doc, node, "#sub", output),
            "sup" => self.wrap(doc, node, "#super", output),
            "u" | "ins" => self.wrap(doc, node, "#underline", output),
            "s" | "del" | "strike" => self.wrap(doc, node, "#strike", output),
            "mark" => self.wrap(doc, node, "#highlight", output),
            "small" => self.wrap(doc, node, "#text(size: 0.85em)", output),
            "code" | "kbd" | "samp" | "tt" => {
                let code = collapse_whitespace(&doc.text_content(node));
                if !code.is_empty() {
                    output.push_str(&format!("#raw(\"{}\")", escape_string(&code)));
                }
            }
            _ => {
                for child in doc.children(node) {
                    self.transpile_inline(doc, *child, output);
                }
            }
        }
    }

    /// Emit `function[content]`, keeping surrounding spaces outside the call
    fn wrap(&self, doc: &Document, node: NodeId, function: &str, output: &mut String) {
        let mut inner = String::new();
        for child in doc.children(node) {
            self.transpile_inline(doc, *child, &mut inner);
        }
        let content = inner.trim();
        if content.is_empty() {
            if inner.starts_with(' ') && !output.ends_with(' ') {
                output.push(' ');
            }
            return;
        }

        if inner.starts_with(' ') && !output.is_empty() && !output.ends_with(' ') {
            output.push(' ');
        }
        output.push_str(&format!("{}[{}]", function, content));
        if inner.ends_with(' ') {
            output.push(' ');
        }
    }

    fn transpile_link(&self, doc: &Document, node: NodeId, output: &mut String) {
        let href = doc.attr(node, "href").map(str::trim).unwrap_or("");
        if href.is_empty() {
            for child in doc.children(node) {
                self.transpile_inline(doc, *child, output);
            }
            return;
        }

        let mut label = self.inline_content(doc, node);
        if label.is_empty() {
            push_text(
                &mut label,
                doc.attr(node, "aria-label").unwrap_or(LINK_PLACEHOLDER),
            );
        }
        output.push_str(&format!("#link(\"{}\")[{}]", escape_string(href), label));
    }

    fn transpile_image(&self, doc: &Document, node: NodeId, output: &mut String) {
        if doc.role(node) == Role::Presentational {
            return;
        }
        let alt = doc.attr(node, "alt").map(str::trim).unwrap_or("");
        let src = doc.attr(node, "src").unwrap_or("");

        match self.resolve_image(src) {
            Some(path) => output.push_str(&format!(
                "#image(\"{}\", alt: \"{}\")",
                escape_string(&path),
                escape_string(alt)
            )),
            None => {
                let mut description = String::new();
                push_text(&mut description, if alt.is_empty() { "Image" } else { alt });
                output.push_str(&format!(
                    "#box(stroke: 0.5pt + luma(150), inset: 3pt)[#emph[{}]]",
                    description
                ));
            }
        }
    }

    /// Project path of a local image under the asset root
    fn resolve_image(&self, src: &str) -> Option<String> {
        let root = self.asset_root.as_ref()?;
        let src = src.trim();
        if src.starts_with("//") || src.contains("://") || src.starts_with("data:") {
            return None;
        }

        let path = src.split(['?', '#']).next().unwrap_or("");
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return None;
        }
        let extension = relative.extension()?.to_str()?.to_ascii_lowercase();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }
        if !root.join(relative).is_file() {
            log::debug!("Image {} not found under {}", src, root.display());
            return None;
        }

        let parts: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(format!("/{}", parts.join("/")))
    }
}

fn is_block(doc: &Document, node: NodeId) -> bool {
    match doc.tag_name(node) {
        Some(name) => {
            doc.role(node) != Role::VisuallyHidden
                && (BLOCK_ELEMENTS.contains(&name) || heading_level(name).is_some())
        }
        None => false,
    }
}

fn flush_paragraph(paragraph: &mut String, output: &mut String) {
    let text = paragraph.trim();
    if !text.is_empty() {
        output.push_str(text);
        output.push_str("\n\n");
    }
    paragraph.clear();
}

fn span(doc: &Document, cell: NodeId, attr: &str) -> u32 {
    doc.attr(cell, attr)
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(1)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// `#set text(...)` for a BCP 47 tag, if it carries a usable language
fn text_language(tag: &str) -> Option<String> {
    let mut parts = tag.trim().split(['-', '_']);
    let language = parts.next()?.to_ascii_lowercase();
    if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    match parts.next() {
        Some(region) if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(format!(
                "#set text(lang: \"{}\", region: \"{}\")\n",
                language,
                region.to_ascii_lowercase()
            ))
        }
        _ => Some(format!("#set text(lang: \"{}\")\n", language)),
    }
}

/// Append text to markup, collapsing whitespace and escaping markup syntax
fn push_text(output: &mut String, text: &str) {
    let at_start = output.trim().is_empty() || output.ends_with('[');
    let mut first = true;

    for (index, word) in text.split_ascii_whitespace().enumerate() {
        let spaced = index > 0 || text.starts_with(|c: char| c.is_ascii_whitespace());
        if spaced && !output.is_empty() && !output.ends_with(' ') {
            output.push(' ');
        }

        if first {
            // "1. " at a line start would open an enumeration
            if at_start && word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                let digits = word.chars().take_while(|c| c.is_ascii_digit()).count();
                if word[digits..].starts_with('.') {
                    output.push('\\');
                }
            }
            // A call followed by "." or "(" would continue the expression
            if matches!(word.chars().next(), Some('.' | '('))
                && (output.ends_with(']') || output.ends_with(')'))
            {
                output.push('\\');
            }
            first = false;
        }
        for c in word.chars() {
            if matches!(
                c,
                '\\' | '#' | '*' | '_' | '`' | '$' | '<' | '>' | '@' | '[' | ']' | '=' | '-' | '+'
                    | '/' | '~'
            ) {
                output.push('\\');
            }
            output.push(c);
        }
    }

    if text.ends_with(|c: char| c.is_ascii_whitespace())
        && !output.is_empty()
        && !output.ends_with(' ')
    {
        output.push(' ');
    }
}

/// Escape a Typst string literal body
fn escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use printarea_core::{Annotator, Assembler};
    use printarea_dom::load_fragment;

    fn assembled(html: &str) -> AssembledDocument {
        let mut doc = load_fragment(html).document;
        Annotator::new().annotate(&mut doc).unwrap();
        Assembler::default().assemble(doc, "Report").unwrap()
    }

    fn body(html: &str) -> String {
        let typst = Transpiler::new().transpile(&assembled(html));
        let start = typst.find("#heading(level: 1)[Report]").unwrap();
        typst[start..].to_string()
    }

    #[test]
    fn test_preamble() {
        let typst = Transpiler::new().transpile(&assembled("<p>x</p>"));
        assert!(typst.starts_with("#set document(title: \"Report\")\n#set text(lang: \"en\")\n"));
        assert!(typst.contains("#block(fill: luma(240)"));
    }

    #[test]
    fn test_headings_become_outline_entries() {
        let typst = body("<h2>Intro</h2><p>Text</p>");
        assert!(typst.contains("#heading(level: 2)[Intro]\n\nText\n\n"));
    }

    #[test]
    fn test_inline_formatting_keeps_spacing() {
        let typst = body("<p>a <b>bold</b> and <em>it</em>.</p>");
        assert!(typst.contains("a #strong[bold] and #emph[it]\\.\n"));
    }

    #[test]
    fn test_markup_characters_escaped() {
        let typst = body("<p>1. price = $5 * 2 #tag [x] see https://x.test</p>");
        assert!(typst.contains(
            "\\1. price \\= \\$5 \\* 2 \\#tag \\[x\\] see https:\\/\\/x.test"
        ));
    }

    #[test]
    fn test_link_annotation_without_hidden_suffix() {
        let typst = body("<p><a href='https://x.test/a?b=\\\"'>Docs</a></p>");
        assert!(typst.contains("#link(\"https://x.test/a?b=\\\\\\\"\")[Docs]"));
        assert!(!typst.contains("(link)"));
    }

    #[test]
    fn test_images() {
        let typst = body("<p><img src=\"remote.png\" alt=\"Sales chart\"><img src=\"x.png\" alt=\"\"></p>");
        assert!(typst.contains("#box(stroke: 0.5pt + luma(150), inset: 3pt)[#emph[Sales chart]]"));
        assert_eq!(typst.matches("#box(").count(), 1);
        assert!(!typst.contains("Decorative"));
    }

    #[test]
    fn test_local_image_resolved_under_asset_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/chart.png"), b"not checked here").unwrap();

        let transpiler = Transpiler::new().with_asset_root(dir.path());
        let doc = assembled(
            "<img src=\"/img/chart.png?v=2\" alt=\"Chart\"><img src=\"../secret.png\" alt=\"S\">",
        );
        let typst = transpiler.transpile(&doc);
        assert!(typst.contains("#image(\"/img/chart.png\", alt: \"Chart\")"));
        assert!(typst.contains("#emph[S]"));
    }

    #[test]
    fn test_table_figure() {
        let typst = body("<table><tr><td>A</td><td>B</td></tr><tr><td>1</td><td>2</td></tr></table>");
        assert!(typst.contains(
            "#figure(\n  table(\n    columns: 2,\n    table.header(\n      [#strong[A]],\n      [#strong[B]],\n    ),\n    [#strong[1]],\n    [2],\n  ),\n  caption: [Data Table],\n)\n"
        ));
    }

    #[test]
    fn test_table_spans() {
        let typst = body("<table><thead><tr><th colspan=\"2\">Wide</th></tr></thead><tbody><tr><th>a</th><td>b</td></tr></tbody></table>");
        assert!(typst.contains("columns: 2,"));
        assert!(typst.contains("table.cell(colspan: 2, rowspan: 1)[#strong[Wide]]"));
    }

    #[test]
    fn test_lists_and_quotes() {
        let typst = body("<ol start=\"3\"><li>one</li><li>two<ul><li>inner</li></ul></li></ol><blockquote><p>q</p></blockquote><hr>");
        assert!(typst.contains("#enum(\n  start: 3,\n  [one],\n  [two\n\n#list(\n  [inner],\n)],\n)\n"));
        assert!(typst.contains("#quote(block: true)[\nq\n\n]"));
        assert!(typst.contains("#line(length: 100%)"));
    }

    #[test]
    fn test_preformatted_text() {
        let typst = body("<pre>fn main() {\n    \"hi\"\n}\n</pre><p>Use <code>cargo   run</code></p>");
        assert!(typst.contains("#raw(block: true, \"fn main() {\\n    \\\"hi\\\"\\n}\")"));
        assert!(typst.contains("Use #raw(\"cargo run\")"));
    }

    #[test]
    fn test_synthetic_headings_present() {
        let mut doc = load_fragment("<h2>A</h2><h4>B</h4>").document;
        printarea_core::headings::normalize_headings(&mut doc).unwrap();
        let assembled = Assembler::default().assemble(doc, "T").unwrap();
        let typst = Transpiler::new().transpile(&assembled);
        assert!(typst.contains("#heading(level: 2)[A]\n\n#heading(level: 3)[]\n\n#heading(level: 4)[B]"));
    }

    #[test]
    fn test_text_language() {
        assert_eq!(text_language("en").as_deref(), Some("#set text(lang: \"en\")\n"));
        assert_eq!(
            text_language("de-AT").as_deref(),
            Some("#set text(lang: \"de\", region: \"at\")\n")
        );
        assert_eq!(text_language("x"), None);
        assert_eq!(text_language(""), None);
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("hello"), "hello");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("a\\b\nc"), "a\\\\b\\nc");
    }
}
