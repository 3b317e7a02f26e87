//! End-to-end pipeline tests using the HTML backend

use printarea_core::diagnostics::{EMPTY_REGION, HEADING_GAP};
use printarea_core::{
    Disposition, HtmlBackend, Pipeline, RegionSelector, RenderRequest, RequestState,
    RequestTracker, Settings,
};

fn render(request: &RenderRequest) -> (String, printarea_core::RenderOutcome) {
    let pipeline = Pipeline::new(Settings::default(), Box::new(HtmlBackend));
    let outcome = pipeline.run(request).unwrap();
    let html = String::from_utf8(outcome.document.bytes.clone()).unwrap();
    (html, outcome)
}

#[test]
fn test_heading_gap_and_bare_table() {
    let request = RenderRequest::new(
        "post-1",
        "Quarterly",
        "<h1>T</h1><h3>Sub</h3><table><tr><td>A</td></tr></table>",
    );
    let (html, outcome) = render(&request);

    assert!(html.contains("<h1>T</h1><h2></h2><h3>Sub</h3>"));
    assert!(html.contains(
        "<table role=\"table\"><caption>Data Table</caption>\
         <thead><tr><th scope=\"col\">A</th></tr></thead></table>"
    ));
    assert_eq!(outcome.report.headings_inserted, 1);
    assert_eq!(outcome.report.annotation.captions_added, 1);
    assert_eq!(outcome.report.annotation.header_rows_added, 1);
    assert!(outcome.report.has_diagnostic(HEADING_GAP));
}

#[test]
fn test_unmatched_selector_prints_whole_fragment() {
    let request = RenderRequest::new("post-2", "Hi", "<p>hi</p>")
        .with_selector(RegionSelector::new("print-area"));
    let (html, outcome) = render(&request);

    assert!(html.contains("<h1>Hi</h1><p>hi</p>"));
    assert!(outcome.report.has_diagnostic(EMPTY_REGION));
}

#[test]
fn test_region_selected_from_full_page() {
    let page = "<html><head><title>Blog</title><script>track()</script></head><body>\
        <nav><a href=\"/\">Home</a></nav>\
        <article class=\"print-area\"><h2>Post</h2><p>Read <a href=\"/more\">more</a>.</p>\
        <img src=\"chart.png\" alt=\"Sales by month\"></article>\
        <footer>footer</footer></body></html>";
    let request = RenderRequest::new("post-3", "Post", page)
        .with_selector(RegionSelector::default())
        .with_disposition(Disposition::Download);
    let (html, outcome) = render(&request);

    assert!(!html.contains("Home"));
    assert!(!html.contains("footer</footer>"));
    assert!(!html.contains("track()"));
    assert!(html.contains("aria-label=\"more\""));
    assert!(html.contains("<span class=\"visually-hidden\"> (link)</span>"));
    assert!(html.contains("aria-describedby=\"printarea-desc-1\""));
    assert!(html.contains(
        "<span id=\"printarea-desc-1\" class=\"visually-hidden\">Sales by month</span>"
    ));

    let region = outcome.report.region.unwrap();
    assert_eq!(region.count, 1);
    assert_eq!(outcome.document.filename, "post.html");
    assert_eq!(
        outcome.document.content_disposition(),
        "attachment; filename=\"post.html\""
    );
}

#[test]
fn test_decorative_image_never_gets_description() {
    let request = RenderRequest::new("post-4", "Pics", "<p><img src=\"line.png\" alt=\"\"></p>");
    let (html, outcome) = render(&request);

    assert!(html.contains("alt=\"Decorative image\""));
    assert!(html.contains("role=\"presentation\""));
    assert!(!html.contains("aria-describedby"));
    assert_eq!(outcome.report.annotation.images_decorative, 1);
}

#[test]
fn test_disclaimer_precedes_content() {
    let request = RenderRequest::new("post-5", "Doc", "<p>body</p>");
    let (html, _) = render(&request);
    let disclaimer = html.find("printarea-disclaimer\" role=\"note\"").unwrap();
    let main = html.find("<main role=\"main\">").unwrap();
    assert!(disclaimer < main);
}

#[test]
fn test_configured_disclaimer_and_language() {
    let settings = Settings::from_toml_str(
        r#"
        [document]
        disclaimer = "Generated copy"
        language = "de"
        "#,
    )
    .unwrap();
    let pipeline = Pipeline::new(settings, Box::new(HtmlBackend));
    let outcome = pipeline
        .run(&RenderRequest::new("p", "Bericht", "<p>x</p>"))
        .unwrap();
    let html = String::from_utf8(outcome.document.bytes).unwrap();
    assert!(html.contains("<html lang=\"de\">"));
    assert!(html.contains("<p>Generated copy</p>"));
}

#[test]
fn test_tracker_records_full_lifecycle() {
    let pipeline = Pipeline::new(Settings::default(), Box::new(HtmlBackend));
    let mut tracker = RequestTracker::new();
    pipeline
        .run_tracked(&RenderRequest::new("p", "T", "<p>x</p>"), &mut tracker)
        .unwrap();
    assert_eq!(tracker.state(), RequestState::Rendered);
    assert!(tracker.advance(RequestState::Parsing).is_err());
}

#[test]
fn test_entity_escaped_fragment_is_processed() {
    let request = RenderRequest::new(
        "post-6",
        "Escaped",
        "&lt;h1&gt;T&lt;/h1&gt;&lt;h3&gt;Sub&lt;/h3&gt;&lt;script&gt;steal()&lt;/script&gt;",
    );
    let (html, outcome) = render(&request);

    assert!(html.contains("<h1>T</h1><h2></h2><h3>Sub</h3>"));
    assert!(!html.contains("steal()"));
    assert_eq!(outcome.report.headings_inserted, 1);
    assert_eq!(outcome.report.sanitize.elements_removed, 1);
}
