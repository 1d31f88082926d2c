use awards_aggregator::types::AggregatorError;
use awards_aggregator::{ExtractOutcome, ExtractedParagraph, PageExtractor, PageRenderer};
use std::fs;
use std::sync::Once;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

const PAGE: &str = r#"<html>
<head><title>Release</title></head>
<body>
  <h1> Contracts For July 1, 2025 </h1>
  <div class="body">
    <p>Acme Corp, Springfield, Virginia, was awarded a $7,600,000 contract.</p>
    <p style="text-align: right;">Media inquiries: press desk</p>
    <p align="center">***</p>
    <p>   </p>
    <p>Beta LLC, Norfolk, Virginia, was awarded a $12,000,000 contract.</p>
  </div>
</body>
</html>"#;

fn renderer() -> PageRenderer {
    // Never contacted: these tests drive extract_from_html directly.
    PageRenderer::new("http://localhost:3000", None)
}

#[test]
fn extracts_award_paragraphs_with_normalized_date() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let renderer = renderer();
    let extractor = PageExtractor::new(&renderer, dir.path());

    let outcome = extractor
        .extract_from_html("https://example.gov/contracts/july-1", PAGE)
        .unwrap();

    let path = match outcome {
        ExtractOutcome::Written { path, paragraphs } => {
            assert_eq!(paragraphs, 2);
            path
        }
        other => panic!("expected Written, got {:?}", other),
    };

    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("Contracts_For_July_1_2025.json")
    );

    let content = fs::read_to_string(&path).unwrap();
    let records: Vec<ExtractedParagraph> = serde_json::from_str(&content).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].text.starts_with("Acme Corp"));
    assert!(records[1].text.starts_with("Beta LLC"));
    assert!(records.iter().all(|r| r.contract_date == "2025-07-01"));

    // Aligned boilerplate and blank paragraphs never make it in.
    assert!(!content.contains("Media inquiries"));
    assert!(!content.contains("***"));
}

#[test]
fn existing_artifact_is_left_untouched() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let renderer = renderer();
    let extractor = PageExtractor::new(&renderer, dir.path());

    let first = extractor
        .extract_from_html("https://example.gov/contracts/july-1", PAGE)
        .unwrap();
    let path = match first {
        ExtractOutcome::Written { path, .. } => path,
        other => panic!("expected Written, got {:?}", other),
    };

    // Overwrite with a sentinel; a second extraction must not replace it.
    fs::write(&path, "[{\"text\":\"sentinel\",\"contract_date\":\"2025-07-01\"}]").unwrap();

    let second = extractor
        .extract_from_html("https://example.gov/contracts/july-1", PAGE)
        .unwrap();
    match second {
        ExtractOutcome::Skipped { path: skipped } => assert_eq!(skipped, path),
        other => panic!("expected Skipped, got {:?}", other),
    }

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("sentinel"));
}

#[test]
fn page_without_body_region_fails_for_that_link_only() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let renderer = renderer();
    let extractor = PageExtractor::new(&renderer, dir.path());

    let html = "<html><body><h1>Contracts For July 1, 2025</h1><p>text</p></body></html>";
    match extractor.extract_from_html("https://example.gov/x", html) {
        Err(AggregatorError::MissingBodyRegion { url }) => {
            assert_eq!(url, "https://example.gov/x")
        }
        other => panic!("expected MissingBodyRegion, got {:?}", other),
    }
}

#[test]
fn page_without_heading_fails_for_that_link_only() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let renderer = renderer();
    let extractor = PageExtractor::new(&renderer, dir.path());

    let html = "<html><body><div class=\"body\"><p>text</p></div></body></html>";
    match extractor.extract_from_html("https://example.gov/x", html) {
        Err(AggregatorError::MissingHeading { .. }) => {}
        other => panic!("expected MissingHeading, got {:?}", other),
    }
}

#[test]
fn title_without_a_date_is_an_explicit_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let renderer = renderer();
    let extractor = PageExtractor::new(&renderer, dir.path());

    let html = "<html><body><h1>Archive</h1><div class=\"body\"><p>text</p></div></body></html>";
    match extractor.extract_from_html("https://example.gov/x", html) {
        Err(AggregatorError::UnparsableDate { title }) => assert_eq!(title, "Archive"),
        other => panic!("expected UnparsableDate, got {:?}", other),
    }

    // Nothing was written for the failed link.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
