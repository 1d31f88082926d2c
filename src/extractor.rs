use crate::persist;
use crate::renderer::PageRenderer;
use crate::types::{AggregatorError, ExtractedParagraph, Result};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of processing one announcement link.
#[derive(Debug)]
pub enum ExtractOutcome {
    /// A new artifact was written.
    Written { path: PathBuf, paragraphs: usize },
    /// An artifact for this title already exists and stays authoritative.
    Skipped { path: PathBuf },
}

/// Renders one announcement page and persists its award paragraphs as a
/// per-day extraction artifact, keyed by the sanitized page title.
pub struct PageExtractor<'a> {
    renderer: &'a PageRenderer,
    output_dir: PathBuf,
    body: Selector,
    heading: Selector,
    paragraph: Selector,
}

impl<'a> PageExtractor<'a> {
    pub fn new(renderer: &'a PageRenderer, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            output_dir: output_dir.into(),
            body: Selector::parse("div.body").expect("body selector"),
            heading: Selector::parse("h1").expect("heading selector"),
            paragraph: Selector::parse("p").expect("paragraph selector"),
        }
    }

    /// Render the page and extract. Skips without touching anything if the
    /// artifact for this page already exists.
    pub async fn extract(&self, link: &str) -> Result<ExtractOutcome> {
        let html = self.renderer.content(link).await?;
        self.extract_from_html(link, &html)
    }

    /// Everything after the page has been rendered. Split out so tests can
    /// drive the extraction from static HTML.
    pub fn extract_from_html(&self, link: &str, html: &str) -> Result<ExtractOutcome> {
        let document = Html::parse_document(html);

        let body = document
            .select(&self.body)
            .next()
            .ok_or_else(|| AggregatorError::MissingBodyRegion {
                url: link.to_string(),
            })?;

        let raw_title = document
            .select(&self.heading)
            .next()
            .map(element_text)
            .ok_or_else(|| AggregatorError::MissingHeading {
                url: link.to_string(),
            })?;

        let page_title = sanitize_filename(&raw_title);
        let contract_date = parse_title_date(&page_title)?;

        let out_path = self.output_dir.join(format!("{}.json", page_title));
        if out_path.exists() {
            info!(
                "Artifact {} already exists, skipping extraction",
                out_path.display()
            );
            return Ok(ExtractOutcome::Skipped { path: out_path });
        }

        let paragraphs: Vec<ExtractedParagraph> = body
            .select(&self.paragraph)
            .filter(|p| !is_alignment_boilerplate(p))
            .map(element_text)
            .filter(|text| !text.is_empty())
            .map(|text| ExtractedParagraph {
                text,
                contract_date: contract_date.clone(),
            })
            .collect();

        fs::create_dir_all(&self.output_dir)?;
        persist::write_json_atomic(&out_path, &paragraphs)?;
        info!(
            "Extracted {} paragraph(s) from {:?} into {}",
            paragraphs.len(),
            raw_title,
            out_path.display()
        );

        Ok(ExtractOutcome::Written {
            path: out_path,
            paragraphs: paragraphs.len(),
        })
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// The source marks boilerplate (attribution lines, separators) with right
/// or centered alignment on the paragraph itself.
fn is_alignment_boilerplate(paragraph: &ElementRef) -> bool {
    let element = paragraph.value();

    if let Some(align) = element.attr("align") {
        let align = align.to_ascii_lowercase();
        if align == "right" || align == "center" {
            return true;
        }
    }

    if let Some(style) = element.attr("style") {
        let style = style.to_ascii_lowercase().replace(' ', "");
        if style.contains("text-align:right") || style.contains("text-align:center") {
            return true;
        }
    }

    false
}

/// Replace spaces with underscores and strip everything that is not
/// alphanumeric, underscore, hyphen, or dot.
pub fn sanitize_filename(name: &str) -> String {
    name.trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

/// Announcement titles end in a date ("Contracts For July 1, 2025", i.e.
/// `Contracts_For_July_1_2025` once sanitized). Read the trailing
/// month-name, day and year tokens and normalize to ISO-8601.
pub fn parse_title_date(sanitized_title: &str) -> Result<String> {
    let tokens: Vec<&str> = sanitized_title
        .split('_')
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.len() < 3 {
        return Err(AggregatorError::UnparsableDate {
            title: sanitized_title.to_string(),
        });
    }

    let composed = tokens[tokens.len() - 3..].join(" ");
    debug!("Parsing title date from {:?}", composed);

    NaiveDate::parse_from_str(&composed, "%B %e %Y")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| AggregatorError::UnparsableDate {
            title: sanitized_title.to_string(),
        })
}
