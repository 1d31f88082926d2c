use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One feed entry awaiting processing: the announcement page title and the
/// link to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementLink {
    pub title: String,
    pub link: String,
}

/// A single paragraph of award text pulled from an announcement page, tagged
/// with the announcement date parsed from the page title. Artifact files are
/// JSON arrays of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedParagraph {
    pub text: String,
    pub contract_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Contractor {
    pub name: String,
    pub contract_id: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContractingAgency {
    pub name: String,
    pub location: String,
}

/// Payload the structured-extraction service returns for one paragraph of
/// award text. `contract_date` and `award_text` are attached by the pipeline
/// afterwards; the service never sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AwardDetails {
    pub contractors: Vec<Contractor>,
    pub purpose: String,
    pub amount: f64,
    pub contracting_agency: ContractingAgency,
}

/// One record of the master awards dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAward {
    pub contractors: Vec<Contractor>,
    pub purpose: String,
    pub amount: f64,
    pub contracting_agency: ContractingAgency,
    pub contract_date: String,
    pub award_text: String,
}

impl StructuredAward {
    pub fn new(details: AwardDetails, contract_date: String, award_text: String) -> Self {
        Self {
            contractors: details.contractors,
            purpose: details.purpose,
            amount: details.amount,
            contracting_agency: details.contracting_agency,
            contract_date,
            award_text,
        }
    }

    /// Identity used to decide whether this award is already in the master
    /// dataset: first contractor name (case-folded) plus contract date, or
    /// the full award text when no contractor was extracted.
    pub fn dedup_key(&self) -> (String, String) {
        match self.contractors.first() {
            Some(contractor) => (contractor.name.to_lowercase(), self.contract_date.clone()),
            None => (self.award_text.to_lowercase(), self.contract_date.clone()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unknown feed: {name}")]
    UnknownFeed { name: String },

    #[error("No body region found on page: {url}")]
    MissingBodyRegion { url: String },

    #[error("No heading found on page: {url}")]
    MissingHeading { url: String },

    #[error("Could not parse a date from title: {title}")]
    UnparsableDate { title: String },

    #[error("Structured extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Renderer error (status {status}): {message}")]
    Render { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn award(contractors: Vec<Contractor>, date: &str, text: &str) -> StructuredAward {
        StructuredAward {
            contractors,
            purpose: "maintenance".to_string(),
            amount: 1_000_000.0,
            contracting_agency: ContractingAgency {
                name: "Defense Logistics Agency".to_string(),
                location: "Fort Belvoir, Virginia".to_string(),
            },
            contract_date: date.to_string(),
            award_text: text.to_string(),
        }
    }

    #[test]
    fn dedup_key_uses_first_contractor() {
        let record = award(
            vec![
                Contractor {
                    name: "Acme Corp".to_string(),
                    contract_id: "W912DY-25-C-0001".to_string(),
                    location: "Springfield, VA".to_string(),
                },
                Contractor {
                    name: "Other Inc".to_string(),
                    contract_id: String::new(),
                    location: String::new(),
                },
            ],
            "2025-07-01",
            "Acme Corp was awarded ...",
        );

        assert_eq!(
            record.dedup_key(),
            ("acme corp".to_string(), "2025-07-01".to_string())
        );
    }

    #[test]
    fn dedup_key_falls_back_to_award_text() {
        let record = award(Vec::new(), "2025-07-01", "An UPDATE to a prior award");
        assert_eq!(
            record.dedup_key(),
            ("an update to a prior award".to_string(), "2025-07-01".to_string())
        );
    }
}
