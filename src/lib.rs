pub mod enumerator;
pub mod extraction;
pub mod extractor;
pub mod fetcher;
pub mod merge;
pub mod orchestrator;
pub mod persist;
pub mod registry;
pub mod renderer;
pub mod types;

pub use enumerator::LinkEnumerator;
pub use extraction::{AwardExtractor, MockAwardExtractor, OpenAiExtractor};
pub use extractor::{ExtractOutcome, PageExtractor};
pub use fetcher::{FetchConfig, Fetcher};
pub use merge::{MergeEngine, MergeReport};
pub use orchestrator::{BatchOrchestrator, BatchSummary, PROCESSED_MANIFEST};
pub use registry::{Feed, FeedRegistry};
pub use renderer::PageRenderer;
pub use types::*;
