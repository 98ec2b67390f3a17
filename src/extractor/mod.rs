pub mod heuristics;
pub mod meta;
pub mod model;
pub mod pipeline;
pub mod preview;
pub mod redirect;
pub mod url;

pub use meta::{MetaTags, extract_meta_tags};
pub use model::{ArticleTag, ExtractionCandidate, Genre, Kind, Provenance, Suggestion};
pub use pipeline::{ExtractError, Pipeline};
pub use preview::{DEFAULT_PREVIEW_CHARS, extract_content_preview};
