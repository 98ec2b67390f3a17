use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inclusive bounds a publication year must fall in to be kept.
pub const YEAR_MIN: i32 = 1900;
pub const YEAR_MAX: i32 = 2100;
/// Inclusive bounds for a book's page count.
pub const PAGES_MIN: u32 = 1;
pub const PAGES_MAX: u32 = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Book,
    #[default]
    Article,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Book => "book",
            Kind::Article => "article",
        }
    }

    /// Anything that isn't exactly one of the two kinds is an article.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "book" => Kind::Book,
            _ => Kind::Article,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Fantasy,
    SciFi,
    Romance,
    Mystery,
    Nonfiction,
    History,
    Biography,
    SelfHelp,
    Business,
    Technology,
    Unknown,
}

impl Genre {
    /// The closed vocabulary offered to the model, `unknown` included.
    pub const ALL: [Genre; 11] = [
        Genre::Fantasy,
        Genre::SciFi,
        Genre::Romance,
        Genre::Mystery,
        Genre::Nonfiction,
        Genre::History,
        Genre::Biography,
        Genre::SelfHelp,
        Genre::Business,
        Genre::Technology,
        Genre::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Fantasy => "fantasy",
            Genre::SciFi => "sci-fi",
            Genre::Romance => "romance",
            Genre::Mystery => "mystery",
            Genre::Nonfiction => "nonfiction",
            Genre::History => "history",
            Genre::Biography => "biography",
            Genre::SelfHelp => "self-help",
            Genre::Business => "business",
            Genre::Technology => "technology",
            Genre::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|g| g.as_str() == needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleTag {
    Ai,
    Programming,
    Webdev,
    Security,
    Cloud,
    Databases,
    Startups,
    Product,
    Research,
}

impl ArticleTag {
    pub const ALL: [ArticleTag; 9] = [
        ArticleTag::Ai,
        ArticleTag::Programming,
        ArticleTag::Webdev,
        ArticleTag::Security,
        ArticleTag::Cloud,
        ArticleTag::Databases,
        ArticleTag::Startups,
        ArticleTag::Product,
        ArticleTag::Research,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArticleTag::Ai => "ai",
            ArticleTag::Programming => "programming",
            ArticleTag::Webdev => "webdev",
            ArticleTag::Security => "security",
            ArticleTag::Cloud => "cloud",
            ArticleTag::Databases => "databases",
            ArticleTag::Startups => "startups",
            ArticleTag::Product => "product",
            ArticleTag::Research => "research",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == needle)
    }
}

/// Which tier produced a candidate. `Mixed` is part of the wire vocabulary
/// but nothing produces it yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Heuristic,
    Llm,
    Mixed,
}

/// A reading item as understood by the pipeline. Built fresh per request and
/// dropped once turned into a [`Suggestion`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    pub kind: Kind,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Genre>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<ArticleTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub source: Provenance,
}

impl ExtractionCandidate {
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Good enough to answer without asking the model: a title plus either an
    /// author or a year.
    pub fn is_sufficient(&self) -> bool {
        self.has_title() && (!self.authors.is_empty() || self.year.is_some())
    }
}

pub fn year_in_range(year: i64) -> Option<i32> {
    (i64::from(YEAR_MIN)..=i64::from(YEAR_MAX))
        .contains(&year)
        .then_some(year as i32)
}

pub fn pages_in_range(pages: i64) -> Option<u32> {
    (i64::from(PAGES_MIN)..=i64::from(PAGES_MAX))
        .contains(&pages)
        .then_some(pages as u32)
}

/// Flattened, form-ready projection of an [`ExtractionCandidate`]. Every
/// field is a string; lists are comma-joined and absent values are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub author: String,
    pub publication: String,
    pub year: String,
    pub pages: String,
    pub genre: String,
    pub tags: String,
    pub description: String,
}

impl From<ExtractionCandidate> for Suggestion {
    fn from(candidate: ExtractionCandidate) -> Self {
        let genre = match candidate.genre {
            Some(Genre::Unknown) | None => String::new(),
            Some(genre) => genre.as_str().to_string(),
        };

        Self {
            kind: candidate.kind.as_str().to_string(),
            title: candidate.title,
            author: candidate.authors.join(", "),
            publication: candidate.publication.unwrap_or_default(),
            year: candidate.year.map(|y| y.to_string()).unwrap_or_default(),
            pages: candidate.pages.map(|p| p.to_string()).unwrap_or_default(),
            genre,
            tags: candidate
                .tags
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            description: candidate.description.unwrap_or_default(),
        }
    }
}
