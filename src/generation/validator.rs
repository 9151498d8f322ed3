use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names an article must carry, in wire order.
pub const ARTICLE_FIELDS: [&str; 5] = ["title", "intro", "body", "conclusion", "summary_table"];

/// A generated blog post that passed shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub intro: String,
    pub body: String,
    pub conclusion: String,
    pub summary_table: String,
}

/// Outcome of decoding one raw answer from the generative API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Valid(GeneratedArticle),
    /// The text was not a JSON document.
    ParseFailure(String),
    /// Valid JSON, but not an article.
    ShapeFailure(String),
}

impl AttemptResult {
    pub fn decode(raw: String) -> Self {
        match serde_json::from_str::<Value>(&raw) {
            Err(_) => AttemptResult::ParseFailure(raw),
            Ok(value) => match validate_article(&value) {
                Some(article) => AttemptResult::Valid(article),
                None => AttemptResult::ShapeFailure(raw),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, AttemptResult::Valid(_))
    }

    /// Raw model output for failed attempts.
    pub fn raw(&self) -> Option<&str> {
        match self {
            AttemptResult::Valid(_) => None,
            AttemptResult::ParseFailure(raw) | AttemptResult::ShapeFailure(raw) => Some(raw),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AttemptResult::Valid(_) => "valid",
            AttemptResult::ParseFailure(_) => "parse_failure",
            AttemptResult::ShapeFailure(_) => "shape_failure",
        }
    }
}

/// Check that `value` is an object whose five article fields are all
/// non-blank strings. Content is returned untouched; extra keys are ignored.
pub fn validate_article(value: &Value) -> Option<GeneratedArticle> {
    let object = value.as_object()?;
    let field = |name: &str| -> Option<String> {
        object
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    Some(GeneratedArticle {
        title: field("title")?,
        intro: field("intro")?,
        body: field("body")?,
        conclusion: field("conclusion")?,
        summary_table: field("summary_table")?,
    })
}

pub fn is_valid_article(value: &Value) -> bool {
    validate_article(value).is_some()
}
