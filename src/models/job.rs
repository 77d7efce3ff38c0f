use serde::{Deserialize, Serialize};

/// One normalized job posting. Each source fills the subset of fields it
/// actually exposes; `title` and `source` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    pub url: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JobRecord {
    /// True iff any keyword is a case-insensitive substring of the
    /// record's title, organization or description. No tokenization,
    /// plain containment.
    pub fn matches(&self, keywords: &[String]) -> bool {
        let haystack = format!(
            "{} {} {}",
            self.title,
            self.organization.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
        )
        .to_lowercase();

        keywords
            .iter()
            .any(|keyword| haystack.contains(&keyword.to_lowercase()))
    }
}
