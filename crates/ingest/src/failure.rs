use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use validation::{Result, ValidationError, normalize};

use crate::article::ArticleContent;

/// Record of one failed scrape, logged instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapingFailure {
    timestamp: DateTime<Utc>,
    url: String,
    domain: String,
    failure_type: String,
    http_status: Option<u16>,
    error_message: Option<String>,
}

impl ScrapingFailure {
    pub fn new(
        url: impl Into<String>,
        domain: impl Into<String>,
        failure_type: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(url, domain, failure_type).build()
    }

    /// Same as [`ScrapingFailure::new`] with the domain taken from the URL host.
    pub fn for_url(url: impl Into<String>, failure_type: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let domain = host_of(&url).ok_or(ValidationError::empty("domain"))?;
        Self::new(url, domain, failure_type)
    }

    pub fn builder(
        url: impl Into<String>,
        domain: impl Into<String>,
        failure_type: impl Into<String>,
    ) -> ScrapingFailureBuilder {
        ScrapingFailureBuilder {
            timestamp: None,
            url: url.into(),
            domain: domain.into(),
            failure_type: failure_type.into(),
            http_status: None,
            error_message: None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn failure_type(&self) -> &str {
        &self.failure_type
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

pub struct ScrapingFailureBuilder {
    timestamp: Option<DateTime<Utc>>,
    url: String,
    domain: String,
    failure_type: String,
    http_status: Option<u16>,
    error_message: Option<String>,
}

impl ScrapingFailureBuilder {
    /// Defaults to the time `build` is called.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn build(self) -> Result<ScrapingFailure> {
        Ok(ScrapingFailure {
            url: normalize::required("url", self.url)?,
            domain: normalize::required("domain", self.domain)?,
            failure_type: normalize::required("failure_type", self.failure_type)?,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            http_status: self.http_status,
            error_message: normalize::optional(self.error_message),
        })
    }
}

impl<'de> Deserialize<'de> for ScrapingFailure {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct FailureData {
            #[serde(default)]
            timestamp: Option<DateTime<Utc>>,
            url: String,
            domain: String,
            failure_type: String,
            #[serde(default)]
            http_status: Option<u16>,
            #[serde(default)]
            error_message: Option<String>,
        }

        let data = FailureData::deserialize(deserializer)?;
        ScrapingFailureBuilder {
            timestamp: data.timestamp,
            url: data.url,
            domain: data.domain,
            failure_type: data.failure_type,
            http_status: data.http_status,
            error_message: data.error_message,
        }
        .build()
        .map_err(validation::de_error)
    }
}

/// What the scraper hands back for one page: content or a failure, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScrapeOutcome {
    Scraped(ArticleContent),
    Failed(ScrapingFailure),
}

impl ScrapeOutcome {
    pub fn url(&self) -> &str {
        match self {
            ScrapeOutcome::Scraped(article) => article.url(),
            ScrapeOutcome::Failed(failure) => failure.url(),
        }
    }

    pub fn article(&self) -> Option<&ArticleContent> {
        match self {
            ScrapeOutcome::Scraped(article) => Some(article),
            ScrapeOutcome::Failed(_) => None,
        }
    }
}

/// Append-only list of scrape failures for one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureLog {
    entries: Vec<ScrapingFailure>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, failure: ScrapingFailure) {
        warn!(
            url = %failure.url,
            domain = %failure.domain,
            failure_type = %failure.failure_type,
            http_status = ?failure.http_status,
            "Scrape failed"
        );
        self.entries.push(failure);
    }

    /// Split a batch of outcomes into articles, recording every failure.
    pub fn collect<I>(&mut self, outcomes: I) -> Vec<ArticleContent>
    where
        I: IntoIterator<Item = ScrapeOutcome>,
    {
        let mut articles = Vec::new();
        for outcome in outcomes {
            match outcome {
                ScrapeOutcome::Scraped(article) => articles.push(article),
                ScrapeOutcome::Failed(failure) => self.record(failure),
            }
        }
        articles
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScrapingFailure> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Failure counts per domain, sorted by domain.
    pub fn by_domain(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.entries {
            *counts.entry(failure.domain()).or_insert(0) += 1;
        }
        counts
    }
}

pub(crate) fn host_of(raw: &str) -> Option<String> {
    url::Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}
