use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validation::{Properties, Result, clean_list, normalize};

/// Metadata extracted separately from the article text.
///
/// Tags and categories are trimmed and blanks dropped. Repeats are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleMetadata {
    author: Option<String>,
    publish_date: Option<DateTime<Utc>>,
    word_count: Option<u32>,
    /// Estimated reading time in minutes.
    reading_time: Option<u32>,
    tags: Vec<String>,
    categories: Vec<String>,
}

impl ArticleMetadata {
    pub fn builder() -> ArticleMetadataBuilder {
        ArticleMetadataBuilder::default()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn publish_date(&self) -> Option<DateTime<Utc>> {
        self.publish_date
    }

    pub fn word_count(&self) -> Option<u32> {
        self.word_count
    }

    pub fn reading_time(&self) -> Option<u32> {
        self.reading_time
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

#[derive(Debug, Default)]
pub struct ArticleMetadataBuilder {
    author: Option<String>,
    publish_date: Option<DateTime<Utc>>,
    word_count: Option<u32>,
    reading_time: Option<u32>,
    tags: Vec<String>,
    categories: Vec<String>,
}

impl ArticleMetadataBuilder {
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn publish_date(mut self, date: DateTime<Utc>) -> Self {
        self.publish_date = Some(date);
        self
    }

    pub fn word_count(mut self, count: u32) -> Self {
        self.word_count = Some(count);
        self
    }

    pub fn reading_time(mut self, minutes: u32) -> Self {
        self.reading_time = Some(minutes);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Nothing here is required and the counts are unsigned, so this cannot fail.
    pub fn build(self) -> ArticleMetadata {
        ArticleMetadata {
            author: normalize::optional(self.author),
            publish_date: self.publish_date,
            word_count: self.word_count,
            reading_time: self.reading_time,
            tags: clean_list(self.tags),
            categories: clean_list(self.categories),
        }
    }
}

impl<'de> Deserialize<'de> for ArticleMetadata {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct MetadataData {
            #[serde(default)]
            author: Option<String>,
            #[serde(default)]
            publish_date: Option<DateTime<Utc>>,
            #[serde(default)]
            word_count: Option<u32>,
            #[serde(default)]
            reading_time: Option<u32>,
            #[serde(default)]
            tags: Vec<String>,
            #[serde(default)]
            categories: Vec<String>,
        }

        let data = MetadataData::deserialize(deserializer)?;
        Ok(ArticleMetadataBuilder {
            author: data.author,
            publish_date: data.publish_date,
            word_count: data.word_count,
            reading_time: data.reading_time,
            tags: data.tags,
            categories: data.categories,
        }
        .build())
    }
}

/// Cleaned article content after scraping. One per page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleContent {
    url: String,
    title: String,
    text: String,
    author: Option<String>,
    publish_date: Option<DateTime<Utc>>,
    metadata: Properties,
    article_metadata: Option<ArticleMetadata>,
}

impl ArticleContent {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(url, title, text).build()
    }

    pub fn builder(
        url: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> ArticleContentBuilder {
        ArticleContentBuilder {
            url: url.into(),
            title: title.into(),
            text: text.into(),
            author: None,
            publish_date: None,
            metadata: Properties::new(),
            article_metadata: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn publish_date(&self) -> Option<DateTime<Utc>> {
        self.publish_date
    }

    pub fn metadata(&self) -> &Properties {
        &self.metadata
    }

    pub fn article_metadata(&self) -> Option<&ArticleMetadata> {
        self.article_metadata.as_ref()
    }

    /// Host part of the URL, if it parses as an absolute URL.
    pub fn domain(&self) -> Option<String> {
        crate::failure::host_of(&self.url)
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

pub struct ArticleContentBuilder {
    url: String,
    title: String,
    text: String,
    author: Option<String>,
    publish_date: Option<DateTime<Utc>>,
    metadata: Properties,
    article_metadata: Option<ArticleMetadata>,
}

impl ArticleContentBuilder {
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn publish_date(mut self, date: DateTime<Utc>) -> Self {
        self.publish_date = Some(date);
        self
    }

    pub fn metadata(mut self, metadata: Properties) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata_entry(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn article_metadata(mut self, article_metadata: ArticleMetadata) -> Self {
        self.article_metadata = Some(article_metadata);
        self
    }

    pub fn build(self) -> Result<ArticleContent> {
        Ok(ArticleContent {
            url: normalize::required("url", self.url)?,
            title: normalize::required("title", self.title)?,
            text: normalize::required("text", self.text)?,
            author: normalize::optional(self.author),
            publish_date: self.publish_date,
            metadata: self.metadata,
            article_metadata: self.article_metadata,
        })
    }
}

impl<'de> Deserialize<'de> for ArticleContent {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ContentData {
            url: String,
            title: String,
            text: String,
            #[serde(default)]
            author: Option<String>,
            #[serde(default)]
            publish_date: Option<DateTime<Utc>>,
            #[serde(default)]
            metadata: Properties,
            #[serde(default)]
            article_metadata: Option<ArticleMetadata>,
        }

        let data = ContentData::deserialize(deserializer)?;
        ArticleContentBuilder {
            url: data.url,
            title: data.title,
            text: data.text,
            author: data.author,
            publish_date: data.publish_date,
            metadata: data.metadata,
            article_metadata: data.article_metadata,
        }
        .build()
        .map_err(validation::de_error)
    }
}
