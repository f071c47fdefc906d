use serde::{Deserialize, Deserializer, Serialize};
use validation::{Result, normalize};

/// One span of article text sent to the extractor.
///
/// `source_url` is a back-reference to the article, not ownership of it.
/// Positions are expected to form a gap-free 0-based run per article; that
/// is the chunker's job and is not checked here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextChunk {
    chunk_id: String,
    text: String,
    position: usize,
    token_count: usize,
    source_url: String,
}

impl TextChunk {
    pub fn new(
        text: impl Into<String>,
        position: usize,
        token_count: usize,
        source_url: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(text, source_url)
            .position(position)
            .token_count(token_count)
            .build()
    }

    pub fn builder(text: impl Into<String>, source_url: impl Into<String>) -> TextChunkBuilder {
        TextChunkBuilder {
            chunk_id: None,
            text: text.into(),
            position: 0,
            token_count: None,
            source_url: source_url.into(),
        }
    }

    /// Estimate token count (rough: 1.3 tokens per word)
    pub fn estimate_tokens(text: &str) -> usize {
        let word_count = text.split_whitespace().count();
        (word_count as f64 * 1.3) as usize
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

pub struct TextChunkBuilder {
    chunk_id: Option<String>,
    text: String,
    position: usize,
    token_count: Option<usize>,
    source_url: String,
}

impl TextChunkBuilder {
    pub fn chunk_id(mut self, id: impl Into<String>) -> Self {
        self.chunk_id = Some(id.into());
        self
    }

    pub fn position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Without an explicit count the estimate from the trimmed text is used.
    pub fn token_count(mut self, token_count: usize) -> Self {
        self.token_count = Some(token_count);
        self
    }

    pub fn build(self) -> Result<TextChunk> {
        let chunk_id = normalize::id_or_generate("chunk_id", self.chunk_id)?;
        let text = normalize::required("text", self.text)?;
        let source_url = normalize::required("source_url", self.source_url)?;
        let token_count = self
            .token_count
            .unwrap_or_else(|| TextChunk::estimate_tokens(&text));

        Ok(TextChunk {
            chunk_id,
            text,
            position: self.position,
            token_count,
            source_url,
        })
    }
}

impl<'de> Deserialize<'de> for TextChunk {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ChunkData {
            #[serde(default)]
            chunk_id: Option<String>,
            text: String,
            position: usize,
            token_count: usize,
            source_url: String,
        }

        let data = ChunkData::deserialize(deserializer)?;
        let mut builder = TextChunk::builder(data.text, data.source_url)
            .position(data.position)
            .token_count(data.token_count);
        if let Some(id) = data.chunk_id {
            builder = builder.chunk_id(id);
        }
        builder.build().map_err(validation::de_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validation::ValidationError;

    #[test]
    fn test_text_is_trimmed() {
        let chunk = TextChunk::new("  Some text.  ", 0, 3, " https://example.com/a ").unwrap();
        assert_eq!(chunk.text(), "Some text.");
        assert_eq!(chunk.source_url(), "https://example.com/a");
        assert_eq!(chunk.position(), 0);
        assert_eq!(chunk.token_count(), 3);
    }

    #[test]
    fn test_blank_text_rejected() {
        let err = TextChunk::new("   ", 0, 0, "https://example.com").unwrap_err();
        assert_eq!(err, ValidationError::empty("text"));
    }

    #[test]
    fn test_blank_source_rejected() {
        let err = TextChunk::new("text", 0, 1, "").unwrap_err();
        assert_eq!(err, ValidationError::empty("source_url"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = TextChunk::new("same", 0, 1, "u").unwrap();
        let b = TextChunk::new("same", 0, 1, "u").unwrap();
        assert_ne!(a.chunk_id(), b.chunk_id());
    }

    #[test]
    fn test_token_estimate_used_when_missing() {
        let chunk = TextChunk::builder("one two three four five six seven eight nine ten", "u")
            .position(4)
            .build()
            .unwrap();
        assert_eq!(chunk.token_count(), 13);
        assert_eq!(chunk.position(), 4);
    }

    #[test]
    fn test_deserialize_revalidates() {
        let json = r#"{"chunk_id":"c1","text":"  ","position":0,"token_count":0,"source_url":"u"}"#;
        let err = serde_json::from_str::<TextChunk>(json).unwrap_err();
        assert!(err.to_string().contains("'text' must not be empty"));

        let json = r#"{"chunk_id":"c1","text":"x","position":-1,"token_count":0,"source_url":"u"}"#;
        assert!(serde_json::from_str::<TextChunk>(json).is_err());
    }

    #[test]
    fn test_round_trip() {
        let chunk = TextChunk::builder("Rust is fast.", "https://example.com/rust")
            .chunk_id("c-7")
            .position(2)
            .token_count(4)
            .build()
            .unwrap();
        let json = serde_json::to_string(&chunk).unwrap();
        let back: TextChunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }
}
