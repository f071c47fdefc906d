use serde::{Deserialize, Deserializer, Serialize};
use validation::{Result, normalize, normalize_types};

use crate::prompt;

/// Controls what the extractor is allowed to produce for one run.
///
/// Type tags are upper-case and pairwise distinct. The schema only describes
/// the vocabulary; it does not filter extraction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSchema {
    entity_types: Vec<String>,
    relationship_types: Vec<String>,
    extraction_prompt: String,
}

impl GraphSchema {
    pub fn new<E, R>(entity_types: E, relationship_types: R, extraction_prompt: impl Into<String>) -> Result<Self>
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        Ok(Self {
            entity_types: normalize_types("entity_types", entity_types)?,
            relationship_types: normalize_types("relationship_types", relationship_types)?,
            extraction_prompt: normalize::required("extraction_prompt", extraction_prompt.into())?,
        })
    }

    pub fn entity_types(&self) -> &[String] {
        &self.entity_types
    }

    pub fn relationship_types(&self) -> &[String] {
        &self.relationship_types
    }

    pub fn extraction_prompt(&self) -> &str {
        &self.extraction_prompt
    }

    /// Case-insensitive vocabulary check.
    pub fn allows_entity_type(&self, tag: &str) -> bool {
        contains_tag(&self.entity_types, tag)
    }

    pub fn allows_relationship_type(&self, tag: &str) -> bool {
        contains_tag(&self.relationship_types, tag)
    }

    /// Prompt for one chunk, with the vocabulary and text filled in.
    pub fn render_prompt(&self, chunk_text: &str) -> String {
        prompt::render(
            &self.extraction_prompt,
            &self.entity_types,
            &self.relationship_types,
            chunk_text,
        )
    }
}

impl Default for GraphSchema {
    fn default() -> Self {
        Self {
            entity_types: prompt::DEFAULT_ENTITY_TYPES.iter().map(|t| t.to_string()).collect(),
            relationship_types: prompt::DEFAULT_RELATIONSHIP_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            extraction_prompt: prompt::DEFAULT_EXTRACTION_PROMPT.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for GraphSchema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct SchemaData {
            #[serde(default)]
            entity_types: Vec<String>,
            #[serde(default)]
            relationship_types: Vec<String>,
            extraction_prompt: String,
        }

        let data = SchemaData::deserialize(deserializer)?;
        GraphSchema::new(data.entity_types, data.relationship_types, data.extraction_prompt)
            .map_err(validation::de_error)
    }
}

fn contains_tag(tags: &[String], tag: &str) -> bool {
    let tag = tag.trim().to_uppercase();
    tags.iter().any(|t| *t == tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validation::ValidationError;

    #[test]
    fn test_types_normalized() {
        let schema = GraphSchema::new([" person", "Organization", ""], ["works_at "], "Extract: {text}").unwrap();
        assert_eq!(schema.entity_types(), ["PERSON", "ORGANIZATION"]);
        assert_eq!(schema.relationship_types(), ["WORKS_AT"]);
        assert!(schema.allows_entity_type("Person"));
        assert!(schema.allows_relationship_type(" works_at"));
        assert!(!schema.allows_entity_type("LOCATION"));
    }

    #[test]
    fn test_case_insensitive_duplicates_rejected() {
        let err = GraphSchema::new(["person", "Person"], ["USES"], "prompt").unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateTypeTag {
                field: "entity_types",
                tag: "PERSON".to_string()
            }
        );

        let err = GraphSchema::new(["PERSON"], ["uses", "USES "], "prompt").unwrap_err();
        assert_eq!(err.field(), Some("relationship_types"));
    }

    #[test]
    fn test_prompt_required() {
        let err = GraphSchema::new(["PERSON"], ["USES"], "   ").unwrap_err();
        assert_eq!(err, ValidationError::empty("extraction_prompt"));
    }

    #[test]
    fn test_prompt_is_trimmed() {
        let schema = GraphSchema::new(["PERSON"], ["USES"], "  Extract from {text}\n ").unwrap();
        assert_eq!(schema.extraction_prompt(), "Extract from {text}");
    }

    #[test]
    fn test_default_schema_is_valid() {
        let schema = GraphSchema::default();
        let rebuilt = GraphSchema::new(
            schema.entity_types(),
            schema.relationship_types(),
            schema.extraction_prompt(),
        )
        .unwrap();
        assert_eq!(rebuilt, schema);
        assert!(schema.allows_relationship_type("mentions"));
    }

    #[test]
    fn test_render_prompt() {
        let schema = GraphSchema::new(["person"], ["knows"], "Types {entity_types} / {relationship_types}\n{text}").unwrap();
        assert_eq!(schema.render_prompt("Ada met Charles."), "Types PERSON / KNOWS\nAda met Charles.");
    }

    #[test]
    fn test_deserialize_revalidates() {
        let err = serde_json::from_str::<GraphSchema>(
            r#"{"entity_types":["event","EVENT"],"relationship_types":[],"extraction_prompt":"p"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate type tag 'EVENT'"));
    }
}
