pub const ENTITY_TYPES_PLACEHOLDER: &str = "{entity_types}";
pub const RELATIONSHIP_TYPES_PLACEHOLDER: &str = "{relationship_types}";
pub const TEXT_PLACEHOLDER: &str = "{text}";

pub const DEFAULT_ENTITY_TYPES: &[&str] = &[
    "PERSON",
    "ORGANIZATION",
    "CONCEPT",
    "TECHNOLOGY",
    "LOCATION",
    "EVENT",
];

pub const DEFAULT_RELATIONSHIP_TYPES: &[&str] =
    &["CREATES", "USES", "AFFECTS", "MANAGES", "CONTAINS", "MENTIONS"];

pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Extract entities and relationships from the following text.

INSTRUCTIONS:
1. Identify key entities
2. Extract relationships between entities
3. Output ONLY valid JSON, nothing else
4. Use the exact schema below

SCHEMA:
{
  "entities": [
    {"id": "E1", "name": "EntityName", "type": "ENTITY_TYPE", "properties": {"description": "brief description"}}
  ],
  "relationships": [
    {"source": "E1", "target": "E2", "type": "RELATIONSHIP_TYPE", "properties": {"evidence": "quote from text"}}
  ]
}

RULES:
- Use sequential IDs: E1, E2, E3, etc.
- Entity types must be one of: {entity_types}
- Relationship types must be one of: {relationship_types}
- A relationship must connect two different entities
- Evidence must be a direct quote from the text
- Output ONLY the JSON object, no markdown, no explanations

TEXT:
{text}

JSON OUTPUT:"#;

/// Fill a prompt template. Placeholders missing from the template are skipped.
pub fn render(template: &str, entity_types: &[String], relationship_types: &[String], text: &str) -> String {
    // Text is substituted last: placeholders inside the chunk are never expanded.
    template
        .replace(ENTITY_TYPES_PLACEHOLDER, &entity_types.join(", "))
        .replace(RELATIONSHIP_TYPES_PLACEHOLDER, &relationship_types.join(", "))
        .replace(TEXT_PLACEHOLDER, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        let prompt = render(
            DEFAULT_EXTRACTION_PROMPT,
            &["PERSON".to_string(), "EVENT".to_string()],
            &["ATTENDS".to_string()],
            "Ada attended the conference.",
        );
        assert!(prompt.contains("Entity types must be one of: PERSON, EVENT"));
        assert!(prompt.contains("Relationship types must be one of: ATTENDS"));
        assert!(prompt.contains("TEXT:\nAda attended the conference."));
        assert!(!prompt.contains(TEXT_PLACEHOLDER));
    }

    #[test]
    fn test_text_containing_placeholder_untouched() {
        let prompt = render("{text}", &["PERSON".to_string()], &[], "literal {entity_types}");
        assert_eq!(prompt, "literal {entity_types}");
    }
}
