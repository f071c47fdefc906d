use serde::{Deserialize, Deserializer, Serialize};
use validation::{Properties, Result, ValidationError, normalize};

/// Graph node extracted from text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    id: String,
    name: String,
    #[serde(rename = "type")]
    entity_type: String,
    properties: Properties,
    /// How many times the entity was seen. Always at least 1.
    mentions: u32,
}

impl Entity {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Result<Self> {
        Self::builder(name, entity_type).build()
    }

    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(name, entity_type).id(id).build()
    }

    pub fn builder(name: impl Into<String>, entity_type: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            id: None,
            name: name.into(),
            entity_type: entity_type.into(),
            properties: Properties::new(),
            mentions: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn mentions(&self) -> u32 {
        self.mentions
    }
}

pub struct EntityBuilder {
    id: Option<String>,
    name: String,
    entity_type: String,
    properties: Properties,
    mentions: u32,
}

impl EntityBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn mentions(mut self, mentions: u32) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn build(self) -> Result<Entity> {
        let id = normalize::id_or_generate("id", self.id)?;
        let name = normalize::required("name", self.name)?;
        let entity_type = normalize::required("type", self.entity_type)?;
        if self.mentions < 1 {
            return Err(ValidationError::BelowMinimum {
                field: "mentions",
                value: u64::from(self.mentions),
                min: 1,
            });
        }

        Ok(Entity {
            id,
            name,
            entity_type,
            properties: self.properties,
            mentions: self.mentions,
        })
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct EntityData {
            #[serde(default)]
            id: Option<String>,
            name: String,
            #[serde(rename = "type")]
            entity_type: String,
            #[serde(default)]
            properties: Properties,
            #[serde(default = "default_mentions")]
            mentions: u32,
        }

        let data = EntityData::deserialize(deserializer)?;
        EntityBuilder {
            id: data.id,
            name: data.name,
            entity_type: data.entity_type,
            properties: data.properties,
            mentions: data.mentions,
        }
        .build()
        .map_err(validation::de_error)
    }
}

fn default_mentions() -> u32 {
    1
}

/// Directed, typed edge between two different entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    id: String,
    source: String,
    target: String,
    #[serde(rename = "type")]
    relationship_type: String,
    properties: Properties,
}

impl Relationship {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship_type: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(source, target, relationship_type).build()
    }

    pub fn builder(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship_type: impl Into<String>,
    ) -> RelationshipBuilder {
        RelationshipBuilder {
            id: None,
            source: source.into(),
            target: target.into(),
            relationship_type: relationship_type.into(),
            properties: Properties::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn relationship_type(&self) -> &str {
        &self.relationship_type
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// True when either end is `entity_id`.
    pub fn touches(&self, entity_id: &str) -> bool {
        self.source == entity_id || self.target == entity_id
    }
}

pub struct RelationshipBuilder {
    id: Option<String>,
    source: String,
    target: String,
    relationship_type: String,
    properties: Properties,
}

impl RelationshipBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn build(self) -> Result<Relationship> {
        let id = normalize::id_or_generate("id", self.id)?;
        let source = normalize::required("source", self.source)?;
        let target = normalize::required("target", self.target)?;
        if source == target {
            return Err(ValidationError::SelfReference { id: source });
        }
        let relationship_type = normalize::required("type", self.relationship_type)?;

        Ok(Relationship {
            id,
            source,
            target,
            relationship_type,
            properties: self.properties,
        })
    }
}

impl<'de> Deserialize<'de> for Relationship {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RelationshipData {
            #[serde(default)]
            id: Option<String>,
            source: String,
            target: String,
            #[serde(rename = "type")]
            relationship_type: String,
            #[serde(default)]
            properties: Properties,
        }

        let data = RelationshipData::deserialize(deserializer)?;
        RelationshipBuilder {
            id: data.id,
            source: data.source,
            target: data.target,
            relationship_type: data.relationship_type,
            properties: data.properties,
        }
        .build()
        .map_err(validation::de_error)
    }
}

/// Entities and relationships extracted from a single text chunk.
///
/// Relationships may point at entities from earlier chunks, so nothing is
/// cross-checked here; that happens when the extraction is merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphExtraction {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    chunk_id: String,
}

impl GraphExtraction {
    pub fn new(
        chunk_id: impl Into<String>,
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
    ) -> Result<Self> {
        Ok(Self {
            entities,
            relationships,
            chunk_id: normalize::required("chunk_id", chunk_id.into())?,
        })
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<Entity>, Vec<Relationship>) {
        (self.chunk_id, self.entities, self.relationships)
    }
}

impl<'de> Deserialize<'de> for GraphExtraction {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExtractionData {
            #[serde(default)]
            entities: Vec<Entity>,
            #[serde(default)]
            relationships: Vec<Relationship>,
            chunk_id: String,
        }

        let data = ExtractionData::deserialize(deserializer)?;
        GraphExtraction::new(data.chunk_id, data.entities, data.relationships)
            .map_err(validation::de_error)
    }
}
