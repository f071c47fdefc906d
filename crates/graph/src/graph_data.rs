use std::collections::HashMap;

use extract::{Entity, GraphExtraction, Relationship};
use serde::{Deserialize, Deserializer, Serialize};
use serde::de::{Error as _, IgnoredAny};
use tracing::debug;
use validation::{Endpoint, Properties, Result, ValidationError};

/// Merged graph used for storage and visualization.
///
/// Entity ids are unique and every relationship endpoint names an entity in
/// the graph. Both hold after construction and after every merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphData {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    metadata: Properties,
    /// entity id -> position in `entities`
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// What one successful merge added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub chunk_id: String,
    pub entities_added: usize,
    pub relationships_added: usize,
}

impl GraphData {
    /// Assemble a graph in two phases: node ids are checked for uniqueness
    /// first, then every edge is checked against the finished node set.
    pub fn new(
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        metadata: Properties,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(entities.len());
        for (pos, entity) in entities.iter().enumerate() {
            if index.insert(entity.id().to_string(), pos).is_some() {
                return Err(ValidationError::DuplicateIdentifier {
                    id: entity.id().to_string(),
                });
            }
        }

        check_edges(&relationships, |id| index.contains_key(id))?;

        Ok(Self {
            entities,
            relationships,
            metadata,
            index,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Fold one chunk's extraction into the graph.
    ///
    /// New entities must not collide with existing ones or with each other.
    /// New relationships are checked against the node set including this
    /// batch's entities. On error the graph is left exactly as it was.
    pub fn merge_extraction(&mut self, extraction: GraphExtraction) -> Result<MergeSummary> {
        let (chunk_id, entities, relationships) = extraction.into_parts();

        let base = self.entities.len();
        let mut added = HashMap::with_capacity(entities.len());
        for (offset, entity) in entities.iter().enumerate() {
            let id = entity.id();
            if self.index.contains_key(id) || added.insert(id.to_string(), base + offset).is_some() {
                return Err(ValidationError::DuplicateIdentifier { id: id.to_string() });
            }
        }

        check_edges(&relationships, |id| {
            self.index.contains_key(id) || added.contains_key(id)
        })?;

        let summary = MergeSummary {
            chunk_id,
            entities_added: entities.len(),
            relationships_added: relationships.len(),
        };

        self.index.extend(added);
        self.entities.extend(entities);
        self.relationships.extend(relationships);

        debug!(
            chunk_id = %summary.chunk_id,
            entities_added = summary.entities_added,
            relationships_added = summary.relationships_added,
            total_entities = self.entities.len(),
            total_relationships = self.relationships.len(),
            "Merged extraction"
        );

        Ok(summary)
    }

    /// Like [`GraphData::merge_extraction`] but returns a new graph and
    /// leaves `self` alone.
    pub fn merged(&self, extraction: GraphExtraction) -> Result<GraphData> {
        let mut next = self.clone();
        next.merge_extraction(extraction)?;
        Ok(next)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn metadata(&self) -> &Properties {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&pos| &self.entities[pos])
    }

    pub fn contains_entity(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Relationships with `id` at either end, in insertion order.
    pub fn relationships_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.iter().filter(move |r| r.touches(id))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn into_parts(self) -> (Vec<Entity>, Vec<Relationship>, Properties) {
        (self.entities, self.relationships, self.metadata)
    }
}

/// Edges in order, source before target; the first miss is reported.
fn check_edges<F>(relationships: &[Relationship], exists: F) -> Result<()>
where
    F: Fn(&str) -> bool,
{
    for rel in relationships {
        for (endpoint, id) in [(Endpoint::Source, rel.source()), (Endpoint::Target, rel.target())] {
            if !exists(id) {
                return Err(ValidationError::DanglingReference {
                    relationship_id: rel.id().to_string(),
                    endpoint,
                    id: id.to_string(),
                });
            }
        }
    }
    Ok(())
}

impl<'de> Deserialize<'de> for GraphData {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct GraphDataData {
            #[serde(default)]
            entities: Vec<Entity>,
            #[serde(default)]
            relationships: Vec<Relationship>,
            #[serde(default)]
            metadata: Properties,
            // Other top-level keys are ignored, but the nodes/edges naming
            // would otherwise load as an empty graph.
            #[serde(default)]
            nodes: Option<IgnoredAny>,
            #[serde(default)]
            edges: Option<IgnoredAny>,
        }

        let data = GraphDataData::deserialize(deserializer)?;
        if data.nodes.is_some() || data.edges.is_some() {
            return Err(D::Error::custom(
                "graph uses `nodes`/`edges`; expected `entities`/`relationships`",
            ));
        }
        GraphData::new(data.entities, data.relationships, data.metadata)
            .map_err(validation::de_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(id: &str) -> Entity {
        Entity::with_id(id, format!("Entity {id}"), "CONCEPT").unwrap()
    }

    fn rel(id: &str, source: &str, target: &str) -> Relationship {
        Relationship::builder(source, target, "MENTIONS").id(id).build().unwrap()
    }

    #[test]
    fn test_build_and_merge_scenario() {
        let mut graph = GraphData::new(vec![entity("e1"), entity("e2")], vec![], Properties::new()).unwrap();
        assert_eq!(graph.entity_count(), 2);
        assert_eq!(graph.relationship_count(), 0);

        let extraction = GraphExtraction::new(
            "chunk-1",
            vec![],
            vec![Relationship::new("e1", "e2", "MENTIONS").unwrap()],
        )
        .unwrap();
        let summary = graph.merge_extraction(extraction).unwrap();

        assert_eq!(summary.relationships_added, 1);
        assert_eq!(graph.entity_count(), 2);
        assert_eq!(graph.relationship_count(), 1);
        assert_eq!(graph.relationships_of("e2").count(), 1);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let a = Entity::with_id("e1", "Alpha", "PERSON").unwrap();
        let b = Entity::with_id("e1", "Beta", "LOCATION").unwrap();
        let err = GraphData::new(vec![a, b], vec![], Properties::new()).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateIdentifier { id: "e1".to_string() });
    }

    #[test]
    fn test_dangling_target_rejected() {
        let err = GraphData::new(
            vec![entity("e1"), entity("e2")],
            vec![rel("r1", "e1", "e99")],
            Properties::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DanglingReference {
                relationship_id: "r1".to_string(),
                endpoint: Endpoint::Target,
                id: "e99".to_string(),
            }
        );
    }

    #[test]
    fn test_error_precedence_is_deterministic() {
        // Node uniqueness is reported before any edge problem.
        let err = GraphData::new(
            vec![entity("e1"), entity("e1")],
            vec![rel("r1", "x", "y")],
            Properties::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateIdentifier { .. }));

        // Source is checked before target.
        let err = GraphData::new(vec![entity("e1")], vec![rel("r1", "x", "y")], Properties::new()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DanglingReference {
                relationship_id: "r1".to_string(),
                endpoint: Endpoint::Source,
                id: "x".to_string(),
            }
        );

        // Edges are checked in order.
        let err = GraphData::new(
            vec![entity("e1"), entity("e2")],
            vec![rel("r1", "e1", "e2"), rel("r2", "e2", "gone"), rel("r3", "lost", "e1")],
            Properties::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::DanglingReference { ref relationship_id, .. } if relationship_id == "r2"));
    }

    #[test]
    fn test_merge_can_reference_its_own_entities() {
        let mut graph = GraphData::new(vec![entity("e1")], vec![], Properties::new()).unwrap();
        let extraction = GraphExtraction::new(
            "chunk-2",
            vec![entity("e2"), entity("e3")],
            vec![rel("r1", "e2", "e3"), rel("r2", "e1", "e3")],
        )
        .unwrap();

        graph.merge_extraction(extraction).unwrap();
        assert_eq!(graph.entity_count(), 3);
        assert_eq!(graph.relationship_count(), 2);
        assert_eq!(graph.entity("e3").map(|e| e.name()), Some("Entity e3"));
    }

    #[test]
    fn test_failed_merge_leaves_graph_unchanged() {
        let mut graph = GraphData::new(vec![entity("e1"), entity("e2")], vec![], Properties::new()).unwrap();
        let before = graph.clone();

        let colliding = GraphExtraction::new("c", vec![entity("e3"), entity("e1")], vec![]).unwrap();
        let err = graph.merge_extraction(colliding).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateIdentifier { id: "e1".to_string() });
        assert_eq!(graph, before);

        let dangling = GraphExtraction::new("c", vec![entity("e4")], vec![rel("r1", "e4", "e99")]).unwrap();
        assert!(graph.merge_extraction(dangling).is_err());
        assert_eq!(graph, before);
        assert!(!graph.contains_entity("e4"));
    }

    #[test]
    fn test_duplicate_within_one_extraction() {
        let mut graph = GraphData::empty();
        let extraction = GraphExtraction::new("c", vec![entity("n1"), entity("n1")], vec![]).unwrap();
        let err = graph.merge_extraction(extraction).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateIdentifier { id: "n1".to_string() });
        assert_eq!(graph.entity_count(), 0);
    }

    #[test]
    fn test_merged_returns_new_graph() {
        let graph = GraphData::new(vec![entity("e1")], vec![], Properties::new()).unwrap();
        let extraction = GraphExtraction::new("c", vec![entity("e2")], vec![rel("r1", "e2", "e1")]).unwrap();

        let next = graph.merged(extraction).unwrap();
        assert_eq!(graph.entity_count(), 1);
        assert_eq!(next.entity_count(), 2);
        assert_eq!(next.relationship_count(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut graph = GraphData::new(
            vec![
                Entity::builder("Ada Lovelace", "PERSON").id("e1").property("born", 1815).build().unwrap(),
                Entity::builder("Analytical Engine", "TECHNOLOGY").id("e2").mentions(3).build().unwrap(),
            ],
            vec![
                Relationship::builder("e1", "e2", "USES")
                    .id("r1")
                    .property("evidence", "she wrote programs for it")
                    .build()
                    .unwrap(),
            ],
            Properties::new(),
        )
        .unwrap();
        graph.set_metadata("source", "https://example.com/ada");

        let json = serde_json::to_string(&graph).unwrap();
        let back: GraphData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
        assert_eq!(back.entity("e2").map(|e| e.mentions()), Some(3));
    }

    #[test]
    fn test_deserialize_rejects_invalid_graph() {
        let err = serde_json::from_value::<GraphData>(json!({
            "entities": [{"id": "e1", "name": "A", "type": "PERSON"}],
            "relationships": [{"id": "r1", "source": "e1", "target": "e99", "type": "KNOWS"}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unknown target entity 'e99'"));

        // The nodes/edges naming is not accepted.
        let legacy = json!({"nodes": [{"id": "e1", "name": "A", "type": "PERSON"}], "edges": []});
        let err = serde_json::from_value::<GraphData>(legacy).unwrap_err();
        assert!(err.to_string().contains("`nodes`/`edges`"));
        let err = serde_json::from_value::<GraphData>(json!({"entities": [], "edges": []})).unwrap_err();
        assert!(err.to_string().contains("`nodes`/`edges`"));
    }

    #[test]
    fn test_deserialize_ignores_extra_top_level_keys() {
        let graph: GraphData = serde_json::from_value(json!({
            "version": 2,
            "entities": [{"id": "e1", "name": "A", "type": "PERSON"}],
            "relationships": [],
            "generated_by": {"tool": "extractor"}
        }))
        .unwrap();
        assert_eq!(graph.entity_count(), 1);
        assert!(graph.metadata().is_empty());
    }
}
