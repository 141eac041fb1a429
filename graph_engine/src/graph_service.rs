// graph_engine/src/graph_service.rs
//! Global singleton GraphService — in-memory property graph behind the
//! `GraphRepository` contract, with a (label, key, value) index so concept
//! upserts and lookups stay O(1) at RF2 scale.

use async_trait::async_trait;
use models::errors::{GraphError, GraphResult};
use models::graph::Graph;
use models::identifiers::Identifier;
use models::properties::{PropertyMap, PropertyValue};
use models::{Edge, Vertex};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use uuid::Uuid;

use crate::repository::{GraphRepository, PropertyFilter};

/// Global singleton
pub static GRAPH_SERVICE: OnceCell<Arc<GraphService>> = OnceCell::const_new();

struct GraphState {
    graph: Graph,
    // (label, property key, property value as string) -> vertex id
    vertex_index: HashMap<(String, String, String), Uuid>,
}

#[derive(Clone)]
pub struct GraphService {
    state: Arc<RwLock<GraphState>>,
}

fn index_value(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::String(s) => Some(s.clone()),
        PropertyValue::Integer(i) => Some(i.to_string()),
        PropertyValue::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_label(label: &str) -> GraphResult<Identifier> {
    Identifier::new(label.to_string()).map_err(GraphError::from)
}

impl GraphService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(GraphState {
                graph: Graph::new(),
                vertex_index: HashMap::new(),
            })),
        }
    }

    /// Initialise the process-wide instance.
    pub async fn global_init() -> GraphResult<()> {
        GRAPH_SERVICE
            .set(Arc::new(Self::new()))
            .map_err(|_| GraphError::InternalError("GraphService already initialised".into()))
    }

    pub async fn get() -> Arc<Self> {
        GRAPH_SERVICE.get().expect("GraphService not initialised").clone()
    }

    fn index_vertex(state: &mut GraphState, vertex: &Vertex) {
        let label = vertex.label.as_ref().to_string();
        for (key, value) in &vertex.properties {
            if let Some(value_str) = index_value(value) {
                state
                    .vertex_index
                    .insert((label.clone(), key.clone(), value_str), vertex.id.0);
            }
        }
    }

    // =====  helpers for tests and verification tooling  =====

    pub async fn vertex_count(&self) -> usize {
        self.state.read().await.graph.vertices.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.state.read().await.graph.edges.len()
    }

    pub async fn edges_with_label(&self, label: &str) -> Vec<Edge> {
        let state = self.state.read().await;
        state.graph.edges_by_label(label).cloned().collect()
    }
}

impl Default for GraphService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphRepository for GraphService {
    async fn add_vertex(&self, label: &str, props: PropertyMap) -> GraphResult<Vertex> {
        let label = parse_label(label)?;
        let mut vertex = Vertex::new(label);
        vertex.merge_properties(&props);

        let mut state = self.state.write().await;
        Self::index_vertex(&mut state, &vertex);
        state.graph.add_vertex(vertex.clone());
        Ok(vertex)
    }

    async fn add_edge(
        &self,
        label: &str,
        out_id: Uuid,
        in_id: Uuid,
        props: Option<PropertyMap>,
    ) -> GraphResult<Edge> {
        let edge_type = parse_label(label)?;
        let mut state = self.state.write().await;
        if state.graph.get_vertex(&out_id).is_none() {
            return Err(GraphError::NotFound(edge_type));
        }
        if state.graph.get_vertex(&in_id).is_none() {
            return Err(GraphError::NotFound(edge_type));
        }

        let mut edge = Edge::new(out_id, edge_type, in_id);
        if let Some(props) = props {
            for (key, value) in props {
                edge.properties.insert(key, value);
            }
        }
        state.graph.add_edge(edge.clone());
        Ok(edge)
    }

    async fn get_vertex_by_id(&self, id: Uuid) -> GraphResult<Option<Vertex>> {
        let state = self.state.read().await;
        Ok(state.graph.get_vertex(&id).cloned())
    }

    async fn update_vertex_properties(&self, id: Uuid, props: PropertyMap) -> GraphResult<bool> {
        let mut state = self.state.write().await;
        let Some(vertex) = state.graph.get_vertex_mut(&id) else {
            return Ok(false);
        };
        vertex.merge_properties(&props);
        let vertex = vertex.clone();
        Self::index_vertex(&mut state, &vertex);
        Ok(true)
    }

    async fn upsert_vertex_and_return_id(
        &self,
        label: &str,
        key: &str,
        value: &str,
        props: PropertyMap,
    ) -> GraphResult<Option<Uuid>> {
        let index_key = (label.to_string(), key.to_string(), value.to_string());
        let mut state = self.state.write().await;
        if let Some(existing) = state.vertex_index.get(&index_key) {
            return Ok(Some(*existing));
        }

        let mut vertex = Vertex::new(parse_label(label)?);
        vertex.merge_properties(&props);
        let id = vertex.id.0;
        Self::index_vertex(&mut state, &vertex);
        state.vertex_index.insert(index_key, id);
        state.graph.add_vertex(vertex);
        Ok(Some(id))
    }

    async fn get_vertex_id_by_label_and_property(
        &self,
        label: &str,
        key: &str,
        value: &str,
    ) -> GraphResult<Option<Uuid>> {
        let state = self.state.read().await;
        let index_key = (label.to_string(), key.to_string(), value.to_string());
        Ok(state.vertex_index.get(&index_key).copied())
    }

    async fn get_vertex_by_label_and_property(
        &self,
        label: &str,
        key: &str,
        value: &str,
    ) -> GraphResult<Option<Vertex>> {
        let state = self.state.read().await;
        let index_key = (label.to_string(), key.to_string(), value.to_string());
        let id = state.vertex_index.get(&index_key);
        Ok(id.and_then(|id| state.graph.get_vertex(id)).cloned())
    }

    async fn count_vertices_by_label(
        &self,
        label: &str,
        filter: Option<PropertyFilter>,
    ) -> GraphResult<u64> {
        let state = self.state.read().await;
        let count = state
            .graph
            .vertices_by_label(label)
            .filter(|v| filter.as_ref().map(|f| f.matches(v)).unwrap_or(true))
            .count();
        Ok(count as u64)
    }

    async fn get_vertices_by_label(
        &self,
        label: &str,
        filter: Option<PropertyFilter>,
        count: usize,
        offset: usize,
    ) -> GraphResult<Vec<Vertex>> {
        let state = self.state.read().await;
        Ok(state
            .graph
            .vertices_by_label(label)
            .filter(|v| filter.as_ref().map(|f| f.matches(v)).unwrap_or(true))
            .skip(offset)
            .take(count)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept_props(concept_id: &str, active: bool) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("conceptId".to_string(), PropertyValue::from(concept_id));
        props.insert("active".to_string(), PropertyValue::from(active));
        props
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_label_key_value() {
        let service = GraphService::new();
        let first = service
            .upsert_vertex_and_return_id("SnomedConcept", "conceptId", "138875005", concept_props("138875005", true))
            .await
            .unwrap();
        let second = service
            .upsert_vertex_and_return_id("SnomedConcept", "conceptId", "138875005", concept_props("138875005", true))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(service.vertex_count().await, 1);
    }

    #[tokio::test]
    async fn lookup_by_label_and_property_round_trips() {
        let service = GraphService::new();
        let id = service
            .upsert_vertex_and_return_id("SnomedConcept", "conceptId", "404684003", concept_props("404684003", true))
            .await
            .unwrap()
            .unwrap();

        let found = service
            .get_vertex_id_by_label_and_property("SnomedConcept", "conceptId", "404684003")
            .await
            .unwrap();
        assert_eq!(found, Some(id));

        let missing = service
            .get_vertex_id_by_label_and_property("SnomedConcept", "conceptId", "999")
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn update_vertex_properties_overlays_and_reports_absence() {
        let service = GraphService::new();
        let id = service
            .upsert_vertex_and_return_id("SnomedConcept", "conceptId", "A", concept_props("A", true))
            .await
            .unwrap()
            .unwrap();

        let mut props = PropertyMap::new();
        props.insert("fsn".to_string(), PropertyValue::from("Foo (disorder)"));
        assert!(service.update_vertex_properties(id, props.clone()).await.unwrap());
        assert!(!service.update_vertex_properties(Uuid::new_v4(), props).await.unwrap());

        let vertex = service
            .get_vertex_by_label_and_property("SnomedConcept", "conceptId", "A")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vertex.get_property("fsn"), Some("Foo (disorder)"));
    }

    #[tokio::test]
    async fn count_honors_property_filter() {
        let service = GraphService::new();
        for (concept_id, active) in [("A", true), ("B", false), ("C", true)] {
            service
                .upsert_vertex_and_return_id("SnomedConcept", "conceptId", concept_id, concept_props(concept_id, active))
                .await
                .unwrap();
        }

        let total = service.count_vertices_by_label("SnomedConcept", None).await.unwrap();
        let active = service
            .count_vertices_by_label("SnomedConcept", Some(PropertyFilter::new("active", true)))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(active, 2);
    }

    #[tokio::test]
    async fn add_edge_requires_both_endpoints() {
        let service = GraphService::new();
        let a = service
            .upsert_vertex_and_return_id("SnomedConcept", "conceptId", "A", concept_props("A", true))
            .await
            .unwrap()
            .unwrap();

        let err = service.add_edge("IS_A", a, Uuid::new_v4(), None).await;
        assert!(err.is_err());
        assert_eq!(service.edge_count().await, 0);
    }
}
