// graph_engine/src/repository.rs
//! The repository contract the ingestion pipeline consumes.
//!
//! A Gremlin-backed store implements this same trait; the in-memory
//! `GraphService` in this crate is the implementation used for local runs
//! and tests.

use async_trait::async_trait;
use models::errors::GraphResult;
use models::properties::{PropertyMap, PropertyValue};
use models::{Edge, Vertex};
use uuid::Uuid;

/// Equality filter on a single vertex property.
#[derive(Clone, Debug)]
pub struct PropertyFilter {
    pub key: String,
    pub value: PropertyValue,
}

impl PropertyFilter {
    pub fn new(key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    pub fn matches(&self, vertex: &Vertex) -> bool {
        vertex.properties.get(&self.key) == Some(&self.value)
    }
}

#[async_trait]
pub trait GraphRepository: Send + Sync {
    async fn add_vertex(&self, label: &str, props: PropertyMap) -> GraphResult<Vertex>;

    async fn add_edge(
        &self,
        label: &str,
        out_id: Uuid,
        in_id: Uuid,
        props: Option<PropertyMap>,
    ) -> GraphResult<Edge>;

    async fn get_vertex_by_id(&self, id: Uuid) -> GraphResult<Option<Vertex>>;

    /// Overlays `props` on the vertex; returns false when the vertex is absent.
    async fn update_vertex_properties(&self, id: Uuid, props: PropertyMap) -> GraphResult<bool>;

    /// Idempotent on `(label, key, value)`: returns the existing vertex id if
    /// one matches, otherwise creates the vertex with `props`.
    async fn upsert_vertex_and_return_id(
        &self,
        label: &str,
        key: &str,
        value: &str,
        props: PropertyMap,
    ) -> GraphResult<Option<Uuid>>;

    async fn get_vertex_id_by_label_and_property(
        &self,
        label: &str,
        key: &str,
        value: &str,
    ) -> GraphResult<Option<Uuid>>;

    async fn get_vertex_by_label_and_property(
        &self,
        label: &str,
        key: &str,
        value: &str,
    ) -> GraphResult<Option<Vertex>>;

    async fn count_vertices_by_label(
        &self,
        label: &str,
        filter: Option<PropertyFilter>,
    ) -> GraphResult<u64>;

    /// Paged listing; used by the search side, not by the ingestion core.
    async fn get_vertices_by_label(
        &self,
        label: &str,
        filter: Option<PropertyFilter>,
        count: usize,
        offset: usize,
    ) -> GraphResult<Vec<Vertex>>;
}
