// models/src/graph.rs
//! Core in-memory property graph with adjacency indexes.

use crate::{Vertex, Edge};
use uuid::Uuid;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct Graph {
    pub vertices: HashMap<Uuid, Vertex>,
    pub edges: HashMap<Uuid, Edge>,
    pub out_edges: HashMap<Uuid, HashSet<Uuid>>,
    pub in_edges: HashMap<Uuid, HashSet<Uuid>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) {
        self.vertices.insert(vertex.id.0, vertex);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        let edge_id = edge.id.0;
        let from = edge.outbound_id.0;
        let to = edge.inbound_id.0;

        self.edges.insert(edge_id, edge);
        self.out_edges.entry(from).or_default().insert(edge_id);
        self.in_edges.entry(to).or_default().insert(edge_id);
    }

    pub fn get_vertex(&self, id: &Uuid) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn get_vertex_mut(&mut self, id: &Uuid) -> Option<&mut Vertex> {
        self.vertices.get_mut(id)
    }

    pub fn outgoing_edges(&self, id: &Uuid) -> impl Iterator<Item = &Edge> {
        self.out_edges.get(id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
    }

    pub fn incoming_edges(&self, id: &Uuid) -> impl Iterator<Item = &Edge> {
        self.in_edges.get(id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
    }

    pub fn vertices_by_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Vertex> {
        self.vertices.values().filter(move |v| v.label.as_ref() == label)
    }

    pub fn edges_by_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |e| e.edge_type.as_ref() == label)
    }
}
