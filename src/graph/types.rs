//! Aggregated graph model and its runtime state.

use crate::data::Post;
use egui::{Color32, Pos2, Rect, Vec2};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// A repost received by a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingRepost {
    /// Identifier of the channel the post came from
    pub from: String,
    pub post: Post,
}

/// A channel in the repost graph, with metadata merged from every retained
/// record that mentions it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelNode {
    pub id: String,
    /// Title, or the identifier when the title is missing
    pub label: String,
    pub url: Option<String>,
    pub participants: Option<u64>,
    pub peer_type: Option<String>,
    pub category: Option<String>,
    pub about: Option<String>,
    pub rkn_verification: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub red_label: Option<bool>,
    pub black_label: Option<bool>,
    pub incoming_reposts: Vec<IncomingRepost>,
    pub outgoing_count: usize,
    pub size: f32,
    pub color: Color32,
    /// Initial layout coordinates in [0, 1)
    pub x: f32,
    pub y: f32,
}

impl ChannelNode {
    /// A node that has only been seen by identifier so far.
    pub fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            url: None,
            participants: None,
            peer_type: None,
            category: None,
            about: None,
            rkn_verification: None,
            country: None,
            language: None,
            red_label: None,
            black_label: None,
            incoming_reposts: Vec::new(),
            outgoing_count: 0,
            size: node_size(0),
            color: Color32::WHITE,
            x: 0.0,
            y: 0.0,
        }
    }
}

/// Display size for a channel with `outgoing` reposts: logarithmic so hubs
/// don't swallow the canvas.
pub fn node_size(outgoing: usize) -> f32 {
    (((outgoing as f64 + 1.0).ln() * 3.0 + 3.0).min(1000.0)) as f32
}

/// Directed edge between two channels, one per ordered pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEdge {
    pub source: String,
    pub target: String,
    /// Every post reposted along this edge, in input order
    pub posts: Vec<Post>,
}

impl ChannelEdge {
    pub fn key(&self) -> String {
        edge_key(&self.source, &self.target)
    }
}

pub fn edge_key(source: &str, target: &str) -> String {
    format!("{}->{}", source, target)
}

/// Output of the aggregator
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    pub nodes: Vec<ChannelNode>,
    pub edges: Vec<ChannelEdge>,
}

impl GraphData {
    /// True when there is nothing worth drawing: no nodes or no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.edges.is_empty()
    }

    #[cfg(test)]
    pub fn node(&self, id: &str) -> Option<&ChannelNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    #[cfg(test)]
    pub fn edge(&self, source: &str, target: &str) -> Option<&ChannelEdge> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }
}

/// Runtime graph state: the aggregated data indexed as a petgraph digraph,
/// plus positions and interaction state.
///
/// Node `i` of `data.nodes` is `NodeIndex::new(i)` in `graph`, and positions
/// and layout buffers are indexed the same way.
pub struct GraphState {
    pub data: GraphData,
    /// Node weight = index into `data.nodes`, edge weight = index into `data.edges`
    pub graph: DiGraph<usize, usize>,
    /// Node index lookup (id -> index in data.nodes)
    pub node_index: HashMap<String, usize>,
    /// Layout-space positions
    pub positions: Vec<Pos2>,
    /// Net force from the previous layout iteration
    pub previous_forces: Vec<Vec2>,
    pub hovered_node: Option<usize>,
    pub selected_node: Option<usize>,
}

impl GraphState {
    pub fn new(data: GraphData) -> Self {
        let mut graph = DiGraph::with_capacity(data.nodes.len(), data.edges.len());
        let mut node_index = HashMap::with_capacity(data.nodes.len());
        let mut positions = Vec::with_capacity(data.nodes.len());

        for (i, node) in data.nodes.iter().enumerate() {
            graph.add_node(i);
            node_index.insert(node.id.clone(), i);
            positions.push(Pos2::new(node.x, node.y));
        }

        for (i, edge) in data.edges.iter().enumerate() {
            let (Some(&s), Some(&t)) = (node_index.get(&edge.source), node_index.get(&edge.target))
            else {
                tracing::warn!("Edge {} references an unknown node", edge.key());
                continue;
            };
            graph.add_edge(NodeIndex::new(s), NodeIndex::new(t), i);
        }

        let previous_forces = vec![Vec2::ZERO; data.nodes.len()];

        Self {
            data,
            graph,
            node_index,
            positions,
            previous_forces,
            hovered_node: None,
            selected_node: None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &str) -> Option<&ChannelNode> {
        self.node_index.get(id).map(|&i| &self.data.nodes[i])
    }

    /// In + out degree
    pub fn degree(&self, index: usize) -> usize {
        let n = NodeIndex::new(index);
        self.graph.edges_directed(n, Direction::Outgoing).count()
            + self.graph.edges_directed(n, Direction::Incoming).count()
    }

    /// Edge endpoints as node indices, in `data.edges` order
    pub fn edge_endpoints(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(s, t)| (s.index(), t.index()))
    }

    /// Bounding box of all node positions
    pub fn bounds(&self) -> Option<Rect> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold(Rect::from_min_max(first, first), |rect, &p| rect.union(Rect::from_min_max(p, p))),
        )
    }
}
