//! Graph data types matching the exported graph document.

use crate::theme;
use egui::{Color32, Pos2};
use serde::Deserialize;
use std::collections::HashMap;

/// Per-song metadata stamped on each node by the library export.
///
/// Every field is optional: the layout never reads these, and the song panel
/// renders absent values as a placeholder rather than failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongMeta {
    #[serde(rename = "Artist")]
    pub artist: Option<String>,
    #[serde(rename = "BPM")]
    pub bpm: Option<String>,
    #[serde(rename = "Key")]
    pub key: Option<String>,
    #[serde(rename = "Genre", default)]
    pub genre: Vec<String>,
    #[serde(rename = "Vibe", default)]
    pub vibe: Vec<String>,
    #[serde(rename = "Intensity", default)]
    pub intensity: Vec<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
    #[serde(rename = "Playlists", default)]
    pub playlists: Vec<String>,
    #[serde(rename = "Play Count")]
    pub play_count: Option<String>,
    #[serde(rename = "Date Added")]
    pub date_added: Option<String>,
}

/// Node entry in the serialized document (graphology export shape).
#[derive(Debug, Clone, Deserialize)]
pub struct DocNode {
    pub key: String,
    #[serde(default)]
    pub attributes: DocNodeAttrs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocNodeAttrs {
    pub label: Option<String>,
    pub color: Option<String>,
    pub size: Option<f32>,
    #[serde(default)]
    pub data: SongMeta,
}

/// Edge entry in the serialized document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub attributes: DocEdgeAttrs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocEdgeAttrs {
    #[serde(rename = "Weight")]
    pub weight: Option<u32>,
    #[serde(rename = "Sessions", default)]
    pub sessions: Vec<String>,
    #[serde(rename = "Key Change")]
    pub key_change: Option<f32>,
    #[serde(rename = "BPM Change")]
    pub bpm_change: Option<f32>,
}

/// Complete graph document fetched at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<DocNode>,
    #[serde(default)]
    pub edges: Vec<DocEdge>,
}

/// A song in the library.
#[derive(Debug, Clone)]
pub struct SongNode {
    pub id: String,
    pub label: String,
    /// Fixed categorical color by primary genre.
    pub color: Color32,
    /// Derived from play count at export time, immutable here.
    pub size: f32,
    pub meta: SongMeta,
}

/// An observed track-to-track transition. Repeat observations of the same
/// (source, target) pair merge into one edge.
#[derive(Debug, Clone)]
pub struct TransitionEdge {
    pub source: String,
    pub target: String,
    /// Invariant: equals `sessions.len()`.
    pub weight: u32,
    /// Session ids in first-seen order, one entry per observed occurrence.
    pub sessions: Vec<String>,
    pub key_change: Option<f32>,
    pub bpm_change: Option<f32>,
}

impl TransitionEdge {
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    pub fn in_session(&self, session: &str) -> bool {
        self.sessions.iter().any(|s| s.trim() == session)
    }
}

/// Side length of the square nodes are scattered in before the first layout
/// step. The simulation spreads them out from there.
const PLACEMENT_EXTENT: f32 = 100.0;

/// Default node size when the document omits one.
const DEFAULT_NODE_SIZE: f32 = 2.0;

/// Runtime graph store. All position mutation goes through here so the
/// layout step, the drag handler and the reducers read consistent state
/// within a frame.
pub struct GraphState {
    pub nodes: Vec<SongNode>,
    pub edges: Vec<TransitionEdge>,
    /// Node positions (id -> position), defined for every node after `load`.
    positions: HashMap<String, Pos2>,
    /// Node index lookup (id -> index in `nodes`).
    node_index: HashMap<String, usize>,
    /// Edge index lookup ((source, target) -> index in `edges`).
    edge_index: HashMap<(String, String), usize>,
    /// Incident edge count per node, for orphan hiding and repulsion mass.
    degrees: HashMap<String, u32>,
    /// Transient hover state, fed by the canvas every frame.
    pub hovered_node: Option<String>,
    pub hovered_edge: Option<(String, String)>,
    /// Sticky selection, survives until background click or another click.
    pub selected_node: Option<String>,
}

impl GraphState {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            positions: HashMap::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            degrees: HashMap::new(),
            hovered_node: None,
            hovered_edge: None,
            selected_node: None,
        }
    }

    /// Load a graph document, scattering initial positions randomly so the
    /// first layout step never sees an undefined coordinate.
    pub fn load(&mut self, doc: GraphDocument) {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        self.nodes.clear();
        self.edges.clear();
        self.positions.clear();
        self.node_index.clear();
        self.edge_index.clear();
        self.degrees.clear();
        self.hovered_node = None;
        self.hovered_edge = None;
        self.selected_node = None;

        for doc_node in doc.nodes {
            if self.node_index.contains_key(&doc_node.key) {
                tracing::warn!(node = %doc_node.key, "duplicate node key, keeping first");
                continue;
            }

            let attrs = doc_node.attributes;
            let color = attrs
                .color
                .as_deref()
                .and_then(theme::parse_hex_color)
                .or_else(|| attrs.data.genre.first().map(|g| theme::genre_color(g)))
                .unwrap_or(theme::ACCENT);

            let x = rng.gen_range(-PLACEMENT_EXTENT..PLACEMENT_EXTENT);
            let y = rng.gen_range(-PLACEMENT_EXTENT..PLACEMENT_EXTENT);
            self.positions.insert(doc_node.key.clone(), Pos2::new(x, y));
            self.node_index
                .insert(doc_node.key.clone(), self.nodes.len());

            self.nodes.push(SongNode {
                label: attrs.label.unwrap_or_else(|| doc_node.key.clone()),
                color,
                size: attrs.size.unwrap_or(DEFAULT_NODE_SIZE).max(0.5),
                meta: attrs.data,
                id: doc_node.key,
            });
        }

        for doc_edge in doc.edges {
            if !self.node_index.contains_key(&doc_edge.source)
                || !self.node_index.contains_key(&doc_edge.target)
            {
                tracing::warn!(
                    source = %doc_edge.source,
                    target = %doc_edge.target,
                    "edge references unknown node, skipping"
                );
                continue;
            }
            let attrs = doc_edge.attributes;
            self.merge_transition(
                doc_edge.source,
                doc_edge.target,
                attrs.weight.unwrap_or(attrs.sessions.len().max(1) as u32),
                attrs.sessions,
                attrs.key_change,
                attrs.bpm_change,
            );
        }

        self.recompute_degrees();
        tracing::info!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "graph loaded"
        );
    }

    /// Record one observed occurrence of a (source, target) transition.
    /// Creates the edge on first sight, otherwise bumps its weight and
    /// appends the session id.
    pub fn upsert_transition(
        &mut self,
        source: &str,
        target: &str,
        session: &str,
        key_change: Option<f32>,
        bpm_change: Option<f32>,
    ) {
        if !self.node_index.contains_key(source) || !self.node_index.contains_key(target) {
            return;
        }
        self.merge_transition(
            source.to_string(),
            target.to_string(),
            1,
            vec![session.to_string()],
            key_change,
            bpm_change,
        );
        self.recompute_degrees();
    }

    fn merge_transition(
        &mut self,
        source: String,
        target: String,
        weight: u32,
        sessions: Vec<String>,
        key_change: Option<f32>,
        bpm_change: Option<f32>,
    ) {
        let key = (source.clone(), target.clone());
        match self.edge_index.get(&key) {
            Some(&index) => {
                let edge = &mut self.edges[index];
                edge.weight += weight;
                edge.sessions.extend(sessions);
            }
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(TransitionEdge {
                    source,
                    target,
                    weight,
                    sessions,
                    key_change,
                    bpm_change,
                });
            }
        }
    }

    fn recompute_degrees(&mut self) {
        self.degrees.clear();
        for edge in &self.edges {
            *self.degrees.entry(edge.source.clone()).or_insert(0) += 1;
            if edge.source != edge.target {
                *self.degrees.entry(edge.target.clone()).or_insert(0) += 1;
            }
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn get_node(&self, id: &str) -> Option<&SongNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn get_edge(&self, source: &str, target: &str) -> Option<&TransitionEdge> {
        self.edge_index
            .get(&(source.to_string(), target.to_string()))
            .map(|&i| &self.edges[i])
    }

    pub fn get_pos(&self, id: &str) -> Option<Pos2> {
        self.positions.get(id).copied()
    }

    /// Single choke point for position writes. Unknown ids are a no-op.
    pub fn set_position(&mut self, id: &str, pos: Pos2) {
        if let Some(entry) = self.positions.get_mut(id) {
            *entry = pos;
        }
    }

    /// Incident edge count; zero means orphan.
    pub fn degree(&self, id: &str) -> u32 {
        self.degrees.get(id).copied().unwrap_or(0)
    }
}

impl Default for GraphState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_node(key: &str) -> DocNode {
        DocNode {
            key: key.to_string(),
            attributes: DocNodeAttrs {
                size: Some(4.0),
                ..Default::default()
            },
        }
    }

    fn two_songs() -> GraphState {
        let mut state = GraphState::new();
        state.load(GraphDocument {
            nodes: vec![doc_node("Song A"), doc_node("Song B")],
            edges: Vec::new(),
        });
        state
    }

    #[test]
    fn load_defines_every_position() {
        let state = two_songs();
        for node in &state.nodes {
            let pos = state.get_pos(&node.id).expect("position defined");
            assert!(pos.x.is_finite() && pos.y.is_finite());
        }
    }

    #[test]
    fn repeated_transitions_merge_into_one_edge() {
        let mut state = two_songs();
        state.upsert_transition("Song A", "Song B", "X", Some(1.0), Some(2.0));
        state.upsert_transition("Song A", "Song B", "X", None, None);
        state.upsert_transition("Song A", "Song B", "Y", None, None);

        assert_eq!(state.edges.len(), 1);
        let edge = state.get_edge("Song A", "Song B").unwrap();
        assert_eq!(edge.weight, 3);
        assert_eq!(edge.sessions, vec!["X", "X", "Y"]);
        assert_eq!(edge.weight as usize, edge.sessions.len());
        // deltas come from the first observation
        assert_eq!(edge.key_change, Some(1.0));
    }

    #[test]
    fn reverse_direction_is_a_distinct_edge() {
        let mut state = two_songs();
        state.upsert_transition("Song A", "Song B", "X", None, None);
        state.upsert_transition("Song B", "Song A", "X", None, None);
        assert_eq!(state.edges.len(), 2);
    }

    #[test]
    fn unknown_endpoint_is_a_no_op() {
        let mut state = two_songs();
        state.upsert_transition("Song A", "Missing", "X", None, None);
        assert!(state.edges.is_empty());
    }

    #[test]
    fn degrees_count_incident_edges_once_for_self_loops() {
        let mut state = two_songs();
        state.upsert_transition("Song A", "Song B", "X", None, None);
        state.upsert_transition("Song A", "Song A", "X", None, None);
        assert_eq!(state.degree("Song A"), 2);
        assert_eq!(state.degree("Song B"), 1);
        assert_eq!(state.degree("Missing"), 0);
    }

    #[test]
    fn set_position_ignores_unknown_ids() {
        let mut state = two_songs();
        state.set_position("Missing", Pos2::new(1.0, 2.0));
        state.set_position("Song A", Pos2::new(12.5, -3.2));
        assert_eq!(state.get_pos("Song A"), Some(Pos2::new(12.5, -3.2)));
        assert_eq!(state.get_pos("Missing"), None);
    }

    #[test]
    fn document_parses_exported_shape() {
        let json = r##"{
            "nodes": [
                {"key": "Song A", "attributes": {"label": "Song A", "color": "#4267ac", "size": 3.2,
                    "data": {"Artist": "Someone", "Genre": ["Techno"], "Play Count": "12"}}},
                {"key": "Song B", "attributes": {"size": 2.0, "data": {}}}
            ],
            "edges": [
                {"source": "Song A", "target": "Song B",
                 "attributes": {"Weight": 2, "Sessions": ["2024-03-01", "2024-04-12"],
                                "Key Change": 1.0, "BPM Change": -4.0}}
            ]
        }"##;
        let doc: GraphDocument = serde_json::from_str(json).unwrap();
        let mut state = GraphState::new();
        state.load(doc);

        assert_eq!(state.nodes.len(), 2);
        let a = state.get_node("Song A").unwrap();
        assert_eq!(a.meta.artist.as_deref(), Some("Someone"));
        assert_eq!(a.color, Color32::from_rgb(0x42, 0x67, 0xac));
        // Song B has no metadata at all; fields stay None/empty
        let b = state.get_node("Song B").unwrap();
        assert!(b.meta.bpm.is_none());
        assert!(b.meta.genre.is_empty());

        let edge = state.get_edge("Song A", "Song B").unwrap();
        assert_eq!(edge.weight, 2);
        assert_eq!(edge.bpm_change, Some(-4.0));
    }

    #[test]
    fn duplicate_document_rows_merge() {
        let mut state = two_songs();
        // simulate a document that carries the same pair twice
        state.merge_transition(
            "Song A".into(),
            "Song B".into(),
            2,
            vec!["X".into(), "X".into()],
            None,
            None,
        );
        state.merge_transition("Song A".into(), "Song B".into(), 1, vec!["Y".into()], None, None);
        assert_eq!(state.edges.len(), 1);
        let edge = state.get_edge("Song A", "Song B").unwrap();
        assert_eq!(edge.weight, 3);
        assert_eq!(edge.sessions, vec!["X", "X", "Y"]);
    }
}
