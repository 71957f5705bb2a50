//! Per-frame visual overrides for nodes and edges.
//!
//! These are pure functions of (entity, graph state, filter state): the
//! canvas calls them once per node/edge per frame and draws exactly what
//! they return.

use super::types::{GraphState, SongNode, TransitionEdge};
use crate::theme;
use egui::Color32;

/// Thin resting width for unhighlighted edges.
const EDGE_BASE_WIDTH: f32 = 0.5;

/// What the active highlight value is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    /// Exact membership in the node's playlist list.
    Playlist,
    /// Membership in any of tags, genre, vibe or intensity.
    Tag,
}

/// Process-wide filter selections, owned by the app and mutated by the
/// picker controls.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub highlight: Option<(HighlightKind, String)>,
    /// Session id; edges not recorded in it are hidden.
    pub active_date: Option<String>,
    pub hide_orphans: bool,
}

impl FilterState {
    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    pub fn node_matches(&self, node: &SongNode) -> bool {
        let Some((kind, value)) = &self.highlight else {
            return false;
        };
        let contains = |list: &[String]| list.iter().any(|item| item.trim() == value);
        match kind {
            HighlightKind::Playlist => contains(&node.meta.playlists),
            HighlightKind::Tag => {
                contains(&node.meta.tags)
                    || contains(&node.meta.genre)
                    || contains(&node.meta.vibe)
                    || contains(&node.meta.intensity)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub hidden: bool,
    pub color: Color32,
    pub size: f32,
    pub force_label: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStyle {
    pub hidden: bool,
    pub color: Color32,
    pub width: f32,
}

/// Node override: orphan hiding, focus enlargement, highlight dimming.
/// Focus (selected or hovered) takes precedence over filter dimming.
pub fn node_style(node: &SongNode, state: &GraphState, filters: &FilterState) -> NodeStyle {
    if filters.hide_orphans && state.degree(&node.id) == 0 {
        return NodeStyle {
            hidden: true,
            color: node.color,
            size: node.size,
            force_label: false,
        };
    }

    let focus = state.selected_node.as_ref().or(state.hovered_node.as_ref());
    let is_focused = focus.map(|id| *id == node.id).unwrap_or(false);
    let is_match = filters.node_matches(node);
    let filtering = filters.highlight.is_some();

    let size = if is_focused {
        node.size * 1.35
    } else if filtering {
        if is_match {
            node.size * 1.25
        } else {
            node.size * 0.95
        }
    } else {
        node.size
    };

    let color = if is_focused {
        theme::ACCENT
    } else if filtering && !is_match {
        theme::NODE_DIM
    } else {
        node.color
    };

    NodeStyle {
        hidden: false,
        color,
        size,
        force_label: is_focused,
    }
}

/// Edge override, in priority order: date filter, then selection, then
/// hover. Width never exceeds the smaller endpoint size minus one so edge
/// strokes stay inside the node markers.
pub fn edge_style(edge: &TransitionEdge, state: &GraphState, filters: &FilterState) -> EdgeStyle {
    let hidden = EdgeStyle {
        hidden: true,
        color: theme::EDGE_DEFAULT,
        width: 0.0,
    };

    if let Some(date) = &filters.active_date {
        if !edge.in_session(date) {
            return hidden;
        }
        return EdgeStyle {
            hidden: false,
            color: theme::EDGE_HIGHLIGHT,
            width: clamp_to_endpoints(edge.weight as f32, edge, state),
        };
    }

    if let Some(selected) = &state.selected_node {
        if !edge.touches(selected) {
            return hidden;
        }
        return EdgeStyle {
            hidden: false,
            color: theme::EDGE_HIGHLIGHT,
            width: clamp_to_endpoints(edge.weight as f32, edge, state),
        };
    }

    let is_hovered = state
        .hovered_edge
        .as_ref()
        .map(|(s, t)| *s == edge.source && *t == edge.target)
        .unwrap_or(false);

    EdgeStyle {
        hidden: false,
        color: if is_hovered {
            theme::EDGE_HIGHLIGHT
        } else {
            theme::EDGE_DEFAULT
        },
        width: if is_hovered {
            clamp_to_endpoints(edge.weight as f32, edge, state)
        } else {
            EDGE_BASE_WIDTH
        },
    }
}

fn clamp_to_endpoints(width: f32, edge: &TransitionEdge, state: &GraphState) -> f32 {
    let size_of = |id: &str| state.get_node(id).map(|n| n.size).unwrap_or(1.0);
    let cap = (size_of(&edge.source).min(size_of(&edge.target)) - 1.0).max(0.1);
    width.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{DocEdgeAttrs, DocNode, DocNodeAttrs, GraphDocument, SongMeta};

    fn song(key: &str, size: f32, genre: &[&str], playlists: &[&str]) -> DocNode {
        DocNode {
            key: key.to_string(),
            attributes: DocNodeAttrs {
                size: Some(size),
                data: SongMeta {
                    genre: genre.iter().map(|s| s.to_string()).collect(),
                    playlists: playlists.iter().map(|s| s.to_string()).collect(),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    fn library() -> GraphState {
        let mut state = GraphState::new();
        state.load(GraphDocument {
            nodes: vec![
                song("Warehouse Anthem", 6.0, &["House"], &["Warmup"]),
                song("Acid Test", 4.0, &["Techno"], &[]),
                song("Wallflower", 3.0, &[], &[]),
            ],
            edges: Vec::new(),
        });
        state.upsert_transition("Warehouse Anthem", "Acid Test", "2024-03-01", None, None);
        state.upsert_transition("Warehouse Anthem", "Acid Test", "2024-04-12", None, None);
        state
    }

    fn tag_filter(value: &str) -> FilterState {
        FilterState {
            highlight: Some((HighlightKind::Tag, value.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn tag_filter_matches_genre_field() {
        let state = library();
        let filters = tag_filter("House");
        let house = state.get_node("Warehouse Anthem").unwrap();
        let techno = state.get_node("Acid Test").unwrap();
        assert!(filters.node_matches(house));
        assert!(!filters.node_matches(techno));
    }

    #[test]
    fn playlist_filter_requires_exact_membership() {
        let state = library();
        let filters = FilterState {
            highlight: Some((HighlightKind::Playlist, "Warmup".to_string())),
            ..Default::default()
        };
        assert!(filters.node_matches(state.get_node("Warehouse Anthem").unwrap()));
        assert!(!filters.node_matches(state.get_node("Acid Test").unwrap()));
    }

    #[test]
    fn filter_enlarges_matches_and_dims_the_rest() {
        let state = library();
        let filters = tag_filter("House");

        let house = node_style(state.get_node("Warehouse Anthem").unwrap(), &state, &filters);
        assert_eq!(house.size, 6.0 * 1.25);
        assert_eq!(house.color, state.get_node("Warehouse Anthem").unwrap().color);

        let techno = node_style(state.get_node("Acid Test").unwrap(), &state, &filters);
        assert_eq!(techno.size, 4.0 * 0.95);
        assert_eq!(techno.color, theme::NODE_DIM);
    }

    #[test]
    fn focus_wins_over_filter_dimming() {
        let mut state = library();
        state.selected_node = Some("Acid Test".to_string());
        let filters = tag_filter("House");

        let style = node_style(state.get_node("Acid Test").unwrap(), &state, &filters);
        assert_eq!(style.color, theme::ACCENT);
        assert_eq!(style.size, 4.0 * 1.35);
        assert!(style.force_label);
    }

    #[test]
    fn orphans_hide_only_when_toggled() {
        let state = library();
        let wallflower = state.get_node("Wallflower").unwrap();

        let mut filters = FilterState::default();
        assert!(!node_style(wallflower, &state, &filters).hidden);
        filters.hide_orphans = true;
        assert!(node_style(wallflower, &state, &filters).hidden);
        // connected nodes are unaffected
        let house = state.get_node("Warehouse Anthem").unwrap();
        assert!(!node_style(house, &state, &filters).hidden);
    }

    #[test]
    fn date_filter_hides_unmatched_edges() {
        let state = library();
        let edge = state.get_edge("Warehouse Anthem", "Acid Test").unwrap();

        let mut filters = FilterState::default();
        filters.active_date = Some("2024-03-01".to_string());
        let style = edge_style(edge, &state, &filters);
        assert!(!style.hidden);
        assert_eq!(style.color, theme::EDGE_HIGHLIGHT);

        filters.active_date = Some("2019-01-01".to_string());
        assert!(edge_style(edge, &state, &filters).hidden);
    }

    #[test]
    fn selection_keeps_only_touching_edges() {
        let mut state = library();
        state.upsert_transition("Acid Test", "Wallflower", "2024-03-01", None, None);
        state.selected_node = Some("Wallflower".to_string());

        let touching = state.get_edge("Acid Test", "Wallflower").unwrap();
        let other = state.get_edge("Warehouse Anthem", "Acid Test").unwrap();
        let filters = FilterState::default();

        assert!(!edge_style(touching, &state, &filters).hidden);
        assert!(edge_style(other, &state, &filters).hidden);
    }

    #[test]
    fn hover_widens_within_endpoint_cap() {
        let mut state = library();
        let filters = FilterState::default();
        let edge_key = ("Warehouse Anthem".to_string(), "Acid Test".to_string());

        let edge = state.get_edge(&edge_key.0, &edge_key.1).unwrap().clone();
        let resting = edge_style(&edge, &state, &filters);
        assert_eq!(resting.width, EDGE_BASE_WIDTH);
        assert_eq!(resting.color, theme::EDGE_DEFAULT);

        state.hovered_edge = Some(edge_key);
        let hovered = edge_style(&edge, &state, &filters);
        assert_eq!(hovered.color, theme::EDGE_HIGHLIGHT);
        // weight 2, endpoint sizes 6 and 4: cap is 3, so width stays 2
        assert_eq!(hovered.width, 2.0);
        assert!(hovered.width <= 4.0 - 1.0);
    }

    #[test]
    fn width_clamps_to_smaller_endpoint() {
        let mut state = library();
        for _ in 0..20 {
            state.upsert_transition("Warehouse Anthem", "Acid Test", "2024-05-01", None, None);
        }
        state.selected_node = Some("Warehouse Anthem".to_string());
        let edge = state.get_edge("Warehouse Anthem", "Acid Test").unwrap();

        let style = edge_style(edge, &state, &FilterState::default());
        assert_eq!(style.width, 4.0 - 1.0);
    }

    #[test]
    fn reducers_are_idempotent() {
        let mut state = library();
        state.selected_node = Some("Warehouse Anthem".to_string());
        let filters = tag_filter("House");

        let node = state.get_node("Acid Test").unwrap();
        assert_eq!(
            node_style(node, &state, &filters),
            node_style(node, &state, &filters)
        );
        let edge = state.get_edge("Warehouse Anthem", "Acid Test").unwrap();
        assert_eq!(
            edge_style(edge, &state, &filters),
            edge_style(edge, &state, &filters)
        );
    }
}
