//! Drag interaction: press on a node, move it in graph space, release.
//!
//! While a drag is active the camera must not pan, and every gesture phase
//! reheats the scheduler so neighbors keep reacting to the moved node.

use crate::graph::types::GraphState;
use crate::sim::Simulation;
use egui::Pos2;

pub struct DragController {
    dragged_node: Option<String>,
    dragging: bool,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            dragged_node: None,
            dragging: false,
        }
    }

    /// Pointer-down over a node. Ignored when the id doesn't resolve.
    pub fn on_node_press(
        &mut self,
        node_id: &str,
        state: &GraphState,
        sim: &mut Simulation,
        now_ms: f64,
    ) {
        if !state.contains_node(node_id) {
            return;
        }
        self.dragged_node = Some(node_id.to_string());
        self.dragging = true;
        sim.reheat(now_ms);
    }

    /// Pointer moved while captured; `graph_pos` is already converted from
    /// viewport to graph space by the presentation layer. Returns true when
    /// the move was consumed by a drag (so the caller suppresses panning).
    pub fn on_pointer_move(
        &mut self,
        graph_pos: Pos2,
        state: &mut GraphState,
        sim: &mut Simulation,
        now_ms: f64,
    ) -> bool {
        if !self.dragging {
            return false;
        }
        let Some(node_id) = self.dragged_node.clone() else {
            return false;
        };
        // direct override, bypassing the layout for this node this frame
        state.set_position(&node_id, graph_pos);
        sim.reheat(now_ms);
        true
    }

    /// Pointer-up. A release with no active drag is a no-op.
    pub fn on_pointer_release(&mut self, sim: &mut Simulation, now_ms: f64) {
        if !self.dragging {
            return;
        }
        self.dragging = false;
        self.dragged_node = None;
        // let the layout re-settle around the dropped node
        sim.reheat(now_ms);
    }

    /// True while a node drag should suppress camera panning.
    pub fn camera_locked(&self) -> bool {
        self.dragging
    }

    pub fn dragged_node(&self) -> Option<&str> {
        self.dragged_node.as_deref()
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}
