//! Force-directed layout over the transition graph.
//!
//! One step combines:
//! - Repulsion between all node pairs (pairwise, or Barnes-Hut above a
//!   node-count threshold)
//! - Attraction along edges, scaled by transition weight, optionally
//!   log-compressed so heavily-played hubs don't collapse their neighborhood
//! - Gravity toward the origin so disconnected components stay on screen
//! - A slow-down divisor applied to the resulting displacement
//!
//! Deterministic given identical starting positions and settings; any
//! randomness belongs to initial placement.

use super::quadtree::Quadtree;
use super::types::GraphState;
use egui::{Pos2, Vec2};
use std::collections::HashMap;

/// Node count above which repulsion switches to the quadtree.
const BARNES_HUT_THRESHOLD: usize = 250;

const THETA: f32 = 0.8;

/// Layout tuning. `slow_down` is written every frame by the scheduler; the
/// rest comes from persisted settings.
#[derive(Debug, Clone, Copy)]
pub struct LayoutSettings {
    /// Pull toward the origin.
    pub gravity: f32,
    /// Repulsion strength between node pairs.
    pub scaling_ratio: f32,
    /// Displacement divisor; larger means smaller steps.
    pub slow_down: f32,
    /// Log-compress attraction for high-degree hubs.
    pub lin_log_mode: bool,
    /// Approximate long-range repulsion on large graphs.
    pub barnes_hut: bool,
    /// Distance floor before any division.
    pub min_distance: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            gravity: 0.06,
            scaling_ratio: 20.0,
            slow_down: 5.0,
            lin_log_mode: true,
            barnes_hut: true,
            min_distance: 0.01,
        }
    }
}

/// Run `iterations` passes of the force update, mutating node positions in
/// place through the store.
pub fn step(state: &mut GraphState, settings: &LayoutSettings, iterations: usize) {
    let node_count = state.nodes.len();
    if node_count < 2 || iterations == 0 {
        return;
    }

    let ids: Vec<String> = state.nodes.iter().map(|n| n.id.clone()).collect();
    // FA2-style mass: degree + 1, so hubs repel harder and resist gravity
    let masses: Vec<f32> = ids.iter().map(|id| (state.degree(id) + 1) as f32).collect();
    let index: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let min_distance = settings.min_distance.max(1e-4);
    let slow_down = settings.slow_down.max(1e-3);

    for _ in 0..iterations {
        let positions: Vec<Pos2> = ids
            .iter()
            .map(|id| state.get_pos(id).unwrap_or(Pos2::ZERO))
            .collect();
        let mut forces = vec![Vec2::ZERO; node_count];

        // Repulsion
        if settings.barnes_hut && node_count > BARNES_HUT_THRESHOLD {
            let bodies: Vec<(Pos2, f32)> = positions
                .iter()
                .zip(&masses)
                .map(|(&pos, &mass)| (pos, mass))
                .collect();
            if let Some(tree) = Quadtree::build(&bodies) {
                for (i, force) in forces.iter_mut().enumerate() {
                    *force += tree.repulsion(
                        positions[i],
                        masses[i],
                        settings.scaling_ratio,
                        min_distance,
                        THETA,
                    );
                }
            }
        } else {
            for i in 0..node_count {
                for j in (i + 1)..node_count {
                    let delta = positions[i] - positions[j];
                    let distance = delta.length().max(min_distance);
                    let magnitude =
                        settings.scaling_ratio * masses[i] * masses[j] / distance;
                    let push = if delta == Vec2::ZERO {
                        // coincident pair: pick a stable axis
                        Vec2::new(magnitude, 0.0)
                    } else {
                        (delta / distance) * magnitude
                    };
                    forces[i] += push;
                    forces[j] -= push;
                }
            }
        }

        // Attraction along edges, weight-scaled
        for edge in &state.edges {
            if edge.source == edge.target {
                continue;
            }
            let (Some(&si), Some(&ti)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                continue;
            };

            let delta = positions[ti] - positions[si];
            let distance = delta.length().max(min_distance);
            let reach = if settings.lin_log_mode {
                (1.0 + distance).ln()
            } else {
                distance
            };
            let pull = (delta / distance) * (edge.weight as f32 * reach);
            forces[si] += pull;
            forces[ti] -= pull;
        }

        // Gravity toward the origin
        for (i, force) in forces.iter_mut().enumerate() {
            let toward_center = Pos2::ZERO - positions[i];
            let distance = toward_center.length();
            if distance > min_distance {
                *force += (toward_center / distance) * (settings.gravity * masses[i]);
            }
        }

        // Apply damped displacement
        for (i, id) in ids.iter().enumerate() {
            let displacement = forces[i] / slow_down;
            if !displacement.x.is_finite() || !displacement.y.is_finite() {
                continue;
            }
            state.set_position(id, positions[i] + displacement);
        }
    }
}
