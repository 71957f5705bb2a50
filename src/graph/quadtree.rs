//! Barnes-Hut quadtree for approximate long-range repulsion.
//!
//! Pairwise repulsion is O(n²); above a few hundred songs that blows the
//! frame budget, so distant groups of nodes are collapsed into a single
//! center of mass.

use egui::{Pos2, Vec2};

/// A cell of the tree: empty, a single body, or four sub-cells with an
/// aggregated center of mass.
#[derive(Debug, Default)]
enum Cell {
    #[default]
    Empty,
    Body {
        pos: Pos2,
        mass: f32,
    },
    Split {
        center_of_mass: Pos2,
        mass: f32,
        children: Box<[Cell; 4]>,
    },
}

/// Square region covered by a cell, tracked as center + half side.
#[derive(Debug, Clone, Copy)]
struct Region {
    center: Pos2,
    half: f32,
}

impl Region {
    fn quadrant(&self, pos: Pos2) -> usize {
        let east = pos.x >= self.center.x;
        let south = pos.y >= self.center.y;
        (south as usize) << 1 | east as usize
    }

    fn child(&self, quadrant: usize) -> Region {
        let half = self.half / 2.0;
        let dx = if quadrant & 1 == 1 { half } else { -half };
        let dy = if quadrant & 2 == 2 { half } else { -half };
        Region {
            center: self.center + Vec2::new(dx, dy),
            half,
        }
    }

    fn side(&self) -> f32 {
        self.half * 2.0
    }
}

/// Coincident points would otherwise recurse forever.
const MAX_DEPTH: u32 = 32;

pub struct Quadtree {
    root: Cell,
    region: Region,
}

impl Quadtree {
    /// Build a tree over (position, mass) bodies. Returns `None` when there
    /// is nothing to repel against.
    pub fn build(bodies: &[(Pos2, f32)]) -> Option<Self> {
        let (first, _) = bodies.first()?;
        let mut min = *first;
        let mut max = *first;
        for (pos, _) in bodies {
            min.x = min.x.min(pos.x);
            min.y = min.y.min(pos.y);
            max.x = max.x.max(pos.x);
            max.y = max.y.max(pos.y);
        }

        let center = Pos2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
        let half = ((max.x - min.x).max(max.y - min.y) / 2.0 + 1.0).max(1.0);
        let region = Region { center, half };

        let mut tree = Self {
            root: Cell::Empty,
            region,
        };
        for &(pos, mass) in bodies {
            tree.root = Self::insert(std::mem::take(&mut tree.root), pos, mass, tree.region, 0);
        }
        Some(tree)
    }

    fn insert(cell: Cell, pos: Pos2, mass: f32, region: Region, depth: u32) -> Cell {
        if depth > MAX_DEPTH {
            // fold into the existing body rather than recursing further
            return match cell {
                Cell::Body {
                    pos: existing,
                    mass: existing_mass,
                } => Cell::Body {
                    pos: existing,
                    mass: existing_mass + mass,
                },
                other => other,
            };
        }

        match cell {
            Cell::Empty => Cell::Body { pos, mass },

            Cell::Body {
                pos: existing,
                mass: existing_mass,
            } => {
                let mut children =
                    Box::new([Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty]);
                let eq = region.quadrant(existing);
                children[eq] = Self::insert(
                    Cell::Empty,
                    existing,
                    existing_mass,
                    region.child(eq),
                    depth + 1,
                );
                let nq = region.quadrant(pos);
                children[nq] = Self::insert(
                    std::mem::take(&mut children[nq]),
                    pos,
                    mass,
                    region.child(nq),
                    depth + 1,
                );

                let total = existing_mass + mass;
                Cell::Split {
                    center_of_mass: Pos2::new(
                        (existing.x * existing_mass + pos.x * mass) / total,
                        (existing.y * existing_mass + pos.y * mass) / total,
                    ),
                    mass: total,
                    children,
                }
            }

            Cell::Split {
                center_of_mass,
                mass: cell_mass,
                mut children,
            } => {
                let q = region.quadrant(pos);
                children[q] = Self::insert(
                    std::mem::take(&mut children[q]),
                    pos,
                    mass,
                    region.child(q),
                    depth + 1,
                );

                let total = cell_mass + mass;
                Cell::Split {
                    center_of_mass: Pos2::new(
                        (center_of_mass.x * cell_mass + pos.x * mass) / total,
                        (center_of_mass.y * cell_mass + pos.y * mass) / total,
                    ),
                    mass: total,
                    children,
                }
            }
        }
    }

    /// Repulsion on a body of `mass` at `pos`. Magnitude is
    /// `scaling * mass * other_mass / distance`, with distance clamped to
    /// `min_distance` so near-coincident nodes cannot blow up.
    pub fn repulsion(
        &self,
        pos: Pos2,
        mass: f32,
        scaling: f32,
        min_distance: f32,
        theta: f32,
    ) -> Vec2 {
        Self::repulsion_from(&self.root, self.region, pos, mass, scaling, min_distance, theta)
    }

    fn repulsion_from(
        cell: &Cell,
        region: Region,
        pos: Pos2,
        mass: f32,
        scaling: f32,
        min_distance: f32,
        theta: f32,
    ) -> Vec2 {
        match cell {
            Cell::Empty => Vec2::ZERO,

            Cell::Body {
                pos: body_pos,
                mass: body_mass,
            } => {
                let delta = pos - *body_pos;
                // self-interaction: the querying body is in the tree too
                if delta == Vec2::ZERO {
                    return Vec2::ZERO;
                }
                let distance = delta.length().max(min_distance);
                let magnitude = scaling * mass * body_mass / distance;
                (delta / distance) * magnitude
            }

            Cell::Split {
                center_of_mass,
                mass: cell_mass,
                children,
            } => {
                let delta = pos - *center_of_mass;
                let distance = delta.length().max(min_distance);

                if region.side() / distance < theta {
                    let magnitude = scaling * mass * cell_mass / distance;
                    return (delta / distance) * magnitude;
                }

                let mut force = Vec2::ZERO;
                for (quadrant, child) in children.iter().enumerate() {
                    force += Self::repulsion_from(
                        child,
                        region.child(quadrant),
                        pos,
                        mass,
                        scaling,
                        min_distance,
                        theta,
                    );
                }
                force
            }
        }
    }
}
