//! Barnes-Hut quadtree for O(n log n) repulsion.
//!
//! Distant groups of nodes are treated as a single body at their center of
//! mass. Repulsion follows the ForceAtlas2 model: magnitude
//! `k * m1 * m2 / d`, optionally measuring `d` between node borders instead
//! of centers.

use egui::{Pos2, Vec2};

/// A body inserted into the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Pos2,
    /// 1 + degree
    pub mass: f32,
    /// Display radius, used when sizes are adjusted
    pub size: f32,
}

/// A node in the quadtree - either a leaf with one body, or an internal node with children
#[derive(Debug, Default)]
pub enum QuadNode {
    #[default]
    Empty,
    Leaf(Body),
    Internal {
        /// Center of mass of all bodies in this cell
        center_of_mass: Pos2,
        /// Total mass of all bodies in this cell
        total_mass: f32,
        /// Number of bodies in this cell
        count: u32,
        /// Children: NW, NE, SW, SE
        children: Box<[QuadNode; 4]>,
    },
}

/// Axis-aligned square cell
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Pos2,
    pub max: Pos2,
}

impl Bounds {
    pub fn new(min: Pos2, max: Pos2) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn size(&self) -> f32 {
        (self.max.x - self.min.x).max(self.max.y - self.min.y)
    }

    /// Get the quadrant for a position (0=NW, 1=NE, 2=SW, 3=SE)
    pub fn quadrant(&self, pos: Pos2) -> usize {
        let center = self.center();
        let east = pos.x >= center.x;
        let south = pos.y >= center.y;
        match (south, east) {
            (false, false) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (true, true) => 3,
        }
    }

    pub fn child_bounds(&self, quadrant: usize) -> Bounds {
        let center = self.center();
        match quadrant {
            0 => Bounds::new(self.min, center),
            1 => Bounds::new(Pos2::new(center.x, self.min.y), Pos2::new(self.max.x, center.y)),
            2 => Bounds::new(Pos2::new(self.min.x, center.y), Pos2::new(center.x, self.max.y)),
            _ => Bounds::new(center, self.max),
        }
    }
}

/// Repulsion parameters shared by every query against one tree
#[derive(Debug, Clone, Copy)]
pub struct Repulsion {
    /// ForceAtlas2 scaling ratio
    pub coefficient: f32,
    /// Measure distance between node borders instead of centers
    pub adjust_sizes: bool,
}

/// Barnes-Hut quadtree
pub struct Quadtree {
    pub root: QuadNode,
    pub bounds: Bounds,
    /// cell_size / distance threshold below which a cell is approximated.
    /// Higher = faster but less accurate.
    pub theta: f32,
}

/// Recursion cap for coincident bodies
const MAX_DEPTH: u32 = 50;

/// Overlapping nodes get this multiple of the plain repulsion factor
const OVERLAP_FACTOR: f32 = 100.0;

impl Quadtree {
    pub fn build(bodies: &[Body], theta: f32) -> Self {
        if bodies.is_empty() {
            return Self {
                root: QuadNode::Empty,
                bounds: Bounds::new(Pos2::ZERO, Pos2::ZERO),
                theta,
            };
        }

        let (mut min, mut max) = (bodies[0].pos, bodies[0].pos);
        for body in bodies {
            min = min.min(body.pos);
            max = max.max(body.pos);
        }

        // Layout coordinates start in [0, 1), so pad relative to the extent
        let padding = ((max.x - min.x).max(max.y - min.y) * 0.05).max(1e-3);
        min -= Vec2::splat(padding);
        max += Vec2::splat(padding);

        // Square cells
        let size = (max.x - min.x).max(max.y - min.y);
        let bounds = Bounds::new(min, min + Vec2::splat(size));

        let mut tree = Self {
            root: QuadNode::Empty,
            bounds,
            theta,
        };
        for &body in bodies {
            tree.insert(body);
        }
        tree
    }

    pub fn insert(&mut self, body: Body) {
        self.root = Self::insert_into(std::mem::take(&mut self.root), body, self.bounds, 0);
    }

    fn insert_into(node: QuadNode, body: Body, bounds: Bounds, depth: u32) -> QuadNode {
        if depth > MAX_DEPTH {
            return node;
        }

        match node {
            QuadNode::Empty => QuadNode::Leaf(body),

            QuadNode::Leaf(existing) => {
                let mut children: Box<[QuadNode; 4]> = Box::default();

                let eq = bounds.quadrant(existing.pos);
                children[eq] = Self::insert_into(QuadNode::Empty, existing, bounds.child_bounds(eq), depth + 1);

                let nq = bounds.quadrant(body.pos);
                children[nq] = Self::insert_into(
                    std::mem::take(&mut children[nq]),
                    body,
                    bounds.child_bounds(nq),
                    depth + 1,
                );

                let total_mass = existing.mass + body.mass;
                let center_of_mass = weighted_center(existing.pos, existing.mass, body.pos, body.mass);

                QuadNode::Internal {
                    center_of_mass,
                    total_mass,
                    count: 2,
                    children,
                }
            }

            QuadNode::Internal {
                center_of_mass,
                total_mass,
                count,
                mut children,
            } => {
                let q = bounds.quadrant(body.pos);
                children[q] = Self::insert_into(
                    std::mem::take(&mut children[q]),
                    body,
                    bounds.child_bounds(q),
                    depth + 1,
                );

                QuadNode::Internal {
                    center_of_mass: weighted_center(center_of_mass, total_mass, body.pos, body.mass),
                    total_mass: total_mass + body.mass,
                    count: count + 1,
                    children,
                }
            }
        }
    }

    /// Net repulsion on `body` from everything in the tree.
    pub fn repulsion_on(&self, body: Body, params: Repulsion) -> Vec2 {
        self.force_recursive(&self.root, body, params, self.bounds)
    }

    fn force_recursive(&self, node: &QuadNode, body: Body, params: Repulsion, bounds: Bounds) -> Vec2 {
        match node {
            QuadNode::Empty => Vec2::ZERO,

            QuadNode::Leaf(other) => {
                let delta = body.pos - other.pos;
                // Self, or a coincident node with no direction to push along
                if delta.length_sq() < f32::EPSILON {
                    return Vec2::ZERO;
                }
                pair_repulsion(body, *other, delta, params)
            }

            QuadNode::Internal {
                center_of_mass,
                total_mass,
                children,
                ..
            } => {
                let delta = body.pos - *center_of_mass;
                let distance = delta.length();

                if distance > 0.0 && bounds.size() / distance < self.theta {
                    // Far enough: treat the cell as one body
                    let mut factor = params.coefficient * body.mass * total_mass / delta.length_sq();
                    if params.adjust_sizes {
                        let border = distance - body.size;
                        if border > 0.0 {
                            factor = params.coefficient * body.mass * total_mass / (border * border);
                        }
                    }
                    delta * factor
                } else {
                    children
                        .iter()
                        .enumerate()
                        .map(|(i, child)| self.force_recursive(child, body, params, bounds.child_bounds(i)))
                        .fold(Vec2::ZERO, |acc, f| acc + f)
                }
            }
        }
    }
}

/// Exact repulsion between two bodies; `delta` points from `other` to `body`.
fn pair_repulsion(body: Body, other: Body, delta: Vec2, params: Repulsion) -> Vec2 {
    let masses = params.coefficient * body.mass * other.mass;
    let factor = if params.adjust_sizes {
        let border = delta.length() - body.size - other.size;
        if border > 0.0 {
            masses / (border * border)
        } else {
            OVERLAP_FACTOR * masses
        }
    } else {
        masses / delta.length_sq()
    };
    delta * factor
}

fn weighted_center(a: Pos2, mass_a: f32, b: Pos2, mass_b: f32) -> Pos2 {
    let total = mass_a + mass_b;
    Pos2::new(
        (a.x * mass_a + b.x * mass_b) / total,
        (a.y * mass_a + b.y * mass_b) / total,
    )
}
