//! Force-directed graph layout.
//!
//! A ForceAtlas2-style simulation:
//! - Repulsion between all nodes, proportional to the product of their masses
//!   (1 + degree) - O(n log n) via Barnes-Hut
//! - Attraction along edges, linear or logarithmic (LinLog)
//! - Gravity toward the origin, optionally distance-independent ("strong")
//! - Per-node adaptive speed from swinging/traction so oscillating nodes slow down
//!
//! Tuning depends on graph size (see [`LayoutPlan::for_node_count`]); a
//! [`LayoutRun`] runs the simulation for a fixed wall-clock duration.

use super::quadtree::{Body, Quadtree, Repulsion};
use super::types::GraphState;
use egui::Vec2;
use std::time::{Duration, Instant};

/// Force clamp applied when node sizes are adjusted
const MAX_FORCE: f32 = 10.0;

/// Base node speed
const SPEED: f32 = 0.1;

/// ForceAtlas2 settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSettings {
    /// Simulation iterations per frame
    pub iterations_per_tick: usize,
    /// Repulsion strength
    pub scaling_ratio: f32,
    /// Pull toward the origin
    pub gravity: f32,
    /// Gravity independent of distance
    pub strong_gravity_mode: bool,
    /// Measure distances between node borders, prevent overlap
    pub adjust_sizes: bool,
    /// Logarithmic attraction
    pub lin_log_mode: bool,
    /// Exponent applied to edge weights
    pub edge_weight_influence: f32,
    /// Divides every displacement
    pub slow_down: f32,
    /// Barnes-Hut approximation threshold
    pub theta: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            iterations_per_tick: 1,
            scaling_ratio: 1.0,
            gravity: 50000.0,
            strong_gravity_mode: true,
            adjust_sizes: true,
            lin_log_mode: true,
            edge_weight_influence: 1000.0,
            slow_down: 1.0,
            theta: 0.5,
        }
    }
}

/// Settings plus how long to run them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPlan {
    pub duration: Duration,
    pub settings: LayoutSettings,
}

impl LayoutPlan {
    /// Tuning by node count. Small graphs settle quickly with weak gravity;
    /// large ones get long runs with strong gravity.
    pub fn for_node_count(node_count: usize) -> Self {
        let defaults = LayoutSettings::default();
        let (duration_ms, scaling_ratio, gravity) = match node_count {
            0..=500 => (3_000, 10.0, 10.0),
            501..=1000 => (5_000, 10.0, defaults.gravity),
            1001..=1500 => (10_000, 1.0, defaults.gravity),
            1501..=2000 => (10_000, 100.0, defaults.gravity),
            2001..=3000 => (10_000, 1.0, defaults.gravity),
            3001..=5000 => (15_000, defaults.scaling_ratio, defaults.gravity),
            _ => (90_000, defaults.scaling_ratio, defaults.gravity),
        };
        Self {
            duration: Duration::from_millis(duration_ms),
            settings: LayoutSettings {
                scaling_ratio,
                gravity,
                ..defaults
            },
        }
    }
}

/// Force-directed layout
#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    pub settings: LayoutSettings,
}

impl ForceLayout {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    /// Run one iteration of the force simulation
    pub fn step(&self, state: &mut GraphState) {
        let n = state.node_count();
        if n == 0 {
            return;
        }
        let s = &self.settings;

        let masses: Vec<f32> = (0..n).map(|i| 1.0 + state.degree(i) as f32).collect();
        let bodies: Vec<Body> = (0..n)
            .map(|i| Body {
                pos: state.positions[i],
                mass: masses[i],
                size: state.data.nodes[i].size,
            })
            .collect();

        let mut forces = vec![Vec2::ZERO; n];

        // Repulsion
        let tree = Quadtree::build(&bodies, s.theta);
        let repulsion = Repulsion {
            coefficient: s.scaling_ratio,
            adjust_sizes: s.adjust_sizes,
        };
        for (i, body) in bodies.iter().enumerate() {
            forces[i] += tree.repulsion_on(*body, repulsion);
        }

        // Gravity
        let g = s.gravity / s.scaling_ratio;
        for (i, body) in bodies.iter().enumerate() {
            let to_origin = body.pos.to_vec2();
            let distance = to_origin.length();
            if distance > 0.0 {
                let factor = if s.strong_gravity_mode {
                    s.scaling_ratio * body.mass * g
                } else {
                    s.scaling_ratio * body.mass * g / distance
                };
                forces[i] -= to_origin * factor;
            }
        }

        // Attraction; edges carry no weight attribute, so every weight is 1
        let weight_coefficient = 1.0f32.powf(s.edge_weight_influence);
        for (src, dst) in state.edge_endpoints() {
            if src == dst {
                continue;
            }
            let delta = bodies[src].pos - bodies[dst].pos;
            let mut distance = delta.length();
            if s.adjust_sizes {
                distance -= bodies[src].size + bodies[dst].size;
            }
            if distance <= 0.0 {
                continue;
            }
            let factor = if s.lin_log_mode {
                -weight_coefficient * (1.0 + distance).ln() / distance
            } else {
                -weight_coefficient
            };
            forces[src] += delta * factor;
            forces[dst] -= delta * factor;
        }

        // Apply with adaptive per-node speed
        for i in 0..n {
            let mut force = forces[i];
            if !force.is_finite() {
                continue;
            }
            if s.adjust_sizes {
                let len = force.length();
                if len > MAX_FORCE {
                    force *= MAX_FORCE / len;
                }
            }

            let previous = state.previous_forces[i];
            let swinging = masses[i] * (previous - force).length();
            let traction = (previous + force).length() / 2.0;
            let speed = SPEED * (1.0 + traction).ln() / (1.0 + swinging.sqrt());

            state.positions[i] += force * (speed / s.slow_down);
            state.previous_forces[i] = force;
        }
    }
}

/// A layout simulation that runs for a fixed wall-clock duration and then
/// stops itself.
pub struct LayoutRun {
    layout: ForceLayout,
    duration: Duration,
    started: Instant,
    running: bool,
    iterations: u64,
}

impl LayoutRun {
    /// Start a run tuned for a graph of `node_count` nodes
    pub fn start(node_count: usize) -> Self {
        Self::with_plan(LayoutPlan::for_node_count(node_count), Instant::now())
    }

    pub fn with_plan(plan: LayoutPlan, started: Instant) -> Self {
        tracing::info!(
            "Layout started: {:.0}s, scaling ratio {}, gravity {}",
            plan.duration.as_secs_f32(),
            plan.settings.scaling_ratio,
            plan.settings.gravity
        );
        Self {
            layout: ForceLayout::new(plan.settings),
            duration: plan.duration,
            started,
            running: true,
            iterations: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Time left before the run stops on its own
    pub fn remaining(&self, now: Instant) -> Duration {
        if !self.running {
            return Duration::ZERO;
        }
        self.duration.saturating_sub(now.saturating_duration_since(self.started))
    }

    /// Advance one frame. Returns whether the run is still going.
    pub fn tick(&mut self, state: &mut GraphState) -> bool {
        self.tick_at(state, Instant::now())
    }

    pub fn tick_at(&mut self, state: &mut GraphState, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        if now.saturating_duration_since(self.started) >= self.duration {
            self.stop_at(now);
            return false;
        }
        for _ in 0..self.layout.settings.iterations_per_tick {
            self.layout.step(state);
            self.iterations += 1;
        }
        true
    }

    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    fn stop_at(&mut self, now: Instant) {
        if self.running {
            self.running = false;
            tracing::info!(
                "Layout stopped after {:.1}s ({} iterations)",
                now.saturating_duration_since(self.started).as_secs_f32(),
                self.iterations
            );
        }
    }
}
