//! Color constants for the graph canvas and UI panels.

use egui::Color32;

/// Node palette indexed by the identifier hash (see `graph::color`).
pub const NODE_PALETTE: [Color32; 10] = [
    Color32::from_rgb(0xFF, 0x99, 0x99), // pink
    Color32::from_rgb(0x66, 0xB3, 0xFF), // sky blue
    Color32::from_rgb(0x99, 0xFF, 0x99), // green
    Color32::from_rgb(0xFF, 0xCC, 0x99), // orange
    Color32::from_rgb(0xFF, 0x99, 0xCC), // violet pink
    Color32::from_rgb(0x99, 0xCC, 0xFF), // light blue
    Color32::from_rgb(0xFF, 0xD7, 0x00), // gold
    Color32::from_rgb(0xCC, 0x99, 0xFF), // lilac
    Color32::from_rgb(0x99, 0xFF, 0xCC), // mint
    Color32::from_rgb(0xFF, 0x99, 0x66), // coral
];

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Graph canvas
    pub const GRAPH: Color32 = Color32::from_rgb(14, 17, 23);

    /// Panels and the category screen
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 28);

    /// Cards, tooltips, the details window
    pub const SURFACE: Color32 = Color32::from_rgba_premultiplied(28, 30, 38, 235);
}

/// Accent colors
pub mod accent {
    use super::*;

    /// Layout progress
    pub const CYAN: Color32 = Color32::from_rgb(6, 182, 212);

    pub const RED: Color32 = Color32::from_rgb(239, 68, 68);

    /// Selection highlight
    pub const YELLOW: Color32 = Color32::from_rgb(255, 220, 80);
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);

    pub const SECONDARY: Color32 = Color32::from_rgb(180, 180, 190);

    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// Edge drawing
pub mod edge {
    use super::*;

    /// Grey at 0.8 alpha, before the user opacity multiplier
    pub const DEFAULT: Color32 = Color32::from_rgba_premultiplied(109, 109, 109, 204);

    /// Edges touching the hovered or selected node
    pub const HIGHLIGHT: Color32 = Color32::from_rgb(220, 220, 230);
}

/// State colors for interactive elements
pub mod state {
    use super::*;

    pub const HOVER: Color32 = Color32::WHITE;

    pub const SELECTED: Color32 = super::accent::YELLOW;

    pub const ERROR: Color32 = super::accent::RED;
}

/// Node rendering stroke widths
pub mod stroke_width {
    pub const NORMAL: f32 = 1.0;

    pub const HOVER: f32 = 2.0;

    pub const SELECTED: f32 = 3.0;
}

/// Helper to create a stroke with consistent styling
pub fn stroke(color: Color32, width: f32) -> egui::Stroke {
    egui::Stroke::new(width, color)
}
