//! Editor configuration

use crate::graph::{MarkerStyle, Position};
use serde::{Deserialize, Serialize};

/// How fresh activity and transition ids are drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// `<prefix>_<uuid v4>`
    #[default]
    Uuid,
    /// `<prefix>_<n>`, counting up past every id already seen
    Counter,
}

/// Deterministic grid used to place nodes that have no stored position
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Position of the first slot
    pub origin: Position,
    pub column_spacing: f64,
    pub row_spacing: f64,
    /// Slots per row; zero is treated as one
    pub columns: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            origin: Position::new(100.0, 100.0),
            column_spacing: 220.0,
            row_spacing: 140.0,
            columns: 4,
        }
    }
}

impl PlacementConfig {
    /// Position of the `index`-th slot, filling rows left to right
    pub fn slot(&self, index: usize) -> Position {
        let columns = self.columns.max(1) as usize;
        let column = (index % columns) as f64;
        let row = (index / columns) as f64;
        Position::new(
            self.origin.x + column * self.column_spacing,
            self.origin.y + row * self.row_spacing,
        )
    }
}

/// Visual defaults applied to edges
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStyleConfig {
    pub animated: bool,
    pub marker: MarkerStyle,
}

impl Default for EdgeStyleConfig {
    fn default() -> Self {
        Self {
            animated: true,
            marker: MarkerStyle::ArrowClosed,
        }
    }
}

/// Configuration for an editing session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub id_strategy: IdStrategy,
    /// Draws attempted before an id collision becomes fatal
    pub max_id_attempts: u32,
    pub placement: PlacementConfig,
    pub edge_style: EdgeStyleConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Uuid,
            max_id_attempts: 8,
            placement: PlacementConfig::default(),
            edge_style: EdgeStyleConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    pub fn with_max_id_attempts(mut self, attempts: u32) -> Self {
        self.max_id_attempts = attempts;
        self
    }

    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_edge_style(mut self, animated: bool, marker: MarkerStyle) -> Self {
        self.edge_style = EdgeStyleConfig { animated, marker };
        self
    }
}
