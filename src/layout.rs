use serde::Deserialize;

use crate::models::Position;

/// Grid used to place hydrated and newly added nodes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub origin_x: f64,
    pub origin_y: f64,
    pub columns: usize,
    pub column_spacing: f64,
    pub row_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 500.0,
            origin_y: 200.0,
            columns: 3,
            column_spacing: 320.0,
            row_spacing: 220.0,
        }
    }
}

impl LayoutConfig {
    pub fn position_for(&self, index: usize) -> Position {
        let columns = self.columns.max(1);
        let column = index % columns;
        let row = index / columns;
        Position {
            x: self.origin_x + column as f64 * self.column_spacing,
            y: self.origin_y + row as f64 * self.row_spacing,
        }
    }
}

/// Position of the `index`-th node on the default three-column grid.
pub fn position_for(index: usize) -> Position {
    LayoutConfig::default().position_for(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_wraps_after_three_columns() {
        assert_eq!(position_for(0), Position { x: 500.0, y: 200.0 });
        assert_eq!(position_for(1), Position { x: 820.0, y: 200.0 });
        assert_eq!(position_for(2), Position { x: 1140.0, y: 200.0 });
        assert_eq!(position_for(3), Position { x: 500.0, y: 420.0 });
        assert_eq!(position_for(7), Position { x: 820.0, y: 640.0 });
    }

    #[test]
    fn zero_columns_falls_back_to_single_column() {
        let layout = LayoutConfig {
            columns: 0,
            ..LayoutConfig::default()
        };
        assert_eq!(layout.position_for(2), Position { x: 500.0, y: 640.0 });
    }
}
