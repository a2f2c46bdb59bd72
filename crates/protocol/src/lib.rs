pub mod graph;
pub mod lookup;

pub use graph::{Category, Cell, Column, FlameBox, FlameGraph, LocationId, color_fraction};
pub use lookup::{Direction, box_at, column_for_x, nearest_at_depth};
