//! Cave cell types
//!
//! A generated cave is a [`Tilemap`] of [`CellKind`]. Every coordinate inside
//! the map holds exactly one cell.

use serde::{Deserialize, Serialize};

use crate::tilemap::Tilemap;

/// Kind of a cave cell as seen by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellKind {
    Ground,
    #[default]
    Wall,
    Door,
}

impl CellKind {
    /// Ground and doors can be walked on.
    pub fn is_walkable(&self) -> bool {
        matches!(self, CellKind::Ground | CellKind::Door)
    }

    pub fn ascii_char(&self) -> char {
        match self {
            CellKind::Ground => '.',
            CellKind::Wall => '#',
            CellKind::Door => '+',
        }
    }
}

/// A single cell with its coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub kind: CellKind,
}

/// A generated cave layout.
pub type Grid = Tilemap<CellKind>;

impl Grid {
    /// Iterate over every cell.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.iter().map(|(x, y, &kind)| Cell { x, y, kind })
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.iter().filter(|(_, _, &k)| k == kind).count()
    }
}

/// One text row per `y`, highest row first so north is up.
impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in (0..self.height).rev() {
            let row: String = (0..self.width).map(|x| self.get(x, y).ascii_char()).collect();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cell_is_wall() {
        let grid: Grid = Tilemap::new(3, 2);
        assert_eq!(grid.count(CellKind::Wall), 6);
        assert!(grid.cells().all(|c| c.kind == CellKind::Wall));
    }

    #[test]
    fn test_walkable() {
        assert!(CellKind::Ground.is_walkable());
        assert!(CellKind::Door.is_walkable());
        assert!(!CellKind::Wall.is_walkable());
    }

    #[test]
    fn test_display_puts_north_first() {
        let mut grid: Grid = Tilemap::new(3, 2);
        grid.set(0, 1, CellKind::Ground);
        grid.set(2, 0, CellKind::Door);

        assert_eq!(grid.to_string(), ".##\n##+\n");
    }

    #[test]
    fn test_cells_are_unique_per_coordinate() {
        let grid: Grid = Tilemap::new(4, 4);
        let mut coords: Vec<(usize, usize)> = grid.cells().map(|c| (c.x, c.y)).collect();
        coords.sort();
        coords.dedup();
        assert_eq!(coords.len(), 16);
    }
}
