//! Region extraction
//!
//! Groups same-kind cells into 4-connected regions with a breadth-first flood
//! fill.

use std::collections::VecDeque;

use crate::tilemap::Tilemap;

/// A maximal 4-connected set of cells sharing one kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub cells: Vec<(usize, usize)>,
}

impl Region {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Flood-fill every cell reachable from `(x, y)` through Von Neumann
/// neighbours of the same kind as the start cell. The start cell comes first.
pub fn extract_region<T: Copy + PartialEq>(map: &Tilemap<T>, x: usize, y: usize) -> Vec<(usize, usize)> {
    let mut visited = Tilemap::new_with(map.width, map.height, false);
    flood(map, x, y, &mut visited)
}

/// Extract all regions of `kind`, scanning row by row. Regions are disjoint and
/// together cover every cell of that kind.
pub fn extract_all_regions<T: Copy + PartialEq>(map: &Tilemap<T>, kind: T) -> Vec<Region> {
    let mut claimed = Tilemap::new_with(map.width, map.height, false);
    let mut regions = Vec::new();

    for y in 0..map.height {
        for x in 0..map.width {
            if *claimed.get(x, y) || *map.get(x, y) != kind {
                continue;
            }
            let cells = flood(map, x, y, &mut claimed);
            regions.push(Region { cells });
        }
    }

    regions
}

fn flood<T: Copy + PartialEq>(
    map: &Tilemap<T>,
    x: usize,
    y: usize,
    visited: &mut Tilemap<bool>,
) -> Vec<(usize, usize)> {
    let kind = *map.get(x, y);
    let mut cells = Vec::new();
    let mut queue = VecDeque::new();

    visited.set(x, y, true);
    queue.push_back((x, y));

    while let Some((cx, cy)) = queue.pop_front() {
        cells.push((cx, cy));

        for (nx, ny) in map.on_grid_von_neumann(cx, cy) {
            if !*visited.get(nx, ny) && *map.get(nx, ny) == kind {
                visited.set(nx, ny, true);
                queue.push_back((nx, ny));
            }
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cave::{CellKind, Grid};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn grid_from_rows(rows: &[&str]) -> Grid {
        let height = rows.len();
        let width = rows[0].len();
        let mut grid: Grid = Tilemap::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let kind = if ch == '.' { CellKind::Ground } else { CellKind::Wall };
                grid.set(x, y, kind);
            }
        }
        grid
    }

    #[test]
    fn test_region_is_four_connected() {
        // Diagonal neighbours do not join regions
        let grid = grid_from_rows(&[
            ".#.",
            "#.#",
            "...",
        ]);

        let region = extract_region(&grid, 0, 0);
        assert_eq!(region, vec![(0, 0)]);

        let bottom = extract_region(&grid, 1, 1);
        assert_eq!(bottom.len(), 4);
        assert_eq!(bottom[0], (1, 1));
    }

    #[test]
    fn test_all_regions_in_scan_order() {
        let grid = grid_from_rows(&[
            "..#..",
            "#####",
            "..#..",
        ]);

        let regions = extract_all_regions(&grid, CellKind::Ground);
        assert_eq!(regions.len(), 4);
        assert_eq!(regions[0].cells[0], (0, 0));
        assert_eq!(regions[1].cells[0], (3, 0));
        assert_eq!(regions[2].cells[0], (0, 2));
        assert!(regions.iter().all(|r| r.len() == 2));

        let walls = extract_all_regions(&grid, CellKind::Wall);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].len(), 7);
    }

    #[test]
    fn test_regions_partition_random_grids() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for _ in 0..20 {
            let mut grid: Grid = Tilemap::new(17, 11);
            for (_, _, cell) in grid.iter_mut() {
                if rng.gen_bool(0.55) {
                    *cell = CellKind::Ground;
                }
            }

            for kind in [CellKind::Ground, CellKind::Wall] {
                let regions = extract_all_regions(&grid, kind);
                let mut covered = Tilemap::new_with(grid.width, grid.height, 0u32);
                for region in &regions {
                    for &(x, y) in &region.cells {
                        assert_eq!(*grid.get(x, y), kind);
                        *covered.get_mut(x, y) += 1;
                    }
                }
                for (x, y, &k) in grid.iter() {
                    let expected = if k == kind { 1 } else { 0 };
                    assert_eq!(*covered.get(x, y), expected);
                }
            }
        }
    }
}
