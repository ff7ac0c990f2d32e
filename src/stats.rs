//! Layout metrics for comparing generators
//!
//! Diversity counts ground cells by the shape of their surroundings; complexity
//! is the mean A* cost between random pairs of reachable ground cells.

use rand::Rng;

use crate::cave::{CellKind, Grid};
use crate::pathfinding::find_path_cost;
use crate::tilemap::Neighbor;

/// Give up sampling after this many tries per requested pair.
const ATTEMPTS_PER_SAMPLE: usize = 20;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutStats {
    /// Ground with no cardinal wall
    pub open: usize,
    /// Ground with exactly one cardinal wall
    pub wall_adjacent: usize,
    /// Two walls on opposite sides
    pub corridor: usize,
    /// Two walls on adjacent sides
    pub corner: usize,
    /// Three walls
    pub dead_end: usize,
    /// Mean path cost in cells, `None` when no pair could be sampled
    pub complexity: Option<f32>,
    /// Pairs that contributed to `complexity`
    pub sampled_pairs: usize,
}

impl LayoutStats {
    pub fn classified(&self) -> usize {
        self.open + self.wall_adjacent + self.corridor + self.corner + self.dead_end
    }
}

/// Measure diversity and complexity of `grid` using up to `samples` path pairs.
pub fn layout_stats<R: Rng>(grid: &Grid, rng: &mut R, samples: usize) -> LayoutStats {
    let mut stats = LayoutStats::default();
    classify_ground(grid, &mut stats);

    let ground: Vec<(usize, usize)> = grid
        .iter()
        .filter(|(_, _, kind)| **kind == CellKind::Ground)
        .map(|(x, y, _)| (x, y))
        .collect();
    if ground.len() < 2 || samples == 0 {
        return stats;
    }

    let mut sum = 0.0;
    let mut attempts = 0;
    while stats.sampled_pairs < samples && attempts < samples * ATTEMPTS_PER_SAMPLE {
        attempts += 1;

        let start = ground[rng.gen_range(0..ground.len())];
        let end = ground[rng.gen_range(0..ground.len())];
        if start == end {
            continue;
        }

        if let Some(cost) = find_path_cost(grid, start, end) {
            sum += cost as f32 / 10.0;
            stats.sampled_pairs += 1;
        }
    }

    if stats.sampled_pairs > 0 {
        stats.complexity = Some(sum / stats.sampled_pairs as f32);
    }
    stats
}

fn classify_ground(grid: &Grid, stats: &mut LayoutStats) {
    for (x, y, kind) in grid.iter() {
        if *kind != CellKind::Ground {
            continue;
        }

        // N, E, S, W; off-grid counts as wall
        let mut walls = [false; 4];
        for (i, neighbor) in grid.von_neumann(x, y).enumerate() {
            walls[i] = match neighbor {
                Neighbor::OnGrid(nx, ny) => *grid.get(nx, ny) == CellKind::Wall,
                Neighbor::OffGrid(..) => true,
            };
        }

        match walls.iter().filter(|&&w| w).count() {
            0 => stats.open += 1,
            1 => stats.wall_adjacent += 1,
            2 if walls == [true, false, true, false] || walls == [false, true, false, true] => stats.corridor += 1,
            2 => stats.corner += 1,
            3 => stats.dead_end += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tilemap;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_classifies_plus_shape() {
        // Plus shape: centre open on all sides, arms are dead ends
        let mut grid: Grid = Tilemap::new(5, 5);
        for (x, y) in [(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)] {
            grid.set(x, y, CellKind::Ground);
        }

        let stats = layout_stats(&grid, &mut ChaCha8Rng::seed_from_u64(0), 0);
        assert_eq!(stats.open, 1);
        assert_eq!(stats.dead_end, 4);
        assert_eq!(stats.classified(), 5);
        assert_eq!(stats.complexity, None);
    }

    #[test]
    fn test_corridor_and_corner() {
        // L-shaped passage: (1,1) (2,1) (3,1) (3,2) (3,3)
        let mut grid: Grid = Tilemap::new(5, 5);
        for (x, y) in [(1, 1), (2, 1), (3, 1), (3, 2), (3, 3)] {
            grid.set(x, y, CellKind::Ground);
        }

        let stats = layout_stats(&grid, &mut ChaCha8Rng::seed_from_u64(0), 0);
        assert_eq!(stats.corridor, 2);
        assert_eq!(stats.corner, 1);
        assert_eq!(stats.dead_end, 2);
    }

    #[test]
    fn test_doors_are_not_walls() {
        let mut grid: Grid = Tilemap::new(3, 1);
        grid.set(0, 0, CellKind::Ground);
        grid.set(1, 0, CellKind::Door);
        grid.set(2, 0, CellKind::Ground);

        // N, S and W (off-grid) are walls, E is a door
        let stats = layout_stats(&grid, &mut ChaCha8Rng::seed_from_u64(0), 0);
        assert_eq!(stats.dead_end, 2);
    }

    #[test]
    fn test_complexity_on_a_row() {
        let mut grid: Grid = Tilemap::new(6, 3);
        for x in 0..6 {
            grid.set(x, 1, CellKind::Ground);
        }

        let stats = layout_stats(&grid, &mut ChaCha8Rng::seed_from_u64(3), 50);
        assert_eq!(stats.sampled_pairs, 50);
        let complexity = stats.complexity.unwrap();
        assert!((1.0..=5.0).contains(&complexity));
    }

    #[test]
    fn test_unreachable_pairs_are_skipped() {
        // Two islands; only pairs inside an island count
        let mut grid: Grid = Tilemap::new(7, 1);
        for x in [0, 1, 5, 6] {
            grid.set(x, 0, CellKind::Ground);
        }

        let stats = layout_stats(&grid, &mut ChaCha8Rng::seed_from_u64(1), 10);
        assert_eq!(stats.complexity, Some(1.0));
    }
}
