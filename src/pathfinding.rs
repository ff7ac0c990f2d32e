//! A* path cost search over walkable cave cells
//!
//! Costs are integers: every step and the heuristic use the Euclidean distance
//! scaled by 10 and truncated, so a straight step costs 10 and a diagonal 14.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::cave::{CellKind, Grid};
use crate::tilemap::Tilemap;

/// Per-search bookkeeping for one cell.
#[derive(Clone, Copy, Default)]
struct Node {
    g_cost: u32,
    h_cost: u32,
    parent: Option<(usize, usize)>,
    open: bool,
    closed: bool,
}

impl Node {
    fn f_cost(&self) -> u32 {
        self.g_cost + self.h_cost
    }
}

/// Entry in the open set. Stale entries are skipped when popped.
#[derive(Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f_cost: u32,
    h_cost: u32,
    x: usize,
    y: usize,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap: lowest f first, then lowest h
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| (other.y, other.x).cmp(&(self.y, self.x)))
    }
}

/// Scaled Euclidean distance between two cells.
fn distance_cost(a: (usize, usize), b: (usize, usize)) -> u32 {
    let dx = a.0.abs_diff(b.0) as f64;
    let dy = a.1.abs_diff(b.1) as f64;
    ((dx * dx + dy * dy).sqrt() * 10.0) as u32
}

/// Find the cost of the cheapest path between two cells.
///
/// Returns `None` when either end is a wall or no route exists. The grid is
/// only read.
///
/// # Panics
///
/// Panics if `start` or `goal` lies outside the grid.
pub fn find_path_cost(grid: &Grid, start: (usize, usize), goal: (usize, usize)) -> Option<u32> {
    find_path(grid, start, goal).map(|(cost, _)| cost)
}

/// Like [`find_path_cost`], also returning the cells walked from start to goal.
pub fn find_path(grid: &Grid, start: (usize, usize), goal: (usize, usize)) -> Option<(u32, Vec<(usize, usize)>)> {
    if *grid.get(start.0, start.1) == CellKind::Wall || *grid.get(goal.0, goal.1) == CellKind::Wall {
        return None;
    }

    let mut nodes: Tilemap<Node> = Tilemap::new(grid.width, grid.height);
    let mut open = BinaryHeap::new();

    let h_start = distance_cost(start, goal);
    *nodes.get_mut(start.0, start.1) = Node {
        g_cost: 0,
        h_cost: h_start,
        parent: None,
        open: true,
        closed: false,
    };
    open.push(OpenEntry { f_cost: h_start, h_cost: h_start, x: start.0, y: start.1 });

    while let Some(entry) = open.pop() {
        let current = *nodes.get(entry.x, entry.y);
        if current.closed || current.f_cost() != entry.f_cost || current.h_cost != entry.h_cost {
            continue;
        }

        let node = nodes.get_mut(entry.x, entry.y);
        node.open = false;
        node.closed = true;

        if (entry.x, entry.y) == goal {
            return Some((current.f_cost(), reconstruct(&nodes, goal)));
        }

        for (nx, ny) in grid.on_grid_moore(entry.x, entry.y) {
            let neighbor = *nodes.get(nx, ny);
            if *grid.get(nx, ny) == CellKind::Wall || neighbor.closed {
                continue;
            }

            let g_cost = current.g_cost + distance_cost((entry.x, entry.y), (nx, ny));
            let h_cost = distance_cost((nx, ny), goal);
            let f_cost = g_cost + h_cost;

            if f_cost < neighbor.f_cost() || !neighbor.open {
                *nodes.get_mut(nx, ny) = Node {
                    g_cost,
                    h_cost,
                    parent: Some((entry.x, entry.y)),
                    open: true,
                    closed: false,
                };
                open.push(OpenEntry { f_cost, h_cost, x: nx, y: ny });
            }
        }
    }

    None
}

fn reconstruct(nodes: &Tilemap<Node>, goal: (usize, usize)) -> Vec<(usize, usize)> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(prev) = nodes.get(current.0, current.1).parent {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}
