//! Breadth-first search over the maze's open-edge graph
//!
//! Two cells are adjacent when they share an edge with no wall on it. Every
//! edge has the same cost, so BFS yields a shortest path. A full search visits
//! each cell at most once; homing missiles re-run it on a throttled cadence.

use std::collections::VecDeque;

use glam::Vec2;

use super::maze::{CellCoord, Maze};

/// Shortest path between the cells containing `start` and `end`.
///
/// Waypoints are cell centres in travel order, start cell first. Returns
/// `None` when both points fall in the same cell, when either lies outside
/// the grid, or when the cells are disconnected.
pub fn shortest_cell_path(maze: &Maze, start: Vec2, end: Vec2) -> Option<Vec<Vec2>> {
    let from = maze.cell_of(start)?;
    let to = maze.cell_of(end)?;
    if from == to {
        return None;
    }

    let cols = maze.cols();
    let index = |c: CellCoord| c.row * cols + c.col;

    let mut parent: Vec<Option<CellCoord>> = vec![None; maze.rows() * cols];
    let mut seen = vec![false; maze.rows() * cols];
    let mut queue = VecDeque::new();

    seen[index(from)] = true;
    queue.push_back(from);

    while let Some(cell) = queue.pop_front() {
        if cell == to {
            let mut cells = vec![to];
            let mut cursor = to;
            while let Some(prev) = parent[index(cursor)] {
                cells.push(prev);
                cursor = prev;
            }
            cells.reverse();
            return Some(cells.into_iter().map(|c| maze.cell_center(c)).collect());
        }

        for next in maze.open_neighbors(cell) {
            let i = index(next);
            if !seen[i] {
                seen[i] = true;
                parent[i] = Some(cell);
                queue.push_back(next);
            }
        }
    }

    None
}

/// Number of cells reachable from `start` (including itself)
pub fn reachable_count(maze: &Maze, start: CellCoord) -> usize {
    if !maze.contains(start) {
        return 0;
    }
    let cols = maze.cols();
    let mut seen = vec![false; maze.rows() * cols];
    let mut queue = VecDeque::from([start]);
    seen[start.row * cols + start.col] = true;
    let mut count = 0;

    while let Some(cell) = queue.pop_front() {
        count += 1;
        for next in maze.open_neighbors(cell) {
            let i = next.row * cols + next.col;
            if !seen[i] {
                seen[i] = true;
                queue.push_back(next);
            }
        }
    }
    count
}
