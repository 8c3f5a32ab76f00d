//! Maze grid and generator
//!
//! The maze is a rows×cols grid of square cells, each carrying four wall
//! flags. Walls are stored on both sides of every shared edge and are kept
//! symmetric by construction: the only way to remove a wall is `open_wall`,
//! which clears both flags together and refuses to open the outer boundary.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One side of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Unit normal pointing from this wall into the cell that owns it
    /// (screen space, y grows downward)
    pub fn inward_normal(self) -> Vec2 {
        match self {
            Side::Top => Vec2::Y,
            Side::Right => Vec2::NEG_X,
            Side::Bottom => Vec2::NEG_Y,
            Side::Left => Vec2::X,
        }
    }
}

/// Wall flags of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walls {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Walls {
    pub const CLOSED: Walls = Walls {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    #[inline]
    pub fn get(&self, side: Side) -> bool {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }

    fn clear(&mut self, side: Side) {
        match side {
            Side::Top => self.top = false,
            Side::Right => self.right = false,
            Side::Bottom => self.bottom = false,
            Side::Left => self.left = false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Generation-time bookkeeping only
    pub visited: bool,
    pub walls: Walls,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            visited: false,
            walls: Walls::CLOSED,
        }
    }
}

/// Grid coordinate of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Pixel dimensions of the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MazeGeometry {
    pub cell_size: f32,
    pub wall_thickness: f32,
}

impl Default for MazeGeometry {
    fn default() -> Self {
        Self {
            cell_size: crate::consts::CELL_SIZE,
            wall_thickness: crate::consts::WALL_THICKNESS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Maze {
    rows: usize,
    cols: usize,
    geometry: MazeGeometry,
    /// Row-major
    cells: Vec<Cell>,
}

impl Maze {
    /// A grid with every wall standing
    pub fn closed(rows: usize, cols: usize, geometry: MazeGeometry) -> Self {
        Self {
            rows,
            cols,
            geometry,
            cells: vec![Cell::default(); rows * cols],
        }
    }

    /// Build a perfect maze, then punch extra openings into it
    pub fn generate<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        geometry: MazeGeometry,
        rng: &mut R,
    ) -> Self {
        let mut maze = Self::closed(rows, cols, geometry);
        maze.carve_spanning_tree(rng);
        maze.carve_shortcuts(rng);
        maze
    }

    /// Randomized depth-first carve from (0, 0) with an explicit backtracking
    /// stack. Leaves the open-edge graph as a spanning tree over all cells.
    pub fn carve_spanning_tree<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.cells.is_empty() {
            return;
        }
        for cell in &mut self.cells {
            cell.visited = false;
        }

        let mut stack: Vec<CellCoord> = Vec::with_capacity(self.cells.len());
        let mut current = CellCoord::new(0, 0);
        self.cell_mut(current).visited = true;

        let mut candidates: Vec<(Side, CellCoord)> = Vec::with_capacity(4);
        loop {
            candidates.clear();
            for side in [Side::Top, Side::Bottom, Side::Left, Side::Right] {
                if let Some(next) = self.neighbor(current, side) {
                    if !self.cell(next).visited {
                        candidates.push((side, next));
                    }
                }
            }

            if !candidates.is_empty() {
                let (side, next) = candidates[rng.random_range(0..candidates.len())];
                self.open_wall(current, side);
                self.cell_mut(next).visited = true;
                stack.push(current);
                current = next;
            } else if let Some(prev) = stack.pop() {
                current = prev;
            } else {
                break;
            }
        }
    }

    /// Clear a random wall of a random cell, about `rows*cols/5` times.
    /// Already-open walls and boundary walls are left as they are.
    pub fn carve_shortcuts<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.cells.is_empty() {
            return;
        }
        let iterations = self.cells.len().div_ceil(5);
        for _ in 0..iterations {
            let coord = CellCoord::new(
                rng.random_range(0..self.rows),
                rng.random_range(0..self.cols),
            );
            let side = Side::ALL[rng.random_range(0..Side::ALL.len())];
            self.open_wall(coord, side);
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn geometry(&self) -> MazeGeometry {
        self.geometry
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.geometry.cell_size
    }

    /// Play-field width in pixels
    pub fn width(&self) -> f32 {
        self.cols as f32 * self.geometry.cell_size
    }

    /// Play-field height in pixels
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.geometry.cell_size
    }

    #[inline]
    fn index(&self, coord: CellCoord) -> usize {
        coord.row * self.cols + coord.col
    }

    /// Panics if `coord` is outside the grid
    #[inline]
    pub fn cell(&self, coord: CellCoord) -> &Cell {
        &self.cells[self.index(coord)]
    }

    #[inline]
    fn cell_mut(&mut self, coord: CellCoord) -> &mut Cell {
        let index = self.index(coord);
        &mut self.cells[index]
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// Wall flags of every cell, row-major
    pub fn walls(&self) -> impl Iterator<Item = Walls> + '_ {
        self.cells.iter().map(|c| c.walls)
    }

    pub fn has_wall(&self, coord: CellCoord, side: Side) -> bool {
        self.cell(coord).walls.get(side)
    }

    /// The in-grid cell across `side`, if any
    pub fn neighbor(&self, coord: CellCoord, side: Side) -> Option<CellCoord> {
        let CellCoord { row, col } = coord;
        let next = match side {
            Side::Top => CellCoord::new(row.checked_sub(1)?, col),
            Side::Bottom => CellCoord::new(row + 1, col),
            Side::Left => CellCoord::new(row, col.checked_sub(1)?),
            Side::Right => CellCoord::new(row, col + 1),
        };
        self.contains(next).then_some(next)
    }

    /// Cells reachable in one step through an open wall
    pub fn open_neighbors(&self, coord: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        Side::ALL.into_iter().filter_map(move |side| {
            if self.has_wall(coord, side) {
                None
            } else {
                self.neighbor(coord, side)
            }
        })
    }

    /// Remove the wall on `side` of `coord` and the matching wall of the
    /// neighbour. Returns false (and changes nothing) for boundary walls.
    pub fn open_wall(&mut self, coord: CellCoord, side: Side) -> bool {
        let Some(next) = self.neighbor(coord, side) else {
            return false;
        };
        self.cell_mut(coord).walls.clear(side);
        self.cell_mut(next).walls.clear(side.opposite());
        true
    }

    /// Cell containing a world position, if inside the grid
    pub fn cell_of(&self, pos: Vec2) -> Option<CellCoord> {
        let size = self.geometry.cell_size;
        let col = (pos.x / size).floor();
        let row = (pos.y / size).floor();
        if !(col >= 0.0 && row >= 0.0) {
            return None;
        }
        let coord = CellCoord::new(row as usize, col as usize);
        self.contains(coord).then_some(coord)
    }

    /// Top-left corner of a cell in pixels
    pub fn cell_origin(&self, coord: CellCoord) -> Vec2 {
        Vec2::new(coord.col as f32, coord.row as f32) * self.geometry.cell_size
    }

    /// Pixel centre of a cell
    pub fn cell_center(&self, coord: CellCoord) -> Vec2 {
        self.cell_origin(coord) + Vec2::splat(self.geometry.cell_size / 2.0)
    }

    /// True when every shared edge agrees on both sides and the outer
    /// boundary is closed
    pub fn is_consistent(&self) -> bool {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let coord = CellCoord::new(row, col);
                for side in Side::ALL {
                    let here = self.has_wall(coord, side);
                    match self.neighbor(coord, side) {
                        Some(next) => {
                            if here != self.has_wall(next, side.opposite()) {
                                return false;
                            }
                        }
                        None => {
                            if !here {
                                return false;
                            }
                        }
                    }
                }
            }
        }
        true
    }

    /// Number of open shared edges (each counted once)
    pub fn open_edge_count(&self) -> usize {
        let mut count = 0;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let coord = CellCoord::new(row, col);
                if self.neighbor(coord, Side::Right).is_some() && !self.has_wall(coord, Side::Right) {
                    count += 1;
                }
                if self.neighbor(coord, Side::Bottom).is_some() && !self.has_wall(coord, Side::Bottom)
                {
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
impl Maze {
    /// Can something move from cell `a` to cell `b` in one step without
    /// passing through a wall?
    pub(crate) fn step_is_open(&self, a: CellCoord, b: CellCoord) -> bool {
        let dr = b.row as isize - a.row as isize;
        let dc = b.col as isize - a.col as isize;
        let vertical = match dr {
            1 => Some(Side::Bottom),
            -1 => Some(Side::Top),
            _ => None,
        };
        let horizontal = match dc {
            1 => Some(Side::Right),
            -1 => Some(Side::Left),
            _ => None,
        };
        let through = |cell: CellCoord, side: Side| {
            (!self.has_wall(cell, side))
                .then(|| self.neighbor(cell, side))
                .flatten()
        };
        match (dr, dc, vertical, horizontal) {
            (0, 0, _, _) => true,
            (0, _, None, Some(side)) | (_, 0, Some(side), None) => through(a, side) == Some(b),
            (_, _, Some(v), Some(h)) => {
                through(a, v).and_then(|mid| through(mid, h)) == Some(b)
                    || through(a, h).and_then(|mid| through(mid, v)) == Some(b)
            }
            _ => false,
        }
    }
}
