//! Disc-vs-wall collision against the maze wall graph
//!
//! Walls are treated as bands of `wall_thickness` centred on the cell edges.
//! A disc of radius `r` collides with a wall band when its centre comes within
//! `r + wall_thickness / 2` of the edge line, and with a wall corner when the
//! centre comes within `r` of the corner point.

use std::cmp::Ordering;

use glam::Vec2;

use super::maze::{CellCoord, Maze, Side};
use crate::settings::CollisionTier;

/// Distance from a wall's centre line at which a disc of `radius` touches it
#[inline]
pub fn wall_margin(maze: &Maze, radius: f32) -> f32 {
    radius + maze.geometry().wall_thickness / 2.0
}

/// Is a disc at `pos` blocked by the maze?
///
/// Pure and side-effect free; safe to call for any number of entities.
pub fn disc_blocked(maze: &Maze, pos: Vec2, radius: f32, tier: CollisionTier) -> bool {
    let Some(home) = maze.cell_of(pos) else {
        return true;
    };
    match tier {
        CollisionTier::SingleCell => single_cell_blocked(maze, home, pos, radius),
        CollisionTier::MultiCell => multi_cell_blocked(maze, pos, radius),
    }
}

impl Maze {
    /// Disc-vs-wall query at the default (multi-cell) precision
    pub fn blocked(&self, pos: Vec2, radius: f32) -> bool {
        disc_blocked(self, pos, radius, CollisionTier::MultiCell)
    }
}

/// Test the point against the inward-offset walls of the cell that contains
/// it, then against that cell's corners.
fn single_cell_blocked(maze: &Maze, coord: CellCoord, pos: Vec2, radius: f32) -> bool {
    let walls = maze.cell(coord).walls;
    let origin = maze.cell_origin(coord);
    let size = maze.cell_size();
    let margin = wall_margin(maze, radius);

    if walls.top && pos.y < origin.y + margin {
        return true;
    }
    if walls.bottom && pos.y > origin.y + size - margin {
        return true;
    }
    if walls.left && pos.x < origin.x + margin {
        return true;
    }
    if walls.right && pos.x > origin.x + size - margin {
        return true;
    }

    corners_hit(maze, coord, pos, radius)
}

/// Test every cell the disc could overlap, treating each present wall as a
/// band around its edge segment.
fn multi_cell_blocked(maze: &Maze, pos: Vec2, radius: f32) -> bool {
    // Crossing the outer boundary is always a hit
    if pos.x - radius < 0.0
        || pos.y - radius < 0.0
        || pos.x + radius > maze.width()
        || pos.y + radius > maze.height()
    {
        return true;
    }

    let size = maze.cell_size();
    let margin = wall_margin(maze, radius);
    let max_col = maze.cols() as isize - 1;
    let max_row = maze.rows() as isize - 1;
    let col_lo = (((pos.x - margin) / size).floor() as isize).clamp(0, max_col) as usize;
    let col_hi = (((pos.x + margin) / size).floor() as isize).clamp(0, max_col) as usize;
    let row_lo = (((pos.y - margin) / size).floor() as isize).clamp(0, max_row) as usize;
    let row_hi = (((pos.y + margin) / size).floor() as isize).clamp(0, max_row) as usize;

    for row in row_lo..=row_hi {
        for col in col_lo..=col_hi {
            let coord = CellCoord::new(row, col);
            if cell_bands_hit(maze, coord, pos, margin) || corners_hit(maze, coord, pos, radius) {
                return true;
            }
        }
    }
    false
}

fn cell_bands_hit(maze: &Maze, coord: CellCoord, pos: Vec2, margin: f32) -> bool {
    let walls = maze.cell(coord).walls;
    let min = maze.cell_origin(coord);
    let max = min + Vec2::splat(maze.cell_size());
    let in_x_span = pos.x >= min.x && pos.x <= max.x;
    let in_y_span = pos.y >= min.y && pos.y <= max.y;

    (walls.top && in_x_span && (pos.y - min.y).abs() < margin)
        || (walls.bottom && in_x_span && (pos.y - max.y).abs() < margin)
        || (walls.left && in_y_span && (pos.x - min.x).abs() < margin)
        || (walls.right && in_y_span && (pos.x - max.x).abs() < margin)
}

/// A corner counts only if at least one of its two adjacent walls stands
fn corners_hit(maze: &Maze, coord: CellCoord, pos: Vec2, radius: f32) -> bool {
    let walls = maze.cell(coord).walls;
    let min = maze.cell_origin(coord);
    let size = maze.cell_size();
    let corners = [
        (min, walls.top || walls.left),
        (min + Vec2::new(size, 0.0), walls.top || walls.right),
        (min + Vec2::new(0.0, size), walls.bottom || walls.left),
        (min + Vec2::splat(size), walls.bottom || walls.right),
    ];
    let radius_sq = radius * radius;
    corners
        .iter()
        .any(|&(corner, has_wall)| has_wall && pos.distance_squared(corner) < radius_sq)
}

/// Walls of one cell a moving disc is pressing into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContacts {
    /// Top or bottom wall (reflects the y velocity)
    pub y_wall: Option<Side>,
    /// Left or right wall (reflects the x velocity)
    pub x_wall: Option<Side>,
}

impl WallContacts {
    pub fn any(&self) -> bool {
        self.y_wall.is_some() || self.x_wall.is_some()
    }

    /// Contacts from either set, first set winning per axis
    pub fn or(self, other: WallContacts) -> WallContacts {
        WallContacts {
            y_wall: self.y_wall.or(other.y_wall),
            x_wall: self.x_wall.or(other.x_wall),
        }
    }

    /// Unit normal pointing away from the struck wall(s)
    pub fn outward_normal(&self) -> Vec2 {
        let sum = self.y_wall.map_or(Vec2::ZERO, Side::inward_normal)
            + self.x_wall.map_or(Vec2::ZERO, Side::inward_normal);
        sum.normalize_or_zero()
    }
}

/// Which walls of `coord` a disc at `next` moving with `vel` would strike.
///
/// A wall only counts when the disc is inside its margin *and* moving into
/// it, so a disc sliding away from a wall it already touches is left alone.
pub fn wall_contacts(maze: &Maze, coord: CellCoord, next: Vec2, vel: Vec2, radius: f32) -> WallContacts {
    let walls = maze.cell(coord).walls;
    let origin = maze.cell_origin(coord);
    let size = maze.cell_size();
    let margin = wall_margin(maze, radius);

    let y_wall = if walls.top && next.y < origin.y + margin && vel.y < 0.0 {
        Some(Side::Top)
    } else if walls.bottom && next.y > origin.y + size - margin && vel.y > 0.0 {
        Some(Side::Bottom)
    } else {
        None
    };

    let x_wall = if walls.left && next.x < origin.x + margin && vel.x < 0.0 {
        Some(Side::Left)
    } else if walls.right && next.x > origin.x + size - margin && vel.x > 0.0 {
        Some(Side::Right)
    } else {
        None
    };

    WallContacts { y_wall, x_wall }
}

/// Walls a straight step from inside `from` to `next` passes through.
///
/// Catches steps that jump a wall band entirely. An axis is blocked when the
/// step crosses a cell edge on that axis and the edge is walled, either on
/// `from` itself or on the cell it would cut through on a diagonal step.
/// Boundary edges always count as walled. Steps longer than a cell are not
/// supported.
pub fn crossing_contacts(maze: &Maze, from: CellCoord, next: Vec2) -> WallContacts {
    let size = maze.cell_size();
    let col = (next.x / size).floor() as isize;
    let row = (next.y / size).floor() as isize;

    let x_side = match col.cmp(&(from.col as isize)) {
        Ordering::Greater => Some(Side::Right),
        Ordering::Less => Some(Side::Left),
        Ordering::Equal => None,
    };
    let y_side = match row.cmp(&(from.row as isize)) {
        Ordering::Greater => Some(Side::Bottom),
        Ordering::Less => Some(Side::Top),
        Ordering::Equal => None,
    };

    let walled = |side: Side, across: Option<Side>| {
        maze.has_wall(from, side)
            || across
                .and_then(|a| maze.neighbor(from, a))
                .is_some_and(|corner| maze.has_wall(corner, side))
    };

    WallContacts {
        y_wall: y_side.filter(|&side| walled(side, x_side)),
        x_wall: x_side.filter(|&side| walled(side, y_side)),
    }
}

/// Do two discs overlap?
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::maze::MazeGeometry;
    use proptest::prelude::*;

    /// 2x2 grid, all interior walls open: only the boundary stands
    fn open_room() -> Maze {
        let mut maze = Maze::closed(2, 2, MazeGeometry::default());
        maze.open_wall(CellCoord::new(0, 0), Side::Right);
        maze.open_wall(CellCoord::new(0, 0), Side::Bottom);
        maze.open_wall(CellCoord::new(1, 1), Side::Top);
        maze.open_wall(CellCoord::new(1, 1), Side::Left);
        maze
    }

    #[test]
    fn test_centre_of_cell_is_free() {
        let maze = Maze::closed(3, 3, MazeGeometry::default());
        for tier in [CollisionTier::SingleCell, CollisionTier::MultiCell] {
            assert!(!disc_blocked(&maze, Vec2::new(90.0, 90.0), 10.0, tier));
        }
    }

    #[test]
    fn test_near_wall_is_blocked() {
        let maze = Maze::closed(3, 3, MazeGeometry::default());
        // margin = 10 + 2 = 12 from the top edge of the middle cell at y = 60
        for tier in [CollisionTier::SingleCell, CollisionTier::MultiCell] {
            assert!(disc_blocked(&maze, Vec2::new(90.0, 71.0), 10.0, tier));
            assert!(!disc_blocked(&maze, Vec2::new(90.0, 73.0), 10.0, tier));
        }
    }

    #[test]
    fn test_out_of_grid_is_blocked() {
        let maze = open_room();
        for tier in [CollisionTier::SingleCell, CollisionTier::MultiCell] {
            assert!(disc_blocked(&maze, Vec2::new(-5.0, 60.0), 1.0, tier));
            assert!(disc_blocked(&maze, Vec2::new(60.0, 500.0), 1.0, tier));
        }
    }

    #[test]
    fn test_open_edge_lets_disc_straddle_cells() {
        let maze = open_room();
        // Sitting on the open edge between (0,0) and (0,1), away from corners
        let pos = Vec2::new(60.0, 30.0);
        assert!(!maze.blocked(pos, 10.0));
    }

    #[test]
    fn test_multi_cell_catches_wall_of_neighbouring_cell() {
        // Open (0,0)-(0,1); (0,1) keeps its bottom wall. A large disc centred
        // in (0,0) near the shared edge reaches (0,1)'s bottom wall, which the
        // single-cell tier cannot see.
        let mut maze = Maze::closed(2, 2, MazeGeometry::default());
        maze.open_wall(CellCoord::new(0, 0), Side::Right);
        maze.open_wall(CellCoord::new(0, 0), Side::Bottom);
        let pos = Vec2::new(58.0, 50.0);
        let radius = 14.0;
        assert!(!disc_blocked(&maze, pos, radius, CollisionTier::SingleCell));
        assert!(disc_blocked(&maze, pos, radius, CollisionTier::MultiCell));
    }

    #[test]
    fn test_corner_counts_only_with_adjacent_wall() {
        // Room centre: four open edges meet, no wall touches the corner
        let maze = open_room();
        assert!(!maze.blocked(Vec2::new(62.0, 63.0), 5.0));

        // Same room but the (0,0)-(0,1) edge left standing above the corner
        let mut maze = Maze::closed(2, 2, MazeGeometry::default());
        maze.open_wall(CellCoord::new(0, 0), Side::Bottom);
        maze.open_wall(CellCoord::new(1, 1), Side::Top);
        maze.open_wall(CellCoord::new(1, 1), Side::Left);
        assert!(maze.blocked(Vec2::new(62.0, 63.0), 5.0));
    }

    #[test]
    fn test_wall_contacts_need_inward_motion() {
        let maze = Maze::closed(1, 2, MazeGeometry::default());
        let cell = CellCoord::new(0, 0);
        let near_left = Vec2::new(4.0, 30.0);
        let into = wall_contacts(&maze, cell, near_left, Vec2::new(-4.0, 0.0), 3.0);
        assert_eq!(into.x_wall, Some(Side::Left));
        assert_eq!(into.y_wall, None);
        let away = wall_contacts(&maze, cell, near_left, Vec2::new(4.0, 0.0), 3.0);
        assert!(!away.any());
    }

    #[test]
    fn test_wall_contacts_corner_hits_both_axes() {
        let maze = Maze::closed(1, 1, MazeGeometry::default());
        let contacts = wall_contacts(
            &maze,
            CellCoord::new(0, 0),
            Vec2::new(57.0, 57.0),
            Vec2::new(3.0, 3.0),
            3.0,
        );
        assert_eq!(contacts.y_wall, Some(Side::Bottom));
        assert_eq!(contacts.x_wall, Some(Side::Right));
        let n = contacts.outward_normal();
        assert!(n.x < 0.0 && n.y < 0.0);
    }

    #[test]
    fn test_crossing_a_standing_wall_is_caught_without_entering_its_band() {
        // 54 -> 60.5 skips the 5 px band on the near side of the shared wall
        let maze = Maze::closed(1, 2, MazeGeometry::default());
        let from = CellCoord::new(0, 0);
        let next = Vec2::new(60.5, 30.0);
        let contacts = crossing_contacts(&maze, from, next);
        assert_eq!(contacts.x_wall, Some(Side::Right));
        assert_eq!(contacts.y_wall, None);
        assert!(!wall_contacts(&maze, CellCoord::new(0, 1), next, Vec2::new(6.5, 0.0), 3.0).any());
    }

    #[test]
    fn test_crossing_open_edges_and_diagonal_corners() {
        let mut maze = Maze::closed(2, 2, MazeGeometry::default());
        let from = CellCoord::new(0, 0);
        maze.open_wall(from, Side::Right);
        maze.open_wall(from, Side::Bottom);
        assert!(!crossing_contacts(&maze, from, Vec2::new(62.0, 30.0)).any());
        assert!(!crossing_contacts(&maze, from, Vec2::new(30.0, 62.0)).any());

        // Diagonal into (1,1) passes the walls around the far corner
        let diagonal = crossing_contacts(&maze, from, Vec2::new(62.0, 62.0));
        assert_eq!(diagonal.x_wall, Some(Side::Right));
        assert_eq!(diagonal.y_wall, Some(Side::Bottom));

        maze.open_wall(CellCoord::new(0, 1), Side::Bottom);
        let diagonal = crossing_contacts(&maze, from, Vec2::new(62.0, 62.0));
        assert_eq!(diagonal.x_wall, Some(Side::Right));
        assert_eq!(diagonal.y_wall, None);
    }

    #[test]
    fn test_crossing_the_boundary_always_counts() {
        let maze = Maze::closed(1, 1, MazeGeometry::default());
        let contacts = crossing_contacts(&maze, CellCoord::new(0, 0), Vec2::new(-1.0, -1.0));
        assert_eq!(contacts.x_wall, Some(Side::Left));
        assert_eq!(contacts.y_wall, Some(Side::Top));
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 10.0, Vec2::new(12.0, 0.0), 3.0));
        assert!(!circles_overlap(Vec2::ZERO, 10.0, Vec2::new(13.0, 0.0), 3.0));
    }

    proptest! {
        /// The multi-cell tier never lets through something the single-cell
        /// tier blocks.
        #[test]
        fn prop_multi_cell_is_at_least_as_strict(
            x in 0.0f32..180.0,
            y in 0.0f32..180.0,
            radius in 1.0f32..20.0,
            seed in any::<u64>(),
        ) {
            use rand::SeedableRng;
            let mut rng = rand_pcg::Pcg32::seed_from_u64(seed);
            let maze = Maze::generate(3, 3, MazeGeometry::default(), &mut rng);
            let pos = Vec2::new(x, y);
            if disc_blocked(&maze, pos, radius, CollisionTier::SingleCell) {
                prop_assert!(disc_blocked(&maze, pos, radius, CollisionTier::MultiCell));
            }
        }
    }
}
