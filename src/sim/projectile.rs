//! Projectile kinematics and per-kind steering
//!
//! Each tick a live projectile runs, in order: lifespan check, steering (one
//! `match` on its kind), movement with wall ricochet, then the portal
//! teleport check. Steering only ever changes the heading; movement is the
//! only step that changes position.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::ControlInput;
use super::collision::{crossing_contacts, wall_contacts};
use super::maze::Maze;
use super::pathfind::shortest_cell_path;
use super::portal::{Polarity, PortalAnchor, PortalRegistry};
use super::state::{ActorId, SimEvent, TargetView, WarpField, time_scale_at};
use crate::settings::{ProjectileSettings, Settings};
use crate::{angle_of, normalize_angle, polar_to_cartesian, steer_toward};

/// Projectile variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    Normal,
    /// Follows shortest paths through the maze toward the nearest enemy
    Homing,
    /// Ignores walls, curves gently toward enemies ahead of it
    Ghost,
    /// Steered live by its owner's controls
    Wireless,
    /// Leaves a portal anchor where it first strikes a wall
    Portal(Polarity),
}

impl ProjectileKind {
    pub fn lifespan_ticks(self, s: &ProjectileSettings) -> u64 {
        match self {
            ProjectileKind::Homing => s.homing_lifespan_ticks,
            _ => s.lifespan_ticks,
        }
    }

    pub fn max_bounces(self, s: &ProjectileSettings) -> u32 {
        match self {
            ProjectileKind::Homing => s.homing_max_bounces,
            ProjectileKind::Portal(_) => 0,
            _ => s.max_bounces,
        }
    }

    pub fn speed(self, s: &ProjectileSettings) -> f32 {
        match self {
            ProjectileKind::Wireless => s.speed * s.wireless_speed_mult,
            _ => s.speed,
        }
    }

    /// Ghost lasers fly over walls and never bounce
    pub fn ignores_walls(self) -> bool {
        matches!(self, ProjectileKind::Ghost)
    }
}

/// Everything a projectile reads or writes outside itself during a tick
pub struct ProjectileEnv<'a> {
    pub maze: &'a Maze,
    pub settings: &'a Settings,
    pub targets: &'a [TargetView],
    pub warp_fields: &'a [WarpField],
    pub portals: &'a mut PortalRegistry,
    pub events: &'a mut Vec<SimEvent>,
    pub now: u64,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub owner: ActorId,
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Travel heading, kept in sync with `vel`
    pub angle: f32,
    pub speed: f32,
    /// Tick the projectile was fired on
    pub born: u64,
    pub bounces: u32,
    /// Cached waypoints toward the current homing target
    pub path: Vec<Vec2>,
    pub last_path_update: Option<u64>,
    pub teleport_ready_at: u64,
    pub active: bool,
}

impl Projectile {
    pub fn new(
        id: u32,
        owner: ActorId,
        kind: ProjectileKind,
        pos: Vec2,
        angle: f32,
        speed: f32,
        now: u64,
    ) -> Self {
        let angle = normalize_angle(angle);
        Self {
            id,
            owner,
            kind,
            pos,
            vel: polar_to_cartesian(speed, angle),
            angle,
            speed,
            born: now,
            bounces: 0,
            path: Vec::new(),
            last_path_update: None,
            teleport_ready_at: now,
            active: true,
        }
    }

    /// Ticks since firing
    #[inline]
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.born)
    }

    /// Point the projectile along `angle` at its fixed speed
    fn set_heading(&mut self, angle: f32) {
        self.angle = normalize_angle(angle);
        self.vel = polar_to_cartesian(self.speed, self.angle);
    }

    /// Could this projectile kill `target` right now? Owners are immune to
    /// their own fire for a short window after launch, and only then.
    pub fn can_hit(&self, target: ActorId, now: u64, own_immunity_ticks: u64) -> bool {
        self.active && !(self.owner == target && self.age(now) < own_immunity_ticks)
    }

    /// Advance one tick. `pilot` carries the owner's controls while this
    /// projectile is being remote-piloted.
    pub fn update(&mut self, env: &mut ProjectileEnv, pilot: Option<&ControlInput>) {
        if !self.active {
            return;
        }

        let tuning = &env.settings.projectile;
        if self.age(env.now) > self.kind.lifespan_ticks(tuning) {
            self.active = false;
            return;
        }

        match self.kind {
            ProjectileKind::Homing => self.steer_homing(env),
            ProjectileKind::Ghost => self.steer_ghost(env),
            ProjectileKind::Wireless => {
                if let Some(input) = pilot {
                    self.steer_wireless(input, env.settings);
                }
            }
            ProjectileKind::Normal | ProjectileKind::Portal(_) => {}
        }

        let scale = time_scale_at(env.warp_fields, self.pos, self.owner);

        if self.kind.ignores_walls() {
            self.pos += self.vel * scale;
            let maze = env.maze;
            if self.pos.x < 0.0
                || self.pos.y < 0.0
                || self.pos.x > maze.width()
                || self.pos.y > maze.height()
            {
                self.active = false;
            }
            return;
        }

        if !self.advance_through_maze(env, scale) {
            return;
        }

        if !matches!(self.kind, ProjectileKind::Portal(_)) {
            self.try_teleport(env);
        }
    }

    /// Follow the cached shortest path toward the nearest enemy, refreshing
    /// it on a fixed cadence. Steers straight at the enemy when no path exists.
    fn steer_homing(&mut self, env: &mut ProjectileEnv) {
        let tuning = &env.settings.projectile;
        let age = self.age(env.now);
        if age <= tuning.homing_start_ticks || age >= tuning.homing_end_ticks {
            return;
        }
        let Some(target) = nearest_enemy(env.targets, self.owner, self.pos) else {
            return;
        };

        let refresh_due = self
            .last_path_update
            .is_none_or(|at| env.now.saturating_sub(at) > tuning.homing_path_refresh_ticks);
        if refresh_due {
            self.path = shortest_cell_path(env.maze, self.pos, target.pos).unwrap_or_default();
            self.last_path_update = Some(env.now);
        }

        // path[0] is the cell we started the search in
        let mut aim = target.pos;
        if self.path.len() > 1 {
            aim = self.path[1];
            let half_cell = env.maze.cell_size() / 2.0;
            if self.path.len() > 2 && self.pos.distance(aim) < half_cell {
                aim = self.path[2];
            }
        }

        let desired = angle_of(aim - self.pos);
        self.set_heading(steer_toward(self.angle, desired, tuning.homing_turn));
    }

    /// Curve toward the nearest enemy only while it is close and ahead
    fn steer_ghost(&mut self, env: &mut ProjectileEnv) {
        let tuning = &env.settings.projectile;
        let Some(target) = nearest_enemy(env.targets, self.owner, self.pos) else {
            return;
        };
        if self.pos.distance(target.pos) >= tuning.ghost_range {
            return;
        }
        let diff = normalize_angle(angle_of(target.pos - self.pos) - self.angle);
        if diff.abs() < tuning.ghost_cone {
            self.set_heading(self.angle + diff * tuning.ghost_turn);
        }
    }

    fn steer_wireless(&mut self, input: &ControlInput, settings: &Settings) {
        if input.stick != Vec2::ZERO {
            let desired = angle_of(input.stick);
            self.set_heading(steer_toward(
                self.angle,
                desired,
                settings.projectile.wireless_turn,
            ));
            return;
        }
        let mut angle = self.angle;
        if input.keys.left {
            angle -= settings.tank.rot_speed;
        }
        if input.keys.right {
            angle += settings.tank.rot_speed;
        }
        self.set_heading(angle);
    }

    /// Move one step, reflecting off walls of the destination cell and off
    /// any walled edge the step crosses on the way there.
    /// Returns false if the projectile was deactivated.
    fn advance_through_maze(&mut self, env: &mut ProjectileEnv, scale: f32) -> bool {
        let tuning = &env.settings.projectile;
        let next = self.pos + self.vel * scale;
        let Some(from) = env.maze.cell_of(self.pos) else {
            self.active = false;
            return false;
        };

        let crossed = crossing_contacts(env.maze, from, next);
        let contacts = match env.maze.cell_of(next) {
            Some(cell) => wall_contacts(env.maze, cell, next, self.vel, tuning.radius).or(crossed),
            None if crossed.any() => crossed,
            None => {
                self.active = false;
                return false;
            }
        };
        if contacts.any() {
            if let ProjectileKind::Portal(polarity) = self.kind {
                let anchor = PortalAnchor {
                    pos: self.pos,
                    normal: contacts.outward_normal(),
                };
                env.portals.place(polarity, anchor);
                env.events.push(SimEvent::PortalPlaced {
                    polarity,
                    pos: anchor.pos,
                });
                log::debug!("{:?} portal placed at {:?} by {}", polarity, anchor.pos, self.owner);
                self.active = false;
                return false;
            }

            if contacts.y_wall.is_some() {
                self.vel.y = -self.vel.y;
            }
            if contacts.x_wall.is_some() {
                self.vel.x = -self.vel.x;
            }
            self.bounces += 1;
            self.angle = angle_of(self.vel);
            if self.bounces > self.kind.max_bounces(tuning) {
                self.active = false;
                return false;
            }
        }

        self.pos += self.vel * scale;
        true
    }

    fn try_teleport(&mut self, env: &mut ProjectileEnv) {
        if env.now < self.teleport_ready_at {
            return;
        }
        let portal = &env.settings.portal;
        let Some(exit) = env.portals.exit_for(
            self.pos,
            portal.projectile_capture,
            portal.projectile_clearance,
        ) else {
            return;
        };
        if env.maze.cell_of(exit.pos).is_none() {
            return;
        }

        self.pos = exit.pos;
        self.set_heading(angle_of(exit.direction));
        self.teleport_ready_at = env.now + portal.teleport_cooldown_ticks;
        env.events.push(SimEvent::ProjectileTeleported {
            projectile: self.id,
            from: exit.from,
        });
    }
}

/// Closest living actor that isn't `owner`, by squared distance
pub fn nearest_enemy(targets: &[TargetView], owner: ActorId, pos: Vec2) -> Option<&TargetView> {
    targets
        .iter()
        .filter(|t| t.alive && t.id != owner)
        .min_by(|a, b| {
            a.pos
                .distance_squared(pos)
                .partial_cmp(&b.pos.distance_squared(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actor::DirectionKeys;
    use crate::sim::maze::{CellCoord, MazeGeometry, Side};
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const OWNER: ActorId = ActorId(0);
    const ENEMY: ActorId = ActorId(1);

    struct World {
        maze: Maze,
        settings: Settings,
        targets: Vec<TargetView>,
        warp_fields: Vec<WarpField>,
        portals: PortalRegistry,
        events: Vec<SimEvent>,
        now: u64,
    }

    impl World {
        fn new(maze: Maze) -> Self {
            Self {
                maze,
                settings: Settings::default(),
                targets: Vec::new(),
                warp_fields: Vec::new(),
                portals: PortalRegistry::new(),
                events: Vec::new(),
                now: 0,
            }
        }

        /// Run one tick for `p`, advancing the clock
        fn step(&mut self, p: &mut Projectile, pilot: Option<&ControlInput>) {
            self.now += 1;
            let mut env = ProjectileEnv {
                maze: &self.maze,
                settings: &self.settings,
                targets: &self.targets,
                warp_fields: &self.warp_fields,
                portals: &mut self.portals,
                events: &mut self.events,
                now: self.now,
            };
            p.update(&mut env, pilot);
        }

        fn spawn(&self, kind: ProjectileKind, pos: Vec2, angle: f32) -> Projectile {
            let speed = kind.speed(&self.settings.projectile);
            Projectile::new(1, OWNER, kind, pos, angle, speed, self.now)
        }
    }

    /// Horizontal corridor of `len` cells with every shared wall open
    fn corridor(len: usize) -> Maze {
        let mut maze = Maze::closed(1, len, MazeGeometry::default());
        for col in 0..len - 1 {
            maze.open_wall(CellCoord::new(0, col), Side::Right);
        }
        maze
    }

    /// Count wall contacts until the projectile dies
    fn contacts_until_dead(world: &mut World, mut p: Projectile) -> u32 {
        let mut last_bounces = p.bounces;
        let mut contacts = 0;
        for _ in 0..10_000 {
            let before = p.vel;
            world.step(&mut p, None);
            if !p.active {
                // The killing contact reverses nothing
                return contacts + 1;
            }
            if p.bounces != last_bounces || p.vel != before {
                contacts += 1;
                last_bounces = p.bounces;
            }
        }
        panic!("projectile never died");
    }

    #[test]
    fn test_zero_bounce_budget_dies_on_first_contact() {
        let mut world = World::new(corridor(1));
        world.settings.projectile.max_bounces = 0;
        let p = world.spawn(ProjectileKind::Normal, Vec2::new(30.0, 30.0), 0.0);
        assert_eq!(contacts_until_dead(&mut world, p), 1);
    }

    #[test]
    fn test_bounce_budget_allows_exactly_n_ricochets() {
        for budget in [1, 3, 5] {
            let mut world = World::new(corridor(2));
            world.settings.projectile.max_bounces = budget;
            let p = world.spawn(ProjectileKind::Normal, Vec2::new(60.0, 30.0), 0.0);
            assert_eq!(contacts_until_dead(&mut world, p), budget + 1);
        }
    }

    #[test]
    fn test_ricochet_reflects_only_the_struck_axis() {
        let mut world = World::new(corridor(1));
        let mut p = world.spawn(ProjectileKind::Normal, Vec2::new(30.0, 40.0), PI / 4.0);
        while p.bounces == 0 {
            world.step(&mut p, None);
        }
        // Hit the bottom wall first (y velocity flipped, x untouched)
        assert!(p.vel.y < 0.0);
        assert!(p.vel.x > 0.0);
        assert!((p.angle - angle_of(p.vel)).abs() < 1e-5);
    }

    #[test]
    fn test_stays_inside_the_grid_while_bouncing() {
        let mut world = World::new(corridor(3));
        world.settings.projectile.max_bounces = 1000;
        let mut p = world.spawn(ProjectileKind::Normal, Vec2::new(40.0, 20.0), 0.7);
        for _ in 0..500 {
            world.step(&mut p, None);
            assert!(p.active);
            assert!(world.maze.cell_of(p.pos).is_some());
        }
    }

    #[test]
    fn test_lifespan_expiry() {
        let mut world = World::new(corridor(3));
        world.settings.projectile.lifespan_ticks = 10;
        world.settings.projectile.max_bounces = 1000;
        let mut p = world.spawn(ProjectileKind::Normal, Vec2::new(90.0, 30.0), FRAC_PI_2);
        for _ in 0..10 {
            world.step(&mut p, None);
            assert!(p.active);
        }
        world.step(&mut p, None);
        assert!(!p.active);
    }

    #[test]
    fn test_starting_outside_grid_deactivates() {
        let mut world = World::new(corridor(1));
        let mut p = world.spawn(ProjectileKind::Normal, Vec2::new(-4.0, 30.0), 0.0);
        world.step(&mut p, None);
        assert!(!p.active);
    }

    #[test]
    fn test_step_off_the_edge_bounces_off_the_boundary() {
        let mut world = World::new(corridor(1));
        let mut p = world.spawn(ProjectileKind::Normal, Vec2::new(1.0, 30.0), PI);
        world.step(&mut p, None);
        assert!(p.active);
        assert_eq!(p.bounces, 1);
        assert!(p.vel.x > 0.0);
        assert!(world.maze.cell_of(p.pos).is_some());
    }

    #[test]
    fn test_wireless_never_jumps_a_standing_wall() {
        // Shared wall between the two cells stays up
        let maze = Maze::closed(1, 2, MazeGeometry::default());
        let mut world = World::new(maze);
        world.settings.projectile.max_bounces = 1000;
        let wall_x = world.maze.cell_size();

        for tenth in 300..360 {
            let x = tenth as f32 / 10.0;
            let mut p = world.spawn(ProjectileKind::Wireless, Vec2::new(x, 30.0), 0.0);
            for _ in 0..30 {
                world.step(&mut p, None);
                assert!(
                    !p.active || p.pos.x < wall_x,
                    "start x {x} ended up at {:?}",
                    p.pos
                );
            }
            assert!(p.bounces > 0, "start x {x} never bounced");
        }
    }

    #[test]
    fn test_ghost_passes_walls_normal_would_bounce_off() {
        // Two cells with the shared wall standing
        let maze = Maze::closed(1, 3, MazeGeometry::default());
        let mut world = World::new(maze);
        let start = Vec2::new(50.0, 30.0);

        let mut normal = world.spawn(ProjectileKind::Normal, start, 0.0);
        world.step(&mut normal, None);
        world.step(&mut normal, None);
        assert_eq!(normal.bounces, 1);
        assert!(normal.vel.x < 0.0);

        let mut ghost = world.spawn(ProjectileKind::Ghost, start, 0.0);
        for _ in 0..10 {
            world.step(&mut ghost, None);
        }
        assert!(ghost.active);
        assert!(ghost.pos.x > 60.0);
        assert_eq!(ghost.bounces, 0);

        // Keeps going until it crosses the outer edge of the field
        let mut ticks = 0;
        while ghost.active {
            world.step(&mut ghost, None);
            ticks += 1;
            assert!(ticks < 100);
        }
        assert!(ghost.pos.x > world.maze.width());
    }

    #[test]
    fn test_ghost_curves_toward_enemy_ahead_only() {
        let mut world = World::new(Maze::closed(5, 5, MazeGeometry::default()));
        world.targets = vec![TargetView {
            id: ENEMY,
            pos: Vec2::new(250.0, 100.0),
            alive: true,
        }];
        let mut ahead = world.spawn(ProjectileKind::Ghost, Vec2::new(50.0, 50.0), 0.0);
        world.step(&mut ahead, None);
        assert!(ahead.angle > 0.0);

        // Enemy behind: keep flying straight
        world.targets[0].pos = Vec2::new(10.0, 60.0);
        let mut away = world.spawn(ProjectileKind::Ghost, Vec2::new(100.0, 50.0), 0.0);
        world.step(&mut away, None);
        assert_eq!(away.angle, 0.0);
    }

    #[test]
    fn test_homing_waits_for_its_window_then_follows_the_maze() {
        // L-shaped route: (0,0) -> (1,0) -> (1,1); target sits in (1,1)
        let mut maze = Maze::closed(2, 2, MazeGeometry::default());
        maze.open_wall(CellCoord::new(0, 0), Side::Bottom);
        maze.open_wall(CellCoord::new(1, 0), Side::Right);
        let mut world = World::new(maze);
        world.settings.projectile.homing_start_ticks = 2;
        world.settings.projectile.max_bounces = 1000;
        world.targets = vec![TargetView {
            id: ENEMY,
            pos: Vec2::new(90.0, 90.0),
            alive: true,
        }];

        // Parked in the middle of (0,0), facing right, no speed
        let mut p = world.spawn(ProjectileKind::Homing, Vec2::new(30.0, 30.0), 0.0);
        p.speed = 0.0;
        p.vel = Vec2::ZERO;

        world.step(&mut p, None);
        world.step(&mut p, None);
        assert!(p.path.is_empty(), "no steering before the window opens");

        world.step(&mut p, None);
        assert_eq!(p.path.len(), 3);
        // Waypoint (1,0) lies straight down, so the heading turns positive
        assert!(p.angle > 0.0 && p.angle < FRAC_PI_2);
    }

    #[test]
    fn test_homing_looks_past_a_waypoint_it_has_nearly_reached() {
        let mut maze = Maze::closed(2, 2, MazeGeometry::default());
        maze.open_wall(CellCoord::new(0, 0), Side::Bottom);
        maze.open_wall(CellCoord::new(1, 0), Side::Right);
        let mut world = World::new(maze);
        world.settings.projectile.homing_start_ticks = 0;
        world.targets = vec![TargetView {
            id: ENEMY,
            pos: Vec2::new(90.0, 90.0),
            alive: true,
        }];
        let route = vec![
            Vec2::new(30.0, 30.0),
            Vec2::new(30.0, 90.0),
            Vec2::new(90.0, 90.0),
        ];

        // Heading straight down at the second waypoint, parked at `pos`
        let parked = |world: &World, pos: Vec2| {
            let mut p = world.spawn(ProjectileKind::Homing, pos, FRAC_PI_2);
            p.speed = 0.0;
            p.vel = Vec2::ZERO;
            p.path = route.clone();
            p.last_path_update = Some(world.now);
            p
        };

        // Far from path[1]: keeps aiming at it
        let mut far = parked(&world, Vec2::new(30.0, 50.0));
        world.step(&mut far, None);
        assert_eq!(far.path, route, "path is not refreshed yet");
        assert!((far.angle - FRAC_PI_2).abs() < 1e-5);

        // Within half a cell of path[1]: turns toward path[2] on the right
        let mut near = parked(&world, Vec2::new(30.0, 80.0));
        world.step(&mut near, None);
        assert_eq!(near.path, route);
        assert!(near.angle < FRAC_PI_2 - 1e-3);
    }

    #[test]
    fn test_homing_falls_back_to_direct_steering_without_path() {
        let mut world = World::new(Maze::closed(2, 2, MazeGeometry::default()));
        world.settings.projectile.homing_start_ticks = 0;
        world.targets = vec![TargetView {
            id: ENEMY,
            pos: Vec2::new(90.0, 90.0),
            alive: true,
        }];
        let mut p = world.spawn(ProjectileKind::Homing, Vec2::new(30.0, 30.0), 0.0);
        p.speed = 0.0;
        p.vel = Vec2::ZERO;
        world.step(&mut p, None);
        assert!(p.path.is_empty());
        assert!(p.angle > 0.0, "turns toward the walled-off target anyway");
        assert!(p.active);
    }

    #[test]
    fn test_homing_ignores_owner_and_dead_tanks() {
        let targets = [
            TargetView {
                id: OWNER,
                pos: Vec2::new(1.0, 1.0),
                alive: true,
            },
            TargetView {
                id: ActorId(2),
                pos: Vec2::new(2.0, 2.0),
                alive: false,
            },
            TargetView {
                id: ENEMY,
                pos: Vec2::new(300.0, 300.0),
                alive: true,
            },
        ];
        let nearest = nearest_enemy(&targets, OWNER, Vec2::ZERO).unwrap();
        assert_eq!(nearest.id, ENEMY);
    }

    #[test]
    fn test_wireless_follows_pilot_stick() {
        let mut world = World::new(Maze::closed(3, 3, MazeGeometry::default()));
        let mut p = world.spawn(ProjectileKind::Wireless, Vec2::new(90.0, 90.0), 0.0);
        assert!((p.vel.length() - 6.0).abs() < 1e-4);

        let down = ControlInput {
            stick: Vec2::new(0.0, 1.0),
            ..Default::default()
        };
        world.step(&mut p, Some(&down));
        assert!(p.angle > 0.0);

        let mut unpiloted = world.spawn(ProjectileKind::Wireless, Vec2::new(90.0, 90.0), 0.0);
        world.step(&mut unpiloted, None);
        assert_eq!(unpiloted.angle, 0.0);

        let left_key = ControlInput {
            keys: DirectionKeys {
                left: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut keyed = world.spawn(ProjectileKind::Wireless, Vec2::new(90.0, 90.0), 0.0);
        world.step(&mut keyed, Some(&left_key));
        assert!(keyed.angle < 0.0);
    }

    #[test]
    fn test_portal_projectile_places_anchor_and_stops() {
        let mut world = World::new(corridor(1));
        let mut p = world.spawn(
            ProjectileKind::Portal(Polarity::Blue),
            Vec2::new(30.0, 30.0),
            0.0,
        );
        while p.active {
            world.step(&mut p, None);
        }
        let anchor = world.portals.get(Polarity::Blue).copied().unwrap();
        assert_eq!(anchor.normal, Vec2::NEG_X);
        assert!(anchor.pos.x > 50.0);
        assert!(world.portals.get(Polarity::Orange).is_none());
        assert!(matches!(
            world.events.last(),
            Some(SimEvent::PortalPlaced {
                polarity: Polarity::Blue,
                ..
            })
        ));
    }

    #[test]
    fn test_portal_teleport_relocates_and_points_away_from_exit_wall() {
        let mut world = World::new(Maze::closed(3, 5, MazeGeometry::default()));
        world.portals.place(
            Polarity::Blue,
            PortalAnchor {
                pos: Vec2::new(150.0, 95.0),
                normal: Vec2::NEG_Y,
            },
        );
        let exit = PortalAnchor {
            pos: Vec2::new(5.0, 150.0),
            normal: Vec2::X,
        };
        world.portals.place(Polarity::Orange, exit);

        // Heading down into the entry anchor
        let mut p = world.spawn(ProjectileKind::Normal, Vec2::new(150.0, 80.0), FRAC_PI_2);
        let mut ticks = 0;
        while world.events.is_empty() {
            world.step(&mut p, None);
            ticks += 1;
            assert!(ticks < 20, "never reached the entry anchor");
        }

        let clearance = world.settings.portal.projectile_clearance;
        assert!(p.active);
        assert_eq!(p.pos, exit.pos + exit.normal * clearance);
        assert!(p.vel.dot(exit.normal) > 0.0);
        assert!(matches!(
            world.events[0],
            SimEvent::ProjectileTeleported {
                from: Polarity::Blue,
                ..
            }
        ));

        // The cooldown stops it bouncing straight back through
        let pos = p.pos;
        world.step(&mut p, None);
        assert!(p.pos.x > pos.x);
    }

    #[test]
    fn test_time_warp_scales_motion_not_velocity() {
        let mut world = World::new(corridor(3));
        world.warp_fields = vec![WarpField {
            owner: ENEMY,
            center: Vec2::new(90.0, 30.0),
            radius: 100.0,
            factor: 0.5,
        }];
        let mut p = world.spawn(ProjectileKind::Normal, Vec2::new(90.0, 30.0), 0.0);
        world.step(&mut p, None);
        assert!((p.pos.x - 92.0).abs() < 1e-4);
        assert!((p.vel.x - 4.0).abs() < 1e-4);

        // The field's owner's projectiles are not slowed
        world.warp_fields[0].owner = OWNER;
        let mut own = world.spawn(ProjectileKind::Normal, Vec2::new(90.0, 30.0), 0.0);
        world.step(&mut own, None);
        assert!((own.pos.x - 94.0).abs() < 1e-4);
    }

    #[test]
    fn test_own_immunity_window() {
        let p = Projectile::new(1, OWNER, ProjectileKind::Normal, Vec2::ZERO, 0.0, 4.0, 100);
        assert!(!p.can_hit(OWNER, 100, 30));
        assert!(!p.can_hit(OWNER, 129, 30));
        assert!(p.can_hit(OWNER, 130, 30));
        assert!(p.can_hit(ENEMY, 100, 30));
    }

    proptest! {
        /// Wall-bound shots only ever change cell through an open edge.
        #[test]
        fn prop_shots_never_cross_a_standing_wall(
            seed in any::<u64>(),
            kind in prop_oneof![
                Just(ProjectileKind::Normal),
                Just(ProjectileKind::Homing),
                Just(ProjectileKind::Wireless),
                Just(ProjectileKind::Portal(Polarity::Blue)),
            ],
            speed in 1.0f32..20.0,
            angle in -PI..PI,
            row in 0usize..5,
            col in 0usize..5,
        ) {
            use rand::SeedableRng;
            let mut rng = rand_pcg::Pcg32::seed_from_u64(seed);
            let maze = Maze::generate(5, 5, MazeGeometry::default(), &mut rng);
            let start = maze.cell_center(CellCoord::new(row, col));
            let mut world = World::new(maze);
            world.settings.projectile.max_bounces = 10_000;
            world.settings.projectile.homing_max_bounces = 10_000;
            world.settings.projectile.homing_start_ticks = 0;
            world.targets = vec![TargetView {
                id: ENEMY,
                pos: world.maze.cell_center(CellCoord::new(4 - row, 4 - col)),
                alive: true,
            }];

            let mut p = world.spawn(kind, start, angle);
            p.speed = speed;
            p.set_heading(angle);

            for _ in 0..200 {
                let before = world.maze.cell_of(p.pos);
                prop_assert!(before.is_some());
                world.step(&mut p, None);
                if !p.active {
                    break;
                }
                let after = world.maze.cell_of(p.pos);
                prop_assert!(after.is_some(), "left the grid at {:?}", p.pos);
                if let (Some(a), Some(b)) = (before, after) {
                    prop_assert!(
                        world.maze.step_is_open(a, b),
                        "{:?} crossed a wall from {:?} to {:?}",
                        kind,
                        a,
                        b
                    );
                }
            }
        }
    }
}
