// --- File: simulation.rs ---
use crate::config::SimulationConfig;
use crate::constants::*;
use crate::utils::{heading, sample_below, wrap_axis};
use glam::{Vec2, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

// --- Core Data Structures ---

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Predator,
    Prey,
}

impl EntityKind {
    pub fn color(self) -> Vec4 {
        match self {
            EntityKind::Predator => PREDATOR_COLOR,
            EntityKind::Prey => PREY_COLOR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: EntityKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,      // Eating, collision and wrap distance
    pub base_radius: f32, // Resting size the wobble oscillates around
    pub phase: f32,       // Cosmetic only
    pub facing: f32,
    pub color: Vec4,
}

impl Entity {
    /// A motionless entity with zero phase, for placing known state.
    pub fn new(kind: EntityKind, position: Vec2, radius: f32) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            radius,
            base_radius: radius,
            phase: 0.0,
            facing: 0.0,
            color: kind.color(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    fn spawn<R: Rng + ?Sized>(rng: &mut R, kind: EntityKind, position: Vec2, radius: f32) -> Self {
        let velocity = Vec2::new(
            rng.gen_range(-INITIAL_VELOCITY_MAX..INITIAL_VELOCITY_MAX),
            rng.gen_range(-INITIAL_VELOCITY_MAX..INITIAL_VELOCITY_MAX),
        );
        let mut entity = Self::new(kind, position, radius).with_velocity(velocity);
        entity.phase = rng.gen_range(0.0..INITIAL_PHASE_MAX);
        entity
    }

    // Rendered and physical size grow together
    fn grow(&mut self, amount: f32) {
        self.base_radius += amount;
        self.radius += amount;
    }

    #[inline]
    fn advance(&mut self) {
        self.position += self.velocity;
    }

    #[inline]
    fn wrap(&mut self, viewport: Vec2) {
        self.position.x = wrap_axis(self.position.x, viewport.x, self.radius);
        self.position.y = wrap_axis(self.position.y, viewport.y, self.radius);
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            kind: self.kind,
            position: self.position,
            radius: self.radius,
            base_radius: self.base_radius,
            phase: self.phase,
            facing: self.facing,
            color: self.color,
        }
    }
}

/// Read-only view of one entity between ticks, handed to renderers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub kind: EntityKind,
    pub position: Vec2,
    pub radius: f32,
    pub base_radius: f32,
    pub phase: f32,
    pub facing: f32,
    pub color: Vec4,
}

pub type SimRng = StdRng;

/// Index and distance of the closest candidate not listed in `excluded`.
///
/// Ties keep the first candidate in slice order.
pub fn find_nearest(origin: Vec2, candidates: &[Entity], excluded: &[usize]) -> Option<(usize, f32)> {
    let mut nearest = None;
    let mut min_distance = f32::INFINITY;
    for (index, candidate) in candidates.iter().enumerate() {
        if excluded.contains(&index) {
            continue;
        }
        let distance = origin.distance(candidate.position);
        if distance < min_distance {
            min_distance = distance;
            nearest = Some((index, distance));
        }
    }
    nearest
}

pub struct World {
    predators: Vec<Entity>,
    prey: Vec<Entity>,
    rng: SimRng,
    viewport: Vec2,
    is_running: bool,
    pub config: SimulationConfig,
    // Prey eaten during the current predator pass, reused across ticks
    removal_indices_buffer: Vec<usize>,
}

impl World {
    pub fn new(width: f32, height: f32, config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SimRng::seed_from_u64(seed),
            None => SimRng::from_entropy(),
        };
        Self {
            predators: Vec::with_capacity(config.predator_count),
            prey: Vec::new(),
            rng,
            viewport: Vec2::new(width.max(1.0), height.max(1.0)),
            is_running: false,
            removal_indices_buffer: Vec::with_capacity(config.predator_count),
            config,
        }
    }

    /// A running world holding exactly the given entities.
    pub fn with_entities(
        width: f32,
        height: f32,
        config: SimulationConfig,
        predators: Vec<Entity>,
        prey: Vec<Entity>,
    ) -> Self {
        let mut world = Self::new(width, height, config);
        world.predators = predators;
        world.prey = prey;
        world.is_running = true;
        world
    }

    // --- Lifecycle ---

    pub fn start(&mut self) {
        if self.is_running {
            log::trace!("start() ignored, world already running");
            return;
        }
        self.predators.clear();
        self.prey.clear();
        self.removal_indices_buffer.clear();
        for _ in 0..self.config.predator_count {
            let position = Vec2::new(
                sample_below(&mut self.rng, self.viewport.x),
                sample_below(&mut self.rng, self.viewport.y),
            );
            self.predators.push(Entity::spawn(
                &mut self.rng,
                EntityKind::Predator,
                position,
                self.config.predator_radius,
            ));
        }
        self.is_running = true;
        log::info!(
            "Blob world started with {} predators in {}x{}",
            self.predators.len(),
            self.viewport.x,
            self.viewport.y
        );
    }

    pub fn stop(&mut self) {
        if !self.is_running {
            log::trace!("stop() ignored, world already stopped");
            return;
        }
        self.is_running = false;
        self.predators.clear();
        self.prey.clear();
        self.removal_indices_buffer.clear();
        log::info!("Blob world stopped");
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    // --- Host Events ---

    pub fn spawn_prey(&mut self, x: f32, y: f32) {
        if !self.is_running {
            log::trace!("Ignoring prey spawn at ({x:.1}, {y:.1}) while stopped");
            return;
        }
        let scatter = self.config.spawn_scatter;
        for _ in 0..self.config.prey_per_spawn {
            let position = Vec2::new(
                x + sample_below(&mut self.rng, scatter),
                y + sample_below(&mut self.rng, scatter),
            );
            self.prey.push(Entity::spawn(
                &mut self.rng,
                EntityKind::Prey,
                position,
                self.config.prey_radius,
            ));
        }
        log::debug!("Spawned prey near ({x:.1}, {y:.1}), {} total", self.prey.len());
    }

    /// Records new viewport bounds, even while stopped, so the next `start()`
    /// spawns into them. Entities are left where they are.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.viewport = Vec2::new(width, height);
            log::info!("Blob world viewport resized to {width}x{height}");
        }
    }

    // --- Simulation Step ---

    pub fn tick(&mut self) {
        if !self.is_running {
            return;
        }
        self.update_predators();
        self.update_prey();
        self.resolve_predator_collisions();
        // Collision pushes may carry a predator past an edge
        let viewport = self.viewport;
        for predator in &mut self.predators {
            predator.wrap(viewport);
        }
    }

    fn update_predators(&mut self) {
        self.removal_indices_buffer.clear();
        let viewport = self.viewport;
        let config = &self.config;

        for predator in self.predators.iter_mut() {
            predator.phase += config.phase_increment;

            // Prey already eaten this tick are invisible to later predators
            match find_nearest(predator.position, &self.prey, &self.removal_indices_buffer) {
                Some((index, distance)) => {
                    let target = &self.prey[index];
                    let angle = heading(target.position - predator.position);
                    predator.velocity = Vec2::from_angle(angle) * config.predator_speed;
                    predator.facing = angle;

                    if distance < predator.radius + target.radius {
                        self.removal_indices_buffer.push(index);
                        predator.grow(config.growth_increment);
                        log::debug!(
                            "Predator at ({:.1}, {:.1}) ate prey, base radius now {}",
                            predator.position.x,
                            predator.position.y,
                            predator.base_radius
                        );
                    }
                }
                None => {
                    predator.facing = heading(predator.velocity);
                }
            }

            predator.advance();
            predator.wrap(viewport);
        }

        // Descending order keeps the remaining indices valid while removing
        self.removal_indices_buffer.sort_unstable_by(|a, b| b.cmp(a));
        for &index in &self.removal_indices_buffer {
            self.prey.remove(index);
        }
    }

    fn update_prey(&mut self) {
        let viewport = self.viewport;
        let config = &self.config;
        let wander_probability = config.prey_wander_probability.clamp(0.0, 1.0);

        for prey in self.prey.iter_mut() {
            prey.phase += config.phase_increment;
            if self.rng.gen_bool(wander_probability) {
                let angle = self.rng.gen_range(0.0..TAU);
                prey.velocity = Vec2::from_angle(angle) * config.prey_speed;
            }
            prey.facing = heading(prey.velocity);
            prey.advance();
            prey.wrap(viewport);
        }
    }

    /// Pushes every overlapping predator pair apart to the minimum separation.
    ///
    /// Pairs are visited once in `(i, j)` order with `i < j`, and displacements
    /// accumulate, so with three or more mutually overlapping predators a single
    /// pass can leave some pairs short of the full separation. Coincident
    /// centres push along +x.
    pub fn resolve_predator_collisions(&mut self) {
        let buffer = self.config.collision_buffer;
        let count = self.predators.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let (head, tail) = self.predators.split_at_mut(j);
                let first = &mut head[i];
                let second = &mut tail[0];

                let offset = first.position - second.position;
                let distance = offset.length();
                let min_distance = first.radius + second.radius + buffer;
                if distance >= min_distance {
                    continue;
                }

                let direction = if distance > 0.0 {
                    offset / distance
                } else {
                    Vec2::X
                };
                let push = direction * (min_distance - distance) * COLLISION_PUSH_FACTOR;
                first.position += push;
                second.position -= push;
                first.velocity += push * COLLISION_VELOCITY_NUDGE;
                second.velocity -= push * COLLISION_VELOCITY_NUDGE;
            }
        }
    }

    // --- Queries ---

    pub fn nearest_prey(&self, position: Vec2) -> Option<usize> {
        find_nearest(position, &self.prey, &[]).map(|(index, _)| index)
    }

    pub fn predators(&self) -> &[Entity] {
        &self.predators
    }

    pub fn prey(&self) -> &[Entity] {
        &self.prey
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Predators first, then prey, matching the draw order.
    pub fn snapshot(&self) -> impl Iterator<Item = EntitySnapshot> + '_ {
        self.predators
            .iter()
            .chain(self.prey.iter())
            .map(Entity::snapshot)
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.predators.len(), self.prey.len())
    }
}
// --- End of File: simulation.rs ---

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SimulationConfig {
        SimulationConfig {
            seed: Some(42),
            ..SimulationConfig::default()
        }
    }

    fn predator_at(x: f32, y: f32) -> Entity {
        Entity::new(EntityKind::Predator, Vec2::new(x, y), PREDATOR_RADIUS)
    }

    fn prey_at(x: f32, y: f32) -> Entity {
        Entity::new(EntityKind::Prey, Vec2::new(x, y), PREY_RADIUS)
    }

    #[test]
    fn predator_eats_prey_in_contact() {
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(0.0, 0.0)],
            vec![prey_at(10.0, 0.0)],
        );
        world.tick();
        assert!(world.prey().is_empty());
        assert_eq!(world.predators()[0].base_radius, 31.0);
    }

    #[test]
    fn predator_chases_nearest_prey_and_moves() {
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(100.0, 100.0)],
            vec![prey_at(300.0, 100.0), prey_at(100.0, 200.0)],
        );
        world.tick();
        let predator = &world.predators()[0];
        // Second prey is closer (100 vs 200), straight down in screen space
        assert!((predator.facing - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((predator.velocity.length() - PREDATOR_SPEED).abs() < 1e-5);
        assert!((predator.position.y - (100.0 + PREDATOR_SPEED)).abs() < 1e-4);
        assert_eq!(world.prey().len(), 2);
    }

    #[test]
    fn predator_without_prey_keeps_heading() {
        let velocity = Vec2::new(0.5, -0.5);
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(400.0, 300.0).with_velocity(velocity)],
            Vec::new(),
        );
        world.tick();
        let predator = &world.predators()[0];
        assert_eq!(predator.velocity, velocity);
        assert_eq!(predator.position, Vec2::new(400.5, 299.5));
        assert!((predator.facing - heading(velocity)).abs() < 1e-6);
    }

    #[test]
    fn one_prey_cannot_feed_two_predators() {
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(100.0, 100.0), predator_at(140.0, 100.0)],
            vec![prey_at(120.0, 100.0)],
        );
        world.tick();
        assert!(world.prey().is_empty());
        assert_eq!(world.predators()[0].base_radius, 31.0);
        assert_eq!(world.predators()[1].base_radius, 30.0);
    }

    #[test]
    fn predator_eats_at_most_one_prey_per_tick() {
        let prey = (0..5).map(|i| prey_at(200.0 + i as f32, 200.0)).collect();
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(200.0, 200.0)],
            prey,
        );
        world.tick();
        assert_eq!(world.prey().len(), 4);
        assert_eq!(world.predators()[0].base_radius, 31.0);
    }

    #[test]
    fn nearest_prey_tie_breaks_on_collection_order() {
        let world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(100.0, 100.0)],
            vec![prey_at(110.0, 100.0), prey_at(90.0, 100.0), prey_at(100.0, 110.0)],
        );
        for _ in 0..10 {
            assert_eq!(world.nearest_prey(Vec2::new(100.0, 100.0)), Some(0));
        }
    }

    #[test]
    fn nearest_prey_of_empty_collection_is_none() {
        let world = World::with_entities(800.0, 600.0, test_config(), Vec::new(), Vec::new());
        assert_eq!(world.nearest_prey(Vec2::ZERO), None);
    }

    #[test]
    fn find_nearest_skips_excluded() {
        let prey = vec![prey_at(1.0, 0.0), prey_at(5.0, 0.0)];
        assert_eq!(find_nearest(Vec2::ZERO, &prey, &[0]).map(|(i, _)| i), Some(1));
        assert_eq!(find_nearest(Vec2::ZERO, &prey, &[0, 1]), None);
    }

    #[test]
    fn collision_separates_pair_symmetrically() {
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(0.0, 0.0), predator_at(10.0, 0.0)],
            Vec::new(),
        );
        world.resolve_predator_collisions();
        let a = &world.predators()[0];
        let b = &world.predators()[1];
        assert!((a.position.distance(b.position) - 65.0).abs() < 1e-4);
        assert!((a.position.x + 27.5).abs() < 1e-4);
        assert!((b.position.x - 37.5).abs() < 1e-4);
        assert!((a.velocity.x + 2.75).abs() < 1e-5);
        assert!((b.velocity.x - 2.75).abs() < 1e-5);
    }

    #[test]
    fn collision_of_coincident_centres_pushes_along_x() {
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(400.0, 300.0), predator_at(400.0, 300.0)],
            Vec::new(),
        );
        world.resolve_predator_collisions();
        assert_eq!(world.predators()[0].position, Vec2::new(432.5, 300.0));
        assert_eq!(world.predators()[1].position, Vec2::new(367.5, 300.0));
    }

    #[test]
    fn collision_push_past_edge_wraps_within_the_tick() {
        let mut world = World::with_entities(
            50.0,
            50.0,
            test_config(),
            vec![predator_at(0.0, 25.0), predator_at(0.0, 25.0)],
            Vec::new(),
        );
        world.tick();
        assert_eq!(world.predators()[0].position, Vec2::new(32.5, 25.0));
        // Pushed to -32.5, past the -30 margin
        assert_eq!(world.predators()[1].position, Vec2::new(80.0, 25.0));
    }

    #[test]
    fn crowded_predators_in_small_viewport_stay_in_bounds() {
        let mut world = World::with_entities(
            50.0,
            50.0,
            test_config(),
            vec![predator_at(5.0, 5.0), predator_at(5.0, 5.0), predator_at(5.0, 5.0)],
            Vec::new(),
        );
        for _ in 0..500 {
            world.tick();
            for predator in world.predators() {
                let r = predator.radius;
                assert!((-r..=50.0 + r).contains(&predator.position.x), "{:?}", predator.position);
                assert!((-r..=50.0 + r).contains(&predator.position.y), "{:?}", predator.position);
            }
        }
    }

    #[test]
    fn distant_predators_are_untouched_by_collision() {
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(100.0, 100.0), predator_at(300.0, 100.0)],
            Vec::new(),
        );
        world.resolve_predator_collisions();
        assert_eq!(world.predators()[0].position, Vec2::new(100.0, 100.0));
        assert_eq!(world.predators()[1].velocity, Vec2::ZERO);
    }

    #[test]
    fn spawn_while_stopped_is_ignored() {
        let mut world = World::new(800.0, 600.0, test_config());
        world.spawn_prey(100.0, 100.0);
        assert!(world.prey().is_empty());
    }

    #[test]
    fn spawn_adds_three_scattered_prey() {
        let mut world = World::new(800.0, 600.0, test_config());
        world.start();
        world.spawn_prey(100.0, 100.0);
        assert_eq!(world.prey().len(), 3);
        for prey in world.prey() {
            assert!((100.0..120.0).contains(&prey.position.x));
            assert!((100.0..120.0).contains(&prey.position.y));
            assert_eq!(prey.radius, PREY_RADIUS);
            assert_eq!(prey.kind, EntityKind::Prey);
        }
    }

    #[test]
    fn start_creates_predators_inside_viewport() {
        let mut world = World::new(800.0, 600.0, test_config());
        world.start();
        assert!(world.is_running());
        assert_eq!(world.predators().len(), PREDATOR_COUNT);
        assert!(world.prey().is_empty());
        for predator in world.predators() {
            assert!((0.0..800.0).contains(&predator.position.x));
            assert!((0.0..600.0).contains(&predator.position.y));
            assert_eq!(predator.radius, PREDATOR_RADIUS);
        }
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut world = World::new(800.0, 600.0, test_config());
        world.start();
        world.spawn_prey(50.0, 50.0);
        let before: Vec<Vec2> = world.predators().iter().map(|p| p.position).collect();
        world.start();
        let after: Vec<Vec2> = world.predators().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
        assert_eq!(world.prey().len(), 3);
    }

    #[test]
    fn stop_resets_and_halts_ticks() {
        let mut world = World::new(800.0, 600.0, test_config());
        world.start();
        world.spawn_prey(50.0, 50.0);
        world.stop();
        assert!(!world.is_running());
        assert_eq!(world.counts(), (0, 0));
        world.tick();
        world.stop();
        assert_eq!(world.counts(), (0, 0));

        world.start();
        assert_eq!(world.counts(), (PREDATOR_COUNT, 0));
    }

    #[test]
    fn resize_leaves_entities_in_place_until_next_move() {
        let mut world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(700.0, 100.0).with_velocity(Vec2::new(1.0, 0.0))],
            Vec::new(),
        );
        world.resize(400.0, 300.0);
        assert_eq!(world.viewport(), Vec2::new(400.0, 300.0));
        assert_eq!(world.predators()[0].position, Vec2::new(700.0, 100.0));

        world.tick();
        assert_eq!(world.predators()[0].position, Vec2::new(-30.0, 100.0));
    }

    #[test]
    fn resize_while_stopped_sets_spawn_area_for_start() {
        let mut world = World::new(800.0, 600.0, test_config());
        world.resize(200.0, 100.0);
        world.start();
        for predator in world.predators() {
            assert!((0.0..200.0).contains(&predator.position.x));
            assert!((0.0..100.0).contains(&predator.position.y));
        }
    }

    #[test]
    fn resize_ignores_degenerate_sizes() {
        let mut world = World::new(800.0, 600.0, test_config());
        world.resize(0.0, 300.0);
        assert_eq!(world.viewport(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn prey_rehead_at_prey_speed_when_wandering() {
        let config = SimulationConfig {
            prey_wander_probability: 1.0,
            ..test_config()
        };
        let mut world = World::with_entities(800.0, 600.0, config, Vec::new(), vec![prey_at(400.0, 300.0)]);
        world.tick();
        let prey = &world.prey()[0];
        assert!((prey.velocity.length() - PREY_SPEED).abs() < 1e-5);
        assert!((prey.phase - PHASE_INCREMENT).abs() < 1e-6);
    }

    #[test]
    fn prey_keep_velocity_when_not_wandering() {
        let config = SimulationConfig {
            prey_wander_probability: 0.0,
            ..test_config()
        };
        let velocity = Vec2::new(1.0, 1.0);
        let mut world = World::with_entities(
            800.0,
            600.0,
            config,
            Vec::new(),
            vec![prey_at(400.0, 300.0).with_velocity(velocity)],
        );
        world.tick();
        assert_eq!(world.prey()[0].velocity, velocity);
        assert_eq!(world.prey()[0].position, Vec2::new(401.0, 301.0));
    }

    #[test]
    fn snapshot_lists_predators_before_prey() {
        let world = World::with_entities(
            800.0,
            600.0,
            test_config(),
            vec![predator_at(1.0, 1.0)],
            vec![prey_at(2.0, 2.0), prey_at(3.0, 3.0)],
        );
        let kinds: Vec<EntityKind> = world.snapshot().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![EntityKind::Predator, EntityKind::Prey, EntityKind::Prey]);
        assert_eq!(world.snapshot().next().map(|s| s.color), Some(PREDATOR_COLOR));
    }
}
