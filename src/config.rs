// --- File: config.rs ---
use crate::constants::*;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub predator_count: usize,
    pub predator_radius: f32,
    pub prey_radius: f32,
    pub predator_speed: f32,
    pub prey_speed: f32,
    pub collision_buffer: f32,
    pub growth_increment: f32,
    pub prey_wander_probability: f64,
    pub phase_increment: f32,
    pub prey_per_spawn: usize,
    pub spawn_scatter: f32,
    // None seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            predator_count: PREDATOR_COUNT,
            predator_radius: PREDATOR_RADIUS,
            prey_radius: PREY_RADIUS,
            predator_speed: PREDATOR_SPEED,
            prey_speed: PREY_SPEED,
            collision_buffer: COLLISION_BUFFER,
            growth_increment: GROWTH_INCREMENT,
            prey_wander_probability: PREY_WANDER_PROBABILITY,
            phase_increment: PHASE_INCREMENT,
            prey_per_spawn: PREY_PER_SPAWN,
            spawn_scatter: SPAWN_SCATTER,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntroConfig {
    pub text: String,
    pub linger_ticks: u32,
    pub seed: Option<u64>,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            text: INTRO_TEXT.to_string(),
            linger_ticks: INTRO_LINGER_TICKS,
            seed: None,
        }
    }
}
// --- End of File: config.rs ---
