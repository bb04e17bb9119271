// --- File: constants.rs ---
use glam::Vec4;

// --- Host / Window Constants ---
pub const BACKGROUND_COLOR: wgpu::Color = wgpu::Color {
    r: 0.96,
    g: 0.96,
    b: 0.96,
    a: 1.0,
};
pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 720;
pub const FIXED_TIMESTEP: f64 = 1.0 / 60.0;
pub const FPS_UPDATE_INTERVAL_SECS: f64 = 0.5;
// Cap on catch-up steps after a long stall (window drag, breakpoint)
pub const MAX_STEPS_PER_FRAME: u32 = 5;

// --- Blob Simulation Constants ---
pub const PREDATOR_COUNT: usize = 3;
pub const PREDATOR_RADIUS: f32 = 30.0;
pub const PREY_RADIUS: f32 = 8.0;
pub const PREY_SPEED: f32 = 2.0;
pub const PREDATOR_SPEED: f32 = 1.2;
pub const COLLISION_BUFFER: f32 = 5.0;
pub const GROWTH_INCREMENT: f32 = 1.0;
pub const PREY_WANDER_PROBABILITY: f64 = 0.05;
pub const PHASE_INCREMENT: f32 = 0.1;
pub const PREY_PER_SPAWN: usize = 3;
pub const SPAWN_SCATTER: f32 = 20.0;
// Each predator of an overlapping pair moves this share of the overlap
pub const COLLISION_PUSH_FACTOR: f32 = 0.5;
// Share of the displacement added to velocity after a push
pub const COLLISION_VELOCITY_NUDGE: f32 = 0.1;
// Initial velocity components are drawn from [-MAX, MAX)
pub const INITIAL_VELOCITY_MAX: f32 = 1.0;
// Initial wobble phase is drawn from [0, MAX)
pub const INITIAL_PHASE_MAX: f32 = 100.0;

pub const PREDATOR_COLOR: Vec4 = Vec4::new(0.851, 0.325, 0.310, 1.0); // #d9534f
pub const PREY_COLOR: Vec4 = Vec4::new(0.361, 0.722, 0.361, 1.0); // #5cb85c

// --- Intro Constants ---
pub const INTRO_TEXT: &str = "SAMBHAB MISHRA";
pub const INTRO_GRAVITY: f32 = 0.2;
pub const INTRO_EASING: f32 = 0.05;
pub const LETTER_WIDTH: usize = 5;
pub const LETTER_HEIGHT: usize = 7;
pub const LETTER_GAP: usize = 1;
pub const MAX_BLOCK_DELAY: f32 = 100.0;
pub const BLOCK_SPAWN_MIN_HEIGHT: f32 = 50.0;
pub const BLOCK_SPAWN_HEIGHT_RANGE: f32 = 500.0;
pub const BLOCK_SIZE_WIDTH_DIVISOR: f32 = 90.0;
pub const BLOCK_SIZE_HEIGHT_DIVISOR: f32 = 20.0;
pub const MIN_BLOCK_SIZE: f32 = 5.0;
// Two seconds at the fixed timestep
pub const INTRO_LINGER_TICKS: u32 = 120;

pub const INTRO_PALETTE: [u32; 7] = [
    0x00FFFF, 0x0000FF, 0xFFA500, 0xFFFF00, 0x00FF00, 0x800080, 0xFF0000,
];

// --- End of File: constants.rs ---
