// --- File: intro.rs ---
use crate::config::IntroConfig;
use crate::constants::*;
use crate::simulation::SimRng;
use crate::utils::{rgb_from_hex, sample_below};
use glam::{Vec2, Vec4};
use rand::{Rng, SeedableRng};

// --- Glyphs ---

type Glyph = [[u8; LETTER_WIDTH]; LETTER_HEIGHT];

const GLYPH_S: Glyph = [
    [0, 1, 1, 1, 0],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 0],
    [0, 1, 1, 1, 0],
    [0, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [0, 1, 1, 1, 0],
];
const GLYPH_A: Glyph = [
    [0, 0, 1, 0, 0],
    [0, 1, 0, 1, 0],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 1, 1, 1, 1],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
];
const GLYPH_M: Glyph = [
    [1, 0, 0, 0, 1],
    [1, 1, 0, 1, 1],
    [1, 0, 1, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
];
const GLYPH_B: Glyph = [
    [1, 1, 1, 1, 0],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 1, 1, 1, 0],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 1, 1, 1, 0],
];
const GLYPH_H: Glyph = [
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 1, 1, 1, 1],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
];
const GLYPH_I: Glyph = [
    [0, 1, 1, 1, 0],
    [0, 0, 1, 0, 0],
    [0, 0, 1, 0, 0],
    [0, 0, 1, 0, 0],
    [0, 0, 1, 0, 0],
    [0, 0, 1, 0, 0],
    [0, 1, 1, 1, 0],
];
const GLYPH_R: Glyph = [
    [1, 1, 1, 1, 0],
    [1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 1, 1, 1, 0],
    [1, 0, 1, 0, 0],
    [1, 0, 0, 1, 0],
    [1, 0, 0, 0, 1],
];
const GLYPH_SPACE: Glyph = [[0; LETTER_WIDTH]; LETTER_HEIGHT];

fn glyph(c: char) -> Option<&'static Glyph> {
    match c.to_ascii_uppercase() {
        'S' => Some(&GLYPH_S),
        'A' => Some(&GLYPH_A),
        'M' => Some(&GLYPH_M),
        'B' => Some(&GLYPH_B),
        'H' => Some(&GLYPH_H),
        'I' => Some(&GLYPH_I),
        'R' => Some(&GLYPH_R),
        ' ' => Some(&GLYPH_SPACE),
        _ => None,
    }
}

// --- Blocks ---

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockState {
    Falling,
    Locked,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub target: Vec2, // Top-left corner once locked
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Vec4,
    pub delay: f32, // Ticks left before the block starts falling
    pub state: BlockState,
}

impl Block {
    fn update(&mut self) {
        if self.delay > 0.0 {
            self.delay -= 1.0;
            return;
        }
        if self.state == BlockState::Falling {
            self.velocity.y += INTRO_GRAVITY;
            self.velocity.x = (self.target.x - self.position.x) * INTRO_EASING;
            self.position += self.velocity;

            if self.position.y >= self.target.y {
                self.position = self.target;
                self.velocity = Vec2::ZERO;
                self.state = BlockState::Locked;
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.delay <= 0.0
    }
}

// --- Intro Animation ---

pub struct Intro {
    blocks: Vec<Block>,
    block_size: f32,
    viewport: Vec2,
    rng: SimRng,
    config: IntroConfig,
    palette: Vec<Vec4>,
    locked_ticks: u32,
    is_finished: bool,
}

impl Intro {
    pub fn new(config: IntroConfig, width: f32, height: f32) -> Self {
        let rng = match config.seed {
            Some(seed) => SimRng::seed_from_u64(seed),
            None => SimRng::from_entropy(),
        };
        let mut intro = Self {
            blocks: Vec::new(),
            block_size: MIN_BLOCK_SIZE,
            viewport: Vec2::new(width.max(1.0), height.max(1.0)),
            rng,
            palette: INTRO_PALETTE.iter().copied().map(rgb_from_hex).collect(),
            config,
            locked_ticks: 0,
            is_finished: false,
        };
        intro.build_layout();
        log::info!(
            "Intro spelling {:?} with {} blocks",
            intro.config.text,
            intro.blocks.len()
        );
        intro
    }

    fn build_layout(&mut self) {
        self.blocks.clear();
        self.locked_ticks = 0;

        let viewport = self.viewport;
        let block_size = (viewport.x / BLOCK_SIZE_WIDTH_DIVISOR)
            .min(viewport.y / BLOCK_SIZE_HEIGHT_DIVISOR)
            .max(MIN_BLOCK_SIZE);
        self.block_size = block_size;

        let slot_cols = LETTER_WIDTH + LETTER_GAP;
        let total_cols = (self.config.text.chars().count() * slot_cols).saturating_sub(LETTER_GAP);
        let start_x = (viewport.x - total_cols as f32 * block_size) / 2.0;
        let start_y = (viewport.y - LETTER_HEIGHT as f32 * block_size) / 2.0;

        for (slot, c) in self.config.text.chars().enumerate() {
            // Unknown characters still take up a slot
            let Some(bitmap) = glyph(c) else {
                continue;
            };
            let origin_x = start_x + (slot * slot_cols) as f32 * block_size;

            for (row, cells) in bitmap.iter().enumerate() {
                for (col, &cell) in cells.iter().enumerate() {
                    if cell == 0 {
                        continue;
                    }
                    let target = Vec2::new(
                        origin_x + col as f32 * block_size,
                        start_y + row as f32 * block_size,
                    );
                    let color = self.palette[self.rng.gen_range(0..self.palette.len())];
                    let position = Vec2::new(
                        sample_below(&mut self.rng, viewport.x),
                        -sample_below(&mut self.rng, BLOCK_SPAWN_HEIGHT_RANGE) - BLOCK_SPAWN_MIN_HEIGHT,
                    );
                    let delay = sample_below(&mut self.rng, MAX_BLOCK_DELAY);
                    self.blocks.push(Block {
                        target,
                        position,
                        velocity: Vec2::ZERO,
                        color,
                        delay,
                        state: BlockState::Falling,
                    });
                }
            }
        }
    }

    /// Advances every block by one step.
    ///
    /// Returns `true` exactly once, on the `linger_ticks`-th tick with every
    /// block locked (counting the tick the last block locks on). A layout with no blocks never completes on its own.
    pub fn tick(&mut self) -> bool {
        if self.is_finished {
            return false;
        }
        for block in &mut self.blocks {
            block.update();
        }

        let all_locked = !self.blocks.is_empty()
            && self.blocks.iter().all(|b| b.state == BlockState::Locked);
        if !all_locked {
            return false;
        }
        self.locked_ticks += 1;
        if self.locked_ticks >= self.config.linger_ticks {
            self.is_finished = true;
            log::info!("Intro complete");
            return true;
        }
        false
    }

    /// Refits the name to a new viewport, restarting the fall.
    pub fn resize(&mut self, width: f32, height: f32) {
        if self.is_finished || width <= 0.0 || height <= 0.0 {
            return;
        }
        self.viewport = Vec2::new(width, height);
        self.build_layout();
        log::debug!("Intro relaid out for {width}x{height}, block size {}", self.block_size);
    }

    pub fn skip(&mut self) {
        if !self.is_finished {
            self.is_finished = true;
            log::info!("Intro skipped");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn visible_blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter().filter(|b| b.is_visible())
    }

    pub fn block_size(&self) -> f32 {
        self.block_size
    }
}
// --- End of File: intro.rs ---
