pub mod config;
pub mod constants;
pub mod intro;
pub mod renderer;
pub mod simulation;
pub mod utils;
