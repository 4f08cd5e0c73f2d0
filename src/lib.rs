// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod game;
pub mod history;
pub mod leaderboard;
pub mod rng;
pub mod runtime;
pub mod storage;
pub mod timing;
pub mod util;
