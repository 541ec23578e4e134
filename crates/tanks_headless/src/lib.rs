//! Headless tank battle runner for strategy matchups and CI verification.
//!
//! This crate plays board files without any interaction:
//!
//! - **Matches**: one board, one strategy per player, a turn log on disk
//! - **Batches**: every board against every strategy pairing, in parallel
//! - **Verification**: repeated runs and replays must end in the same state
//!
//! # Example
//!
//! ```bash
//! # Play a board
//! cargo run -p tanks_headless -- run --map boards/duel.txt -s sentry -s shooter
//!
//! # Verify determinism
//! cargo run -p tanks_headless -- verify --map boards/duel.txt --runs 10
//! ```

pub mod ascii_visualizer;
pub mod batch;
pub mod map_loader;
pub mod runner;
pub mod strategies;

pub use ascii_visualizer::{render_ascii, AsciiConfig};
pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary, GameRecord};
pub use map_loader::{MapError, MapFile};
pub use runner::{run_match, MatchReport, MatchSetup, RunError};
pub use strategies::{Strategy, StrategyError, StrategyFactory, StrategySpec};
