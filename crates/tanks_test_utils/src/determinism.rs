//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the game produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and batch comparisons only work if a game is 100% deterministic.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: segment crossings are computed with integer
//!   coordinates plus half-cell flags instead.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Explosion sets and wall health use ordered collections.
//!
//! - **System randomness**: none of the built-in algorithms use any.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: single collision passes and tank state transitions
//! 2. **Property tests**: random geometry must satisfy the crossing rules
//! 3. **Integration tests**: whole games are reproducible
//! 4. **Parallel tests**: running N games on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use tanks_core::game::GameManager;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps played per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the game was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a game multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the game
/// * `steps` - Number of steps to play per run
/// * `setup` - Function to create the initial game state
/// * `step` - Function to advance the game by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```ignore
/// use tanks_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     5,  // Run 5 times
///     100, // 100 steps each
///     || setup_duel(),
///     |game| { game.step(); },
///     |game| game.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    tracing::debug!(runs, steps, is_deterministic, "Determinism check finished");

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Determinism check specialised to [`GameManager`].
///
/// Plays the game twice for up to `steps` steps (stopping early once it
/// ends) and compares the final state hashes.
pub fn verify_game_determinism<F>(setup_fn: F, steps: u64) -> DeterminismResult
where
    F: Fn() -> GameManager,
{
    verify_determinism(
        2,
        steps,
        &setup_fn,
        |game| {
            game.step();
        },
        GameManager::state_hash,
    )
}

/// Result of parallel game runs.
#[derive(Debug, Clone)]
pub struct ParallelGameResult {
    /// Final state hash from each game.
    pub hashes: Vec<u64>,
    /// Number of steps each game ran.
    pub steps: u64,
}

impl ParallelGameResult {
    /// Check if all games produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all games matched.
    ///
    /// # Panics
    ///
    /// Panics if games produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel games diverged!\n\
                 Games: {}\n\
                 Steps: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N games on scoped threads and collect their final hashes.
///
/// Each game is built inside its own thread, so the game itself never
/// crosses a thread boundary.
///
/// # Panics
///
/// Panics if a game thread panics.
pub fn run_parallel_games<F>(setup_fn: F, num_games: usize, steps: u64) -> ParallelGameResult
where
    F: Fn() -> GameManager + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    for _ in 0..steps {
                        game.step();
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });

    ParallelGameResult { hashes, steps }
}

/// Compare two games step-by-step, finding the first divergence.
///
/// # Returns
///
/// `None` if the games are deterministic, `Some(step)` if they diverge
/// at that step.
pub fn find_first_divergence<F>(setup_fn: F, steps: u64) -> Option<u64>
where
    F: Fn() -> GameManager,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for step in 1..=steps {
        first.step();
        second.step();

        if first.state_hash() != second.state_hash() {
            return Some(step);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for geometry and game inputs.
pub mod strategies {
    use proptest::prelude::*;
    use tanks_core::action::ActionRequest;
    use tanks_core::direction::Direction;
    use tanks_core::geometry::Point;

    /// Board dimensions from 1 to 20 on each axis.
    pub fn arb_dimensions() -> impl Strategy<Value = (usize, usize)> {
        (1usize..=20, 1usize..=20)
    }

    /// Any point, including ones far outside a board.
    pub fn arb_point() -> impl Strategy<Value = Point> {
        (-100i32..100, -100i32..100).prop_map(|(x, y)| Point::new(x, y))
    }

    /// A point inside a `width` x `height` board.
    pub fn arb_point_in(width: usize, height: usize) -> impl Strategy<Value = Point> {
        let (w, h) = (
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        );
        (0..w, 0..h).prop_map(|(x, y)| Point::new(x, y))
    }

    /// Any of the eight directions.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    /// Any action request.
    pub fn arb_action() -> impl Strategy<Value = ActionRequest> {
        prop::sample::select(ActionRequest::ALL.to_vec())
    }

    /// A script of up to `max_len` actions.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<ActionRequest>> {
        prop::collection::vec(arb_action(), 1..=max_len.max(1))
    }
}
