//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the farm simulation produces
//! identical results given identical seeds and actions.
//!
//! # Testing Strategy
//!
//! Replays and pre-turn snapshots rely on the simulation being 100%
//! deterministic. Sources of non-determinism include:
//!
//! - **Floating-point math**: All state uses [`agri_core::math::Fixed`] and
//!   integer cents.
//!
//! - **HashMap iteration order**: Holdings and multipliers live in
//!   `BTreeMap`s; tiles are a row-major arena.
//!
//! - **System randomness**: Every draw comes from the injected
//!   [`agri_core::random::RandomSource`].
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual pipeline stages with scripted draws
//! 2. **Property tests**: Random seeds and actions still replay identically
//! 3. **Integration tests**: Multi-year runs are reproducible
//! 4. **Parallel tests**: Farms on N threads all match

use std::thread;

use agri_core::simulation::Farm;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of years simulated.
    pub years: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Years: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.years,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `years` - Number of steps to run per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one year
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    years: u32,
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

        for _ in 0..years {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        years,
    }
}

/// Close one year, ignoring game over.
fn close_year(farm: &mut Farm) {
    let _ = farm.end_turn();
}

/// Run the same farm twice and compare final state hashes.
///
/// # Example
///
/// ```
/// use agri_core::simulation::Farm;
/// use agri_test_utils::determinism::verify_farm_determinism;
///
/// let is_deterministic = verify_farm_determinism(
///     || {
///         let mut farm = Farm::builtin(7).unwrap();
///         farm.place(0, 0, "paddyRice").unwrap();
///         farm
///     },
///     20,
/// );
/// assert!(is_deterministic);
/// ```
pub fn verify_farm_determinism<F>(setup_fn: F, years: u32) -> bool
where
    F: Fn() -> Farm,
{
    verify_determinism(2, years, &setup_fn, close_year, |farm: &Farm| {
        farm.state_hash()
    })
    .is_deterministic
}

/// Run N farms on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_farms<F>(setup_fn: F, num_farms: usize, years: u32) -> DeterminismResult
where
    F: Fn() -> Farm + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_farms)
            .map(|_| {
                s.spawn(|| {
                    let mut farm = setup_fn();
                    for _ in 0..years {
                        close_year(&mut farm);
                    }
                    farm.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        years,
    }
}

/// Compare two farm runs year by year, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(year)` for the first year
/// after which they differ (0 for the opening state).
pub fn find_first_divergence<F>(setup_fn: F, years: u32) -> Option<u32>
where
    F: Fn() -> Farm,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for year in 1..=years {
        close_year(&mut first);
        close_year(&mut second);

        if first.state_hash() != second.state_hash() {
            return Some(year);
        }
    }

    None
}

/// Verify that a snapshot taken mid-game restores the exact state.
pub fn verify_snapshot_determinism<F>(setup_fn: F, years: u32) -> bool
where
    F: Fn() -> Farm,
{
    let mut farm = setup_fn();

    for _ in 0..years {
        close_year(&mut farm);
    }

    let hash_before = farm.state_hash();
    let Ok(snapshot) = farm.snapshot() else {
        return false;
    };

    close_year(&mut farm);
    if farm.restore(&snapshot).is_err() {
        return false;
    }

    farm.state_hash() == hash_before
}
