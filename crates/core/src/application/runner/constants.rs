// Runner constants (no magic values)

/// Upper bound of the default worker pool width
pub const MAX_DEFAULT_JOBS: usize = 32;

/// Slots added on top of the CPU count for the default pool width
/// (installer scripts mostly wait on the network)
pub const EXTRA_IO_JOBS: usize = 4;

/// CPU count assumed when the platform cannot report one
pub const FALLBACK_PARALLELISM: usize = 1;

/// Default worker pool width: `min(32, cpus + 4)`
pub fn default_jobs() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_PARALLELISM);
    (cpus + EXTRA_IO_JOBS).min(MAX_DEFAULT_JOBS)
}
