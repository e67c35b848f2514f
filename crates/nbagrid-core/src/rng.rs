use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generator used everywhere a draw must be reproducible from a seed
pub type GridRng = ChaCha8Rng;

/// Create a generator from a fixed seed
pub fn seeded(seed: u64) -> GridRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Draw a fresh seed for production builds
pub fn fresh_seed() -> u64 {
    let mut seed_bytes = [0u8; 8];
    getrandom::getrandom(&mut seed_bytes).unwrap_or_else(|_| {
        // Fallback: use a static counter if getrandom fails
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        seed_bytes = counter.to_le_bytes();
    });
    u64::from_le_bytes(seed_bytes)
}
