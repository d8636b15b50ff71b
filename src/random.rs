//! Pseudo-random draws for the scheduler

/// Source of full-width random draws
///
/// Callers derive their sub-ranges by masking, folding and modulo.
pub trait RandomSource {
    fn next_u32(&mut self) -> u32;
}

/// Seeded generator backed by [`fastrand`]
///
/// Seeding from the bus address gives each unit on a shared bus its own
/// sequence, so bars wired together do not fire in lockstep.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: fastrand::Rng,
}

impl SeededRandom {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn from_address(address: u8) -> Self {
        Self::with_seed(u64::from(address))
    }
}

impl RandomSource for SeededRandom {
    fn next_u32(&mut self) -> u32 {
        self.rng.u32(..)
    }
}
