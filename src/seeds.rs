//! Seed management for cave generation
//!
//! Every generation run resolves one master seed and derives a separate seed for
//! each stage of the pipeline, so tweaking how one stage consumes randomness
//! does not reshuffle the others.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeds for the stages of a generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaveSeeds {
    /// Master seed (reported to the caller for replays)
    pub master: u64,
    /// Initial layout: noise fill, room placement, walker population
    pub layout: u64,
    /// Carving: passage radii, maze growth, walker movement
    pub carving: u64,
    /// Repair: door selection and dead-end pruning
    pub repair: u64,
}

impl CaveSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            layout: derive_seed(master, "layout"),
            carving: derive_seed(master, "carving"),
            repair: derive_seed(master, "repair"),
        }
    }

    /// Hash a text phrase into a master seed.
    pub fn from_phrase(phrase: &str) -> Self {
        Self::from_master(mix(fnv1a(phrase)))
    }

    /// Use the explicit seed when given, otherwise draw a fresh one from entropy.
    pub fn resolve(seed: Option<u64>) -> Self {
        Self::from_master(seed.unwrap_or_else(rand::random))
    }

    pub fn builder(master: u64) -> CaveSeedsBuilder {
        CaveSeedsBuilder::new(master)
    }

    pub fn layout_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.layout)
    }

    pub fn carving_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.carving)
    }

    pub fn repair_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.repair)
    }
}

/// Builder for overriding individual stage seeds while deriving the rest
pub struct CaveSeedsBuilder {
    seeds: CaveSeeds,
}

impl CaveSeedsBuilder {
    pub fn new(master: u64) -> Self {
        Self {
            seeds: CaveSeeds::from_master(master),
        }
    }

    pub fn layout(mut self, seed: u64) -> Self {
        self.seeds.layout = seed;
        self
    }

    pub fn carving(mut self, seed: u64) -> Self {
        self.seeds.carving = seed;
        self
    }

    pub fn repair(mut self, seed: u64) -> Self {
        self.seeds.repair = seed;
        self
    }

    pub fn build(self) -> CaveSeeds {
        self.seeds
    }
}

/// Derive a sub-seed from a master seed and a stage name.
///
/// Only fixed arithmetic is used, so saved seeds replay the same way on any
/// toolchain.
fn derive_seed(master: u64, stage: &str) -> u64 {
    mix(master.wrapping_add(0x9e3779b97f4a7c15) ^ fnv1a(stage))
}

/// FNV-1a over the bytes of `text`.
fn fnv1a(text: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in text.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// splitmix64 finaliser
fn mix(mut hash: u64) -> u64 {
    hash ^= hash >> 30;
    hash = hash.wrapping_mul(0xbf58476d1ce4e5b9);
    hash ^= hash >> 27;
    hash = hash.wrapping_mul(0x94d049bb133111eb);
    hash ^ (hash >> 31)
}

impl std::fmt::Display for CaveSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CaveSeeds {{ master: {}, layout: {}, carving: {}, repair: {} }}",
            self.master, self.layout, self.carving, self.repair,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_deterministic_derivation() {
        let seeds1 = CaveSeeds::from_master(12345);
        let seeds2 = CaveSeeds::from_master(12345);
        assert_eq!(seeds1, seeds2);
    }

    #[test]
    fn test_stages_get_different_seeds() {
        let seeds = CaveSeeds::from_master(12345);
        assert_ne!(seeds.layout, seeds.carving);
        assert_ne!(seeds.carving, seeds.repair);
        assert_ne!(seeds.layout, seeds.repair);
    }

    #[test]
    fn test_phrase_is_stable() {
        assert_eq!(CaveSeeds::from_phrase("deep caves"), CaveSeeds::from_phrase("deep caves"));
        assert_ne!(
            CaveSeeds::from_phrase("deep caves").master,
            CaveSeeds::from_phrase("shallow caves").master
        );
    }

    #[test]
    fn test_derivation_is_pinned() {
        // Fixed values: a saved seed must replay identically across toolchains
        assert_eq!(fnv1a("a"), 0xaf63dc4c8601ec8c);
        let seeds = CaveSeeds::from_master(12345);
        assert_eq!(seeds.layout, 10857628782698418987);
        assert_eq!(seeds.carving, 18415473217110129713);
        assert_eq!(seeds.repair, 16845432732076258757);
        assert_eq!(CaveSeeds::from_phrase("deep caves").master, 1833275212945566153);
    }

    #[test]
    fn test_resolve_keeps_explicit_seed() {
        assert_eq!(CaveSeeds::resolve(Some(7)).master, 7);
    }

    #[test]
    fn test_builder_override() {
        let seeds = CaveSeeds::builder(12345).carving(99).build();
        let derived = CaveSeeds::from_master(12345);

        assert_eq!(seeds.carving, 99);
        assert_eq!(seeds.layout, derived.layout);
        assert_eq!(seeds.repair, derived.repair);
    }

    #[test]
    fn test_stage_rngs_replay() {
        let seeds = CaveSeeds::from_master(3);
        let a: u64 = seeds.layout_rng().gen();
        let b: u64 = seeds.layout_rng().gen();
        assert_eq!(a, b);
    }
}
