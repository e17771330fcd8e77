use rand::{distributions::Open01, Rng, RngCore, SeedableRng};

pub type DefaultRng = rand_xoshiro::Xoshiro256Plus;

/// A stateful, sequential source of uniform samples.
///
/// Generators are never shared between threads while rendering, every task owns one.
pub trait RandomGenerator: RngCore + Send {
    /// A uniform sample in the open interval (0, 1). Never exactly zero.
    fn next_uniform(&mut self) -> f32 {
        self.sample(Open01)
    }
}

impl RandomGenerator for DefaultRng {}

/// A generator with a reproducible stream
pub fn seeded(seed: u64) -> DefaultRng {
    DefaultRng::seed_from_u64(seed)
}

/// A generator seeded from the operating system
pub fn from_entropy() -> DefaultRng {
    DefaultRng::from_entropy()
}

/// Hands out a fixed sequence from `next_uniform` before falling back to a seeded stream.
#[cfg(test)]
pub(crate) struct ForcedSamples {
    samples: std::collections::VecDeque<f32>,
    fallback: DefaultRng,
    pub drawn: usize,
}

#[cfg(test)]
impl ForcedSamples {
    pub fn new(samples: &[f32]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
            fallback: seeded(0),
            drawn: 0,
        }
    }
}

#[cfg(test)]
impl RngCore for ForcedSamples {
    fn next_u32(&mut self) -> u32 {
        self.fallback.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.fallback.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.fallback.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fallback.try_fill_bytes(dest)
    }
}

#[cfg(test)]
impl RandomGenerator for ForcedSamples {
    fn next_uniform(&mut self) -> f32 {
        self.drawn += 1;
        match self.samples.pop_front() {
            Some(sample) => sample,
            None => self.fallback.sample(Open01),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_samples_stay_inside_open_interval() {
        let mut rng = seeded(7);
        for _ in 0..100_000 {
            let u = rng.next_uniform();
            assert!(u > 0.0 && u < 1.0, "sample {} escaped (0, 1)", u);
        }
    }

    #[test]
    fn same_seed_gives_same_stream() {
        let mut a = seeded(42);
        let mut b = seeded(42);
        for _ in 0..16 {
            assert_eq!(a.next_uniform(), b.next_uniform());
        }
    }

    #[test]
    fn entropy_generators_differ() {
        let mut a = from_entropy();
        let mut b = from_entropy();
        let a: Vec<u64> = (0..4).map(|_| a.next_u64()).collect();
        let b: Vec<u64> = (0..4).map(|_| b.next_u64()).collect();
        assert_ne!(a, b);

        let u = from_entropy().next_uniform();
        assert!(u > 0.0 && u < 1.0);
    }

    #[test]
    fn forced_samples_come_first() {
        let mut rng = ForcedSamples::new(&[0.25, 0.75]);
        assert_eq!(rng.next_uniform(), 0.25);
        assert_eq!(rng.next_uniform(), 0.75);
        let u = rng.next_uniform();
        assert!(u > 0.0 && u < 1.0);
        assert_eq!(rng.drawn, 3);
    }
}
