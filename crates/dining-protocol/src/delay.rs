//! Think and eat durations.
//!
//! Delays are injected per diner so tests can pin them to zero or drive
//! them from a seed. Nothing in the protocol sleeps on a hardcoded clock.

use std::time::Duration;

use dining_topology::DinerId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of think and eat durations for one diner.
pub trait DelaySource: Send {
    /// How long to think before getting hungry.
    fn think(&mut self) -> Duration;

    /// How long to eat once both forks are in hand.
    fn eat(&mut self) -> Duration;
}

/// Uniform random delays over `[0, max)`.
#[derive(Debug, Clone)]
pub struct UniformDelays {
    rng: StdRng,
    max_think: Duration,
    max_eat: Duration,
}

impl UniformDelays {
    /// Delays drawn from a seeded generator.
    pub fn seeded(seed: u64, max_think: Duration, max_eat: Duration) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_think,
            max_eat,
        }
    }

    /// Delays drawn from OS entropy.
    pub fn from_entropy(max_think: Duration, max_eat: Duration) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            max_think,
            max_eat,
        }
    }

    fn sample(&mut self, max: Duration) -> Duration {
        let bound = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.rng.gen_range(0..bound))
    }
}

impl DelaySource for UniformDelays {
    fn think(&mut self) -> Duration {
        self.sample(self.max_think)
    }

    fn eat(&mut self) -> Duration {
        self.sample(self.max_eat)
    }
}

/// The same delays every time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDelays {
    pub think: Duration,
    pub eat: Duration,
}

impl FixedDelays {
    /// No thinking, no eating time. Diners only yield between steps.
    pub const fn instant() -> Self {
        Self {
            think: Duration::ZERO,
            eat: Duration::ZERO,
        }
    }
}

impl DelaySource for FixedDelays {
    fn think(&mut self) -> Duration {
        self.think
    }

    fn eat(&mut self) -> Duration {
        self.eat
    }
}

/// How every diner at a table picks its delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayProfile {
    /// Uniform over `[0, max)`; seeded per diner when `seed` is set.
    Uniform {
        max_think: Duration,
        max_eat: Duration,
        seed: Option<u64>,
    },
    /// Constant delays.
    Fixed { think: Duration, eat: Duration },
}

impl Default for DelayProfile {
    fn default() -> Self {
        Self::Uniform {
            max_think: Duration::from_secs(1),
            max_eat: Duration::from_secs(1),
            seed: None,
        }
    }
}

impl DelayProfile {
    /// Uniform delays bounded by `max_think` and `max_eat`.
    #[must_use]
    pub const fn uniform(max_think: Duration, max_eat: Duration) -> Self {
        Self::Uniform {
            max_think,
            max_eat,
            seed: None,
        }
    }

    /// Zero think and eat time.
    #[must_use]
    pub const fn instant() -> Self {
        Self::Fixed {
            think: Duration::ZERO,
            eat: Duration::ZERO,
        }
    }

    /// Make uniform delays reproducible. Fixed delays are unaffected.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        match self {
            Self::Uniform {
                max_think, max_eat, ..
            } => Self::Uniform {
                max_think,
                max_eat,
                seed: Some(seed),
            },
            fixed => fixed,
        }
    }

    /// Build the delay source for one diner.
    pub fn source_for(&self, diner: DinerId) -> Box<dyn DelaySource> {
        match *self {
            Self::Uniform {
                max_think,
                max_eat,
                seed: Some(seed),
            } => Box::new(UniformDelays::seeded(
                diner_seed(seed, diner),
                max_think,
                max_eat,
            )),
            Self::Uniform {
                max_think,
                max_eat,
                seed: None,
            } => Box::new(UniformDelays::from_entropy(max_think, max_eat)),
            Self::Fixed { think, eat } => Box::new(FixedDelays { think, eat }),
        }
    }
}

// Spread seats across the seed space so neighbors don't share a stream
fn diner_seed(seed: u64, diner: DinerId) -> u64 {
    seed ^ (diner.0 as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
