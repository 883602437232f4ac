//! Seeded, domain-separated random streams.
//!
//! Player actions and the hostile phase draw from independent streams so a
//! change in how many draws one side makes never shifts the other.
use std::cell::{RefCell, RefMut};

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::rngs::mock::StepRng;
use rand::{RngCore, SeedableRng};
use sha2::Sha256;

/// Deterministic bundle of RNG streams segregated by resolution domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    action: RefCell<CountingRng<SmallRng>>,
    enemy: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            action: RefCell::new(CountingRng::seeded(derive_stream_seed(seed, b"action"))),
            enemy: RefCell::new(CountingRng::seeded(derive_stream_seed(seed, b"enemy"))),
        }
    }

    /// Stream for player action rules and exploration.
    #[must_use]
    pub fn action(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.action.borrow_mut()
    }

    /// Stream for the hostile phase.
    #[must_use]
    pub fn enemy(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.enemy.borrow_mut()
    }

    /// Total draws across both streams.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.action.borrow().draws() + self.enemy.borrow().draws()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> CountingRng<R> {
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// HMAC-SHA256 of the domain tag keyed by the user seed, folded to 64 bits.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        // HMAC accepts keys of any length.
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Scripted stream whose first `gen::<f64>()` is exactly `fraction`.
///
/// Later words keep stepping, so rejection sampling in `gen_range` and
/// `choose` always terminates. Used to pin exploration rolls in tests and
/// replays.
#[must_use]
pub fn forced_draw(fraction: f64) -> StepRng {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bits = ((fraction.clamp(0.0, 1.0) * (1u64 << 53) as f64) as u64) << 11;
    StepRng::new(bits, 0x9e37_79b9_7f4a_7c15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn streams_are_deterministic_per_seed() {
        let a = RngBundle::from_user_seed(42);
        let b = RngBundle::from_user_seed(42);
        let xs: Vec<u32> = (0..8).map(|_| a.action().r#gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.action().r#gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn domains_are_separated() {
        assert_ne!(
            derive_stream_seed(7, b"action"),
            derive_stream_seed(7, b"enemy")
        );
        assert_ne!(
            derive_stream_seed(7, b"action"),
            derive_stream_seed(8, b"action")
        );
    }

    #[test]
    fn draws_are_counted_per_stream() {
        let bundle = RngBundle::from_user_seed(1);
        let _: f64 = bundle.action().r#gen();
        let _: bool = bundle.enemy().gen_bool(0.5);
        let _: u64 = bundle.enemy().r#gen();
        assert_eq!(bundle.action().draws(), 1);
        assert_eq!(bundle.enemy().draws(), 2);
        assert_eq!(bundle.draws(), 3);
    }

    #[test]
    fn forced_draw_pins_the_first_fraction() {
        for fraction in [0.0, 0.25, 0.65, 0.95] {
            let mut rng = forced_draw(fraction);
            let first: f64 = rng.r#gen();
            assert!((first - fraction).abs() < 1e-12);
            let roll = rng.gen_range(5..=15);
            assert!((5..=15).contains(&roll));
        }
    }
}
