//! Deterministic Random Number Generation.
//!
//! Every random decision the generator makes goes through [`SeededRng`], a
//! seeded `StdRng` wrapper. Given the same seed, the same backend
//! capabilities and the same action weights, the generator produces
//! byte-identical traces, so a trace plus its seed is a complete reproducer.

use rand::prelude::*;

/// Outcome of a three-way choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// First alternative.
    First,
    /// Second alternative.
    Second,
    /// Third alternative.
    Third,
}

/// Characters symbols and string values are drawn from.
const PRINTABLE: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789~!@$%^&*_-+=<>.?/";

/// A deterministic random source with a recoverable seed.
#[derive(Debug)]
pub struct SeededRng {
    seed: u64,
    rng: StdRng,
}

impl SeededRng {
    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this generator was last (re)seeded with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the stream from a new seed.
    ///
    /// Used when replaying `set-seed` trace lines and by seed-per-action
    /// tracing.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Fork an independent sub-stream.
    ///
    /// The child is seeded from this stream, so forking is itself
    /// deterministic.
    pub fn fork(&mut self) -> SeededRng {
        SeededRng::new(self.rng.random())
    }

    /// Uniform `u32` in `lo..=hi`.
    pub fn pick_u32(&mut self, lo: u32, hi: u32) -> u32 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        self.rng.random_range(lo..=hi)
    }

    /// Uniform `u64` in `lo..=hi`.
    pub fn pick_u64(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        self.rng.random_range(lo..=hi)
    }

    /// Uniform `usize` in `lo..=hi`.
    pub fn pick_usize(&mut self, lo: usize, hi: usize) -> usize {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        self.rng.random_range(lo..=hi)
    }

    /// Fair coin.
    pub fn flip_coin(&mut self) -> bool {
        self.rng.random()
    }

    /// True with probability `p_in_1000 / 1000`.
    pub fn pick_with_prob(&mut self, p_in_1000: u32) -> bool {
        assert!(p_in_1000 <= 1000, "probability {p_in_1000} out of range");
        self.pick_u32(0, 999) < p_in_1000
    }

    /// Three-way uniform choice.
    pub fn one_of_three(&mut self) -> Choice {
        match self.pick_u32(0, 2) {
            0 => Choice::First,
            1 => Choice::Second,
            _ => Choice::Third,
        }
    }

    /// Uniform choice from a non-empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "choose from empty slice");
        &items[self.pick_usize(0, items.len() - 1)]
    }

    /// Weighted choice; returns the index of the selected weight.
    ///
    /// Zero-weight entries are never selected. The total weight must be
    /// non-zero.
    pub fn pick_weighted(&mut self, weights: &[u32]) -> usize {
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        assert!(total > 0, "pick_weighted with zero total weight");
        let mut ticket = self.pick_u64(0, total - 1);
        for (idx, &w) in weights.iter().enumerate() {
            let w = u64::from(w);
            if ticket < w {
                return idx;
            }
            ticket -= w;
        }
        unreachable!("ticket exceeded total weight")
    }

    /// Random printable string of the given length.
    pub fn pick_string(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| *self.choose(PRINTABLE) as char)
            .collect()
    }

    /// Random binary numeral of exactly `width` digits.
    pub fn pick_bin_string(&mut self, width: u32) -> String {
        assert!(width >= 1, "binary numeral of width 0");
        (0..width)
            .map(|_| if self.flip_coin() { '1' } else { '0' })
            .collect()
    }

    /// Random decimal numeral of up to `len` digits, no leading zeros.
    pub fn pick_dec_string(&mut self, len: usize) -> String {
        assert!(len >= 1, "decimal numeral of length 0");
        let len = self.pick_usize(1, len);
        let mut s = String::with_capacity(len);
        s.push((b'0' + self.pick_u32(if len > 1 { 1 } else { 0 }, 9) as u8) as char);
        for _ in 1..len {
            s.push((b'0' + self.pick_u32(0, 9) as u8) as char);
        }
        s
    }

    /// Random hexadecimal numeral of exactly `len` digits.
    pub fn pick_hex_string(&mut self, len: usize) -> String {
        assert!(len >= 1, "hex numeral of length 0");
        const HEX: &[u8] = b"0123456789abcdef";
        (0..len).map(|_| *self.choose(HEX) as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SeededRng::new(0xC0FFEE);
        let mut b = SeededRng::new(0xC0FFEE);
        for _ in 0..100 {
            assert_eq!(a.pick_u64(0, u64::MAX), b.pick_u64(0, u64::MAX));
        }
    }

    #[test]
    fn test_reseed_restarts_stream() {
        let mut rng = SeededRng::new(7);
        let first: Vec<u32> = (0..10).map(|_| rng.pick_u32(0, 1000)).collect();
        rng.reseed(7);
        let second: Vec<u32> = (0..10).map(|_| rng.pick_u32(0, 1000)).collect();
        assert_eq!(first, second);
        assert_eq!(rng.seed(), 7);
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = SeededRng::new(1);
        for _ in 0..1000 {
            let v = rng.pick_u32(3, 9);
            assert!((3..=9).contains(&v));
        }
        assert_eq!(rng.pick_u32(5, 5), 5);
    }

    #[test]
    fn test_weighted_skips_zero_weights() {
        let mut rng = SeededRng::new(99);
        for _ in 0..500 {
            let idx = rng.pick_weighted(&[0, 3, 0, 1]);
            assert!(idx == 1 || idx == 3);
        }
    }

    #[test]
    fn test_fork_is_deterministic() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        let mut fa = a.fork();
        let mut fb = b.fork();
        assert_eq!(fa.pick_u64(0, u64::MAX), fb.pick_u64(0, u64::MAX));
    }

    #[test]
    fn test_numeral_shapes() {
        let mut rng = SeededRng::new(3);
        let bin = rng.pick_bin_string(8);
        assert_eq!(bin.len(), 8);
        assert!(bin.chars().all(|c| c == '0' || c == '1'));

        let dec = rng.pick_dec_string(5);
        assert!(!dec.is_empty() && dec.len() <= 5);
        assert!(dec.chars().all(|c| c.is_ascii_digit()));
        if dec.len() > 1 {
            assert!(!dec.starts_with('0'));
        }

        let hex = rng.pick_hex_string(4);
        assert_eq!(hex.len(), 4);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_prob_extremes() {
        let mut rng = SeededRng::new(11);
        for _ in 0..100 {
            assert!(!rng.pick_with_prob(0));
            assert!(rng.pick_with_prob(1000));
        }
    }
}
