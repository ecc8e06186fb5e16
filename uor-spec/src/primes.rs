//! # Shared Prime Cache
//!
//! The codec addresses primes by index: `nth_prime(0) = 2`,
//! `nth_prime(1) = 3`, and so on. The cache is process-wide, sorted, and
//! grow-only; the checksum prime, the operand prime, and all opcode primes
//! are registered at first use so that steady-state decoding is lookup-only.
//!
//! Growth takes the write lock, lookups the read lock. Multiple VMs hosted
//! in one process share this table safely.

use std::sync::{OnceLock, RwLock};

/// Hard cap on prime indices the cache will materialize.
///
/// Legal chunks only ever reference the opcode and operand primes (indices
/// 0–21); the cap bounds the trial-division work a hostile chunk can demand
/// before its factors are reported as foreign.
pub const MAX_PRIME_INDEX: usize = 4096;

/// Indices the codec tables rely on; registered eagerly.
const PREREGISTERED: usize = 32;

struct PrimeCache {
    primes: Vec<u64>,
}

impl PrimeCache {
    fn seeded() -> Self {
        let mut cache = PrimeCache { primes: vec![2, 3] };
        cache.grow_to(PREREGISTERED);
        cache
    }

    /// Extend the table until `index` is populated. Candidates are scanned
    /// in increasing order, so the table stays sorted and duplicate-free.
    fn grow_to(&mut self, index: usize) {
        while self.primes.len() <= index {
            let mut candidate = self.primes.last().copied().unwrap_or(1) + 2;
            while !self.is_prime(candidate) {
                candidate += 2;
            }
            self.primes.push(candidate);
        }
    }

    /// Trial division against cached primes. Valid for candidates below the
    /// square of the largest cached prime, which growth never outruns.
    fn is_prime(&self, n: u64) -> bool {
        for &p in &self.primes {
            if p * p > n {
                return true;
            }
            if n % p == 0 {
                return false;
            }
        }
        true
    }
}

fn cache() -> &'static RwLock<PrimeCache> {
    static CACHE: OnceLock<RwLock<PrimeCache>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(PrimeCache::seeded()))
}

/// The `index`-th prime (0-based), or `None` past [`MAX_PRIME_INDEX`].
pub fn nth_prime(index: usize) -> Option<u64> {
    if index > MAX_PRIME_INDEX {
        return None;
    }
    {
        let guard = cache().read().expect("prime cache poisoned");
        if let Some(&p) = guard.primes.get(index) {
            return Some(p);
        }
    }
    let mut guard = cache().write().expect("prime cache poisoned");
    guard.grow_to(index);
    Some(guard.primes[index])
}

/// Index of `p` in the prime sequence, or `None` if `p` is not a prime the
/// cache can reach.
pub fn prime_index(p: u64) -> Option<usize> {
    {
        let guard = cache().read().expect("prime cache poisoned");
        if guard.primes.last().copied().unwrap_or(0) >= p {
            return guard.primes.binary_search(&p).ok();
        }
    }
    let mut guard = cache().write().expect("prime cache poisoned");
    while guard.primes.last().copied().unwrap_or(0) < p {
        if guard.primes.len() > MAX_PRIME_INDEX {
            return None;
        }
        let next = guard.primes.len();
        guard.grow_to(next);
    }
    guard.primes.binary_search(&p).ok()
}
