//! Divisor arithmetic for axis lengths.
//!
//! Chunk extents must divide their axis exactly, so the solver repeatedly asks
//! for the largest divisor of an axis length not exceeding some guess.
//! Divisors are enumerated from the prime factorisation rather than by
//! scanning downwards from the guess, which matters for long prime-ish axes.

/// Prime factorisation of `n` as `(prime, multiplicity)` pairs in ascending order.
///
/// `n == 0` and `n == 1` have no prime factors.
pub fn prime_factors(mut n: u64) -> Vec<(u64, u32)> {
    let mut out = Vec::new();
    if n < 2 {
        return out;
    }

    let mut push = |p: u64, n: &mut u64| {
        let mut count = 0;
        while *n % p == 0 {
            *n /= p;
            count += 1;
        }
        if count > 0 {
            out.push((p, count));
        }
    };

    push(2, &mut n);
    let mut p = 3;
    while p <= n / p {
        push(p, &mut n);
        p += 2;
    }
    if n > 1 {
        out.push((n, 1));
    }
    out
}

/// All divisors of `n` in ascending order; empty for `n == 0`.
pub fn divisors(n: u64) -> Vec<u64> {
    if n == 0 {
        return Vec::new();
    }
    let mut out = vec![1];
    for (p, count) in prime_factors(n) {
        let existing = out.len();
        let mut power = 1;
        for _ in 0..count {
            power *= p;
            for idx in 0..existing {
                out.push(out[idx] * power);
            }
        }
    }
    out.sort_unstable();
    out
}

/// The largest divisor of `n` which is no greater than `limit`.
///
/// Falls back to 1 when `limit` is 0, and returns `n` itself when `limit >= n`.
pub fn largest_divisor_at_most(n: u64, limit: u64) -> u64 {
    if limit >= n {
        return n;
    }
    let divs = divisors(n);
    let idx = divs.partition_point(|&d| d <= limit);
    if idx == 0 { 1 } else { divs[idx - 1] }
}
