//! Batch-GCD factoring of RSA modulus sets
//!
//! Bernstein's product/remainder tree computes, for every modulus N_i, the
//! value `gcd(N_i, prod_{j != i} N_j)` in near-linear time instead of the
//! quadratic all-pairs scan:
//!
//! 1. Product tree: leaves are the moduli, each inner node the product of
//!    its children, the root the product of the whole set.
//! 2. Remainder tree: the root keeps its product; every other node stores
//!    `parent mod node^2`. At a leaf this is `P mod N_i^2`, from which
//!    `gcd((P mod N_i^2) / N_i, N_i)` recovers the shared part of N_i.
//!
//! A modulus whose shared part equals the modulus itself (it divides the
//! product of the others, e.g. a duplicate) falls back to pairwise GCDs.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;

/// Per-modulus outcome, parallel to the input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorOutcome {
    /// A non-trivial factor shared with at least one other modulus.
    Factored(BigUint),
    /// Coprime to every other modulus in the set.
    Coprime,
    /// The modulus divides the product of the others and even pairwise
    /// GCDs found no proper factor (a duplicated modulus).
    Shared,
}

/// Computes `gcd(N_i, prod_{j != i} N_j)` for every modulus.
pub fn batch_gcd(moduli: &[BigUint]) -> Vec<FactorOutcome> {
    if moduli.is_empty() {
        return Vec::new();
    }
    if moduli.len() == 1 {
        return vec![FactorOutcome::Coprime];
    }

    let levels = product_tree(moduli);
    let leaf_remainders = remainder_tree(&levels);

    moduli
        .iter()
        .zip(leaf_remainders.iter())
        .enumerate()
        .map(|(i, (n, z))| {
            let g = (z / n).gcd(n);
            if g > BigUint::one() && g < *n {
                FactorOutcome::Factored(g)
            } else if g == *n {
                pairwise_rescue(i, moduli)
            } else {
                FactorOutcome::Coprime
            }
        })
        .collect()
}

/// Pairwise fallback for a modulus the tree could not resolve.
fn pairwise_rescue(index: usize, moduli: &[BigUint]) -> FactorOutcome {
    let n = &moduli[index];
    for (j, other) in moduli.iter().enumerate() {
        if j == index {
            continue;
        }
        let g = n.gcd(other);
        if g > BigUint::one() && g < *n {
            return FactorOutcome::Factored(g);
        }
    }
    FactorOutcome::Shared
}

/// Builds the product tree bottom-up; `levels[0]` are the leaves.
fn product_tree(leaves: &[BigUint]) -> Vec<Vec<BigUint>> {
    let mut levels = vec![leaves.to_vec()];
    while levels.last().map(|l| l.len()).unwrap_or(0) > 1 {
        let current = levels.last().expect("levels never empty");
        let next: Vec<BigUint> = current
            .chunks(2)
            .map(|pair| {
                if pair.len() == 2 {
                    &pair[0] * &pair[1]
                } else {
                    // odd node carries over unchanged
                    pair[0].clone()
                }
            })
            .collect();
        levels.push(next);
    }
    levels
}

/// Walks the tree top-down, reducing the parent value mod node^2.
///
/// Returns the per-leaf values `P mod N_i^2`.
fn remainder_tree(levels: &[Vec<BigUint>]) -> Vec<BigUint> {
    let mut current = levels.last().expect("levels never empty").clone();
    for level in levels.iter().rev().skip(1) {
        let mut next = Vec::with_capacity(level.len());
        for (idx, node) in level.iter().enumerate() {
            let parent = &current[idx / 2];
            next.push(parent % (node * node));
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    fn n(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn test_shared_prime_is_found() {
        // N_1 = p*q, N_2 = p*r, N_3 = s*t with all primes distinct
        let (p, q, r, s, t) = (1000003u64, 1000033, 1000037, 1009, 1013);
        let moduli = vec![n(p * q), n(p * r), n(s * t)];
        let outcomes = batch_gcd(&moduli);

        assert_eq!(
            outcomes,
            vec![
                FactorOutcome::Factored(n(p)),
                FactorOutcome::Factored(n(p)),
                FactorOutcome::Coprime,
            ]
        );
    }

    #[test]
    fn test_recovered_factors_divide_both_moduli() {
        let (p, q, r) = (7919u64, 7927, 7933);
        let moduli = vec![n(p * q), n(p * r)];
        for (outcome, modulus) in batch_gcd(&moduli).iter().zip(moduli.iter()) {
            match outcome {
                FactorOutcome::Factored(g) => {
                    assert!((modulus % g).is_zero());
                    assert_eq!(*g, n(p));
                }
                other => panic!("expected a factor, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_multiple_shared_primes() {
        // chain sharing: N_1 = p*q, N_2 = q*r, N_3 = r*s
        let (p, q, r, s) = (104729u64, 104743, 104759, 104761);
        let moduli = vec![n(p * q), n(q * r), n(r * s)];
        let outcomes = batch_gcd(&moduli);

        assert_eq!(outcomes[0], FactorOutcome::Factored(n(q)));
        // the middle modulus shares both of its primes: its whole value
        // divides the product of the neighbours, so the pairwise fallback
        // reports the factor shared with the first modulus
        assert_eq!(outcomes[1], FactorOutcome::Factored(n(q)));
        assert_eq!(outcomes[2], FactorOutcome::Factored(n(r)));
    }

    #[test]
    fn test_duplicate_modulus_reports_shared() {
        let (p, q) = (65537u64, 65539);
        let moduli = vec![n(p * q), n(p * q)];
        let outcomes = batch_gcd(&moduli);
        assert_eq!(outcomes, vec![FactorOutcome::Shared, FactorOutcome::Shared]);
    }

    #[test]
    fn test_all_coprime() {
        let moduli = vec![n(15), n(77), n(221)];
        assert_eq!(
            batch_gcd(&moduli),
            vec![
                FactorOutcome::Coprime,
                FactorOutcome::Coprime,
                FactorOutcome::Coprime,
            ]
        );
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(batch_gcd(&[]).is_empty());
        assert_eq!(batch_gcd(&[n(35)]), vec![FactorOutcome::Coprime]);
    }

    #[test]
    fn test_large_set_matches_pairwise_scan() {
        // a mixed set exercising several tree levels (including an odd
        // carry-over node)
        let primes = [3557u64, 3559, 3571, 3581, 3583, 3593, 3607];
        let moduli: Vec<BigUint> = vec![
            n(primes[0] * primes[1]),
            n(primes[2] * primes[3]),
            n(primes[0] * primes[4]),
            n(primes[5] * primes[6]),
            n(primes[3] * primes[5]),
        ];
        let outcomes = batch_gcd(&moduli);

        for (i, outcome) in outcomes.iter().enumerate() {
            // reference: plain gcd against the product of all others
            let mut product = BigUint::one();
            for (j, m) in moduli.iter().enumerate() {
                if j != i {
                    product *= m;
                }
            }
            let reference = moduli[i].gcd(&product);
            match outcome {
                FactorOutcome::Factored(g) => assert_eq!(*g, reference),
                FactorOutcome::Coprime => assert!(reference.is_one()),
                FactorOutcome::Shared => assert_eq!(reference, moduli[i]),
            }
        }
    }
}
