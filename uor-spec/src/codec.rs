//! # UOR Codec
//!
//! A chunk is a single integer of the form
//!
//! ```text
//! chunk = CHECKSUM_PRIME^(exp_sum mod CHECKSUM_MOD) · P_op^1 · ∏ⱼ Qⱼ^(vⱼ+1)
//! ```
//!
//! where `P_op` is the opcode prime, the `Qⱼ` are the opcode's operand
//! primes, the `vⱼ` are the operand values (offset by one so zero stays
//! encodable), and `exp_sum` is the sum of all payload exponents. Encoding
//! is canonical: equal instructions produce equal chunks.
//!
//! Decoding is total over well-formed chunks and reports every defect as a
//! [`DecodeError`]; nothing is tolerated or repaired.

use crate::error::{DecodeError, EncodingError};
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::primes;

/// A chunk is a non-negative integer. Values are capped at [`MAX_CHUNK`] so
/// chunks can travel on the VM's signed stack.
pub type Chunk = u128;

/// The reserved prime guarding structural integrity.
pub const CHECKSUM_PRIME: u64 = 2;

/// Modulus applied to the payload exponent sum.
pub const CHECKSUM_MOD: u32 = 256;

/// Largest representable chunk.
pub const MAX_CHUNK: Chunk = i128::MAX as u128;

/// `base^exp` in `u128`, or `None` on overflow.
pub fn prime_power(base: u64, exp: u32) -> Option<u128> {
    let mut acc: u128 = 1;
    let mut base = base as u128;
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.checked_mul(base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(acc)
}

/// Multiply a raw payload by its checksum factor.
///
/// `exp_sum` is the sum of the payload exponents. Shared by [`build`] and
/// the VM's `BUILD_CHUNK`, which assembles payloads from stack frames.
pub fn attach_checksum(payload: u128, exp_sum: u64) -> Result<Chunk, EncodingError> {
    let cksum_exp = (exp_sum % CHECKSUM_MOD as u64) as u32;
    let factor = prime_power(CHECKSUM_PRIME, cksum_exp).ok_or(EncodingError::ChunkTooLarge)?;
    let chunk = payload
        .checked_mul(factor)
        .ok_or(EncodingError::ChunkTooLarge)?;
    if chunk > MAX_CHUNK {
        return Err(EncodingError::ChunkTooLarge);
    }
    Ok(chunk)
}

/// Encode an opcode and its operand vector into a chunk.
pub fn build(opcode: Opcode, operands: &[u32]) -> Result<Chunk, EncodingError> {
    let expected = opcode.operand_count();
    if operands.len() != expected {
        return Err(EncodingError::OperandCount {
            opcode,
            expected,
            found: operands.len(),
        });
    }

    let mut payload: u128 = opcode.prime() as u128;
    let mut exp_sum: u64 = 1;
    for (&value, &q) in operands.iter().zip(opcode.operand_primes()) {
        let exponent = value.checked_add(1).ok_or(EncodingError::ChunkTooLarge)?;
        let factor = prime_power(q, exponent).ok_or(EncodingError::ChunkTooLarge)?;
        payload = payload
            .checked_mul(factor)
            .ok_or(EncodingError::ChunkTooLarge)?;
        exp_sum += exponent as u64;
    }
    attach_checksum(payload, exp_sum)
}

/// Fully factor an odd payload by trial division against the prime cache.
///
/// A cofactor the cache cannot reach within its cap cannot be an opcode or
/// operand prime, so it is reported as foreign rather than chased.
fn factor_payload(value: u128) -> Result<Vec<(u64, u32)>, DecodeError> {
    let mut factors = Vec::new();
    let mut d = value;
    let mut index = 0;
    while d > 1 {
        let p = match primes::nth_prime(index) {
            Some(p) => p as u128,
            None => return Err(DecodeError::Foreign { factor: d }),
        };
        if p * p > d {
            break;
        }
        if d % p == 0 {
            let mut count = 0u32;
            while d % p == 0 {
                d /= p;
                count += 1;
            }
            factors.push((p as u64, count));
        }
        index += 1;
    }
    if d > 1 {
        // The remaining cofactor is prime.
        let Ok(p) = u64::try_from(d) else {
            return Err(DecodeError::Foreign { factor: d });
        };
        factors.push((p, 1));
    }
    Ok(factors)
}

/// Decode a chunk into an instruction, verifying the checksum.
pub fn decode(chunk: Chunk) -> Result<Instruction, DecodeError> {
    if chunk == 0 {
        return Err(DecodeError::NoOpcode);
    }

    // Peel the checksum factor.
    let mut cksum_found: u32 = 0;
    let mut payload = chunk;
    while payload % CHECKSUM_PRIME as u128 == 0 {
        payload /= CHECKSUM_PRIME as u128;
        cksum_found += 1;
    }

    let factors = factor_payload(payload)?;

    // Locate the unique opcode prime, which must carry exponent 1.
    let mut found: Option<(Opcode, u32)> = None;
    for &(p, e) in &factors {
        if let Some(op) = Opcode::from_prime(p) {
            if found.is_some() {
                return Err(DecodeError::Ambiguous);
            }
            found = Some((op, e));
        }
    }
    let (opcode, op_exp) = found.ok_or(DecodeError::NoOpcode)?;
    if op_exp != 1 {
        return Err(DecodeError::NoOpcode);
    }

    // Read each operand prime in table order; absence is malformed for the
    // standard opcode set.
    let mut operands = Vec::with_capacity(opcode.operand_count());
    let mut exp_sum: u64 = 1;
    for &q in opcode.operand_primes() {
        let exponent = factors
            .iter()
            .find(|&&(p, _)| p == q)
            .map(|&(_, e)| e)
            .ok_or(DecodeError::BadOperand { opcode })?;
        operands.push(exponent - 1);
        exp_sum += exponent as u64;
    }

    // Anything else in the payload does not belong to this opcode.
    for &(p, _) in &factors {
        let is_opcode = p == opcode.prime();
        let is_operand = opcode.operand_primes().contains(&p);
        if !is_opcode && !is_operand {
            return Err(DecodeError::Foreign { factor: p as u128 });
        }
    }

    let expected = (exp_sum % CHECKSUM_MOD as u64) as u32;
    if expected != cksum_found {
        return Err(DecodeError::Checksum {
            expected,
            found: cksum_found,
        });
    }

    Ok(Instruction::new(opcode, operands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OPERAND_PRIME;

    #[test]
    fn test_nullary_chunk_values() {
        // NOP = 5^1 · 2^1, ADD = 11^1 · 2^1
        assert_eq!(build(Opcode::Nop, &[]).unwrap(), 10);
        assert_eq!(build(Opcode::Add, &[]).unwrap(), 22);
        assert_eq!(build(Opcode::Halt, &[]).unwrap(), 158);
    }

    #[test]
    fn test_push_chunk_value() {
        // PUSH(0) = 7 · 3^1 · 2^2
        assert_eq!(build(Opcode::Push, &[0]).unwrap(), 84);
        // PUSH(4) = 7 · 3^5 · 2^6
        assert_eq!(build(Opcode::Push, &[4]).unwrap(), 7 * 243 * 64);
    }

    #[test]
    fn test_round_trip_all_opcodes() {
        for op in Opcode::all() {
            let operands: Vec<u32> = (0..op.operand_count() as u32).map(|i| i + 3).collect();
            let chunk = build(op, &operands).unwrap();
            let decoded = decode(chunk).unwrap();
            assert_eq!(decoded.opcode, op);
            assert_eq!(decoded.operands, operands);
        }
    }

    #[test]
    fn test_round_trip_push_operand_range() {
        for v in [0u32, 1, 2, 9, 10, 21, 40, 45] {
            let chunk = build(Opcode::Push, &[v]).unwrap();
            let decoded = decode(chunk).unwrap();
            assert_eq!(decoded.opcode, Opcode::Push);
            assert_eq!(decoded.operands, vec![v]);
        }
    }

    #[test]
    fn test_canonical_uniqueness() {
        for op in [Opcode::Nop, Opcode::Swap, Opcode::Halt] {
            let chunk = build(op, &[]).unwrap();
            let decoded = decode(chunk).unwrap();
            assert_eq!(build(decoded.opcode, &decoded.operands).unwrap(), chunk);
        }
        let chunk = build(Opcode::Push, &[42]).unwrap();
        let decoded = decode(chunk).unwrap();
        assert_eq!(build(decoded.opcode, &decoded.operands).unwrap(), chunk);
    }

    #[test]
    fn test_corrupt_checksum() {
        let chunk = build(Opcode::Push, &[42]).unwrap();
        let corrupted = chunk * CHECKSUM_PRIME as u128;
        assert!(matches!(
            decode(corrupted),
            Err(DecodeError::Checksum { .. })
        ));
    }

    #[test]
    fn test_missing_checksum_factor() {
        // PUSH(0) with the checksum factor stripped: 7 · 3
        assert!(matches!(decode(21), Err(DecodeError::Checksum { .. })));
    }

    #[test]
    fn test_ambiguous_opcode() {
        // Two opcode primes with exponent 1 and a consistent-looking
        // checksum factor: 5 · 7 · 2^2.
        assert_eq!(decode(140), Err(DecodeError::Ambiguous));
    }

    #[test]
    fn test_no_opcode() {
        assert_eq!(decode(0), Err(DecodeError::NoOpcode));
        assert_eq!(decode(1), Err(DecodeError::NoOpcode));
        // Operand prime only: 3^1 · 2^1.
        assert_eq!(decode(6), Err(DecodeError::NoOpcode));
        // Opcode prime with exponent 2: 5^2 · 2^2.
        assert_eq!(decode(100), Err(DecodeError::NoOpcode));
    }

    #[test]
    fn test_missing_operand() {
        // PUSH without its operand prime: 7 · 2^1.
        assert_eq!(
            decode(14),
            Err(DecodeError::BadOperand {
                opcode: Opcode::Push
            })
        );
    }

    #[test]
    fn test_foreign_prime() {
        // PUSH(0) payload with an unassigned prime mixed in.
        let chunk = build(Opcode::Push, &[0]).unwrap() * 83;
        assert_eq!(decode(chunk), Err(DecodeError::Foreign { factor: 83 }));
        // Operand prime on an opcode that takes none.
        let chunk = 11 * OPERAND_PRIME as u128 * 4; // ADD · 3 · 2^2
        assert_eq!(
            decode(chunk),
            Err(DecodeError::Foreign {
                factor: OPERAND_PRIME as u128
            })
        );
    }

    #[test]
    fn test_operand_count_mismatch() {
        assert!(matches!(
            build(Opcode::Push, &[]),
            Err(EncodingError::OperandCount { .. })
        ));
        assert!(matches!(
            build(Opcode::Nop, &[1]),
            Err(EncodingError::OperandCount { .. })
        ));
    }

    #[test]
    fn test_oversized_operand() {
        assert_eq!(
            build(Opcode::Push, &[10_000]),
            Err(EncodingError::ChunkTooLarge)
        );
    }

    #[test]
    fn test_attach_checksum_matches_build() {
        // BUILD_CHUNK-style construction of PUSH(9).
        let payload = 7u128 * prime_power(3, 10).unwrap();
        let chunk = attach_checksum(payload, 11).unwrap();
        assert_eq!(chunk, build(Opcode::Push, &[9]).unwrap());
    }
}
