//! # Opcode Dispatch
//!
//! Stack conventions: for binary operations the top of stack is the second
//! operand (`a, b → a ⊕ b` with `b` on top). `JUMP_IF_ZERO` and
//! `POKE_CHUNK` take their address on top. The variable-length frames of
//! `BUILD_CHUNK` and `FACTORIZE` are handled here, not in a generic arity
//! table.
//!
//! `FACTORIZE` pushes the decoded opcode's enumeration index first, then
//! the operands in operand-table order, so the top of stack is the last
//! operand. `BUILD_CHUNK` consumes `num_factor_pairs` from the top, then
//! one `(prime index, exponent)` pair per factor, each pair having been
//! pushed as prime index then exponent.

use rand::Rng;
use uor_spec::{attach_checksum, prime_power, primes, EncodingError, Instruction, Opcode};

use crate::error::{Result, RuntimeError};
use crate::vm::Vm;
use crate::Word;

/// What the executed instruction asks of the step loop.
pub(crate) enum Control {
    Advance,
    Jump(usize),
    Suspend,
    Halt,
}

pub(crate) fn execute(vm: &mut Vm, instruction: &Instruction) -> Result<Control> {
    match instruction.opcode {
        Opcode::Nop => {}

        Opcode::Push => {
            vm.push(instruction.operands[0] as Word)?;
        }

        Opcode::Add => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            let r = a.checked_add(b).ok_or(RuntimeError::ArithmeticOverflow)?;
            vm.push(r)?;
        }

        Opcode::Sub => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            let r = a.checked_sub(b).ok_or(RuntimeError::ArithmeticOverflow)?;
            vm.push(r)?;
        }

        Opcode::Mul => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            let r = a.checked_mul(b).ok_or(RuntimeError::ArithmeticOverflow)?;
            vm.push(r)?;
        }

        Opcode::Mod => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            // Truncated remainder; i128::MIN % -1 still overflows.
            let r = a.checked_rem(b).ok_or(RuntimeError::ArithmeticOverflow)?;
            vm.push(r)?;
        }

        Opcode::Dup => {
            let a = vm.top()?;
            vm.push(a)?;
        }

        Opcode::Drop => {
            vm.pop()?;
        }

        Opcode::Swap => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(b)?;
            vm.push(a)?;
        }

        Opcode::CompareEq => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(Word::from(a == b))?;
        }

        Opcode::Print => {
            let a = vm.pop()?;
            tracing::debug!(value = %a, "print");
            vm.output.push(a);
        }

        Opcode::Jump => {
            let target = vm.pop_address()?;
            return Ok(Control::Jump(target));
        }

        Opcode::JumpIfZero => {
            let target = vm.pop_address()?;
            let cond = vm.pop()?;
            if cond == 0 {
                return Ok(Control::Jump(target));
            }
        }

        Opcode::Random => {
            let bound = vm.pop()?;
            if bound <= 0 {
                return Err(RuntimeError::NegativeRandomBound { bound });
            }
            let r = vm.rng.gen_range(0..bound);
            vm.push(r)?;
        }

        Opcode::Input => return Ok(Control::Suspend),

        Opcode::PeekChunk => {
            let address = vm.pop_address()?;
            let chunk = vm.memory[address];
            let word =
                Word::try_from(chunk).map_err(|_| EncodingError::ChunkTooLarge)?;
            vm.push(word)?;
        }

        Opcode::BuildChunk => {
            let pairs = vm.pop()?;
            if pairs < 1 {
                return Err(EncodingError::EmptyFrame.into());
            }
            let mut payload: u128 = 1;
            let mut exp_sum: u64 = 0;
            let mut remaining = pairs;
            while remaining > 0 {
                let exponent = vm.pop()?;
                let index = vm.pop()?;
                if exponent < 1 || exponent > u32::MAX as Word {
                    return Err(EncodingError::BadExponent { exponent }.into());
                }
                if index < 0 || index > primes::MAX_PRIME_INDEX as Word {
                    return Err(EncodingError::PrimeIndexOutOfRange { index }.into());
                }
                let prime = primes::nth_prime(index as usize)
                    .ok_or(EncodingError::PrimeIndexOutOfRange { index })?;
                let factor = prime_power(prime, exponent as u32)
                    .ok_or(EncodingError::ChunkTooLarge)?;
                payload = payload
                    .checked_mul(factor)
                    .ok_or(EncodingError::ChunkTooLarge)?;
                exp_sum += exponent as u64;
                remaining -= 1;
            }
            let chunk = attach_checksum(payload, exp_sum)?;
            let word =
                Word::try_from(chunk).map_err(|_| EncodingError::ChunkTooLarge)?;
            vm.push(word)?;
        }

        Opcode::PokeChunk => {
            let address = vm.pop_address()?;
            let chunk = vm.pop_chunk()?;
            let decoded = vm.decode_chunk(chunk)?;
            tracing::debug!(address, instruction = %decoded, "self-modify");
            vm.memory[address] = chunk;
        }

        Opcode::Factorize => {
            let chunk = vm.pop_chunk()?;
            let decoded = vm.decode_chunk(chunk)?;
            vm.push(decoded.opcode.index() as Word)?;
            for &operand in &decoded.operands {
                vm.push(operand as Word)?;
            }
        }

        Opcode::Halt => return Ok(Control::Halt),
    }
    Ok(Control::Advance)
}
