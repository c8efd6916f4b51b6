/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/lfsr.rs

    The 23-bit Galois-style LFSR the CopyLock protection track's data body is
    generated from, with taps at bit 0 and bit 22.
*/

/// Width of the shift register in bits.
pub const WIDTH: u32 = 23;
/// Mask of the `WIDTH` low bits; every state is kept within this mask.
pub const MASK: u32 = (1 << WIDTH) - 1;

/// Advance the register one step forward.
///
/// Shifts left one position within the 23-bit field; the new low bit is
/// `bit22(x) XOR bit0(x)`.
pub fn next(x: u32) -> u32 {
    let bit22 = (x >> 22) & 1;
    let bit0 = x & 1;
    let new_lsb = bit22 ^ bit0;
    ((x << 1) | new_lsb) & MASK
}

/// Advance the register one step backward. The exact inverse of [`next`].
///
/// Shifts right one position; the new high bit is `bit0(x) XOR bit1(x)`.
pub fn prev(x: u32) -> u32 {
    let bit0 = x & 1;
    let bit1 = (x >> 1) & 1;
    let new_msb = bit0 ^ bit1;
    ((x >> 1) | (new_msb << 22)) & MASK
}

/// Advance the register `n` steps forward.
pub fn next_n(mut x: u32, n: u32) -> u32 {
    for _ in 0..n {
        x = next(x);
    }
    x
}

/// Advance the register `n` steps backward.
pub fn prev_n(mut x: u32, n: u32) -> u32 {
    for _ in 0..n {
        x = prev(x);
    }
    x
}

/// The byte the register emits at its current state: bits `[22:15]`.
pub fn state_byte(x: u32) -> u8 {
    ((x >> 15) & 0xFF) as u8
}

/// Produce the next `out.len()` bytes of the LFSR byte stream starting at `seed`, returning the
/// state the register ends in (i.e. the state after the last byte emitted was stepped past).
///
/// Matches the CopyLock data generation rule: byte `k` equals `state_byte` of the `k`-th
/// successive state, with the stream never restarting mid-track.
pub fn fill_stream(mut x: u32, out: &mut [u8]) -> u32 {
    for byte in out.iter_mut() {
        *byte = state_byte(x);
        x = next(x);
    }
    x
}

/// Recover a track seed from three bytes of a sector's LFSR-generated data, sampled 8 states
/// apart (offsets 0, 8, 16 within the sector). This is the closed-form inverse of three forward
/// steps used when no track seed is yet known.
pub fn synthesize_seed(dat0: u8, dat8: u8, dat16: u8) -> u32 {
    let seed = ((dat0 as u32) << 15) | ((dat8 as u32) << 7) | ((dat16 as u32) >> 1);
    log::trace!("lfsr::synthesize_seed: ({dat0:#04x}, {dat8:#04x}, {dat16:#04x}) -> {seed:#08x}");
    seed
}

/// Which CopyLock track layout is in play; the two variants place their sector-6 pause/
/// signature differently, which shifts how many LFSR steps separate adjacent sectors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CopyLockVariant {
    New,
    Old,
}

/// Number of LFSR steps between the start of `sector` and the start of `sector + 1`, when
/// stepping in the direction given by `forward`.
///
/// Every sector boundary contributes a plain 512 steps (one per data byte in the sector's LFSR
/// body) except the new variant's sector 6, which pauses for its ASCII signature and so
/// contributes 16 fewer forward steps, and the old variant's sector 5, which contributes 16 more
/// steps specifically when walked backward across that same boundary.
fn step_count(variant: CopyLockVariant, sector: usize, forward: bool) -> i64 {
    match variant {
        CopyLockVariant::New if sector == 6 => 512 - 16,
        CopyLockVariant::Old if sector == 5 && !forward => 512 + 16,
        _ => 512,
    }
}

/// Walk the LFSR state from the start of sector `from` to the start of sector `to`, in either
/// direction, applying the variant's non-uniform per-sector step counts.
///
/// Used to recover sectors whose own sync or header failed to validate, by seeding from a
/// neighboring sector that did.
pub fn lfsr_seek(mut x: u32, from: usize, to: usize, variant: CopyLockVariant) -> u32 {
    log::trace!("lfsr::lfsr_seek: {variant:?} sector {from} -> {to}, state={x:#08x}");
    if to >= from {
        for sector in from..to {
            let steps = step_count(variant, sector, true);
            for _ in 0..steps {
                x = next(x);
            }
        }
    } else {
        for sector in (to..from).rev() {
            let steps = step_count(variant, sector, false);
            for _ in 0..steps {
                x = prev(x);
            }
        }
    }
    log::trace!("lfsr::lfsr_seek: arrived at sector {to}, state={x:#08x}");
    x
}
