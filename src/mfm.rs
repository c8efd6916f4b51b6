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

    src/mfm.rs

    MFM cell <-> byte conversion in the three modes the Amiga track handlers
    need. A "cell byte" is 8 consecutive flux cells packed one-bit-per-cell,
    exactly as `FluxStreamReader::next_bytes` fills its buffer - the codec
    never talks to a reader or writer directly, it only transforms buffers
    handlers have already pulled from or are about to push to one.
*/

/// Selects how a run of cell bytes is interpreted as data bytes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MfmMode {
    /// Pass-through; the caller interprets cells directly. 1 cell byte in, 1 data byte out.
    Raw,
    /// Clock/data bits interleaved in place. 2 cell bytes in (16 cells), 1 data byte out.
    AllBits,
    /// Odd half then even half of a block, each cell byte already holding its data bits at the
    /// even bit-positions (mask `0x55`). 2 cell bytes in (one from each half), 1 data byte out.
    OddEven,
}

/// Number of cell bytes consumed (or produced) per decoded (or encoded) data byte.
fn cells_per_byte(mode: MfmMode) -> usize {
    match mode {
        MfmMode::Raw => 1,
        MfmMode::AllBits | MfmMode::OddEven => 2,
    }
}

/// Decode `out.len()` data bytes from `cells`, which must hold `out.len() * cells_per_byte(mode)`
/// cell bytes.
///
/// For [`MfmMode::OddEven`], `cells` is split into two equal halves: the first half carries the
/// odd data bits of every output byte, the second half the even bits.
pub fn mfm_decode(mode: MfmMode, cells: &[u8], out: &mut [u8]) {
    let ratio = cells_per_byte(mode);
    assert!(cells.len() >= out.len() * ratio, "not enough cell bytes for requested output");
    log::trace!("mfm_decode: mode={mode:?}, {} cell bytes -> {} data bytes", cells.len(), out.len());

    match mode {
        MfmMode::Raw => {
            out.copy_from_slice(&cells[..out.len()]);
        }
        MfmMode::AllBits => {
            for (i, byte) in out.iter_mut().enumerate() {
                let hi = cells[i * 2];
                let lo = cells[i * 2 + 1];
                *byte = decode_all_bits_word(hi, lo);
                log::trace!("mfm_decode: all_bits byte {i} -> {:#04x}", *byte);
            }
        }
        MfmMode::OddEven => {
            let n = out.len();
            let (odd_half, even_half) = (&cells[..n], &cells[n..n * 2]);
            for (i, byte) in out.iter_mut().enumerate() {
                let odd = odd_half[i] & 0x55;
                let even = even_half[i] & 0x55;
                *byte = (odd << 1) | even;
                log::trace!("mfm_decode: odd_even byte {i} -> {:#04x}", *byte);
            }
        }
    }
}

/// Encode `data` into `out`, which must be sized for `data.len() * cells_per_byte(mode)` cell
/// bytes. The inverse of [`mfm_decode`].
pub fn mfm_encode(mode: MfmMode, data: &[u8], out: &mut [u8]) {
    let ratio = cells_per_byte(mode);
    assert!(out.len() >= data.len() * ratio, "output buffer too small");
    log::trace!("mfm_encode: mode={mode:?}, {} data bytes -> {} cell bytes", data.len(), out.len());

    match mode {
        MfmMode::Raw => {
            out[..data.len()].copy_from_slice(data);
        }
        MfmMode::AllBits => {
            for (i, &byte) in data.iter().enumerate() {
                let word = mfm_encode_word(byte);
                out[i * 2] = (word >> 8) as u8;
                out[i * 2 + 1] = word as u8;
            }
        }
        MfmMode::OddEven => {
            let n = data.len();
            let (odd_half, even_half) = out.split_at_mut(n);
            for (i, &byte) in data.iter().enumerate() {
                odd_half[i] = (byte >> 1) & 0x55;
                even_half[i] = byte & 0x55;
            }
        }
    }
}

/// Decode one MFM-interleaved 16-bit cell word (clock,data bit pairs, MSB pair first) to its
/// single data byte.
fn decode_all_bits_word(hi: u8, lo: u8) -> u8 {
    let word = ((hi as u16) << 8) | lo as u16;
    let mut byte = 0u8;
    for i in 0..8 {
        // Each data bit is the low bit of its (clock, data) pair; pairs run MSB-first.
        let pair = (word >> ((7 - i) * 2)) & 0b11;
        let data_bit = pair & 1;
        byte = (byte << 1) | data_bit as u8;
    }
    byte
}

/// Encode a single data byte to its 16-bit MFM cell pattern, using the standard clock-fill rule:
/// a clock bit is set only where both the preceding and current data bits are zero.
///
/// The bit immediately preceding the byte is assumed to be zero (a clock boundary reset); callers
/// chaining multiple bytes from a continuous data stream should instead build the pattern
/// bit-by-bit, carrying the previous emitted data bit across byte boundaries (see
/// [`crate::handlers::copylock`] encode path, which emits whole sectors through
/// [`mfm_encode`] rather than word-at-a-time for exactly this reason).
pub fn mfm_encode_word(byte: u8) -> u16 {
    let mut word: u16 = 0;
    let mut prev_bit = false;
    for i in 0..8 {
        let data_bit = (byte & (0x80 >> i)) != 0;
        let clock_bit = !prev_bit && !data_bit;
        word = (word << 1) | clock_bit as u16;
        word = (word << 1) | data_bit as u16;
        prev_bit = data_bit;
    }
    word
}
