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

    src/writer.rs

    The track buffer writer contract handlers emit through when encoding, plus
    a BitVec-backed reference implementation for testing.
*/

use crate::mfm::{mfm_encode, MfmMode};
use bit_vec::BitVec;

/// Nominal cell speed; a `speed` argument of this value means no adjustment.
pub const SPEED_AVG: u32 = 100_000;

/// Append-only sink a handler's encode path drives to build a track's cell stream.
pub trait TrackBufferWriter {
    /// Append `n` data-unit cells derived from `value` under `mode`, at `speed` parts per
    /// [`SPEED_AVG`] (so `105_000` is 5% faster than nominal, `95_000` 5% slower).
    fn bits(&mut self, speed: u32, mode: MfmMode, n: usize, value: &[u8]);

    /// Append `n_cells` of cell-level zero bits at `speed`.
    fn gap(&mut self, speed: u32, n_cells: usize);

    /// Mark the track as a single logical sector despite containing multiple syncs, suppressing
    /// whatever auto-split a consuming container layer would otherwise perform.
    fn disable_auto_sector_split(&mut self);

    /// Total cells appended so far.
    fn len(&self) -> usize;
}

/// A reference [`TrackBufferWriter`] that accumulates cells into a [`BitVec`], recording the
/// per-cell speed alongside them so a test can assert on the timing a handler applied.
#[derive(Default)]
pub struct BitVecTrackBuffer {
    cells: BitVec,
    speeds: Vec<u32>,
    auto_sector_split_disabled: bool,
}

impl BitVecTrackBuffer {
    pub fn new() -> Self {
        BitVecTrackBuffer {
            cells: BitVec::new(),
            speeds: Vec::new(),
            auto_sector_split_disabled: false,
        }
    }

    pub fn cells(&self) -> &BitVec {
        &self.cells
    }

    pub fn speeds(&self) -> &[u32] {
        &self.speeds
    }

    pub fn auto_sector_split_disabled(&self) -> bool {
        self.auto_sector_split_disabled
    }

    /// Render the accumulated cells into bytes, one cell per bit, MSB-first. Pads the final byte
    /// with zero cells if the stream isn't a multiple of 8 bits long.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.cells.len().div_ceil(8)];
        for (i, cell) in self.cells.iter().enumerate() {
            if cell {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        out
    }

    fn push_cells(&mut self, speed: u32, cell_bytes: &[u8], n_cells: usize) {
        for i in 0..n_cells {
            let bit = (cell_bytes[i / 8] & (0x80 >> (i % 8))) != 0;
            self.cells.push(bit);
            self.speeds.push(speed);
        }
    }
}

impl TrackBufferWriter for BitVecTrackBuffer {
    fn bits(&mut self, speed: u32, mode: MfmMode, n: usize, value: &[u8]) {
        let encoded = match mode {
            MfmMode::Raw => value.to_vec(),
            MfmMode::AllBits | MfmMode::OddEven => {
                let mut out = vec![0u8; value.len() * 2];
                mfm_encode(mode, value, &mut out);
                out
            }
        };
        assert!(
            n <= encoded.len() * 8,
            "requested cell count exceeds the cells the given value encodes to"
        );
        self.push_cells(speed, &encoded, n);
    }

    fn gap(&mut self, speed: u32, n_cells: usize) {
        for _ in 0..n_cells {
            self.cells.push(false);
            self.speeds.push(speed);
        }
    }

    fn disable_auto_sector_split(&mut self) {
        self.auto_sector_split_disabled = true;
    }

    fn len(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_appends_zero_cells_at_given_speed() {
        let mut buf = BitVecTrackBuffer::new();
        buf.gap(SPEED_AVG, 44);
        assert_eq!(buf.len(), 44);
        assert!(buf.cells().iter().all(|b| !b));
        assert!(buf.speeds().iter().all(|&s| s == SPEED_AVG));
    }

    #[test]
    fn disable_auto_sector_split_is_recorded() {
        let mut buf = BitVecTrackBuffer::new();
        assert!(!buf.auto_sector_split_disabled());
        buf.disable_auto_sector_split();
        assert!(buf.auto_sector_split_disabled());
    }

    #[test]
    fn raw_bits_round_trip_to_bytes() {
        let mut buf = BitVecTrackBuffer::new();
        buf.bits(SPEED_AVG, MfmMode::Raw, 16, &[0xA5, 0x3C]);
        assert_eq!(buf.to_bytes(), vec![0xA5, 0x3C]);
    }

    #[test]
    fn non_uniform_speed_is_tracked_per_cell() {
        let mut buf = BitVecTrackBuffer::new();
        buf.gap(SPEED_AVG, 4);
        buf.gap(105_000, 4);
        assert!(buf.speeds()[..4].iter().all(|&s| s == SPEED_AVG));
        assert!(buf.speeds()[4..].iter().all(|&s| s == 105_000));
    }
}
