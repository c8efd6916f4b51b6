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

    src/track_info.rs

    Per-track decode state, and the disk-level tag store tracks share
    protection metadata through.
*/

use crate::registry::FormatTag;
use bit_vec::BitVec;
use std::collections::HashMap;

/// Per-track record produced by a successful decode, and consumed by encode.
///
/// `payload` is owned by this struct once a handler returns a non-empty buffer; `valid` tracks,
/// one bit per sector, which sectors were actually recovered (all of them, for formats that
/// reconstruct a full track from a recovered seed rather than sector-by-sector).
#[derive(Clone, Debug)]
pub struct TrackInfo {
    pub format: FormatTag,
    pub sector_size: usize,
    pub sector_count: usize,
    pub payload: Vec<u8>,
    pub valid: BitVec,
    /// Cell position of the first sector's sync within the track.
    pub data_bitoff: usize,
    /// Exact bit length the physical track must occupy when re-encoded, if the format pins one.
    pub total_bits: Option<usize>,
}

impl TrackInfo {
    pub fn new(format: FormatTag, sector_size: usize, sector_count: usize) -> Self {
        TrackInfo {
            format,
            sector_size,
            sector_count,
            payload: Vec::new(),
            valid: BitVec::from_elem(sector_count, false),
            data_bitoff: 0,
            total_bits: None,
        }
    }

    /// A track is valid iff every sector is marked valid.
    pub fn is_fully_valid(&self) -> bool {
        self.valid.iter().all(|b| b)
    }

    pub fn mark_valid(&mut self, sector: usize) {
        self.valid.set(sector, true);
    }

    pub fn mark_all_valid(&mut self) {
        for i in 0..self.valid.len() {
            self.valid.set(i, true);
        }
    }

    pub fn missing_sectors(&self) -> Vec<u8> {
        self.valid
            .iter()
            .enumerate()
            .filter(|(_, v)| !v)
            .map(|(i, _)| i as u8)
            .collect()
    }
}

/// Identifies a disk-level tag. Closed set, mirroring the registered format tags.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DiskTagId {
    /// `u16 protection[152]`, big-endian on the wire, host order once stored.
    ZaZelaznaBramaProtection,
}

/// An opaque, disk-level blob shared between tracks. Created by at most one handler and immutable
/// once set.
#[derive(Clone, Debug)]
pub enum DiskTag {
    ZaZelaznaBramaProtection(Box<[u16; 152]>),
}

impl DiskTag {
    pub fn id(&self) -> DiskTagId {
        match self {
            DiskTag::ZaZelaznaBramaProtection(_) => DiskTagId::ZaZelaznaBramaProtection,
        }
    }
}

/// Single-writer-per-key map of disk-level tags.
///
/// The first handler to set a tag for a given id wins; later attempts are no-ops so that handler
/// ordering within a decode pass never matters for tag contents. Readers must tolerate a tag
/// being absent and fall back to per-format defaults.
#[derive(Default)]
pub struct DiskTagStore {
    tags: HashMap<DiskTagId, DiskTag>,
}

impl DiskTagStore {
    pub fn new() -> Self {
        DiskTagStore { tags: HashMap::new() }
    }

    /// Set `tag` if no tag with the same id is already present. Returns `true` if the tag was
    /// newly stored.
    pub fn set_if_absent(&mut self, tag: DiskTag) -> bool {
        let id = tag.id();
        if self.tags.contains_key(&id) {
            false
        } else {
            self.tags.insert(id, tag);
            true
        }
    }

    pub fn get(&self, id: DiskTagId) -> Option<&DiskTag> {
        self.tags.get(&id)
    }
}
