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

    src/handlers/copylock.rs

    The Rob Northen "CopyLock" protection track: eleven sectors sharing a
    single 23-bit LFSR data stream, recognized by one of two header layouts.
*/

use crate::lfsr::{lfsr_seek, next, state_byte, synthesize_seed, CopyLockVariant};
use crate::mfm::{mfm_decode, mfm_encode_word, MfmMode};
use crate::registry::FormatTag;
use crate::stream::FluxStreamReader;
use crate::track_info::{DiskTagStore, TrackInfo};
use crate::warnings::{TrackWarning, WarningSink};
use crate::writer::{TrackBufferWriter, SPEED_AVG};
use crate::FluxformError;

const SECTORS: usize = 11;
const DATA_BYTES: usize = 512;
const SIGNATURE: &[u8; 16] = b"Rob Northen Comp";
const SIGNATURE_SECTOR: usize = 6;

const NEW_SYNC_TABLE: [u16; SECTORS] = [
    0x8A91, 0x8A44, 0x8A45, 0x8A51, 0x8912, 0x8911, 0x8914, 0x8915, 0x8944, 0x8945, 0x8951,
];

const HEADER_BIT13: u16 = 1 << 13;

fn variant_of(tag: FormatTag) -> CopyLockVariant {
    match tag {
        FormatTag::CopyLockNew => CopyLockVariant::New,
        FormatTag::CopyLockOld => CopyLockVariant::Old,
        _ => panic!("copylock handler invoked with non-copylock format tag"),
    }
}

/// Old variant's `MFM(0xB0+index) | bit13` field, which doubles as both the header confirmation
/// and the sync this decoder scans for (the table's "(serves as syncs)" column).
fn old_sync_table() -> [u16; SECTORS] {
    let mut table = [0u16; SECTORS];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = mfm_encode_word(0xB0 + i as u8) | HEADER_BIT13;
    }
    table
}

fn match_sync(variant: CopyLockVariant, window: u16) -> Option<usize> {
    match variant {
        CopyLockVariant::New => NEW_SYNC_TABLE.iter().position(|&s| s == window),
        CopyLockVariant::Old => old_sync_table().iter().position(|&s| s == window),
    }
}

/// Decode a CopyLock track. Scans the whole stream once, recovering sectors as their syncs are
/// found and, once any sector's LFSR start is known, reconstructing the rest of the track even if
/// some sectors' own sync never matched.
pub fn decode(
    tag: FormatTag,
    _tracknr: usize,
    reader: &mut dyn FluxStreamReader,
    _tags: &mut DiskTagStore,
    sink: &mut dyn WarningSink,
) -> Result<TrackInfo, FluxformError> {
    let variant = variant_of(tag);
    log::debug!("copylock::decode: scanning for a {variant:?} track");
    let mut info = TrackInfo::new(tag, 518, SECTORS);

    let mut seed: Option<u32> = None;
    let mut data_bitoff: usize = 0;
    let mut earliest_sector: Option<usize> = None;
    let mut sector_latency = [0u64; SECTORS];

    reader.reset();
    let mut window: u16 = 0;
    let mut primed: u32 = 0;

    while let Some(bit) = reader.next_bit() {
        window = (window << 1) | bit as u16;
        primed += 1;
        if primed < 16 {
            continue;
        }

        let Some(sec) = match_sync(variant, window) else {
            continue;
        };
        log::trace!("copylock::decode: candidate sync for sector {sec} at bit {}", reader.index_offset());
        if info.valid[sec] {
            continue;
        }

        // step 3: confirm the following 16 cells decode (all-bits) to the candidate sector index.
        let mut idx_cells = [0u8; 2];
        if reader.next_bytes(&mut idx_cells).is_err() {
            break;
        }
        let mut idx_byte = [0u8; 1];
        mfm_decode(MfmMode::AllBits, &idx_cells, &mut idx_byte);
        if idx_byte[0] as usize != sec {
            log::trace!("copylock::decode: sector {sec} index byte mismatch ({:#04x}), rejecting candidate", idx_byte[0]);
            continue;
        }

        reader.reset_latency();
        let mut data = [0u8; DATA_BYTES];
        if reader.next_bytes(&mut data).is_err() {
            break;
        }

        let mut cursor = 0usize;
        if sec == SIGNATURE_SECTOR && variant == CopyLockVariant::New {
            if &data[0..16] != SIGNATURE {
                continue;
            }
            cursor = 16;
        }

        // The closed form recovers the LFSR state at the byte offset its three samples start
        // from; sector 6 (new variant) only has genuine LFSR bytes from `cursor` onward, so the
        // samples are taken relative to `cursor` rather than literally 0/8/16.
        let lfsr_start = match seed {
            Some(track_seed) => lfsr_seek(track_seed, 0, sec, variant),
            None => synthesize_seed(data[cursor], data[cursor + 8], data[cursor + 16]),
        };

        let mut lfsr = lfsr_start;
        let mut ok = true;
        for &byte in &data[cursor..DATA_BYTES] {
            if byte != state_byte(lfsr) {
                ok = false;
                break;
            }
            lfsr = next(lfsr);
        }
        if !ok {
            log::trace!("copylock::decode: sector {sec} LFSR byte mismatch, rejecting candidate");
            continue;
        }

        if seed.is_none() {
            let recovered = lfsr_seek(lfsr_start, sec, 0, variant);
            if recovered == 0 {
                // DegenerateSeed: treated as corruption, this sector rejected, scan continues.
                log::warn!("copylock::decode: sector {sec} recovered a degenerate zero seed, rejecting candidate");
                continue;
            }
            seed = Some(recovered);
        }

        sector_latency[sec] = reader.latency();
        info.mark_valid(sec);
        log::debug!("copylock::decode: sector {sec} validated");
        if earliest_sector.is_none() {
            earliest_sector = Some(sec);
            data_bitoff = reader.index_offset().saturating_sub(15);
        }

        if info.is_fully_valid() {
            break;
        }
    }

    let Some(seed) = seed else {
        return Err(FluxformError::NoMatch);
    };

    if let Some(sec) = earliest_sector {
        data_bitoff = data_bitoff.saturating_sub(sec * (514 + 48) * 16);
        data_bitoff = data_bitoff.saturating_sub(48);
    }
    info.data_bitoff = data_bitoff;

    post_decode_warnings(&info, &sector_latency, sink);

    let missing = info.missing_sectors();
    info.mark_all_valid();
    if !missing.is_empty() {
        log::warn!("copylock::decode: reconstructing sectors {missing:?} from the recovered seed");
        sink.warn(TrackWarning::ReconstructedDamagedTrack { missing_sectors: missing });
    }
    info.payload = seed.to_be_bytes().to_vec();

    Ok(info)
}

/// Sector 5's latency is nominal (2us/cell, 514 raw bytes each shifted in as 2 cells). If sector 5
/// itself never validated, substitute this bodge value rather than leave the comparison undefined.
fn nominal_bodge_latency() -> u64 {
    514 * 8 * 2 * 2000
}

fn post_decode_warnings(info: &TrackInfo, sector_latency: &[u64; SECTORS], sink: &mut dyn WarningSink) {
    let nominal = if info.valid[5] {
        sector_latency[5] as f64
    } else {
        nominal_bodge_latency() as f64
    };
    if nominal == 0.0 {
        return;
    }

    for sec in 0..SECTORS {
        if !info.valid[sec] {
            continue;
        }
        let measured = sector_latency[sec] as f64;
        let deviation_pct = (measured - nominal) / nominal * 100.0;
        let flagged = match sec {
            4 => deviation_pct > -4.0,
            SIGNATURE_SECTOR => deviation_pct < 4.0,
            _ => deviation_pct.abs() > 2.0,
        };
        if flagged {
            let detail = format!("sector {sec} cell timing deviated {deviation_pct:.2}% from nominal");
            log::warn!("copylock::decode: {detail}");
            sink.warn(TrackWarning::TimingDeviation {
                sector: sec as u8,
                deviation_pct,
                detail,
            });
        }
    }
}

/// Encode a CopyLock track from its recovered seed, writing all eleven sectors in order.
pub fn encode(info: &TrackInfo, writer: &mut dyn TrackBufferWriter) -> Result<(), FluxformError> {
    let variant = variant_of(info.format);
    if info.payload.len() != 4 {
        return Err(FluxformError::CorruptSector);
    }
    let mut lfsr = u32::from_be_bytes(info.payload[..4].try_into().unwrap());
    log::debug!("copylock::encode: writing a {variant:?} track, seed={lfsr:#08x}");

    for sec in 0..SECTORS {
        match variant {
            CopyLockVariant::New => {
                writer.bits(SPEED_AVG, MfmMode::Raw, 8, &[0xA0 + sec as u8]);
                writer.gap(SPEED_AVG, 16);
                let sync = NEW_SYNC_TABLE[sec];
                writer.bits(SPEED_AVG, MfmMode::Raw, 16, &sync.to_be_bytes());
                writer.bits(SPEED_AVG, MfmMode::AllBits, 16, &[sec as u8]);
            }
            CopyLockVariant::Old => {
                let a_word = mfm_encode_word(0xA0 + sec as u8) | HEADER_BIT13;
                writer.bits(SPEED_AVG, MfmMode::Raw, 16, &a_word.to_be_bytes());
                writer.gap(SPEED_AVG, 16);
                let b_word = mfm_encode_word(0xB0 + sec as u8) | HEADER_BIT13;
                writer.bits(SPEED_AVG, MfmMode::Raw, 16, &b_word.to_be_bytes());
                writer.bits(SPEED_AVG, MfmMode::AllBits, 16, &[sec as u8]);
            }
        }

        let mut body = [0u8; DATA_BYTES];
        if sec == SIGNATURE_SECTOR && variant == CopyLockVariant::New {
            body[0..16].copy_from_slice(SIGNATURE);
            for byte in body[16..DATA_BYTES].iter_mut() {
                *byte = state_byte(lfsr);
                lfsr = next(lfsr);
            }
        } else {
            for byte in body.iter_mut() {
                *byte = state_byte(lfsr);
                lfsr = next(lfsr);
            }
        }
        // Sector 4 spins fast, sector 6 slow; this is a property of that sector's own data-body
        // cells, not the gap that follows it, since that's what a reader's per-sector latency
        // measures against nominal.
        let body_speed = match sec {
            4 => 105_000,
            SIGNATURE_SECTOR => 95_000,
            _ => SPEED_AVG,
        };
        writer.bits(body_speed, MfmMode::Raw, DATA_BYTES * 8, &body);
        writer.bits(SPEED_AVG, MfmMode::Raw, 8, &[0x00]);
        writer.gap(SPEED_AVG, 352);
        log::trace!("copylock::encode: sector {sec} written at body speed {body_speed}");
    }

    Ok(())
}
