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

    src/registry.rs

    The closed set of recognized track formats and the table mapping each to
    its handler's geometry and decode/encode entry points. Mirrors the way
    track_schema's TrackSchema enum dispatches to System34Schema/AmigaSchema:
    one tagged enum, matched in one place, rather than a registry of trait
    objects.
*/

use crate::handlers::{copylock, ego};
use crate::stream::FluxStreamReader;
use crate::track_info::{DiskTagStore, TrackInfo};
use crate::warnings::WarningSink;
use crate::writer::TrackBufferWriter;
use crate::FluxformError;
use strum::EnumIter;

/// The closed set of track formats this crate recognizes. Registration is static: there is no
/// runtime mutation of this set after process start.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, EnumIter)]
pub enum FormatTag {
    CopyLockNew,
    CopyLockOld,
    BehindTheIronGate,
    ZaZelaznaBrama,
    ZaZelaznaBramaBoot,
    AbcChemiiA,
    AbcChemiiB,
    AbcChemiiTimsoftA,
    AbcChemiiTimsoftB,
    Inferior,
}

/// `tracknr` is the physical track number the stream was captured from; handlers with a
/// per-track protection table (see [`crate::handlers::ego`]) index it by this value, and
/// handlers with no such table ignore it.
pub type DecodeFn = fn(
    FormatTag,
    usize,
    &mut dyn FluxStreamReader,
    &mut DiskTagStore,
    &mut dyn WarningSink,
) -> Result<TrackInfo, FluxformError>;

pub type EncodeFn = fn(&TrackInfo, &mut dyn TrackBufferWriter) -> Result<(), FluxformError>;

/// An immutable descriptor: sector geometry plus the decode/encode entry points a
/// [`FormatTag`] resolves to. Payload bytes are opaque to the framework; only the handler
/// that owns a format interprets them.
#[derive(Copy, Clone)]
pub struct TrackHandler {
    pub sectors_per_track: usize,
    pub bytes_per_sector: usize,
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

/// Resolve a format tag to its handler descriptor.
///
/// A global table indexed by format tag would need to store ten distinct ZST closures behind a
/// shared function-pointer type; matching directly on the tag gets the same effect - one lookup
/// per decode/encode call, resolved once - without the indirection.
pub fn handler_for(tag: FormatTag) -> TrackHandler {
    use FormatTag::*;
    match tag {
        CopyLockNew | CopyLockOld => TrackHandler {
            sectors_per_track: 11,
            bytes_per_sector: 518,
            decode: copylock::decode,
            encode: copylock::encode,
        },
        BehindTheIronGate => TrackHandler {
            sectors_per_track: 1,
            bytes_per_sector: 5632,
            decode: ego::decode,
            encode: ego::encode,
        },
        ZaZelaznaBrama => TrackHandler {
            sectors_per_track: 1,
            bytes_per_sector: 5632,
            decode: ego::decode,
            encode: ego::encode,
        },
        ZaZelaznaBramaBoot => TrackHandler {
            sectors_per_track: 1,
            bytes_per_sector: 5632,
            decode: ego::decode_boot,
            encode: ego::encode,
        },
        AbcChemiiA | AbcChemiiB | AbcChemiiTimsoftA | AbcChemiiTimsoftB => TrackHandler {
            sectors_per_track: 1,
            bytes_per_sector: 6144,
            decode: ego::decode,
            encode: ego::encode,
        },
        Inferior => TrackHandler {
            sectors_per_track: 1,
            bytes_per_sector: 6144,
            decode: ego::decode,
            encode: ego::encode,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_single_sector_format_payload_length_matches_geometry() {
        for tag in FormatTag::iter() {
            let handler = handler_for(tag);
            if handler.sectors_per_track == 1 {
                let expected_len = ego::payload_len(tag);
                assert_eq!(handler.bytes_per_sector, expected_len, "{tag:?}");
            }
        }
    }

    #[test]
    fn copylock_variants_share_eleven_sector_518_byte_geometry() {
        for tag in [FormatTag::CopyLockNew, FormatTag::CopyLockOld] {
            let handler = handler_for(tag);
            assert_eq!(handler.sectors_per_track, 11);
            assert_eq!(handler.bytes_per_sector, 518);
        }
    }
}
