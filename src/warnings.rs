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

    src/warnings.rs

    Non-fatal diagnostics a handler may raise during decode. These are
    distinct from `log::warn!` diagnostics: warnings describe a property of
    the *decoded track itself* that a caller may want to surface to a user,
    while `log` output is for developers debugging the handler.
*/

use std::fmt;

/// A non-fatal anomaly observed while decoding a track.
#[derive(Clone, Debug)]
pub enum TrackWarning {
    /// A sector's measured cell timing deviated from nominal by more than the
    /// handler's tolerance for that sector.
    TimingDeviation {
        sector: u8,
        deviation_pct: f64,
        detail: String,
    },
    /// A CopyLock-style handler recovered every sector from a track on which
    /// one or more sectors failed to validate directly, by walking the LFSR
    /// seed across the gap.
    ReconstructedDamagedTrack { missing_sectors: Vec<u8> },
}

impl fmt::Display for TrackWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackWarning::TimingDeviation { detail, .. } => write!(f, "{detail}"),
            TrackWarning::ReconstructedDamagedTrack { missing_sectors } => {
                write!(f, "reconstructed damaged track (missing sectors: {missing_sectors:?})")
            }
        }
    }
}

/// A callback a handler invokes for each [`TrackWarning`] it raises.
///
/// Handlers take this as `&mut dyn WarningSink` rather than a boxed closure so
/// callers can pass a plain `|w| warnings.push(w)` without allocating.
pub trait WarningSink {
    fn warn(&mut self, warning: TrackWarning);
}

impl<F> WarningSink for F
where
    F: FnMut(TrackWarning),
{
    fn warn(&mut self, warning: TrackWarning) {
        self(warning)
    }
}

/// A [`WarningSink`] that does nothing; useful when a caller doesn't care to
/// observe warnings.
pub struct NullSink;

impl WarningSink for NullSink {
    fn warn(&mut self, _warning: TrackWarning) {}
}

/// A [`WarningSink`] that collects every warning it receives, for tests and
/// callers that want to inspect them after the fact.
#[derive(Default)]
pub struct VecSink(pub Vec<TrackWarning>);

impl WarningSink for VecSink {
    fn warn(&mut self, warning: TrackWarning) {
        self.0.push(warning);
    }
}
