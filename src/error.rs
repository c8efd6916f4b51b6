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

    src/error.rs

    Error kinds surfaced across the track decode/encode boundary.
*/

use thiserror::Error;

/// Errors a handler's decode or encode entry point may return.
///
/// `NoMatch` is the expected outcome when a handler simply doesn't recognize
/// a track; it is not logged as a failure, and the caller is expected to try
/// the next handler in the registry. `CorruptSector` and `StreamEnd` are
/// recoverable at the track level: a handler may still return a partially
/// populated [`crate::TrackInfo`] alongside them rather than propagating the
/// error, depending on how many sectors validated before the fault.
#[derive(Debug, Error)]
pub enum FluxformError {
    /// The stream was exhausted without finding a recognizable track.
    #[error("stream exhausted without finding a recognizable track")]
    NoMatch,
    /// A sync matched but downstream validation (index byte, signature, checksum, LFSR) failed.
    #[error("sync matched but sector validation failed")]
    CorruptSector,
    /// `next_bytes` hit end-of-stream in the middle of a structure.
    #[error("flux stream ended in the middle of a structure")]
    StreamEnd,
    /// CopyLock recovered a zero LFSR seed, which can never occur on valid media.
    #[error("recovered a degenerate (zero) LFSR seed")]
    DegenerateSeed,
    /// A handler that depends on a disk-level tag observed it absent.
    #[error("a required disk-level tag was not present")]
    MissingTag,
    /// An I/O error surfaced by a reader or writer implementation.
    #[error("an I/O error occurred reading or writing flux data: {0}")]
    Io(String),
}
