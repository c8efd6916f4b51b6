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
*/

//! # fluxforms
//!
//! `fluxforms` is the track-format plug-in framework for decoding and
//! re-encoding raw magnetic-flux bitstreams captured from Amiga floppy disks.
//!
//! Each physical track is written in one of a number of proprietary, often
//! copy-protected formats. [`registry::handler_for`] resolves a
//! [`registry::FormatTag`] to the decode/encode pair that recognizes it,
//! recovering a track's logical payload into a [`track_info::TrackInfo`] and
//! later re-synthesizing a bit-exact re-encoding onto a [`writer::TrackBufferWriter`].
//!
//! The crate does not itself read or write disk-image container files, talk
//! to flux-capture hardware, or provide a CLI; those are external
//! collaborators that drive a [`stream::FluxStreamReader`] in and a
//! [`writer::TrackBufferWriter`] out of the handlers defined here. A
//! reference in-memory implementation of both traits is provided under
//! [`stream::BitVecFluxStream`] and [`writer::BitVecTrackBuffer`] so the
//! handlers can be exercised without a real collaborator.

pub mod error;
pub mod handlers;
pub mod lfsr;
pub mod mfm;
pub mod registry;
pub mod stream;
pub mod track_info;
pub mod warnings;
pub mod writer;

pub use error::FluxformError;
pub use registry::{handler_for, FormatTag, TrackHandler};
pub use track_info::{DiskTag, DiskTagId, DiskTagStore, TrackInfo};
pub use warnings::{TrackWarning, WarningSink};
