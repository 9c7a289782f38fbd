// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PDF417 codeword-level engine.
//!
//! PDF417 separates cleanly at the codeword layer: translating bar clusters to codewords (and
//! back to printed bars) belongs to the scanning detector, while compaction, error correction
//! over GF(929), and the macro structure live here. [`encode`] produces the full codeword
//! stream of a symbol, [`decode`] consumes one after error correction, and
//! [`correct_errors`] repairs a raw codeword vector in place.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod big_integer;
mod decoder;
mod ec;
mod encoder;
mod high_level;

pub use big_integer::BigInteger;
pub use decoder::decode;
pub use ec::correct_errors;
pub use encoder::{encode, Pdf417Options, Pdf417Symbol};
