// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Linear symbology decoders: the UPC/EAN family and GS1 DataBar.
//!
//! The readers treat every matrix row as one scan line of module-aligned bars; DataBar keeps
//! observations across rows, so stacked and damaged symbols converge over multiple lines.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod gtin;
mod row;
mod rss;
mod upcean;

pub use rss::databar::DataBarReader;
pub use rss::expanded::DataBarExpandedReader;
pub use rss::field_parser;
pub use upcean::UpcEanReader;
