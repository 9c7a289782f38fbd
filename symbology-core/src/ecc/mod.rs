// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `ecc` module provides Galois-field arithmetic and the Reed-Solomon codec shared by the
//! matrix symbologies.

mod galois;
mod poly;
mod reed_solomon;

pub use galois::{
    FieldId, GaloisField, AZTEC_DATA_6, AZTEC_DATA_8, AZTEC_DATA_10, AZTEC_DATA_12, AZTEC_PARAM,
    DATA_MATRIX_FIELD_256, MAXICODE_FIELD_64, QR_CODE_FIELD_256,
};
pub use poly::GfPoly;
pub use reed_solomon::{reed_solomon_decode, ReedSolomonEncoder};
