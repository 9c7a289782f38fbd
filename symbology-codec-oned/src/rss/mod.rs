// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GS1 DataBar (formerly RSS) decoders. See ISO/IEC 24724.

pub mod binary_decoder;
pub mod databar;
pub mod expanded;
pub mod field_parser;
pub mod general_app_id;
pub mod helper;
