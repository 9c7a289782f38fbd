// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The GS1 Application Identifier field parser: a flat element string into the
//! `(AI)DATA(AI)DATA` human-readable form.
//!
//! AIs are looked up by length class; fixed-length fields consume exactly their size,
//! variable-length fields run to the next FNC1 separator or the end of data.

use lazy_static::lazy_static;
use std::collections::HashMap;

use symbology_core::errors::{format_error, Result};

use crate::rss::general_app_id::FNC1_CHAR;

/// Field length for one AI prefix: fixed byte count, or a variable maximum.
#[derive(Clone, Copy)]
enum FieldLength {
    Fixed(usize),
    Variable(usize),
}

use FieldLength::{Fixed, Variable};

lazy_static! {
    static ref TWO_DIGIT_DATA_LENGTH: HashMap<&'static str, FieldLength> = HashMap::from([
        ("00", Fixed(18)),
        ("01", Fixed(14)),
        ("02", Fixed(14)),
        ("10", Variable(20)),
        ("11", Fixed(6)),
        ("12", Fixed(6)),
        ("13", Fixed(6)),
        ("15", Fixed(6)),
        ("17", Fixed(6)),
        ("20", Fixed(2)),
        ("21", Variable(20)),
        ("22", Variable(29)),
        ("30", Variable(8)),
        ("37", Variable(8)),
        // Internal company codes.
        ("90", Variable(30)),
        ("91", Variable(30)),
        ("92", Variable(30)),
        ("93", Variable(30)),
        ("94", Variable(30)),
        ("95", Variable(30)),
        ("96", Variable(30)),
        ("97", Variable(30)),
        ("98", Variable(30)),
        ("99", Variable(30)),
    ]);
    static ref THREE_DIGIT_DATA_LENGTH: HashMap<&'static str, FieldLength> = HashMap::from([
        ("240", Variable(30)),
        ("241", Variable(30)),
        ("242", Variable(6)),
        ("250", Variable(30)),
        ("251", Variable(30)),
        ("253", Variable(17)),
        ("254", Variable(20)),
        ("400", Variable(30)),
        ("401", Variable(30)),
        ("402", Fixed(17)),
        ("403", Variable(30)),
        ("410", Fixed(13)),
        ("411", Fixed(13)),
        ("412", Fixed(13)),
        ("413", Fixed(13)),
        ("414", Fixed(13)),
        ("420", Variable(20)),
        ("421", Variable(15)),
        ("422", Fixed(3)),
        ("423", Variable(15)),
        ("424", Fixed(3)),
        ("425", Fixed(3)),
        ("426", Fixed(3)),
    ]);
    static ref THREE_DIGIT_PLUS_DIGIT_DATA_LENGTH: HashMap<&'static str, FieldLength> = {
        let mut table: HashMap<&'static str, FieldLength> = HashMap::new();
        // Trade measures 310x through 369x all carry six digits.
        const MEASURES: [&str; 52] = [
            "310", "311", "312", "313", "314", "315", "316", "320", "321", "322", "323", "324",
            "325", "326", "327", "328", "329", "330", "331", "332", "333", "334", "335", "336",
            "340", "341", "342", "343", "344", "345", "346", "347", "348", "349", "350", "351",
            "352", "353", "354", "355", "356", "357", "360", "361", "362", "363", "364", "365",
            "366", "367", "368", "369",
        ];
        for prefix in MEASURES {
            table.insert(prefix, Fixed(6));
        }
        table.insert("390", Variable(15));
        table.insert("391", Variable(18));
        table.insert("392", Variable(15));
        table.insert("393", Variable(18));
        table.insert("703", Variable(30));
        table
    };
    static ref FOUR_DIGIT_DATA_LENGTH: HashMap<&'static str, FieldLength> = HashMap::from([
        ("7001", Fixed(13)),
        ("7002", Variable(30)),
        ("7003", Fixed(10)),
        ("8001", Fixed(14)),
        ("8002", Variable(20)),
        ("8003", Variable(30)),
        ("8004", Variable(30)),
        ("8005", Fixed(6)),
        ("8006", Fixed(18)),
        ("8007", Variable(30)),
        ("8008", Variable(12)),
        ("8018", Fixed(18)),
        ("8020", Variable(25)),
        ("8100", Fixed(6)),
        ("8101", Fixed(10)),
        ("8102", Fixed(2)),
        ("8110", Variable(70)),
        ("8200", Variable(70)),
    ]);
}

fn process_fixed_ai(ai_size: usize, field_size: usize, raw: &str) -> Result<String> {
    if raw.len() < ai_size {
        return format_error("truncated application identifier");
    }
    let ai = &raw[..ai_size];
    if raw.len() < ai_size + field_size {
        return format_error("truncated application identifier field");
    }
    let field = &raw[ai_size..ai_size + field_size];
    let remaining = &raw[ai_size + field_size..];
    let mut result = format!("({}){}", ai, field);
    if !remaining.is_empty() {
        result.push_str(&parse_fields_in_general_purpose(remaining)?);
    }
    Ok(result)
}

fn process_variable_ai(ai_size: usize, variable_field_size: usize, raw: &str) -> Result<String> {
    let ai = &raw[..ai_size];
    // The field runs to the FNC1 separator, the variable maximum, or the end of data.
    let max_size = raw.len().min(ai_size + variable_field_size);
    let field_end = raw[ai_size..max_size]
        .bytes()
        .position(|b| b == FNC1_CHAR)
        .map(|i| ai_size + i)
        .unwrap_or(max_size);
    let field = &raw[ai_size..field_end];
    // Skip the separator itself.
    let remaining_start = if raw.as_bytes().get(field_end) == Some(&FNC1_CHAR) {
        field_end + 1
    }
    else {
        field_end
    };
    let remaining = &raw[remaining_start..];
    let mut result = format!("({}){}", ai, field);
    if !remaining.is_empty() {
        result.push_str(&parse_fields_in_general_purpose(remaining)?);
    }
    Ok(result)
}

/// Parses a flat general-purpose element string into parenthesized-AI form.
pub fn parse_fields_in_general_purpose(raw: &str) -> Result<String> {
    if raw.is_empty() {
        return Ok(String::new());
    }
    if raw.len() < 2 {
        return format_error("application identifier too short");
    }

    // The 3-plus-1 class keys on its first three digits; the fourth digit belongs to the AI
    // but not to the lookup.
    let tables: [(&HashMap<&'static str, FieldLength>, usize, usize); 4] = [
        (&TWO_DIGIT_DATA_LENGTH, 2, 2),
        (&THREE_DIGIT_DATA_LENGTH, 3, 3),
        (&THREE_DIGIT_PLUS_DIGIT_DATA_LENGTH, 4, 3),
        (&FOUR_DIGIT_DATA_LENGTH, 4, 4),
    ];

    for (table, ai_size, lookup_size) in tables {
        if raw.len() < ai_size {
            continue;
        }
        if let Some(&length) = table.get(&raw[..lookup_size]) {
            return match length {
                Fixed(size) => process_fixed_ai(ai_size, size, raw),
                Variable(max) => process_variable_ai(ai_size, max, raw),
            };
        }
    }
    format_error("unknown application identifier")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_fixed_fields() {
        assert_eq!(
            parse_fields_in_general_purpose("0104912345123459").unwrap(),
            "(01)04912345123459"
        );
        assert_eq!(parse_fields_in_general_purpose("11250110").unwrap(), "(11)250110");
    }

    #[test]
    fn verify_variable_fields_with_separator() {
        // Variable AI 10 terminated by FNC1, then a fixed AI 11.
        assert_eq!(
            parse_fields_in_general_purpose("10AB123$11250110").unwrap(),
            "(10)AB123(11)250110"
        );
        // Variable field running to end of data.
        assert_eq!(parse_fields_in_general_purpose("21SERIAL99").unwrap(), "(21)SERIAL99");
    }

    #[test]
    fn verify_chained_fixed_fields() {
        assert_eq!(
            parse_fields_in_general_purpose("010491234512345915251231").unwrap(),
            "(01)04912345123459(15)251231"
        );
    }

    #[test]
    fn verify_three_plus_one_class() {
        // 3103: net weight with the decimal-point digit folded into the AI.
        assert_eq!(parse_fields_in_general_purpose("3103012345").unwrap(), "(3103)012345");
        assert_eq!(parse_fields_in_general_purpose("3922449").unwrap(), "(3922)449");
    }

    #[test]
    fn verify_unknown_ai_rejected() {
        assert!(parse_fields_in_general_purpose("05123").is_err());
        assert!(parse_fields_in_general_purpose("x").is_err());
    }
}
