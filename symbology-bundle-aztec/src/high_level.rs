// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Aztec high-level encoder.
//!
//! Aztec has five character modes plus a binary-shift escape, with asymmetric latch and shift
//! costs between them. A greedy choice is not optimal, so the encoder carries a set of
//! candidate states forward over the input, expanding each by every sensible transition and
//! pruning the ones another candidate dominates under all possible futures.

use smallvec::SmallVec;

use symbology_core::io::BitBuffer;

use crate::state::EncodingState;
use crate::token::Token;

/// The five character modes. `Digit` codes are 4 bits wide, all others 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Upper = 0,
    Lower = 1,
    Digit = 2,
    Mixed = 3,
    Punct = 4,
}

const MODES: [Mode; 5] = [Mode::Upper, Mode::Lower, Mode::Digit, Mode::Mixed, Mode::Punct];

/// For each pair of modes, the optimal latch sequence, encoded as
/// `(bit count << 16) | bits`. Up to 14 bits in the worst case.
#[rustfmt::skip]
const LATCH_TABLE: [[u32; 5]; 5] = [
    [
        0,
        (5 << 16) + 28,              // UPPER -> LOWER
        (5 << 16) + 30,              // UPPER -> DIGIT
        (5 << 16) + 29,              // UPPER -> MIXED
        (10 << 16) + (29 << 5) + 30, // UPPER -> MIXED -> PUNCT
    ],
    [
        (9 << 16) + (30 << 4) + 14,  // LOWER -> DIGIT -> UPPER
        0,
        (5 << 16) + 30,              // LOWER -> DIGIT
        (5 << 16) + 29,              // LOWER -> MIXED
        (10 << 16) + (29 << 5) + 30, // LOWER -> MIXED -> PUNCT
    ],
    [
        (4 << 16) + 14,              // DIGIT -> UPPER
        (9 << 16) + (14 << 5) + 28,  // DIGIT -> UPPER -> LOWER
        0,
        (9 << 16) + (14 << 5) + 29,  // DIGIT -> UPPER -> MIXED
        (14 << 16) + (14 << 10) + (29 << 5) + 30, // DIGIT -> UPPER -> MIXED -> PUNCT
    ],
    [
        (5 << 16) + 29,              // MIXED -> UPPER
        (5 << 16) + 28,              // MIXED -> LOWER
        (10 << 16) + (29 << 5) + 30, // MIXED -> UPPER -> DIGIT
        0,
        (5 << 16) + 30,              // MIXED -> PUNCT
    ],
    [
        (5 << 16) + 31,              // PUNCT -> UPPER
        (10 << 16) + (31 << 5) + 28, // PUNCT -> UPPER -> LOWER
        (10 << 16) + (31 << 5) + 30, // PUNCT -> UPPER -> DIGIT
        (10 << 16) + (31 << 5) + 29, // PUNCT -> UPPER -> MIXED
        0,
    ],
];

/// The bit cost of latching from `from` to `to`.
pub fn latch_cost(from: Mode, to: Mode) -> usize {
    (LATCH_TABLE[from as usize][to as usize] >> 16) as usize
}

/// The available single-code shifts; `None` where no shift exists. Shifts to binary are
/// handled separately.
fn shift_code(from: Mode, to: Mode) -> Option<u16> {
    match (from, to) {
        (Mode::Upper, Mode::Punct) => Some(0),
        (Mode::Lower, Mode::Punct) => Some(0),
        (Mode::Lower, Mode::Upper) => Some(28),
        (Mode::Mixed, Mode::Punct) => Some(0),
        (Mode::Digit, Mode::Punct) => Some(0),
        (Mode::Digit, Mode::Upper) => Some(15),
        _ => None,
    }
}

/// The code for `ch` in `mode`, or `None`. Code 0 never maps to a character (it is a shift or
/// FLG code in every mode).
fn char_code(mode: Mode, ch: u8) -> Option<u16> {
    let code: i32 = match mode {
        Mode::Upper => match ch {
            b' ' => 1,
            b'A'..=b'Z' => i32::from(ch - b'A') + 2,
            _ => 0,
        },
        Mode::Lower => match ch {
            b' ' => 1,
            b'a'..=b'z' => i32::from(ch - b'a') + 2,
            _ => 0,
        },
        Mode::Digit => match ch {
            b' ' => 1,
            b'0'..=b'9' => i32::from(ch - b'0') + 2,
            b',' => 12,
            b'.' => 13,
            _ => 0,
        },
        Mode::Mixed => {
            const MIXED_CHARS: [u8; 28] = [
                0x00, 0x20, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
                0x0c, 0x0d, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f, 0x40, 0x5c, 0x5e, 0x5f, 0x60, 0x7c,
                0x7d, 0x7f,
            ];
            MIXED_CHARS.iter().position(|&c| c == ch).map(|i| i as i32).unwrap_or(0)
        }
        Mode::Punct => {
            const PUNCT_CHARS: [u8; 31] = [
                0, b'\r', 0, 0, 0, 0, b'!', b'"', b'#', b'$', b'%', b'&', b'\'', b'(', b')',
                b'*', b'+', b',', b'-', b'.', b'/', b':', b';', b'<', b'=', b'>', b'?', b'[',
                b']', b'{', b'}',
            ];
            PUNCT_CHARS
                .iter()
                .position(|&c| c != 0 && c == ch)
                .map(|i| i as i32)
                .unwrap_or(0)
        }
    };
    if code > 0 {
        Some(code as u16)
    }
    else {
        None
    }
}

/// The working set of candidate states. It stays small on real inputs, so spills are rare.
type StateList = SmallVec<[EncodingState; 8]>;

fn latch_and_append(state: &EncodingState, mode: Mode, value: u16) -> EncodingState {
    debug_assert_eq!(state.binary_shift_byte_count, 0);
    let mut tokens = state.tokens.clone();
    let mut bit_count = state.bit_count;
    if mode != state.mode {
        let latch = LATCH_TABLE[state.mode as usize][mode as usize];
        tokens.push(Token::simple((latch & 0xffff) as u16, (latch >> 16) as u8));
        bit_count += (latch >> 16) as usize;
    }
    let code_bits = if mode == Mode::Digit { 4 } else { 5 };
    tokens.push(Token::simple(value, code_bits));
    EncodingState { tokens, mode, binary_shift_byte_count: 0, bit_count: bit_count + usize::from(code_bits) }
}

fn shift_and_append(state: &EncodingState, mode: Mode, value: u16) -> EncodingState {
    debug_assert_eq!(state.binary_shift_byte_count, 0);
    debug_assert_ne!(state.mode, mode);
    let this_mode_bits = if state.mode == Mode::Digit { 4 } else { 5 };
    let mut tokens = state.tokens.clone();
    tokens.push(Token::simple(shift_code(state.mode, mode).unwrap(), this_mode_bits));
    tokens.push(Token::simple(value, 5));
    EncodingState {
        tokens,
        mode: state.mode,
        binary_shift_byte_count: 0,
        bit_count: state.bit_count + usize::from(this_mode_bits) + 5,
    }
}

fn add_binary_shift_char(state: &EncodingState, index: usize) -> EncodingState {
    let mut tokens = state.tokens.clone();
    let mut mode = state.mode;
    let mut bit_count = state.bit_count;
    if state.mode == Mode::Punct || state.mode == Mode::Digit {
        // Binary shift exists only from UPPER, LOWER, and MIXED.
        debug_assert_eq!(state.binary_shift_byte_count, 0);
        let latch = LATCH_TABLE[mode as usize][Mode::Upper as usize];
        tokens.push(Token::simple((latch & 0xffff) as u16, (latch >> 16) as u8));
        bit_count += (latch >> 16) as usize;
        mode = Mode::Upper;
    }
    let delta = if state.binary_shift_byte_count == 0 || state.binary_shift_byte_count == 31 {
        18
    }
    else if state.binary_shift_byte_count == 62 {
        9
    }
    else {
        8
    };
    let result = EncodingState {
        tokens,
        mode,
        binary_shift_byte_count: state.binary_shift_byte_count + 1,
        bit_count: bit_count + delta,
    };
    if result.binary_shift_byte_count == 2047 + 31 {
        // The run is as long as the extended length form allows.
        result.end_binary_shift(index + 1)
    }
    else {
        result
    }
}

/// Expands one state by every sensible way of emitting the character at `index`.
fn update_state_for_char(state: &EncodingState, text: &[u8], index: usize, result: &mut StateList) {
    let ch = text[index];
    let char_in_current_table = char_code(state.mode, ch).is_some();
    let mut state_no_binary: Option<EncodingState> = None;
    for mode in MODES {
        if let Some(code) = char_code(mode, ch) {
            let state_no_binary =
                state_no_binary.get_or_insert_with(|| state.end_binary_shift(index));
            // Latching to any mode other than DIGIT cannot win when the character exists in
            // the current table: the same latch after this character costs the same.
            if !char_in_current_table || mode == state.mode || mode == Mode::Digit {
                result.push(latch_and_append(state_no_binary, mode, code));
            }
            // A temporary shift can only win when the current table lacks the character.
            if !char_in_current_table && shift_code(state.mode, mode).is_some() {
                result.push(shift_and_append(state_no_binary, mode, code));
            }
        }
    }
    if state.binary_shift_byte_count > 0 || !char_in_current_table {
        // Entering binary shift for a character the current mode covers can never save bits.
        result.push(add_binary_shift_char(state, index));
    }
}

/// Expands one state for a two-character punctuation pair code.
fn update_state_for_pair(state: &EncodingState, index: usize, pair_code: u16, result: &mut StateList) {
    let state_no_binary = state.end_binary_shift(index);
    // Latch to PUNCT and append the pair code.
    result.push(latch_and_append(&state_no_binary, Mode::Punct, pair_code));
    if state.mode != Mode::Punct {
        // Shift to PUNCT instead.
        result.push(shift_and_append(&state_no_binary, Mode::Punct, pair_code));
    }
    if pair_code == 3 || pair_code == 4 {
        // ". " and ", " can also be spelled as two DIGIT codes.
        let digit_state = latch_and_append(&state_no_binary, Mode::Digit, 16 - pair_code);
        result.push(latch_and_append(&digit_state, Mode::Digit, 1));
    }
    if state.binary_shift_byte_count > 0 {
        // Continuing an open binary run over the pair only makes sense while inside one.
        result.push(add_binary_shift_char(&add_binary_shift_char(state, index), index + 1));
    }
}

/// Removes every state another state dominates.
fn simplify_states(states: StateList) -> StateList {
    let mut result: StateList = SmallVec::new();
    for new_state in states {
        let mut add = true;
        result.retain(|old_state| {
            if add && old_state.is_better_than_or_equal_to(&new_state) {
                add = false;
            }
            !(add && new_state.is_better_than_or_equal_to(old_state))
        });
        if add {
            result.push(new_state);
        }
    }
    result
}

/// Encodes `text` into the minimum-length Aztec bit stream.
pub fn encode(text: &[u8]) -> BitBuffer {
    let mut states: StateList = SmallVec::new();
    states.push(EncodingState::initial());

    let mut index = 0;
    while index < text.len() {
        let next_char = text.get(index + 1).copied().unwrap_or(0);
        let pair_code = match text[index] {
            b'\r' if next_char == b'\n' => 2,
            b'.' if next_char == b' ' => 3,
            b',' if next_char == b' ' => 4,
            b':' if next_char == b' ' => 5,
            _ => 0,
        };
        let mut result: StateList = SmallVec::new();
        if pair_code > 0 {
            // One of the four special PUNCT pairs; consume both characters at once.
            for state in &states {
                update_state_for_pair(state, index, pair_code, &mut result);
            }
            index += 2;
        }
        else {
            for state in &states {
                update_state_for_char(state, text, index, &mut result);
            }
            index += 1;
        }
        states = if result.len() > 1 { simplify_states(result) } else { result };
    }

    let min_state = states.iter().min_by_key(|s| s.bit_count).unwrap();
    min_state.to_bit_buffer(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_len(text: &[u8]) -> usize {
        encode(text).len()
    }

    #[test]
    fn verify_known_bit_counts() {
        // Reference bit counts for the dynamic-programming encoder.
        assert_eq!(encoded_len(b"A"), 5);
        assert_eq!(encoded_len(b"ABC"), 15);
        // Latch to digit (5 bits) then three 4-bit codes.
        assert_eq!(encoded_len(b"123"), 17);
        // Lower latch (5) plus three 5-bit codes.
        assert_eq!(encoded_len(b"abc"), 20);
        // Punct pair ". " is a single 5-bit code after a shift.
        assert_eq!(encoded_len(b"A. "), 15);
    }

    #[test]
    fn verify_binary_shift() {
        // A byte with no mode mapping forces binary shift: 5 (B/S) + 5 (length) + 8.
        assert_eq!(encoded_len(&[0x80]), 18);
        // Two such bytes share one header.
        assert_eq!(encoded_len(&[0x80, 0x81]), 26);
        // A long binary run uses the extended length form: one 5-bit B/S code and a 16-bit
        // length field.
        let long: Vec<u8> = std::iter::repeat(0x80).take(100).collect();
        assert_eq!(encoded_len(&long), 5 + 16 + 100 * 8);
    }

    #[test]
    fn verify_optimality_on_short_inputs() {
        // The DP result can never be worse than the single-mode spellings.
        for text in [
            &b"AB12cd.: x"[..],
            b"Code 2D!",
            b"a,b.c:d",
            b"N0.6-12;X",
            b"\r\n\r\n1.2.3",
        ] {
            let dp = encoded_len(text);
            let naive = naive_single_mode_cost(text);
            assert!(dp <= naive, "dp {} > naive {} for {:?}", dp, naive, text);
        }
    }

    /// A loose upper bound: spell every character with a latch to the cheapest mode holding
    /// it, never using shifts or pairs.
    fn naive_single_mode_cost(text: &[u8]) -> usize {
        let mut mode = Mode::Upper;
        let mut bits = 0;
        for &ch in text {
            let target = MODES
                .iter()
                .copied()
                .find(|&m| char_code(m, ch).is_some());
            match target {
                Some(m) => {
                    if m != mode {
                        bits += latch_cost(mode, m);
                        mode = m;
                    }
                    bits += if m == Mode::Digit { 4 } else { 5 };
                }
                None => bits += 18,
            }
        }
        bits
    }

    #[test]
    fn verify_stream_contents() {
        // "A" in UPPER mode is code 2 in five bits.
        let bits = encode(b"A");
        assert_eq!(bits.reader().read_bits(5).unwrap(), 2);

        // "123": latch to digit (30 in five bits) then codes 3, 4, 5.
        let bits = encode(b"123");
        let mut reader = bits.reader();
        assert_eq!(reader.read_bits(5).unwrap(), 30);
        assert_eq!(reader.read_bits(4).unwrap(), 3);
        assert_eq!(reader.read_bits(4).unwrap(), 4);
        assert_eq!(reader.read_bits(4).unwrap(), 5);
    }
}
