// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use symbology_core::io::BitBuffer;

use crate::high_level::{latch_cost, Mode};
use crate::token::Token;

/// One candidate encoding: the tokens emitted so far plus everything needed to extend it.
///
/// A state is immutable; every transition builds a new one. The token list does not yet
/// include the pending binary-shift run, which is flushed by [`EncodingState::end_binary_shift`].
#[derive(Clone, Debug)]
pub struct EncodingState {
    pub tokens: Vec<Token>,
    /// The current mode, or the mode to return to once the binary-shift run ends.
    pub mode: Mode,
    /// The number of most recent input bytes pending output under binary shift.
    pub binary_shift_byte_count: usize,
    /// The total number of bits this candidate has committed to, including the pending run.
    pub bit_count: usize,
}

impl EncodingState {
    pub fn initial() -> EncodingState {
        EncodingState { tokens: Vec::new(), mode: Mode::Upper, binary_shift_byte_count: 0, bit_count: 0 }
    }

    /// The cost in bits of the headers still owed for the pending binary-shift run.
    pub fn binary_shift_cost(&self) -> usize {
        if self.binary_shift_byte_count > 62 {
            // B/S with extended length.
            21
        }
        else if self.binary_shift_byte_count > 31 {
            // Two B/S runs.
            20
        }
        else if self.binary_shift_byte_count > 0 {
            // One B/S run.
            10
        }
        else {
            0
        }
    }

    /// True when being in this state is at least as cheap as `other` under every possible
    /// continuation of the input; `other` can then be pruned.
    pub fn is_better_than_or_equal_to(&self, other: &EncodingState) -> bool {
        let mut new_mode_bit_count = self.bit_count + latch_cost(self.mode, other.mode);
        if self.binary_shift_byte_count < other.binary_shift_byte_count {
            // Add the additional binary-shift cost of the other state, if any.
            new_mode_bit_count += other.binary_shift_cost() - self.binary_shift_cost();
        }
        else if self.binary_shift_byte_count > other.binary_shift_byte_count
            && other.binary_shift_byte_count > 0
        {
            // Worst case: this run crosses the 31-byte boundary while the other stays below.
            new_mode_bit_count += 10;
        }
        new_mode_bit_count <= other.bit_count
    }

    /// Flushes the pending binary-shift run into a token. `index` is the position one past the
    /// last byte in the run.
    pub fn end_binary_shift(&self, index: usize) -> EncodingState {
        if self.binary_shift_byte_count == 0 {
            return self.clone();
        }
        let mut tokens = self.tokens.clone();
        tokens
            .push(Token::binary_shift(index - self.binary_shift_byte_count, self.binary_shift_byte_count));
        EncodingState {
            tokens,
            mode: self.mode,
            binary_shift_byte_count: 0,
            bit_count: self.bit_count,
        }
    }

    /// Expands the tokens into the final bit stream.
    pub fn to_bit_buffer(&self, text: &[u8]) -> BitBuffer {
        let end_state = self.end_binary_shift(text.len());
        let mut bits = BitBuffer::new();
        for token in &end_state.tokens {
            token.append_to(&mut bits, text);
        }
        debug_assert_eq!(bits.len(), self.bit_count);
        bits
    }
}
