// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use lazy_static::lazy_static;

/// Identifies one of the process-wide Galois field singletons.
///
/// Polynomials carry a `FieldId` instead of a reference to their field; checking that two
/// operands belong to the same field is then a plain integer compare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldId {
    AztecData12,
    AztecData10,
    AztecData6,
    AztecParam,
    QrCodeField256,
    DataMatrixField256,
}

/// A finite field GF(2^m) with precomputed exponent and logarithm tables.
///
/// Elements are represented as `u16` for convenience; the widest field in use is GF(4096).
/// The generator alpha is always 2. Tables are built once per process and treated as read-only
/// afterwards.
pub struct GaloisField {
    id: FieldId,
    size: usize,
    generator_base: u16,
    exp: Vec<u16>,
    log: Vec<u16>,
}

lazy_static! {
    /// GF(4096), primitive x^12 + x^6 + x^5 + x^3 + 1.
    pub static ref AZTEC_DATA_12: GaloisField = GaloisField::new(FieldId::AztecData12, 0x1069, 4096, 1);
    /// GF(1024), primitive x^10 + x^3 + 1.
    pub static ref AZTEC_DATA_10: GaloisField = GaloisField::new(FieldId::AztecData10, 0x409, 1024, 1);
    /// GF(64), primitive x^6 + x + 1.
    pub static ref AZTEC_DATA_6: GaloisField = GaloisField::new(FieldId::AztecData6, 0x43, 64, 1);
    /// GF(16), primitive x^4 + x + 1.
    pub static ref AZTEC_PARAM: GaloisField = GaloisField::new(FieldId::AztecParam, 0x13, 16, 1);
    /// GF(256), primitive x^8 + x^4 + x^3 + x^2 + 1, generator base 0.
    pub static ref QR_CODE_FIELD_256: GaloisField = GaloisField::new(FieldId::QrCodeField256, 0x011d, 256, 0);
    /// GF(256), primitive x^8 + x^5 + x^3 + x^2 + 1.
    pub static ref DATA_MATRIX_FIELD_256: GaloisField = GaloisField::new(FieldId::DataMatrixField256, 0x012d, 256, 1);
}

lazy_static! {
    /// MaxiCode shares the Aztec 6-bit field.
    pub static ref MAXICODE_FIELD_64: &'static GaloisField = &AZTEC_DATA_6;
    /// The Aztec 8-bit field is the Data Matrix field.
    pub static ref AZTEC_DATA_8: &'static GaloisField = &DATA_MATRIX_FIELD_256;
}

impl GaloisField {
    fn new(id: FieldId, primitive: u32, size: usize, generator_base: u16) -> GaloisField {
        let mut exp = vec![0u16; size];
        let mut log = vec![0u16; size];
        let mut x: u32 = 1;
        for entry in exp.iter_mut() {
            *entry = x as u16;
            x <<= 1;
            if x >= size as u32 {
                x ^= primitive;
                x &= size as u32 - 1;
            }
        }
        for (i, &e) in exp.iter().take(size - 1).enumerate() {
            log[e as usize] = i as u16;
        }
        // log[0] is never a valid lookup.
        GaloisField { id, size, generator_base, exp, log }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    /// The order of the field, 2^m.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The factor b in the generator polynomial g(x) = (x+a^b)(x+a^(b+1))...(x+a^(b+2t-1)).
    pub fn generator_base(&self) -> u16 {
        self.generator_base
    }

    /// 2 to the power of `a` in the field.
    #[inline]
    pub fn exp(&self, a: usize) -> u16 {
        self.exp[a % (self.size - 1)]
    }

    /// Base-2 logarithm of `a` in the field. `a` must be non-zero.
    #[inline]
    pub fn log(&self, a: u16) -> u16 {
        assert!(a != 0, "log of zero is undefined in a Galois field");
        self.log[a as usize]
    }

    /// Multiplicative inverse of `a`. `a` must be non-zero.
    #[inline]
    pub fn inverse(&self, a: u16) -> u16 {
        self.exp[self.size - usize::from(self.log(a)) - 1]
    }

    /// Product of `a` and `b` in the field.
    #[inline]
    pub fn multiply(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        let sum = usize::from(self.log[a as usize]) + usize::from(self.log[b as usize]);
        // Cheaper than the modulo operator: the sum of two logs is below 2 * (size - 1).
        let ceil = self.size - 1;
        self.exp[if sum < ceil { sum } else { sum - ceil }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_table_identities() {
        for field in [&*AZTEC_DATA_12, &*AZTEC_DATA_10, &*AZTEC_DATA_6, &*AZTEC_PARAM,
                      &*QR_CODE_FIELD_256, &*DATA_MATRIX_FIELD_256]
        {
            assert_eq!(field.exp(0), 1);
            assert_eq!(field.exp(field.size() - 1), 1);
            assert_eq!(field.log(1), 0);
            // exp and log are inverse bijections over the non-zero elements.
            for i in 1..field.size() {
                let e = field.exp(i - 1);
                assert_eq!(usize::from(field.log(e)), i - 1);
            }
        }
    }

    #[test]
    fn verify_multiply_inverse() {
        let field = &*QR_CODE_FIELD_256;
        for a in 1..256u16 {
            assert_eq!(field.multiply(a, field.inverse(a)), 1);
            assert_eq!(field.multiply(a, 0), 0);
            assert_eq!(field.multiply(a, 1), a);
        }
        // alpha^2 * alpha^3 = alpha^5.
        assert_eq!(field.multiply(field.exp(2), field.exp(3)), field.exp(5));
    }

    #[test]
    fn verify_shared_fields() {
        assert_eq!(MAXICODE_FIELD_64.id(), FieldId::AztecData6);
        assert_eq!(AZTEC_DATA_8.id(), FieldId::DataMatrixField256);
    }
}
