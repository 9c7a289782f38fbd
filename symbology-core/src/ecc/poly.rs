// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecc::galois::GaloisField;
use crate::ecc::FieldId;

/// A dense polynomial over one of the GF(2^m) fields.
///
/// Coefficients are ordered from the most-significant to the least-significant degree and are
/// kept normalized: no leading zeros, except for the zero polynomial which is exactly `[0]`.
/// Operations take the owning field by reference; operands from different fields are a
/// programming error and panic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GfPoly {
    field: FieldId,
    coefficients: Vec<u16>,
}

impl GfPoly {
    pub fn new(gf: &GaloisField, coefficients: Vec<u16>) -> GfPoly {
        let first_non_zero = coefficients.iter().position(|&c| c != 0);
        let coefficients = match first_non_zero {
            Some(0) => coefficients,
            Some(n) => coefficients[n..].to_vec(),
            None => vec![0],
        };
        assert!(!coefficients.is_empty());
        GfPoly { field: gf.id(), coefficients }
    }

    pub fn zero(gf: &GaloisField) -> GfPoly {
        GfPoly { field: gf.id(), coefficients: vec![0] }
    }

    pub fn monomial(gf: &GaloisField, degree: usize, coefficient: u16) -> GfPoly {
        if coefficient == 0 {
            return GfPoly::zero(gf);
        }
        let mut coefficients = vec![0; degree + 1];
        coefficients[0] = coefficient;
        GfPoly { field: gf.id(), coefficients }
    }

    fn check_field(&self, gf: &GaloisField) {
        assert!(self.field == gf.id(), "polynomial does not belong to this field");
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients[0] == 0
    }

    /// The coefficient of the x^degree term.
    pub fn coefficient(&self, degree: usize) -> u16 {
        self.coefficients[self.coefficients.len() - 1 - degree]
    }

    /// The constant term.
    pub fn constant(&self) -> u16 {
        *self.coefficients.last().unwrap()
    }

    pub fn coefficients(&self) -> &[u16] {
        &self.coefficients
    }

    pub fn evaluate_at(&self, gf: &GaloisField, x: u16) -> u16 {
        self.check_field(gf);
        if x == 0 {
            return self.coefficient(0);
        }
        if x == 1 {
            // Evaluating at 1 is the sum (xor) of all coefficients.
            return self.coefficients.iter().fold(0, |acc, &c| acc ^ c);
        }
        let mut result = self.coefficients[0];
        for &c in &self.coefficients[1..] {
            result = gf.multiply(result, x) ^ c;
        }
        result
    }

    /// Addition and subtraction coincide under characteristic 2.
    pub fn add_or_subtract(&self, other: &GfPoly) -> GfPoly {
        assert!(self.field == other.field, "polynomials belong to different fields");
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        let (smaller, larger) = if self.coefficients.len() <= other.coefficients.len() {
            (&self.coefficients, &other.coefficients)
        }
        else {
            (&other.coefficients, &self.coefficients)
        };
        let offset = larger.len() - smaller.len();
        let mut sum = larger.clone();
        for (i, &c) in smaller.iter().enumerate() {
            sum[offset + i] ^= c;
        }
        GfPoly { field: self.field, coefficients: sum }.normalized()
    }

    fn normalized(self) -> GfPoly {
        match self.coefficients.iter().position(|&c| c != 0) {
            Some(0) => self,
            Some(n) => GfPoly { field: self.field, coefficients: self.coefficients[n..].to_vec() },
            None => GfPoly { field: self.field, coefficients: vec![0] },
        }
    }

    pub fn multiply(&self, gf: &GaloisField, other: &GfPoly) -> GfPoly {
        self.check_field(gf);
        other.check_field(gf);
        if self.is_zero() || other.is_zero() {
            return GfPoly::zero(gf);
        }
        let a = &self.coefficients;
        let b = &other.coefficients;
        let mut product = vec![0u16; a.len() + b.len() - 1];
        for (i, &ac) in a.iter().enumerate() {
            for (j, &bc) in b.iter().enumerate() {
                product[i + j] ^= gf.multiply(ac, bc);
            }
        }
        GfPoly::new(gf, product)
    }

    pub fn multiply_scalar(&self, gf: &GaloisField, scalar: u16) -> GfPoly {
        self.check_field(gf);
        if scalar == 0 {
            return GfPoly::zero(gf);
        }
        if scalar == 1 {
            return self.clone();
        }
        let coefficients = self.coefficients.iter().map(|&c| gf.multiply(c, scalar)).collect();
        GfPoly { field: self.field, coefficients }
    }

    pub fn multiply_by_monomial(&self, gf: &GaloisField, degree: usize, coefficient: u16) -> GfPoly {
        self.check_field(gf);
        if coefficient == 0 {
            return GfPoly::zero(gf);
        }
        let mut coefficients: Vec<u16> =
            self.coefficients.iter().map(|&c| gf.multiply(c, coefficient)).collect();
        coefficients.extend(std::iter::repeat(0).take(degree));
        GfPoly::new(gf, coefficients)
    }

    /// Polynomial long division, returning `(quotient, remainder)`.
    pub fn divide(&self, gf: &GaloisField, divisor: &GfPoly) -> (GfPoly, GfPoly) {
        self.check_field(gf);
        divisor.check_field(gf);
        assert!(!divisor.is_zero(), "division by the zero polynomial");

        let mut quotient = GfPoly::zero(gf);
        let mut remainder = self.clone();

        let denominator_lead_inverse = gf.inverse(divisor.coefficient(divisor.degree()));

        while !remainder.is_zero() && remainder.degree() >= divisor.degree() {
            let degree_difference = remainder.degree() - divisor.degree();
            let scale =
                gf.multiply(remainder.coefficient(remainder.degree()), denominator_lead_inverse);
            let term = divisor.multiply_by_monomial(gf, degree_difference, scale);
            quotient = quotient.add_or_subtract(&GfPoly::monomial(gf, degree_difference, scale));
            remainder = remainder.add_or_subtract(&term);
        }

        (quotient, remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecc::QR_CODE_FIELD_256;

    #[test]
    fn verify_normalization() {
        let gf = &*QR_CODE_FIELD_256;
        let p = GfPoly::new(gf, vec![0, 0, 5, 1]);
        assert_eq!(p.degree(), 1);
        assert_eq!(p.coefficient(1), 5);
        assert_eq!(p.coefficient(0), 1);

        let z = GfPoly::new(gf, vec![0, 0, 0]);
        assert!(z.is_zero());
        assert_eq!(z.degree(), 0);
    }

    #[test]
    fn verify_evaluate() {
        let gf = &*QR_CODE_FIELD_256;
        // p(x) = x^2 + 3x + 2
        let p = GfPoly::new(gf, vec![1, 3, 2]);
        assert_eq!(p.evaluate_at(gf, 0), 2);
        assert_eq!(p.evaluate_at(gf, 1), 1 ^ 3 ^ 2);
        let x = 7u16;
        let expect = gf.multiply(x, x) ^ gf.multiply(3, x) ^ 2;
        assert_eq!(p.evaluate_at(gf, x), expect);
    }

    #[test]
    fn verify_multiply_divide_round_trip() {
        let gf = &*QR_CODE_FIELD_256;
        let a = GfPoly::new(gf, vec![1, 0, 7, 3]);
        let b = GfPoly::new(gf, vec![2, 5]);
        let product = a.multiply(gf, &b);
        let (quotient, remainder) = product.divide(gf, &b);
        assert_eq!(quotient, a);
        assert!(remainder.is_zero());

        let (_, r) = a.divide(gf, &b);
        assert!(r.degree() < b.degree() || r.is_zero());
    }

    #[test]
    fn verify_add_cancels() {
        let gf = &*QR_CODE_FIELD_256;
        let a = GfPoly::new(gf, vec![1, 2, 3]);
        let sum = a.add_or_subtract(&a);
        assert!(sum.is_zero());
    }

    #[test]
    #[should_panic(expected = "different fields")]
    fn verify_field_mismatch_panics() {
        let a = GfPoly::new(&QR_CODE_FIELD_256, vec![1]);
        let b = GfPoly::new(&crate::ecc::AZTEC_DATA_6, vec![1]);
        let _ = a.add_or_subtract(&b);
    }
}
