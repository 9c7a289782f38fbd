// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reed-Solomon error correction over the prime field GF(929).
//!
//! PDF417 is the one symbology here whose field has odd characteristic, so addition is modular
//! rather than xor and subtraction matters. The decoder follows the same Euclidean shape as
//! the GF(2^m) codec in the core crate.

use log::debug;

use symbology_core::errors::{checksum_error, invalid_argument_error, Result};

pub const MODULUS: u32 = 929;
const GENERATOR: u32 = 3;

/// Precomputed discrete exponentials and logarithms of the generator 3 modulo 929.
struct ModulusGf {
    exp: [u16; MODULUS as usize],
    log: [u16; MODULUS as usize],
}

impl ModulusGf {
    fn new() -> ModulusGf {
        let mut exp = [0u16; MODULUS as usize];
        let mut log = [0u16; MODULUS as usize];
        let mut x = 1u32;
        for (i, e) in exp.iter_mut().enumerate() {
            *e = x as u16;
            if i < MODULUS as usize - 1 {
                log[x as usize] = i as u16;
            }
            x = x * GENERATOR % MODULUS;
        }
        ModulusGf { exp, log }
    }

    #[inline]
    fn exp(&self, a: usize) -> u32 {
        u32::from(self.exp[a % (MODULUS as usize - 1)])
    }

    #[inline]
    fn log(&self, a: u32) -> u32 {
        assert!(a != 0, "log of zero is undefined");
        u32::from(self.log[a as usize])
    }

    #[inline]
    fn add(&self, a: u32, b: u32) -> u32 {
        (a + b) % MODULUS
    }

    #[inline]
    fn subtract(&self, a: u32, b: u32) -> u32 {
        (MODULUS + a - b) % MODULUS
    }

    #[inline]
    fn multiply(&self, a: u32, b: u32) -> u32 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp((self.log(a) + self.log(b)) as usize)
    }

    #[inline]
    fn inverse(&self, a: u32) -> u32 {
        self.exp(MODULUS as usize - 1 - self.log(a) as usize)
    }
}

/// A dense polynomial over GF(929), most significant coefficient first.
#[derive(Clone)]
struct ModulusPoly {
    coefficients: Vec<u32>,
}

impl ModulusPoly {
    fn new(coefficients: Vec<u32>) -> ModulusPoly {
        let first = coefficients.iter().position(|&c| c != 0);
        let coefficients = match first {
            Some(0) => coefficients,
            Some(n) => coefficients[n..].to_vec(),
            None => vec![0],
        };
        ModulusPoly { coefficients }
    }

    fn zero() -> ModulusPoly {
        ModulusPoly { coefficients: vec![0] }
    }

    fn monomial(degree: usize, coefficient: u32) -> ModulusPoly {
        if coefficient == 0 {
            return ModulusPoly::zero();
        }
        let mut coefficients = vec![0; degree + 1];
        coefficients[0] = coefficient;
        ModulusPoly { coefficients }
    }

    fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    fn is_zero(&self) -> bool {
        self.coefficients[0] == 0
    }

    fn coefficient(&self, degree: usize) -> u32 {
        self.coefficients[self.coefficients.len() - 1 - degree]
    }

    fn evaluate_at(&self, gf: &ModulusGf, x: u32) -> u32 {
        if x == 0 {
            return self.coefficient(0);
        }
        let mut result = 0;
        for &c in &self.coefficients {
            result = gf.add(gf.multiply(result, x), c);
        }
        result
    }

    fn add(&self, gf: &ModulusGf, other: &ModulusPoly) -> ModulusPoly {
        let (smaller, larger) = if self.coefficients.len() <= other.coefficients.len() {
            (&self.coefficients, &other.coefficients)
        }
        else {
            (&other.coefficients, &self.coefficients)
        };
        let offset = larger.len() - smaller.len();
        let mut sum = larger.clone();
        for (i, &c) in smaller.iter().enumerate() {
            sum[offset + i] = gf.add(sum[offset + i], c);
        }
        ModulusPoly::new(sum)
    }

    fn multiply(&self, gf: &ModulusGf, other: &ModulusPoly) -> ModulusPoly {
        if self.is_zero() || other.is_zero() {
            return ModulusPoly::zero();
        }
        let mut product = vec![0u32; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, &a) in self.coefficients.iter().enumerate() {
            for (j, &b) in other.coefficients.iter().enumerate() {
                product[i + j] = gf.add(product[i + j], gf.multiply(a, b));
            }
        }
        ModulusPoly::new(product)
    }

    fn multiply_scalar(&self, gf: &ModulusGf, scalar: u32) -> ModulusPoly {
        ModulusPoly::new(self.coefficients.iter().map(|&c| gf.multiply(c, scalar)).collect())
    }

    fn negate(&self, gf: &ModulusGf) -> ModulusPoly {
        ModulusPoly {
            coefficients: self.coefficients.iter().map(|&c| gf.subtract(0, c)).collect(),
        }
    }

    /// `(quotient, remainder)` of `self / divisor`.
    fn divide(&self, gf: &ModulusGf, divisor: &ModulusPoly) -> (ModulusPoly, ModulusPoly) {
        assert!(!divisor.is_zero(), "division by the zero polynomial");
        let mut quotient = ModulusPoly::zero();
        let mut remainder = self.clone();
        let denominator_lead_inverse = gf.inverse(divisor.coefficient(divisor.degree()));
        while !remainder.is_zero() && remainder.degree() >= divisor.degree() {
            let degree_difference = remainder.degree() - divisor.degree();
            let scale =
                gf.multiply(remainder.coefficient(remainder.degree()), denominator_lead_inverse);
            let term =
                divisor.multiply(gf, &ModulusPoly::monomial(degree_difference, scale));
            quotient = quotient.add(gf, &ModulusPoly::monomial(degree_difference, scale));
            remainder = remainder.add(gf, &term.negate(gf));
        }
        (quotient, remainder)
    }
}

fn gf() -> &'static ModulusGf {
    use std::sync::OnceLock;
    static GF: OnceLock<ModulusGf> = OnceLock::new();
    GF.get_or_init(ModulusGf::new)
}

/// The generator polynomial g(x) = (x - 3)(x - 3^2)...(x - 3^k).
fn build_generator(ec_count: usize) -> ModulusPoly {
    let gf = gf();
    let mut generator = ModulusPoly::new(vec![1]);
    for i in 1..=ec_count {
        let root = gf.exp(i);
        let factor = ModulusPoly::new(vec![1, gf.subtract(0, root)]);
        generator = generator.multiply(gf, &factor);
    }
    generator
}

/// Appends `ec_count` error-correction codewords for `data` (which must already carry the
/// symbol length descriptor in front).
pub fn generate_ec_codewords(data: &[u16], ec_count: usize) -> Result<Vec<u16>> {
    if ec_count == 0 || data.is_empty() {
        return invalid_argument_error("invalid error correction codeword count");
    }
    let gf = gf();
    let generator = build_generator(ec_count);
    let info = ModulusPoly::new(data.iter().map(|&c| u32::from(c)).collect())
        .multiply(gf, &ModulusPoly::monomial(ec_count, 1));
    let (_, remainder) = info.divide(gf, &generator);

    // EC codewords are the negated remainder coefficients, low degrees last.
    let mut ec = vec![0u16; ec_count];
    for degree in 0..ec_count {
        let coefficient = if degree <= remainder.degree() { remainder.coefficient(degree) } else { 0 };
        ec[ec_count - 1 - degree] = gf.subtract(0, coefficient) as u16;
    }
    Ok(ec)
}

/// Corrects errors in a full codeword vector (data followed by `ec_count` EC codewords) in
/// place, returning the number of corrected codewords.
pub fn correct_errors(codewords: &mut [u16], ec_count: usize) -> Result<usize> {
    if ec_count == 0 || codewords.len() <= ec_count {
        return invalid_argument_error("invalid error correction codeword count");
    }
    let gf = gf();
    let poly = ModulusPoly::new(codewords.iter().map(|&c| u32::from(c)).collect());

    let mut syndromes = vec![0u32; ec_count];
    let mut has_error = false;
    for i in 1..=ec_count {
        let s = poly.evaluate_at(gf, gf.exp(i));
        syndromes[ec_count - i] = s;
        has_error |= s != 0;
    }
    if !has_error {
        return Ok(0);
    }

    // Euclidean algorithm on x^ec_count and the syndrome polynomial.
    let mut r_last = ModulusPoly::monomial(ec_count, 1);
    let mut r = ModulusPoly::new(syndromes);
    let mut t_last = ModulusPoly::zero();
    let mut t = ModulusPoly::new(vec![1]);
    if r.degree() >= r_last.degree() {
        std::mem::swap(&mut r, &mut r_last);
    }

    while r.degree() >= ec_count / 2 && !r.is_zero() {
        std::mem::swap(&mut r, &mut r_last);
        std::mem::swap(&mut t, &mut t_last);
        if r_last.is_zero() {
            return checksum_error("euclidean algorithm terminated early");
        }
        let (q, remainder) = r.divide(gf, &r_last);
        r = remainder;
        t = q.multiply(gf, &t_last).negate(gf).add(gf, &t);
    }

    let sigma_tilde_at_zero = t.coefficient(0);
    if sigma_tilde_at_zero == 0 {
        return checksum_error("sigma tilde(0) was zero");
    }
    let inverse = gf.inverse(sigma_tilde_at_zero);
    let sigma = t.multiply_scalar(gf, inverse);
    let omega = r.multiply_scalar(gf, inverse);

    // Root search over the whole field.
    let num_errors = sigma.degree();
    let mut locations = Vec::with_capacity(num_errors);
    for i in 1..MODULUS {
        if locations.len() >= num_errors {
            break;
        }
        if sigma.evaluate_at(gf, i) == 0 {
            locations.push(gf.inverse(i));
        }
    }
    if locations.len() != num_errors {
        return checksum_error("error locator degree does not match number of roots");
    }

    // Formal derivative of sigma for the magnitude formula.
    let mut derivative_coefficients = vec![0u32; sigma.degree()];
    for degree in 1..=sigma.degree() {
        let c = gf.multiply(degree as u32 % MODULUS, sigma.coefficient(degree));
        derivative_coefficients[sigma.degree() - degree] = c;
    }
    let sigma_derivative = ModulusPoly::new(derivative_coefficients);

    for &location in &locations {
        let xi_inverse = gf.inverse(location);
        let numerator = gf.subtract(0, omega.evaluate_at(gf, xi_inverse));
        let denominator = gf.inverse(sigma_derivative.evaluate_at(gf, xi_inverse));
        let magnitude = gf.multiply(numerator, denominator);

        let log = gf.log(location) as usize;
        if log + 1 > codewords.len() {
            return checksum_error("error location outside the message");
        }
        let position = codewords.len() - 1 - log;
        codewords[position] =
            gf.subtract(u32::from(codewords[position]), magnitude) as u16;
    }

    debug!("pdf417 ec: corrected {} codeword(s)", locations.len());
    Ok(locations.len())
}
