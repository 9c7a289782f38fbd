// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use crate::ecc::galois::GaloisField;
use crate::ecc::poly::GfPoly;
use crate::errors::{checksum_error, invalid_argument_error, Result};

/// A systematic Reed-Solomon encoder over one Galois field.
///
/// Generator polynomials are cached per encoder instance, so each caller owns its cache and the
/// encoder stays safe to use from concurrent threads without shared state.
pub struct ReedSolomonEncoder {
    field: &'static GaloisField,
    cached_generators: Vec<GfPoly>,
}

impl ReedSolomonEncoder {
    pub fn new(field: &'static GaloisField) -> ReedSolomonEncoder {
        ReedSolomonEncoder { field, cached_generators: vec![GfPoly::new(field, vec![1])] }
    }

    fn build_generator(&mut self, degree: usize) -> &GfPoly {
        if degree >= self.cached_generators.len() {
            let mut last = self.cached_generators.last().unwrap().clone();
            for d in self.cached_generators.len()..=degree {
                let base = usize::from(self.field.generator_base());
                let root = self.field.exp(d - 1 + base);
                let factor = GfPoly::new(self.field, vec![1, root]);
                last = last.multiply(self.field, &factor);
                self.cached_generators.push(last.clone());
            }
        }
        &self.cached_generators[degree]
    }

    /// Fills the final `ec_count` entries of `message` with error-correction codewords computed
    /// over the leading data codewords.
    pub fn encode(&mut self, message: &mut [u16], ec_count: usize) -> Result<()> {
        if ec_count == 0 {
            return invalid_argument_error("no error correction codewords requested");
        }
        if message.len() <= ec_count {
            return invalid_argument_error("no data codewords provided");
        }
        let data_len = message.len() - ec_count;
        let generator = self.build_generator(ec_count).clone();

        let data: Vec<u16> = message[..data_len].to_vec();
        let info = GfPoly::new(self.field, data).multiply_by_monomial(self.field, ec_count, 1);
        let (_, remainder) = info.divide(self.field, &generator);

        // The remainder's degree may be lower than ec_count - 1; the gap is leading zeros.
        let coefficients = remainder.coefficients();
        let pad = ec_count - coefficients.len();
        for slot in message[data_len..data_len + pad].iter_mut() {
            *slot = 0;
        }
        message[data_len + pad..].copy_from_slice(coefficients);
        Ok(())
    }
}

/// Corrects errors in `message` (data plus `ec_count` error-correction codewords) in place.
///
/// On success the data portion of `message` holds the corrected codewords. Failure to locate or
/// apply corrections reports a `ChecksumError`; the message contents are then unspecified.
pub fn reed_solomon_decode(
    field: &'static GaloisField,
    message: &mut [u16],
    ec_count: usize,
) -> Result<()> {
    if ec_count == 0 || message.len() <= ec_count {
        return invalid_argument_error("invalid error correction codeword count");
    }

    let poly = GfPoly::new(field, message.to_vec());

    let base = usize::from(field.generator_base());
    let mut syndromes = vec![0u16; ec_count];
    let mut has_error = false;
    for i in 0..ec_count {
        let s = poly.evaluate_at(field, field.exp(i + base));
        syndromes[ec_count - 1 - i] = s;
        has_error |= s != 0;
    }
    if !has_error {
        return Ok(());
    }

    let (sigma, omega) = run_euclidean_algorithm(field, syndromes, ec_count)?;
    let locations = find_error_locations(field, &sigma)?;
    let magnitudes = find_error_magnitudes(field, &omega, &locations);

    debug!("reed-solomon: correcting {} error(s)", locations.len());

    for (&location, &magnitude) in locations.iter().zip(&magnitudes) {
        let log = usize::from(field.log(location));
        if log + 1 > message.len() {
            return checksum_error("error location outside the message");
        }
        let position = message.len() - 1 - log;
        message[position] ^= magnitude;
    }
    Ok(())
}

/// Runs the Euclidean algorithm on x^ec_count and the syndrome polynomial until the remainder
/// degree drops below ec_count / 2, yielding the error locator sigma and error evaluator omega.
fn run_euclidean_algorithm(
    field: &'static GaloisField,
    syndromes: Vec<u16>,
    ec_count: usize,
) -> Result<(GfPoly, GfPoly)> {
    let mut r_last = GfPoly::monomial(field, ec_count, 1);
    let mut r = GfPoly::new(field, syndromes);

    if r.degree() >= r_last.degree() {
        std::mem::swap(&mut r, &mut r_last);
    }

    let mut t_last = GfPoly::zero(field);
    let mut t = GfPoly::new(field, vec![1]);

    while r.degree() >= ec_count / 2 && !r.is_zero() {
        std::mem::swap(&mut r, &mut r_last);
        std::mem::swap(&mut t, &mut t_last);

        if r_last.is_zero() {
            return checksum_error("euclidean algorithm terminated early");
        }
        // r = r_last_last mod r_last (currently held in r), t = t_last_last + q * t_last.
        let (q, remainder) = r.divide(field, &r_last);
        r = remainder;
        t = q.multiply(field, &t_last).add_or_subtract(&t);
    }

    let sigma_tilde_at_zero = t.constant();
    if sigma_tilde_at_zero == 0 {
        return checksum_error("sigma tilde(0) was zero");
    }

    let inverse = field.inverse(sigma_tilde_at_zero);
    let sigma = t.multiply_scalar(field, inverse);
    let omega = r.multiply_scalar(field, inverse);
    Ok((sigma, omega))
}

/// Chien search: find the error locator's roots in the field and invert them.
fn find_error_locations(field: &'static GaloisField, sigma: &GfPoly) -> Result<Vec<u16>> {
    let num_errors = sigma.degree();
    if num_errors == 1 {
        return Ok(vec![sigma.coefficient(1)]);
    }
    let mut locations = Vec::with_capacity(num_errors);
    for i in 1..field.size() as u16 {
        if locations.len() >= num_errors {
            break;
        }
        if sigma.evaluate_at(field, i) == 0 {
            locations.push(field.inverse(i));
        }
    }
    if locations.len() != num_errors {
        return checksum_error("error locator degree does not match number of roots");
    }
    Ok(locations)
}

/// Forney's formula, with the extra x_i^-1 factor required when the generator base is non-zero.
fn find_error_magnitudes(
    field: &'static GaloisField,
    omega: &GfPoly,
    locations: &[u16],
) -> Vec<u16> {
    let mut magnitudes = Vec::with_capacity(locations.len());
    for (i, &location) in locations.iter().enumerate() {
        let xi_inverse = field.inverse(location);
        let mut denominator = 1;
        for (j, &other) in locations.iter().enumerate() {
            if i != j {
                denominator =
                    field.multiply(denominator, 1 ^ field.multiply(other, xi_inverse));
            }
        }
        let mut magnitude =
            field.multiply(omega.evaluate_at(field, xi_inverse), field.inverse(denominator));
        if field.generator_base() != 0 {
            magnitude = field.multiply(magnitude, xi_inverse);
        }
        magnitudes.push(magnitude);
    }
    magnitudes
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::ecc::{AZTEC_DATA_6, AZTEC_DATA_10, DATA_MATRIX_FIELD_256, QR_CODE_FIELD_256};

    fn encode_message(
        field: &'static GaloisField,
        data: &[u16],
        ec_count: usize,
    ) -> Vec<u16> {
        let mut message = data.to_vec();
        message.resize(data.len() + ec_count, 0);
        ReedSolomonEncoder::new(field).encode(&mut message, ec_count).unwrap();
        message
    }

    #[test]
    fn verify_qr_reference_block() {
        // Data codewords of the version 1-M "01234567" reference symbol from ISO/IEC 18004,
        // Annex I, and its ten error correction codewords.
        let data = [
            0x10, 0x20, 0x0c, 0x56, 0x61, 0x80, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11,
            0xec, 0x11,
        ];
        let expect_ec = [0xa5, 0x24, 0xd4, 0xc1, 0xed, 0x36, 0xc7, 0x87, 0x2c, 0x55];
        let message = encode_message(&QR_CODE_FIELD_256, &data, 10);
        assert_eq!(&message[16..], &expect_ec);
    }

    #[test]
    fn verify_zero_error_decode_is_identity() {
        let data: Vec<u16> = (0..32).map(|i| (i * 7 + 3) % 256).collect();
        let mut message = encode_message(&QR_CODE_FIELD_256, &data, 16);
        let pristine = message.clone();
        reed_solomon_decode(&QR_CODE_FIELD_256, &mut message, 16).unwrap();
        assert_eq!(message, pristine);
    }

    #[test]
    fn verify_corrects_up_to_capacity() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let cases: [(&'static GaloisField, u32); 4] = [
            (&QR_CODE_FIELD_256, 8),
            (&DATA_MATRIX_FIELD_256, 8),
            (&AZTEC_DATA_6, 6),
            (&AZTEC_DATA_10, 10),
        ];
        for (field, width) in cases {
            let mask = (1u16 << width) - 1;
            let data: Vec<u16> = (0..20).map(|_| rng.gen::<u16>() & mask).collect();
            let ec_count = 12;
            let encoded = encode_message(field, &data, ec_count);

            for errors in 1..=ec_count / 2 {
                let mut corrupted = encoded.clone();
                let mut positions = Vec::new();
                while positions.len() < errors {
                    let pos = rng.gen_range(0..corrupted.len());
                    if !positions.contains(&pos) {
                        positions.push(pos);
                        corrupted[pos] ^= (rng.gen::<u16>() & mask).max(1);
                    }
                }
                reed_solomon_decode(field, &mut corrupted, ec_count).unwrap();
                assert_eq!(&corrupted[..data.len()], &data[..]);
            }
        }
    }

    #[test]
    fn verify_rejects_beyond_capacity() {
        let data: Vec<u16> = (1..=16).collect();
        let mut message = encode_message(&QR_CODE_FIELD_256, &data, 8);
        // Corrupt 5 codewords, one past the 4-error capacity.
        for i in 0..5 {
            message[i * 3] ^= 0x55;
        }
        let mut failed = reed_solomon_decode(&QR_CODE_FIELD_256, &mut message, 8).is_err();
        if !failed {
            // A miscorrection must not silently return the original data.
            failed = message[..16] != *data.as_slice();
        }
        assert!(failed);
    }
}
