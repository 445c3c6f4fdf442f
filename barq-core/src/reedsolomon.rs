// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reed-Solomon error correction over the Galois fields used by the 2D symbologies: binary
//! extension fields GF(2^n) for QR/Micro QR/RMQR, Data Matrix and Aztec, and the prime field
//! GF(929) used by PDF417. Every decoder below implements the Berlekamp-Massey + Chien search +
//! Forney algorithm, operating on codewords in transmission order (highest-degree coefficient
//! first).

use crate::errors::{checksum_error, Result};

/// A binary extension field GF(2^bits) defined by a primitive polynomial, with precomputed
/// log/antilog tables for fast multiply/divide.
#[derive(Debug, Clone)]
pub struct GfBinary {
    bits: u32,
    size: usize,
    exp: Vec<u16>,
    log: Vec<u16>,
}

impl GfBinary {
    /// Build the field of `2^bits` elements with the given primitive polynomial (e.g. `0x11D` for
    /// the QR/MaxiCode GF(256), `0x12D` for Data Matrix's GF(256)).
    pub fn new(bits: u32, primitive: u32) -> Self {
        let size = 1usize << bits;
        let mut exp = vec![0u16; size * 2];
        let mut log = vec![0u16; size];
        let mut x = 1u32;
        for i in 0..size - 1 {
            exp[i] = x as u16;
            log[x as usize] = i as u16;
            x <<= 1;
            if x & size as u32 != 0 {
                x ^= primitive;
            }
        }
        for i in size - 1..size * 2 {
            exp[i] = exp[i - (size - 1)];
        }
        GfBinary { bits, size, exp, log }
    }

    #[inline]
    pub fn add(&self, a: u16, b: u16) -> u16 {
        a ^ b
    }

    #[inline]
    pub fn mul(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }

    #[inline]
    pub fn inverse(&self, a: u16) -> u16 {
        debug_assert!(a != 0);
        self.exp[(self.size - 1) - self.log[a as usize] as usize]
    }

    #[inline]
    pub fn div(&self, a: u16, b: u16) -> u16 {
        if a == 0 {
            return 0;
        }
        self.mul(a, self.inverse(b))
    }

    #[inline]
    pub fn exp(&self, e: i32) -> u16 {
        let m = self.size as i32 - 1;
        self.exp[((e % m + m) % m) as usize]
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }
}

/// Evaluate a polynomial (highest-degree coefficient first) at field element `x`, via Horner's
/// method.
fn poly_eval(field: &GfBinary, poly: &[u16], x: u16) -> u16 {
    let mut result = 0u16;
    for &c in poly {
        result = field.mul(result, x) ^ c;
    }
    result
}

fn poly_mul(field: &GfBinary, a: &[u16], b: &[u16]) -> Vec<u16> {
    let mut out = vec![0u16; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] ^= field.mul(ai, bj);
        }
    }
    out
}

/// Decode `codewords` (transmission order, `num_ecc` trailing error-correction words) in place,
/// correcting up to `num_ecc / 2` errors. `first_consecutive_root` and `root_step` identify which
/// powers of the generator's primitive element the ECC polynomial's roots are
/// (`alpha^(first_consecutive_root + i*root_step)` for `i in 0..num_ecc`); this is `0, 1` for
/// QR/Data Matrix/Aztec/MaxiCode.
///
/// Returns the number of errors corrected, or a checksum error if the syndromes indicate more
/// errors than `num_ecc` can correct (uncorrectable).
pub fn decode_binary(
    field: &GfBinary,
    codewords: &mut [u16],
    num_ecc: usize,
    first_consecutive_root: i32,
    root_step: i32,
) -> Result<usize> {
    if num_ecc == 0 {
        return Ok(0);
    }

    let mut syndromes = vec![0u16; num_ecc];
    let mut has_error = false;
    for (i, syndrome) in syndromes.iter_mut().enumerate() {
        let root = field.exp(first_consecutive_root + i as i32 * root_step);
        *syndrome = poly_eval(field, codewords, root);
        if *syndrome != 0 {
            has_error = true;
        }
    }
    if !has_error {
        return Ok(0);
    }

    let (error_locator, error_evaluator) = berlekamp_massey(field, &syndromes)?;
    let error_positions = chien_search(field, &error_locator, codewords.len())?;
    forney_correct(
        field,
        codewords,
        &error_positions,
        &error_locator,
        &error_evaluator,
        first_consecutive_root,
        root_step,
    )?;
    Ok(error_positions.len())
}

/// Berlekamp-Massey over GF(2^n): derive the error locator polynomial `sigma` and the error
/// evaluator polynomial `omega = (sigma * syndromes) mod x^num_ecc`, both in ascending-degree
/// coefficient order (`sigma[0] == 1`).
fn berlekamp_massey(field: &GfBinary, syndromes: &[u16]) -> Result<(Vec<u16>, Vec<u16>)> {
    let mut sigma = vec![1u16];
    let mut prev_sigma = vec![1u16];
    let mut error_locator_degree = 0usize;
    let mut m = 1usize;
    let mut b = 1u16;

    for n in 0..syndromes.len() {
        let mut delta = syndromes[n];
        for i in 1..=error_locator_degree {
            delta ^= field.mul(sigma[i], syndromes[n - i]);
        }

        if delta == 0 {
            m += 1;
        }
        else if 2 * error_locator_degree <= n {
            let t = sigma.clone();
            let coeff = field.div(delta, b);
            let shifted = shift_and_scale(field, &prev_sigma, coeff, m);
            sigma = poly_xor(&sigma, &shifted);
            error_locator_degree = n + 1 - error_locator_degree;
            prev_sigma = t;
            b = delta;
            m = 1;
        }
        else {
            let coeff = field.div(delta, b);
            let shifted = shift_and_scale(field, &prev_sigma, coeff, m);
            sigma = poly_xor(&sigma, &shifted);
            m += 1;
        }
    }

    if error_locator_degree * 2 > syndromes.len() {
        return checksum_error("reed-solomon: too many errors to correct");
    }

    sigma.truncate(error_locator_degree + 1);
    // omega = (sigma * S(x)) mod x^num_ecc. Polynomial convolution doesn't care about coefficient
    // order, so `poly_mul` on the ascending-order operands yields ascending-order output directly;
    // truncating to the low-order terms is exactly the `mod x^num_ecc` reduction.
    let mut omega = poly_mul(field, &sigma, syndromes);
    omega.truncate(syndromes.len());
    Ok((sigma, omega))
}

fn poly_xor(a: &[u16], b: &[u16]) -> Vec<u16> {
    let len = a.len().max(b.len());
    let mut out = vec![0u16; len];
    for (i, &v) in a.iter().enumerate() {
        out[i] ^= v;
    }
    for (i, &v) in b.iter().enumerate() {
        out[i] ^= v;
    }
    out
}

fn shift_and_scale(field: &GfBinary, poly: &[u16], coeff: u16, shift: usize) -> Vec<u16> {
    let mut out = vec![0u16; poly.len() + shift];
    for (i, &c) in poly.iter().enumerate() {
        out[i + shift] = field.mul(c, coeff);
    }
    out
}

/// Chien search: find the roots of `sigma` by brute-force evaluation at every nonzero field
/// element, returning codeword error *positions* (index from the start of the codeword, matching
/// `decode_binary`'s `codewords` ordering).
fn chien_search(field: &GfBinary, sigma: &[u16], codeword_len: usize) -> Result<Vec<usize>> {
    let degree = sigma.len() - 1;
    let mut positions = Vec::with_capacity(degree);
    for i in 0..codeword_len {
        // sigma's ascending-order coefficients are evaluated at alpha^{-i}; a root there means
        // position i (counting from the end of the codeword) is in error.
        let x_inv = field.exp(-(i as i32));
        let mut value = 0u16;
        let mut xp = 1u16;
        for &c in sigma.iter() {
            value ^= field.mul(c, xp);
            xp = field.mul(xp, x_inv);
        }
        if value == 0 {
            positions.push(codeword_len - 1 - i);
        }
    }
    if positions.len() != degree {
        return checksum_error("reed-solomon: chien search found wrong number of roots");
    }
    Ok(positions)
}

/// Forney's algorithm: compute each error's magnitude from the error evaluator polynomial and the
/// locator's formal derivative, then XOR the correction into `codewords`.
fn forney_correct(
    field: &GfBinary,
    codewords: &mut [u16],
    error_positions: &[usize],
    sigma: &[u16],
    omega: &[u16],
    first_consecutive_root: i32,
    root_step: i32,
) -> Result<()> {
    let len = codewords.len();
    for &pos in error_positions {
        let i = len - 1 - pos;
        let x_inv = field.exp(-(i as i32));

        let mut omega_val = 0u16;
        let mut xp = 1u16;
        for &c in omega {
            omega_val ^= field.mul(c, xp);
            xp = field.mul(xp, x_inv);
        }

        // Formal derivative of sigma: drop even-indexed (ascending order) terms, halve the
        // remaining degrees; over GF(2^n) this keeps only the odd-power terms.
        let mut sigma_prime_val = 0u16;
        let mut xp = 1u16;
        for (j, &c) in sigma.iter().enumerate() {
            if j % 2 == 1 {
                sigma_prime_val ^= field.mul(c, xp);
            }
            if j % 2 == 1 {
                xp = field.mul(xp, field.mul(x_inv, x_inv));
            }
        }

        if sigma_prime_val == 0 {
            return checksum_error("reed-solomon: zero derivative in forney correction");
        }

        // X_i is the error locator root's inverse, alpha^i; the standard Forney formula weights
        // the correction by X_i^(1 - first_consecutive_root) when the ECC roots are consecutive
        // powers with step `root_step` (every caller here uses root_step == 1).
        debug_assert_eq!(root_step, 1);
        let magnitude = field.mul(omega_val, field.inverse(sigma_prime_val));
        let magnitude = field.mul(magnitude, field.exp((i as i32) * (1 - first_consecutive_root)));
        codewords[pos] ^= magnitude;
    }
    Ok(())
}

/// GF(929) Reed-Solomon decoder used by PDF417, whose codewords are 10-bit values reduced modulo
/// the prime 929 rather than a binary extension field.
pub mod gf929 {
    use crate::errors::{checksum_error, Result};

    const MODULUS: i64 = 929;

    fn add(a: i64, b: i64) -> i64 {
        (a + b).rem_euclid(MODULUS)
    }
    fn mul(a: i64, b: i64) -> i64 {
        (a * b).rem_euclid(MODULUS)
    }
    pub(crate) fn inverse(a: i64) -> i64 {
        // MODULUS is prime; Fermat's little theorem: a^(p-2) mod p.
        pow_mod(a, MODULUS - 2)
    }
    fn pow_mod(mut base: i64, mut exp: i64) -> i64 {
        let mut result = 1i64;
        base = base.rem_euclid(MODULUS);
        while exp > 0 {
            if exp & 1 == 1 {
                result = mul(result, base);
            }
            base = mul(base, base);
            exp >>= 1;
        }
        result
    }

    /// Decode `codewords` (ascending index = lowest-order term, matching PDF417's ECC codeword
    /// layout) in place, correcting up to `num_ecc / 2` errors.
    pub fn decode(codewords: &mut [i64], num_ecc: usize) -> Result<usize> {
        if num_ecc == 0 {
            return Ok(0);
        }
        let mut syndromes = vec![0i64; num_ecc];
        let mut has_error = false;
        for (i, s) in syndromes.iter_mut().enumerate() {
            let root = pow_mod(3, i as i64); // 3 is a generator used by PDF417's ECC spec.
            let mut value = 0i64;
            for &c in codewords.iter() {
                value = add(mul(value, root), c);
            }
            *s = value;
            if value != 0 {
                has_error = true;
            }
        }
        if !has_error {
            return Ok(0);
        }

        let (sigma, omega) = berlekamp_massey_gf929(&syndromes)?;
        let degree = sigma.len() - 1;
        let mut positions = Vec::with_capacity(degree);
        let n = codewords.len();
        for i in 0..n {
            let x_inv = inverse(pow_mod(3, i as i64));
            let mut value = 0i64;
            let mut xp = 1i64;
            for &c in &sigma {
                value = add(value, mul(c, xp));
                xp = mul(xp, x_inv);
            }
            if value == 0 {
                positions.push(n - 1 - i);
            }
        }
        if positions.len() != degree {
            return checksum_error("pdf417 reed-solomon: chien search found wrong number of roots");
        }

        for &pos in &positions {
            let i = n - 1 - pos;
            let x_inv = inverse(pow_mod(3, i as i64));
            let mut omega_val = 0i64;
            let mut xp = 1i64;
            for &c in &omega {
                omega_val = add(omega_val, mul(c, xp));
                xp = mul(xp, x_inv);
            }
            let mut sigma_prime = 0i64;
            let mut xp = 1i64;
            for (j, &c) in sigma.iter().enumerate() {
                if j % 2 == 1 {
                    sigma_prime = add(sigma_prime, mul(c, xp));
                    xp = mul(xp, mul(x_inv, x_inv));
                }
            }
            if sigma_prime == 0 {
                return checksum_error("pdf417 reed-solomon: zero derivative in forney correction");
            }
            let magnitude = mul(omega_val, inverse(sigma_prime));
            let x = pow_mod(3, i as i64);
            let correction = mul(magnitude, inverse(x));
            codewords[pos] = (codewords[pos] - correction).rem_euclid(MODULUS);
        }

        Ok(positions.len())
    }

    fn berlekamp_massey_gf929(syndromes: &[i64]) -> Result<(Vec<i64>, Vec<i64>)> {
        let mut sigma = vec![1i64];
        let mut prev_sigma = vec![1i64];
        let mut l = 0usize;
        let mut m = 1usize;
        let mut b = 1i64;

        for n in 0..syndromes.len() {
            let mut delta = syndromes[n];
            for i in 1..=l {
                delta = add(delta, mul(sigma[i], syndromes[n - i]));
            }
            if delta == 0 {
                m += 1;
            }
            else if 2 * l <= n {
                let t = sigma.clone();
                let coeff = mul(delta, inverse(b));
                let shifted = shift_scale(&prev_sigma, coeff, m);
                sigma = xor_like_add(&sigma, &shifted);
                l = n + 1 - l;
                prev_sigma = t;
                b = delta;
                m = 1;
            }
            else {
                let coeff = mul(delta, inverse(b));
                let shifted = shift_scale(&prev_sigma, coeff, m);
                sigma = xor_like_add(&sigma, &shifted);
                m += 1;
            }
        }

        if l * 2 > syndromes.len() {
            return checksum_error("pdf417 reed-solomon: too many errors to correct");
        }
        sigma.truncate(l + 1);

        let mut sigma_desc = sigma.clone();
        sigma_desc.reverse();
        let mut synd_desc = syndromes.to_vec();
        synd_desc.reverse();
        let mut product = vec![0i64; sigma_desc.len() + synd_desc.len() - 1];
        for (i, &a) in sigma_desc.iter().enumerate() {
            for (j, &bb) in synd_desc.iter().enumerate() {
                product[i + j] = add(product[i + j], mul(a, bb));
            }
        }
        product.reverse();
        let mut omega = product;
        omega.truncate(l.max(1));
        Ok((sigma, omega))
    }

    fn shift_scale(poly: &[i64], coeff: i64, shift: usize) -> Vec<i64> {
        let mut out = vec![0i64; poly.len() + shift];
        for (i, &c) in poly.iter().enumerate() {
            out[i + shift] = mul(c, coeff);
        }
        out
    }

    fn xor_like_add(a: &[i64], b: &[i64]) -> Vec<i64> {
        let len = a.len().max(b.len());
        let mut out = vec![0i64; len];
        for (i, &v) in a.iter().enumerate() {
            out[i] = add(out[i], v);
        }
        for (i, &v) in b.iter().enumerate() {
            out[i] = add(out[i], v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qr_field() -> GfBinary {
        GfBinary::new(8, 0x11D)
    }

    #[test]
    fn gf_multiplication_is_consistent_with_inverse() {
        let field = qr_field();
        for a in 1..256u16 {
            let inv = field.inverse(a);
            assert_eq!(field.mul(a, inv), 1);
        }
    }

    #[test]
    fn decode_corrects_single_substitution_error() {
        let field = qr_field();
        // Build a systematic codeword: 2 data words + 4 ECC words, encode by polynomial division
        // against the generator with roots alpha^0..alpha^3.
        let data = [0x10u16, 0x20];
        let num_ecc = 4;
        let mut generator = vec![1u16];
        for i in 0..num_ecc {
            generator = poly_mul(&field, &generator, &[1, field.exp(i as i32)]);
        }
        // message polynomial shifted by num_ecc, descending order: data followed by zeros.
        let mut msg = data.to_vec();
        msg.extend(std::iter::repeat(0u16).take(num_ecc));
        let remainder = poly_mod(&field, &msg, &generator);
        let mut codeword: Vec<u16> = data.to_vec();
        codeword.extend(remainder);
        assert_eq!(codeword.len(), 6);

        let mut corrupted = codeword.clone();
        corrupted[1] ^= 0x55;

        let corrected = decode_binary(&field, &mut corrupted, num_ecc, 0, 1).unwrap();
        assert_eq!(corrected, 1);
        assert_eq!(corrupted, codeword);
    }

    fn poly_mod(field: &GfBinary, msg: &[u16], generator: &[u16]) -> Vec<u16> {
        let mut remainder = msg.to_vec();
        for i in 0..msg.len() - generator.len() + 1 {
            let coeff = remainder[i];
            if coeff == 0 {
                continue;
            }
            for (j, &g) in generator.iter().enumerate() {
                remainder[i + j] ^= field.mul(g, coeff);
            }
        }
        remainder[remainder.len() - (generator.len() - 1)..].to_vec()
    }

    #[test]
    fn decode_reports_no_errors_when_clean() {
        let field = qr_field();
        let mut codeword = vec![1u16, 2, 3, 0, 0, 0];
        // already has zero syndromes only if consistent; just check the no-error fast path with
        // an all-matching trivial case: zero ecc request always returns 0 without touching data.
        let corrected = decode_binary(&field, &mut codeword, 0, 0, 1).unwrap();
        assert_eq!(corrected, 0);
    }

    #[test]
    fn gf929_inverse_roundtrip() {
        for a in 1..20i64 {
            let inv = gf929::inverse(a);
            assert_eq!((a * inv).rem_euclid(929), 1);
        }
    }
}
