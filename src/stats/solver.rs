//! Least-squares solvers
//!
//! Householder QR is the primary path and the rank check. The conjugate
//! gradient solver on the normal equations is an alternative for the
//! coefficient estimates only.

use crate::error::{Error, Result};

/// Relative tolerance on |R_kk| against the original column norm
pub const RANK_TOLERANCE: f64 = 1e-10;

/// Householder QR factorization of an n x p matrix without pivoting
#[derive(Debug, Clone)]
pub struct Qr {
    n: usize,
    // Householder vectors, v_k has length n - k
    reflectors: Vec<Vec<f64>>,
    // v_k . v_k
    reflector_norms: Vec<f64>,
    // Upper triangle, row-major p x p
    r: Vec<Vec<f64>>,
}

impl Qr {
    /// Factor the column-major matrix `columns`.
    ///
    /// Fails with the index of the first column that is numerically a linear
    /// combination of the columns before it.
    pub fn decompose(columns: &[Vec<f64>]) -> std::result::Result<Qr, usize> {
        let p = columns.len();
        let n = columns.first().map_or(0, Vec::len);
        let norms: Vec<f64> = columns
            .iter()
            .map(|c| c.iter().map(|v| v * v).sum::<f64>().sqrt())
            .collect();

        let mut a: Vec<Vec<f64>> = columns.to_vec();
        let mut reflectors = Vec::with_capacity(p);
        let mut reflector_norms = Vec::with_capacity(p);
        let mut r = vec![vec![0.0; p]; p];

        for k in 0..p {
            if k >= n {
                return Err(k);
            }
            let x = &a[k][k..];
            let alpha_abs = x.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norms[k] == 0.0 || alpha_abs <= RANK_TOLERANCE * norms[k] {
                return Err(k);
            }

            let alpha = if x[0] >= 0.0 { -alpha_abs } else { alpha_abs };
            let mut v = x.to_vec();
            v[0] -= alpha;
            let vnorm = v.iter().map(|e| e * e).sum::<f64>();

            for col in a.iter_mut().skip(k) {
                reflect(&v, vnorm, &mut col[k..]);
            }
            for (j, col) in a.iter().enumerate().skip(k) {
                r[k][j] = col[k];
            }
            r[k][k] = alpha;

            reflectors.push(v);
            reflector_norms.push(vnorm);
        }

        Ok(Qr {
            n,
            reflectors,
            reflector_norms,
            r,
        })
    }

    pub fn nrows(&self) -> usize {
        self.n
    }

    pub fn ncols(&self) -> usize {
        self.r.len()
    }

    pub fn r(&self) -> &[Vec<f64>] {
        &self.r
    }

    /// Qᵀy, the full-length effects vector
    pub fn qt_mul(&self, y: &[f64]) -> Vec<f64> {
        let mut out = y.to_vec();
        for (k, (v, vnorm)) in self.reflectors.iter().zip(&self.reflector_norms).enumerate() {
            reflect(v, *vnorm, &mut out[k..]);
        }
        out
    }

    /// Qz for a full-length z
    pub fn q_mul(&self, z: &[f64]) -> Vec<f64> {
        let mut out = z.to_vec();
        for (k, (v, vnorm)) in self
            .reflectors
            .iter()
            .zip(&self.reflector_norms)
            .enumerate()
            .rev()
        {
            reflect(v, *vnorm, &mut out[k..]);
        }
        out
    }

    /// Solve R b = rhs by back substitution (rhs has length p)
    pub fn solve_r(&self, rhs: &[f64]) -> Vec<f64> {
        let p = self.ncols();
        let mut b = vec![0.0; p];
        for i in (0..p).rev() {
            let tail: f64 = ((i + 1)..p).map(|j| self.r[i][j] * b[j]).sum();
            b[i] = (rhs[i] - tail) / self.r[i][i];
        }
        b
    }

    /// Least-squares coefficients for y
    pub fn solve(&self, y: &[f64]) -> Vec<f64> {
        let effects = self.qt_mul(y);
        self.solve_r(&effects[..self.ncols()])
    }

    /// Diagonal of (XᵀX)⁻¹ = R⁻¹R⁻ᵀ
    pub fn unscaled_variances(&self) -> Vec<f64> {
        let p = self.ncols();
        // Columns of R⁻¹ from R x = e_j
        let mut r_inv = vec![vec![0.0; p]; p];
        for j in 0..p {
            let mut e = vec![0.0; p];
            e[j] = 1.0;
            let col = self.solve_r(&e);
            for i in 0..p {
                r_inv[i][j] = col[i];
            }
        }
        r_inv
            .iter()
            .map(|row| row.iter().map(|v| v * v).sum())
            .collect()
    }

    /// Hat-matrix diagonal, the squared row norms of the thin Q
    pub fn leverage(&self) -> Vec<f64> {
        let mut h = vec![0.0; self.n];
        for k in 0..self.ncols() {
            let mut e = vec![0.0; self.n];
            e[k] = 1.0;
            for (hi, qi) in h.iter_mut().zip(self.q_mul(&e)) {
                *hi += qi * qi;
            }
        }
        h
    }
}

/// Apply the reflection I - 2vvᵀ/(vᵀv) to `x` in place
fn reflect(v: &[f64], vnorm: f64, x: &mut [f64]) {
    if vnorm == 0.0 {
        return;
    }
    let dot: f64 = v.iter().zip(x.iter()).map(|(a, b)| a * b).sum();
    let scale = 2.0 * dot / vnorm;
    for (xi, vi) in x.iter_mut().zip(v) {
        *xi -= scale * vi;
    }
}

/// Conjugate gradient on XᵀXb = Xᵀy.
///
/// Stops when the residual norm falls below `tolerance` relative to |Xᵀy|;
/// returns the coefficients and the iterations used.
pub fn conjugate_gradient(
    columns: &[Vec<f64>],
    y: &[f64],
    max_iterations: usize,
    tolerance: f64,
) -> Result<(Vec<f64>, usize)> {
    let p = columns.len();
    let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();

    let gram: Vec<Vec<f64>> = columns
        .iter()
        .map(|ci| columns.iter().map(|cj| dot(ci, cj)).collect())
        .collect();
    let rhs: Vec<f64> = columns.iter().map(|c| dot(c, y)).collect();
    let mul = |v: &[f64]| -> Vec<f64> { gram.iter().map(|row| dot(row, v)).collect() };

    let rhs_norm = dot(&rhs, &rhs).sqrt();
    let mut x = vec![0.0; p];
    if rhs_norm == 0.0 {
        return Ok((x, 0));
    }

    let mut r = rhs.clone();
    let mut d = r.clone();
    let mut rs_old = dot(&r, &r);
    for iteration in 1..=max_iterations {
        let ad = mul(&d);
        let curvature = dot(&d, &ad);
        if curvature <= 0.0 {
            break;
        }
        let alpha = rs_old / curvature;
        for i in 0..p {
            x[i] += alpha * d[i];
            r[i] -= alpha * ad[i];
        }
        let rs_new = dot(&r, &r);
        if rs_new.sqrt() <= tolerance * rhs_norm {
            return Ok((x, iteration));
        }
        let beta = rs_new / rs_old;
        for i in 0..p {
            d[i] = r[i] + beta * d[i];
        }
        rs_old = rs_new;
    }

    Err(Error::NotConverged {
        iterations: max_iterations,
    })
}
