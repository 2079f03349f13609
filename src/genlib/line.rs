//! One-dimensional kernels shared by the 2D and 1D raster engines.

use crate::foundation::number::Height;

/// Sliding-window box blur with window `2 * radius + 1`.
///
/// The window sum is carried in `i64` and updated incrementally. Samples outside the line
/// replicate the nearest edge sample.
pub(crate) fn blur_line(input: &[Height], radius: usize, output: &mut [Height]) {
    debug_assert_eq!(input.len(), output.len());
    let n = input.len();
    if n == 0 {
        return;
    }
    let last = (n - 1) as i64;
    let r = radius as i64;
    let sample = |i: i64| i64::from(input[i.clamp(0, last) as usize]);
    let window = 2 * r + 1;

    let mut sum: i64 = (-r..=r).map(sample).sum();
    for (x, out) in output.iter_mut().enumerate() {
        *out = (sum / window) as Height;
        let x = x as i64;
        sum += sample(x + r + 1) - sample(x - r);
    }
}

/// Lower-envelope squared distance transform of a sampled function.
///
/// `f` holds the squared distance seeds (0 at feature samples); `d` receives
/// `min_q((p - q)^2 + f[q])` for every `p`.
pub(crate) fn distance_transform_line(f: &[f64], d: &mut [f64]) {
    let n = f.len();
    debug_assert_eq!(n, d.len());
    if n == 0 {
        return;
    }
    let mut v = vec![0usize; n];
    let mut z = vec![0f64; n + 1];
    let mut k = 0usize;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    let intersection = |q: usize, p: usize| -> f64 {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    for q in 1..n {
        let mut s = intersection(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersection(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let delta = q as f64 - v[k] as f64;
        *out = delta * delta + f[v[k]];
    }
}

/// Catmull-Rom spline through `p1..p2` at `t` in [0, 1].
pub(crate) fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let a1 = -0.5 * p0 + 0.5 * p2;
    let a2 = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let a3 = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    p1 + t * (a1 + t * (a2 + t * a3))
}

/// Bicubic (tensor product Catmull-Rom) interpolation over a 4x4 neighborhood indexed
/// `[x][y]`.
pub(crate) fn bicubic(p: &[[f64; 4]; 4], tx: f64, ty: f64) -> f64 {
    let columns = p.map(|c| catmull_rom(c[0], c[1], c[2], c[3], ty));
    catmull_rom(columns[0], columns[1], columns[2], columns[3], tx)
}

#[cfg(test)]
#[path = "../../tests/unit/genlib/line.rs"]
mod tests;
