//! Small dense linear algebra for the least-squares solver.
//!
//! Gaussian elimination with partial pivoting on fixed-size systems; the
//! normal equations of the histogram fits have at most 8 unknowns.

/// Pivots with magnitude below this are treated as singular.
const PIVOT_EPSILON: f64 = 1e-300;

/// Solve the NxN system `a * x = b`.
///
/// Returns `None` if the matrix is singular (pivot too small or not finite).
#[allow(clippy::needless_range_loop)]
pub fn solve<const N: usize>(a: &[[f64; N]; N], b: &[f64; N]) -> Option<[f64; N]> {
    let mut matrix = *a;
    let mut rhs = *b;

    // Forward elimination with partial pivoting
    for col in 0..N {
        let mut max_row = col;
        let mut max_val = matrix[col][col].abs();
        for row in (col + 1)..N {
            if matrix[row][col].abs() > max_val {
                max_val = matrix[row][col].abs();
                max_row = row;
            }
        }

        if !max_val.is_finite() || max_val < PIVOT_EPSILON {
            return None;
        }

        if max_row != col {
            matrix.swap(col, max_row);
            rhs.swap(col, max_row);
        }

        for row in (col + 1)..N {
            let factor = matrix[row][col] / matrix[col][col];
            let pivot_row = matrix[col];
            for (j, m) in matrix[row].iter_mut().enumerate().skip(col) {
                *m -= factor * pivot_row[j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution
    let mut x = [0.0f64; N];
    for i in (0..N).rev() {
        let mut sum = rhs[i];
        for (j, &xj) in x.iter().enumerate().skip(i + 1) {
            sum -= matrix[i][j] * xj;
        }
        x[i] = sum / matrix[i][i];
    }

    Some(x)
}

/// Invert an NxN matrix column by column.
#[allow(clippy::needless_range_loop)]
pub fn invert<const N: usize>(a: &[[f64; N]; N]) -> Option<[[f64; N]; N]> {
    let mut inverse = [[0.0f64; N]; N];
    for col in 0..N {
        let mut unit = [0.0f64; N];
        unit[col] = 1.0;
        let column = solve(a, &unit)?;
        for row in 0..N {
            inverse[row][col] = column[row];
        }
    }
    Some(inverse)
}
