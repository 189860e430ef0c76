use crate::LARGE_PROBLEM_ELEMENTS;

/// Returns `true` when a problem must use the tiled encoding.
///
/// Counts the elements of `lhs` (`lhs_rows × lhs_cols`), `rhs` (`lhs_cols × rhs_cols`) and the
/// answer (`lhs_rows × rhs_cols`) in 128-bit arithmetic and compares the total against
/// [`LARGE_PROBLEM_ELEMENTS`]. The boundary itself is large.
#[inline]
pub fn is_large(lhs_rows: u32, lhs_cols: u32, rhs_cols: u32) -> bool {
    let (m, k, n) = (lhs_rows as u128, lhs_cols as u128, rhs_cols as u128);
    m * k + k * n + m * n >= LARGE_PROBLEM_ELEMENTS as u128
}
