//! Encoders producing problem files readable by [`Reader`](crate::Reader).
//!
//! The checked writers refuse to produce a file whose encoding would not match what a
//! reader infers from the header. The `_unchecked` variants skip that test.

use std::io::Write;

use ndarray::ArrayView2;

use crate::element::Element;
use crate::error::{validation_error, Result};
use crate::header::ProblemHeader;
use crate::tile::TiledMatrix;

/// Writes a dense problem. Fails if the dimensions classify as large.
pub fn write_dense<E: Element, W: Write>(
    out: &mut W,
    lhs: ArrayView2<E>,
    rhs: ArrayView2<E>,
    answer: ArrayView2<E>,
) -> Result<()> {
    let header = ProblemHeader::from_shapes(lhs.dim(), rhs.dim(), answer.dim())?;
    if header.is_large() {
        return Err(validation_error(format!(
            "{}x{}x{} is a large problem and must be tiled",
            header.lhs_rows, header.lhs_cols, header.rhs_cols
        )));
    }
    write_dense_unchecked(out, lhs, rhs, answer)
}

pub fn write_dense_unchecked<E: Element, W: Write>(
    out: &mut W,
    lhs: ArrayView2<E>,
    rhs: ArrayView2<E>,
    answer: ArrayView2<E>,
) -> Result<()> {
    let header = ProblemHeader::from_shapes(lhs.dim(), rhs.dim(), answer.dim())?;

    let mut bytes = Vec::new();
    header.extend_le(&mut bytes);
    out.write_all(&bytes)?;

    for matrix in [lhs.view(), rhs.view(), answer.view()] {
        bytes.clear();
        bytes.reserve(matrix.len() * E::BYTES);
        // `iter` visits elements in logical row-major order whatever the memory layout.
        for &value in matrix.iter() {
            value.extend_le(&mut bytes);
        }
        out.write_all(&bytes)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes a tiled problem. Fails if the dimensions do not classify as large.
pub fn write_tiled<E: Element, W: Write>(
    out: &mut W,
    lhs: &TiledMatrix<E>,
    rhs: &TiledMatrix<E>,
    answer: &TiledMatrix<E>,
) -> Result<()> {
    let header = tiled_header(lhs, rhs, answer)?;
    if !header.is_large() {
        return Err(validation_error(format!(
            "{}x{}x{} is not a large problem and must be dense",
            header.lhs_rows, header.lhs_cols, header.rhs_cols
        )));
    }
    write_tiled_unchecked(out, lhs, rhs, answer)
}

pub fn write_tiled_unchecked<E: Element, W: Write>(
    out: &mut W,
    lhs: &TiledMatrix<E>,
    rhs: &TiledMatrix<E>,
    answer: &TiledMatrix<E>,
) -> Result<()> {
    let header = tiled_header(lhs, rhs, answer)?;

    let mut bytes = Vec::new();
    header.extend_le(&mut bytes);
    for matrix in [lhs, rhs, answer] {
        matrix.extend_le(&mut bytes);
    }
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

fn tiled_header<E: Element>(
    lhs: &TiledMatrix<E>,
    rhs: &TiledMatrix<E>,
    answer: &TiledMatrix<E>,
) -> Result<ProblemHeader> {
    let shape = |m: &TiledMatrix<E>| (m.rows() as usize, m.cols() as usize);
    ProblemHeader::from_shapes(shape(lhs), shape(rhs), shape(answer))
}
