//! Matrix-multiplication benchmark problems: decoding and result verification.
//!
//! A problem file holds two operands and the reference product. Small problems are stored
//! densely; problems with at least [`LARGE_PROBLEM_ELEMENTS`] elements across `lhs`, `rhs`
//! and the answer are stored as periodic tiles (see [`tile`]) so neither the file nor the
//! scorer ever holds a dense copy of the answer.
//!
//! ```text
//! u32 lhs_rows, u32 lhs_cols, u32 rhs_cols       (little-endian)
//! dense:  lhs[lhs_rows][lhs_cols]  rhs[lhs_cols][rhs_cols]  answer[lhs_rows][rhs_cols]
//! tiled:  lhs tiles  rhs tiles  answer tiles
//! ```
//!
//! [`Reader`] decodes the operands into caller buffers and returns a [`Score`] for a
//! computed product under the tolerance model in [`tolerance`].

pub mod codec;
pub mod element;
pub mod error;
pub mod header;
pub mod reader;
pub mod select;
pub mod size;
pub mod tile;
pub mod tolerance;
pub mod writer;

pub use codec::Encoding;
pub use element::Element;
pub use error::{ProblemError, Result};
pub use header::ProblemHeader;
pub use reader::Reader;
pub use select::{RandomSelector, Selector};
pub use size::is_large;
pub use tile::{TileDescriptor, TiledMatrix};
pub use tolerance::{Score, Standards, Violation};

/// Bytes taken by the header (`lhs_rows`, `lhs_cols`, `rhs_cols`).
pub const HEADER_BYTES: u64 = 12;

/// Bytes taken by a tile descriptor (`repeat_rows`, `repeat_cols`, `pad_rows`, `pad_cols`).
pub const TILE_DESCRIPTOR_BYTES: u64 = 16;

/// Problems with at least this many elements in total use the tiled encoding.
pub const LARGE_PROBLEM_ELEMENTS: u64 = 3 * (1 << 22);
