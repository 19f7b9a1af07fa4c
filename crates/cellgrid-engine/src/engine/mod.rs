//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellInput`] - Cell state and text classification
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`Operator`] - The binary operator catalog
//! - [`to_postfix`], [`ExpressionTree`] - Shunting-yard parsing into trees
//! - [`format_number`] - Format formula results for display

mod cell;
mod cell_ref;
mod format;
mod operator;
mod parse;
mod tree;

pub use cell::{CELL_ERROR, CIRCULAR_REFERENCE_ERROR, Cell, CellInput, DEFAULT_BACKGROUND};
pub use cell_ref::{CellRef, column_int_to_letter, column_letter_to_int};
pub use format::{format_number, parse_number};
pub use operator::{Associativity, Operator};
pub use parse::{ParseError, Token, build_tree, to_postfix, tokenize};
pub use tree::{Bindings, ExpressionTree, Node};
