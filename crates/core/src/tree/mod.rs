//! Flat listing to nested tree assembly.

pub mod assembler;
pub mod filter;

#[cfg(test)]
mod props;

pub use assembler::{AssembledTree, TreeAssembler, TreeItem, TreeNode};
pub use filter::retain_matches;
