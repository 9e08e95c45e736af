//! Block scoring and the orchestrating ELO pipeline.

mod blocks;
mod elo;

pub use blocks::BlockCalculator;
pub use elo::EloCalculator;
