pub mod classifier;
pub mod decision;

pub use decision::{apply_observation, Decision};
