pub mod gazetteer;

pub use gazetteer::{Gazetteer, DEFAULT_ENTITIES};
