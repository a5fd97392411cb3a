pub mod catalog;
pub mod settings;

pub use catalog::Catalog;
pub use settings::{Api, Logger, Settings, Simulation};
