pub mod catalog;
pub mod reference;
pub mod schemas;

pub use catalog::{get, list, FundDefinition};
