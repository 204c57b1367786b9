pub mod classifier;
pub mod collector;
pub mod datetime;
pub mod enrichment;
pub mod etl;
pub mod pipeline;
pub mod summary;
pub mod titles;

pub use crate::domain::model::{Collection, Digest};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
