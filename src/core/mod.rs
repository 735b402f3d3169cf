pub mod aggregate;
pub mod etl;
pub mod pagination;
pub mod snapshot;

pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
