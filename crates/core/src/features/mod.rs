pub mod builder;
pub mod matrix;
pub mod provider;

pub use builder::FeatureMatrixBuilder;
pub use matrix::{FeatureMatrix, RawTable, RowId};
pub use provider::FeatureProvider;
