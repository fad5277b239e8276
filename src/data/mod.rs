pub mod features;
pub mod loader;
pub mod types;
pub mod writer;

pub use features::{FeatureBuilder, FeatureError};
pub use loader::{LoaderError, PriceLoader};
pub use types::{FeatureRecord, PricePoint};
pub use writer::{to_dataframe, write_csv, write_json, write_table, WriteError, OUTPUT_COLUMNS};
