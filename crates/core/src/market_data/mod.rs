pub mod market_data_model;
pub mod market_data_traits;

pub use market_data_model::*;
pub use market_data_traits::*;
