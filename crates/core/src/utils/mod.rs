pub mod cancellation;
pub mod time_utils;

pub use cancellation::CancellationToken;
