// quotelens-api: HTTP execution layer for the quotelens endpoint explorer.

pub mod error;
pub mod executor;
pub mod request;
pub mod transport;

pub use error::Error;
pub use executor::{ApiRequest, ApiResponse, HttpExecutor, ProbeReport, RetryPolicy};
pub use reqwest::Method;
pub use transport::TransportConfig;
