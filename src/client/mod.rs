//! HTTP access to the toncenter JSON-RPC API

pub mod base;
pub mod error;
pub mod toncenter_v2;

pub use base::{ClientParams, HttpClient, HttpRequest, HttpResponse, UreqClient};
pub use error::ProviderError;
pub use toncenter_v2::HttpProvider;
