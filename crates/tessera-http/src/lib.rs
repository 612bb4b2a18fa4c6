//! # Tessera HTTP
//!
//! HTTP plumbing for the Tessera SDK.
//!
//! This crate owns everything between a resource-data request and the
//! network: ordered query strings with a canonical (signing) rendering,
//! wire request/response value types, the injectable transport capability,
//! backoff strategies, and the retrying request executor.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_http::{ExecutorConfig, ReqwestTransport, RequestExecutor};
//!
//! let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30))?);
//! let executor = RequestExecutor::new(transport, &ExecutorConfig::default());
//! let response = executor.execute(&request, &cancel).await?;
//! ```

pub mod auth;
pub mod backoff;
pub mod executor;
pub mod message;
pub mod query;
pub mod transport;

// Re-exports
pub use auth::{ApiKeyCredentials, BasicRequestAuthenticator, NoopAuthenticator, RequestAuthenticator};
pub use backoff::{BackoffStrategy, DefaultBackoffStrategy, ThrottlingBackoffStrategy};
pub use executor::{ExecutorConfig, RequestExecutor};
pub use message::{Headers, HttpMethod, HttpRequest, HttpResponse};
pub use query::{CanonicalUri, QueryString};
pub use transport::{HttpTransport, ReqwestTransport};
