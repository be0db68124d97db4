//! Result backends: where finished battles are reported.
//!
//! The engine only relies on an async request/response contract that may
//! fail. `JsonStore` implements it locally; `HttpBackend` (feature `network`)
//! posts to a ranking service.

mod error;
#[cfg(feature = "network")]
pub mod http;

use async_trait::async_trait;

pub use error::BackendError;
#[cfg(feature = "network")]
pub use http::HttpBackend;

use crate::session::result::{ResultSubmission, SubmissionReceipt};

#[async_trait]
pub trait ResultBackend: Send + Sync {
    async fn submit(&self, submission: &ResultSubmission) -> Result<SubmissionReceipt, BackendError>;
}

#[async_trait]
impl<T: ResultBackend + ?Sized> ResultBackend for Box<T> {
    async fn submit(&self, submission: &ResultSubmission) -> Result<SubmissionReceipt, BackendError> {
        (**self).submit(submission).await
    }
}
