use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{BackendError, ResultBackend};
use crate::session::result::{ResultSubmission, SubmissionReceipt};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: &str) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ResultBackend for HttpBackend {
    async fn submit(&self, submission: &ResultSubmission) -> Result<SubmissionReceipt, BackendError> {
        let response = self.client.post(&self.endpoint).json(submission).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        Ok(response.json::<SubmissionReceipt>().await?)
    }
}
