//! Test suites API.

use crate::client::VigilClient;
use crate::error::Result;
use crate::types::{RunTestSuiteRequest, TestSuiteRunResult};

/// Test suites API client.
pub struct TestSuitesApi {
    client: VigilClient,
}

impl TestSuitesApi {
    pub(crate) fn new(client: VigilClient) -> Self {
        Self { client }
    }

    /// Run one test suite and wait for its result.
    pub async fn run(
        &self,
        namespace: &str,
        id: &str,
        request: &RunTestSuiteRequest,
    ) -> Result<TestSuiteRunResult> {
        self.client
            .post(&format!("tests/{}/{}/run", namespace, id), request)
            .await
    }
}
