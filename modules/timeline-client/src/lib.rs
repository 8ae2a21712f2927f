pub mod error;
pub mod types;

pub use error::{Result, TimelineError};
pub use types::{ApiResponse, PostAuthor, RunData, ScrapeInput, TimelinePost};

use serde::de::DeserializeOwned;

const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for the timeline post scraper.
const TIMELINE_SCRAPER: &str = "61RPP7dywgiy0JPD0";

pub struct TimelineClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl TimelineClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Start a timeline scrape run. Returns immediately with run metadata.
    pub async fn start_scrape(&self, handle: &str, max_items: u32) -> Result<RunData> {
        let input = ScrapeInput {
            handles: vec![handle.to_string()],
            max_items,
        };

        let url = format!("{}/acts/{}/runs", self.base_url, TIMELINE_SCRAPER);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TimelineError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Poll until a run completes. Uses `waitForFinish=60` for efficient long-polling.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        loop {
            let url = format!("{}/actor-runs/{}?waitForFinish=60", self.base_url, run_id);
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(TimelineError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let api_resp: ApiResponse<RunData> = resp.json().await?;
            match api_resp.data.status.as_str() {
                "SUCCEEDED" => return Ok(api_resp.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(TimelineError::RunFailed(api_resp.data.status));
                }
                _ => {
                    tracing::debug!(run_id, status = %api_resp.data.status, "Run still in progress");
                    continue;
                }
            }
        }
    }

    /// Fetch dataset items from a completed run.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!(
            "{}/datasets/{}/items?format=json",
            self.base_url, dataset_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TimelineError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let items: Vec<T> = resp.json().await?;
        Ok(items)
    }

    /// Scrape recent timeline posts end-to-end: start run, poll, fetch results.
    pub async fn scrape_posts(&self, handle: &str, max_items: u32) -> Result<Vec<TimelinePost>> {
        tracing::info!(handle, max_items, "Starting timeline scrape");

        let run = self.start_scrape(handle, max_items).await?;
        tracing::info!(run_id = %run.id, "Scrape run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            dataset_id = %completed.default_dataset_id,
            "Run completed, fetching results"
        );

        let posts: Vec<TimelinePost> = self
            .get_dataset_items(&completed.default_dataset_id)
            .await?;
        tracing::info!(count = posts.len(), "Fetched timeline posts");

        Ok(posts)
    }
}
