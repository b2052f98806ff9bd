// SnapTik resolver
//
// Drives the converter's page through a WebDriver session: submit the
// video's share URL, wait for the download anchor, read its href. The
// session is created lazily, reused across tasks and health-checked
// before each use; after a failed drive it is torn down so the next
// task starts from a fresh page.

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, warn};

use super::traits::LinkResolver;
use crate::errors::DownloadError;
use crate::models::VideoRecord;

const CONVERTER_URL: &str = "https://snaptik.app/";
const URL_INPUT: &str = "input[name='url']";
const SUBMIT_BUTTON: &str = "button[type='submit']";
const DOWNLOAD_LINK: &str = "a.download-file";

pub struct SnapTikResolver {
    webdriver_url: String,
    wait_timeout: Duration,
    session: Option<Client>,
}

impl SnapTikResolver {
    pub fn new(webdriver_url: &str, resolve_timeout_secs: u64) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            wait_timeout: Duration::from_secs(resolve_timeout_secs),
            session: None,
        }
    }

    async fn connect(&self) -> Result<Client, DownloadError> {
        let mut capabilities = Capabilities::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--disable-gpu",
                    "--no-sandbox",
                    "--disable-dev-shm-usage"
                ]
            }),
        );

        ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| DownloadError::DriverUnavailable(e.to_string()))
    }

    /// Live session, recreated when the previous one stopped answering
    async fn session(&mut self) -> Result<Client, DownloadError> {
        if let Some(client) = self.session.clone() {
            if client.current_url().await.is_ok() {
                return Ok(client);
            }
            warn!("converter session stopped answering, recreating");
            self.session = None;
            let _ = client.close().await;
        }
        let client = self.connect().await?;
        self.session = Some(client.clone());
        Ok(client)
    }

    async fn drive(&self, client: &Client, share_url: &str) -> Result<String, DownloadError> {
        let secs = self.wait_timeout.as_secs();

        client
            .goto(CONVERTER_URL)
            .await
            .map_err(|e| DownloadError::from(e.to_string()))?;

        let input = client
            .wait()
            .at_most(self.wait_timeout)
            .for_element(Locator::Css(URL_INPUT))
            .await
            .map_err(|_| DownloadError::ResolutionTimeout(secs))?;
        input
            .clear()
            .await
            .map_err(|e| DownloadError::from(e.to_string()))?;
        input
            .send_keys(share_url)
            .await
            .map_err(|e| DownloadError::from(e.to_string()))?;

        client
            .find(Locator::Css(SUBMIT_BUTTON))
            .await
            .map_err(|e| DownloadError::from(e.to_string()))?
            .click()
            .await
            .map_err(|e| DownloadError::from(e.to_string()))?;

        let link = client
            .wait()
            .at_most(self.wait_timeout)
            .for_element(Locator::Css(DOWNLOAD_LINK))
            .await
            .map_err(|_| DownloadError::ResolutionTimeout(secs))?;

        match link
            .attr("href")
            .await
            .map_err(|e| DownloadError::from(e.to_string()))?
        {
            Some(href) if !href.is_empty() => {
                debug!(url = %share_url, "converter produced a link");
                Ok(href)
            }
            _ => Err(DownloadError::ParseError(
                "download link carried no href".to_string(),
            )),
        }
    }
}

#[async_trait]
impl LinkResolver for SnapTikResolver {
    fn name(&self) -> &'static str {
        "snaptik"
    }

    async fn resolve(&mut self, record: &VideoRecord) -> Result<String, DownloadError> {
        let share_url = record.share_url();
        let client = self.session().await?;

        let outcome = self.drive(&client, &share_url).await;
        if outcome.is_err() {
            // A half-driven page is worthless; start the next task clean
            if let Some(dead) = self.session.take() {
                let _ = dead.close().await;
            }
        }
        outcome
    }

    async fn shutdown(&mut self) {
        if let Some(client) = self.session.take() {
            let _ = client.close().await;
        }
    }
}
