//! XKCD comic lookups.

use crate::error::FetchError;
use crate::http::{build_client, check_status};
use chrono::NaiveDate;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comic {
    pub num: u32,
    pub title: String,
    #[serde(default)]
    pub safe_title: String,
    pub alt: String,
    pub img: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub transcript: String,
    pub year: String,
    pub month: String,
    pub day: String,
}

impl Comic {
    pub fn url(&self) -> String {
        format!("https://xkcd.com/{}", self.num)
    }

    pub fn explain_url(&self) -> String {
        format!("https://www.explainxkcd.com/wiki/index.php/{}", self.num)
    }

    /// Publication date, if the date fields parse.
    pub fn published(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            self.year.parse().ok()?,
            self.month.parse().ok()?,
            self.day.parse().ok()?,
        )
    }
}

pub struct XkcdClient {
    client: Client,
    base_url: String,
}

impl XkcdClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    async fn get(&self, url: String) -> Result<Comic, FetchError> {
        let response = self.client.get(url).send().await?;
        Ok(check_status(response, "comic").await?.json().await?)
    }

    #[instrument(skip(self))]
    pub async fn latest(&self) -> Result<Comic, FetchError> {
        self.get(format!("{}/info.0.json", self.base_url)).await
    }

    #[instrument(skip(self))]
    pub async fn comic(&self, num: u32) -> Result<Comic, FetchError> {
        self.get(format!("{}/{}/info.0.json", self.base_url, num)).await
    }

    /// A uniformly random comic between 1 and the latest.
    #[instrument(skip(self))]
    pub async fn random(&self) -> Result<Comic, FetchError> {
        let latest = self.latest().await?;
        if latest.num <= 1 {
            return Ok(latest);
        }
        let num = rand::thread_rng().gen_range(1..=latest.num);
        if num == latest.num {
            return Ok(latest);
        }
        self.comic(num).await
    }
}
