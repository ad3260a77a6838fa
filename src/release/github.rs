//! GitHub release listing.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::http::HttpClient;

use super::{Release, ReleaseAsset, ReleaseSource, RepoId};

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub tag_name: String,
        #[serde(default)]
        pub draft: bool,
        #[serde(default)]
        pub prerelease: bool,
        #[serde(default)]
        pub assets: Vec<Asset>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub name: String,
        pub browser_download_url: String,
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        Release {
            tag: r.tag_name,
            draft: r.draft,
            prerelease: r.prerelease,
            assets: r
                .assets
                .into_iter()
                .map(|a| ReleaseAsset {
                    name: a.name,
                    download_url: a.browser_download_url,
                })
                .collect(),
        }
    }
}

/// Releases of one GitHub repository.
pub struct GitHubReleases {
    http_client: HttpClient,
    api_url: String,
    repo: RepoId,
}

impl GitHubReleases {
    pub fn new(http_client: HttpClient, api_url: &str, repo: RepoId) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo,
        }
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    #[tracing::instrument(skip(self))]
    async fn list_releases(&self) -> Result<Vec<Release>> {
        let url = self.listing_url();
        debug!("Fetching releases from {}...", url);

        // One page; the newest releases come first.
        let parsed: Vec<api::Release> = self
            .http_client
            .get_json_with_query(&url, &[("per_page", "100")])
            .await?;

        debug!("Listing returned {} release(s)", parsed.len());
        Ok(parsed.into_iter().map(Release::from).collect())
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases",
            self.api_url, self.repo.owner, self.repo.repo
        )
    }
}
