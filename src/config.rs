use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;
use std::time::Duration;

use crate::{
    archive::{ArchiveExtractor, TarGzExtractor},
    error::InstallError,
    http::{DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_METADATA_TIMEOUT, HttpClient},
    release::{GitHubReleases, ReleaseOrder, ReleaseSource, RepoId},
    runtime::Runtime,
};

pub const DEFAULT_REPO: &str = "ferromon/ferromon";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SYSTEM_DIR: &str = "/usr/local/bin";
/// Relative to the home directory.
pub const DEFAULT_USER_DIR: &str = ".local/bin";
pub const BINARY_NAME: &str = "ferro";

const USER_AGENT: &str = concat!("ferromon-install/", env!("CARGO_PKG_VERSION"));

/// Everything a run needs to know, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub repo: RepoId,
    pub api_url: String,
    /// Install this tag instead of the newest eligible release.
    pub tag: Option<String>,
    /// Skip host detection and use this target triple.
    pub target: Option<String>,
    pub order: ReleaseOrder,
    pub system_dir: PathBuf,
    /// `None` means `~/.local/bin`.
    pub user_dir: Option<PathBuf>,
    pub allow_elevation: bool,
    pub metadata_timeout: Duration,
    pub download_timeout: Duration,
    pub dry_run: bool,
    pub binary_name: String,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            repo: RepoId {
                owner: "ferromon".to_string(),
                repo: "ferromon".to_string(),
            },
            api_url: DEFAULT_API_URL.to_string(),
            tag: None,
            target: None,
            order: ReleaseOrder::default(),
            system_dir: PathBuf::from(DEFAULT_SYSTEM_DIR),
            user_dir: None,
            allow_elevation: true,
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            dry_run: false,
            binary_name: BINARY_NAME.to_string(),
        }
    }
}

impl InstallOptions {
    /// The per-user install directory, falling back to `~/.local/bin`.
    pub fn resolve_user_dir<R: Runtime>(&self, runtime: &R) -> Result<PathBuf, InstallError> {
        if let Some(dir) = &self.user_dir {
            return Ok(dir.clone());
        }
        runtime
            .home_dir()
            .map(|home| home.join(DEFAULT_USER_DIR))
            .ok_or_else(|| {
                InstallError::MissingDependency(
                    "cannot determine the home directory; pass --user-dir".to_string(),
                )
            })
    }
}

/// The collaborators of one install run.
pub struct Config<R: Runtime, S: ReleaseSource, E: ArchiveExtractor> {
    pub runtime: R,
    pub source: S,
    pub http_client: HttpClient,
    pub extractor: E,
    pub options: InstallOptions,
}

impl<R: Runtime> Config<R, GitHubReleases, TarGzExtractor> {
    pub fn new(runtime: R, options: InstallOptions) -> Result<Self> {
        let http_client = build_http_client(&runtime, &options)?;
        let source = GitHubReleases::new(
            http_client.clone(),
            &options.api_url,
            options.repo.clone(),
        );

        Ok(Self {
            runtime,
            source,
            http_client,
            extractor: TarGzExtractor,
            options,
        })
    }
}

/// Builds the shared HTTP client, authenticating with `GITHUB_TOKEN` when set.
pub fn build_http_client<R: Runtime>(runtime: &R, options: &InstallOptions) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    if let Ok(token) = runtime.env_var("GITHUB_TOKEN")
        && !token.is_empty()
    {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("GITHUB_TOKEN contains characters not allowed in a header")?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("Using GITHUB_TOKEN for authentication: {}", mask(&token));
    }

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")?;

    Ok(HttpClient::new(client).with_timeouts(options.metadata_timeout, options.download_timeout))
}

fn mask(token: &str) -> String {
    if token.len() <= 12 || !token.is_ascii() {
        return "*********".to_string();
    }
    format!("{}*********{}", &token[..8], &token[token.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::test_home;
    use mockito::{Matcher, Server};

    /// Helper function to verify Authorization header behavior
    /// - `token`: Some(token) to test with GITHUB_TOKEN set, None to test without
    async fn verify_authorization_header(token: Option<&str>) {
        // --- Setup MockRuntime ---

        let mut runtime = MockRuntime::new();
        let token_clone = token.map(|t| t.to_string());

        runtime
            .expect_env_var()
            .with(mockall::predicate::eq("GITHUB_TOKEN"))
            .returning(move |_| token_clone.clone().ok_or(std::env::VarError::NotPresent));

        // --- Create Mock Server ---

        let mut server = Server::new_async().await;

        let expected_header = match token {
            Some(t) => Matcher::Exact(format!("Bearer {}", t)),
            None => Matcher::Missing,
        };

        let mock = server
            .mock("GET", "/")
            .match_header("Authorization", expected_header)
            .match_header("User-Agent", Matcher::Regex("^ferromon-install/".into()))
            .create_async()
            .await;

        // --- Execute ---

        let config = Config::new(runtime, InstallOptions::default()).unwrap();
        let _ = config.http_client.inner().get(server.url()).send().await;

        // --- Verify ---

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_config_new_with_github_token() {
        verify_authorization_header(Some("ghp_0123456789abcdefghij")).await;
    }

    #[tokio::test]
    async fn test_config_new_without_github_token() {
        verify_authorization_header(None).await;
    }

    #[test]
    fn test_mask_short_token() {
        assert_eq!(mask("abc"), "*********");
        assert_eq!(mask("ghp_0123456789abcdefghij"), "ghp_0123*********ghij");
    }

    #[test]
    fn test_default_options() {
        let options = InstallOptions::default();
        assert_eq!(options.repo.to_string(), DEFAULT_REPO);
        assert_eq!(options.system_dir, PathBuf::from("/usr/local/bin"));
        assert!(options.allow_elevation);
        assert_eq!(options.binary_name, "ferro");
        assert_eq!(options.metadata_timeout, Duration::from_secs(10));
        assert_eq!(options.download_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_resolve_user_dir_defaults_to_home() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| Some(test_home()));

        let dir = InstallOptions::default().resolve_user_dir(&runtime).unwrap();
        assert_eq!(dir, test_home().join(".local/bin"));
    }

    #[test]
    fn test_resolve_user_dir_prefers_configured() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().never();

        let options = InstallOptions {
            user_dir: Some(PathBuf::from("/opt/ferro/bin")),
            ..Default::default()
        };
        assert_eq!(
            options.resolve_user_dir(&runtime).unwrap(),
            PathBuf::from("/opt/ferro/bin")
        );
    }

    #[test]
    fn test_resolve_user_dir_without_home() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| None);

        let err = InstallOptions::default()
            .resolve_user_dir(&runtime)
            .unwrap_err();
        assert!(matches!(err, InstallError::MissingDependency(_)));
    }
}
