use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Downloads a URL to `dest`, creating the file through the runtime.
#[tracing::instrument(skip(runtime, dest, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    dest: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    info!("Downloading file from {}...", url);

    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(dest)
                .with_context(|| format!("Failed to create file at {:?}", dest))
        })
        .await?;

    info!("Download complete ({} bytes).", bytes);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use reqwest::Client;

    #[tokio::test]
    async fn test_download_file() {
        // --- Setup Mock Server ---
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test.file")
            .with_status(200)
            .with_body("test content")
            .create_async()
            .await;

        // --- Setup Runtime ---
        let mut runtime = MockRuntime::new();

        runtime
            .expect_create_file()
            .with(mockall::predicate::eq(Path::new("test.file").to_path_buf()))
            .times(1)
            .returning(|_| Ok(Box::new(std::io::sink())));

        // --- Execute ---
        let http_client = HttpClient::new(Client::new());
        let result = download_file(
            &runtime,
            &format!("{}/test.file", url),
            Path::new("test.file"),
            &http_client,
        )
        .await;

        // --- Verify ---
        mock.assert_async().await;
        assert_eq!(result.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_download_file_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test.file")
            .with_status(404)
            .create_async()
            .await;

        // No expectations = strict mode (panics if any method called)
        let runtime = MockRuntime::new();

        let http_client = HttpClient::new(Client::new());
        let result = download_file(
            &runtime,
            &format!("{}/test.file", url),
            Path::new("test.file"),
            &http_client,
        )
        .await;

        mock.assert_async().await;
        assert!(format!("{:#}", result.unwrap_err()).contains("not found"));
    }
}
