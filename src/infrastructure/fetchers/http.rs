use super::ByteFetcher;
use crate::domain::error::{AppError, Result};
use crate::domain::source::ResolvedSource;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; DatasetLoader/0.1)";

// Drive's virus-scan warning page carries the token either in a link or in a form field.
static CONFIRM_TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"confirm=([0-9A-Za-z_\-]+)|name="confirm"\s+value="([0-9A-Za-z_\-]+)""#).unwrap()
});

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Single GET, no retries. A Drive direct-download that answers with the
    /// large-file confirmation page gets exactly one follow-up request.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url).await?;

        if is_drive_download(url) && is_html(&response) {
            let page = response.text().await.map_err(|e| self.body_error(url, &e))?;
            return self.confirm_drive_download(url, &page).await;
        }

        self.read_body(url, response).await
    }

    async fn confirm_drive_download(&self, url: &str, page: &str) -> Result<Vec<u8>> {
        let token = extract_confirm_token(page).ok_or_else(|| {
            AppError::Network(format!(
                "Drive returned an HTML page instead of file data for {}; check that the file is shared publicly",
                url
            ))
        })?;

        let confirmed = with_confirm_token(url, &token)?;
        info!(url = %url, "Following Drive large-file confirmation");

        let response = self.send(&confirmed).await?;
        if is_html(&response) {
            return Err(AppError::Network(format!(
                "Drive confirmation for {} still returned an HTML page",
                url
            )));
        }

        self.read_body(&confirmed, response).await
    }

    async fn send(&self, url: &str) -> Result<Response> {
        debug!(url = %url, "HTTP GET");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Network(format!(
                    "Request to {} timed out after {}s",
                    url,
                    self.timeout.as_secs()
                ))
            } else {
                AppError::Network(format!("Request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("{} returned 404", url)));
        }
        if !status.is_success() {
            return Err(AppError::Network(format!("{} returned HTTP {}", url, status)));
        }

        Ok(response)
    }

    async fn read_body(&self, url: &str, response: Response) -> Result<Vec<u8>> {
        let bytes = response.bytes().await.map_err(|e| self.body_error(url, &e))?;
        debug!(url = %url, bytes = bytes.len(), "HTTP body received");
        Ok(bytes.to_vec())
    }

    fn body_error(&self, url: &str, err: &reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Network(format!(
                "Reading {} timed out after {}s",
                url,
                self.timeout.as_secs()
            ))
        } else {
            AppError::Network(format!("Failed to read response from {}: {}", url, err))
        }
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch(&self, source: &ResolvedSource) -> Result<Vec<u8>> {
        let url = source
            .as_url()
            .ok_or_else(|| AppError::Internal(format!("HTTP fetcher cannot read {:?}", source)))?;
        self.get_bytes(url).await
    }
}

/// URLs shaped like `.../uc?export=download&id=<id>`.
fn is_drive_download(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let mut export = false;
    let mut id = false;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "export" => export = value == "download",
            "id" => id = !value.is_empty(),
            _ => {}
        }
    }
    export && id
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false)
}

fn extract_confirm_token(page: &str) -> Option<String> {
    let caps = CONFIRM_TOKEN_PATTERN.captures(page)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

fn with_confirm_token(url: &str, token: &str) -> Result<String> {
    let mut parsed = Url::parse(url)
        .map_err(|e| AppError::MalformedUrl(format!("Cannot parse {}: {}", url, e)))?;
    parsed.query_pairs_mut().append_pair("confirm", token);
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

    const CSV_BODY: &str = "id,name\n1,Ana\n";

    async fn serve(req: HttpRequest) -> HttpResponse {
        match req.path() {
            "/data.csv" => HttpResponse::Ok().content_type("text/csv").body(CSV_BODY),
            "/broken.csv" => HttpResponse::InternalServerError().finish(),
            "/slow.csv" => {
                actix_web::rt::time::sleep(Duration::from_secs(3)).await;
                HttpResponse::Ok().content_type("text/csv").body(CSV_BODY)
            }
            "/uc" if req.query_string().contains("confirm=t0k3n") => HttpResponse::Ok()
                .content_type("application/octet-stream")
                .body(CSV_BODY),
            "/uc" if req.query_string().contains("id=notoken") => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body("<html><body>Sign in</body></html>"),
            "/uc" => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(
                    r#"<a id="uc-download-link" href="/uc?export=download&amp;confirm=t0k3n&amp;id=abc">Download anyway</a>"#,
                ),
            _ => HttpResponse::NotFound().finish(),
        }
    }

    fn start_server() -> String {
        let server = HttpServer::new(|| App::new().default_service(web::route().to(serve)))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        tokio::spawn(server.run());
        format!("http://{}", addr)
    }

    #[actix_web::test]
    async fn test_get_bytes_ok() {
        let base = start_server();
        let fetcher = HttpFetcher::with_timeout(5).unwrap();
        let bytes = fetcher.get_bytes(&format!("{}/data.csv", base)).await.unwrap();
        assert_eq!(bytes, CSV_BODY.as_bytes());
    }

    #[actix_web::test]
    async fn test_status_mapping() {
        let base = start_server();
        let fetcher = HttpFetcher::with_timeout(5).unwrap();

        let missing = fetcher.get_bytes(&format!("{}/missing.csv", base)).await;
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::NotFound);

        let broken = fetcher.get_bytes(&format!("{}/broken.csv", base)).await;
        assert_eq!(broken.unwrap_err().kind(), ErrorKind::Network);
    }

    #[actix_web::test]
    async fn test_timeout_is_network_error() {
        let base = start_server();
        let fetcher = HttpFetcher::with_timeout(1).unwrap();
        let err = fetcher
            .get_bytes(&format!("{}/slow.csv", base))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("timed out"));
    }

    #[actix_web::test]
    async fn test_connection_refused_is_network_error() {
        let fetcher = HttpFetcher::with_timeout(5).unwrap();
        let err = fetcher.get_bytes("http://127.0.0.1:1/a.csv").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[actix_web::test]
    async fn test_drive_confirmation_followed_once() {
        let base = start_server();
        let fetcher = HttpFetcher::with_timeout(5).unwrap();
        let bytes = fetcher
            .get_bytes(&format!("{}/uc?export=download&id=abc", base))
            .await
            .unwrap();
        assert_eq!(bytes, CSV_BODY.as_bytes());
    }

    #[actix_web::test]
    async fn test_drive_page_without_token_fails() {
        let base = start_server();
        let fetcher = HttpFetcher::with_timeout(5).unwrap();
        let err = fetcher
            .get_bytes(&format!("{}/uc?export=download&id=notoken", base))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_confirm_token_patterns() {
        assert_eq!(
            extract_confirm_token(r#"href="/uc?export=download&amp;confirm=AbC_1-2&amp;id=x""#),
            Some("AbC_1-2".to_string())
        );
        assert_eq!(
            extract_confirm_token(r#"<input type="hidden" name="confirm" value="t">"#),
            Some("t".to_string())
        );
        assert_eq!(extract_confirm_token("<html></html>"), None);
    }

    #[test]
    fn test_drive_download_shape() {
        assert!(is_drive_download(
            "https://drive.google.com/uc?export=download&id=abc"
        ));
        assert!(!is_drive_download("https://drive.google.com/uc?id=abc"));
        assert!(!is_drive_download("https://example.com/data.csv"));
        assert_eq!(
            with_confirm_token("https://drive.google.com/uc?export=download&id=abc", "t").unwrap(),
            "https://drive.google.com/uc?export=download&id=abc&confirm=t"
        );
    }
}
