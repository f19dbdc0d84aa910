use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use spinout_common::Publication;

use crate::error::CollectionError;
use crate::parse::parse_listing;
use crate::traits::PublicationSource;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Pages through the portal's publication listing (`?page=1`, `?page=2`, ...)
/// until a page comes back empty or fails, or `max_pages` is reached.
pub struct PortalScraper {
    http: reqwest::Client,
    base_url: Url,
    max_pages: u32,
    page_delay: Duration,
}

impl PortalScraper {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CollectionError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            max_pages: 200,
            page_delay: Duration::from_secs(1),
        })
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    fn page_url(&self, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<Publication>, CollectionError> {
        let url = self.page_url(page);
        let resp = self.http.get(url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollectionError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = resp.text().await?;
        let parsed = parse_listing(&html, &url);
        if parsed.dropped > 0 {
            debug!(page, dropped = parsed.dropped, "Dropped entries without title or authors");
        }
        Ok(parsed.publications)
    }
}

#[async_trait]
impl PublicationSource for PortalScraper {
    async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<Publication>, CollectionError> {
        let mut publications = Vec::new();

        for page in 1..=self.max_pages {
            let batch = match self.fetch_page(page).await {
                Ok(batch) => batch,
                // Nothing collected yet: the portal is unreachable.
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(page, error = %e, "Page fetch failed, stopping pagination");
                    break;
                }
            };

            if batch.is_empty() {
                debug!(page, "Empty page, end of listing");
                break;
            }
            debug!(page, count = batch.len(), "Scraped page");
            publications.extend(batch);

            if page == self.max_pages {
                warn!(max_pages = self.max_pages, "Reached page limit, stopping pagination");
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(page, "Scrape cancelled between pages");
                    break;
                }
                _ = tokio::time::sleep(self.page_delay) => {}
            }
        }

        info!(count = publications.len(), "Scraped publications");
        Ok(publications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn listing(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .map(|t| {
                format!(
                    r#"<div class="publication-item"><h3 class="title">{t}</h3><div class="authors">A; B</div></div>"#
                )
            })
            .collect();
        format!(r#"<html><body><div class="publications-list">{items}</div></body></html>"#)
    }

    /// Minimal HTTP server: serves `pages[n-1]` for `?page=n`, an empty listing
    /// past the end, and a 500 for pages listed in `failing`.
    async fn serve(pages: Vec<String>, failing: Vec<u32>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let pages = pages.clone();
                let failing = failing.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let page: u32 = request
                        .split("page=")
                        .nth(1)
                        .and_then(|rest| {
                            rest.split(|c: char| !c.is_ascii_digit()).next()?.parse().ok()
                        })
                        .unwrap_or(1);

                    let (status, body) = if failing.contains(&page) {
                        ("500 Internal Server Error", String::new())
                    } else {
                        let body = pages
                            .get((page as usize).saturating_sub(1))
                            .cloned()
                            .unwrap_or_else(|| listing(&[]));
                        ("200 OK", body)
                    };
                    let response = format!(
                        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}/en/publications/")
    }

    fn scraper(base: &str) -> PortalScraper {
        PortalScraper::new(base, Duration::from_secs(5))
            .unwrap()
            .with_page_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn pages_until_empty() {
        let base = serve(vec![listing(&["One", "Two"]), listing(&["Three"])], vec![]).await;
        let pubs = scraper(&base)
            .fetch_all(&CancellationToken::new())
            .await
            .unwrap();

        let titles: Vec<&str> = pubs.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
    }

    #[tokio::test]
    async fn later_page_failure_keeps_earlier_results() {
        let base = serve(vec![listing(&["One"]), listing(&["Two"])], vec![2]).await;
        let pubs = scraper(&base)
            .fetch_all(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(pubs.len(), 1);
    }

    #[tokio::test]
    async fn first_page_failure_is_an_error() {
        let base = serve(vec![], vec![1]).await;
        let err = scraper(&base)
            .fetch_all(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn page_limit_is_respected() {
        let base = serve(
            vec![listing(&["One"]), listing(&["Two"]), listing(&["Three"])],
            vec![],
        )
        .await;
        let pubs = scraper(&base)
            .with_max_pages(2)
            .fetch_all(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(pubs.len(), 2);
    }

    #[tokio::test]
    async fn cancellation_stops_between_pages() {
        let base = serve(vec![listing(&["One"]), listing(&["Two"])], vec![]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let pubs = scraper(&base).fetch_all(&cancel).await.unwrap();
        assert_eq!(pubs.len(), 1);
    }

    #[test]
    fn page_url_appends_query() {
        let s = scraper("https://portal.fis.tum.de/en/publications/");
        assert_eq!(
            s.page_url(3).as_str(),
            "https://portal.fis.tum.de/en/publications/?page=3"
        );
    }
}
