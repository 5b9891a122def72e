use std::collections::HashSet;
use std::sync::Mutex;

use futures::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::browser::{BrowseError, Browser, PageOutcome, ScrollMetrics, ENTER_KEY};
use crate::client::{ClientError, ClientOptions, HttpSearchApi, SearchApi};
use crate::criteria::{FilterCriteria, FilterValue};
use crate::filters::{default_sections, FilterPanel};
use crate::output::TerminalSurface;
use crate::render::{CardBuffer, RowContent};
use crate::student::StudentRecord;

// serves canned pages by page number and remembers every request
#[derive(Default)]
struct FakeDirectory {
    pages: Vec<Vec<StudentRecord>>,
    failing: HashSet<u32>,
    requests: Mutex<Vec<FilterCriteria>>,
}

impl FakeDirectory {
    fn with_pages(sizes: &[usize]) -> Self {
        let pages = sizes
            .iter()
            .enumerate()
            .map(|(p, &n)| (0..n).map(|i| student(&format!("p{}s{}", p + 1, i))).collect())
            .collect();
        Self {
            pages,
            ..Self::default()
        }
    }

    fn requests(&self) -> Vec<FilterCriteria> {
        self.requests.lock().unwrap().clone()
    }
}

impl SearchApi for FakeDirectory {
    fn fetch_page<'a>(
        &'a self,
        criteria: &'a FilterCriteria,
    ) -> BoxFuture<'a, Result<Vec<StudentRecord>, ClientError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(criteria.clone());
            if self.failing.contains(&criteria.page) {
                return Err(ClientError::Status {
                    url: "http://fake/api/students".to_string(),
                    status: 502,
                });
            }
            let idx = criteria.page.saturating_sub(1) as usize;
            Ok(self.pages.get(idx).cloned().unwrap_or_default())
        })
    }
}

fn student(first: &str) -> StudentRecord {
    StudentRecord {
        first_name: first.to_string(),
        last_name: "Doe".to_string(),
        ..StudentRecord::default()
    }
}

const AT_BOTTOM: ScrollMetrics = ScrollMetrics {
    viewport_height: 800.0,
    scroll_offset: 1200.0,
    document_height: 2000.0,
};

#[tokio::test]
async fn first_load_requests_page_one_unfiltered() {
    let api = FakeDirectory::with_pages(&[20, 20]);
    let mut browser = Browser::new(&api, CardBuffer::new());
    let outcome = browser.load_next_page().await.unwrap();
    assert_eq!(
        outcome,
        Some(PageOutcome::Rendered {
            page: 1,
            count: 20,
            exhausted: false
        })
    );
    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].is_unrestricted());
    assert_eq!(requests[0].page, 1);
    assert_eq!(browser.surface().len(), 20);
}

#[tokio::test]
async fn short_page_stops_scroll_requests() {
    let api = FakeDirectory::with_pages(&[20, 5]);
    let mut browser = Browser::new(&api, CardBuffer::new());
    browser.load_next_page().await.unwrap();
    let second = browser.on_scroll(AT_BOTTOM).await.unwrap();
    assert_eq!(
        second,
        Some(PageOutcome::Rendered {
            page: 2,
            count: 5,
            exhausted: true
        })
    );
    assert!(browser.on_scroll(AT_BOTTOM).await.unwrap().is_none());
    assert_eq!(api.requests().len(), 2);
    assert_eq!(browser.surface().len(), 25);
}

#[tokio::test]
async fn scroll_far_from_bottom_does_nothing() {
    let api = FakeDirectory::with_pages(&[20, 20]);
    let mut browser = Browser::new(&api, CardBuffer::new());
    browser.load_next_page().await.unwrap();
    let far = ScrollMetrics {
        viewport_height: 500.0,
        scroll_offset: 0.0,
        document_height: 4000.0,
    };
    assert!(browser.on_scroll(far).await.unwrap().is_none());
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test]
async fn new_search_clears_output_and_restarts_at_page_one() {
    let api = FakeDirectory::with_pages(&[20, 20, 20]);
    let mut browser = Browser::new(&api, CardBuffer::new());
    browser.load_next_page().await.unwrap();
    browser.on_scroll(AT_BOTTOM).await.unwrap();
    assert_eq!(browser.session().pages_loaded(), 2);

    let mut panel = FilterPanel::from_definitions(&default_sections());
    panel.set("leave", "Yes", true).unwrap();
    browser.submit("doe", &panel).await.unwrap();

    let requests = api.requests();
    let last = requests.last().unwrap();
    assert_eq!(last.page, 1);
    assert_eq!(last.query, "doe");
    assert_eq!(last.filters["leave"], vec![FilterValue::Flag(true)]);
    assert_eq!(browser.surface().clears(), 1);
    assert_eq!(browser.surface().len(), 20);
    assert_eq!(browser.session().generation(), 1);
}

#[tokio::test]
async fn only_enter_submits_from_query_box() {
    let api = FakeDirectory::with_pages(&[3]);
    let mut browser = Browser::new(&api, CardBuffer::new());
    let panel = FilterPanel::from_definitions(&default_sections());

    assert!(browser
        .on_query_key(65, "ada", &panel)
        .await
        .unwrap()
        .is_none());
    assert!(api.requests().is_empty());

    browser.on_query_key(ENTER_KEY, "ada", &panel).await.unwrap();
    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query, "ada");
    assert!(requests[0].filters.is_empty());
}

#[test]
fn page_in_flight_blocks_another_request() {
    let api = FakeDirectory::with_pages(&[20, 20]);
    let mut browser = Browser::new(&api, CardBuffer::new());
    let ticket = browser.begin_page().unwrap();
    assert!(browser.begin_page().is_none());
    browser
        .complete_page(ticket, Ok(vec![student("a"); 20]))
        .unwrap();
    assert_eq!(browser.begin_page().unwrap().page, 2);
}

#[test]
fn results_for_superseded_search_are_dropped() {
    let api = FakeDirectory::default();
    let mut browser = Browser::new(&api, CardBuffer::new());
    let stale = browser.begin_page().unwrap();

    browser.begin_search(FilterCriteria {
        query: "new".to_string(),
        ..FilterCriteria::default()
    });
    let fresh = browser.begin_page().unwrap();
    assert_eq!(fresh.page, 1);
    assert_eq!(fresh.criteria.query, "new");

    let outcome = browser
        .complete_page(stale, Ok(vec![student("old"); 20]))
        .unwrap();
    assert_eq!(
        outcome,
        PageOutcome::Stale {
            generation: 0,
            page: 1
        }
    );
    assert!(browser.surface().is_empty());
    assert_eq!(browser.session().in_flight(), Some(1));

    browser
        .complete_page(fresh, Ok(vec![student("new")]))
        .unwrap();
    assert_eq!(browser.surface().cards()[0].name, "Doe, new");
    assert!(browser.session().is_exhausted());
}

#[test]
fn completing_a_page_twice_renders_it_once() {
    let api = FakeDirectory::default();
    let mut browser = Browser::new(&api, CardBuffer::new());
    let ticket = browser.begin_page().unwrap();
    let again = ticket.clone();
    browser
        .complete_page(ticket, Ok(vec![student("a"); 20]))
        .unwrap();
    let outcome = browser
        .complete_page(again, Ok(vec![student("a"); 20]))
        .unwrap();
    assert_eq!(
        outcome,
        PageOutcome::Stale {
            generation: 0,
            page: 1
        }
    );
    assert_eq!(browser.surface().len(), 20);
    assert_eq!(browser.begin_page().unwrap().page, 2);
}

#[tokio::test]
async fn taller_terminal_prefetches_after_fewer_screens() {
    colored::control::set_override(false);
    async fn screens_until_prefetch(viewport_rows: usize) -> usize {
        let api = FakeDirectory::with_pages(&[20, 20]);
        let mut browser = Browser::new(&api, TerminalSurface::new(Vec::new(), viewport_rows));
        browser.load_next_page().await.unwrap();
        let mut screens = 0;
        loop {
            let metrics = browser.surface().scroll_metrics();
            if browser.on_scroll(metrics).await.unwrap().is_some() {
                return screens;
            }
            browser.surface_mut().scroll_down();
            screens += 1;
        }
    }

    // 20 name-only cards take 40 lines
    assert_eq!(screens_until_prefetch(40).await, 0);
    assert_eq!(screens_until_prefetch(10).await, 2);
    assert_eq!(screens_until_prefetch(4).await, 8);
}

#[tokio::test]
async fn failed_page_stalls_without_rendering() {
    let mut api = FakeDirectory::with_pages(&[20, 20, 20]);
    api.failing.insert(2);
    let mut browser = Browser::new(&api, CardBuffer::new());
    browser.load_next_page().await.unwrap();

    let err = browser.load_next_page().await.unwrap_err();
    assert!(matches!(
        err,
        BrowseError::Fetch {
            page: 2,
            source: ClientError::Status { status: 502, .. }
        }
    ));
    assert_eq!(browser.surface().len(), 20);
    assert!(!browser.session().is_exhausted());

    browser.load_next_page().await.unwrap();
    assert_eq!(api.requests().last().unwrap().page, 3);
}

#[tokio::test]
async fn custom_page_size_controls_exhaustion() {
    let api = FakeDirectory::with_pages(&[5]);
    let mut browser = Browser::new(&api, CardBuffer::new()).with_page_size(5);
    let outcome = browser.load_next_page().await.unwrap();
    assert_eq!(
        outcome,
        Some(PageOutcome::Rendered {
            page: 1,
            count: 5,
            exhausted: false
        })
    );
}

#[tokio::test]
async fn rendered_cards_carry_typed_rows() {
    let api = FakeDirectory {
        pages: vec![vec![StudentRecord {
            email: Some("a@b.com".to_string()),
            address: Some("123 Main St\nApt 4".to_string()),
            ..student("Ann")
        }]],
        ..FakeDirectory::default()
    };
    let mut browser = Browser::new(&api, CardBuffer::new());
    browser.load_next_page().await.unwrap();
    let card = &browser.surface().cards()[0];
    assert!(matches!(
        &card.row("email").unwrap().content,
        RowContent::Link { href, .. } if href == "mailto:a@b.com"
    ));
    assert!(matches!(
        &card.row("address").unwrap().content,
        RowContent::Lines { lines } if lines.len() == 2
    ));
    assert!(card.row("phone").is_none());
}

fn proxy_configured() -> bool {
    ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]
        .iter()
        .any(|k| std::env::var_os(k).is_some())
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

// accepts one connection, answers it, and hands back the raw request
async fn serve_once(
    status_line: &'static str,
    body: &'static str,
) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = header_end(&buf) {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        let response = format!(
            "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&buf).to_string()
    });
    (format!("http://{addr}/"), handle)
}

#[tokio::test]
async fn http_client_posts_criteria_as_json() {
    if proxy_configured() {
        return;
    }
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"[{"first_name":"Ada","last_name":"Lovelace","year":2023,"leave":true}]"#,
    )
    .await;
    let api = HttpSearchApi::new(&ClientOptions {
        base_url,
        ..ClientOptions::default()
    })
    .unwrap();

    let mut panel = FilterPanel::from_definitions(&default_sections());
    panel.set("college", "Morse", true).unwrap();
    let criteria = crate::criteria::build_criteria("ada", &panel).with_page(1);
    let students = api.fetch_page(&criteria).await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].year.as_deref(), Some("2023"));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/students HTTP/1.1"));
    assert!(request.to_lowercase().contains("content-type: application/json"));
    assert!(request.ends_with(r#"{"query":"ada","filters":{"college":["Morse"]},"page":1}"#));
}

#[tokio::test]
async fn http_client_reports_error_status() {
    if proxy_configured() {
        return;
    }
    let (base_url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "oops").await;
    let api = HttpSearchApi::new(&ClientOptions {
        base_url,
        ..ClientOptions::default()
    })
    .unwrap();
    let err = api
        .fetch_page(&FilterCriteria::default().with_page(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 500, .. }));
    let _ = server.await;
}

#[tokio::test]
async fn http_client_reports_malformed_body() {
    if proxy_configured() {
        return;
    }
    let (base_url, server) = serve_once("HTTP/1.1 200 OK", "<html>login</html>").await;
    let api = HttpSearchApi::new(&ClientOptions {
        base_url,
        ..ClientOptions::default()
    })
    .unwrap();
    let err = api
        .fetch_page(&FilterCriteria::default().with_page(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
    let _ = server.await;
}
