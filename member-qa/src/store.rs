//! In-memory message store, loaded once at startup.
//!
//! Accepted sources:
//! - a JSON file with the paginated envelope `{"items": [...], "total": N}`
//! - a JSON file with a bare array of records
//! - an `http(s)://` messages API, read page by page with `skip`/`limit`

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;

/// Page size used against the remote messages API.
const PAGE_SIZE: usize = 1000;
/// Hard stop for servers that ignore `skip`.
const MAX_PAGES: usize = 1000;

/// One member message. Field names follow the upstream messages API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "user_name")]
    pub member: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "message")]
    pub body: String,
}

/// Paginated envelope used by the messages API and its JSON dumps.
#[derive(Debug, Deserialize)]
struct MessagePage {
    #[serde(default)]
    items: Vec<MessageRecord>,
    #[serde(default)]
    total: Option<usize>,
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource {
    File(PathBuf),
    Remote(String),
}

impl MessageSource {
    /// URLs with an http(s) scheme are remote, anything else is a path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            MessageSource::Remote(raw.to_string())
        } else {
            MessageSource::File(PathBuf::from(raw))
        }
    }
}

/// Per-member message counts, served by `GET /stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub total_messages: usize,
    pub unique_users: usize,
    pub users: BTreeMap<String, usize>,
}

/// Immutable message collection plus the roster derived from it.
#[derive(Debug)]
pub struct MessageStore {
    records: Vec<MessageRecord>,
    roster: BTreeSet<String>,
}

impl MessageStore {
    /// Loads the whole dataset from `source`.
    ///
    /// # Errors
    /// Any [`StoreError`]: unreadable file, malformed JSON, failed fetch,
    /// empty dataset, or a record without a member name.
    pub async fn load(source: &MessageSource) -> Result<Self, StoreError> {
        let records = match source {
            MessageSource::File(path) => read_file(path).await?,
            MessageSource::Remote(url) => fetch_remote(url, PAGE_SIZE).await?,
        };
        let store = Self::from_records(records)?;
        info!(
            messages = store.records.len(),
            members = store.roster.len(),
            "message store loaded"
        );
        Ok(store)
    }

    /// Builds a store from already-parsed records.
    ///
    /// Member names are trimmed; the roster is every distinct name.
    pub fn from_records(mut records: Vec<MessageRecord>) -> Result<Self, StoreError> {
        if records.is_empty() {
            return Err(StoreError::Empty);
        }
        let mut roster = BTreeSet::new();
        for rec in &mut records {
            let name = rec.member.trim();
            if name.is_empty() {
                return Err(StoreError::BlankMember { id: rec.id.clone() });
            }
            if name.len() != rec.member.len() {
                rec.member = name.to_string();
            }
            roster.insert(rec.member.clone());
        }
        Ok(Self { records, roster })
    }

    pub fn all(&self) -> &[MessageRecord] {
        &self.records
    }

    pub fn roster(&self) -> &BTreeSet<String> {
        &self.roster
    }

    /// Counts messages per member. Cheap enough to compute on every call.
    pub fn stats(&self) -> DatasetStats {
        let mut users: BTreeMap<String, usize> = BTreeMap::new();
        for rec in &self.records {
            *users.entry(rec.member.clone()).or_default() += 1;
        }
        DatasetStats {
            total_messages: self.records.len(),
            unique_users: users.len(),
            users,
        }
    }
}

async fn read_file(path: &Path) -> Result<Vec<MessageRecord>, StoreError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_dataset(&raw)
}

/// Accepts either the `{"items": [...]}` envelope or a bare array.
fn parse_dataset(raw: &str) -> Result<Vec<MessageRecord>, StoreError> {
    let value: Value = serde_json::from_str(raw)?;
    let records = match value {
        Value::Array(_) => serde_json::from_value::<Vec<MessageRecord>>(value)?,
        other => serde_json::from_value::<MessagePage>(other)?.items,
    };
    Ok(records)
}

async fn fetch_remote(url: &str, page_size: usize) -> Result<Vec<MessageRecord>, StoreError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .gzip(true)
        .build()?;

    let mut out: Vec<MessageRecord> = Vec::new();
    let mut skip = 0usize;

    for _ in 0..MAX_PAGES {
        let page: MessagePage = client
            .get(url)
            .query(&[("skip", skip), ("limit", page_size)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let got = page.items.len();
        if got == 0 {
            break;
        }
        out.extend(page.items);
        debug!(skip, got, fetched = out.len(), total = ?page.total, "messages page fetched");

        match page.total {
            Some(total) if out.len() >= total => break,
            None if got < page_size => break,
            _ => {}
        }
        skip += got;
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use chrono::TimeZone;

    use super::*;

    pub(crate) fn record(id: &str, member: &str, day: u32, body: &str) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            user_id: None,
            member: member.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn parses_paginated_envelope() {
        let raw = r#"{"total": 2, "items": [
            {"id": "a", "user_id": "u1", "user_name": "Layla Kawaguchi",
             "timestamp": "2025-05-05T07:47:20.159073+00:00", "message": "Book London"},
            {"id": "b", "user_id": "u2", "user_name": "Vikram Desai",
             "timestamp": "2025-05-06T10:00:00+02:00", "message": "Two cars"}
        ]}"#;
        let recs = parse_dataset(raw).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].member, "Layla Kawaguchi");
        assert_eq!(recs[1].timestamp.to_rfc3339(), "2025-05-06T08:00:00+00:00");
    }

    #[test]
    fn parses_bare_array() {
        let raw = r#"[{"id": "a", "user_name": "Hans", "timestamp": "2025-01-01T00:00:00Z", "message": "hi"}]"#;
        let recs = parse_dataset(raw).unwrap();
        assert_eq!(recs[0].user_id, None);
    }

    #[test]
    fn malformed_dataset_is_an_error() {
        assert!(matches!(parse_dataset("{not json"), Err(StoreError::Json(_))));
        assert!(matches!(
            parse_dataset(r#"[{"id": "a"}]"#),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn roster_holds_every_member_and_stats_count_them() {
        let store = MessageStore::from_records(vec![
            record("1", "Layla", 1, "a"),
            record("2", " Layla ", 2, "b"),
            record("3", "Hans Müller", 3, "c"),
        ])
        .unwrap();

        assert_eq!(
            store.roster().iter().cloned().collect::<Vec<_>>(),
            vec!["Hans Müller".to_string(), "Layla".to_string()]
        );
        for rec in store.all() {
            assert!(store.roster().contains(&rec.member));
        }

        let stats = store.stats();
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.unique_users, 2);
        assert_eq!(stats.users.get("Layla"), Some(&2));
    }

    #[test]
    fn empty_or_nameless_datasets_are_rejected() {
        assert!(matches!(
            MessageStore::from_records(Vec::new()),
            Err(StoreError::Empty)
        ));
        assert!(matches!(
            MessageStore::from_records(vec![record("x", "  ", 1, "a")]),
            Err(StoreError::BlankMember { .. })
        ));
    }

    #[test]
    fn source_kind_follows_scheme() {
        assert_eq!(
            MessageSource::parse("https://example.com/messages/"),
            MessageSource::Remote("https://example.com/messages/".into())
        );
        assert_eq!(
            MessageSource::parse("data/messages.json"),
            MessageSource::File(PathBuf::from("data/messages.json"))
        );
    }

    #[tokio::test]
    async fn loads_from_file_and_fails_on_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"items": [{{"id": "1", "user_name": "Amina", "timestamp": "2025-02-01T09:00:00Z", "message": "Table for two"}}], "total": 1}}"#
        )
        .unwrap();

        let store = MessageStore::load(&MessageSource::File(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(store.all().len(), 1);
        assert!(store.roster().contains("Amina"));

        let missing = MessageStore::load(&MessageSource::File("/nonexistent/messages.json".into())).await;
        assert!(matches!(missing, Err(StoreError::Io { .. })));
    }

    mod remote {
        use std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        };

        use axum::{
            Json, Router,
            extract::{Query, State},
            http::StatusCode,
            routing::get,
        };
        use serde_json::json;

        use super::*;

        #[derive(Deserialize)]
        struct PageQuery {
            skip: usize,
            limit: usize,
        }

        #[derive(Clone)]
        struct Feed {
            count: usize,
            with_total: bool,
            calls: Arc<AtomicUsize>,
        }

        async fn page(State(feed): State<Feed>, Query(q): Query<PageQuery>) -> Json<Value> {
            feed.calls.fetch_add(1, Ordering::SeqCst);
            let items: Vec<Value> = (q.skip..feed.count.min(q.skip + q.limit))
                .map(|i| {
                    json!({ "id": i.to_string(), "user_name": format!("Member {i}"),
                            "timestamp": "2025-01-01T00:00:00Z", "message": "hello" })
                })
                .collect();
            if feed.with_total {
                Json(json!({ "total": feed.count, "items": items }))
            } else {
                Json(json!({ "items": items }))
            }
        }

        async fn serve(router: Router) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
            format!("http://{addr}/messages")
        }

        async fn feed(count: usize, with_total: bool) -> (String, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let state = Feed {
                count,
                with_total,
                calls: calls.clone(),
            };
            let url = serve(Router::new().route("/messages", get(page)).with_state(state)).await;
            (url, calls)
        }

        #[tokio::test]
        async fn pagination_stops_at_total() {
            let (url, calls) = feed(5, true).await;
            let recs = fetch_remote(&url, 2).await.unwrap();
            assert_eq!(recs.len(), 5);
            assert_eq!(recs[4].member, "Member 4");
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn pagination_stops_on_an_empty_page() {
            let (url, calls) = feed(4, false).await;
            let recs = fetch_remote(&url, 2).await.unwrap();
            assert_eq!(recs.len(), 4);
            // two full pages, then the empty one
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn error_status_fails_the_load() {
            let url = serve(Router::new().route(
                "/messages",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            ))
            .await;
            let res = MessageStore::load(&MessageSource::parse(&url)).await;
            assert!(matches!(res, Err(StoreError::Http(_))));
        }
    }
}
