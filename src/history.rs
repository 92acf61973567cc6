//! Generated links remembered per wallet address.
//!
//! DynamoDB table (HISTORY_TABLE):
//!   PK: address (S)
//!   blinks (L)      records as maps, newest last, at most MAX_HISTORY
//!   updated_at (N)  epoch seconds

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ddb::types::{AttributeValue as Av, ReturnValue};
use serde::{Deserialize, Serialize};

use crate::error::BlinkError;
use crate::link::GeneratedLink;
use crate::util::epoch_now;

/// Per-address cap; the oldest records are dropped to make room.
pub const MAX_HISTORY: usize = 100;

const APPEND_ATTEMPTS: usize = 4;
const CONDITION_FAILED: &str = "ConditionalCheckFailedException";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkHistoryRecord {
    pub platform: String,
    pub display: String,
    pub actual: String,
    pub timestamp: DateTime<Utc>,
}

impl BlinkHistoryRecord {
    pub fn new(platform: impl Into<String>, link: &GeneratedLink, at: DateTime<Utc>) -> Self {
        Self {
            platform: platform.into(),
            display: link.display_url.clone(),
            actual: link.actual_url.clone(),
            timestamp: at,
        }
    }

    fn to_attr(&self) -> Av {
        Av::M(HashMap::from([
            ("platform".to_string(), Av::S(self.platform.clone())),
            ("display".to_string(), Av::S(self.display.clone())),
            ("actual".to_string(), Av::S(self.actual.clone())),
            (
                "timestamp".to_string(),
                Av::S(self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            ),
        ]))
    }

    fn from_attr(v: &Av) -> Result<Self, BlinkError> {
        let m = v
            .as_m()
            .map_err(|_| BlinkError::Storage("history record is not a map".into()))?;
        let ts = text(m, "timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(ts)
            .map_err(|e| BlinkError::Storage(format!("history timestamp {ts:?}: {e}")))?
            .with_timezone(&Utc);
        Ok(Self {
            platform: text(m, "platform")?.to_string(),
            display: text(m, "display")?.to_string(),
            actual: text(m, "actual")?.to_string(),
            timestamp,
        })
    }
}

fn text<'a>(m: &'a HashMap<String, Av>, name: &str) -> Result<&'a str, BlinkError> {
    m.get(name)
        .and_then(|v| v.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| BlinkError::Storage(format!("history record missing {name}")))
}

pub trait HistoryStore {
    fn load(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Vec<BlinkHistoryRecord>, BlinkError>> + Send;

    /// Adds one record atomically, dropping the oldest past `MAX_HISTORY`.
    fn append(
        &self,
        address: &str,
        record: BlinkHistoryRecord,
    ) -> impl Future<Output = Result<(), BlinkError>> + Send;
}

/// Appends, then returns the stored list.
pub async fn append<S: HistoryStore>(
    store: &S,
    address: &str,
    record: BlinkHistoryRecord,
) -> Result<Vec<BlinkHistoryRecord>, BlinkError> {
    store.append(address, record).await?;
    store.load(address).await
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_blinks: usize,
    pub muses_blinks: usize,
    pub guardian_blinks: usize,
    pub last24h: usize,
}

impl HistoryStats {
    pub fn compute(records: &[BlinkHistoryRecord], now: DateTime<Utc>) -> Self {
        let since = now - Duration::hours(24);
        let on = |id: &str| records.iter().filter(|r| r.platform == id).count();
        Self {
            total_blinks: records.len(),
            muses_blinks: on("muses"),
            guardian_blinks: on("guardian"),
            last24h: records.iter().filter(|r| r.timestamp > since).count(),
        }
    }
}

#[derive(Clone)]
pub struct DdbHistoryStore {
    pub ddb: ddb::Client,
    pub table: String,
}

fn map_ddb_err<E: std::fmt::Display>(e: E) -> BlinkError {
    BlinkError::Storage(format!("ddb: {e}"))
}

impl DdbHistoryStore {
    /// Removes the oldest record if the list is still full.
    async fn drop_oldest(&self, address: &str) -> Result<(), BlinkError> {
        let res = self
            .ddb
            .update_item()
            .table_name(&self.table)
            .key("address", Av::S(address.to_string()))
            .update_expression("REMOVE blinks[0]")
            .condition_expression("size(blinks) >= :max")
            .expression_attribute_values(":max", Av::N(MAX_HISTORY.to_string()))
            .return_values(ReturnValue::None)
            .send()
            .await;

        match res {
            Ok(_) => Ok(()),
            // another writer already made room
            Err(e) if e.code() == Some(CONDITION_FAILED) => Ok(()),
            Err(e) => Err(map_ddb_err(e)),
        }
    }
}

impl HistoryStore for DdbHistoryStore {
    async fn load(&self, address: &str) -> Result<Vec<BlinkHistoryRecord>, BlinkError> {
        let got = self
            .ddb
            .get_item()
            .table_name(&self.table)
            .key("address", Av::S(address.to_string()))
            .send()
            .await
            .map_err(map_ddb_err)?;

        let Some(blinks) = got.item().and_then(|m| m.get("blinks")) else {
            return Ok(Vec::new());
        };
        let list = blinks
            .as_l()
            .map_err(|_| BlinkError::Storage(format!("history for {address} is not a list")))?;
        list.iter().map(BlinkHistoryRecord::from_attr).collect()
    }

    async fn append(&self, address: &str, record: BlinkHistoryRecord) -> Result<(), BlinkError> {
        let entry = Av::L(vec![record.to_attr()]);

        for _ in 0..APPEND_ATTEMPTS {
            let res = self
                .ddb
                .update_item()
                .table_name(&self.table)
                .key("address", Av::S(address.to_string()))
                .update_expression(
                    "SET blinks = list_append(if_not_exists(blinks, :empty), :new), updated_at = :ts",
                )
                .condition_expression("attribute_not_exists(blinks) OR size(blinks) < :max")
                .expression_attribute_values(":empty", Av::L(Vec::new()))
                .expression_attribute_values(":new", entry.clone())
                .expression_attribute_values(":ts", Av::N(epoch_now().to_string()))
                .expression_attribute_values(":max", Av::N(MAX_HISTORY.to_string()))
                .return_values(ReturnValue::None)
                .send()
                .await;

            match res {
                Ok(_) => return Ok(()),
                Err(e) if e.code() == Some(CONDITION_FAILED) => self.drop_oldest(address).await?,
                Err(e) => return Err(map_ddb_err(e)),
            }
        }
        Err(BlinkError::Storage(format!(
            "history for {address} still full after {APPEND_ATTEMPTS} attempts"
        )))
    }
}

#[derive(Default)]
pub struct MemoryHistoryStore {
    inner: Mutex<HashMap<String, Vec<BlinkHistoryRecord>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    async fn load(&self, address: &str) -> Result<Vec<BlinkHistoryRecord>, BlinkError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| BlinkError::Storage("history lock poisoned".into()))?;
        Ok(map.get(address).cloned().unwrap_or_default())
    }

    async fn append(&self, address: &str, record: BlinkHistoryRecord) -> Result<(), BlinkError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| BlinkError::Storage("history lock poisoned".into()))?;
        let list = map.entry(address.to_string()).or_default();
        if list.len() >= MAX_HISTORY {
            list.drain(..=list.len() - MAX_HISTORY);
        }
        list.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(platform: &str, at: DateTime<Utc>) -> BlinkHistoryRecord {
        BlinkHistoryRecord {
            platform: platform.into(),
            display: format!("https://relay.test/dapp/nav1?url={platform}"),
            actual: format!("https://relay.test/dapp/nav1?url={platform}"),
            timestamp: at,
        }
    }

    #[test]
    fn stats_count_platforms_and_recent() {
        let now = Utc.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        let records = vec![
            record("muses", now - Duration::hours(1)),
            record("muses", now - Duration::hours(30)),
            record("guardian", now - Duration::minutes(5)),
            record("sui", now - Duration::days(3)),
        ];
        let stats = HistoryStats::compute(&records, now);
        assert_eq!(
            stats,
            HistoryStats {
                total_blinks: 4,
                muses_blinks: 2,
                guardian_blinks: 1,
                last24h: 2,
            }
        );
    }

    #[test]
    fn stats_serialize_camel_case() {
        let v = serde_json::to_value(HistoryStats::default()).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"totalBlinks": 0, "musesBlinks": 0, "guardianBlinks": 0, "last24h": 0})
        );
    }

    #[test]
    fn record_timestamp_is_iso() {
        let at = Utc.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        let v = serde_json::to_value(record("muses", at)).unwrap();
        assert_eq!(v["timestamp"], "2024-11-02T12:00:00Z");
    }

    #[tokio::test]
    async fn memory_store_is_scoped_per_address() {
        let store = MemoryHistoryStore::new();
        let now = Utc::now();
        append(&store, "0xaaa", record("muses", now)).await.unwrap();
        append(&store, "0xaaa", record("guardian", now)).await.unwrap();
        append(&store, "0xbbb", record("muses", now)).await.unwrap();

        assert_eq!(store.load("0xaaa").await.unwrap().len(), 2);
        assert_eq!(store.load("0xbbb").await.unwrap().len(), 1);
        assert!(store.load("0xccc").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_keeps_order() {
        let store = MemoryHistoryStore::new();
        let now = Utc::now();
        append(&store, "0xaaa", record("muses", now)).await.unwrap();
        let all = append(&store, "0xaaa", record("guardian", now)).await.unwrap();
        let platforms: Vec<_> = all.iter().map(|r| r.platform.as_str()).collect();
        assert_eq!(platforms, ["muses", "guardian"]);
    }

    #[tokio::test]
    async fn oldest_records_drop_past_cap() {
        let store = MemoryHistoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        for i in 0..MAX_HISTORY + 5 {
            store
                .append("0xaaa", record("muses", t0 + Duration::seconds(i as i64)))
                .await
                .unwrap();
        }
        let all = store.load("0xaaa").await.unwrap();
        assert_eq!(all.len(), MAX_HISTORY);
        assert_eq!(all[0].timestamp, t0 + Duration::seconds(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_every_record() {
        let store = std::sync::Arc::new(MemoryHistoryStore::new());
        let now = Utc::now();
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { append(&*store, "0xaaa", record("guardian", now)).await })
            })
            .collect();
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        assert_eq!(store.load("0xaaa").await.unwrap().len(), 32);
    }

    #[test]
    fn record_attribute_keeps_fields() {
        let at = Utc.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        let rec = record("muses", at);
        let attr = rec.to_attr();
        let m = attr.as_m().unwrap();
        assert_eq!(m["timestamp"], Av::S("2024-11-02T12:00:00Z".into()));
        assert_eq!(BlinkHistoryRecord::from_attr(&attr).unwrap(), rec);
    }

    #[test]
    fn incomplete_record_attribute_is_storage_error() {
        let attr = Av::M(HashMap::from([("platform".to_string(), Av::S("muses".into()))]));
        assert!(matches!(
            BlinkHistoryRecord::from_attr(&attr),
            Err(BlinkError::Storage(_))
        ));
    }

    #[test]
    fn non_map_record_attribute_is_storage_error() {
        let attr = Av::S("[]".into());
        assert!(matches!(
            BlinkHistoryRecord::from_attr(&attr),
            Err(BlinkError::Storage(_))
        ));
    }
}
