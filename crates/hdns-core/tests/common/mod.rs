//! Test doubles and common utilities for contract tests
//!
//! The provider double is stateful: writes change the records it serves,
//! so a second run observes the first run's effects like the real API.

#![allow(dead_code)]

use hdns_core::error::{Error, Result};
use hdns_core::traits::{DnsProvider, IpSource, Mailer};
use hdns_core::{IpFamily, Record, RecordData, RecordType, Zone};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IpSource answering from fixed values (`None` = lookup fails)
pub struct FixedIpSource {
    v4: Option<IpAddr>,
    v6: Option<IpAddr>,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(v4: Option<&str>, v6: Option<&str>) -> Self {
        Self {
            v4: v4.map(|ip| ip.parse().unwrap()),
            v6: v6.map(|ip| ip.parse().unwrap()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of lookups performed
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn public_ip(&self, family: IpFamily) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let ip = match family {
            IpFamily::V4 => self.v4,
            IpFamily::V6 => self.v6,
        };
        ip.ok_or_else(|| Error::discovery(format!("{family} service unreachable")))
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// A provider call, as recorded by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ListZones,
    ListRecords(String),
    Create {
        zone_id: String,
        data: RecordData,
    },
    Update {
        zone_id: String,
        record_id: String,
        data: RecordData,
    },
    Delete {
        record_id: String,
    },
}

impl ProviderCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::ListZones | Self::ListRecords(_))
    }
}

#[derive(Default)]
struct ProviderState {
    zones: Vec<Zone>,
    records: HashMap<String, Vec<Record>>,
    next_id: usize,
}

/// A stateful in-memory DnsProvider that records calls
#[derive(Default)]
pub struct MockDnsProvider {
    state: Mutex<ProviderState>,
    calls: Mutex<Vec<ProviderCall>>,
    failing_types: HashSet<RecordType>,
    failing_listings: HashSet<String>,
    fail_list_zones: bool,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_record(
        self,
        zone_id: &str,
        id: &str,
        record_type: RecordType,
        name: &str,
        value: &str,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .entry(zone_id.to_string())
            .or_default()
            .push(record(id, record_type, name, value));
        self
    }

    /// Every write touching a record of this type answers HTTP 500
    pub fn failing_writes(mut self, record_type: RecordType) -> Self {
        self.failing_types.insert(record_type);
        self
    }

    /// Listing the records of this zone fails
    pub fn failing_listing(mut self, zone_id: &str) -> Self {
        self.failing_listings.insert(zone_id.to_string());
        self
    }

    /// Listing zones fails
    pub fn failing_zone_listing(mut self) -> Self {
        self.fail_list_zones = true;
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn write_calls(&self) -> Vec<ProviderCall> {
        self.calls().into_iter().filter(ProviderCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Records currently stored for a zone
    pub fn records(&self, zone_id: &str) -> Vec<Record> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    fn record_call(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_write(&self, operation: &str, record_type: &RecordType) -> Result<()> {
        if self.failing_types.contains(record_type) {
            return Err(Error::provider(
                operation,
                500,
                "status 500 Internal Server Error: {\"error\":\"internal\"}",
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.record_call(ProviderCall::ListZones);
        if self.fail_list_zones {
            return Err(Error::provider("list_zones", 401, "status 401 Unauthorized"));
        }
        Ok(self.state.lock().unwrap().zones.clone())
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>> {
        self.record_call(ProviderCall::ListRecords(zone_id.to_string()));
        if self.failing_listings.contains(zone_id) {
            return Err(Error::transport("list_records", "connection reset"));
        }
        Ok(self.records(zone_id))
    }

    async fn create_record(&self, zone_id: &str, data: &RecordData) -> Result<()> {
        self.record_call(ProviderCall::Create {
            zone_id: zone_id.to_string(),
            data: data.clone(),
        });
        self.check_write("create_record", &data.record_type)?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("created-{}", state.next_id);
        state
            .records
            .entry(zone_id.to_string())
            .or_default()
            .push(record(&id, data.record_type.clone(), &data.name, &data.value));
        Ok(())
    }

    async fn update_record(&self, zone_id: &str, record_id: &str, data: &RecordData) -> Result<()> {
        self.record_call(ProviderCall::Update {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            data: data.clone(),
        });
        self.check_write("update_record", &data.record_type)?;

        let mut state = self.state.lock().unwrap();
        let stored = state
            .records
            .get_mut(zone_id)
            .and_then(|records| records.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| Error::provider("update_record", 404, "status 404 Not Found"))?;
        stored.value = data.value.clone();
        stored.ttl = Some(data.ttl);
        Ok(())
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        self.record_call(ProviderCall::Delete {
            record_id: record_id.to_string(),
        });

        let record_type = {
            let state = self.state.lock().unwrap();
            state
                .records
                .values()
                .flatten()
                .find(|r| r.id == record_id)
                .map(|r| r.record_type.clone())
        };
        let Some(record_type) = record_type else {
            return Err(Error::provider("delete_record", 404, "status 404 Not Found"));
        };
        self.check_write("delete_record", &record_type)?;

        let mut state = self.state.lock().unwrap();
        for records in state.records.values_mut() {
            records.retain(|r| r.id != record_id);
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A Mailer that records every message
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails (messages are still recorded)
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Message bodies sent so far
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, _subject: &str, body: &str) -> Result<()> {
        self.sent.lock().unwrap().push(body.to_string());
        if self.fail {
            return Err(Error::notification("535 authentication failed"));
        }
        Ok(())
    }
}

pub fn record(id: &str, record_type: RecordType, name: &str, value: &str) -> Record {
    Record {
        id: id.to_string(),
        record_type,
        name: name.to_string(),
        value: value.to_string(),
        ttl: None,
    }
}

/// Log sink capturing formatted `tracing` output of the current thread
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's events (debug and up) into the buffer until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Captured lines containing `needle`
    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Helper to create a DriverConfig for testing
pub fn driver_config(records: &[&str], apply_changes: bool) -> hdns_core::DriverConfig {
    hdns_core::DriverConfig {
        records: records.iter().map(|r| r.to_string()).collect(),
        ttl: 300,
        apply_changes,
        event_channel_capacity: 100,
    }
}
