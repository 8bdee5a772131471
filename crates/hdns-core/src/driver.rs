//! Run driver
//!
//! One invocation performs one discovery pass, then walks the configured
//! domains strictly in order:
//!
//! ```text
//! IpSource ──(once)──► DiscoveredIps
//!                           │
//!       for each domain     ▼
//!   list_zones ─► resolve_zone ─► list_records ─► Reconciler ─► Notifier
//! ```
//!
//! Only an IPv4 discovery failure aborts the run. Every other failure is
//! logged, relayed to the operator and confined to the domain (or record
//! family) it happened on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::config::validate_domain_name;
use crate::discovery::discover_public_ips;
use crate::engine::{Action, OutcomeKind, Reconciler, ReconciliationOutcome, Status, find_existing};
use crate::error::{Error, ErrorKind, Result};
use crate::model::{DiscoveredIps, IpFamily};
use crate::notify::Notifier;
use crate::resolver::resolve_zone;
use crate::traits::{DnsProvider, IpSource};

/// Driver settings
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Fully-qualified domain names, processed in this order
    pub records: Vec<String>,

    /// TTL for created and updated records
    pub ttl: u32,

    /// `false` selects dry-run mode
    pub apply_changes: bool,

    /// Capacity of the progress event channel
    ///
    /// When full, new events are dropped (with a warning log).
    pub event_channel_capacity: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            ttl: 86400,
            apply_changes: false,
            event_channel_capacity: 1000,
        }
    }
}

impl DriverConfig {
    /// Validate the driver settings
    pub fn validate(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(Error::config("No records configured"));
        }
        if self.ttl == 0 {
            return Err(Error::config("ttl must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

/// Progress events emitted by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Public addresses determined
    DiscoveryCompleted {
        discovered: DiscoveredIps,
    },

    /// Processing of a domain started
    DomainStarted {
        domain: String,
    },

    /// A per-family decision was made (and applied unless dry-run)
    Decision {
        domain: String,
        family: IpFamily,
        action: Action,
        outcome: OutcomeKind,
        dry_run: bool,
    },

    /// A domain was skipped
    DomainFailed {
        domain: String,
        kind: ErrorKind,
        error: String,
    },

    /// All domains processed
    RunFinished {
        domains: usize,
        failures: usize,
    },
}

/// Result of processing one configured domain
#[derive(Debug)]
pub struct DomainReport {
    pub domain: String,
    /// Per-family outcomes, or the error that skipped the domain
    pub result: Result<Vec<ReconciliationOutcome>>,
}

impl DomainReport {
    /// Whether the domain was skipped or any family failed
    pub fn has_failures(&self) -> bool {
        match &self.result {
            Ok(outcomes) => outcomes.iter().any(|o| o.kind() == OutcomeKind::Failed),
            Err(_) => true,
        }
    }

    /// Outcome of one family, if the domain got that far
    pub fn outcome(&self, family: IpFamily) -> Option<&ReconciliationOutcome> {
        self.result
            .as_ref()
            .ok()
            .and_then(|outcomes| outcomes.iter().find(|o| o.family == family))
    }
}

/// Summary of one run
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub discovered: DiscoveredIps,
    /// One report per configured domain, in configured order
    pub domains: Vec<DomainReport>,
}

impl RunReport {
    /// Whether any domain was skipped or any family failed
    pub fn has_failures(&self) -> bool {
        self.domains.iter().any(DomainReport::has_failures)
    }

    /// Number of domains with at least one failure
    pub fn failure_count(&self) -> usize {
        self.domains.iter().filter(|d| d.has_failures()).count()
    }

    /// Report of one domain
    pub fn domain(&self, domain: &str) -> Option<&DomainReport> {
        self.domains.iter().find(|d| d.domain == domain)
    }
}

/// Run driver
///
/// ## Lifecycle
///
/// 1. Create with [`Driver::new()`]
/// 2. Call [`Driver::run()`] once
/// 3. Drop
///
/// ## Isolation
///
/// Each domain gets its own fresh zone and record snapshot and its own
/// entry in the [`RunReport`]; nothing learned about one domain is reused
/// for the next.
pub struct Driver {
    /// Public IP source
    ip_source: Box<dyn IpSource>,

    /// DNS provider for zone and record reads
    provider: Arc<dyn DnsProvider>,

    /// Decision engine, sharing the provider for writes
    reconciler: Reconciler,

    /// Operator notifications
    notifier: Notifier,

    /// Domains to process
    records: Vec<String>,

    /// Event sender for progress reporting
    event_tx: mpsc::Sender<RunEvent>,
}

impl Driver {
    /// Create a new driver
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `notifier`: Operator notifier
    /// - `config`: Driver settings
    ///
    /// # Returns
    ///
    /// A tuple of (driver, event_receiver) where event_receiver yields progress events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Arc<dyn DnsProvider>,
        notifier: Notifier,
        config: DriverConfig,
    ) -> Result<(Self, mpsc::Receiver<RunEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let driver = Self {
            ip_source,
            reconciler: Reconciler::new(Arc::clone(&provider), config.ttl, config.apply_changes),
            provider,
            notifier,
            records: config.records,
            event_tx: tx,
        };

        Ok((driver, rx))
    }

    /// Run one reconciliation pass over all configured domains
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: All domains were attempted (some may have failed)
    /// - `Err(Error::Discovery)`: The public IPv4 address could not be determined
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();

        let discovered = match discover_public_ips(self.ip_source.as_ref()).await {
            Ok(discovered) => discovered,
            Err(e) => {
                self.notifier
                    .notify_failure(&format!("error getting current public IP: {e}"))
                    .await;
                return Err(e);
            }
        };
        self.emit_event(RunEvent::DiscoveryCompleted { discovered });

        let mut domains = Vec::with_capacity(self.records.len());
        for domain in &self.records {
            self.emit_event(RunEvent::DomainStarted {
                domain: domain.clone(),
            });

            let result = self.process_domain(domain, &discovered).await;
            match &result {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        self.report_outcome(outcome).await;
                    }
                }
                Err(e) => {
                    self.notifier.notify_failure(&domain_failure_message(domain, e)).await;
                    self.emit_event(RunEvent::DomainFailed {
                        domain: domain.clone(),
                        kind: e.kind(),
                        error: e.to_string(),
                    });
                }
            }

            domains.push(DomainReport {
                domain: domain.clone(),
                result,
            });
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            discovered,
            domains,
        };

        info!(
            "Run finished: {} domain(s), {} with failures, {} ms",
            report.domains.len(),
            report.failure_count(),
            (report.finished_at - report.started_at).num_milliseconds()
        );
        self.emit_event(RunEvent::RunFinished {
            domains: report.domains.len(),
            failures: report.failure_count(),
        });

        Ok(report)
    }

    /// Resolve, look up and reconcile one domain
    async fn process_domain(
        &self,
        domain: &str,
        discovered: &DiscoveredIps,
    ) -> Result<Vec<ReconciliationOutcome>> {
        debug!("Processing record: {}", domain);

        validate_domain_name(domain)
            .map_err(|e| Error::resolution(format!("invalid domain name '{}': {}", domain, e)))?;

        let zones = self.provider.list_zones().await?;
        let target = resolve_zone(domain, &zones)?;

        let records = self
            .provider
            .list_records(&target.zone_id)
            .await
            .map_err(|e| Error::lookup(format!("zone {}: {}", target.zone_name, e)))?;

        let existing_a = find_existing(&records, &target.label, IpFamily::V4);
        let existing_aaaa = find_existing(&records, &target.label, IpFamily::V6);

        Ok(self
            .reconciler
            .reconcile(domain, &target, discovered, existing_a, existing_aaaa)
            .await)
    }

    /// Emit the decision event and notify the operator of changes/failures
    async fn report_outcome(&self, outcome: &ReconciliationOutcome) {
        self.emit_event(RunEvent::Decision {
            domain: outcome.domain.clone(),
            family: outcome.family,
            action: outcome.action.clone(),
            outcome: outcome.kind(),
            dry_run: matches!(outcome.status, Status::DryRun),
        });

        let record_type = outcome.family.record_type();
        match &outcome.status {
            Status::Applied => {
                self.notifier
                    .notify(&format!(
                        "{} record was {}: {}",
                        record_type,
                        past_tense(&outcome.action),
                        outcome.domain
                    ))
                    .await;
            }
            Status::Failed(e) => {
                self.notifier
                    .notify_failure(&format!(
                        "error {} {} record for {}: {}",
                        progressive(&outcome.action),
                        record_type,
                        outcome.domain,
                        e
                    ))
                    .await;
            }
            Status::NotNeeded | Status::DryRun => {}
        }
    }

    /// Emit a progress event
    ///
    /// A dropped receiver (nobody listening) is not an error.
    fn emit_event(&self, event: RunEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("No event receiver, dropping event");
            }
        }
    }
}

fn domain_failure_message(domain: &str, error: &Error) -> String {
    match error.kind() {
        ErrorKind::Resolution => format!("error fetching zone ID for {domain}: {error}"),
        ErrorKind::Lookup => format!("error fetching A/AAAA records for {domain}: {error}"),
        _ => format!("error processing {domain}: {error}"),
    }
}

fn past_tense(action: &Action) -> &'static str {
    match action {
        Action::Unchanged => "unchanged",
        Action::Create { .. } => "created",
        Action::Update { .. } => "updated",
        Action::Delete { .. } => "deleted",
    }
}

fn progressive(action: &Action) -> &'static str {
    match action {
        Action::Unchanged => "checking",
        Action::Create { .. } => "creating",
        Action::Update { .. } => "updating",
        Action::Delete { .. } => "deleting",
    }
}
