//! Reconciliation engine
//!
//! The engine is responsible for:
//! - Deciding, per address family, which action converges a record on the
//!   discovered address
//! - Driving that decision through at most one provider write
//! - Isolating failures so one family never affects the other
//!
//! ## Decision table
//!
//! ```text
//! discovered  existing record        action
//! ----------  ---------------------  --------------------------
//! some(ip)    some, points to ip     unchanged
//! some(ip)    some, other value      update record to ip
//! some(ip)    none                   create record with ip
//! none        some                   delete record
//! none        none                   unchanged
//! ```
//!
//! A ↔ IPv4 and AAAA ↔ IPv6 are evaluated independently and identically.
//! In dry-run mode the decision is reported but no write is issued.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::model::{DiscoveredIps, IpFamily, Record, RecordData};
use crate::resolver::ResolvedDomain;
use crate::traits::DnsProvider;

/// Action chosen for one (domain, family) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Record already matches the desired state
    Unchanged,
    /// No record exists, one must be created
    Create {
        value: IpAddr,
    },
    /// A record exists with a different value
    Update {
        record_id: String,
        previous: String,
        value: IpAddr,
    },
    /// A record exists but the family has no address
    Delete {
        record_id: String,
        previous: String,
    },
}

impl Action {
    /// Apply the decision table to one family
    ///
    /// # Parameters
    ///
    /// - `desired`: Discovered address of the family, if any
    /// - `existing`: The record currently stored by the provider, if any
    pub fn plan(desired: Option<IpAddr>, existing: Option<&Record>) -> Self {
        match (desired, existing) {
            (Some(ip), Some(record)) if record.points_to(ip) => Self::Unchanged,
            (Some(ip), Some(record)) => Self::Update {
                record_id: record.id.clone(),
                previous: record.value.clone(),
                value: ip,
            },
            (Some(ip), None) => Self::Create { value: ip },
            (None, Some(record)) => Self::Delete {
                record_id: record.id.clone(),
                previous: record.value.clone(),
            },
            (None, None) => Self::Unchanged,
        }
    }

    /// Whether carrying out this action needs a provider write
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => f.write_str("unchanged"),
            Self::Create { value } => write!(f, "create ({value})"),
            Self::Update { previous, value, .. } => write!(f, "update ({previous} -> {value})"),
            Self::Delete { previous, .. } => write!(f, "delete ({previous})"),
        }
    }
}

/// What happened to a planned action
#[derive(Debug)]
pub enum Status {
    /// Nothing to do
    NotNeeded,
    /// The provider write succeeded
    Applied,
    /// Dry-run: the write was intentionally skipped
    DryRun,
    /// The provider write failed
    Failed(Error),
}

/// Coarse outcome of one (domain, family) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Unchanged,
    Created,
    Updated,
    Deleted,
    Failed,
}

/// Result of reconciling one family of one domain
#[derive(Debug)]
pub struct ReconciliationOutcome {
    pub domain: String,
    pub family: IpFamily,
    pub action: Action,
    pub status: Status,
}

impl ReconciliationOutcome {
    /// Coarse outcome
    ///
    /// Dry-run outcomes report the intended action (`Updated` for a planned
    /// update); check [`Self::status`] to tell them apart from applied ones.
    pub fn kind(&self) -> OutcomeKind {
        if let Status::Failed(_) = self.status {
            return OutcomeKind::Failed;
        }
        match self.action {
            Action::Unchanged => OutcomeKind::Unchanged,
            Action::Create { .. } => OutcomeKind::Created,
            Action::Update { .. } => OutcomeKind::Updated,
            Action::Delete { .. } => OutcomeKind::Deleted,
        }
    }

    /// The write error, if the action failed
    pub fn error(&self) -> Option<&Error> {
        match &self.status {
            Status::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Pick the existing record of a family for a label
///
/// Labels compare ASCII case-insensitively. If the provider returned
/// several matches the first one in response order is used.
pub fn find_existing<'a>(records: &'a [Record], label: &str, family: IpFamily) -> Option<&'a Record> {
    let record_type = family.record_type();
    records
        .iter()
        .find(|r| r.record_type == record_type && r.name.eq_ignore_ascii_case(label))
}

/// Reconciliation engine
///
/// Holds the provider, the TTL used for writes and the apply/dry-run mode.
/// It never reads back what it wrote.
pub struct Reconciler {
    /// DNS provider for record writes
    provider: Arc<dyn DnsProvider>,

    /// TTL for created and updated records
    ttl: u32,

    /// `false` selects dry-run mode
    apply_changes: bool,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `ttl`: TTL for created and updated records
    /// - `apply_changes`: `false` computes and reports actions without writing
    pub fn new(provider: Arc<dyn DnsProvider>, ttl: u32, apply_changes: bool) -> Self {
        Self {
            provider,
            ttl,
            apply_changes,
        }
    }

    /// Whether writes are issued
    pub fn applies_changes(&self) -> bool {
        self.apply_changes
    }

    /// Reconcile both families of one domain
    ///
    /// # Parameters
    ///
    /// - `domain`: The configured FQDN (for reporting)
    /// - `target`: Owning zone and label of the domain
    /// - `discovered`: Current public addresses
    /// - `existing_a`: Current A record, if any
    /// - `existing_aaaa`: Current AAAA record, if any
    ///
    /// # Returns
    ///
    /// One outcome per family, A first. Write failures are captured in the
    /// outcome and never stop the other family from being processed.
    pub async fn reconcile(
        &self,
        domain: &str,
        target: &ResolvedDomain,
        discovered: &DiscoveredIps,
        existing_a: Option<&Record>,
        existing_aaaa: Option<&Record>,
    ) -> Vec<ReconciliationOutcome> {
        let mut outcomes = Vec::with_capacity(2);
        for (family, existing) in [(IpFamily::V4, existing_a), (IpFamily::V6, existing_aaaa)] {
            let action = Action::plan(discovered.get(family), existing);
            outcomes.push(self.reconcile_family(domain, target, family, action).await);
        }
        outcomes
    }

    /// Carry out one planned action
    async fn reconcile_family(
        &self,
        domain: &str,
        target: &ResolvedDomain,
        family: IpFamily,
        action: Action,
    ) -> ReconciliationOutcome {
        let record_type = family.record_type();

        let status = if !action.is_write() {
            debug!("{} record is current for {}", record_type, domain);
            Status::NotNeeded
        } else if !self.apply_changes {
            info!("[DRY-RUN] {} record of {} would {}", record_type, domain, action);
            Status::DryRun
        } else {
            match self.apply(target, family, &action).await {
                Ok(()) => {
                    info!("{} record of {}: {}", record_type, domain, action);
                    Status::Applied
                }
                Err(e) => {
                    error!("{} record of {}: {} failed: {}", record_type, domain, action, e);
                    Status::Failed(e)
                }
            }
        };

        ReconciliationOutcome {
            domain: domain.to_string(),
            family,
            action,
            status,
        }
    }

    /// Issue the single provider write for an action
    async fn apply(&self, target: &ResolvedDomain, family: IpFamily, action: &Action) -> Result<()> {
        let data = |value: &IpAddr| RecordData {
            record_type: family.record_type(),
            name: target.label.clone(),
            value: value.to_string(),
            ttl: self.ttl,
        };

        match action {
            Action::Unchanged => Ok(()),
            Action::Create { value } => {
                self.provider
                    .create_record(&target.zone_id, &data(value))
                    .await
            }
            Action::Update {
                record_id, value, ..
            } => {
                self.provider
                    .update_record(&target.zone_id, record_id, &data(value))
                    .await
            }
            Action::Delete { record_id, .. } => self.provider.delete_record(record_id).await,
        }
    }
}
