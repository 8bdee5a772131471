//! Contract Test: Reconciliation Engine
//!
//! Constraints verified:
//! - Every (discovered, existing) pair maps to exactly one decision-table row
//! - A and AAAA are reconciled independently
//! - Dry-run reports intended actions but issues no writes
//! - A failing write on one family does not block the other
//!
//! If this test fails, the decision engine is broken.

mod common;

use common::*;
use hdns_core::engine::find_existing;
use hdns_core::{
    DiscoveredIps, DnsProvider, IpFamily, OutcomeKind, Reconciler, RecordType, ResolvedDomain,
    Status,
};
use std::sync::Arc;

fn target() -> ResolvedDomain {
    ResolvedDomain {
        zone_id: "z1".to_string(),
        zone_name: "example.com".to_string(),
        label: "a".to_string(),
    }
}

fn discovered(v4: Option<&str>, v6: Option<&str>) -> DiscoveredIps {
    DiscoveredIps {
        v4: v4.map(|ip| ip.parse().unwrap()),
        v6: v6.map(|ip| ip.parse().unwrap()),
    }
}

async fn run_once(
    provider: &Arc<MockDnsProvider>,
    ips: DiscoveredIps,
    apply_changes: bool,
) -> Vec<hdns_core::ReconciliationOutcome> {
    let records = provider.list_records("z1").await.unwrap();
    let reconciler = Reconciler::new(provider.clone(), 300, apply_changes);
    reconciler
        .reconcile(
            "a.example.com",
            &target(),
            &ips,
            find_existing(&records, "a", IpFamily::V4),
            find_existing(&records, "a", IpFamily::V6),
        )
        .await
}

#[tokio::test]
async fn current_records_are_left_untouched() {
    let provider = Arc::new(
        MockDnsProvider::new()
            .with_zone("z1", "example.com")
            .with_record("z1", "ra", RecordType::A, "a", "1.2.3.4")
            .with_record("z1", "r6", RecordType::Aaaa, "a", "2001:db8::1"),
    );

    let outcomes = run_once(&provider, discovered(Some("1.2.3.4"), Some("2001:db8::1")), true).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.kind() == OutcomeKind::Unchanged));
    assert!(outcomes.iter().all(|o| matches!(o.status, Status::NotNeeded)));
    assert!(provider.write_calls().is_empty());
}

#[tokio::test]
async fn every_decision_table_row() {
    // (discovered v4, existing A value, expected kind)
    let rows = [
        (Some("1.2.3.4"), Some("1.2.3.4"), OutcomeKind::Unchanged),
        (Some("1.2.3.4"), Some("5.6.7.8"), OutcomeKind::Updated),
        (Some("1.2.3.4"), None, OutcomeKind::Created),
        (None, Some("5.6.7.8"), OutcomeKind::Deleted),
        (None, None, OutcomeKind::Unchanged),
    ];

    for (ip, existing, expected) in rows {
        let mut provider = MockDnsProvider::new().with_zone("z1", "example.com");
        if let Some(value) = existing {
            provider = provider.with_record("z1", "ra", RecordType::A, "a", value);
        }
        let provider = Arc::new(provider);

        let outcomes = run_once(&provider, discovered(ip, None), true).await;
        let a = outcomes.iter().find(|o| o.family == IpFamily::V4).unwrap();
        assert_eq!(a.kind(), expected, "row ({ip:?}, {existing:?})");

        let writes = provider.write_calls().len();
        let expected_writes = usize::from(expected != OutcomeKind::Unchanged);
        assert_eq!(writes, expected_writes, "row ({ip:?}, {existing:?})");
    }
}

#[tokio::test]
async fn missing_ipv6_deletes_aaaa_and_keeps_a_independent() {
    let provider = Arc::new(
        MockDnsProvider::new()
            .with_zone("z1", "example.com")
            .with_record("z1", "ra", RecordType::A, "a", "1.2.3.4")
            .with_record("z1", "r6", RecordType::Aaaa, "a", "::1"),
    );

    let outcomes = run_once(&provider, discovered(Some("1.2.3.4"), None), true).await;

    let a = outcomes.iter().find(|o| o.family == IpFamily::V4).unwrap();
    let aaaa = outcomes.iter().find(|o| o.family == IpFamily::V6).unwrap();
    assert_eq!(a.kind(), OutcomeKind::Unchanged);
    assert_eq!(aaaa.kind(), OutcomeKind::Deleted);
    assert_eq!(
        provider.write_calls(),
        vec![ProviderCall::Delete {
            record_id: "r6".to_string()
        }]
    );
    assert!(find_existing(&provider.records("z1"), "a", IpFamily::V6).is_none());
}

#[tokio::test]
async fn dry_run_reports_update_without_writing() {
    let provider = Arc::new(
        MockDnsProvider::new()
            .with_zone("z1", "example.com")
            .with_record("z1", "ra", RecordType::A, "a", "5.6.7.8"),
    );

    let outcomes = run_once(&provider, discovered(Some("1.2.3.4"), Some("2001:db8::1")), false).await;

    let a = outcomes.iter().find(|o| o.family == IpFamily::V4).unwrap();
    assert_eq!(a.kind(), OutcomeKind::Updated);
    assert!(matches!(a.status, Status::DryRun));

    let aaaa = outcomes.iter().find(|o| o.family == IpFamily::V6).unwrap();
    assert_eq!(aaaa.kind(), OutcomeKind::Created);
    assert!(matches!(aaaa.status, Status::DryRun));

    assert!(provider.write_calls().is_empty(), "dry-run must not write");
    assert_eq!(provider.records("z1")[0].value, "5.6.7.8");
}

#[tokio::test]
async fn failed_a_write_does_not_block_aaaa() {
    let provider = Arc::new(
        MockDnsProvider::new()
            .with_zone("z1", "example.com")
            .with_record("z1", "ra", RecordType::A, "a", "5.6.7.8")
            .with_record("z1", "r6", RecordType::Aaaa, "a", "2001:db8::2")
            .failing_writes(RecordType::A),
    );

    let outcomes = run_once(&provider, discovered(Some("1.2.3.4"), Some("2001:db8::1")), true).await;

    let a = outcomes.iter().find(|o| o.family == IpFamily::V4).unwrap();
    assert_eq!(a.kind(), OutcomeKind::Failed);
    assert_eq!(a.error().and_then(|e| e.status()), Some(500));

    let aaaa = outcomes.iter().find(|o| o.family == IpFamily::V6).unwrap();
    assert_eq!(aaaa.kind(), OutcomeKind::Updated);
    assert!(matches!(aaaa.status, Status::Applied));

    let stored = provider.records("z1");
    assert_eq!(find_existing(&stored, "a", IpFamily::V6).unwrap().value, "2001:db8::1");
    assert_eq!(find_existing(&stored, "a", IpFamily::V4).unwrap().value, "5.6.7.8");
}

#[tokio::test]
async fn writes_carry_label_value_and_ttl() {
    let provider = Arc::new(MockDnsProvider::new().with_zone("z1", "example.com"));

    run_once(&provider, discovered(Some("9.9.9.9"), Some("2001:db8::9")), true).await;

    let writes = provider.write_calls();
    assert_eq!(writes.len(), 2);
    let ProviderCall::Create { zone_id, data } = &writes[0] else {
        panic!("expected create, got {:?}", writes[0]);
    };
    assert_eq!(zone_id, "z1");
    assert_eq!(data.record_type, RecordType::A);
    assert_eq!(data.name, "a");
    assert_eq!(data.value, "9.9.9.9");
    assert_eq!(data.ttl, 300);

    let ProviderCall::Create { data, .. } = &writes[1] else {
        panic!("expected create, got {:?}", writes[1]);
    };
    assert_eq!(data.record_type, RecordType::Aaaa);
}

#[tokio::test]
async fn reconciling_twice_writes_only_once() {
    let provider = Arc::new(
        MockDnsProvider::new()
            .with_zone("z1", "example.com")
            .with_record("z1", "ra", RecordType::A, "a", "5.6.7.8")
            .with_record("z1", "r6", RecordType::Aaaa, "a", "::1"),
    );
    let ips = discovered(Some("1.2.3.4"), None);

    run_once(&provider, ips, true).await;
    assert_eq!(provider.write_calls().len(), 2);

    provider.clear_calls();
    let second = run_once(&provider, ips, true).await;
    assert!(second.iter().all(|o| o.kind() == OutcomeKind::Unchanged));
    assert!(provider.write_calls().is_empty());
}
