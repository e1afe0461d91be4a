//! Reconciliation tests against a scripted in-memory remote store.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use chrono::Utc;
use serde_json::Value;

use crate::{
  Error,
  cache::{LocalCache, MemoryCache},
  content::{Announcement, Case, Service, Setting},
  entity::{Entity, Identity, RecordId, Row, Table, compare_json, to_row},
  reconcile::{AuditOutcome, FallbackReason, NoticeLevel, Origin, Reconciler, Status},
  site::Site,
  store::{AuditAction, AuditEntry, NewAuditEntry, RemoteStore},
};

// ─── Scripted store ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("scripted failure: {0}")]
struct Down(&'static str);

#[derive(Default, Clone, Copy)]
struct Failures {
  reads:  bool,
  writes: bool,
  audit:  bool,
  health: bool,
  upsert: bool,
}

/// An in-memory remote store whose operations can be made to fail.
#[derive(Default)]
struct ScriptedStore {
  tables: Mutex<HashMap<&'static str, Vec<Row>>>,
  audit:  Mutex<Vec<AuditEntry>>,
  fail:   Mutex<Failures>,
}

impl ScriptedStore {
  fn failing(&self, f: impl FnOnce(&mut Failures)) { f(&mut self.fail.lock().unwrap()); }

  fn heal(&self) { *self.fail.lock().unwrap() = Failures::default(); }

  fn seed<E: Entity>(&self, records: &[E]) {
    let rows = records.iter().map(|r| to_row(r).unwrap()).collect();
    self.tables.lock().unwrap().insert(E::TABLE.name, rows);
  }

  fn rows(&self, table: Table) -> Vec<Row> {
    self.tables.lock().unwrap().get(table.name).cloned().unwrap_or_default()
  }

  fn audit_entries(&self) -> Vec<AuditEntry> { self.audit.lock().unwrap().clone() }

  fn check(&self, pick: fn(&Failures) -> bool, what: &'static str) -> Result<(), Down> {
    if pick(&self.fail.lock().unwrap()) { Err(Down(what)) } else { Ok(()) }
  }
}

fn matches_id(row: &Row, table: Table, id: &RecordId) -> bool {
  row.get(table.id_field).and_then(RecordId::from_json).as_ref() == Some(id)
}

impl RemoteStore for ScriptedStore {
  type Error = Down;

  async fn select(&self, table: Table) -> Result<Vec<Row>, Down> {
    self.check(|f| f.reads, "select")?;
    let field = table.order.field();
    let mut rows = self.rows(table);
    rows.sort_by(|a, b| {
      let ord = compare_json(
        a.get(field).unwrap_or(&Value::Null),
        b.get(field).unwrap_or(&Value::Null),
      );
      if table.order.is_descending() { ord.reverse() } else { ord }
    });
    Ok(rows)
  }

  async fn insert(&self, table: Table, mut row: Row) -> Result<Row, Down> {
    self.check(|f| f.writes, "insert")?;
    let mut tables = self.tables.lock().unwrap();
    let rows = tables.entry(table.name).or_default();
    if table.identity == Identity::Serial {
      let next = rows
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .max()
        .unwrap_or(0)
        + 1;
      row.insert("id".into(), Value::from(next));
    }
    row.insert("created_at".into(), Value::from(Utc::now().to_rfc3339()));
    rows.push(row.clone());
    Ok(row)
  }

  async fn update(&self, table: Table, id: RecordId, mut row: Row) -> Result<bool, Down> {
    self.check(|f| f.writes, "update")?;
    let mut tables = self.tables.lock().unwrap();
    let Some(slot) = tables
      .entry(table.name)
      .or_default()
      .iter_mut()
      .find(|r| matches_id(r, table, &id))
    else {
      return Ok(false);
    };
    row.insert(table.id_field.into(), id.to_json());
    if let Some(created) = slot.get("created_at").cloned() {
      row.insert("created_at".into(), created);
    }
    *slot = row;
    Ok(true)
  }

  async fn delete(&self, table: Table, id: RecordId) -> Result<bool, Down> {
    self.check(|f| f.writes, "delete")?;
    let mut tables = self.tables.lock().unwrap();
    let rows = tables.entry(table.name).or_default();
    let before = rows.len();
    rows.retain(|r| !matches_id(r, table, &id));
    Ok(rows.len() < before)
  }

  async fn upsert(&self, table: Table, rows: Vec<Row>) -> Result<(), Down> {
    self.check(|f| f.upsert, "upsert")?;
    let mut tables = self.tables.lock().unwrap();
    let stored = tables.entry(table.name).or_default();
    for mut row in rows {
      let id = row
        .get(table.id_field)
        .and_then(RecordId::from_json)
        .ok_or(Down("upsert without id"))?;
      match stored.iter_mut().find(|r| matches_id(r, table, &id)) {
        Some(slot) => {
          if let Some(created) = slot.get("created_at").cloned() {
            row.insert("created_at".into(), created);
          }
          *slot = row;
        }
        None => {
          row.insert("created_at".into(), Value::from(Utc::now().to_rfc3339()));
          stored.push(row);
        }
      }
    }
    Ok(())
  }

  async fn health_check(&self) -> Result<(), Down> { self.check(|f| f.health, "health") }

  async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry, Down> {
    self.check(|f| f.audit, "audit")?;
    let mut log = self.audit.lock().unwrap();
    let stored = AuditEntry {
      id:          log.len() as i64 + 1,
      action:      entry.action,
      entity:      entry.entity,
      description: entry.description,
      created_at:  Utc::now(),
    };
    log.push(stored.clone());
    Ok(stored)
  }

  async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, Down> {
    self.check(|f| f.reads, "audit read")?;
    Ok(self.audit.lock().unwrap().iter().rev().take(limit).cloned().collect())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn setup<E: Entity>() -> (Arc<ScriptedStore>, Arc<MemoryCache>, Reconciler<E, ScriptedStore, MemoryCache>) {
  let remote = Arc::new(ScriptedStore::default());
  let cache = Arc::new(MemoryCache::new());
  let reconciler = Reconciler::new(remote.clone(), cache.clone());
  (remote, cache, reconciler)
}

fn service(title: &str, sort_order: i64) -> Service {
  Service { title: title.into(), sort_order, ..Default::default() }
}

fn case(title: &str) -> Case {
  Case { title: title.into(), ..Default::default() }
}

fn without_timestamp(mut s: Service) -> Service {
  s.created_at = None;
  s
}

// ─── Read path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_remote_serves_the_six_default_services_without_a_notice() {
  let (_, _, services) = setup::<Service>();

  let snapshot = services.fetch().await;

  assert_eq!(snapshot.records.len(), 6);
  assert_eq!(snapshot.origin, Origin::Defaults);
  assert_eq!(
    snapshot.status,
    Status::LocalBacked { reason: FallbackReason::RemoteEmpty }
  );
  assert!(snapshot.notice.is_none());
}

#[tokio::test]
async fn unreachable_remote_serves_the_default_announcement_with_an_error() {
  let (remote, _, announcements) = setup::<Announcement>();
  remote.failing(|f| f.reads = true);

  let snapshot = announcements.fetch().await;

  assert_eq!(snapshot.records.len(), 1);
  assert_eq!(snapshot.origin, Origin::Defaults);
  assert!(announcements.status().is_local());
  assert_eq!(snapshot.notice.unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn unreachable_remote_prefers_the_cache_over_defaults() {
  let (remote, cache, announcements) = setup::<Announcement>();
  remote.failing(|f| f.reads = true);

  let mut cached = Announcement::defaults().remove(0);
  cached.id = 7;
  cached.title = "Cached news".into();
  cache
    .set(Announcement::TABLE.cache_key, &serde_json::to_string(&[cached]).unwrap())
    .unwrap();

  let snapshot = announcements.fetch().await;
  assert_eq!(snapshot.origin, Origin::Cache);
  assert_eq!(snapshot.records[0].title, "Cached news");
}

#[tokio::test]
async fn corrupt_cache_falls_through_to_defaults() {
  let (remote, cache, services) = setup::<Service>();
  remote.failing(|f| f.reads = true);
  cache.set(Service::TABLE.cache_key, "{not json").unwrap();

  let snapshot = services.fetch().await;
  assert_eq!(snapshot.origin, Origin::Defaults);
  assert_eq!(snapshot.records, Service::defaults());
}

#[tokio::test]
async fn empty_cached_array_counts_as_absent() {
  let (_, cache, services) = setup::<Service>();
  cache.set(Service::TABLE.cache_key, "[]").unwrap();

  let snapshot = services.fetch().await;
  assert_eq!(snapshot.origin, Origin::Defaults);
}

#[tokio::test]
async fn every_section_has_something_to_show_when_the_remote_is_down() {
  let remote = Arc::new(ScriptedStore::default());
  remote.failing(|f| f.reads = true);
  let site = Site::new(remote, Arc::new(MemoryCache::new()));

  assert!(!site.announcements.fetch().await.records.is_empty());
  assert!(!site.services.fetch().await.records.is_empty());
  assert!(!site.cases.fetch().await.records.is_empty());
  assert!(!site.links.fetch().await.records.is_empty());
  assert!(!site.home_projects.fetch().await.records.is_empty());
  assert!(!site.settings.fetch().await.records.is_empty());
  assert!(!site.theme.fetch().await.records.is_empty());
  assert!(site.statuses().iter().all(|s| s.status.is_local()));
}

#[tokio::test]
async fn remote_records_are_authoritative_and_merged_with_defaults() {
  let (remote, _, services) = setup::<Service>();
  let mut row = service("Brand strategy", 2);
  row.id = 1;
  let mut other = service("Workshop", 1);
  other.id = 40;
  remote.seed(&[row, other]);

  let snapshot = services.fetch().await;

  assert_eq!(snapshot.status, Status::RemoteBacked);
  assert_eq!(snapshot.origin, Origin::Remote);
  let titles: Vec<_> = snapshot.records.iter().map(|s| s.title.as_str()).collect();
  assert_eq!(titles, ["Workshop", "Brand strategy"]);
  assert!(snapshot.records[1].detail.is_some());
  assert!(snapshot.records[0].detail.is_none());
}

#[tokio::test]
async fn undecodable_remote_rows_count_as_unreachable() {
  let (remote, _, services) = setup::<Service>();
  let mut row = Row::new();
  row.insert("id".into(), Value::from("not a number"));
  remote.tables.lock().unwrap().insert("services", vec![row]);

  let snapshot = services.fetch().await;
  assert_eq!(
    snapshot.status,
    Status::LocalBacked { reason: FallbackReason::RemoteUnreachable }
  );
}

// ─── Write path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn remote_create_adds_exactly_one_record_and_audits() {
  let (remote, _, services) = setup::<Service>();
  remote.seed(&[Service { id: 1, ..service("Brand strategy", 1) }]);
  let before = services.fetch().await.records.len();

  let outcome = services.create(service("Workshop", 5)).await.unwrap();

  let created = outcome.record.unwrap();
  assert_eq!(created.id, 2);
  assert!(created.created_at.is_some());
  assert_eq!(outcome.audit, AuditOutcome::Recorded);
  assert!(outcome.notice.is_none());

  let after = services.fetch().await.records;
  assert_eq!(after.len(), before + 1);
  assert!(after.iter().any(|s| s.id == created.id));

  let log = remote.audit_entries();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].action, AuditAction::Create);
}

#[tokio::test]
async fn audit_failure_does_not_fail_the_mutation() {
  let (remote, _, services) = setup::<Service>();
  remote.seed(&[Service { id: 1, ..service("Brand strategy", 1) }]);
  services.fetch().await;
  remote.failing(|f| f.audit = true);

  let outcome = services.create(service("Workshop", 5)).await.unwrap();

  assert_eq!(outcome.audit, AuditOutcome::Failed);
  assert_eq!(outcome.snapshot.records.len(), 2);
  assert!(remote.audit_entries().is_empty());
}

#[tokio::test]
async fn remote_update_and_delete() {
  let (remote, _, services) = setup::<Service>();
  remote.seed(&[
    Service { id: 1, ..service("Brand strategy", 1) },
    Service { id: 2, ..service("Workshop", 2) },
  ]);
  services.fetch().await;

  let updated = services
    .update(RecordId::Serial(2), service("Workshop (2 days)", 2))
    .await
    .unwrap();
  assert!(
    updated
      .snapshot
      .records
      .iter()
      .any(|s| s.id == 2 && s.title == "Workshop (2 days)")
  );

  let deleted = services.delete(RecordId::Serial(1)).await.unwrap();
  assert!(deleted.record.is_none());
  assert!(deleted.snapshot.records.iter().all(|s| s.id != 1));
  assert!(services.fetch().await.records.iter().all(|s| s.id != 1));
  assert_eq!(remote.audit_entries().len(), 2);
}

#[tokio::test]
async fn failed_remote_write_degrades_to_local_with_a_warning() {
  let (remote, cache, services) = setup::<Service>();
  remote.seed(&[Service { id: 1, ..service("Brand strategy", 1) }]);
  services.fetch().await;
  remote.failing(|f| f.writes = true);

  let outcome = services.create(service("Workshop", 9)).await.unwrap();

  assert_eq!(outcome.notice.unwrap().level, NoticeLevel::Warning);
  assert_eq!(outcome.audit, AuditOutcome::Skipped);
  assert!(services.status().is_local());
  // The local copy starts from the remote read, not from the defaults.
  let created = outcome.record.unwrap();
  assert_eq!(created.id, 2);
  assert_eq!(outcome.snapshot.records.len(), 2);
  assert!(cache.get(Service::TABLE.cache_key).is_some());
  assert!(remote.audit_entries().is_empty());
  assert_eq!(remote.rows(Service::TABLE).len(), 1);
}

#[tokio::test]
async fn local_backed_writes_never_touch_the_remote_store() {
  let (remote, _, services) = setup::<Service>();
  remote.failing(|f| f.reads = true);
  let before = services.fetch().await.records.len();

  let outcome = services.create(service("Workshop", 9)).await.unwrap();
  assert_eq!(outcome.notice.unwrap().level, NoticeLevel::Warning);
  assert_eq!(outcome.audit, AuditOutcome::Skipped);
  assert_eq!(outcome.snapshot.records.len(), before + 1);

  let snapshot = services.fetch().await;
  assert_eq!(snapshot.origin, Origin::Cache);
  assert_eq!(snapshot.records.len(), before + 1);
  assert!(remote.rows(Service::TABLE).is_empty());
}

#[tokio::test]
async fn empty_remote_still_accepts_writes() {
  let (remote, _, services) = setup::<Service>();
  let shown = services.fetch().await;
  assert_eq!(
    shown.status,
    Status::LocalBacked { reason: FallbackReason::RemoteEmpty }
  );

  let outcome = services.create(service("Workshop", 1)).await.unwrap();

  assert!(outcome.notice.is_none());
  assert_eq!(outcome.audit, AuditOutcome::Recorded);
  assert_eq!(outcome.snapshot.status, Status::RemoteBacked);
  assert_eq!(remote.rows(Service::TABLE).len(), 1);
  assert_eq!(remote.audit_entries().len(), 1);
}

#[tokio::test]
async fn degraded_write_starts_from_the_records_last_read_remotely() {
  let (remote, _, services) = setup::<Service>();
  remote.seed(&[
    Service { id: 1, ..service("Edited remotely A", 1) },
    Service { id: 2, ..service("Edited remotely B", 2) },
  ]);
  services.fetch().await;
  remote.failing(|f| f.writes = true);

  let outcome = services
    .update(RecordId::Serial(2), service("Offline B", 2))
    .await
    .unwrap();
  assert!(outcome.notice.is_some());
  let titles: Vec<_> = outcome.snapshot.records.iter().map(|s| s.title.as_str()).collect();
  assert_eq!(titles, ["Edited remotely A", "Offline B"]);

  remote.heal();
  let report = services.sync(true).await.unwrap();

  assert_eq!(report.pushed, 2);
  let stored: Vec<_> = remote
    .rows(Service::TABLE)
    .iter()
    .map(|r| r["title"].as_str().unwrap_or_default().to_owned())
    .collect();
  assert_eq!(stored, ["Edited remotely A", "Offline B"]);
}

#[tokio::test]
async fn degraded_update_of_a_remote_only_id_is_kept_locally() {
  let (remote, cache, services) = setup::<Service>();
  remote.seed(&[Service { id: 42, ..service("Remote only", 1) }]);
  services.fetch().await;
  remote.failing(|f| f.writes = true);

  let outcome = services
    .update(RecordId::Serial(42), service("Edited offline", 1))
    .await
    .unwrap();

  assert_eq!(outcome.record.unwrap().id, 42);
  let cached: Vec<Service> =
    serde_json::from_str(&cache.get(Service::TABLE.cache_key).unwrap()).unwrap();
  assert_eq!(cached.len(), 1);
  assert_eq!(cached[0].title, "Edited offline");
}

#[tokio::test]
async fn remote_update_or_delete_of_a_missing_id_is_not_found() {
  let (remote, _, services) = setup::<Service>();
  remote.seed(&[Service { id: 1, ..service("Brand strategy", 1) }]);
  services.fetch().await;

  let updated = services.update(RecordId::Serial(999), service("Ghost", 1)).await;
  assert!(matches!(updated, Err(Error::RecordNotFound { .. })));
  let deleted = services.delete(RecordId::Serial(999)).await;
  assert!(matches!(deleted, Err(Error::RecordNotFound { .. })));

  assert!(remote.audit_entries().is_empty());
  assert_eq!(services.status(), Status::RemoteBacked);
}

#[tokio::test]
async fn update_audit_names_the_target_id() {
  let (remote, _, services) = setup::<Service>();
  remote.seed(&[Service { id: 3, ..service("Content plan", 1) }]);
  services.fetch().await;

  let body = Service { id: 0, ..service("Content plan v2", 1) };
  services.update(RecordId::Serial(3), body).await.unwrap();

  let log = remote.audit_entries();
  assert_eq!(log[0].description, "updated \"Content plan v2\" (3)");
}

#[tokio::test]
async fn local_create_with_no_existing_cases_gets_id_one() {
  let (remote, _, cases) = setup::<Case>();
  let cases = cases.with_defaults(Vec::new());
  remote.failing(|f| f.reads = true);
  cases.fetch().await;

  let outcome = cases.create(case("First case")).await.unwrap();
  assert_eq!(outcome.record.unwrap().id, 1);
}

#[tokio::test]
async fn local_update_and_delete_by_id() {
  let (remote, _, cases) = setup::<Case>();
  remote.failing(|f| f.reads = true);
  cases.fetch().await;

  let outcome = cases.update(RecordId::Serial(2), case("Renamed")).await.unwrap();
  assert_eq!(outcome.record.unwrap().id, 2);
  assert!(outcome.snapshot.records.iter().any(|c| c.title == "Renamed"));

  let outcome = cases.delete(RecordId::Serial(2)).await.unwrap();
  assert!(outcome.snapshot.records.iter().all(|c| c.id != 2));

  let missing = cases.delete(RecordId::Serial(2)).await;
  assert!(matches!(missing, Err(Error::RecordNotFound { .. })));
}

#[tokio::test]
async fn local_keyed_create_replaces_an_existing_key() {
  let (remote, _, settings) = setup::<Setting>();
  remote.failing(|f| f.reads = true);
  let before = settings.fetch().await.records.len();

  let phone = Setting { key: "phone".into(), value: "+1 555 0100".into(), ..Default::default() };
  let outcome = settings.create(phone).await.unwrap();

  assert_eq!(outcome.snapshot.records.len(), before);
  let stored = outcome.snapshot.records.iter().find(|s| s.key == "phone").unwrap();
  assert_eq!(stored.value, "+1 555 0100");
}

// ─── Sync ────────────────────────────────────────────────────────────────────

/// Put `services` into local-backed mode with one locally created record.
async fn offline_edit(
  remote: &ScriptedStore,
  services: &Reconciler<Service, ScriptedStore, MemoryCache>,
) -> Service {
  remote.failing(|f| f.reads = true);
  services.fetch().await;
  let outcome = services.create(service("Offline workshop", 10)).await.unwrap();
  outcome.record.unwrap()
}

#[tokio::test]
async fn sync_requires_confirmation() {
  let (_, _, services) = setup::<Service>();
  assert!(matches!(
    services.sync(false).await,
    Err(Error::ConfirmationRequired(_))
  ));
}

#[tokio::test]
async fn sync_aborts_when_the_health_check_fails() {
  let (remote, cache, services) = setup::<Service>();
  offline_edit(&remote, &services).await;
  remote.failing(|f| f.health = true);
  let cached = cache.get(Service::TABLE.cache_key);

  let result = services.sync(true).await;

  assert!(matches!(result, Err(Error::SyncPrecondition { .. })));
  assert_eq!(cache.get(Service::TABLE.cache_key), cached);
  assert!(remote.rows(Service::TABLE).is_empty());
  assert!(services.status().is_local());
}

#[tokio::test]
async fn failed_upsert_leaves_everything_local() {
  let (remote, cache, services) = setup::<Service>();
  offline_edit(&remote, &services).await;
  remote.heal();
  remote.failing(|f| f.upsert = true);
  let cached = cache.get(Service::TABLE.cache_key);

  let result = services.sync(true).await;

  assert!(matches!(result, Err(Error::Sync { .. })));
  assert_eq!(cache.get(Service::TABLE.cache_key), cached);
  assert!(services.status().is_local());
}

#[tokio::test]
async fn synced_record_round_trips_through_the_remote_store() {
  let (remote, _, services) = setup::<Service>();
  let written = offline_edit(&remote, &services).await;
  remote.heal();

  let report = services.sync(true).await.unwrap();

  // The six untouched defaults stay local.
  assert_eq!(report.pushed, 1);
  assert_eq!(remote.rows(Service::TABLE).len(), 1);
  assert_eq!(report.snapshot.status, Status::RemoteBacked);
  assert_eq!(services.status(), Status::RemoteBacked);
  assert_eq!(report.audit, AuditOutcome::Recorded);

  let fetched = report
    .snapshot
    .records
    .into_iter()
    .find(|s| s.id == written.id)
    .unwrap();
  assert!(fetched.created_at.is_some());
  assert_eq!(without_timestamp(fetched), written);
}

#[tokio::test]
async fn syncing_twice_leaves_the_remote_set_unchanged() {
  let (remote, _, services) = setup::<Service>();
  offline_edit(&remote, &services).await;
  remote.heal();

  services.sync(true).await.unwrap();
  let first = remote.rows(Service::TABLE);
  services.sync(true).await.unwrap();
  let second = remote.rows(Service::TABLE);

  assert_eq!(first, second);
}

#[tokio::test]
async fn sync_with_an_empty_cache_pushes_nothing() {
  let (remote, _, services) = setup::<Service>();

  let report = services.sync(true).await.unwrap();

  assert_eq!(report.pushed, 0);
  assert_eq!(report.audit, AuditOutcome::Skipped);
  assert!(remote.rows(Service::TABLE).is_empty());
}

// ─── Site ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn site_reads_the_audit_log_newest_first() {
  let remote = Arc::new(ScriptedStore::default());
  remote.seed(&[Service { id: 1, ..service("Brand strategy", 1) }]);
  let site = Site::new(remote.clone(), Arc::new(MemoryCache::new()));
  site.services.fetch().await;

  site.section::<Service>().create(service("A", 2)).await.unwrap();
  site.section::<Service>().create(service("B", 3)).await.unwrap();

  let log = site.recent_audit(1).await.unwrap();
  assert_eq!(log.len(), 1);
  assert!(log[0].description.contains("\"B\""));
}
