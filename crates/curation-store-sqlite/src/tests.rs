//! Integration tests for `SqliteSnapshotStore` against an in-memory database.

use curation_core::{AnnotationAction, AnnotationStore, ItemType, Snapshot, SnapshotStore};
use serde_json::json;

use crate::SqliteSnapshotStore;

async fn store() -> SqliteSnapshotStore {
  SqliteSnapshotStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn loaded_store() -> AnnotationStore {
  let mut store = AnnotationStore::new();
  store.dispatch(AnnotationAction::Set {
    annotations:          vec![
      json!({
        "PK": "A1",
        "article": { "PK": "31234567" },
        "groups": [{
          "PK": "G1",
          "item_type": "group",
          "individualIncluded": [{
            "PK": "I1",
            "item_type": "individual",
            "variantScores": [{ "variantScored": { "PK": "V1" } }],
          }],
        }],
      }),
      json!({ "PK": "A2", "experimentalData": [{ "PK": "E1", "item_type": "experimental" }] }),
    ],
    active_annotation_pk: Some("A2".into()),
  });
  store
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[test]
fn schema_declares_only_the_tables_it_reads() {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn.execute_batch(crate::schema::SCHEMA).unwrap();
  let mut stmt = conn
    .prepare("SELECT type, name FROM sqlite_master WHERE name NOT LIKE 'sqlite_%' ORDER BY name")
    .unwrap();
  let objects: Vec<(String, String)> = stmt
    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap();
  assert_eq!(objects, [
    ("table".to_owned(), "snapshot_annotations".to_owned()),
    ("table".to_owned(), "snapshots".to_owned()),
  ]);
}

// ─── Save / load ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_has_no_snapshot() {
  let s = store().await;
  assert!(s.load_snapshot().await.unwrap().is_none());
  assert!(s.latest_saved_at().await.unwrap().is_none());
  assert_eq!(s.snapshot_count().await.unwrap(), 0);
}

#[tokio::test]
async fn save_and_load_round_trip() {
  let s = store().await;
  let annotations = loaded_store();
  let snapshot = Snapshot::capture(annotations.state());

  s.save_snapshot(snapshot.clone()).await.unwrap();
  let loaded = s.load_snapshot().await.unwrap().expect("snapshot saved");

  assert_eq!(loaded.annotations, snapshot.annotations);
  assert_eq!(loaded.active_pk.as_deref(), Some("A2"));
  // RFC 3339 keeps sub-second precision.
  assert_eq!(loaded.saved_at, snapshot.saved_at);
}

#[tokio::test]
async fn rehydrated_store_rebuilds_indices() {
  let s = store().await;
  let original = loaded_store();
  s.save_snapshot(Snapshot::capture(original.state())).await.unwrap();

  let mut restored = AnnotationStore::new();
  restored.rehydrate(s.load_snapshot().await.unwrap().unwrap());

  let state = restored.state();
  assert_eq!(state.all_pks, ["A1", "A2"]);
  assert_eq!(state.evidence_pks_by_type("A1", ItemType::Individual), ["I1"]);
  assert_eq!(state.variant_by_pk("A1", "V1").unwrap().associated_evidences, ["I1"]);
  assert_eq!(state.index_by_annotation, original.state().index_by_annotation);
}

#[tokio::test]
async fn latest_snapshot_wins() {
  let s = store().await;
  let mut annotations = loaded_store();
  s.save_snapshot(Snapshot::capture(annotations.state())).await.unwrap();

  annotations.dispatch(AnnotationAction::ActivateAnnotation {
    annotation_pk: Some("A1".into()),
  });
  annotations.dispatch(AnnotationAction::Update {
    annotation: json!({ "PK": "A2" }),
  });
  s.save_snapshot(Snapshot::capture(annotations.state())).await.unwrap();

  let loaded = s.load_snapshot().await.unwrap().unwrap();
  assert_eq!(loaded.active_pk.as_deref(), Some("A1"));
  assert_eq!(loaded.annotations[1], json!({ "PK": "A2" }));
  assert_eq!(s.snapshot_count().await.unwrap(), 2);
}

#[tokio::test]
async fn empty_snapshot_round_trips() {
  let s = store().await;
  s.save_snapshot(Snapshot::capture(AnnotationStore::new().state()))
    .await
    .unwrap();
  let loaded = s.load_snapshot().await.unwrap().unwrap();
  assert!(loaded.annotations.is_empty());
  assert!(loaded.active_pk.is_none());
}

// ─── Housekeeping ────────────────────────────────────────────────────────────

#[tokio::test]
async fn prune_keeps_most_recent() {
  let s = store().await;
  let annotations = loaded_store();
  for _ in 0..4 {
    s.save_snapshot(Snapshot::capture(annotations.state())).await.unwrap();
  }

  assert_eq!(s.prune(1).await.unwrap(), 3);
  assert_eq!(s.snapshot_count().await.unwrap(), 1);
  assert!(s.load_snapshot().await.unwrap().is_some());
}

#[tokio::test]
async fn clear_removes_everything() {
  let s = store().await;
  s.save_snapshot(Snapshot::capture(loaded_store().state()))
    .await
    .unwrap();
  s.clear_snapshots().await.unwrap();
  assert!(s.load_snapshot().await.unwrap().is_none());
  assert_eq!(s.snapshot_count().await.unwrap(), 0);
}
