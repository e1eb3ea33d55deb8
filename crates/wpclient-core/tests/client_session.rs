//! Session state and enablement as seen through the foreground client.

mod common;

use std::collections::HashSet;
use std::path::PathBuf;

use assert_matches::assert_matches;

use common::{gpml, harness, harness_with, key, progress, SPECIES};
use wpclient_core::client::{ForegroundMessage, OpenOrigin};
use wpclient_core::config::StartupParameter;
use wpclient_core::prelude::*;

fn updatable() -> Enablement {
    Enablement {
        can_create_new: false,
        can_update: true,
    }
}

#[tokio::test]
async fn start_creates_cache_and_publishes_enablement() {
    let h = harness().await;
    assert!(h.client.cache().dir().is_dir());
    assert_eq!(h.host.last_enablement(), Some(Enablement::default()));
    assert_eq!(h.host.listeners.len(EventCategory::DocumentOpened), 1);
    assert_eq!(h.host.listeners.len(EventCategory::NewDocument), 1);
    assert_eq!(h.host.listeners.len(EventCategory::SelectionContextMenu), 1);
}

#[tokio::test]
async fn successful_open_enables_update_only() {
    let mut h = harness().await;
    let sink = progress();
    let report = h
        .client
        .open_and_wait(DocumentIdentifier::new("WP1", Some(1)), None, sink.clone())
        .await
        .unwrap();

    assert!(report.is_opened());
    assert_eq!(h.client.session().current(), Some(("WP1", "1")));
    assert_eq!(h.client.enablement(), updatable());
    assert_eq!(h.host.last_enablement(), Some(updatable()));
    assert_eq!(sink.finished_count(), 1);
    assert_eq!(sink.tasks.lock().first().map(String::as_str), Some("Opening pathway"));
}

#[tokio::test]
async fn latest_request_records_the_resolved_revision() {
    let mut h = harness().await;
    h.state.add("WP1", 8, gpml("newer"));
    h.client
        .open_and_wait(DocumentIdentifier::new("WP1", Some(0)), None, progress())
        .await
        .unwrap();
    assert_eq!(h.client.session().current(), Some(("WP1", "8")));
}

#[tokio::test]
async fn connectivity_failure_leaves_session_unchanged() {
    let mut h = harness().await;
    h.client
        .open_and_wait(DocumentIdentifier::new("WP1", Some(1)), None, progress())
        .await
        .unwrap();
    let before = h.client.session().clone();
    let published = h.host.enablements.lock().len();

    h.endpoint.set("webservice.wikipathways.org");
    let sink = progress();
    let report = h
        .client
        .open_and_wait(DocumentIdentifier::new("WP2", Some(3)), None, sink.clone())
        .await
        .unwrap();

    assert_eq!(report.error_kind(), Some(OpenErrorKind::NotConnected));
    assert_eq!(h.client.session(), &before);
    assert_eq!(sink.finished_count(), 1);
    // Failed invocations still refresh enablement.
    assert!(h.host.enablements.lock().len() > published);
    assert_eq!(h.host.last_enablement(), Some(updatable()));
}

#[tokio::test]
async fn sequential_opens_leave_the_last_one() {
    let mut h = harness().await;
    h.client
        .open_and_wait(DocumentIdentifier::new("WP1", Some(1)), None, progress())
        .await
        .unwrap();
    h.client
        .open_and_wait(DocumentIdentifier::new("WP2", Some(3)), None, progress())
        .await
        .unwrap();
    assert_eq!(
        h.client.session(),
        &SessionState {
            current_id: "WP2".into(),
            current_revision: "3".into(),
        }
    );
}

#[tokio::test]
async fn new_blank_document_resets_enablement() {
    let mut h = harness().await;
    h.client
        .open_and_wait(DocumentIdentifier::new("WP1", Some(1)), None, progress())
        .await
        .unwrap();

    h.host.new_document();
    let applied = h.client.process_pending();
    assert_matches!(applied.as_slice(), [ForegroundMessage::Host(HostEvent::NewDocument)]);
    assert!(h.client.session().is_empty());
    assert_eq!(
        h.client.enablement(),
        Enablement {
            can_create_new: true,
            can_update: false,
        }
    );

    // Same notification without an active document: nothing to create from.
    h.host.close_all();
    h.client.handle_host_event(&HostEvent::NewDocument);
    assert_eq!(h.client.enablement(), Enablement::default());
}

#[tokio::test]
async fn opening_a_foreign_file_detaches_the_session() {
    let mut h = harness().await;
    h.client
        .open_and_wait(DocumentIdentifier::new("WP1", Some(1)), None, progress())
        .await
        .unwrap();

    // Re-opening our own cache entry keeps the session.
    let cached = h.client.cache().entry_path("WP1", 1);
    h.host.open_file(&cached);
    h.client.process_pending();
    assert_eq!(h.client.session().current(), Some(("WP1", "1")));

    h.host.open_file(&PathBuf::from("/home/curator/local.gpml"));
    h.client.process_pending();
    assert!(h.client.session().is_empty());
    assert_eq!(
        h.client.enablement(),
        Enablement {
            can_create_new: true,
            can_update: false,
        }
    );
}

#[tokio::test]
async fn cancelled_open_leaves_session_empty_and_nothing_opened() {
    let mut h = harness().await;
    let gate = h.state.hold_fetches();
    let sink = progress();
    let handle = h
        .client
        .open_document(DocumentIdentifier::new("WP1", Some(1)), None, sink.clone())
        .unwrap();

    gate.entered.notified().await;
    handle.cancel();
    gate.release.notify_one();
    let report = h.client.wait_for(handle).await.unwrap();

    assert_matches!(report.outcome, OpenOutcome::Cancelled { after: Some(Step::Fetch) });
    assert!(h.client.session().is_empty());
    assert!(h.host.opened.lock().is_empty());
    assert_eq!(h.client.enablement(), Enablement::default());
    assert_eq!(sink.finished_count(), 1);
}

#[tokio::test]
async fn search_result_opens_with_highlight() {
    let mut h = harness().await;
    let hit = SearchResult {
        info: PathwayInfo {
            id: "WP2".into(),
            url: String::new(),
            name: "two".into(),
            species: SPECIES.into(),
            revision: "3".into(),
        },
        score: Some(1.0),
        fields: Default::default(),
    };
    h.state.xref_hits.lock().push(hit.clone());

    let entries = h.host.listeners.dispatch(&HostEvent::SelectionContextMenu {
        element: ViewElement {
            id: "n1".into(),
            label: "gene".into(),
            reference: Some(key("X")),
            bounds: Region::default(),
        },
    });
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "Open pathways containing Entrez Gene:X");

    let results = h
        .client
        .run_action(entries[0].action.clone(), progress())
        .unwrap()
        .join()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(results.len(), 1);

    let handle = h.client.open_search_result(&results[0], key("X"), progress()).unwrap();
    let report = h.client.wait_for(handle).await.unwrap();
    assert_matches!(report.outcome, OpenOutcome::Opened { highlighted: Some(_), .. });
    assert_eq!(
        h.host.view().unwrap().emphasized(),
        vec!["A".to_string(), "C".to_string()]
    );
    assert_eq!(h.client.session().current(), Some(("WP2", "3")));
}

#[tokio::test]
async fn startup_parameter_opens_latest_and_activates_id_mapping() {
    let mut h = harness_with(|cfg| cfg.with_startup(StartupParameter::new("WP2"))).await;
    let handle = h.startup.take().unwrap();
    let report = h.client.wait_for(handle).await.unwrap();

    assert!(report.is_opened());
    assert_eq!(h.client.session().current(), Some(("WP2", "3")));
    assert_eq!(
        *h.host.id_mappers.lock(),
        vec![format!("idmapper-bridgerest:http://webservice.bridgedb.org/{SPECIES}")]
    );

    // Later user opens do not touch identifier mapping again.
    h.client
        .open_and_wait(DocumentIdentifier::new("WP1", Some(1)), None, progress())
        .await
        .unwrap();
    assert_eq!(h.host.id_mappers.lock().len(), 1);
}

#[tokio::test]
async fn inbox_reports_origin_of_each_invocation() {
    let mut h = harness_with(|cfg| cfg.with_startup(StartupParameter::new("WP1"))).await;
    let _ = h.startup.take();
    loop {
        match h.client.next_message().await {
            Some(ForegroundMessage::OpenFinished { origin, .. }) => {
                assert_eq!(origin, OpenOrigin::Startup);
                break;
            }
            Some(_) => continue,
            None => panic!("inbox closed"),
        }
    }
}

#[tokio::test]
async fn update_and_upload_follow_enablement() {
    let mut h = harness().await;
    let doc = common::blank();

    assert_matches!(
        h.client.update_current(&doc, "fix").await,
        Err(ClientError::NotEnabled(_))
    );
    // No active document yet: nothing to upload either.
    assert_matches!(h.client.upload(&doc).await, Err(ClientError::NotEnabled(_)));

    h.host.new_document();
    h.client.process_pending();
    h.client.login("curator", "secret").await.unwrap();
    let created = h.client.upload(&doc).await.unwrap();
    assert_eq!(created.id, "WP9000");
    assert_eq!(h.client.session().current(), Some(("WP9000", "1")));
    assert_eq!(h.client.enablement(), updatable());

    h.client.update_current(&doc, "fix labels").await.unwrap();
    assert_eq!(
        *h.state.updates.lock(),
        vec![("WP9000".to_string(), 1, "fix labels".to_string())]
    );
    assert_eq!(*h.state.logins.lock(), vec!["curator".to_string()]);
}

#[tokio::test]
async fn shutdown_removes_cache_and_rejects_new_work() {
    let mut h = harness().await;
    h.client
        .open_and_wait(DocumentIdentifier::new("WP1", Some(1)), None, progress())
        .await
        .unwrap();
    let dir = h.client.cache().dir().to_path_buf();
    assert!(dir.join("WP1.r1.gpml").is_file());

    h.client.shutdown_token().cancel();
    assert_matches!(
        h.client.open_document(DocumentIdentifier::latest("WP1"), None, progress()),
        Err(ClientError::ShuttingDown)
    );

    h.client.shutdown().await.unwrap();
    assert!(!dir.exists());
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_invocations() {
    let h = harness().await;
    let gate = h.state.hold_fetches();
    let handle = h
        .client
        .open_document(
            DocumentIdentifier::new("WP1", Some(1)),
            Some(HashSet::from([key("X")])),
            progress(),
        )
        .unwrap();
    gate.entered.notified().await;

    let dir = h.client.cache().dir().to_path_buf();
    let release = tokio::spawn(async move {
        tokio::task::yield_now().await;
        gate.release.notify_one();
    });
    h.client.shutdown().await.unwrap();
    release.await.unwrap();

    assert!(handle.is_finished());
    assert!(!dir.exists());
    assert!(h.host.opened.lock().is_empty());
}
