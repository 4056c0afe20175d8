//! History and case store integration tests over real HTTP

mod common;

use rehearse_core::client::{CaseClient, HistoryClient};
use rehearse_core::transcript::ChatMessage;
use rehearse_core::{CaseStore, Credential, Error, HistoryReader, HistoryRecord, HistorySink};
use serde_json::json;

fn record(session_id: &str, score: f64) -> HistoryRecord {
    HistoryRecord {
        session_id: session_id.to_string(),
        case_id: "case-night-shift".to_string(),
        messages: vec![ChatMessage::user("Check vitals")],
        final_score: score,
        final_state: json!({"current_event": null, "eventScores": {}}),
    }
}

#[tokio::test]
async fn saved_history_is_listed_and_fetched() {
    let (state, addr) = common::create_test_server().await;
    let client = HistoryClient::with_base_url(common::base_url(addr));
    let alice = common::credential_for(&state, "u-alice");

    let stored = client.save(&alice, &record("s-1", 4.0)).await.unwrap();
    assert_eq!(stored.user_id, "u-alice");
    assert_eq!(stored.messages.len(), 1);

    let list = client.list(&alice).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].final_score, 4.0);

    let fetched = client.get(&alice, "s-1").await.unwrap().unwrap();
    assert_eq!(fetched.case_id, "case-night-shift");
}

#[tokio::test]
async fn resave_overwrites_and_keeps_created_at() {
    let (state, addr) = common::create_test_server().await;
    let client = HistoryClient::with_base_url(common::base_url(addr));
    let alice = common::credential_for(&state, "u-alice");

    let first = client.save(&alice, &record("s-1", 2.0)).await.unwrap();
    let second = client.save(&alice, &record("s-1", 3.5)).await.unwrap();

    assert_eq!(second.final_score, 3.5);
    assert_eq!(first.created_at, second.created_at);
    assert_eq!(client.list(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn histories_are_scoped_to_their_owner() {
    let (state, addr) = common::create_test_server().await;
    let client = HistoryClient::with_base_url(common::base_url(addr));
    let alice = common::credential_for(&state, "u-alice");
    let bob = common::credential_for(&state, "u-bob");

    client.save(&alice, &record("s-1", 4.0)).await.unwrap();

    assert!(client.get(&bob, "s-1").await.unwrap().is_none());
    assert!(client.list(&bob).await.unwrap().is_empty());

    let err = client.save(&bob, &record("s-1", 1.0)).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 403, .. }));
}

#[tokio::test]
async fn bad_credential_is_unauthorized() {
    let (_state, addr) = common::create_test_server().await;
    let client = HistoryClient::with_base_url(common::base_url(addr));

    let err = client
        .list(&Credential::new("not-a-token"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
}

#[tokio::test]
async fn newest_history_is_listed_first() {
    let (state, addr) = common::create_test_server().await;
    let client = HistoryClient::with_base_url(common::base_url(addr));
    let alice = common::credential_for(&state, "u-alice");

    for id in ["s-1", "s-2", "s-3"] {
        client.save(&alice, &record(id, 3.0)).await.unwrap();
    }

    let ids: Vec<String> = client
        .list(&alice)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.session_id)
        .collect();
    assert_eq!(ids, vec!["s-3", "s-2", "s-1"]);
}

#[tokio::test]
async fn case_client_reads_seeded_cases() {
    let (_state, addr) = common::create_test_server().await;
    common::seed_case(addr, &common::three_event_case()).await;
    let cases = CaseClient::with_base_url(common::base_url(addr));

    let list = cases.list_cases().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].case_id, "case-night-shift");
    assert_eq!(list[0].topic.as_deref(), Some("Ward triage"));

    let bundle = cases.get_case("case-night-shift").await.unwrap();
    assert_eq!(bundle.skeleton.len(), 3);
    assert_eq!(bundle.skeleton.last_event_id(), Some("CE3"));

    let err = cases.get_case("missing").await.unwrap_err();
    assert!(matches!(err, Error::CaseNotFound(_)));
}
