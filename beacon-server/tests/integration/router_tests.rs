use beacon_core::{RoomId, SignalMessage};
use beacon_server::{Connection, MessageRouter};
use serde_json::json;

use crate::utils::{TestMember, init_tracing, test_registry};

struct RoutedClient {
    member: TestMember,
    conn: Connection,
}

impl RoutedClient {
    fn new() -> Self {
        let member = TestMember::new();
        let conn = Connection::new(member.delivery.clone());
        Self { member, conn }
    }
}

async fn join(router: &MessageRouter, client: &mut RoutedClient, room: &str, id: &str, name: &str) {
    router
        .dispatch(
            SignalMessage::JoinRoom {
                room_id: room.into(),
                client_id: Some(id.into()),
                client_name: Some(name.to_owned()),
            },
            &mut client.conn,
        )
        .await;
}

#[tokio::test]
async fn join_without_client_id_gets_a_generated_one() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    let mut c1 = RoutedClient::new();
    join(&router, &mut c1, "room-x", "client-1", "alice").await;

    let mut c2 = RoutedClient::new();
    router
        .dispatch(
            SignalMessage::JoinRoom {
                room_id: "room-x".into(),
                client_id: None,
                client_name: Some("anon".to_owned()),
            },
            &mut c2.conn,
        )
        .await;

    // The generated id shows up in the user-joined frame alice receives.
    match c1.member.recv().await {
        SignalMessage::UserJoined { client_id, .. } => {
            let hex = client_id
                .as_str()
                .strip_prefix("client-")
                .expect("generated id missing prefix");
            assert_eq!(hex.len(), 8);
            assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        }
        other => panic!("expected user-joined, got {other:?}"),
    }

    let handle = registry.lookup(&RoomId::from("room-x")).unwrap();
    assert_eq!(handle.snapshot().await.unwrap().client_count, 2);
}

#[tokio::test]
async fn relay_to_unknown_room_is_dropped_without_creating_it() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    let mut c1 = RoutedClient::new();
    router
        .dispatch(
            SignalMessage::Offer {
                room_id: "room-ghost".into(),
                data: json!("sdp"),
                client_id: Some("client-1".into()),
                target_id: None,
            },
            &mut c1.conn,
        )
        .await;

    c1.member.expect_silence().await;
    assert!(registry.lookup(&RoomId::from("room-ghost")).is_none());
}

#[tokio::test]
async fn offer_with_target_is_unicast() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    let mut c1 = RoutedClient::new();
    let mut c2 = RoutedClient::new();
    join(&router, &mut c1, "room-x", "client-1", "alice").await;
    join(&router, &mut c2, "room-x", "client-2", "bob").await;
    c1.member.drain().await;
    c2.member.drain().await;

    router
        .dispatch(
            SignalMessage::Offer {
                room_id: "room-x".into(),
                data: json!("sdp-blob"),
                client_id: Some("client-1".into()),
                target_id: Some("client-2".into()),
            },
            &mut c1.conn,
        )
        .await;

    match c2.member.recv().await {
        SignalMessage::Offer { data, client_id, .. } => {
            assert_eq!(data, json!("sdp-blob"));
            assert_eq!(client_id, Some("client-1".into()));
        }
        other => panic!("expected offer, got {other:?}"),
    }
    c1.member.expect_silence().await;
}

#[tokio::test]
async fn answer_without_target_is_broadcast() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    let mut c1 = RoutedClient::new();
    let mut c2 = RoutedClient::new();
    join(&router, &mut c1, "room-x", "client-1", "alice").await;
    join(&router, &mut c2, "room-x", "client-2", "bob").await;
    c1.member.drain().await;
    c2.member.drain().await;

    router
        .dispatch(
            SignalMessage::Answer {
                room_id: "room-x".into(),
                data: json!({"sdp": "v=0"}),
                client_id: Some("client-2".into()),
                target_id: None,
            },
            &mut c2.conn,
        )
        .await;

    assert!(matches!(c1.member.recv().await, SignalMessage::Answer { .. }));
    assert!(matches!(c2.member.recv().await, SignalMessage::Answer { .. }));
}

#[tokio::test]
async fn leave_room_disconnects_only_that_room() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    let mut c1 = RoutedClient::new();
    let mut c2 = RoutedClient::new();
    join(&router, &mut c1, "room-x", "client-1", "alice").await;
    join(&router, &mut c2, "room-x", "client-2", "bob").await;
    c2.member.drain().await;

    router
        .dispatch(
            SignalMessage::LeaveRoom {
                room_id: "room-x".into(),
            },
            &mut c1.conn,
        )
        .await;

    assert!(matches!(
        c2.member.recv().await,
        SignalMessage::UserLeft { client_id, .. } if client_id.as_str() == "client-1"
    ));

    // A second leave for a room the connection is no longer in is dropped.
    router
        .dispatch(
            SignalMessage::LeaveRoom {
                room_id: "room-x".into(),
            },
            &mut c1.conn,
        )
        .await;
    c2.member.expect_silence().await;
}

#[tokio::test]
async fn leave_room_for_unknown_room_is_dropped() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    let mut c1 = RoutedClient::new();
    router
        .dispatch(
            SignalMessage::LeaveRoom {
                room_id: "room-ghost".into(),
            },
            &mut c1.conn,
        )
        .await;

    c1.member.expect_silence().await;
    assert!(registry.lookup(&RoomId::from("room-ghost")).is_none());
}

#[tokio::test]
async fn server_originated_types_from_clients_are_ignored() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    let mut c1 = RoutedClient::new();
    let mut c2 = RoutedClient::new();
    join(&router, &mut c1, "room-x", "client-1", "alice").await;
    join(&router, &mut c2, "room-x", "client-2", "bob").await;
    c1.member.drain().await;
    c2.member.drain().await;

    router
        .dispatch(
            SignalMessage::UserLeft {
                room_id: "room-x".into(),
                client_id: "client-2".into(),
            },
            &mut c1.conn,
        )
        .await;

    c1.member.expect_silence().await;
    c2.member.expect_silence().await;
    let handle = registry.lookup(&RoomId::from("room-x")).unwrap();
    assert_eq!(handle.snapshot().await.unwrap().client_count, 2);
}

#[tokio::test]
async fn rejoining_a_room_under_a_new_id_releases_the_old_one() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    let mut c1 = RoutedClient::new();
    join(&router, &mut c1, "room-x", "client-1", "alice").await;
    join(&router, &mut c1, "room-x", "client-2", "alice").await;

    let handle = registry.lookup(&RoomId::from("room-x")).unwrap();
    assert_eq!(handle.snapshot().await.unwrap().client_count, 1);

    // The old id must not survive the connection; a leftover entry would
    // keep the room from ever draining to zero.
    c1.conn.leave_all().await;
    assert_eq!(handle.snapshot().await.unwrap().client_count, 0);
}

#[tokio::test]
async fn closing_connection_leaves_every_joined_room() {
    init_tracing();
    let registry = test_registry();
    let router = MessageRouter::new(registry.clone());

    // One-room-per-client is not enforced; one connection joins two rooms.
    let mut c1 = RoutedClient::new();
    join(&router, &mut c1, "room-a", "client-1", "alice").await;
    join(&router, &mut c1, "room-b", "client-1", "alice").await;

    let mut peer_a = RoutedClient::new();
    let mut peer_b = RoutedClient::new();
    join(&router, &mut peer_a, "room-a", "client-2", "bob").await;
    join(&router, &mut peer_b, "room-b", "client-3", "carol").await;
    peer_a.member.drain().await;
    peer_b.member.drain().await;

    // What the gateway does when the socket dies.
    c1.conn.leave_all().await;

    assert!(matches!(
        peer_a.member.recv().await,
        SignalMessage::UserLeft { client_id, .. } if client_id.as_str() == "client-1"
    ));
    assert!(matches!(
        peer_b.member.recv().await,
        SignalMessage::UserLeft { client_id, .. } if client_id.as_str() == "client-1"
    ));
}
