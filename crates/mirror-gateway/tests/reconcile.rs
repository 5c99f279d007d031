//! Reconciliation scenarios driven through raw wire frames
//!
//! Each test feeds JSON frames to a reconciler backed by a canned-response
//! fetcher and observes cache state, dispatch behavior, and returned tags.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use mirror_core::{
    ChannelId, FetchError, FetchResult, MemberId, MessageId, Method, Relationship, ResourceFetcher,
    RoleId, ServerId, UserId,
};
use mirror_gateway::{Event, EventKind, GatewayError, Reconciler, ServerFrame};

/// Fetcher stub serving canned JSON by path
struct StubFetcher {
    responses: HashMap<String, Value>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn new(responses: &[(&str, Value)]) -> Arc<Self> {
        Arc::new(Self {
            responses: responses
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn empty() -> Arc<Self> {
        Self::new(&[])
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn request(
        &self,
        _method: Method,
        path: &str,
        _params: &[(String, String)],
        _body: Option<Value>,
    ) -> FetchResult<Value> {
        self.requests.lock().unwrap().push(path.to_string());
        self.responses
            .get(path)
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}

fn frame(value: Value) -> ServerFrame {
    serde_json::from_value(value).expect("frame should decode")
}

/// Record every dispatched event kind for later inspection
fn record_dispatches(reconciler: &Reconciler, kinds: &[EventKind]) -> Arc<Mutex<Vec<EventKind>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in kinds {
        let log = Arc::clone(&log);
        reconciler.bus().subscribe(*kind, move |event: Event| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(event.kind());
            }
        });
    }
    log
}

fn ready_frame() -> Value {
    json!({
        "type": "Ready",
        "users": [
            {"_id": "U1", "username": "ada", "online": true},
            {"_id": "U2", "username": "grace"}
        ],
        "channels": [
            {"channel_type": "TextChannel", "_id": "C1", "server": "S1", "name": "general"},
            {"channel_type": "Group", "_id": "C2", "name": "lounge",
             "recipients": ["U1", "U2"], "owner": "U1"}
        ],
        "servers": [
            {"_id": "S1", "owner": "U1", "name": "testers", "channels": ["C1"],
             "roles": {"R1": {"name": "admin", "permissions": 8}},
             "default_permissions": 0}
        ],
        "members": [
            {"_id": {"server": "S1", "user": "U1"}, "roles": ["R1"]},
            {"_id": {"server": "S1", "user": "U2"}, "nickname": "gh"}
        ]
    })
}

#[tokio::test]
async fn ready_populates_cache_and_dispatches_once() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher.clone());
    let log = record_dispatches(&reconciler, &[EventKind::Ready]);

    let outcome = reconciler.reconcile(frame(ready_frame())).await.unwrap();
    assert_eq!(outcome.kind, EventKind::Ready);
    assert!(outcome.was_dispatched());
    assert_eq!(log.lock().unwrap().len(), 1);

    // exactly the supplied entities, nothing fetched
    let cache = reconciler.cache();
    assert!(cache.user(&UserId::new("U1")).is_some());
    assert!(cache.user(&UserId::new("U2")).is_some());
    assert!(cache.channel(&ChannelId::new("C1")).is_some());
    assert!(cache.server(&ServerId::new("S1")).is_some());
    assert!(cache.member(&MemberId::new("S1", "U1")).is_some());
    assert!(fetcher.requests().is_empty());

    // member roles resolved against the snapshot's servers
    let member = cache.member(&MemberId::new("S1", "U1")).unwrap();
    assert_eq!(member.roles.len(), 1);
    assert_eq!(member.roles[0].name, "admin");

    // the event carries the four decoded lists
    match &outcome.event {
        Some(Event::Ready {
            users,
            channels,
            servers,
            members,
        }) => {
            assert_eq!(users.len(), 2);
            assert_eq!(channels.len(), 2);
            assert_eq!(servers.len(), 1);
            assert_eq!(members.len(), 2);
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
}

#[tokio::test]
async fn message_update_yields_before_and_after_and_suppresses_noops() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    let log = record_dispatches(&reconciler, &[EventKind::MessageUpdate]);

    reconciler.reconcile(frame(ready_frame())).await.unwrap();
    reconciler
        .reconcile(frame(json!({
            "type": "Message",
            "_id": "M1", "channel": "C1", "author": "U1", "content": "old"
        })))
        .await
        .unwrap();

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "MessageUpdate",
            "id": "M1", "channel": "C1",
            "data": {"content": "hi"}
        })))
        .await
        .unwrap();

    match outcome.event {
        Some(Event::MessageUpdate { before, after }) => {
            assert_eq!(before.content, "old");
            assert_eq!(after.content, "hi");
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
    assert_eq!(log.lock().unwrap().len(), 1);

    // same content again: tag returned, dispatch suppressed, cache merged
    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "MessageUpdate",
            "id": "M1", "channel": "C1",
            "data": {"content": "hi", "edited": "2024-05-01T12:00:00Z"}
        })))
        .await
        .unwrap();
    assert_eq!(outcome.kind, EventKind::MessageUpdate);
    assert!(!outcome.was_dispatched());
    assert_eq!(log.lock().unwrap().len(), 1);

    let cached = reconciler.cache().message(&MessageId::new("M1")).unwrap();
    assert!(cached.is_edited());
}

#[tokio::test]
async fn deletes_of_uncached_ids_are_silent_noops() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    let log = record_dispatches(
        &reconciler,
        &[
            EventKind::MessageDelete,
            EventKind::ChannelDelete,
            EventKind::ServerDelete,
        ],
    );

    for (value, kind) in [
        (
            json!({"type": "MessageDelete", "id": "M404", "channel": "C404"}),
            EventKind::MessageDelete,
        ),
        (
            json!({"type": "ChannelDelete", "id": "C404"}),
            EventKind::ChannelDelete,
        ),
        (
            json!({"type": "ServerDelete", "id": "S404"}),
            EventKind::ServerDelete,
        ),
    ] {
        let outcome = reconciler.reconcile(frame(value)).await.unwrap();
        assert_eq!(outcome.kind, kind);
        assert!(!outcome.was_dispatched());
    }
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delete_of_cached_entity_removes_and_dispatches() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    let outcome = reconciler
        .reconcile(frame(json!({"type": "ChannelDelete", "id": "C1"})))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::ChannelDelete(channel)) => {
            assert_eq!(channel.id(), &ChannelId::new("C1"));
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
    assert!(reconciler.cache().channel(&ChannelId::new("C1")).is_none());
}

#[tokio::test]
async fn before_snapshot_is_structurally_independent() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerUpdate",
            "id": "S1",
            "data": {
                "name": "renamed",
                "roles": {"R9": {"name": "fresh", "permissions": 0}}
            }
        })))
        .await
        .unwrap();

    match outcome.event {
        Some(Event::ServerUpdate { before, mut after }) => {
            // mutating "after" must not leak into the "before" snapshot
            after.name.push_str("-again");
            after.roles.clear();
            assert_eq!(before.name, "testers");
            assert_eq!(before.roles.len(), 1);
            assert!(before.role(&RoleId::new("R1")).is_some());
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }

    // the cache holds the applied "after" state
    let cached = reconciler.cache().server(&ServerId::new("S1")).unwrap();
    assert_eq!(cached.name, "renamed");
    assert!(cached.role(&RoleId::new("R9")).is_some());
}

#[tokio::test]
async fn bulk_produces_exactly_the_sequential_dispatches_in_order() {
    let interesting = [
        EventKind::Message,
        EventKind::MessageUpdate,
        EventKind::UserUpdate,
    ];
    let sub_frames = vec![
        json!({"type": "Message", "_id": "M1", "channel": "C1", "author": "U1", "content": "a"}),
        json!({"type": "MessageUpdate", "id": "M1", "channel": "C1", "data": {"content": "b"}}),
        json!({"type": "UserUpdate", "id": "U1", "data": {"online": false}}),
    ];

    // bulk path
    let mut bulk = Reconciler::new(StubFetcher::empty());
    bulk.reconcile(frame(ready_frame())).await.unwrap();
    let bulk_log = record_dispatches(&bulk, &interesting);
    let outcome = bulk
        .reconcile(frame(json!({"type": "Bulk", "v": sub_frames.clone()})))
        .await
        .unwrap();
    assert_eq!(outcome.kind, EventKind::Bulk);
    // the envelope itself produces no dispatch
    assert!(!outcome.was_dispatched());

    // sequential path
    let mut sequential = Reconciler::new(StubFetcher::empty());
    sequential.reconcile(frame(ready_frame())).await.unwrap();
    let sequential_log = record_dispatches(&sequential, &interesting);
    for sub in sub_frames {
        sequential.reconcile(frame(sub)).await.unwrap();
    }

    assert_eq!(*bulk_log.lock().unwrap(), *sequential_log.lock().unwrap());
    assert_eq!(
        *bulk_log.lock().unwrap(),
        vec![
            EventKind::Message,
            EventKind::MessageUpdate,
            EventKind::UserUpdate
        ]
    );
}

#[tokio::test]
async fn role_update_constructs_fresh_or_merges() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    // unseen role ID: constructed fresh from the payload
    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerRoleUpdate",
            "id": "S1", "role_id": "R2",
            "data": {"name": "mods", "permissions": 4, "colour": "#00ff00"}
        })))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::ServerRoleUpdate { server, role }) => {
            assert_eq!(role.id, RoleId::new("R2"));
            assert_eq!(role.name, "mods");
            assert!(server.role(&RoleId::new("R2")).is_some());
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }

    // known role ID: only the payload's fields change, clears apply
    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerRoleUpdate",
            "id": "S1", "role_id": "R2",
            "data": {"rank": 5},
            "clear": ["Colour"]
        })))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::ServerRoleUpdate { role, .. }) => {
            assert_eq!(role.name, "mods");
            assert_eq!(role.rank, Some(5));
            assert_eq!(role.colour, None);
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
}

#[tokio::test]
async fn role_update_without_name_on_unseen_role_is_an_error() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    let err = reconciler
        .reconcile(frame(json!({
            "type": "ServerRoleUpdate",
            "id": "S1", "role_id": "R7",
            "data": {"rank": 1}
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Domain(_)));
}

#[tokio::test]
async fn role_delete_of_absent_role_returns_tag_without_dispatch() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();
    let log = record_dispatches(&reconciler, &[EventKind::ServerRoleDelete]);

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerRoleDelete", "id": "S1", "role_id": "R404"
        })))
        .await
        .unwrap();
    assert_eq!(outcome.kind, EventKind::ServerRoleDelete);
    assert!(!outcome.was_dispatched());
    assert!(log.lock().unwrap().is_empty());

    // a held role is removed and dispatched
    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerRoleDelete", "id": "S1", "role_id": "R1"
        })))
        .await
        .unwrap();
    assert!(outcome.was_dispatched());
    let server = reconciler.cache().server(&ServerId::new("S1")).unwrap();
    assert!(server.role(&RoleId::new("R1")).is_none());
}

#[tokio::test]
async fn group_join_and_leave_mutate_recipients() {
    let fetcher = StubFetcher::new(&[(
        "/users/U3",
        json!({"_id": "U3", "username": "newcomer"}),
    )]);
    let mut reconciler = Reconciler::new(fetcher.clone());
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    // join lazily fetches the unseen user
    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ChannelGroupJoin", "id": "C2", "user": "U3"
        })))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::ChannelGroupJoin { channel, user }) => {
            assert_eq!(user.username, "newcomer");
            assert!(channel
                .recipients()
                .unwrap()
                .contains(&UserId::new("U3")));
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
    assert_eq!(fetcher.requests(), vec!["/users/U3".to_string()]);

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ChannelGroupLeave", "id": "C2", "user": "U3"
        })))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::ChannelGroupLeave { channel, .. }) => {
            assert!(!channel
                .recipients()
                .unwrap()
                .contains(&UserId::new("U3")));
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
}

#[tokio::test]
async fn group_leave_of_unknown_channel_degrades_to_noop() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ChannelGroupLeave", "id": "C404", "user": "U404"
        })))
        .await
        .unwrap();
    assert_eq!(outcome.kind, EventKind::ChannelGroupLeave);
    assert!(!outcome.was_dispatched());
}

#[tokio::test]
async fn member_join_inserts_and_leave_removes() {
    let fetcher = StubFetcher::new(&[
        ("/users/U3", json!({"_id": "U3", "username": "newcomer"})),
        (
            "/servers/S1/members/U3",
            json!({"_id": {"server": "S1", "user": "U3"}}),
        ),
    ]);
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerMemberJoin", "id": "S1", "user": "U3"
        })))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::ServerMemberJoin { member, user }) => {
            assert_eq!(member.id, MemberId::new("S1", "U3"));
            assert_eq!(user.id, UserId::new("U3"));
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
    // the joining user landed in the user cache too
    assert!(reconciler.cache().user(&UserId::new("U3")).is_some());
    assert!(reconciler.cache().member(&MemberId::new("S1", "U3")).is_some());

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerMemberLeave", "id": "S1", "user": "U3"
        })))
        .await
        .unwrap();
    assert!(outcome.was_dispatched());
    assert!(reconciler.cache().member(&MemberId::new("S1", "U3")).is_none());
}

#[tokio::test]
async fn member_leave_of_unknown_member_degrades_to_noop() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerMemberLeave", "id": "S1", "user": "U404"
        })))
        .await
        .unwrap();
    assert_eq!(outcome.kind, EventKind::ServerMemberLeave);
    assert!(!outcome.was_dispatched());
}

#[tokio::test]
async fn member_update_applies_patch_and_clear() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ServerMemberUpdate",
            "id": {"server": "S1", "user": "U2"},
            "data": {"roles": ["R1"]},
            "clear": ["Nickname"]
        })))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::ServerMemberUpdate { before, after }) => {
            assert_eq!(before.nickname.as_deref(), Some("gh"));
            assert_eq!(after.nickname, None);
            assert_eq!(after.roles.len(), 1);
            assert_eq!(after.roles[0].name, "admin");
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
}

#[tokio::test]
async fn typing_events_resolve_without_mutation() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();
    let snapshot = reconciler
        .cache()
        .channel(&ChannelId::new("C1"))
        .unwrap()
        .clone();

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "ChannelStartTyping", "id": "C1", "user": "U1"
        })))
        .await
        .unwrap();
    assert!(outcome.was_dispatched());

    let after = reconciler.cache().channel(&ChannelId::new("C1")).unwrap();
    assert_eq!(*after, snapshot);
}

#[tokio::test]
async fn relationship_change_merges_into_cached_user() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    reconciler.reconcile(frame(ready_frame())).await.unwrap();

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "UserRelationship", "user": "U2", "status": "Friend"
        })))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::UserRelationship { user, relationship }) => {
            assert_eq!(relationship, Relationship::Friend);
            assert_eq!(user.relationship, Some(Relationship::Friend));
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
    let cached = reconciler.cache().user(&UserId::new("U2")).unwrap();
    assert_eq!(cached.relationship, Some(Relationship::Friend));
}

#[tokio::test]
async fn error_frame_is_terminal_and_never_dispatched() {
    let fetcher = StubFetcher::empty();
    let mut reconciler = Reconciler::new(fetcher);
    let log = record_dispatches(&reconciler, &[EventKind::Error]);

    let err = reconciler
        .reconcile(frame(json!({"type": "Error", "error": "InvalidSession"})))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Protocol(_)));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_of_unseen_entity_lazy_fetches_then_applies() {
    let fetcher = StubFetcher::new(&[(
        "/users/U9",
        json!({"_id": "U9", "username": "lazy", "online": true}),
    )]);
    let mut reconciler = Reconciler::new(fetcher.clone());

    let outcome = reconciler
        .reconcile(frame(json!({
            "type": "UserUpdate", "id": "U9",
            "data": {"username": "eager"},
            "clear": []
        })))
        .await
        .unwrap();
    match outcome.event {
        Some(Event::UserUpdate { before, after }) => {
            assert_eq!(before.username, "lazy");
            assert_eq!(after.username, "eager");
        }
        other => panic!("unexpected outcome event: {other:?}"),
    }
    assert_eq!(fetcher.requests(), vec!["/users/U9".to_string()]);
}
