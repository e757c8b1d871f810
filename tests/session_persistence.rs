//! Session transcripts across store instances and concurrent writers

mod common;

use common::{build_router, create_temp_store, test_config, FakeGraph, ScriptedProvider};
use nextlevelbot::chat::ChatService;
use nextlevelbot::graph::GraphClient;
use nextlevelbot::storage::{Role, SessionStore, SqliteStore};
use std::sync::Arc;

#[tokio::test]
async fn test_transcript_survives_reopen() {
    let (store, _tmp) = create_temp_store();
    store.append("s1", Role::User, "Who played Hades?").await.unwrap();
    store.append("s1", Role::Assistant, "- alice").await.unwrap();

    let reopened = SqliteStore::new_with_path(store.db_path().to_path_buf()).unwrap();
    let turns = reopened.get("s1").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[1].content, "- alice");
    assert_eq!(turns[1].seq, 2);
}

#[tokio::test]
async fn test_parallel_sessions_do_not_interfere() {
    let (store, _tmp) = create_temp_store();
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for session in ["a", "b"] {
        for i in 0..5 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(session, Role::User, &format!("{}-{}", session, i))
                    .await
                    .unwrap();
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for session in ["a", "b"] {
        let turns = store.get(session).await.unwrap();
        assert_eq!(turns.len(), 5);
        let seqs: Vec<u64> = turns.iter().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        assert!(turns.iter().all(|t| t.content.starts_with(session)));
    }

    let sessions = store.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.turn_count == 5));
}

#[tokio::test]
async fn test_chat_service_writes_to_sqlite() {
    let (store, _tmp) = create_temp_store();
    let store: Arc<dyn SessionStore> = Arc::new(store);
    let graph: Arc<dyn GraphClient> = Arc::new(FakeGraph::new());

    let provider = ScriptedProvider::new([
        "Thought: Do I need to use a tool? No\nFinal Answer: Hello, gamer!",
    ]);
    let router = build_router(&test_config(), provider, FakeGraph::new());
    let service = ChatService::new(router, store.clone(), graph);

    assert_eq!(service.submit("s2", "hi").await, "Hello, gamer!");

    let turns = store.get("s2").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "hi");
    assert_eq!(turns[1].role, Role::Assistant);

    assert!(store.delete("s2").await.unwrap());
    assert!(store.get("s2").await.unwrap().is_empty());
}
