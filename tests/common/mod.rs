//! Shared chat dataset for the integration tests
//!
//! Three users, three group chats and one direct-message thread. The same
//! data is loaded into both in-memory backends so the scenarios can assert
//! identical reports and change sets.
#![allow(dead_code)]

use privacy_graph::{DocumentPath, MemCollectionStore, MemDocumentStore};
use serde_json::{json, Value};

/// (id, name, group chats, direct messages keyed by the other user, best friend)
pub const USERS: &[(&str, &str, &[&str], &[(&str, &str)], &str)] = &[
    ("u1", "Ada", &["g1", "g2"], &[("u2", "d1")], "u2"),
    ("u2", "Bob", &["g1", "g2"], &[("u1", "d1")], "u1"),
    ("u3", "Cy", &["g2", "g1", "g3"], &[], "u1"),
];

/// (id, title, owner, members)
pub const GROUP_CHATS: &[(&str, &str, &str, &[&str])] = &[
    ("g1", "Climbing", "u1", &["u1", "u2", "u3"]),
    ("g2", "Chess", "u2", &["u2", "u1", "u3"]),
    ("g3", "Books", "u3", &["u3"]),
];

/// (id, user1, user2)
pub const DIRECT_MESSAGES: &[(&str, &str, &str)] = &[("d1", "u1", "u2")];

/// (chat id, chat collection, message id, author)
pub const MESSAGES: &[(&str, &str, &str, &str)] = &[
    ("g1", "gcs", "m1", "u1"),
    ("g1", "gcs", "m2", "u2"),
    ("g1", "gcs", "m3", "u1"),
    ("g2", "gcs", "m4", "u2"),
    ("g2", "gcs", "m5", "u1"),
    ("d1", "dms", "m6", "u1"),
    ("d1", "dms", "m7", "u2"),
    ("g3", "gcs", "m8", "u3"),
];

/// Message body of `id`
pub fn content(id: &str) -> String {
    format!("hello from {}", id)
}

fn user_fields(name: &str, gcs: &[&str], dms: &[(&str, &str)], best_friend: &str) -> Value {
    let dms: serde_json::Map<String, Value> = dms
        .iter()
        .map(|(other, dm)| (other.to_string(), json!(dm)))
        .collect();
    json!({"name": name, "gcs": gcs, "dms": dms, "bestFriend": best_friend})
}

/// Chat dataset in a hierarchical store; messages are sub-collections
pub fn document_store() -> MemDocumentStore {
    let store = MemDocumentStore::new();
    for (id, name, gcs, dms, best_friend) in USERS {
        store
            .insert(DocumentPath::new(["users"], [*id]), user_fields(name, gcs, dms, best_friend))
            .unwrap();
    }
    for (id, title, owner, users) in GROUP_CHATS {
        store
            .insert(
                DocumentPath::new(["gcs"], [*id]),
                json!({"title": title, "owner": owner, "users": users}),
            )
            .unwrap();
    }
    for (id, user1, user2) in DIRECT_MESSAGES {
        store
            .insert(DocumentPath::new(["dms"], [*id]), json!({"user1": user1, "user2": user2}))
            .unwrap();
    }
    for (chat, collection, id, author) in MESSAGES {
        store
            .insert(
                DocumentPath::new([*collection, "messages"], [*chat, *id]),
                json!({"userId": author, "content": content(id)}),
            )
            .unwrap();
    }
    store
}

/// Chat dataset in a flat store; messages reference their chat by `chatId`
pub fn collection_store() -> MemCollectionStore {
    let store = MemCollectionStore::new();
    for (id, name, gcs, dms, best_friend) in USERS {
        let mut fields = user_fields(name, gcs, dms, best_friend);
        fields["_id"] = json!(id);
        store.insert("users", fields).unwrap();
    }
    for (id, title, owner, users) in GROUP_CHATS {
        store
            .insert("gcs", json!({"_id": id, "title": title, "owner": owner, "users": users}))
            .unwrap();
    }
    for (id, user1, user2) in DIRECT_MESSAGES {
        store
            .insert("dms", json!({"_id": id, "user1": user1, "user2": user2}))
            .unwrap();
    }
    for (chat, _, id, author) in MESSAGES {
        store
            .insert(
                "messages",
                json!({"_id": id, "chatId": chat, "userId": author, "content": content(id)}),
            )
            .unwrap();
    }
    store
}

/// Access report both backends must produce for `u1`
pub fn expected_u1_report() -> Value {
    json!({
        "name": "Ada",
        "groupChats": [
            {"title": "Climbing", "messages": [{"content": "hello from m1"}, {"content": "hello from m3"}]},
            {"title": "Chess", "messages": [{"content": "hello from m5"}]}
        ],
        "directMessages": {
            "u2": {"otherUser": {"name": "Bob"}, "messages": [{"content": "hello from m6"}]}
        }
    })
}
