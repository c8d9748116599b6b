mod common;

use common::{create_test_user, test_pool, test_settings, TestCleanup};
use diesel::prelude::*;
use notekeeper_api::api::hierarchy::folders::FolderStore;
use notekeeper_api::api::hierarchy::tags::TagStore;
use notekeeper_api::api::hierarchy::{
    find_or_create_path, full_path, HierarchyError, HierarchyLookup, HierarchyNode,
};
use notekeeper_api::tables::{Folder, Tag};
use std::sync::Barrier;

fn names(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[test]
fn test_concurrent_tag_creation_yields_one_row() {
    let Some(settings) = test_settings() else { return };
    let mut cleanup = TestCleanup {
        pool: test_pool(&settings),
        user_ids: Vec::new(),
    };
    let owner = create_test_user(&mut cleanup, false).id;
    let pool = cleanup.pool.clone();
    let barrier = Barrier::new(2);
    let path = names(&["x"]);

    let ids: Vec<i32> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    let mut conn = pool.get().unwrap();
                    barrier.wait();
                    conn.transaction::<_, HierarchyError, _>(|conn| {
                        find_or_create_path(&mut TagStore::new(conn), owner, &path)
                    })
                    .unwrap()
                    .last()
                    .unwrap()
                    .id()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(ids[0], ids[1]);

    let mut conn = pool.get().unwrap();
    let tags = Tag::get_all_owned(&mut conn, owner).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].parent_id, None);
}

#[test]
fn test_tag_store_walks_and_resolves_paths() {
    let Some(settings) = test_settings() else { return };
    let mut cleanup = TestCleanup {
        pool: test_pool(&settings),
        user_ids: Vec::new(),
    };
    let owner = create_test_user(&mut cleanup, false).id;
    let stranger = create_test_user(&mut cleanup, false).id;
    let mut conn = cleanup.pool.get().unwrap();

    let chain = conn
        .transaction::<_, HierarchyError, _>(|conn| {
            find_or_create_path(&mut TagStore::new(conn), owner, &names(&["a", "b", "c"]))
        })
        .unwrap();
    assert_eq!(chain.len(), 3);

    let mut store = TagStore::new(&mut conn);
    assert_eq!(full_path(&mut store, owner, &chain[2]).unwrap(), "a/b/c");

    // The same names under another owner are separate rows
    assert!(store.find(stranger, None, "a").unwrap().is_none());
    assert!(store.load_parent(stranger, &chain[1]).unwrap().is_none());
}

#[test]
fn test_folder_store_allows_duplicate_siblings() {
    use notekeeper_api::api::hierarchy::HierarchyStore;

    let Some(settings) = test_settings() else { return };
    let mut cleanup = TestCleanup {
        pool: test_pool(&settings),
        user_ids: Vec::new(),
    };
    let owner = create_test_user(&mut cleanup, false).id;
    let mut conn = cleanup.pool.get().unwrap();
    let mut store = FolderStore::new(&mut conn);

    let first = store.create(owner, None, "drafts").unwrap();
    let second = store.create(owner, None, "drafts").unwrap();
    assert_ne!(first.id, second.id);

    let found: Folder = store.find(owner, None, "drafts").unwrap().unwrap();
    assert_eq!(found.id, first.id);
}
