mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum_test::TestServer;
use common::{bearer, create_test_user, router, test_pool, test_settings, TestCleanup, TEST_PASSWORD};
use notekeeper_api::api::{
    FolderResponse, HierarchyTreeNode, LoginForm, NoteResponse, TagResponse, UserResponse,
};
use notekeeper_api::auth::Token;
use notekeeper_api::tables::{Folder, User};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    server: TestServer,
    router: axum::Router,
    cleanup: TestCleanup,
}

/// `None` when no database is configured.
fn setup() -> Option<TestApp> {
    let Some(settings) = test_settings() else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };
    let pool = test_pool(&settings);
    let app_router = router(&pool, &settings);
    let server = TestServer::new(app_router.clone()).unwrap();

    Some(TestApp {
        server,
        router: app_router,
        cleanup: TestCleanup {
            pool,
            user_ids: Vec::new(),
        },
    })
}

async fn login(app: &TestApp, user: &User) -> String {
    let response = app
        .server
        .post("/login/token")
        .form(&LoginForm {
            username: user.username.clone(),
            password: TEST_PASSWORD.to_string(),
        })
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Token>().access_token
}

async fn new_user_token(app: &mut TestApp, is_superuser: bool) -> (User, String) {
    let user = create_test_user(&mut app.cleanup, is_superuser);
    let token = login(app, &user).await;
    (user, token)
}

#[tokio::test]
async fn test_login_and_current_user() {
    let Some(mut app) = setup() else { return };
    let (user, token) = new_user_token(&mut app, false).await;

    let (name, value) = bearer(&token);
    let me = app.server.get("/users/me").add_header(name, value).await;
    assert_eq!(me.status_code(), StatusCode::OK);
    assert_eq!(me.json::<UserResponse>().id, user.id);

    let bad = app
        .server
        .post("/login/token")
        .form(&LoginForm {
            username: user.username.clone(),
            password: "wrong password".to_string(),
        })
        .expect_failure()
        .await;
    assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

    let unknown = app
        .server
        .post("/login/token")
        .form(&LoginForm {
            username: format!("{}_missing", user.username),
            password: TEST_PASSWORD.to_string(),
        })
        .expect_failure()
        .await;
    assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown.json::<Value>()["error"], bad.json::<Value>()["error"]);
}

#[tokio::test]
async fn test_user_admin_requires_superuser() {
    let Some(mut app) = setup() else { return };
    let (_, token) = new_user_token(&mut app, false).await;
    let (_, admin_token) = new_user_token(&mut app, true).await;

    let (name, value) = bearer(&token);
    let forbidden = app
        .server
        .get("/users")
        .add_header(name, value)
        .expect_failure()
        .await;
    assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

    let (name, value) = bearer(&admin_token);
    let listed = app.server.get("/users").add_header(name, value).await;
    assert_eq!(listed.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_tag_path_creation_reuses_prefix() {
    let Some(mut app) = setup() else { return };
    let (_, token) = new_user_token(&mut app, false).await;

    let create = |full_name: &'static str| {
        let (name, value) = bearer(&token);
        app.server
            .post("/tags")
            .add_header(name, value)
            .json(&json!({ "full_name": full_name }))
    };

    let first = create("Root_Tag/child_tag/2nd_child_tag").await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    let leaf = first.json::<TagResponse>();
    assert_eq!(leaf.name, "2nd_child_tag");
    assert_eq!(leaf.full_name, "root_tag/child_tag/2nd_child_tag");

    let again = create("/root_tag//child_tag/2nd_child_tag/").await;
    assert_eq!(again.json::<TagResponse>().id, leaf.id);

    let sibling = create("root_tag/other").await.json::<TagResponse>();
    assert_eq!(sibling.full_name, "root_tag/other");

    let (name, value) = bearer(&token);
    let tags = app
        .server
        .get("/tags")
        .add_header(name, value)
        .await
        .json::<Vec<TagResponse>>();
    assert_eq!(tags.len(), 4);

    let root = tags.iter().find(|t| t.name == "root_tag").unwrap();
    assert_eq!(root.parent_id, None);
    assert_eq!(root.child_ids.len(), 2);

    let (name, value) = bearer(&token);
    let tree = app
        .server
        .get("/tags/tree")
        .add_header(name, value)
        .await
        .json::<Vec<HierarchyTreeNode>>();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children.len(), 2);

    let empty = create("///").expect_failure().await;
    assert_eq!(empty.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_deleted_tag_orphans_children() {
    let Some(mut app) = setup() else { return };
    let (_, token) = new_user_token(&mut app, false).await;

    let (name, value) = bearer(&token);
    let leaf = app
        .server
        .post("/tags")
        .add_header(name, value)
        .json(&json!({ "full_name": "a/b/c" }))
        .await
        .json::<TagResponse>();
    let middle_id = leaf.parent_id.unwrap();

    let (name, value) = bearer(&token);
    let deleted = app
        .server
        .delete(&format!("/tags/{middle_id}"))
        .add_header(name, value)
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = bearer(&token);
    let orphan = app
        .server
        .get(&format!("/tags/{}", leaf.id))
        .add_header(name, value)
        .await
        .json::<TagResponse>();
    assert_eq!(orphan.parent_id, Some(middle_id));
    assert_eq!(orphan.full_name, "c");
}

#[tokio::test]
async fn test_folder_move_rejects_cycles() {
    let Some(mut app) = setup() else { return };
    let (_, token) = new_user_token(&mut app, false).await;

    let (name, value) = bearer(&token);
    let parent = app
        .server
        .post("/folders")
        .add_header(name, value)
        .json(&json!({ "name": "Projects" }))
        .await
        .json::<FolderResponse>();

    let (name, value) = bearer(&token);
    let child = app
        .server
        .post("/folders")
        .add_header(name, value)
        .json(&json!({ "name": "Rust", "parent_id": parent.id }))
        .await
        .json::<FolderResponse>();
    assert_eq!(child.full_path, "Projects/Rust");

    let (name, value) = bearer(&token);
    let cyclic = app
        .server
        .put(&format!("/folders/{}", parent.id))
        .add_header(name, value)
        .json(&json!({ "name": "Projects", "parent_id": child.id }))
        .expect_failure()
        .await;
    assert_eq!(cyclic.status_code(), StatusCode::CONFLICT);
    assert_eq!(cyclic.json::<Value>()["code"], "CYCLIC_HIERARCHY");

    let (name, value) = bearer(&token);
    let moved = app
        .server
        .put(&format!("/folders/{}", child.id))
        .add_header(name, value)
        .json(&json!({ "name": "rust-lang", "parent_id": null }))
        .await
        .json::<FolderResponse>();
    assert_eq!(moved.full_path, "rust-lang");
    assert_eq!(moved.parent_id, None);
}

#[tokio::test]
async fn test_note_crud_and_owner_isolation() {
    let Some(mut app) = setup() else { return };
    let (user, token) = new_user_token(&mut app, false).await;
    let (_, other_token) = new_user_token(&mut app, false).await;

    let (name, value) = bearer(&token);
    let folder = app
        .server
        .post("/folders")
        .add_header(name, value)
        .json(&json!({ "name": "Inbox" }))
        .await
        .json::<FolderResponse>();

    let (name, value) = bearer(&token);
    let tag = app
        .server
        .post("/tags")
        .add_header(name, value)
        .json(&json!({ "full_name": "todo" }))
        .await
        .json::<TagResponse>();

    let (name, value) = bearer(&token);
    let created = app
        .server
        .post("/notes")
        .add_header(name, value)
        .json(&json!({
            "title": "Groceries",
            "body": "milk",
            "folder_id": folder.id,
            "tag_ids": [tag.id, tag.id],
        }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let note = created.json::<NoteResponse>();
    assert_eq!(note.owner_id, user.id);
    assert_eq!(note.tag_ids, vec![tag.id]);

    let (name, value) = bearer(&other_token);
    let hidden = app
        .server
        .get(&format!("/notes/{}", note.id))
        .add_header(name, value)
        .expect_failure()
        .await;
    assert_eq!(hidden.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = bearer(&other_token);
    let foreign_folder = app
        .server
        .post("/notes")
        .add_header(name, value)
        .json(&json!({ "title": "Sneaky", "folder_id": folder.id }))
        .expect_failure()
        .await;
    assert_eq!(foreign_folder.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = bearer(&token);
    let updated = app
        .server
        .put(&format!("/notes/{}", note.id))
        .add_header(name, value)
        .json(&json!({ "title": "Groceries", "body": "milk, eggs", "tag_ids": [] }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = bearer(&token);
    let listed = app
        .server
        .get("/notes")
        .add_header(name, value)
        .await
        .json::<Vec<NoteResponse>>();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].body, "milk, eggs");
    assert_eq!(listed[0].folder_id, None);
    assert!(listed[0].tag_ids.is_empty());

    let (name, value) = bearer(&token);
    let invalid = app
        .server
        .post("/notes")
        .add_header(name, value)
        .json(&json!({ "title": "" }))
        .expect_failure()
        .await;
    assert_eq!(invalid.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let (name, value) = bearer(&other_token);
    let not_theirs = app
        .server
        .delete(&format!("/notes/{}", note.id))
        .add_header(name, value)
        .expect_failure()
        .await;
    assert_eq!(not_theirs.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = bearer(&token);
    let deleted = app
        .server
        .delete(&format!("/notes/{}", note.id))
        .add_header(name, value)
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_deleting_folder_removes_its_notes() {
    let Some(mut app) = setup() else { return };
    let (_, token) = new_user_token(&mut app, false).await;

    let (name, value) = bearer(&token);
    let folder = app
        .server
        .post("/folders")
        .add_header(name, value)
        .json(&json!({ "name": "Scratch" }))
        .await
        .json::<FolderResponse>();

    let (name, value) = bearer(&token);
    app.server
        .post("/notes")
        .add_header(name, value)
        .json(&json!({ "title": "temp", "folder_id": folder.id }))
        .await;

    let (name, value) = bearer(&token);
    app.server
        .delete(&format!("/folders/{}", folder.id))
        .add_header(name, value)
        .await;

    let (name, value) = bearer(&token);
    let notes = app
        .server
        .get("/notes")
        .add_header(name, value)
        .await
        .json::<Vec<NoteResponse>>();
    assert!(notes.is_empty());
}

#[tokio::test]
async fn test_new_root_tag_may_share_an_orphans_full_name() {
    let Some(mut app) = setup() else { return };
    let (_, token) = new_user_token(&mut app, false).await;

    let (name, value) = bearer(&token);
    let orphan = app
        .server
        .post("/tags")
        .add_header(name, value)
        .json(&json!({ "full_name": "a/b" }))
        .await
        .json::<TagResponse>();
    let root_id = orphan.parent_id.unwrap();

    let (name, value) = bearer(&token);
    app.server
        .delete(&format!("/tags/{root_id}"))
        .add_header(name, value)
        .await;

    let (name, value) = bearer(&token);
    let created = app
        .server
        .post("/tags")
        .add_header(name, value)
        .json(&json!({ "full_name": "b" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let fresh = created.json::<TagResponse>();
    assert_ne!(fresh.id, orphan.id);
    assert_eq!(fresh.parent_id, None);

    let (name, value) = bearer(&token);
    let tags = app
        .server
        .get("/tags")
        .add_header(name, value)
        .await
        .json::<Vec<TagResponse>>();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().all(|t| t.full_name == "b"));
}

fn move_request(token: &str, folder: &FolderResponse, parent_id: Option<i32>) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/folders/{}", folder.id))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "name": folder.name, "parent_id": parent_id }).to_string(),
        ))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_opposing_folder_moves_cannot_form_a_cycle() {
    let Some(mut app) = setup() else { return };
    let (user, token) = new_user_token(&mut app, false).await;

    let mut created = Vec::new();
    for folder_name in ["a", "b"] {
        let (name, value) = bearer(&token);
        created.push(
            app.server
                .post("/folders")
                .add_header(name, value)
                .json(&json!({ "name": folder_name }))
                .await
                .json::<FolderResponse>(),
        );
    }
    let (a, b) = (&created[0], &created[1]);

    for _ in 0..5 {
        for folder in [a, b] {
            let status = app
                .router
                .clone()
                .oneshot(move_request(&token, folder, None))
                .await
                .unwrap()
                .status();
            assert_eq!(status, StatusCode::OK);
        }

        let a_under_b = tokio::spawn(app.router.clone().oneshot(move_request(&token, a, Some(b.id))));
        let b_under_a = tokio::spawn(app.router.clone().oneshot(move_request(&token, b, Some(a.id))));

        let mut codes = vec![
            a_under_b.await.unwrap().unwrap().status().as_u16(),
            b_under_a.await.unwrap().unwrap().status().as_u16(),
        ];
        codes.sort_unstable();
        assert_eq!(codes, vec![200, 409]);

        let mut conn = app.cleanup.pool.get().unwrap();
        let a_row = Folder::get_owned(&mut conn, user.id, a.id).unwrap().unwrap();
        let b_row = Folder::get_owned(&mut conn, user.id, b.id).unwrap().unwrap();
        let moved = [a_row.parent_id.is_some(), b_row.parent_id.is_some()];
        assert_eq!(moved.iter().filter(|m| **m).count(), 1);

        let (name, value) = bearer(&token);
        let listed = app.server.get("/folders").add_header(name, value).await;
        assert_eq!(listed.status_code(), StatusCode::OK);
        assert_eq!(listed.json::<Vec<FolderResponse>>().len(), 2);
    }
}
