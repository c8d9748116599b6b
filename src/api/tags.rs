use super::error::{ApiError, ApiResult};
use super::extract::CurrentUser;
use super::hierarchy::generics::{
    find_or_create_path, full_path, split_path, HierarchyArena, HierarchyError, HierarchyNode,
};
use super::hierarchy::tags::{get_tag_tree, load_tag_arena, TagStore};
use super::state::AppState;
use crate::tables::Tag;
use crate::validation::{validate_length, MAX_NAME_LEN, MIN_NAME_LEN};
use crate::TAGS_API;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Deserialize, Serialize)]
pub struct CreateTagRequest {
    /// `/`-delimited path such as `"lang/rust"`.
    pub full_name: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub full_name: String,
    pub parent_id: Option<i32>,
    pub child_ids: Vec<i32>,
    pub owner_id: Uuid,
}

impl TagResponse {
    fn from_arena(arena: &mut HierarchyArena<Tag>, tag: &Tag) -> ApiResult<Self> {
        let full_name = full_path(arena, tag.owner_id, tag)?;
        Ok(Self {
            id: tag.id,
            name: tag.name.clone(),
            full_name,
            parent_id: tag.parent_id,
            child_ids: arena.child_ids(tag.id),
            owner_id: tag.owner_id,
        })
    }
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            format!("/{TAGS_API}").as_str(),
            get(list_tags).post(create_tag),
        )
        .route(format!("/{TAGS_API}/tree").as_str(), get(get_tag_tree))
        .route(
            format!("/{TAGS_API}/:id").as_str(),
            get(get_tag).delete(delete_tag),
        )
}

/// Resolves `full_name` to a chain of tags, creating whatever is missing.
///
/// Responds with the leaf tag, or `204 No Content` when the path was empty
/// and the hierarchy policy allows it.
async fn create_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateTagRequest>,
) -> ApiResult<Response> {
    validate_length("full_name", &payload.full_name, 0, MAX_NAME_LEN)?;
    let names = split_path(&payload.full_name, state.hierarchy_policy())?;
    for name in &names {
        validate_length("name", name, MIN_NAME_LEN, MAX_NAME_LEN)?;
    }

    let owner = user.id();
    let mut conn = state.conn()?;
    let chain = conn.transaction::<_, ApiError, _>(|conn| {
        Ok(find_or_create_path(&mut TagStore::new(conn), owner, &names)?)
    })?;

    let Some(leaf) = chain.last() else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let mut arena = load_tag_arena(&mut conn, owner)?;
    let response = TagResponse::from_arena(&mut arena, leaf)?;
    info!("Resolved tag path '{}' to tag {}", response.full_name, leaf.id());

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

async fn list_tags(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<TagResponse>>> {
    let mut conn = state.conn()?;
    let mut arena = load_tag_arena(&mut conn, user.id())?;
    Ok(Json(tag_responses(&mut arena)?))
}

/// Builds the list response, leaving out tags caught in a parent cycle.
fn tag_responses(arena: &mut HierarchyArena<Tag>) -> ApiResult<Vec<TagResponse>> {
    let tags: Vec<Tag> = arena.iter().cloned().collect();
    let mut response = Vec::with_capacity(tags.len());

    for tag in &tags {
        match TagResponse::from_arena(arena, tag) {
            Ok(item) => response.push(item),
            Err(ApiError::Hierarchy(HierarchyError::CyclicHierarchy(at))) => {
                warn!("Skipping tag {}: parent cycle at {}", tag.id, at);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(response)
}

async fn get_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tag_id): Path<i32>,
) -> ApiResult<Json<TagResponse>> {
    let mut conn = state.conn()?;
    let mut arena = load_tag_arena(&mut conn, user.id())?;

    let tag = arena.get(tag_id).cloned().ok_or(ApiError::NotFound("Tag"))?;
    Ok(Json(TagResponse::from_arena(&mut arena, &tag)?))
}

/// Children of a deleted tag keep their dangling `parent_id`.
async fn delete_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tag_id): Path<i32>,
) -> ApiResult<StatusCode> {
    use crate::schema::tags::dsl::*;

    let mut conn = state.conn()?;
    let deleted = diesel::delete(tags.filter(id.eq(tag_id)).filter(owner_id.eq(user.id())))
        .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Tag"));
    }
    info!("Deleted tag {}", tag_id);
    Ok(StatusCode::NO_CONTENT)
}
