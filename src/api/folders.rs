use super::error::{ApiError, ApiResult};
use super::extract::CurrentUser;
use super::hierarchy::folders::{
    get_folder_tree, load_folder_arena, lock_folder_arena, FolderStore,
};
use super::hierarchy::generics::{
    full_path, would_create_cycle, HierarchyArena, HierarchyError, HierarchyStore,
};
use super::state::AppState;
use crate::tables::Folder;
use crate::validation::validate_folder_name;
use crate::FOLDERS_API;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Deserialize, Serialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_id: Option<i32>,
}

/// Replaces both the name and the parent; `parent_id: null` moves the folder
/// to the root.
#[derive(Deserialize, Serialize)]
pub struct UpdateFolderRequest {
    pub name: String,
    pub parent_id: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct FolderResponse {
    pub id: i32,
    pub name: String,
    pub full_path: String,
    pub parent_id: Option<i32>,
    pub child_ids: Vec<i32>,
    pub owner_id: Uuid,
}

impl FolderResponse {
    fn from_arena(arena: &mut HierarchyArena<Folder>, folder: &Folder) -> ApiResult<Self> {
        let full_path = full_path(arena, folder.owner_id, folder)?;
        Ok(Self {
            id: folder.id,
            name: folder.name.clone(),
            full_path,
            parent_id: folder.parent_id,
            child_ids: arena.child_ids(folder.id),
            owner_id: folder.owner_id,
        })
    }
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            format!("/{FOLDERS_API}").as_str(),
            get(list_folders).post(create_folder),
        )
        .route(format!("/{FOLDERS_API}/tree").as_str(), get(get_folder_tree))
        .route(
            format!("/{FOLDERS_API}/:id").as_str(),
            get(get_folder).put(update_folder).delete(delete_folder),
        )
}

fn folder_response(conn: &mut PgConnection, owner: Uuid, folder_id: i32) -> ApiResult<FolderResponse> {
    let mut arena = load_folder_arena(conn, owner)?;
    let folder = arena
        .get(folder_id)
        .cloned()
        .ok_or(ApiError::NotFound("Folder"))?;
    FolderResponse::from_arena(&mut arena, &folder)
}

async fn create_folder(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateFolderRequest>,
) -> ApiResult<(StatusCode, Json<FolderResponse>)> {
    validate_folder_name(&payload.name)?;
    let owner = user.id();
    let mut conn = state.conn()?;

    let folder = conn.transaction::<_, ApiError, _>(|conn| {
        if let Some(pid) = payload.parent_id {
            Folder::get_owned(conn, owner, pid)?.ok_or(ApiError::NotFound("Parent folder"))?;
        }
        Ok(FolderStore::new(conn).create(owner, payload.parent_id, payload.name.trim())?)
    })?;

    info!("Created folder {} ({})", folder.name, folder.id);
    Ok((
        StatusCode::CREATED,
        Json(folder_response(&mut conn, owner, folder.id)?),
    ))
}

/// Builds the list response, leaving out folders caught in a parent cycle.
fn folder_responses(arena: &mut HierarchyArena<Folder>) -> ApiResult<Vec<FolderResponse>> {
    let folders: Vec<Folder> = arena.iter().cloned().collect();
    let mut response = Vec::with_capacity(folders.len());

    for folder in &folders {
        match FolderResponse::from_arena(arena, folder) {
            Ok(item) => response.push(item),
            Err(ApiError::Hierarchy(HierarchyError::CyclicHierarchy(at))) => {
                warn!("Skipping folder {}: parent cycle at {}", folder.id, at);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(response)
}

async fn list_folders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<FolderResponse>>> {
    let mut conn = state.conn()?;
    let mut arena = load_folder_arena(&mut conn, user.id())?;
    Ok(Json(folder_responses(&mut arena)?))
}

async fn get_folder(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(folder_id): Path<i32>,
) -> ApiResult<Json<FolderResponse>> {
    let mut conn = state.conn()?;
    Ok(Json(folder_response(&mut conn, user.id(), folder_id)?))
}

/// Renames and/or moves a folder. Moving it beneath itself or one of its
/// descendants is a 409.
///
/// The owner's folders stay row-locked from the cycle check until the update
/// commits, so two opposing moves cannot both pass the check.
async fn update_folder(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(folder_id): Path<i32>,
    Json(payload): Json<UpdateFolderRequest>,
) -> ApiResult<Json<FolderResponse>> {
    use crate::schema::folders::dsl::*;

    validate_folder_name(&payload.name)?;
    let owner = user.id();
    let mut conn = state.conn()?;

    let response = conn.transaction::<_, ApiError, _>(|conn| {
        let mut arena = lock_folder_arena(conn, owner)?;

        if arena.get(folder_id).is_none() {
            return Err(ApiError::NotFound("Folder"));
        }

        if let Some(pid) = payload.parent_id {
            let new_parent = arena
                .get(pid)
                .cloned()
                .ok_or(ApiError::NotFound("Parent folder"))?;
            if would_create_cycle(&mut arena, owner, folder_id, &new_parent)? {
                return Err(HierarchyError::CyclicHierarchy(folder_id).into());
            }
        }

        diesel::update(folders.filter(id.eq(folder_id)).filter(owner_id.eq(owner)))
            .set((name.eq(payload.name.trim()), parent_id.eq(payload.parent_id)))
            .execute(conn)?;

        folder_response(conn, owner, folder_id)
    })?;

    info!("Updated folder {}", folder_id);
    Ok(Json(response))
}

/// Notes inside the folder are removed with it; subfolders are orphaned.
async fn delete_folder(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(folder_id): Path<i32>,
) -> ApiResult<StatusCode> {
    use crate::schema::folders::dsl::*;

    let mut conn = state.conn()?;
    let deleted = diesel::delete(folders.filter(id.eq(folder_id)).filter(owner_id.eq(user.id())))
        .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Folder"));
    }
    info!("Deleted folder {}", folder_id);
    Ok(StatusCode::NO_CONTENT)
}
