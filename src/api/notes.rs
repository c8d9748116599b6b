use super::error::{ApiError, ApiResult};
use super::extract::CurrentUser;
use super::state::AppState;
use crate::tables::{Folder, NewNote, Note, NoteTag, Tag};
use crate::validation::validate_note;
use crate::NOTES_API;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Deserialize, Serialize, Clone)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub folder_id: Option<i32>,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
}

/// Full replacement of a note's editable fields.
pub type UpdateNoteRequest = CreateNoteRequest;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct NoteResponse {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub folder_id: Option<i32>,
    pub tag_ids: Vec<i32>,
    pub owner_id: Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub modified_at: chrono::NaiveDateTime,
}

impl NoteResponse {
    fn new(note: Note, tag_ids: Vec<i32>) -> Self {
        Self {
            id: note.id,
            title: note.title,
            body: note.body,
            folder_id: note.folder_id,
            tag_ids,
            owner_id: note.owner_id,
            created_at: note.created_at,
            modified_at: note.modified_at,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct NoteListParams {
    pub folder_id: Option<i32>,
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            format!("/{NOTES_API}").as_str(),
            get(list_notes).post(create_note),
        )
        .route(
            format!("/{NOTES_API}/:id").as_str(),
            get(get_note).put(update_note).delete(delete_note),
        )
}

/// Sorted, duplicate-free copy of the requested tag ids.
fn dedup_tag_ids(tag_ids: &[i32]) -> Vec<i32> {
    let mut ids = tag_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Validates the payload and checks that the folder and every tag belong to
/// `owner`. Returns the deduplicated tag ids.
fn check_note_request(
    conn: &mut PgConnection,
    owner: Uuid,
    request: &CreateNoteRequest,
) -> ApiResult<Vec<i32>> {
    validate_note(&request.title, &request.body)?;

    if let Some(fid) = request.folder_id {
        Folder::get_owned(conn, owner, fid)?.ok_or(ApiError::NotFound("Folder"))?;
    }

    let tag_ids = dedup_tag_ids(&request.tag_ids);
    if Tag::count_owned(conn, owner, &tag_ids)? != tag_ids.len() as i64 {
        return Err(ApiError::NotFound("Tag"));
    }
    Ok(tag_ids)
}

async fn create_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    use crate::schema::notes;

    let owner = user.id();
    let mut conn = state.conn()?;

    let (note, tag_ids) = conn.transaction::<_, ApiError, _>(|conn| {
        let tag_ids = check_note_request(conn, owner, &payload)?;
        let now = chrono::Utc::now().naive_utc();

        let new_note = NewNote {
            title: &payload.title,
            body: &payload.body,
            folder_id: payload.folder_id,
            owner_id: owner,
            created_at: now,
            modified_at: now,
        };

        let note = diesel::insert_into(notes::table)
            .values(&new_note)
            .returning(Note::as_returning())
            .get_result(conn)?;

        NoteTag::replace_for_note(conn, note.id, &tag_ids)?;
        Ok((note, tag_ids))
    })?;

    info!("Created note {} ({})", note.title, note.id);
    Ok((StatusCode::CREATED, Json(NoteResponse::new(note, tag_ids))))
}

async fn list_notes(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<NoteListParams>,
) -> ApiResult<Json<Vec<NoteResponse>>> {
    let mut conn = state.conn()?;
    let notes = Note::get_all_owned(&mut conn, user.id(), params.folder_id)?;

    let note_ids: Vec<i32> = notes.iter().map(|n| n.id).collect();
    let mut tags_by_note = NoteTag::tag_ids_by_note(&mut conn, &note_ids)?;

    let response = notes
        .into_iter()
        .map(|note| {
            let tag_ids = tags_by_note.remove(&note.id).unwrap_or_default();
            NoteResponse::new(note, tag_ids)
        })
        .collect();

    Ok(Json(response))
}

async fn get_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<i32>,
) -> ApiResult<Json<NoteResponse>> {
    let mut conn = state.conn()?;
    let note = Note::get_owned(&mut conn, user.id(), note_id)?.ok_or(ApiError::NotFound("Note"))?;

    let tag_ids = NoteTag::tag_ids_by_note(&mut conn, &[note.id])?
        .remove(&note.id)
        .unwrap_or_default();

    Ok(Json(NoteResponse::new(note, tag_ids)))
}

async fn update_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<i32>,
    Json(payload): Json<UpdateNoteRequest>,
) -> ApiResult<StatusCode> {
    use crate::schema::notes::dsl::*;

    let owner = user.id();
    let mut conn = state.conn()?;

    conn.transaction::<_, ApiError, _>(|conn| {
        Note::get_owned(conn, owner, note_id)?.ok_or(ApiError::NotFound("Note"))?;
        let new_tag_ids = check_note_request(conn, owner, &payload)?;

        diesel::update(notes.filter(id.eq(note_id)).filter(owner_id.eq(owner)))
            .set((
                title.eq(&payload.title),
                body.eq(&payload.body),
                folder_id.eq(payload.folder_id),
                modified_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        NoteTag::replace_for_note(conn, note_id, &new_tag_ids)?;
        Ok(())
    })?;

    info!("Updated note {}", note_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<i32>,
) -> ApiResult<StatusCode> {
    use crate::schema::notes::dsl::*;

    let mut conn = state.conn()?;
    let deleted = diesel::delete(notes.filter(id.eq(note_id)).filter(owner_id.eq(user.id())))
        .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Note"));
    }
    info!("Deleted note {}", note_id);
    Ok(StatusCode::NO_CONTENT)
}
