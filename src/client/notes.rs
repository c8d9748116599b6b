use super::{authorized, send, send_json, ClientError};
pub use crate::api::{CreateNoteRequest, NoteResponse, UpdateNoteRequest};
use crate::NOTES_API;

pub async fn create_note(
    base_url: &str,
    token: &str,
    note: &CreateNoteRequest,
) -> Result<NoteResponse, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{NOTES_API}", base_url);
    send_json(authorized(client.post(&url).json(note), token)).await
}

pub async fn get_note(base_url: &str, token: &str, id: i32) -> Result<NoteResponse, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{NOTES_API}/{}", base_url, id);
    send_json(authorized(client.get(&url), token)).await
}

/// Lists the caller's notes, optionally only those directly in `folder_id`.
pub async fn list_notes(
    base_url: &str,
    token: &str,
    folder_id: Option<i32>,
) -> Result<Vec<NoteResponse>, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{NOTES_API}", base_url);

    let mut request = client.get(&url);
    if let Some(fid) = folder_id {
        request = request.query(&[("folder_id", fid)]);
    }
    send_json(authorized(request, token)).await
}

pub async fn update_note(
    base_url: &str,
    token: &str,
    id: i32,
    update: &UpdateNoteRequest,
) -> Result<(), ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{NOTES_API}/{}", base_url, id);
    send(authorized(client.put(&url).json(update), token)).await?;
    Ok(())
}

pub async fn delete_note(base_url: &str, token: &str, id: i32) -> Result<(), ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{NOTES_API}/{}", base_url, id);
    send(authorized(client.delete(&url), token)).await?;
    Ok(())
}
