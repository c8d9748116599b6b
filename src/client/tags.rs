use super::{authorized, send, send_json, ClientError};
pub use crate::api::{CreateTagRequest, HierarchyTreeNode, TagResponse};
use crate::TAGS_API;
use reqwest::StatusCode;

/// Creates every missing tag along `full_name`. Returns `None` when the server
/// accepted an empty path and created nothing.
pub async fn create_tag(
    base_url: &str,
    token: &str,
    full_name: &str,
) -> Result<Option<TagResponse>, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TAGS_API}", base_url);
    let request = CreateTagRequest {
        full_name: full_name.to_string(),
    };

    let response = send(authorized(client.post(&url).json(&request), token)).await?;
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    Ok(Some(response.json::<TagResponse>().await?))
}

pub async fn get_tag(base_url: &str, token: &str, id: i32) -> Result<TagResponse, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TAGS_API}/{}", base_url, id);
    send_json(authorized(client.get(&url), token)).await
}

pub async fn list_tags(base_url: &str, token: &str) -> Result<Vec<TagResponse>, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TAGS_API}", base_url);
    send_json(authorized(client.get(&url), token)).await
}

pub async fn get_tag_tree(
    base_url: &str,
    token: &str,
) -> Result<Vec<HierarchyTreeNode>, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TAGS_API}/tree", base_url);
    send_json(authorized(client.get(&url), token)).await
}

pub async fn delete_tag(base_url: &str, token: &str, id: i32) -> Result<(), ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TAGS_API}/{}", base_url, id);
    send(authorized(client.delete(&url), token)).await?;
    Ok(())
}
