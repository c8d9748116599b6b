use super::{authorized, send, send_json, ClientError};
pub use crate::api::{CreateFolderRequest, FolderResponse, HierarchyTreeNode, UpdateFolderRequest};
use crate::FOLDERS_API;

pub async fn create_folder(
    base_url: &str,
    token: &str,
    folder: &CreateFolderRequest,
) -> Result<FolderResponse, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{FOLDERS_API}", base_url);
    send_json(authorized(client.post(&url).json(folder), token)).await
}

pub async fn get_folder(base_url: &str, token: &str, id: i32) -> Result<FolderResponse, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{FOLDERS_API}/{}", base_url, id);
    send_json(authorized(client.get(&url), token)).await
}

pub async fn list_folders(base_url: &str, token: &str) -> Result<Vec<FolderResponse>, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{FOLDERS_API}", base_url);
    send_json(authorized(client.get(&url), token)).await
}

pub async fn get_folder_tree(
    base_url: &str,
    token: &str,
) -> Result<Vec<HierarchyTreeNode>, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{FOLDERS_API}/tree", base_url);
    send_json(authorized(client.get(&url), token)).await
}

pub async fn update_folder(
    base_url: &str,
    token: &str,
    id: i32,
    update: &UpdateFolderRequest,
) -> Result<FolderResponse, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{FOLDERS_API}/{}", base_url, id);
    send_json(authorized(client.put(&url).json(update), token)).await
}

pub async fn delete_folder(base_url: &str, token: &str, id: i32) -> Result<(), ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{FOLDERS_API}/{}", base_url, id);
    send(authorized(client.delete(&url), token)).await?;
    Ok(())
}
