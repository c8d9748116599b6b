pub mod folders;
pub mod notes;
pub mod tags;

pub use folders::*;
pub use notes::*;
pub use tags::*;

pub use crate::api::{LoginForm, UserResponse};
pub use crate::auth::Token;
use crate::{LOGIN_API, USERS_API};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Not found")]
    NotFound,

    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Unexpected server error: {0}")]
    ServerError(String),
}

// * Helpers ..................................................................

fn authorized(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.bearer_auth(token)
}

/// Sends the request and maps error statuses onto `ClientError`.
async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request.send().await?;

    match response.status() {
        StatusCode::NOT_FOUND => Err(ClientError::NotFound),
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized(error_text(response).await)),
        status if !status.is_success() => Err(ClientError::ServerError(error_text(response).await)),
        _ => Ok(response),
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    Ok(send(request).await?.json::<T>().await?)
}

async fn error_text(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

// * Auth .....................................................................

/// Exchanges a username and password for a bearer token.
pub async fn login(base_url: &str, username: &str, password: &str) -> Result<Token, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{LOGIN_API}/token", base_url);
    let form = LoginForm {
        username: username.to_string(),
        password: password.to_string(),
    };

    send_json(client.post(&url).form(&form)).await
}

pub async fn get_current_user(base_url: &str, token: &str) -> Result<UserResponse, ClientError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{USERS_API}/me", base_url);
    send_json(authorized(client.get(&url), token)).await
}
