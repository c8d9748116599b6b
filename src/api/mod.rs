pub mod error;
pub mod extract;
pub mod folders;
pub mod hierarchy;
pub mod login;
pub mod notes;
pub mod state;
pub mod tags;
pub mod users;


use crate::config::Settings;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use folders::{CreateFolderRequest, FolderResponse, UpdateFolderRequest};
pub use hierarchy::HierarchyTreeNode;
pub use login::LoginForm;
pub use notes::{CreateNoteRequest, NoteResponse, UpdateNoteRequest};
pub use state::{AppState, Pool};
pub use tags::{CreateTagRequest, TagResponse};
pub use users::{CreateUserRequest, UserResponse};

pub fn create_router(pool: Pool, settings: Settings) -> Router {
    let state = AppState::new(pool, settings);

    Router::new()
        .merge(login::create_router())
        .merge(users::create_router())
        .merge(notes::create_router())
        .merge(folders::create_router())
        .merge(tags::create_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
