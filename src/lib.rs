pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod schema;
pub mod tables;
pub mod validation;

pub const BASE_URL: &str = "http://localhost:37240";
pub const LOGIN_API: &str = "login";
pub const USERS_API: &str = "users";
pub const NOTES_API: &str = "notes";
pub const FOLDERS_API: &str = "folders";
pub const TAGS_API: &str = "tags";
