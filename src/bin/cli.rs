use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use notekeeper_api::api::{self, CreateFolderRequest, CreateNoteRequest, UpdateFolderRequest};
use notekeeper_api::client;
use notekeeper_api::config::Settings;
use notekeeper_api::db;
use serde::Serialize;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// The address to bind to
        #[arg(short, long, default_value = "127.0.0.1:37240")]
        addr: SocketAddr,
    },
    /// Create the tables and the configured first superuser, then exit
    CreateSuperuser,
    /// Client commands
    Client {
        /// The base URL of the API
        #[arg(long, default_value = notekeeper_api::BASE_URL)]
        url: String,
        /// Bearer token returned by `client login`
        #[arg(long, env = "NOTEKEEPER_TOKEN")]
        token: Option<String>,
        #[command(subcommand)]
        command: ClientCommands,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Log in and print an access token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "NOTEKEEPER_PASSWORD")]
        password: String,
    },
    #[command(flatten)]
    Authed(AuthedCommands),
}

/// Commands that need a bearer token.
#[derive(Subcommand)]
enum AuthedCommands {
    /// Show the logged in user
    Me,
    /// Tag commands
    Tags {
        #[command(subcommand)]
        command: TagsCommands,
    },
    /// Folder commands
    Folders {
        #[command(subcommand)]
        command: FoldersCommands,
    },
    /// Note commands
    Notes {
        #[command(subcommand)]
        command: NotesCommands,
    },
}

#[derive(Subcommand)]
enum TagsCommands {
    /// List all tags
    List,
    /// Show a single tag
    Get { id: i32 },
    /// Display the tag tree
    Tree,
    /// Create every missing tag along a path such as `lang/rust`
    Create { full_name: String },
    /// Delete a tag
    Delete { id: i32 },
}

#[derive(Subcommand)]
enum FoldersCommands {
    /// List all folders
    List,
    /// Show a single folder
    Get { id: i32 },
    /// Display the folder tree
    Tree,
    /// Create a folder
    Create {
        name: String,
        #[arg(long)]
        parent_id: Option<i32>,
    },
    /// Rename a folder or move it under another parent
    Update {
        id: i32,
        #[arg(long)]
        name: String,
        #[arg(long)]
        parent_id: Option<i32>,
    },
    /// Delete a folder and the notes in it
    Delete { id: i32 },
}

#[derive(Subcommand)]
enum NotesCommands {
    /// List notes
    List {
        #[arg(long)]
        folder_id: Option<i32>,
    },
    /// Show a single note
    Get { id: i32 },
    /// Create a note
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        folder_id: Option<i32>,
        #[arg(long = "tag", value_name = "TAG_ID")]
        tag_ids: Vec<i32>,
    },
    /// Replace a note's title, body, folder and tags
    Update {
        id: i32,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        folder_id: Option<i32>,
        #[arg(long = "tag", value_name = "TAG_ID")]
        tag_ids: Vec<i32>,
    },
    /// Delete a note
    Delete { id: i32 },
}

fn init_tracing(settings: Option<&Settings>) {
    let default_filter = settings.map_or("info", |s| s.log_level.as_filter());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Connects to the database, creates the schema and the first superuser.
fn bootstrap(settings: &Settings) -> anyhow::Result<api::Pool> {
    let pool = db::establish_pool(settings).context("Failed to create database pool")?;
    let mut conn = pool.get()?;

    db::create_tables(&mut conn).context("Failed to create tables")?;
    if let Some(user) = api::users::create_first_superuser(&mut conn, settings)? {
        info!("Created first superuser {}", user.username);
    }
    Ok(pool)
}

async fn run_client(url: &str, token: Option<String>, command: ClientCommands) -> anyhow::Result<()> {
    let command = match command {
        ClientCommands::Login { username, password } => {
            let token = client::login(url, &username, &password).await?;
            println!("{}", token.access_token);
            return Ok(());
        }
        ClientCommands::Authed(command) => command,
    };

    let token = token.ok_or_else(|| anyhow!("A token is required: pass --token or set NOTEKEEPER_TOKEN"))?;
    let token = token.as_str();

    match command {
        AuthedCommands::Me => print_json(&client::get_current_user(url, token).await?),
        AuthedCommands::Tags { command } => match command {
            TagsCommands::List => print_json(&client::list_tags(url, token).await?),
            TagsCommands::Get { id } => print_json(&client::get_tag(url, token, id).await?),
            TagsCommands::Tree => print_json(&client::get_tag_tree(url, token).await?),
            TagsCommands::Create { full_name } => {
                match client::create_tag(url, token, &full_name).await? {
                    Some(tag) => print_json(&tag),
                    None => {
                        println!("Empty path, nothing created");
                        Ok(())
                    }
                }
            }
            TagsCommands::Delete { id } => {
                client::delete_tag(url, token, id).await?;
                println!("Deleted tag {}", id);
                Ok(())
            }
        },
        AuthedCommands::Folders { command } => match command {
            FoldersCommands::List => print_json(&client::list_folders(url, token).await?),
            FoldersCommands::Get { id } => print_json(&client::get_folder(url, token, id).await?),
            FoldersCommands::Tree => print_json(&client::get_folder_tree(url, token).await?),
            FoldersCommands::Create { name, parent_id } => {
                let request = CreateFolderRequest { name, parent_id };
                print_json(&client::create_folder(url, token, &request).await?)
            }
            FoldersCommands::Update {
                id,
                name,
                parent_id,
            } => {
                let request = UpdateFolderRequest { name, parent_id };
                print_json(&client::update_folder(url, token, id, &request).await?)
            }
            FoldersCommands::Delete { id } => {
                client::delete_folder(url, token, id).await?;
                println!("Deleted folder {}", id);
                Ok(())
            }
        },
        AuthedCommands::Notes { command } => match command {
            NotesCommands::List { folder_id } => {
                print_json(&client::list_notes(url, token, folder_id).await?)
            }
            NotesCommands::Get { id } => print_json(&client::get_note(url, token, id).await?),
            NotesCommands::Create {
                title,
                body,
                folder_id,
                tag_ids,
            } => {
                let request = CreateNoteRequest {
                    title,
                    body,
                    folder_id,
                    tag_ids,
                };
                print_json(&client::create_note(url, token, &request).await?)
            }
            NotesCommands::Update {
                id,
                title,
                body,
                folder_id,
                tag_ids,
            } => {
                let request = CreateNoteRequest {
                    title,
                    body,
                    folder_id,
                    tag_ids,
                };
                client::update_note(url, token, id, &request).await?;
                println!("Updated note {}", id);
                Ok(())
            }
            NotesCommands::Delete { id } => {
                client::delete_note(url, token, id).await?;
                println!("Deleted note {}", id);
                Ok(())
            }
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { addr } => {
            let settings = Settings::from_env()?;
            init_tracing(Some(&settings));

            let pool = bootstrap(&settings)?;
            let app = api::create_router(pool, settings);

            info!("Starting server on {}", addr);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            axum::serve(listener, app).await?;
        }
        Commands::CreateSuperuser => {
            let settings = Settings::from_env()?;
            init_tracing(Some(&settings));

            if settings.first_superuser.is_none() {
                return Err(anyhow!(
                    "Set FIRST_SUPERUSER_USERNAME, FIRST_SUPERUSER_EMAIL and FIRST_SUPERUSER_PASSWORD"
                ));
            }
            bootstrap(&settings)?;
        }
        Commands::Client {
            url,
            token,
            command,
        } => {
            init_tracing(None);
            run_client(&url, token, command).await?;
        }
    }

    Ok(())
}
