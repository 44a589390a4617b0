//! `ChatLedger` - messaging ledger and GitHub organization client.
//!
//! Thin CLI over `chatledger-core` (users, messages, notifications, edit
//! history) and `chatledger-github` (memoized organization lookups).

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatledger_core::{
    Message, MessageId, NewMessage, NewUser, Store, User, UserId, create_user, delete_user,
    edit_message, send_message,
};
use chatledger_github::OrgClient;

#[derive(Parser)]
#[command(name = "chatledger", version, about)]
struct Cli {
    /// Path to the SQLite database (defaults to the platform data dir).
    #[arg(long, global = true, env = "CHATLEDGER_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show GitHub organization metadata.
    Org {
        /// Organization login name.
        name: String,
        /// Bearer token for authenticated access.
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// List a GitHub organization's public repositories.
    Repos {
        /// Organization login name.
        name: String,
        /// Only repositories with this license key (e.g. apache-2.0).
        #[arg(long)]
        license: Option<String>,
        /// Bearer token for authenticated access.
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Create a user account.
    AddUser {
        /// Login name.
        username: String,
        /// Email address.
        email: String,
    },
    /// List user accounts.
    Users,
    /// Send a message.
    Send {
        /// Sender username.
        #[arg(long)]
        from: String,
        /// Receiver username.
        #[arg(long)]
        to: String,
        /// Message content.
        content: String,
        /// Reply to an existing message ID.
        #[arg(long)]
        reply_to: Option<i64>,
    },
    /// Edit a message's content (the prior version is kept in history).
    Edit {
        /// Message ID.
        message: i64,
        /// New content.
        content: String,
        /// Username recorded as the editor.
        #[arg(long)]
        editor: Option<String>,
    },
    /// Show messages received by a user, newest first.
    Inbox {
        /// Receiver username.
        username: String,
        /// Only unread messages.
        #[arg(long)]
        unread: bool,
    },
    /// Mark a message as read.
    Read {
        /// Message ID.
        message: i64,
    },
    /// Show a thread from its root message, oldest first.
    Thread {
        /// Root message ID.
        message: i64,
    },
    /// Show a message's edit history, most recent edit first.
    History {
        /// Message ID.
        message: i64,
    },
    /// Show a user's notifications, newest first.
    Notifications {
        /// Username.
        username: String,
        /// Mark everything read afterwards.
        #[arg(long)]
        mark_read: bool,
    },
    /// Delete a user and every dependent record.
    DeleteUser {
        /// Username.
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatledger=info,chatledger_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Org { name, token } => show_org(&name, token).await,
        Command::Repos {
            name,
            license,
            token,
        } => list_repos(&name, license.as_deref(), token).await,
        command => {
            let store = open_store(cli.database.as_deref()).await?;
            run_store_command(&store, command).await
        }
    }
}

async fn run_store_command(store: &Store, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Org { .. } | Command::Repos { .. } => unreachable!("handled in main"),
        Command::AddUser { username, email } => {
            let user = create_user(store, NewUser::new(username, email)).await?;
            println!("created user {} ({})", user.id, user.username);
            Ok(())
        }
        Command::Users => {
            for user in store.users().list().await? {
                println!("{}\t{}\t{}", user.id, user.username, user.email);
            }
            Ok(())
        }
        Command::Send {
            from,
            to,
            content,
            reply_to,
        } => {
            let sender = resolve_user(store, &from).await?;
            let receiver = resolve_user(store, &to).await?;
            let mut draft = NewMessage::new(sender.id, receiver.id, content);
            if let Some(parent) = reply_to {
                draft = draft.with_parent(MessageId::new(parent));
            }
            let message = send_message(store, draft).await?;
            println!("sent message {}", message.id);
            Ok(())
        }
        Command::Edit {
            message,
            content,
            editor,
        } => {
            let editor = match editor {
                Some(username) => Some(resolve_user(store, &username).await?.id),
                None => None,
            };
            let updated = edit_message(store, MessageId::new(message), &content, editor).await?;
            if updated.edited {
                println!("edited message {}", updated.id);
            } else {
                println!("message {} unchanged", updated.id);
            }
            Ok(())
        }
        Command::Inbox { username, unread } => {
            let user = resolve_user(store, &username).await?;
            let messages = if unread {
                store.messages().unread_for(user.id).await?
            } else {
                store.messages().inbox(user.id).await?
            };
            print_messages(store, &messages).await?;
            Ok(())
        }
        Command::Read { message } => {
            store.messages().mark_read(MessageId::new(message)).await?;
            println!("marked message {message} read");
            Ok(())
        }
        Command::Thread { message } => {
            let messages = store.messages().thread(MessageId::new(message)).await?;
            print_messages(store, &messages).await?;
            Ok(())
        }
        Command::History { message } => {
            let history = store.history().for_message(MessageId::new(message)).await?;
            if history.is_empty() {
                println!("no edits recorded for message {message}");
            }
            for entry in history {
                let editor = match entry.edited_by {
                    Some(id) => username_for(store, id).await?,
                    None => "(unknown)".to_string(),
                };
                println!(
                    "{}  by {}  was: {}",
                    entry.edited_at.format("%Y-%m-%d %H:%M:%S"),
                    editor,
                    entry.old_content
                );
            }
            Ok(())
        }
        Command::Notifications {
            username,
            mark_read,
        } => {
            let user = resolve_user(store, &username).await?;
            let notifications = store.notifications().for_user(user.id).await?;
            for notification in &notifications {
                let status = if notification.is_read { "read" } else { "unread" };
                println!(
                    "[{status}] {}  message {}",
                    notification.created_at.format("%Y-%m-%d %H:%M:%S"),
                    notification.message
                );
            }
            if mark_read {
                let changed = store.notifications().mark_all_read(user.id).await?;
                info!("marked {changed} notifications read for {username}");
            }
            Ok(())
        }
        Command::DeleteUser { username } => {
            let user = resolve_user(store, &username).await?;
            let cleanup = delete_user(store, user.id).await?;
            println!(
                "deleted {username}: {} messages, {} notifications, {} history rows removed, {} editor refs cleared",
                cleanup.messages_deleted,
                cleanup.notifications_deleted,
                cleanup.history_deleted,
                cleanup.editor_refs_cleared
            );
            Ok(())
        }
    }
}

async fn show_org(name: &str, token: Option<String>) -> anyhow::Result<()> {
    let client = github_client(name, token)?;
    let org = client.org().await?;
    println!("{} (id {})", org.login, org.id);
    if let Some(display) = &org.name {
        println!("name: {display}");
    }
    if let Some(description) = &org.description {
        println!("description: {description}");
    }
    if let Some(count) = org.public_repos {
        println!("public repos: {count}");
    }
    println!("repos url: {}", org.repos_url);
    Ok(())
}

async fn list_repos(name: &str, license: Option<&str>, token: Option<String>) -> anyhow::Result<()> {
    let client = github_client(name, token)?;
    for repo in client.public_repos(license).await? {
        println!("{repo}");
    }
    Ok(())
}

fn github_client(name: &str, token: Option<String>) -> anyhow::Result<OrgClient> {
    let mut client = OrgClient::new(name)?;
    if let Some(token) = token {
        client = client.with_token(token);
    }
    Ok(client)
}

async fn open_store(flag: Option<&std::path::Path>) -> anyhow::Result<Store> {
    let path = match flag {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = dirs::data_dir()
                .context("no platform data directory; pass --database")?
                .join("chatledger");
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            dir.join("chatledger.db")
        }
    };
    let store = Store::open(&path.display().to_string()).await?;
    Ok(store)
}

async fn resolve_user(store: &Store, username: &str) -> anyhow::Result<User> {
    store
        .users()
        .get_by_username(username)
        .await?
        .with_context(|| format!("unknown user: {username}"))
}

async fn username_for(store: &Store, id: UserId) -> anyhow::Result<String> {
    Ok(store
        .users()
        .get(id)
        .await?
        .map_or_else(|| id.to_string(), |user| user.username))
}

async fn print_messages(store: &Store, messages: &[Message]) -> anyhow::Result<()> {
    for message in messages {
        let sender = username_for(store, message.sender).await?;
        let marker = if message.is_read { " " } else { "*" };
        let edited = if message.edited { " (edited)" } else { "" };
        println!(
            "{marker} [{}] {}  {}{edited}: {}",
            message.id,
            message.timestamp.format("%Y-%m-%d %H:%M:%S"),
            sender,
            message.content
        );
    }
    Ok(())
}
