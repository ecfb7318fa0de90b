//! Command definitions and handlers.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use linkkeeper_core::models::{
    collect_tags, Content, ContentKind, ContentSearch, LoginRequest, NewContent, ProfileUpdate,
    RegisterRequest,
};
use linkkeeper_core::{ApiError, Config, Session, SessionState};

#[derive(Debug, Parser)]
#[command(name = "linkkeeper", version, about = "Save, tag and share links")]
pub struct Cli {
    /// Override the backend base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Log in with a username or email
    Login {
        identifier: Option<String>,
    },
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Update profile fields
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Permanently delete the account
    DeleteAccount {
        #[arg(long)]
        yes: bool,
    },
    /// Save a link
    Add {
        link: String,
        #[arg(long)]
        title: String,
        #[arg(long = "type", value_parser = parse_kind)]
        kind: ContentKind,
    },
    /// List saved links
    List,
    /// Delete a saved link
    Delete {
        id: String,
    },
    #[command(subcommand)]
    Tag(TagCommand),
    /// Search saved links by tag and date
    Search {
        /// Tag ids to match
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Only links saved before this date (YYYY-MM-DD)
        #[arg(long)]
        before: Option<NaiveDate>,
    },
    #[command(subcommand)]
    Share(ShareCommand),
    /// Show a collection someone shared
    Shared {
        hash: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// Create a tag
    Create { title: String },
    /// Attach tags to a saved link
    Add {
        content_id: String,
        #[arg(required = true)]
        tag_ids: Vec<String>,
    },
    /// Detach a tag from a saved link
    Remove { content_id: String, tag_id: String },
    /// List tags in use
    List,
}

#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    On,
    Off,
    Status,
}

fn parse_kind(s: &str) -> std::result::Result<ContentKind, String> {
    s.parse()
}

fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

fn print_content(items: &[Content]) {
    if items.is_empty() {
        println!("No links.");
        return;
    }
    for item in items {
        println!("{}  [{}] {}", item.id, item.kind, item.title);
        println!("    {}", item.link);
        if !item.tags.is_empty() {
            println!("    tags: {}", item.tag_titles());
        }
    }
}

/// Turn a client error into a user-facing one.
fn explain(err: ApiError) -> anyhow::Error {
    if err.ends_session() {
        anyhow!("Your session has expired. Run `linkkeeper login` to sign in again.")
    } else if err.is_unauthorized() {
        anyhow!("Not authorized. Run `linkkeeper login` first.")
    } else {
        anyhow!(err)
    }
}

async fn require_login(session: &Session) -> Result<()> {
    match session.bootstrap().await {
        SessionState::Active(_) => Ok(()),
        _ => bail!("Not logged in. Run `linkkeeper login` first."),
    }
}

pub async fn run(command: Command, session: &Session, config: &mut Config) -> Result<()> {
    let client = session.client();

    match command {
        Command::Register { name, username, email } => {
            let password = prompt_password("Password: ")?;
            let confirm = prompt_password("Confirm password: ")?;
            if password != confirm {
                bail!("Passwords do not match");
            }
            let message = session
                .register(&RegisterRequest { name, username, email, password })
                .await
                .map_err(explain)?;
            println!("{}", message.unwrap_or_else(|| "Account created. You can log in now.".to_string()));
        }
        Command::Login { identifier } => {
            let identifier = match identifier.or_else(|| config.last_identifier.clone()) {
                Some(id) => id,
                None => bail!("Give a username or email to log in with"),
            };
            let password = prompt_password("Password: ")?;
            let user = session
                .login(&LoginRequest {
                    identifier: identifier.clone(),
                    password,
                })
                .await
                .map_err(explain)?;
            config.last_identifier = Some(identifier);
            if let Err(e) = config.save() {
                tracing::warn!(error = %e, "Failed to save config");
            }
            println!("Logged in as {}", user.display_name());
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out.");
        }
        Command::Whoami => match session.bootstrap().await {
            SessionState::Active(user) => {
                println!("{}", user.display_name());
                if let Some(email) = user.email {
                    println!("{}", email);
                }
            }
            _ => println!("Not logged in."),
        },
        Command::Profile { name, username, email } => {
            let update = ProfileUpdate { name, username, email };
            if update.is_empty() {
                bail!("Give at least one of --name, --username or --email");
            }
            require_login(session).await?;
            let message = client.update_profile(&update).await.map_err(explain)?;
            println!("{}", message.unwrap_or_else(|| "Profile updated.".to_string()));
        }
        Command::DeleteAccount { yes } => {
            if !yes {
                bail!("This deletes your account for good. Re-run with --yes to confirm.");
            }
            require_login(session).await?;
            let message = session.delete_account().await.map_err(explain)?;
            println!("{}", message.unwrap_or_else(|| "Account deleted.".to_string()));
        }
        Command::Add { link, title, kind } => {
            require_login(session).await?;
            let created = client
                .add_content(&NewContent { link, title, kind })
                .await
                .map_err(explain)?;
            println!("Saved {}", created.id);
        }
        Command::List => {
            require_login(session).await?;
            let items = client.list_content().await.map_err(explain)?;
            print_content(&items);
        }
        Command::Delete { id } => {
            require_login(session).await?;
            client.delete_content(&id).await.map_err(explain)?;
            println!("Deleted {}", id);
        }
        Command::Tag(tag) => {
            require_login(session).await?;
            match tag {
                TagCommand::Create { title } => {
                    let tag = client.add_tag(&title).await.map_err(explain)?;
                    println!("{}  {}", tag.id, tag.title);
                }
                TagCommand::Add { content_id, tag_ids } => {
                    let updated = client.tag_content(&content_id, &tag_ids).await.map_err(explain)?;
                    print_content(std::slice::from_ref(&updated));
                }
                TagCommand::Remove { content_id, tag_id } => {
                    let updated = client.untag_content(&content_id, &tag_id).await.map_err(explain)?;
                    print_content(std::slice::from_ref(&updated));
                }
                TagCommand::List => {
                    let items = client.list_content().await.map_err(explain)?;
                    for tag in collect_tags(&items) {
                        println!("{}  {}", tag.id, tag.title);
                    }
                }
            }
        }
        Command::Search { tags, before } => {
            require_login(session).await?;
            let search = ContentSearch {
                tag_ids: tags,
                before_date: before,
            };
            let items = client.search_content(&search).await.map_err(explain)?;
            print_content(&items);
        }
        Command::Share(share) => {
            require_login(session).await?;
            let status = match share {
                ShareCommand::On => client.set_sharing(true).await,
                ShareCommand::Off => client.set_sharing(false).await,
                ShareCommand::Status => client.share_status().await,
            }
            .map_err(explain)?;

            let base = config
                .share_base_url
                .clone()
                .unwrap_or_else(|| format!("{}/content", config.api_base_url));
            match (status.share, status.link(&base)) {
                (true, Some(link)) => println!("Sharing is on: {}", link),
                (true, None) => println!("Sharing is on."),
                (false, _) => println!("Sharing is off."),
            }
        }
        Command::Shared { hash } => {
            let shared = client.shared_collection(&hash).await.map_err(explain)?;
            println!("Shared by {}", shared.username);
            print_content(&shared.content);
        }
    }

    Ok(())
}
