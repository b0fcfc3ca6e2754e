use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use gallery_admin::list::PREVIEW_LEN;
use gallery_admin::notice::SESSION_EXPIRED;
use gallery_admin::{
    FormController, FormError, GalleryView, ListController, Notice, PasswordForm, ProfileForm,
    truncate_preview,
};
use gallery_client::logging::init_logging;
use gallery_client::{
    AuthApi, ClientConfig, ClientError, DescriptionBlock, FileSessionStore, GalleryClientHttp,
    ImageUpload, Locale, Post, PostApi, Session, Slot, resolve_descriptions,
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "gallery", about = "Manage bilingual gallery posts")]
struct Cli {
    /// Backend API base URL, overrides GALLERY_API_URL
    #[arg(short, long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    ChangePassword {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value = "en")]
        language: Locale,
    },
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value = "en")]
        language: Locale,
    },
    Get {
        id: String,
        #[arg(long, default_value = "en")]
        language: Locale,
    },
    /// Create a post from JSON description files
    Create {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        en: PathBuf,
        #[arg(long)]
        de: Option<PathBuf>,
    },
    Update {
        id: String,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        en: Option<PathBuf>,
        #[arg(long)]
        de: Option<PathBuf>,
    },
    Delete {
        id: String,
    },
    /// Print the public gallery for one audience
    Gallery {
        #[arg(long, default_value = "en")]
        language: Locale,
        #[arg(long, default_value = "Teenager")]
        category: Slot,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = Cli::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", error_line(&err));
            ExitCode::FAILURE
        }
    }
}

fn error_line(err: &anyhow::Error) -> String {
    let expired = err
        .downcast_ref::<ClientError>()
        .is_some_and(ClientError::is_session_expired);
    if expired {
        SESSION_EXPIRED.to_string()
    } else {
        format!("Error: {err:#}")
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(server) = args.server {
        config.api_url = server;
    }

    // 1. Build the client once, restoring the stored session
    let session = Session::load(FileSessionStore::new(&config.session_file));
    let mut client = GalleryClientHttp::from_config(&config, session)?;
    debug!(api_url = %client.base_url(), "client ready");

    // 2. Run the command
    match args.command {
        Command::Login { email, password } => {
            let auth = client.login(&email, &password).await?;
            println!(
                "{}",
                auth.message.as_deref().unwrap_or("Successfully logged in!")
            );
        }
        Command::Logout => {
            client.logout();
            println!("Logged out");
        }
        Command::Whoami => match client.current_user() {
            Some(user) => println!(
                "{} <{}>",
                user.name.as_deref().unwrap_or("(no name)"),
                user.email.as_deref().unwrap_or("-")
            ),
            None => println!("Not logged in"),
        },
        Command::UpdateProfile { name, image } => {
            client.session().require_token()?;
            let user = client
                .current_user()
                .cloned()
                .ok_or_else(|| anyhow!("no stored profile, login again"))?;
            let mut form = ProfileForm::for_user(&user);
            if let Some(name) = name {
                form.set_name(name);
            }
            if let Some(path) = image {
                form.select_image(read_image(&path)?);
            }
            form.submit(&mut client).await?;
            report(form.notice());
        }
        Command::ChangePassword { old, new } => {
            client.session().require_token()?;
            let mut form = PasswordForm::new();
            form.old_password = old;
            form.confirm_password = new.clone();
            form.new_password = new;
            form.submit(&mut client).await?;
            report(form.notice());
        }
        Command::List {
            page,
            limit,
            language,
        } => {
            if let Some(limit) = limit {
                config.page_size = limit;
            }
            let mut list = ListController::from_config(&config).with_locale(language);
            list.go_to_page(&client, page).await;
            print_list(&list)?;
        }
        Command::Search {
            query,
            page,
            limit,
            language,
        } => {
            // no one is typing here, so there is nothing to debounce
            let mut list =
                ListController::with_debounce(limit.unwrap_or(config.page_size), Duration::ZERO)
                    .with_locale(language)
                    .starting_at(page);
            list.set_query(query);
            list.flush_search(&client).await;
            print_list(&list)?;
        }
        Command::Get { id, language } => {
            let post = client.get_post_by_id(&id).await?;
            print_post(&post, language);
        }
        Command::Create { image, en, de } => {
            client.session().require_token()?;
            let mut form = FormController::create();
            fill(&mut form, &read_block(&en)?);
            form.select_image(read_image(&image)?);
            form.next_step()?;
            if let Some(de) = de {
                fill(&mut form, &read_block(&de)?);
            }
            form.finish()?;
            let saved = submit(&mut form, &client).await?;
            println!("Post created! ID: {}", saved.id);
        }
        Command::Update { id, image, en, de } => {
            client.session().require_token()?;
            let existing = client.get_post_by_id(&id).await?;
            let mut form = FormController::edit(&existing);
            if let Some(en) = en {
                form.switch_locale(Locale::En);
                fill(&mut form, &read_block(&en)?);
            }
            if let Some(de) = de {
                form.switch_locale(Locale::De);
                fill(&mut form, &read_block(&de)?);
            }
            if let Some(path) = image {
                form.select_image(read_image(&path)?);
            }
            let saved = submit(&mut form, &client).await?;
            println!("Post updated: {saved}");
        }
        Command::Delete { id } => {
            client.session().require_token()?;
            let ack = client.delete_post(&id).await?;
            println!(
                "{}",
                ack.message.as_deref().unwrap_or("Post deleted!")
            );
        }
        Command::Gallery {
            language,
            category,
            limit,
        } => {
            let mut view = GalleryView::default();
            view.set_category(category);
            view.load(&client, language, limit).await;
            fail_on_error(view.notice())?;
            for index in 0..view.posts().len() {
                view.select(index);
                if let (Some(post), Some(text)) = (view.current_post(), view.current_text()) {
                    println!("[{}] {}", post.image.as_deref().unwrap_or("-"), text);
                }
            }
        }
    }

    Ok(())
}

async fn submit(form: &mut FormController, client: &GalleryClientHttp) -> anyhow::Result<Post> {
    match form.submit(client).await {
        Ok(saved) => Ok(saved.post),
        Err(FormError::Client(err)) => Err(err.into()),
        Err(other) => Err(other.into()),
    }
}

fn fill(form: &mut FormController, block: &DescriptionBlock) {
    for (slot, text) in block.iter() {
        form.set_field(slot, text);
    }
}

fn read_block(path: &Path) -> anyhow::Result<DescriptionBlock> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn read_image(path: &Path) -> anyhow::Result<ImageUpload> {
    ImageUpload::from_path(path).with_context(|| format!("read {}", path.display()))
}

fn fail_on_error(notice: Option<&Notice>) -> anyhow::Result<()> {
    match notice {
        Some(n) if n.session_expired => Err(ClientError::Auth {
            status: None,
            message: n.message.clone(),
        }
        .into()),
        Some(n) if n.is_error() => bail!("{}", n.message),
        _ => Ok(()),
    }
}

fn report(notice: Option<&Notice>) {
    if let Some(notice) = notice {
        println!("{}", notice.message);
    }
}

fn print_list(list: &ListController) -> anyhow::Result<()> {
    fail_on_error(list.notice())?;

    if list.items().is_empty() {
        println!("No posts found");
        return Ok(());
    }

    for (index, post) in list.items().iter().enumerate() {
        let block = resolve_descriptions(post, list.locale());
        let previews: Vec<String> = block
            .iter()
            .map(|(slot, text)| format!("{slot}: {}", truncate_preview(text, PREVIEW_LEN)))
            .collect();
        let created = post
            .created_at
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>3}. [{}] {} | {}",
            list.row_number(index),
            post.id,
            created,
            previews.join(" | ")
        );
    }
    println!(
        "Showing page {} of {} (total posts: {})",
        list.page(),
        list.total_pages(),
        list.total_posts()
    );
    Ok(())
}

fn print_post(post: &Post, language: Locale) {
    println!("{post}");
    println!("image: {}", post.image.as_deref().unwrap_or("-"));
    for (slot, text) in resolve_descriptions(post, language).iter() {
        println!("{slot}: {text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_notice_prints_the_bare_session_line() {
        let err = fail_on_error(Some(&Notice::from_error(
            "Failed to fetch posts",
            &ClientError::Auth {
                status: Some(401),
                message: "jwt expired".into(),
            },
        )))
        .unwrap_err();
        assert_eq!(error_line(&err), SESSION_EXPIRED);
    }

    #[test]
    fn other_notices_keep_the_error_prefix() {
        let err = fail_on_error(Some(&Notice::error("database down"))).unwrap_err();
        assert_eq!(error_line(&err), "Error: database down");
        assert!(fail_on_error(Some(&Notice::success("ok"))).is_ok());
        assert!(fail_on_error(None).is_ok());
    }
}
