use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use essay_composer::auth::{
    resolve_token, spawn_expiry_listener, SavedSession, SessionStore, TokenSource,
};
use essay_composer::client::{EssayClient, GenerationService};
use essay_composer::compose::{normalize, ComposeError, EssaySession, SystemClipboard};
use essay_composer::config::Config;
use essay_composer::models::Credentials;
use essay_composer::render::render_outline;

#[derive(Parser)]
#[command(name = "essay")]
#[command(about = "Compose grounded essays from uploaded research documents")]
struct Cli {
    /// Service base URL (overrides ESSAY_COMPOSER_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and save the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Upload a PDF research document
    Upload { path: PathBuf },
    /// List uploaded documents
    Documents,
    /// Show one document
    Document { id: String },
    /// List essays
    Essays,
    /// Generate an outline for a topic and create an essay
    Outline { document_id: String, topic: String },
    /// Show an essay's outline and progress
    Show { essay_id: String },
    /// Generate the given sections concurrently
    Section {
        essay_id: String,
        #[arg(required = true)]
        headers: Vec<String>,
    },
    /// Generate every section that has no text yet
    Compose { essay_id: String },
    /// Write the assembled essay as markdown
    Export {
        essay_id: String,
        /// Directory to write into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Print to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Copy the assembled essay to the clipboard
    Copy { essay_id: String },
}

/// Initialize tracing on stderr so exported text on stdout stays clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "essay_composer=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env().with_base_url(cli.base_url);
    let sessions = SessionStore::open_default()?;
    let (token, source) = resolve_token(&config, &sessions);
    let client = EssayClient::from_config(&config, token);
    let listener = spawn_expiry_listener(client.auth_events().subscribe(), sessions.clone(), source);

    let result = run(cli.command, client, &sessions).await;

    // Every sender is gone once `run` returns; the listener drains and exits.
    match listener.await? {
        Some(TokenSource::Environment) => {
            eprintln!("ESSAY_COMPOSER_TOKEN was rejected. Unset it or set a valid token.")
        }
        Some(_) => eprintln!("Session expired. Run `essay login` to sign in again."),
        None => {}
    }
    result
}

async fn run(
    command: Commands,
    client: EssayClient,
    sessions: &SessionStore,
) -> anyhow::Result<()> {
    match command {
        Commands::Signup { email, password } => {
            let account = client.signup(&Credentials { email, password }).await?;
            println!("Account created for {}. Run `essay login` next.", account.email);
        }
        Commands::Login { email, password } => {
            let auth = client.login(&Credentials { email, password }).await?;
            let token = auth
                .access_token
                .context("Login succeeded but no access token was returned")?;
            sessions.save(&SavedSession {
                access_token: token,
                email: Some(auth.email.clone()),
            })?;
            println!("Logged in as {}", auth.email);
        }
        Commands::Logout => {
            sessions.clear()?;
            println!("Logged out");
        }
        Commands::Upload { path } => {
            let receipt = client.upload_document(&path).await?;
            println!(
                "{}  {}  ({} chunks)",
                receipt.doc_id, receipt.status, receipt.chunks_count
            );
        }
        Commands::Documents => {
            for doc in client.list_documents().await? {
                println!("{}  {}  {}", doc.id, doc.status, doc.file_name);
            }
        }
        Commands::Document { id } => {
            let doc = client.get_document(&id).await?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Commands::Essays => {
            for essay in client.list_essays().await? {
                let sections = normalize(&essay.outline).len();
                println!("{}  {}  ({} sections)", essay.id, essay.topic(), sections);
            }
        }
        Commands::Outline { document_id, topic } => {
            let service: Arc<dyn GenerationService> = Arc::new(client);
            let session = EssaySession::create(service, &document_id, &topic).await?;
            println!("essay {}\n", session.essay_id());
            print!("{}", render_outline(&session));
        }
        Commands::Show { essay_id } => {
            let session = open(client, &essay_id).await?;
            print!("{}", render_outline(&session));
        }
        Commands::Section { essay_id, headers } => {
            let session = open(client, &essay_id).await?;
            let results = session.generate_sections(&headers).await;
            report(&session, results)?;
        }
        Commands::Compose { essay_id } => {
            let session = open(client, &essay_id).await?;
            if !session.has_outline() {
                return Err(ComposeError::NoOutline.into());
            }
            let results = session.generate_missing().await;
            report(&session, results)?;
        }
        Commands::Export {
            essay_id,
            dir,
            stdout,
        } => {
            let session = open(client, &essay_id).await?;
            if stdout {
                print!("{}", session.assemble());
            } else {
                let artifact = session.download();
                let path = artifact.write_to(&dir)?;
                println!("Wrote {} ({})", path.display(), artifact.media_type);
            }
        }
        Commands::Copy { essay_id } => {
            let session = open(client, &essay_id).await?;
            let mut clipboard = SystemClipboard::new()?;
            session.copy(&mut clipboard)?;
            println!("Copied!");
        }
    }

    Ok(())
}

async fn open(client: EssayClient, essay_id: &str) -> Result<EssaySession, ComposeError> {
    let service: Arc<dyn GenerationService> = Arc::new(client);
    EssaySession::open(service, essay_id).await
}

/// Print per-section outcomes followed by the outline.
fn report(
    session: &EssaySession,
    results: Vec<(String, Result<String, ComposeError>)>,
) -> anyhow::Result<()> {
    let mut failed = 0;
    for (header, result) in &results {
        match result {
            Ok(_) => println!("● {}", header),
            Err(e) => {
                failed += 1;
                println!("✗ {}", e);
                tracing::debug!("Section {:?} left retryable", header);
            }
        }
    }
    println!();
    print!("{}", render_outline(session));

    if failed > 0 {
        anyhow::bail!("{} of {} sections failed", failed, results.len());
    }
    Ok(())
}
