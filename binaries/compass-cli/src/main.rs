//! Compass CLI
//!
//! Browse a solution's comments and ratings, and post your own.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use compass_client::{
    ApiClient, FileTokenStore, ReqwestTransport, RequestAuthorizer, TokenStore,
};
use compass_config::CompassConfig;
use compass_core::{Comment, PageRequest, Rating, RatingSummary, Solution};
use compass_feed::{
    FeedController, FeedKind, Level, LoadOutcome, NotificationLog, SubmitOutcome, TokenSession,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compass")]
#[command(about = "Compass - technology solution catalog")]
#[command(version)]
struct Cli {
    /// Override the configured API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a solution with its rating summary and first page of each feed
    Solution {
        slug: String,

        /// Print the raw solution as JSON
        #[arg(long)]
        json: bool,
    },

    /// List comments on a solution
    Comments {
        slug: String,

        /// Official comments instead of user comments
        #[arg(long)]
        official: bool,

        /// Number of pages to fetch
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// List ratings of a solution
    Ratings {
        slug: String,

        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// Post a comment
    Comment { slug: String, text: String },

    /// Rate a solution from 1 to 5
    Rate {
        slug: String,
        score: u8,

        #[arg(short, long, default_value = "")]
        comment: String,
    },

    /// Solutions you own
    Mine {
        #[arg(long, default_value = "0")]
        page: u32,
    },

    /// Show the signed-in user
    Whoami,

    /// Store a bearer token
    Login {
        #[arg(long)]
        token: String,
    },

    /// Forget the stored token
    Logout,
}

// ============== Wiring ==============

struct App {
    config: CompassConfig,
    store: Arc<FileTokenStore>,
    api: ApiClient,
    notes: Arc<NotificationLog>,
    session: Arc<TokenSession>,
}

impl App {
    fn new(config: CompassConfig) -> Self {
        let store = Arc::new(FileTokenStore::at_path(&config.store_path));
        let authorizer =
            RequestAuthorizer::new(&config.api_base, store.clone(), &config.token_key);
        let api = ApiClient::new(Arc::new(ReqwestTransport::new()), authorizer.clone());
        Self {
            config,
            store,
            api,
            notes: Arc::new(NotificationLog::new()),
            session: Arc::new(TokenSession::new(authorizer)),
        }
    }

    fn controller(&self) -> FeedController {
        FeedController::new(self.api.clone(), self.notes.clone(), self.session.clone())
    }

    /// Print pending notifications and any login prompt
    fn flush(&self) {
        for note in self.notes.drain() {
            let marker = match note.level {
                Level::Success => "✓",
                Level::Info => "•",
                Level::Warning => "⚠",
                Level::Error => "✗",
            };
            eprintln!("  {} {}", marker, note.message);
        }
        if self.session.take_login_request() {
            eprintln!("  Sign in first: compass login --token <TOKEN>");
        }
    }
}

fn init_tracing(config: &CompassConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CompassConfig::load().context("loading configuration")?;
    if let Some(api_base) = &cli.api_base {
        config = config
            .with_api_base(api_base)
            .context("invalid --api-base")?;
    }
    init_tracing(&config);
    tracing::debug!(api_base = %config.api_base, "configuration loaded");

    let app = App::new(config);
    let result = match cli.command {
        Commands::Solution { slug, json } => cmd_solution(&app, &slug, json).await,
        Commands::Comments {
            slug,
            official,
            pages,
        } => {
            let kind = if official {
                FeedKind::OfficialComments
            } else {
                FeedKind::UserComments
            };
            cmd_list(&app, &slug, kind, pages).await
        }
        Commands::Ratings { slug, pages } => {
            cmd_list(&app, &slug, FeedKind::Ratings, pages).await
        }
        Commands::Comment { slug, text } => cmd_comment(&app, &slug, &text).await,
        Commands::Rate {
            slug,
            score,
            comment,
        } => cmd_rate(&app, &slug, score, &comment).await,
        Commands::Mine { page } => cmd_mine(&app, page).await,
        Commands::Whoami => cmd_whoami(&app).await,
        Commands::Login { token } => cmd_login(&app, &token),
        Commands::Logout => cmd_logout(&app),
    };

    app.flush();
    result
}

// ============== Commands ==============

async fn cmd_solution(app: &App, slug: &str, json: bool) -> Result<()> {
    let controller = app.controller();
    controller.open(slug).await;

    let Some(solution) = controller.solution() else {
        bail!("solution '{}' could not be loaded", slug);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&solution)?);
        return Ok(());
    }

    print_solution(&solution, controller.summary().as_ref());
    if let Some(mine) = controller.my_rating() {
        println!("  Your rating: {}", "★".repeat(mine.score as usize));
    }

    println!("\n  OFFICIAL");
    print_comments(&controller.official_comments().items());
    println!("\n  COMMENTS ({})", controller.status(FeedKind::UserComments).total);
    print_comments(&controller.user_comments().items());
    println!("\n  RATINGS ({})", controller.status(FeedKind::Ratings).total);
    print_ratings(&controller.ratings().items());
    Ok(())
}

async fn cmd_list(app: &App, slug: &str, kind: FeedKind, pages: u32) -> Result<()> {
    let controller = app.controller();
    controller.reset_all(slug);

    for _ in 0..pages.max(1) {
        match controller.load_more(kind).await {
            LoadOutcome::Loaded { .. } => {}
            LoadOutcome::Failed => bail!("could not load {}", kind),
            _ => break,
        }
    }

    match kind {
        FeedKind::Ratings => print_ratings(&controller.ratings().items()),
        FeedKind::OfficialComments => print_comments(&controller.official_comments().items()),
        FeedKind::UserComments => print_comments(&controller.user_comments().items()),
    }

    let status = controller.status(kind);
    println!(
        "\n  {} of {} {}{}",
        status.len,
        status.total,
        kind,
        if status.has_more { " (more with --pages)" } else { "" }
    );
    Ok(())
}

async fn cmd_comment(app: &App, slug: &str, text: &str) -> Result<()> {
    let controller = app.controller();
    match controller.submit_comment(slug, text).await {
        SubmitOutcome::Submitted => Ok(()),
        SubmitOutcome::Skipped => bail!("comment text is empty"),
        outcome => bail!("comment not posted ({:?})", outcome),
    }
}

async fn cmd_rate(app: &App, slug: &str, score: u8, comment: &str) -> Result<()> {
    let controller = app.controller();
    match controller.submit_rating(slug, score, comment).await {
        SubmitOutcome::Submitted => Ok(()),
        outcome => bail!("rating not submitted ({:?})", outcome),
    }
}

async fn cmd_mine(app: &App, page: u32) -> Result<()> {
    let mine = app
        .api
        .my_solutions(PageRequest::for_page(page))
        .await
        .context("listing your solutions")?;

    if mine.items.is_empty() {
        println!("  No solutions yet");
    }
    for solution in &mine.items {
        println!("  {:<24} {}", solution.slug, solution.name);
    }
    println!("\n  {} total", mine.total);
    Ok(())
}

async fn cmd_whoami(app: &App) -> Result<()> {
    if app.store.get(&app.config.token_key).is_none() {
        println!("  Not signed in");
        return Ok(());
    }
    let user = app.api.current_user().await.context("fetching current user")?;
    println!("  {}", user.username);
    if let Some(name) = &user.full_name {
        println!("  Name:  {}", name);
    }
    if let Some(email) = &user.email {
        println!("  Email: {}", email);
    }
    if user.is_superuser {
        println!("  Role:  administrator");
    }
    Ok(())
}

fn cmd_login(app: &App, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        bail!("token is empty");
    }
    app.store
        .set(&app.config.token_key, token)
        .with_context(|| format!("writing {}", app.store.path().display()))?;
    println!("  ✓ Token stored in {}", app.store.path().display());
    Ok(())
}

fn cmd_logout(app: &App) -> Result<()> {
    app.store
        .remove(&app.config.token_key)
        .with_context(|| format!("writing {}", app.store.path().display()))?;
    println!("  ✓ Signed out");
    Ok(())
}

// ============== Output ==============

fn print_solution(solution: &Solution, summary: Option<&RatingSummary>) {
    println!("\n  {} ({})", solution.name, solution.slug);
    if let Some(category) = &solution.category {
        println!("  Category: {}", category);
    }
    if !solution.tags.is_empty() {
        println!("  Tags: {}", solution.tags.join(", "));
    }
    if let Some(description) = &solution.description {
        println!("\n  {}", description);
    }

    match summary {
        Some(summary) => {
            println!("\n  Rating: {:.1} from {} ratings", summary.average, summary.count);
            for score in (compass_core::MIN_SCORE..=compass_core::MAX_SCORE).rev() {
                println!("    {} ★  {}", score, summary.count_for(score));
            }
        }
        None => {
            if let Some(rating) = solution.rating {
                println!("\n  Rating: {:.1} from {} ratings", rating, solution.rating_count);
            }
        }
    }
}

fn print_comments(comments: &[Comment]) {
    if comments.is_empty() {
        println!("    (none)");
    }
    for comment in comments {
        let when = comment
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("    {} {}: {}", when, comment.author(), comment.content);
    }
}

fn print_ratings(ratings: &[Rating]) {
    if ratings.is_empty() {
        println!("    (none)");
    }
    for rating in ratings {
        let stars = "★".repeat(rating.score as usize);
        match rating.comment.as_deref().filter(|c| !c.is_empty()) {
            Some(comment) => println!("    {:<5} {}: {}", stars, rating.author(), comment),
            None => println!("    {:<5} {}", stars, rating.author()),
        }
    }
}
