use axum::http::Request;
use clap::{Parser, Subcommand};
use spacetraveling::content::{ContentSource, PrismicClient};
use spacetraveling::{AppState, config, generate, output, router};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(about = "Blog engine for posts kept in a Prismic repository")]
#[command(long_about = "\
Blog engine for posts kept in a Prismic repository

Posts are fetched from the content API and rendered to plain HTML.

  build    Write the home page and the first posts to the output directory
  serve    Serve the site, regenerating pages every [revalidate] seconds
           and generating other posts on first request; handles preview mode

Output structure:

  dist/
  ├── index.html                   # Home: first page of posts
  ├── post/<uid>/index.html        # Prebuilt posts
  ├── style.css, load-more.js, images/logo.svg
  └── .build-manifest.json         # Generation times, read by `serve`

Run 'spacetraveling gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Content API access token (overrides content.access_token)
    #[arg(long, env = "PRISMIC_ACCESS_TOKEN", global = true, hide_env_values = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the static site
    Build {
        /// Render threads (default: all cores)
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Serve the site with incremental regeneration and preview mode
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// List published posts, following "load more" pages
    Posts {
        /// Maximum number of pages to fetch
        #[arg(long, default_value_t = 10)]
        pages: usize,
    },
    /// Validate config and check the content API is reachable
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout is for command output.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let load = || load_site_config(&cli.config, cli.access_token.as_deref());

    match cli.command {
        Command::Build { jobs } => {
            let site_config = load()?;
            init_thread_pool(jobs);
            let client = PrismicClient::new(&site_config.content)?;
            println!("==> Building {}", cli.output.display());
            let report = generate::build(&client, &site_config, &cli.output).await?;
            output::print_build_output(&report, &cli.output);
        }
        Command::Serve { bind } => {
            serve(load()?, &cli.output, bind).await?;
        }
        Command::Posts { pages } => {
            let site_config = load()?;
            let client = PrismicClient::new(&site_config.content)?;
            let mut listing = generate::home_listing(&client, &site_config, None).await?;
            listing
                .load_all(&client, pages.saturating_sub(1))
                .await?;
            output::print_posts_output(
                listing.posts(),
                site_config.site.locale,
                listing.has_more(),
            );
        }
        Command::Check => {
            let site_config = load()?;
            let repository = site_config.repository()?;
            let client = PrismicClient::new(&site_config.content)?;
            let master_ref = client.master_ref().await.map_err(|e| e.to_string());
            output::print_check_output(&site_config, &repository, &master_ref);
            if master_ref.is_err() {
                return Err("content API unreachable".into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `config.toml` (stock defaults when absent) and apply the CLI token.
fn load_site_config(
    path: &Path,
    access_token: Option<&str>,
) -> Result<config::SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(path)?;
    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        site_config.content.access_token = Some(token.to_string());
    }
    Ok(site_config)
}

async fn serve(
    site_config: config::SiteConfig,
    output_dir: &Path,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let bind_addr = bind.unwrap_or_else(|| site_config.server.bind.clone());
    let client: Arc<dyn ContentSource> = Arc::new(PrismicClient::new(&site_config.content)?);
    let state = AppState::new(site_config, client)?;

    let seeded = state.pages.seed_from_build(output_dir).await?;
    tracing::info!(pages = seeded, dir = %output_dir.display(), "page cache seeded from build");

    let app = router(state).layer(TraceLayer::new_for_http().make_span_with(
        |request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        },
    ));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting server");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize the rayon thread pool for page rendering.
///
/// Caps at the number of available CPU cores: the flag can constrain down, not up.
fn init_thread_pool(jobs: Option<usize>) {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = jobs.map_or(cores, |j| j.clamp(1, cores));
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
