//! pokecache - look up PokeAPI catalog entries from the command line.
//!
//! Everything fetched is cached locally, so repeated lookups (and lookups
//! of anything seen before) work offline.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pokecache_core::{
    CatalogClient, Config, Endpoint, ImageResource, NameOrId, ResourceOptions, SpriteCategory,
    SpriteKey, SpriteOptions, Value,
};

/// Lazy, cache-first PokeAPI lookups
#[derive(Parser, Debug)]
#[command(name = "pokecache")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Cache root (default: ~/.pokecache if present, else the platform cache dir)
    #[arg(long, global = true, env = "POKECACHE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Catalog API base URL
    #[arg(long, global = true, env = "POKECACHE_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an entry, or selected fields of it
    Get {
        /// Endpoint name, e.g. berry or pokemon-species
        endpoint: String,

        /// Entry name or numeric id
        name_or_id: String,

        /// Field paths; dots follow references (e.g. item.cost, moves.0.move.name)
        fields: Vec<String>,

        /// Fetch from the network even when cached
        #[arg(long)]
        force: bool,
    },

    /// List every member of an endpoint
    List {
        endpoint: String,

        /// Print the listing as JSON instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Download a sprite and print its cached path
    Sprite(SpriteArgs),

    /// Show cache location and contents
    CacheInfo {
        /// Also report when this document key was cached (e.g. berry/1/)
        key: Option<String>,
    },

    /// Print every known endpoint name
    Endpoints,
}

#[derive(Args, Debug)]
struct SpriteArgs {
    /// Numeric id
    #[arg(allow_negative_numbers = true)]
    id: i64,

    #[arg(long, default_value = "pokemon")]
    category: String,

    #[arg(long)]
    official_artwork: bool,

    #[arg(long)]
    back: bool,

    #[arg(long)]
    female: bool,

    #[arg(long)]
    shiny: bool,

    /// Download even when cached
    #[arg(long)]
    force: bool,
}

impl SpriteArgs {
    fn options(&self) -> SpriteOptions {
        SpriteOptions {
            official_artwork: self.official_artwork,
            back: self.back,
            female: self.female,
            shiny: self.shiny,
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=pokecache_core=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    if let Some(dir) = cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    if let Some(url) = cli.api_url {
        config.api_base_url = Some(url);
    }

    let client = CatalogClient::new(&config).context("Failed to open catalog client")?;
    debug!(root = %client.cache().paths().root.display(), "Using cache");

    match cli.command {
        Command::Get {
            endpoint,
            name_or_id,
            fields,
            force,
        } => get(&client, &endpoint, &name_or_id, &fields, force).await,
        Command::List { endpoint, json } => list(&client, &endpoint, json).await,
        Command::Sprite(args) => sprite(&client, &args).await,
        Command::CacheInfo { key } => cache_info(&client, key.as_deref()),
        Command::Endpoints => {
            for endpoint in Endpoint::ALL {
                println!("{}", endpoint);
            }
            Ok(())
        }
    }
}

async fn get(
    client: &CatalogClient,
    endpoint: &str,
    name_or_id: &str,
    paths: &[String],
    force: bool,
) -> Result<()> {
    let endpoint: Endpoint = endpoint.parse()?;
    let options = ResourceOptions {
        force,
        ..ResourceOptions::default()
    };
    let resource = client
        .resource_with(endpoint, NameOrId::parse(name_or_id), options)
        .await?;

    if paths.is_empty() {
        let fields = resource.fields().await?;
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    let mut selected = serde_json::Map::new();
    for path in paths {
        let value = walk(Value::Resource(resource.clone()), path).await?;
        selected.insert(path.clone(), serde_json::to_value(&value)?);
    }
    println!("{}", serde_json::to_string_pretty(&selected)?);
    Ok(())
}

/// Follow a dotted field path, loading each resource passed through.
async fn walk(start: Value, path: &str) -> Result<Value> {
    let mut current = start;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Resource(ref resource) => resource.field(segment).await?,
            Value::Metadata(ref fields) => fields.get(segment)?.clone(),
            Value::Sequence(ref items) => {
                let index: usize = segment
                    .parse()
                    .with_context(|| format!("'{}' is not a list index", segment))?;
                match items.get(index) {
                    Some(item) => item.clone(),
                    None => bail!("Index {} out of range ({} items)", index, items.len()),
                }
            }
            ref other => bail!("Cannot look up '{}' in {}", segment, other.kind()),
        };
    }
    Ok(current)
}

async fn list(client: &CatalogClient, endpoint: &str, json: bool) -> Result<()> {
    let endpoint: Endpoint = endpoint.parse()?;
    let listing = client.list(endpoint).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(listing.entries())?);
    } else {
        for name in listing.names() {
            println!("{}", name);
        }
    }
    Ok(())
}

async fn sprite(client: &CatalogClient, args: &SpriteArgs) -> Result<()> {
    let category: SpriteCategory = args.category.parse()?;
    let key = SpriteKey::new(category, args.id, args.options())?;
    let image = ImageResource::from_key(client, key, args.force);

    let path = image
        .path()
        .await
        .with_context(|| format!("Failed to fetch sprite {}", image.url()))?;
    println!("{}", path.display());
    Ok(())
}

fn cache_info(client: &CatalogClient, key: Option<&str>) -> Result<()> {
    let store = client.cache();
    let paths = store.paths();
    let stats = store.stats()?;

    println!("root:      {}", paths.root.display());
    println!("documents: {} ({})", stats.documents, paths.api_cache.display());
    println!("sprites:   {} ({})", stats.sprites, paths.sprite_cache.display());
    if let Some(latest) = stats.last_cached_at {
        println!("updated:   {}", latest.to_rfc3339());
    }

    if let Some(key) = key {
        match store.entry(key)? {
            Some(info) => println!("{}: cached {}", info.key, info.age_display()),
            None => println!("{}: not cached", key),
        }
    }
    Ok(())
}
