use std::future::Future;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use folio_catalog::{featured, CatalogStore, GalleryQuery};
use folio_gate::{AdminGate, Credentials};
use folio_server::{FolioServer, ServerConfig};
use folio_store::{open_backend, InlineImage};
use folio_types::{
    ArtworkId, ArtworkPatch, ArtworkRecord, Category, CategoryFilter, NewArtwork, PriceInput,
};
use serde::Serialize;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::load(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::List(args) => cmd_list(&config, args, &format).await,
        Command::Featured(args) => cmd_featured(&config, args, &format).await,
        Command::Show(args) => cmd_show(&config, args, &format).await,
        Command::Add(args) => cmd_add(&config, args, &format).await,
        Command::Update(args) => cmd_update(&config, args, &format).await,
        Command::Delete(args) => cmd_delete(&config, args).await,
        Command::Categories => cmd_categories(&format),
    }
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let server = FolioServer::new(config).await?;
    println!(
        "{} Folio server on {} ({} backend)",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold(),
        server.state().catalog.backend_name()
    );
    server.serve().await?;
    Ok(())
}

async fn cmd_list(config: &ServerConfig, args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;
    let query = GalleryQuery {
        category: args
            .category
            .as_deref()
            .map(|c| c.parse::<CategoryFilter>().unwrap_or_default())
            .unwrap_or_default(),
        available_only: args.available,
    };
    let snapshot = catalog.snapshot();
    print_records(&query.apply(&snapshot), format)
}

async fn cmd_featured(
    config: &ServerConfig,
    args: FeaturedArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;
    let snapshot = catalog.snapshot();
    print_records(&featured(&snapshot, args.limit), format)
}

async fn cmd_show(config: &ServerConfig, args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;
    let id: ArtworkId = args.id.parse()?;
    let Some(record) = catalog.get(&id) else {
        bail!("artwork not found: {id}");
    };
    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Text => {
            print_record(&record);
            if !record.description.is_empty() {
                println!("  {}", record.description);
            }
            if !record.medium.is_empty() {
                println!("  Medium: {}", record.medium);
            }
            println!("  Image: {}", record.image_url.blue());
            Ok(())
        }
    }
}

async fn cmd_add(config: &ServerConfig, args: AddArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let category = Category::parse_known(&args.category)?;
    let mut input = NewArtwork::new(args.title, image_reference(&args.image)?);
    input.description = args.description;
    input.category = category;
    input.medium = args.medium;
    if let Some(year) = args.year {
        input.year = year;
    }
    input.featured = args.featured;
    input.available = !args.sold;
    input.price = args.price.map(PriceInput::Text);

    let catalog = open_catalog(config).await?;
    let record = as_admin(config, &args.auth, || catalog.add(input)).await?;
    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Text => {
            println!("{} Added {}", "✓".green().bold(), record.title.bold());
            println!("  Id: {}", record.id.as_str().yellow());
            println!("  Image: {}", record.image_url.blue());
            Ok(())
        }
    }
}

async fn cmd_update(
    config: &ServerConfig,
    args: UpdateArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let id: ArtworkId = args.id.parse()?;
    let patch = ArtworkPatch {
        title: args.title,
        description: args.description,
        category: args
            .category
            .as_deref()
            .map(Category::parse_known)
            .transpose()?,
        medium: args.medium,
        year: args.year,
        image_url: args.image.as_deref().map(image_reference).transpose()?,
        featured: args.featured,
        available: args.available,
        price: if args.clear_price {
            Some(None)
        } else {
            args.price.map(|p| Some(PriceInput::Text(p)))
        },
    };

    let catalog = open_catalog(config).await?;
    as_admin(config, &args.auth, || catalog.update(&id, patch)).await?;
    let record = catalog
        .get(&id)
        .with_context(|| format!("artwork {id} vanished after update"))?;
    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Text => {
            println!("{} Updated", "✓".green().bold());
            print_record(&record);
            Ok(())
        }
    }
}

async fn cmd_delete(config: &ServerConfig, args: DeleteArgs) -> anyhow::Result<()> {
    let id: ArtworkId = args.id.parse()?;
    let catalog = open_catalog(config).await?;
    as_admin(config, &args.auth, || catalog.delete(&id)).await?;
    println!("{} Deleted {}", "✓".green().bold(), id.as_str().yellow());
    Ok(())
}

fn cmd_categories(format: &OutputFormat) -> anyhow::Result<()> {
    let all = Category::ALL;
    let labels: Vec<&str> = all.iter().map(Category::label).collect();
    match format {
        OutputFormat::Json => print_json(&labels),
        OutputFormat::Text => {
            for label in labels {
                println!("  {}", label.cyan());
            }
            Ok(())
        }
    }
}

/// Open the configured backend and load the catalog, failing loudly.
async fn open_catalog(config: &ServerConfig) -> anyhow::Result<CatalogStore> {
    let backend = open_backend(&config.backend)
        .await
        .context("failed to open artwork backend")?;
    let catalog = CatalogStore::new(backend);
    catalog
        .refresh()
        .await
        .context("failed to load the catalog")?;
    Ok(catalog)
}

/// Run `op` inside a short-lived admin session.
async fn as_admin<T, E, F, Fut>(config: &ServerConfig, auth: &AuthArgs, op: F) -> anyhow::Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<anyhow::Error>,
{
    let gate = AdminGate::from_config(&config.admin).context("admin access is not configured")?;
    let session = gate.log_in(&credentials(auth)?).await?;
    debug!(admin = %session.admin.name, "admin session opened");
    let result = op().await.map_err(Into::into);
    gate.log_out(&session.token).await?;
    result
}

fn credentials(auth: &AuthArgs) -> anyhow::Result<Credentials> {
    match (&auth.email, &auth.password, &auth.secret) {
        (Some(email), Some(password), _) => Ok(Credentials::email_password(email, password)),
        (Some(_), None, _) => bail!("--email needs --password"),
        (None, _, Some(secret)) => Ok(Credentials::secret(secret)),
        (None, _, None) => bail!("admin credentials required: pass --secret or --email/--password"),
    }
}

/// A local image file becomes an inline data URI; URLs pass through.
fn image_reference(arg: &str) -> anyhow::Result<String> {
    let path = Path::new(arg);
    if path.is_file() {
        let mime = mime_for(path)?;
        let data = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        return Ok(InlineImage::new(mime, data).to_data_uri());
    }
    if arg.contains("://") || arg.starts_with("data:") || arg.starts_with('/') {
        return Ok(arg.to_string());
    }
    bail!("image not found: {arg}")
}

fn mime_for(path: &Path) -> anyhow::Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    Ok(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        _ => bail!("unsupported image type: {}", path.display()),
    })
}

fn format_price(price: Option<f64>) -> String {
    match price {
        None => "-".into(),
        Some(p) if p.fract() == 0.0 => format!("${p:.0}"),
        Some(p) => format!("${p:.2}"),
    }
}

fn print_record(record: &ArtworkRecord) {
    let status = if record.available {
        "available".green()
    } else {
        "sold".red()
    };
    let star = if record.featured { " ★".yellow() } else { "".normal() };
    println!(
        "{}  {}  {}  {}  {}  {}{}",
        record.id.short_id().yellow(),
        record.title.bold(),
        record.category.label().cyan(),
        record.year.dimmed(),
        format_price(record.price),
        status,
        star
    );
}

fn print_records(records: &[&ArtworkRecord], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No artworks.");
            }
            for record in records {
                print_record(record);
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
