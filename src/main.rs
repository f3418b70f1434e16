use clap::Parser;
use litefetch::cli::{self, Cli, Command};
use litefetch::config::{self, AppConfig, SourceConfig};
use litefetch::dataset::{Dataset, with_deadline};
use litefetch::error::LitefetchError;
use litefetch::format_detect::{self, OutputFormat};
use litefetch::loader::Loader;
use litefetch::session::Session;
use litefetch::shaper::QueryResult;
use litefetch::verbose::{self, Timer};
use litefetch::{format, format_csv, masking, output};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};

#[tokio::main]
async fn main() {
    // Load .env file (optional, ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Query(ref args) => {
            query(args, cli.verbose, cli.show_secrets, cli.config.as_ref()).await
        }
        Command::Schema(ref args) => {
            schema(args, cli.verbose, cli.show_secrets, cli.config.as_ref()).await
        }
        Command::Fetch(ref args) => {
            fetch(args, cli.verbose, cli.show_secrets, cli.config.as_ref()).await
        }
    };

    if let Err(err) = result {
        output::print_error(&err);
        process::exit(1);
    }
}

async fn query(
    args: &cli::QueryArgs,
    verbose: bool,
    show_secrets: bool,
    config_path: Option<&PathBuf>,
) -> Result<(), LitefetchError> {
    let app_config = config::load_from_query_args(args, verbose, show_secrets, config_path)?;
    verbose::init(app_config.verbose);
    log_source(&app_config);

    let sql = resolve_sql(args)?;

    // Detect output format before loading (fail-fast on bad extension)
    let format_info = match app_config.output_file {
        Some(ref path) => Some(format_detect::detect_format(path)?),
        None => None,
    };

    let dataset = load_dataset(&app_config).await?;
    let result = dataset.run_query(&sql)?;

    let label = format_info
        .as_ref()
        .map_or("TOON", |(format, _)| format.label());
    debug!("formatting {label} output");
    output_result(&result, format_info)
}

async fn schema(
    args: &cli::SourceArgs,
    verbose: bool,
    show_secrets: bool,
    config_path: Option<&PathBuf>,
) -> Result<(), LitefetchError> {
    let app_config = config::load_from_source_args(args, verbose, show_secrets, config_path)?;
    verbose::init(app_config.verbose);
    log_source(&app_config);

    let dataset = load_dataset(&app_config).await?;
    let tables = dataset.table_metadata()?;
    debug!(tables = tables.len(), "catalog read");

    output::print_result(&format::schema_to_toon(&tables)?);
    Ok(())
}

async fn fetch(
    args: &cli::FetchArgs,
    verbose: bool,
    show_secrets: bool,
    config_path: Option<&PathBuf>,
) -> Result<(), LitefetchError> {
    let app_config =
        config::load_from_source_args(&args.source, verbose, show_secrets, config_path)?;
    verbose::init(app_config.verbose);
    log_source(&app_config);

    let source = &app_config.source;
    let loader = build_loader(source);
    let show_progress = app_config.progress;

    let timer = Timer::start();
    let bytes = with_deadline(
        source.timeout_secs,
        loader.load(&source.url, |percent| {
            if show_progress {
                output::print_progress(percent);
            }
        }),
    )
    .await?;
    info!(bytes = bytes.len(), elapsed_ms = timer.elapsed_ms() as u64, "download complete");

    output::write_bytes(&bytes, &args.output)?;
    output::print_fetch_summary(bytes.len(), &args.output)
}

// --- Helpers ---

fn resolve_sql(args: &cli::QueryArgs) -> Result<String, LitefetchError> {
    if let Some(ref sql) = args.sql {
        return Ok(sql.clone());
    }
    if let Some(ref path) = args.sql_file {
        let content = std::fs::read_to_string(path).map_err(|e| LitefetchError::Config {
            message: format!("cannot read SQL file {}: {}", path.display(), e),
        })?;
        return Ok(content);
    }
    Err(LitefetchError::Config {
        message: "no SQL provided — use positional argument or --file".to_string(),
    })
}

fn log_source(app_config: &AppConfig) {
    let source = &app_config.source;
    debug!(
        url = %masking::format_url(&source.url, app_config.show_secrets),
        token = %masking::format_optional_secret(source.token.as_ref(), app_config.show_secrets),
        estimated_size = source.estimated_size,
        row_limit = ?app_config.row_limit,
        "resolved configuration"
    );
}

fn build_loader(source: &SourceConfig) -> Loader {
    Loader::new()
        .with_token(source.token.as_ref().map(clone_secret))
        .with_estimated_total(source.estimated_size)
}

fn clone_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

async fn load_dataset(app_config: &AppConfig) -> Result<Dataset, LitefetchError> {
    let source = &app_config.source;
    let session = Session::new().with_row_limit(app_config.row_limit);
    let mut dataset = Dataset::new(build_loader(source), session);

    let printer = app_config.progress.then(|| {
        let mut progress = dataset.subscribe_progress();
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let percent = *progress.borrow_and_update();
                if percent < 100.0 {
                    output::print_progress(percent);
                }
            }
        })
    });

    let loaded = dataset.load_within(&source.url, source.timeout_secs).await;

    if let Some(printer) = printer {
        printer.abort();
        if loaded.is_ok() {
            output::print_progress(100.0);
        }
    }
    loaded?;
    Ok(dataset)
}

fn output_result(
    result: &QueryResult,
    format_info: Option<(OutputFormat, PathBuf)>,
) -> Result<(), LitefetchError> {
    let message = result
        .limit_applied
        .filter(|_| result.hit_cap())
        .map(output::row_cap_message);

    if let Some((format, path)) = format_info {
        debug!("writing output to {}", path.display());
        match format {
            OutputFormat::Toon => {
                let toon = format::to_toon(result)?;
                output::write_file(&toon, &path)?;
            }
            OutputFormat::Csv => {
                format_csv::write_csv(result, &path)?;
            }
        }
        output::print_summary(result.rows.len(), &path, result.hit_cap(), message.as_deref())?;
    } else {
        output::print_result(&format::to_toon(result)?);
    }

    if let Some(ref message) = message {
        output::print_row_cap_warning(message);
    }

    Ok(())
}
