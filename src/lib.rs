pub mod access;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod io_utils;
pub mod schema;
pub mod sheets;
pub mod source;
pub mod table;
pub mod telegram;

use std::{env, sync::OnceLock, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    config::AppConfig,
    dispatch::Dispatcher,
    io_utils::CsvSource,
    sheets::SheetsClient,
    source::TabularSource,
    telegram::TelegramClient,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("inventory_bot", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.source.config.as_deref())?;
    let source = open_source(&cli.source, &config)?;
    match cli.command {
        Commands::Serve => handle_serve(source, &config),
        Commands::Categories => handle_categories(source.as_ref(), &config),
        Commands::Report(args) => handle_report(source.as_ref(), &config, &args),
        Commands::CheckUser(args) => handle_check_user(source.as_ref(), &config, &args),
    }
}

fn open_source(args: &SourceArgs, config: &AppConfig) -> Result<Box<dyn TabularSource>> {
    if let Some(path) = &args.csv {
        let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
        info!("Reading inventory from CSV file {path:?}");
        return Ok(Box::new(CsvSource::new(path, args.delimiter, encoding)?));
    }
    let client =
        SheetsClient::from_credentials_file(&config.sheets_api_base, &config.credentials_path)
            .with_context(|| {
                format!(
                    "Unable to create spreadsheet client from {:?}",
                    config.credentials_path
                )
            })?;
    Ok(Box::new(client))
}

fn handle_serve(source: Box<dyn TabularSource>, config: &AppConfig) -> Result<()> {
    let token = config.bot_token()?;
    let transport = TelegramClient::new(
        &config.telegram.api_base,
        &token,
        config.telegram.poll_timeout_secs,
    )?;
    let account = transport.get_me().context("Authorizing bot account")?;
    info!("Authorized on account {account}");
    info!(
        "Serving inventory from sheet '{}'",
        config.location().range_expr()
    );
    let mut dispatcher = Dispatcher::new(source, transport, config.location())
        .with_retry_delay(Duration::from_secs(config.telegram.retry_delay_secs));
    dispatcher.run();
    Ok(())
}

fn handle_categories(source: &dyn TabularSource, config: &AppConfig) -> Result<()> {
    let raw = source.fetch_location(&config.location())?;
    let categories = aggregate::list_categories(&raw)?;
    print!("{}", table::render_categories(&categories));
    info!(
        "Listed {} categor(ies): {}",
        categories.len(),
        categories.iter().join(", ")
    );
    Ok(())
}

fn handle_report(
    source: &dyn TabularSource,
    config: &AppConfig,
    args: &cli::ReportArgs,
) -> Result<()> {
    let raw = source.fetch_location(&config.location())?;
    if args.table {
        let result = aggregate::aggregate_rows(&raw, &args.category)
            .with_context(|| format!("Aggregating category '{}'", args.category))?;
        print!("{}", table::render_aggregation(&result));
    } else {
        let report = aggregate::aggregate_by_category(&raw, &args.category)
            .with_context(|| format!("Aggregating category '{}'", args.category))?;
        println!("{}", report.trim_end());
    }
    Ok(())
}

fn handle_check_user(
    source: &dyn TabularSource,
    config: &AppConfig,
    args: &cli::CheckUserArgs,
) -> Result<()> {
    let registered = access::check_registered(&source, &config.location(), &args.username);
    println!(
        "{}",
        if registered {
            "registered"
        } else {
            "not registered"
        }
    );
    Ok(())
}
