mod api;
mod auth;
mod config;
mod db;
mod error;
mod logging;
mod models;
mod operations;
mod state;

use anyhow::Result;
use api::ApiClient;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use config::{Config, GlobalArgs};
use db::local_storage;
use error::{AppError, AppResult};
use operations::export::ExportFormat;
use operations::history::HistoryFilter;
use operations::toast::Toast;
use rusqlite::Connection;
use state::data::{DataStore, EditOutcome};
use state::markers::{MarkerStore, MoveSettlement};
use std::path::PathBuf;

/// LifeHub - card spending history and game guide bookmarks
#[derive(Parser)]
#[command(name = "lifehub")]
#[command(version)]
#[command(about = "LifeHub - card spending history and game guide bookmarks")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the access token (raw token or the /login/success?token=... URL)
    Login { token: String },

    /// Clear all local data, token included
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Dashboard figures: count, average, this month, total
    Summary,

    /// List payment history
    History {
        /// Merchant or description contains
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// Month as YYYY-MM
        #[arg(short, long)]
        month: Option<String>,

        /// Show spend per category instead of the list
        #[arg(long)]
        breakdown: bool,
    },

    /// Browse payment history interactively
    Browse,

    /// Upload a card statement (.xls/.xlsx)
    Import { file: PathBuf },

    /// Export payment history
    Export {
        /// Target file (default: payment-history-YYYY-MM-DD.json)
        path: Option<PathBuf>,

        /// Output format (default: from the file extension)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Delete all transactions on the server and locally
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Edit a single transaction
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },

    /// Monthly spending analysis
    Analysis {
        #[command(subcommand)]
        action: AnalysisAction,
    },

    /// Game guide markers and their links
    Markers {
        #[command(subcommand)]
        action: MarkersAction,
    },

    /// Inspect the local key/value storage
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum TxAction {
    /// Change the category of a transaction
    Category { id: String, category: String },
    /// Change the amount of a transaction
    Amount { id: String, amount: String },
    /// Delete a transaction
    Delete { id: String },
}

#[derive(Subcommand)]
enum AnalysisAction {
    /// Print the category breakdown and the stored report for a month
    Show {
        /// Month as YYYY-MM (default: newest month with transactions)
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Ask for a fresh analysis of a month
    Run { month: String },
    /// Interactive analysis screen
    View {
        #[arg(short, long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
enum MarkersAction {
    /// List markers in board order
    List,
    /// Create a marker
    Add {
        title: String,
        /// Tailwind color class, e.g. bg-blue-600 (default: random)
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Delete a marker
    Delete { id: String },
    /// Drop a marker onto another one
    Move { id: String, target: String },
    /// List the links of a marker
    Links { id: String },
    /// Add a link to a marker
    LinkAdd { marker: String, title: String, url: String },
    /// Delete a link
    LinkDelete { marker: String, link: String },
    /// Interactive board
    Board,
    /// Upload markers kept in local storage by older dashboard versions
    Migrate {
        /// localStorage dump (JSON object) to load first
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum StorageAction {
    /// List stored keys
    Keys,
    /// Print a stored value
    Get { key: String },
    /// Load a localStorage dump (JSON object of strings)
    Import { file: PathBuf },
    /// Remove every key
    Clear,
}

impl Commands {
    fn is_interactive(&self) -> bool {
        matches!(
            self,
            Commands::Browse
                | Commands::Analysis { action: AnalysisAction::View { .. } }
                | Commands::Markers { action: MarkersAction::Board }
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_args(&cli.global);
    config.ensure_data_dir()?;

    let log_file = cli.command.is_interactive().then(|| config.log_path());
    logging::setup_logging(cli.verbose, log_file.as_deref())?;

    let conn = db::connection::establish_connection(&config.db_path())?;

    match run(cli.command, &config, &conn) {
        Ok(()) => Ok(()),
        Err(e) if e.needs_login() => {
            let login_url = match e {
                AppError::LoginRequired { ref login_url } => login_url.clone(),
                _ => api::login_url(&config.api_url),
            };
            auth::redirect_to_login(&conn, &login_url, config.open_browser)?;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn client(config: &Config, conn: &Connection) -> AppResult<ApiClient> {
    let token = auth::access_token(conn)?;
    let api = ApiClient::new(&config.api_url, token)?;
    tracing::debug!(api_url = api.base_url(), "API client ready");
    Ok(api)
}

fn run(command: Commands, config: &Config, conn: &Connection) -> AppResult<()> {
    match command {
        Commands::Login { token } => {
            auth::save_token(conn, &token)?;
            let api = client(config, conn)?;
            let user = auth::check_login(&api)?;
            Toast::success("Logged in", user.display_name()).print();
        }
        Commands::Logout => {
            auth::logout(conn)?;
            println!("Logged out. Sign in again at: {}", api::login_url(&config.api_url));
        }
        Commands::Whoami => {
            let api = client(config, conn)?;
            let user = auth::check_login(&api)?;
            println!("{}", user.display_name());
            if !user.message.is_empty() {
                println!("{}", user.message);
            }
        }
        Commands::Summary => {
            let store = DataStore::mount(&client(config, conn)?)?;
            let today = Local::now().date_naive();
            let summary = operations::summary::summarize(store.transactions(), today);
            operations::summary::print_summary(&summary, today);
        }
        Commands::History {
            search,
            category,
            month,
            breakdown,
        } => {
            let store = DataStore::mount(&client(config, conn)?)?;
            let filter = HistoryFilter {
                search: search.unwrap_or_default(),
                category,
                month,
            };
            let rows = operations::history::filter_transactions(store.transactions(), &filter);
            if breakdown {
                let breakdown = operations::history::category_breakdown(rows);
                operations::history::print_breakdown(&breakdown);
            } else {
                operations::history::print_history(&rows);
            }
        }
        Commands::Browse => {
            let api = client(config, conn)?;
            let store = DataStore::mount(&api)?;
            operations::browse::run_browse(&api, store)?;
        }
        Commands::Import { file } => {
            let api = client(config, conn)?;
            let mut store = DataStore::mount(&api)?;
            let count = operations::import::import_statement(&api, &mut store, &file)?;
            Toast::success("Import successful", format!("{} transactions imported.", count))
                .print();
        }
        Commands::Export { path, format } => {
            let store = DataStore::mount(&client(config, conn)?)?;
            let path = path.unwrap_or_else(|| {
                operations::export::default_file_name(Local::now().date_naive())
            });
            let format = match format {
                Some(FormatArg::Json) => ExportFormat::Json,
                Some(FormatArg::Csv) => ExportFormat::Csv,
                None => ExportFormat::from_path(&path),
            };
            let count = operations::export::export_transactions(&store, format, &path)?;
            Toast::success(
                "Export successful",
                format!("{} transactions written to {}.", count, path.display()),
            )
            .print();
        }
        Commands::Clear { yes } => {
            if !yes && !confirm("Delete ALL transactions on the server?")? {
                println!("Cancelled.");
                return Ok(());
            }
            let api = client(config, conn)?;
            let mut store = DataStore::mount(&api)?;
            store.clear(&api)?;
            Toast::success("Data cleared", "All transactions were deleted.").print();
        }
        Commands::Tx { action } => run_tx(action, &client(config, conn)?)?,
        Commands::Analysis { action } => run_analysis(action, &client(config, conn)?)?,
        Commands::Markers { action } => run_markers(action, config, conn)?,
        Commands::Storage { action } => run_storage(action, conn)?,
    }
    Ok(())
}

fn run_tx(action: TxAction, api: &ApiClient) -> AppResult<()> {
    let mut store = DataStore::mount(api)?;
    match action {
        TxAction::Category { id, category } => match store.edit_category(api, &id, &category)? {
            EditOutcome::Updated => Toast::success(
                "Category updated",
                format!("Category changed to {}.", category.trim()),
            )
            .print(),
            EditOutcome::Unchanged => println!("Nothing to change."),
        },
        TxAction::Amount { id, amount } => match store.edit_amount(api, &id, &amount)? {
            EditOutcome::Updated => {
                Toast::success("Amount updated", format!("Amount changed to {}.", amount.trim()))
                    .print()
            }
            EditOutcome::Unchanged => println!("Nothing to change."),
        },
        TxAction::Delete { id } => {
            store.remove_transaction(api, &id)?;
            Toast::success("Transaction deleted", id).print();
        }
    }
    Ok(())
}

fn run_analysis(action: AnalysisAction, api: &ApiClient) -> AppResult<()> {
    let store = DataStore::mount(api)?;
    let mut history = operations::analysis::load_history(api)?;
    let default_month = || {
        operations::history::available_months(store.transactions())
            .into_iter()
            .next()
            .unwrap_or_else(|| Local::now().format("%Y-%m").to_string())
    };

    match action {
        AnalysisAction::Show { month } => {
            let month = month.unwrap_or_else(default_month);
            let breakdown = operations::analysis::monthly_breakdown(store.transactions(), &month);
            operations::analysis::print_breakdown(&breakdown);
            match operations::analysis::report_for(&history, &month) {
                Some(report) => operations::analysis::print_report(report),
                None => println!(
                    "No analysis for {} yet. Run `lifehub analysis run {}`.",
                    month, month
                ),
            }
        }
        AnalysisAction::Run { month } => {
            let report = operations::analysis::reanalyze(
                api,
                &mut history,
                store.transactions(),
                &month,
            )?;
            operations::analysis::print_report(&report);
        }
        AnalysisAction::View { month } => {
            let month = month.unwrap_or_else(default_month);
            operations::report::run_report(api, store.transactions(), history, month)?;
        }
    }
    Ok(())
}

fn run_markers(action: MarkersAction, config: &Config, conn: &Connection) -> AppResult<()> {
    let api = client(config, conn)?;
    let mut store = MarkerStore::mount(&api, config.move_policy)?;

    match action {
        MarkersAction::List => {
            if store.markers().is_empty() {
                println!("No markers yet.");
            }
            for marker in store.markers() {
                println!(
                    "[{}] {} ({}, order {}, {} links)",
                    marker.id,
                    marker.title,
                    marker.color,
                    marker.sort_order,
                    marker.links.len()
                );
            }
        }
        MarkersAction::Add { title, color } => {
            let marker = store.create_marker(&api, &title, color.as_deref())?;
            Toast::success("Marker created", format!("[{}] {}", marker.id, marker.title)).print();
        }
        MarkersAction::Delete { id } => {
            store.delete_marker(&api, &id)?;
            Toast::success("Marker deleted", id).print();
        }
        MarkersAction::Move { id, target } => match store.move_marker(&api, &id, &target) {
            None => println!("Nothing to move."),
            Some(MoveSettlement::Synced) => Toast::success("Marker moved", "").print(),
            Some(MoveSettlement::KeptLocal(e)) | Some(MoveSettlement::RolledBack(e)) => {
                Toast::error("Move failed", e.to_string()).print();
                if e == api::ApiError::Unauthorized {
                    return Err(e.into());
                }
            }
        },
        MarkersAction::Links { id } => {
            let marker = store
                .marker(&id)
                .ok_or_else(|| AppError::NotFound(format!("Marker {}", id)))?;
            if marker.links.is_empty() {
                println!("No links.");
            }
            for link in &marker.links {
                println!("[{}] {} {}", link.id, link.title, link.url);
            }
        }
        MarkersAction::LinkAdd { marker, title, url } => {
            let link = store.add_link(&api, &marker, &title, &url)?;
            Toast::success("Link added", format!("[{}] {}", link.id, link.url)).print();
        }
        MarkersAction::LinkDelete { marker, link } => {
            store.delete_link(&api, &marker, &link)?;
            Toast::success("Link deleted", link).print();
        }
        MarkersAction::Board => {
            operations::board::run_board(&api, store, config.open_browser)?;
        }
        MarkersAction::Migrate { from } => {
            if let Some(path) = from {
                operations::import::import_storage_dump(conn, &path)?;
            }
            let report = operations::migrate::migrate_legacy_markers(conn, &api, &mut store)?;
            Toast::success(
                "Migration complete",
                format!("{} markers and {} links uploaded.", report.markers, report.links),
            )
            .print();
        }
    }
    Ok(())
}

fn run_storage(action: StorageAction, conn: &Connection) -> AppResult<()> {
    match action {
        StorageAction::Keys => {
            for key in local_storage::keys(conn)? {
                println!("{}", key);
            }
        }
        StorageAction::Get { key } => match local_storage::get_item(conn, &key)? {
            Some(value) => println!("{}", value),
            None => println!("(not set)"),
        },
        StorageAction::Import { file } => {
            let count = operations::import::import_storage_dump(conn, &file)?;
            println!("{} keys imported.", count);
        }
        StorageAction::Clear => {
            let removed = local_storage::clear(conn)?;
            println!("{} keys removed.", removed);
        }
    }
    Ok(())
}

fn confirm(question: &str) -> AppResult<bool> {
    use std::io::Write;

    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
