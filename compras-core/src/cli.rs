//! `compras` command line
//!
//! Every command prints its result as pretty JSON on stdout. Logs go to
//! stderr or the rolling log file.

use crate::core::{AppState, BoxError};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use shared::AppError;
use shared::models::{AccountPointDraft, DocumentNumber, OrderDraft, OrderQuery};
use std::path::{Path, PathBuf};

/// Purchase order numbering and creation
#[derive(Parser, Debug)]
#[command(name = "compras", version, about = "Purchase order numbering and creation")]
pub struct Cli {
    /// Store URL (postgres://… or sqlite:…)
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending migrations and exit
    Migrate,

    /// Purchase orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },

    /// Document counters
    Numbering {
        #[command(subcommand)]
        action: NumberingAction,
    },

    /// Global settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Account points
    #[command(name = "account-point")]
    AccountPoint {
        #[command(subcommand)]
        action: AccountPointAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum OrderAction {
    /// Create an order from a JSON draft
    Create {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Show one order with items and references
    Show { id: i64 },

    /// Search orders
    List {
        /// Matches memo number, concept, requesting unit or provider
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        provider: Option<String>,
        /// Memo date lower bound (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Memo date upper bound (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = shared::models::DEFAULT_PAGE_LIMIT)]
        limit: u32,
    },

    /// Orders referencing an account point
    #[command(name = "by-account-point")]
    ByAccountPoint { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum NumberingAction {
    /// Issue the next number for a document type
    Next {
        #[arg(long = "type")]
        document_type: String,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
    },

    /// Acknowledge a year-end reset (writes nothing)
    Reset {
        #[arg(long)]
        year: i32,
    },

    /// List counters
    Counters {
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show or replace the tax (IVA) percentage
    #[command(name = "tax-rate")]
    TaxRate {
        #[arg(long)]
        set: Option<Decimal>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountPointAction {
    /// Create an account point from a JSON draft
    Create {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Show one account point
    Show { id: i64 },
}

/// Run one command against the wired services
pub async fn execute(command: Command, state: &AppState) -> Result<Value, BoxError> {
    match command {
        Command::Migrate => Ok(json!({
            "backend": state.store.backend().to_string(),
            "migrations": "applied",
        })),
        Command::Order { action } => order(action, state).await,
        Command::Numbering { action } => numbering(action, state).await,
        Command::Settings { action } => settings(action, state).await,
        Command::AccountPoint { action } => account_point(action, state).await,
    }
}

async fn order(action: OrderAction, state: &AppState) -> Result<Value, BoxError> {
    match action {
        OrderAction::Create { file } => {
            let draft: OrderDraft = read_json(&file).await?;
            let order = state.orders.create_order(draft).await.map_err(AppError::from)?;
            to_value(&order)
        }
        OrderAction::Show { id } => {
            let order = state.orders.get_order(id).await.map_err(AppError::from)?;
            to_value(&order)
        }
        OrderAction::List {
            keyword,
            provider,
            from,
            to,
            page,
            limit,
        } => {
            let query = OrderQuery {
                keyword,
                provider,
                date_from: from,
                date_to: to,
                page,
                limit,
            };
            let page = state
                .orders
                .search_orders(&query)
                .await
                .map_err(AppError::from)?;
            to_value(&page)
        }
        OrderAction::ByAccountPoint { id } => {
            let orders = state
                .orders
                .orders_by_account_point(id)
                .await
                .map_err(AppError::from)?;
            to_value(&orders)
        }
    }
}

async fn numbering(action: NumberingAction, state: &AppState) -> Result<Value, BoxError> {
    match action {
        NumberingAction::Next {
            document_type,
            year: Some(year),
        } => {
            let sequence = state
                .allocator
                .allocate(&document_type, year)
                .await
                .map_err(AppError::from)?;
            let number = DocumentNumber::new(document_type.trim(), year, sequence);
            Ok(json!({ "number": number.to_string(), "sequence": sequence }))
        }
        NumberingAction::Next {
            document_type,
            year: None,
        } => {
            let number = state
                .allocator
                .next_document_number(&document_type)
                .await
                .map_err(AppError::from)?;
            Ok(json!({ "number": number.to_string(), "sequence": number.sequence }))
        }
        NumberingAction::Reset { year } => {
            let ack = state.allocator.annual_reset(year).map_err(AppError::from)?;
            to_value(&ack)
        }
        NumberingAction::Counters { year } => {
            let counters = state.allocator.counters(year).await.map_err(AppError::from)?;
            to_value(&counters)
        }
    }
}

async fn settings(action: SettingsAction, state: &AppState) -> Result<Value, BoxError> {
    match action {
        SettingsAction::TaxRate { set: Some(rate) } => {
            let setting = state
                .settings
                .set_tax_rate(rate)
                .await
                .map_err(AppError::from)?;
            to_value(&setting)
        }
        SettingsAction::TaxRate { set: None } => {
            let rate = state.settings.tax_rate().await.map_err(AppError::from)?;
            Ok(json!({ "iva_percentage": rate }))
        }
    }
}

async fn account_point(action: AccountPointAction, state: &AppState) -> Result<Value, BoxError> {
    match action {
        AccountPointAction::Create { file } => {
            let draft: AccountPointDraft = read_json(&file).await?;
            let ap = state
                .account_points
                .create(draft)
                .await
                .map_err(AppError::from)?;
            to_value(&ap)
        }
        AccountPointAction::Show { id } => {
            let ap = state.account_points.get(id).await.map_err(AppError::from)?;
            to_value(&ap)
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, BoxError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| AppError::validation(format!("{}: {e}", path.display())))?;
    Ok(value)
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, BoxError> {
    Ok(serde_json::to_value(value)?)
}
