use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use feeledger::config::{
    config_dir, init_config_dir, load_config, resolve_data_file, Backend, Config,
};
use feeledger::error::{LedgerError, Result};
use feeledger::ledger::{Ledger, Outcome};
use feeledger::model::{
    money, ClientFilter, ClientId, ClientPatch, ClientStatus, FeeCategory, FeeFilter, FeeId,
    FeePatch, FeeStatus, NewClient, NewFee, NewPayment, PaymentFilter, PaymentId,
    PaymentMethod, PaymentPatch,
};
use feeledger::store::{FileStore, RecordStore, RemoteStore};

#[derive(Parser)]
#[command(name = "feeledger")]
#[command(version, about = "Fee ledger with client balance reconciliation", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.feeledger or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log filter, e.g. "info" or "feeledger=debug"
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config
    Init,

    /// List clients with their balances
    Clients {
        /// Only show clients with this status (active, inactive)
        #[arg(long)]
        status: Option<String>,

        /// Only show clients whose name or email contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Add a client
    AddClient {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        email: String,

        #[arg(short, long)]
        phone: Option<String>,
    },

    /// Change a client's contact details or status
    EditClient {
        id: ClientId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        /// active or inactive
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a client (its fees are kept)
    RemoveClient { id: ClientId },

    /// List fees with their current status
    Fees {
        /// Only show fees of this client
        #[arg(short, long)]
        client: Option<ClientId>,

        /// Only show fees with this status (pending, overdue, paid)
        #[arg(short, long)]
        status: Option<String>,

        /// Only show fees whose description, note or category contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Add a fee for a client
    AddFee {
        #[arg(short, long)]
        client: ClientId,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        amount: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        #[arg(long, default_value = "Consulting")]
        category: String,

        #[arg(long)]
        recurring: bool,

        #[arg(long, default_value = "")]
        note: String,
    },

    /// Change a fee
    EditFee {
        id: FeeId,

        /// Move the fee to another client
        #[arg(short, long)]
        client: Option<ClientId>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        amount: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        recurring: Option<bool>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Delete a fee (its payments are kept)
    RemoveFee { id: FeeId },

    /// List recorded payments
    Payments {
        /// Only show payments for this fee
        #[arg(short, long)]
        fee: Option<FeeId>,
    },

    /// Record a payment settling a fee
    Pay {
        fee: FeeId,

        /// Payment amount (default: the fee amount)
        #[arg(short, long)]
        amount: Option<String>,

        /// Payment date (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Bank Transfer, Credit Card, Check, Cash, PayPal or Other
        #[arg(short, long, default_value = "Bank Transfer")]
        method: String,

        #[arg(short, long, default_value = "")]
        reference: String,
    },

    /// Change a recorded payment
    EditPayment {
        id: PaymentId,

        /// Move the payment to another fee
        #[arg(short, long)]
        fee: Option<FeeId>,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(long)]
        date: Option<String>,

        #[arg(short, long)]
        method: Option<String>,

        #[arg(short, long)]
        reference: Option<String>,
    },

    /// Delete a payment and reopen its fee
    RemovePayment { id: PaymentId },

    /// Recompute client balances from their fees
    Reconcile {
        /// Only this client (default: all clients)
        #[arg(short, long)]
        client: Option<ClientId>,
    },

    /// Show collected, pending and overdue totals
    Summary,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    if let Commands::Init = cli.command {
        return cmd_init(&cfg_dir);
    }

    let config = load_config(&cfg_dir)?;
    let policy = config.ledger.payment_policy();

    match config.store.backend {
        Backend::File => {
            let path = resolve_data_file(&config.store.data_file, &cfg_dir);
            let ledger = Ledger::with_policy(FileStore::new(path), policy);
            dispatch(&ledger, &config, &cfg_dir, cli.command)
        }
        Backend::Remote => {
            let remote = config
                .store
                .remote
                .as_ref()
                .ok_or(LedgerError::RemoteNotConfigured)?;
            let store = RemoteStore::new(
                remote.base_url.clone(),
                remote.api_key.clone(),
                Duration::from_secs(remote.timeout_secs),
            );
            let ledger = Ledger::with_policy(store, policy);
            dispatch(&ledger, &config, &cfg_dir, cli.command)
        }
    }
}

fn dispatch<S: RecordStore>(
    ledger: &Ledger<S>,
    config: &Config,
    cfg_dir: &Path,
    command: Commands,
) -> Result<()> {
    let ctx = Ctx {
        ledger,
        symbol: &config.ledger.currency_symbol,
        today: chrono::Local::now().date_naive(),
    };

    match command {
        // A loaded config means the directory is already initialized
        Commands::Init => Err(LedgerError::AlreadyInitialized(cfg_dir.to_path_buf())),
        Commands::Clients { status, search } => cmd_clients(&ctx, status, search),
        Commands::AddClient { name, email, phone } => cmd_add_client(&ctx, name, email, phone),
        Commands::EditClient {
            id,
            name,
            email,
            phone,
            status,
        } => cmd_edit_client(&ctx, id, name, email, phone, status),
        Commands::RemoveClient { id } => cmd_remove_client(&ctx, id),
        Commands::Fees {
            client,
            status,
            search,
        } => cmd_fees(&ctx, client, status, search),
        Commands::AddFee {
            client,
            description,
            amount,
            due,
            category,
            recurring,
            note,
        } => {
            let fields = NewFee {
                client_id: client,
                description,
                note,
                amount: money::parse_amount(&amount)?,
                due_date: parse_date(&due)?,
                category: FeeCategory::from(category),
                is_recurring: recurring,
            };
            cmd_add_fee(&ctx, fields)
        }
        Commands::EditFee {
            id,
            client,
            description,
            amount,
            due,
            category,
            recurring,
            note,
        } => {
            let patch = FeePatch {
                client_id: client,
                description,
                note,
                amount: amount.as_deref().map(money::parse_amount).transpose()?,
                due_date: due.as_deref().map(parse_date).transpose()?,
                category: category.map(FeeCategory::from),
                is_recurring: recurring,
                status: None,
            };
            cmd_edit_fee(&ctx, id, patch)
        }
        Commands::RemoveFee { id } => cmd_remove_fee(&ctx, id),
        Commands::Payments { fee } => cmd_payments(&ctx, fee),
        Commands::Pay {
            fee,
            amount,
            date,
            method,
            reference,
        } => cmd_pay(&ctx, fee, amount, date, &method, reference),
        Commands::EditPayment {
            id,
            fee,
            amount,
            date,
            method,
            reference,
        } => {
            let patch = PaymentPatch {
                fee_id: fee,
                amount: amount.as_deref().map(money::parse_amount).transpose()?,
                payment_date: date.as_deref().map(parse_date).transpose()?,
                method: method.as_deref().map(str::parse).transpose()?,
                reference,
            };
            cmd_edit_payment(&ctx, id, patch)
        }
        Commands::RemovePayment { id } => cmd_remove_payment(&ctx, id),
        Commands::Reconcile { client } => cmd_reconcile(&ctx, client),
        Commands::Summary => cmd_summary(&ctx),
    }
}

/// Shared state for one command invocation
struct Ctx<'a, S> {
    ledger: &'a Ledger<S>,
    symbol: &'a str,
    today: NaiveDate,
}

impl<S> Ctx<'_, S> {
    fn money(&self, amount: rust_decimal::Decimal) -> String {
        money::format_money(amount, self.symbol)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| LedgerError::InvalidDate(s.to_string()))
}

/// Print cascade warnings, then fail with the first one if any
fn finish<T>(outcome: Outcome<T>) -> Result<()> {
    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }
    if !outcome.is_complete() {
        eprintln!("Run 'feeledger reconcile' once the store is reachable to repair balances.");
    }
    outcome.into_result().map(|_| ())
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    let path = init_config_dir(cfg_dir)?;

    println!("Initialized feeledger config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Review store settings:  $EDITOR {}", path.display());
    println!("  2. Add a client:           feeledger add-client --name <name>");
    println!("  3. Add a fee:              feeledger add-fee --client <id> --description <text> --amount <amount> --due <YYYY-MM-DD>");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "ID")]
    id: ClientId,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "PAID")]
    paid: String,
}

#[derive(Tabled)]
struct FeeRow {
    #[tabled(rename = "ID")]
    id: FeeId,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "DUE DATE")]
    due_date: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

#[derive(Tabled)]
struct PaymentRow {
    #[tabled(rename = "ID")]
    id: PaymentId,
    #[tabled(rename = "FEE")]
    fee: FeeId,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "METHOD")]
    method: String,
    #[tabled(rename = "REFERENCE")]
    reference: String,
}

/// List clients
fn cmd_clients<S: RecordStore>(
    ctx: &Ctx<S>,
    status: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let filter = ClientFilter {
        status: status.as_deref().map(str::parse::<ClientStatus>).transpose()?,
        search,
    };
    let clients = ctx.ledger.list_clients(&filter)?;

    if clients.is_empty() {
        println!("No clients found.");
        return Ok(());
    }

    let rows: Vec<ClientRow> = clients
        .iter()
        .map(|c| ClientRow {
            id: c.id,
            name: c.name.clone(),
            email: c.email.clone(),
            status: c.status.to_string(),
            due: ctx.money(c.total_due),
            paid: ctx.money(c.total_paid),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

fn cmd_add_client<S: RecordStore>(
    ctx: &Ctx<S>,
    name: String,
    email: String,
    phone: Option<String>,
) -> Result<()> {
    let client = ctx.ledger.create_client(NewClient { name, email, phone })?;
    println!("Added client {} ({})", client.id, client.name);
    Ok(())
}

fn cmd_edit_client<S: RecordStore>(
    ctx: &Ctx<S>,
    id: ClientId,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    status: Option<String>,
) -> Result<()> {
    let patch = ClientPatch {
        name,
        email,
        phone,
        status: status.as_deref().map(str::parse::<ClientStatus>).transpose()?,
        ..ClientPatch::default()
    };
    let client = ctx.ledger.update_client(id, patch)?;
    println!("Updated client {} ({}, {})", client.id, client.name, client.status);
    Ok(())
}

fn cmd_remove_client<S: RecordStore>(ctx: &Ctx<S>, id: ClientId) -> Result<()> {
    let client = ctx.ledger.delete_client(id)?;
    println!("Removed client {} ({})", client.id, client.name);
    Ok(())
}

/// List fees with their effective status as of today
fn cmd_fees<S: RecordStore>(
    ctx: &Ctx<S>,
    client: Option<ClientId>,
    status: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let filter = FeeFilter {
        client_id: client,
        status: status.as_deref().map(str::parse::<FeeStatus>).transpose()?,
        search,
    };
    let fees = ctx.ledger.list_fees(&filter, ctx.today)?;

    if fees.is_empty() {
        println!("No fees found.");
        return Ok(());
    }

    let names: HashMap<ClientId, String> = ctx
        .ledger
        .list_clients(&ClientFilter::default())?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let rows: Vec<FeeRow> = fees
        .iter()
        .map(|f| FeeRow {
            id: f.id,
            client: names
                .get(&f.client_id)
                .cloned()
                .unwrap_or_else(|| format!("#{} (unknown)", f.client_id)),
            description: f.description.clone(),
            category: f.category.to_string(),
            amount: ctx.money(f.amount),
            due_date: f.due_date.to_string(),
            status: f.status.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!("Total: {} fees", fees.len());

    Ok(())
}

fn cmd_add_fee<S: RecordStore>(ctx: &Ctx<S>, fields: NewFee) -> Result<()> {
    let outcome = ctx.ledger.create_fee(fields)?;
    let fee = &outcome.record;
    println!(
        "Added fee {} for client {} ({}, due {})",
        fee.id,
        fee.client_id,
        ctx.money(fee.amount),
        fee.due_date
    );
    finish(outcome)
}

fn cmd_edit_fee<S: RecordStore>(ctx: &Ctx<S>, id: FeeId, patch: FeePatch) -> Result<()> {
    if patch.is_empty() {
        println!("Nothing to change for fee {id}.");
        return Ok(());
    }
    let outcome = ctx.ledger.update_fee(id, patch)?;
    let fee = &outcome.record;
    println!(
        "Updated fee {} (client {}, {}, {})",
        fee.id,
        fee.client_id,
        ctx.money(fee.amount),
        fee.status
    );
    finish(outcome)
}

fn cmd_remove_fee<S: RecordStore>(ctx: &Ctx<S>, id: FeeId) -> Result<()> {
    let outcome = ctx.ledger.delete_fee(id)?;
    println!(
        "Removed fee {} ({})",
        outcome.record.id, outcome.record.description
    );
    finish(outcome)
}

/// List payments, newest first
fn cmd_payments<S: RecordStore>(ctx: &Ctx<S>, fee: Option<FeeId>) -> Result<()> {
    let mut payments = ctx.ledger.list_payments(&PaymentFilter { fee_id: fee })?;

    if payments.is_empty() {
        println!("No payments recorded.");
        return Ok(());
    }

    payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.id.cmp(&a.id)));
    let collected: rust_decimal::Decimal = payments.iter().map(|p| p.amount).sum();

    let rows: Vec<PaymentRow> = payments
        .iter()
        .map(|p| PaymentRow {
            id: p.id,
            fee: p.fee_id,
            date: p.payment_date.to_string(),
            amount: ctx.money(p.amount),
            method: p.method.to_string(),
            reference: p.reference.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!("Total collected: {}", ctx.money(collected));

    Ok(())
}

/// Record a payment against a fee
fn cmd_pay<S: RecordStore>(
    ctx: &Ctx<S>,
    fee_id: FeeId,
    amount: Option<String>,
    date: Option<String>,
    method: &str,
    reference: String,
) -> Result<()> {
    // Default to the full fee amount
    let amount = match amount {
        Some(a) => money::parse_amount(&a)?,
        None => ctx.ledger.get_fee(fee_id, ctx.today)?.amount,
    };
    let payment_date = match date {
        Some(d) => parse_date(&d)?,
        None => ctx.today,
    };

    let outcome = ctx.ledger.create_payment(NewPayment {
        fee_id,
        amount,
        payment_date,
        method: method.parse::<PaymentMethod>()?,
        reference,
    })?;
    let payment = &outcome.record;
    println!(
        "Recorded payment {} of {} for fee {} on {}",
        payment.id,
        ctx.money(payment.amount),
        payment.fee_id,
        payment.payment_date
    );
    finish(outcome)
}

fn cmd_edit_payment<S: RecordStore>(ctx: &Ctx<S>, id: PaymentId, patch: PaymentPatch) -> Result<()> {
    let outcome = ctx.ledger.update_payment(id, patch)?;
    let payment = &outcome.record;
    println!(
        "Updated payment {} ({} for fee {})",
        payment.id,
        ctx.money(payment.amount),
        payment.fee_id
    );
    finish(outcome)
}

fn cmd_remove_payment<S: RecordStore>(ctx: &Ctx<S>, id: PaymentId) -> Result<()> {
    let outcome = ctx.ledger.delete_payment(id)?;
    println!(
        "Removed payment {} ({} for fee {})",
        outcome.record.id,
        ctx.money(outcome.record.amount),
        outcome.record.fee_id
    );
    finish(outcome)
}

/// Recompute balances for one or all clients
fn cmd_reconcile<S: RecordStore>(ctx: &Ctx<S>, client: Option<ClientId>) -> Result<()> {
    let results = match client {
        Some(id) => vec![(id, ctx.ledger.reconcile_client(id))],
        None => ctx.ledger.reconcile_all()?,
    };

    let mut first_error = None;
    for (client_id, result) in results {
        match result {
            Ok(totals) => println!(
                "Client {}: due {}, paid {}",
                client_id,
                ctx.money(totals.total_due),
                ctx.money(totals.total_paid)
            ),
            Err(e) => {
                eprintln!("Client {client_id}: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Show dashboard figures
fn cmd_summary<S: RecordStore>(ctx: &Ctx<S>) -> Result<()> {
    let summary = ctx.ledger.summary(ctx.today)?;

    println!("Ledger Summary ({})", summary.as_of);
    println!("{}", "-".repeat(50));
    println!("Collected:        {}", ctx.money(summary.total_collected));
    println!(
        "Pending:          {} ({} fees)",
        ctx.money(summary.total_pending),
        summary.pending_count
    );
    println!(
        "Overdue:          {} ({} fees)",
        ctx.money(summary.total_overdue),
        summary.overdue_count
    );
    println!(
        "Clients:          {} ({} active)",
        summary.total_clients, summary.active_clients
    );

    if !summary.recent_payments.is_empty() {
        println!();
        println!("Recent payments:");
        for p in &summary.recent_payments {
            println!(
                "  {} - fee {} - {}",
                p.payment_date,
                p.fee_id,
                ctx.money(p.amount)
            );
        }
    }

    if !summary.oldest_overdue.is_empty() {
        println!();
        println!("Oldest overdue:");
        for f in &summary.oldest_overdue {
            println!(
                "  {} - fee {} ({}) - {}",
                f.due_date,
                f.id,
                f.description,
                ctx.money(f.amount)
            );
        }
    }

    Ok(())
}
