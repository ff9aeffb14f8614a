//! Sweet Shop CLI - storefront and admin console.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog and fill the cart
//! sweetshop catalog
//! sweetshop cart add "Kaju Katli" 0.5
//! sweetshop cart unit 1 grams
//! sweetshop cart show
//!
//! # Place the order
//! sweetshop order -n "Asha" -m 9876543210 -a "12 MG Road" -d 2026-11-02
//!
//! # Admin console
//! sweetshop admin login -n Meena
//! sweetshop admin orders --status all --outstanding
//! sweetshop admin status 65f1c2 processing
//! sweetshop admin edit 65f1c2 --pay 200
//! sweetshop admin statement --from 2026-10-01 --to 2026-10-31 -o october.pdf
//! ```
//!
//! # Environment Variables
//!
//! - `SWEETSHOP_API_BASE_URL` - Base URL of the shop API (required)
//! - `SWEETSHOP_SESSION_FILE` - Where the cart and admin flag are kept
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Error tracking (optional)
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use sweetshop_client::ApiConfig;
use sweetshop_core::{OrderStatus, ProductUnit, StatusFilter, WeightUnit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "sweetshop")]
#[command(author, version, about = "Sweet shop storefront and admin console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the product catalog
    Catalog {
        /// Bypass the cache and fetch again
        #[arg(long)]
        refresh: bool,

        /// Only festival specials
        #[arg(long)]
        festival: bool,
    },
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place the cart as an order
    Order(CustomerArgs),
    /// Send a message to the shop
    Contact {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short = 'p', long)]
        mobile: Option<String>,

        #[arg(short, long)]
        message: String,
    },
    /// Admin console
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and the total
    Show,
    /// Add a product by id or name
    Add {
        product: String,

        /// Pieces, or kilograms for weight products
        #[arg(default_value = "1")]
        amount: Decimal,
    },
    /// Type a quantity into a line, as entered in its own unit
    Set { line: usize, quantity: String },
    /// Switch a weight line between Kg and grams
    Unit { line: usize, unit: WeightUnit },
    /// Step a line up
    Inc { line: usize },
    /// Step a line down
    Dec { line: usize },
    /// Remove a line
    Remove { line: usize },
    /// Empty the cart
    Clear,
}

/// Customer fields of the order form.
#[derive(clap::Args)]
pub struct CustomerArgs {
    #[arg(short, long)]
    pub name: String,

    /// Ten digit mobile number
    #[arg(short, long)]
    pub mobile: String,

    #[arg(short, long)]
    pub address: String,

    /// Delivery date (YYYY-MM-DD), today or later
    #[arg(short, long)]
    pub delivery: NaiveDate,

    /// Delivery notes
    #[arg(short, long, default_value = "")]
    pub preference: String,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Start an admin session
    Login {
        #[arg(short, long, default_value = "")]
        name: String,
    },
    /// End the admin session
    Logout,
    /// List orders
    Orders {
        /// active, all, pending, processing, delivered or cancelled
        #[arg(short, long, default_value = "active")]
        status: StatusFilter,

        /// Only orders placed on this day
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Match name, mobile or address
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Delivered orders with a balance still due
        #[arg(long)]
        outstanding: bool,

        /// Sort by delivery date instead of order date
        #[arg(long)]
        by_delivery: bool,

        /// Oldest first
        #[arg(long)]
        ascending: bool,
    },
    /// Move an order to a new status
    Status { order: String, status: OrderStatus },
    /// Change delivery date, payment or items of an order
    Edit {
        order: String,

        #[arg(short, long)]
        delivery: Option<NaiveDate>,

        /// Additional payment received
        #[arg(long)]
        pay: Option<Decimal>,

        /// Set an item quantity: LINE=QUANTITY
        #[arg(long = "item", value_name = "LINE=QUANTITY")]
        items: Vec<String>,

        /// Remove an item line
        #[arg(long = "remove-item", value_name = "LINE")]
        remove_items: Vec<usize>,

        /// Add a catalog product: PRODUCT=AMOUNT
        #[arg(long = "add-item", value_name = "PRODUCT=AMOUNT")]
        add_items: Vec<String>,
    },
    /// Sales summary for one day
    Summary {
        /// Defaults to the server's today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Compute from the order list instead of asking the server
        #[arg(long)]
        local: bool,
    },
    /// Download the PDF statement for a date range
    Statement {
        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,

        #[arg(short, long)]
        out: std::path::PathBuf,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Place an order on a customer's behalf
    PlaceOrder {
        #[command(flatten)]
        customer: CustomerArgs,

        /// PRODUCT=AMOUNT, repeatable
        #[arg(long = "item", value_name = "PRODUCT=AMOUNT", required = true)]
        items: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add a product
    Add(ProductArgs),
    /// Replace a product's details
    Update {
        id: String,

        #[command(flatten)]
        product: ProductArgs,
    },
    /// Delete a product
    Remove { id: String },
}

/// Product fields.
#[derive(clap::Args)]
pub struct ProductArgs {
    #[arg(short, long)]
    pub name: String,

    #[arg(short, long)]
    pub category: String,

    /// Price per piece or per Kg
    #[arg(short, long)]
    pub rate: Decimal,

    /// piece or kg
    #[arg(short, long)]
    pub unit: ProductUnit,

    #[arg(long)]
    pub image: Option<String>,

    #[arg(long)]
    pub festival: bool,

    #[arg(long)]
    pub stock: Option<Decimal>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sweetshop_cli=info,sweetshop_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open(&config)?;

    match cli.command {
        Commands::Catalog { refresh, festival } => {
            commands::catalog::list(&ctx, refresh, festival).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add { product, amount } => {
                commands::cart::add(&mut ctx, &product, amount).await?;
            }
            CartAction::Set { line, quantity } => commands::cart::set(&mut ctx, line, &quantity)?,
            CartAction::Unit { line, unit } => commands::cart::unit(&mut ctx, line, unit)?,
            CartAction::Inc { line } => commands::cart::step(&mut ctx, line, true)?,
            CartAction::Dec { line } => commands::cart::step(&mut ctx, line, false)?,
            CartAction::Remove { line } => commands::cart::remove(&mut ctx, line)?,
            CartAction::Clear => commands::cart::clear(&mut ctx)?,
        },
        Commands::Order(customer) => commands::order::place(&mut ctx, &customer).await?,
        Commands::Contact {
            name,
            email,
            mobile,
            message,
        } => {
            commands::order::contact(&ctx, &name, email.as_deref(), mobile.as_deref(), &message)
                .await?;
        }
        Commands::Admin { action } => run_admin(&mut ctx, action).await?,
    }
    Ok(())
}

async fn run_admin(
    ctx: &mut Context,
    action: AdminAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AdminAction::Login { name } => commands::admin::login(ctx, &name)?,
        AdminAction::Logout => commands::admin::logout(ctx)?,
        AdminAction::Orders {
            status,
            date,
            search,
            outstanding,
            by_delivery,
            ascending,
        } => {
            let query = commands::admin::OrdersQuery {
                status,
                date,
                search,
                outstanding,
                by_delivery,
                ascending,
            };
            commands::admin::orders(ctx, &query).await?;
        }
        AdminAction::Status { order, status } => {
            commands::admin::status(ctx, &order, status).await?;
        }
        AdminAction::Edit {
            order,
            delivery,
            pay,
            items,
            remove_items,
            add_items,
        } => {
            let changes = commands::admin::EditChanges {
                delivery,
                pay,
                items,
                remove_items,
                add_items,
            };
            commands::admin::edit(ctx, &order, &changes).await?;
        }
        AdminAction::Summary { date, local } => commands::admin::summary(ctx, date, local).await?,
        AdminAction::Statement { from, to, out } => {
            commands::admin::statement(ctx, from, to, &out).await?;
        }
        AdminAction::Product { action } => match action {
            ProductAction::Add(product) => commands::admin::add_product(ctx, &product).await?,
            ProductAction::Update { id, product } => {
                commands::admin::update_product(ctx, &id, &product).await?;
            }
            ProductAction::Remove { id } => commands::admin::remove_product(ctx, &id).await?,
        },
        AdminAction::PlaceOrder { customer, items } => {
            commands::admin::place_order(ctx, &customer, &items).await?;
        }
    }
    Ok(())
}
