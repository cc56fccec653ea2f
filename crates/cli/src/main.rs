//! Green Street Market CLI.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the backend decides the role)
//! gsm login -u ada -p secret
//!
//! # Browse and shop
//! gsm products
//! gsm cart add-product 3
//! gsm checkout "1 Green Street, Leeds"
//!
//! # Check what a path would show
//! gsm open /dashboard
//!
//! # Seller tools
//! gsm seller add --name "Jute Bag" --price 7.50 --material jute
//!
//! # Admin tools
//! gsm admin-login -u root -p secret
//! gsm admin approve 4
//! ```
//!
//! # Commands
//!
//! - `login`, `admin-login`, `register`, `logout`, `whoami`, `profile`
//! - `open` - Resolve a path through the access gate
//! - `products`, `eco-scores`, `dynamic-price`
//! - `cart show|add|add-product|remove|clear`, `checkout`
//! - `recycle submit|list`, `vouchers`, `eco-points`
//! - `seller list|add|update|delete|score`
//! - `admin recycle-items|approve|reject|users|products`
//!
//! State (credential and cart) lives in the file named by `GSM_STATE_PATH`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use green_street_core::{Price, ProductId, RecycleDecision, RecycleItemId, Role};
use green_street_storefront::config::ClientConfig;
use green_street_storefront::error::AppError;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "gsm")]
#[command(author, version, about = "Green Street Market client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as a customer or seller
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Role picked on the form (`customer`, `seller`); the backend decides
        #[arg(short, long, default_value = "customer")]
        role: Role,
    },
    /// Log in as an admin
    AdminLogin {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long, default_value = "customer")]
        role: Role,
    },
    /// Log out and forget the stored credential
    Logout,
    /// Show the current session
    Whoami,
    /// Fetch the profile of the logged-in user
    Profile,
    /// Resolve a path through the access gate
    Open { path: String },
    /// List products
    Products,
    /// Show the eco score table
    EcoScores,
    /// Show the current dynamic price
    DynamicPrice,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart's contents
    Checkout {
        /// Shipping address
        address: String,
    },
    /// Recycle program
    Recycle {
        #[command(subcommand)]
        action: RecycleAction,
    },
    /// List unredeemed vouchers
    Vouchers,
    /// Show the eco points balance
    EcoPoints,
    /// Seller product management
    Seller {
        #[command(subcommand)]
        action: SellerAction,
    },
    /// Admin tools
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and total
    Show,
    /// Add an item by hand
    Add {
        #[arg(long)]
        id: ProductId,

        #[arg(long)]
        name: String,

        #[arg(long)]
        price: Price,

        #[arg(long)]
        eco_score: Option<i32>,
    },
    /// Add a listed product by id
    AddProduct { id: ProductId },
    /// Remove the line item at a position (1-based, as shown)
    Remove { position: usize },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum RecycleAction {
    /// Submit an item
    Submit {
        #[arg(long)]
        product_name: String,

        #[arg(long)]
        material: String,

        #[arg(long)]
        condition: String,

        #[arg(long, default_value = "")]
        description: String,
    },
    /// List your submissions
    List,
}

#[derive(clap::Args)]
struct ProductArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    price: Price,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value = "")]
    material: String,

    #[arg(long, default_value = "")]
    certifications: String,

    #[arg(long, default_value = "")]
    manufacturing_location: String,

    #[arg(long, default_value = "")]
    durability: String,

    #[arg(long, default_value = "")]
    end_of_life: String,
}

#[derive(Subcommand)]
enum SellerAction {
    /// List products
    List,
    /// Score and create a product
    Add(ProductArgs),
    /// Score and update a product
    Update {
        id: ProductId,

        #[command(flatten)]
        product: ProductArgs,
    },
    /// Delete a product
    Delete { id: ProductId },
    /// Calculate an eco score without saving
    Score(ProductArgs),
}

#[derive(Subcommand)]
enum AdminAction {
    /// List pending recycle submissions
    RecycleItems,
    /// Approve a recycle submission
    Approve { id: RecycleItemId },
    /// Reject a recycle submission
    Reject { id: RecycleItemId },
    /// List users
    Users,
    /// List all products
    Products,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,gsm=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };
    let _sentry_guard = init_sentry(&config);

    if let Err(e) = run(cli, &config).await {
        e.report();
        tracing::error!("{}", e.user_message());
        if e.redirect().is_some() {
            tracing::info!("Run `gsm login` to continue.");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), AppError> {
    let mut ctx = Context::load(config)?;

    match cli.command {
        Commands::Login {
            username,
            password,
            role,
        } => commands::auth::login(&mut ctx, username, password, role).await?,
        Commands::AdminLogin { username, password } => {
            commands::auth::admin_login(&mut ctx, &username, &password).await?;
        }
        Commands::Register {
            username,
            password,
            role,
        } => commands::auth::register(&mut ctx, username, password, role).await?,
        Commands::Logout => commands::auth::logout(&mut ctx),
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Profile => commands::auth::profile(&mut ctx).await?,
        Commands::Open { path } => commands::shop::open(&ctx, &path),
        Commands::Products => commands::shop::products(&ctx).await?,
        Commands::EcoScores => commands::shop::eco_scores(&ctx).await?,
        Commands::DynamicPrice => commands::shop::dynamic_price(&ctx).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::shop::show_cart(&ctx),
            CartAction::Add {
                id,
                name,
                price,
                eco_score,
            } => commands::shop::add_item(&mut ctx, id, name, price, eco_score)?,
            CartAction::AddProduct { id } => commands::shop::add_product(&mut ctx, id).await?,
            CartAction::Remove { position } => commands::shop::remove_item(&mut ctx, position)?,
            CartAction::Clear => commands::shop::clear_cart(&mut ctx),
        },
        Commands::Checkout { address } => commands::shop::checkout(&mut ctx, &address)?,
        Commands::Recycle { action } => match action {
            RecycleAction::Submit {
                product_name,
                material,
                condition,
                description,
            } => {
                commands::recycle::submit(&mut ctx, product_name, material, condition, description)
                    .await?;
            }
            RecycleAction::List => commands::recycle::list(&mut ctx).await?,
        },
        Commands::Vouchers => commands::recycle::vouchers(&mut ctx).await?,
        Commands::EcoPoints => commands::recycle::eco_points(&mut ctx).await?,
        Commands::Seller { action } => match action {
            SellerAction::List => commands::seller::list(&mut ctx).await?,
            SellerAction::Add(product) => {
                commands::seller::save(&mut ctx, None, product.into_draft()).await?;
            }
            SellerAction::Update { id, product } => {
                commands::seller::save(&mut ctx, Some(id), product.into_draft()).await?;
            }
            SellerAction::Delete { id } => commands::seller::delete(&mut ctx, id).await?,
            SellerAction::Score(product) => {
                commands::seller::score(&mut ctx, &product.into_draft()).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::RecycleItems => commands::admin::recycle_items(&mut ctx).await?,
            AdminAction::Approve { id } => {
                commands::admin::decide(&mut ctx, id, RecycleDecision::Approved).await?;
            }
            AdminAction::Reject { id } => {
                commands::admin::decide(&mut ctx, id, RecycleDecision::Rejected).await?;
            }
            AdminAction::Users => commands::admin::users(&mut ctx).await?,
            AdminAction::Products => commands::admin::products(&mut ctx).await?,
        },
    }
    Ok(())
}

impl ProductArgs {
    fn into_draft(self) -> green_street_core::ProductDraft {
        green_street_core::ProductDraft {
            name: self.name,
            price: self.price,
            description: self.description,
            material: self.material,
            certifications: self.certifications,
            manufacturing_location: self.manufacturing_location,
            durability: self.durability,
            end_of_life: self.end_of_life,
            eco_score: None,
        }
    }
}
