use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use storefront_client::{
    auth::{FileTokenStore, TokenPair, TokenStore},
    config::{self, ClientConfig},
    errors::ApiResponse,
    models::CourierQuote,
    services::commerce::{choose_quote, MerchantGroup},
    state::{CartAction, CartState},
    Storefront,
};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Auth(command) => handle_auth_command(&context, command, cli.json).await?,
        Commands::Cart(command) => handle_cart_command(&context, command, cli.json).await?,
        Commands::Checkout(command) => handle_checkout_command(&context, command, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "storefront", about = "Storefront CLI for cart and checkout", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Auth(AuthCommands),
    #[command(subcommand)]
    Cart(CartCommands),
    #[command(subcommand)]
    Checkout(CheckoutCommands),
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Store tokens issued by the login flow
    Set(AuthSetArgs),
    /// Show whether a session is stored
    Status,
    /// Delete the stored session
    Clear,
}

#[derive(Args)]
struct AuthSetArgs {
    #[arg(long, help = "Access token issued at login")]
    access_token: String,
    #[arg(long, help = "Refresh token issued at login")]
    refresh_token: String,
}

#[derive(Subcommand)]
enum CartCommands {
    /// Show the cart grouped by merchant
    Show,
    Add(CartAddArgs),
    Update(CartUpdateArgs),
    Increase(CartStepArgs),
    Decrease(CartStepArgs),
    Remove(CartRemoveArgs),
}

#[derive(Args)]
struct CartAddArgs {
    #[arg(long, help = "Variant combination product id to add")]
    variant: u64,
    #[arg(long, default_value_t = 1, help = "Units to add")]
    quantity: u32,
}

#[derive(Args)]
struct CartUpdateArgs {
    #[arg(long, help = "Cart product id")]
    item: u64,
    #[arg(long, help = "New quantity (0 is treated as 1)")]
    quantity: u32,
}

#[derive(Args)]
struct CartStepArgs {
    #[arg(long, help = "Cart product id")]
    item: u64,
    #[arg(long, default_value_t = 1, help = "Units to add or take away")]
    step: u32,
}

#[derive(Args)]
struct CartRemoveArgs {
    #[arg(long, help = "Cart product id")]
    item: u64,
}

#[derive(Subcommand)]
enum CheckoutCommands {
    /// List vouchers available to the shopper
    Promos,
    /// Quote every configured courier for each merchant in the cart
    Couriers(CourierLookupArgs),
    /// Ask the backend to price the cart with quoted couriers
    CheckPrice(CheckoutArgs),
    /// Price the cart, authorize the wallet and place the order
    Place(PlaceOrderArgs),
}

#[derive(Args)]
struct CourierLookupArgs {
    #[arg(long, help = "Destination city id of the shipping address")]
    destination: u64,
}

#[derive(Args)]
struct CheckoutArgs {
    #[arg(long, help = "Shipping address id")]
    address: u64,
    #[command(flatten)]
    lookup: CourierLookupArgs,
    #[arg(
        long = "courier",
        value_parser = parse_courier,
        help = "Courier for a merchant as MERCHANT_ID:COURIER; others get the cheapest quote (repeatable)"
    )]
    couriers: Vec<CourierChoice>,
    #[arg(long, help = "Voucher id to apply")]
    voucher: Option<u64>,
}

#[derive(Args)]
struct PlaceOrderArgs {
    #[command(flatten)]
    checkout: CheckoutArgs,
    #[arg(long, help = "Wallet PIN")]
    pin: String,
}

#[derive(Clone, Debug, PartialEq)]
struct CourierChoice {
    merchant_id: u64,
    courier_id: String,
}

struct CliContext {
    storefront: Storefront,
    session_path: PathBuf,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load client config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let session_path = session_file_path(&config)?;
        let tokens = FileTokenStore::open(&session_path)
            .await
            .with_context(|| format!("failed to read session at {}", session_path.display()))?;
        debug!(target: "storefront_cli", path = %session_path.display(), "session loaded");

        let storefront = Storefront::new(config, Arc::new(tokens))
            .context("failed to build storefront client")?;

        Ok(Self {
            storefront,
            session_path,
        })
    }

    async fn load_cart(&self) -> Result<CartState> {
        let snapshot = self
            .storefront
            .carts
            .fetch_cart()
            .await
            .context("failed to fetch cart")?;
        Ok(CartState::from_snapshot(snapshot))
    }
}

fn session_file_path(config: &ClientConfig) -> Result<PathBuf> {
    config
        .session_file_path()
        .ok_or_else(|| anyhow!("HOME is not set; configure session_file explicitly"))
}

async fn handle_auth_command(context: &CliContext, command: AuthCommands, json: bool) -> Result<()> {
    let tokens = context.storefront.tokens();
    match command {
        AuthCommands::Set(args) => {
            tokens
                .set_tokens(TokenPair::new(args.access_token, args.refresh_token))
                .await
                .context("failed to save session")?;
            println!("Session saved to {}", context.session_path.display());
        }
        AuthCommands::Status => {
            let status = SessionStatus {
                path: context.session_path.clone(),
                has_access_token: tokens.access_token().await.is_some(),
                has_refresh_token: tokens.refresh_token().await.is_some(),
            };
            if json {
                print_json(&status)?;
            } else if status.has_refresh_token {
                println!("Logged in (session at {})", status.path.display());
            } else {
                println!("Not logged in");
            }
        }
        AuthCommands::Clear => {
            tokens.clear().await.context("failed to clear session")?;
            println!("Session cleared");
        }
    }
    Ok(())
}

async fn handle_cart_command(context: &CliContext, command: CartCommands, json: bool) -> Result<()> {
    let carts = &context.storefront.carts;
    let outcome = match command {
        CartCommands::Show => {
            let state = context.load_cart().await?;
            if json {
                print_json(&state)?;
            } else {
                render_cart(&state);
            }
            return Ok(());
        }
        CartCommands::Add(args) => carts.add_item(args.variant, args.quantity).await,
        CartCommands::Update(args) => carts.update_quantity(args.item, args.quantity).await,
        CartCommands::Increase(args) => carts.increase(args.item, args.step).await,
        CartCommands::Decrease(args) => carts.decrease(args.item, args.step).await,
        CartCommands::Remove(args) => carts.remove_item(args.item).await,
    };

    report(ApiResponse::from(outcome), json)
}

async fn handle_checkout_command(
    context: &CliContext,
    command: CheckoutCommands,
    json: bool,
) -> Result<()> {
    let pricing = &context.storefront.pricing;
    match command {
        CheckoutCommands::Promos => {
            let promos = pricing.promos().await.context("failed to list promos")?;
            if json {
                print_json(&promos)?;
            } else if promos.is_empty() {
                println!("No promos available");
            } else {
                for promo in &promos {
                    println!("- {} {}", promo.id, promo.name);
                }
            }
            Ok(())
        }
        CheckoutCommands::Couriers(args) => {
            let state = context.load_cart().await?;
            let mut rates = Vec::with_capacity(state.groups.len());
            for group in &state.groups {
                let quotes = context
                    .storefront
                    .couriers
                    .quotes_for(group, args.destination)
                    .await
                    .with_context(|| format!("no courier quotes for {}", group.merchant_name))?;
                rates.push(MerchantRates {
                    merchant_id: group.merchant_id,
                    merchant_name: group.merchant_name.clone(),
                    quotes,
                });
            }

            if json {
                print_json(&rates)?;
            } else {
                for merchant in &rates {
                    render_rates(merchant);
                }
            }
            Ok(())
        }
        CheckoutCommands::CheckPrice(args) => {
            let state = prepare_checkout(context, &args).await?;
            let request = state.price_check_request(args.address)?;
            let result = pricing.check_price(&request).await;
            if let Ok(checked) = &result {
                let state = state.reduce(CartAction::PriceChecked(checked.clone()));
                if !json {
                    render_cart(&state);
                }
            }
            report(ApiResponse::from(result), json)
        }
        CheckoutCommands::Place(args) => {
            let state = prepare_checkout(context, &args.checkout).await?;
            let request = state.price_check_request(args.checkout.address)?;
            pricing
                .check_price(&request)
                .await
                .context("price check failed")?;

            let checkout = &context.storefront.checkout;
            let token = checkout
                .authorize_wallet(&args.pin)
                .await
                .context("wallet authorization failed")?;
            report(ApiResponse::from(checkout.checkout(&request, &token).await), json)
        }
    }
}

async fn prepare_checkout(context: &CliContext, args: &CheckoutArgs) -> Result<CartState> {
    let mut state = context.load_cart().await?;
    let groups = state.groups.clone();

    for group in &groups {
        let quotes = context
            .storefront
            .couriers
            .quotes_for(group, args.lookup.destination)
            .await
            .with_context(|| format!("no courier quotes for {}", group.merchant_name))?;

        let preferred = args
            .couriers
            .iter()
            .find(|choice| choice.merchant_id == group.merchant_id)
            .map(|choice| choice.courier_id.as_str());
        let quote = choose_quote(&quotes, preferred).ok_or_else(|| {
            anyhow!(
                "courier '{}' has no quote for {}",
                preferred.unwrap_or_default(),
                group.merchant_name
            )
        })?;
        debug!(
            target: "storefront_cli",
            merchant_id = group.merchant_id,
            courier = %quote.courier,
            cost = %quote.cost,
            "courier selected"
        );

        state = state.reduce(CartAction::CourierSelected {
            merchant_id: group.merchant_id,
            courier_id: quote.courier.clone(),
            cost: quote.cost,
        });
    }

    Ok(state.reduce(CartAction::PromoSelected(args.voucher)))
}

#[derive(Serialize)]
struct MerchantRates {
    merchant_id: u64,
    merchant_name: String,
    quotes: Vec<CourierQuote>,
}

#[derive(Serialize)]
struct SessionStatus {
    path: PathBuf,
    has_access_token: bool,
    has_refresh_token: bool,
}

fn report<T: Serialize>(response: ApiResponse<T>, json: bool) -> Result<()> {
    if json {
        print_json(&response)?;
    } else if response.error {
        eprintln!("Error {}: {}", response.code, response.message);
    } else {
        println!("OK");
    }

    if response.error {
        return Err(anyhow!(response.message));
    }
    Ok(())
}

fn render_cart(state: &CartState) {
    if state.is_empty() {
        println!("Cart is empty");
        return;
    }
    for group in &state.groups {
        render_group(group);
    }
    println!("Total: {}", state.display_total());
}

fn render_group(group: &MerchantGroup) {
    let courier = group.courier_id.as_deref().unwrap_or("no courier");
    println!(
        "{} (#{}) • {} item(s) • weight {} • subtotal {} • {} {}",
        group.merchant_name,
        group.merchant_id,
        group.item_count(),
        group.total_weight,
        group.total_cost,
        courier,
        group.courier_cost
    );
    for item in &group.items {
        println!(
            "  - [{}] {} {} x{} @ {}",
            item.cart_product_id, item.title, item.variant, item.amount, item.price
        );
    }
}

fn render_rates(merchant: &MerchantRates) {
    println!("{} (#{})", merchant.merchant_name, merchant.merchant_id);
    for quote in &merchant.quotes {
        println!(
            "  - {} {} {} ({} days)",
            quote.courier,
            quote.service,
            quote.cost,
            quote.etd.as_deref().unwrap_or("?")
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_courier(raw: &str) -> Result<CourierChoice, String> {
    let Some((merchant, courier)) = raw.split_once(':') else {
        return Err(format!("expected MERCHANT_ID:COURIER, got '{raw}'"));
    };

    let merchant_id = merchant
        .trim()
        .parse()
        .map_err(|_| format!("invalid merchant id '{merchant}'"))?;
    let courier = courier.trim();
    if courier.is_empty() {
        return Err("courier must not be empty".to_string());
    }
    if courier.contains(':') {
        return Err(format!("expected MERCHANT_ID:COURIER, got '{raw}'"));
    }

    Ok(CourierChoice {
        merchant_id,
        courier_id: courier.to_lowercase(),
    })
}
