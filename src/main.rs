mod api;
mod app;
mod cart;
mod checkout;
mod config;
mod format;
mod menu;
mod model;
mod theme;
mod transport;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{ApiClient, ApiError, SESSION_KEY};
use app::{App, Popup};
use cart::storage::FileStorage;
use cart::Cart;
use checkout::CheckoutOutcome;
use config::AppConfig;
use menu::MenuView;

#[derive(Parser, Debug)]
#[command(name = "ruokala")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "Weekly menu, cart and orders for the restaurant, in your terminal")]
struct Args {
    /// Backend URL (overrides base_url from the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Print this week's menu
    #[arg(short, long)]
    menu: bool,

    /// Print today's menu
    #[arg(short, long)]
    today: bool,

    /// Print how to get to the restaurant
    #[arg(long)]
    transport: bool,

    /// Print the cart
    #[arg(long)]
    cart: bool,

    /// Output the cart summary as JSON (for status bars)
    #[arg(short, long)]
    status: bool,

    /// Add a dish to the cart by id (as shown by --menu)
    #[arg(short, long, value_name = "ID")]
    add: Option<String>,

    /// Remove a dish from the cart by id
    #[arg(short, long, value_name = "ID")]
    remove: Option<String>,

    /// Submit the cart as an order
    #[arg(long)]
    checkout: bool,

    /// List my orders
    #[arg(long)]
    orders: bool,

    /// Log in (password from RUOKALA_PASSWORD or stdin)
    #[arg(long, value_name = "EMAIL")]
    login: Option<String>,

    /// Forget the stored session
    #[arg(long)]
    logout: bool,
}

/// Everything a one-shot command needs
struct CliContext {
    config: AppConfig,
    api: ApiClient,
    cart: Cart,
}

impl CliContext {
    fn open(config: AppConfig) -> Result<Self> {
        let cart = Cart::load(Box::new(FileStorage::open(config.storage_path()?)));
        let mut api = ApiClient::new(&config.base_url).context("Could not build HTTP client")?;
        api.set_session(cart.storage().get_item(SESSION_KEY));
        Ok(Self { config, api, cart })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so the TUI screen stays clean)
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(url) = &args.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }

    // Handle CLI-only commands
    if args.status {
        return print_status(config);
    }
    if args.menu {
        return print_week_menu(config).await;
    }
    if args.today {
        return print_today_menu(config).await;
    }
    if args.transport {
        return print_transport(config).await;
    }
    if args.cart {
        return print_cart(config);
    }
    if let Some(id) = &args.add {
        return add_dish(config, id).await;
    }
    if let Some(id) = &args.remove {
        return remove_dish(config, id);
    }
    if args.checkout {
        return checkout_cart(config).await;
    }
    if args.orders {
        return print_orders(config).await;
    }
    if let Some(email) = &args.login {
        return login(config, email).await;
    }
    if args.logout {
        return logout(config);
    }

    // Run TUI
    run_tui(config).await
}

fn print_status(config: AppConfig) -> Result<()> {
    let ctx = CliContext::open(config)?;
    let items: usize = ctx.cart.items().iter().map(|i| i.qty as usize).sum();

    let text = if ctx.cart.is_empty() {
        String::new()
    } else {
        format!("{} €{}", items, format::format_price(ctx.cart.total()))
    };
    let tooltip = ctx.cart.render_text().join("\n");

    let output = serde_json::json!({
        "text": text,
        "tooltip": tooltip,
        "class": if ctx.cart.is_empty() { "empty" } else { "filled" },
        "items": items,
        "total": format::format_price(ctx.cart.total()),
        "loggedIn": ctx.api.session().is_some(),
    });

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

async fn print_week_menu(config: AppConfig) -> Result<()> {
    let ctx = CliContext::open(config)?;
    let week = ctx.api.week_menu().await.context("Could not load the week menu")?;
    if let (Some(start), Some(end)) = (&week.week_start, &week.week_end) {
        println!("Week {} – {}", start, end);
    }
    for line in MenuView::build(&week, &menu::today_name()).render_text() {
        println!("{}", line);
    }
    Ok(())
}

async fn print_today_menu(config: AppConfig) -> Result<()> {
    let ctx = CliContext::open(config)?;
    let today = ctx.api.today_menu().await.context("Could not load today's menu")?;
    let date = today.date.clone();
    let view = MenuView::build(&today.into_week(), &menu::today_name());
    if view.dish_count() == 0 {
        println!("Nothing on the menu for {}.", date);
        return Ok(());
    }
    for line in view.render_text() {
        println!("{}", line);
    }
    Ok(())
}

async fn print_transport(config: AppConfig) -> Result<()> {
    let ctx = CliContext::open(config)?;
    for line in transport::load_transport_info(&ctx.api).await.render_text() {
        println!("{}", line);
    }
    Ok(())
}

fn print_cart(config: AppConfig) -> Result<()> {
    let ctx = CliContext::open(config)?;
    for line in ctx.cart.render_text() {
        println!("{}", line);
    }
    Ok(())
}

async fn add_dish(config: AppConfig, id: &str) -> Result<()> {
    let mut ctx = CliContext::open(config)?;
    let week = ctx.api.week_menu().await.context("Could not load the week menu")?;
    let dish = menu::find_dish(&week, id)
        .ok_or_else(|| anyhow::anyhow!("No dish with id {:?} on this week's menu", id))?;

    ctx.cart.add(&dish)?;
    let qty = ctx.cart.get(&dish.id).map(|i| i.qty).unwrap_or(1);
    println!("Added {} (x{})", dish.name, qty);
    Ok(())
}

fn remove_dish(config: AppConfig, id: &str) -> Result<()> {
    let mut ctx = CliContext::open(config)?;
    let known = ctx.cart.get(id).is_some();
    ctx.cart.remove(id)?;
    if known {
        println!("Removed {}", id);
    } else {
        println!("{} was not in the cart", id);
    }
    Ok(())
}

async fn checkout_cart(config: AppConfig) -> Result<()> {
    let mut ctx = CliContext::open(config)?;
    let outcome = checkout::checkout(&mut ctx.cart, &ctx.api).await;
    let message = outcome.message();
    println!("{}", message);

    match outcome {
        CheckoutOutcome::Created { .. } => {
            if ctx.config.notifications {
                notify("ruokala", &message)?;
            }
            Ok(())
        }
        CheckoutOutcome::LoginRequired => {
            anyhow::bail!("Log in with `ruokala --login <EMAIL>` and try again")
        }
        CheckoutOutcome::EmptyCart => Ok(()),
        CheckoutOutcome::Failed(reason) => anyhow::bail!(reason),
    }
}

async fn print_orders(config: AppConfig) -> Result<()> {
    let ctx = CliContext::open(config)?;
    let orders = match ctx.api.my_orders().await {
        Ok(orders) => orders,
        Err(ApiError::Unauthorized) => {
            anyhow::bail!("{} Run `ruokala --login <EMAIL>`", checkout::LOGIN_REQUIRED)
        }
        Err(e) => return Err(e).context("Could not load orders"),
    };

    if orders.is_empty() {
        println!("No orders yet.");
    }
    for order in orders {
        println!(
            "#{}  {}  {}  {}",
            order.id,
            order.status.as_deref().unwrap_or("unknown"),
            order.created_at.as_deref().unwrap_or(""),
            format::format_euro(order.total()),
        );
        if let Some(pickup) = &order.pickup_time {
            println!("    pickup {}", pickup);
        }
        for item in &order.items {
            println!("    {} x{}", item.name, item.qty);
        }
    }
    Ok(())
}

async fn login(config: AppConfig, email: &str) -> Result<()> {
    let mut ctx = CliContext::open(config)?;

    let password = match std::env::var("RUOKALA_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            eprint!("Password for {}: ", email);
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let session = ctx.api.login(email, &password).await?;
    ctx.cart.storage_mut().set_item(SESSION_KEY, &session)?;
    println!("Logged in as {}", email);
    Ok(())
}

fn logout(config: AppConfig) -> Result<()> {
    let mut ctx = CliContext::open(config)?;
    ctx.cart.storage_mut().remove_item(SESSION_KEY)?;
    println!("Logged out");
    Ok(())
}

async fn run_tui(config: AppConfig) -> Result<()> {
    ui::init_theme(theme::Theme::from_config(&config.theme));

    // Create app state before touching the terminal so errors print normally
    let mut app = App::new(&config).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                tracing::error!("{:#}", e);
                                app.popup = Popup::None;
                                app.status_message = Some(format!("Error: {}", e));
                                app.status_message_time = Some(std::time::Instant::now());
                            }
                        }
                    }
                }
            }
        }

        // Periodic refresh
        app.tick();
    }
}

fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("emblem-default")
        .show()?;
    Ok(())
}
