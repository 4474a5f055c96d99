use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};

use crate::api::{ApiClient, ApiError, SESSION_KEY};
use crate::cart::storage::FileStorage;
use crate::cart::Cart;
use crate::checkout::{self, CheckoutOutcome, LOGIN_REQUIRED};
use crate::config::AppConfig;
use crate::menu::{self, MenuView};
use crate::model::OrderSummary;
use crate::transport::{self, TransportView};

/// How long a status message stays in the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Menu,
    Cart,
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Message, // Blocking notice, dismissed with Enter/Esc
    Login,
    Orders,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

pub struct App {
    pub section: Section,
    pub popup: Popup,

    pub api: ApiClient,

    // Menu (left)
    pub menu: MenuView,
    pub week_range: Option<String>,
    pub selected_dish: usize,
    pub today: String,

    // Cart (right top)
    pub cart: Cart,
    pub selected_cart: usize,

    // Transport (right bottom)
    pub transport: TransportView,

    // My orders popup
    pub orders: Vec<OrderSummary>,
    pub orders_scroll: usize,

    // Message popup; login opens once it is dismissed when set
    pub message: Option<String>,
    pub login_after_message: bool,

    // Login form
    pub login_email: String,
    pub login_password: String,
    pub login_field: LoginField,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    /// Open local storage, restore cart and session, then fetch menu and transport info
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let storage_path = config.storage_path()?;
        tracing::info!("Using local storage {}", storage_path.display());
        let cart = Cart::load(Box::new(FileStorage::open(storage_path)));

        let mut api = ApiClient::new(&config.base_url).context("Could not build HTTP client")?;
        api.set_session(cart.storage().get_item(SESSION_KEY));

        let mut app = Self::with_parts(api, cart);
        app.reload().await;
        Ok(app)
    }

    pub fn with_parts(api: ApiClient, cart: Cart) -> Self {
        Self {
            section: Section::Menu,
            popup: Popup::None,

            api,

            menu: MenuView::default(),
            week_range: None,
            selected_dish: 0,
            today: menu::today_name(),

            cart,
            selected_cart: 0,

            transport: TransportView::Loading,

            orders: Vec::new(),
            orders_scroll: 0,

            message: None,
            login_after_message: false,

            login_email: String::new(),
            login_password: String::new(),
            login_field: LoginField::Email,

            status_message: None,
            status_message_time: None,
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    fn show_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.popup = Popup::Message;
    }

    /// Fetch the week menu and transport info again
    pub async fn reload(&mut self) {
        self.today = menu::today_name();
        match self.api.week_menu().await {
            Ok(week) => {
                self.week_range = match (&week.week_start, &week.week_end) {
                    (Some(start), Some(end)) => Some(format!("{} – {}", start, end)),
                    _ => None,
                };
                self.menu = MenuView::build(&week, &self.today);
            }
            Err(e) => {
                // No retry: the menu stays blank until the next reload
                tracing::error!("Failed to load week menu: {}", e);
                self.menu = MenuView::default();
                self.week_range = None;
                self.set_status(format!("Menu unavailable: {}", e));
            }
        }
        self.selected_dish = self.selected_dish.min(self.menu.dish_count().saturating_sub(1));

        self.transport = transport::load_transport_info(&self.api).await;
    }

    /// Periodic housekeeping from the main loop
    pub fn tick(&mut self) {
        if let Some(at) = self.status_message_time {
            if at.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.api.session().is_some()
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key).await;
        }

        // Handle normal key input
        self.handle_normal_key(key).await
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab => {
                self.section = match self.section {
                    Section::Menu => Section::Cart,
                    Section::Cart => Section::Transport,
                    Section::Transport => Section::Menu,
                };
            }
            KeyCode::BackTab => {
                self.section = match self.section {
                    Section::Menu => Section::Transport,
                    Section::Cart => Section::Menu,
                    Section::Transport => Section::Cart,
                };
            }

            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),

            KeyCode::Char('a') | KeyCode::Char(' ') | KeyCode::Enter => {
                if self.section == Section::Menu {
                    self.add_selected_dish()?;
                }
            }

            KeyCode::Char('d') | KeyCode::Delete | KeyCode::Backspace => {
                if self.section == Section::Cart {
                    self.remove_selected_item()?;
                }
            }

            KeyCode::Char('c') => self.checkout().await,
            KeyCode::Char('o') => self.show_orders().await,
            KeyCode::Char('l') => self.start_login(),
            KeyCode::Char('L') => self.logout()?,

            KeyCode::Char('R') => {
                self.reload().await;
                if self.status_message.is_none() {
                    self.set_status("Menu refreshed");
                }
            }

            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    async fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Message => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('q')) {
                    self.message = None;
                    self.popup = Popup::None;
                    if self.login_after_message {
                        self.login_after_message = false;
                        self.start_login();
                    }
                }
                Ok(())
            }
            Popup::Login => self.handle_login_key(key).await,
            Popup::Orders => {
                match key.code {
                    KeyCode::Char('j') | KeyCode::Down => {
                        if self.orders_scroll + 1 < self.orders.len() {
                            self.orders_scroll += 1;
                        }
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.orders_scroll = self.orders_scroll.saturating_sub(1);
                    }
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('o') => {
                        self.popup = Popup::None;
                    }
                    _ => {}
                }
                Ok(())
            }
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::None => Ok(()),
        }
    }

    fn move_down(&mut self) {
        match self.section {
            Section::Menu => {
                let count = self.menu.dish_count();
                if count > 0 {
                    self.selected_dish = (self.selected_dish + 1) % count;
                }
            }
            Section::Cart => {
                if !self.cart.is_empty() {
                    self.selected_cart = (self.selected_cart + 1) % self.cart.len();
                }
            }
            Section::Transport => {
                // Static list, nothing to select
            }
        }
    }

    fn move_up(&mut self) {
        match self.section {
            Section::Menu => {
                let count = self.menu.dish_count();
                if count > 0 {
                    self.selected_dish = self.selected_dish.checked_sub(1).unwrap_or(count - 1);
                }
            }
            Section::Cart => {
                if !self.cart.is_empty() {
                    self.selected_cart = self.selected_cart.checked_sub(1).unwrap_or(self.cart.len() - 1);
                }
            }
            Section::Transport => {}
        }
    }

    /// Add the highlighted dish using the data attached to its row
    fn add_selected_dish(&mut self) -> Result<()> {
        let Some(row) = self.menu.nth_dish(self.selected_dish) else {
            return Ok(());
        };
        let dish = row.dish.clone();
        self.cart.add(&dish)?;
        let qty = self.cart.get(&dish.id).map(|i| i.qty).unwrap_or(1);
        self.set_status(format!("Added {} (x{})", dish.name, qty));
        Ok(())
    }

    /// Remove the highlighted cart line, resolved against the current cart
    fn remove_selected_item(&mut self) -> Result<()> {
        let Some(item) = self.cart.items().get(self.selected_cart) else {
            return Ok(());
        };
        let (id, name) = (item.id.clone(), item.name.clone());
        self.cart.remove(&id)?;
        self.clamp_cart_selection();
        self.set_status(format!("Removed {}", name));
        Ok(())
    }

    fn clamp_cart_selection(&mut self) {
        self.selected_cart = self.selected_cart.min(self.cart.len().saturating_sub(1));
    }

    async fn checkout(&mut self) {
        let outcome = checkout::checkout(&mut self.cart, &self.api).await;
        self.clamp_cart_selection();
        if outcome == CheckoutOutcome::LoginRequired {
            self.login_after_message = true;
        }
        self.show_message(outcome.message());
    }

    async fn show_orders(&mut self) {
        match self.api.my_orders().await {
            Ok(orders) => {
                self.orders = orders;
                self.orders_scroll = 0;
                self.popup = Popup::Orders;
            }
            Err(ApiError::Unauthorized) => {
                self.login_after_message = true;
                self.show_message(LOGIN_REQUIRED);
            }
            Err(e) => {
                tracing::error!("Failed to load orders: {}", e);
                self.set_status(format!("Could not load orders: {}", e));
            }
        }
    }

    fn start_login(&mut self) {
        self.popup = Popup::Login;
        self.login_password.clear();
        self.login_field = if self.login_email.is_empty() {
            LoginField::Email
        } else {
            LoginField::Password
        };
    }

    async fn handle_login_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.popup = Popup::None;
                self.login_password.clear();
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.login_field = match self.login_field {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            KeyCode::Enter => match self.login_field {
                LoginField::Email => self.login_field = LoginField::Password,
                LoginField::Password => self.submit_login().await?,
            },
            KeyCode::Backspace => {
                match self.login_field {
                    LoginField::Email => self.login_email.pop(),
                    LoginField::Password => self.login_password.pop(),
                };
            }
            KeyCode::Char(c) => match self.login_field {
                LoginField::Email => self.login_email.push(c),
                LoginField::Password => self.login_password.push(c),
            },
            _ => {}
        }
        Ok(())
    }

    async fn submit_login(&mut self) -> Result<()> {
        if self.login_email.trim().is_empty() || self.login_password.is_empty() {
            self.set_status("Enter email and password");
            return Ok(());
        }

        let email = self.login_email.clone();
        let password = std::mem::take(&mut self.login_password);
        match self.api.login(&email, &password).await {
            Ok(session) => {
                self.cart.storage_mut().set_item(SESSION_KEY, &session)?;
                self.popup = Popup::None;
                self.set_status(format!("Logged in as {}", email.trim()));
            }
            Err(ApiError::InvalidCredentials) => {
                self.set_status("Invalid email or password");
            }
            Err(e) => {
                tracing::error!("Login failed: {}", e);
                self.set_status(format!("Login failed: {}", e));
            }
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        self.api.set_session(None);
        self.cart.storage_mut().remove_item(SESSION_KEY)?;
        self.set_status("Logged out");
        Ok(())
    }
}
