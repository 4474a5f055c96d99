//! Turning the cart into a submitted order

use crate::api::{ApiClient, ApiError};
use crate::cart::Cart;

pub const EMPTY_CART: &str = "Cart is empty";
pub const LOGIN_REQUIRED: &str = "Please log in to place an order.";
pub const ORDER_FAILED: &str = "Error creating order";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Nothing was sent
    EmptyCart,
    /// Order accepted, cart cleared
    Created { id: String },
    /// Backend answered 401, cart untouched
    LoginRequired,
    /// Network or server failure, cart untouched
    Failed(String),
}

impl CheckoutOutcome {
    /// Message shown to the user
    pub fn message(&self) -> String {
        match self {
            Self::EmptyCart => EMPTY_CART.to_string(),
            Self::Created { id } => format!("Order created! ID: {}", id),
            Self::LoginRequired => LOGIN_REQUIRED.to_string(),
            Self::Failed(_) => ORDER_FAILED.to_string(),
        }
    }
}

pub async fn checkout(cart: &mut Cart, api: &ApiClient) -> CheckoutOutcome {
    if cart.is_empty() {
        return CheckoutOutcome::EmptyCart;
    }

    match api.create_order(cart.items()).await {
        Ok(id) => {
            tracing::info!("Order {} created", id);
            if let Err(e) = cart.clear() {
                // The order went through; a stale stored cart is the lesser problem
                tracing::error!("Failed to persist cleared cart: {:#}", e);
            }
            CheckoutOutcome::Created { id }
        }
        Err(ApiError::Unauthorized) => {
            tracing::info!("Checkout needs a login");
            CheckoutOutcome::LoginRequired
        }
        Err(e) => {
            tracing::error!("Checkout failed: {}", e);
            CheckoutOutcome::Failed(e.to_string())
        }
    }
}
