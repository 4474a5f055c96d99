pub mod storage;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::format::{format_euro, format_price};
use crate::menu::DishRef;
use storage::Storage;

/// Storage key holding the serialized cart array
pub const CART_KEY: &str = "cart";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    pub qty: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.qty)
    }
}

/// One rendered cart line
#[derive(Debug, Clone, PartialEq)]
pub struct CartRow {
    pub id: String,
    pub label: String,
    pub amount: String,
}

/// The pending order, written through to storage after every change
pub struct Cart {
    items: Vec<CartItem>,
    storage: Box<dyn Storage>,
}

impl Cart {
    /// Hydrate from storage; missing or corrupt data gives an empty cart
    pub fn load(storage: Box<dyn Storage>) -> Self {
        let items = match storage.get_item(CART_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<CartItem>>(&raw) {
                Ok(items) => items.into_iter().filter(|i| i.qty > 0).collect(),
                Err(e) => {
                    tracing::warn!("Stored cart is corrupt, starting empty: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        tracing::debug!("Loaded cart with {} item(s)", items.len());
        Self { items, storage }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Increment the quantity of a known dish or insert it with qty 1
    pub fn add(&mut self, dish: &DishRef) -> Result<()> {
        match self.items.iter_mut().find(|i| i.id == dish.id) {
            Some(existing) => existing.qty = existing.qty.saturating_add(1),
            None => self.items.push(CartItem {
                id: dish.id.clone(),
                name: dish.name.clone(),
                price: dish.price,
                qty: 1,
            }),
        }
        self.save()
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.items.retain(|i| i.id != id);
        self.save()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.save()
    }

    /// Read-only access to the backing storage (session lookups)
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn Storage {
        self.storage.as_mut()
    }

    fn save(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.items)?;
        self.storage.set_item(CART_KEY, &raw)
    }

    pub fn rows(&self) -> Vec<CartRow> {
        self.items
            .iter()
            .map(|item| CartRow {
                id: item.id.clone(),
                label: format!("{} x{}", item.name, item.qty),
                amount: format_euro(item.line_total()),
            })
            .collect()
    }

    /// Plain-text rendering used by the CLI
    pub fn render_text(&self) -> Vec<String> {
        if self.items.is_empty() {
            return vec!["Your cart is empty.".to_string(), "Total: €0.00".to_string()];
        }
        let mut lines: Vec<String> = self
            .rows()
            .into_iter()
            .map(|row| format!("{}  {}  [{}]", row.label, row.amount, row.id))
            .collect();
        lines.push(format!("Total: €{}", format_price(self.total())));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::storage::MemoryStorage;
    use super::*;

    fn dish(id: &str, price: f64) -> DishRef {
        DishRef {
            id: id.to_string(),
            name: format!("Dish {}", id),
            price,
        }
    }

    fn empty_cart() -> Cart {
        Cart::load(Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_adding_same_dish_twice_increments_qty() {
        let mut cart = empty_cart();
        cart.add(&dish("a", 10.5)).unwrap();
        cart.add(&dish("a", 10.5)).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().qty, 2);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut cart = empty_cart();
        cart.add(&dish("a", 1.0)).unwrap();
        cart.remove("missing").unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().qty, 1);
    }

    #[test]
    fn test_remove_drops_whole_line() {
        let mut cart = empty_cart();
        cart.add(&dish("a", 1.0)).unwrap();
        cart.add(&dish("a", 1.0)).unwrap();
        cart.add(&dish("b", 2.0)).unwrap();
        cart.remove("a").unwrap();

        assert!(cart.get("a").is_none());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_total_is_sum_of_price_times_qty() {
        let mut cart = empty_cart();
        let dishes = [dish("a", 10.5), dish("b", 9.0), dish("c", 0.0), dish("d", 11.25)];
        let adds = [3, 1, 2, 2];
        for (d, n) in dishes.iter().zip(adds) {
            for _ in 0..n {
                cart.add(d).unwrap();
            }
        }

        let expected: f64 = dishes
            .iter()
            .zip(adds)
            .map(|(d, n)| d.price * f64::from(n))
            .sum();
        assert!((cart.total() - expected).abs() < 1e-9);
        assert_eq!(format_price(cart.total()), "63.00");
    }

    #[test]
    fn test_empty_cart_total_formats_as_zero() {
        let mut cart = empty_cart();
        assert_eq!(format_price(cart.total()), "0.00");

        cart.add(&dish("a", 3.0)).unwrap();
        cart.remove("a").unwrap();
        assert_eq!(format_price(cart.total()), "0.00");
    }

    #[test]
    fn test_qty_saturates_instead_of_overflowing() {
        let storage = MemoryStorage::with_item(
            CART_KEY,
            r#"[{"id":"a","name":"Dish a","price":1.0,"qty":4294967295}]"#,
        );
        let mut cart = Cart::load(Box::new(storage));
        cart.add(&dish("a", 1.0)).unwrap();
        assert_eq!(cart.get("a").unwrap().qty, u32::MAX);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let mut cart = empty_cart();
        cart.add(&dish("a", 2.0)).unwrap();
        let stored = cart.storage().get_item(CART_KEY).unwrap();
        let items: Vec<CartItem> = serde_json::from_str(&stored).unwrap();
        assert_eq!(items[0].qty, 1);

        cart.clear().unwrap();
        assert_eq!(cart.storage().get_item(CART_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn test_load_restores_stored_items() {
        let storage = MemoryStorage::with_item(
            CART_KEY,
            r#"[{"id":"2024-05-13:Soup","name":"Soup","price":9.0,"qty":2}]"#,
        );
        let cart = Cart::load(Box::new(storage));
        assert_eq!(cart.get("2024-05-13:Soup").unwrap().qty, 2);
        assert_eq!(cart.total(), 18.0);
    }

    #[test]
    fn test_corrupt_storage_resets_to_empty() {
        for raw in ["not json", "{\"id\": 1}", "[{\"name\": \"no id\"}]"] {
            let cart = Cart::load(Box::new(MemoryStorage::with_item(CART_KEY, raw)));
            assert!(cart.is_empty(), "expected empty cart for {:?}", raw);
        }
    }

    #[test]
    fn test_render_text_empty_and_filled() {
        let mut cart = empty_cart();
        assert_eq!(cart.render_text()[0], "Your cart is empty.");

        cart.add(&dish("a", 10.5)).unwrap();
        cart.add(&dish("a", 10.5)).unwrap();
        let rows = cart.rows();
        assert_eq!(rows[0].label, "Dish a x2");
        assert_eq!(rows[0].amount, "€21.00");
        assert_eq!(cart.render_text().last().unwrap(), "Total: €21.00");
    }
}
