//! Wire types shared with the restaurant backend

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Missing or null prices are treated as free
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub diet: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub allergens: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Day {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// English weekday name ("Monday"), empty when the backend has none
    #[serde(default, deserialize_with = "null_as_default")]
    pub weekday: String,
    /// ISO date ("2024-05-13")
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dishes: Vec<Dish>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekMenu {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_end: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub days: Vec<Day>,
}

/// Response of `/api/menu/today`; weekday is null when nothing is planned
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TodayMenu {
    #[serde(default)]
    pub id: Option<String>,
    pub date: String,
    #[serde(default)]
    pub weekday: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dishes: Vec<Dish>,
}

impl TodayMenu {
    /// View the single day as a one-day week so it renders the same way
    pub fn into_week(self) -> WeekMenu {
        let days = if self.dishes.is_empty() && self.weekday.is_none() {
            Vec::new()
        } else {
            vec![Day {
                id: self.id,
                weekday: self.weekday.unwrap_or_default(),
                date: self.date,
                dishes: self.dishes,
            }]
        };
        WeekMenu {
            week_start: None,
            week_end: None,
            days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportLocation {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportInfo {
    #[serde(default)]
    pub locations: Vec<TransportLocation>,
}

/// Body of `POST /api/orders`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest<'a> {
    pub items: &'a [crate::cart::CartItem],
    pub pickup_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreated {
    pub id: String,
}

/// An order as listed by `/api/orders/my`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    #[serde(default)]
    pub items: Vec<crate::cart::CartItem>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub pickup_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl OrderSummary {
    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.line_total()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_menu_tolerates_missing_fields() {
        let json = r#"{
            "weekStart": "2024-05-13",
            "days": [
                {"date": "2024-05-13", "weekday": "Monday", "dishes": [
                    {"name": "Veggie Soup", "price": 9.0, "diet": ["V", "Ve"]},
                    {"name": "Bread"}
                ]},
                {"date": "2024-05-14", "weekday": "Tuesday"}
            ]
        }"#;

        let week: WeekMenu = serde_json::from_str(json).unwrap();
        assert_eq!(week.week_start.as_deref(), Some("2024-05-13"));
        assert_eq!(week.days.len(), 2);
        assert_eq!(week.days[0].dishes[1].price, 0.0);
        assert!(week.days[0].dishes[1].allergens.is_empty());
        assert!(week.days[1].dishes.is_empty());
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let json = r#"{
            "weekStart": null,
            "days": [
                {"date": "2024-05-13", "weekday": null, "dishes": [
                    {"name": "Soup", "price": null, "diet": null, "allergens": null},
                    {"name": "Stew", "price": 11.5, "diet": ["G"]}
                ]},
                {"date": "2024-05-14", "weekday": "Tuesday", "dishes": null}
            ]
        }"#;

        let week: WeekMenu = serde_json::from_str(json).unwrap();
        assert!(week.week_start.is_none());
        assert_eq!(week.days.len(), 2);

        let monday = &week.days[0];
        assert_eq!(monday.weekday, "");
        assert_eq!(monday.dishes[0].price, 0.0);
        assert!(monday.dishes[0].diet.is_empty());
        assert!(monday.dishes[0].allergens.is_empty());
        assert_eq!(monday.dishes[1].price, 11.5);
        assert!(week.days[1].dishes.is_empty());
    }

    #[test]
    fn test_wrongly_typed_price_is_rejected() {
        let json = r#"{"days": [{"date": "2024-05-13", "dishes": [{"name": "Soup", "price": "cheap"}]}]}"#;
        assert!(serde_json::from_str::<WeekMenu>(json).is_err());
    }

    #[test]
    fn test_empty_object_is_empty_week() {
        let week: WeekMenu = serde_json::from_str("{}").unwrap();
        assert!(week.days.is_empty());
    }

    #[test]
    fn test_today_without_plan_has_no_days() {
        let today: TodayMenu =
            serde_json::from_str(r#"{"date": "2024-05-18", "weekday": null, "dishes": []}"#).unwrap();
        assert!(today.into_week().days.is_empty());
    }

    #[test]
    fn test_order_without_items_totals_zero() {
        let order: OrderSummary = serde_json::from_str(r#"{"id": "o1", "status": "new"}"#).unwrap();
        assert_eq!(crate::format::format_euro(order.total()), "€0.00");
    }

    #[test]
    fn test_order_request_uses_camel_case() {
        let items = vec![crate::cart::CartItem {
            id: "d1".to_string(),
            name: "Soup".to_string(),
            price: 9.0,
            qty: 2,
        }];
        let body = OrderRequest {
            items: &items,
            pickup_time: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["pickupTime"], serde_json::Value::Null);
        assert_eq!(value["items"][0]["qty"], 2);
    }
}
