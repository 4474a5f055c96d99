//! Week menu rendering
//!
//! The menu is flattened into rows (day headers, dishes, placeholders) that
//! both the TUI and the plain-text printer draw. Dish rows carry the minimal
//! data the cart needs, so adding a dish never has to look back into the menu.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::format::format_euro;
use crate::model::{Day, Dish, WeekMenu};

pub const NO_MENU: &str = "No menu found for this week yet.";
pub const NO_DISHES: &str = "No dishes defined.";

/// Identity and price of a dish, attached to each rendered dish row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishRef {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl DishRef {
    /// Dishes without an id are keyed by "<date>:<name>"
    pub fn new(day: &Day, dish: &Dish) -> Self {
        let id = match dish.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("{}:{}", day.date, dish.name),
        };
        Self {
            id,
            name: dish.name.clone(),
            price: dish.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DishRow {
    pub name: String,
    /// Description, diet tags and allergens on one line
    pub meta: String,
    pub price: String,
    pub dish: DishRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuRow {
    Day { title: String, today: bool },
    Dish(DishRow),
    Placeholder(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuView {
    pub rows: Vec<MenuRow>,
}

/// English long weekday name of the local date ("Monday")
pub fn today_name() -> String {
    Local::now().format("%A").to_string()
}

fn dish_meta(dish: &Dish) -> String {
    let mut meta = dish.description.clone().unwrap_or_default();
    if !dish.diet.is_empty() {
        meta.push_str(&format!(" [{}]", dish.diet.join(", ")));
    }
    if !dish.allergens.is_empty() {
        meta.push_str(&format!(" Allergens: {}", dish.allergens.join(", ")));
    }
    meta
}

impl MenuView {
    pub fn build(week: &WeekMenu, today: &str) -> Self {
        if week.days.is_empty() {
            return Self {
                rows: vec![MenuRow::Placeholder(NO_MENU)],
            };
        }

        let mut rows = Vec::new();
        for day in &week.days {
            let title = if day.weekday.is_empty() {
                day.date.clone()
            } else {
                format!("{} ({})", day.weekday, day.date)
            };
            rows.push(MenuRow::Day {
                title,
                today: !day.weekday.is_empty() && day.weekday == today,
            });

            if day.dishes.is_empty() {
                rows.push(MenuRow::Placeholder(NO_DISHES));
                continue;
            }

            for dish in &day.dishes {
                rows.push(MenuRow::Dish(DishRow {
                    name: dish.name.clone(),
                    meta: dish_meta(dish),
                    price: format_euro(dish.price),
                    dish: DishRef::new(day, dish),
                }));
            }
        }
        Self { rows }
    }

    /// Indices of rows that can be selected (dish rows)
    pub fn dish_indices(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches!(row, MenuRow::Dish(_)))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn dish_count(&self) -> usize {
        self.dish_indices().len()
    }

    /// The n-th dish row, counting only dishes
    pub fn nth_dish(&self, n: usize) -> Option<&DishRow> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                MenuRow::Dish(d) => Some(d),
                _ => None,
            })
            .nth(n)
    }

    pub fn render_text(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| match row {
                MenuRow::Day { title, today } => {
                    if *today {
                        format!("\n== {} (today) ==", title)
                    } else {
                        format!("\n== {} ==", title)
                    }
                }
                MenuRow::Dish(d) => {
                    let mut line = format!("  {:<28} {:>8}  [{}]", d.name, d.price, d.dish.id);
                    if !d.meta.is_empty() {
                        line.push_str(&format!("\n      {}", d.meta));
                    }
                    line
                }
                MenuRow::Placeholder(text) => format!("  {}", text),
            })
            .collect()
    }
}

/// Find a dish by its cart identity (explicit id or "<date>:<name>")
pub fn find_dish(week: &WeekMenu, id: &str) -> Option<DishRef> {
    week.days
        .iter()
        .flat_map(|day| day.dishes.iter().map(move |dish| DishRef::new(day, dish)))
        .find(|dish| dish.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_week() -> WeekMenu {
        WeekMenu {
            week_start: Some("2024-05-13".to_string()),
            week_end: Some("2024-05-19".to_string()),
            days: vec![
                Day {
                    id: None,
                    weekday: "Monday".to_string(),
                    date: "2024-05-13".to_string(),
                    dishes: vec![
                        Dish {
                            id: None,
                            name: "Chicken Pasta".to_string(),
                            description: Some("Creamy chicken pasta with parmesan".to_string()),
                            price: 10.5,
                            diet: vec!["L".to_string()],
                            allergens: vec!["gluten".to_string(), "milk".to_string()],
                        },
                        Dish {
                            id: Some("soup-1".to_string()),
                            name: "Veggie Soup".to_string(),
                            description: None,
                            price: 9.0,
                            diet: vec!["V".to_string(), "Ve".to_string()],
                            allergens: vec![],
                        },
                    ],
                },
                Day {
                    id: None,
                    weekday: "Tuesday".to_string(),
                    date: "2024-05-14".to_string(),
                    dishes: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_empty_week_renders_placeholder() {
        let view = MenuView::build(&WeekMenu::default(), "Monday");
        assert_eq!(view.rows, vec![MenuRow::Placeholder(NO_MENU)]);
        assert_eq!(view.dish_count(), 0);
    }

    #[test]
    fn test_days_and_dishes_are_rendered() {
        let view = MenuView::build(&sample_week(), "Tuesday");

        assert_eq!(
            view.rows[0],
            MenuRow::Day {
                title: "Monday (2024-05-13)".to_string(),
                today: false
            }
        );
        assert_eq!(
            view.rows[3],
            MenuRow::Day {
                title: "Tuesday (2024-05-14)".to_string(),
                today: true
            }
        );
        assert_eq!(view.rows[4], MenuRow::Placeholder(NO_DISHES));
        assert_eq!(view.dish_indices(), vec![1, 2]);
    }

    #[test]
    fn test_day_without_weekday_shows_date_only() {
        let mut week = sample_week();
        week.days[1].weekday = String::new();
        let view = MenuView::build(&week, "");

        assert_eq!(
            view.rows[3],
            MenuRow::Day {
                title: "2024-05-14".to_string(),
                today: false
            }
        );
    }

    #[test]
    fn test_dish_meta_and_price() {
        let view = MenuView::build(&sample_week(), "Monday");
        let pasta = view.nth_dish(0).unwrap();
        assert_eq!(
            pasta.meta,
            "Creamy chicken pasta with parmesan [L] Allergens: gluten, milk"
        );
        assert_eq!(pasta.price, "€10.50");

        let soup = view.nth_dish(1).unwrap();
        assert_eq!(soup.meta, " [V, Ve]");
    }

    #[test]
    fn test_dish_identity_falls_back_to_date_and_name() {
        let view = MenuView::build(&sample_week(), "Monday");
        assert_eq!(view.nth_dish(0).unwrap().dish.id, "2024-05-13:Chicken Pasta");
        assert_eq!(view.nth_dish(1).unwrap().dish.id, "soup-1");
        assert!(view.nth_dish(2).is_none());
    }

    #[test]
    fn test_find_dish_by_either_identity() {
        let week = sample_week();
        assert_eq!(find_dish(&week, "soup-1").unwrap().name, "Veggie Soup");
        assert_eq!(find_dish(&week, "2024-05-13:Chicken Pasta").unwrap().price, 10.5);
        assert!(find_dish(&week, "2024-05-14:Chicken Pasta").is_none());
    }

    #[test]
    fn test_render_text_marks_today() {
        let lines = MenuView::build(&sample_week(), "Monday").render_text();
        assert!(lines[0].contains("Monday (2024-05-13) (today)"));
        assert!(lines.iter().any(|l| l.contains(NO_DISHES)));
    }
}
