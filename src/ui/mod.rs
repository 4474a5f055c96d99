mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::sync::OnceLock;

use crate::app::{App, LoginField, Popup, Section};
use crate::format::{format_euro, format_price};
use crate::menu::MenuRow;
use crate::theme::Theme;
use components::{centered_rect, key_hints, popup_block, section_block};

// Theme is fixed for the lifetime of the process
static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the configured theme; only the first call wins
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn today() -> Color { theme().today }
fn danger() -> Color { theme().danger }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn inactive() -> Color { theme().inactive }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(6),    // Menu | Cart + Transport
            Constraint::Length(1), // Footer
        ])
        .split(area);

    // Narrow terminals stack the boxes
    let direction = if area.width < 90 { Direction::Vertical } else { Direction::Horizontal };
    let body = Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(transport_height(app))])
        .split(body[1]);

    draw_info_line(f, app, chunks[0]);
    draw_menu_box(f, app, body[0]);
    draw_cart_box(f, app, side[0]);
    draw_transport_box(f, app, side[1]);
    draw_footer(f, app, chunks[2]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Message => draw_message_popup(f, app),
        Popup::Login => draw_login_popup(f, app),
        Popup::Orders => draw_orders_popup(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn transport_height(app: &App) -> u16 {
    // Each location may wrap onto a second line, plus borders
    let lines = app.transport.render_text().len() as u16;
    (lines * 2 + 2).clamp(3, 12)
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > login state
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(warning())))
    } else {
        let who = if app.is_logged_in() { "Logged in" } else { "Not logged in (l to log in)" };
        Line::from(vec![
            Span::styled(app.api.base_url(), Style::default().fg(text_dim())),
            Span::styled(" │ ", Style::default().fg(inactive())),
            Span::styled(who, Style::default().fg(text_dim())),
        ])
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_menu_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Menu;
    let title = match &app.week_range {
        Some(range) => format!(" Menu {} ", range),
        None => " Menu ".to_string(),
    };
    let block = section_block(&title, is_active);

    let inner_width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .menu
        .rows
        .iter()
        .map(|row| match row {
            MenuRow::Day { title, today: is_today } => {
                let (marker, color) = if *is_today { ("● ", today()) } else { ("  ", header()) };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(color)),
                    Span::styled(title.as_str(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                ]))
            }
            MenuRow::Dish(dish) => {
                // Name left, price right-aligned on the first line
                let pad = inner_width.saturating_sub(dish.name.chars().count() + dish.price.chars().count() + 6);
                let mut lines = vec![Line::from(vec![
                    Span::styled("    ", Style::default()),
                    Span::styled(dish.name.as_str(), Style::default().fg(text()).add_modifier(Modifier::BOLD)),
                    Span::raw(" ".repeat(pad)),
                    Span::styled(dish.price.as_str(), Style::default().fg(success())),
                ])];
                if !dish.meta.trim().is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("      {}", dish.meta.trim()),
                        Style::default().fg(text_dim()),
                    )));
                }
                ListItem::new(Text::from(lines))
            }
            MenuRow::Placeholder(msg) => {
                ListItem::new(Line::from(Span::styled(format!("    {}", msg), Style::default().fg(text_dim()))))
            }
        })
        .collect();

    let highlight = if is_active {
        Style::default().bg(bg_selected()).fg(text())
    } else {
        Style::default()
    };
    let list = List::new(items).block(block).highlight_style(highlight);

    let selected_row = app.menu.dish_indices().get(app.selected_dish).copied();
    let mut state = ListState::default().with_selected(selected_row);
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_cart_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Cart;
    let block = section_block(" Cart ", is_active);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    if app.cart.is_empty() {
        let empty = Paragraph::new(Span::styled("  Your cart is empty.", Style::default().fg(text_dim())));
        f.render_widget(empty, chunks[0]);
    } else {
        let width = chunks[0].width as usize;
        let items: Vec<ListItem> = app
            .cart
            .rows()
            .into_iter()
            .map(|row| {
                let pad = width.saturating_sub(row.label.chars().count() + row.amount.chars().count() + 3);
                ListItem::new(Line::from(vec![
                    Span::styled(format!("  {}", row.label), Style::default().fg(text())),
                    Span::raw(" ".repeat(pad)),
                    Span::styled(row.amount, Style::default().fg(success())),
                ]))
            })
            .collect();

        let highlight = if is_active {
            Style::default().bg(bg_selected()).fg(text())
        } else {
            Style::default()
        };
        let list = List::new(items).highlight_style(highlight);
        let mut state = ListState::default().with_selected(Some(app.selected_cart));
        f.render_stateful_widget(list, chunks[0], &mut state);
    }

    let total = Paragraph::new(Line::from(vec![
        Span::styled("Total: €", Style::default().fg(header())),
        Span::styled(format_price(app.cart.total()), Style::default().fg(text()).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
    ]))
    .alignment(Alignment::Right);
    f.render_widget(total, chunks[1]);
}

fn draw_transport_box(f: &mut Frame, app: &App, area: Rect) {
    let block = section_block(" Getting here ", app.section == Section::Transport);

    let lines: Vec<Line> = match &app.transport {
        crate::transport::TransportView::Locations(locations) => locations
            .iter()
            .map(|loc| {
                Line::from(vec![
                    Span::styled(loc.title.as_str(), Style::default().fg(text()).add_modifier(Modifier::BOLD)),
                    Span::styled(" – ", Style::default().fg(inactive())),
                    Span::styled(loc.description.as_str(), Style::default().fg(text_dim())),
                ])
            })
            .collect(),
        other => other
            .render_text()
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(text_dim()))))
            .collect(),
    };

    let content = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(content, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.section {
        Section::Menu => vec![
            ("↑↓", "Nav"),
            ("Enter", "Add"),
            ("c", "Checkout"),
            ("o", "Orders"),
            ("Tab", "Next"),
            ("h", "Help"),
        ],
        Section::Cart => vec![
            ("↑↓", "Nav"),
            ("d", "Remove"),
            ("c", "Checkout"),
            ("o", "Orders"),
            ("Tab", "Next"),
            ("h", "Help"),
        ],
        Section::Transport => vec![
            ("R", "Reload"),
            ("l", "Login"),
            ("Tab", "Next"),
            ("h", "Help"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else if area.width < 80 { 5 } else { hints.len() };
    let visible: Vec<(&str, &str)> = hints.into_iter().take(max_hints).collect();

    let footer = Paragraph::new(Line::from(key_hints(&visible))).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_message_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, popup_area);

    let message = app.message.as_deref().unwrap_or("");
    let color = if message.starts_with("Order created") { success() } else { warning() };

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(accent())),
            Span::styled(" OK", Style::default().fg(text_dim())),
        ]),
    ])
    .block(popup_block(" ruokala "))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(content, popup_area);
}

fn draw_login_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 90 } else { 50 }, 50, area);
    f.render_widget(Clear, popup_area);
    f.render_widget(popup_block(" 󰍂 Log in "), popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(popup_area);

    let field = |label: &'static str, value: String, active: bool| {
        let border = if active { accent() } else { inactive() };
        let cursor = if active { "_" } else { "" };
        Paragraph::new(format!("{}{}", value, cursor))
            .style(Style::default().fg(text()))
            .block(
                ratatui::widgets::Block::default()
                    .title(Span::styled(label, Style::default().fg(if active { accent() } else { header() })))
                    .borders(ratatui::widgets::Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
    };

    let email_active = app.login_field == LoginField::Email;
    f.render_widget(field(" Email ", app.login_email.clone(), email_active), inner[0]);
    let masked = "•".repeat(app.login_password.chars().count());
    f.render_widget(field(" Password ", masked, !email_active), inner[1]);

    let mut hint_lines = vec![Line::from(key_hints(&[("Tab", "Switch"), ("Enter", "Log in"), ("Esc", "Cancel")]))];
    if let Some(status) = &app.status_message {
        hint_lines.insert(0, Line::from(Span::styled(status.as_str(), Style::default().fg(danger()))));
    }
    let hints = Paragraph::new(hint_lines).alignment(Alignment::Center);
    f.render_widget(hints, inner[2]);
}

fn draw_orders_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 95 } else { 70 }, 70, area);
    f.render_widget(Clear, popup_area);

    let mut lines = Vec::new();
    if app.orders.is_empty() {
        lines.push(Line::from(Span::styled("  No orders yet.", Style::default().fg(text_dim()))));
    }
    for order in app.orders.iter().skip(app.orders_scroll) {
        let status = order.status.as_deref().unwrap_or("unknown");
        let status_color = match status {
            "pending" => warning(),
            "cancelled" => danger(),
            _ => success(),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("#{} ", order.id), Style::default().fg(header()).add_modifier(Modifier::BOLD)),
            Span::styled(status.to_string(), Style::default().fg(status_color)),
            Span::styled(
                format!("  {}", order.created_at.as_deref().unwrap_or("")),
                Style::default().fg(text_dim()),
            ),
        ]));
        if let Some(pickup) = &order.pickup_time {
            lines.push(Line::from(Span::styled(format!("    pickup {}", pickup), Style::default().fg(accent()))));
        }
        for item in &order.items {
            lines.push(Line::from(Span::styled(
                format!("    {} x{}  {}", item.name, item.qty, format_euro(item.line_total())),
                Style::default().fg(text()),
            )));
        }
        lines.push(Line::from(Span::styled(
            format!("    Total {}", format_euro(order.total())),
            Style::default().fg(success()),
        )));
        lines.push(Line::from(""));
    }

    let content = Paragraph::new(lines)
        .block(popup_block(" My orders "))
        .wrap(Wrap { trim: false });
    f.render_widget(content, popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 70 },
        area,
    );
    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(header()).add_modifier(Modifier::BOLD)))
    };
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("═══ Navigation ═══"),
        entry("Tab", "Switch sections (Menu → Cart → Getting here)"),
        entry("↑/↓ j/k", "Move up/down in lists"),
        Line::from(""),
        section("═══ Ordering ═══"),
        entry("Enter/a", "Add selected dish to cart"),
        entry("d/Del", "Remove selected cart line"),
        entry("c", "Check out the cart"),
        entry("o", "Show my orders"),
        Line::from(""),
        section("═══ Account ═══"),
        entry("l", "Log in"),
        entry("L", "Log out"),
        Line::from(""),
        section("═══ Other ═══"),
        entry("R", "Reload menu and transport info"),
        entry("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("h", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(popup_block(" 󰋖 ruokala Help "))
        .wrap(Wrap { trim: false });
    f.render_widget(help, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::cart::storage::MemoryStorage;
    use crate::cart::Cart;
    use crate::menu::{DishRef, MenuView};
    use crate::model::WeekMenu;
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        App::with_parts(api, Cart::load(Box::new(MemoryStorage::new())))
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_empty_menu_and_cart_placeholders() {
        let mut app = app();
        app.menu = MenuView::build(&WeekMenu::default(), "Monday");

        let out = screen(&app);
        assert!(out.contains("No menu found for this week yet."));
        assert!(out.contains("Your cart is empty."));
        assert!(out.contains("Total: €0.00"));
    }

    #[test]
    fn test_cart_lines_and_total() {
        let mut app = app();
        let soup = DishRef {
            id: "soup".to_string(),
            name: "Soup".to_string(),
            price: 9.0,
        };
        app.cart.add(&soup).unwrap();
        app.cart.add(&soup).unwrap();

        let out = screen(&app);
        assert!(out.contains("Soup x2"));
        assert!(out.contains("€18.00"));
        assert!(out.contains("Total: €18.00"));
    }

    #[test]
    fn test_message_popup_is_drawn() {
        let mut app = app();
        app.message = Some("Cart is empty".to_string());
        app.popup = Popup::Message;

        assert!(screen(&app).contains("Cart is empty"));
    }
}
