//! Plain text output. Every function returns the text; printing is left to
//! the caller.

use chrono::NaiveDate;
use holdingsapp::model::{CollectionItem, Profile, Settings, Theme};
use std::fmt::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const NAME_WIDTH: usize = 28;
const CATEGORY_WIDTH: usize = 16;

pub fn item_list(items: &[CollectionItem], today: NaiveDate) -> String {
    if items.is_empty() {
        return "No items.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let _ = writeln!(
            out,
            "{} {} {:>5}d  {}",
            fit_to_width(&item.name, NAME_WIDTH),
            fit_to_width(&item.category, CATEGORY_WIDTH),
            item.days_unused(today),
            item.id,
        );
    }
    out
}

pub fn item_detail(item: &CollectionItem, today: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", item.name);
    let _ = writeln!(out, "  id:        {}", item.id);
    let _ = writeln!(out, "  category:  {}", item.category);
    if !item.location.is_empty() {
        let _ = writeln!(out, "  location:  {}", item.location);
    }
    let _ = writeln!(
        out,
        "  last used: {} ({} days ago)",
        item.last_used,
        item.days_unused(today)
    );
    if let Some(price) = item.price_paid {
        let _ = writeln!(out, "  paid:      {:.2}", price);
    }
    if let Some(price) = item.price_expected {
        let _ = writeln!(out, "  expected:  {:.2}", price);
    }
    if let Some(image) = &item.image_url {
        let _ = writeln!(out, "  image:     {}", image);
    }
    if let Some(notes) = &item.notes {
        let _ = writeln!(out, "  notes:     {}", notes);
    }
    out
}

pub fn settings(settings: &Settings) -> String {
    format!(
        "currency: {}\ntheme: {}\nnotifications: {}\nonboarding completed: {}\n",
        settings.currency,
        theme_label(settings.theme),
        settings.notifications_enabled,
        settings.onboarding_completed
    )
}

pub fn profile(profile: &Profile) -> String {
    format!(
        "name: {}\nemail: {}\navatar: {}\n",
        profile.name,
        profile.email,
        profile.avatar.as_deref().unwrap_or("-")
    )
}

fn theme_label(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
        Theme::Auto => "auto",
    }
}

/// Truncate or pad `text` to exactly `width` terminal columns.
fn fit_to_width(text: &str, width: usize) -> String {
    let display = truncate_to_width(text, width);
    let padding = " ".repeat(width.saturating_sub(display.width()));
    display + &padding
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    let limit = max_width.saturating_sub(1);

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > limit {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_list_shows_days_unused() {
        let items = vec![CollectionItem::new("abc", "Tent", "Camping", "Attic", day(1))];
        let out = item_list(&items, day(11));
        assert!(out.contains("Tent"));
        assert!(out.contains("10d"));
        assert!(out.contains("abc"));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(item_list(&[], day(1)), "No items.\n");
    }

    #[test]
    fn test_truncate_long_names() {
        let long = "x".repeat(40);
        assert_eq!(truncate_to_width(&long, 10).width(), 10);
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("exactlyten", 10), "exactlyten");
    }

    #[test]
    fn test_wide_characters_are_truncated_by_columns() {
        // Each of these takes two terminal columns.
        let wide = "東京都渋谷区の古いフィルムカメラ一式";
        let cut = truncate_to_width(wide, NAME_WIDTH);
        assert!(cut.width() <= NAME_WIDTH);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_columns_align_with_wide_names() {
        let items = vec![
            CollectionItem::new("a", "東京都渋谷区の古いフィルムカメラ一式", "写真機材", "棚", day(1)),
            CollectionItem::new("b", "Drill", "Tools", "Garage", day(1)),
        ];
        let out = item_list(&items, day(11));
        let widths: Vec<usize> = out.lines().map(|line| line.width()).collect();
        assert_eq!(widths[0], widths[1], "{}", out);
    }

    #[test]
    fn test_settings_uses_stored_theme_names() {
        let s = Settings {
            theme: Theme::Dark,
            ..Settings::default()
        };
        assert!(settings(&s).contains("theme: dark"));
    }
}
