//! The built-in category list.
//!
//! Order matters: it is the order in which defaults are listed to callers,
//! ahead of any user categories. Append new names at the end (before
//! `Other` is fine too, but never reorder existing ones) so that stored
//! sets keep listing in a familiar order after an upgrade.

/// Category items are moved to when their category is deleted.
pub const FALLBACK_CATEGORY: &str = "Other";

pub const DEFAULT_CATEGORIES: [&str; 40] = [
    "Electronics",
    "Appliances",
    "Furniture",
    "Kitchen",
    "Tools",
    "Books",
    "Clothing",
    "Shoes",
    "Accessories",
    "Jewelry",
    "Sports",
    "Outdoor",
    "Camping",
    "Fitness",
    "Music",
    "Instruments",
    "Art",
    "Crafts",
    "Toys",
    "Games",
    "Collectibles",
    "Decor",
    "Bedding",
    "Bathroom",
    "Garden",
    "Automotive",
    "Bikes",
    "Office",
    "Stationery",
    "Computers",
    "Phones",
    "Cameras",
    "Audio",
    "Video",
    "Health",
    "Beauty",
    "Baby",
    "Pets",
    "Travel",
    FALLBACK_CATEGORY,
];

/// Whether `name` is one of the built-in categories.
pub fn is_default_category(name: &str) -> bool {
    DEFAULT_CATEGORIES.contains(&name)
}
