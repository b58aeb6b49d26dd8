//! Menu item catalogue and cold-start item profiling

use serde::{Deserialize, Serialize};

/// Product category of a menu item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Bakery,
    Beverage,
    Dessert,
    LightMeal,
    MainMeal,
    Pastry,
    SideDish,
}

impl ItemCategory {
    /// Label encoding used by the feature contract (alphabetical order)
    pub fn encoded(&self) -> f64 {
        match self {
            ItemCategory::Bakery => 0.0,
            ItemCategory::Beverage => 1.0,
            ItemCategory::Dessert => 2.0,
            ItemCategory::LightMeal => 3.0,
            ItemCategory::MainMeal => 4.0,
            ItemCategory::Pastry => 5.0,
            ItemCategory::SideDish => 6.0,
        }
    }
}

/// Static characteristics of a menu item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemProfile {
    pub category: ItemCategory,
    /// 1 (trivial) to 5 (elaborate)
    pub preparation_complexity: u8,
}

impl ItemProfile {
    const fn new(category: ItemCategory, preparation_complexity: u8) -> Self {
        Self {
            category,
            preparation_complexity,
        }
    }
}

/// Items the platform was trained on
pub const ITEM_CATALOGUE: &[(&str, ItemProfile)] = &[
    ("Jollof Rice", ItemProfile::new(ItemCategory::MainMeal, 3)),
    ("Fried Chicken", ItemProfile::new(ItemCategory::MainMeal, 2)),
    ("Beef Stew", ItemProfile::new(ItemCategory::MainMeal, 3)),
    ("Plantain", ItemProfile::new(ItemCategory::SideDish, 1)),
    ("Vegetable Soup", ItemProfile::new(ItemCategory::MainMeal, 3)),
    ("Espresso", ItemProfile::new(ItemCategory::Beverage, 1)),
    ("Cappuccino", ItemProfile::new(ItemCategory::Beverage, 1)),
    ("Latte", ItemProfile::new(ItemCategory::Beverage, 1)),
    ("Croissant", ItemProfile::new(ItemCategory::Pastry, 2)),
    ("Sandwich", ItemProfile::new(ItemCategory::LightMeal, 2)),
    ("White Bread", ItemProfile::new(ItemCategory::Bakery, 4)),
    ("Croissants", ItemProfile::new(ItemCategory::Pastry, 4)),
    ("Donuts", ItemProfile::new(ItemCategory::Dessert, 3)),
    ("Cake Slice", ItemProfile::new(ItemCategory::Dessert, 5)),
    ("Cookies", ItemProfile::new(ItemCategory::Dessert, 2)),
];

const BEVERAGE_WORDS: &[&str] = &["coffee", "tea", "juice", "smoothie", "latte", "espresso", "drink"];
const BREAD_WORDS: &[&str] = &["bread", "loaf"];
const DESSERT_WORDS: &[&str] = &["cake", "donut", "cookie", "muffin", "pastry", "pie"];
const LIGHT_MEAL_WORDS: &[&str] = &["sandwich", "wrap", "roll"];

/// Look up a catalogued item by exact (case-sensitive) name
pub fn catalogue_profile(item_name: &str) -> Option<ItemProfile> {
    ITEM_CATALOGUE
        .iter()
        .find(|(name, _)| *name == item_name)
        .map(|(_, profile)| *profile)
}

/// Guess the profile of an item that is not in the catalogue.
///
/// Shelf life and price give a first guess; keywords in the item name win
/// over it.
pub fn guess_item_profile(item_name: &str, price: f64, shelf_life_hours: f64) -> ItemProfile {
    let mut profile = if shelf_life_hours < 2.0 {
        ItemProfile::new(ItemCategory::Beverage, 1)
    } else if shelf_life_hours > 24.0 {
        ItemProfile::new(ItemCategory::Bakery, 3)
    } else if shelf_life_hours > 12.0 {
        ItemProfile::new(ItemCategory::Dessert, 3)
    } else if price < 25.0 {
        ItemProfile::new(ItemCategory::SideDish, 1)
    } else {
        ItemProfile::new(ItemCategory::MainMeal, 2)
    };

    let name = item_name.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| name.contains(w));
    if mentions(BEVERAGE_WORDS) {
        profile = ItemProfile::new(ItemCategory::Beverage, 1);
    } else if mentions(BREAD_WORDS) {
        profile = ItemProfile::new(ItemCategory::Bakery, 4);
    } else if mentions(DESSERT_WORDS) {
        profile = ItemProfile::new(ItemCategory::Dessert, 3);
    } else if mentions(LIGHT_MEAL_WORDS) {
        profile = ItemProfile::new(ItemCategory::LightMeal, 2);
    }
    profile
}

/// Catalogue profile if known, otherwise a guessed one
pub fn item_profile(item_name: &str, price: f64, shelf_life_hours: f64) -> ItemProfile {
    catalogue_profile(item_name)
        .unwrap_or_else(|| guess_item_profile(item_name, price, shelf_life_hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_item_uses_catalogue() {
        let profile = item_profile("Cake Slice", 10.0, 1.0);
        assert_eq!(profile.category, ItemCategory::Dessert);
        assert_eq!(profile.preparation_complexity, 5);
    }

    #[test]
    fn catalogue_lookup_is_case_sensitive() {
        assert!(catalogue_profile("latte").is_none());
        assert!(catalogue_profile("Latte").is_some());
    }

    #[test]
    fn guess_by_shelf_life_and_price() {
        assert_eq!(guess_item_profile("Fufu", 45.0, 1.0).category, ItemCategory::Beverage);
        assert_eq!(guess_item_profile("Fufu", 45.0, 48.0).category, ItemCategory::Bakery);
        assert_eq!(guess_item_profile("Fufu", 45.0, 18.0).category, ItemCategory::Dessert);
        assert_eq!(guess_item_profile("Fufu", 10.0, 4.0).category, ItemCategory::SideDish);
        assert_eq!(guess_item_profile("Fufu", 45.0, 3.0).category, ItemCategory::MainMeal);
    }

    #[test]
    fn name_keywords_override_shelf_life() {
        let profile = guess_item_profile("Banana Bread", 30.0, 1.0);
        assert_eq!(profile.category, ItemCategory::Bakery);
        assert_eq!(profile.preparation_complexity, 4);

        let profile = guess_item_profile("Iced Tea", 30.0, 48.0);
        assert_eq!(profile.category, ItemCategory::Beverage);

        let profile = guess_item_profile("Chicken Wrap", 30.0, 4.0);
        assert_eq!(profile.category, ItemCategory::LightMeal);
    }
}
