//! Categories, products, and the filtered catalog projection.
//!
//! [`CatalogIndex`] is a read-only view over a snapshot of categories and
//! products. It never touches storage; services load the rows and hand them
//! over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{CategoryKey, Price, ProductKey};

const fn default_true() -> bool {
    true
}

/// A product category.
///
/// `category_id` is the business key chosen by the administrator; `key` is
/// the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: CategoryKey,
    pub category_id: String,
    pub name: String,
    pub active: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Shown to customers.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.active && !self.deleted
    }
}

/// Admin input for creating or editing a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub category_id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl CategoryInput {
    /// Trim fields and check required ones.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for a blank business key or name.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let category_id = self.category_id.trim().to_owned();
        let name = self.name.trim().to_owned();
        if category_id.is_empty() {
            return Err(ValidationError::missing("category_id"));
        }
        if name.is_empty() {
            return Err(ValidationError::missing("name"));
        }
        Ok(Self {
            category_id,
            name,
            active: self.active,
        })
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub key: ProductKey,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub cost_price: Price,
    pub sell_price: Price,
    pub stock_qty: u32,
    pub image_url: String,
    pub active: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Can be put in a cart or ordered.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.active && !self.deleted
    }
}

/// Admin input for creating or editing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost_price: Price,
    pub sell_price: Price,
    #[serde(default)]
    pub stock_qty: u32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl ProductInput {
    /// Trim text fields and check required ones.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank category or name, or a
    /// negative price or one too large for the price columns. Prices are
    /// rounded to cents.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let category_id = self.category_id.trim().to_owned();
        let name = self.name.trim().to_owned();
        if category_id.is_empty() {
            return Err(ValidationError::missing("category_id"));
        }
        if name.is_empty() {
            return Err(ValidationError::missing("name"));
        }
        if self.cost_price.is_negative() || self.sell_price.is_negative() {
            return Err(ValidationError::Invalid(
                "prices cannot be negative".to_owned(),
            ));
        }
        let cost_price = self.cost_price.to_cents_precision();
        let sell_price = self.sell_price.to_cents_precision();
        if !cost_price.fits_column() || !sell_price.fits_column() {
            return Err(ValidationError::Invalid(format!(
                "prices cannot exceed {}",
                Price::MAX_STORABLE
            )));
        }
        Ok(Self {
            category_id,
            name,
            cost_price,
            sell_price,
            description: self.description.trim().to_owned(),
            image_url: self.image_url.trim().to_owned(),
            ..self
        })
    }
}

/// Who the listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only purchasable products in visible (or unknown) categories.
    Customer,
    /// Every stored row, soft-deleted included.
    Admin,
}

/// Sell-price bands offered as a catalog filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBand {
    #[default]
    All,
    /// Below 1000.
    Low,
    /// 1000 to 5000 inclusive.
    Mid,
    /// Above 5000.
    High,
}

impl PriceBand {
    #[must_use]
    pub fn contains(&self, price: Price) -> bool {
        let low = Price::new(1000.into());
        let high = Price::new(5000.into());
        match self {
            Self::All => true,
            Self::Low => price < low,
            Self::Mid => price >= low && price <= high,
            Self::High => price > high,
        }
    }
}

impl std::str::FromStr for PriceBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(Self::All),
            "low" => Ok(Self::Low),
            "mid" => Ok(Self::Mid),
            "high" => Ok(Self::High),
            other => Err(format!("invalid price band: {other}")),
        }
    }
}

/// Category selector for product listings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact match on the business key.
    Only(String),
}

impl CategoryFilter {
    /// Interpret a query-string value; blank and `all` select everything.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("" | "all") => Self::All,
            Some(id) => Self::Only(id.to_owned()),
        }
    }

    fn matches(&self, category_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSort {
    /// Storage order.
    #[default]
    Unspecified,
    /// Creation time, most recent first.
    Newest,
}

/// Conjunctive product filter.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub category: CategoryFilter,
    pub search: Option<String>,
    pub price: PriceBand,
    pub sort: CatalogSort,
}

impl CatalogFilter {
    #[must_use]
    pub fn newest() -> Self {
        Self {
            sort: CatalogSort::Newest,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub const fn with_price(mut self, price: PriceBand) -> Self {
        self.price = price;
        self
    }

    fn matches(&self, product: &Product) -> bool {
        self.category.matches(&product.category_id)
            && self.price.contains(product.sell_price)
            && self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|needle| !needle.is_empty())
                .is_none_or(|needle| contains_ignore_case(&product.name, needle))
    }
}

/// Active/inactive selector for the category manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityFilter {
    #[default]
    All,
    Active,
    Inactive,
}

/// Category listing query: substring search on the business key plus status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: ActivityFilter,
}

impl CategoryQuery {
    fn matches(&self, category: &Category) -> bool {
        let status_ok = match self.status {
            ActivityFilter::All => true,
            ActivityFilter::Active => category.is_visible(),
            ActivityFilter::Inactive => !category.is_visible(),
        };
        status_ok
            && self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|needle| !needle.is_empty())
                .is_none_or(|needle| contains_ignore_case(&category.category_id, needle))
    }
}

/// A product with its category label joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
}

impl ProductListing {
    /// Customer-facing projection; the cost price is dropped.
    #[must_use]
    pub fn customer_view(&self) -> ProductSummary {
        ProductSummary {
            key: self.product.key,
            category_id: self.product.category_id.clone(),
            category_name: self.category_name.clone(),
            name: self.product.name.clone(),
            description: self.product.description.clone(),
            sell_price: self.product.sell_price,
            stock_qty: self.product.stock_qty,
            image_url: self.product.image_url.clone(),
            created_at: self.product.created_at,
        }
    }
}

/// What customers see of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub key: ProductKey,
    pub category_id: String,
    pub category_name: String,
    pub name: String,
    pub description: String,
    pub sell_price: Price,
    pub stock_qty: u32,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Read-only projection over a catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    categories: Vec<Category>,
    products: Vec<Product>,
}

impl CatalogIndex {
    #[must_use]
    pub const fn new(categories: Vec<Category>, products: Vec<Product>) -> Self {
        Self {
            categories,
            products,
        }
    }

    /// Products matching `filter`, labelled with their category name.
    #[must_use]
    pub fn list(&self, filter: &CatalogFilter, audience: Audience) -> Vec<ProductListing> {
        let mut listings: Vec<ProductListing> = self
            .products
            .iter()
            .filter(|product| audience == Audience::Admin || self.customer_can_see(product))
            .filter(|product| filter.matches(product))
            .map(|product| ProductListing {
                product: product.clone(),
                category_name: self.category_name(&product.category_id).to_owned(),
            })
            .collect();

        if filter.sort == CatalogSort::Newest {
            listings.sort_by(|a, b| b.product.created_at.cmp(&a.product.created_at));
        }
        listings
    }

    /// Categories matching `query`. Customers only ever see visible ones.
    #[must_use]
    pub fn categories(&self, query: &CategoryQuery, audience: Audience) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|category| audience == Audience::Admin || category.is_visible())
            .filter(|category| query.matches(category))
            .cloned()
            .collect()
    }

    /// Display name for a business key; empty when no category carries it.
    ///
    /// Visible categories win over hidden ones sharing the same key.
    #[must_use]
    pub fn category_name(&self, category_id: &str) -> &str {
        let mut matching = self
            .categories
            .iter()
            .filter(|category| category.category_id == category_id);
        let first = matching.clone().next();
        matching
            .find(|category| category.is_visible())
            .or(first)
            .map_or("", |category| category.name.as_str())
    }

    #[must_use]
    pub fn find_product(&self, key: ProductKey) -> Option<&Product> {
        self.products.iter().find(|product| product.key == key)
    }

    /// A single product as a customer would see it, if they may.
    #[must_use]
    pub fn customer_product(&self, key: ProductKey) -> Option<ProductListing> {
        self.find_product(key)
            .filter(|product| self.customer_can_see(product))
            .map(|product| ProductListing {
                product: product.clone(),
                category_name: self.category_name(&product.category_id).to_owned(),
            })
    }

    fn customer_can_see(&self, product: &Product) -> bool {
        if !product.is_purchasable() {
            return false;
        }
        let mut matching = self
            .categories
            .iter()
            .filter(|category| category.category_id == product.category_id)
            .peekable();
        // A product pointing at an unknown category stays listed.
        matching.peek().is_none() || matching.any(Category::is_visible)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, Utc};

    use super::*;

    pub fn category(category_id: &str, name: &str) -> Category {
        let now = Utc::now();
        Category {
            key: CategoryKey::generate(),
            category_id: category_id.to_owned(),
            name: name.to_owned(),
            active: true,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// A product created `age_minutes` ago.
    pub fn product(category_id: &str, name: &str, cents: i64, age_minutes: i64) -> Product {
        let created = Utc::now() - Duration::minutes(age_minutes);
        Product {
            key: ProductKey::generate(),
            category_id: category_id.to_owned(),
            name: name.to_owned(),
            description: String::new(),
            cost_price: Price::from_cents(cents / 2),
            sell_price: Price::from_cents(cents),
            stock_qty: 10,
            image_url: String::new(),
            active: true,
            deleted: false,
            created_at: created,
            updated_at: created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{category, product};
    use super::*;

    fn names(listings: &[ProductListing]) -> Vec<&str> {
        listings.iter().map(|l| l.product.name.as_str()).collect()
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let index = CatalogIndex::new(
            vec![category("tools", "Tools"), category("toys", "Toys")],
            vec![
                product("tools", "Big Hammer", 120_000, 3),
                product("tools", "Small Hammer", 50_000, 2),
                product("toys", "Hammer Toy", 50_000, 1),
            ],
        );

        let filter = CatalogFilter::default()
            .with_category(CategoryFilter::Only("tools".to_owned()))
            .with_search("HAMMER")
            .with_price(PriceBand::Low);
        assert_eq!(names(&index.list(&filter, Audience::Customer)), ["Small Hammer"]);
    }

    #[test]
    fn test_price_band_edges() {
        let at = |units: i64| Price::from_cents(units * 100);
        assert!(PriceBand::Low.contains(at(999)));
        assert!(!PriceBand::Low.contains(at(1000)));
        assert!(PriceBand::Mid.contains(at(1000)));
        assert!(PriceBand::Mid.contains(at(5000)));
        assert!(PriceBand::High.contains(at(5001)));
        assert!(!PriceBand::High.contains(at(5000)));
    }

    #[test]
    fn test_customer_hides_hidden_categories_and_products() {
        let mut hidden = category("hidden", "Hidden");
        hidden.active = false;
        let mut retired = product("tools", "Retired", 100, 1);
        retired.deleted = true;
        let index = CatalogIndex::new(
            vec![category("tools", "Tools"), hidden],
            vec![
                product("tools", "Wrench", 100, 4),
                product("hidden", "Secret", 100, 3),
                product("orphan", "Stray", 100, 2),
                retired,
            ],
        );

        let customer = index.list(&CatalogFilter::default(), Audience::Customer);
        assert_eq!(names(&customer), ["Wrench", "Stray"]);
        assert_eq!(customer[1].category_name, "");

        let admin = index.list(&CatalogFilter::default(), Audience::Admin);
        assert_eq!(admin.len(), 4);
        assert_eq!(admin[1].category_name, "Hidden");
    }

    #[test]
    fn test_newest_sort() {
        let index = CatalogIndex::new(
            vec![],
            vec![
                product("a", "Old", 100, 30),
                product("a", "New", 100, 1),
                product("a", "Mid", 100, 10),
            ],
        );
        let listed = index.list(&CatalogFilter::newest(), Audience::Customer);
        assert_eq!(names(&listed), ["New", "Mid", "Old"]);
    }

    #[test]
    fn test_customer_view_omits_cost() {
        let index = CatalogIndex::new(vec![], vec![product("a", "Widget", 1999, 1)]);
        let listing = &index.list(&CatalogFilter::default(), Audience::Customer)[0];
        let json = serde_json::to_value(listing.customer_view()).unwrap_or_default();
        assert!(json.get("cost_price").is_none());
        assert_eq!(json["sell_price"], "19.99");
    }

    #[test]
    fn test_category_query() {
        let mut inactive = category("garden-old", "Garden (old)");
        inactive.active = false;
        let index = CatalogIndex::new(
            vec![category("garden", "Garden"), inactive, category("kitchen", "Kitchen")],
            vec![],
        );

        let query = CategoryQuery {
            search: Some("GARD".to_owned()),
            status: ActivityFilter::Inactive,
        };
        let found = index.categories(&query, Audience::Admin);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category_id, "garden-old");

        assert_eq!(index.categories(&CategoryQuery::default(), Audience::Customer).len(), 2);
    }

    #[test]
    fn test_input_normalization() {
        let input = CategoryInput {
            category_id: "  ".to_owned(),
            name: "Tools".to_owned(),
            active: true,
        };
        assert_eq!(
            input.normalized().err(),
            Some(ValidationError::missing("category_id"))
        );
    }

    fn widget_input(cost_price: Price, sell_price: Price) -> ProductInput {
        ProductInput {
            category_id: "tools".to_owned(),
            name: "Widget".to_owned(),
            description: String::new(),
            cost_price,
            sell_price,
            stock_qty: 5,
            image_url: String::new(),
            active: true,
        }
    }

    #[test]
    fn test_product_input_rejects_prices_beyond_column_limit() {
        let huge = Price::new(rust_decimal::Decimal::MAX);
        let err = widget_input(Price::from_cents(1200), huge)
            .normalized()
            .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid(_)));

        let just_over = Price::MAX_STORABLE + Price::from_cents(1);
        assert!(widget_input(just_over, Price::from_cents(1999)).normalized().is_err());

        let at_limit = widget_input(Price::ZERO, Price::MAX_STORABLE).normalized().unwrap();
        assert_eq!(at_limit.sell_price, Price::MAX_STORABLE);
    }

    #[test]
    fn test_product_input_rounds_prices_to_cents() {
        let input = widget_input(
            Price::new(rust_decimal::Decimal::new(12_004, 3)),
            Price::new(rust_decimal::Decimal::new(19_999, 3)),
        )
        .normalized()
        .unwrap();
        assert_eq!(input.cost_price, Price::from_cents(1200));
        assert_eq!(input.sell_price, Price::from_cents(2000));
    }
}
