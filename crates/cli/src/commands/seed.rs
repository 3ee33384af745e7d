//! Seed the database with a small demo catalog.
//!
//! Writes go through the catalog service with an administrator principal, so
//! the usual validation and authorization apply. Re-running is safe: a
//! category whose business key already exists is skipped along with its
//! products.

use shophub_core::catalog::{CategoryInput, ProductInput};
use shophub_core::{Price, WorkflowError};

use super::{CliError, connect, services};

struct DemoCategory {
    category_id: &'static str,
    name: &'static str,
    products: &'static [DemoProduct],
}

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    cost_cents: i64,
    sell_cents: i64,
    stock_qty: u32,
}

const DEMO_CATALOG: &[DemoCategory] = &[
    DemoCategory {
        category_id: "gadgets",
        name: "Gadgets",
        products: &[
            DemoProduct {
                name: "Widget",
                description: "The original widget.",
                cost_cents: 1200,
                sell_cents: 1999,
                stock_qty: 50,
            },
            DemoProduct {
                name: "Gizmo",
                description: "A widget with extra gears.",
                cost_cents: 3000,
                sell_cents: 4999,
                stock_qty: 20,
            },
        ],
    },
    DemoCategory {
        category_id: "garden",
        name: "Garden",
        products: &[
            DemoProduct {
                name: "Trowel",
                description: "Stainless steel hand trowel.",
                cost_cents: 450,
                sell_cents: 899,
                stock_qty: 100,
            },
            DemoProduct {
                name: "Watering Can",
                description: "Five litre galvanised can.",
                cost_cents: 1500,
                sell_cents: 2750,
                stock_qty: 15,
            },
        ],
    },
    DemoCategory {
        category_id: "books",
        name: "Books",
        products: &[DemoProduct {
            name: "Field Guide to Widgets",
            description: "Everything about widgets, illustrated.",
            cost_cents: 800,
            sell_cents: 1500,
            stock_qty: 30,
        }],
    },
];

/// Load [`DEMO_CATALOG`], authorizing as the given administrator.
///
/// # Errors
///
/// Returns `Workflow(InvalidCredentials)` for bad credentials,
/// `Workflow(Forbidden)` if the account is not an administrator, and database
/// errors otherwise.
pub async fn demo_catalog(email: &str, password: &str) -> Result<(), CliError> {
    let pool = connect().await?;
    let services = services(pool);

    let admin = services.accounts.authenticate(email, password).await?.principal();
    admin.require_admin("seeding the catalog")?;

    let mut categories = 0_usize;
    let mut products = 0_usize;

    for demo in DEMO_CATALOG {
        let input = CategoryInput {
            category_id: demo.category_id.to_owned(),
            name: demo.name.to_owned(),
            active: true,
        };
        match services.catalog.create_category(&admin, input).await {
            Ok(_) => categories += 1,
            Err(WorkflowError::Duplicate(_)) => {
                tracing::info!(category_id = demo.category_id, "Category exists, skipping");
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        for product in demo.products {
            services
                .catalog
                .create_product(&admin, product_input(demo.category_id, product))
                .await?;
            products += 1;
        }
    }

    tracing::info!("Seeding complete!");
    tracing::info!("  Categories created: {}", categories);
    tracing::info!("  Products created: {}", products);
    Ok(())
}

fn product_input(category_id: &str, product: &DemoProduct) -> ProductInput {
    ProductInput {
        category_id: category_id.to_owned(),
        name: product.name.to_owned(),
        description: product.description.to_owned(),
        cost_price: Price::from_cents(product.cost_cents),
        sell_price: Price::from_cents(product.sell_cents),
        stock_qty: product.stock_qty,
        image_url: String::new(),
        active: true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_demo_category_ids_are_unique() {
        let ids: HashSet<_> = DEMO_CATALOG.iter().map(|c| c.category_id).collect();
        assert_eq!(ids.len(), DEMO_CATALOG.len());
    }

    #[test]
    fn test_demo_products_sell_above_cost() {
        for category in DEMO_CATALOG {
            for product in category.products {
                assert!(product.sell_cents > product.cost_cents, "{}", product.name);
            }
        }
    }

    #[test]
    fn test_product_input_passes_validation() {
        for category in DEMO_CATALOG {
            for product in category.products {
                assert!(product_input(category.category_id, product).normalized().is_ok());
            }
        }
    }
}
