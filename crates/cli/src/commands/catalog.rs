//! Catalog listing.

#![allow(clippy::print_stdout)]

use super::{CommandError, Context};

/// Print the catalog, optionally bypassing the cache or limiting to
/// festival specials.
pub async fn list(ctx: &Context, refresh: bool, festival: bool) -> Result<(), CommandError> {
    let catalog = if refresh {
        ctx.client.refresh_catalog().await?
    } else {
        ctx.client.catalog().await?
    };

    let products = catalog.iter().filter(|p| !festival || p.is_festival());
    let mut shown = 0usize;
    for product in products {
        let stock = if product.is_out_of_stock() {
            "  (out of stock)"
        } else {
            ""
        };
        println!(
            "{:<26} {:<12} {:>10} / {:<5}{}  [{}]",
            product.name,
            product.category,
            product.rate.to_string(),
            product.unit.as_str(),
            stock,
            product.id
        );
        shown += 1;
    }

    if shown == 0 {
        println!("No products found.");
    }
    Ok(())
}
