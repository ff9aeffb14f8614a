//! Cart commands. Every change is saved to the session file.

#![allow(clippy::print_stdout)]

use rust_decimal::Decimal;
use sweetshop_core::{Cart, WeightUnit};
use tracing::warn;

use super::{CommandError, Context, find_product, line_index};

/// Print the cart lines and total.
pub fn show(ctx: &Context) {
    print_cart(ctx.session.cart());
}

/// Print any cart with 1-based line numbers.
pub fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for (i, line) in cart.lines().iter().enumerate() {
        println!(
            "{:>2}. {:<26} {:>12} x {:>10} = {:>10}",
            i + 1,
            line.product.name,
            line.quantity.to_string(),
            line.product.rate.to_string(),
            line.total().to_string()
        );
    }
    println!("    {} item(s), total {}", cart.item_count(), cart.total());
}

/// Add a catalog product. `amount` is pieces or kilograms.
pub async fn add(ctx: &mut Context, query: &str, amount: Decimal) -> Result<(), CommandError> {
    let catalog = ctx.client.catalog().await?;
    let product = find_product(&catalog, query)?.clone();
    if product.is_out_of_stock() {
        warn!(product = %product.name, "Adding a product that is out of stock");
    }

    ctx.session
        .update_cart(|cart| cart.add(product, amount).map_err(CommandError::from))?;
    print_cart(ctx.session.cart());
    Ok(())
}

/// Type a quantity into a line and leave the field.
pub fn set(ctx: &mut Context, line: usize, text: &str) -> Result<(), CommandError> {
    let index = line_index(line)?;
    ctx.session.update_cart(|cart| {
        let before = cart.len();
        cart.set_input(index, text)?;
        // A piece line set to zero is gone; nothing left to commit.
        if cart.len() == before {
            cart.commit_input(index)?;
        }
        Ok::<_, CommandError>(())
    })?;
    print_cart(ctx.session.cart());
    Ok(())
}

/// Switch a weight line's unit.
pub fn unit(ctx: &mut Context, line: usize, unit: WeightUnit) -> Result<(), CommandError> {
    let index = line_index(line)?;
    ctx.session
        .update_cart(|cart| cart.update_weight_unit(index, unit).map_err(CommandError::from))?;
    print_cart(ctx.session.cart());
    Ok(())
}

/// Press `+` or `-` on a line.
pub fn step(ctx: &mut Context, line: usize, up: bool) -> Result<(), CommandError> {
    let index = line_index(line)?;
    ctx.session.update_cart(|cart| {
        if up {
            cart.increment(index)?;
        } else {
            cart.decrement(index)?;
        }
        Ok::<_, CommandError>(())
    })?;
    print_cart(ctx.session.cart());
    Ok(())
}

/// Remove a line.
pub fn remove(ctx: &mut Context, line: usize) -> Result<(), CommandError> {
    let index = line_index(line)?;
    let removed = ctx
        .session
        .update_cart(|cart| cart.remove(index).map_err(CommandError::from))?;
    println!("Removed {}", removed.product.name);
    print_cart(ctx.session.cart());
    Ok(())
}

/// Empty the cart.
pub fn clear(ctx: &mut Context) -> Result<(), CommandError> {
    ctx.session.clear_cart()?;
    println!("Cart cleared.");
    Ok(())
}
