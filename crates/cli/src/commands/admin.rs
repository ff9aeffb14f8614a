//! Admin console commands.
//!
//! Every command except `login` needs an admin session. Orders are fetched
//! fresh for each command; the ledger is patched with what the API returns.
//!
//! # Usage
//!
//! ```bash
//! sweetshop admin login -n Meena
//! sweetshop admin orders --status delivered --outstanding
//! sweetshop admin edit 65f1c2 --item 1=750 --remove-item 2 --pay 150
//! sweetshop admin summary --local
//! ```

#![allow(clippy::print_stdout)]

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sweetshop_client::place_manual_order;
use sweetshop_core::{
    Cart, DailySummary, LedgerFilter, LedgerSort, Money, Order, OrderEditor, OrderId, OrderLedger,
    OrderStatus, ProductDraft, ProductId, SortDirection, SortKey, StatusFilter, summarize,
};
use tracing::info;

use super::cart::print_cart;
use super::order::checked_form;
use super::{CommandError, Context, find_product, line_index, product_amount, split_pair};
use crate::{CustomerArgs, ProductArgs};

/// Filters and sort order for `admin orders`.
pub struct OrdersQuery {
    pub status: StatusFilter,
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
    pub outstanding: bool,
    pub by_delivery: bool,
    pub ascending: bool,
}

/// Changes requested by `admin edit`.
pub struct EditChanges {
    pub delivery: Option<NaiveDate>,
    pub pay: Option<Decimal>,
    pub items: Vec<String>,
    pub remove_items: Vec<usize>,
    pub add_items: Vec<String>,
}

fn require_admin(ctx: &Context) -> Result<String, CommandError> {
    Ok(ctx.session.session().require_admin()?.to_string())
}

async fn load_ledger(ctx: &Context) -> Result<OrderLedger, CommandError> {
    let mut ledger = OrderLedger::default();
    ctx.client.refresh_ledger(&mut ledger).await?;
    Ok(ledger)
}

/// Sort on `key` in `direction`, the way clicking a header gets there.
fn ledger_sort(key: SortKey, direction: SortDirection) -> LedgerSort {
    let mut sort = LedgerSort::default();
    sort.toggle(key);
    if sort.direction(key) != direction {
        sort.toggle(key);
    }
    sort
}

fn print_order(order: &Order) {
    let delivery = order
        .delivery_date
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    println!(
        "{}  {:<20} {:<10}  placed {}  deliver {}  {:<10}  total {}  paid {}  due {}",
        order.id,
        order.customer_name,
        order.mobile,
        order.order_date,
        delivery,
        order.status.as_str(),
        order.total,
        order.advance_paid,
        order.balance()
    );
    for item in &order.items {
        println!(
            "      {} {} {}  {}",
            item.sweet_name,
            item.quantity.normalize(),
            item.unit,
            item.price
        );
    }
    if let Some(admin) = &order.placed_by_admin {
        println!("      placed by {admin}");
    }
}

fn print_summary(summary: &DailySummary) {
    println!("Summary for {}", summary.date);
    println!(
        "  orders {}  revenue {}  collected {}  outstanding {}",
        summary.order_count, summary.revenue, summary.collected, summary.outstanding
    );
    let counts = &summary.by_status;
    println!(
        "  pending {}  processing {}  delivered {}  cancelled {}",
        counts.pending, counts.processing, counts.delivered, counts.cancelled
    );
    for tally in &summary.sweets {
        println!(
            "  {:<26} {} {}",
            tally.sweet_name,
            tally.quantity.normalize(),
            tally.unit
        );
    }
}

/// Start an admin session.
pub fn login(ctx: &mut Context, name: &str) -> Result<(), CommandError> {
    ctx.session.login(name)?;
    let name = require_admin(ctx)?;
    info!(admin = %name, "Admin logged in");
    println!("Logged in as {name}.");
    Ok(())
}

/// End the admin session.
pub fn logout(ctx: &mut Context) -> Result<(), CommandError> {
    ctx.session.logout()?;
    println!("Logged out.");
    Ok(())
}

/// List orders matching `query`.
pub async fn orders(ctx: &Context, query: &OrdersQuery) -> Result<(), CommandError> {
    require_admin(ctx)?;
    let ledger = load_ledger(ctx).await?;

    let mut filter = LedgerFilter::default().with_status(query.status);
    if let Some(day) = query.date {
        filter = filter.on(day);
    }
    if let Some(needle) = &query.search {
        filter = filter.search(needle.as_str());
    }
    if query.outstanding {
        filter = filter.outstanding();
    }

    let key = if query.by_delivery {
        SortKey::DeliveryDate
    } else {
        SortKey::OrderDate
    };
    let direction = if query.ascending {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    };

    let rows = ledger.view(&filter, &ledger_sort(key, direction));
    if rows.is_empty() {
        println!("No orders found.");
    }
    for order in &rows {
        print_order(order);
    }
    Ok(())
}

/// Move an order to a new status.
pub async fn status(ctx: &Context, id: &str, next: OrderStatus) -> Result<(), CommandError> {
    require_admin(ctx)?;
    let mut ledger = load_ledger(ctx).await?;
    let order = ctx
        .client
        .update_status(&mut ledger, &OrderId::new(id), next)
        .await?;
    print_order(&order);
    Ok(())
}

/// Edit an order's delivery date, payment or items.
pub async fn edit(ctx: &Context, id: &str, changes: &EditChanges) -> Result<(), CommandError> {
    require_admin(ctx)?;
    let mut ledger = load_ledger(ctx).await?;
    let order = ledger
        .get(&OrderId::new(id))
        .cloned()
        .ok_or_else(|| sweetshop_client::AdminError::UnknownOrder(OrderId::new(id)))?;
    let mut editor = OrderEditor::new(order)?;

    if let Some(date) = changes.delivery {
        editor.set_delivery_date(date);
    }

    let touches_items = !changes.items.is_empty()
        || !changes.remove_items.is_empty()
        || !changes.add_items.is_empty();
    if touches_items {
        let catalog = ctx.client.catalog().await?;
        let cart = editor.items_mut(&catalog);
        apply_item_changes(cart, &catalog, changes)?;
        print_cart(cart);
    }

    // Payment last, so it is checked against the edited total.
    if let Some(pay) = changes.pay {
        let advance = editor.apply_top_up(Money::new(pay))?;
        println!("Advance now {advance}, balance {}", editor.balance());
    }

    let order = ctx.client.save_edit(&mut ledger, &editor).await?;
    print_order(&order);
    Ok(())
}

fn apply_item_changes(
    cart: &mut Cart,
    catalog: &[sweetshop_core::Product],
    changes: &EditChanges,
) -> Result<(), CommandError> {
    for arg in &changes.items {
        let (line, text) = split_pair(arg)?;
        let line: usize = line
            .parse()
            .map_err(|_| CommandError::InvalidArgument(format!("'{line}' is not a line number")))?;
        let index = line_index(line)?;
        let before = cart.len();
        cart.set_input(index, text)?;
        if cart.len() == before {
            cart.commit_input(index)?;
        }
    }

    // Highest line first so earlier removals do not shift later ones.
    let mut removals = changes
        .remove_items
        .iter()
        .map(|&line| line_index(line))
        .collect::<Result<Vec<_>, _>>()?;
    removals.sort_unstable_by(|a, b| b.cmp(a));
    removals.dedup();
    for index in removals {
        cart.remove(index)?;
    }

    for arg in &changes.add_items {
        let (query, amount) = product_amount(arg)?;
        let product = find_product(catalog, query)?;
        cart.add(product.clone(), amount)?;
    }
    Ok(())
}

/// Print the sales summary for a day, from the server or computed locally.
pub async fn summary(ctx: &Context, date: Option<NaiveDate>, local: bool) -> Result<(), CommandError> {
    require_admin(ctx)?;
    let day = match date {
        Some(day) => day,
        None => ctx.client.server_date().await?,
    };

    let summary = if local {
        let orders = ctx.client.orders().await?;
        summarize(&orders, day)
    } else {
        ctx.client.daily_summary(day).await?
    };
    print_summary(&summary);
    Ok(())
}

/// Save the PDF statement for a date range.
pub async fn statement(
    ctx: &Context,
    from: NaiveDate,
    to: NaiveDate,
    out: &Path,
) -> Result<(), CommandError> {
    require_admin(ctx)?;
    let pdf = ctx.client.statement(from, to).await?;
    tokio::fs::write(out, &pdf).await?;
    println!("Saved statement ({} bytes) to {}", pdf.len(), out.display());
    Ok(())
}

fn product_draft(args: &ProductArgs) -> ProductDraft {
    ProductDraft {
        name: args.name.trim().to_string(),
        category: args.category.trim().to_string(),
        rate: Money::new(args.rate),
        unit: args.unit,
        image: args.image.clone().filter(|url| !url.trim().is_empty()),
        is_festival: args.festival,
        stock: args.stock,
    }
}

/// Add a product to the catalog.
pub async fn add_product(ctx: &Context, args: &ProductArgs) -> Result<(), CommandError> {
    require_admin(ctx)?;
    let product = ctx.client.add_product(&product_draft(args)).await?;
    println!("Added {} [{}]", product.name, product.id);
    Ok(())
}

/// Replace a product's details.
pub async fn update_product(ctx: &Context, id: &str, args: &ProductArgs) -> Result<(), CommandError> {
    require_admin(ctx)?;
    let product = ctx
        .client
        .update_product(&ProductId::new(id), &product_draft(args))
        .await?;
    println!("Updated {} [{}]", product.name, product.id);
    Ok(())
}

/// Delete a product.
pub async fn remove_product(ctx: &Context, id: &str) -> Result<(), CommandError> {
    require_admin(ctx)?;
    ctx.client.remove_product(&ProductId::new(id)).await?;
    println!("Removed product {id}");
    Ok(())
}

/// Place an order for a customer from catalog items.
pub async fn place_order(
    ctx: &Context,
    customer: &CustomerArgs,
    items: &[String],
) -> Result<(), CommandError> {
    require_admin(ctx)?;
    let catalog = ctx.client.catalog().await?;

    let mut cart = Cart::new();
    for arg in items {
        let (query, amount) = product_amount(arg)?;
        let product = find_product(&catalog, query)?;
        cart.add(product.clone(), amount)?;
    }
    print_cart(&cart);

    let form = checked_form(&ctx.client, customer).await?;
    let placed = place_manual_order(&ctx.client, ctx.session.session(), &cart, &form).await?;
    match placed.id {
        Some(id) => println!("Order {id} placed for {}.", customer.name),
        None => println!("Order placed for {}.", customer.name),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_sort_reaches_any_direction() {
        let sort = ledger_sort(SortKey::DeliveryDate, SortDirection::Descending);
        assert_eq!(sort.active(), SortKey::DeliveryDate);
        assert_eq!(sort.direction(SortKey::DeliveryDate), SortDirection::Descending);

        let sort = ledger_sort(SortKey::OrderDate, SortDirection::Ascending);
        assert_eq!(sort.active(), SortKey::OrderDate);
        assert_eq!(sort.direction(SortKey::OrderDate), SortDirection::Ascending);
    }
}
