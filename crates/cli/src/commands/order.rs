//! Checkout and contact commands.

#![allow(clippy::print_stdout)]

use chrono::NaiveDate;
use sweetshop_client::{ApiClient, checkout};
use sweetshop_core::{ContactMessage, OrderForm};

use super::{CommandError, Context};
use crate::CustomerArgs;

/// Fill an order form from the command line, refusing a delivery date
/// before `server_today`.
pub fn order_form(customer: &CustomerArgs, server_today: NaiveDate) -> Result<OrderForm, CommandError> {
    let mut form = OrderForm::new();
    form.customer_name.clone_from(&customer.name);
    form.set_mobile(&customer.mobile);
    form.address.clone_from(&customer.address);
    form.preference.clone_from(&customer.preference);
    form.set_delivery_date(customer.delivery, server_today)?;
    Ok(form)
}

/// Fill an order form, checking the delivery date against the server's today.
pub async fn checked_form(
    client: &ApiClient,
    customer: &CustomerArgs,
) -> Result<OrderForm, CommandError> {
    let today = client.server_date().await?;
    order_form(customer, today)
}

/// Place the session cart as an order.
pub async fn place(ctx: &mut Context, customer: &CustomerArgs) -> Result<(), CommandError> {
    ctx.session
        .cart()
        .validate_for_checkout()
        .map_err(sweetshop_core::OrderError::from)?;

    let form = checked_form(&ctx.client, customer).await?;
    let total = ctx.session.cart().total();
    let placed = checkout(&ctx.client, &mut ctx.session, &form).await?;

    match placed.id {
        Some(id) => println!("Order {id} placed. Total {total}."),
        None => println!("Order placed. Total {total}."),
    }
    if let Some(message) = placed.message {
        println!("{message}");
    }
    Ok(())
}

/// Send a contact message.
pub async fn contact(
    ctx: &Context,
    name: &str,
    email: Option<&str>,
    mobile: Option<&str>,
    message: &str,
) -> Result<(), CommandError> {
    let message = ContactMessage::new(name, email, mobile, message)?;
    ctx.client.submit_contact(&message).await?;
    println!("Thank you, we will get back to you soon.");
    Ok(())
}
