//! # Commands
//!
//! One function per subcommand. Each builds what it needs from the loaded
//! config and hands the work to the desk.
//!
//! ## Sell Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  order.toml ──► add_product × n ──► discount ──► customer ──► payment  │
//! │                                                                         │
//! │                        print totals ──► submit()                        │
//! │                                           │                             │
//! │           ┌───────────────────────────────┼──────────────────┐          │
//! │           ▼                               ▼                  ▼          │
//! │      Completed                      NeedsOverride          Failed       │
//! │   print sale id           print message + typical range    exit 1       │
//! │                           "Resubmit with override? [y/N]"               │
//! │                              y ──► override_warning()                   │
//! │                              n ──► abandon_warning()                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use stockdesk_client::{ApiClient, ClientConfig, DeskOutcome, ReadCache, SaleDesk, Session};
use stockdesk_core::{visible_sections, CartTotals, Role};
use tracing::{debug, info};

use crate::order::{OrderDiscount, OrderFile};

pub type CommandResult = Result<(), Box<dyn Error>>;

fn open_desk(config: &ClientConfig) -> Result<SaleDesk<ApiClient, ApiClient>, Box<dyn Error>> {
    let api = ApiClient::new(config)?;
    let session = Session::from_config(config)?;
    if !session.is_authenticated() {
        debug!("No API token configured, requests go out unauthenticated");
    }

    let desk = SaleDesk::new(api.clone(), api, session, ReadCache::new(config.cache_ttl()))?
        .with_low_stock_threshold(config.stock.low_stock_threshold);
    Ok(desk)
}

// =============================================================================
// sell
// =============================================================================

pub async fn sell(config: &ClientConfig, order_path: &Path, assume_yes: bool) -> CommandResult {
    let order = OrderFile::load(order_path)?;
    info!(path = ?order_path, items = order.items.len(), "Loaded order");

    let display = &config.display;
    let mut desk = open_desk(config)?;

    for item in &order.items {
        let added = desk.add_product(&item.product_id, item.quantity).await?;
        println!(
            "  + {:<30} x{:<4} @ {:>12}   [{}]",
            added.product.name,
            item.quantity,
            display.format_currency(added.product.unit_price),
            added.stock_level
        );
    }

    match order.discount {
        Some(OrderDiscount::Amount(amount)) => {
            desk.set_discount_amount(amount)?;
        }
        Some(OrderDiscount::Percent(percent)) => {
            desk.set_discount_percent(percent)?;
        }
        None => {}
    }

    desk.choose_payment(order.payment)?;
    if let Some(customer) = &order.customer {
        if let Some(view) = desk.select_customer(Some(customer.clone())).await? {
            println!(
                "  Customer: {} (available credit {})",
                view.name,
                display.format_currency(view.available_credit())
            );
        }
    }
    if let Some(upfront) = order.upfront {
        desk.set_upfront_payment(upfront)?;
    }

    print_totals(&desk.totals(), config);
    println!("  Payment:  {}", order.payment);

    let mut outcome = desk.submit().await?;
    loop {
        match outcome {
            DeskOutcome::Completed(receipt) => {
                match receipt.id {
                    Some(id) => println!("Sale {} recorded.", id),
                    None => println!("Sale recorded. The server did not return a receipt."),
                }
                return Ok(());
            }
            DeskOutcome::NeedsOverride(warning) => {
                println!();
                println!("Warning: {}", warning.message);
                if let Some(range) = warning.typical_range {
                    println!("Typical price range: {}", range);
                }

                if assume_yes || confirm("Resubmit with override? [y/N] ")? {
                    outcome = desk.override_warning().await?;
                } else {
                    desk.abandon_warning()?;
                    println!("Sale not submitted. Edit the order and try again.");
                    return Ok(());
                }
            }
            DeskOutcome::Failed(reason) => {
                for line in desk.cart().over_stock_lines() {
                    println!(
                        "  ! {} has {} in stock, order asks for {}",
                        line.label, line.available_stock, line.quantity
                    );
                }
                return Err(reason.to_string().into());
            }
        }
    }
}

fn print_totals(totals: &CartTotals, config: &ClientConfig) {
    let display = &config.display;
    println!();
    println!("  Items:    {} ({} units)", totals.item_count, totals.total_quantity);
    println!("  Subtotal: {:>12}", display.format_currency(totals.subtotal));
    println!(
        "  Discount: {:>12} ({}%)",
        display.format_currency(totals.discount_amount),
        totals.discount_percent
    );
    println!("  Total:    {:>12}", display.format_currency(totals.total));
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

// =============================================================================
// recent
// =============================================================================

pub async fn recent(config: &ClientConfig, limit: usize) -> CommandResult {
    let desk = open_desk(config)?;
    let sales = desk.recent_sales(limit).await?;

    if sales.is_empty() {
        println!("No sales yet.");
        return Ok(());
    }

    for sale in sales {
        let when = sale
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  #{:<8} {:>12}  {:<7} {:<20} {}",
            sale.id.as_str(),
            config.display.format_currency(sale.total_amount),
            format!("{:?}", sale.payment_status).to_lowercase(),
            sale.customer_name.as_deref().unwrap_or("-"),
            when
        );
    }
    Ok(())
}

// =============================================================================
// nav
// =============================================================================

pub fn nav(config: &ClientConfig, role: Option<Role>) -> CommandResult {
    let role = role.unwrap_or(config.session.role);
    println!("Sections for {}:", role);
    for section in visible_sections(role) {
        println!("  {}", section.title());
    }
    Ok(())
}

// =============================================================================
// config
// =============================================================================

pub fn config_show(config: &ClientConfig) -> CommandResult {
    let mut shown = config.clone();
    if shown.session.token.is_some() {
        shown.session.token = Some("********".to_string());
    }
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

pub fn config_init(config: &ClientConfig, path: Option<PathBuf>) -> CommandResult {
    let path = config.save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
