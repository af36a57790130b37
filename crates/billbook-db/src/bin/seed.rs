//! # Demo Book Generator
//!
//! Populates a database with a small, fully reconciled book for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database (billbook.toml or the platform default)
//! cargo run -p billbook-db --bin seed
//!
//! # Specify database path
//! cargo run -p billbook-db --bin seed -- --db ./data/billbook.db
//!
//! # Use a specific config file
//! cargo run -p billbook-db --bin seed -- --config ./billbook.toml
//! ```
//!
//! ## Generated Book
//! - Two customers and one supplier
//! - A stock purchase from the supplier
//! - Sales invoices to both customers across two months
//! - A receipt that settles the oldest invoices of one customer
//! - A processed sales return
//!
//! Every product is checked against its movement history at the end.

use std::env;
use std::path::PathBuf;

use billbook_core::{InvoiceItem, Money, PartyType, PaymentMode, Product, ReturnStatus, TaxRate, TransactionType};
use billbook_db::{
    BillingService, BookConfig, NewInvoice, NewParty, NewProduct, NewReturn, NewTransaction,
};
use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

/// Demo catalogue: (name, price in cents, cost in cents, opening stock, unit)
const CATALOGUE: &[(&str, i64, i64, i64, &str)] = &[
    ("Basmati Rice 5kg", 64_000, 52_000, 20, "bag"),
    ("Sunflower Oil 1L", 18_500, 15_200, 30, "btl"),
    ("Toor Dal 1kg", 16_000, 13_100, 12, "pkt"),
    ("Masala Tea 250g", 14_000, 10_500, 6, "pkt"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,billbook=debug,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Billbook Demo Book Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (overrides config)");
                println!("  -c, --config <PATH>   Config file (default: platform config dir)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = BookConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("Billbook Demo Book Generator");
    println!("============================");
    println!("Database:   {}", config.database.path.display());
    println!("Allocation: {:?}", config.billing.allocation_mode);
    println!();

    let service = BillingService::open(&config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = service.database().parties().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} parties", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Parties
    let asha = service.create_party(party("Asha Stores", PartyType::Customer)).await?;
    let bala = service.create_party(party("Bala Provisions", PartyType::Customer)).await?;
    let sharma = service.create_party(party("Sharma Wholesale", PartyType::Supplier)).await?;

    // Products
    let mut products = Vec::new();
    for (name, price, cost, stock, unit) in CATALOGUE {
        let product = service
            .create_product(NewProduct {
                name: name.to_string(),
                price: Money::from_cents(*price),
                cost_price: Money::from_cents(*cost),
                opening_stock: *stock,
                low_stock_alert: None,
                unit: unit.to_string(),
            })
            .await?;
        products.push(product);
    }
    println!("✓ Created 3 parties and {} products", products.len());

    // Restock from the supplier
    let purchase = service
        .create_invoice(invoice(&sharma.id, day(2, 3), vec![line(&products[0], 10, true), line(&products[3], 12, true)]))
        .await?;
    println!("  Purchase {} total {}", purchase.value.invoice_number, purchase.value.total);

    // Sales across two months
    let sales = [
        invoice(&asha.id, day(2, 10), vec![line(&products[0], 4, false), line(&products[1], 6, false)]),
        invoice(&asha.id, day(2, 24), vec![line(&products[2], 5, false)]),
        invoice(&bala.id, day(3, 1), vec![line(&products[1], 10, false), line(&products[3], 8, false)]),
        invoice(&asha.id, day(3, 5), vec![line(&products[0], 2, false), line(&products[3], 4, false)]),
    ];
    let mut asha_invoices = Vec::new();
    for new in sales {
        let outcome = service.create_invoice(new).await?;
        println!("  Sale {} total {}", outcome.value.invoice_number, outcome.value.total);
        for warning in &outcome.warnings {
            println!("    ⚠ {}", warning);
        }
        if outcome.value.party_id == asha.id {
            asha_invoices.push(outcome.value);
        }
    }

    // Asha settles her February invoices
    let february: Money = asha_invoices
        .iter()
        .filter(|invoice| invoice.date < day(3, 1))
        .map(|invoice| invoice.total)
        .sum();
    let receipt = service
        .record_transaction(NewTransaction {
            transaction_type: TransactionType::Receipt,
            party_id: asha.id.clone(),
            amount: february,
            date: day(3, 7),
            mode: PaymentMode::Upi,
            reference: Some("UPI 4471902".to_string()),
            description: Some("February dues".to_string()),
        })
        .await?;
    println!(
        "  Receipt {} settled {} invoices",
        receipt.value.transaction.amount,
        receipt.value.settled.len()
    );

    // Bala sends back two bottles of oil
    let ret = service
        .create_return(NewReturn {
            party_id: bala.id.clone(),
            return_type: None,
            invoice_id: None,
            date: day(3, 9),
            items: vec![line(&products[1], 2, false)],
            gst_rate: None,
            notes: Some("leaking caps".to_string()),
        })
        .await?;
    service.transition_return(&ret.value.id, ReturnStatus::Processed).await?;
    println!("  Return {} processed", ret.value.return_number);

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seeded demo book in {:?}", elapsed);

    // Verify
    println!();
    println!("Verifying stock against movement history...");
    for product in &products {
        let check = service.verify_stock(&product.id).await?;
        let mark = if check.is_consistent() { "✓" } else { "✗" };
        println!("  {} {:<20} stock {:>4}  expected {:>4}", mark, product.name, check.stock, check.expected);
    }

    let summary = service.balance_summary().await?;
    println!();
    println!("Receivables: {}", summary.receivables);
    println!("Payables:    {}", summary.payables);

    let low = service.low_stock_report().await?;
    if !low.is_empty() {
        println!();
        println!("Low stock:");
        for item in low {
            println!("  {} ({} left, threshold {})", item.name, item.stock, item.threshold);
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn party(name: &str, party_type: PartyType) -> NewParty {
    NewParty {
        name: name.to_string(),
        party_type,
        mobile: String::new(),
        address: String::new(),
        tax_id: None,
    }
}

fn invoice(party_id: &str, date: NaiveDate, items: Vec<InvoiceItem>) -> NewInvoice {
    NewInvoice {
        party_id: party_id.to_string(),
        date,
        items,
        gst_rate: Some(TaxRate::from_bps(500)),
        discount: Money::zero(),
        notes: None,
    }
}

/// A product line at its selling price, or at cost for purchases.
fn line(product: &Product, qty: i64, at_cost: bool) -> InvoiceItem {
    let rate = if at_cost { product.cost_price } else { product.price };
    InvoiceItem::new(Some(product.id.clone()), &product.name, qty, rate)
}

fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap_or(NaiveDate::MIN)
}
