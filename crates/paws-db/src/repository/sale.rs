//! # Sale Repository
//!
//! Database operations for sales and their line items.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sale Lifecycle                                   │
//! │                                                                         │
//! │  create(NewSale)                                                        │
//! │       │  status = open, total = 0                                       │
//! │       ▼                                                                 │
//! │  add_item(...)  (repeatable)                                            │
//! │       │  snapshots unit price, recomputes                               │
//! │       │  total = SUM(subtotals) - discount                              │
//! │       ▼                                                                 │
//! │  finalize(sale_id)                                                      │
//! │       │  one transaction:                                               │
//! │       │    1. flip open -> finalized (conditional UPDATE)               │
//! │       │    2. debit stock per line item (conditional UPDATE)            │
//! │       │    3. write one exit movement per line item                     │
//! │       ▼                                                                 │
//! │  finalized   (immutable: add_item and finalize now reject)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failed step rolls the whole transaction back, including the status
//! flip, so a sale never ends up half-debited.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use crate::repository::product::debit_stock;
use paws_core::validation::{validate_discount_cents, validate_quantity};
use paws_core::{Cart, CoreError, Money, NewSale, Product, Sale, SaleItem, SaleStatus};

/// A sale header together with its line items, in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Sale Repository
// =============================================================================

/// Repository for sale database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = SaleRepository::new(pool);
///
/// let sale = repo.create(&NewSale::default()).await?;
/// repo.add_item(&sale.id, &product.id, 2, None).await?;
/// let finalized = repo.finalize(&sale.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Opens a new sale with no items.
    ///
    /// The total starts at zero and is recomputed on every
    /// [`SaleRepository::add_item`] call.
    pub async fn create(&self, input: &NewSale) -> DbResult<Sale> {
        validate_discount_cents(input.discount_cents)?;

        let sale = Sale {
            id: new_id(),
            customer_id: input.customer_id.clone(),
            status: SaleStatus::Open,
            total_cents: 0,
            discount_cents: input.discount_cents,
            payment_method: input.payment_method.clone(),
            notes: input.notes.clone(),
            created_at: Utc::now(),
            finalized_at: None,
        };

        debug!(id = %sale.id, "Opening sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, status, total_cents,
                discount_cents, payment_method, notes,
                created_at, finalized_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.status)
        .bind(sale.total_cents)
        .bind(sale.discount_cents)
        .bind(&sale.payment_method)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.finalized_at)
        .execute(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Adds a line item to an open sale.
    ///
    /// ## What This Does
    /// 1. Verifies the sale exists and is still open
    /// 2. Verifies the product exists and is active
    /// 3. Snapshots the unit price (catalog price unless overridden)
    /// 4. Inserts the item and recomputes the sale total
    ///
    /// The stock check here is advisory only: it catches obvious overselling
    /// at add time, but the debit at finalization is what actually enforces
    /// the floor.
    ///
    /// ## Arguments
    /// * `unit_price` - `None` snapshots the product's current price
    pub async fn add_item(
        &self,
        sale_id: &str,
        product_id: &str,
        quantity: i64,
        unit_price: Option<Money>,
    ) -> DbResult<SaleItem> {
        validate_quantity(quantity)?;

        debug!(
            sale_id = %sale_id,
            product_id = %product_id,
            quantity = %quantity,
            "Adding sale item"
        );

        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        if !sale.is_open() {
            return Err(DbError::Domain(CoreError::SaleAlreadyFinalized {
                sale_id: sale_id.to_string(),
            }));
        }

        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        if !product.can_fulfill(quantity) {
            return Err(DbError::Domain(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.current_stock,
                requested: quantity,
            }));
        }

        let unit_price_cents = unit_price.map(|p| p.cents()).unwrap_or(product.price_cents);
        let item = SaleItem {
            id: new_id(),
            sale_id: sale_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents,
            subtotal_cents: unit_price_cents * quantity,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, quantity,
                unit_price_cents, subtotal_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .bind(item.created_at)
        .execute(&mut *tx)
        .await?;

        recompute_total(&mut tx, sale_id).await?;

        tx.commit().await?;

        Ok(item)
    }

    /// Finalizes an open sale, debiting stock for every line item.
    ///
    /// ## Atomicity
    /// The status flip, the stock debits and the exit movements all share
    /// one transaction. If any line cannot be fulfilled the whole call
    /// rolls back and the sale stays open.
    ///
    /// The status UPDATE is conditional on `status = 'open'`, so a second
    /// concurrent finalize matches zero rows and is rejected instead of
    /// debiting stock twice.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Sale doesn't exist
    /// * `Err(DbError::Domain(SaleAlreadyFinalized))` - Already finalized
    /// * `Err(DbError::Domain(InsufficientStock))` - A line exceeds stock
    pub async fn finalize(&self, sale_id: &str) -> DbResult<Sale> {
        debug!(sale_id = %sale_id, "Finalizing sale");

        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        if !sale.is_open() {
            return Err(DbError::Domain(CoreError::SaleAlreadyFinalized {
                sale_id: sale_id.to_string(),
            }));
        }

        let finalized_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET status = ?2, finalized_at = ?3
            WHERE id = ?1 AND status = ?4
            "#,
        )
        .bind(sale_id)
        .bind(SaleStatus::Finalized)
        .bind(finalized_at)
        .bind(SaleStatus::Open)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Domain(CoreError::SaleAlreadyFinalized {
                sale_id: sale_id.to_string(),
            }));
        }

        // A sale with no items finalizes cleanly; there is just nothing
        // to debit.
        let items = fetch_items(&mut tx, sale_id).await?;
        let reason = format!("Sale #{}", sale_id);
        for item in &items {
            debit_stock(&mut tx, &item.product_id, item.quantity, &reason).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            items = items.len(),
            total_cents = sale.total_cents,
            "Sale finalized"
        );

        Ok(Sale {
            status: SaleStatus::Finalized,
            finalized_at: Some(finalized_at),
            ..sale
        })
    }

    /// Gets a sale header by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lists a sale's line items in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT * FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale together with its line items.
    pub async fn get_with_items(&self, sale_id: &str) -> DbResult<Option<SaleWithItems>> {
        let sale = match self.get_by_id(sale_id).await? {
            Some(sale) => sale,
            None => return Ok(None),
        };
        let items = self.get_items(sale_id).await?;

        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Lists the most recent sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales =
            sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY created_at DESC LIMIT ?1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        Ok(sales)
    }

    /// Drains a staging cart into a persisted sale.
    ///
    /// Each cart line keeps the price it was added at, so a catalog price
    /// change between carting and checkout does not reprice the sale.
    /// The sale is left open; call [`SaleRepository::finalize`] to commit
    /// the stock debit.
    pub async fn create_from_cart(&self, cart: &Cart, input: &NewSale) -> DbResult<Sale> {
        if cart.is_empty() {
            return Err(DbError::Domain(CoreError::EmptyCart));
        }

        debug!(items = cart.item_count(), "Creating sale from cart");

        let sale = self.create(input).await?;
        for item in &cart.items {
            self.add_item(
                &sale.id,
                &item.product_id,
                item.quantity,
                Some(Money::from_cents(item.unit_price_cents)),
            )
            .await?;
        }

        // Re-read so the caller sees the recomputed total.
        self.get_by_id(&sale.id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", &sale.id))
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(sale)
}

async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        "SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY created_at",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Recomputes a sale total from its line items.
///
/// The inner SELECT has no `discount_cents` column in scope, so SQLite
/// resolves it against the outer sale row being updated.
async fn recompute_total(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE sales
        SET total_cents = (
            SELECT COALESCE(SUM(subtotal_cents), 0) - discount_cents
            FROM sale_items
            WHERE sale_id = ?1
        )
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use paws_core::{MovementKind, NewProduct};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        db.products()
            .insert(&NewProduct {
                name: name.to_string(),
                price_cents,
                initial_stock: stock,
                min_stock: 2,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_total_tracks_items_and_discount() {
        let db = setup().await;
        let food = seed_product(&db, "Dog Food", 8990, 20).await;
        let toy = seed_product(&db, "Rope Toy", 1550, 20).await;

        let sale = db
            .sales()
            .create(&NewSale {
                discount_cents: 500,
                ..Default::default()
            })
            .await
            .unwrap();

        db.sales().add_item(&sale.id, &food.id, 2, None).await.unwrap();
        let after_first = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(after_first.total_cents, 2 * 8990 - 500);

        db.sales().add_item(&sale.id, &toy.id, 1, None).await.unwrap();
        let after_second = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(after_second.total_cents, 2 * 8990 + 1550 - 500);
    }

    #[tokio::test]
    async fn test_line_price_is_a_snapshot() {
        let db = setup().await;
        let mut product = seed_product(&db, "Shampoo", 1890, 10).await;

        let sale = db.sales().create(&NewSale::default()).await.unwrap();
        let item = db.sales().add_item(&sale.id, &product.id, 1, None).await.unwrap();
        assert_eq!(item.unit_price_cents, 1890);

        // Reprice the catalog after the line was added.
        product.price_cents = 2590;
        db.products().update(&product).await.unwrap();

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items[0].unit_price_cents, 1890);
        assert_eq!(items[0].subtotal_cents, 1890);

        let header = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(header.total_cents, 1890);
    }

    #[tokio::test]
    async fn test_custom_unit_price_overrides_catalog() {
        let db = setup().await;
        let product = seed_product(&db, "Collar", 1990, 10).await;

        let sale = db.sales().create(&NewSale::default()).await.unwrap();
        let item = db
            .sales()
            .add_item(&sale.id, &product.id, 2, Some(Money::from_cents(1500)))
            .await
            .unwrap();

        assert_eq!(item.unit_price_cents, 1500);
        assert_eq!(item.subtotal_cents, 3000);
    }

    #[tokio::test]
    async fn test_checkout_end_to_end() {
        let db = setup().await;
        let product = seed_product(&db, "Premium Food", 5000, 10).await;

        let sale = db
            .sales()
            .create(&NewSale {
                discount_cents: 500,
                payment_method: "PIX".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.sales().add_item(&sale.id, &product.id, 3, None).await.unwrap();

        let finalized = db.sales().finalize(&sale.id).await.unwrap();
        assert_eq!(finalized.status, SaleStatus::Finalized);
        assert!(finalized.finalized_at.is_some());

        let header = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(header.total_cents, 3 * 5000 - 500);
        assert_eq!(header.payment_method, "PIX");

        // Stock was debited and the exit movement written.
        let stocked = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stocked.current_stock, 7);

        let movements = db.products().movements(&product.id).await.unwrap();
        let exits: Vec<_> = movements
            .iter()
            .filter(|m| m.kind == MovementKind::Exit)
            .collect();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].quantity, 3);
        assert_eq!(exits[0].reason, format!("Sale #{}", sale.id));
    }

    #[tokio::test]
    async fn test_double_finalize_rejected_and_debits_once() {
        let db = setup().await;
        let product = seed_product(&db, "Treats", 2490, 10).await;

        let sale = db.sales().create(&NewSale::default()).await.unwrap();
        db.sales().add_item(&sale.id, &product.id, 2, None).await.unwrap();

        db.sales().finalize(&sale.id).await.unwrap();
        let err = db.sales().finalize(&sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::SaleAlreadyFinalized { .. })
        ));

        let stocked = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stocked.current_stock, 8);
    }

    #[tokio::test]
    async fn test_finalize_insufficient_stock_rolls_back() {
        let db = setup().await;
        let product = seed_product(&db, "Dewormer", 3500, 10).await;

        // Both sales pass the advisory check while stock is still 10.
        let first = db.sales().create(&NewSale::default()).await.unwrap();
        db.sales().add_item(&first.id, &product.id, 8, None).await.unwrap();
        let second = db.sales().create(&NewSale::default()).await.unwrap();
        db.sales().add_item(&second.id, &product.id, 8, None).await.unwrap();

        db.sales().finalize(&first.id).await.unwrap();

        let err = db.sales().finalize(&second.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));

        // The losing sale stays open with stock untouched beyond the winner.
        let header = db.sales().get_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(header.status, SaleStatus::Open);
        assert!(header.finalized_at.is_none());

        let stocked = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stocked.current_stock, 2);
    }

    #[tokio::test]
    async fn test_add_item_to_finalized_sale_rejected() {
        let db = setup().await;
        let product = seed_product(&db, "Wipes", 890, 10).await;

        let sale = db.sales().create(&NewSale::default()).await.unwrap();
        db.sales().add_item(&sale.id, &product.id, 1, None).await.unwrap();
        db.sales().finalize(&sale.id).await.unwrap();

        let err = db
            .sales()
            .add_item(&sale.id, &product.id, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::SaleAlreadyFinalized { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_item_advisory_stock_check() {
        let db = setup().await;
        let product = seed_product(&db, "Bed", 7800, 3).await;

        let sale = db.sales().create(&NewSale::default()).await.unwrap();
        let err = db
            .sales()
            .add_item(&sale.id, &product.id, 4, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_item_unknown_targets() {
        let db = setup().await;
        let product = seed_product(&db, "Leash", 4500, 5).await;

        let err = db
            .sales()
            .add_item("missing-sale", &product.id, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let sale = db.sales().create(&NewSale::default()).await.unwrap();
        let err = db
            .sales()
            .add_item(&sale.id, "missing-product", 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_add_item_rejects_inactive_product() {
        let db = setup().await;
        let product = seed_product(&db, "Old Toy", 1550, 5).await;
        db.products().soft_delete(&product.id).await.unwrap();

        let sale = db.sales().create(&NewSale::default()).await.unwrap();
        let err = db
            .sales()
            .add_item(&sale.id, &product.id, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_finalize_empty_sale_is_allowed() {
        let db = setup().await;
        let sale = db.sales().create(&NewSale::default()).await.unwrap();

        let finalized = db.sales().finalize(&sale.id).await.unwrap();
        assert_eq!(finalized.status, SaleStatus::Finalized);
        assert_eq!(finalized.total_cents, 0);
    }

    #[tokio::test]
    async fn test_create_from_cart() {
        let db = setup().await;
        let food = seed_product(&db, "Kitten Food", 4550, 18).await;
        let brush = seed_product(&db, "Toothbrush", 1250, 15).await;

        let mut cart = Cart::new();
        cart.add_item(&food, 2).unwrap();
        cart.add_item(&brush, 1).unwrap();

        let sale = db
            .sales()
            .create_from_cart(&cart, &NewSale::default())
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 2 * 4550 + 1250);

        let with_items = db.sales().get_with_items(&sale.id).await.unwrap().unwrap();
        assert_eq!(with_items.items.len(), 2);
        assert!(with_items.sale.is_open());
    }

    #[tokio::test]
    async fn test_create_from_empty_cart_rejected() {
        let db = setup().await;
        let cart = Cart::new();

        let err = db
            .sales()
            .create_from_cart(&cart, &NewSale::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_list_recent_orders_newest_first() {
        let db = setup().await;

        let older = db.sales().create(&NewSale::default()).await.unwrap();
        // Keep the created_at timestamps strictly ordered.
        std::thread::sleep(std::time::Duration::from_millis(2));
        let newer = db.sales().create(&NewSale::default()).await.unwrap();

        let recent = db.sales().list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, newer.id);
        assert_eq!(recent[1].id, older.id);
    }
}
