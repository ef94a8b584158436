//! # Product Repository
//!
//! Database operations for products, categories and the stock audit trail.
//!
//! ## Key Operations
//! - Catalog CRUD and name search
//! - Stock level changes with movement audit
//! - Low-stock alerts
//!
//! ## Stock Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     How Stock Changes Flow                              │
//! │                                                                         │
//! │  Every stock mutation goes through this module and writes an            │
//! │  audit row in the same transaction:                                     │
//! │                                                                         │
//! │  insert(initial_stock=25)  ──► +25  entry  "initial stock"             │
//! │  set_stock(30, "restock")  ──► +5   entry  "restock"                   │
//! │  finalize sale (qty 3)     ──► -3   exit   "Sale #<id>"                │
//! │                                                                         │
//! │  Invariant: current_stock = SUM(entries) - SUM(exits)                  │
//! │                                                                         │
//! │  `update()` deliberately cannot write current_stock, so there is no    │
//! │  code path that changes stock without an audit row.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use paws_core::validation::{
    validate_barcode, validate_price_cents, validate_product_name, validate_search_query,
    validate_stock_level,
};
use paws_core::{Category, CoreError, MovementKind, NewProduct, Product, StockMovement};

// =============================================================================
// Product Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Register a product (records the opening stock movement)
/// let product = repo.insert(&new_product).await?;
///
/// // Search products
/// let results = repo.search("dog food", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## What This Does
    /// 1. Validates name, price, stock levels and barcode
    /// 2. Inserts the product row
    /// 3. Records an "initial stock" entry movement when opening stock > 0
    ///
    /// Steps 2 and 3 run in one transaction so the audit trail can never
    /// miss the opening balance.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated ID
    /// * `Err(DbError::UniqueViolation)` - Barcode already exists
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        validate_product_name(&input.name)?;
        validate_price_cents(input.price_cents)?;
        validate_stock_level(input.initial_stock)?;
        validate_stock_level(input.min_stock)?;
        if let Some(barcode) = &input.barcode {
            validate_barcode(barcode)?;
        }

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            name: input.name.clone(),
            category_id: input.category_id.clone(),
            price_cents: input.price_cents,
            current_stock: input.initial_stock,
            min_stock: input.min_stock,
            barcode: input.barcode.clone(),
            description: input.description.clone(),
            brand: input.brand.clone(),
            weight_kg: input.weight_kg,
            unit: input.unit.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(name = %product.name, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category_id, price_cents,
                current_stock, min_stock, barcode, description,
                brand, weight_kg, unit, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(product.price_cents)
        .bind(product.current_stock)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(product.weight_kg)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        if product.current_stock > 0 {
            record_movement(
                &mut tx,
                &product.id,
                MovementKind::Entry,
                product.current_stock,
                "initial stock",
            )
            .await?;
        }

        tx.commit().await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// Resolves inactive products too, so historical sales can always
    /// display their line items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its barcode.
    ///
    /// ## Usage
    /// Counter workflow: scan barcode, add result to cart.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE barcode = ?1")
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists all active products sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches active products by name.
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial, matched case-insensitively)
    /// * `limit` - Maximum results to return
    ///
    /// ## Example
    /// ```rust,ignore
    /// // Matches "Premium Adult Dog Food 15kg"
    /// let products = repo.search("dog food", 20).await?;
    ///
    /// // Empty query returns active products
    /// let products = repo.search("", 20).await?;
    /// ```
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        // If query is empty, return active products
        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE name LIKE ?1 AND is_active = 1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products (no search filter).
    ///
    /// ## Usage
    /// Called when search query is empty.
    async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates an existing product's catalog fields.
    ///
    /// `current_stock` is deliberately not written here. Stock changes go
    /// through [`ProductRepository::set_stock`] or sale finalization so the
    /// movement audit stays complete.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;

        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category_id = ?3,
                price_cents = ?4,
                min_stock = ?5,
                barcode = ?6,
                description = ?7,
                brand = ?8,
                weight_kg = ?9,
                unit = ?10,
                is_active = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(product.price_cents)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(product.weight_kg)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Sets the absolute stock level, recording the delta as a movement.
    ///
    /// ## Stocktake Workflow
    /// ```text
    /// Shelf count says 28, system says 25
    ///      │
    ///      ▼
    /// set_stock(id, 28, "stocktake")
    ///      │
    ///      ├── delta = 28 - 25 = +3
    ///      ├── UPDATE products SET current_stock = 28
    ///      └── INSERT movement: entry, qty 3, "stocktake"
    /// ```
    ///
    /// A zero delta writes nothing. Both writes share one transaction.
    pub async fn set_stock(&self, id: &str, quantity: i64, reason: &str) -> DbResult<()> {
        validate_stock_level(quantity)?;

        debug!(id = %id, quantity = %quantity, reason = %reason, "Setting stock level");

        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT current_stock FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let current = current.ok_or_else(|| DbError::not_found("Product", id))?;

        let delta = quantity - current;
        if delta == 0 {
            return Ok(());
        }

        let now = Utc::now();
        sqlx::query("UPDATE products SET current_stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let (kind, magnitude) = if delta > 0 {
            (MovementKind::Entry, delta)
        } else {
            (MovementKind::Exit, -delta)
        };
        record_movement(&mut tx, id, kind, magnitude, reason).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Lists active products at or below their reorder threshold.
    ///
    /// Sorted by current stock so the emptiest shelves come first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1 AND current_stock <= min_stock
            ORDER BY current_stock
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists stock movements for a product, newest first.
    pub async fn movements(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// - Historical sales still reference this product
    /// - Can be restored if deleted by mistake
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and seed guards).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Shared Stock Helpers
// =============================================================================

/// Writes a stock movement row.
///
/// Runs on the caller's connection so it joins whatever transaction
/// currently owns the stock change.
pub(crate) async fn record_movement(
    conn: &mut SqliteConnection,
    product_id: &str,
    kind: MovementKind,
    quantity: i64,
    reason: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, kind, quantity, reason, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(new_id())
    .bind(product_id)
    .bind(kind)
    .bind(quantity)
    .bind(reason)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Debits stock for a sale line, guarding against overselling.
///
/// The UPDATE only matches while enough stock remains, so two concurrent
/// checkouts can never both take the last unit: the loser's transaction
/// fails and rolls back.
pub(crate) async fn debit_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    reason: &str,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET current_stock = current_stock - ?2, updated_at = ?3
        WHERE id = ?1 AND current_stock >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        // Either the product vanished or not enough stock remains.
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT name, current_stock FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await?;

        return Err(match row {
            Some((name, available)) => DbError::Domain(CoreError::InsufficientStock {
                name,
                available,
                requested: quantity,
            }),
            None => DbError::not_found("Product", product_id),
        });
    }

    record_movement(conn, product_id, MovementKind::Exit, quantity, reason).await
}

// =============================================================================
// Category Repository
// =============================================================================

/// Repository for product category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Category name already exists
    pub async fn insert(&self, name: &str, description: Option<&str>) -> DbResult<Category> {
        validate_product_name(name)?;

        let category = Category {
            id: new_id(),
            name: name.to_string(),
            description: description.map(String::from),
            created_at: Utc::now(),
        };

        debug!(name = %category.name, "Inserting category");

        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn dog_food() -> NewProduct {
        NewProduct {
            name: "Premium Adult Dog Food 15kg".to_string(),
            price_cents: 8990,
            initial_stock: 25,
            min_stock: 5,
            barcode: Some("7891000001234".to_string()),
            brand: Some("Royal Canin".to_string()),
            weight_kg: Some(15.0),
            unit: Some("kg".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_records_initial_stock_entry() {
        let db = setup().await;
        let product = db.products().insert(&dog_food()).await.unwrap();

        assert_eq!(product.current_stock, 25);

        let movements = db.products().movements(&product.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Entry);
        assert_eq!(movements[0].quantity, 25);
        assert_eq!(movements[0].reason, "initial stock");
    }

    #[tokio::test]
    async fn test_insert_zero_stock_has_no_movement() {
        let db = setup().await;
        let input = NewProduct {
            initial_stock: 0,
            barcode: None,
            ..dog_food()
        };
        let product = db.products().insert(&input).await.unwrap();

        assert_eq!(product.current_stock, 0);
        assert!(db
            .products()
            .movements(&product.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_input() {
        let db = setup().await;

        let unnamed = NewProduct {
            name: "".to_string(),
            ..dog_food()
        };
        assert!(db.products().insert(&unnamed).await.is_err());

        let free = NewProduct {
            price_cents: 0,
            ..dog_food()
        };
        assert!(db.products().insert(&free).await.is_err());

        let negative_stock = NewProduct {
            initial_stock: -5,
            ..dog_food()
        };
        assert!(db.products().insert(&negative_stock).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = setup().await;
        db.products().insert(&dog_food()).await.unwrap();

        let twin = NewProduct {
            name: "Different Name, Same Barcode".to_string(),
            ..dog_food()
        };
        let err = db.products().insert(&twin).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // The failed insert rolled back entirely.
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_stock_writes_delta_movements() {
        let db = setup().await;
        let product = db.products().insert(&dog_food()).await.unwrap(); // stock 25

        db.products()
            .set_stock(&product.id, 30, "restock")
            .await
            .unwrap();
        db.products()
            .set_stock(&product.id, 28, "breakage")
            .await
            .unwrap();

        let current = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(current.current_stock, 28);

        let movements = db.products().movements(&product.id).await.unwrap();
        assert_eq!(movements.len(), 3);

        // Ledger reconciles with the stored level.
        let balance: i64 = movements.iter().map(|m| m.signed_quantity()).sum();
        assert_eq!(balance, current.current_stock);
    }

    #[tokio::test]
    async fn test_set_stock_same_value_is_a_noop() {
        let db = setup().await;
        let product = db.products().insert(&dog_food()).await.unwrap();

        db.products()
            .set_stock(&product.id, 25, "stocktake")
            .await
            .unwrap();

        // Only the initial entry exists.
        let movements = db.products().movements(&product.id).await.unwrap();
        assert_eq!(movements.len(), 1);
    }

    #[tokio::test]
    async fn test_set_stock_rejects_negative_target() {
        let db = setup().await;
        let product = db.products().insert(&dog_food()).await.unwrap();

        let err = db
            .products()
            .set_stock(&product.id, -1, "oops")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));

        let unchanged = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(unchanged.current_stock, 25);
    }

    #[tokio::test]
    async fn test_set_stock_unknown_product() {
        let db = setup().await;
        let err = db
            .products()
            .set_stock("ghost", 5, "restock")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = setup().await;
        let input = NewProduct {
            initial_stock: 3,
            min_stock: 5,
            barcode: None,
            ..dog_food()
        };
        let product = db.products().insert(&input).await.unwrap();

        let low = db.products().low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, product.id);

        // Restocking above the threshold clears the alert.
        db.products()
            .set_stock(&product.id, 10, "restock")
            .await
            .unwrap();
        assert!(db.products().low_stock().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_edits_catalog_fields_only() {
        let db = setup().await;
        let mut product = db.products().insert(&dog_food()).await.unwrap();

        product.price_cents = 9490;
        product.min_stock = 8;
        product.current_stock = 999; // must be ignored
        db.products().update(&product).await.unwrap();

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.price_cents, 9490);
        assert_eq!(stored.min_stock, 8);
        assert_eq!(stored.current_stock, 25);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_list() {
        let db = setup().await;
        let product = db.products().insert(&dog_food()).await.unwrap();
        assert_eq!(db.products().list().await.unwrap().len(), 1);

        db.products().soft_delete(&product.id).await.unwrap();

        assert!(db.products().list().await.unwrap().is_empty());
        // History lookups still resolve the product.
        assert!(db
            .products()
            .get_by_id(&product.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_search_and_barcode_lookup() {
        let db = setup().await;
        db.products().insert(&dog_food()).await.unwrap();

        let hits = db.products().search("dog food", 20).await.unwrap();
        assert_eq!(hits.len(), 1);

        let misses = db.products().search("parrot", 20).await.unwrap();
        assert!(misses.is_empty());

        let by_barcode = db
            .products()
            .get_by_barcode("7891000001234")
            .await
            .unwrap();
        assert!(by_barcode.is_some());
    }

    #[tokio::test]
    async fn test_category_insert_and_unique_name() {
        let db = setup().await;
        let category = db
            .categories()
            .insert("Aquarium", Some("Fish, tanks and accessories"))
            .await
            .unwrap();
        assert_eq!(category.name, "Aquarium");

        let err = db.categories().insert("Aquarium", None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Five defaults from the reference data plus the one just added.
        assert_eq!(db.categories().list().await.unwrap().len(), 6);
    }
}
