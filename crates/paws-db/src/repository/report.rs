//! # Report Repository
//!
//! Read-only aggregations behind the dashboard and the period reports.
//!
//! ## Conventions
//! - Sales figures count **finalized** sales only; open sales are carts
//!   that never checked out and would inflate revenue.
//! - Period filters compare calendar dates (`DATE(created_at)`), both
//!   ends inclusive.
//! - Money comes back in cents, like everywhere else.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;

// =============================================================================
// Projection Rows
// =============================================================================

/// Sales count and revenue over a period.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesSummary {
    pub count: i64,
    pub revenue_cents: i64,
}

/// One day's sales count and revenue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailySales {
    pub day: NaiveDate,
    pub sales: i64,
    pub revenue_cents: i64,
}

/// A product ranked by units sold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// A customer ranked by total spend.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopCustomer {
    pub name: String,
    pub purchases: i64,
    pub total_spent_cents: i64,
}

/// How many pets of one species are on file.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SpeciesCount {
    pub species: String,
    pub count: i64,
}

// =============================================================================
// Report Repository
// =============================================================================

/// Repository for reporting queries.
///
/// Everything here is a read; this repository never mutates.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales count and revenue between two dates, inclusive.
    pub async fn sales_summary(&self, start: NaiveDate, end: NaiveDate) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COUNT(*) AS count,
                COALESCE(SUM(total_cents), 0) AS revenue_cents
            FROM sales
            WHERE status = 'finalized'
              AND DATE(created_at) BETWEEN ?1 AND ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Per-day sales count and revenue between two dates, inclusive.
    ///
    /// Days with no finalized sales are absent, not zero-filled.
    pub async fn daily_sales(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<DailySales>> {
        let days = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT
                DATE(created_at) AS day,
                COUNT(*) AS sales,
                COALESCE(SUM(total_cents), 0) AS revenue_cents
            FROM sales
            WHERE status = 'finalized'
              AND DATE(created_at) BETWEEN ?1 AND ?2
            GROUP BY DATE(created_at)
            ORDER BY day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(days)
    }

    /// Best-selling products over a period, most units first.
    pub async fn top_products(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: u32,
    ) -> DbResult<Vec<TopProduct>> {
        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.name AS name,
                SUM(si.quantity) AS units_sold,
                SUM(si.subtotal_cents) AS revenue_cents
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            JOIN sales s ON s.id = si.sale_id
            WHERE s.status = 'finalized'
              AND DATE(s.created_at) BETWEEN ?1 AND ?2
            GROUP BY p.id, p.name
            ORDER BY units_sold DESC
            LIMIT ?3
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// All-time customer ranking by total spend.
    ///
    /// Anonymous sales (no customer on the header) are not counted.
    pub async fn top_customers(&self, limit: u32) -> DbResult<Vec<TopCustomer>> {
        let customers = sqlx::query_as::<_, TopCustomer>(
            r#"
            SELECT
                c.name AS name,
                COUNT(s.id) AS purchases,
                COALESCE(SUM(s.total_cents), 0) AS total_spent_cents
            FROM customers c
            JOIN sales s ON s.customer_id = c.id
            WHERE s.status = 'finalized'
            GROUP BY c.id, c.name
            ORDER BY total_spent_cents DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Total retail value of active stock, in cents.
    pub async fn inventory_valuation(&self) -> DbResult<i64> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(price_cents * current_stock), 0)
            FROM products
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(cents)
    }

    /// Histogram of registered pets by species, biggest group first.
    ///
    /// Species is free text, so "Dog" and "dog" fold together.
    pub async fn pets_by_species(&self) -> DbResult<Vec<SpeciesCount>> {
        let species = sqlx::query_as::<_, SpeciesCount>(
            r#"
            SELECT
                LOWER(species) AS species,
                COUNT(*) AS count
            FROM pets
            GROUP BY LOWER(species)
            ORDER BY count DESC, species
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(species)
    }

    /// Number of active products at or below their reorder threshold.
    pub async fn low_stock_count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE is_active = 1 AND current_stock <= min_stock
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use paws_core::{NewCustomer, NewPet, NewProduct, NewSale};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn today() -> NaiveDate {
        chrono::Utc::now().date_naive()
    }

    async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> String {
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
            .id
    }

    /// Creates a finalized sale for one product line.
    async fn checkout(db: &Database, customer_id: Option<&str>, product_id: &str, quantity: i64) {
        let sale = db
            .sales()
            .create(&NewSale {
                customer_id: customer_id.map(String::from),
                ..Default::default()
            })
            .await
            .unwrap();
        db.sales()
            .add_item(&sale.id, product_id, quantity, None)
            .await
            .unwrap();
        db.sales().finalize(&sale.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_summary_counts_finalized_only() {
        let db = setup().await;
        let food = seed_product(&db, "Dog Food", 5000, 50).await;

        checkout(&db, None, &food, 2).await; // 10000
        checkout(&db, None, &food, 1).await; // 5000

        // An open sale with items must not count.
        let open = db.sales().create(&NewSale::default()).await.unwrap();
        db.sales().add_item(&open.id, &food, 4, None).await.unwrap();

        let summary = db.reports().sales_summary(today(), today()).await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.revenue_cents, 15000);
    }

    #[tokio::test]
    async fn test_summary_empty_period() {
        let db = setup().await;
        let far_past = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();

        let summary = db.reports().sales_summary(far_past, far_past).await.unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.revenue_cents, 0);
    }

    #[tokio::test]
    async fn test_daily_sales_groups_by_day() {
        let db = setup().await;
        let food = seed_product(&db, "Dog Food", 3000, 50).await;
        checkout(&db, None, &food, 1).await;
        checkout(&db, None, &food, 2).await;

        let days = db.reports().daily_sales(today(), today()).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day, today());
        assert_eq!(days[0].sales, 2);
        assert_eq!(days[0].revenue_cents, 9000);
    }

    #[tokio::test]
    async fn test_top_products_ranked_by_units() {
        let db = setup().await;
        let food = seed_product(&db, "Dog Food", 5000, 50).await;
        let toy = seed_product(&db, "Rope Toy", 1500, 50).await;

        checkout(&db, None, &food, 2).await;
        checkout(&db, None, &toy, 5).await;

        let top = db
            .reports()
            .top_products(today(), today(), 10)
            .await
            .unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Rope Toy");
        assert_eq!(top[0].units_sold, 5);
        assert_eq!(top[0].revenue_cents, 5 * 1500);
        assert_eq!(top[1].name, "Dog Food");
    }

    #[tokio::test]
    async fn test_top_customers_skip_anonymous_sales() {
        let db = setup().await;
        let food = seed_product(&db, "Dog Food", 5000, 50).await;

        let maria = db
            .customers()
            .insert(&NewCustomer {
                name: "Maria Silva Santos".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let joao = db
            .customers()
            .insert(&NewCustomer {
                name: "João Pedro Oliveira".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        checkout(&db, Some(&maria.id), &food, 3).await; // 15000
        checkout(&db, Some(&joao.id), &food, 1).await; // 5000
        checkout(&db, Some(&joao.id), &food, 1).await; // 5000
        checkout(&db, None, &food, 4).await; // anonymous, ignored

        let top = db.reports().top_customers(10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Maria Silva Santos");
        assert_eq!(top[0].purchases, 1);
        assert_eq!(top[0].total_spent_cents, 15000);
        assert_eq!(top[1].purchases, 2);
        assert_eq!(top[1].total_spent_cents, 10000);
    }

    #[tokio::test]
    async fn test_inventory_valuation_and_low_stock_count() {
        let db = setup().await;
        let food = seed_product(&db, "Dog Food", 5000, 10).await; // 50000
        seed_product(&db, "Rope Toy", 1500, 4).await; // 6000

        assert_eq!(db.reports().inventory_valuation().await.unwrap(), 56000);
        assert_eq!(db.reports().low_stock_count().await.unwrap(), 0);

        // Sell the food down to its threshold.
        db.products().set_stock(&food, 2, "shrinkage").await.unwrap();
        assert_eq!(db.reports().low_stock_count().await.unwrap(), 1);
        assert_eq!(db.reports().inventory_valuation().await.unwrap(), 16000);
    }

    #[tokio::test]
    async fn test_pets_by_species_folds_case() {
        let db = setup().await;
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: "Ana Carolina Lima".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        for (name, species) in [("Rex", "Dog"), ("Thor", "dog"), ("Luna", "Cat")] {
            db.pets()
                .insert(&NewPet {
                    customer_id: customer.id.clone(),
                    name: name.to_string(),
                    species: species.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let histogram = db.reports().pets_by_species().await.unwrap();
        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram[0].species, "dog");
        assert_eq!(histogram[0].count, 2);
        assert_eq!(histogram[1].species, "cat");
        assert_eq!(histogram[1].count, 1);
    }
}
