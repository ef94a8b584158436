//! # Domain Types
//!
//! Core domain types used throughout Paws.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │   Appointment   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  barcode        │   │  status         │   │  pet_id (FK)    │       │
//! │  │  price_cents    │   │  total_cents    │   │  scheduled_at   │       │
//! │  │  current_stock  │   │  discount_cents │   │  price_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │       Pet       │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  cpf (business) │   │  customer_id    │   │  kind           │       │
//! │  │  name           │   │  species        │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (barcode, CPF, etc.) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product category (Food & Treats, Medication, Hygiene, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Category name (unique).
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// When the category was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Category this product belongs to.
    pub category_id: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Current stock level.
    pub current_stock: i64,

    /// Reorder threshold - at or below this the product is low on stock.
    pub min_stock: i64,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Brand name (Royal Canin, Frontline, ...).
    pub brand: Option<String>,

    /// Weight in kilograms, where it matters (food bags, sachets).
    pub weight_kg: Option<f64>,

    /// Sales unit ("kg", "unit", ...).
    pub unit: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if the product is at or below its reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }

    /// Checks if current stock covers the requested quantity.
    #[inline]
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer (pet owner).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Full name.
    pub name: String,

    /// Brazilian tax ID (CPF) - business identifier, unique when present.
    pub cpf: Option<String>,

    /// Contact phone number.
    pub phone: Option<String>,

    /// Contact email.
    pub email: Option<String>,

    /// Street address.
    pub address: Option<String>,

    /// City.
    pub city: Option<String>,

    /// Postal code (CEP).
    pub postal_code: Option<String>,

    /// When the customer was registered.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Pet
// =============================================================================

/// A pet belonging to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Pet {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owner of this pet.
    pub customer_id: String,

    /// Pet name.
    pub name: String,

    /// Species ("Dog", "Cat", ...). Free text, grouped case-insensitively
    /// in reports.
    pub species: String,

    /// Breed, when known.
    pub breed: Option<String>,

    /// Age in years.
    pub age_years: Option<i64>,

    /// Weight in kilograms.
    pub weight_kg: Option<f64>,

    /// Coat color.
    pub color: Option<String>,

    /// Grooming and handling notes.
    pub notes: Option<String>,

    /// When the pet was registered.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Service Type
// =============================================================================

/// A bookable service (bath, grooming, consultation, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ServiceType {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Service name (unique).
    pub name: String,

    /// Base price in cents. Appointments snapshot this at booking time.
    pub base_price_cents: i64,

    /// Expected duration in minutes.
    pub duration_minutes: Option<i64>,

    /// Optional description.
    pub description: Option<String>,

    /// When the service type was created.
    pub created_at: DateTime<Utc>,
}

impl ServiceType {
    /// Returns the base price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is in progress (items being added).
    Open,
    /// Sale has been paid; stock was debited.
    Finalized,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Open
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction.
///
/// `total_cents` is maintained by the storage layer as
/// Σ(item subtotals) − discount, recomputed on every item change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Optional - walk-in sales have no customer.
    pub customer_id: Option<String>,
    pub status: SaleStatus,
    pub total_cents: i64,
    pub discount_cents: i64,
    /// Free-form tender description ("Cash", "PIX", "Credit Card", ...).
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Checks if the sale can still be modified.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SaleStatus::Open
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze the unit price at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Line subtotal (unit_price × quantity).
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock coming in (purchase, initial stock, correction up).
    Entry,
    /// Stock going out (sale, loss, correction down).
    Exit,
}

/// An append-only record of a stock change.
///
/// Every mutation of `Product::current_stock` writes exactly one of
/// these, so for any product:
/// current_stock = Σ(entries) − Σ(exits).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub kind: MovementKind,
    /// Always positive - direction lives in `kind`.
    pub quantity: i64,
    /// Why the stock changed ("initial stock", "Sale #...", ...).
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Returns the quantity signed by direction (+entry, −exit).
    #[inline]
    pub fn signed_quantity(&self) -> i64 {
        match self.kind {
            MovementKind::Entry => self.quantity,
            MovementKind::Exit => -self.quantity,
        }
    }
}

// =============================================================================
// Appointment Status
// =============================================================================

/// The lifecycle status of a service appointment.
///
/// Transitions are unrestricted - the front desk corrects mistakes by
/// moving an appointment to whatever status reflects reality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, not yet confirmed with the customer.
    Scheduled,
    /// Customer confirmed they are coming.
    Confirmed,
    /// Pet is currently being serviced.
    InProgress,
    /// Service was delivered.
    Completed,
    /// Customer or shop cancelled.
    Cancelled,
    /// Customer did not show up.
    NoShow,
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        AppointmentStatus::Scheduled
    }
}

// =============================================================================
// Appointment
// =============================================================================

/// A scheduled service appointment for a pet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Appointment {
    pub id: String,
    pub customer_id: String,
    pub pet_id: String,
    pub service_type_id: String,
    /// When the service is scheduled to happen.
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    /// Price in cents at booking time (frozen snapshot of the
    /// service's base price).
    pub price_cents: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Returns the booked price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Input for registering a new product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: Option<String>,
    pub price_cents: i64,
    /// Opening stock. Recorded as an "initial stock" entry movement.
    pub initial_stock: i64,
    pub min_stock: i64,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub weight_kg: Option<f64>,
    pub unit: Option<String>,
}

/// Input for registering a new customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Input for registering a new pet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPet {
    pub customer_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age_years: Option<i64>,
    pub weight_kg: Option<f64>,
    pub color: Option<String>,
    pub notes: Option<String>,
}

/// Input for opening a new sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub customer_id: Option<String>,
    pub discount_cents: i64,
    pub payment_method: String,
    pub notes: Option<String>,
}

impl Default for NewSale {
    fn default() -> Self {
        NewSale {
            customer_id: None,
            discount_cents: 0,
            payment_method: "Cash".to_string(),
            notes: None,
        }
    }
}

/// Input for booking a new appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub customer_id: String,
    pub pet_id: String,
    pub service_type_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
