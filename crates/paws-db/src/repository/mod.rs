//! # Repository Module
//!
//! Database repository implementations for Paws.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.products().search("dog food", 20)                          │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, input)                                              │
//! │  └── set_stock(&self, id, quantity, reason)                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (in-memory database per test)                          │
//! │  • SQL is isolated in one place                                        │
//! │  • Multi-statement invariants live in one transaction                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog, stock levels, movement audit
//! - [`product::CategoryRepository`] - Product categories
//! - [`sale::SaleRepository`] - Sales, line items, checkout
//! - [`customer::CustomerRepository`] - Customer registry
//! - [`customer::PetRepository`] - Pets per customer
//! - [`appointment::AppointmentRepository`] - Service scheduling
//! - [`appointment::ServiceTypeRepository`] - Bookable services
//! - [`report::ReportRepository`] - Read-only aggregations

use uuid::Uuid;

pub mod appointment;
pub mod customer;
pub mod product;
pub mod report;
pub mod sale;

/// Generates a new entity ID (UUID v4).
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
