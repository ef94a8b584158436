//! # Cart Module
//!
//! An in-memory shopping cart for building up a sale at the counter.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Counter Action            Cart Call                State Change        │
//! │  ──────────────            ─────────                ────────────        │
//! │                                                                         │
//! │  Scan product ───────────► add_item() ────────────► items.push(item)   │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ─────► items[i].qty = n   │
//! │                                                                         │
//! │  Remove line ────────────► remove_item() ─────────► items.remove(i)    │
//! │                                                                         │
//! │  Cancel sale ────────────► clear() ───────────────► items.clear()      │
//! │                                                                         │
//! │  Checkout ───────────────► SaleRepository::create_from_cart()           │
//! │                                                                         │
//! │  The cart never touches the database. Stock is only debited when        │
//! │  the resulting sale is finalized.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// An item in the shopping cart.
///
/// ## Design Notes
/// - `product_id`: Reference to the product (for database lookup)
/// - `name` / `unit_price_cents`: Frozen copy of product data at time of
///   adding. This ensures the cart displays consistent data even if the
///   product is updated in the database after being added to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product ID (UUID)
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Price in cents at time of adding (frozen)
    /// This is critical: we lock in the price when added to cart
    pub unit_price_cents: i64,

    /// Quantity in cart
    pub quantity: i64,

    /// When this item was added to cart
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new cart item from a product and quantity.
    ///
    /// ## Price Freezing
    /// The price is captured at this moment. If the product price
    /// changes in the database, this cart item retains the original price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Calculates the line subtotal (unit price × quantity).
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding same product increases quantity)
/// - Quantity is always in 1..=999 (updating to 0 removes the item)
/// - Maximum unique items: 100
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Items in the cart
    pub items: Vec<CartItem>,

    /// When the cart was created/last cleared
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart or increases quantity if already present.
    ///
    /// ## Behavior
    /// - If product already in cart: increases quantity
    /// - If product not in cart: adds new item
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        // Check if product already in cart
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        // Check max items
        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        // Add new item
        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Updates the quantity of an item in the cart.
    ///
    /// ## Behavior
    /// - If quantity is 0: removes the item
    /// - If product not found: returns error
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
            Ok(())
        } else {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        }
    }

    /// Removes an item from the cart by product ID.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Returns the number of unique items in the cart.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Calculates the subtotal (before any sale-level discount).
    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(|i| i.subtotal_cents()).sum()
    }

    /// Returns the subtotal as Money.
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents())
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category_id: None,
            price_cents,
            current_stock: 50,
            min_stock: 5,
            barcode: None,
            description: None,
            brand: None,
            weight_kg: None,
            unit: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        let product = test_product("1", 2490); // R$ 24.90

        cart.add_item(&product, 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal_cents(), 4980); // R$ 49.80
    }

    #[test]
    fn test_cart_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 2490);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1); // Still one unique item
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.subtotal_cents(), 12450);
    }

    #[test]
    fn test_cart_merge_respects_quantity_cap() {
        let mut cart = Cart::new();
        let product = test_product("1", 2490);

        cart.add_item(&product, 900).unwrap();
        let err = cart.add_item(&product, 100).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));

        // Original quantity untouched after the failed merge.
        assert_eq!(cart.total_quantity(), 900);
    }

    #[test]
    fn test_cart_rejects_invalid_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 2490);

        assert!(cart.add_item(&product, 0).is_err());
        assert!(cart.add_item(&product, -1).is_err());
        assert!(cart.add_item(&product, 1000).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_update_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 2490);

        cart.add_item(&product, 2).unwrap();
        cart.update_quantity("1", 5).unwrap();
        assert_eq!(cart.total_quantity(), 5);

        // Zero removes the item.
        cart.update_quantity("1", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_remove_missing_product() {
        let mut cart = Cart::new();
        let err = cart.remove_item("ghost").unwrap_err();
        assert!(matches!(err, CoreError::ProductNotInCart(_)));
    }

    #[test]
    fn test_cart_max_unique_items() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            let product = test_product(&format!("p{}", i), 100);
            cart.add_item(&product, 1).unwrap();
        }

        let one_more = test_product("overflow", 100);
        let err = cart.add_item(&one_more, 1).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_cart_price_frozen_at_add_time() {
        let mut cart = Cart::new();
        let mut product = test_product("1", 2490);

        cart.add_item(&product, 1).unwrap();

        // Price change in the catalog does not affect the cart line.
        product.price_cents = 9990;
        assert_eq!(cart.items[0].unit_price_cents, 2490);
        assert_eq!(cart.subtotal_cents(), 2490);
    }

    #[test]
    fn test_cart_clear() {
        let mut cart = Cart::new();
        let product = test_product("1", 2490);

        cart.add_item(&product, 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }
}
