//! # Customer & Pet Repositories
//!
//! Master data for the people who walk in the door and the animals they
//! bring along. Customers are looked up by name or CPF at the counter;
//! pets hang off their owner and feed the scheduler.
//!
//! Deletes are hard deletes. A customer with pets (or sales) on file is
//! protected by foreign keys and surfaces as `ForeignKeyViolation`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use paws_core::validation::{validate_customer_name, validate_search_query};
use paws_core::{Customer, NewCustomer, NewPet, Pet};

// =============================================================================
// Customer Repository
// =============================================================================

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a new customer.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - CPF already registered
    pub async fn insert(&self, input: &NewCustomer) -> DbResult<Customer> {
        validate_customer_name(&input.name)?;

        let customer = Customer {
            id: new_id(),
            name: input.name.clone(),
            cpf: input.cpf.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            city: input.city.clone(),
            postal_code: input.postal_code.clone(),
            created_at: Utc::now(),
        };

        debug!(name = %customer.name, "Registering customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, cpf, phone, email,
                address, city, postal_code, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.cpf)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.postal_code)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Finds a customer by exact CPF.
    pub async fn find_by_cpf(&self, cpf: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE cpf = ?1")
            .bind(cpf)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Lists all customers sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Searches customers by name, case-insensitively.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = validate_search_query(query)?;

        if query.is_empty() {
            return self.list().await;
        }

        let pattern = format!("%{}%", query);

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE name LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Updates an existing customer's contact details.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        validate_customer_name(&customer.name)?;

        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                cpf = ?3,
                phone = ?4,
                email = ?5,
                address = ?6,
                city = ?7,
                postal_code = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.cpf)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.postal_code)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Deletes a customer.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Customer still has pets,
    ///   sales or appointments on file
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}

// =============================================================================
// Pet Repository
// =============================================================================

/// Repository for pet database operations.
#[derive(Debug, Clone)]
pub struct PetRepository {
    pool: SqlitePool,
}

impl PetRepository {
    /// Creates a new PetRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PetRepository { pool }
    }

    /// Registers a new pet under an existing customer.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Owner doesn't exist
    pub async fn insert(&self, input: &NewPet) -> DbResult<Pet> {
        validate_customer_name(&input.name)?;

        let pet = Pet {
            id: new_id(),
            customer_id: input.customer_id.clone(),
            name: input.name.clone(),
            species: input.species.clone(),
            breed: input.breed.clone(),
            age_years: input.age_years,
            weight_kg: input.weight_kg,
            color: input.color.clone(),
            notes: input.notes.clone(),
            created_at: Utc::now(),
        };

        debug!(name = %pet.name, customer_id = %pet.customer_id, "Registering pet");

        sqlx::query(
            r#"
            INSERT INTO pets (
                id, customer_id, name, species, breed,
                age_years, weight_kg, color, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&pet.id)
        .bind(&pet.customer_id)
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(pet.age_years)
        .bind(pet.weight_kg)
        .bind(&pet.color)
        .bind(&pet.notes)
        .bind(pet.created_at)
        .execute(&self.pool)
        .await?;

        Ok(pet)
    }

    /// Gets a pet by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Pet>> {
        let pet = sqlx::query_as::<_, Pet>("SELECT * FROM pets WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(pet)
    }

    /// Lists all pets sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Pet>> {
        let pets = sqlx::query_as::<_, Pet>("SELECT * FROM pets ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(pets)
    }

    /// Lists a customer's pets.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Pet>> {
        let pets = sqlx::query_as::<_, Pet>(
            "SELECT * FROM pets WHERE customer_id = ?1 ORDER BY name",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pets)
    }

    /// Searches pets by name, case-insensitively.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Pet>> {
        let query = validate_search_query(query)?;

        if query.is_empty() {
            return self.list().await;
        }

        let pattern = format!("%{}%", query);

        let pets = sqlx::query_as::<_, Pet>(
            r#"
            SELECT * FROM pets
            WHERE name LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(pets)
    }

    /// Updates an existing pet.
    pub async fn update(&self, pet: &Pet) -> DbResult<()> {
        validate_customer_name(&pet.name)?;

        debug!(id = %pet.id, "Updating pet");

        let result = sqlx::query(
            r#"
            UPDATE pets SET
                customer_id = ?2,
                name = ?3,
                species = ?4,
                breed = ?5,
                age_years = ?6,
                weight_kg = ?7,
                color = ?8,
                notes = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&pet.id)
        .bind(&pet.customer_id)
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(pet.age_years)
        .bind(pet.weight_kg)
        .bind(&pet.color)
        .bind(&pet.notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pet", &pet.id));
        }

        Ok(())
    }

    /// Deletes a pet.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting pet");

        let result = sqlx::query("DELETE FROM pets WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pet", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
