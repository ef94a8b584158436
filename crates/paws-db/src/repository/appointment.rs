//! # Appointment Repository
//!
//! Grooming and veterinary bookings. An appointment links a customer, one
//! of their pets and a service type, and snapshots the service's base
//! price at booking time so later price changes never reprice the book.
//!
//! Status transitions are deliberately unrestricted: the front desk
//! corrects mistakes (no-show marked by accident, cancelled client who
//! shows up anyway) by moving the status wherever reality is.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use paws_core::{Appointment, AppointmentStatus, NewAppointment, ServiceType};

// =============================================================================
// Appointment Repository
// =============================================================================

/// Repository for appointment database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = AppointmentRepository::new(pool);
///
/// let appointment = repo.create(&booking).await?;
/// repo.update_status(&appointment.id, AppointmentStatus::Confirmed).await?;
/// ```
#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    pool: SqlitePool,
}

impl AppointmentRepository {
    /// Creates a new AppointmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AppointmentRepository { pool }
    }

    /// Books a new appointment.
    ///
    /// The price is copied from the service type's current base price, so
    /// the quote a client gets on the phone is the price on the day.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Service type doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Customer or pet doesn't exist
    pub async fn create(&self, input: &NewAppointment) -> DbResult<Appointment> {
        let service = sqlx::query_as::<_, ServiceType>(
            "SELECT * FROM service_types WHERE id = ?1",
        )
        .bind(&input.service_type_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("ServiceType", &input.service_type_id))?;

        let appointment = Appointment {
            id: new_id(),
            customer_id: input.customer_id.clone(),
            pet_id: input.pet_id.clone(),
            service_type_id: input.service_type_id.clone(),
            scheduled_at: input.scheduled_at,
            status: AppointmentStatus::Scheduled,
            price_cents: service.base_price_cents,
            notes: input.notes.clone(),
            created_at: Utc::now(),
        };

        debug!(
            id = %appointment.id,
            service = %service.name,
            scheduled_at = %appointment.scheduled_at,
            "Booking appointment"
        );

        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, customer_id, pet_id, service_type_id,
                scheduled_at, status, price_cents, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.customer_id)
        .bind(&appointment.pet_id)
        .bind(&appointment.service_type_id)
        .bind(appointment.scheduled_at)
        .bind(appointment.status)
        .bind(appointment.price_cents)
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(appointment)
    }

    /// Moves an appointment to a new status.
    ///
    /// Any transition is allowed, including backwards ones.
    pub async fn update_status(&self, id: &str, status: AppointmentStatus) -> DbResult<()> {
        debug!(id = %id, status = ?status, "Updating appointment status");

        let result = sqlx::query("UPDATE appointments SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", id));
        }

        Ok(())
    }

    /// Gets an appointment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Appointment>> {
        let appointment =
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(appointment)
    }

    /// Lists all appointments in schedule order.
    pub async fn list(&self) -> DbResult<Vec<Appointment>> {
        let appointments =
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments ORDER BY scheduled_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(appointments)
    }

    /// Lists appointments scheduled within a date range, both ends
    /// inclusive.
    ///
    /// Comparison happens on the calendar date of `scheduled_at`, so a
    /// booking at 23:59 on the end date is included.
    pub async fn list_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<Appointment>> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE DATE(scheduled_at) BETWEEN ?1 AND ?2
            ORDER BY scheduled_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }
}

// =============================================================================
// Service Type Repository
// =============================================================================

/// Repository for the bookable service catalog.
///
/// Service types are seeded by the reference-data migration; this
/// repository only reads them.
#[derive(Debug, Clone)]
pub struct ServiceTypeRepository {
    pool: SqlitePool,
}

impl ServiceTypeRepository {
    /// Creates a new ServiceTypeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceTypeRepository { pool }
    }

    /// Lists all service types sorted by name.
    pub async fn list(&self) -> DbResult<Vec<ServiceType>> {
        let services =
            sqlx::query_as::<_, ServiceType>("SELECT * FROM service_types ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(services)
    }

    /// Gets a service type by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ServiceType>> {
        let service =
            sqlx::query_as::<_, ServiceType>("SELECT * FROM service_types WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(service)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{DateTime, TimeZone};
    use paws_core::{NewCustomer, NewPet};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Registers a customer with one pet and returns (customer_id, pet_id).
    async fn owner_and_pet(db: &Database) -> (String, String) {
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: "Ana Carolina Lima".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let pet = db
            .pets()
            .insert(&NewPet {
                customer_id: customer.id.clone(),
                name: "Luna".to_string(),
                species: "Cat".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (customer.id, pet.id)
    }

    async fn service_named(db: &Database, name: &str) -> ServiceType {
        db.service_types()
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.name == name)
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_booking_snapshots_service_price() {
        let db = setup().await;
        let (customer_id, pet_id) = owner_and_pet(&db).await;
        let bath = service_named(&db, "Basic Bath").await;

        let booking = NewAppointment {
            customer_id: customer_id.clone(),
            pet_id: pet_id.clone(),
            service_type_id: bath.id.clone(),
            scheduled_at: at(2026, 3, 2, 14),
            notes: None,
        };
        let appointment = db.appointments().create(&booking).await.unwrap();
        assert_eq!(appointment.price_cents, bath.base_price_cents);
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);

        // Reprice the service; the existing booking keeps its quote.
        sqlx::query("UPDATE service_types SET base_price_cents = ?2 WHERE id = ?1")
            .bind(&bath.id)
            .bind(9999_i64)
            .execute(db.pool())
            .await
            .unwrap();

        let unchanged = db
            .appointments()
            .get_by_id(&appointment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.price_cents, bath.base_price_cents);

        let rebooked = db.appointments().create(&booking).await.unwrap();
        assert_eq!(rebooked.price_cents, 9999);
    }

    #[tokio::test]
    async fn test_unknown_service_type_rejected() {
        let db = setup().await;
        let (customer_id, pet_id) = owner_and_pet(&db).await;

        let err = db
            .appointments()
            .create(&NewAppointment {
                customer_id,
                pet_id,
                service_type_id: "no-such-service".to_string(),
                scheduled_at: at(2026, 3, 2, 14),
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_booking_requires_existing_pet() {
        let db = setup().await;
        let (customer_id, _) = owner_and_pet(&db).await;
        let bath = service_named(&db, "Basic Bath").await;

        let err = db
            .appointments()
            .create(&NewAppointment {
                customer_id,
                pet_id: "no-such-pet".to_string(),
                service_type_id: bath.id,
                scheduled_at: at(2026, 3, 2, 14),
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_status_transitions_are_permissive() {
        let db = setup().await;
        let (customer_id, pet_id) = owner_and_pet(&db).await;
        let grooming = service_named(&db, "Full Grooming").await;

        let appointment = db
            .appointments()
            .create(&NewAppointment {
                customer_id,
                pet_id,
                service_type_id: grooming.id,
                scheduled_at: at(2026, 3, 2, 9),
                notes: Some("First visit".to_string()),
            })
            .await
            .unwrap();

        // Forward through the normal flow, then backwards to undo a
        // front-desk mistake.
        for status in [
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
            AppointmentStatus::Completed,
            AppointmentStatus::Scheduled,
            AppointmentStatus::NoShow,
        ] {
            db.appointments()
                .update_status(&appointment.id, status)
                .await
                .unwrap();
            let current = db
                .appointments()
                .get_by_id(&appointment.id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(current.status, status);
        }
    }

    #[tokio::test]
    async fn test_update_status_missing_appointment() {
        let db = setup().await;
        let err = db
            .appointments()
            .update_status("ghost", AppointmentStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_between_is_inclusive() {
        let db = setup().await;
        let (customer_id, pet_id) = owner_and_pet(&db).await;
        let bath = service_named(&db, "Basic Bath").await;

        for day in [1, 5, 10] {
            db.appointments()
                .create(&NewAppointment {
                    customer_id: customer_id.clone(),
                    pet_id: pet_id.clone(),
                    service_type_id: bath.id.clone(),
                    scheduled_at: at(2026, 3, day, 23),
                    notes: None,
                })
                .await
                .unwrap();
        }

        let window = db
            .appointments()
            .list_between(
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(window.len(), 2);

        let all = db
            .appointments()
            .list_between(
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_service_catalog_seeded() {
        let db = setup().await;
        let services = db.service_types().list().await.unwrap();
        assert_eq!(services.len(), 6);

        let bath = service_named(&db, "Basic Bath").await;
        assert_eq!(bath.base_price_cents, 2500);
        assert_eq!(bath.duration_minutes, Some(60));

        let fetched = db
            .service_types()
            .get_by_id(&bath.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.name, "Basic Bath");
    }
}
