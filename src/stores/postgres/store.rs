//! `PostgreSQL` implementation of the inventory store.
//!
//! Queries are runtime-checked (`sqlx::query`/`query_as` rather than the
//! compile-time macros) so the crate builds without a live `DATABASE_URL`.
//! Status enums are stored as their stable snake_case strings; prices as
//! DOUBLE PRECISION.
//!
//! # Example
//!
//! ```no_run
//! use trailbook::stores::PostgresInventoryStore;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/trailbook").await?;
//! let store = PostgresInventoryStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use crate::constants::LIMITED_SPOTS_THRESHOLD;
use crate::error::{BookingError, Result};
use crate::providers::{BookingSession, InventoryStore};
use crate::types::{
    Booking, BookingFilter, BookingId, BookingPage, BookingSortField, BookingStats, BookingStatus,
    Departure, DepartureId, DepartureStatus, PaymentStatus, SortOrder, Trip, TripBookingStatus,
    TripId,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::Postgres;
use sqlx::{PgPool, QueryBuilder, Row, Transaction};
use uuid::Uuid;

/// `PostgreSQL` inventory store.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

fn db_err(context: &str, e: &sqlx::Error) -> BookingError {
    BookingError::Database(format!("{context}: {e}"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        db_err.is_unique_violation()
    } else {
        false
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    name: String,
    category: String,
    difficulty: String,
    min_group: i32,
    max_group: i32,
    price: Option<f64>,
    next_departure: Option<DateTime<Utc>>,
    booking_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TripRow> for Trip {
    type Error = BookingError;

    fn try_from(row: TripRow) -> Result<Self> {
        Ok(Self {
            id: TripId::from_uuid(row.id),
            name: row.name,
            category: row.category,
            difficulty: row.difficulty,
            min_group: row.min_group,
            max_group: row.max_group,
            price: row.price,
            next_departure: row.next_departure,
            booking_status: TripBookingStatus::parse(&row.booking_status)
                .map_err(|_| BookingError::Database("corrupt trip booking_status".into()))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DepartureRow {
    id: Uuid,
    trip_id: Uuid,
    date: DateTime<Utc>,
    price: f64,
    max_spots: i32,
    spots_left: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DepartureRow> for Departure {
    type Error = BookingError;

    fn try_from(row: DepartureRow) -> Result<Self> {
        Ok(Self {
            id: DepartureId::from_uuid(row.id),
            trip_id: TripId::from_uuid(row.trip_id),
            date: row.date,
            price: row.price,
            max_spots: row.max_spots,
            spots_left: row.spots_left,
            status: DepartureStatus::parse(&row.status)
                .map_err(|_| BookingError::Database("corrupt departure status".into()))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_number: String,
    trip_id: Uuid,
    departure_id: Option<Uuid>,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    travelers: i32,
    total_price: f64,
    status: String,
    payment_status: String,
    payment_method: Option<String>,
    special_requests: Option<String>,
    ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            booking_number: row.booking_number,
            trip_id: TripId::from_uuid(row.trip_id),
            departure_id: row.departure_id.map(DepartureId::from_uuid),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            travelers: row.travelers,
            total_price: row.total_price,
            status: BookingStatus::parse(&row.status)
                .map_err(|_| BookingError::Database("corrupt booking status".into()))?,
            payment_status: PaymentStatus::parse(&row.payment_status)
                .map_err(|_| BookingError::Database("corrupt payment status".into()))?,
            payment_method: row.payment_method,
            special_requests: row.special_requests,
            ip: row.ip,
            user_agent: row.user_agent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TRIP_COLUMNS: &str = "id, name, category, difficulty, min_group, max_group, price, \
     next_departure, booking_status, created_at, updated_at";

const DEPARTURE_COLUMNS: &str =
    "id, trip_id, date, price, max_spots, spots_left, status, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, booking_number, trip_id, departure_id, first_name, last_name, \
     email, phone, travelers, total_price, status, payment_status, payment_method, \
     special_requests, ip, user_agent, created_at, updated_at";

// ============================================================================
// Store implementation
// ============================================================================

impl InventoryStore for PostgresInventoryStore {
    type Session = PgBookingSession;

    async fn begin(&self) -> Result<PgBookingSession> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to start transaction", &e))?;
        Ok(PgBookingSession { tx })
    }

    async fn trip(&self, id: TripId) -> Result<Trip> {
        let row: Option<TripRow> =
            sqlx::query_as(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("Failed to get trip", &e))?;
        row.ok_or(BookingError::TripNotFound)?.try_into()
    }

    async fn set_trip_cache(
        &self,
        trip_id: TripId,
        price: Option<f64>,
        next_departure: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE trips SET price = $2, next_departure = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(trip_id.0)
        .bind(price)
        .bind(next_departure)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to update trip cache", &e))?;

        if result.rows_affected() == 0 {
            return Err(BookingError::TripNotFound);
        }
        Ok(())
    }

    async fn departure(&self, id: DepartureId) -> Result<Departure> {
        let row: Option<DepartureRow> = sqlx::query_as(&format!(
            "SELECT {DEPARTURE_COLUMNS} FROM departures WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get departure", &e))?;
        row.ok_or(BookingError::DepartureNotFound)?.try_into()
    }

    async fn insert_departure(&self, departure: &Departure) -> Result<()> {
        sqlx::query(
            "INSERT INTO departures \
                 (id, trip_id, date, price, max_spots, spots_left, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(departure.id.0)
        .bind(departure.trip_id.0)
        .bind(departure.date)
        .bind(departure.price)
        .bind(departure.max_spots)
        .bind(departure.spots_left)
        .bind(departure.status.as_str())
        .bind(departure.created_at)
        .bind(departure.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BookingError::DuplicateDeparture
            } else {
                db_err("Failed to insert departure", &e)
            }
        })?;
        Ok(())
    }

    async fn update_departure(&self, departure: &Departure) -> Result<()> {
        let result = sqlx::query(
            "UPDATE departures \
             SET date = $2, price = $3, max_spots = $4, spots_left = $5, status = $6, \
                 updated_at = $7 \
             WHERE id = $1",
        )
        .bind(departure.id.0)
        .bind(departure.date)
        .bind(departure.price)
        .bind(departure.max_spots)
        .bind(departure.spots_left)
        .bind(departure.status.as_str())
        .bind(departure.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BookingError::DuplicateDeparture
            } else {
                db_err("Failed to update departure", &e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(BookingError::DepartureNotFound);
        }
        Ok(())
    }

    async fn delete_departure(&self, id: DepartureId) -> Result<()> {
        let result = sqlx::query("DELETE FROM departures WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("Failed to delete departure", &e))?;

        if result.rows_affected() == 0 {
            return Err(BookingError::DepartureNotFound);
        }
        Ok(())
    }

    async fn all_departures(&self) -> Result<Vec<Departure>> {
        let rows: Vec<DepartureRow> = sqlx::query_as(&format!(
            "SELECT {DEPARTURE_COLUMNS} FROM departures ORDER BY date ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list departures", &e))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn bookable_departures(
        &self,
        trip_id: TripId,
        after: DateTime<Utc>,
    ) -> Result<Vec<Departure>> {
        let rows: Vec<DepartureRow> = sqlx::query_as(&format!(
            "SELECT {DEPARTURE_COLUMNS} FROM departures \
             WHERE trip_id = $1 AND date > $2 AND status IN ('available', 'limited') \
             ORDER BY date ASC"
        ))
        .bind(trip_id.0)
        .bind(after)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list bookable departures", &e))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn active_booking_count(&self, id: DepartureId) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM bookings \
             WHERE departure_id = $1 AND status IN ('pending', 'confirmed')",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to count active bookings", &e))?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| db_err("Failed to read booking count", &e))?;
        Ok(count.unsigned_abs())
    }

    async fn booking(&self, id: BookingId) -> Result<Booking> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get booking", &e))?;
        row.ok_or(BookingError::BookingNotFound)?.try_into()
    }

    async fn booking_by_number(&self, number: &str) -> Result<Booking> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_number = $1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get booking", &e))?;
        row.ok_or(BookingError::BookingNotFound)?.try_into()
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<BookingPage> {
        fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
            let mut sep = " WHERE ";
            if let Some(status) = filter.status {
                builder.push(sep).push("status = ").push_bind(status.as_str());
                sep = " AND ";
            }
            if let Some(email) = &filter.email {
                builder
                    .push(sep)
                    .push("email ILIKE ")
                    .push_bind(format!("%{email}%"));
                sep = " AND ";
            }
            if let Some(trip_id) = filter.trip_id {
                builder.push(sep).push("trip_id = ").push_bind(trip_id.0);
            }
        }

        let mut count_query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM bookings");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_err("Failed to count bookings", &e))?;

        let sort_column = match filter.sort_by {
            BookingSortField::CreatedAt => "created_at",
            BookingSortField::TotalPrice => "total_price",
            BookingSortField::Email => "email",
        };
        let sort_order = match filter.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        let mut list_query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {BOOKING_COLUMNS} FROM bookings"));
        push_filters(&mut list_query, filter);
        list_query
            .push(format!(
                " ORDER BY {sort_column} {sort_order}, id ASC LIMIT "
            ))
            .push_bind(i64::from(filter.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));

        let rows: Vec<BookingRow> = list_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_err("Failed to list bookings", &e))?;

        Ok(BookingPage {
            items: rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_>>()?,
            total: total.unsigned_abs(),
            page: filter.page(),
            limit: filter.limit(),
        })
    }

    async fn booking_stats(&self) -> Result<BookingStats> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE status = 'pending') AS pending, \
                    COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed, \
                    COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled, \
                    COUNT(*) FILTER (WHERE status = 'completed') AS completed, \
                    COALESCE(SUM(total_price) \
                        FILTER (WHERE status IN ('confirmed', 'completed')), 0) AS revenue \
             FROM bookings",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to aggregate booking stats", &e))?;

        let get_count = |name: &str| -> Result<u64> {
            let value: i64 = row
                .try_get(name)
                .map_err(|e| db_err("Failed to read booking stats", &e))?;
            Ok(value.unsigned_abs())
        };

        Ok(BookingStats {
            total_bookings: get_count("total")?,
            pending: get_count("pending")?,
            confirmed: get_count("confirmed")?,
            cancelled: get_count("cancelled")?,
            completed: get_count("completed")?,
            revenue: row
                .try_get("revenue")
                .map_err(|e| db_err("Failed to read booking revenue", &e))?,
        })
    }
}

// ============================================================================
// Transactional session
// ============================================================================

/// Unit of work backed by a `PostgreSQL` transaction.
///
/// Dropping the session without [`BookingSession::commit`] rolls the
/// transaction back (sqlx drop semantics).
pub struct PgBookingSession {
    /// The open transaction.
    tx: Transaction<'static, Postgres>,
}

impl BookingSession for PgBookingSession {
    async fn trip(&mut self, id: TripId) -> Result<Trip> {
        let row: Option<TripRow> =
            sqlx::query_as(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| db_err("Failed to get trip", &e))?;
        row.ok_or(BookingError::TripNotFound)?.try_into()
    }

    async fn departure(&mut self, id: DepartureId) -> Result<Departure> {
        let row: Option<DepartureRow> = sqlx::query_as(&format!(
            "SELECT {DEPARTURE_COLUMNS} FROM departures WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_err("Failed to get departure", &e))?;
        row.ok_or(BookingError::DepartureNotFound)?.try_into()
    }

    async fn booking(&mut self, id: BookingId) -> Result<Booking> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_err("Failed to get booking", &e))?;
        row.ok_or(BookingError::BookingNotFound)?.try_into()
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        sqlx::query(
            "INSERT INTO bookings \
                 (id, booking_number, trip_id, departure_id, first_name, last_name, email, \
                  phone, travelers, total_price, status, payment_status, payment_method, \
                  special_requests, ip, user_agent, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18)",
        )
        .bind(booking.id.0)
        .bind(&booking.booking_number)
        .bind(booking.trip_id.0)
        .bind(booking.departure_id.map(|d| d.0))
        .bind(&booking.first_name)
        .bind(&booking.last_name)
        .bind(&booking.email)
        .bind(&booking.phone)
        .bind(booking.travelers)
        .bind(booking.total_price)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.payment_method)
        .bind(&booking.special_requests)
        .bind(&booking.ip)
        .bind(&booking.user_agent)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_err("Failed to insert booking", &e))?;
        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking) -> Result<()> {
        let result = sqlx::query(
            "UPDATE bookings \
             SET status = $2, payment_status = $3, payment_method = $4, \
                 special_requests = $5, updated_at = $6 \
             WHERE id = $1",
        )
        .bind(booking.id.0)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.payment_method)
        .bind(&booking.special_requests)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_err("Failed to update booking", &e))?;

        if result.rows_affected() == 0 {
            return Err(BookingError::BookingNotFound);
        }
        Ok(())
    }

    async fn adjust_spots(&mut self, id: DepartureId, delta: i32) -> Result<Departure> {
        // Condition and write are one statement: concurrent sessions cannot
        // both pass the capacity check and overdraw the departure. Restores
        // clamp at max_spots, so a cancellation still succeeds after an
        // admin shrank the capacity under the booked count.
        let row: Option<DepartureRow> = sqlx::query_as(&format!(
            "UPDATE departures \
             SET spots_left = LEAST(spots_left + $2, max_spots), \
                 status = CASE \
                     WHEN LEAST(spots_left + $2, max_spots) <= 0 THEN 'sold_out' \
                     WHEN LEAST(spots_left + $2, max_spots) <= $3 THEN 'limited' \
                     ELSE 'available' \
                 END, \
                 updated_at = NOW() \
             WHERE id = $1 \
               AND spots_left + $2 >= 0 \
             RETURNING {DEPARTURE_COLUMNS}"
        ))
        .bind(id.0)
        .bind(delta)
        .bind(LIMITED_SPOTS_THRESHOLD)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_err("Failed to adjust departure spots", &e))?;

        match row {
            Some(row) => row.try_into(),
            None if delta < 0 => Err(BookingError::SlotUnavailable),
            None => Err(BookingError::DepartureNotFound),
        }
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| db_err("Failed to commit transaction", &e))
    }
}
