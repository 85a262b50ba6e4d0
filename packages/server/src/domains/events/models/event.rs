use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Event model - SQL persistence layer
///
/// The attendee set lives in a `uuid[]` column so that admission can be a
/// single conditional UPDATE: the capacity bound is evaluated by Postgres
/// against the live row, not against a previously read snapshot.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub capacity: i32,

    // Reference into the external image store
    pub image_url: String,
    pub image_public_id: String,

    pub organizer_id: Uuid,

    // Insertion-ordered, duplicate-free
    pub attendees: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new event
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub capacity: i32,
}

/// Input for updating an event; None leaves the stored field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
}

/// Event row joined with its organizer's display identity
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct EventWithOrganizer {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub capacity: i32,
    pub image_url: String,
    pub image_public_id: String,
    pub organizer_id: Uuid,
    pub attendees: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub organizer_name: String,
    pub organizer_email: String,
}

impl Event {
    /// Find event by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// All events sorted by date ascending, with organizer name and email
    pub async fn list_with_organizers(pool: &PgPool) -> Result<Vec<EventWithOrganizer>> {
        sqlx::query_as::<_, EventWithOrganizer>(
            "SELECT e.*, u.name AS organizer_name, u.email AS organizer_email
             FROM events e
             JOIN users u ON u.id = e.organizer_id
             ORDER BY e.date ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert new event with an empty attendee list
    pub async fn insert(
        input: &CreateEvent,
        image_url: &str,
        image_public_id: &str,
        organizer_id: Uuid,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO events (
                title,
                description,
                date,
                location,
                capacity,
                image_url,
                image_public_id,
                organizer_id
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.date)
        .bind(&input.location)
        .bind(input.capacity)
        .bind(image_url)
        .bind(image_public_id)
        .bind(organizer_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Atomically admit an attendee if the event is not full.
    ///
    /// Returns the updated event if the attendee was appended, None if the
    /// guard did not match (full, already a member, or the row is gone).
    /// The capacity check and the append are one statement, so two racing
    /// joins on the last seat cannot both observe it as open.
    pub async fn admit(event_id: Uuid, user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE events
             SET attendees = array_append(attendees, $2),
                 updated_at = NOW()
             WHERE id = $1
               AND cardinality(attendees) < capacity
               AND NOT (attendees @> ARRAY[$2])
             RETURNING *",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Remove an attendee. Removing a non-member is a no-op; None means the
    /// event does not exist.
    pub async fn withdraw(event_id: Uuid, user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE events
             SET attendees = array_remove(attendees, $2),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Partially update an event; unspecified fields keep their value.
    ///
    /// The WHERE clause refuses a capacity below the current attendance, so
    /// the size invariant also holds against an update racing a join.
    /// The organizer column is never touched.
    pub async fn update_fields(
        id: Uuid,
        input: &UpdateEvent,
        image_url: Option<&str>,
        image_public_id: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                date = COALESCE($4, date),
                location = COALESCE($5, location),
                capacity = COALESCE($6, capacity),
                image_url = COALESCE($7, image_url),
                image_public_id = COALESCE($8, image_public_id),
                updated_at = NOW()
             WHERE id = $1
               AND COALESCE($6, capacity) >= cardinality(attendees)
             RETURNING *",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.date)
        .bind(&input.location)
        .bind(input.capacity)
        .bind(image_url)
        .bind(image_public_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Delete the event row. Returns whether a row was removed.
    pub async fn remove(id: Uuid, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the given user is already in the attendee list
    pub fn has_attendee(&self, user_id: Uuid) -> bool {
        self.attendees.contains(&user_id)
    }

    /// Whether the event has reached its capacity
    pub fn is_full(&self) -> bool {
        self.attendees.len() as i32 >= self.capacity
    }
}
