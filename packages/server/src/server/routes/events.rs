use axum::extract::{Extension, Multipart, Path};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::common::EventError;
use crate::domains::events::{CreateEvent, Event, EventWithOrganizer, UpdateEvent};
use crate::kernel::ImageUpload;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Organizer identity embedded in list responses
#[derive(Serialize)]
pub struct OrganizerInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Event as rendered in `GET /events`
#[derive(Serialize)]
pub struct ListedEvent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub capacity: i32,
    pub image_url: String,
    pub attendees: Vec<Uuid>,
    pub organizer: OrganizerInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventWithOrganizer> for ListedEvent {
    fn from(row: EventWithOrganizer) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            date: row.date,
            location: row.location,
            capacity: row.capacity,
            image_url: row.image_url,
            attendees: row.attendees,
            organizer: OrganizerInfo {
                id: row.organizer_id,
                name: row.organizer_name,
                email: row.organizer_email,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// GET /events - public list, date ascending, organizer populated
pub async fn list_events_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<ListedEvent>>, EventError> {
    let events = state.events.list().await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// POST /events - create an event owned by the caller (image required)
pub async fn create_event_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Event>), EventError> {
    let Extension(user) = auth.ok_or(EventError::Unauthenticated)?;

    let form = EventForm::from_multipart(multipart).await?;
    let (input, image) = form.into_create()?;

    let event = state.events.create(user.user_id, input, image).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /events/:id - organizer-only partial update, image optional
pub async fn update_event_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(event_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Event>, EventError> {
    let Extension(user) = auth.ok_or(EventError::Unauthenticated)?;

    let form = EventForm::from_multipart(multipart).await?;
    let (input, image) = form.into_update()?;

    let event = state
        .events
        .update(user.user_id, event_id, input, image)
        .await?;
    Ok(Json(event))
}

/// DELETE /events/:id - organizer-only delete with asset cleanup
pub async fn delete_event_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, EventError> {
    let Extension(user) = auth.ok_or(EventError::Unauthenticated)?;

    state.events.delete(user.user_id, event_id).await?;
    Ok(Json(json!({ "message": "Event removed" })))
}

/// POST /events/:id/rsvp - atomic join
pub async fn rsvp_event_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, EventError> {
    let Extension(user) = auth.ok_or(EventError::Unauthenticated)?;

    let event = state.events.join(event_id, user.user_id).await?;
    Ok(Json(event))
}

/// POST /events/:id/leave - idempotent removal from the attendee list
pub async fn leave_event_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, EventError> {
    let Extension(user) = auth.ok_or(EventError::Unauthenticated)?;

    let event = state.events.leave(event_id, user.user_id).await?;
    Ok(Json(event))
}

/// Raw multipart form fields for create/update before validation
#[derive(Default)]
struct EventForm {
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    location: Option<String>,
    capacity: Option<String>,
    image: Option<ImageUpload>,
}

impl EventForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, EventError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|_| {
            EventError::Validation("Malformed multipart request".to_string())
        })? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "image" => {
                    let filename = field
                        .file_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| "upload".to_string());
                    let bytes = field.bytes().await.map_err(|_| {
                        EventError::Validation("Could not read image upload".to_string())
                    })?;
                    form.image = Some(ImageUpload {
                        bytes: bytes.to_vec(),
                        filename,
                    });
                }
                "title" => form.title = Some(read_text(field).await?),
                "description" => form.description = Some(read_text(field).await?),
                "date" => form.date = Some(read_text(field).await?),
                "location" => form.location = Some(read_text(field).await?),
                "capacity" => form.capacity = Some(read_text(field).await?),
                // Unknown fields are ignored, matching lenient form clients
                _ => {}
            }
        }

        Ok(form)
    }

    fn into_create(self) -> Result<(CreateEvent, Option<ImageUpload>), EventError> {
        let input = CreateEvent {
            title: self
                .title
                .ok_or_else(|| EventError::Validation("Title is required".to_string()))?,
            description: self
                .description
                .ok_or_else(|| EventError::Validation("Description is required".to_string()))?,
            date: parse_event_date(&self.date.ok_or_else(|| {
                EventError::Validation("Date is required".to_string())
            })?)?,
            location: self
                .location
                .ok_or_else(|| EventError::Validation("Location is required".to_string()))?,
            capacity: parse_capacity(&self.capacity.ok_or_else(|| {
                EventError::Validation("Capacity is required".to_string())
            })?)?,
        };

        Ok((input, self.image))
    }

    fn into_update(self) -> Result<(UpdateEvent, Option<ImageUpload>), EventError> {
        let input = UpdateEvent {
            title: self.title,
            description: self.description,
            date: self.date.as_deref().map(parse_event_date).transpose()?,
            location: self.location,
            capacity: self.capacity.as_deref().map(parse_capacity).transpose()?,
        };

        Ok((input, self.image))
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, EventError> {
    field
        .text()
        .await
        .map_err(|_| EventError::Validation("Malformed multipart request".to_string()))
}

/// Accepts RFC 3339 ("2025-06-01T19:00:00Z") and the datetime-local format
/// browsers submit ("2025-06-01T19:00"), interpreted as UTC.
fn parse_event_date(raw: &str) -> Result<DateTime<Utc>, EventError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(EventError::Validation("Invalid date format".to_string()))
}

fn parse_capacity(raw: &str) -> Result<i32, EventError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| EventError::Validation("Capacity must be a number".to_string()))
}
