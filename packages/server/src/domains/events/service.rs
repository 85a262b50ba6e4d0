use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::common::EventError;
use crate::kernel::{ImageStore, ImageUpload};

use super::assets::AssetCoordinator;
use super::models::event::{CreateEvent, Event, EventWithOrganizer, UpdateEvent};

/// Orchestrates the event lifecycle: create, list, update, delete, join,
/// leave. Mutating operations pass the ownership gate before any side
/// effect; join delegates to the atomic admission query.
#[derive(Clone)]
pub struct EventService {
    pool: PgPool,
    assets: AssetCoordinator,
}

/// Succeeds iff the actor is the event's organizer.
///
/// Must run strictly before any mutating side effect, asset deletion
/// included; a rejected actor leaves the event and its asset untouched.
pub fn authorize_organizer(event: &Event, actor_id: Uuid) -> Result<(), EventError> {
    if event.organizer_id == actor_id {
        Ok(())
    } else {
        Err(EventError::NotAuthorized)
    }
}

impl EventService {
    pub fn new(pool: PgPool, store: Arc<dyn ImageStore>) -> Self {
        Self {
            pool,
            assets: AssetCoordinator::new(store),
        }
    }

    /// Create an event owned by the caller. The image is required and is
    /// stored before the row is written, so every persisted event has a
    /// live asset reference.
    pub async fn create(
        &self,
        organizer_id: Uuid,
        input: CreateEvent,
        image: Option<ImageUpload>,
    ) -> Result<Event, EventError> {
        validate_create(&input)?;

        let image = image.ok_or(EventError::MissingAsset)?;
        let image_ref = self.assets.attach(image).await?;

        let event = Event::insert(
            &input,
            &image_ref.url,
            &image_ref.public_id,
            organizer_id,
            &self.pool,
        )
        .await?;

        info!(event_id = %event.id, organizer_id = %organizer_id, "Created event");
        Ok(event)
    }

    /// All events, date ascending, organizer identity populated. Public.
    pub async fn list(&self) -> Result<Vec<EventWithOrganizer>, EventError> {
        Ok(Event::list_with_organizers(&self.pool).await?)
    }

    /// Update fields the organizer supplied, leaving the rest unchanged.
    /// A new image replaces the stored one; without it the existing
    /// reference is retained.
    pub async fn update(
        &self,
        actor_id: Uuid,
        event_id: Uuid,
        input: UpdateEvent,
        image: Option<ImageUpload>,
    ) -> Result<Event, EventError> {
        validate_update(&input)?;

        let event = Event::find_by_id(event_id, &self.pool)
            .await?
            .ok_or(EventError::NotFound)?;
        authorize_organizer(&event, actor_id)?;

        if let Some(capacity) = input.capacity {
            if (capacity as usize) < event.attendees.len() {
                return Err(EventError::Validation(
                    "Capacity cannot be lower than the current number of attendees".to_string(),
                ));
            }
        }

        let new_ref = match image {
            Some(image) => Some(self.assets.replace(&event.image_public_id, image).await?),
            None => None,
        };

        let updated = Event::update_fields(
            event_id,
            &input,
            new_ref.as_ref().map(|r| r.url.as_str()),
            new_ref.as_ref().map(|r| r.public_id.as_str()),
            &self.pool,
        )
        .await?
        // The guard refused: a join raced the capacity change (or the row
        // is gone). Nothing was written.
        .ok_or_else(|| {
            EventError::Validation(
                "Capacity cannot be lower than the current number of attendees".to_string(),
            )
        })?;

        info!(event_id = %event_id, "Updated event");
        Ok(updated)
    }

    /// Delete an event and try to clean up its stored image. The record
    /// removal succeeds even when the image store rejects the cleanup.
    pub async fn delete(&self, actor_id: Uuid, event_id: Uuid) -> Result<(), EventError> {
        let event = Event::find_by_id(event_id, &self.pool)
            .await?
            .ok_or(EventError::NotFound)?;
        authorize_organizer(&event, actor_id)?;

        self.assets.release(&event.image_public_id).await;
        Event::remove(event_id, &self.pool).await?;

        info!(event_id = %event_id, "Deleted event");
        Ok(())
    }

    /// Atomic join. Any authenticated user may join, the organizer
    /// included; only the capacity bound and the duplicate check gate
    /// admission.
    pub async fn join(&self, event_id: Uuid, user_id: Uuid) -> Result<Event, EventError> {
        let event = Event::find_by_id(event_id, &self.pool)
            .await?
            .ok_or(EventError::NotFound)?;

        // Fast local rejection with a precise error; the conditional write
        // below re-checks both conditions against live state.
        if event.has_attendee(user_id) {
            return Err(EventError::AlreadyMember);
        }

        match Event::admit(event_id, user_id, &self.pool).await? {
            Some(updated) => Ok(updated),
            None => {
                // The guard did not match. Look once more to tell a lost
                // capacity race apart from a concurrent duplicate join.
                let current = Event::find_by_id(event_id, &self.pool)
                    .await?
                    .ok_or(EventError::NotFound)?;

                if current.has_attendee(user_id) {
                    Err(EventError::AlreadyMember)
                } else {
                    Err(EventError::CapacityExceeded)
                }
            }
        }
    }

    /// Idempotent removal from the attendee list. Leaving an event you
    /// never joined is a no-op, not an error.
    pub async fn leave(&self, event_id: Uuid, user_id: Uuid) -> Result<Event, EventError> {
        Event::withdraw(event_id, user_id, &self.pool)
            .await?
            .ok_or(EventError::NotFound)
    }
}

fn validate_create(input: &CreateEvent) -> Result<(), EventError> {
    if input.title.trim().is_empty() {
        return Err(EventError::Validation("Title is required".to_string()));
    }
    if input.description.trim().is_empty() {
        return Err(EventError::Validation(
            "Description is required".to_string(),
        ));
    }
    if input.location.trim().is_empty() {
        return Err(EventError::Validation("Location is required".to_string()));
    }
    validate_capacity(input.capacity)
}

fn validate_update(input: &UpdateEvent) -> Result<(), EventError> {
    if let Some(title) = &input.title {
        if title.trim().is_empty() {
            return Err(EventError::Validation("Title cannot be empty".to_string()));
        }
    }
    if let Some(description) = &input.description {
        if description.trim().is_empty() {
            return Err(EventError::Validation(
                "Description cannot be empty".to_string(),
            ));
        }
    }
    if let Some(location) = &input.location {
        if location.trim().is_empty() {
            return Err(EventError::Validation(
                "Location cannot be empty".to_string(),
            ));
        }
    }
    match input.capacity {
        Some(capacity) => validate_capacity(capacity),
        None => Ok(()),
    }
}

fn validate_capacity(capacity: i32) -> Result<(), EventError> {
    if capacity < 1 {
        return Err(EventError::Validation(
            "Capacity must be a positive number".to_string(),
        ));
    }
    Ok(())
}
