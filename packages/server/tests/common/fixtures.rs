//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use server_core::domains::events::{CreateEvent, Event};
use server_core::domains::users::User;
use server_core::kernel::ImageUpload;

/// Create a user with a unique email (the users table is shared across
/// parallel tests)
pub async fn create_test_user(pool: &PgPool, name: &str) -> Result<User> {
    let email = format!("{}+{}@example.com", name.to_lowercase(), Uuid::new_v4());
    User::insert(name, &email, pool).await
}

/// Create an event a week out with a fixture image reference
pub async fn create_test_event(
    pool: &PgPool,
    organizer: &User,
    title: &str,
    capacity: i32,
) -> Result<Event> {
    create_test_event_at(pool, organizer, title, capacity, Utc::now() + Duration::days(7)).await
}

/// Create an event at a specific date (for list-ordering assertions)
pub async fn create_test_event_at(
    pool: &PgPool,
    organizer: &User,
    title: &str,
    capacity: i32,
    date: DateTime<Utc>,
) -> Result<Event> {
    let input = CreateEvent {
        title: title.to_string(),
        description: "A test event".to_string(),
        date,
        location: "Minneapolis, MN".to_string(),
        capacity,
    };

    Event::insert(
        &input,
        "https://images.test/fixture.jpg",
        "test/fixture",
        organizer.id,
        pool,
    )
    .await
}

/// A small valid image payload for create/update requests
pub fn test_image(filename: &str) -> ImageUpload {
    ImageUpload {
        // JPEG magic bytes are enough for a store that never decodes
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        filename: filename.to_string(),
    }
}
