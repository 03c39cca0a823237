//! Public endpoints: published content reads and the newsletter signup.

use axum::extract::Path;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::err::{proceeds, Error, Payload};
use crate::models::{Announcement, BlogPost, NewsletterSubscriber};
use crate::state::AppState;
use crate::store::{ContentStore, StoreError};
use crate::validate::{Field, Kind, Schema};

pub const MSG_ALREADY_SUBSCRIBED: &str = "Email này đã được đăng ký.";

pub async fn list_posts(Extension(state): Extension<AppState>) -> Payload<Vec<BlogPost>> {
    proceeds(state.store.published_posts().await?)
}

pub async fn get_post(
    Path(slug): Path<String>,
    Extension(state): Extension<AppState>,
) -> Payload<BlogPost> {
    match state.store.post_by_slug(&slug).await? {
        // Drafts are invisible to the public site.
        Some(post) if post.published => proceeds(post),
        _ => Err(Error::not_found("Không tìm thấy bài viết.")),
    }
}

pub async fn list_announcements(
    Extension(state): Extension<AppState>,
) -> Payload<Vec<Announcement>> {
    proceeds(state.store.announcements().await?)
}

const SUBSCRIBE_SCHEMA: Schema = Schema {
    fields: &[Field {
        name: "email",
        label: "email",
        required: true,
        kind: Kind::Email,
    }],
    equal_pairs: &[],
};

#[derive(Debug, Deserialize)]
struct SubscribeInput {
    email: String,
}

/// Subscribing an address that already exists and is active is a conflict;
/// an address that previously unsubscribed is reactivated in place so the
/// unique email constraint never meets a second row.
pub async fn subscribe(
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<NewsletterSubscriber> {
    let input: SubscribeInput = SUBSCRIBE_SCHEMA.parse(raw)?;
    match state.store.subscriber_by_email(&input.email).await? {
        Some(existing) if existing.is_active => Err(Error::conflict(MSG_ALREADY_SUBSCRIBED)),
        Some(existing) => proceeds(state.store.reactivate_subscriber(existing.id).await?),
        None => {
            let subscriber = NewsletterSubscriber {
                id: Uuid::new_v4(),
                email: input.email,
                is_active: true,
                subscribed_at: Utc::now(),
            };
            match state.store.create_subscriber(&subscriber).await {
                Ok(()) => proceeds(subscriber),
                // Lost a race against an identical signup.
                Err(StoreError::Duplicate) => Err(Error::conflict(MSG_ALREADY_SUBSCRIBED)),
                Err(err) => Err(err.into()),
            }
        }
    }
}
