//! Persistence traits shared by the Postgres store and the in-memory store.
//!
//! Uniqueness is owned by the store: handlers may pre-check for a friendlier
//! message, but the authoritative signal for a duplicate under concurrency
//! is [`StoreError::Duplicate`] surfaced from the insert itself.

mod mem;
mod pg;

pub use mem::MemStore;
pub use pg::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    AdminAccount, Announcement, BlogPost, ClassGroup, Material, NewsletterSubscriber,
    ParentAccount, Student, TeacherAccount,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Duplicate,
    #[error("foreign key constraint violated")]
    ForeignKey,
    #[error("row not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Fallback mapping into the API error taxonomy. Handlers override the
/// `Duplicate` and `NotFound` cases with entity-specific messages where it
/// matters.
impl From<StoreError> for crate::err::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => crate::err::Error::conflict("Dữ liệu đã tồn tại."),
            StoreError::ForeignKey => {
                crate::err::Error::conflict("Dữ liệu liên quan không tồn tại hoặc đang được sử dụng.")
            }
            StoreError::NotFound => crate::err::Error::not_found("Không tìm thấy dữ liệu."),
            StoreError::Backend(cause) => crate::err::Error::internal(cause),
        }
    }
}

/// Per-variant account access used by the generic auth service. Each account
/// variant is its own namespace: the same email may exist as both a parent
/// and a teacher.
#[async_trait]
pub trait CredentialStore<A>: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<A>, StoreError>;

    async fn update_password(&self, id: Uuid, new_hash: &str) -> Result<(), StoreError>;

    /// Only meaningful for admins; the default is a no-op.
    async fn touch_last_login(&self, _id: Uuid) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Domain mutations and reads behind the three portals. Records are built by
/// the mutation handlers (ids, hashes, derived timestamps included) and
/// persisted verbatim; creates fail with [`StoreError::Duplicate`] when a
/// unique key already exists.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_admin(&self, admin: &AdminAccount) -> Result<(), StoreError>;
    async fn create_teacher(&self, teacher: &TeacherAccount) -> Result<(), StoreError>;
    async fn create_parent(&self, parent: &ParentAccount) -> Result<(), StoreError>;

    async fn pending_teachers(&self) -> Result<Vec<TeacherAccount>, StoreError>;
    async fn set_teacher_active(&self, id: Uuid, active: bool)
        -> Result<TeacherAccount, StoreError>;

    async fn create_post(&self, post: &BlogPost) -> Result<(), StoreError>;
    async fn post_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError>;
    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError>;
    async fn published_posts(&self) -> Result<Vec<BlogPost>, StoreError>;
    async fn update_post(&self, post: &BlogPost) -> Result<(), StoreError>;
    async fn delete_post(&self, id: Uuid) -> Result<(), StoreError>;

    async fn create_announcement(&self, announcement: &Announcement) -> Result<(), StoreError>;
    async fn announcements(&self) -> Result<Vec<Announcement>, StoreError>;
    async fn delete_announcement(&self, id: Uuid) -> Result<(), StoreError>;

    async fn create_class(&self, class: &ClassGroup) -> Result<(), StoreError>;
    async fn classes(&self) -> Result<Vec<ClassGroup>, StoreError>;

    async fn create_student(&self, student: &Student) -> Result<(), StoreError>;
    async fn deactivate_student(&self, id: Uuid) -> Result<(), StoreError>;
    async fn students_of_parent(&self, parent_id: Uuid) -> Result<Vec<Student>, StoreError>;

    async fn create_material(&self, material: &Material) -> Result<(), StoreError>;
    async fn materials_of_teacher(&self, teacher_id: Uuid) -> Result<Vec<Material>, StoreError>;
    /// With `owner` set, only a material uploaded by that teacher is touched;
    /// anything else reads as not found.
    async fn deactivate_material(&self, id: Uuid, owner: Option<Uuid>) -> Result<(), StoreError>;

    async fn subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<NewsletterSubscriber>, StoreError>;
    async fn create_subscriber(
        &self,
        subscriber: &NewsletterSubscriber,
    ) -> Result<(), StoreError>;
    async fn reactivate_subscriber(&self, id: Uuid) -> Result<NewsletterSubscriber, StoreError>;
}

/// Everything the application needs from persistence, as one object-safe
/// bundle held in [`crate::state::AppState`].
pub trait Store:
    CredentialStore<AdminAccount>
    + CredentialStore<TeacherAccount>
    + CredentialStore<ParentAccount>
    + ContentStore
{
}

impl<S> Store for S where
    S: CredentialStore<AdminAccount>
        + CredentialStore<TeacherAccount>
        + CredentialStore<ParentAccount>
        + ContentStore
{
}
