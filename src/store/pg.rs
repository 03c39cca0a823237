//! Postgres store. Runtime queries; the schema (including the unique and
//! foreign key constraints this module relies on) lives in
//! `migrations/schema.sql`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ContentStore, CredentialStore, StoreError};
use crate::models::{
    AdminAccount, Announcement, BlogPost, ClassGroup, Material, NewsletterSubscriber,
    ParentAccount, Student, TeacherAccount,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("23505") => return StoreError::Duplicate,
            Some("23503") => return StoreError::ForeignKey,
            _ => {}
        }
    }
    StoreError::Backend(err.into())
}

#[async_trait]
impl CredentialStore<AdminAccount> for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminAccount>, StoreError> {
        sqlx::query_as::<_, AdminAccount>("SELECT * FROM admin_accounts WHERE email = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn update_password(&self, id: Uuid, new_hash: &str) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE admin_accounts SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(new_hash)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE admin_accounts SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore<TeacherAccount> for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<TeacherAccount>, StoreError> {
        sqlx::query_as::<_, TeacherAccount>(
            "SELECT * FROM teacher_accounts WHERE email = $1 LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update_password(&self, id: Uuid, new_hash: &str) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE teacher_accounts SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(new_hash)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore<ParentAccount> for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<ParentAccount>, StoreError> {
        sqlx::query_as::<_, ParentAccount>(
            "SELECT * FROM parent_accounts WHERE email = $1 LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update_password(&self, id: Uuid, new_hash: &str) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE parent_accounts SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(new_hash)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn create_admin(&self, admin: &AdminAccount) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO admin_accounts \
             (id, email, password_hash, name, role, is_active, last_login_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(admin.id)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.name)
        .bind(admin.role)
        .bind(admin.is_active)
        .bind(admin.last_login_at)
        .bind(admin.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn create_teacher(&self, teacher: &TeacherAccount) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO teacher_accounts \
             (id, email, password_hash, first_name, last_name, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(teacher.id)
        .bind(&teacher.email)
        .bind(&teacher.password_hash)
        .bind(&teacher.first_name)
        .bind(&teacher.last_name)
        .bind(teacher.is_active)
        .bind(teacher.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn create_parent(&self, parent: &ParentAccount) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO parent_accounts \
             (id, email, password_hash, first_name, last_name, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(parent.id)
        .bind(&parent.email)
        .bind(&parent.password_hash)
        .bind(&parent.first_name)
        .bind(&parent.last_name)
        .bind(parent.is_active)
        .bind(parent.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn pending_teachers(&self) -> Result<Vec<TeacherAccount>, StoreError> {
        sqlx::query_as::<_, TeacherAccount>(
            "SELECT * FROM teacher_accounts WHERE is_active = FALSE ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn set_teacher_active(
        &self,
        id: Uuid,
        active: bool,
    ) -> Result<TeacherAccount, StoreError> {
        sqlx::query_as::<_, TeacherAccount>(
            "UPDATE teacher_accounts SET is_active = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or(StoreError::NotFound)
    }

    async fn create_post(&self, post: &BlogPost) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO blog_posts \
             (id, slug, title, excerpt, body, published, published_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(post.id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(post.published)
        .bind(post.published_at)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn post_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE id = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE slug = $1 LIMIT 1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn published_posts(&self) -> Result<Vec<BlogPost>, StoreError> {
        sqlx::query_as::<_, BlogPost>(
            "SELECT * FROM blog_posts WHERE published = TRUE ORDER BY published_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update_post(&self, post: &BlogPost) -> Result<(), StoreError> {
        let res = sqlx::query(
            "UPDATE blog_posts SET slug = $2, title = $3, excerpt = $4, body = $5, \
             published = $6, published_at = $7 WHERE id = $1",
        )
        .bind(post.id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(post.published)
        .bind(post.published_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_announcement(&self, announcement: &Announcement) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO announcements (id, title, body, pinned, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(announcement.id)
        .bind(&announcement.title)
        .bind(&announcement.body)
        .bind(announcement.pinned)
        .bind(announcement.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements ORDER BY pinned DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_class(&self, class: &ClassGroup) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO class_groups (id, name, level, teacher_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(class.id)
        .bind(&class.name)
        .bind(&class.level)
        .bind(class.teacher_id)
        .bind(class.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn classes(&self) -> Result<Vec<ClassGroup>, StoreError> {
        sqlx::query_as::<_, ClassGroup>("SELECT * FROM class_groups ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn create_student(&self, student: &Student) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO students \
             (id, first_name, last_name, parent_id, class_id, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(student.id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(student.parent_id)
        .bind(student.class_id)
        .bind(student.is_active)
        .bind(student.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn deactivate_student(&self, id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE students SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn students_of_parent(&self, parent_id: Uuid) -> Result<Vec<Student>, StoreError> {
        sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE parent_id = $1 AND is_active = TRUE \
             ORDER BY last_name, first_name",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_material(&self, material: &Material) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO materials \
             (id, title, url, class_id, uploaded_by, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(material.id)
        .bind(&material.title)
        .bind(&material.url)
        .bind(material.class_id)
        .bind(material.uploaded_by)
        .bind(material.is_active)
        .bind(material.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn materials_of_teacher(&self, teacher_id: Uuid) -> Result<Vec<Material>, StoreError> {
        sqlx::query_as::<_, Material>(
            "SELECT * FROM materials WHERE uploaded_by = $1 AND is_active = TRUE \
             ORDER BY created_at DESC",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn deactivate_material(&self, id: Uuid, owner: Option<Uuid>) -> Result<(), StoreError> {
        let res = match owner {
            Some(owner) => {
                sqlx::query(
                    "UPDATE materials SET is_active = FALSE WHERE id = $1 AND uploaded_by = $2",
                )
                .bind(id)
                .bind(owner)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query("UPDATE materials SET is_active = FALSE WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(map_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<NewsletterSubscriber>, StoreError> {
        sqlx::query_as::<_, NewsletterSubscriber>(
            "SELECT * FROM newsletter_subscribers WHERE email = $1 LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_subscriber(
        &self,
        subscriber: &NewsletterSubscriber,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO newsletter_subscribers (id, email, is_active, subscribed_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(subscriber.id)
        .bind(&subscriber.email)
        .bind(subscriber.is_active)
        .bind(subscriber.subscribed_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn reactivate_subscriber(&self, id: Uuid) -> Result<NewsletterSubscriber, StoreError> {
        sqlx::query_as::<_, NewsletterSubscriber>(
            "UPDATE newsletter_subscribers SET is_active = TRUE, subscribed_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or(StoreError::NotFound)
    }
}
