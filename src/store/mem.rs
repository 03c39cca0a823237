//! In-memory store used by the test suite and for running the server
//! without a database during local development. Uniqueness checks happen
//! under one mutex, which gives the same "exactly one concurrent create
//! wins" behavior the Postgres unique indexes provide.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{ContentStore, CredentialStore, StoreError};
use crate::models::{
    AdminAccount, Announcement, BlogPost, ClassGroup, Material, NewsletterSubscriber,
    ParentAccount, Student, TeacherAccount,
};

#[derive(Default)]
struct Inner {
    admins: Vec<AdminAccount>,
    teachers: Vec<TeacherAccount>,
    parents: Vec<ParentAccount>,
    posts: Vec<BlogPost>,
    announcements: Vec<Announcement>,
    classes: Vec<ClassGroup>,
    students: Vec<Student>,
    materials: Vec<Material>,
    subscribers: Vec<NewsletterSubscriber>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CredentialStore<AdminAccount> for MemStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self.lock().admins.iter().find(|a| a.email == email).cloned())
    }

    async fn update_password(&self, id: Uuid, new_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let admin = inner
            .admins
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        admin.password_hash = new_hash.to_string();
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(admin) = inner.admins.iter_mut().find(|a| a.id == id) {
            admin.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore<TeacherAccount> for MemStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<TeacherAccount>, StoreError> {
        Ok(self
            .lock()
            .teachers
            .iter()
            .find(|t| t.email == email)
            .cloned())
    }

    async fn update_password(&self, id: Uuid, new_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let teacher = inner
            .teachers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        teacher.password_hash = new_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl CredentialStore<ParentAccount> for MemStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<ParentAccount>, StoreError> {
        Ok(self
            .lock()
            .parents
            .iter()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn update_password(&self, id: Uuid, new_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let parent = inner
            .parents
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound)?;
        parent.password_hash = new_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemStore {
    async fn create_admin(&self, admin: &AdminAccount) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.admins.iter().any(|a| a.email == admin.email) {
            return Err(StoreError::Duplicate);
        }
        inner.admins.push(admin.clone());
        Ok(())
    }

    async fn create_teacher(&self, teacher: &TeacherAccount) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.teachers.iter().any(|t| t.email == teacher.email) {
            return Err(StoreError::Duplicate);
        }
        inner.teachers.push(teacher.clone());
        Ok(())
    }

    async fn create_parent(&self, parent: &ParentAccount) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.parents.iter().any(|p| p.email == parent.email) {
            return Err(StoreError::Duplicate);
        }
        inner.parents.push(parent.clone());
        Ok(())
    }

    async fn pending_teachers(&self) -> Result<Vec<TeacherAccount>, StoreError> {
        let mut pending: Vec<_> = self
            .lock()
            .teachers
            .iter()
            .filter(|t| !t.is_active)
            .cloned()
            .collect();
        pending.sort_by_key(|t| t.created_at);
        Ok(pending)
    }

    async fn set_teacher_active(
        &self,
        id: Uuid,
        active: bool,
    ) -> Result<TeacherAccount, StoreError> {
        let mut inner = self.lock();
        let teacher = inner
            .teachers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        teacher.is_active = active;
        Ok(teacher.clone())
    }

    async fn create_post(&self, post: &BlogPost) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.posts.iter().any(|p| p.slug == post.slug) {
            return Err(StoreError::Duplicate);
        }
        inner.posts.push(post.clone());
        Ok(())
    }

    async fn post_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        Ok(self.lock().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        Ok(self.lock().posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn published_posts(&self) -> Result<Vec<BlogPost>, StoreError> {
        let mut posts: Vec<_> = self
            .lock()
            .posts
            .iter()
            .filter(|p| p.published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(posts)
    }

    async fn update_post(&self, post: &BlogPost) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner
            .posts
            .iter()
            .any(|p| p.slug == post.slug && p.id != post.id)
        {
            return Err(StoreError::Duplicate);
        }
        let slot = inner
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(StoreError::NotFound)?;
        *slot = post.clone();
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        if inner.posts.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_announcement(&self, announcement: &Announcement) -> Result<(), StoreError> {
        self.lock().announcements.push(announcement.clone());
        Ok(())
    }

    async fn announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        let mut list = self.lock().announcements.clone();
        list.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(list)
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let before = inner.announcements.len();
        inner.announcements.retain(|a| a.id != id);
        if inner.announcements.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_class(&self, class: &ClassGroup) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.classes.iter().any(|c| c.name == class.name) {
            return Err(StoreError::Duplicate);
        }
        if let Some(teacher_id) = class.teacher_id {
            if !inner.teachers.iter().any(|t| t.id == teacher_id) {
                return Err(StoreError::ForeignKey);
            }
        }
        inner.classes.push(class.clone());
        Ok(())
    }

    async fn classes(&self) -> Result<Vec<ClassGroup>, StoreError> {
        let mut list = self.lock().classes.clone();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn create_student(&self, student: &Student) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.parents.iter().any(|p| p.id == student.parent_id) {
            return Err(StoreError::ForeignKey);
        }
        if let Some(class_id) = student.class_id {
            if !inner.classes.iter().any(|c| c.id == class_id) {
                return Err(StoreError::ForeignKey);
            }
        }
        inner.students.push(student.clone());
        Ok(())
    }

    async fn deactivate_student(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let student = inner
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound)?;
        student.is_active = false;
        Ok(())
    }

    async fn students_of_parent(&self, parent_id: Uuid) -> Result<Vec<Student>, StoreError> {
        let mut list: Vec<_> = self
            .lock()
            .students
            .iter()
            .filter(|s| s.parent_id == parent_id && s.is_active)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        Ok(list)
    }

    async fn create_material(&self, material: &Material) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.teachers.iter().any(|t| t.id == material.uploaded_by) {
            return Err(StoreError::ForeignKey);
        }
        if let Some(class_id) = material.class_id {
            if !inner.classes.iter().any(|c| c.id == class_id) {
                return Err(StoreError::ForeignKey);
            }
        }
        inner.materials.push(material.clone());
        Ok(())
    }

    async fn materials_of_teacher(&self, teacher_id: Uuid) -> Result<Vec<Material>, StoreError> {
        let mut list: Vec<_> = self
            .lock()
            .materials
            .iter()
            .filter(|m| m.uploaded_by == teacher_id && m.is_active)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn deactivate_material(&self, id: Uuid, owner: Option<Uuid>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let material = inner
            .materials
            .iter_mut()
            .find(|m| m.id == id && owner.map_or(true, |o| m.uploaded_by == o))
            .ok_or(StoreError::NotFound)?;
        material.is_active = false;
        Ok(())
    }

    async fn subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<NewsletterSubscriber>, StoreError> {
        Ok(self
            .lock()
            .subscribers
            .iter()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn create_subscriber(
        &self,
        subscriber: &NewsletterSubscriber,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.subscribers.iter().any(|s| s.email == subscriber.email) {
            return Err(StoreError::Duplicate);
        }
        inner.subscribers.push(subscriber.clone());
        Ok(())
    }

    async fn reactivate_subscriber(&self, id: Uuid) -> Result<NewsletterSubscriber, StoreError> {
        let mut inner = self.lock();
        let subscriber = inner
            .subscribers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound)?;
        subscriber.is_active = true;
        subscriber.subscribed_at = Utc::now();
        Ok(subscriber.clone())
    }
}
