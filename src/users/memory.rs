use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::repo::{StoreError, UserStore};
use crate::users::repo_types::{NewUser, User, UserChanges};

/// In-process store with the same ordering and uniqueness rules as the Postgres one.
/// Rows are kept in insertion order.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn clash(rows: &[User], email: &str, except: Option<Uuid>) -> bool {
    rows.iter()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<User>> {
        let rows = self.rows.read().await;
        let skip = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let take = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(rows.iter().skip(skip).take(take).cloned().collect())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.rows.read().await.len() as i64)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.rows.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
        Ok(clash(&self.rows.read().await, email, except))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut rows = self.rows.write().await;
        if clash(&rows, &user.email, None) {
            return Err(StoreError::EmailTaken);
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: user.id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut rows = self.rows.write().await;
        if clash(&rows, &changes.email, Some(id)) {
            return Err(StoreError::EmailTaken);
        }
        let Some(row) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        row.name = changes.name;
        row.email = changes.email;
        if let Some(hash) = changes.password_hash {
            row.password_hash = hash;
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|u| u.id != id);
        Ok(rows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.insert(new_user("a@b.com")).await.expect("first insert");
        let err = store.insert(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_may_keep_own_email_but_not_take_another() {
        let store = MemoryUserStore::new();
        let a = store.insert(new_user("a@b.com")).await.unwrap();
        store.insert(new_user("c@d.com")).await.unwrap();

        let same = UserChanges {
            name: "Alicia".into(),
            email: "a@b.com".into(),
            password_hash: None,
        };
        let updated = store.update(a.id, same).await.unwrap().expect("row exists");
        assert_eq!(updated.name, "Alicia");
        assert_eq!(updated.password_hash, "hash");

        let steal = UserChanges {
            name: "Alicia".into(),
            email: "c@d.com".into(),
            password_hash: None,
        };
        assert!(matches!(
            store.update(a.id, steal).await.unwrap_err(),
            StoreError::EmailTaken
        ));
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let store = MemoryUserStore::new();
        for i in 0..5 {
            store.insert(new_user(&format!("u{}@x.io", i))).await.unwrap();
        }
        let page = store.list(2, 2).await.unwrap();
        let emails: Vec<_> = page.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["u2@x.io", "u3@x.io"]);
        assert!(store.list(10, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let store = MemoryUserStore::new();
        let a = store.insert(new_user("a@b.com")).await.unwrap();
        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
        assert!(store.find(a.id).await.unwrap().is_none());
    }
}
