use async_trait::async_trait;
use chrono::Utc;

use mafs_core::AppError;
use mafs_core::result::AppResult;
use mafs_core::types::{PageRequest, PageResponse};
use mafs_entity::permission::FormPermission;
use mafs_entity::user::{CreateUser, UpdateProfile, UpdateUser, User};

use super::MemoryStore;
use crate::store::{PermissionStore, UserStore};

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("User {id} not found"))
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let data = self.data.read().await;
        let by_username = data
            .users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(login));
        Ok(by_username
            .or_else(|| data.users.values().find(|u| u.person_no == login))
            .cloned())
    }

    async fn find_by_line_id(&self, line_id: &str) -> AppResult<Option<User>> {
        Ok(self
            .data
            .read()
            .await
            .users
            .values()
            .find(|u| u.line_id.as_deref() == Some(line_id))
            .cloned())
    }

    async fn find_many(&self, ids: &[i64]) -> AppResult<Vec<User>> {
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<User>> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let data = self.data.read().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| match &needle {
                Some(n) => {
                    u.display_name.to_lowercase().contains(n)
                        || u.username.to_lowercase().contains(n)
                        || u.person_no.to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(PageResponse::from_vec(users, page))
    }

    async fn list_active_at_level(&self, min_level: i16) -> AppResult<Vec<User>> {
        let data = self.data.read().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| u.is_active && u.permission_level >= min_level)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(users)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.data.read().await.users.len() as i64)
    }

    async fn create(&self, data: CreateUser) -> AppResult<User> {
        let mut store = self.data.write().await;
        let duplicate = store.users.values().any(|u| {
            u.username.eq_ignore_ascii_case(&data.username) || u.person_no == data.person_no
        });
        if duplicate {
            return Err(AppError::conflict(
                "A user with this username or person number already exists",
            ));
        }

        let now = Utc::now();
        let user = User {
            id: store.next_id(),
            person_no: data.person_no,
            username: data.username,
            display_name: data.display_name,
            email: data.email,
            department: data.department,
            group_code: data.group_code,
            permission_level: data.permission_level.value(),
            line_id: None,
            avatar_path: None,
            is_active: true,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, data: UpdateUser) -> AppResult<User> {
        let mut store = self.data.write().await;
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        if let Some(v) = data.display_name {
            user.display_name = v;
        }
        if let Some(v) = data.email {
            user.email = Some(v);
        }
        if let Some(v) = data.department {
            user.department = Some(v);
        }
        if let Some(v) = data.group_code {
            user.group_code = v;
        }
        if let Some(v) = data.permission_level {
            user.permission_level = v.value();
        }
        if let Some(v) = data.is_active {
            user.is_active = v;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_profile(&self, id: i64, data: UpdateProfile) -> AppResult<User> {
        let mut store = self.data.write().await;
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        if let Some(v) = data.display_name {
            user.display_name = v;
        }
        if let Some(v) = data.email {
            user.email = Some(v);
        }
        if let Some(v) = data.department {
            user.department = Some(v);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<()> {
        let mut store = self.data.write().await;
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_line_id(&self, id: i64, line_id: Option<&str>) -> AppResult<User> {
        let mut store = self.data.write().await;
        if let Some(line_id) = line_id {
            let taken = store
                .users
                .values()
                .any(|u| u.id != id && u.line_id.as_deref() == Some(line_id));
            if taken {
                return Err(AppError::conflict(
                    "This LINE account is already linked to another user",
                ));
            }
        }
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        user.line_id = line_id.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_avatar(&self, id: i64, avatar_path: &str) -> AppResult<User> {
        let mut store = self.data.write().await;
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        user.avatar_path = Some(avatar_path.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn touch_login(&self, id: i64) -> AppResult<()> {
        let mut store = self.data.write().await;
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        user.last_login_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn for_group(&self, group_code: &str) -> AppResult<Vec<FormPermission>> {
        Ok(self
            .data
            .read()
            .await
            .permissions
            .iter()
            .filter(|p| p.group_code.eq_ignore_ascii_case(group_code))
            .cloned()
            .collect())
    }

    async fn list(&self) -> AppResult<Vec<FormPermission>> {
        let mut rows = self.data.read().await.permissions.clone();
        rows.sort_by(|a, b| {
            (a.group_code.as_str(), a.form_code.as_str())
                .cmp(&(b.group_code.as_str(), b.form_code.as_str()))
        });
        Ok(rows)
    }

    async fn upsert(&self, permission: &FormPermission) -> AppResult<()> {
        let mut data = self.data.write().await;
        match data.permissions.iter_mut().find(|p| {
            p.group_code == permission.group_code && p.form_code == permission.form_code
        }) {
            Some(existing) => *existing = permission.clone(),
            None => data.permissions.push(permission.clone()),
        }
        Ok(())
    }
}
