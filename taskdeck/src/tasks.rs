//! Task CRUD scoped to the acting user.
//!
//! Every query filters on `owner_id`, so a task owned by someone else is
//! indistinguishable from one that does not exist: both are `NotFound`.

use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::auth::Identity;
use crate::entity::task;
use crate::error::ServiceError;
use crate::model::{Task, TaskDraft, TaskPatch};

pub struct TaskService {
    db: DatabaseConnection,
}

impl TaskService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All of the caller's tasks, oldest first.
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Task>, ServiceError> {
        let rows = task::Entity::find()
            .filter(task::Column::OwnerId.eq(identity.user_id.as_str()))
            .order_by_asc(task::Column::CreatedAt)
            .order_by_asc(task::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(task::Model::into_task).collect())
    }

    pub async fn get(&self, identity: &Identity, id: &str) -> Result<Task, ServiceError> {
        Ok(self.owned(identity, id).await?.into_task())
    }

    pub async fn create(&self, identity: &Identity, draft: TaskDraft) -> Result<Task, ServiceError> {
        draft.validate()?;

        let now = Utc::now();
        let row = task::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            title: Set(draft.title.trim().to_string()),
            description: Set(draft.description),
            priority: Set(draft.priority.to_string()),
            due_date: Set(draft.due_date),
            completed: Set(draft.completed.is_done()),
            owner_id: Set(identity.user_id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = row.insert(&self.db).await?;

        info!("user {} created task {}", identity.user_id, inserted.id);
        Ok(inserted.into_task())
    }

    /// Apply the fields present in `patch`; the rest keep their stored values.
    pub async fn update(
        &self,
        identity: &Identity,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Task, ServiceError> {
        let existing = self.owned(identity, id).await?;
        if patch.is_empty() {
            return Ok(existing.into_task());
        }
        let mut active: task::ActiveModel = existing.into();

        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(priority) = patch.priority {
            active.priority = Set(priority.to_string());
        }
        if let Some(due_date) = patch.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(completed) = patch.completed {
            active.completed = Set(completed.is_done());
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        info!("user {} updated task {}", identity.user_id, updated.id);
        Ok(updated.into_task())
    }

    pub async fn delete(&self, identity: &Identity, id: &str) -> Result<(), ServiceError> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::OwnerId.eq(identity.user_id.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        info!("user {} deleted task {id}", identity.user_id);
        Ok(())
    }

    async fn owned(&self, identity: &Identity, id: &str) -> Result<task::Model, ServiceError> {
        task::Entity::find_by_id(id.to_string())
            .filter(task::Column::OwnerId.eq(identity.user_id.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }
}
