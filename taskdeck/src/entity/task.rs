use log::warn;
use sea_orm::entity::prelude::*;

use crate::model::{Completion, Priority, Task};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub due_date: Date,
    pub completed: bool,
    pub owner_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_task(self) -> Task {
        // Only written from a `Priority`; anything else was edited by hand.
        let priority = self.priority.parse().unwrap_or_else(|_| {
            warn!("task {} has unknown priority {:?}", self.id, self.priority);
            Priority::default()
        });

        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            priority,
            due_date: self.due_date,
            completed: Completion::from_flag(self.completed),
            owner: self.owner_id,
            created_at: self.created_at,
        }
    }
}
