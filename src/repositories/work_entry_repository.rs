use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::entities::work_entry::{Column, Entity as WorkEntries, Model as WorkEntry};
use crate::errors::ServiceError;

use super::{DateOrder, EntryFilter, NewWorkEntry, WorkEntryStore};

/// sea-orm backed store for work entries
#[derive(Debug, Clone)]
pub struct WorkEntryRepository {
    db: Arc<DatabaseConnection>,
}

impl WorkEntryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl WorkEntryStore for WorkEntryRepository {
    #[instrument(skip(self, entry), fields(name = %entry.name))]
    async fn insert(&self, entry: NewWorkEntry) -> Result<WorkEntry, ServiceError> {
        let model = entry.into_model(Uuid::new_v4());
        let inserted = model
            .into_active_model()
            .reset_all()
            .insert(self.get_db())
            .await?;
        debug!(id = %inserted.id, "work entry inserted");
        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkEntry>, ServiceError> {
        WorkEntries::find_by_id(id)
            .one(self.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn find(&self, filter: &EntryFilter, order: DateOrder) -> Result<Vec<WorkEntry>, ServiceError> {
        let mut query = WorkEntries::find();

        if let Some(name) = &filter.name {
            query = query.filter(Column::Name.eq(name.as_str()));
        }
        if let Some(party_to) = &filter.party_to {
            query = query.filter(Column::PartyTo.eq(party_to.as_str()));
        }
        if let Some(vehicle_no) = &filter.vehicle_no {
            query = query.filter(Column::VehicleNo.eq(vehicle_no.as_str()));
        }
        if let Some(window) = filter.window {
            query = query.filter(Column::Date.between(window.start, window.end));
        }

        query = match order {
            DateOrder::Ascending => query.order_by_asc(Column::Date),
            DateOrder::Descending => query.order_by_desc(Column::Date),
        };

        query
            .all(self.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self, entry), fields(id = %entry.id))]
    async fn update(&self, entry: &WorkEntry) -> Result<WorkEntry, ServiceError> {
        entry
            .clone()
            .into_active_model()
            .reset_all()
            .update(self.get_db())
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => {
                    ServiceError::NotFound(format!("work entry {} not found", entry.id))
                }
                other => ServiceError::DatabaseError(other),
            })
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool, ServiceError> {
        let found = WorkEntries::find()
            .filter(Column::Name.eq(name))
            .one(self.get_db())
            .await?;
        Ok(found.is_some())
    }

    async fn distinct_names(&self) -> Result<Vec<String>, ServiceError> {
        let names: Vec<String> = WorkEntries::find()
            .select_only()
            .column(Column::Name)
            .distinct()
            .order_by_asc(Column::Name)
            .into_tuple()
            .all(self.get_db())
            .await?;
        Ok(names)
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        crate::db::check_connection(self.get_db()).await
    }
}
