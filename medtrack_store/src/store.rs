use async_trait::async_trait;
use chrono::Utc;
use medtrack_core::{
    Medication, MedicationPatch, MedicationRepo, NewMedication, NewUser, StoreError, User,
    UserRepo,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QueryOrder, Schema, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::convert::{
    medication_from_model, normalize_email, times_per_day_to_column, user_from_model,
};
use crate::entity::{medications, users};

fn is_table_already_exists_error(err: &DbErr) -> bool {
    err.to_string().contains("table") && err.to_string().contains("already exists")
}

/// SQL backed record store for users and their medications.
pub struct MedicationStore {
    db: DatabaseConnection,
}

impl MedicationStore {
    /// Connect and create the tables if they are missing.
    ///
    /// In-memory SQLite URLs are pinned to a single pooled connection so all
    /// queries see the same database.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to database: {}", database_url);

        let mut options = ConnectOptions::new(database_url.to_owned());
        if database_url.contains(":memory:") {
            options.max_connections(1);
        }
        options.sqlx_logging(false);

        let db = Database::connect(options).await?;
        Self::from_connection(db).await
    }

    pub async fn from_connection(db: DatabaseConnection) -> anyhow::Result<Self> {
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);

        for stmt in [
            schema.create_table_from_entity(users::Entity),
            schema.create_table_from_entity(medications::Entity),
        ] {
            match db.execute_unprepared(&backend.build(&stmt).to_string()).await {
                Ok(_) => {}
                Err(e) if is_table_already_exists_error(&e) => {
                    debug!("Table already exists, skipping creation");
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!("MedicationStore initialized");
        Ok(Self { db })
    }

    /// Load a medication and check that `owner_id` owns it.
    async fn owned_medication(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
    ) -> anyhow::Result<medications::Model> {
        let model = medications::Entity::find_by_id(*id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "medication",
                id: *id,
            })?;

        if model.user_id != *owner_id {
            return Err(StoreError::Forbidden.into());
        }
        Ok(model)
    }
}

#[async_trait]
impl UserRepo for MedicationStore {
    async fn create_user(&self, user: &NewUser) -> anyhow::Result<User> {
        user.validate()?;
        let email = normalize_email(&user.email);

        if self.find_user_by_email(&email).await?.is_some() {
            return Err(StoreError::Conflict { field: "email" }.into());
        }

        let model = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            created_at: Set(Utc::now().naive_utc()),
        }
        .insert(&self.db)
        .await?;

        info!("Created user: {}", model.id);
        Ok(user_from_model(model))
    }

    async fn find_user(&self, id: &Uuid) -> anyhow::Result<Option<User>> {
        let model = users::Entity::find_by_id(*id).one(&self.db).await?;
        Ok(model.map(user_from_model))
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?;
        Ok(model.map(user_from_model))
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(user_from_model).collect())
    }
}

#[async_trait]
impl MedicationRepo for MedicationStore {
    async fn create_medication(&self, medication: &NewMedication) -> anyhow::Result<Medication> {
        medication.validate()?;
        let times_per_day = times_per_day_to_column(medication.times_per_day)?;

        if self.find_user(&medication.owner_id).await?.is_none() {
            return Err(StoreError::NotFound {
                entity: "user",
                id: medication.owner_id,
            }
            .into());
        }

        let now = Utc::now().naive_utc();
        let model = medications::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(medication.owner_id),
            medication: Set(medication.medication.clone()),
            dosage: Set(medication.dosage.clone()),
            times_per_day: Set(times_per_day),
            times_to_take: Set(medication.times_to_take.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            "Created medication {} for user {}",
            model.id, medication.owner_id
        );
        Ok(medication_from_model(model))
    }

    async fn find_medication(&self, id: &Uuid) -> anyhow::Result<Option<Medication>> {
        let model = medications::Entity::find_by_id(*id).one(&self.db).await?;
        Ok(model.map(medication_from_model))
    }

    async fn update_medication(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
        patch: &MedicationPatch,
    ) -> anyhow::Result<Medication> {
        patch.validate()?;
        let model = self.owned_medication(id, owner_id).await?;

        let mut medication = medication_from_model(model);
        if patch.is_empty() {
            return Ok(medication);
        }
        patch.apply_to(&mut medication);
        medication.updated_at = Utc::now();

        medications::Entity::update(medications::ActiveModel {
            id: Set(medication.id),
            user_id: Set(medication.owner_id),
            medication: Set(medication.medication.clone()),
            dosage: Set(medication.dosage.clone()),
            times_per_day: Set(times_per_day_to_column(medication.times_per_day)?),
            times_to_take: Set(medication.times_to_take.clone()),
            created_at: Set(medication.created_at.naive_utc()),
            updated_at: Set(medication.updated_at.naive_utc()),
        })
        .exec(&self.db)
        .await?;

        info!("Updated medication: {}", id);
        Ok(medication)
    }

    async fn delete_medication(&self, id: &Uuid, owner_id: &Uuid) -> anyhow::Result<()> {
        self.owned_medication(id, owner_id).await?;

        medications::Entity::delete_by_id(*id)
            .exec(&self.db)
            .await?;

        info!("Deleted medication: {}", id);
        Ok(())
    }

    async fn list_medications(&self, owner_id: &Uuid) -> anyhow::Result<Vec<Medication>> {
        let models = medications::Entity::find()
            .filter(medications::Column::UserId.eq(*owner_id))
            .order_by_asc(medications::Column::CreatedAt)
            .order_by_asc(medications::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(medication_from_model).collect())
    }
}
