//! PostgreSQL implementation of ProfileRepository.
//!
//! Fields and menu options are owned by the profile row and rewritten
//! together with it, in list order, inside one transaction.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::session_repository::{db_error, is_unique_violation};
use crate::domain::foundation::{DomainError, ErrorCode, FieldId, MenuOptionId, ProfileId, TenantId, Timestamp};
use crate::domain::profile::{ChannelAddress, Field, FieldType, MenuOption, Profile, ResponderStyle};
use crate::ports::ProfileRepository;

const PROFILE_COLUMNS: &str = "id, tenant_id, channel_address, name, alias, description, style, \
     max_wait_seconds, max_retries, active, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Profile>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<Result<_, _>>()
            .map_err(db_error("read profile id"))?;

        let field_rows = sqlx::query(
            "SELECT id, profile_id, label, value, phrasings, field_type, priority, required \
             FROM profile_fields WHERE profile_id = ANY($1) ORDER BY profile_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch profile fields"))?;

        let option_rows = sqlx::query(
            "SELECT id, profile_id, value, label, keywords, is_exit \
             FROM profile_menu_options WHERE profile_id = ANY($1) ORDER BY profile_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch menu options"))?;

        let mut fields: HashMap<Uuid, Vec<Field>> = HashMap::new();
        for row in field_rows {
            let profile_id: Uuid = row.try_get("profile_id").map_err(db_error("read profile_id"))?;
            fields.entry(profile_id).or_default().push(row_to_field(&row)?);
        }
        let mut options: HashMap<Uuid, Vec<MenuOption>> = HashMap::new();
        for row in option_rows {
            let profile_id: Uuid = row.try_get("profile_id").map_err(db_error("read profile_id"))?;
            options.entry(profile_id).or_default().push(row_to_menu_option(&row)?);
        }

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(db_error("read profile id"))?;
                row_to_profile(
                    &row,
                    fields.remove(&id).unwrap_or_default(),
                    options.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }
}

fn duplicate_channel(profile: &Profile) -> DomainError {
    DomainError::new(ErrorCode::DuplicateChannel, "Channel address already has a profile")
        .with_detail("channel", profile.channel_address().to_string())
}

fn not_found(id: &ProfileId) -> DomainError {
    DomainError::new(ErrorCode::ProfileNotFound, "Profile not found").with_detail("profile_id", id.to_string())
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn create(&self, profile: &Profile) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        sqlx::query(&format!(
            "INSERT INTO profiles ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            PROFILE_COLUMNS
        ))
        .bind(profile.id().as_uuid())
        .bind(profile.tenant_id().as_str())
        .bind(profile.channel_address().as_str())
        .bind(profile.name())
        .bind(profile.alias())
        .bind(profile.description())
        .bind(profile.style().as_str())
        .bind(profile.max_wait_seconds() as i32)
        .bind(profile.max_retries() as i32)
        .bind(profile.is_active())
        .bind(profile.created_at().as_datetime())
        .bind(profile.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_channel(profile)
            } else {
                db_error("insert profile")(e)
            }
        })?;

        write_children(&mut tx, profile).await?;
        tx.commit().await.map_err(db_error("commit profile"))?;
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                channel_address = $2, name = $3, alias = $4, description = $5, style = $6,
                max_wait_seconds = $7, max_retries = $8, active = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(profile.id().as_uuid())
        .bind(profile.channel_address().as_str())
        .bind(profile.name())
        .bind(profile.alias())
        .bind(profile.description())
        .bind(profile.style().as_str())
        .bind(profile.max_wait_seconds() as i32)
        .bind(profile.max_retries() as i32)
        .bind(profile.is_active())
        .bind(profile.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_channel(profile)
            } else {
                db_error("update profile")(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(not_found(profile.id()));
        }

        for table in ["profile_fields", "profile_menu_options"] {
            sqlx::query(&format!("DELETE FROM {} WHERE profile_id = $1", table))
                .bind(profile.id().as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(db_error("clear profile children"))?;
        }
        write_children(&mut tx, profile).await?;

        tx.commit().await.map_err(db_error("commit profile"))?;
        Ok(())
    }

    async fn delete(&self, id: &ProfileId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete profile"))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch profile"))?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_channel(&self, channel: &ChannelAddress) -> Result<Vec<Profile>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE channel_address = $1 ORDER BY created_at",
            PROFILE_COLUMNS
        ))
        .bind(channel.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch profiles by channel"))?;
        self.hydrate(rows).await
    }

    async fn list_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Profile>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE tenant_id = $1 ORDER BY name",
            PROFILE_COLUMNS
        ))
        .bind(tenant_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list profiles"))?;
        self.hydrate(rows).await
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

async fn write_children(tx: &mut Transaction<'_, Postgres>, profile: &Profile) -> Result<(), DomainError> {
    for (position, field) in profile.fields().iter().enumerate() {
        sqlx::query(
            "INSERT INTO profile_fields (id, profile_id, position, label, value, phrasings, field_type, priority, required) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(field.id.as_uuid())
        .bind(profile.id().as_uuid())
        .bind(position as i32)
        .bind(&field.label)
        .bind(&field.value)
        .bind(&field.phrasings)
        .bind(field.field_type.as_str())
        .bind(field.priority)
        .bind(field.required)
        .execute(&mut **tx)
        .await
        .map_err(db_error("insert field"))?;
    }

    for (position, option) in profile.menu_options().iter().enumerate() {
        sqlx::query(
            "INSERT INTO profile_menu_options (id, profile_id, position, value, label, keywords, is_exit) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(option.id.as_uuid())
        .bind(profile.id().as_uuid())
        .bind(position as i32)
        .bind(&option.value)
        .bind(&option.label)
        .bind(&option.keywords)
        .bind(option.is_exit)
        .execute(&mut **tx)
        .await
        .map_err(db_error("insert menu option"))?;
    }
    Ok(())
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", column, detail))
}

fn row_to_field(row: &PgRow) -> Result<Field, DomainError> {
    let id: Uuid = row.try_get("id").map_err(db_error("read field id"))?;
    let field_type: String = row.try_get("field_type").map_err(db_error("read field_type"))?;

    Ok(Field {
        id: FieldId::from_uuid(id),
        label: row.try_get("label").map_err(db_error("read label"))?,
        value: row.try_get("value").map_err(db_error("read value"))?,
        phrasings: row.try_get("phrasings").map_err(db_error("read phrasings"))?,
        field_type: FieldType::parse(&field_type).map_err(|e| corrupt("field_type", e))?,
        priority: row.try_get("priority").map_err(db_error("read priority"))?,
        required: row.try_get("required").map_err(db_error("read required"))?,
    })
}

fn row_to_menu_option(row: &PgRow) -> Result<MenuOption, DomainError> {
    let id: Uuid = row.try_get("id").map_err(db_error("read menu option id"))?;

    Ok(MenuOption {
        id: MenuOptionId::from_uuid(id),
        value: row.try_get("value").map_err(db_error("read value"))?,
        label: row.try_get("label").map_err(db_error("read label"))?,
        keywords: row.try_get("keywords").map_err(db_error("read keywords"))?,
        is_exit: row.try_get("is_exit").map_err(db_error("read is_exit"))?,
    })
}

fn row_to_profile(row: &PgRow, fields: Vec<Field>, menu_options: Vec<MenuOption>) -> Result<Profile, DomainError> {
    let id: Uuid = row.try_get("id").map_err(db_error("read id"))?;
    let tenant_id: String = row.try_get("tenant_id").map_err(db_error("read tenant_id"))?;
    let channel: String = row.try_get("channel_address").map_err(db_error("read channel_address"))?;
    let style: String = row.try_get("style").map_err(db_error("read style"))?;
    let max_wait: i32 = row.try_get("max_wait_seconds").map_err(db_error("read max_wait_seconds"))?;
    let max_retries: i32 = row.try_get("max_retries").map_err(db_error("read max_retries"))?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at").map_err(db_error("read created_at"))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at").map_err(db_error("read updated_at"))?;

    Ok(Profile::reconstitute(
        ProfileId::from_uuid(id),
        TenantId::new(tenant_id).map_err(|e| corrupt("tenant_id", e))?,
        ChannelAddress::parse(&channel).map_err(|e| corrupt("channel_address", e))?,
        row.try_get("name").map_err(db_error("read name"))?,
        row.try_get("alias").map_err(db_error("read alias"))?,
        row.try_get("description").map_err(db_error("read description"))?,
        ResponderStyle::parse(&style).map_err(|e| corrupt("style", e))?,
        u32::try_from(max_wait).map_err(|e| corrupt("max_wait_seconds", e))?,
        u32::try_from(max_retries).map_err(|e| corrupt("max_retries", e))?,
        row.try_get("active").map_err(db_error("read active"))?,
        fields,
        menu_options,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
