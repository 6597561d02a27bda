//! PostgreSQL implementation of SessionRepository.
//!
//! Sessions live in `sessions`, transcripts in `session_log` keyed by
//! `(session_id, seq)`. Exclusivity per profile rests on the partial unique
//! index `uq_sessions_active_profile`; updates are compare-and-swap on
//! `version`.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, OperatorId, ProfileId, SessionId, SessionStatus, TenantId, Timestamp,
};
use crate::domain::session::{FailureKind, LogEntry, Sender, Session, SessionOutcome};
use crate::ports::{SessionFilter, SessionRepository};

const ACTIVE_STATUSES: &str = "('pending', 'navigating', 'waiting_response')";

const SESSION_COLUMNS: &str = "id, profile_id, tenant_id, requester, request_text, objective, status, deadline, \
     success, result, summary, failure_kind, reason, finished_at, version, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads transcripts for `rows` and assembles the aggregates.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Session>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<Result<_, _>>()
            .map_err(db_error("read session id"))?;

        let log_rows = sqlx::query(
            "SELECT session_id, seq, sender, text, at FROM session_log \
             WHERE session_id = ANY($1) ORDER BY session_id, seq",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch session log"))?;

        let mut logs: HashMap<Uuid, Vec<LogEntry>> = HashMap::new();
        for row in log_rows {
            let session_id: Uuid = row.try_get("session_id").map_err(db_error("read session_id"))?;
            logs.entry(session_id).or_default().push(row_to_log_entry(&row)?);
        }

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(db_error("read session id"))?;
                row_to_session(&row, logs.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn fetch_one(&self, sql: &str, id: Uuid) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch session"))?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create_exclusive(&self, session: &Session) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        sqlx::query(&format!(
            "INSERT INTO sessions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
            SESSION_COLUMNS
        ))
        .bind(session.id().as_uuid())
        .bind(session.profile_id().as_uuid())
        .bind(session.tenant_id().as_str())
        .bind(session.requester().as_str())
        .bind(session.request_text())
        .bind(session.objective())
        .bind(session.status().as_str())
        .bind(session.deadline().as_datetime())
        .bind(session.outcome().map(|o| o.success))
        .bind(session.outcome().and_then(|o| o.result.clone()))
        .bind(session.outcome().map(|o| o.summary.clone()))
        .bind(session.outcome().and_then(|o| o.failure_kind).map(|k| k.as_str()))
        .bind(session.outcome().map(|o| o.reason.clone()))
        .bind(session.outcome().map(|o| *o.finished_at.as_datetime()))
        .bind(session.version() as i64)
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::new(
                    ErrorCode::SessionAlreadyActive,
                    "Profile already has an active session",
                )
                .with_detail("profile_id", session.profile_id().to_string())
            } else {
                db_error("insert session")(e)
            }
        })?;

        insert_log(&mut tx, session, 0).await?;
        tx.commit().await.map_err(db_error("commit session"))?;
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;
        let expected = session.version() as i64 - 1;

        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                objective = $3, status = $4, deadline = $5, success = $6, result = $7,
                summary = $8, failure_kind = $9, reason = $10, finished_at = $11,
                version = $12, updated_at = $13
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(expected)
        .bind(session.objective())
        .bind(session.status().as_str())
        .bind(session.deadline().as_datetime())
        .bind(session.outcome().map(|o| o.success))
        .bind(session.outcome().and_then(|o| o.result.clone()))
        .bind(session.outcome().map(|o| o.summary.clone()))
        .bind(session.outcome().and_then(|o| o.failure_kind).map(|k| k.as_str()))
        .bind(session.outcome().map(|o| o.reason.clone()))
        .bind(session.outcome().map(|o| *o.finished_at.as_datetime()))
        .bind(session.version() as i64)
        .bind(session.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("update session"))?;

        if result.rows_affected() == 0 {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM sessions WHERE id = $1")
                .bind(session.id().as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("check session version"))?;
            return Err(match exists {
                None => DomainError::new(ErrorCode::SessionNotFound, "Session not found")
                    .with_detail("session_id", session.id().to_string()),
                Some(_) => DomainError::new(
                    ErrorCode::ConcurrentModification,
                    "Session was modified concurrently",
                )
                .with_detail("session_id", session.id().to_string()),
            });
        }

        let (stored_len,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM session_log WHERE session_id = $1")
            .bind(session.id().as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("count session log"))?;
        insert_log(&mut tx, session, stored_len as usize).await?;

        tx.commit().await.map_err(db_error("commit session"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let sql = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        self.fetch_one(&sql, *id.as_uuid()).await
    }

    async fn find_active_by_profile(&self, profile_id: &ProfileId) -> Result<Option<Session>, DomainError> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE profile_id = $1 AND status IN {}",
            SESSION_COLUMNS, ACTIVE_STATUSES
        );
        self.fetch_one(&sql, *profile_id.as_uuid()).await
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>, DomainError> {
        let sql = format!(
            "SELECT {} FROM sessions \
             WHERE ($1::text IS NULL OR tenant_id = $1) \
               AND ($2::uuid IS NULL OR profile_id = $2) \
               AND ($3::text IS NULL OR status = $3) \
             ORDER BY created_at DESC \
             LIMIT $4",
            SESSION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(filter.tenant_id.as_ref().map(|t| t.as_str().to_string()))
            .bind(filter.profile_id.as_ref().map(|p| *p.as_uuid()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.limit.map(i64::from))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list sessions"))?;
        self.hydrate(rows).await
    }

    async fn find_expired(&self, now: &Timestamp) -> Result<Vec<Session>, DomainError> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE status IN {} AND deadline < $1 ORDER BY deadline",
            SESSION_COLUMNS, ACTIVE_STATUSES
        );
        let rows = sqlx::query(&sql)
            .bind(now.as_datetime())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("find expired sessions"))?;
        self.hydrate(rows).await
    }

    async fn delete_by_profile(&self, profile_id: &ProfileId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE profile_id = $1")
            .bind(profile_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete sessions"))?;
        Ok(result.rows_affected())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

/// Appends log entries from `from` onwards. A duplicate `seq` fails the
/// primary key and aborts the transaction.
async fn insert_log(
    tx: &mut Transaction<'_, Postgres>,
    session: &Session,
    from: usize,
) -> Result<(), DomainError> {
    for entry in session.log().iter().skip(from) {
        sqlx::query("INSERT INTO session_log (session_id, seq, sender, text, at) VALUES ($1, $2, $3, $4, $5)")
            .bind(session.id().as_uuid())
            .bind(entry.seq as i32)
            .bind(entry.sender.as_str())
            .bind(&entry.text)
            .bind(entry.at.as_datetime())
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::new(ErrorCode::ConcurrentModification, "Log entry already stored")
                        .with_detail("session_id", session.id().to_string())
                } else {
                    db_error("insert log entry")(e)
                }
            })?;
    }
    Ok(())
}

pub(super) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", context, e))
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == "23505")
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", column, detail))
}

fn row_to_log_entry(row: &PgRow) -> Result<LogEntry, DomainError> {
    let seq: i32 = row.try_get("seq").map_err(db_error("read seq"))?;
    let sender: String = row.try_get("sender").map_err(db_error("read sender"))?;
    let at: chrono::DateTime<chrono::Utc> = row.try_get("at").map_err(db_error("read at"))?;

    Ok(LogEntry {
        seq: u32::try_from(seq).map_err(|e| corrupt("seq", e))?,
        sender: Sender::parse(&sender).map_err(|e| corrupt("sender", e))?,
        text: row.try_get("text").map_err(db_error("read text"))?,
        at: Timestamp::from_datetime(at),
    })
}

fn row_to_session(row: &PgRow, log: Vec<LogEntry>) -> Result<Session, DomainError> {
    let get_str = |column: &'static str| -> Result<String, DomainError> {
        row.try_get::<String, _>(column).map_err(db_error("read session column"))
    };
    let get_time = |column: &'static str| -> Result<chrono::DateTime<chrono::Utc>, DomainError> {
        row.try_get(column).map_err(db_error("read session timestamp"))
    };

    let id: Uuid = row.try_get("id").map_err(db_error("read id"))?;
    let profile_id: Uuid = row.try_get("profile_id").map_err(db_error("read profile_id"))?;
    let status: SessionStatus = get_str("status")?.parse().map_err(|e| corrupt("status", e))?;
    let version: i64 = row.try_get("version").map_err(db_error("read version"))?;

    let success: Option<bool> = row.try_get("success").map_err(db_error("read success"))?;
    let outcome = match success {
        Some(success) => {
            let failure_kind: Option<String> = row.try_get("failure_kind").map_err(db_error("read failure_kind"))?;
            let finished_at: Option<chrono::DateTime<chrono::Utc>> =
                row.try_get("finished_at").map_err(db_error("read finished_at"))?;
            let updated_at = get_time("updated_at")?;
            Some(SessionOutcome {
                success,
                result: row.try_get("result").map_err(db_error("read result"))?,
                summary: row
                    .try_get::<Option<String>, _>("summary")
                    .map_err(db_error("read summary"))?
                    .unwrap_or_default(),
                failure_kind: failure_kind
                    .as_deref()
                    .map(FailureKind::parse)
                    .transpose()
                    .map_err(|e| corrupt("failure_kind", e))?,
                reason: row
                    .try_get::<Option<String>, _>("reason")
                    .map_err(db_error("read reason"))?
                    .unwrap_or_default(),
                finished_at: Timestamp::from_datetime(finished_at.unwrap_or(updated_at)),
            })
        }
        None => None,
    };

    Ok(Session::reconstitute(
        SessionId::from_uuid(id),
        ProfileId::from_uuid(profile_id),
        TenantId::new(get_str("tenant_id")?).map_err(|e| corrupt("tenant_id", e))?,
        OperatorId::new(get_str("requester")?).map_err(|e| corrupt("requester", e))?,
        get_str("request_text")?,
        get_str("objective")?,
        status,
        log,
        Timestamp::from_datetime(get_time("deadline")?),
        outcome,
        u64::try_from(version).map_err(|e| corrupt("version", e))?,
        Timestamp::from_datetime(get_time("created_at")?),
        Timestamp::from_datetime(get_time("updated_at")?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_not_reported_for_other_errors() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn db_error_keeps_context() {
        let err = db_error("fetch session")(sqlx::Error::RowNotFound);
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.starts_with("Failed to fetch session"));
    }

    #[test]
    fn active_statuses_match_the_domain() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::Navigating,
            SessionStatus::WaitingResponse,
        ] {
            assert!(status.is_active());
            assert!(ACTIVE_STATUSES.contains(&format!("'{}'", status.as_str())));
        }
    }
}
