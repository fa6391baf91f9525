//! `PostgreSQL` ticket store.
//!
//! Three tables back the domain (see `schema.sql`): `tickets`,
//! `ticket_results`, and `ticket_events`. Every mutation runs in a single
//! transaction so the ticket row and its audit event land together, and the
//! compare-and-swap on `version` happens inside that transaction via
//! `UPDATE ... WHERE id = $1 AND version = $2`.

use async_trait::async_trait;
use detective_core::{
    EventKind, NewEvent, ResultInsertOutcome, ReviewResult, StorageError, Ticket, TicketEvent,
    TicketFilter, TicketId, TicketStatus, TicketStore, UpdateOutcome, Verdict,
};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

/// Ticket store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresTicketStore {
    /// Connection pool shared with the rest of the server.
    pool: PgPool,
}

impl PostgresTicketStore {
    /// Create a new store on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply `schema.sql` idempotently. Intended for development and tests;
    /// production deployments run the schema out of band.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if any statement fails.
    pub async fn apply_schema(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(include_str!("../../schema.sql"))
            .execute(&self.pool)
            .await
            .map_err(StorageError::new)?;
        Ok(())
    }

    fn row_to_ticket(row: &sqlx::postgres::PgRow) -> Result<Ticket, StorageError> {
        let status_str: String = row.get("status");
        let status = TicketStatus::parse(&status_str)
            .ok_or_else(|| StorageError::new(format!("unknown ticket status '{status_str}'")))?;
        let Json(image_urls): Json<Vec<String>> = row.get("image_urls");

        Ok(Ticket {
            id: TicketId::from_uuid(row.get("id")),
            submitter_id: row.get("submitter_id"),
            brand: row.get("brand"),
            category: row.get("category"),
            notes: row.get("notes"),
            image_urls,
            status,
            assigned_reviewer_id: row.get("assigned_reviewer_id"),
            claimed_at: row.get("claimed_at"),
            version: row.get("version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_result(row: &sqlx::postgres::PgRow) -> Result<ReviewResult, StorageError> {
        let verdict_str: String = row.get("verdict");
        let verdict = Verdict::parse(&verdict_str)
            .ok_or_else(|| StorageError::new(format!("unknown verdict '{verdict_str}'")))?;

        Ok(ReviewResult {
            ticket_id: TicketId::from_uuid(row.get("ticket_id")),
            verdict,
            rationale: row.get("rationale"),
            reviewer_id: row.get("reviewer_id"),
            reviewed_at: row.get("reviewed_at"),
        })
    }

    fn row_to_event(row: &sqlx::postgres::PgRow) -> Result<TicketEvent, StorageError> {
        let kind_str: String = row.get("kind");
        let kind = EventKind::parse(&kind_str)
            .ok_or_else(|| StorageError::new(format!("unknown event kind '{kind_str}'")))?;
        let from_status = parse_optional_status(row.get("from_status"))?;
        let to_status = parse_optional_status(row.get("to_status"))?;

        Ok(TicketEvent {
            seq: row.get("seq"),
            ticket_id: TicketId::from_uuid(row.get("ticket_id")),
            kind,
            actor_id: row.get("actor_id"),
            from_status,
            to_status,
            note: row.get("note"),
            recorded_at: row.get("recorded_at"),
        })
    }
}

fn parse_optional_status(value: Option<String>) -> Result<Option<TicketStatus>, StorageError> {
    value
        .map(|s| {
            TicketStatus::parse(&s)
                .ok_or_else(|| StorageError::new(format!("unknown ticket status '{s}'")))
        })
        .transpose()
}

async fn append_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &NewEvent,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO ticket_events
            (ticket_id, kind, actor_id, from_status, to_status, note, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(event.ticket_id.as_uuid())
    .bind(event.kind.as_str())
    .bind(&event.actor_id)
    .bind(event.from_status.map(TicketStatus::as_str))
    .bind(event.to_status.map(TicketStatus::as_str))
    .bind(&event.note)
    .bind(event.recorded_at)
    .execute(&mut **tx)
    .await
    .map_err(StorageError::new)?;
    Ok(())
}

/// Replace the mutable columns of a ticket row if `expected_version` still
/// matches. Returns the number of rows affected (0 or 1).
async fn cas_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ticket: &Ticket,
    expected_version: i64,
) -> Result<u64, StorageError> {
    let result = sqlx::query(
        r"
        UPDATE tickets
        SET status = $3,
            assigned_reviewer_id = $4,
            claimed_at = $5,
            version = $6,
            updated_at = $7
        WHERE id = $1 AND version = $2
        ",
    )
    .bind(ticket.id.as_uuid())
    .bind(expected_version)
    .bind(ticket.status.as_str())
    .bind(&ticket.assigned_reviewer_id)
    .bind(ticket.claimed_at)
    .bind(ticket.version)
    .bind(ticket.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(StorageError::new)?;
    Ok(result.rows_affected())
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn insert_ticket(&self, ticket: &Ticket, event: &NewEvent) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::new)?;

        sqlx::query(
            r"
            INSERT INTO tickets
                (id, submitter_id, brand, category, notes, image_urls,
                 status, assigned_reviewer_id, claimed_at, version,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(ticket.id.as_uuid())
        .bind(&ticket.submitter_id)
        .bind(&ticket.brand)
        .bind(&ticket.category)
        .bind(&ticket.notes)
        .bind(Json(&ticket.image_urls))
        .bind(ticket.status.as_str())
        .bind(&ticket.assigned_reviewer_id)
        .bind(ticket.claimed_at)
        .bind(ticket.version)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::new)?;

        append_event(&mut tx, event).await?;
        tx.commit().await.map_err(StorageError::new)?;
        Ok(())
    }

    async fn fetch_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, submitter_id, brand, category, notes, image_urls,
                   status, assigned_reviewer_id, claimed_at, version,
                   created_at, updated_at
            FROM tickets
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::new)?;

        row.as_ref().map(Self::row_to_ticket).transpose()
    }

    async fn update_ticket(
        &self,
        ticket: &Ticket,
        expected_version: i64,
        event: &NewEvent,
    ) -> Result<UpdateOutcome, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::new)?;

        if cas_update(&mut tx, ticket, expected_version).await? == 0 {
            return Ok(UpdateOutcome::VersionMismatch);
        }

        append_event(&mut tx, event).await?;
        tx.commit().await.map_err(StorageError::new)?;
        Ok(UpdateOutcome::Applied)
    }

    async fn insert_result(
        &self,
        ticket: &Ticket,
        expected_version: i64,
        result: &ReviewResult,
        event: &NewEvent,
    ) -> Result<ResultInsertOutcome, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::new)?;

        // The primary key on ticket_id makes the one-result-per-ticket rule
        // hold even against a concurrent recorder.
        let inserted = sqlx::query(
            r"
            INSERT INTO ticket_results (ticket_id, verdict, rationale, reviewer_id, reviewed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (ticket_id) DO NOTHING
            ",
        )
        .bind(result.ticket_id.as_uuid())
        .bind(result.verdict.as_str())
        .bind(&result.rationale)
        .bind(&result.reviewer_id)
        .bind(result.reviewed_at)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::new)?;

        if inserted.rows_affected() == 0 {
            return Ok(ResultInsertOutcome::ResultExists);
        }

        if cas_update(&mut tx, ticket, expected_version).await? == 0 {
            return Ok(ResultInsertOutcome::VersionMismatch);
        }

        append_event(&mut tx, event).await?;
        tx.commit().await.map_err(StorageError::new)?;
        Ok(ResultInsertOutcome::Applied)
    }

    async fn fetch_result(&self, id: TicketId) -> Result<Option<ReviewResult>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT ticket_id, verdict, rationale, reviewer_id, reviewed_at
            FROM ticket_results
            WHERE ticket_id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::new)?;

        row.as_ref().map(Self::row_to_result).transpose()
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, submitter_id, brand, category, notes, image_urls,
                   status, assigned_reviewer_id, claimed_at, version,
                   created_at, updated_at
            FROM tickets
            WHERE ($1::text IS NULL OR submitter_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND (NOT $3 OR assigned_reviewer_id IS NULL)
              AND ($4::text IS NULL OR assigned_reviewer_id = $4)
            ORDER BY created_at DESC
            LIMIT $5
            ",
        )
        .bind(&filter.submitter_id)
        .bind(filter.status.map(TicketStatus::as_str))
        .bind(filter.unassigned_only)
        .bind(&filter.reviewer_id)
        .bind(i64::from(filter.effective_limit()))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::new)?;

        rows.iter().map(Self::row_to_ticket).collect()
    }

    async fn list_events(&self, id: TicketId) -> Result<Vec<TicketEvent>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT seq, ticket_id, kind, actor_id, from_status, to_status, note, recorded_at
            FROM ticket_events
            WHERE ticket_id = $1
            ORDER BY recorded_at ASC, seq ASC
            ",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::new)?;

        rows.iter().map(Self::row_to_event).collect()
    }
}
