use anyhow::Context;
use schoolyard_auth::UserRole;
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::announcements::{
    Announcement, AnnouncementFilterParams, Audience, CreateAnnouncementDto,
    PaginatedAnnouncementsResponse, UpdateAnnouncementDto,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::db::not_found;

const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, body, audience, event_date, created_by, created_at, updated_at";

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    role: UserRole,
    filters: &AnnouncementFilterParams,
) {
    qb.push(" WHERE 1 = 1");
    if let Some(visible) = Audience::visible_to(role) {
        let names: Vec<&'static str> = visible.iter().map(Audience::as_str).collect();
        qb.push(" AND audience::text = ANY(").push_bind(names).push(")");
    }
    if let Some(audience) = filters.audience {
        qb.push(" AND audience = ").push_bind(audience);
    }
    if filters.upcoming == Some(true) {
        qb.push(" AND event_date >= CURRENT_DATE");
    }
}

pub struct AnnouncementService;

impl AnnouncementService {
    #[instrument(skip(db, dto), fields(audience = %dto.audience))]
    pub async fn create_announcement(
        db: &PgPool,
        dto: CreateAnnouncementDto,
        created_by: Uuid,
    ) -> Result<Announcement, AppError> {
        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            r#"INSERT INTO announcements (title, body, audience, event_date, created_by)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {}"#,
            ANNOUNCEMENT_COLUMNS
        ))
        .bind(dto.title.trim())
        .bind(&dto.body)
        .bind(dto.audience)
        .bind(dto.event_date)
        .bind(created_by)
        .fetch_one(db)
        .await?;

        info!(announcement_id = %announcement.id, "Announcement published");
        Ok(announcement)
    }

    /// Announcements the role may read, newest first.
    #[instrument(skip(db))]
    pub async fn get_announcements(
        db: &PgPool,
        role: UserRole,
        filters: AnnouncementFilterParams,
    ) -> Result<PaginatedAnnouncementsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM announcements");
        push_filters(&mut count_qb, role, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count announcements")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM announcements",
            ANNOUNCEMENT_COLUMNS
        ));
        push_filters(&mut qb, role, &filters);
        if filters.upcoming == Some(true) {
            qb.push(" ORDER BY event_date, created_at DESC");
        } else {
            qb.push(" ORDER BY created_at DESC");
        }
        qb.push(" LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let announcements = qb.build_query_as::<Announcement>().fetch_all(db).await?;

        Ok(PaginatedAnnouncementsResponse {
            data: announcements,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Announcements outside the role's audience look like missing ones.
    #[instrument(skip(db))]
    pub async fn get_announcement_by_id(
        db: &PgPool,
        id: Uuid,
        role: UserRole,
    ) -> Result<Announcement, AppError> {
        sqlx::query_as::<_, Announcement>(&format!(
            "SELECT {} FROM announcements WHERE id = $1",
            ANNOUNCEMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .filter(|a| a.audience.is_visible_to(role))
        .ok_or_else(|| not_found("Announcement"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_announcement(
        db: &PgPool,
        id: Uuid,
        dto: UpdateAnnouncementDto,
    ) -> Result<Announcement, AppError> {
        sqlx::query_as::<_, Announcement>(&format!(
            r#"UPDATE announcements SET
                   title = COALESCE($1, title),
                   body = COALESCE($2, body),
                   audience = COALESCE($3, audience),
                   event_date = COALESCE($4, event_date)
               WHERE id = $5
               RETURNING {}"#,
            ANNOUNCEMENT_COLUMNS
        ))
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.body)
        .bind(dto.audience)
        .bind(dto.event_date)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found("Announcement"))
    }

    #[instrument(skip(db))]
    pub async fn delete_announcement(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Announcement"));
        }
        Ok(())
    }
}
