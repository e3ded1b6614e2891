use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::config::Config;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::Store;

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, role";
const MEMBERSHIP_COLUMNS: &str = "id, player_id, team_id, is_admin, is_active";
const FIELD_COLUMNS: &str = "id, name, images, players_capacity, location_address, is_active";
const SLOT_COLUMNS: &str = "id, field_id, week_day_id, from_time, to_time, price";
const BOOKING_COLUMNS: &str = "id, player_id, team_id, date, status, field_slot_id, price";
const REVIEW_COLUMNS: &str = "id, booking_id, customer_id, rating, comment, is_hidden, created_at";
const ENQUIRY_COLUMNS: &str =
    "id, content, customer_id, status, admin_response, is_hidden, created_at";
const SETTINGS_COLUMNS: &str = "id, admin_id, name, logo_url, about_image_url, about_description, \
     terms_and_conditions, facebook_url, whatsapp_number, phone_number, second_phone_number";

const OVERLAP_EXISTS: &str = r#"SELECT EXISTS(
    SELECT 1 FROM bookings b
    JOIN field_slots s ON s.id = b.field_slot_id
    WHERE s.field_id = $1
      AND b.date = $2
      AND LOWER(TRIM(b.status)) <> 'cancelled'
      AND $3 < s.to_time
      AND $4 > s.from_time
      AND b.id <> $5
)"#;

/// Maps constraint violations to `Conflict`; everything else stays a
/// database error.
fn constraint_conflict(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Database(e)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let pool = db::create_pool(config).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> AppResult<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, phone, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| constraint_conflict(e, "Email already exists"))
    }

    async fn user_by_id(&self, id: i32) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn users_by_role(&self, role: Role) -> AppResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY id"
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_user(&self, user: &User) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, email = $3, phone = $4, password_hash = $5, role = $6 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| constraint_conflict(e, "Email already exists"))?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn create_team_with_admin(
        &self,
        name: &str,
        player_id: i32,
    ) -> AppResult<(Team, TeamPlayer)> {
        let mut tx = self.pool.begin().await?;

        let team: Team = sqlx::query_as(
            "INSERT INTO teams (name, is_active) VALUES ($1, true) RETURNING id, name, is_active",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| constraint_conflict(e, "Team name already exists"))?;

        let membership: TeamPlayer = sqlx::query_as(&format!(
            "INSERT INTO team_players (player_id, team_id, is_admin, is_active) \
             VALUES ($1, $2, true, true) RETURNING {MEMBERSHIP_COLUMNS}"
        ))
        .bind(player_id)
        .bind(team.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((team, membership))
    }

    async fn team_by_id(&self, id: i32) -> AppResult<Option<Team>> {
        Ok(
            sqlx::query_as::<_, Team>("SELECT id, name, is_active FROM teams WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn team_by_name(&self, name: &str) -> AppResult<Option<Team>> {
        Ok(
            sqlx::query_as::<_, Team>("SELECT id, name, is_active FROM teams WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_teams(&self) -> AppResult<Vec<Team>> {
        Ok(
            sqlx::query_as::<_, Team>("SELECT id, name, is_active FROM teams ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn add_membership(&self, membership: NewMembership) -> AppResult<TeamPlayer> {
        sqlx::query_as::<_, TeamPlayer>(&format!(
            "INSERT INTO team_players (player_id, team_id, is_admin, is_active) \
             VALUES ($1, $2, $3, true) RETURNING {MEMBERSHIP_COLUMNS}"
        ))
        .bind(membership.player_id)
        .bind(membership.team_id)
        .bind(membership.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| constraint_conflict(e, "Player is already a member of this team"))
    }

    async fn active_membership(
        &self,
        player_id: i32,
        team_id: i32,
    ) -> AppResult<Option<TeamPlayer>> {
        Ok(sqlx::query_as::<_, TeamPlayer>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM team_players \
             WHERE player_id = $1 AND team_id = $2 AND is_active"
        ))
        .bind(player_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn latest_membership(
        &self,
        player_id: i32,
        team_id: i32,
    ) -> AppResult<Option<TeamPlayer>> {
        Ok(sqlx::query_as::<_, TeamPlayer>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM team_players \
             WHERE player_id = $1 AND team_id = $2 ORDER BY id DESC LIMIT 1"
        ))
        .bind(player_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn team_memberships(&self, team_id: i32) -> AppResult<Vec<TeamPlayer>> {
        Ok(sqlx::query_as::<_, TeamPlayer>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM team_players WHERE team_id = $1 ORDER BY id"
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn player_memberships(&self, player_id: i32) -> AppResult<Vec<TeamPlayer>> {
        Ok(sqlx::query_as::<_, TeamPlayer>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM team_players WHERE player_id = $1 ORDER BY id"
        ))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_membership_active(
        &self,
        membership_id: i32,
        active: bool,
    ) -> AppResult<Option<TeamPlayer>> {
        sqlx::query_as::<_, TeamPlayer>(&format!(
            "UPDATE team_players SET is_active = $2 WHERE id = $1 RETURNING {MEMBERSHIP_COLUMNS}"
        ))
        .bind(membership_id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| constraint_conflict(e, "Player is already a member of this team"))
    }

    async fn leave_team(&self, team_id: i32, player_id: i32) -> AppResult<LeaveOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serialises leaves of the same team.
        let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM teams WHERE id = $1 FOR UPDATE")
            .bind(team_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(LeaveOutcome::NotMember);
        }

        let active = sqlx::query_as::<_, TeamPlayer>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM team_players WHERE team_id = $1 AND is_active"
        ))
        .bind(team_id)
        .fetch_all(&mut *tx)
        .await?;
        let Some(leaving) = active.iter().find(|m| m.player_id == player_id) else {
            return Ok(LeaveOutcome::NotMember);
        };

        let outcome = LeaveOutcome::decide(leaving, &active);
        if let LeaveOutcome::Left { team_deactivated } = outcome {
            sqlx::query("UPDATE team_players SET is_active = false WHERE id = $1")
                .bind(leaving.id)
                .execute(&mut *tx)
                .await?;
            if team_deactivated {
                sqlx::query("UPDATE teams SET is_active = false WHERE id = $1")
                    .bind(team_id)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
        }
        Ok(outcome)
    }

    async fn create_field(&self, field: NewField) -> AppResult<Field> {
        Ok(sqlx::query_as::<_, Field>(&format!(
            "INSERT INTO fields (name, images, players_capacity, location_address, is_active) \
             VALUES ($1, $2, $3, $4, true) RETURNING {FIELD_COLUMNS}"
        ))
        .bind(&field.name)
        .bind(&field.images)
        .bind(field.players_capacity)
        .bind(&field.location_address)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn field_by_id(&self, id: i32) -> AppResult<Option<Field>> {
        Ok(sqlx::query_as::<_, Field>(&format!(
            "SELECT {FIELD_COLUMNS} FROM fields WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_fields(&self) -> AppResult<Vec<Field>> {
        Ok(sqlx::query_as::<_, Field>(&format!(
            "SELECT {FIELD_COLUMNS} FROM fields ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_field(&self, field: &Field) -> AppResult<Field> {
        sqlx::query_as::<_, Field>(&format!(
            "UPDATE fields SET name = $2, images = $3, players_capacity = $4, \
             location_address = $5, is_active = $6 WHERE id = $1 RETURNING {FIELD_COLUMNS}"
        ))
        .bind(field.id)
        .bind(&field.name)
        .bind(&field.images)
        .bind(field.players_capacity)
        .bind(&field.location_address)
        .bind(field.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Field not found".into()))
    }

    async fn delete_field(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM fields WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| constraint_conflict(e, "Field has bookings and cannot be deleted"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn week_day_by_id(&self, id: i32) -> AppResult<Option<WeekDay>> {
        Ok(
            sqlx::query_as::<_, WeekDay>("SELECT id, name FROM week_days WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_slot(&self, slot: NewFieldSlot) -> AppResult<FieldSlot> {
        Ok(sqlx::query_as::<_, FieldSlot>(&format!(
            "INSERT INTO field_slots (field_id, week_day_id, from_time, to_time, price) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SLOT_COLUMNS}"
        ))
        .bind(slot.field_id)
        .bind(slot.week_day_id)
        .bind(slot.from_time)
        .bind(slot.to_time)
        .bind(slot.price)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn slot_by_id(&self, id: i32) -> AppResult<Option<FieldSlot>> {
        Ok(sqlx::query_as::<_, FieldSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM field_slots WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn field_slots(&self, field_id: i32) -> AppResult<Vec<FieldSlot>> {
        Ok(sqlx::query_as::<_, FieldSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM field_slots WHERE field_id = $1 \
             ORDER BY week_day_id, from_time"
        ))
        .bind(field_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_slot(&self, slot: &FieldSlot) -> AppResult<FieldSlot> {
        let mut tx = self.pool.begin().await?;

        let field_id: i32 = sqlx::query_scalar("SELECT field_id FROM field_slots WHERE id = $1")
            .bind(slot.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Field slot not found".into()))?;

        // Same lock as commit_booking, so no booking lands mid-check.
        sqlx::query("SELECT id FROM fields WHERE id = $1 FOR UPDATE")
            .bind(field_id)
            .execute(&mut *tx)
            .await?;

        let live: Vec<(i32, NaiveDate)> = sqlx::query_as(
            "SELECT id, date FROM bookings \
             WHERE field_slot_id = $1 AND LOWER(TRIM(status)) <> 'cancelled'",
        )
        .bind(slot.id)
        .fetch_all(&mut *tx)
        .await?;

        for (booking_id, date) in live {
            let clash: bool = sqlx::query_scalar(OVERLAP_EXISTS)
                .bind(field_id)
                .bind(date)
                .bind(slot.from_time)
                .bind(slot.to_time)
                .bind(booking_id)
                .fetch_one(&mut *tx)
                .await?;
            if clash {
                return Err(AppError::Conflict(SLOT_OVERLAP_MESSAGE.into()));
            }
        }

        let updated = sqlx::query_as::<_, FieldSlot>(&format!(
            "UPDATE field_slots SET week_day_id = $2, from_time = $3, to_time = $4, price = $5 \
             WHERE id = $1 RETURNING {SLOT_COLUMNS}"
        ))
        .bind(slot.id)
        .bind(slot.week_day_id)
        .bind(slot.from_time)
        .bind(slot.to_time)
        .bind(slot.price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_slot(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM field_slots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| constraint_conflict(e, "Field slot has bookings and cannot be deleted"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn bookings_on(&self, field_id: i32, date: NaiveDate) -> AppResult<Vec<BookedInterval>> {
        Ok(sqlx::query_as::<_, BookedInterval>(
            r#"SELECT b.id AS booking_id, s.field_id, b.date, b.status, s.from_time, s.to_time
            FROM bookings b
            JOIN field_slots s ON s.id = b.field_slot_id
            WHERE s.field_id = $1 AND b.date = $2 AND LOWER(TRIM(b.status)) <> 'cancelled'
            ORDER BY s.from_time"#,
        )
        .bind(field_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn commit_booking(
        &self,
        slot: SlotChoice,
        booking: NewBooking,
    ) -> AppResult<BookingCommit> {
        let field_id = slot.field_id();
        let range = slot.range();
        let mut tx = self.pool.begin().await?;

        // Serialises concurrent bookings of the same field.
        let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM fields WHERE id = $1 FOR UPDATE")
            .bind(field_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(AppError::NotFound("Field not found".into()));
        }

        let clash: bool = sqlx::query_scalar(OVERLAP_EXISTS)
            .bind(field_id)
            .bind(booking.date)
            .bind(range.from)
            .bind(range.to)
            .bind(0_i32)
            .fetch_one(&mut *tx)
            .await?;
        if clash {
            return Ok(BookingCommit::Conflict);
        }

        let slot = match slot {
            SlotChoice::Existing(existing) => existing,
            SlotChoice::New(new_slot) => {
                sqlx::query_as::<_, FieldSlot>(&format!(
                    "INSERT INTO field_slots (field_id, week_day_id, from_time, to_time, price) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING {SLOT_COLUMNS}"
                ))
                .bind(new_slot.field_id)
                .bind(new_slot.week_day_id)
                .bind(new_slot.from_time)
                .bind(new_slot.to_time)
                .bind(new_slot.price)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let created: Booking = sqlx::query_as(&format!(
            "INSERT INTO bookings (player_id, team_id, date, status, field_slot_id, price) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.player_id)
        .bind(booking.team_id)
        .bind(booking.date)
        .bind(&booking.status)
        .bind(slot.id)
        .bind(booking.price)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO booking_status_changes (booking_id, status) VALUES ($1, $2)")
            .bind(created.id)
            .bind(&created.status)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(BookingCommit::Committed {
            slot,
            booking: created,
        })
    }

    async fn booking_by_id(&self, id: i32) -> AppResult<Option<Booking>> {
        Ok(sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        Ok(sqlx::query_as::<_, Booking>(
            r#"SELECT b.id, b.player_id, b.team_id, b.date, b.status, b.field_slot_id, b.price
            FROM bookings b
            JOIN field_slots s ON s.id = b.field_slot_id
            WHERE ($1::date IS NULL OR b.date >= $1)
              AND ($2::date IS NULL OR b.date <= $2)
              AND ($3::int IS NULL OR s.field_id = $3)
              AND ($4::int IS NULL OR b.team_id = $4)
              AND ($5::text IS NULL OR LOWER(b.status) = LOWER($5))
            ORDER BY b.id"#,
        )
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(filter.field_id)
        .bind(filter.team_id)
        .bind(filter.status.as_deref())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_booking_status(
        &self,
        booking_id: i32,
        status: &str,
        reason: Option<&str>,
    ) -> AppResult<StatusUpdate> {
        let mut tx = self.pool.begin().await?;

        let slot: Option<FieldSlot> = sqlx::query_as(
            r#"SELECT s.id, s.field_id, s.week_day_id, s.from_time, s.to_time, s.price
            FROM bookings b JOIN field_slots s ON s.id = b.field_slot_id
            WHERE b.id = $1"#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(slot) = slot else {
            return Ok(StatusUpdate::NotFound);
        };

        // Same lock order as commit_booking: field, then booking.
        sqlx::query("SELECT id FROM fields WHERE id = $1 FOR UPDATE")
            .bind(slot.field_id)
            .execute(&mut *tx)
            .await?;

        let current: Booking = match sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?
        {
            Some(b) => b,
            None => return Ok(StatusUpdate::NotFound),
        };

        if is_cancelled(&current.status) && !is_cancelled(status) {
            let clash: bool = sqlx::query_scalar(OVERLAP_EXISTS)
                .bind(slot.field_id)
                .bind(current.date)
                .bind(slot.from_time)
                .bind(slot.to_time)
                .bind(booking_id)
                .fetch_one(&mut *tx)
                .await?;
            if clash {
                return Ok(StatusUpdate::Conflict);
            }
        }

        let updated: Booking = sqlx::query_as(&format!(
            "UPDATE bookings SET status = $2 WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO booking_status_changes (booking_id, status, cancelled_reason) \
             VALUES ($1, $2, $3)",
        )
        .bind(booking_id)
        .bind(status)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(StatusUpdate::Updated(updated))
    }

    async fn status_changes(&self, booking_id: i32) -> AppResult<Vec<BookingStatusChange>> {
        Ok(sqlx::query_as::<_, BookingStatusChange>(
            "SELECT id, booking_id, status, created_at, cancelled_reason \
             FROM booking_status_changes WHERE booking_id = $1 ORDER BY created_at, id",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_review(&self, review: NewReview) -> AppResult<Review> {
        Ok(sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (booking_id, customer_id, rating, comment) \
             VALUES ($1, $2, $3, $4) RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review.booking_id)
        .bind(review.customer_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn review_by_id(&self, id: i32) -> AppResult<Option<Review>> {
        Ok(sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_reviews(&self) -> AppResult<Vec<Review>> {
        Ok(sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_review_hidden(&self, id: i32, hidden: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE reviews SET is_hidden = $2 WHERE id = $1 AND is_hidden <> $2")
            .bind(id)
            .bind(hidden)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_review(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_enquiry(&self, customer_id: i32, content: &str) -> AppResult<Enquiry> {
        Ok(sqlx::query_as::<_, Enquiry>(&format!(
            "INSERT INTO enquiries (content, customer_id, status) \
             VALUES ($1, $2, 'open') RETURNING {ENQUIRY_COLUMNS}"
        ))
        .bind(content)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn enquiry_by_id(&self, id: i32) -> AppResult<Option<Enquiry>> {
        Ok(sqlx::query_as::<_, Enquiry>(&format!(
            "SELECT {ENQUIRY_COLUMNS} FROM enquiries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_enquiries(&self) -> AppResult<Vec<Enquiry>> {
        Ok(sqlx::query_as::<_, Enquiry>(&format!(
            "SELECT {ENQUIRY_COLUMNS} FROM enquiries ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_enquiry(&self, enquiry: &Enquiry) -> AppResult<Enquiry> {
        sqlx::query_as::<_, Enquiry>(&format!(
            "UPDATE enquiries SET content = $2, status = $3, admin_response = $4, is_hidden = $5 \
             WHERE id = $1 RETURNING {ENQUIRY_COLUMNS}"
        ))
        .bind(enquiry.id)
        .bind(&enquiry.content)
        .bind(enquiry.status)
        .bind(&enquiry.admin_response)
        .bind(enquiry.is_hidden)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Enquiry not found".into()))
    }

    async fn current_settings(&self) -> AppResult<Option<Settings>> {
        Ok(sqlx::query_as::<_, Settings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn settings_or_insert(&self, defaults: &Settings) -> AppResult<Settings> {
        let mut tx = self.pool.begin().await?;

        // Blocks a second first-reader until this insert commits.
        sqlx::query("LOCK TABLE settings IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, Settings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let created = sqlx::query_as::<_, Settings>(&format!(
            "INSERT INTO settings (admin_id, name, logo_url, about_image_url, about_description, \
             terms_and_conditions, facebook_url, whatsapp_number, phone_number, second_phone_number) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(defaults.admin_id)
        .bind(&defaults.name)
        .bind(&defaults.logo_url)
        .bind(&defaults.about_image_url)
        .bind(&defaults.about_description)
        .bind(&defaults.terms_and_conditions)
        .bind(&defaults.facebook_url)
        .bind(&defaults.whatsapp_number)
        .bind(&defaults.phone_number)
        .bind(&defaults.second_phone_number)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn save_settings(&self, settings: &Settings) -> AppResult<Settings> {
        sqlx::query_as::<_, Settings>(&format!(
            "UPDATE settings SET admin_id = $2, name = $3, logo_url = $4, about_image_url = $5, \
             about_description = $6, terms_and_conditions = $7, facebook_url = $8, \
             whatsapp_number = $9, phone_number = $10, second_phone_number = $11 \
             WHERE id = $1 RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(settings.id)
        .bind(settings.admin_id)
        .bind(&settings.name)
        .bind(&settings.logo_url)
        .bind(&settings.about_image_url)
        .bind(&settings.about_description)
        .bind(&settings.terms_and_conditions)
        .bind(&settings.facebook_url)
        .bind(&settings.whatsapp_number)
        .bind(&settings.phone_number)
        .bind(&settings.second_phone_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Settings not found".into()))
    }
}
