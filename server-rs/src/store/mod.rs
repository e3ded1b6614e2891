//! Persistence seam. Services only see `dyn Store`; production runs on
//! [`PgStore`], tests on [`MemoryStore`].

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::models::*;

#[cfg_attr(not(test), allow(dead_code))]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> AppResult<()>;

    // users
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn user_by_id(&self, id: i32) -> AppResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn users_by_role(&self, role: Role) -> AppResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> AppResult<User>;

    // teams
    /// Creates the team and its first (admin) membership in one unit.
    async fn create_team_with_admin(&self, name: &str, player_id: i32)
        -> AppResult<(Team, TeamPlayer)>;
    async fn team_by_id(&self, id: i32) -> AppResult<Option<Team>>;
    async fn team_by_name(&self, name: &str) -> AppResult<Option<Team>>;
    async fn list_teams(&self) -> AppResult<Vec<Team>>;
    async fn add_membership(&self, membership: NewMembership) -> AppResult<TeamPlayer>;
    async fn active_membership(&self, player_id: i32, team_id: i32)
        -> AppResult<Option<TeamPlayer>>;
    /// Most recent row for the pair, active or not.
    async fn latest_membership(&self, player_id: i32, team_id: i32)
        -> AppResult<Option<TeamPlayer>>;
    async fn team_memberships(&self, team_id: i32) -> AppResult<Vec<TeamPlayer>>;
    async fn player_memberships(&self, player_id: i32) -> AppResult<Vec<TeamPlayer>>;
    async fn set_membership_active(&self, membership_id: i32, active: bool)
        -> AppResult<Option<TeamPlayer>>;
    /// Decides and applies a leave in one unit serialised per team: the
    /// membership goes inactive, and the team too once nobody is left.
    async fn leave_team(&self, team_id: i32, player_id: i32) -> AppResult<LeaveOutcome>;

    // fields
    async fn create_field(&self, field: NewField) -> AppResult<Field>;
    async fn field_by_id(&self, id: i32) -> AppResult<Option<Field>>;
    async fn list_fields(&self) -> AppResult<Vec<Field>>;
    async fn update_field(&self, field: &Field) -> AppResult<Field>;
    /// Removes the field and its slots. `Conflict` when bookings reference them.
    async fn delete_field(&self, id: i32) -> AppResult<bool>;

    async fn week_day_by_id(&self, id: i32) -> AppResult<Option<WeekDay>>;

    // slots
    async fn create_slot(&self, slot: NewFieldSlot) -> AppResult<FieldSlot>;
    async fn slot_by_id(&self, id: i32) -> AppResult<Option<FieldSlot>>;
    async fn field_slots(&self, field_id: i32) -> AppResult<Vec<FieldSlot>>;
    /// Serialised per field. `Conflict` when the new times would make a live
    /// booking of the slot overlap another live booking on the same date.
    async fn update_slot(&self, slot: &FieldSlot) -> AppResult<FieldSlot>;
    /// `Conflict` when bookings reference the slot.
    async fn delete_slot(&self, id: i32) -> AppResult<bool>;

    // bookings
    /// Non-cancelled bookings on `field_id` for `date`, with their intervals.
    async fn bookings_on(&self, field_id: i32, date: NaiveDate) -> AppResult<Vec<BookedInterval>>;
    /// Serialised per field: re-checks overlap, then writes the slot (when
    /// new), the booking and its first status change together.
    async fn commit_booking(&self, slot: SlotChoice, booking: NewBooking)
        -> AppResult<BookingCommit>;
    async fn booking_by_id(&self, id: i32) -> AppResult<Option<Booking>>;
    async fn list_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>>;
    /// Sets the status and appends the audit row together. Leaving the
    /// cancelled state re-runs the overlap check.
    async fn update_booking_status(
        &self,
        booking_id: i32,
        status: &str,
        reason: Option<&str>,
    ) -> AppResult<StatusUpdate>;
    /// Oldest first.
    async fn status_changes(&self, booking_id: i32) -> AppResult<Vec<BookingStatusChange>>;

    // reviews
    async fn create_review(&self, review: NewReview) -> AppResult<Review>;
    async fn review_by_id(&self, id: i32) -> AppResult<Option<Review>>;
    async fn list_reviews(&self) -> AppResult<Vec<Review>>;
    /// `false` when the review is missing or already in that state.
    async fn set_review_hidden(&self, id: i32, hidden: bool) -> AppResult<bool>;
    async fn delete_review(&self, id: i32) -> AppResult<bool>;

    // enquiries
    async fn create_enquiry(&self, customer_id: i32, content: &str) -> AppResult<Enquiry>;
    async fn enquiry_by_id(&self, id: i32) -> AppResult<Option<Enquiry>>;
    async fn list_enquiries(&self) -> AppResult<Vec<Enquiry>>;
    async fn update_enquiry(&self, enquiry: &Enquiry) -> AppResult<Enquiry>;

    // settings
    async fn current_settings(&self) -> AppResult<Option<Settings>>;
    /// Returns the stored record, inserting `defaults` when there is none.
    /// Concurrent callers all see the same row.
    async fn settings_or_insert(&self, defaults: &Settings) -> AppResult<Settings>;
    /// Updates the stored record. `NotFound` when it does not exist.
    async fn save_settings(&self, settings: &Settings) -> AppResult<Settings>;
}
