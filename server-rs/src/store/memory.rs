use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::Store;

const WEEK_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Default)]
struct Tables {
    seq: i32,
    users: BTreeMap<i32, User>,
    teams: BTreeMap<i32, Team>,
    memberships: BTreeMap<i32, TeamPlayer>,
    fields: BTreeMap<i32, Field>,
    week_days: BTreeMap<i32, WeekDay>,
    slots: BTreeMap<i32, FieldSlot>,
    bookings: BTreeMap<i32, Booking>,
    status_changes: Vec<BookingStatusChange>,
    reviews: BTreeMap<i32, Review>,
    enquiries: BTreeMap<i32, Enquiry>,
    settings: Option<Settings>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.seq += 1;
        self.seq
    }

    fn live_intervals(&self, field_id: i32, date: NaiveDate) -> Vec<BookedInterval> {
        self.bookings
            .values()
            .filter(|b| b.date == date && !is_cancelled(&b.status))
            .filter_map(|b| {
                let slot = self.slots.get(&b.field_slot_id)?;
                (slot.field_id == field_id).then(|| BookedInterval {
                    booking_id: b.id,
                    field_id,
                    date: b.date,
                    status: b.status.clone(),
                    from_time: slot.from_time,
                    to_time: slot.to_time,
                })
            })
            .collect()
    }

    fn overlaps_live(&self, field_id: i32, date: NaiveDate, range: &TimeRange, skip: Option<i32>) -> bool {
        self.live_intervals(field_id, date)
            .iter()
            .filter(|b| Some(b.booking_id) != skip)
            .any(|b| range.overlaps(&b.range()))
    }

    fn append_status(&mut self, booking_id: i32, status: &str, reason: Option<&str>) {
        let id = self.next_id();
        self.status_changes.push(BookingStatusChange {
            id,
            booking_id,
            status: status.to_string(),
            created_at: Utc::now(),
            cancelled_reason: reason.map(String::from),
        });
    }
}

/// In-process store used by tests. Every operation runs under one lock, so
/// multi-row writes are as atomic as the PostgreSQL transactions.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    ops: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (i, name) in WEEK_DAYS.iter().enumerate() {
            let id = i as i32 + 1;
            tables.week_days.insert(
                id,
                WeekDay {
                    id,
                    name: name.to_string(),
                },
            );
        }
        Self {
            tables: Arc::new(RwLock::new(tables)),
            ops: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of store operations served so far.
    pub fn operations(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.tables.read().await
    }

    async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.tables.write().await
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        let _ = self.read().await;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut t = self.write().await;
        if t.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict("Email already exists".into()));
        }
        let id = t.next_id();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
        };
        t.users.insert(id, created.clone());
        Ok(created)
    }

    async fn user_by_id(&self, id: i32) -> AppResult<Option<User>> {
        Ok(self.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let t = self.read().await;
        Ok(t.users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn users_by_role(&self, role: Role) -> AppResult<Vec<User>> {
        let t = self.read().await;
        Ok(t.users.values().filter(|u| u.role == role).cloned().collect())
    }

    async fn update_user(&self, user: &User) -> AppResult<User> {
        let mut t = self.write().await;
        match t.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(user.clone())
            }
            None => Err(AppError::NotFound("User not found".into())),
        }
    }

    async fn create_team_with_admin(
        &self,
        name: &str,
        player_id: i32,
    ) -> AppResult<(Team, TeamPlayer)> {
        let mut t = self.write().await;
        if t.teams.values().any(|team| team.name == name) {
            return Err(AppError::Conflict("Team name already exists".into()));
        }
        let team_id = t.next_id();
        let team = Team {
            id: team_id,
            name: name.to_string(),
            is_active: true,
        };
        let membership_id = t.next_id();
        let membership = TeamPlayer {
            id: membership_id,
            player_id,
            team_id,
            is_admin: true,
            is_active: true,
        };
        t.teams.insert(team_id, team.clone());
        t.memberships.insert(membership_id, membership.clone());
        Ok((team, membership))
    }

    async fn team_by_id(&self, id: i32) -> AppResult<Option<Team>> {
        Ok(self.read().await.teams.get(&id).cloned())
    }

    async fn team_by_name(&self, name: &str) -> AppResult<Option<Team>> {
        let t = self.read().await;
        Ok(t.teams.values().find(|team| team.name == name).cloned())
    }

    async fn list_teams(&self) -> AppResult<Vec<Team>> {
        Ok(self.read().await.teams.values().cloned().collect())
    }

    async fn add_membership(&self, membership: NewMembership) -> AppResult<TeamPlayer> {
        let mut t = self.write().await;
        let duplicate = t.memberships.values().any(|m| {
            m.is_active && m.player_id == membership.player_id && m.team_id == membership.team_id
        });
        if duplicate {
            return Err(AppError::Conflict("Player is already a member of this team".into()));
        }
        let id = t.next_id();
        let row = TeamPlayer {
            id,
            player_id: membership.player_id,
            team_id: membership.team_id,
            is_admin: membership.is_admin,
            is_active: true,
        };
        t.memberships.insert(id, row.clone());
        Ok(row)
    }

    async fn active_membership(
        &self,
        player_id: i32,
        team_id: i32,
    ) -> AppResult<Option<TeamPlayer>> {
        let t = self.read().await;
        Ok(t.memberships
            .values()
            .find(|m| m.is_active && m.player_id == player_id && m.team_id == team_id)
            .cloned())
    }

    async fn latest_membership(
        &self,
        player_id: i32,
        team_id: i32,
    ) -> AppResult<Option<TeamPlayer>> {
        let t = self.read().await;
        Ok(t.memberships
            .values()
            .rev()
            .find(|m| m.player_id == player_id && m.team_id == team_id)
            .cloned())
    }

    async fn team_memberships(&self, team_id: i32) -> AppResult<Vec<TeamPlayer>> {
        let t = self.read().await;
        Ok(t.memberships
            .values()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn player_memberships(&self, player_id: i32) -> AppResult<Vec<TeamPlayer>> {
        let t = self.read().await;
        Ok(t.memberships
            .values()
            .filter(|m| m.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn set_membership_active(
        &self,
        membership_id: i32,
        active: bool,
    ) -> AppResult<Option<TeamPlayer>> {
        let mut t = self.write().await;
        let Some(current) = t.memberships.get(&membership_id).cloned() else {
            return Ok(None);
        };
        if active && !current.is_active {
            let clash = t.memberships.values().any(|m| {
                m.id != membership_id
                    && m.is_active
                    && m.player_id == current.player_id
                    && m.team_id == current.team_id
            });
            if clash {
                return Err(AppError::Conflict("Player is already a member of this team".into()));
            }
        }
        let Some(row) = t.memberships.get_mut(&membership_id) else {
            return Ok(None);
        };
        row.is_active = active;
        Ok(Some(row.clone()))
    }

    async fn leave_team(&self, team_id: i32, player_id: i32) -> AppResult<LeaveOutcome> {
        let mut t = self.write().await;
        let active: Vec<TeamPlayer> = t
            .memberships
            .values()
            .filter(|m| m.team_id == team_id && m.is_active)
            .cloned()
            .collect();
        let Some(leaving) = active.iter().find(|m| m.player_id == player_id) else {
            return Ok(LeaveOutcome::NotMember);
        };
        let outcome = LeaveOutcome::decide(leaving, &active);
        if let LeaveOutcome::Left { team_deactivated } = outcome {
            if let Some(row) = t.memberships.get_mut(&leaving.id) {
                row.is_active = false;
            }
            if team_deactivated {
                if let Some(team) = t.teams.get_mut(&team_id) {
                    team.is_active = false;
                }
            }
        }
        Ok(outcome)
    }

    async fn create_field(&self, field: NewField) -> AppResult<Field> {
        let mut t = self.write().await;
        let id = t.next_id();
        let created = Field {
            id,
            name: field.name,
            images: field.images,
            players_capacity: field.players_capacity,
            location_address: field.location_address,
            is_active: true,
        };
        t.fields.insert(id, created.clone());
        Ok(created)
    }

    async fn field_by_id(&self, id: i32) -> AppResult<Option<Field>> {
        Ok(self.read().await.fields.get(&id).cloned())
    }

    async fn list_fields(&self) -> AppResult<Vec<Field>> {
        Ok(self.read().await.fields.values().cloned().collect())
    }

    async fn update_field(&self, field: &Field) -> AppResult<Field> {
        let mut t = self.write().await;
        match t.fields.get_mut(&field.id) {
            Some(existing) => {
                *existing = field.clone();
                Ok(field.clone())
            }
            None => Err(AppError::NotFound("Field not found".into())),
        }
    }

    async fn delete_field(&self, id: i32) -> AppResult<bool> {
        let mut t = self.write().await;
        if !t.fields.contains_key(&id) {
            return Ok(false);
        }
        let slot_ids: Vec<i32> = t
            .slots
            .values()
            .filter(|s| s.field_id == id)
            .map(|s| s.id)
            .collect();
        if t.bookings.values().any(|b| slot_ids.contains(&b.field_slot_id)) {
            return Err(AppError::Conflict("Field has bookings and cannot be deleted".into()));
        }
        for slot_id in slot_ids {
            t.slots.remove(&slot_id);
        }
        t.fields.remove(&id);
        Ok(true)
    }

    async fn week_day_by_id(&self, id: i32) -> AppResult<Option<WeekDay>> {
        Ok(self.read().await.week_days.get(&id).cloned())
    }

    async fn create_slot(&self, slot: NewFieldSlot) -> AppResult<FieldSlot> {
        let mut t = self.write().await;
        let id = t.next_id();
        let created = FieldSlot {
            id,
            field_id: slot.field_id,
            week_day_id: slot.week_day_id,
            from_time: slot.from_time,
            to_time: slot.to_time,
            price: slot.price,
        };
        t.slots.insert(id, created.clone());
        Ok(created)
    }

    async fn slot_by_id(&self, id: i32) -> AppResult<Option<FieldSlot>> {
        Ok(self.read().await.slots.get(&id).cloned())
    }

    async fn field_slots(&self, field_id: i32) -> AppResult<Vec<FieldSlot>> {
        let t = self.read().await;
        Ok(t.slots
            .values()
            .filter(|s| s.field_id == field_id)
            .cloned()
            .collect())
    }

    async fn update_slot(&self, slot: &FieldSlot) -> AppResult<FieldSlot> {
        let mut t = self.write().await;
        let Some(field_id) = t.slots.get(&slot.id).map(|s| s.field_id) else {
            return Err(AppError::NotFound("Field slot not found".into()));
        };
        let range = slot.range();
        let clash = t
            .bookings
            .values()
            .filter(|b| b.field_slot_id == slot.id && !is_cancelled(&b.status))
            .any(|b| t.overlaps_live(field_id, b.date, &range, Some(b.id)));
        if clash {
            return Err(AppError::Conflict(SLOT_OVERLAP_MESSAGE.into()));
        }

        let updated = FieldSlot {
            field_id,
            ..slot.clone()
        };
        t.slots.insert(slot.id, updated.clone());
        Ok(updated)
    }

    async fn delete_slot(&self, id: i32) -> AppResult<bool> {
        let mut t = self.write().await;
        if !t.slots.contains_key(&id) {
            return Ok(false);
        }
        if t.bookings.values().any(|b| b.field_slot_id == id) {
            return Err(AppError::Conflict("Field slot has bookings and cannot be deleted".into()));
        }
        t.slots.remove(&id);
        Ok(true)
    }

    async fn bookings_on(&self, field_id: i32, date: NaiveDate) -> AppResult<Vec<BookedInterval>> {
        Ok(self.read().await.live_intervals(field_id, date))
    }

    async fn commit_booking(
        &self,
        slot: SlotChoice,
        booking: NewBooking,
    ) -> AppResult<BookingCommit> {
        let mut t = self.write().await;
        let field_id = slot.field_id();
        if !t.fields.contains_key(&field_id) {
            return Err(AppError::NotFound("Field not found".into()));
        }
        if t.overlaps_live(field_id, booking.date, &slot.range(), None) {
            return Ok(BookingCommit::Conflict);
        }

        let slot = match slot {
            SlotChoice::Existing(existing) => existing,
            SlotChoice::New(new_slot) => {
                let id = t.next_id();
                let created = FieldSlot {
                    id,
                    field_id: new_slot.field_id,
                    week_day_id: new_slot.week_day_id,
                    from_time: new_slot.from_time,
                    to_time: new_slot.to_time,
                    price: new_slot.price,
                };
                t.slots.insert(id, created.clone());
                created
            }
        };

        let id = t.next_id();
        let created = Booking {
            id,
            player_id: booking.player_id,
            team_id: booking.team_id,
            date: booking.date,
            status: booking.status,
            field_slot_id: slot.id,
            price: booking.price,
        };
        t.bookings.insert(id, created.clone());
        t.append_status(id, &created.status, None);

        Ok(BookingCommit::Committed {
            slot,
            booking: created,
        })
    }

    async fn booking_by_id(&self, id: i32) -> AppResult<Option<Booking>> {
        Ok(self.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        let t = self.read().await;
        Ok(t.bookings
            .values()
            .filter(|b| {
                let field_id = t.slots.get(&b.field_slot_id).map(|s| s.field_id).unwrap_or(0);
                filter.matches(b, field_id)
            })
            .cloned()
            .collect())
    }

    async fn update_booking_status(
        &self,
        booking_id: i32,
        status: &str,
        reason: Option<&str>,
    ) -> AppResult<StatusUpdate> {
        let mut t = self.write().await;
        let Some(current) = t.bookings.get(&booking_id).cloned() else {
            return Ok(StatusUpdate::NotFound);
        };
        if is_cancelled(&current.status) && !is_cancelled(status) {
            if let Some(slot) = t.slots.get(&current.field_slot_id).cloned() {
                if t.overlaps_live(slot.field_id, current.date, &slot.range(), Some(booking_id)) {
                    return Ok(StatusUpdate::Conflict);
                }
            }
        }
        let Some(row) = t.bookings.get_mut(&booking_id) else {
            return Ok(StatusUpdate::NotFound);
        };
        row.status = status.to_string();
        let updated = row.clone();
        t.append_status(booking_id, status, reason);
        Ok(StatusUpdate::Updated(updated))
    }

    async fn status_changes(&self, booking_id: i32) -> AppResult<Vec<BookingStatusChange>> {
        let t = self.read().await;
        Ok(t.status_changes
            .iter()
            .filter(|c| c.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> AppResult<Review> {
        let mut t = self.write().await;
        let id = t.next_id();
        let created = Review {
            id,
            booking_id: review.booking_id,
            customer_id: review.customer_id,
            rating: review.rating,
            comment: review.comment,
            is_hidden: false,
            created_at: Utc::now(),
        };
        t.reviews.insert(id, created.clone());
        Ok(created)
    }

    async fn review_by_id(&self, id: i32) -> AppResult<Option<Review>> {
        Ok(self.read().await.reviews.get(&id).cloned())
    }

    async fn list_reviews(&self) -> AppResult<Vec<Review>> {
        Ok(self.read().await.reviews.values().cloned().collect())
    }

    async fn set_review_hidden(&self, id: i32, hidden: bool) -> AppResult<bool> {
        let mut t = self.write().await;
        match t.reviews.get_mut(&id) {
            Some(review) if review.is_hidden != hidden => {
                review.is_hidden = hidden;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_review(&self, id: i32) -> AppResult<bool> {
        Ok(self.write().await.reviews.remove(&id).is_some())
    }

    async fn create_enquiry(&self, customer_id: i32, content: &str) -> AppResult<Enquiry> {
        let mut t = self.write().await;
        let id = t.next_id();
        let created = Enquiry {
            id,
            content: content.to_string(),
            customer_id,
            status: EnquiryStatus::Open,
            admin_response: None,
            is_hidden: false,
            created_at: Utc::now(),
        };
        t.enquiries.insert(id, created.clone());
        Ok(created)
    }

    async fn enquiry_by_id(&self, id: i32) -> AppResult<Option<Enquiry>> {
        Ok(self.read().await.enquiries.get(&id).cloned())
    }

    async fn list_enquiries(&self) -> AppResult<Vec<Enquiry>> {
        Ok(self.read().await.enquiries.values().cloned().collect())
    }

    async fn update_enquiry(&self, enquiry: &Enquiry) -> AppResult<Enquiry> {
        let mut t = self.write().await;
        match t.enquiries.get_mut(&enquiry.id) {
            Some(existing) => {
                *existing = enquiry.clone();
                Ok(enquiry.clone())
            }
            None => Err(AppError::NotFound("Enquiry not found".into())),
        }
    }

    async fn current_settings(&self) -> AppResult<Option<Settings>> {
        Ok(self.read().await.settings.clone())
    }

    async fn settings_or_insert(&self, defaults: &Settings) -> AppResult<Settings> {
        let mut t = self.write().await;
        if let Some(existing) = &t.settings {
            return Ok(existing.clone());
        }
        let id = t.next_id();
        let saved = Settings {
            id,
            ..defaults.clone()
        };
        t.settings = Some(saved.clone());
        Ok(saved)
    }

    async fn save_settings(&self, settings: &Settings) -> AppResult<Settings> {
        let mut t = self.write().await;
        match t.settings.as_mut() {
            Some(existing) if existing.id == settings.id => {
                *existing = settings.clone();
                Ok(settings.clone())
            }
            _ => Err(AppError::NotFound("Settings not found".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    async fn field(store: &MemoryStore) -> Field {
        store
            .create_field(NewField {
                name: "Pitch 1".into(),
                images: String::new(),
                players_capacity: 10,
                location_address: "Cairo".into(),
            })
            .await
            .unwrap()
    }

    fn new_slot(field_id: i32, from: NaiveTime, to: NaiveTime) -> SlotChoice {
        SlotChoice::New(NewFieldSlot {
            field_id,
            week_day_id: 6,
            from_time: from,
            to_time: to,
            price: 100.0,
        })
    }

    fn new_booking(status: &str) -> NewBooking {
        NewBooking {
            player_id: 1,
            team_id: None,
            date: date(),
            status: status.into(),
            price: 100.0,
        }
    }

    #[tokio::test]
    async fn week_days_are_seeded() {
        let store = MemoryStore::new();
        assert_eq!(store.week_day_by_id(1).await.unwrap().unwrap().name, "Monday");
        assert_eq!(store.week_day_by_id(7).await.unwrap().unwrap().name, "Sunday");
        assert!(store.week_day_by_id(8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_rejects_overlap_and_writes_nothing() {
        let store = MemoryStore::new();
        let f = field(&store).await;

        let first = store
            .commit_booking(new_slot(f.id, t(9, 0), t(10, 0)), new_booking("BOOKED"))
            .await
            .unwrap();
        assert!(matches!(first, BookingCommit::Committed { .. }));

        let second = store
            .commit_booking(new_slot(f.id, t(9, 30), t(10, 30)), new_booking("BOOKED"))
            .await
            .unwrap();
        assert!(matches!(second, BookingCommit::Conflict));

        assert_eq!(store.field_slots(f.id).await.unwrap().len(), 1);
        assert_eq!(store.list_bookings(&BookingFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn commit_appends_initial_status_change() {
        let store = MemoryStore::new();
        let f = field(&store).await;
        let BookingCommit::Committed { booking, .. } = store
            .commit_booking(new_slot(f.id, t(9, 0), t(10, 0)), new_booking("BOOKED"))
            .await
            .unwrap()
        else {
            panic!("expected commit");
        };
        let changes = store.status_changes(booking.id).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].status, "BOOKED");
    }

    #[tokio::test]
    async fn cancelled_bookings_free_the_interval() {
        let store = MemoryStore::new();
        let f = field(&store).await;
        let BookingCommit::Committed { booking, .. } = store
            .commit_booking(new_slot(f.id, t(9, 0), t(10, 0)), new_booking("BOOKED"))
            .await
            .unwrap()
        else {
            panic!("expected commit");
        };
        store
            .update_booking_status(booking.id, "CANCELLED", Some("rain"))
            .await
            .unwrap();
        assert!(store.bookings_on(f.id, date()).await.unwrap().is_empty());

        let again = store
            .commit_booking(new_slot(f.id, t(9, 0), t(10, 0)), new_booking("BOOKED"))
            .await
            .unwrap();
        assert!(matches!(again, BookingCommit::Committed { .. }));

        // reviving the first one would now overlap
        let revived = store
            .update_booking_status(booking.id, "BOOKED", None)
            .await
            .unwrap();
        assert!(matches!(revived, StatusUpdate::Conflict));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let user = NewUser {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            phone: "0100000000".into(),
            password_hash: "x".into(),
            role: Role::Player,
        };
        store.create_user(user.clone()).await.unwrap();
        let err = store.create_user(user).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_field_with_bookings_conflicts() {
        let store = MemoryStore::new();
        let f = field(&store).await;
        store
            .commit_booking(new_slot(f.id, t(9, 0), t(10, 0)), new_booking("BOOKED"))
            .await
            .unwrap();
        assert!(matches!(store.delete_field(f.id).await, Err(AppError::Conflict(_))));

        let empty = field(&store).await;
        assert!(store.delete_field(empty.id).await.unwrap());
        assert!(!store.delete_field(empty.id).await.unwrap());
    }
}
