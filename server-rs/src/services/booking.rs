//! Booking conflict checks and the booking workflows built on them.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::config::BookingConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::access::authorize_team_admin;
use crate::store::Store;

pub const BOOKED_MESSAGE: &str = "Field booked successfully!";

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NotAdmin,
    FieldUnavailable,
    TimeConflict,
    Invalid(String),
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Rejection::NotAdmin => "Only admins can book fields.".to_string(),
            Rejection::FieldUnavailable => "Field is not active or doesn't exist.".to_string(),
            Rejection::TimeConflict => "Field is already booked during this time.".to_string(),
            Rejection::Invalid(reason) => reason.clone(),
        }
    }
}

impl From<Rejection> for AppError {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::NotAdmin => AppError::Forbidden(r.message()),
            Rejection::TimeConflict => AppError::Conflict(r.message()),
            Rejection::FieldUnavailable | Rejection::Invalid(_) => AppError::BadRequest(r.message()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: i32,
    pub slot_id: i32,
    pub field_name: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub from: NaiveTime,
    #[serde(with = "hhmm")]
    pub to: NaiveTime,
    pub price: f64,
    pub currency: String,
}

impl BookingConfirmation {
    pub fn message(&self) -> String {
        format!(
            "{BOOKED_MESSAGE}\n\nField Name: {}\nDate: {}\nFrom: {}\nTo: {}\nTotal Price: {:.2} {}",
            self.field_name,
            self.date,
            self.from.format(hhmm::FORMAT),
            self.to.format(hhmm::FORMAT),
            self.price,
            self.currency,
        )
    }
}

#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Booked(BookingConfirmation),
    Rejected(Rejection),
}

/// Linear scan over the live bookings of one field on one day. Stops at the
/// first overlap.
pub async fn has_conflict(
    store: &dyn Store,
    field_id: i32,
    date: NaiveDate,
    range: TimeRange,
) -> AppResult<bool> {
    let booked = store.bookings_on(field_id, date).await?;
    Ok(booked.iter().any(|b| range.overlaps(&b.range())))
}

pub async fn book_field(
    store: &dyn Store,
    config: &BookingConfig,
    actor: &AuthUser,
    field_id: i32,
    req: BookFieldRequest,
) -> AppResult<BookingOutcome> {
    if !actor.is_admin() {
        return Ok(BookingOutcome::Rejected(Rejection::NotAdmin));
    }

    let field = match store.field_by_id(field_id).await? {
        Some(f) if f.is_active => f,
        _ => return Ok(BookingOutcome::Rejected(Rejection::FieldUnavailable)),
    };

    let range = TimeRange::new(req.from, req.to);
    if !range.is_valid() {
        return Ok(BookingOutcome::Rejected(Rejection::Invalid(
            "From time must be before to time".into(),
        )));
    }
    if !req.price.is_finite() || req.price <= 0.0 {
        return Ok(BookingOutcome::Rejected(Rejection::Invalid(
            "Price must be greater than 0".into(),
        )));
    }
    if store.week_day_by_id(req.week_day_id).await?.is_none() {
        return Ok(BookingOutcome::Rejected(Rejection::Invalid(
            "Week day not found".into(),
        )));
    }

    if has_conflict(store, field.id, req.date, range).await? {
        return Ok(BookingOutcome::Rejected(Rejection::TimeConflict));
    }

    let slot = SlotChoice::New(NewFieldSlot {
        field_id: field.id,
        week_day_id: req.week_day_id,
        from_time: req.from,
        to_time: req.to,
        price: req.price,
    });
    let booking = NewBooking {
        player_id: actor.id,
        team_id: None,
        date: req.date,
        status: config.admin_booking_status.clone(),
        price: req.price,
    };

    match store.commit_booking(slot, booking).await? {
        BookingCommit::Conflict => {
            tracing::info!(field_id, date = %req.date, "booking lost the race to a concurrent one");
            Ok(BookingOutcome::Rejected(Rejection::TimeConflict))
        }
        BookingCommit::Committed { slot, booking } => {
            tracing::info!(
                booking_id = booking.id,
                slot_id = slot.id,
                field_id,
                admin_id = actor.id,
                "field booked"
            );
            Ok(BookingOutcome::Booked(BookingConfirmation {
                booking_id: booking.id,
                slot_id: slot.id,
                field_name: field.name,
                date: booking.date,
                from: slot.from_time,
                to: slot.to_time,
                price: booking.price,
                currency: config.currency.clone(),
            }))
        }
    }
}

/// A team admin asks for an existing slot on a date falling on that slot's
/// week day.
pub async fn request_team_booking(
    store: &dyn Store,
    config: &BookingConfig,
    actor: &AuthUser,
    req: TeamBookingRequest,
) -> AppResult<Booking> {
    let team_id = req
        .team_id
        .ok_or_else(|| AppError::BadRequest("Team ID is required".into()))?;
    let slot_id = req
        .field_slot_id
        .ok_or_else(|| AppError::BadRequest("Field slot ID is required".into()))?;
    let date = req
        .date
        .ok_or_else(|| AppError::BadRequest("Date is required".into()))?;

    authorize_team_admin(store, actor.id, team_id).await?;

    let team = store
        .team_by_id(team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;
    if !team.is_active {
        return Err(AppError::BadRequest("Team is not active".into()));
    }

    let slot = store
        .slot_by_id(slot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Field slot not found".into()))?;
    match store.field_by_id(slot.field_id).await? {
        Some(f) if f.is_active => {}
        _ => return Err(Rejection::FieldUnavailable.into()),
    }

    if date.weekday().number_from_monday() as i32 != slot.week_day_id {
        return Err(AppError::BadRequest(
            "Date does not fall on the slot's week day".into(),
        ));
    }

    let booking = NewBooking {
        player_id: actor.id,
        team_id: Some(team_id),
        date,
        status: config.default_status.clone(),
        price: slot.price,
    };
    match store.commit_booking(SlotChoice::Existing(slot), booking).await? {
        BookingCommit::Committed { booking, .. } => {
            tracing::info!(booking_id = booking.id, team_id, "team booking requested");
            Ok(booking)
        }
        BookingCommit::Conflict => Err(Rejection::TimeConflict.into()),
    }
}

pub async fn status_timeline(
    store: &dyn Store,
    booking_id: i32,
) -> AppResult<Vec<BookingStatusChange>> {
    if store.booking_by_id(booking_id).await?.is_none() {
        return Err(AppError::NotFound("Booking not found".into()));
    }
    let mut changes = store.status_changes(booking_id).await?;
    changes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(changes)
}

fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    bookings
}

/// Team members and admins only.
pub async fn team_history(
    store: &dyn Store,
    actor: &AuthUser,
    team_id: i32,
) -> AppResult<Vec<Booking>> {
    if store.team_by_id(team_id).await?.is_none() {
        return Err(AppError::NotFound("Team not found".into()));
    }
    if !actor.is_admin() && store.active_membership(actor.id, team_id).await?.is_none() {
        return Err(AppError::Forbidden("You are not a member of this team".into()));
    }
    let filter = BookingFilter {
        team_id: Some(team_id),
        ..Default::default()
    };
    Ok(newest_first(store.list_bookings(&filter).await?))
}

pub async fn admin_history(store: &dyn Store, query: BookingHistoryQuery) -> AppResult<Vec<Booking>> {
    if let (Some(from), Some(to)) = (query.from_date, query.to_date) {
        if from > to {
            return Err(AppError::BadRequest("fromDate must not be after toDate".into()));
        }
    }
    let filter = BookingFilter {
        from_date: query.from_date,
        to_date: query.to_date,
        field_id: query.field_id,
        team_id: query.team_id,
        status: None,
    };
    Ok(newest_first(store.list_bookings(&filter).await?))
}

pub async fn pending(store: &dyn Store, config: &BookingConfig) -> AppResult<Vec<Booking>> {
    let filter = BookingFilter {
        status: Some(config.default_status.clone()),
        ..Default::default()
    };
    let mut bookings = store.list_bookings(&filter).await?;
    bookings.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    Ok(bookings)
}

pub async fn update_status(
    store: &dyn Store,
    actor: &AuthUser,
    booking_id: i32,
    req: UpdateBookingStatusRequest,
) -> AppResult<Booking> {
    let status = req
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Status is required".into()))?;
    let reason = req.reason.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match store.update_booking_status(booking_id, status, reason).await? {
        StatusUpdate::Updated(booking) => {
            tracing::info!(booking_id, status, admin_id = actor.id, "booking status changed");
            Ok(booking)
        }
        StatusUpdate::NotFound => Err(AppError::NotFound("Booking not found".into())),
        StatusUpdate::Conflict => Err(Rejection::TimeConflict.into()),
    }
}

/// The booker, or an active member of the booking's team, may review it.
pub async fn review_booking(
    store: &dyn Store,
    actor: &AuthUser,
    booking_id: i32,
    req: ReviewBookingRequest,
) -> AppResult<Review> {
    let booking = store
        .booking_by_id(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

    let rating = req
        .rating
        .ok_or_else(|| AppError::BadRequest("Rating is required".into()))?;
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5".into()));
    }

    let is_booker = booking.player_id == actor.id;
    let is_member = match booking.team_id {
        Some(team_id) => store.active_membership(actor.id, team_id).await?.is_some(),
        None => false,
    };
    if !is_booker && !is_member {
        return Err(AppError::Forbidden("You can only review your own bookings".into()));
    }

    let comment = req
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    store
        .create_review(NewReview {
            booking_id,
            customer_id: actor.id,
            rating,
            comment,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::testing::{seed_field, seed_user};
    use crate::store::MemoryStore;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn request(from: NaiveTime, to: NaiveTime) -> BookFieldRequest {
        BookFieldRequest {
            week_day_id: 6,
            from,
            to,
            price: 100.0,
            date: june_first(),
        }
    }

    async fn admin(store: &MemoryStore) -> AuthUser {
        let user = seed_user(store, "admin@example.com", Role::Admin).await;
        AuthUser {
            id: user.id,
            role: user.role,
        }
    }

    async fn book(
        store: &MemoryStore,
        actor: &AuthUser,
        field_id: i32,
        from: NaiveTime,
        to: NaiveTime,
    ) -> BookingOutcome {
        let config = Config::for_tests();
        book_field(store, &config.booking, actor, field_id, request(from, to))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn admin_books_an_active_field() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let field = seed_field(&store, "Pitch A", true).await;

        let BookingOutcome::Booked(confirmation) = book(&store, &actor, field.id, t(9, 0), t(10, 0)).await
        else {
            panic!("expected a booking");
        };
        assert!(confirmation.message().contains("Field booked successfully"));
        assert!(confirmation.message().contains("Field Name: Pitch A"));
        assert!(confirmation.message().contains("From: 09:00"));
        assert!(confirmation.message().ends_with("Total Price: 100.00 EGP"));

        let slots = store.field_slots(field.id).await.unwrap();
        assert_eq!(slots.len(), 1);
        let bookings = store.list_bookings(&BookingFilter::default()).await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].status, "BOOKED");
        assert_eq!(bookings[0].player_id, actor.id);
        assert_eq!(bookings[0].team_id, None);
    }

    #[tokio::test]
    async fn overlapping_request_is_rejected_without_writes() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let field = seed_field(&store, "Pitch A", true).await;
        book(&store, &actor, field.id, t(9, 0), t(10, 0)).await;

        let outcome = book(&store, &actor, field.id, t(9, 30), t(10, 30)).await;
        assert!(matches!(outcome, BookingOutcome::Rejected(Rejection::TimeConflict)));
        assert_eq!(store.field_slots(field.id).await.unwrap().len(), 1);
        assert_eq!(store.list_bookings(&BookingFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn adjacent_request_is_accepted() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let field = seed_field(&store, "Pitch A", true).await;
        book(&store, &actor, field.id, t(9, 0), t(10, 0)).await;

        let outcome = book(&store, &actor, field.id, t(10, 0), t(11, 0)).await;
        assert!(matches!(outcome, BookingOutcome::Booked(_)));
    }

    #[tokio::test]
    async fn non_admin_is_rejected_before_any_store_access() {
        let store = MemoryStore::new();
        let player = seed_user(&store, "p@example.com", Role::Player).await;
        let field = seed_field(&store, "Pitch A", true).await;
        let actor = AuthUser {
            id: player.id,
            role: player.role,
        };

        let before = store.operations();
        let outcome = book(&store, &actor, field.id, t(9, 0), t(10, 0)).await;
        assert!(matches!(outcome, BookingOutcome::Rejected(Rejection::NotAdmin)));
        assert_eq!(store.operations(), before);
    }

    #[tokio::test]
    async fn inactive_field_wins_over_bad_times() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let field = seed_field(&store, "Closed", false).await;

        // reversed interval, still reported as unavailable field
        let outcome = book(&store, &actor, field.id, t(11, 0), t(10, 0)).await;
        match outcome {
            BookingOutcome::Rejected(r) => {
                assert_eq!(r, Rejection::FieldUnavailable);
                assert_eq!(r.message(), "Field is not active or doesn't exist.");
            }
            other => panic!("unexpected {other:?}"),
        }

        let missing = book(&store, &actor, 9999, t(9, 0), t(10, 0)).await;
        assert!(matches!(missing, BookingOutcome::Rejected(Rejection::FieldUnavailable)));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let field = seed_field(&store, "Pitch A", true).await;
        let config = Config::for_tests();

        let reversed = book(&store, &actor, field.id, t(10, 0), t(9, 0)).await;
        assert!(matches!(reversed, BookingOutcome::Rejected(Rejection::Invalid(_))));

        let mut free = request(t(9, 0), t(10, 0));
        free.price = 0.0;
        let outcome = book_field(&store, &config.booking, &actor, field.id, free).await.unwrap();
        assert!(matches!(outcome, BookingOutcome::Rejected(Rejection::Invalid(_))));

        let mut bad_day = request(t(9, 0), t(10, 0));
        bad_day.week_day_id = 8;
        let outcome = book_field(&store, &config.booking, &actor, field.id, bad_day).await.unwrap();
        assert!(matches!(outcome, BookingOutcome::Rejected(Rejection::Invalid(_))));
    }

    #[tokio::test]
    async fn conflict_check_is_symmetric_and_idempotent() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let field = seed_field(&store, "Pitch A", true).await;
        book(&store, &actor, field.id, t(9, 0), t(10, 0)).await;

        let wanted = TimeRange::new(t(9, 30), t(10, 30));
        let first = has_conflict(&store, field.id, june_first(), wanted).await.unwrap();
        let second = has_conflict(&store, field.id, june_first(), wanted).await.unwrap();
        assert!(first);
        assert_eq!(first, second);

        let adjacent = TimeRange::new(t(10, 0), t(11, 0));
        assert!(!has_conflict(&store, field.id, june_first(), adjacent).await.unwrap());

        let other_day = june_first().succ_opt().unwrap();
        assert!(!has_conflict(&store, field.id, other_day, wanted).await.unwrap());
    }

    #[tokio::test]
    async fn live_bookings_never_overlap() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let field = seed_field(&store, "Pitch A", true).await;

        let attempts = [
            (t(8, 0), t(9, 0)),
            (t(8, 30), t(9, 30)),
            (t(9, 0), t(10, 0)),
            (t(7, 0), t(12, 0)),
            (t(9, 30), t(9, 45)),
            (t(10, 0), t(12, 0)),
        ];
        for (from, to) in attempts {
            book(&store, &actor, field.id, from, to).await;
        }

        let live = store.bookings_on(field.id, june_first()).await.unwrap();
        assert_eq!(live.len(), 3);
        for (i, a) in live.iter().enumerate() {
            for b in live.iter().skip(i + 1) {
                assert!(!a.range().overlaps(&b.range()), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[tokio::test]
    async fn team_request_and_status_lifecycle() {
        let store = MemoryStore::new();
        let config = Config::for_tests();
        let captain = seed_user(&store, "captain@example.com", Role::Player).await;
        let outsider = seed_user(&store, "outsider@example.com", Role::Player).await;
        let field = seed_field(&store, "Pitch A", true).await;
        let (team, _) = store.create_team_with_admin("Falcons", captain.id).await.unwrap();
        let slot = store
            .create_slot(NewFieldSlot {
                field_id: field.id,
                week_day_id: 6, // Saturday
                from_time: t(18, 0),
                to_time: t(19, 0),
                price: 250.0,
            })
            .await
            .unwrap();

        let captain = AuthUser {
            id: captain.id,
            role: Role::Player,
        };
        let outsider = AuthUser {
            id: outsider.id,
            role: Role::Player,
        };
        let req = |date| TeamBookingRequest {
            team_id: Some(team.id),
            field_slot_id: Some(slot.id),
            date: Some(date),
        };

        let err = request_team_booking(&store, &config.booking, &outsider, req(june_first()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // 2024-06-02 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let err = request_team_booking(&store, &config.booking, &captain, req(sunday))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let booking = request_team_booking(&store, &config.booking, &captain, req(june_first()))
            .await
            .unwrap();
        assert_eq!(booking.status, "pending");
        assert_eq!(booking.price, 250.0);
        assert_eq!(pending(&store, &config.booking).await.unwrap().len(), 1);

        let err = request_team_booking(&store, &config.booking, &captain, req(june_first()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let admin = admin(&store).await;
        let cancel = UpdateBookingStatusRequest {
            status: Some("cancelled".into()),
            reason: Some("pitch maintenance".into()),
        };
        update_status(&store, &admin, booking.id, cancel).await.unwrap();

        let timeline = status_timeline(&store, booking.id).await.unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].status, "pending");
        assert_eq!(timeline[1].status, "cancelled");
        assert_eq!(timeline[1].cancelled_reason.as_deref(), Some("pitch maintenance"));

        let history = team_history(&store, &captain, team.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(matches!(
            team_history(&store, &outsider, team.id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn history_filters_and_orders_by_date() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let a = seed_field(&store, "A", true).await;
        let b = seed_field(&store, "B", true).await;
        let config = Config::for_tests();

        for (field_id, day) in [(a.id, 1), (a.id, 3), (b.id, 2)] {
            let mut req = request(t(9, 0), t(10, 0));
            req.date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
            book_field(&store, &config.booking, &actor, field_id, req).await.unwrap();
        }

        let all = admin_history(&store, BookingHistoryQuery::default()).await.unwrap();
        let days: Vec<u32> = all.iter().map(|b| b.date.day()).collect();
        assert_eq!(days, vec![3, 2, 1]);

        let only_a = admin_history(
            &store,
            BookingHistoryQuery {
                field_id: Some(a.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(only_a.len(), 2);

        let ranged = admin_history(
            &store,
            BookingHistoryQuery {
                from_date: NaiveDate::from_ymd_opt(2024, 6, 2),
                to_date: NaiveDate::from_ymd_opt(2024, 6, 3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ranged.len(), 2);
    }

    #[tokio::test]
    async fn reviewing_a_booking() {
        let store = MemoryStore::new();
        let actor = admin(&store).await;
        let field = seed_field(&store, "Pitch A", true).await;
        let BookingOutcome::Booked(c) = book(&store, &actor, field.id, t(9, 0), t(10, 0)).await else {
            panic!("expected a booking");
        };

        let bad = ReviewBookingRequest {
            rating: Some(6),
            comment: None,
        };
        assert!(matches!(
            review_booking(&store, &actor, c.booking_id, bad).await,
            Err(AppError::BadRequest(_))
        ));

        let good = ReviewBookingRequest {
            rating: Some(4),
            comment: Some("  great grass ".into()),
        };
        let review = review_booking(&store, &actor, c.booking_id, good).await.unwrap();
        assert_eq!(review.rating, 4);
        assert_eq!(review.comment.as_deref(), Some("great grass"));
        assert_eq!(review.customer_id, actor.id);
    }
}
