use chrono::NaiveTime;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::booking::has_conflict;
use crate::services::page_params;
use crate::store::Store;

const TIME_FORMAT_MESSAGE: &str = "Invalid time format. Use HH:mm format (e.g., 14:30)";

pub fn parse_time(raw: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), hhmm::FORMAT)
        .map_err(|_| AppError::BadRequest(TIME_FORMAT_MESSAGE.into()))
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Field name cannot be empty".into()));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> AppResult<()> {
    if capacity <= 0 {
        return Err(AppError::BadRequest("Players capacity must be greater than 0".into()));
    }
    Ok(())
}

fn validate_address(address: &str) -> AppResult<()> {
    if address.trim().is_empty() {
        return Err(AppError::BadRequest("Location address cannot be empty".into()));
    }
    Ok(())
}

fn validate_price(price: f64) -> AppResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::BadRequest("Price must be greater than 0".into()));
    }
    Ok(())
}

fn validate_range(from: NaiveTime, to: NaiveTime) -> AppResult<()> {
    if !TimeRange::new(from, to).is_valid() {
        return Err(AppError::BadRequest("From time must be before to time".into()));
    }
    Ok(())
}

async fn existing_field(store: &dyn Store, id: i32) -> AppResult<Field> {
    store
        .field_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Field not found".into()))
}

async fn active_field(store: &dyn Store, id: i32) -> AppResult<Field> {
    match store.field_by_id(id).await? {
        Some(f) if f.is_active => Ok(f),
        _ => Err(AppError::NotFound("Field not found".into())),
    }
}

/// Public catalog. Only active fields unless `isActive=false` is asked for.
pub async fn browse(store: &dyn Store, query: FieldBrowseQuery) -> AppResult<Page<Field>> {
    let (page, size) = page_params(query.page, query.size)?;
    let want_active = query.is_active.unwrap_or(true);
    let location = query
        .location
        .as_deref()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty());

    let fields: Vec<Field> = store
        .list_fields()
        .await?
        .into_iter()
        .filter(|f| f.is_active == want_active)
        .filter(|f| match &location {
            Some(loc) => f.location_address.to_lowercase().contains(loc.as_str()),
            None => true,
        })
        .filter(|f| match query.min_players {
            Some(min) => f.players_capacity >= min,
            None => true,
        })
        .collect();

    Ok(Page::slice(fields, page, size))
}

pub async fn field_with_slots(store: &dyn Store, id: i32) -> AppResult<FieldWithSlots> {
    let field = active_field(store, id).await?;
    let available_time_slots = store.field_slots(id).await?;
    Ok(FieldWithSlots {
        field,
        available_time_slots,
    })
}

/// Plain-text sheet for download.
pub async fn details_text(store: &dyn Store, id: i32) -> AppResult<String> {
    let FieldWithSlots {
        field,
        available_time_slots,
    } = field_with_slots(store, id).await?;

    let mut out = format!(
        "Field Name: {}\nLocation: {}\nPlayers Capacity: {}\n",
        field.name, field.location_address, field.players_capacity
    );
    if available_time_slots.is_empty() {
        out.push_str("\nNo time slots available.\n");
        return Ok(out);
    }
    out.push_str("\nAvailable Time Slots:\n");
    for slot in &available_time_slots {
        let day = store
            .week_day_by_id(slot.week_day_id)
            .await?
            .map(|d| d.name)
            .unwrap_or_else(|| slot.week_day_id.to_string());
        out.push_str(&format!(
            "- {}: {} - {} ({:.2})\n",
            day,
            slot.from_time.format(hhmm::FORMAT),
            slot.to_time.format(hhmm::FORMAT),
            slot.price
        ));
    }
    Ok(out)
}

pub async fn field_slots(store: &dyn Store, field_id: i32) -> AppResult<Vec<FieldSlot>> {
    existing_field(store, field_id).await?;
    store.field_slots(field_id).await
}

pub async fn availability(
    store: &dyn Store,
    field_id: i32,
    query: AvailabilityQuery,
) -> AppResult<Availability> {
    active_field(store, field_id).await?;
    validate_range(query.from, query.to)?;
    let taken = has_conflict(
        store,
        field_id,
        query.date,
        TimeRange::new(query.from, query.to),
    )
    .await?;
    Ok(Availability {
        field_id,
        date: query.date,
        from: query.from,
        to: query.to,
        available: !taken,
    })
}

pub async fn list_all(store: &dyn Store) -> AppResult<Vec<Field>> {
    store.list_fields().await
}

pub async fn create_field(store: &dyn Store, req: CreateFieldRequest) -> AppResult<Field> {
    let name = req.name.unwrap_or_default();
    validate_name(&name)?;
    let capacity = req.players_capacity.unwrap_or(0);
    validate_capacity(capacity)?;
    let address = req.location_address.unwrap_or_default();
    validate_address(&address)?;

    let field = store
        .create_field(NewField {
            name: name.trim().to_string(),
            images: req.images.unwrap_or_default(),
            players_capacity: capacity,
            location_address: address.trim().to_string(),
        })
        .await?;
    tracing::info!(field_id = field.id, "field created");
    Ok(field)
}

/// Partial update: only supplied fields change, each re-validated.
pub async fn update_field(store: &dyn Store, id: i32, req: UpdateFieldRequest) -> AppResult<Field> {
    let mut field = existing_field(store, id).await?;
    if let Some(name) = req.name {
        validate_name(&name)?;
        field.name = name.trim().to_string();
    }
    if let Some(images) = req.images {
        field.images = images;
    }
    if let Some(capacity) = req.players_capacity {
        validate_capacity(capacity)?;
        field.players_capacity = capacity;
    }
    if let Some(address) = req.location_address {
        validate_address(&address)?;
        field.location_address = address.trim().to_string();
    }
    if let Some(active) = req.is_active {
        field.is_active = active;
    }
    store.update_field(&field).await
}

pub async fn set_status(store: &dyn Store, id: i32, req: FieldStatusRequest) -> AppResult<Field> {
    let active = req
        .is_active
        .ok_or_else(|| AppError::BadRequest("isActive is required".into()))?;
    let mut field = existing_field(store, id).await?;
    field.is_active = active;
    let field = store.update_field(&field).await?;
    tracing::info!(field_id = id, active, "field status changed");
    Ok(field)
}

pub async fn delete_field(store: &dyn Store, id: i32) -> AppResult<()> {
    if !store.delete_field(id).await? {
        return Err(AppError::NotFound("Field not found".into()));
    }
    tracing::info!(field_id = id, "field deleted");
    Ok(())
}

pub async fn create_slot(store: &dyn Store, req: CreateSlotRequest) -> AppResult<FieldSlot> {
    let field_id = req
        .field_id
        .ok_or_else(|| AppError::BadRequest("Field ID is required".into()))?;
    let week_day_id = req
        .week_day_id
        .ok_or_else(|| AppError::BadRequest("Week day ID is required".into()))?;
    existing_field(store, field_id).await?;
    if store.week_day_by_id(week_day_id).await?.is_none() {
        return Err(AppError::NotFound("Week day not found".into()));
    }

    let from = parse_time(req.from_time.as_deref().unwrap_or_default())?;
    let to = parse_time(req.to_time.as_deref().unwrap_or_default())?;
    validate_range(from, to)?;
    let price = req.price.unwrap_or(0.0);
    validate_price(price)?;

    store
        .create_slot(NewFieldSlot {
            field_id,
            week_day_id,
            from_time: from,
            to_time: to,
            price,
        })
        .await
}

pub async fn update_slot(store: &dyn Store, id: i32, req: UpdateSlotRequest) -> AppResult<FieldSlot> {
    let mut slot = store
        .slot_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Field slot not found".into()))?;
    if let Some(raw) = req.from_time.as_deref() {
        slot.from_time = parse_time(raw)?;
    }
    if let Some(raw) = req.to_time.as_deref() {
        slot.to_time = parse_time(raw)?;
    }
    validate_range(slot.from_time, slot.to_time)?;
    if let Some(price) = req.price {
        validate_price(price)?;
        slot.price = price;
    }
    store.update_slot(&slot).await
}

pub async fn delete_slot(store: &dyn Store, id: i32) -> AppResult<()> {
    if !store.delete_slot(id).await? {
        return Err(AppError::NotFound("Field slot not found".into()));
    }
    Ok(())
}
