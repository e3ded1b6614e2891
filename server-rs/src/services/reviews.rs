//! Public review listings and admin moderation.

use std::cmp::Ordering;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::page_params;
use crate::store::Store;

pub const DEFAULT_LOW_RATING: i32 = 2;
pub const DEFAULT_RECENT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
enum SortKey {
    Id,
    Rating,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sort {
    key: SortKey,
    descending: bool,
}

/// `prop[,dir]`; defaults to `id,desc`.
fn parse_sort(raw: Option<&str>) -> AppResult<Sort> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Sort {
            key: SortKey::Id,
            descending: true,
        });
    };
    let mut parts = raw.split(',').map(str::trim);
    let key = match parts.next().unwrap_or_default() {
        "id" => SortKey::Id,
        "rating" => SortKey::Rating,
        "createdAt" => SortKey::CreatedAt,
        other => {
            return Err(AppError::BadRequest(format!("Invalid sort property: {other}")));
        }
    };
    let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(other) => {
            return Err(AppError::BadRequest(format!("Invalid sort direction: {other}")));
        }
    };
    Ok(Sort { key, descending })
}

fn sort_reviews(reviews: &mut [Review], sort: Sort) {
    reviews.sort_by(|a, b| {
        let ord = match sort.key {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Rating => a.rating.cmp(&b.rating).then(a.id.cmp(&b.id)),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        };
        if sort.descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

fn average(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64
}

async fn visible_reviews(store: &dyn Store) -> AppResult<Vec<Review>> {
    Ok(store
        .list_reviews()
        .await?
        .into_iter()
        .filter(|r| !r.is_hidden)
        .collect())
}

pub async fn visible(store: &dyn Store, query: PageQuery) -> AppResult<Page<Review>> {
    let (page, size) = page_params(query.page, query.size)?;
    let sort = parse_sort(query.sort.as_deref())?;
    let mut reviews = visible_reviews(store).await?;
    sort_reviews(&mut reviews, sort);
    Ok(Page::slice(reviews, page, size))
}

pub async fn visible_by_rating(store: &dyn Store, query: RatingRangeQuery) -> AppResult<Page<Review>> {
    let min = query.min.unwrap_or(1);
    let max = query.max.unwrap_or(5);
    if !(1..=5).contains(&min) || !(1..=5).contains(&max) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5".into()));
    }
    if min > max {
        return Err(AppError::BadRequest("Minimum rating cannot exceed maximum rating".into()));
    }
    let (page, size) = page_params(query.page, query.size)?;
    let sort = parse_sort(query.sort.as_deref())?;

    let mut reviews: Vec<Review> = visible_reviews(store)
        .await?
        .into_iter()
        .filter(|r| (min..=max).contains(&r.rating))
        .collect();
    sort_reviews(&mut reviews, sort);
    Ok(Page::slice(reviews, page, size))
}

pub async fn visible_by_id(store: &dyn Store, id: i32) -> AppResult<Review> {
    match store.review_by_id(id).await? {
        Some(r) if !r.is_hidden => Ok(r),
        _ => Err(AppError::NotFound("Review not found".into())),
    }
}

pub async fn customer_visible(store: &dyn Store, customer_id: i32) -> AppResult<Vec<Review>> {
    let mut reviews: Vec<Review> = visible_reviews(store)
        .await?
        .into_iter()
        .filter(|r| r.customer_id == customer_id)
        .collect();
    sort_reviews(
        &mut reviews,
        Sort {
            key: SortKey::CreatedAt,
            descending: true,
        },
    );
    Ok(reviews)
}

pub async fn average_rating(store: &dyn Store) -> AppResult<f64> {
    Ok(average(&visible_reviews(store).await?))
}

pub async fn customer_average_rating(store: &dyn Store, customer_id: i32) -> AppResult<f64> {
    Ok(average(&customer_visible(store, customer_id).await?))
}

pub async fn visible_count(store: &dyn Store) -> AppResult<usize> {
    Ok(visible_reviews(store).await?.len())
}

pub async fn breakdown(store: &dyn Store) -> AppResult<RatingBreakdown> {
    let reviews = visible_reviews(store).await?;
    let count = |n: i32| reviews.iter().filter(|r| r.rating == n).count();
    Ok(RatingBreakdown {
        one: count(1),
        two: count(2),
        three: count(3),
        four: count(4),
        five: count(5),
    })
}

pub async fn recent(store: &dyn Store, limit: Option<i64>) -> AppResult<Vec<Review>> {
    let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    if !(1..=200).contains(&limit) {
        return Err(AppError::BadRequest("Limit must be between 1 and 200".into()));
    }
    let mut reviews = visible_reviews(store).await?;
    sort_reviews(
        &mut reviews,
        Sort {
            key: SortKey::CreatedAt,
            descending: true,
        },
    );
    reviews.truncate(limit as usize);
    Ok(reviews)
}

// --- moderation ---

pub async fn all(store: &dyn Store) -> AppResult<Vec<Review>> {
    let mut reviews = store.list_reviews().await?;
    sort_reviews(
        &mut reviews,
        Sort {
            key: SortKey::CreatedAt,
            descending: true,
        },
    );
    Ok(reviews)
}

pub async fn by_visibility(store: &dyn Store, hidden: bool) -> AppResult<Vec<Review>> {
    Ok(all(store)
        .await?
        .into_iter()
        .filter(|r| r.is_hidden == hidden)
        .collect())
}

pub async fn get(store: &dyn Store, id: i32) -> AppResult<Review> {
    store
        .review_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))
}

pub async fn set_hidden(store: &dyn Store, id: i32, hidden: bool) -> AppResult<bool> {
    let changed = store.set_review_hidden(id, hidden).await?;
    if changed {
        tracing::info!(review_id = id, hidden, "review visibility changed");
    }
    Ok(changed)
}

pub async fn delete(store: &dyn Store, id: i32) -> AppResult<bool> {
    let deleted = store.delete_review(id).await?;
    if deleted {
        tracing::info!(review_id = id, "review deleted");
    }
    Ok(deleted)
}

pub async fn search(store: &dyn Store, keyword: Option<&str>) -> AppResult<Vec<Review>> {
    let keyword = keyword
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::BadRequest("Keyword is required".into()))?;
    Ok(all(store)
        .await?
        .into_iter()
        .filter(|r| {
            r.comment
                .as_deref()
                .map(|c| c.to_lowercase().contains(&keyword))
                .unwrap_or(false)
        })
        .collect())
}

pub async fn low_ratings(store: &dyn Store, max_rating: Option<i32>) -> AppResult<Vec<Review>> {
    let max = max_rating.unwrap_or(DEFAULT_LOW_RATING);
    if !(1..=5).contains(&max) {
        return Err(AppError::BadRequest("Max rating must be between 1 and 5".into()));
    }
    let mut reviews: Vec<Review> = store
        .list_reviews()
        .await?
        .into_iter()
        .filter(|r| r.rating <= max)
        .collect();
    reviews.sort_by(|a, b| match a.rating.cmp(&b.rating) {
        Ordering::Equal => b.created_at.cmp(&a.created_at),
        ord => ord,
    });
    Ok(reviews)
}

pub async fn by_customer(store: &dyn Store, customer_id: i32) -> AppResult<Vec<Review>> {
    Ok(all(store)
        .await?
        .into_iter()
        .filter(|r| r.customer_id == customer_id)
        .collect())
}

pub async fn statistics(store: &dyn Store) -> AppResult<ReviewStatistics> {
    let reviews = store.list_reviews().await?;
    let total = reviews.len();
    let hidden = reviews.iter().filter(|r| r.is_hidden).count();
    let hidden_percentage = if total == 0 {
        0.0
    } else {
        hidden as f64 * 100.0 / total as f64
    };
    Ok(ReviewStatistics {
        total,
        visible: total - hidden,
        hidden,
        hidden_percentage,
    })
}

#[derive(Debug, Clone, Copy)]
pub enum BulkAction {
    Hide,
    Unhide,
    Delete,
}

impl BulkAction {
    fn label(self) -> &'static str {
        match self {
            BulkAction::Hide => "hide",
            BulkAction::Unhide => "unhide",
            BulkAction::Delete => "delete",
        }
    }
}

pub async fn bulk(store: &dyn Store, action: BulkAction, ids: &[i32]) -> AppResult<BulkResult> {
    if ids.is_empty() {
        return Err(AppError::BadRequest("Review IDs are required".into()));
    }
    let mut success_count = 0;
    for &id in ids {
        let ok = match action {
            BulkAction::Hide => store.set_review_hidden(id, true).await?,
            BulkAction::Unhide => store.set_review_hidden(id, false).await?,
            BulkAction::Delete => store.delete_review(id).await?,
        };
        if ok {
            success_count += 1;
        }
    }
    let fail_count = ids.len() - success_count;
    tracing::info!(action = action.label(), success_count, fail_count, "bulk review moderation");
    Ok(BulkResult {
        success_count,
        fail_count,
        message: format!(
            "Bulk {} completed. Success: {}, Failed: {}",
            action.label(),
            success_count,
            fail_count
        ),
    })
}

pub async fn admins(store: &dyn Store) -> AppResult<Vec<UserPublic>> {
    Ok(store
        .users_by_role(Role::Admin)
        .await?
        .iter()
        .map(UserPublic::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, ratings: &[(i32, i32, &str)]) -> Vec<Review> {
        let mut out = Vec::new();
        for &(customer_id, rating, comment) in ratings {
            out.push(
                store
                    .create_review(NewReview {
                        booking_id: 1,
                        customer_id,
                        rating,
                        comment: Some(comment.to_string()),
                    })
                    .await
                    .unwrap(),
            );
        }
        out
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(
            parse_sort(None).unwrap(),
            Sort {
                key: SortKey::Id,
                descending: true
            }
        );
        assert_eq!(
            parse_sort(Some("rating,ASC")).unwrap(),
            Sort {
                key: SortKey::Rating,
                descending: false
            }
        );
        assert!(!parse_sort(Some("createdAt")).unwrap().descending);
        assert!(parse_sort(Some("password,desc")).is_err());
        assert!(parse_sort(Some("id,sideways")).is_err());
    }

    #[tokio::test]
    async fn averages_default_to_zero() {
        let store = MemoryStore::new();
        assert_eq!(average_rating(&store).await.unwrap(), 0.0);
        assert_eq!(customer_average_rating(&store, 3).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn hidden_reviews_drop_out_of_public_views() {
        let store = MemoryStore::new();
        let reviews = seed(&store, &[(1, 5, "great"), (1, 3, "ok"), (2, 1, "muddy pitch")]).await;

        assert!(set_hidden(&store, reviews[2].id, true).await.unwrap());
        assert!(!set_hidden(&store, reviews[2].id, true).await.unwrap());
        assert!(!set_hidden(&store, 9999, true).await.unwrap());

        assert_eq!(visible_count(&store).await.unwrap(), 2);
        assert_eq!(average_rating(&store).await.unwrap(), 4.0);
        assert!(matches!(
            visible_by_id(&store, reviews[2].id).await,
            Err(AppError::NotFound(_))
        ));
        let b = breakdown(&store).await.unwrap();
        assert_eq!((b.one, b.three, b.five), (0, 1, 1));

        let stats = statistics(&store).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.hidden, 1);
        assert!((stats.hidden_percentage - 33.333).abs() < 0.01);
    }

    #[tokio::test]
    async fn paging_and_rating_range() {
        let store = MemoryStore::new();
        seed(&store, &[(1, 1, "a"), (1, 2, "b"), (1, 4, "c"), (1, 5, "d")]).await;

        let page = visible(
            &store,
            PageQuery {
                page: Some(0),
                size: Some(3),
                sort: Some("rating,desc".into()),
            },
        )
        .await
        .unwrap();
        let ratings: Vec<i32> = page.content.iter().map(|r| r.rating).collect();
        assert_eq!(ratings, vec![5, 4, 2]);
        assert_eq!(page.total_pages, 2);

        let ranged = visible_by_rating(
            &store,
            RatingRangeQuery {
                min: Some(2),
                max: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ranged.total_elements, 2);

        let inverted = RatingRangeQuery {
            min: Some(4),
            max: Some(2),
            ..Default::default()
        };
        assert!(visible_by_rating(&store, inverted).await.is_err());
        assert!(visible(
            &store,
            PageQuery {
                page: Some(-1),
                ..Default::default()
            }
        )
        .await
        .is_err());
        assert!(recent(&store, Some(0)).await.is_err());
        assert_eq!(recent(&store, Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn moderation_queries() {
        let store = MemoryStore::new();
        seed(&store, &[(1, 1, "Muddy"), (2, 2, "ok-ish"), (2, 5, "MUD free")]).await;

        assert_eq!(search(&store, Some("mud")).await.unwrap().len(), 2);
        assert!(search(&store, Some("  ")).await.is_err());
        assert_eq!(low_ratings(&store, None).await.unwrap().len(), 2);
        assert_eq!(low_ratings(&store, Some(1)).await.unwrap().len(), 1);
        assert!(low_ratings(&store, Some(6)).await.is_err());
        assert_eq!(by_customer(&store, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn bulk_counts_successes_and_failures() {
        let store = MemoryStore::new();
        let reviews = seed(&store, &[(1, 4, "a"), (1, 5, "b")]).await;
        let ids = [reviews[0].id, reviews[1].id, 4242];

        let result = bulk(&store, BulkAction::Hide, &ids).await.unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.fail_count, 1);
        assert_eq!(result.message, "Bulk hide completed. Success: 2, Failed: 1");
        assert_eq!(by_visibility(&store, true).await.unwrap().len(), 2);

        let result = bulk(&store, BulkAction::Delete, &ids).await.unwrap();
        assert_eq!(result.success_count, 2);
        assert!(all(&store).await.unwrap().is_empty());
    }
}
