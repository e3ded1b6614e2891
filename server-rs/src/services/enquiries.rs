use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::store::Store;

pub const INVALID_STATUS_MESSAGE: &str = "Invalid status. Valid values are: open, in_progress, closed";

async fn get(store: &dyn Store, id: i32) -> AppResult<Enquiry> {
    store
        .enquiry_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enquiry not found".into()))
}

/// Newest first.
async fn filtered(store: &dyn Store, keep: impl Fn(&Enquiry) -> bool) -> AppResult<Vec<Enquiry>> {
    let mut enquiries: Vec<Enquiry> = store
        .list_enquiries()
        .await?
        .into_iter()
        .filter(|e| keep(e))
        .collect();
    enquiries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(enquiries)
}

pub async fn submit(store: &dyn Store, actor: &AuthUser, req: SubmitEnquiryRequest) -> AppResult<Enquiry> {
    let content = req
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Enquiry content is required".into()))?;

    let user = store
        .user_by_id(actor.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if user.role != Role::Player {
        return Err(AppError::Forbidden("Only players can submit enquiries".into()));
    }

    let enquiry = store.create_enquiry(user.id, content).await?;
    tracing::info!(enquiry_id = enquiry.id, customer_id = user.id, "enquiry submitted");
    Ok(enquiry)
}

pub async fn by_customer(store: &dyn Store, actor: &AuthUser, customer_id: i32) -> AppResult<Vec<Enquiry>> {
    if actor.id != customer_id && !actor.is_admin() {
        return Err(AppError::Forbidden("You can only view your own enquiries".into()));
    }
    filtered(store, |e| e.customer_id == customer_id).await
}

pub async fn all(store: &dyn Store) -> AppResult<Vec<Enquiry>> {
    filtered(store, |_| true).await
}

pub async fn visible(store: &dyn Store) -> AppResult<Vec<Enquiry>> {
    filtered(store, |e| !e.is_hidden).await
}

pub async fn by_status(store: &dyn Store, status: &str) -> AppResult<Vec<Enquiry>> {
    let status = EnquiryStatus::parse(status)
        .ok_or_else(|| AppError::BadRequest(INVALID_STATUS_MESSAGE.into()))?;
    filtered(store, |e| e.status == status).await
}

pub async fn set_visibility(store: &dyn Store, id: i32, req: EnquiryVisibilityRequest) -> AppResult<Enquiry> {
    let hidden = req
        .is_hidden
        .ok_or_else(|| AppError::BadRequest("isHidden is required".into()))?;
    let mut enquiry = get(store, id).await?;
    enquiry.is_hidden = hidden;
    store.update_enquiry(&enquiry).await
}

pub async fn set_status(store: &dyn Store, id: i32, req: EnquiryStatusRequest) -> AppResult<Enquiry> {
    let status = req
        .status
        .as_deref()
        .and_then(EnquiryStatus::parse)
        .ok_or_else(|| AppError::BadRequest(INVALID_STATUS_MESSAGE.into()))?;
    let mut enquiry = get(store, id).await?;
    enquiry.status = status;
    let enquiry = store.update_enquiry(&enquiry).await?;
    tracing::info!(enquiry_id = id, ?status, "enquiry status changed");
    Ok(enquiry)
}

/// Records the admin's answer. An open enquiry moves to in progress.
pub async fn respond(store: &dyn Store, id: i32, req: EnquiryResponseRequest) -> AppResult<Enquiry> {
    let response = req
        .response
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("Response cannot be empty".into()))?;
    let mut enquiry = get(store, id).await?;
    enquiry.admin_response = Some(response.to_string());
    if enquiry.status == EnquiryStatus::Open {
        enquiry.status = EnquiryStatus::InProgress;
    }
    let enquiry = store.update_enquiry(&enquiry).await?;
    tracing::info!(enquiry_id = id, "enquiry answered");
    Ok(enquiry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::seed_user;
    use crate::store::MemoryStore;

    fn actor(user: &User) -> AuthUser {
        AuthUser {
            id: user.id,
            role: user.role,
        }
    }

    fn content(text: &str) -> SubmitEnquiryRequest {
        SubmitEnquiryRequest {
            content: Some(text.to_string()),
        }
    }

    #[tokio::test]
    async fn players_submit_trimmed_content() {
        let store = MemoryStore::new();
        let player = seed_user(&store, "p@example.com", Role::Player).await;
        let admin = seed_user(&store, "a@example.com", Role::Admin).await;

        let enquiry = submit(&store, &actor(&player), content("  lights broken?  "))
            .await
            .unwrap();
        assert_eq!(enquiry.content, "lights broken?");
        assert_eq!(enquiry.status, EnquiryStatus::Open);

        assert!(matches!(
            submit(&store, &actor(&player), content("   ")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            submit(&store, &actor(&admin), content("hello")).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn customers_see_only_their_own() {
        let store = MemoryStore::new();
        let p1 = seed_user(&store, "p1@example.com", Role::Player).await;
        let p2 = seed_user(&store, "p2@example.com", Role::Player).await;
        let admin = seed_user(&store, "a@example.com", Role::Admin).await;
        submit(&store, &actor(&p1), content("one")).await.unwrap();

        assert_eq!(by_customer(&store, &actor(&p1), p1.id).await.unwrap().len(), 1);
        assert_eq!(by_customer(&store, &actor(&admin), p1.id).await.unwrap().len(), 1);
        assert!(matches!(
            by_customer(&store, &actor(&p2), p1.id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn admin_workflow() {
        let store = MemoryStore::new();
        let player = seed_user(&store, "p@example.com", Role::Player).await;
        let enquiry = submit(&store, &actor(&player), content("parking?")).await.unwrap();

        let answered = respond(
            &store,
            enquiry.id,
            EnquiryResponseRequest {
                response: Some("Free parking on site".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(answered.status, EnquiryStatus::InProgress);
        assert_eq!(answered.admin_response.as_deref(), Some("Free parking on site"));
        assert!(respond(&store, enquiry.id, EnquiryResponseRequest { response: Some(" ".into()) })
            .await
            .is_err());

        match set_status(&store, enquiry.id, EnquiryStatusRequest { status: Some("done".into()) }).await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, INVALID_STATUS_MESSAGE),
            other => panic!("unexpected {other:?}"),
        }
        let closed = set_status(&store, enquiry.id, EnquiryStatusRequest { status: Some("CLOSED".into()) })
            .await
            .unwrap();
        assert_eq!(closed.status, EnquiryStatus::Closed);
        assert_eq!(by_status(&store, "closed").await.unwrap().len(), 1);
        assert!(by_status(&store, "open").await.unwrap().is_empty());

        set_visibility(&store, enquiry.id, EnquiryVisibilityRequest { is_hidden: Some(true) })
            .await
            .unwrap();
        assert!(visible(&store).await.unwrap().is_empty());
        assert_eq!(all(&store).await.unwrap().len(), 1);
        assert!(matches!(
            set_visibility(&store, 999, EnquiryVisibilityRequest { is_hidden: Some(true) }).await,
            Err(AppError::NotFound(_))
        ));
    }
}
