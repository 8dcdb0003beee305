use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use taskhive_application::{CreateOrganizationInput, RequestContext, UpdateOrganizationInput};
use taskhive_core::{OrganizationId, Principal};
use uuid::Uuid;

use crate::dto::{
    CreateOrganizationRequest, OrganizationResponse, UpdateOrganizationRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_organizations_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<Vec<OrganizationResponse>>> {
    let organizations = state
        .organizations
        .list(&principal, &context)
        .await?
        .into_iter()
        .map(OrganizationResponse::from)
        .collect();

    Ok(Json(organizations))
}

pub async fn create_organization_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<OrganizationResponse>)> {
    let organization = state
        .organizations
        .create(
            &principal,
            CreateOrganizationInput {
                name: request.name,
                description: request.description,
                parent_id: request.parent_id.map(OrganizationId::from_uuid),
            },
            &context,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrganizationResponse::from(organization)),
    ))
}

pub async fn get_organization_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<OrganizationResponse>> {
    let organization = state
        .organizations
        .get(
            &principal,
            OrganizationId::from_uuid(organization_id),
            &context,
        )
        .await?;

    Ok(Json(OrganizationResponse::from(organization)))
}

pub async fn list_organization_children_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let organization_id = OrganizationId::from_uuid(organization_id);
    state
        .authorization
        .require_organization_access(&principal, organization_id, &context)
        .await?;

    let children = state
        .hierarchy
        .children(organization_id)
        .await?
        .into_iter()
        .map(|child| child.as_uuid())
        .collect();

    Ok(Json(children))
}

pub async fn update_organization_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<UpdateOrganizationRequest>,
) -> ApiResult<Json<OrganizationResponse>> {
    let organization = state
        .organizations
        .update(
            &principal,
            OrganizationId::from_uuid(organization_id),
            UpdateOrganizationInput {
                name: request.name,
                description: request.description,
            },
            &context,
        )
        .await?;

    Ok(Json(OrganizationResponse::from(organization)))
}

pub async fn delete_organization_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .organizations
        .delete(
            &principal,
            OrganizationId::from_uuid(organization_id),
            &context,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
