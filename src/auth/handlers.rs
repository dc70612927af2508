// HTTP handlers for authentication endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};

use crate::auth::{
    error::AuthError,
    middleware::{bearer_token, AuthenticatedUser},
    models::{
        AssignRoleRequest, IdQuery, LoginRequest, RegisterRequest, RoleRequest, RoleResponse,
        UserResponse, UserRoleResponse,
    },
    service::AuthService,
};
use crate::error::AppError;
use crate::response::{paginate, PageRequest, ServiceResponse};
use crate::validation::{FieldErrors, ValidatedJson};

/// Lists that clients may cache for a minute
const CACHE_FOR_60_SECONDS: &str = "public, max-age=60";

fn required_id(query: IdQuery) -> Result<String, AppError> {
    query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::MissingArgument("id".to_string()))
}

/// List roles
/// GET /api/auth/role
pub async fn get_roles(State(service): State<Arc<AuthService>>) -> Result<impl IntoResponse, AppError> {
    let roles = service.get_roles().await?;
    Ok((
        [(header::CACHE_CONTROL, CACHE_FOR_60_SECONDS)],
        Json(ServiceResponse::success(roles)),
    ))
}

/// Create a role
/// POST /api/auth/role/add
pub async fn add_role(
    State(service): State<Arc<AuthService>>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<RoleRequest>,
) -> Result<Json<ServiceResponse<RoleResponse>>, AppError> {
    let role = service.add_role(&request.role_name, Some(caller.user_id)).await?;
    Ok(Json(ServiceResponse::success(role)))
}

/// Rename a role
/// PUT /api/auth/role/update?id=
pub async fn update_role(
    State(service): State<Arc<AuthService>>,
    Query(query): Query<IdQuery>,
    ValidatedJson(request): ValidatedJson<RoleRequest>,
) -> Result<Json<ServiceResponse<RoleResponse>>, AppError> {
    let id = required_id(query)?;
    let role = service.update_role(&id, &request.role_name).await?;
    Ok(Json(ServiceResponse::success(role)))
}

/// Delete a role
/// DELETE /api/auth/role/delete?id=
pub async fn delete_role(
    State(service): State<Arc<AuthService>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ServiceResponse<RoleResponse>>, AppError> {
    let id = required_id(query)?;
    let role = service.delete_role(&id).await?;
    Ok(Json(ServiceResponse::success(role)))
}

/// List all user-role links
/// GET /api/auth/userroles
pub async fn get_user_roles(
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ServiceResponse<Vec<UserRoleResponse>>>, AppError> {
    let links = service.get_user_roles().await?;
    Ok(Json(ServiceResponse::success(links)))
}

/// List users, optionally one page at a time
/// GET /api/auth/user?page=&recordsPerPage=
pub async fn get_users(
    State(service): State<Arc<AuthService>>,
    page: Result<Query<PageRequest>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(page) =
        page.map_err(|rejection| AppError::Validation(FieldErrors::single("query", rejection.body_text())))?;

    let users = service.get_users().await?;
    let envelope = if page.is_requested() {
        let (slice, pagination) = paginate(users, &page);
        ServiceResponse::paginated(slice, pagination)
    } else {
        ServiceResponse::success(users)
    };

    Ok(([(header::CACHE_CONTROL, CACHE_FOR_60_SECONDS)], Json(envelope)))
}

/// Get one user with roles
/// GET /api/auth/user/:id
pub async fn get_user_by_id(
    State(service): State<Arc<AuthService>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceResponse<UserResponse>>, AppError> {
    let user = service.get_user_by_id(&id).await?;
    Ok(Json(ServiceResponse::success(user)))
}

/// Login a user
/// POST /api/auth/login
pub async fn login(
    State(service): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ServiceResponse<String>>, AppError> {
    let token = service.login(&request.username, &request.password).await?;
    Ok(Json(ServiceResponse::success(token)))
}

/// Register a new user
/// POST /api/auth/register
pub async fn register(
    State(service): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<ServiceResponse<UserResponse>>, AppError> {
    let user = service.register(&request.username, &request.password).await?;
    Ok(Json(ServiceResponse::success(user)))
}

/// Link a user to a role
/// POST /api/auth/assignrole
pub async fn assign_role(
    State(service): State<Arc<AuthService>>,
    caller: Option<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<AssignRoleRequest>,
) -> Result<Json<ServiceResponse<UserRoleResponse>>, AppError> {
    let link = service
        .assign_role(&request.user_id, &request.role_id, caller.map(|c| c.user_id))
        .await?;
    Ok(Json(ServiceResponse::success(link)))
}

/// Exchange a valid token for a fresh one
/// POST /api/auth/renew
pub async fn renew(
    State(service): State<Arc<AuthService>>,
    headers: HeaderMap,
) -> Result<Json<ServiceResponse<String>>, AppError> {
    let current = bearer_token(&headers).ok_or(AuthError::InvalidToken)?;
    let token = service.renew(current).await?;
    Ok(Json(ServiceResponse::success(token)))
}
