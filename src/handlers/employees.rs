//! # Employee API Handlers
//!
//! Self-registration and profile management for employees. Responses flatten
//! the account fields into the profile.

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{FieldErrors, PageQuery, PaginatedResponse, redacted_payload};
use crate::auth::{Actor, hash_password};
use crate::error::ApiError;
use crate::models::Role;
use crate::policy::{Action, Resource, permit_collection_action, permit_instance_action};
use crate::repositories::{
    AccountChanges, EmployeeChanges, EmployeeRecord, EmployeeRepository, NewAccount, NewEmployee,
};
use crate::server::AppState;

/// Account fields nested under `user` in employee payloads
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EmployeeAccountInput {
    #[schema(example = "jdoe")]
    pub username: Option<String>,
    #[schema(example = "jdoe@example.com")]
    pub email: Option<String>,
    /// Write-only
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request payload for registering an employee
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    #[schema(example = "Accounts")]
    pub department: Option<String>,
    pub user: Option<EmployeeAccountInput>,
}

/// Request payload for a partial employee update. Username and email are ignored.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateEmployeeRequest {
    pub department: Option<String>,
    pub user: Option<EmployeeAccountInput>,
}

/// Employee profile with its account fields flattened in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub pk: i32,
    pub department: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<EmployeeRecord> for EmployeeResponse {
    fn from(record: EmployeeRecord) -> Self {
        let EmployeeRecord { profile, account } = record;
        Self {
            pk: profile.id,
            department: profile.department,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
        }
    }
}

/// List employees (admin only)
#[utoipa::path(
    get,
    path = "/api/employee/",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Employees ordered by username", body = PaginatedResponse<EmployeeResponse>),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Admin only", body = ApiError),
        (status = 404, description = "Invalid page", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn list_employees(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<EmployeeResponse>>, ApiError> {
    tracing::info!(actor = actor.label(), query = ?params, "GET employee-list");
    permit_collection_action(&actor, Resource::Employee, Action::List)?;

    let page = EmployeeRepository::new(&state.db)
        .list(params.request(state.config.page_size))
        .await?;

    Ok(Json(page.map(EmployeeResponse::from).into()))
}

/// Register an employee together with its login account
#[utoipa::path(
    post,
    path = "/api/employee/",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EmployeeResponse>), ApiError> {
    let Json(request) = payload?;
    tracing::info!(
        actor = actor.label(),
        payload = %redacted_payload(&request),
        "POST employee-list"
    );
    permit_collection_action(&actor, Resource::Employee, Action::Create)?;

    let user = request.user.unwrap_or_default();
    let mut errors = FieldErrors::new();
    errors.username(user.username.as_deref());
    errors.email(user.email.as_deref());
    errors.required("password", user.password.as_deref());
    errors.max_length("first_name", user.first_name.as_deref(), 150);
    errors.max_length("last_name", user.last_name.as_deref(), 150);
    errors.max_length("department", request.department.as_deref(), 150);
    errors.into_result()?;

    let password_hash = hash_password(user.password.as_deref().unwrap_or_default())?;
    let new_employee = NewEmployee {
        account: NewAccount {
            username: user.username.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            password_hash,
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            role: Role::Employee,
            is_admin: false,
        },
        department: request.department.unwrap_or_default(),
    };

    let txn = state.db.begin().await?;
    let record = EmployeeRepository::new(&txn).create(new_employee).await?;
    txn.commit().await?;

    tracing::info!(employee_id = record.profile.id, username = %record.account.username, "Employee registered");
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Get one employee
#[utoipa::path(
    get,
    path = "/api/employee/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = EmployeeResponse),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Not your profile", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    tracing::info!(actor = actor.label(), employee_id = id, "GET employee-detail");
    permit_collection_action(&actor, Resource::Employee, Action::Retrieve)?;

    let record = EmployeeRepository::new(&state.db).get(id).await?;
    permit_instance_action(
        &actor,
        Resource::Employee,
        Action::Retrieve,
        &record.account.username,
    )?;

    Ok(Json(record.into()))
}

/// Partially update an employee
#[utoipa::path(
    patch,
    path = "/api/employee/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee id")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Updated employee", body = EmployeeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Not your profile", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateEmployeeRequest>, JsonRejection>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(
        actor = actor.label(),
        employee_id = id,
        payload = %redacted_payload(&request),
        "PATCH employee-detail"
    );
    permit_collection_action(&actor, Resource::Employee, Action::Update)?;

    let repo = EmployeeRepository::new(&state.db);
    let record = repo.get(id).await?;
    permit_instance_action(
        &actor,
        Resource::Employee,
        Action::Update,
        &record.account.username,
    )?;

    let user = request.user.unwrap_or_default();
    let mut errors = FieldErrors::new();
    errors.max_length("first_name", user.first_name.as_deref(), 150);
    errors.max_length("last_name", user.last_name.as_deref(), 150);
    errors.max_length("department", request.department.as_deref(), 150);
    errors.into_result()?;

    let password_hash = match user.password.as_deref() {
        Some(password) if !password.is_empty() => Some(hash_password(password)?),
        _ => None,
    };

    let changes = EmployeeChanges {
        account: AccountChanges {
            password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
        },
        department: request.department,
    };

    let updated = repo.update(record, changes).await?;
    Ok(Json(updated.into()))
}

/// Delete an employee and its account (admin only)
#[utoipa::path(
    delete,
    path = "/api/employee/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee id")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Admin only", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(actor = actor.label(), employee_id = id, "DELETE employee-detail");
    permit_collection_action(&actor, Resource::Employee, Action::Delete)?;

    let repo = EmployeeRepository::new(&state.db);
    let record = repo.get(id).await?;
    permit_instance_action(
        &actor,
        Resource::Employee,
        Action::Delete,
        &record.account.username,
    )?;
    repo.delete(&record).await?;

    Ok(StatusCode::NO_CONTENT)
}
