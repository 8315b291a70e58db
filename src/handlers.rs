use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    models::{
        CreateUserRequest, CreatedResponse, KeywordsResponse, LogInRequest, MeResponse,
        RecipeStep, RecipeStepRequest, Role, Salad, SaladRequest, SignUpRequest, TokenResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

// --- Auth ---

/// sign_up
///
/// [Public Route] Creates an account with the `user` role and returns a token for it.
/// Admin accounts are only created through `POST /admin/users`.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Registered", body = TokenResponse),
        (status = 409, description = "Username taken")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let token = state
        .auth
        .sign_up(&payload.username, &payload.password, Role::User)
        .await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// log_in
///
/// [Public Route] Exchanges username and password for a token. Unknown usernames and
/// wrong passwords produce the same 401 body.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LogInRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn log_in(
    State(state): State<AppState>,
    Json(payload): Json<LogInRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state.auth.log_in(&payload.username, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

/// get_me
///
/// [Authenticated Route] Echoes the caller's verified claims.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Current identity", body = MeResponse))
)]
pub async fn get_me(AuthUser { id, role, payload }: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id,
        role,
        expires_at: payload.expires_at,
    })
}

// --- Salads ---

/// create_salad
///
/// [Authenticated Route] Name and description pass the validation pipeline first.
#[utoipa::path(
    post,
    path = "/salads",
    request_body = SaladRequest,
    responses(
        (status = 201, description = "Created", body = CreatedResponse),
        (status = 422, description = "Content rejected")
    )
)]
pub async fn create_salad(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SaladRequest>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let salad = Salad {
        id: Uuid::nil(),
        author_id,
        name: payload.name,
        description: payload.description,
    };
    let id = state.salads.create(salad).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// update_salad
///
/// [Authenticated Route] Owner-Only: a salad the caller does not own is reported as 404.
#[utoipa::path(
    put,
    path = "/salads/{id}",
    params(("id" = Uuid, Path, description = "Salad ID")),
    request_body = SaladRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 404, description = "Not found or not owner"),
        (status = 422, description = "Content rejected")
    )
)]
pub async fn update_salad(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaladRequest>,
) -> AppResult<StatusCode> {
    let salad = Salad {
        id,
        author_id,
        name: payload.name,
        description: payload.description,
    };
    state.salads.update(salad).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// get_salad
///
/// [Public Route] Reads skip validation entirely.
#[utoipa::path(
    get,
    path = "/salads/{id}",
    params(("id" = Uuid, Path, description = "Salad ID")),
    responses((status = 200, description = "Found", body = Salad))
)]
pub async fn get_salad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Salad>> {
    Ok(Json(state.salads.get_by_id(id).await?))
}

// --- Recipe Steps ---

#[utoipa::path(
    post,
    path = "/recipe-steps",
    request_body = RecipeStepRequest,
    responses(
        (status = 201, description = "Created", body = CreatedResponse),
        (status = 422, description = "Content rejected")
    )
)]
pub async fn create_recipe_step(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<RecipeStepRequest>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let step = RecipeStep {
        id: Uuid::nil(),
        recipe_id: payload.recipe_id,
        author_id,
        name: payload.name,
        description: payload.description,
        step_num: payload.step_num,
    };
    let id = state.steps.create(step).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    put,
    path = "/recipe-steps/{id}",
    params(("id" = Uuid, Path, description = "Recipe step ID")),
    request_body = RecipeStepRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 404, description = "Not found or not owner"),
        (status = 422, description = "Content rejected")
    )
)]
pub async fn update_recipe_step(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipeStepRequest>,
) -> AppResult<StatusCode> {
    let step = RecipeStep {
        id,
        recipe_id: payload.recipe_id,
        author_id,
        name: payload.name,
        description: payload.description,
        step_num: payload.step_num,
    };
    state.steps.update(step).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/recipe-steps/{id}",
    params(("id" = Uuid, Path, description = "Recipe step ID")),
    responses((status = 200, description = "Found", body = RecipeStep))
)]
pub async fn get_recipe_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RecipeStep>> {
    Ok(Json(state.steps.get_by_id(id).await?))
}

// --- Admin ---

/// get_keywords
///
/// [Admin Route] The banned keyword set the running validator was built with.
#[utoipa::path(
    get,
    path = "/admin/keywords",
    responses((status = 200, description = "Active keywords", body = KeywordsResponse))
)]
pub async fn get_keywords(State(state): State<AppState>) -> Json<KeywordsResponse> {
    Json(KeywordsResponse {
        keywords: state.keywords.keywords(),
    })
}

/// create_user
///
/// [Admin Route] Signup with an explicit role, the only way to mint another admin.
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = TokenResponse),
        (status = 409, description = "Username taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let token = state
        .auth
        .sign_up(&payload.username, &payload.password, payload.role)
        .await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
