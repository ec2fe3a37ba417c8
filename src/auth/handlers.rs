use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use crate::AppState;
use crate::auth::guard::authenticate_request;
use crate::error::AppError;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for email: {}", req.email);

    match state
        .auth_service
        .register(&req.email, &req.password, req.name.as_deref())
        .await
    {
        Ok(token) => {
            info!("Registration successful for email: {}", req.email);
            Ok(HttpResponse::Created().json(token))
        }
        Err(e) => {
            error!("Registration failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email);

    match state.auth_service.login(&req.email, &req.password).await {
        Ok(token) => {
            info!("Login successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(token))
        }
        Err(e) => {
            error!("Login failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

/// "Who am I" endpoint; the guard resolves the bearer token to a user.
pub async fn me(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate_request(&req, &state.auth_service).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Token check without a user-record fetch.
pub async fn verify(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = crate::auth::guard::bearer_token(&req)?;
    let check = state.auth_service.verify_token(token)?;
    Ok(HttpResponse::Ok().json(check))
}
