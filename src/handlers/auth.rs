use actix_web::{web, HttpResponse};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::token::TokenService;
use crate::errors::AppError;
use crate::models::user::User;
use crate::store::users;

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 64))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 72))]
    password: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    user: User,
}

pub async fn signup(
    pool: web::Data<SqlitePool>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    if users::email_taken(&pool, &req.email).await? {
        return Err(AppError::DuplicateEmail(
            "Email already registered".to_string(),
        ));
    }
    if users::username_taken(&pool, &req.username).await? {
        return Err(AppError::DuplicateEmail(
            "Username already registered".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal("Hashing error".to_string()))?
        .to_string();

    let user = users::insert(&pool, &req.username, &req.email, &password_hash).await?;
    Ok(HttpResponse::Created().json(user))
}

pub async fn login(
    pool: web::Data<SqlitePool>,
    tokens: web::Data<TokenService>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    // Unknown email and wrong password collapse into one answer so the
    // response does not reveal which accounts exist.
    let user = users::find_by_email(&pool, &req.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    let token = tokens.issue(user.user_id, &user.email)?;
    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}
