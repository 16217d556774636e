use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::guard::require_auth;
use crate::auth::token::TokenService;
use crate::errors::AppError;
use crate::models::employee::{parse_joining_date, Employee};
use crate::store::employees;
use crate::uploads::AttachmentStore;

const NOT_FOUND_MSG: &str = "Employee not found";
const DUPLICATE_MSG: &str = "Employee with this email already exists";

#[derive(Deserialize)]
pub struct EmployeeSearchParams {
    designation: Option<String>,
    department: Option<String>,
}

#[derive(Validate)]
struct NewEmployeeForm {
    #[validate(length(min = 1, max = 64))]
    first_name: String,
    #[validate(length(min = 1, max = 64))]
    last_name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 32))]
    gender: String,
    #[validate(length(min = 1, max = 64))]
    designation: String,
    #[validate(range(min = 0.0))]
    salary: f64,
    #[validate(length(min = 1, max = 64))]
    department: String,
}

// Gender and joining date are fixed at creation; the update surface
// matches the create surface minus those two fields.
#[derive(Validate)]
struct EmployeeUpdateForm {
    #[validate(length(min = 1, max = 64))]
    first_name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    last_name: Option<String>,
    #[validate(email)]
    email: Option<String>,
    #[validate(length(min = 1, max = 64))]
    designation: Option<String>,
    #[validate(range(min = 0.0))]
    salary: Option<f64>,
    #[validate(length(min = 1, max = 64))]
    department: Option<String>,
}

/// Text fields plus the photo already streamed to disk, if one was sent.
struct EmployeeUpload {
    fields: HashMap<String, String>,
    photo: Option<String>,
}

pub async fn get_employees(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    require_auth(&req, &tokens)?;

    let list = employees::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn search_employees(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    tokens: web::Data<TokenService>,
    query: web::Query<EmployeeSearchParams>,
) -> Result<HttpResponse, AppError> {
    require_auth(&req, &tokens)?;

    let list = employees::find_by_designation_or_department(
        &pool,
        query.designation.as_deref(),
        query.department.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn search_employee_by_id(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    tokens: web::Data<TokenService>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_auth(&req, &tokens)?;

    let employee_id = parse_employee_id(&id)?;
    let employee = employees::find_by_id(&pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND_MSG.to_string()))?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn add_employee(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    tokens: web::Data<TokenService>,
    attachments: web::Data<AttachmentStore>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    require_auth(&req, &tokens)?;

    let upload = read_employee_form(payload, &attachments).await?;

    let result = insert_from_upload(&pool, &upload).await;
    match result {
        Ok(employee) => Ok(HttpResponse::Created().json(employee)),
        Err(err) => {
            // The photo was written before the record failed; remove the
            // orphan before surfacing the error.
            discard_photo(&attachments, &upload.photo).await;
            Err(err)
        }
    }
}

pub async fn update_employee(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    tokens: web::Data<TokenService>,
    attachments: web::Data<AttachmentStore>,
    id: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    require_auth(&req, &tokens)?;

    let employee_id = parse_employee_id(&id)?;
    let existing = employees::find_by_id(&pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND_MSG.to_string()))?;
    let old_photo = existing.employee_photo.clone();

    let upload = read_employee_form(payload, &attachments).await?;

    match apply_update(&pool, existing, &upload).await {
        Ok(updated) => {
            // The record now points at the new photo; the old file can go.
            if upload.photo.is_some() {
                discard_photo(&attachments, &old_photo).await;
            }
            Ok(HttpResponse::Ok().json(updated))
        }
        Err(err) => {
            discard_photo(&attachments, &upload.photo).await;
            Err(err)
        }
    }
}

pub async fn delete_employee(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    tokens: web::Data<TokenService>,
    attachments: web::Data<AttachmentStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_auth(&req, &tokens)?;

    let employee_id = parse_employee_id(&id)?;
    let employee = employees::find_by_id(&pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND_MSG.to_string()))?;

    employees::delete(&pool, employee_id).await?;
    discard_photo(&attachments, &employee.employee_photo).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully",
    })))
}

fn parse_employee_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(NOT_FOUND_MSG.to_string()))
}

async fn discard_photo(attachments: &AttachmentStore, photo: &Option<String>) {
    if let Some(path) = photo {
        attachments.delete(path).await;
    }
}

/// Walks the multipart body: text parts collect into a field map, the
/// `file` part streams straight into the attachment store. Any failure
/// after the photo hit disk removes it again.
async fn read_employee_form(
    mut payload: Multipart,
    attachments: &AttachmentStore,
) -> Result<EmployeeUpload, AppError> {
    let mut fields = HashMap::new();
    let mut photo: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(err) => {
                discard_photo(attachments, &photo).await;
                return Err(AppError::Validation(format!(
                    "Malformed multipart payload: {}",
                    err
                )));
            }
        };

        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or("")
            .to_string();

        if name == "file" {
            if photo.is_some() {
                discard_photo(attachments, &photo).await;
                return Err(AppError::Validation(
                    "At most one file attachment is allowed".to_string(),
                ));
            }
            let filename = field
                .content_disposition()
                .get_filename()
                .unwrap_or("")
                .to_string();
            let declared_mime = field
                .content_type()
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_default();
            let chunks = field.map(|chunk| {
                chunk.map_err(|err| {
                    AppError::Validation(format!("Upload stream error: {}", err))
                })
            });
            photo = Some(attachments.store(chunks, &filename, &declared_mime).await?);
        } else {
            let mut value = Vec::new();
            while let Some(chunk) = field.next().await {
                match chunk {
                    Ok(bytes) => value.extend_from_slice(&bytes),
                    Err(err) => {
                        discard_photo(attachments, &photo).await;
                        return Err(AppError::Validation(format!(
                            "Malformed multipart payload: {}",
                            err
                        )));
                    }
                }
            }
            match String::from_utf8(value) {
                Ok(text) => {
                    fields.insert(name, text);
                }
                Err(_) => {
                    discard_photo(attachments, &photo).await;
                    return Err(AppError::Validation(
                        "Form fields must be UTF-8".to_string(),
                    ));
                }
            }
        }
    }

    Ok(EmployeeUpload { fields, photo })
}

async fn insert_from_upload(
    pool: &SqlitePool,
    upload: &EmployeeUpload,
) -> Result<Employee, AppError> {
    let fields = &upload.fields;
    let form = NewEmployeeForm {
        first_name: required_field(fields, "first_name")?,
        last_name: required_field(fields, "last_name")?,
        email: required_field(fields, "email")?,
        gender: required_field(fields, "gender")?,
        designation: required_field(fields, "designation")?,
        salary: parse_salary(&required_field(fields, "salary")?)?,
        department: required_field(fields, "department")?,
    };
    form.validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;
    let date_of_joining = parse_joining_date(&required_field(fields, "date_of_joining")?)
        .map_err(AppError::Validation)?;

    if employees::email_taken(pool, &form.email, None).await? {
        return Err(AppError::DuplicateEmployee(DUPLICATE_MSG.to_string()));
    }

    let employee = Employee {
        employee_id: Uuid::new_v4(),
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        gender: form.gender,
        designation: form.designation,
        salary: form.salary,
        date_of_joining,
        department: form.department,
        employee_photo: upload.photo.clone(),
    };
    employees::insert(pool, &employee).await?;
    Ok(employee)
}

async fn apply_update(
    pool: &SqlitePool,
    mut employee: Employee,
    upload: &EmployeeUpload,
) -> Result<Employee, AppError> {
    let fields = &upload.fields;
    let form = EmployeeUpdateForm {
        first_name: fields.get("first_name").cloned(),
        last_name: fields.get("last_name").cloned(),
        email: fields.get("email").cloned(),
        designation: fields.get("designation").cloned(),
        salary: match fields.get("salary") {
            Some(raw) => Some(parse_salary(raw)?),
            None => None,
        },
        department: fields.get("department").cloned(),
    };
    form.validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    if let Some(email) = &form.email {
        if employees::email_taken(pool, email, Some(employee.employee_id)).await? {
            return Err(AppError::DuplicateEmployee(DUPLICATE_MSG.to_string()));
        }
    }

    if let Some(first_name) = form.first_name {
        employee.first_name = first_name;
    }
    if let Some(last_name) = form.last_name {
        employee.last_name = last_name;
    }
    if let Some(email) = form.email {
        employee.email = email;
    }
    if let Some(designation) = form.designation {
        employee.designation = designation;
    }
    if let Some(salary) = form.salary {
        employee.salary = salary;
    }
    if let Some(department) = form.department {
        employee.department = department;
    }
    if let Some(photo) = &upload.photo {
        employee.employee_photo = Some(photo.clone());
    }

    employees::update(pool, &employee).await?;
    Ok(employee)
}

fn required_field(fields: &HashMap<String, String>, name: &str) -> Result<String, AppError> {
    fields
        .get(name)
        .cloned()
        .ok_or_else(|| AppError::Validation(format!("Missing field: {}", name)))
}

fn parse_salary(raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AppError::Validation("Invalid salary".to_string()))
}
