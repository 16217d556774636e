use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::employee::Employee;

pub async fn email_taken(
    pool: &SqlitePool,
    email: &str,
    exclude: Option<Uuid>,
) -> Result<bool, AppError> {
    let taken: bool = match exclude {
        Some(employee_id) => sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM employees
             WHERE LOWER(email) = LOWER(?) AND employee_id != ?)",
        )
        .bind(email)
        .bind(employee_id)
        .fetch_one(pool)
        .await?,
        None => {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employees WHERE LOWER(email) = LOWER(?))")
                .bind(email)
                .fetch_one(pool)
                .await?
        }
    };
    Ok(taken)
}

pub async fn insert(pool: &SqlitePool, employee: &Employee) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO employees (employee_id, first_name, last_name, email, gender,
         designation, salary, date_of_joining, department, employee_photo)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(employee.employee_id)
    .bind(&employee.first_name)
    .bind(&employee.last_name)
    .bind(&employee.email)
    .bind(&employee.gender)
    .bind(&employee.designation)
    .bind(employee.salary)
    .bind(employee.date_of_joining)
    .bind(&employee.department)
    .bind(&employee.employee_photo)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, employee_id: Uuid) -> Result<Option<Employee>, AppError> {
    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await?;
    Ok(employee)
}

pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Employee>, AppError> {
    let employees = sqlx::query_as::<_, Employee>("SELECT * FROM employees")
        .fetch_all(pool)
        .await?;
    Ok(employees)
}

/// Optional filters are additive: both apply when both are given.
pub async fn find_by_designation_or_department(
    pool: &SqlitePool,
    designation: Option<&str>,
    department: Option<&str>,
) -> Result<Vec<Employee>, AppError> {
    let mut builder: sqlx::QueryBuilder<'_, sqlx::Sqlite> =
        sqlx::QueryBuilder::new("SELECT * FROM employees");

    let mut filtered = false;
    if let Some(designation) = designation {
        builder.push(" WHERE designation = ").push_bind(designation);
        filtered = true;
    }
    if let Some(department) = department {
        builder.push(if filtered {
            " AND department = "
        } else {
            " WHERE department = "
        });
        builder.push_bind(department);
    }

    let employees = builder
        .build_query_as::<Employee>()
        .fetch_all(pool)
        .await?;
    Ok(employees)
}

pub async fn update(pool: &SqlitePool, employee: &Employee) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE employees SET first_name = ?, last_name = ?, email = ?, gender = ?,
         designation = ?, salary = ?, date_of_joining = ?, department = ?, employee_photo = ?
         WHERE employee_id = ?",
    )
    .bind(&employee.first_name)
    .bind(&employee.last_name)
    .bind(&employee.email)
    .bind(&employee.gender)
    .bind(&employee.designation)
    .bind(employee.salary)
    .bind(employee.date_of_joining)
    .bind(&employee.department)
    .bind(&employee.employee_photo)
    .bind(employee.employee_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, employee_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM employees WHERE employee_id = ?")
        .bind(employee_id)
        .execute(pool)
        .await?;
    Ok(())
}
