use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::FleetStore;
use crate::{
    error::{AppError, Result},
    models::{
        branch::{Branch, BranchRow},
        employee::{Employee, EmployeeView},
        vehicle::{Vehicle, VehicleView},
    },
    pagination::Window,
};

const BRANCH_SELECT: &str = r#"
    SELECT b.id, b.name, b.tax_id, b.phone, b.opening_date, b.closure_date,
           a.postal_code, a.street, a.number, a.complement, a.district,
           a.city, a.region_code, a.country
    FROM branches b
    JOIN addresses a ON a.branch_id = b.id
"#;

const EMPLOYEE_SELECT: &str = r#"
    SELECT e.id, e.full_name, e.national_id, e.role, e.active, e.branch_id,
           b.name AS branch_name
    FROM employees e
    JOIN branches b ON b.id = e.branch_id
"#;

const VEHICLE_SELECT: &str = r#"
    SELECT v.id, v.plate, v.make, v.model, v.year, v.status, v.branch_id,
           b.name AS branch_name
    FROM vehicles v
    JOIN branches b ON b.id = v.branch_id
"#;

/// Maps constraint violations raised by a write to domain errors. Anything
/// else stays a database error.
fn map_write_error(err: sqlx::Error, conflict: String, branch_id: Option<Uuid>) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            tracing::debug!(constraint = ?db_err.constraint(), "unique violation on write");
            return AppError::Conflict(conflict);
        }
        if db_err.is_foreign_key_violation() {
            if let Some(id) = branch_id {
                return AppError::InvalidReference(id);
            }
        }
    }
    AppError::Database(err)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FleetStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn count_branches(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_branches(&self, window: Window) -> Result<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(&format!(
            "{BRANCH_SELECT} ORDER BY b.name, b.id LIMIT $1 OFFSET $2"
        ))
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Branch::from).collect())
    }

    async fn find_branch(&self, id: Uuid) -> Result<Option<Branch>> {
        let row = sqlx::query_as::<_, BranchRow>(&format!("{BRANCH_SELECT} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Branch::from))
    }

    async fn find_branch_by_tax_id(&self, tax_id: &str) -> Result<Option<Branch>> {
        let row = sqlx::query_as::<_, BranchRow>(&format!("{BRANCH_SELECT} WHERE b.tax_id = $1"))
            .bind(tax_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Branch::from))
    }

    async fn insert_branch(&self, branch: &Branch) -> Result<()> {
        let conflict = || format!("A branch with tax id {} already exists", branch.tax_id);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO branches (id, name, tax_id, phone, opening_date, closure_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(branch.id)
        .bind(&branch.name)
        .bind(&branch.tax_id)
        .bind(&branch.phone)
        .bind(branch.opening_date)
        .bind(branch.closure_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, conflict(), None))?;

        let a = &branch.address;
        sqlx::query(
            r#"
            INSERT INTO addresses
                (branch_id, postal_code, street, number, complement, district, city, region_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(branch.id)
        .bind(&a.postal_code)
        .bind(&a.street)
        .bind(&a.number)
        .bind(&a.complement)
        .bind(&a.district)
        .bind(&a.city)
        .bind(&a.region_code)
        .bind(&a.country)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_branch(&self, branch: &Branch) -> Result<bool> {
        let conflict = || format!("A branch with tax id {} already exists", branch.tax_id);
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE branches
            SET name = $2, tax_id = $3, phone = $4, opening_date = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(branch.id)
        .bind(&branch.name)
        .bind(&branch.tax_id)
        .bind(&branch.phone)
        .bind(branch.opening_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, conflict(), None))?
        .rows_affected();

        if updated == 0 {
            return Ok(false);
        }

        let a = &branch.address;
        sqlx::query(
            r#"
            UPDATE addresses
            SET postal_code = $2, street = $3, number = $4, complement = $5,
                district = $6, city = $7, region_code = $8, country = $9
            WHERE branch_id = $1
            "#,
        )
        .bind(branch.id)
        .bind(&a.postal_code)
        .bind(&a.street)
        .bind(&a.number)
        .bind(&a.complement)
        .bind(&a.district)
        .bind(&a.city)
        .bind(&a.region_code)
        .bind(&a.country)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn mark_branch_closed(&self, id: Uuid, closed_on: Date) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE branches SET closure_date = $2, updated_at = NOW()
             WHERE id = $1 AND closure_date IS NULL",
        )
        .bind(id)
        .bind(closed_on)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_employees(&self, branch_id: Option<Uuid>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM employees WHERE ($1::uuid IS NULL OR branch_id = $1)",
        )
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_employees(
        &self,
        branch_id: Option<Uuid>,
        window: Window,
    ) -> Result<Vec<EmployeeView>> {
        let rows = sqlx::query_as::<_, EmployeeView>(&format!(
            "{EMPLOYEE_SELECT}
             WHERE ($1::uuid IS NULL OR e.branch_id = $1)
             ORDER BY e.full_name, e.id
             LIMIT $2 OFFSET $3"
        ))
        .bind(branch_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_employee(&self, id: Uuid) -> Result<Option<EmployeeView>> {
        let row = sqlx::query_as::<_, EmployeeView>(&format!("{EMPLOYEE_SELECT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_employee_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<EmployeeView>> {
        let row = sqlx::query_as::<_, EmployeeView>(&format!(
            "{EMPLOYEE_SELECT} WHERE e.national_id = $1"
        ))
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (id, full_name, national_id, role, active, branch_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(employee.id)
        .bind(&employee.full_name)
        .bind(&employee.national_id)
        .bind(employee.role)
        .bind(employee.active)
        .bind(employee.branch_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                format!(
                    "An employee with national id {} already exists",
                    employee.national_id
                ),
                Some(employee.branch_id),
            )
        })?;
        Ok(())
    }

    async fn update_employee(&self, employee: &Employee) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET full_name = $2, national_id = $3, role = $4, active = $5, branch_id = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(employee.id)
        .bind(&employee.full_name)
        .bind(&employee.national_id)
        .bind(employee.role)
        .bind(employee.active)
        .bind(employee.branch_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                format!(
                    "An employee with national id {} already exists",
                    employee.national_id
                ),
                Some(employee.branch_id),
            )
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_employee(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_vehicles(&self, branch_id: Option<Uuid>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vehicles WHERE ($1::uuid IS NULL OR branch_id = $1)",
        )
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_vehicles(
        &self,
        branch_id: Option<Uuid>,
        window: Window,
    ) -> Result<Vec<VehicleView>> {
        let rows = sqlx::query_as::<_, VehicleView>(&format!(
            "{VEHICLE_SELECT}
             WHERE ($1::uuid IS NULL OR v.branch_id = $1)
             ORDER BY v.plate, v.id
             LIMIT $2 OFFSET $3"
        ))
        .bind(branch_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_vehicle(&self, id: Uuid) -> Result<Option<VehicleView>> {
        let row = sqlx::query_as::<_, VehicleView>(&format!("{VEHICLE_SELECT} WHERE v.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<VehicleView>> {
        let row = sqlx::query_as::<_, VehicleView>(&format!("{VEHICLE_SELECT} WHERE v.plate = $1"))
            .bind(plate)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, plate, make, model, year, status, branch_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.plate)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.status)
        .bind(vehicle.branch_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                format!("A vehicle with plate {} already exists", vehicle.plate),
                Some(vehicle.branch_id),
            )
        })?;
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET plate = $2, make = $3, model = $4, year = $5, status = $6, branch_id = $7,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.plate)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.status)
        .bind(vehicle.branch_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                format!("A vehicle with plate {} already exists", vehicle.plate),
                Some(vehicle.branch_id),
            )
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
