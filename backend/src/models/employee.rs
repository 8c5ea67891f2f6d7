use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "employee_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Staff,
    Technician,
    Manager,
    BranchOwner,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: Uuid,
    pub full_name: String,
    pub national_id: String,
    pub role: EmployeeRole,
    pub active: bool,
    pub branch_id: Uuid,
}

impl Employee {
    pub fn hire(req: EmployeeRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: req.full_name,
            national_id: req.national_id,
            role: req.role,
            active: req.active,
            branch_id: req.branch_id,
        }
    }

    pub fn with_id(id: Uuid, req: EmployeeRequest) -> Self {
        Self {
            id,
            ..Self::hire(req)
        }
    }
}

/// Employee as returned to clients, with the owning branch's name resolved
/// at read time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq)]
pub struct EmployeeView {
    pub id: Uuid,
    pub full_name: String,
    pub national_id: String,
    pub role: EmployeeRole,
    pub active: bool,
    pub branch_id: Uuid,
    pub branch_name: String,
}

impl EmployeeView {
    pub fn new(employee: Employee, branch_name: String) -> Self {
        Self {
            id: employee.id,
            full_name: employee.full_name,
            national_id: employee.national_id,
            role: employee.role,
            active: employee.active,
            branch_id: employee.branch_id,
            branch_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmployeeRequest {
    #[validate(length(min = 1, max = 80, message = "full_name must be 1-80 characters"))]
    pub full_name: String,
    #[validate(length(min = 1, max = 14, message = "national_id must be 1-14 characters"))]
    pub national_id: String,
    pub role: EmployeeRole,
    #[serde(default = "default_active")]
    pub active: bool,
    pub branch_id: Uuid,
}

fn default_active() -> bool {
    true
}
