//! Entity persistence for branches, employees and vehicles.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        branch::Branch,
        employee::{Employee, EmployeeView},
        vehicle::{Vehicle, VehicleView},
    },
    pagination::{PageSource, Window},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage operations behind every resource handler.
///
/// Listings are ordered deterministically: branches by name, employees by
/// full name, vehicles by plate, each with the id as tie-breaker. Writes that
/// hit a uniqueness constraint fail with `AppError::Conflict`; writes naming a
/// missing branch fail with `AppError::InvalidReference`. The `update_*` and
/// `delete_*` operations return `false` when the target row does not exist.
#[async_trait]
pub trait FleetStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    // Branches
    async fn count_branches(&self) -> Result<i64>;
    async fn list_branches(&self, window: Window) -> Result<Vec<Branch>>;
    async fn find_branch(&self, id: Uuid) -> Result<Option<Branch>>;
    async fn find_branch_by_tax_id(&self, tax_id: &str) -> Result<Option<Branch>>;
    async fn insert_branch(&self, branch: &Branch) -> Result<()>;
    /// Replaces the branch and its address. The stored closure date is kept.
    async fn update_branch(&self, branch: &Branch) -> Result<bool>;
    /// Sets the closure date only if the branch is still open. Returns whether
    /// a row changed.
    async fn mark_branch_closed(&self, id: Uuid, closed_on: Date) -> Result<bool>;

    // Employees
    async fn count_employees(&self, branch_id: Option<Uuid>) -> Result<i64>;
    async fn list_employees(
        &self,
        branch_id: Option<Uuid>,
        window: Window,
    ) -> Result<Vec<EmployeeView>>;
    async fn find_employee(&self, id: Uuid) -> Result<Option<EmployeeView>>;
    async fn find_employee_by_national_id(&self, national_id: &str)
        -> Result<Option<EmployeeView>>;
    async fn insert_employee(&self, employee: &Employee) -> Result<()>;
    async fn update_employee(&self, employee: &Employee) -> Result<bool>;
    async fn delete_employee(&self, id: Uuid) -> Result<bool>;

    // Vehicles
    async fn count_vehicles(&self, branch_id: Option<Uuid>) -> Result<i64>;
    async fn list_vehicles(&self, branch_id: Option<Uuid>, window: Window)
        -> Result<Vec<VehicleView>>;
    async fn find_vehicle(&self, id: Uuid) -> Result<Option<VehicleView>>;
    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<VehicleView>>;
    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<()>;
    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool>;
    async fn delete_vehicle(&self, id: Uuid) -> Result<bool>;
}

pub struct BranchListing<'a> {
    pub store: &'a dyn FleetStore,
}

#[async_trait]
impl PageSource for BranchListing<'_> {
    type Item = Branch;

    async fn count(&self) -> Result<i64> {
        self.store.count_branches().await
    }

    async fn fetch(&self, window: Window) -> Result<Vec<Branch>> {
        self.store.list_branches(window).await
    }
}

pub struct EmployeeListing<'a> {
    pub store: &'a dyn FleetStore,
    pub branch_id: Option<Uuid>,
}

#[async_trait]
impl PageSource for EmployeeListing<'_> {
    type Item = EmployeeView;

    async fn count(&self) -> Result<i64> {
        self.store.count_employees(self.branch_id).await
    }

    async fn fetch(&self, window: Window) -> Result<Vec<EmployeeView>> {
        self.store.list_employees(self.branch_id, window).await
    }
}

pub struct VehicleListing<'a> {
    pub store: &'a dyn FleetStore,
    pub branch_id: Option<Uuid>,
}

#[async_trait]
impl PageSource for VehicleListing<'_> {
    type Item = VehicleView;

    async fn count(&self) -> Result<i64> {
        self.store.count_vehicles(self.branch_id).await
    }

    async fn fetch(&self, window: Window) -> Result<Vec<VehicleView>> {
        self.store.list_vehicles(self.branch_id, window).await
    }
}
