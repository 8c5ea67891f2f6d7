use std::collections::HashMap;

use async_trait::async_trait;
use time::Date;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::FleetStore;
use crate::{
    error::{AppError, Result},
    models::{
        branch::Branch,
        employee::{Employee, EmployeeView},
        vehicle::{Vehicle, VehicleView},
    },
    pagination::Window,
};

#[derive(Default)]
struct Tables {
    branches: HashMap<Uuid, Branch>,
    employees: HashMap<Uuid, Employee>,
    vehicles: HashMap<Uuid, Vehicle>,
}

impl Tables {
    fn branch_name(&self, id: Uuid) -> Result<String> {
        self.branches
            .get(&id)
            .map(|b| b.name.clone())
            .ok_or(AppError::InvalidReference(id))
    }

    fn employee_view(&self, employee: &Employee) -> Option<EmployeeView> {
        let name = self.branches.get(&employee.branch_id)?.name.clone();
        Some(EmployeeView::new(employee.clone(), name))
    }

    fn vehicle_view(&self, vehicle: &Vehicle) -> Option<VehicleView> {
        let name = self.branches.get(&vehicle.branch_id)?.name.clone();
        Some(VehicleView::new(vehicle.clone(), name))
    }

    fn check_tax_id(&self, branch: &Branch) -> Result<()> {
        if self
            .branches
            .values()
            .any(|b| b.id != branch.id && b.tax_id == branch.tax_id)
        {
            return Err(AppError::Conflict(format!(
                "A branch with tax id {} already exists",
                branch.tax_id
            )));
        }
        Ok(())
    }

    fn check_national_id(&self, employee: &Employee) -> Result<()> {
        if self
            .employees
            .values()
            .any(|e| e.id != employee.id && e.national_id == employee.national_id)
        {
            return Err(AppError::Conflict(format!(
                "An employee with national id {} already exists",
                employee.national_id
            )));
        }
        Ok(())
    }

    fn check_plate(&self, vehicle: &Vehicle) -> Result<()> {
        if self
            .vehicles
            .values()
            .any(|v| v.id != vehicle.id && v.plate == vehicle.plate)
        {
            return Err(AppError::Conflict(format!(
                "A vehicle with plate {} already exists",
                vehicle.plate
            )));
        }
        Ok(())
    }

    fn sorted_employees(&self, branch_id: Option<Uuid>) -> Vec<EmployeeView> {
        let mut rows: Vec<EmployeeView> = self
            .employees
            .values()
            .filter(|e| branch_id.map_or(true, |b| e.branch_id == b))
            .filter_map(|e| self.employee_view(e))
            .collect();
        rows.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        rows
    }

    fn sorted_vehicles(&self, branch_id: Option<Uuid>) -> Vec<VehicleView> {
        let mut rows: Vec<VehicleView> = self
            .vehicles
            .values()
            .filter(|v| branch_id.map_or(true, |b| v.branch_id == b))
            .filter_map(|v| self.vehicle_view(v))
            .collect();
        rows.sort_by(|a, b| a.plate.cmp(&b.plate).then(a.id.cmp(&b.id)));
        rows
    }
}

/// In-process store used by the integration tests and for running the API
/// without a database. Enforces the same uniqueness and reference rules as
/// the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FleetStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn count_branches(&self) -> Result<i64> {
        Ok(self.tables.read().await.branches.len() as i64)
    }

    async fn list_branches(&self, window: Window) -> Result<Vec<Branch>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Branch> = tables.branches.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(window.slice(&rows))
    }

    async fn find_branch(&self, id: Uuid) -> Result<Option<Branch>> {
        Ok(self.tables.read().await.branches.get(&id).cloned())
    }

    async fn find_branch_by_tax_id(&self, tax_id: &str) -> Result<Option<Branch>> {
        let tables = self.tables.read().await;
        Ok(tables.branches.values().find(|b| b.tax_id == tax_id).cloned())
    }

    async fn insert_branch(&self, branch: &Branch) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_tax_id(branch)?;
        tables.branches.insert(branch.id, branch.clone());
        Ok(())
    }

    async fn update_branch(&self, branch: &Branch) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(closure_date) = tables.branches.get(&branch.id).map(|b| b.closure_date) else {
            return Ok(false);
        };
        tables.check_tax_id(branch)?;
        // Closure is owned by the lifecycle; a replace never moves it.
        let mut replacement = branch.clone();
        replacement.closure_date = closure_date;
        tables.branches.insert(branch.id, replacement);
        Ok(true)
    }

    async fn mark_branch_closed(&self, id: Uuid, closed_on: Date) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.branches.get_mut(&id) {
            Some(branch) if branch.closure_date.is_none() => {
                branch.closure_date = Some(closed_on);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_employees(&self, branch_id: Option<Uuid>) -> Result<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .employees
            .values()
            .filter(|e| branch_id.map_or(true, |b| e.branch_id == b))
            .count();
        Ok(count as i64)
    }

    async fn list_employees(
        &self,
        branch_id: Option<Uuid>,
        window: Window,
    ) -> Result<Vec<EmployeeView>> {
        let tables = self.tables.read().await;
        Ok(window.slice(&tables.sorted_employees(branch_id)))
    }

    async fn find_employee(&self, id: Uuid) -> Result<Option<EmployeeView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .get(&id)
            .and_then(|e| tables.employee_view(e)))
    }

    async fn find_employee_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<EmployeeView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .values()
            .find(|e| e.national_id == national_id)
            .and_then(|e| tables.employee_view(e)))
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.branch_name(employee.branch_id)?;
        tables.check_national_id(employee)?;
        tables.employees.insert(employee.id, employee.clone());
        Ok(())
    }

    async fn update_employee(&self, employee: &Employee) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.employees.contains_key(&employee.id) {
            return Ok(false);
        }
        tables.branch_name(employee.branch_id)?;
        tables.check_national_id(employee)?;
        tables.employees.insert(employee.id, employee.clone());
        Ok(true)
    }

    async fn delete_employee(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.employees.remove(&id).is_some())
    }

    async fn count_vehicles(&self, branch_id: Option<Uuid>) -> Result<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .vehicles
            .values()
            .filter(|v| branch_id.map_or(true, |b| v.branch_id == b))
            .count();
        Ok(count as i64)
    }

    async fn list_vehicles(
        &self,
        branch_id: Option<Uuid>,
        window: Window,
    ) -> Result<Vec<VehicleView>> {
        let tables = self.tables.read().await;
        Ok(window.slice(&tables.sorted_vehicles(branch_id)))
    }

    async fn find_vehicle(&self, id: Uuid) -> Result<Option<VehicleView>> {
        let tables = self.tables.read().await;
        Ok(tables.vehicles.get(&id).and_then(|v| tables.vehicle_view(v)))
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<VehicleView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .values()
            .find(|v| v.plate == plate)
            .and_then(|v| tables.vehicle_view(v)))
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.branch_name(vehicle.branch_id)?;
        tables.check_plate(vehicle)?;
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.vehicles.contains_key(&vehicle.id) {
            return Ok(false);
        }
        tables.branch_name(vehicle.branch_id)?;
        tables.check_plate(vehicle)?;
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(true)
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.vehicles.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        branch::Address,
        employee::EmployeeRole,
        vehicle::VehicleStatus,
    };
    use time::macros::date;

    fn branch(name: &str, tax_id: &str) -> Branch {
        Branch {
            id: Uuid::new_v4(),
            name: name.into(),
            tax_id: tax_id.into(),
            phone: None,
            opening_date: date!(2024 - 01 - 10),
            closure_date: None,
            address: Address {
                postal_code: "01001000".into(),
                street: "Praca da Se".into(),
                number: "1".into(),
                complement: None,
                district: "Se".into(),
                city: "Sao Paulo".into(),
                region_code: "SP".into(),
                country: "Brasil".into(),
            },
        }
    }

    fn employee(name: &str, national_id: &str, branch_id: Uuid) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            full_name: name.into(),
            national_id: national_id.into(),
            role: EmployeeRole::Technician,
            active: true,
            branch_id,
        }
    }

    #[tokio::test]
    async fn duplicate_tax_id_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_branch(&branch("Centro", "123")).await.unwrap();

        let err = store.insert_branch(&branch("Norte", "123")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.count_branches().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replacing_a_branch_keeps_a_closure_made_after_the_read() {
        let store = MemoryStore::new();
        let original = branch("Centro", "123");
        store.insert_branch(&original).await.unwrap();

        let mut stale = store.find_branch(original.id).await.unwrap().unwrap();
        assert!(store
            .mark_branch_closed(original.id, date!(2025 - 01 - 01))
            .await
            .unwrap());

        stale.name = "Centro Novo".into();
        assert!(store.update_branch(&stale).await.unwrap());

        let stored = store.find_branch(original.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Centro Novo");
        assert_eq!(stored.closure_date, Some(date!(2025 - 01 - 01)));
    }

    #[tokio::test]
    async fn employee_needs_an_existing_branch() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();

        let err = store
            .insert_employee(&employee("Ana", "111", missing))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(id) if id == missing));
        assert_eq!(store.count_employees(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn listings_are_ordered_and_filtered() {
        let store = MemoryStore::new();
        let north = branch("Norte", "1");
        let south = branch("Sul", "2");
        store.insert_branch(&south).await.unwrap();
        store.insert_branch(&north).await.unwrap();

        store.insert_employee(&employee("Carla", "c", north.id)).await.unwrap();
        store.insert_employee(&employee("Bruno", "b", south.id)).await.unwrap();
        store.insert_employee(&employee("Ana", "a", north.id)).await.unwrap();

        let branches = store.list_branches(Window::ALL).await.unwrap();
        assert_eq!(branches[0].name, "Norte");

        let all = store.list_employees(None, Window::ALL).await.unwrap();
        let names: Vec<_> = all.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Bruno", "Carla"]);

        let north_only = store.list_employees(Some(north.id), Window::ALL).await.unwrap();
        assert_eq!(north_only.len(), 2);
        assert!(north_only.iter().all(|e| e.branch_name == "Norte"));
        assert_eq!(store.count_employees(Some(south.id)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn closing_twice_keeps_the_first_date() {
        let store = MemoryStore::new();
        let b = branch("Centro", "9");
        store.insert_branch(&b).await.unwrap();

        assert!(store.mark_branch_closed(b.id, date!(2025 - 03 - 01)).await.unwrap());
        assert!(!store.mark_branch_closed(b.id, date!(2025 - 04 - 01)).await.unwrap());

        let stored = store.find_branch(b.id).await.unwrap().unwrap();
        assert_eq!(stored.closure_date, Some(date!(2025 - 03 - 01)));
    }

    #[tokio::test]
    async fn updating_a_vehicle_onto_a_taken_plate_conflicts() {
        let store = MemoryStore::new();
        let b = branch("Centro", "9");
        store.insert_branch(&b).await.unwrap();

        let mut first = Vehicle {
            id: Uuid::new_v4(),
            plate: "AAA1A11".into(),
            make: "Honda".into(),
            model: "CG".into(),
            year: 2020,
            status: VehicleStatus::Available,
            branch_id: b.id,
        };
        let second = Vehicle {
            id: Uuid::new_v4(),
            plate: "BBB2B22".into(),
            ..first.clone()
        };
        store.insert_vehicle(&first).await.unwrap();
        store.insert_vehicle(&second).await.unwrap();

        first.plate = "BBB2B22".into();
        let err = store.update_vehicle(&first).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
