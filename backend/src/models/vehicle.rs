use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Available,
    InMaintenance,
    InUse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub status: VehicleStatus,
    pub branch_id: Uuid,
}

impl Vehicle {
    pub fn register(req: VehicleRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            plate: req.plate,
            make: req.make,
            model: req.model,
            year: req.year,
            status: req.status,
            branch_id: req.branch_id,
        }
    }

    pub fn with_id(id: Uuid, req: VehicleRequest) -> Self {
        Self {
            id,
            ..Self::register(req)
        }
    }
}

/// Vehicle as returned to clients, with the owning branch's name resolved
/// at read time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq)]
pub struct VehicleView {
    pub id: Uuid,
    pub plate: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub status: VehicleStatus,
    pub branch_id: Uuid,
    pub branch_name: String,
}

impl VehicleView {
    pub fn new(vehicle: Vehicle, branch_name: String) -> Self {
        Self {
            id: vehicle.id,
            plate: vehicle.plate,
            make: vehicle.make,
            model: vehicle.model,
            year: vehicle.year,
            status: vehicle.status,
            branch_id: vehicle.branch_id,
            branch_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VehicleRequest {
    #[serde(deserialize_with = "normalized_plate")]
    #[validate(length(min = 1, max = 7, message = "plate must be 1-7 characters"))]
    pub plate: String,
    #[validate(length(min = 1, max = 30, message = "make must be 1-30 characters"))]
    pub make: String,
    #[validate(length(min = 1, max = 30, message = "model must be 1-30 characters"))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100, message = "year must be between 1900 and 2100"))]
    pub year: i32,
    #[serde(default)]
    pub status: VehicleStatus,
    pub branch_id: Uuid,
}

/// Plates are stored trimmed and upper-cased; lookups go through the same
/// normalization.
pub fn normalize_plate(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn normalized_plate<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_plate(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_is_normalized_on_deserialize() {
        let req: VehicleRequest = serde_json::from_value(serde_json::json!({
            "plate": "  abc1d23 ",
            "make": "Honda",
            "model": "CG 160",
            "year": 2020,
            "branch_id": Uuid::nil(),
        }))
        .unwrap();

        assert_eq!(req.plate, "ABC1D23");
        assert_eq!(req.status, VehicleStatus::Available);
    }

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_value(VehicleStatus::InMaintenance).unwrap();
        assert_eq!(json, "in_maintenance");
    }
}
