use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;
use validator::Validate;

/// Postal address owned by exactly one branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub region_code: String,
    pub country: String,
}

/// A branch with its address. `closure_date` is null while the branch is active.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub tax_id: String,
    pub phone: Option<String>,
    pub opening_date: Date,
    pub closure_date: Option<Date>,
    pub address: Address,
}

impl Branch {
    /// Builds a new, active branch from a validated request.
    pub fn register(req: BranchRequest) -> Self {
        let opening_date = req
            .opening_date
            .unwrap_or_else(|| OffsetDateTime::now_utc().date());

        Self {
            id: Uuid::new_v4(),
            name: req.name,
            tax_id: req.tax_id,
            phone: req.phone,
            opening_date,
            closure_date: None,
            address: req.address.into(),
        }
    }

    /// Applies an update. The closure date is owned by the lifecycle and is
    /// never touched here.
    pub fn apply(&mut self, req: BranchRequest) {
        self.name = req.name;
        self.tax_id = req.tax_id;
        self.phone = req.phone;
        if let Some(opening_date) = req.opening_date {
            self.opening_date = opening_date;
        }
        self.address = req.address.into();
    }
}

/// Flat row from `branches JOIN addresses`.
#[derive(Debug, sqlx::FromRow)]
pub struct BranchRow {
    pub id: Uuid,
    pub name: String,
    pub tax_id: String,
    pub phone: Option<String>,
    pub opening_date: Date,
    pub closure_date: Option<Date>,
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub region_code: String,
    pub country: String,
}

impl From<BranchRow> for Branch {
    fn from(r: BranchRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            tax_id: r.tax_id,
            phone: r.phone,
            opening_date: r.opening_date,
            closure_date: r.closure_date,
            address: Address {
                postal_code: r.postal_code,
                street: r.street,
                number: r.number,
                complement: r.complement,
                district: r.district,
                city: r.city,
                region_code: r.region_code,
                country: r.country,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 9, message = "postal_code must be 1-9 characters"))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 120, message = "street must be 1-120 characters"))]
    pub street: String,
    #[validate(length(min = 1, max = 10, message = "number must be 1-10 characters"))]
    pub number: String,
    #[validate(length(max = 60, message = "complement must be at most 60 characters"))]
    pub complement: Option<String>,
    #[validate(length(min = 1, max = 80, message = "district must be 1-80 characters"))]
    pub district: String,
    #[validate(length(min = 1, max = 80, message = "city must be 1-80 characters"))]
    pub city: String,
    #[validate(length(equal = 2, message = "region_code must be exactly 2 characters"))]
    pub region_code: String,
    #[validate(length(min = 1, max = 60, message = "country must be 1-60 characters"))]
    pub country: String,
}

impl From<AddressRequest> for Address {
    fn from(req: AddressRequest) -> Self {
        Self {
            postal_code: req.postal_code,
            street: req.street,
            number: req.number,
            complement: req.complement,
            district: req.district,
            city: req.city,
            region_code: req.region_code,
            country: req.country,
        }
    }
}

/// Create/replace payload for a branch. The address is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BranchRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 18, message = "tax_id must be 1-18 characters"))]
    pub tax_id: String,
    #[validate(length(max = 25, message = "phone must be at most 25 characters"))]
    pub phone: Option<String>,
    pub opening_date: Option<Date>,
    #[validate(nested)]
    pub address: AddressRequest,
}
