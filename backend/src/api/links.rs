//! Navigation links attached to v2 responses.

use serde::Serialize;

use crate::models::{branch::Branch, employee::EmployeeView, vehicle::VehicleView};

pub const V2: &str = "/api/v2";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Link {
    pub href: String,
    pub rel: &'static str,
    pub method: &'static str,
}

impl Link {
    fn new(href: String, rel: &'static str, method: &'static str) -> Self {
        Self { href, rel, method }
    }
}

/// A resource with its `links` array alongside its own fields.
#[derive(Debug, Serialize)]
pub struct Linked<T> {
    #[serde(flatten)]
    pub item: T,
    pub links: Vec<Link>,
}

pub trait HasLinks {
    fn links(&self) -> Vec<Link>;

    fn linked(self) -> Linked<Self>
    where
        Self: Sized,
    {
        let links = self.links();
        Linked { item: self, links }
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

pub fn branch_href(id: impl std::fmt::Display) -> String {
    format!("{V2}/branches/{id}")
}

pub fn employee_href(id: impl std::fmt::Display) -> String {
    format!("{V2}/employees/{id}")
}

pub fn vehicle_href(id: impl std::fmt::Display) -> String {
    format!("{V2}/vehicles/{id}")
}

impl HasLinks for Branch {
    fn links(&self) -> Vec<Link> {
        let href = branch_href(self.id);
        vec![
            Link::new(href.clone(), "self", "GET"),
            Link::new(
                format!("{V2}/branches/tax-id/{}", segment(&self.tax_id)),
                "by_tax_id",
                "GET",
            ),
            Link::new(href.clone(), "update", "PUT"),
            Link::new(format!("{href}/close"), "close", "DELETE"),
        ]
    }
}

impl HasLinks for EmployeeView {
    fn links(&self) -> Vec<Link> {
        let href = employee_href(self.id);
        vec![
            Link::new(href.clone(), "self", "GET"),
            Link::new(
                format!("{V2}/employees/national-id/{}", segment(&self.national_id)),
                "by_national_id",
                "GET",
            ),
            Link::new(href.clone(), "update", "PUT"),
            Link::new(href, "delete", "DELETE"),
        ]
    }
}

impl HasLinks for VehicleView {
    fn links(&self) -> Vec<Link> {
        let href = vehicle_href(self.id);
        vec![
            Link::new(href.clone(), "self", "GET"),
            Link::new(
                format!("{V2}/vehicles/plate/{}", segment(&self.plate)),
                "by_plate",
                "GET",
            ),
            Link::new(href.clone(), "update", "PUT"),
            Link::new(href, "delete", "DELETE"),
        ]
    }
}
