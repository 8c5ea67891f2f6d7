//! Demo data for local runs: ten branches with addresses, ten employees and
//! ten vehicles. Loaded only into an empty store.

use time::{macros::date, Date};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        branch::{Address, Branch},
        employee::{Employee, EmployeeRole},
        vehicle::{Vehicle, VehicleStatus},
    },
    store::FleetStore,
};

struct BranchSeed {
    id: u128,
    name: &'static str,
    tax_id: &'static str,
    phone: &'static str,
    opened: Date,
    postal_code: &'static str,
    street: &'static str,
    number: &'static str,
    complement: Option<&'static str>,
    district: &'static str,
    city: &'static str,
    region_code: &'static str,
}

const BRANCHES: [BranchSeed; 10] = [
    BranchSeed {
        id: 0x11111111_1111_1111_1111_111111111111,
        name: "Filial Centro",
        tax_id: "12345678000101",
        phone: "(11) 3333-1001",
        opened: date!(2010 - 05 - 12),
        postal_code: "01310-100",
        street: "Av. Paulista",
        number: "1000",
        complement: Some("Conjunto 101"),
        district: "Bela Vista",
        city: "São Paulo",
        region_code: "SP",
    },
    BranchSeed {
        id: 0x22222222_2222_2222_2222_222222222222,
        name: "Filial Norte",
        tax_id: "23456789000102",
        phone: "(92) 4002-8922",
        opened: date!(2012 - 08 - 20),
        postal_code: "69000-000",
        street: "Av. Constantino Nery",
        number: "200",
        complement: None,
        district: "Centro",
        city: "Manaus",
        region_code: "AM",
    },
    BranchSeed {
        id: 0x33333333_3333_3333_3333_333333333333,
        name: "Filial Sul",
        tax_id: "34567890000103",
        phone: "(51) 3500-3003",
        opened: date!(2015 - 01 - 15),
        postal_code: "90010-000",
        street: "Av. Borges de Medeiros",
        number: "300",
        complement: None,
        district: "Centro Histórico",
        city: "Porto Alegre",
        region_code: "RS",
    },
    BranchSeed {
        id: 0x44444444_4444_4444_4444_444444444444,
        name: "Filial Leste",
        tax_id: "45678901000104",
        phone: "(31) 3222-4004",
        opened: date!(2016 - 03 - 10),
        postal_code: "31000-000",
        street: "Av. Cristiano Machado",
        number: "400",
        complement: Some("Sala 5"),
        district: "Cidade Nova",
        city: "Belo Horizonte",
        region_code: "MG",
    },
    BranchSeed {
        id: 0x55555555_5555_5555_5555_555555555555,
        name: "Filial Oeste",
        tax_id: "56789012000105",
        phone: "(61) 3555-5005",
        opened: date!(2018 - 07 - 01),
        postal_code: "70040-010",
        street: "SBN Quadra 1",
        number: "500",
        complement: Some("Bloco B"),
        district: "Asa Norte",
        city: "Brasília",
        region_code: "DF",
    },
    BranchSeed {
        id: 0x66666666_6666_6666_6666_666666666666,
        name: "Filial Paulista",
        tax_id: "67890123000106",
        phone: "(11) 3666-6006",
        opened: date!(2019 - 09 - 25),
        postal_code: "01415-002",
        street: "Rua Augusta",
        number: "600",
        complement: None,
        district: "Consolação",
        city: "São Paulo",
        region_code: "SP",
    },
    BranchSeed {
        id: 0x77777777_7777_7777_7777_777777777777,
        name: "Filial Moema",
        tax_id: "78901234000107",
        phone: "(11) 3777-7007",
        opened: date!(2020 - 02 - 18),
        postal_code: "04077-000",
        street: "Av. Ibirapuera",
        number: "700",
        complement: Some("Loja 3"),
        district: "Moema",
        city: "São Paulo",
        region_code: "SP",
    },
    BranchSeed {
        id: 0x88888888_8888_8888_8888_888888888888,
        name: "Filial Pinheiros",
        tax_id: "89012345000108",
        phone: "(11) 3888-8008",
        opened: date!(2021 - 04 - 05),
        postal_code: "05422-000",
        street: "Rua dos Pinheiros",
        number: "800",
        complement: None,
        district: "Pinheiros",
        city: "São Paulo",
        region_code: "SP",
    },
    BranchSeed {
        id: 0x99999999_9999_9999_9999_999999999999,
        name: "Filial Liberdade",
        tax_id: "90123456000109",
        phone: "(11) 3999-9009",
        opened: date!(2022 - 06 - 30),
        postal_code: "01503-000",
        street: "Rua Galvão Bueno",
        number: "900",
        complement: None,
        district: "Liberdade",
        city: "São Paulo",
        region_code: "SP",
    },
    BranchSeed {
        id: 0xaaaaaaaa_aaaa_aaaa_aaaa_aaaaaaaaaaaa,
        name: "Filial Barra Funda",
        tax_id: "01234567000110",
        phone: "(11) 4000-1010",
        opened: date!(2023 - 01 - 10),
        postal_code: "01152-000",
        street: "Av. Marquês de São Vicente",
        number: "1000",
        complement: Some("Galpão 2"),
        district: "Barra Funda",
        city: "São Paulo",
        region_code: "SP",
    },
];

// (id, full name, national id, role, branch id)
const EMPLOYEES: [(u128, &str, &str, EmployeeRole, u128); 10] = [
    (0x11111111_bbbb_bbbb_bbbb_111111111111, "Maria Souza", "123.456.789-01", EmployeeRole::BranchOwner, 0x11111111_1111_1111_1111_111111111111),
    (0x22222222_bbbb_bbbb_bbbb_222222222222, "João Lima", "987.654.321-00", EmployeeRole::Technician, 0x11111111_1111_1111_1111_111111111111),
    (0x33333333_bbbb_bbbb_bbbb_333333333333, "Ana Oliveira", "321.654.987-22", EmployeeRole::Manager, 0x22222222_2222_2222_2222_222222222222),
    (0x44444444_bbbb_bbbb_bbbb_444444444444, "Carlos Mendes", "456.789.123-33", EmployeeRole::Staff, 0x22222222_2222_2222_2222_222222222222),
    (0x55555555_bbbb_bbbb_bbbb_555555555555, "Juliana Ferreira", "147.258.369-44", EmployeeRole::BranchOwner, 0x33333333_3333_3333_3333_333333333333),
    (0x66666666_bbbb_bbbb_bbbb_666666666666, "Paulo Henrique", "258.369.147-55", EmployeeRole::Technician, 0x44444444_4444_4444_4444_444444444444),
    (0x77777777_bbbb_bbbb_bbbb_777777777777, "Fernanda Dias", "369.147.258-66", EmployeeRole::Manager, 0x55555555_5555_5555_5555_555555555555),
    (0x88888888_bbbb_bbbb_bbbb_888888888888, "Ricardo Gomes", "741.852.963-77", EmployeeRole::Staff, 0x66666666_6666_6666_6666_666666666666),
    (0x99999999_bbbb_bbbb_bbbb_999999999999, "Camila Rocha", "852.963.741-88", EmployeeRole::Technician, 0x77777777_7777_7777_7777_777777777777),
    (0xaaaaaaaa_bbbb_bbbb_bbbb_aaaaaaaaaaaa, "Lucas Almeida", "963.741.852-99", EmployeeRole::Manager, 0x88888888_8888_8888_8888_888888888888),
];

// (id, plate, make, model, year, status, branch id)
const VEHICLES: [(u128, &str, &str, &str, i32, VehicleStatus, u128); 10] = [
    (0x11111111_aaaa_aaaa_aaaa_111111111111, "ABC1D23", "Honda", "CG 160", 2020, VehicleStatus::Available, 0x11111111_1111_1111_1111_111111111111),
    (0x22222222_aaaa_aaaa_aaaa_222222222222, "XYZ9H88", "Yamaha", "Factor 150", 2021, VehicleStatus::InUse, 0x11111111_1111_1111_1111_111111111111),
    (0x33333333_aaaa_aaaa_aaaa_333333333333, "JKL4F55", "Honda", "Biz 125", 2019, VehicleStatus::InMaintenance, 0x22222222_2222_2222_2222_222222222222),
    (0x44444444_aaaa_aaaa_aaaa_444444444444, "MNO7G66", "Yamaha", "YBR 125", 2018, VehicleStatus::Available, 0x22222222_2222_2222_2222_222222222222),
    (0x55555555_aaaa_aaaa_aaaa_555555555555, "PQR8H77", "Honda", "XRE 300", 2022, VehicleStatus::Available, 0x33333333_3333_3333_3333_333333333333),
    (0x66666666_aaaa_aaaa_aaaa_666666666666, "STU2J99", "Honda", "PCX 150", 2023, VehicleStatus::InUse, 0x44444444_4444_4444_4444_444444444444),
    (0x77777777_aaaa_aaaa_aaaa_777777777777, "VWX3K11", "Yamaha", "NMAX 160", 2021, VehicleStatus::Available, 0x55555555_5555_5555_5555_555555555555),
    (0x88888888_aaaa_aaaa_aaaa_888888888888, "YZA5L22", "Honda", "CB 500F", 2017, VehicleStatus::InMaintenance, 0x66666666_6666_6666_6666_666666666666),
    (0x99999999_aaaa_aaaa_aaaa_999999999999, "BCD6M33", "Suzuki", "Burgman 125", 2020, VehicleStatus::Available, 0x77777777_7777_7777_7777_777777777777),
    (0xaaaaaaaa_aaaa_aaaa_aaaa_aaaaaaaaaaaa, "EFG7N44", "Kawasaki", "Z400", 2022, VehicleStatus::InUse, 0x88888888_8888_8888_8888_888888888888),
];

impl BranchSeed {
    fn to_branch(&self) -> Branch {
        Branch {
            id: Uuid::from_u128(self.id),
            name: self.name.into(),
            tax_id: self.tax_id.into(),
            phone: Some(self.phone.into()),
            opening_date: self.opened,
            closure_date: None,
            address: Address {
                postal_code: self.postal_code.into(),
                street: self.street.into(),
                number: self.number.into(),
                complement: self.complement.map(Into::into),
                district: self.district.into(),
                city: self.city.into(),
                region_code: self.region_code.into(),
                country: "Brasil".into(),
            },
        }
    }
}

/// Loads the demo data if the store has no branches yet. Returns whether
/// anything was written.
pub async fn seed_demo_data(store: &dyn FleetStore) -> Result<bool> {
    if store.count_branches().await? > 0 {
        tracing::info!("store already has data, skipping demo seed");
        return Ok(false);
    }

    for seed in &BRANCHES {
        store.insert_branch(&seed.to_branch()).await?;
    }

    for &(id, full_name, national_id, role, branch_id) in &EMPLOYEES {
        store
            .insert_employee(&Employee {
                id: Uuid::from_u128(id),
                full_name: full_name.into(),
                national_id: national_id.into(),
                role,
                active: true,
                branch_id: Uuid::from_u128(branch_id),
            })
            .await?;
    }

    for &(id, plate, make, model, year, status, branch_id) in &VEHICLES {
        store
            .insert_vehicle(&Vehicle {
                id: Uuid::from_u128(id),
                plate: plate.into(),
                make: make.into(),
                model: model.into(),
                year,
                status,
                branch_id: Uuid::from_u128(branch_id),
            })
            .await?;
    }

    tracing::info!(
        branches = BRANCHES.len(),
        employees = EMPLOYEES.len(),
        vehicles = VEHICLES.len(),
        "demo data seeded"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Window;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn seeds_once_into_an_empty_store() {
        let store = MemoryStore::new();

        assert!(seed_demo_data(&store).await.unwrap());
        assert!(!seed_demo_data(&store).await.unwrap());

        assert_eq!(store.count_branches().await.unwrap(), 10);
        assert_eq!(store.count_employees(None).await.unwrap(), 10);
        assert_eq!(store.count_vehicles(None).await.unwrap(), 10);

        let centro = store
            .find_branch_by_tax_id("12345678000101")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(centro.name, "Filial Centro");

        let fleet = store.list_vehicles(Some(centro.id), Window::ALL).await.unwrap();
        assert_eq!(fleet.len(), 2);
    }
}
