pub use sea_orm_migration::prelude::*;

mod m20250812_000001_create_users;
mod m20250812_000002_create_vehicles;
mod m20250812_000003_create_bookings;
mod m20250812_000004_create_trips;
mod m20250812_000005_create_maintenance_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250812_000001_create_users::Migration),
            Box::new(m20250812_000002_create_vehicles::Migration),
            Box::new(m20250812_000003_create_bookings::Migration),
            Box::new(m20250812_000004_create_trips::Migration),
            Box::new(m20250812_000005_create_maintenance_records::Migration),
        ]
    }
}
