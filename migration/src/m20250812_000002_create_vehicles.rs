use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250812_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(VehicleStatus::Enum)
                    .values([
                        VehicleStatus::Available,
                        VehicleStatus::InUse,
                        VehicleStatus::Maintenance,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(VehicleType::Enum)
                    .values([
                        VehicleType::Sedan,
                        VehicleType::Suv,
                        VehicleType::Van,
                        VehicleType::Truck,
                        VehicleType::Bus,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(string_len(Vehicle::Registration, 32).not_null().unique_key())
                    .col(string_len(Vehicle::Manufacturer, 100).not_null())
                    .col(string_len(Vehicle::Model, 100).not_null())
                    .col(
                        ColumnDef::new(Vehicle::VehicleType)
                            .custom(VehicleType::Enum)
                            .not_null(),
                    )
                    .col(integer(Vehicle::Capacity).not_null())
                    .col(boolean(Vehicle::IsElectric).not_null().default(false))
                    .col(
                        ColumnDef::new(Vehicle::Status)
                            .custom(VehicleStatus::Enum)
                            .not_null(),
                    )
                    .col(double_null(Vehicle::Latitude))
                    .col(double_null(Vehicle::Longitude))
                    .col(integer(Vehicle::BatteryLevel).not_null().default(100))
                    .col(integer(Vehicle::FuelLevel).not_null().default(100))
                    .col(integer(Vehicle::HealthScore).not_null().default(100))
                    .col(integer(Vehicle::Mileage).not_null().default(0))
                    .col(uuid_null(Vehicle::CurrentDriverId))
                    .col(
                        timestamp_with_time_zone(Vehicle::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Vehicle::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_current_driver")
                            .from(Vehicle::Table, Vehicle::CurrentDriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(VehicleType::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(VehicleStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicle {
    Table,
    Id,
    Registration,
    Manufacturer,
    Model,
    VehicleType,
    Capacity,
    IsElectric,
    Status,
    Latitude,
    Longitude,
    BatteryLevel,
    FuelLevel,
    HealthScore,
    Mileage,
    CurrentDriverId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum VehicleStatus {
    #[sea_orm(iden = "vehicle_status")]
    Enum,
    #[sea_orm(iden = "available")]
    Available,
    #[sea_orm(iden = "in_use")]
    InUse,
    #[sea_orm(iden = "maintenance")]
    Maintenance,
}

#[derive(DeriveIden)]
pub enum VehicleType {
    #[sea_orm(iden = "vehicle_type")]
    Enum,
    #[sea_orm(iden = "sedan")]
    Sedan,
    #[sea_orm(iden = "suv")]
    Suv,
    #[sea_orm(iden = "van")]
    Van,
    #[sea_orm(iden = "truck")]
    Truck,
    #[sea_orm(iden = "bus")]
    Bus,
}
