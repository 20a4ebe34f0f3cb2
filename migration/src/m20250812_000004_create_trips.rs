use sea_orm_migration::{prelude::*, schema::*};

use super::m20250812_000001_create_users::User;
use super::m20250812_000002_create_vehicles::Vehicle;
use super::m20250812_000003_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trip::Table)
                    .if_not_exists()
                    .col(uuid(Trip::Id).primary_key())
                    .col(uuid(Trip::BookingId).not_null().unique_key())
                    .col(uuid(Trip::VehicleId).not_null())
                    .col(uuid(Trip::DriverId).not_null())
                    .col(uuid(Trip::CustomerId).not_null())
                    .col(timestamp_with_time_zone(Trip::StartedAt).not_null())
                    .col(timestamp_with_time_zone_null(Trip::EndedAt))
                    .col(integer(Trip::StartFuelLevel).not_null())
                    .col(integer(Trip::StartBatteryLevel).not_null())
                    .col(integer_null(Trip::EndFuelLevel))
                    .col(integer_null(Trip::EndBatteryLevel))
                    .col(integer_null(Trip::FuelConsumed))
                    .col(integer_null(Trip::BatteryConsumed))
                    .col(double_null(Trip::DistanceKm))
                    .col(big_integer_null(Trip::DurationMinutes))
                    .col(double_null(Trip::AverageSpeedKmh))
                    .col(double_null(Trip::TripCost))
                    .col(double_null(Trip::DriverEarnings))
                    .col(
                        timestamp_with_time_zone(Trip::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_booking")
                            .from(Trip::Table, Trip::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_vehicle")
                            .from(Trip::Table, Trip::VehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_driver")
                            .from(Trip::Table, Trip::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_customer")
                            .from(Trip::Table, Trip::CustomerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trip::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Trip {
    Table,
    Id,
    BookingId,
    VehicleId,
    DriverId,
    CustomerId,
    StartedAt,
    EndedAt,
    StartFuelLevel,
    StartBatteryLevel,
    EndFuelLevel,
    EndBatteryLevel,
    FuelConsumed,
    BatteryConsumed,
    DistanceKm,
    DurationMinutes,
    AverageSpeedKmh,
    TripCost,
    DriverEarnings,
    CreatedAt,
}
