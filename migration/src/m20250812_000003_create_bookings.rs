use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250812_000001_create_users::User;
use super::m20250812_000002_create_vehicles::Vehicle;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values([
                        BookingStatus::PendingApproval,
                        BookingStatus::Approved,
                        BookingStatus::Confirmed,
                        BookingStatus::InProgress,
                        BookingStatus::Completed,
                        BookingStatus::Cancelled,
                        BookingStatus::Rejected,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(PaymentStatus::Enum)
                    .values([
                        PaymentStatus::Unpaid,
                        PaymentStatus::Paid,
                        PaymentStatus::Refunded,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::CustomerId).not_null())
                    .col(uuid(Booking::VehicleId).not_null())
                    .col(uuid_null(Booking::DriverId))
                    .col(string_len(Booking::PickupAddress, 255).not_null())
                    .col(string_len(Booking::DropoffAddress, 255).not_null())
                    .col(double(Booking::PickupLat).not_null())
                    .col(double(Booking::PickupLng).not_null())
                    .col(double(Booking::DropoffLat).not_null())
                    .col(double(Booking::DropoffLng).not_null())
                    .col(timestamp_with_time_zone(Booking::ScheduledStart).not_null())
                    .col(timestamp_with_time_zone(Booking::ScheduledEnd).not_null())
                    .col(double(Booking::TotalPrice).not_null())
                    .col(
                        ColumnDef::new(Booking::Status)
                            .custom(BookingStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Booking::PaymentStatus)
                            .custom(PaymentStatus::Enum)
                            .not_null(),
                    )
                    .col(string_len_null(Booking::PaymentMethod, 32))
                    .col(string_len_null(Booking::TransactionId, 64))
                    .col(uuid_null(Booking::ApprovedBy))
                    .col(timestamp_with_time_zone_null(Booking::ApprovedAt))
                    .col(string_len_null(Booking::ManagerNotes, 500))
                    .col(string_len_null(Booking::RejectionReason, 500))
                    .col(string_len_null(Booking::CancellationReason, 500))
                    .col(timestamp_with_time_zone_null(Booking::CancelledAt))
                    .col(timestamp_with_time_zone_null(Booking::CompletedAt))
                    .col(double_null(Booking::CurrentLat))
                    .col(double_null(Booking::CurrentLng))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customer")
                            .from(Booking::Table, Booking::CustomerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_vehicle")
                            .from(Booking::Table, Booking::VehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_driver")
                            .from(Booking::Table, Booking::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_approved_by")
                            .from(Booking::Table, Booking::ApprovedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(PaymentStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    CustomerId,
    VehicleId,
    DriverId,
    PickupAddress,
    DropoffAddress,
    PickupLat,
    PickupLng,
    DropoffLat,
    DropoffLng,
    ScheduledStart,
    ScheduledEnd,
    TotalPrice,
    Status,
    PaymentStatus,
    PaymentMethod,
    TransactionId,
    ApprovedBy,
    ApprovedAt,
    ManagerNotes,
    RejectionReason,
    CancellationReason,
    CancelledAt,
    CompletedAt,
    CurrentLat,
    CurrentLng,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    #[sea_orm(iden = "pending_approval")]
    PendingApproval,
    #[sea_orm(iden = "approved")]
    Approved,
    #[sea_orm(iden = "confirmed")]
    Confirmed,
    #[sea_orm(iden = "in_progress")]
    InProgress,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
    #[sea_orm(iden = "rejected")]
    Rejected,
}

#[derive(DeriveIden)]
pub enum PaymentStatus {
    #[sea_orm(iden = "payment_status")]
    Enum,
    #[sea_orm(iden = "unpaid")]
    Unpaid,
    #[sea_orm(iden = "paid")]
    Paid,
    #[sea_orm(iden = "refunded")]
    Refunded,
}
