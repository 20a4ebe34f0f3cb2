use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250812_000002_create_vehicles::Vehicle;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(MaintenancePriority::Enum)
                    .values([
                        MaintenancePriority::Low,
                        MaintenancePriority::High,
                        MaintenancePriority::Critical,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(MaintenanceStatus::Enum)
                    .values([
                        MaintenanceStatus::Pending,
                        MaintenanceStatus::Scheduled,
                        MaintenanceStatus::Completed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MaintenanceRecord::Table)
                    .if_not_exists()
                    .col(uuid(MaintenanceRecord::Id).primary_key())
                    .col(uuid(MaintenanceRecord::VehicleId).not_null())
                    .col(string_len(MaintenanceRecord::IssueType, 100).not_null())
                    .col(string_len(MaintenanceRecord::Description, 1000).not_null())
                    .col(boolean(MaintenanceRecord::IsPredictive).not_null().default(false))
                    .col(integer(MaintenanceRecord::RiskScore).not_null())
                    .col(integer_null(MaintenanceRecord::PredictedDaysToFailure))
                    .col(
                        ColumnDef::new(MaintenanceRecord::Priority)
                            .custom(MaintenancePriority::Enum)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecord::Status)
                            .custom(MaintenanceStatus::Enum)
                            .not_null(),
                    )
                    .col(double_null(MaintenanceRecord::EstimatedCost))
                    .col(timestamp_with_time_zone_null(MaintenanceRecord::ScheduledFor))
                    .col(timestamp_with_time_zone_null(MaintenanceRecord::CompletedAt))
                    .col(
                        timestamp_with_time_zone(MaintenanceRecord::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_vehicle")
                            .from(MaintenanceRecord::Table, MaintenanceRecord::VehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MaintenanceRecord::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(MaintenanceStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(MaintenancePriority::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum MaintenanceRecord {
    Table,
    Id,
    VehicleId,
    IssueType,
    Description,
    IsPredictive,
    RiskScore,
    PredictedDaysToFailure,
    Priority,
    Status,
    EstimatedCost,
    ScheduledFor,
    CompletedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum MaintenancePriority {
    #[sea_orm(iden = "maintenance_priority")]
    Enum,
    #[sea_orm(iden = "low")]
    Low,
    #[sea_orm(iden = "high")]
    High,
    #[sea_orm(iden = "critical")]
    Critical,
}

#[derive(DeriveIden)]
pub enum MaintenanceStatus {
    #[sea_orm(iden = "maintenance_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "scheduled")]
    Scheduled,
    #[sea_orm(iden = "completed")]
    Completed,
}
