use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_000001_create_work_entries_table::Migration)]
    }
}

mod m20250101_000001_create_work_entries_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_work_entries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Aligned with entities::work_entry Model
            manager
                .create_table(
                    Table::create()
                        .table(WorkEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkEntries::Name).string().not_null())
                        .col(ColumnDef::new(WorkEntries::Sqft).string().null())
                        .col(ColumnDef::new(WorkEntries::Item).string().not_null())
                        .col(ColumnDef::new(WorkEntries::FromSite).string().null())
                        .col(ColumnDef::new(WorkEntries::PartyTo).string().null())
                        .col(
                            ColumnDef::new(WorkEntries::MalPlus)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WorkEntries::Kating)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WorkEntries::Total)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WorkEntries::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkEntries::PaymentStatus)
                                .string_len(16)
                                .not_null()
                                .default("Unpaid"),
                        )
                        .col(
                            ColumnDef::new(WorkEntries::PaidAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(WorkEntries::PaymentMode).string().null())
                        .col(ColumnDef::new(WorkEntries::VehicleNo).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_entries_name")
                        .table(WorkEntries::Table)
                        .col(WorkEntries::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_entries_date")
                        .table(WorkEntries::Table)
                        .col(WorkEntries::Date)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkEntries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum WorkEntries {
        Table,
        Id,
        Name,
        Sqft,
        Item,
        FromSite,
        PartyTo,
        MalPlus,
        Kating,
        Total,
        Date,
        PaymentStatus,
        PaidAmount,
        PaymentMode,
        VehicleNo,
    }
}
