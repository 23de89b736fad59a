use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stocks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stocks::Symbol).string().not_null().primary_key())
                    .col(ColumnDef::new(Stocks::Name).text().null())
                    .col(ColumnDef::new(Stocks::Industry).text().null())
                    .col(ColumnDef::new(Stocks::Exchange).text().null())
                    .col(ColumnDef::new(Stocks::Currency).text().null())
                    .col(ColumnDef::new(Stocks::UpdatedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        // Composite key doubles as the dedup key for repeated pulls
        manager
            .create_table(
                Table::create()
                    .table(Prices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Prices::Symbol).string().not_null())
                    .col(ColumnDef::new(Prices::Resolution).string().not_null())
                    .col(ColumnDef::new(Prices::Time).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Prices::Open).double().not_null())
                    .col(ColumnDef::new(Prices::High).double().not_null())
                    .col(ColumnDef::new(Prices::Low).double().not_null())
                    .col(ColumnDef::new(Prices::Close).double().not_null())
                    .col(ColumnDef::new(Prices::Volume).double().not_null())
                    .primary_key(
                        Index::create()
                            .col(Prices::Symbol)
                            .col(Prices::Resolution)
                            .col(Prices::Time),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prices_stock")
                            .from(Prices::Table, Prices::Symbol)
                            .to(Stocks::Table, Stocks::Symbol)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Prices::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Stocks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Stocks {
    Table,
    Symbol,
    Name,
    Industry,
    Exchange,
    Currency,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Prices {
    Table,
    Symbol,
    Resolution,
    Time,
    Open,
    High,
    Low,
    Close,
    Volume,
}
