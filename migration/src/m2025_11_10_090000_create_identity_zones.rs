//! Migration to create the identity_zones table.
//!
//! Zones are the tenant partitions that own identity providers. The id is a
//! caller-chosen text key (the root zone is usually `uaa`).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IdentityZones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdentityZones::Id)
                            .string_len(255)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IdentityZones::Name).text().not_null())
                    .col(
                        ColumnDef::new(IdentityZones::Subdomain)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdentityZones::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_identity_zones_subdomain")
                    .table(IdentityZones::Table)
                    .col(IdentityZones::Subdomain)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_identity_zones_subdomain")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(IdentityZones::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IdentityZones {
    Table,
    Id,
    Name,
    Subdomain,
    CreatedAt,
}
