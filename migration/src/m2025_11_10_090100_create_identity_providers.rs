//! Migration to create the identity_providers table.
//!
//! Each row is one IdP configuration scoped to a zone. Mirrored pairs point at
//! each other through the nullable `alias_id`/`alias_zid` columns.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IdentityProviders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdentityProviders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IdentityProviders::IdentityZoneId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdentityProviders::OriginKey)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdentityProviders::ProviderType)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IdentityProviders::Name).text().not_null())
                    .col(
                        ColumnDef::new(IdentityProviders::Config)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdentityProviders::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(IdentityProviders::AliasId).uuid().null())
                    .col(
                        ColumnDef::new(IdentityProviders::AliasZid)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(IdentityProviders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(IdentityProviders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_identity_providers_zone_id")
                            .from(IdentityProviders::Table, IdentityProviders::IdentityZoneId)
                            .to(IdentityZones::Table, IdentityZones::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Origin keys are unique per zone; this index is what arbitrates
        // concurrent mirror creation into the same zone.
        manager
            .create_index(
                Index::create()
                    .name("idx_identity_providers_zone_origin")
                    .table(IdentityProviders::Table)
                    .col(IdentityProviders::IdentityZoneId)
                    .col(IdentityProviders::OriginKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_identity_providers_alias")
                    .table(IdentityProviders::Table)
                    .col(IdentityProviders::AliasZid)
                    .col(IdentityProviders::AliasId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_identity_providers_alias")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_identity_providers_zone_origin")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(IdentityProviders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IdentityProviders {
    Table,
    Id,
    IdentityZoneId,
    OriginKey,
    ProviderType,
    Name,
    Config,
    Active,
    AliasId,
    AliasZid,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum IdentityZones {
    Table,
    Id,
}
