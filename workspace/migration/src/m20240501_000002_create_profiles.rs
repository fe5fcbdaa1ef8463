use model::entities::company::{ExpertiseField, FIELD_MAX_LENGTH, RATING_MAX, RATING_MIN};
use sea_orm_migration::{prelude::*, schema::*};

use crate::m20240501_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create customers table
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(pk_auto(Customers::Id))
                    .to_owned(),
            )
            .await?;

        // Create companies table, keyed by the owning user
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(integer(Companies::UserId).primary_key())
                    .col(
                        string_len(Companies::Field, FIELD_MAX_LENGTH).check(
                            Expr::col(Companies::Field)
                                .is_in(ExpertiseField::ALL.iter().map(|f| f.as_str())),
                        ),
                    )
                    .col(
                        integer(Companies::Rating)
                            .default(RATING_MIN)
                            .check(Expr::col(Companies::Rating).between(RATING_MIN, RATING_MAX)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_user")
                            .from(Companies::Table, Companies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_companies_field_rating")
                    .table(Companies::Table)
                    .col(Companies::Field)
                    .col(Companies::Rating)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    UserId,
    Field,
    Rating,
}
