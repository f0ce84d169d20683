use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_order_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shops::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Shops::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Shops::Name).string().not_null())
                        .col(ColumnDef::new(Shops::Url).string().null())
                        .col(ColumnDef::new(Shops::UserId).uuid().null())
                        .col(
                            ColumnDef::new(Shops::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Shops::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_shops_name")
                        .table(Shops::Table)
                        .col(Shops::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_shops_user_id")
                        .table(Shops::Table)
                        .col(Shops::UserId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_categories_name")
                        .table(Categories::Table)
                        .col(Categories::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ShopCategories::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ShopCategories::ShopId).uuid().not_null())
                        .col(
                            ColumnDef::new(ShopCategories::CategoryId)
                                .integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(ShopCategories::ShopId)
                                .col(ShopCategories::CategoryId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(ShopCategories::Table, ShopCategories::ShopId)
                                .to(Shops::Table, Shops::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(ShopCategories::Table, ShopCategories::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::CategoryId).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_products_category_name")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .col(Products::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductInfos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductInfos::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductInfos::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductInfos::ShopId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductInfos::Model)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(ProductInfos::ExternalId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductInfos::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(ProductInfos::Price)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductInfos::RetailPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(ProductInfos::Table, ProductInfos::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(ProductInfos::Table, ProductInfos::ShopId)
                                .to(Shops::Table, Shops::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_product_infos_shop_product_ext")
                        .table(ProductInfos::Table)
                        .col(ProductInfos::ShopId)
                        .col(ProductInfos::ProductId)
                        .col(ProductInfos::ExternalId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ix_product_infos_shop")
                        .table(ProductInfos::Table)
                        .col(ProductInfos::ShopId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Parameters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Parameters::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Parameters::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_parameters_name")
                        .table(Parameters::Table)
                        .col(Parameters::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductParameters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductParameters::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductParameters::ProductInfoId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductParameters::ParameterId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductParameters::Value).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .from(ProductParameters::Table, ProductParameters::ProductInfoId)
                                .to(ProductInfos::Table, ProductInfos::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(ProductParameters::Table, ProductParameters::ParameterId)
                                .to(Parameters::Table, Parameters::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_product_parameters_info_param")
                        .table(ProductParameters::Table)
                        .col(ProductParameters::ProductInfoId)
                        .col(ProductParameters::ParameterId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductParameters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Parameters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductInfos::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ShopCategories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Shops::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Shops {
        Table,
        Id,
        Name,
        Url,
        UserId,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    enum ShopCategories {
        Table,
        ShopId,
        CategoryId,
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        CategoryId,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductInfos {
        Table,
        Id,
        ProductId,
        ShopId,
        Model,
        ExternalId,
        Quantity,
        Price,
        RetailPrice,
    }

    #[derive(DeriveIden)]
    enum Parameters {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    enum ProductParameters {
        Table,
        Id,
        ProductInfoId,
        ParameterId,
        Value,
    }
}

mod m20240101_000002_create_order_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_catalog_tables::ProductInfos;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Contacts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Contacts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Contacts::UserId).uuid().not_null())
                        .col(ColumnDef::new(Contacts::City).string().not_null())
                        .col(ColumnDef::new(Contacts::Street).string().not_null())
                        .col(
                            ColumnDef::new(Contacts::House)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Contacts::Structure)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Contacts::Building)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Contacts::Apartment)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(Contacts::Phone).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ix_contacts_user")
                        .table(Contacts::Table)
                        .col(Contacts::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::State).string_len(15).not_null())
                        .col(ColumnDef::new(Orders::ContactId).uuid().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(Orders::Table, Orders::ContactId)
                                .to(Contacts::Table, Contacts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ix_orders_user")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            // One open basket per user, enforced at the storage layer.
            // sea-query has no partial-index builder; the statement is valid
            // on both SQLite and Postgres.
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS ux_orders_user_basket \
                     ON orders (user_id) WHERE state = 'basket'",
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductInfoId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(OrderItems::Table, OrderItems::ProductInfoId)
                                .to(ProductInfos::Table, ProductInfos::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_order_items_order_info")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .col(OrderItems::ProductInfoId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Contacts::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Contacts {
        Table,
        Id,
        UserId,
        City,
        Street,
        House,
        Structure,
        Building,
        Apartment,
        Phone,
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        UserId,
        State,
        ContactId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductInfoId,
        Quantity,
    }
}
