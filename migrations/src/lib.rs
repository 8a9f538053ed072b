pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_staff_users_table;
mod m20250601_000002_create_menu_tables;
mod m20250601_000003_create_tables_and_seats;
mod m20250601_000004_create_orders_table;
mod m20250601_000005_create_order_items_table;
mod m20250601_000006_add_order_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_staff_users_table::Migration),
            Box::new(m20250601_000002_create_menu_tables::Migration),
            Box::new(m20250601_000003_create_tables_and_seats::Migration),
            Box::new(m20250601_000004_create_orders_table::Migration),
            Box::new(m20250601_000005_create_order_items_table::Migration),
            Box::new(m20250601_000006_add_order_indexes::Migration),
        ]
    }
}
