use heapdb::catalog::{DatabaseManager, TableRegistry};
use heapdb::row::{ColumnType, Row, TableSchema, Value};
use heapdb::Result;

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    println!("heapdb - a single-table-per-file storage engine");
    println!("===============================================\n");

    let data_dir = "demo_data";
    let mut databases = DatabaseManager::new(data_dir);
    databases.create_database("demo")?;
    databases.use_database("demo")?;
    println!("Using database: {}", databases.current_database()?);

    let schema = TableSchema::builder("users")
        .column("id", ColumnType::Int)
        .column("name", ColumnType::String)
        .column("active", ColumnType::Boolean)
        .column("score", ColumnType::Double)
        .build_arc();

    let mut registry = TableRegistry::new();
    registry.create_table(Arc::clone(&schema), databases.table_path("users")?)?;
    let users = registry.table_mut("users")?;

    let rows = [
        (1, "Ada", true, 9.5),
        (2, "Brian", false, 7.25),
        (3, "Grace", true, 8.0),
    ];
    for (id, name, active, score) in rows {
        users.insert(Row::new(
            Arc::clone(&schema),
            vec![
                Value::Int(id),
                Value::from(name),
                Value::Boolean(active),
                Value::Double(score),
            ],
        )?)?;
    }
    println!("\nAll rows after insert:");
    for row in users.read_all()? {
        println!("  {}", row);
    }

    users.delete(&Value::Int(2))?;
    println!("\nAfter deleting id 2:");
    for row in users.read_all()? {
        println!("  {}", row);
    }

    if let Some(row) = users.find_by_primary_key(&Value::Int(3))? {
        println!("\nLookup id 3 -> {}", row);
    }

    println!("\nStats before compaction: {}", users.stats()?);
    users.compact()?;
    println!("Stats after compaction:  {}", users.stats()?);

    registry.close_all()?;
    std::fs::remove_dir_all(data_dir).ok();
    println!("\nDemo completed successfully!");
    Ok(())
}
