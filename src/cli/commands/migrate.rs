use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, MIGRATOR};

#[derive(Subcommand)]
pub enum MigrateCommands {
    #[command(about = "Apply all pending migrations")]
    Up,

    #[command(about = "Revert migrations newer than --target (default: all)")]
    Down {
        #[arg(long, default_value_t = 0, help = "Version to keep; 0 reverts everything")]
        target: i64,
    },

    #[command(about = "Revert the most recently applied migration")]
    LastDown,

    #[command(about = "Show which migrations are applied")]
    Status,
}

pub async fn handle(cmd: MigrateCommands, config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    match cmd {
        MigrateCommands::Up => {
            DatabaseManager::migrate_up(&pool).await?;
            println!("Migrations applied");
        }
        MigrateCommands::Down { target } => {
            DatabaseManager::migrate_down_to(&pool, target).await?;
            println!("Reverted migrations newer than {}", target);
        }
        MigrateCommands::LastDown => match DatabaseManager::migrate_last_down(&pool).await? {
            Some(version) => println!("Reverted migration {}", version),
            None => println!("No migrations to revert"),
        },
        MigrateCommands::Status => {
            let applied = DatabaseManager::applied_versions(&pool).await?;
            let rows: Vec<(i64, String, bool)> = MIGRATOR
                .iter()
                .filter(|m| m.migration_type.is_up_migration())
                .map(|m| (m.version, m.description.to_string(), applied.contains(&m.version)))
                .collect();

            match output_format {
                OutputFormat::Json => {
                    let items: Vec<_> = rows
                        .iter()
                        .map(|(version, description, applied)| {
                            json!({ "version": version, "description": description, "applied": applied })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&items)?);
                }
                OutputFormat::Text => {
                    for (version, description, applied) in rows {
                        let mark = if applied { "applied" } else { "pending" };
                        println!("{:<16} {:<8} {}", version, mark, description);
                    }
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}
