use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

/// Outcome of one table-copy pass.
#[derive(Debug, Default)]
pub struct TableCopyReport {
    pub exported: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Schema-by-schema relational copy, delegated to the `psql` binary.
///
/// For each schema: enumerate base tables, export each to a CSV file, then
/// reload each into the destination with referential-integrity checks
/// suspended for the session. Runs independently of the file engine.
pub struct TableCopier {
    source_pg: String,
    destination_pg: String,
    export_dir: PathBuf,
    schemas: Vec<String>,
}

impl TableCopier {
    pub fn new(
        source_pg: String,
        destination_pg: String,
        export_dir: PathBuf,
        schemas: Vec<String>,
    ) -> Self {
        Self {
            source_pg,
            destination_pg,
            export_dir,
            schemas,
        }
    }

    pub async fn run(&self) -> Result<TableCopyReport> {
        tokio::fs::create_dir_all(&self.export_dir)
            .await
            .with_context(|| format!("creating export dir {}", self.export_dir.display()))?;

        let mut report = TableCopyReport::default();

        for schema in &self.schemas {
            info!("📚 Copying schema {}", schema);
            let tables = self.tables_in_schema(schema).await?;
            info!("   {} tables: {}", tables.len(), tables.join(", "));

            for table in &tables {
                if self.export_table(schema, table).await? {
                    report.exported += 1;
                } else {
                    report.skipped += 1;
                }
            }

            for table in &tables {
                if self.import_table(schema, table).await? {
                    report.imported += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }

        info!(
            "📦 Table copy done: {} exported, {} imported, {} skipped",
            report.exported, report.imported, report.skipped
        );
        Ok(report)
    }

    async fn psql(&self, conn: &str, sql: &str) -> Result<String> {
        let output = Command::new("psql")
            .arg(conn)
            .arg("-v")
            .arg("ON_ERROR_STOP=1")
            .arg("-t")
            .arg("-c")
            .arg(sql)
            .output()
            .await
            .context("failed to spawn psql (is it on PATH?)")?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(anyhow!("psql failed: {}", stderr.trim()));
        }
        if !stderr.trim().is_empty() {
            warn!("psql stderr: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn tables_in_schema(&self, schema: &str) -> Result<Vec<String>> {
        let out = self.psql(&self.source_pg, &list_tables_sql(schema)).await?;
        Ok(out
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    async fn table_exists(&self, conn: &str, schema: &str, table: &str) -> bool {
        match self.psql(conn, &table_exists_sql(schema, table)).await {
            Ok(out) => out.trim() == "1",
            Err(_) => false,
        }
    }

    /// Export one table; returns false when the table is missing upstream.
    async fn export_table(&self, schema: &str, table: &str) -> Result<bool> {
        if !self.table_exists(&self.source_pg, schema, table).await {
            warn!("Table {}.{} missing in source, skipping export", schema, table);
            return Ok(false);
        }

        let path = export_path(&self.export_dir, schema, table);
        info!("   ⬆️  Exporting {}.{}", schema, table);
        self.psql(&self.source_pg, &copy_out_sql(schema, table, &path))
            .await
            .with_context(|| format!("exporting {}.{}", schema, table))?;
        Ok(true)
    }

    /// Reload one table at the destination; returns false when either the
    /// table or its export file is missing.
    async fn import_table(&self, schema: &str, table: &str) -> Result<bool> {
        if !self.table_exists(&self.destination_pg, schema, table).await {
            warn!(
                "Table {}.{} missing in destination, skipping import",
                schema, table
            );
            return Ok(false);
        }

        let path = export_path(&self.export_dir, schema, table);
        if !path.exists() {
            warn!("Export file {} missing, skipping import", path.display());
            return Ok(false);
        }

        info!("   ⬇️  Importing {}.{}", schema, table);
        self.psql(&self.destination_pg, &copy_in_sql(schema, table, &path))
            .await
            .with_context(|| format!("importing {}.{}", schema, table))?;
        Ok(true)
    }
}

fn export_path(dir: &Path, schema: &str, table: &str) -> PathBuf {
    dir.join(format!("{}_{}.csv", schema, table))
}

fn list_tables_sql(schema: &str) -> String {
    format!(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = '{}' AND table_type = 'BASE TABLE';",
        schema
    )
}

fn table_exists_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT 1 FROM information_schema.tables \
         WHERE table_schema = '{}' AND table_name = '{}';",
        schema, table
    )
}

fn copy_out_sql(schema: &str, table: &str, path: &Path) -> String {
    format!(
        "\\COPY {}.{} TO '{}' WITH CSV HEADER;",
        schema,
        table,
        path.display()
    )
}

/// Reload with FK triggers off for the session, truncating first so reruns
/// stay idempotent.
fn copy_in_sql(schema: &str, table: &str, path: &Path) -> String {
    format!(
        "SET session_replication_role = 'replica'; \
         TRUNCATE {schema}.{table} RESTART IDENTITY CASCADE; \
         \\COPY {schema}.{table} FROM '{path}' WITH CSV HEADER;",
        schema = schema,
        table = table,
        path = path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_path_naming() {
        let path = export_path(Path::new("exports"), "storage", "buckets");
        assert_eq!(path, PathBuf::from("exports/storage_buckets.csv"));
    }

    #[test]
    fn test_list_tables_sql_targets_base_tables_only() {
        let sql = list_tables_sql("auth");
        assert!(sql.contains("table_schema = 'auth'"));
        assert!(sql.contains("BASE TABLE"));
    }

    #[test]
    fn test_copy_out_sql_shape() {
        let sql = copy_out_sql("public", "users", Path::new("exports/public_users.csv"));
        assert_eq!(
            sql,
            "\\COPY public.users TO 'exports/public_users.csv' WITH CSV HEADER;"
        );
    }

    #[test]
    fn test_copy_in_sql_suspends_fk_checks_and_truncates() {
        let sql = copy_in_sql("public", "users", Path::new("exports/public_users.csv"));
        assert!(sql.starts_with("SET session_replication_role = 'replica';"));
        assert!(sql.contains("TRUNCATE public.users RESTART IDENTITY CASCADE;"));
        assert!(sql.contains("\\COPY public.users FROM 'exports/public_users.csv' WITH CSV HEADER;"));
    }
}
