//! Schema migrators

use async_trait::async_trait;
use mockall::automock;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions};
use tokio::process::Command;
use tracing::debug;

use crate::domain::provisioning::errors::MigrationError;

/// Schema every tenant database carries.
static TENANT_MIGRATIONS: Migrator = sqlx::migrate!("../../migrations/tenant");

#[automock]
#[async_trait]
/// Applies the current tenant schema to a database.
pub trait SchemaMigrator: Send + Sync {
    /// Bring the database at `target_url` up to date. Re-running is a no-op.
    async fn apply(&self, target_url: &str) -> Result<(), MigrationError>;
}

/// Runs the migrations compiled into this binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSchemaMigrator;

impl EmbeddedSchemaMigrator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SchemaMigrator for EmbeddedSchemaMigrator {
    async fn apply(&self, target_url: &str) -> Result<(), MigrationError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(target_url)
            .await
            .map_err(MigrationError::Connect)?;

        let result = TENANT_MIGRATIONS.run(&pool).await;

        pool.close().await;

        result.map_err(Into::into)
    }
}

/// Runs an external migration tool, passing the target as `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSchemaMigrator {
    program: String,
    args: Vec<String>,
}

impl CommandSchemaMigrator {
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line into program and arguments.
    ///
    /// Words are separated by whitespace. Single quotes keep their content
    /// literally, double quotes allow `\"` and `\\` escapes, and a
    /// backslash outside quotes escapes the next character. No other shell
    /// expansion happens.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::EmptyCommand`] for a blank command line and
    /// [`MigrationError::UnterminatedQuote`] when a quote is left open.
    pub fn parse(command_line: &str) -> Result<Self, MigrationError> {
        let mut words = split_words(command_line)?.into_iter();
        let program = words.next().ok_or(MigrationError::EmptyCommand)?;

        Ok(Self::new(program, words))
    }
}

fn split_words(command_line: &str) -> Result<Vec<String>, MigrationError> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = command_line.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('"'), '\\') => match chars.next_if(|next| matches!(next, '"' | '\\')) {
                Some(escaped) => word.push(escaped),
                None => word.push(c),
            },
            (Some(_), _) => word.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                word.push(chars.next().unwrap_or(c));
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            (None, c) => {
                word.push(c);
                in_word = true;
            }
        }
    }

    if let Some(quote) = quote {
        return Err(MigrationError::UnterminatedQuote { quote });
    }

    if in_word {
        words.push(word);
    }

    Ok(words)
}

#[async_trait]
impl SchemaMigrator for CommandSchemaMigrator {
    async fn apply(&self, target_url: &str) -> Result<(), MigrationError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .env("DATABASE_URL", target_url)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MigrationError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let diagnostics = [stderr.trim(), stdout.trim()]
                .into_iter()
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n");

            return Err(MigrationError::CommandFailed {
                status: output.status.to_string(),
                diagnostics,
            });
        }

        debug!(program = %self.program, output = %stdout.trim(), "migration command succeeded");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_splits_program_and_arguments() -> TestResult {
        let migrator = CommandSchemaMigrator::parse("  sqlx migrate run --source migrations/tenant ")?;

        assert_eq!(
            migrator,
            CommandSchemaMigrator::new(
                "sqlx",
                ["migrate", "run", "--source", "migrations/tenant"]
            )
        );

        Ok(())
    }

    #[test]
    fn parse_keeps_quoted_spaces_together() -> TestResult {
        let migrator = CommandSchemaMigrator::parse(
            r#""/opt/my tools/migrate" run --source 'migrations/tenant dir' --label "say \"hi\"" a\ b ''"#,
        )?;

        assert_eq!(
            migrator,
            CommandSchemaMigrator::new(
                "/opt/my tools/migrate",
                [
                    "run",
                    "--source",
                    "migrations/tenant dir",
                    "--label",
                    r#"say "hi""#,
                    "a b",
                    "",
                ]
            )
        );

        Ok(())
    }

    #[test]
    fn parse_rejects_unterminated_quote() {
        assert!(matches!(
            CommandSchemaMigrator::parse("migrate --source 'migrations/tenant"),
            Err(MigrationError::UnterminatedQuote { quote: '\'' })
        ));
    }

    #[test]
    fn parse_rejects_blank_command() {
        assert!(matches!(
            CommandSchemaMigrator::parse("   "),
            Err(MigrationError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn command_receives_target_url() -> TestResult {
        let migrator = CommandSchemaMigrator::new(
            "sh",
            ["-c", r#"test "$DATABASE_URL" = "postgres://localhost/fleetdesk_tenant_x""#],
        );

        migrator
            .apply("postgres://localhost/fleetdesk_tenant_x")
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn failed_command_surfaces_diagnostics() {
        let migrator =
            CommandSchemaMigrator::new("sh", ["-c", "echo 'relation already exists' >&2; exit 3"]);

        let result = migrator.apply("postgres://localhost/fleetdesk_tenant_x").await;

        let Err(MigrationError::CommandFailed {
            status,
            diagnostics,
        }) = &result
        else {
            panic!("expected CommandFailed, got {result:?}");
        };

        assert!(status.contains('3'), "status was {status:?}");
        assert_eq!(diagnostics, "relation already exists");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let migrator = CommandSchemaMigrator::new("fleetdesk-no-such-migrator", Vec::<String>::new());

        let result = migrator.apply("postgres://localhost/x").await;

        assert!(
            matches!(result, Err(MigrationError::Spawn { .. })),
            "expected Spawn error, got {result:?}"
        );
    }
}
