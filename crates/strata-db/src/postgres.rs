//! PostgreSQL session backend

use crate::error::{DbError, DbResult};
use crate::session::{Param, Session};
use postgres::types::{ToSql, Type};
use postgres::{CancelToken, Client, NoTls, Row};
use strata_core::config::{DatabaseConfig, SslMode};
use strata_core::sql_utils::{quote_ident, split_qualified_name};

/// PostgreSQL session over the synchronous `postgres` client.
///
/// The client drives its own runtime, so it must not be created or used from
/// inside an async runtime.
pub struct PostgresSession {
    client: Client,
}

/// Build the driver configuration.
///
/// `conn_string` is parsed first and supplies the host and port. Without it,
/// `host` and `port` come from their own fields. The user, password,
/// database, sslmode and application name fields always override.
pub fn pg_config(config: &DatabaseConfig) -> DbResult<postgres::Config> {
    let mut pg = match &config.conn_string {
        Some(conn_string) => conn_string
            .parse::<postgres::Config>()
            .map_err(|e| DbError::ConnectionError(format!("invalid conn_string: {e}")))?,
        None => {
            let mut pg = postgres::Config::new();
            if let Some(host) = &config.host {
                pg.host(host);
            }
            if let Some(port) = config.port {
                pg.port(port);
            }
            pg
        }
    };

    if let Some(user) = &config.user {
        pg.user(user);
    }
    if let Some(password) = &config.password {
        pg.password(password);
    }
    if let Some(database) = &config.database {
        pg.dbname(database);
    }
    if let Some(sslmode) = config.sslmode {
        pg.ssl_mode(match sslmode {
            SslMode::Disable => postgres::config::SslMode::Disable,
            SslMode::Prefer => postgres::config::SslMode::Prefer,
            SslMode::Require => postgres::config::SslMode::Require,
        });
    }
    pg.application_name(&config.application_name);

    if pg.get_user().is_none() {
        if let Ok(user) = std::env::var("USER") {
            pg.user(&user);
        }
    }

    Ok(pg)
}

impl PostgresSession {
    /// Connect using the resolved database configuration
    pub fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let pg = pg_config(config)?;
        log::debug!("Connecting to {:?}", pg.get_hosts());
        let client = pg
            .connect(NoTls)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Token that cancels the statement currently running on this session
    /// from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.client.cancel_token()
    }
}

fn to_sql_params(params: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| match p {
            Param::Int(v) => v as &(dyn ToSql + Sync),
            Param::BigInt(v) => v as &(dyn ToSql + Sync),
            Param::Text(s) => s as &(dyn ToSql + Sync),
        })
        .collect()
}

fn first_column_i64(row: &Row) -> DbResult<i64> {
    let column = row
        .columns()
        .first()
        .ok_or_else(|| DbError::QueryError("query returned no columns".to_string()))?;
    let ty = column.type_();
    let value = if *ty == Type::INT2 {
        i64::from(row.try_get::<_, i16>(0)?)
    } else if *ty == Type::INT4 {
        i64::from(row.try_get::<_, i32>(0)?)
    } else {
        row.try_get::<_, i64>(0)?
    };
    Ok(value)
}

impl Session for PostgresSession {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn execute(&mut self, sql: &str, params: &[Param]) -> DbResult<u64> {
        Ok(self.client.execute(sql, &to_sql_params(params))?)
    }

    fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn query_i64(&mut self, sql: &str, params: &[Param]) -> DbResult<Option<i64>> {
        match self.client.query_opt(sql, &to_sql_params(params))? {
            Some(row) => Ok(Some(first_column_i64(&row)?)),
            None => Ok(None),
        }
    }

    fn advisory_lock(&mut self, key: i64) -> DbResult<()> {
        self.client
            .execute("select pg_advisory_lock($1)", &[&key])
            .map_err(|e| DbError::LockError(DbError::from(e).to_string()))?;
        Ok(())
    }

    fn advisory_unlock(&mut self, key: i64) -> DbResult<()> {
        self.client
            .execute("select pg_advisory_unlock($1)", &[&key])
            .map_err(|e| DbError::LockError(DbError::from(e).to_string()))?;
        Ok(())
    }

    fn reset_session(&mut self) -> DbResult<()> {
        self.client.batch_execute("reset all")?;
        Ok(())
    }

    fn prepend_search_path(&mut self, schema: &str) -> DbResult<()> {
        self.client.execute(
            "select set_config('search_path', $1 || ', ' || current_setting('search_path'), true)",
            &[&quote_ident(schema)],
        )?;
        Ok(())
    }

    fn table_exists(&mut self, name: &str) -> DbResult<bool> {
        let count = match split_qualified_name(name) {
            (Some(schema), table) => self.query_i64(
                "select count(*) from pg_catalog.pg_tables where schemaname = $1 and tablename = $2",
                &[Param::Text(schema.to_string()), Param::Text(table.to_string())],
            )?,
            (None, table) => self.query_i64(
                "select count(*) from pg_catalog.pg_class \
                 where relname = $1 and relkind = 'r' and pg_table_is_visible(oid)",
                &[Param::Text(table.to_string())],
            )?,
        };
        Ok(count.unwrap_or(0) > 0)
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
