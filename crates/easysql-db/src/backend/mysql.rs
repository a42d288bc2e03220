//! MySQL backend. Every session opens its own `mysql::Conn`.

use ::mysql::prelude::Queryable;
use ::mysql::{Conn, Opts, OptsBuilder, Params, Value as MyValue};
use easysql_types::{Row, Value};

use super::{Backend, Session};
use crate::descriptor::Secret;
use crate::dialect::Dialect;
use crate::error::DriverError;
use crate::statement;

/// A database on a MySQL server.
#[derive(Debug, Clone)]
pub struct MySqlBackend {
    host: String,
    port: u16,
    user: String,
    password: Secret,
    database: String,
}

impl MySqlBackend {
    pub fn new(host: String, port: u16, user: String, password: Secret, database: String) -> Self {
        Self {
            host,
            port,
            user,
            password,
            database,
        }
    }

    fn server_opts(&self) -> OptsBuilder {
        OptsBuilder::new()
            .ip_or_hostname(Some(self.host.clone()))
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.expose().to_string()))
    }
}

impl Backend for MySqlBackend {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn describe(&self) -> String {
        format!(
            "mysql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }

    /// Connects without selecting a database and creates it if missing.
    fn ensure_database(&self) -> Result<(), DriverError> {
        let mut conn = Conn::new(Opts::from(self.server_opts()))?;
        let sql = statement::create_database(&self.database);
        conn.query_drop(sql.as_str())?;
        tracing::info!(database = %self.database, host = %self.host, "database ensured");
        Ok(())
    }

    fn connect(&self) -> Result<Box<dyn Session + '_>, DriverError> {
        let opts = self.server_opts().db_name(Some(self.database.clone()));
        let conn = Conn::new(Opts::from(opts))?;
        Ok(Box::new(MySqlSession { conn }))
    }
}

struct MySqlSession {
    conn: Conn,
}

impl Session for MySqlSession {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        if params.is_empty() {
            // DDL goes over the text protocol; not every statement can be prepared.
            self.conn.query_drop(sql)?;
        } else {
            self.conn.exec_drop(sql, to_params(params))?;
        }
        Ok(self.conn.affected_rows())
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        // Always prepared, so numbers come back typed instead of as text.
        let rows: Vec<::mysql::Row> = self.conn.exec(sql, to_params(params))?;
        Ok(rows.into_iter().map(from_row).collect())
    }
}

fn to_params(params: &[Value]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }
    Params::Positional(params.iter().map(to_mysql).collect())
}

fn to_mysql(value: &Value) -> MyValue {
    match value {
        Value::Null => MyValue::NULL,
        Value::Integer(v) => MyValue::Int(*v),
        Value::Real(v) => MyValue::Double(*v),
        Value::Text(v) => MyValue::Bytes(v.clone().into_bytes()),
        Value::Blob(v) => MyValue::Bytes(v.clone()),
    }
}

fn from_row(row: ::mysql::Row) -> Row {
    let names: Vec<String> = row
        .columns_ref()
        .iter()
        .map(|column| column.name_str().into_owned())
        .collect();
    names.into_iter().zip(row.unwrap().into_iter().map(from_mysql)).collect()
}

fn from_mysql(value: MyValue) -> Value {
    match value {
        MyValue::NULL => Value::Null,
        MyValue::Int(v) => Value::Integer(v),
        MyValue::UInt(v) => i64::try_from(v).map_or(Value::Real(v as f64), Value::Integer),
        MyValue::Float(v) => Value::Real(f64::from(v)),
        MyValue::Double(v) => Value::Real(v),
        MyValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(err) => Value::Blob(err.into_bytes()),
        },
        MyValue::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}");
            if micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            Value::Text(text)
        }
        MyValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            Value::Text(text)
        }
    }
}
