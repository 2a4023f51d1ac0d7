use crate::connection::connect_mysql;
use crate::statements::MYSQL_NULL_SAFE_EQ;
use configuration::Backend;
use sqlx::mysql::{MySql, MySqlQueryResult};

sql_repository! {
    /// `FarmRepository` backed by a MySQL (InnoDB) server.
    pub struct MySqlRepository {
        database: MySql,
        backend: Backend::MySql,
        connect: connect_mysql,
        migrations: "./migrations/mysql",
        last_insert_id: inserted_id,
        null_safe_eq: MYSQL_NULL_SAFE_EQ,
    }
}

// The driver reports AUTO_INCREMENT ids as `u64`; ids are `i64` on every backend.
fn inserted_id(result: &MySqlQueryResult) -> i64 {
    result.last_insert_id() as i64
}
