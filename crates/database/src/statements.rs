//! SQL text shared by every backend. Both SQLite and MySQL use `?` placeholders,
//! so only the driver glue and the NULL-safe equality operator differ.

use core_types::{Assignment, EntityKind};

pub const INSERT_PRODUCER: &str = "INSERT INTO producer (name, tax_id, email) VALUES (?, ?, ?)";
pub const INSERT_AREA: &str =
    "INSERT INTO area (producer_id, name, location, size) VALUES (?, ?, ?, ?)";
pub const INSERT_CROP: &str = r#"
    INSERT INTO crop (popular_name, scientific_name, ph_min, ph_max, humidity_min, humidity_max)
    VALUES (?, ?, ?, ?, ?, ?)
"#;
pub const INSERT_SENSOR: &str =
    "INSERT INTO sensor (area_id, type, install_date, status) VALUES (?, ?, ?, ?)";
pub const INSERT_READING: &str = r#"
    INSERT INTO reading (sensor_id, sensor_type, timestamp, value, secondary_value, tertiary_value)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

pub const SELECT_PRODUCERS: &str = "SELECT id, name, tax_id, email FROM producer ORDER BY id";
pub const SELECT_PRODUCER: &str = "SELECT id, name, tax_id, email FROM producer WHERE id = ?";

pub const SELECT_AREAS: &str = "SELECT id, producer_id, name, location, size FROM area ORDER BY id";
pub const SELECT_AREAS_BY_PRODUCER: &str =
    "SELECT id, producer_id, name, location, size FROM area WHERE producer_id = ? ORDER BY id";
pub const SELECT_AREA: &str = "SELECT id, producer_id, name, location, size FROM area WHERE id = ?";

pub const SELECT_CROPS: &str = r#"
    SELECT id, popular_name, scientific_name, ph_min, ph_max, humidity_min, humidity_max
    FROM crop ORDER BY id
"#;
pub const SELECT_CROP: &str = r#"
    SELECT id, popular_name, scientific_name, ph_min, ph_max, humidity_min, humidity_max
    FROM crop WHERE id = ?
"#;

pub const SELECT_SENSORS: &str =
    "SELECT id, area_id, type, install_date, status FROM sensor ORDER BY id";
pub const SELECT_SENSORS_BY_AREA: &str =
    "SELECT id, area_id, type, install_date, status FROM sensor WHERE area_id = ? ORDER BY id";
pub const SELECT_SENSOR: &str =
    "SELECT id, area_id, type, install_date, status FROM sensor WHERE id = ?";
pub const SELECT_SENSOR_KIND: &str = "SELECT type FROM sensor WHERE id = ?";

pub const SELECT_READINGS: &str = r#"
    SELECT id, sensor_id, sensor_type, timestamp, value, secondary_value, tertiary_value
    FROM reading ORDER BY timestamp ASC, id ASC
"#;
pub const SELECT_READINGS_BY_SENSOR: &str = r#"
    SELECT id, sensor_id, sensor_type, timestamp, value, secondary_value, tertiary_value
    FROM reading WHERE sensor_id = ? ORDER BY timestamp ASC, id ASC
"#;
pub const SELECT_READING: &str = r#"
    SELECT id, sensor_id, sensor_type, timestamp, value, secondary_value, tertiary_value
    FROM reading WHERE id = ?
"#;
pub const SELECT_AREA_READINGS: &str = r#"
    SELECT r.id, r.sensor_id, r.sensor_type, r.timestamp, r.value, r.secondary_value, r.tertiary_value
    FROM reading AS r
    JOIN sensor AS s ON r.sensor_id = s.id
    WHERE s.area_id = ?
    ORDER BY r.timestamp ASC, r.id ASC
"#;
pub const SELECT_AREA_READINGS_OF_KIND: &str = r#"
    SELECT r.id, r.sensor_id, r.sensor_type, r.timestamp, r.value, r.secondary_value, r.tertiary_value
    FROM reading AS r
    JOIN sensor AS s ON r.sensor_id = s.id
    WHERE s.area_id = ? AND r.sensor_type = ?
    ORDER BY r.timestamp ASC, r.id ASC
"#;

/// NULL-safe equality on SQLite: `NULL IS NULL` is true.
pub const SQLITE_NULL_SAFE_EQ: &str = "IS";
/// NULL-safe equality on MySQL.
pub const MYSQL_NULL_SAFE_EQ: &str = "<=>";

pub fn exists_sql(kind: EntityKind) -> String {
    format!("SELECT id FROM {} WHERE id = ?", kind.table())
}

pub fn delete_sql(kind: EntityKind) -> String {
    format!("DELETE FROM {} WHERE id = ?", kind.table())
}

/// Builds `UPDATE <table> SET a = ?, b = ? WHERE id = ? AND NOT (a <=> ? AND b <=> ?)`
/// for the supplied columns, with `null_safe_eq` standing in for `<=>`.
///
/// The guard leaves a row that already holds every value unmatched, so the
/// affected-row count says whether anything changed on every engine. Column names
/// come from `EntityUpdate::assignments`, never from user input. The caller binds
/// the assignment values in order, then the id, then the assignment values again.
pub fn update_sql(kind: EntityKind, assignments: &[Assignment], null_safe_eq: &str) -> String {
    let set_clause = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");
    let unchanged = assignments
        .iter()
        .map(|(column, _)| format!("{} {} ?", column, null_safe_eq))
        .collect::<Vec<_>>()
        .join(" AND ");
    format!(
        "UPDATE {} SET {} WHERE id = ? AND NOT ({})",
        kind.table(),
        set_clause,
        unchanged
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::FieldValue;

    #[test]
    fn update_sql_lists_only_supplied_columns() {
        let assignments = vec![
            ("name", FieldValue::Text("Ana".to_string())),
            ("email", FieldValue::Text("ana@farm.br".to_string())),
        ];
        assert_eq!(
            update_sql(EntityKind::Producer, &assignments, SQLITE_NULL_SAFE_EQ),
            "UPDATE producer SET name = ?, email = ? WHERE id = ? AND NOT (name IS ? AND email IS ?)"
        );
        assert_eq!(
            update_sql(EntityKind::Producer, &assignments[..1], MYSQL_NULL_SAFE_EQ),
            "UPDATE producer SET name = ? WHERE id = ? AND NOT (name <=> ?)"
        );
    }

    #[test]
    fn delete_sql_targets_entity_table() {
        assert_eq!(delete_sql(EntityKind::Reading), "DELETE FROM reading WHERE id = ?");
    }
}
