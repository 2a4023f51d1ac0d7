//! The `FarmRepository` implementation shared by every SQL backend.
//!
//! SQLite and MySQL run the same statements (see `statements`) through the same
//! transaction logic; only the sqlx driver types, the way an insert reports its
//! new id, the migration directory and the NULL-safe equality operator differ.
//! `sql_repository!` writes the repository once and stamps it out per driver,
//! so the in-memory SQLite tests exercise the code the MySQL backend runs.
//!
//! Paths inside the macro are fully qualified so that the invoking module is free
//! to import whatever it needs for its own additions.

macro_rules! sql_repository {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            database: $db:ty,
            backend: $backend:expr,
            connect: $connect:path,
            migrations: $migrations:tt,
            last_insert_id: $inserted_id:ident,
            null_safe_eq: $null_safe_eq:expr $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            pool: ::sqlx::Pool<$db>,
        }

        impl $name {
            pub fn new(pool: ::sqlx::Pool<$db>) -> Self {
                Self { pool }
            }

            pub async fn connect(
                settings: &::configuration::DatabaseSettings,
            ) -> Result<Self, $crate::error::DbError> {
                Ok(Self::new($connect(settings).await?))
            }

            pub fn pool(&self) -> &::sqlx::Pool<$db> {
                &self.pool
            }

            async fn fetch_all<T>(
                &self,
                sql: &str,
                parent_id: Option<i64>,
            ) -> Result<Vec<T>, $crate::error::DbError>
            where
                T: for<'r> ::sqlx::FromRow<'r, <$db as ::sqlx::Database>::Row> + Send + Unpin,
            {
                let mut query = ::sqlx::query_as::<_, T>(sql);
                if let Some(id) = parent_id {
                    query = query.bind(id);
                }
                Ok(query.fetch_all(&self.pool).await?)
            }

            async fn fetch_by_id<T>(
                &self,
                kind: ::core_types::EntityKind,
                sql: &str,
                id: i64,
            ) -> Result<T, $crate::error::DbError>
            where
                T: for<'r> ::sqlx::FromRow<'r, <$db as ::sqlx::Database>::Row> + Send + Unpin,
            {
                ::sqlx::query_as::<_, T>(sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| $crate::error::DbError::not_found(kind, id))
            }
        }

        #[::async_trait::async_trait]
        impl $crate::repository::FarmRepository for $name {
            fn backend(&self) -> ::configuration::Backend {
                $backend
            }

            async fn run_migrations(&self) -> Result<(), $crate::error::DbError> {
                ::sqlx::migrate!($migrations).run(&self.pool).await?;
                Ok(())
            }

            async fn ping(&self) -> Result<(), $crate::error::DbError> {
                ::sqlx::query("SELECT 1")
                    .execute(&self.pool)
                    .await
                    .map_err($crate::error::DbError::ConnectionError)?;
                Ok(())
            }

            async fn create_producer(
                &self,
                input: &::core_types::NewProducer,
            ) -> Result<i64, $crate::error::DbError> {
                input.validate()?;
                let result = ::sqlx::query($crate::statements::INSERT_PRODUCER)
                    .bind(input.name.trim())
                    .bind(input.tax_id.trim())
                    .bind(input.email.as_deref().map(str::trim))
                    .execute(&self.pool)
                    .await?;
                let id = $inserted_id(&result);
                ::tracing::info!(producer_id = id, "Producer created.");
                Ok(id)
            }

            async fn create_area(
                &self,
                input: &::core_types::NewArea,
            ) -> Result<i64, $crate::error::DbError> {
                input.validate()?;
                let mut tx = self.pool.begin().await?;
                ensure_exists(&mut tx, ::core_types::EntityKind::Producer, input.producer_id).await?;
                let result = ::sqlx::query($crate::statements::INSERT_AREA)
                    .bind(input.producer_id)
                    .bind(input.name.trim())
                    .bind(input.location.trim())
                    .bind(input.size)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                let id = $inserted_id(&result);
                ::tracing::info!(area_id = id, producer_id = input.producer_id, "Area created.");
                Ok(id)
            }

            async fn create_crop(
                &self,
                input: &::core_types::NewCrop,
            ) -> Result<i64, $crate::error::DbError> {
                input.validate()?;
                let result = ::sqlx::query($crate::statements::INSERT_CROP)
                    .bind(input.popular_name.trim())
                    .bind(input.scientific_name.as_deref().map(str::trim))
                    .bind(input.ph_min)
                    .bind(input.ph_max)
                    .bind(input.humidity_min)
                    .bind(input.humidity_max)
                    .execute(&self.pool)
                    .await?;
                let id = $inserted_id(&result);
                ::tracing::info!(crop_id = id, "Crop created.");
                Ok(id)
            }

            async fn create_sensor(
                &self,
                input: &::core_types::NewSensor,
            ) -> Result<i64, $crate::error::DbError> {
                let mut tx = self.pool.begin().await?;
                ensure_exists(&mut tx, ::core_types::EntityKind::Area, input.area_id).await?;
                let result = ::sqlx::query($crate::statements::INSERT_SENSOR)
                    .bind(input.area_id)
                    .bind(input.kind.as_str())
                    .bind(input.install_date)
                    .bind(input.status.as_str())
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                let id = $inserted_id(&result);
                ::tracing::info!(sensor_id = id, area_id = input.area_id, kind = %input.kind, "Sensor created.");
                Ok(id)
            }

            async fn create_reading(
                &self,
                input: &::core_types::NewReading,
            ) -> Result<i64, $crate::error::DbError> {
                input.validate()?;
                let mut tx = self.pool.begin().await?;
                let kind = sensor_kind(&mut tx, input.sensor_id).await?;
                let id = insert_reading(&mut tx, kind, input).await?;
                tx.commit().await?;
                ::tracing::info!(reading_id = id, sensor_id = input.sensor_id, "Reading recorded.");
                Ok(id)
            }

            async fn create_readings(
                &self,
                batch: &[::core_types::NewReading],
            ) -> Result<u64, $crate::error::DbError> {
                if batch.is_empty() {
                    return Ok(0);
                }
                for input in batch {
                    input.validate()?;
                }

                let mut tx = self.pool.begin().await?;
                let mut kinds: ::std::collections::HashMap<i64, ::core_types::SensorKind> =
                    ::std::collections::HashMap::new();
                for input in batch {
                    let kind = match kinds.get(&input.sensor_id) {
                        Some(kind) => *kind,
                        None => {
                            let kind = sensor_kind(&mut tx, input.sensor_id).await?;
                            kinds.insert(input.sensor_id, kind);
                            kind
                        }
                    };
                    insert_reading(&mut tx, kind, input).await?;
                }
                tx.commit().await?;

                ::tracing::info!(rows = batch.len(), sensors = kinds.len(), "Reading batch recorded.");
                Ok(batch.len() as u64)
            }

            async fn get_producer(
                &self,
                id: i64,
            ) -> Result<::core_types::Producer, $crate::error::DbError> {
                self.fetch_by_id(::core_types::EntityKind::Producer, $crate::statements::SELECT_PRODUCER, id)
                    .await
            }

            async fn get_area(&self, id: i64) -> Result<::core_types::Area, $crate::error::DbError> {
                self.fetch_by_id(::core_types::EntityKind::Area, $crate::statements::SELECT_AREA, id)
                    .await
            }

            async fn get_crop(&self, id: i64) -> Result<::core_types::Crop, $crate::error::DbError> {
                self.fetch_by_id(::core_types::EntityKind::Crop, $crate::statements::SELECT_CROP, id)
                    .await
            }

            async fn get_sensor(
                &self,
                id: i64,
            ) -> Result<::core_types::Sensor, $crate::error::DbError> {
                self.fetch_by_id(::core_types::EntityKind::Sensor, $crate::statements::SELECT_SENSOR, id)
                    .await
            }

            async fn get_reading(
                &self,
                id: i64,
            ) -> Result<::core_types::Reading, $crate::error::DbError> {
                self.fetch_by_id(::core_types::EntityKind::Reading, $crate::statements::SELECT_READING, id)
                    .await
            }

            async fn list_producers(
                &self,
            ) -> Result<Vec<::core_types::Producer>, $crate::error::DbError> {
                self.fetch_all($crate::statements::SELECT_PRODUCERS, None).await
            }

            async fn list_areas(
                &self,
                producer_id: Option<i64>,
            ) -> Result<Vec<::core_types::Area>, $crate::error::DbError> {
                match producer_id {
                    Some(id) => self.fetch_all($crate::statements::SELECT_AREAS_BY_PRODUCER, Some(id)).await,
                    None => self.fetch_all($crate::statements::SELECT_AREAS, None).await,
                }
            }

            async fn list_crops(&self) -> Result<Vec<::core_types::Crop>, $crate::error::DbError> {
                self.fetch_all($crate::statements::SELECT_CROPS, None).await
            }

            async fn list_sensors(
                &self,
                area_id: Option<i64>,
            ) -> Result<Vec<::core_types::Sensor>, $crate::error::DbError> {
                match area_id {
                    Some(id) => self.fetch_all($crate::statements::SELECT_SENSORS_BY_AREA, Some(id)).await,
                    None => self.fetch_all($crate::statements::SELECT_SENSORS, None).await,
                }
            }

            async fn list_readings(
                &self,
                sensor_id: Option<i64>,
            ) -> Result<Vec<::core_types::Reading>, $crate::error::DbError> {
                match sensor_id {
                    Some(id) => self.fetch_all($crate::statements::SELECT_READINGS_BY_SENSOR, Some(id)).await,
                    None => self.fetch_all($crate::statements::SELECT_READINGS, None).await,
                }
            }

            async fn list_area_readings(
                &self,
                area_id: i64,
                kind: Option<::core_types::SensorKind>,
            ) -> Result<Vec<::core_types::Reading>, $crate::error::DbError> {
                let readings = match kind {
                    Some(kind) => {
                        ::sqlx::query_as::<_, ::core_types::Reading>(
                            $crate::statements::SELECT_AREA_READINGS_OF_KIND,
                        )
                        .bind(area_id)
                        .bind(kind.as_str())
                        .fetch_all(&self.pool)
                        .await?
                    }
                    None => {
                        ::sqlx::query_as::<_, ::core_types::Reading>(
                            $crate::statements::SELECT_AREA_READINGS,
                        )
                        .bind(area_id)
                        .fetch_all(&self.pool)
                        .await?
                    }
                };
                Ok(readings)
            }

            async fn update(
                &self,
                id: i64,
                changes: &::core_types::EntityUpdate,
            ) -> Result<::core_types::UpdateOutcome, $crate::error::DbError> {
                changes.validate()?;
                let kind = changes.kind();

                let mut tx = self.pool.begin().await?;
                ensure_exists(&mut tx, kind, id).await?;

                let assignments = changes.assignments();
                if assignments.is_empty() {
                    ::tracing::debug!(entity = %kind, id, "Update without fields; nothing to do.");
                    return Ok(::core_types::UpdateOutcome::NoChanges);
                }

                if let ::core_types::EntityUpdate::Crop(crop_changes) = changes {
                    let current = ::sqlx::query_as::<_, ::core_types::Crop>($crate::statements::SELECT_CROP)
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                    crop_changes.validate_against(&current)?;
                }

                // Values go in twice: once for SET, once for the "already equal" guard.
                let sql = $crate::statements::update_sql(kind, &assignments, $null_safe_eq);
                ::tracing::debug!(%sql, id, "Applying partial update.");
                let mut query = ::sqlx::query(&sql);
                for (_, value) in assignments.iter().cloned() {
                    query = bind_value(query, value);
                }
                query = query.bind(id);
                for (_, value) in assignments {
                    query = bind_value(query, value);
                }
                let result = query.execute(&mut *tx).await?;
                tx.commit().await?;

                if result.rows_affected() > 0 {
                    ::tracing::info!(entity = %kind, id, "Record updated.");
                    Ok(::core_types::UpdateOutcome::Updated)
                } else {
                    Ok(::core_types::UpdateOutcome::Unchanged)
                }
            }

            async fn delete(
                &self,
                kind: ::core_types::EntityKind,
                id: i64,
            ) -> Result<u64, $crate::error::DbError> {
                let mut tx = self.pool.begin().await?;
                ensure_exists(&mut tx, kind, id).await?;
                let result = ::sqlx::query(&$crate::statements::delete_sql(kind))
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                ::tracing::info!(entity = %kind, id, "Record deleted; dependents cascaded.");
                Ok(result.rows_affected())
            }
        }

        async fn ensure_exists(
            conn: &mut <$db as ::sqlx::Database>::Connection,
            kind: ::core_types::EntityKind,
            id: i64,
        ) -> Result<(), $crate::error::DbError> {
            let sql = $crate::statements::exists_sql(kind);
            ::sqlx::query_scalar::<_, i64>(&sql)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .map(|_| ())
                .ok_or_else(|| $crate::error::DbError::not_found(kind, id))
        }

        async fn sensor_kind(
            conn: &mut <$db as ::sqlx::Database>::Connection,
            sensor_id: i64,
        ) -> Result<::core_types::SensorKind, $crate::error::DbError> {
            ::sqlx::query_scalar::<_, ::core_types::SensorKind>($crate::statements::SELECT_SENSOR_KIND)
                .bind(sensor_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| $crate::error::DbError::not_found(::core_types::EntityKind::Sensor, sensor_id))
        }

        async fn insert_reading(
            conn: &mut <$db as ::sqlx::Database>::Connection,
            kind: ::core_types::SensorKind,
            input: &::core_types::NewReading,
        ) -> Result<i64, $crate::error::DbError> {
            let result = ::sqlx::query($crate::statements::INSERT_READING)
                .bind(input.sensor_id)
                .bind(kind.as_str())
                .bind(input.timestamp)
                .bind(input.value)
                .bind(input.secondary_value)
                .bind(input.tertiary_value)
                .execute(&mut *conn)
                .await?;
            Ok($inserted_id(&result))
        }

        fn bind_value<'q>(
            query: ::sqlx::query::Query<'q, $db, <$db as ::sqlx::Database>::Arguments<'q>>,
            value: ::core_types::FieldValue,
        ) -> ::sqlx::query::Query<'q, $db, <$db as ::sqlx::Database>::Arguments<'q>> {
            match value {
                ::core_types::FieldValue::Text(text) => query.bind(text),
                ::core_types::FieldValue::Real(number) => query.bind(number),
                ::core_types::FieldValue::Date(date) => query.bind(date),
                ::core_types::FieldValue::Timestamp(timestamp) => query.bind(timestamp),
            }
        }
    };
}
