use chrono::{Duration, Local};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use core_types::parse::{
    non_blank, parse_id, parse_number, parse_optional, parse_optional_date,
    parse_optional_number, parse_optional_text, parse_optional_timestamp, parse_text,
};
use core_types::{
    AreaUpdate, CoreError, CropUpdate, EntityKind, EntityUpdate, NewArea, NewCrop, NewProducer,
    NewReading, NewSensor, ProducerUpdate, ReadingUpdate, SensorKind, SensorStatus, SensorUpdate,
    UpdateOutcome,
};
use database::{DbError, FarmRepository};
use forecast::ForecastError;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const ENTITY_ORDER: [EntityKind; 5] = [
    EntityKind::Producer,
    EntityKind::Area,
    EntityKind::Crop,
    EntityKind::Sensor,
    EntityKind::Reading,
];

const OPTIONS: &str = "
============ FARMTECH ============
 1. Insert producer    6. List producers   11. Update producer   16. Remove producer
 2. Insert area        7. List areas       12. Update area       17. Remove area
 3. Insert crop        8. List crops       13. Update crop       18. Remove crop
 4. Insert sensor      9. List sensors     14. Update sensor     19. Remove sensor
 5. Insert reading    10. List readings    15. Update reading    20. Remove reading

21. Humidity forecast for an area
 0. Exit
";

/// One line of menu input, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Insert(EntityKind),
    List(EntityKind),
    Update(EntityKind),
    Remove(EntityKind),
    Forecast,
    Exit,
}

impl MenuChoice {
    pub fn parse(raw: &str) -> Option<Self> {
        let number: usize = raw.trim().parse().ok()?;
        match number {
            0 => Some(MenuChoice::Exit),
            1..=20 => {
                let kind = ENTITY_ORDER[(number - 1) % ENTITY_ORDER.len()];
                Some(match (number - 1) / ENTITY_ORDER.len() {
                    0 => MenuChoice::Insert(kind),
                    1 => MenuChoice::List(kind),
                    2 => MenuChoice::Update(kind),
                    _ => MenuChoice::Remove(kind),
                })
            }
            21 => Some(MenuChoice::Forecast),
            _ => None,
        }
    }
}

/// Why a single menu action stopped. Only `Io` and `EndOfInput` end the loop.
#[derive(Error, Debug)]
enum MenuError {
    #[error(transparent)]
    Input(#[from] CoreError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error("Terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("End of input.")]
    EndOfInput,
}

impl MenuError {
    fn hint(&self) -> Option<&'static str> {
        match self {
            MenuError::Input(_) => Some("Nothing was saved. Pick the option again to retry."),
            MenuError::Database(err) => err.hint(),
            MenuError::Forecast(ForecastError::InsufficientData { .. }) => {
                Some("Record at least two humidity readings for the area first.")
            }
            MenuError::Forecast(ForecastError::DegenerateInput) => {
                Some("The humidity readings need at least two different timestamps.")
            }
            MenuError::Forecast(ForecastError::HorizonOutOfRange { .. }) => {
                Some("Lower forecast.horizon_secs in the configuration.")
            }
            _ => None,
        }
    }
}

/// The numbered interactive menu. Reads one answer per line from `input` and
/// writes prompts, tables and messages to `output`.
pub struct Menu<'a, R, W> {
    repo: &'a dyn FarmRepository,
    input: R,
    output: W,
    horizon: Duration,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(repo: &'a dyn FarmRepository, input: R, output: W, horizon: Duration) -> Self {
        Self {
            repo,
            input,
            output,
            horizon,
        }
    }

    /// Loops until `0` or end of input. Failed actions are reported and the loop goes on;
    /// only terminal I/O errors are returned.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            write!(self.output, "{}", OPTIONS)?;
            let Some(line) = self.read_line("Choose an option: ")? else {
                writeln!(self.output)?;
                break;
            };

            let choice = match MenuChoice::parse(&line) {
                Some(MenuChoice::Exit) => {
                    writeln!(self.output, "Goodbye.")?;
                    break;
                }
                Some(choice) => choice,
                None => {
                    writeln!(self.output, "Invalid option: '{}'.", line.trim())?;
                    continue;
                }
            };

            match self.dispatch(choice).await {
                Ok(()) => {}
                Err(MenuError::EndOfInput) => break,
                Err(MenuError::Io(err)) => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(?choice, error = %err, "Menu action failed.");
                    writeln!(self.output, "Error: {}", err)?;
                    if let Some(hint) = err.hint() {
                        writeln!(self.output, "Hint: {}", hint)?;
                    }
                }
            }
        }
        self.output.flush()?;
        Ok(())
    }

    async fn dispatch(&mut self, choice: MenuChoice) -> Result<(), MenuError> {
        match choice {
            MenuChoice::Insert(kind) => self.insert(kind).await,
            MenuChoice::List(kind) => self.list(kind).await,
            MenuChoice::Update(kind) => self.update(kind).await,
            MenuChoice::Remove(kind) => self.remove(kind).await,
            MenuChoice::Forecast => self.forecast().await,
            MenuChoice::Exit => Ok(()),
        }
    }

    // ==========================================================================
    // Insert
    // ==========================================================================

    async fn insert(&mut self, kind: EntityKind) -> Result<(), MenuError> {
        let id = match kind {
            EntityKind::Producer => {
                let input = NewProducer {
                    name: parse_text("name", &self.ask("Name: ")?)?,
                    tax_id: parse_text("tax_id", &self.ask("Tax id (CPF/CNPJ): ")?)?,
                    email: parse_optional_text(&self.ask("E-mail (optional): ")?),
                };
                self.repo.create_producer(&input).await?
            }
            EntityKind::Area => {
                let input = NewArea {
                    producer_id: parse_id("producer_id", &self.ask("Producer id: ")?)?,
                    name: parse_text("name", &self.ask("Area name: ")?)?,
                    location: parse_text("location", &self.ask("Location: ")?)?,
                    size: parse_optional_number("size", &self.ask("Size in hectares (optional): ")?)?,
                };
                self.repo.create_area(&input).await?
            }
            EntityKind::Crop => {
                let input = NewCrop {
                    popular_name: parse_text("popular_name", &self.ask("Popular name: ")?)?,
                    scientific_name: parse_optional_text(&self.ask("Scientific name (optional): ")?),
                    ph_min: parse_optional_number("ph_min", &self.ask("Ideal pH (minimum): ")?)?,
                    ph_max: parse_optional_number("ph_max", &self.ask("Ideal pH (maximum): ")?)?,
                    humidity_min: parse_optional_number(
                        "humidity_min",
                        &self.ask("Ideal humidity % (minimum): ")?,
                    )?,
                    humidity_max: parse_optional_number(
                        "humidity_max",
                        &self.ask("Ideal humidity % (maximum): ")?,
                    )?,
                };
                self.repo.create_crop(&input).await?
            }
            EntityKind::Sensor => {
                let area_id = parse_id("area_id", &self.ask("Area id: ")?)?;
                let kind: SensorKind = parse_text(
                    "type",
                    &self.ask("Sensor type (humidity, ph, nutrients, temperature): ")?,
                )?
                .parse()?;
                let install_date =
                    parse_optional_date("install_date", &self.ask("Install date YYYY-MM-DD (optional): ")?)?;
                let status: SensorStatus = parse_optional(&self.ask("Status (active, inactive, maintenance) [active]: ")?)?
                    .unwrap_or_default();
                self.repo
                    .create_sensor(&NewSensor {
                        area_id,
                        kind,
                        install_date,
                        status,
                    })
                    .await?
            }
            EntityKind::Reading => {
                let sensor_id = parse_id("sensor_id", &self.ask("Sensor id: ")?)?;
                let value = parse_number("value", &self.ask("Value: ")?)?;
                let timestamp = parse_optional_timestamp(
                    "timestamp",
                    &self.ask("Timestamp YYYY-MM-DD HH:MM:SS [now]: ")?,
                )?
                .unwrap_or_else(|| Local::now().naive_local());
                let mut input = NewReading::new(sensor_id, timestamp, value);
                input.secondary_value =
                    parse_optional_number("secondary_value", &self.ask("Secondary value (optional): ")?)?;
                input.tertiary_value =
                    parse_optional_number("tertiary_value", &self.ask("Tertiary value (optional): ")?)?;
                self.repo.create_reading(&input).await?
            }
        };
        writeln!(self.output, "{} created with id {}.", kind, id)?;
        Ok(())
    }

    // ==========================================================================
    // List
    // ==========================================================================

    async fn list(&mut self, kind: EntityKind) -> Result<(), MenuError> {
        let table = match kind {
            EntityKind::Producer => {
                let producers = self.repo.list_producers().await?;
                if producers.is_empty() {
                    return self.nothing_registered(kind);
                }
                let mut table = table(&["ID", "Name", "Tax id", "E-mail"]);
                for p in producers {
                    table.add_row(vec![p.id.to_string(), p.name, p.tax_id, or_dash(&p.email)]);
                }
                table
            }
            EntityKind::Area => {
                let producer = self.optional_id("producer_id", "Producer id (blank for all): ")?;
                let areas = self.repo.list_areas(producer).await?;
                if areas.is_empty() {
                    return self.nothing_registered(kind);
                }
                let mut table = table(&["ID", "Producer", "Name", "Location", "Size (ha)"]);
                for a in areas {
                    table.add_row(vec![
                        a.id.to_string(),
                        a.producer_id.to_string(),
                        a.name,
                        a.location,
                        or_dash(&a.size),
                    ]);
                }
                table
            }
            EntityKind::Crop => {
                let crops = self.repo.list_crops().await?;
                if crops.is_empty() {
                    return self.nothing_registered(kind);
                }
                let mut table = table(&["ID", "Popular name", "Scientific name", "pH", "Humidity (%)"]);
                for c in crops {
                    table.add_row(vec![
                        c.id.to_string(),
                        c.popular_name,
                        or_dash(&c.scientific_name),
                        range(c.ph_min, c.ph_max),
                        range(c.humidity_min, c.humidity_max),
                    ]);
                }
                table
            }
            EntityKind::Sensor => {
                let area = self.optional_id("area_id", "Area id (blank for all): ")?;
                let sensors = self.repo.list_sensors(area).await?;
                if sensors.is_empty() {
                    return self.nothing_registered(kind);
                }
                let mut table = table(&["ID", "Area", "Type", "Installed", "Status"]);
                for s in sensors {
                    table.add_row(vec![
                        s.id.to_string(),
                        s.area_id.to_string(),
                        s.kind.to_string(),
                        or_dash(&s.install_date),
                        s.status.to_string(),
                    ]);
                }
                table
            }
            EntityKind::Reading => {
                let sensor = self.optional_id("sensor_id", "Sensor id (blank for all): ")?;
                let readings = self.repo.list_readings(sensor).await?;
                if readings.is_empty() {
                    return self.nothing_registered(kind);
                }
                let mut table =
                    table(&["ID", "Sensor", "Type", "Timestamp", "Value", "Secondary", "Tertiary"]);
                for r in readings {
                    table.add_row(vec![
                        r.id.to_string(),
                        r.sensor_id.to_string(),
                        r.sensor_type.to_string(),
                        r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        format!("{} {}", r.value, r.sensor_type.unit()),
                        or_dash(&r.secondary_value),
                        or_dash(&r.tertiary_value),
                    ]);
                }
                table
            }
        };
        writeln!(self.output, "{}", table)?;
        Ok(())
    }

    fn nothing_registered(&mut self, kind: EntityKind) -> Result<(), MenuError> {
        writeln!(self.output, "No {} records found.", kind.table())?;
        Ok(())
    }

    // ==========================================================================
    // Update
    // ==========================================================================

    /// Prompts show the stored value; a blank answer keeps it.
    async fn update(&mut self, kind: EntityKind) -> Result<(), MenuError> {
        let id = parse_id("id", &self.ask(&format!("{} id to update: ", kind))?)?;

        let changes = match kind {
            EntityKind::Producer => {
                let current = self.repo.get_producer(id).await?;
                EntityUpdate::Producer(ProducerUpdate {
                    name: parse_optional_text(&self.ask_keep("Name", &current.name)?),
                    tax_id: parse_optional_text(&self.ask_keep("Tax id", &current.tax_id)?),
                    email: parse_optional_text(&self.ask_keep("E-mail", &or_dash(&current.email))?),
                })
            }
            EntityKind::Area => {
                let current = self.repo.get_area(id).await?;
                EntityUpdate::Area(AreaUpdate {
                    name: parse_optional_text(&self.ask_keep("Name", &current.name)?),
                    location: parse_optional_text(&self.ask_keep("Location", &current.location)?),
                    size: parse_optional_number("size", &self.ask_keep("Size (ha)", &or_dash(&current.size))?)?,
                })
            }
            EntityKind::Crop => {
                let current = self.repo.get_crop(id).await?;
                EntityUpdate::Crop(CropUpdate {
                    popular_name: parse_optional_text(&self.ask_keep("Popular name", &current.popular_name)?),
                    scientific_name: parse_optional_text(
                        &self.ask_keep("Scientific name", &or_dash(&current.scientific_name))?,
                    ),
                    ph_min: parse_optional_number("ph_min", &self.ask_keep("pH min", &or_dash(&current.ph_min))?)?,
                    ph_max: parse_optional_number("ph_max", &self.ask_keep("pH max", &or_dash(&current.ph_max))?)?,
                    humidity_min: parse_optional_number(
                        "humidity_min",
                        &self.ask_keep("Humidity min", &or_dash(&current.humidity_min))?,
                    )?,
                    humidity_max: parse_optional_number(
                        "humidity_max",
                        &self.ask_keep("Humidity max", &or_dash(&current.humidity_max))?,
                    )?,
                })
            }
            EntityKind::Sensor => {
                let current = self.repo.get_sensor(id).await?;
                EntityUpdate::Sensor(SensorUpdate {
                    install_date: parse_optional_date(
                        "install_date",
                        &self.ask_keep("Install date", &or_dash(&current.install_date))?,
                    )?,
                    status: parse_optional(&self.ask_keep("Status", current.status.as_str())?)?,
                })
            }
            EntityKind::Reading => {
                let current = self.repo.get_reading(id).await?;
                EntityUpdate::Reading(ReadingUpdate {
                    timestamp: parse_optional_timestamp(
                        "timestamp",
                        &self.ask_keep("Timestamp", &current.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())?,
                    )?,
                    value: parse_optional_number("value", &self.ask_keep("Value", &current.value.to_string())?)?,
                    secondary_value: parse_optional_number(
                        "secondary_value",
                        &self.ask_keep("Secondary value", &or_dash(&current.secondary_value))?,
                    )?,
                    tertiary_value: parse_optional_number(
                        "tertiary_value",
                        &self.ask_keep("Tertiary value", &or_dash(&current.tertiary_value))?,
                    )?,
                })
            }
        };

        let message = match self.repo.update(id, &changes).await? {
            UpdateOutcome::Updated => format!("{} {} updated.", kind, id),
            UpdateOutcome::Unchanged => format!("{} {} already had those values.", kind, id),
            UpdateOutcome::NoChanges => "Nothing to change.".to_string(),
        };
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    // ==========================================================================
    // Remove
    // ==========================================================================

    async fn remove(&mut self, kind: EntityKind) -> Result<(), MenuError> {
        let id = parse_id("id", &self.ask(&format!("{} id to remove: ", kind))?)?;
        self.repo.delete(kind, id).await?;
        let cascade = match kind {
            EntityKind::Producer => " Its areas, sensors and readings were removed with it.",
            EntityKind::Area => " Its sensors and readings were removed with it.",
            EntityKind::Sensor => " Its readings were removed with it.",
            EntityKind::Crop | EntityKind::Reading => "",
        };
        writeln!(self.output, "{} {} removed.{}", kind, id, cascade)?;
        Ok(())
    }

    // ==========================================================================
    // Forecast
    // ==========================================================================

    async fn forecast(&mut self) -> Result<(), MenuError> {
        let area_id = parse_id("area_id", &self.ask("Area id: ")?)?;
        let area = self.repo.get_area(area_id).await?;
        let points: Vec<_> = self
            .repo
            .list_area_readings(area_id, Some(SensorKind::Humidity))
            .await?
            .iter()
            .map(|r| r.point())
            .collect();

        let forecast = forecast::next_step(&points, self.horizon)?;
        writeln!(
            self.output,
            "Humidity forecast for '{}' at {}: {:.2}% (trend {:+.2} per hour over {} readings).",
            area.name,
            forecast.at.format("%Y-%m-%d %H:%M:%S"),
            forecast.value,
            forecast.slope_per_hour,
            forecast.samples,
        )?;
        Ok(())
    }

    // ==========================================================================
    // Terminal helpers
    // ==========================================================================

    /// `None` at end of input. The trailing newline is stripped.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn ask(&mut self, prompt: &str) -> Result<String, MenuError> {
        self.read_line(prompt)?.ok_or(MenuError::EndOfInput)
    }

    fn ask_keep(&mut self, label: &str, current: &str) -> Result<String, MenuError> {
        self.ask(&format!("{} [{}] (blank keeps it): ", label, current))
    }

    fn optional_id(&mut self, field: &str, prompt: &str) -> Result<Option<i64>, MenuError> {
        let raw = self.ask(prompt)?;
        Ok(non_blank(&raw).map(|value| parse_id(field, value)).transpose()?)
    }
}

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn or_dash<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn range(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (None, None) => "-".to_string(),
        (min, max) => format!("{} to {}", or_dash(&min), or_dash(&max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::SqliteRepository;

    async fn run_script(repo: &SqliteRepository, script: &str) -> String {
        let mut output = Vec::new();
        {
            let mut menu = Menu::new(repo, script.as_bytes(), &mut output, Duration::hours(1));
            menu.run().await.unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn choices_map_to_entities_in_menu_order() {
        assert_eq!(MenuChoice::parse("0"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse(" 1 "), Some(MenuChoice::Insert(EntityKind::Producer)));
        assert_eq!(MenuChoice::parse("7"), Some(MenuChoice::List(EntityKind::Area)));
        assert_eq!(MenuChoice::parse("13"), Some(MenuChoice::Update(EntityKind::Crop)));
        assert_eq!(MenuChoice::parse("20"), Some(MenuChoice::Remove(EntityKind::Reading)));
        assert_eq!(MenuChoice::parse("21"), Some(MenuChoice::Forecast));
        assert_eq!(MenuChoice::parse("22"), None);
        assert_eq!(MenuChoice::parse("x"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[tokio::test]
    async fn insert_list_and_remove_round_trip() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let script = "1\nAna\n123.456.789-00\nana@farm.br\n6\n16\n1\n6\n0\n";

        let output = run_script(&repo, script).await;

        assert!(output.contains("Producer created with id 1."), "{}", output);
        assert!(output.contains("ana@farm.br"));
        assert!(output.contains("Producer 1 removed."));
        assert!(output.contains("No producer records found."));
        assert!(output.trim_end().ends_with("Goodbye."));
        assert!(repo.list_producers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_input_aborts_the_action_only() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        // Insert area with a non-numeric producer id, then an unknown option, then exit.
        let script = "2\nabc\n99\n0\n";

        let output = run_script(&repo, script).await;

        assert!(output.contains("Error:"), "{}", output);
        assert!(output.contains("Nothing was saved."));
        assert!(output.contains("Invalid option: '99'."));
        assert!(output.contains("Goodbye."));
        assert!(repo.list_areas(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_update_changes_nothing() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let script = "1\nAna\n123\n\n11\n1\n\n\n\n0\n";

        let output = run_script(&repo, script).await;

        assert!(output.contains("Nothing to change."), "{}", output);
        let producer = repo.get_producer(1).await.unwrap();
        assert_eq!(producer.name, "Ana");
        assert_eq!(producer.email, None);
    }

    #[tokio::test]
    async fn missing_parent_is_reported_with_a_hint() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let script = "4\n7\nph\n\n\n0\n";

        let output = run_script(&repo, script).await;

        assert!(output.contains("Area with id 7 was not found."), "{}", output);
        assert!(output.contains("Hint: List the records first"));
    }

    #[tokio::test]
    async fn end_of_input_exits_cleanly_mid_prompt() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let output = run_script(&repo, "1\nAna\n").await;
        assert!(!output.contains("created"));
        assert!(repo.list_producers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forecast_needs_two_humidity_readings() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let script = concat!(
            "1\nAna\n1\n\n",
            "2\n1\nTalhão\nSetor A\n\n",
            "4\n1\nhumidity\n\n\n",
            "5\n1\n50\n2024-06-01 00:00:00\n\n\n",
            "21\n1\n",
            "5\n1\n52\n2024-06-01 01:00:00\n\n\n",
            "21\n1\n",
            "0\n",
        );

        let output = run_script(&repo, script).await;

        assert!(output.contains("Hint: Record at least two humidity readings"), "{}", output);
        assert!(
            output.contains("Humidity forecast for 'Talhão' at 2024-06-01 02:00:00: 54.00%"),
            "{}",
            output
        );
    }
}
