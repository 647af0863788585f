//! CSV input/output for observation logs and indicator tables

use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{CsvRecord, Dimension, IndicatorTable, Observation};

fn malformed(err: csv::Error, line: Option<u64>) -> Error {
    if err.is_io_error() {
        return Error::Csv(err);
    }
    let line = line.or_else(|| err.position().map(|p| p.line())).unwrap_or(0);
    Error::MalformedInput {
        line,
        reason: err.to_string(),
    }
}

/// Read observations from any CSV source with a header row
pub fn read_observations_from<R: Read>(source: R) -> Result<Vec<Observation>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source);

    let headers = reader.headers().map_err(|e| malformed(e, Some(1)))?.clone();
    let mut observations = Vec::new();

    for result in reader.records() {
        let raw = result.map_err(|e| malformed(e, None))?;
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        let record: CsvRecord = raw
            .deserialize(Some(&headers))
            .map_err(|e| malformed(e, Some(line)))?;
        observations.push(record.to_observation(line)?);
    }

    Ok(observations)
}

pub fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    info!("Reading CSV from {:?}", path);
    let observations = read_observations_from(File::open(path)?)?;
    info!("Parsed {} observations from CSV", observations.len());
    Ok(observations)
}

pub fn write_observations_to<W: Write>(sink: W, observations: &[Observation]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(sink);
    for obs in observations {
        writer.serialize(obs.to_csv_record())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_observations(path: &Path, observations: &[Observation]) -> Result<()> {
    ensure_parent(path)?;
    write_observations_to(File::create(path)?, observations)?;
    info!("Wrote {} observations to {:?}", observations.len(), path);
    Ok(())
}

/// Write the wide table: key columns, then one column per indicator.
/// Absent cells are empty fields.
pub fn write_table_to<W: Write>(sink: W, table: &IndicatorTable) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(sink);
    writer.write_record(table.columns())?;

    for row in &table.rows {
        let mut fields: Vec<String> = Dimension::ALL.iter().map(|d| row.key.get(*d)).collect();
        for indicator in &table.indicators {
            fields.push(row.value(indicator).map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_table(path: &Path, table: &IndicatorTable) -> Result<()> {
    ensure_parent(path)?;
    write_table_to(File::create(path)?, table)?;
    info!("Wrote {} indicator rows to {:?}", table.len(), path);
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::indicators::{ATTENDED_CALLS, AVERAGE_HANDLING_TIME};

    const HEADER: &str =
        "date,agent,supervisor,coordinator,business_line,city,state,indicator_name,numerator,denominator";

    #[test]
    fn test_read_observations() {
        let data = format!(
            "{}\n\
             2024-01-03,Agent_1,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,12,1\n\
             2024-01-03 00:00:00,Agent_1,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,TMA,300,10\n\
             2024-01-04,Agent_2,Supervisor_2,Coordinator_1,SAC,Curitiba,PR,Attended-Calls,7,\n",
            HEADER
        );
        let observations = read_observations_from(data.as_bytes()).unwrap();
        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].key, observations[1].key);
        assert_eq!(observations[1].indicator, "TMA");
        assert_eq!(observations[2].denominator, 1.0);
    }

    #[test]
    fn test_missing_numerator_is_malformed() {
        let data = format!(
            "{}\n\
             2024-01-03,Agent_1,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,12,1\n\
             2024-01-03,Agent_1,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,,1\n",
            HEADER
        );
        match read_observations_from(data.as_bytes()) {
            Err(Error::MalformedInput { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let data = "date,agent,indicator_name,numerator\n2024-01-03,Agent_1,Attended-Calls,4\n";
        assert!(matches!(
            read_observations_from(data.as_bytes()),
            Err(Error::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_bad_date_is_malformed() {
        let data = format!(
            "{}\n03/01/2024,Agent_1,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,12,1\n",
            HEADER
        );
        assert!(matches!(
            read_observations_from(data.as_bytes()),
            Err(Error::MalformedInput { line: 2, .. })
        ));
    }

    #[test]
    fn test_nan_and_inf_fields_are_malformed() {
        for (row, expected_line) in [
            ("Average-Handling-Time,300,NaN", 2),
            ("Attended-Calls,inf,1", 2),
        ] {
            let data = format!(
                "{}\n2024-01-03,Agent_1,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,{}\n",
                HEADER, row
            );
            match read_observations_from(data.as_bytes()) {
                Err(Error::MalformedInput { line, .. }) => assert_eq!(line, expected_line),
                other => panic!("expected MalformedInput for {}, got {:?}", row, other),
            }
        }
    }

    #[test]
    fn test_write_table_leaves_absent_cells_empty() {
        let data = format!(
            "{}\n\
             2024-01-03,Agent_1,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,12,1\n\
             2024-01-03,Agent_2,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,TMA,300,10\n",
            HEADER
        );
        let table = aggregate(&read_observations_from(data.as_bytes()).unwrap()).unwrap();

        let mut out = Vec::new();
        write_table_to(&mut out, &table).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            format!(
                "date,agent,supervisor,coordinator,business_line,city,state,{},{},Satisfaction-Score",
                ATTENDED_CALLS, AVERAGE_HANDLING_TIME
            )
        );
        assert_eq!(lines[1], "2024-01-03,Agent_1,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,12,,");
        assert_eq!(lines[2], "2024-01-03,Agent_2,Supervisor_2,Coordinator_1,Sales,Curitiba,PR,,30,");
    }

    #[test]
    fn test_observations_survive_csv() {
        let data = format!(
            "{}\n2024-05-10,Agent_4,Supervisor_1,Coordinator_2,Collections,Recife,PE,CSAT,17,5\n",
            HEADER
        );
        let observations = read_observations_from(data.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_observations_to(&mut out, &observations).unwrap();
        assert_eq!(read_observations_from(out.as_slice()).unwrap(), observations);
    }
}
