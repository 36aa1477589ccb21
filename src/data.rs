//! Reading match, scorer and fixture files, and writing feature tables.

use std::io;
use std::io::{BufRead, Write};
use std::path::Path;

use strum::{EnumCount, IntoEnumIterator};
use thiserror::Error;
use tracing::{debug, warn};

use crate::csv::{CsvReader, CsvWriter, Header, Record};
use crate::domain::{parse_date, Fixture, InvalidRecord, MatchRecord, MatchStatus};
use crate::feature::{Feature, FeatureTable};
use crate::scorer::ScorerTable;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("empty file")]
    MissingHeader,

    #[error("missing column {0:?}")]
    MissingColumn(&'static str),

    #[error("line {line}: expected {expected} fields, got {actual}")]
    ShortRow {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: InvalidRecord,
    },
}

struct Table<R> {
    header: Header,
    reader: CsvReader<R>,
}
impl<R: BufRead> Table<R> {
    fn open(mut reader: CsvReader<R>) -> Result<Self, ReadError> {
        let header = reader.next().ok_or(ReadError::MissingHeader)??;
        Ok(Self {
            header: Header::new(header),
            reader,
        })
    }

    fn require(&self, column: &'static str) -> Result<usize, ReadError> {
        self.header.position(column).ok_or(ReadError::MissingColumn(column))
    }

    /// Visits each data row with its 1-based line number (the header being line 1).
    fn for_each_row(self, mut f: impl FnMut(usize, &[String]) -> Result<(), ReadError>) -> Result<(), ReadError> {
        let width = self.header.len();
        for (index, row) in self.reader.enumerate() {
            let row = row?;
            let line = index + 2;
            if row.len() < width {
                return Err(ReadError::ShortRow {
                    line,
                    expected: width,
                    actual: row.len(),
                });
            }
            f(line, &row)?;
        }
        Ok(())
    }
}

fn invalid(line: usize) -> impl Fn(InvalidRecord) -> ReadError {
    move |source| ReadError::InvalidRecord { line, source }
}

/// Parses a goal count, accepting integral decimals such as `2.0`.
fn parse_goals(field: &str) -> Result<u8, InvalidRecord> {
    field
        .parse::<u8>()
        .ok()
        .or_else(|| {
            field
                .parse::<f64>()
                .ok()
                .filter(|goals| goals.fract() == 0.0 && (0.0..=u8::MAX as f64).contains(goals))
                .map(|goals| goals as u8)
        })
        .ok_or_else(|| InvalidRecord::Goals(field.to_string()))
}

/// Reads matches from `date,home_team,away_team,home_goals,away_goals[,status]` rows. Rows with
/// blank goals are skipped.
pub fn read_matches<R: BufRead>(reader: CsvReader<R>) -> Result<Vec<MatchRecord>, ReadError> {
    let table = Table::open(reader)?;
    let date = table.require("date")?;
    let home_team = table.require("home_team")?;
    let away_team = table.require("away_team")?;
    let home_goals = table.require("home_goals")?;
    let away_goals = table.require("away_goals")?;
    let status = table.header.position("status");

    let mut matches = vec![];
    let mut skipped = 0;
    table.for_each_row(|line, row| {
        if row[home_goals].is_empty() || row[away_goals].is_empty() {
            skipped += 1;
            return Ok(());
        }
        let record = MatchRecord {
            date: parse_date(&row[date]).map_err(invalid(line))?,
            home_team: row[home_team].clone(),
            away_team: row[away_team].clone(),
            home_goals: parse_goals(&row[home_goals]).map_err(invalid(line))?,
            away_goals: parse_goals(&row[away_goals]).map_err(invalid(line))?,
            status: match status {
                Some(status) => row[status].parse().map_err(invalid(line))?,
                None => MatchStatus::Finished,
            },
        };
        record.validate().map_err(invalid(line))?;
        matches.push(record);
        Ok(())
    })?;
    if skipped > 0 {
        warn!("skipped {skipped} rows without goals");
    }
    debug!("read {} matches", matches.len());
    Ok(matches)
}

/// Reads `team_name,goals` rows; other columns are ignored.
pub fn read_scorers<R: BufRead>(reader: CsvReader<R>) -> Result<ScorerTable, ReadError> {
    let table = Table::open(reader)?;
    let team_name = table.require("team_name")?;
    let goals = table.require("goals")?;
    let mut scorers = ScorerTable::default();
    table.for_each_row(|line, row| {
        let tally = parse_goals(&row[goals]).map_err(invalid(line))?;
        scorers.record(row[team_name].clone(), tally as u16);
        Ok(())
    })?;
    debug!("read top scorers of {} teams", scorers.len());
    Ok(scorers)
}

/// Reads `date,home_team,away_team` rows; the date may be blank.
pub fn read_fixtures<R: BufRead>(reader: CsvReader<R>) -> Result<Vec<Fixture>, ReadError> {
    let table = Table::open(reader)?;
    let date = table.header.position("date");
    let home_team = table.require("home_team")?;
    let away_team = table.require("away_team")?;
    let mut fixtures = vec![];
    table.for_each_row(|line, row| {
        let date = match date.map(|date| row[date].as_str()) {
            Some(date) if !date.is_empty() => Some(parse_date(date).map_err(invalid(line))?),
            _ => None,
        };
        let fixture = Fixture {
            date,
            home_team: row[home_team].clone(),
            away_team: row[away_team].clone(),
        };
        if fixture.home_team.is_empty() || fixture.away_team.is_empty() {
            return Err(invalid(line)(InvalidRecord::MissingTeam));
        }
        fixtures.push(fixture);
        Ok(())
    })?;
    Ok(fixtures)
}

pub fn read_matches_file(path: impl AsRef<Path>) -> Result<Vec<MatchRecord>, ReadError> {
    read_matches(CsvReader::open(path)?)
}

pub fn read_scorers_file(path: impl AsRef<Path>) -> Result<ScorerTable, ReadError> {
    read_scorers(CsvReader::open(path)?)
}

pub fn read_fixtures_file(path: impl AsRef<Path>) -> Result<Vec<Fixture>, ReadError> {
    read_fixtures(CsvReader::open(path)?)
}

const LEADING_COLUMNS: [&str; 6] = ["date", "home_team", "away_team", "home_goals", "away_goals", "result"];

/// Writes one line per row: the match columns followed by every feature column in schema order.
/// Undefined values are written as blanks.
pub fn write_feature_table<W: Write>(table: &FeatureTable, writer: &mut CsvWriter<W>) -> Result<(), io::Error> {
    let header = LEADING_COLUMNS
        .iter()
        .map(ToString::to_string)
        .chain(Feature::iter().map(|feature| feature.to_string()));
    writer.append(header)?;
    for row in &table.rows {
        let mut record = Record::with_capacity(LEADING_COLUMNS.len() + Feature::COUNT);
        record.set(0usize, row.date.format("%Y-%m-%d"));
        record.set(1usize, &row.home_team);
        record.set(2usize, &row.away_team);
        record.set(3usize, row.home_goals);
        record.set(4usize, row.away_goals);
        record.set(5usize, row.result);
        for (index, value) in row.values().iter().enumerate() {
            if let Some(value) = value {
                record.set(LEADING_COLUMNS.len() + index, value);
            }
        }
        writer.append(record)?;
    }
    writer.flush()
}
