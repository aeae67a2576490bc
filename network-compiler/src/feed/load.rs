//! Reading feed tables out of a zip archive.

use std::collections::HashMap;
use std::io::{Read, Seek};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use super::error::FeedError;
use super::tables::{Calendar, CalendarDate, ExceptionType, PickupType, Route, Stop, StopTime, Trip};
use crate::domain::{RouteType, StopId};

/// Raw bytes of a table, or `None` if the archive lacks it.
pub(super) fn read_table<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    table: &'static str,
) -> Result<Option<Vec<u8>>, FeedError> {
    let mut file = match archive.by_name(&format!("{table}.txt")) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    debug!(table, bytes = bytes.len(), "Read feed table");
    Ok(Some(bytes))
}

/// Like [`read_table`], but a missing table is an error.
pub(super) fn read_required_table<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    table: &'static str,
) -> Result<Vec<u8>, FeedError> {
    read_table(archive, table)?.ok_or(FeedError::MissingTable(table))
}

/// Column positions of one table header.
struct Columns {
    table: &'static str,
    headers: StringRecord,
}

impl Columns {
    fn new(table: &'static str, headers: StringRecord) -> Self {
        Self { table, headers }
    }

    fn required(&self, column: &'static str) -> Result<usize, FeedError> {
        self.optional(column).ok_or(FeedError::MissingColumn {
            table: self.table,
            column,
        })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == column)
    }
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes)
}

/// A trimmed, non-empty field.
fn field(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse a "YYYYMMDD" date.
fn parse_feed_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d").ok()
}

pub(super) fn parse_stops(bytes: &[u8]) -> Result<Vec<Stop>, FeedError> {
    let mut rdr = reader(bytes);
    let cols = Columns::new("stops", rdr.headers()?.clone());
    let idx_id = cols.required("stop_id")?;
    let idx_name = cols.optional("stop_name");
    let idx_lat = cols.required("stop_lat")?;
    let idx_lon = cols.required("stop_lon")?;
    let idx_parent = cols.optional("parent_station");

    let mut stops = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        let Some(stop_id) = field(&record, Some(idx_id)).and_then(|s| StopId::parse(s).ok()) else {
            skipped += 1;
            continue;
        };
        let lat = field(&record, Some(idx_lat)).and_then(|s| s.parse::<f64>().ok());
        let lon = field(&record, Some(idx_lon)).and_then(|s| s.parse::<f64>().ok());
        let (Some(lat), Some(lon)) = (lat, lon) else {
            skipped += 1;
            continue;
        };
        stops.push(Stop {
            stop_id,
            name: field(&record, idx_name).unwrap_or_default().to_string(),
            lat,
            lon,
            parent_station: field(&record, idx_parent).and_then(|s| StopId::parse(s).ok()),
        });
    }
    if skipped > 0 {
        warn!(skipped, "Skipped stops.txt records without id or coordinates");
    }
    Ok(stops)
}

pub(super) fn parse_routes(bytes: &[u8]) -> Result<HashMap<String, Route>, FeedError> {
    let mut rdr = reader(bytes);
    let cols = Columns::new("routes", rdr.headers()?.clone());
    let idx_id = cols.required("route_id")?;
    let idx_short = cols.optional("route_short_name");
    let idx_type = cols.required("route_type")?;

    let mut routes = HashMap::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        let Some(route_id) = field(&record, Some(idx_id)) else {
            skipped += 1;
            continue;
        };
        let Some(code) = field(&record, Some(idx_type)).and_then(|s| s.parse::<i32>().ok()) else {
            skipped += 1;
            continue;
        };
        routes.insert(
            route_id.to_string(),
            Route {
                route_id: route_id.to_string(),
                short_name: field(&record, idx_short).map(str::to_string),
                route_type: RouteType::from_code(code),
            },
        );
    }
    if skipped > 0 {
        warn!(skipped, "Skipped routes.txt records without id or type");
    }
    Ok(routes)
}

pub(super) fn parse_trips(bytes: &[u8]) -> Result<HashMap<String, Trip>, FeedError> {
    let mut rdr = reader(bytes);
    let cols = Columns::new("trips", rdr.headers()?.clone());
    let idx_trip = cols.required("trip_id")?;
    let idx_route = cols.required("route_id")?;
    let idx_service = cols.required("service_id")?;
    let idx_dir = cols.optional("direction_id");
    let idx_headsign = cols.optional("trip_headsign");

    let mut trips = HashMap::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        let (Some(trip_id), Some(route_id), Some(service_id)) = (
            field(&record, Some(idx_trip)),
            field(&record, Some(idx_route)),
            field(&record, Some(idx_service)),
        ) else {
            skipped += 1;
            continue;
        };
        trips.insert(
            trip_id.to_string(),
            Trip {
                trip_id: trip_id.to_string(),
                route_id: route_id.to_string(),
                service_id: service_id.to_string(),
                direction_id: field(&record, idx_dir).and_then(|s| s.parse().ok()),
                headsign: field(&record, idx_headsign).map(str::to_string),
            },
        );
    }
    if skipped > 0 {
        warn!(skipped, "Skipped trips.txt records with empty keys");
    }
    Ok(trips)
}

pub(super) fn parse_stop_times(bytes: &[u8]) -> Result<Vec<StopTime>, FeedError> {
    let mut rdr = reader(bytes);
    let cols = Columns::new("stop_times", rdr.headers()?.clone());
    let idx_trip = cols.required("trip_id")?;
    let idx_stop = cols.required("stop_id")?;
    let idx_seq = cols.required("stop_sequence")?;
    let idx_arr = cols.required("arrival_time")?;
    let idx_dep = cols.optional("departure_time");
    let idx_pickup = cols.optional("pickup_type");

    let mut stop_times = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        let trip_id = field(&record, Some(idx_trip));
        let stop_id = field(&record, Some(idx_stop)).and_then(|s| StopId::parse(s).ok());
        let (Some(trip_id), Some(stop_id)) = (trip_id, stop_id) else {
            skipped += 1;
            continue;
        };
        stop_times.push(StopTime {
            trip_id: trip_id.to_string(),
            stop_id,
            stop_sequence: field(&record, Some(idx_seq))
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            // Validated later; a blank time must still reach the window filter
            arrival_time: record.get(idx_arr).unwrap_or_default().to_string(),
            departure_time: field(&record, idx_dep).map(str::to_string),
            pickup_type: PickupType::from_field(field(&record, idx_pickup)),
        });
    }
    if skipped > 0 {
        warn!(skipped, "Skipped stop_times.txt records with empty keys");
    }
    Ok(stop_times)
}

pub(super) fn parse_calendar(bytes: &[u8]) -> Result<Vec<Calendar>, FeedError> {
    const DAYS: [&str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];

    let mut rdr = reader(bytes);
    let cols = Columns::new("calendar", rdr.headers()?.clone());
    let idx_service = cols.required("service_id")?;
    let mut idx_days = [0usize; 7];
    for (slot, day) in idx_days.iter_mut().zip(DAYS) {
        *slot = cols.required(day)?;
    }
    let idx_start = cols.required("start_date")?;
    let idx_end = cols.required("end_date")?;

    let mut calendars = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let Some(service_id) = field(&record, Some(idx_service)) else {
            continue;
        };
        let start_date = date_value(&record, idx_start, "calendar", "start_date")?;
        let end_date = date_value(&record, idx_end, "calendar", "end_date")?;
        let mut weekdays = [false; 7];
        for (flag, idx) in weekdays.iter_mut().zip(idx_days) {
            *flag = field(&record, Some(idx)) == Some("1");
        }
        calendars.push(Calendar {
            service_id: service_id.to_string(),
            weekdays,
            start_date,
            end_date,
        });
    }
    Ok(calendars)
}

pub(super) fn parse_calendar_dates(bytes: &[u8]) -> Result<Vec<CalendarDate>, FeedError> {
    let mut rdr = reader(bytes);
    let cols = Columns::new("calendar_dates", rdr.headers()?.clone());
    let idx_service = cols.required("service_id")?;
    let idx_date = cols.required("date")?;
    let idx_type = cols.required("exception_type")?;

    let mut dates = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let Some(service_id) = field(&record, Some(idx_service)) else {
            continue;
        };
        let date = date_value(&record, idx_date, "calendar_dates", "date")?;
        let exception = match field(&record, Some(idx_type)) {
            Some("1") => ExceptionType::Added,
            Some("2") => ExceptionType::Removed,
            other => {
                return Err(FeedError::InvalidValue {
                    table: "calendar_dates",
                    column: "exception_type",
                    value: other.unwrap_or_default().to_string(),
                });
            }
        };
        dates.push(CalendarDate {
            service_id: service_id.to_string(),
            date,
            exception,
        });
    }
    Ok(dates)
}

fn date_value(
    record: &StringRecord,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<NaiveDate, FeedError> {
    let raw = field(record, Some(idx)).unwrap_or_default();
    parse_feed_date(raw).ok_or_else(|| FeedError::InvalidValue {
        table,
        column,
        value: raw.to_string(),
    })
}

/// Log a one-line summary of what was loaded.
pub(super) fn log_summary(stops: usize, routes: usize, trips: usize, stop_times: usize) {
    info!(stops, routes, trips, stop_times, "Loaded feed tables");
}
