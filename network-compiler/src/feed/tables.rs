//! In-memory feed table rows.

use chrono::{Datelike, NaiveDate};

use crate::domain::{RouteType, StopId};

/// A stop, platform or station (from stops.txt).
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: StopId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// The station this platform belongs to, if any.
    pub parent_station: Option<StopId>,
}

/// A line (from routes.txt).
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub route_id: String,
    /// Public line name, e.g. "A", "T1", "C3".
    pub short_name: Option<String>,
    pub route_type: RouteType,
}

/// A scheduled vehicle journey (from trips.txt).
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub direction_id: Option<u8>,
    pub headsign: Option<String>,
}

/// Whether passengers may board at a stop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickupType {
    #[default]
    Regular,
    /// Non-commercial pass: no boarding.
    NoPickup,
    PhoneAgency,
    CoordinateWithDriver,
}

impl PickupType {
    /// Map a raw `pickup_type` value; blank or unknown values are regular.
    pub fn from_field(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") => PickupType::NoPickup,
            Some("2") => PickupType::PhoneAgency,
            Some("3") => PickupType::CoordinateWithDriver,
            _ => PickupType::Regular,
        }
    }
}

/// One vehicle call at a stop (from stop_times.txt).
///
/// Times are kept as the raw strings from the feed. They are parsed when a
/// time window is resolved, so a malformed value only drops its own row.
#[derive(Debug, Clone, PartialEq)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: StopId,
    pub stop_sequence: u32,
    pub arrival_time: String,
    pub departure_time: Option<String>,
    pub pickup_type: PickupType,
}

/// A regular weekly service pattern (from calendar.txt).
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    pub service_id: String,
    /// Monday first.
    pub weekdays: [bool; 7],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Calendar {
    /// True if the weekly pattern covers `date` (ignoring exceptions).
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date
            && date <= self.end_date
            && self.weekdays[date.weekday().num_days_from_monday() as usize]
    }
}

/// Whether a calendar exception adds or removes a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    Added,
    Removed,
}

/// A one-off change to a service (from calendar_dates.txt).
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDate {
    pub service_id: String,
    pub date: NaiveDate,
    pub exception: ExceptionType,
}
