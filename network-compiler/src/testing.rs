//! Helpers for building small in-memory feeds in unit tests.

use chrono::NaiveDate;

use crate::domain::{RouteType, StopId};
use crate::feed::{Calendar, Feed, PickupType, Route, ServiceCalendar, Stop, StopTime, Trip};

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Builds a [`Feed`] row by row. Starts with a `DAILY` service running
/// every day of 2024 and 2025.
pub(crate) struct FeedBuilder {
    feed: Feed,
    calendars: Vec<Calendar>,
}

impl FeedBuilder {
    pub(crate) fn new() -> Self {
        Self {
            feed: Feed::default(),
            calendars: vec![Calendar {
                service_id: "DAILY".to_string(),
                weekdays: [true; 7],
                start_date: date(2024, 1, 1),
                end_date: date(2025, 12, 31),
            }],
        }
    }

    pub(crate) fn without_daily_service(mut self) -> Self {
        self.calendars.retain(|c| c.service_id != "DAILY");
        self
    }

    pub(crate) fn calendar(mut self, service_id: &str, weekdays: [bool; 7]) -> Self {
        self.calendars.push(Calendar {
            service_id: service_id.to_string(),
            weekdays,
            start_date: date(2024, 1, 1),
            end_date: date(2025, 12, 31),
        });
        self
    }

    pub(crate) fn stop(self, id: &str, name: &str, lat: f64, lon: f64) -> Self {
        self.stop_with_parent(id, name, lat, lon, None)
    }

    pub(crate) fn platform(self, id: &str, name: &str, lat: f64, lon: f64, parent: &str) -> Self {
        self.stop_with_parent(id, name, lat, lon, Some(parent))
    }

    fn stop_with_parent(
        mut self,
        id: &str,
        name: &str,
        lat: f64,
        lon: f64,
        parent: Option<&str>,
    ) -> Self {
        self.feed.stops.push(Stop {
            stop_id: StopId::parse(id).unwrap(),
            name: name.to_string(),
            lat,
            lon,
            parent_station: parent.map(|p| StopId::parse(p).unwrap()),
        });
        self
    }

    pub(crate) fn route(mut self, id: &str, short_name: &str, route_type: i32) -> Self {
        self.feed.routes.insert(
            id.to_string(),
            Route {
                route_id: id.to_string(),
                short_name: Some(short_name.to_string()).filter(|s| !s.is_empty()),
                route_type: RouteType::from_code(route_type),
            },
        );
        self
    }

    pub(crate) fn trip(mut self, trip_id: &str, route_id: &str, service_id: &str) -> Self {
        self.feed.trips.insert(
            trip_id.to_string(),
            Trip {
                trip_id: trip_id.to_string(),
                route_id: route_id.to_string(),
                service_id: service_id.to_string(),
                direction_id: None,
                headsign: None,
            },
        );
        self
    }

    pub(crate) fn call(self, trip_id: &str, stop_id: &str, sequence: u32, time: &str) -> Self {
        self.push_call(trip_id, stop_id, sequence, time, PickupType::Regular)
    }

    pub(crate) fn call_without_pickup(
        self,
        trip_id: &str,
        stop_id: &str,
        sequence: u32,
        time: &str,
    ) -> Self {
        self.push_call(trip_id, stop_id, sequence, time, PickupType::NoPickup)
    }

    fn push_call(
        mut self,
        trip_id: &str,
        stop_id: &str,
        sequence: u32,
        time: &str,
        pickup_type: PickupType,
    ) -> Self {
        self.feed.stop_times.push(StopTime {
            trip_id: trip_id.to_string(),
            stop_id: StopId::parse(stop_id).unwrap(),
            stop_sequence: sequence,
            arrival_time: time.to_string(),
            departure_time: Some(time.to_string()),
            pickup_type,
        });
        self
    }

    pub(crate) fn build(mut self) -> Feed {
        self.feed.calendar = ServiceCalendar::new(self.calendars, Vec::new());
        self.feed
    }
}
