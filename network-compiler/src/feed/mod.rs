//! Static transit feed: the in-memory tables the compiler works from.
//!
//! A feed is a zip archive of CSV tables (stops, routes, trips, stop_times,
//! calendar and optionally calendar_dates). Loading is a one-time, blocking
//! step; everything downstream only reads from [`Feed`].

mod calendar;
mod error;
mod load;
mod tables;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::info;
use zip::ZipArchive;

pub use calendar::ServiceCalendar;
pub use error::FeedError;
pub use tables::{Calendar, CalendarDate, ExceptionType, PickupType, Route, Stop, StopTime, Trip};

/// All tables of one feed.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub stops: Vec<Stop>,
    pub routes: HashMap<String, Route>,
    pub trips: HashMap<String, Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendar: ServiceCalendar,
}

impl Feed {
    /// Load a feed from a zip archive on disk.
    pub fn load(path: &Path) -> Result<Self, FeedError> {
        if !path.is_file() {
            return Err(FeedError::NotFound(path.to_path_buf()));
        }
        info!(path = %path.display(), "Reading feed archive");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a feed from any seekable zip stream.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, FeedError> {
        let mut archive = ZipArchive::new(reader)?;

        let stops = load::parse_stops(&load::read_required_table(&mut archive, "stops")?)?;
        let routes = load::parse_routes(&load::read_required_table(&mut archive, "routes")?)?;
        let trips = load::parse_trips(&load::read_required_table(&mut archive, "trips")?)?;
        let stop_times =
            load::parse_stop_times(&load::read_required_table(&mut archive, "stop_times")?)?;
        let calendars =
            load::parse_calendar(&load::read_required_table(&mut archive, "calendar")?)?;
        let exceptions = match load::read_table(&mut archive, "calendar_dates")? {
            Some(bytes) => load::parse_calendar_dates(&bytes)?,
            None => Vec::new(),
        };

        load::log_summary(stops.len(), routes.len(), trips.len(), stop_times.len());

        Ok(Self {
            stops,
            routes,
            trips,
            stop_times,
            calendar: ServiceCalendar::new(calendars, exceptions),
        })
    }

    /// The route a trip belongs to.
    pub fn route_of_trip(&self, trip_id: &str) -> Option<&Route> {
        self.trips
            .get(trip_id)
            .and_then(|trip| self.routes.get(&trip.route_id))
    }

    /// Keep only the lines whose short name is in `allow_list`.
    ///
    /// Trips of other routes and their stop times are removed as well.
    /// Returns the number of routes kept.
    pub fn retain_lines(&mut self, allow_list: &[String]) -> usize {
        let allowed: HashSet<&str> = allow_list.iter().map(|s| s.trim()).collect();

        self.routes.retain(|_, route| {
            route
                .short_name
                .as_deref()
                .is_some_and(|name| allowed.contains(name))
        });
        let routes = &self.routes;
        self.trips.retain(|_, trip| routes.contains_key(&trip.route_id));
        let trips = &self.trips;
        self.stop_times.retain(|st| trips.contains_key(&st.trip_id));

        info!(
            routes = self.routes.len(),
            trips = self.trips.len(),
            stop_times = self.stop_times.len(),
            "Applied line allow-list"
        );
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RouteType, StopId};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn archive(tables: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in tables {
            writer
                .start_file(format!("{name}.txt"), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    const STOPS: &str = "stop_id,stop_name,stop_lat,stop_lon\n1,Alpha,45.0,4.0\n2,Beta,45.1,4.1\n";
    const ROUTES: &str = "route_id,route_short_name,route_type\nM,A,1\nB,C3,3\n";
    const TRIPS: &str = "route_id,service_id,trip_id\nM,WK,T1\nB,WK,T2\n";
    const STOP_TIMES: &str = "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                              T1,08:00:00,08:00:00,1,1\n\
                              T1,08:05:00,08:05:00,2,2\n\
                              T2,08:10:00,08:10:00,1,1\n";
    const CALENDAR: &str = "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                            WK,1,1,1,1,1,0,0,20240101,20241231\n";

    fn full_archive() -> Cursor<Vec<u8>> {
        archive(&[
            ("stops", STOPS),
            ("routes", ROUTES),
            ("trips", TRIPS),
            ("stop_times", STOP_TIMES),
            ("calendar", CALENDAR),
        ])
    }

    #[test]
    fn load_from_archive() {
        let feed = Feed::from_reader(full_archive()).unwrap();

        assert_eq!(feed.stops.len(), 2);
        assert_eq!(feed.routes.len(), 2);
        assert_eq!(feed.trips.len(), 2);
        assert_eq!(feed.stop_times.len(), 3);
        assert_eq!(feed.calendar.len(), 1);
        assert_eq!(feed.stops[0].stop_id, StopId::parse("1").unwrap());
        assert_eq!(feed.route_of_trip("T1").unwrap().route_type, RouteType::Metro);
        assert!(feed.route_of_trip("nope").is_none());
    }

    #[test]
    fn calendar_dates_optional() {
        let feed = Feed::from_reader(full_archive()).unwrap();
        assert!(!feed.calendar.is_empty());
    }

    #[test]
    fn missing_required_table() {
        let cursor = archive(&[("stops", STOPS), ("routes", ROUTES)]);
        let err = Feed::from_reader(cursor).unwrap_err();
        assert!(matches!(err, FeedError::MissingTable("trips")));
    }

    #[test]
    fn missing_file() {
        let err = Feed::load(Path::new("/definitely/not/here.zip")).unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        std::fs::write(&path, full_archive().into_inner()).unwrap();

        let feed = Feed::load(&path).unwrap();
        assert_eq!(feed.stop_times.len(), 3);
    }

    #[test]
    fn retain_lines_filters_trips_and_stop_times() {
        let mut feed = Feed::from_reader(full_archive()).unwrap();

        let kept = feed.retain_lines(&["C3".to_string()]);

        assert_eq!(kept, 1);
        assert!(feed.routes.contains_key("B"));
        assert_eq!(feed.trips.len(), 1);
        assert!(feed.trips.contains_key("T2"));
        assert_eq!(feed.stop_times.len(), 1);
        // Stops are left alone; only the timetable is filtered
        assert_eq!(feed.stops.len(), 2);
    }
}
