//! Selecting the stop times of one date and window.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::ServiceWindow;
use crate::config::CompilerConfig;
use crate::domain::FeedTime;
use crate::feed::{Feed, PickupType, StopTime};

/// Error from window resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// No service runs on the date (nor on the previous date, when checked)
    #[error("no active service on {date}")]
    NoActiveService { date: NaiveDate },
}

/// The stop times selected for one date and window.
#[derive(Debug, Clone)]
pub struct ResolvedWindow<'a> {
    /// Selected rows, in feed order.
    pub stop_times: Vec<&'a StopTime>,

    /// The window that was applied (standard or extended encoding).
    pub window: ServiceWindow,

    /// Service ids considered active.
    pub services: BTreeSet<String>,

    /// Rows dropped because their arrival time did not parse.
    pub malformed_rows: usize,

    /// Trips removed by the deep-night metro rule.
    pub deep_night_trips: usize,
}

impl ResolvedWindow<'_> {
    /// True if no stop time survived filtering.
    pub fn is_empty(&self) -> bool {
        self.stop_times.is_empty()
    }
}

/// Resolves active services and filters a feed's stop times to a window.
pub struct ServiceWindowResolver<'a> {
    feed: &'a Feed,
    config: &'a CompilerConfig,
}

impl<'a> ServiceWindowResolver<'a> {
    pub fn new(feed: &'a Feed, config: &'a CompilerConfig) -> Self {
        Self { feed, config }
    }

    /// Service ids active on `date`, plus those of the previous date when
    /// the window starts before the configured cutoff hour.
    pub fn active_services(&self, date: NaiveDate, start_hour: f64) -> BTreeSet<String> {
        let mut services = self.feed.calendar.active_services(date);

        if start_hour < self.config.prior_day_cutoff_hour {
            if let Some(previous) = date.pred_opt() {
                let before = services.len();
                services.extend(self.feed.calendar.active_services(previous));
                debug!(
                    %previous,
                    added = services.len() - before,
                    "Included previous day's services"
                );
            }
        }

        services
    }

    /// Select the stop times for `date` between `start_hour` and `end_hour`.
    ///
    /// Fails only if no service runs. An empty selection is a valid result.
    pub fn resolve(
        &self,
        date: NaiveDate,
        start_hour: f64,
        end_hour: f64,
    ) -> Result<ResolvedWindow<'a>, WindowError> {
        let feed: &'a Feed = self.feed;
        let services = self.active_services(date, start_hour);
        if services.is_empty() {
            return Err(WindowError::NoActiveService { date });
        }

        // Rows of running trips that passengers can board, with parsed times
        let mut malformed_rows = 0usize;
        let candidates: Vec<(&'a StopTime, FeedTime)> = feed
            .stop_times
            .iter()
            .filter(|st| st.pickup_type != PickupType::NoPickup)
            .filter(|st| {
                feed.trips
                    .get(&st.trip_id)
                    .is_some_and(|trip| services.contains(&trip.service_id))
            })
            .filter_map(|st| match FeedTime::parse(&st.arrival_time) {
                Ok(time) => Some((st, time)),
                Err(e) => {
                    malformed_rows += 1;
                    debug!(
                        trip_id = %st.trip_id,
                        value = %st.arrival_time,
                        error = %e,
                        "Dropping stop time with malformed arrival"
                    );
                    None
                }
            })
            .collect();

        let standard = ServiceWindow::from_hours(start_hour, end_hour);
        let extended = standard.to_extended();
        let standard_hits = candidates.iter().filter(|(_, t)| standard.contains(*t)).count();
        let extended_hits = candidates.iter().filter(|(_, t)| extended.contains(*t)).count();
        let window = if extended_hits > standard_hits {
            extended
        } else {
            standard
        };
        debug!(standard_hits, extended_hits, %window, "Chose window encoding");

        let mut stop_times: Vec<&'a StopTime> = candidates
            .into_iter()
            .filter(|(_, t)| window.contains(*t))
            .map(|(st, _)| st)
            .collect();

        let mut deep_night_trips = 0;
        let (night_start, night_end) = self.config.deep_night_seconds();
        if window.lies_within(night_start, night_end) {
            let metro_trips: HashSet<&'a str> = stop_times
                .iter()
                .copied()
                .filter(|st| {
                    feed.route_of_trip(&st.trip_id)
                        .is_some_and(|route| route.route_type.is_underground_rail())
                })
                .map(|st| st.trip_id.as_str())
                .collect();
            deep_night_trips = metro_trips.len();
            if !metro_trips.is_empty() {
                stop_times.retain(|st| !metro_trips.contains(st.trip_id.as_str()));
                info!(trips = deep_night_trips, "Dropped metro trips in deep-night window");
            }
        }

        info!(
            %date,
            %window,
            services = services.len(),
            stop_times = stop_times.len(),
            malformed_rows,
            "Resolved service window"
        );

        Ok(ResolvedWindow {
            stop_times,
            window,
            services,
            malformed_rows,
            deep_night_trips,
        })
    }
}
