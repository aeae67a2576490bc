//! Route vehicle type.

use std::fmt;

/// The vehicle mode of a route, from the feed's `route_type` column.
///
/// Covers the basic GTFS codes and keeps extended (Hierarchical Vehicle
/// Type) codes as-is.
///
/// # Examples
///
/// ```
/// use network_compiler::domain::RouteType;
///
/// assert_eq!(RouteType::from_code(1), RouteType::Metro);
/// assert!(RouteType::from_code(1).is_underground_rail());
/// assert!(RouteType::from_code(401).is_underground_rail());
/// assert!(!RouteType::from_code(3).is_underground_rail());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteType {
    Tram,
    Metro,
    Rail,
    Bus,
    Ferry,
    CableTram,
    AerialLift,
    Funicular,
    Trolleybus,
    Monorail,
    /// Extended or unrecognised code.
    Other(i32),
}

impl RouteType {
    /// Map a raw `route_type` value to a route type.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => RouteType::Tram,
            1 => RouteType::Metro,
            2 => RouteType::Rail,
            3 => RouteType::Bus,
            4 => RouteType::Ferry,
            5 => RouteType::CableTram,
            6 => RouteType::AerialLift,
            7 => RouteType::Funicular,
            11 => RouteType::Trolleybus,
            12 => RouteType::Monorail,
            other => RouteType::Other(other),
        }
    }

    /// The raw `route_type` value.
    pub fn code(&self) -> i32 {
        match self {
            RouteType::Tram => 0,
            RouteType::Metro => 1,
            RouteType::Rail => 2,
            RouteType::Bus => 3,
            RouteType::Ferry => 4,
            RouteType::CableTram => 5,
            RouteType::AerialLift => 6,
            RouteType::Funicular => 7,
            RouteType::Trolleybus => 11,
            RouteType::Monorail => 12,
            RouteType::Other(code) => *code,
        }
    }

    /// True for metro / underground rail.
    ///
    /// Extended codes 401 (Metro Service) and 402 (Underground Service)
    /// count; 400 (Urban Railway) does not, as it is commonly surface rail.
    pub fn is_underground_rail(&self) -> bool {
        matches!(self, RouteType::Metro | RouteType::Other(401) | RouteType::Other(402))
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteType::Tram => f.write_str("tram"),
            RouteType::Metro => f.write_str("metro"),
            RouteType::Rail => f.write_str("rail"),
            RouteType::Bus => f.write_str("bus"),
            RouteType::Ferry => f.write_str("ferry"),
            RouteType::CableTram => f.write_str("cable tram"),
            RouteType::AerialLift => f.write_str("aerial lift"),
            RouteType::Funicular => f.write_str("funicular"),
            RouteType::Trolleybus => f.write_str("trolleybus"),
            RouteType::Monorail => f.write_str("monorail"),
            RouteType::Other(code) => write!(f, "route type {code}"),
        }
    }
}
