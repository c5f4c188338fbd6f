use serde::{Deserialize, Serialize};

use crate::{
    gtfs::Error,
    shared::time::{ServiceDate, Time},
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsStop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsRoute {
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
}

impl GtfsRoute {
    /// The short name (a bus number), or the long name for services that
    /// have none, such as trains named after their terminals.
    pub fn line_name(&self) -> &str {
        [&self.route_short_name, &self.route_long_name]
            .into_iter()
            .flatten()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .unwrap_or(&self.route_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsTrip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsCalendar {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    pub start_date: String,
    pub end_date: String,
}

impl GtfsCalendar {
    /// Weekday flags starting from Monday.
    pub fn weekdays(&self) -> [bool; 7] {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
        .map(|flag| flag == 1)
    }

    pub fn start(&self) -> Result<ServiceDate, Error> {
        parse_date(&self.start_date)
    }

    pub fn end(&self) -> Result<ServiceDate, Error> {
        parse_date(&self.end_date)
    }
}

fn parse_date(value: &str) -> Result<ServiceDate, Error> {
    ServiceDate::parse(value).ok_or_else(|| Error::InvalidDate(value.to_string()))
}

fn parse_time(value: &str) -> Result<Time, Error> {
    Time::from_hms(value).ok_or_else(|| Error::InvalidTime(value.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsStopTime {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: String,
}

impl GtfsStopTime {
    pub fn arrival(&self) -> Result<Time, Error> {
        parse_time(&self.arrival_time)
    }

    pub fn departure(&self) -> Result<Time, Error> {
        parse_time(&self.departure_time)
    }

    pub fn sequence(&self) -> Result<u32, Error> {
        self.stop_sequence
            .parse()
            .map_err(|_| Error::InvalidSequence(self.stop_sequence.clone()))
    }
}
