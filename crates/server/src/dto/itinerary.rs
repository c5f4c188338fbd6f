use serde::{Deserialize, Serialize};
use transitnav::raptor::{self, Endpoint, Itinerary, Leg, LegKind, LegStop, SearchOutcome};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoutingDto {
    WalkDirectly { distance_m: f64, duration_s: u32 },
    OriginNotServed,
    DestinationNotServed,
    NoJourney,
    Found {
        date: String,
        next_day: bool,
        itineraries: Vec<ItineraryDto>,
    },
}

impl RoutingDto {
    /// `all` returns one itinerary per transfer count instead of only the earliest.
    pub fn from(outcome: SearchOutcome<'_>, all: bool) -> Result<Self, raptor::Error> {
        Ok(match outcome {
            SearchOutcome::WalkDirectly { distance, duration } => Self::WalkDirectly {
                distance_m: distance.as_meters(),
                duration_s: duration.as_seconds(),
            },
            SearchOutcome::LocationNotServed(Endpoint::Origin) => Self::OriginNotServed,
            SearchOutcome::LocationNotServed(Endpoint::Destination) => Self::DestinationNotServed,
            SearchOutcome::NoJourney => Self::NoJourney,
            SearchOutcome::Found(result) => {
                let itineraries = if all {
                    result.journeys()?
                } else {
                    vec![result.best()?]
                };
                Self::Found {
                    date: result.departure().date.to_string(),
                    next_day: result.is_next_day(),
                    itineraries: itineraries.iter().map(ItineraryDto::from).collect(),
                }
            }
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItineraryDto {
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub transfers: usize,
    pub legs: Vec<LegDto>,
}

impl ItineraryDto {
    pub fn from(itinerary: &Itinerary) -> Self {
        Self {
            departure_time: itinerary.departure_time().map(|time| time.to_hms_string()),
            arrival_time: itinerary.arrival_time().map(|time| time.to_hms_string()),
            transfers: itinerary.transfers(),
            legs: itinerary.legs.iter().map(LegDto::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeDto {
    Transit,
    Walk,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegDto {
    pub from: String,
    pub to: String,
    pub name: String,
    pub mode: ModeDto,
    pub departure_time: String,
    pub arrival_time: String,
    pub stops: Vec<LegStopDto>,
}

impl LegDto {
    pub fn from(leg: &Leg) -> Self {
        Self {
            from: leg.from_name.to_string(),
            to: leg.to_name.to_string(),
            name: leg.name.to_string(),
            mode: match leg.kind {
                LegKind::Trip(_) => ModeDto::Transit,
                LegKind::Walking => ModeDto::Walk,
            },
            departure_time: leg.departure_time.to_hms_string(),
            arrival_time: leg.arrival_time.to_hms_string(),
            stops: leg.stops.iter().map(LegStopDto::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegStopDto {
    pub name: String,
    pub arrival_time: String,
    pub departure_time: String,
}

impl LegStopDto {
    pub fn from(stop: &LegStop) -> Self {
        Self {
            name: stop.name.to_string(),
            arrival_time: stop.arrival_time.to_hms_string(),
            departure_time: stop.departure_time.to_hms_string(),
        }
    }
}
