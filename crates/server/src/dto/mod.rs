mod itinerary;
mod stop;

pub use itinerary::*;
pub use stop::*;
