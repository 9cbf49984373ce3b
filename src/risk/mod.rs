//! Fixed risk thresholds on miss distance and diameter.

mod category;

pub use category::{
    RiskCategory, CLOSE_DISTANCE_AU, HAZARD_DIAMETER_KM, HAZARD_DISTANCE_AU, MEDIUM_DISTANCE_AU,
};
