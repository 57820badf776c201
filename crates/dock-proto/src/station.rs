use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bike-share dock location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub slots: i64,
}

/// How full a station is, bucketed for display.  Thresholds are on the
/// rounded fill percentage; note 91–99 deliberately falls back to `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillBand {
    BadEmpty,
    Low,
    Ok,
    High,
    BadFull,
}

impl FillBand {
    pub fn from_pct(pct: i64) -> Self {
        if pct == 0 {
            FillBand::BadEmpty
        } else if pct <= 15 {
            FillBand::Low
        } else if pct <= 75 {
            FillBand::Ok
        } else if pct <= 90 {
            FillBand::High
        } else if pct >= 100 {
            FillBand::BadFull
        } else {
            FillBand::Ok
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FillBand::BadEmpty => "empty",
            FillBand::Low => "low",
            FillBand::Ok => "ok",
            FillBand::High => "high",
            FillBand::BadFull => "full",
        }
    }
}

/// Rounded fill percentage from the latest counts.  Capacity falls back to
/// the configured slot count, then 1, so a station with no data still renders.
pub fn pct_full(free_bikes: i64, empty_slots: i64, slots: i64) -> i64 {
    let mut capacity = free_bikes + empty_slots;
    if capacity == 0 {
        capacity = slots;
    }
    if capacity == 0 {
        capacity = 1;
    }
    ((100.0 * free_bikes as f64) / capacity as f64).round() as i64
}

/// One entry of `GET /api/stations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSummary {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub slots: i64,
    pub free_bikes: i64,
    pub empty_slots: i64,
    pub pct_full: i64,
    pub status: FillBand,
}

impl StationSummary {
    pub fn from_counts(station: &Station, free_bikes: i64, empty_slots: i64) -> Self {
        let pct = pct_full(free_bikes, empty_slots, station.slots);
        Self {
            id: station.id,
            name: station.name.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            slots: station.slots,
            free_bikes,
            empty_slots,
            pct_full: pct,
            status: FillBand::from_pct(pct),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationList {
    pub stations: Vec<StationSummary>,
}

/// `GET /api/stations/:id` — same arithmetic, no band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationDetail {
    pub id: i64,
    pub name: String,
    pub slots: i64,
    pub free_bikes: i64,
    pub empty_slots: i64,
    pub pct_full: i64,
}

/// One scrape of a station's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub station_id: i64,
    pub timestamp: DateTime<Utc>,
    pub free_bikes: i64,
    pub empty_slots: i64,
}

/// One point of the trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub ts: DateTime<Utc>,
    pub free: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hour,
    Day,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResponse {
    pub granularity: Granularity,
    pub series: Vec<TrendPoint>,
}

/// One entry of `GET /api/stations/:id/comments` (REST shape, distinct from
/// the broadcast shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestComment {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestCommentList {
    pub comments: Vec<RestComment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_full_arithmetic() {
        assert_eq!(pct_full(5, 5, 10), 50);
        assert_eq!(pct_full(0, 0, 20), 0); // capacity falls back to slots
        assert_eq!(pct_full(0, 0, 0), 0); // then to 1
        assert_eq!(pct_full(1, 2, 0), 33);
    }

    #[test]
    fn test_fill_band_thresholds() {
        assert_eq!(FillBand::from_pct(0), FillBand::BadEmpty);
        assert_eq!(FillBand::from_pct(1), FillBand::Low);
        assert_eq!(FillBand::from_pct(15), FillBand::Low);
        assert_eq!(FillBand::from_pct(16), FillBand::Ok);
        assert_eq!(FillBand::from_pct(75), FillBand::Ok);
        assert_eq!(FillBand::from_pct(76), FillBand::High);
        assert_eq!(FillBand::from_pct(90), FillBand::High);
        assert_eq!(FillBand::from_pct(100), FillBand::BadFull);
        // The 91-99 gap falls through to Ok.
        assert_eq!(FillBand::from_pct(95), FillBand::Ok);
    }

    #[test]
    fn test_fill_band_wire_names() {
        assert_eq!(
            serde_json::to_value(FillBand::BadEmpty).unwrap(),
            serde_json::json!("bad_empty")
        );
        assert_eq!(
            serde_json::to_value(FillBand::BadFull).unwrap(),
            serde_json::json!("bad_full")
        );
    }

    #[test]
    fn test_summary_from_counts() {
        let station = Station {
            id: 7,
            name: "Forbes & Murray".into(),
            latitude: 40.438,
            longitude: -79.922,
            slots: 16,
        };
        let s = StationSummary::from_counts(&station, 2, 14);
        assert_eq!(s.pct_full, 13);
        assert_eq!(s.status, FillBand::Low);
    }
}
