use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use chrono::NaiveTime;

/// A `HH:MM:SS` value from stop_times.txt. GTFS lets the hour go past 23 for service running
/// after midnight on the same service day, so this can't be a `NaiveTime` directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScheduleTime {
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl ScheduleTime {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Result<Self> {
        if minutes > 59 || seconds > 59 {
            bail!("{hours}:{minutes}:{seconds} isn't a valid time");
        }
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn hours(self) -> u32 {
        self.hours
    }

    /// True for the post-midnight continuation of a service day (hour 24 and above).
    pub fn is_past_midnight(self) -> bool {
        self.hours >= 24
    }

    /// None when the hour is past midnight.
    pub fn wall_clock(self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hours, self.minutes, self.seconds)
    }
}

impl FromStr for ScheduleTime {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        if parts.len() != 3 {
            bail!("{raw:?} isn't HH:MM:SS");
        }
        let mut values = [0; 3];
        for (value, part) in values.iter_mut().zip(parts) {
            *value = part
                .parse::<u32>()
                .map_err(|err| anyhow!("{raw:?} isn't HH:MM:SS: {err}"))?;
        }
        Self::new(values[0], values[1], values[2])
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Whole minutes between leaving one stop and reaching the next, floor-divided from the seconds
/// delta. Zero and negative deltas are returned as computed. None if either time is past
/// midnight; those hops don't produce a connection.
pub fn travel_minutes(departure: ScheduleTime, arrival: ScheduleTime) -> Option<i64> {
    let departure = departure.wall_clock()?;
    let arrival = arrival.wall_clock()?;
    let seconds = arrival.signed_duration_since(departure).num_seconds();
    Some(seconds.div_euclid(60))
}
