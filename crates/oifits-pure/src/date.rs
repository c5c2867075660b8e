//! Modified Julian Day to calendar conversion.
//!
//! Uses the Meeus Gregorian-calendar algorithm. When the fractional day
//! rounds the time-of-day up to 24.0, the input is nudged forward by the
//! smallest useful step and recomputed so the output never carries an
//! invalid hour field.

use alloc::format;
use alloc::string::String;

/// Offset between Julian Day and Modified Julian Day.
pub const MJD_REFERENCE: f64 = 2_400_000.5;

/// A broken-down calendar date and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

/// Converts a Modified Julian Day to a calendar date.
pub fn mjd_to_calendar(mjd: f64) -> CalendarDate {
    let mut jd = mjd + MJD_REFERENCE;

    loop {
        let z = libm::floor(jd + 0.5);
        let f = jd + 0.5 - z;

        let a = if z < 2_299_161.0 {
            z
        } else {
            let alpha = libm::floor((z - 1_867_216.25) / 36_524.25);
            z + 1.0 + alpha - libm::floor(alpha / 4.0)
        };
        let b = a + 1524.0;
        let c = libm::floor((b - 122.1) / 365.25);
        let d = libm::floor(365.25 * c);
        let e = libm::floor((b - d) / 30.6001);

        let day = (b - d - libm::floor(30.6001 * e)) as u32;
        let month = if e < 14.0 { e - 1.0 } else { e - 13.0 } as u32;
        let year = if month > 2 { c - 4716.0 } else { c - 4715.0 } as i32;

        let timeofday = f * 24.0;
        if timeofday >= 24.0 {
            // Rounding pushed us across midnight; step past it and redo.
            jd += 1.0e-7;
            continue;
        }

        let hour = timeofday as u32;
        let minutes = (timeofday - hour as f64) * 60.0;
        let minute = minutes as u32;
        let second = ((minutes - minute as f64) * 60.0) as u32;

        return CalendarDate {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
    }
}

/// Formats a Modified Julian Day as `yyyy/mm/dd`.
pub fn mjd_to_string(mjd: f64) -> String {
    let d = mjd_to_calendar(mjd);
    format!("{:04}/{:02}/{:02}", d.year, d.month, d.day)
}

/// Formats a Modified Julian Day as `yyyy/mm/dd HH:MM:SS`.
pub fn mjd_to_string_time(mjd: f64) -> String {
    let d = mjd_to_calendar(mjd);
    format!(
        "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
        d.year, d.month, d.day, d.hour, d.minute, d.second
    )
}
