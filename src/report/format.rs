//! Number, date and markup formatting shared by the HTML report and the charts.

const SECS_PER_DAY: u64 = 86_400;

/// Tick layout for a linear axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisTicks {
    pub start: f64,
    pub step: f64,
    pub count: usize,
}

impl AxisTicks {
    /// Roughly `target` ticks on a 1/2/5 step grid covering `[min, max]`.
    pub fn covering(min: f64, max: f64, target: usize) -> Self {
        let span = (max - min).abs().max(1e-9);
        let step = nice_step(span / (target.max(2) - 1) as f64);
        let start = (min / step).floor() * step;
        let end = (max / step).ceil() * step;
        let count = ((end - start) / step).round() as usize + 1;
        Self { start, step, count }
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(move |i| self.start + self.step * i as f64)
    }

    pub fn last(&self) -> f64 {
        self.start + self.step * self.count.saturating_sub(1) as f64
    }
}

/// Smallest 1, 2 or 5 times a power of ten that is at least `raw`.
fn nice_step(raw: f64) -> f64 {
    let mag = 10f64.powi(raw.log10().floor() as i32);
    [1.0, 2.0, 5.0]
        .into_iter()
        .map(|m| m * mag)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * mag)
}

/// Count axis ceiling: the last tick at or above `max`.
pub fn nice_max(max: f64, target: usize) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    AxisTicks::covering(0.0, max, target).last()
}

pub fn fmt_tick(v: f64) -> String {
    if (v - v.round()).abs() < 0.001 {
        format!("{}", v.round() as i64)
    } else if v.abs() < 10.0 {
        format!("{:.2}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// `1234567` -> `1,234,567`.
pub fn fmt_int(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Seconds since the Unix epoch as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn fmt_timestamp(ts: u64) -> String {
    let mut days = ts / SECS_PER_DAY;
    let secs = ts % SECS_PER_DAY;

    let mut year = 1970;
    loop {
        let in_year = if is_leap(year) { 366 } else { 365 };
        if days < in_year {
            break;
        }
        days -= in_year;
        year += 1;
    }
    let february = if is_leap(year) { 29 } else { 28 };
    let month_lengths = [31, february, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 1;
    for len in month_lengths {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year,
        month,
        days + 1,
        secs / 3_600,
        secs % 3_600 / 60,
        secs % 60
    )
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
