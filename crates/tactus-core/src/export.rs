//! Persistence helpers: textual tracker dumps and tabular export.
//!
//! The dump is a line-oriented stream, one record per line:
//!
//! ```text
//! ht name 0-1
//! ht beta 0.000000 500.000000
//! ht corr 2 0.000000 500.000000
//! ht conf 2 1.000000
//! ```
//!
//! `corr` and `conf` lines repeat per recorded step. Numbers are
//! printed with six decimals; parsing reproduces the timelines at
//! that precision.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::Tracking;
use crate::error::{Error, Result};
use crate::tracker::HypothesisTracker;

/// Serializable snapshot of one tracker's timelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerDump {
    pub name: String,
    pub beta: (f64, f64),
    /// `(onset_index, rho, delta)` per correction.
    pub corrections: Vec<(usize, f64, f64)>,
    /// `(onset_index, score)` per confidence.
    pub confidences: Vec<(usize, f64)>,
}

impl From<&HypothesisTracker> for TrackerDump {
    fn from(tracker: &HypothesisTracker) -> Self {
        Self {
            name: tracker.name(),
            beta: (tracker.beta().rho, tracker.beta().delta),
            corrections: tracker
                .corrections()
                .iter()
                .map(|&(index, c)| (index, c.new_rho, c.new_delta))
                .collect(),
            confidences: tracker.confidences().to_vec(),
        }
    }
}

impl fmt::Display for TrackerDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ht name {}", self.name)?;
        writeln!(f, "ht beta {:.6} {:.6}", self.beta.0, self.beta.1)?;
        for &(index, rho, delta) in &self.corrections {
            writeln!(f, "ht corr {index} {rho:.6} {delta:.6}")?;
        }
        for &(index, score) in &self.confidences {
            writeln!(f, "ht conf {index} {score:.6}")?;
        }
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(
    token: Option<&str>,
    line: usize,
    what: &str,
) -> Result<T> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| Error::DumpParse {
            line,
            message: format!("expected {what}"),
        })
}

impl FromStr for TrackerDump {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut name: Option<String> = None;
        let mut beta: Option<(f64, f64)> = None;
        let mut corrections = Vec::new();
        let mut confidences = Vec::new();

        for (number, raw) in s.lines().enumerate() {
            let line = number + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let mut tokens = raw.split_whitespace();
            if tokens.next() != Some("ht") {
                return Err(Error::DumpParse {
                    line,
                    message: "expected `ht` record".into(),
                });
            }
            match tokens.next() {
                Some("name") => {
                    name = Some(parse_field::<String>(tokens.next(), line, "tracker name")?);
                }
                Some("beta") => {
                    let rho = parse_field::<f64>(tokens.next(), line, "beta rho")?;
                    let delta = parse_field::<f64>(tokens.next(), line, "beta delta")?;
                    beta = Some((rho, delta));
                }
                Some("corr") => {
                    let index = parse_field::<usize>(tokens.next(), line, "onset index")?;
                    let rho = parse_field::<f64>(tokens.next(), line, "corrected rho")?;
                    let delta = parse_field::<f64>(tokens.next(), line, "corrected delta")?;
                    corrections.push((index, rho, delta));
                }
                Some("conf") => {
                    let index = parse_field::<usize>(tokens.next(), line, "onset index")?;
                    let score = parse_field::<f64>(tokens.next(), line, "confidence")?;
                    confidences.push((index, score));
                }
                other => {
                    return Err(Error::DumpParse {
                        line,
                        message: format!("unknown record kind {other:?}"),
                    });
                }
            }
        }

        let name = name.ok_or(Error::DumpParse {
            line: 0,
            message: "missing `ht name` record".into(),
        })?;
        let beta = beta.ok_or(Error::DumpParse {
            line: 0,
            message: "missing `ht beta` record".into(),
        })?;
        Ok(Self {
            name,
            beta,
            corrections,
            confidences,
        })
    }
}

/// Writes the dump of one tracker.
pub fn write_tracker<W: Write>(tracker: &HypothesisTracker, writer: &mut W) -> Result<()> {
    write!(writer, "{}", TrackerDump::from(tracker))?;
    Ok(())
}

/// Writes a tracking result as CSV, one row per (tracker, step).
///
/// Columns: `a,b,onset_index,onset_time,score,phase,period`, where
/// phase and period describe the correction-yielded hypothesis at the
/// step.
pub fn write_csv<W: Write>(tracking: &Tracking, writer: &mut W) -> Result<()> {
    writeln!(writer, "a,b,onset_index,onset_time,score,phase,period")?;
    for tracker in tracking.trackers() {
        let (a, b) = tracker.origin();
        for (&(index, correction), &(_, score)) in
            tracker.corrections().iter().zip(tracker.confidences())
        {
            writeln!(
                writer,
                "{a},{b},{index},{:.6},{score:.6},{:.6},{:.6}",
                tracking.onset_times()[index],
                correction.new_rho,
                correction.new_delta,
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::Correction;
    use crate::hypothesis::Hypothesis;

    fn sample_tracker() -> HypothesisTracker {
        let onset_times = vec![0.0, 500.0, 1000.0, 1500.0];
        let mut ht = HypothesisTracker::new(0, 1, &onset_times).unwrap();
        ht.record_step(1, Correction::identity(&Hypothesis::new(0.0, 500.0)), 1.0);
        ht.record_step(2, Correction::identity(&Hypothesis::new(0.5, 499.25)), 0.75);
        ht
    }

    #[test]
    fn dump_format_is_line_oriented() {
        let mut out = Vec::new();
        write_tracker(&sample_tracker(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "ht name 0-1\n\
             ht beta 0.000000 500.000000\n\
             ht corr 1 0.000000 500.000000\n\
             ht corr 2 0.500000 499.250000\n\
             ht conf 1 1.000000\n\
             ht conf 2 0.750000\n"
        );
    }

    #[test]
    fn dump_round_trips() {
        let tracker = sample_tracker();
        let dump = TrackerDump::from(&tracker);
        let parsed: TrackerDump = dump.to_string().parse().unwrap();
        assert_eq!(parsed.name, "0-1");
        assert!((parsed.beta.0 - 0.0).abs() < 1e-6);
        assert!((parsed.beta.1 - 500.0).abs() < 1e-6);
        assert_eq!(parsed.corrections.len(), 2);
        assert_eq!(parsed.confidences.len(), 2);
        for (got, want) in parsed.corrections.iter().zip(&dump.corrections) {
            assert_eq!(got.0, want.0);
            assert!((got.1 - want.1).abs() < 1e-6);
            assert!((got.2 - want.2).abs() < 1e-6);
        }
        for (got, want) in parsed.confidences.iter().zip(&dump.confidences) {
            assert_eq!(got.0, want.0);
            assert!((got.1 - want.1).abs() < 1e-6);
        }
    }

    #[test]
    fn parse_rejects_foreign_records() {
        let err = "xy name 0-1\n".parse::<TrackerDump>().unwrap_err();
        assert!(matches!(err, Error::DumpParse { line: 1, .. }));
        let err = "ht nonsense 1 2\n".parse::<TrackerDump>().unwrap_err();
        assert!(matches!(err, Error::DumpParse { line: 1, .. }));
    }

    #[test]
    fn parse_rejects_malformed_numbers() {
        let text = "ht name 0-1\nht beta zero 500.0\n";
        let err = text.parse::<TrackerDump>().unwrap_err();
        assert!(matches!(err, Error::DumpParse { line: 2, .. }));
    }

    #[test]
    fn parse_requires_name_and_beta() {
        let err = "ht beta 0.0 500.0\n".parse::<TrackerDump>().unwrap_err();
        assert!(err.to_string().contains("ht name"));
        let err = "ht name 0-1\n".parse::<TrackerDump>().unwrap_err();
        assert!(err.to_string().contains("ht beta"));
    }

    #[test]
    fn csv_has_one_row_per_step() {
        let onset_times = vec![0.0, 500.0, 1000.0, 1500.0];
        let tracker = sample_tracker();
        let tracking = Tracking::from_parts(onset_times, vec![tracker]);
        let mut out = Vec::new();
        write_csv(&tracking, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "a,b,onset_index,onset_time,score,phase,period");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "0,1,1,500.000000,1.000000,0.000000,500.000000");
        assert_eq!(lines[2], "0,1,2,1000.000000,0.750000,0.500000,499.250000");
    }
}
