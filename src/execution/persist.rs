//! CSV snapshot of the last dispatched arm trajectory.
//!
//! Layout: `time_from_start,<j>_pos,<j>_vel[,<j>_acc],...` then one row per
//! waypoint. Timestamps carry 20 significant digits, everything else 5.

use crate::core::model::{ConfigurationTrajectory, TrajectoryPoint};
use crate::error::PersistenceError;
use nalgebra::DVector;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TRAJECTORY_FILE: &str = "trajectory.csv";
pub const TIME_PRECISION: usize = 20;
pub const VALUE_PRECISION: usize = 5;

/// Location of the snapshot inside a trajectory directory.
pub fn trajectory_file(dir: &Path) -> PathBuf {
    dir.join(TRAJECTORY_FILE)
}

/// Overwrites `path` with `trajectory`, creating parent directories.
pub fn write(path: &Path, trajectory: &ConfigurationTrajectory) -> Result<(), PersistenceError> {
    let text = to_csv_string(trajectory)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    tracing::debug!(path = %path.display(), points = trajectory.len(), "trajectory saved");
    Ok(())
}

pub fn to_csv_string(trajectory: &ConfigurationTrajectory) -> Result<String, PersistenceError> {
    if trajectory.is_empty() {
        return Err(PersistenceError::EmptyTrajectory);
    }
    let with_acc = trajectory.has_accelerations();

    let mut header = vec!["time_from_start".to_string()];
    for joint in trajectory.joint_names() {
        header.push(format!("{joint}_pos"));
        header.push(format!("{joint}_vel"));
        if with_acc {
            header.push(format!("{joint}_acc"));
        }
    }

    let mut out = header.join(",");
    out.push('\n');
    for point in trajectory.points() {
        let mut fields = vec![format_significant(
            point.time_from_start.as_secs_f64(),
            TIME_PRECISION,
        )];
        for j in 0..trajectory.joint_count() {
            fields.push(format_significant(point.positions[j], VALUE_PRECISION));
            fields.push(format_significant(component(point.velocities.as_ref(), j), VALUE_PRECISION));
            if with_acc {
                fields.push(format_significant(
                    component(point.accelerations.as_ref(), j),
                    VALUE_PRECISION,
                ));
            }
        }
        let _ = writeln!(out, "{}", fields.join(","));
    }
    Ok(out)
}

fn component(values: Option<&DVector<f64>>, index: usize) -> f64 {
    values.map_or(0.0, |v| v[index])
}

/// Reads a snapshot back. Joint names come from the `_pos` header columns.
pub fn read(path: &Path, group: &str) -> Result<ConfigurationTrajectory, PersistenceError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text, group)
}

pub fn parse(text: &str, group: &str) -> Result<ConfigurationTrajectory, PersistenceError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Err(PersistenceError::EmptyTrajectory);
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    if columns.first() != Some(&"time_from_start") {
        return Err(PersistenceError::Parse {
            line: 1,
            message: "header must start with time_from_start".into(),
        });
    }
    let joints: Vec<String> = columns
        .iter()
        .filter_map(|c| c.strip_suffix("_pos"))
        .map(str::to_string)
        .collect();
    let with_acc = columns.iter().any(|c| c.ends_with("_acc"));
    let stride = if with_acc { 3 } else { 2 };
    if joints.is_empty() || columns.len() != 1 + stride * joints.len() {
        return Err(PersistenceError::Parse {
            line: 1,
            message: format!("unexpected column count {}", columns.len()),
        });
    }

    let mut trajectory = ConfigurationTrajectory::new(group, joints.clone());
    for (index, line) in lines {
        let line_no = index + 1;
        let values = line
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().map_err(|e| PersistenceError::Parse {
                    line: line_no,
                    message: format!("{field:?}: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if values.len() != columns.len() {
            return Err(PersistenceError::Parse {
                line: line_no,
                message: format!("expected {} values, got {}", columns.len(), values.len()),
            });
        }
        let time = Duration::try_from_secs_f64(values[0]).map_err(|e| PersistenceError::Parse {
            line: line_no,
            message: e.to_string(),
        })?;
        let column = |offset: usize| {
            DVector::from_iterator(
                joints.len(),
                (0..joints.len()).map(|j| values[1 + j * stride + offset]),
            )
        };
        let point = TrajectoryPoint {
            positions: column(0),
            velocities: Some(column(1)),
            accelerations: with_acc.then(|| column(2)),
            time_from_start: time,
        };
        trajectory
            .push_point(point)
            .map_err(|e| PersistenceError::Parse {
                line: line_no,
                message: e.to_string(),
            })?;
    }
    if trajectory.is_empty() {
        return Err(PersistenceError::EmptyTrajectory);
    }
    Ok(trajectory)
}

/// `%g`-style rendering with `digits` significant digits and no trailing zeros.
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let max_exponent = i32::try_from(digits).unwrap_or(i32::MAX);

    if exponent < -4 || exponent >= max_exponent {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = usize::try_from(max_exponent - 1 - exponent).unwrap_or(0);
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
