//! Score validation, letter grades and grade point averages on a 5-point scale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_CA_SCORE: i32 = 40;
pub const MAX_EXAM_SCORE: i32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradingError {
    #[error("CA score must be between 0 and 40, got {0}")]
    CaOutOfRange(i32),
    #[error("exam score must be between 0 and 60, got {0}")]
    ExamOutOfRange(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub fn points(&self) -> i32 {
        match self {
            Grade::A => 5,
            Grade::B => 4,
            Grade::C => 3,
            Grade::D => 2,
            Grade::E => 1,
            Grade::F => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "E" => Ok(Grade::E),
            "F" => Ok(Grade::F),
            _ => Err(format!("Unknown grade: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegreeClass {
    FirstClass,
    SecondClassUpper,
    SecondClassLower,
    ThirdClass,
    Pass,
    Fail,
}

/// Scores that passed validation, with the derived total and grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub ca_score: i32,
    pub exam_score: i32,
    pub total_score: i32,
    pub grade: Grade,
}

pub fn validate_scores(ca_score: i32, exam_score: i32) -> Result<Scored, GradingError> {
    if !(0..=MAX_CA_SCORE).contains(&ca_score) {
        return Err(GradingError::CaOutOfRange(ca_score));
    }
    if !(0..=MAX_EXAM_SCORE).contains(&exam_score) {
        return Err(GradingError::ExamOutOfRange(exam_score));
    }

    let total_score = ca_score + exam_score;
    Ok(Scored {
        ca_score,
        exam_score,
        total_score,
        grade: grade_for(total_score),
    })
}

pub fn grade_for(total: i32) -> Grade {
    match total {
        70.. => Grade::A,
        60..=69 => Grade::B,
        50..=59 => Grade::C,
        45..=49 => Grade::D,
        40..=44 => Grade::E,
        _ => Grade::F,
    }
}

/// Unit-weighted grade point average, rounded to two decimals.
/// Each entry is `(course_units, grade_points)`.
pub fn gpa(entries: &[(i32, i32)]) -> f64 {
    let total_units: i32 = entries.iter().map(|(units, _)| units).sum();
    if total_units <= 0 {
        return 0.0;
    }

    let weighted: i32 = entries.iter().map(|(units, points)| units * points).sum();
    let raw = weighted as f64 / total_units as f64;
    (raw * 100.0).round() / 100.0
}

pub fn classify(cgpa: f64) -> DegreeClass {
    if cgpa >= 4.5 {
        DegreeClass::FirstClass
    } else if cgpa >= 3.5 {
        DegreeClass::SecondClassUpper
    } else if cgpa >= 2.4 {
        DegreeClass::SecondClassLower
    } else if cgpa >= 1.5 {
        DegreeClass::ThirdClass
    } else if cgpa >= 1.0 {
        DegreeClass::Pass
    } else {
        DegreeClass::Fail
    }
}
