//! Shared enums for Episodic Platform requests

use std::fmt;

use crate::params::ParamValue;

/// The three Platform APIs. Each has its own URL segment and may use its
/// own connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Api {
    Query,
    Write,
    Analytics,
}

impl Api {
    pub fn as_str(&self) -> &'static str {
        match self {
            Api::Query => "query",
            Api::Write => "write",
            Api::Analytics => "analytics",
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Period covered by an analytics report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    Today,
    LastSeven,
    #[default]
    LastThirty,
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::LastSeven => "last_seven",
            DateRange::LastThirty => "last_thirty",
        }
    }
}

/// Whether report rows are per day or one total for the period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateGrouping {
    #[default]
    Daily,
    Aggregate,
}

impl DateGrouping {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateGrouping::Daily => "daily",
            DateGrouping::Aggregate => "aggregate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Csv,
    Xml,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Xml => "xml",
        }
    }
}

impl From<DateRange> for ParamValue {
    fn from(v: DateRange) -> Self {
        ParamValue::Text(v.as_str().to_string())
    }
}

impl From<DateGrouping> for ParamValue {
    fn from(v: DateGrouping) -> Self {
        ParamValue::Text(v.as_str().to_string())
    }
}

impl From<ReportFormat> for ParamValue {
    fn from(v: ReportFormat) -> Self {
        ParamValue::Text(v.as_str().to_string())
    }
}
