//! Trunk schema translation
//!
//! Sansay reports trunk statistics under several spellings depending on the
//! table. Rows from the real-time table use camelCase slot names, while the
//! windowed ingress/egress tables use `1h_call_attempt` style names. Both are
//! normalised into one fixed [`Trunk`] record.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::collector::{Field, Row};

/// Canonical trunk slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrunkField {
    TrunkId,
    Alias,
    Fqdn,
    NumOrig,
    NumTerm,
    Cps,
    NumPeak,
    TotalClz,
    NumClzCps,
    TotalLimit,
    CpsLimit,
    FifteenCallsAttempt,
    FifteenCallsAnswer,
    FifteenCallsFail,
    HourCallsAttempt,
    HourCallsAnswer,
    HourCallsFail,
    DayCallsAttempt,
    DayCallsAnswer,
    DayCallsFail,
    FifteenDuration,
    HourDuration,
    DayDuration,
    FifteenPdd,
    HourPdd,
    DayPdd,
    Direction,
}

/// Number of canonical slots
pub const TRUNK_FIELD_COUNT: usize = 27;

impl TrunkField {
    /// Every slot, in record order
    pub const ALL: [TrunkField; TRUNK_FIELD_COUNT] = [
        TrunkField::TrunkId,
        TrunkField::Alias,
        TrunkField::Fqdn,
        TrunkField::NumOrig,
        TrunkField::NumTerm,
        TrunkField::Cps,
        TrunkField::NumPeak,
        TrunkField::TotalClz,
        TrunkField::NumClzCps,
        TrunkField::TotalLimit,
        TrunkField::CpsLimit,
        TrunkField::FifteenCallsAttempt,
        TrunkField::FifteenCallsAnswer,
        TrunkField::FifteenCallsFail,
        TrunkField::HourCallsAttempt,
        TrunkField::HourCallsAnswer,
        TrunkField::HourCallsFail,
        TrunkField::DayCallsAttempt,
        TrunkField::DayCallsAnswer,
        TrunkField::DayCallsFail,
        TrunkField::FifteenDuration,
        TrunkField::HourDuration,
        TrunkField::DayDuration,
        TrunkField::FifteenPdd,
        TrunkField::HourPdd,
        TrunkField::DayPdd,
        TrunkField::Direction,
    ];

    /// Canonical slot name; metric names are derived from it
    pub fn name(&self) -> &'static str {
        match self {
            TrunkField::TrunkId => "TrunkId",
            TrunkField::Alias => "Alias",
            TrunkField::Fqdn => "Fqdn",
            TrunkField::NumOrig => "NumOrig",
            TrunkField::NumTerm => "NumTerm",
            TrunkField::Cps => "Cps",
            TrunkField::NumPeak => "NumPeak",
            TrunkField::TotalClz => "TotalCLZ",
            TrunkField::NumClzCps => "NumCLZCps",
            TrunkField::TotalLimit => "TotalLimit",
            TrunkField::CpsLimit => "CpsLimit",
            TrunkField::FifteenCallsAttempt => "Fifteen_Calls_Attempt",
            TrunkField::FifteenCallsAnswer => "Fifteen_Calls_Answer",
            TrunkField::FifteenCallsFail => "Fifteen_Calls_Fail",
            TrunkField::HourCallsAttempt => "Hour_Calls_Attempt",
            TrunkField::HourCallsAnswer => "Hour_Calls_Answer",
            TrunkField::HourCallsFail => "Hour_Calls_Fail",
            TrunkField::DayCallsAttempt => "Day_Calls_Attempt",
            TrunkField::DayCallsAnswer => "Day_Calls_Answer",
            TrunkField::DayCallsFail => "Day_Calls_Fail",
            TrunkField::FifteenDuration => "Fifteen_Duration",
            TrunkField::HourDuration => "Hour_Duration",
            TrunkField::DayDuration => "Day_Duration",
            TrunkField::FifteenPdd => "Fifteen_PDD",
            TrunkField::HourPdd => "Hour_PDD",
            TrunkField::DayPdd => "Day_PDD",
            TrunkField::Direction => "Direction",
        }
    }

    /// Look up a slot by its canonical name
    pub fn from_name(name: &str) -> Option<TrunkField> {
        SLOT_INDEX.get(name).copied()
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TrunkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static SLOT_INDEX: Lazy<HashMap<&'static str, TrunkField>> =
    Lazy::new(|| TrunkField::ALL.iter().map(|f| (f.name(), *f)).collect());

/// Windowed statistic names and the slots they land in
pub const RENAME_TABLE: [(&str, TrunkField); 15] = [
    ("1st15mins_call_attempt", TrunkField::FifteenCallsAttempt),
    ("1st15mins_call_answer", TrunkField::FifteenCallsAnswer),
    ("1st15mins_call_fail", TrunkField::FifteenCallsFail),
    ("1h_call_attempt", TrunkField::HourCallsAttempt),
    ("1h_call_answer", TrunkField::HourCallsAnswer),
    ("1h_call_fail", TrunkField::HourCallsFail),
    ("24h_call_attempt", TrunkField::DayCallsAttempt),
    ("24h_call_answer", TrunkField::DayCallsAnswer),
    ("24h_call_fail", TrunkField::DayCallsFail),
    ("1st15mins_call_durationSec", TrunkField::FifteenDuration),
    ("1h_call_durationSec", TrunkField::HourDuration),
    ("24h_call_durationSec", TrunkField::DayDuration),
    ("1st15mins_pdd_ms", TrunkField::FifteenPdd),
    ("1h_pdd_ms", TrunkField::HourPdd),
    ("24h_pdd_ms", TrunkField::DayPdd),
];

/// Slots emitted for aggregate rows of the real-time table
pub const REALTIME_FIELDS: [TrunkField; 8] = [
    TrunkField::NumOrig,
    TrunkField::NumTerm,
    TrunkField::Cps,
    TrunkField::NumPeak,
    TrunkField::TotalClz,
    TrunkField::NumClzCps,
    TrunkField::TotalLimit,
    TrunkField::CpsLimit,
];

/// Slots emitted for ingress/egress rows, in rename-table order
pub const RESOURCE_FIELDS: [TrunkField; 15] = {
    let mut fields = [TrunkField::TrunkId; 15];
    let mut i = 0;
    while i < RENAME_TABLE.len() {
        fields[i] = RENAME_TABLE[i].1;
        i += 1;
    }
    fields
};

/// `system_stat` fields that are state strings, not numbers
pub const EXCLUDED_SYSTEM_FIELDS: [&str; 2] = ["ha_pre_state", "ha_current_state"];

/// Fqdn value of aggregate trunk group rows
pub const GROUP_FQDN: &str = "Group";

static RENAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    RENAME_TABLE
        .iter()
        .map(|(raw, field)| (*raw, field.name()))
        .collect()
});

/// Uppercase the first character
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Canonical name of a raw ingress/egress field
///
/// `trunk_id` is special-cased to `trunkId`, windowed names go through the
/// rename table and everything else keeps its spelling. The result is then
/// capitalised.
pub fn canonical_name(raw: &str) -> String {
    let name = if raw == "trunk_id" { "trunkId" } else { raw };
    let name = RENAMES.get(name).copied().unwrap_or(name);
    capitalize_first(name)
}

/// Traffic direction of a windowed statistics table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ingress => "ingress",
            Direction::Egress => "egress",
        }
    }
}

/// Interpretation of a dump table, selected by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Flat device-wide counters
    SystemStat,
    /// `XBResourceRealTimeStatList`
    RealtimeTrunks,
    /// `ingress_stat` / `gw_egress_stat`
    Trunks(Direction),
    /// Anything else
    Ignored,
}

impl TableKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "system_stat" => TableKind::SystemStat,
            "XBResourceRealTimeStatList" => TableKind::RealtimeTrunks,
            "ingress_stat" => TableKind::Trunks(Direction::Ingress),
            "gw_egress_stat" => TableKind::Trunks(Direction::Egress),
            _ => TableKind::Ignored,
        }
    }
}

/// Canonical trunk record, built fresh for every row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trunk {
    slots: [String; TRUNK_FIELD_COUNT],
}

impl Trunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: TrunkField) -> &str {
        &self.slots[field.index()]
    }

    pub fn set(&mut self, field: TrunkField, value: impl Into<String>) {
        self.slots[field.index()] = value.into();
    }

    /// Assign by canonical name; unknown names are dropped
    ///
    /// Returns whether a slot was written.
    pub fn assign(&mut self, name: &str, value: &str) -> bool {
        match TrunkField::from_name(name) {
            Some(field) => {
                self.set(field, value);
                true
            }
            None => false,
        }
    }

    pub fn trunk_id(&self) -> &str {
        self.get(TrunkField::TrunkId)
    }

    pub fn alias(&self) -> &str {
        self.get(TrunkField::Alias)
    }

    pub fn direction(&self) -> &str {
        self.get(TrunkField::Direction)
    }

    /// Aggregate trunk group row, as opposed to per-node detail
    pub fn is_group(&self) -> bool {
        self.get(TrunkField::Fqdn) == GROUP_FQDN
    }
}

/// Translate a row of the real-time table
pub fn translate_realtime_row(row: &Row) -> Trunk {
    let mut trunk = Trunk::new();
    for Field { name, value } in &row.fields {
        trunk.assign(&capitalize_first(name), value);
    }
    trunk
}

/// Translate a row of an ingress/egress table
pub fn translate_trunk_row(row: &Row, direction: Direction) -> Trunk {
    let mut trunk = Trunk::new();
    trunk.set(TrunkField::Direction, direction.as_str());
    for Field { name, value } in &row.fields {
        trunk.assign(&canonical_name(name), value);
    }
    trunk
}
