//! Per-frame metric samples
//!
//! Each telemetry frame fans out into a fixed set of named samples,
//! always in the same order. Downstream sinks key on the sample name,
//! so the names here are wire contract, not display strings.

use crate::derive::DerivedFieldSet;
use crate::fields::RawFieldSet;

/// Named metric emitted for every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Wh,
    Kwh,
    LifeWh,
    Time1,
    Time2,
    DcPower,
    DcVolt,
    DcCurrent,
    Efficiency,
    AcPower,
    AcVolt,
    AcCurrent,
    AcFreq,
}

impl Metric {
    /// Every metric, in dispatch order
    pub const ALL: [Metric; 14] = [
        Metric::Temperature,
        Metric::Wh,
        Metric::Kwh,
        Metric::LifeWh,
        Metric::Time1,
        Metric::Time2,
        Metric::DcPower,
        Metric::DcVolt,
        Metric::DcCurrent,
        Metric::Efficiency,
        Metric::AcPower,
        Metric::AcVolt,
        Metric::AcCurrent,
        Metric::AcFreq,
    ];

    /// Sample name as used in publish topics
    pub const fn name(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Wh => "wh",
            Metric::Kwh => "kwh",
            Metric::LifeWh => "lifeWh",
            Metric::Time1 => "time1",
            Metric::Time2 => "time2",
            Metric::DcPower => "dcpower",
            Metric::DcVolt => "dcvolt",
            Metric::DcCurrent => "dccurrent",
            Metric::Efficiency => "efficiency",
            Metric::AcPower => "acpower",
            Metric::AcVolt => "acvolt",
            Metric::AcCurrent => "accurrent",
            Metric::AcFreq => "acfreq",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the full sample set for one frame, in dispatch order
///
/// Samples without a defined value carry `None` and are skipped by the
/// sinks rather than published as a placeholder.
pub fn sample_set(raw: &RawFieldSet, derived: &DerivedFieldSet) -> [(Metric, Option<f64>); 14] {
    [
        (Metric::Temperature, Some(raw.temperature)),
        (Metric::Wh, Some(raw.wh)),
        (Metric::Kwh, Some(raw.kwh)),
        (Metric::LifeWh, Some(derived.life_wh)),
        (Metric::Time1, Some(raw.time1)),
        (Metric::Time2, Some(raw.time2)),
        (Metric::DcPower, Some(raw.dcpower)),
        (Metric::DcVolt, derived.dcvolt),
        (Metric::DcCurrent, Some(derived.dccurrent)),
        (Metric::Efficiency, Some(derived.efficiency)),
        (Metric::AcPower, Some(derived.acpower)),
        (Metric::AcVolt, Some(raw.acvolt)),
        (Metric::AcCurrent, derived.accurrent),
        (Metric::AcFreq, Some(raw.acfreq)),
    ]
}

/// Render a sample value for publishing, one decimal place
pub fn format_value(value: f64) -> String {
    format!("{value:.1}")
}
