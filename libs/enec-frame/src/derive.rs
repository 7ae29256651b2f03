//! Derived electrical quantities
//!
//! The digest carries raw counter values; real units come out of a
//! handful of fixed scale factors and two ratios. Ratios with a zero
//! divisor have no defined value, which the types carry as `None`
//! instead of infinity or NaN.

use crate::fields::RawFieldSet;

/// Scale from the raw DC current counter to amperes
pub const DC_CURRENT_SCALE: f64 = 0.025;

/// Scale from the raw efficiency counter to percent
pub const EFFICIENCY_SCALE: f64 = 0.1;

/// Quantities computed from one [`RawFieldSet`]
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFieldSet {
    /// Lifetime production in kilowatt hours
    pub life_kwh: f64,
    /// Lifetime production in watt hours
    pub life_wh: f64,
    /// DC current in amperes
    pub dccurrent: f64,
    /// DC voltage, undefined when the DC current is zero
    pub dcvolt: Option<f64>,
    /// Conversion efficiency in percent
    pub efficiency: f64,
    /// AC power in watts
    pub acpower: f64,
    /// AC current, undefined when the AC voltage is zero
    pub accurrent: Option<f64>,
}

/// Compute every derived quantity from the raw channels
pub fn derive(raw: &RawFieldSet) -> DerivedFieldSet {
    let dccurrent = DC_CURRENT_SCALE * raw.dccurrent_raw;
    let efficiency = EFFICIENCY_SCALE * raw.efficiency_raw;
    let acpower = raw.dcpower * efficiency / 100.0;
    DerivedFieldSet {
        life_kwh: raw.kwh + 0.001 * raw.wh,
        life_wh: 1000.0 * raw.kwh + raw.wh,
        dccurrent,
        dcvolt: ratio(raw.dcpower, dccurrent),
        efficiency,
        acpower,
        accurrent: ratio(acpower, raw.acvolt),
    }
}

// A zero divisor means the quantity does not exist for this frame.
fn ratio(numerator: f64, divisor: f64) -> Option<f64> {
    if divisor == 0.0 {
        None
    } else {
        Some(numerator / divisor)
    }
}
