//! Survey variable catalogue for debt and asset components.
//!
//! Each entry pairs the exact-amount column with its interval-code twin (when
//! the questionnaire offers one). Downstream code never hard-codes survey
//! column names; it iterates these lists.

/// One survey amount, optionally paired with an interval-coded fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSpec {
    pub exact: String,
    pub interval: Option<String>,
}

impl VarSpec {
    fn exact(exact: &str) -> Self {
        Self {
            exact: exact.to_string(),
            interval: None,
        }
    }

    fn pair(exact: &str, interval: &str) -> Self {
        Self {
            exact: exact.to_string(),
            interval: Some(interval.to_string()),
        }
    }

    /// `c2064_{i}` / `c2064it_{i}` for `i in 1..=count`.
    fn indexed(exact: &str, interval: &str, count: usize) -> Vec<Self> {
        (1..=count)
            .map(|i| Self::pair(&format!("{exact}_{i}"), &format!("{interval}_{i}")))
            .collect()
    }

    /// Column name after exact/interval coalescing.
    pub fn coalesced_name(&self) -> String {
        format!("{}_val", self.exact)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.exact.as_str()).chain(self.interval.as_deref())
    }
}

/// All household liabilities: business, housing, shops, vehicles, durables,
/// financial, education, medical and other loans.
pub fn debt_vars() -> Vec<VarSpec> {
    let mut v = vec![VarSpec::exact("b3005b_2"), VarSpec::pair("b3031a_2", "b3031ait_2")];
    v.extend(VarSpec::indexed("c2064", "c2064it", 6));
    v.extend(VarSpec::indexed("c3002a", "c3002ait", 6));
    v.extend([
        VarSpec::pair("c2023e", "c2023eit"),
        VarSpec::pair("c3017ca", "c3017cait"),
        VarSpec::pair("c3019c", "c3019cit"),
        VarSpec::pair("c3019e", "c3019eit"),
        VarSpec::pair("c7060", "c7060it"),
        VarSpec::pair("c7061", "c7061it"),
        VarSpec::pair("c8007", "c8007it"),
        VarSpec::exact("d3116b"),
        VarSpec::pair("d9108", "d9108it"),
        VarSpec::pair("e1006", "e1006it"),
        VarSpec::pair("e1022", "e1022it"),
        VarSpec::pair("e4003", "e4003it"),
        VarSpec::pair("e3003c", "e3003cit"),
    ]);
    v
}

/// All household assets, non-financial then financial.
pub fn asset_vars() -> Vec<VarSpec> {
    let mut v = vec![VarSpec::pair("b2003d", "b2003dit")];
    v.extend(VarSpec::indexed("c2016", "c2016it", 6));
    v.extend([
        VarSpec::pair("c2023d", "c2023dit"),
        VarSpec::pair("c3019a", "c3019ait"),
        VarSpec::pair("c7052b", "c7052bit"),
        VarSpec::exact("c7059"),
        VarSpec::exact("c7058"),
        VarSpec::exact("c8002"),
        VarSpec::exact("c8005"),
        VarSpec::pair("d1105", "d1105it"),
        VarSpec::pair("d2104", "d2104it"),
        VarSpec::pair("d3103", "d3103it"),
        VarSpec::pair("d3109", "d3109it"),
        VarSpec::pair("d3116", "d3116it"),
        VarSpec::pair("d5107", "d5107it"),
        VarSpec::pair("d7106h", "d7106hit"),
        VarSpec::pair("d7110a", "d7110ait"),
    ]);
    v.extend(VarSpec::indexed("d4103", "d4103it", 5));
    v.extend([
        VarSpec::pair("d6100a", "d6100ait"),
        VarSpec::pair("d8104", "d8104it"),
        VarSpec::pair("d9103", "d9103it"),
        VarSpec::pair("d9110a", "d9110ait"),
        VarSpec::pair("k1101", "k1101it"),
        VarSpec::pair("k2102c", "k2102cit"),
    ]);
    v
}

/// Vehicles used in the business are reported both as vehicle and business
/// assets; this value is subtracted once from total assets.
pub fn vehicle_in_business() -> VarSpec {
    VarSpec::pair("c7062", "c7062it")
}

/// Individual-extract codes for the household head.
pub mod head {
    /// Respondent/head flag (1 = head).
    pub const FLAG: &str = "a2001";
    pub const BIRTH_YEAR: &str = "a2005";
    pub const OLDER_SIBLINGS: &str = "a2028";
    pub const YOUNGER_SIBLINGS: &str = "a2029";

    /// Raw code → merged name.
    pub const RENAMES: [(&str, &str); 4] = [
        ("a2003", "head_sex"),
        ("a2012", "head_educ"),
        ("a2024", "head_marital"),
        ("a2025b", "head_health"),
    ];
}

/// Household-extract codes used by the controls.
pub mod household {
    pub const ID: &str = "hhid";
    /// Owns a business (1 = yes).
    pub const HAS_BUSINESS: &str = "b2000b";
    /// Number of houses owned.
    pub const NUM_HOUSES: &str = "c2002";
}
