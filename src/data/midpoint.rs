//! Interval-code → amount midpoints.
//!
//! Many financial questions let respondents answer with an interval code
//! instead of an exact amount. The tables below are transcribed from the 2017
//! codebook: closed bins map to their midpoint, and the open-ended top bin
//! ("X and above") maps to `floor × top_bin_multiplier`.
//!
//! Indexed variables such as `c2064it_3` resolve through their base name
//! (`c2064it`).

/// Bin layout for one family of interval questions.
#[derive(Debug, PartialEq)]
pub struct BinTable {
    /// `(code, midpoint)` for every closed bin.
    closed: &'static [(u32, f64)],
    /// Code of the open-ended top bin.
    top_code: u32,
    /// Lower bound of the open-ended top bin.
    top_floor: f64,
}

impl BinTable {
    /// Midpoint for an interval code; `None` for unknown or non-integral codes.
    pub fn midpoint(&self, code: f64, top_bin_multiplier: f64) -> Option<f64> {
        if !code.is_finite() || code.fract() != 0.0 || code < 0.0 {
            return None;
        }
        let code = code as u32;
        if code == self.top_code {
            return Some(self.top_floor * top_bin_multiplier);
        }
        self.closed.iter().find(|(c, _)| *c == code).map(|(_, m)| *m)
    }

    pub fn top_code(&self) -> u32 {
        self.top_code
    }
}

const T1: BinTable = BinTable {
    closed: &[
        (1, 5_000.0),
        (2, 20_000.0),
        (3, 40_000.0),
        (4, 60_000.0),
        (5, 85_000.0),
        (6, 200_000.0),
        (7, 400_000.0),
        (8, 750_000.0),
        (9, 3_000_000.0),
        (10, 7_500_000.0),
    ],
    top_code: 11,
    top_floor: 10_000_000.0,
};

const T3: BinTable = BinTable {
    closed: &[
        (1, 5_000.0),
        (2, 15_000.0),
        (3, 35_000.0),
        (4, 75_000.0),
        (5, 150_000.0),
        (6, 250_000.0),
        (7, 400_000.0),
        (8, 750_000.0),
        (9, 1_500_000.0),
        (10, 3_500_000.0),
    ],
    top_code: 11,
    top_floor: 5_000_000.0,
};

const T4: BinTable = BinTable {
    closed: &[
        (1, 2_500.0),
        (2, 7_500.0),
        (3, 15_000.0),
        (4, 35_000.0),
        (5, 75_000.0),
        (6, 125_000.0),
        (7, 175_000.0),
        (8, 250_000.0),
        (9, 400_000.0),
        (10, 750_000.0),
    ],
    top_code: 11,
    top_floor: 1_000_000.0,
};

const T5: BinTable = BinTable {
    closed: &[
        (1, 500.0),
        (2, 1_500.0),
        (3, 3_500.0),
        (4, 7_500.0),
        (5, 15_000.0),
        (6, 35_000.0),
        (7, 75_000.0),
    ],
    top_code: 8,
    top_floor: 100_000.0,
};

// Square metres.
const T6: BinTable = BinTable {
    closed: &[
        (1, 25.0),
        (2, 60.5),
        (3, 80.5),
        (4, 95.5),
        (5, 110.5),
        (6, 132.0),
        (7, 172.0),
    ],
    top_code: 8,
    top_floor: 200.0,
};

const T7: BinTable = BinTable {
    closed: &[
        (1, 50_000.0),
        (2, 200_000.0),
        (3, 400_000.0),
        (4, 600_000.0),
        (5, 850_000.0),
        (6, 1_250_000.0),
        (7, 2_250_000.0),
        (8, 4_000_000.0),
        (9, 6_000_000.0),
        (10, 8_500_000.0),
        (11, 12_500_000.0),
        (12, 17_500_000.0),
    ],
    top_code: 13,
    top_floor: 20_000_000.0,
};

const T8: BinTable = BinTable {
    closed: &[
        (1, 5_000.0),
        (2, 15_000.0),
        (3, 35_000.0),
        (4, 75_000.0),
        (5, 150_000.0),
        (6, 250_000.0),
        (7, 400_000.0),
        (8, 750_000.0),
        (9, 1_500_000.0),
        (10, 3_500_000.0),
        (11, 6_000_000.0),
        (12, 8_500_000.0),
        (13, 12_500_000.0),
        (14, 17_500_000.0),
    ],
    top_code: 15,
    top_floor: 20_000_000.0,
};

const T9: BinTable = BinTable {
    closed: &[
        (1, 5_000.0),
        (2, 20_000.0),
        (3, 40_000.0),
        (4, 60_000.0),
        (5, 85_000.0),
        (6, 200_000.0),
        (7, 400_000.0),
        (8, 750_000.0),
        (9, 3_000_000.0),
        (10, 7_500_000.0),
        (11, 12_500_000.0),
        (12, 17_500_000.0),
    ],
    top_code: 13,
    top_floor: 20_000_000.0,
};

const T10: BinTable = BinTable {
    closed: &[
        (1, 50_000.0),
        (2, 150_000.0),
        (3, 350_000.0),
        (4, 650_000.0),
        (5, 900_000.0),
        (6, 1_250_000.0),
        (7, 1_750_000.0),
        (8, 3_500_000.0),
        (9, 6_500_000.0),
        (10, 9_000_000.0),
    ],
    top_code: 11,
    top_floor: 10_000_000.0,
};

const T11: BinTable = BinTable {
    closed: &[
        (1, 500.0),
        (2, 2_000.0),
        (3, 4_000.0),
        (4, 6_500.0),
        (5, 9_000.0),
        (6, 12_500.0),
        (7, 17_500.0),
        (8, 25_000.0),
        (9, 40_000.0),
    ],
    top_code: 10,
    top_floor: 50_000.0,
};

const T12: BinTable = BinTable {
    closed: &[
        (1, 25_000.0),
        (2, 75_000.0),
        (3, 150_000.0),
        (4, 250_000.0),
        (5, 400_000.0),
        (6, 650_000.0),
        (7, 900_000.0),
        (8, 1_250_000.0),
        (9, 1_750_000.0),
        (10, 3_500_000.0),
    ],
    top_code: 11,
    top_floor: 5_000_000.0,
};

const T14: BinTable = BinTable {
    closed: &[
        (1, 1_000.0),
        (2, 3_500.0),
        (3, 7_500.0),
        (4, 15_000.0),
        (5, 35_000.0),
        (6, 75_000.0),
        (7, 125_000.0),
        (8, 175_000.0),
        (9, 250_000.0),
        (10, 400_000.0),
    ],
    top_code: 11,
    top_floor: 500_000.0,
};

const T15: BinTable = BinTable {
    closed: &[
        (1, 10_000.0),
        (2, 35_000.0),
        (3, 75_000.0),
        (4, 150_000.0),
        (5, 350_000.0),
        (6, 750_000.0),
        (7, 1_500_000.0),
        (8, 3_500_000.0),
        (9, 7_500_000.0),
        (10, 15_000_000.0),
    ],
    top_code: 11,
    top_floor: 20_000_000.0,
};

const T17: BinTable = BinTable {
    closed: &[
        (1, 25.0),
        (2, 75.0),
        (3, 125.0),
        (4, 225.0),
        (5, 400.0),
        (6, 650.0),
        (7, 1_150.0),
        (8, 2_250.0),
        (9, 4_000.0),
        (10, 7_500.0),
        (11, 15_000.0),
        (12, 25_000.0),
        (13, 40_000.0),
    ],
    top_code: 14,
    top_floor: 50_000.0,
};

// Code 4 is not used by this question.
const T18: BinTable = BinTable {
    closed: &[
        (1, 100.0),
        (2, 250.0),
        (3, 400.0),
        (5, 750.0),
        (6, 1_500.0),
        (7, 2_500.0),
        (8, 4_000.0),
        (9, 6_500.0),
        (10, 11_500.0),
        (11, 17_500.0),
    ],
    top_code: 12,
    top_floor: 20_000.0,
};

// Code 4 is not used by this question.
const T19: BinTable = BinTable {
    closed: &[
        (1, 500.0),
        (2, 2_000.0),
        (3, 4_000.0),
        (5, 7_500.0),
        (6, 15_000.0),
        (7, 35_000.0),
        (8, 75_000.0),
        (9, 125_000.0),
        (10, 175_000.0),
        (11, 250_000.0),
        (12, 400_000.0),
        (13, 750_000.0),
    ],
    top_code: 14,
    top_floor: 1_000_000.0,
};

const T20: BinTable = BinTable {
    closed: &[
        (1, 250.0),
        (2, 750.0),
        (3, 1_500.0),
        (4, 3_500.0),
        (5, 7_500.0),
        (6, 15_000.0),
    ],
    top_code: 7,
    top_floor: 20_000.0,
};

const T21: BinTable = BinTable {
    closed: &[
        (1, 250.0),
        (2, 750.0),
        (3, 2_000.0),
        (4, 4_000.0),
        (5, 7_500.0),
        (6, 15_000.0),
        (7, 35_000.0),
    ],
    top_code: 8,
    top_floor: 50_000.0,
};

const T22: BinTable = BinTable {
    closed: &[
        (1, 50.0),
        (2, 300.0),
        (3, 750.0),
        (4, 3_000.0),
        (5, 7_500.0),
        (6, 30_000.0),
    ],
    top_code: 7,
    top_floor: 50_000.0,
};

const T23: BinTable = BinTable {
    closed: &[
        (1, 150.0),
        (2, 450.0),
        (3, 800.0),
        (4, 1_250.0),
        (5, 2_250.0),
        (6, 4_500.0),
        (7, 8_000.0),
        (8, 15_000.0),
        (9, 35_000.0),
        (10, 75_000.0),
    ],
    top_code: 11,
    top_floor: 100_000.0,
};

/// Which questions share which bin layout.
static REGISTRY: &[(&[&str], &BinTable)] = &[
    (
        &[
            "b2003ait", "b2050it", "b2059it", "b2063it", "b2080it", "d3109it", "d3110it",
            "d4103it", "d5107it", "d5108it", "d6100ait", "d8104it", "d9103it", "d9110ait",
            "k2102cit", "c3019ait", "b2003bit", "b2052it",
        ],
        &T1,
    ),
    (
        &[
            "b2003eit", "b2055it", "a3136it", "d3117it", "b2046it", "b3004bit", "b3005bit",
            "b3005it", "b3006ait", "b3030dit", "b3030eit", "b3031ait", "b3045cit", "b3056ait",
            "c3017cait", "c3019cit", "c3019eit", "c7052bit", "c7060it", "c7061it", "c7062it",
            "c8007it", "d1105it", "d2104it", "d3103it", "d7106hit", "d7110ait", "e1006it",
            "e1022it", "e3003cit", "e4003it", "h2004it", "c2035ait", "c3024it", "c3025it",
            "d4111it", "d6116it", "e3005cit",
        ],
        &T3,
    ),
    (
        &[
            "b2093it", "a3136ait", "a3136bit", "a3137it", "b2110it", "d5109it", "d7106jit",
            "d7112it", "d9105it", "d9108it", "d9110bit", "k1101it", "k2208it", "f1010it",
            "f1031it",
        ],
        &T4,
    ),
    (&["b3008fit"], &T5),
    (&["c1000bbit"], &T6),
    (&["c1000bdit"], &T7),
    (&["c2000fit"], &T8),
    (&["c2013it", "c2016it"], &T9),
    (&["c2027dit", "c2032it", "c2064it"], &T10),
    (&["c2045it"], &T11),
    (&["c3002it", "c3002ait"], &T12),
    (
        &[
            "c8002ait", "g1017it", "g1018it", "g1019it", "g1019ait", "g1020it", "c8005ait",
            "f2006it", "f4011it",
        ],
        &T14,
    ),
    (&["d8106it"], &T15),
    (&["f1005it"], &T17),
    (&["f4005it"], &T18),
    (&["f4008it"], &T19),
    (&["h3351it"], &T20),
    (&["h3354it", "h3356it"], &T21),
    (&["h3367it", "h3368it", "h3369it"], &T22),
    (&["g1024it"], &T23),
];

/// Strip a trailing `_N` index: `c2016it_1` → `c2016it`.
pub fn base_name(var: &str) -> &str {
    match var.rsplit_once('_') {
        Some((base, suffix)) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => {
            base
        }
        _ => var,
    }
}

/// Bin table for an interval variable, if the codebook documents one.
pub fn table_for(var: &str) -> Option<&'static BinTable> {
    let base = base_name(var);
    REGISTRY
        .iter()
        .find(|(vars, _)| vars.contains(&base))
        .map(|(_, table)| *table)
}

/// Resolve one `(variable, code)` pair.
pub fn midpoint(var: &str, code: f64, top_bin_multiplier: f64) -> Option<f64> {
    table_for(var).and_then(|t| t.midpoint(code, top_bin_multiplier))
}
