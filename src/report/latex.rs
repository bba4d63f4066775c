//! Combined regression table (LaTeX and CSV) and a plain LaTeX table writer.
//!
//! One column per model. Rows are the union of the models' regressors in
//! first-seen order, then `const`. A model without a term gets an empty
//! cell, never a zero.

use crate::domain::{INTERCEPT, ModelResult};

/// Significance stars: `***` p < 0.01, `**` p < 0.05, `*` p < 0.10.
pub fn stars(p: Option<f64>) -> &'static str {
    match p {
        Some(p) if p < 0.01 => "***",
        Some(p) if p < 0.05 => "**",
        Some(p) if p < 0.10 => "*",
        _ => "",
    }
}

fn fmt4(v: Option<f64>) -> String {
    v.filter(|x| x.is_finite()).map(|x| format!("{x:.4}")).unwrap_or_default()
}

/// Escape the LaTeX special characters `\ & % $ # _ { } ~ ^`.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Coefficient and standard-error cells of one term row.
#[derive(Debug, Clone, PartialEq)]
pub struct TermRow {
    pub term: String,
    pub estimates: Vec<String>,
    pub std_errors: Vec<String>,
}

/// Model-aligned regression table, rendered by `to_latex` / `to_csv_rows`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTable {
    pub models: Vec<String>,
    pub dependents: Vec<String>,
    pub rows: Vec<TermRow>,
    /// `(label, one cell per model)`.
    pub footer: Vec<(String, Vec<String>)>,
}

impl RegressionTable {
    pub fn build(results: &[ModelResult]) -> RegressionTable {
        let mut terms: Vec<&str> = Vec::new();
        for r in results {
            for reg in &r.spec.regressors {
                if !terms.contains(&reg.as_str()) {
                    terms.push(reg.as_str());
                }
            }
        }
        terms.push(INTERCEPT);

        let rows = terms
            .iter()
            .map(|term| {
                let (estimates, std_errors): (Vec<String>, Vec<String>) = results
                    .iter()
                    .map(|r| match r.coefficient(term) {
                        Some(c) => (
                            format!("{}{}", fmt4(Some(c.estimate)), stars(c.p_value)),
                            c.std_error
                                .filter(|s| s.is_finite())
                                .map(|s| format!("({s:.4})"))
                                .unwrap_or_default(),
                        ),
                        None => (String::new(), String::new()),
                    })
                    .unzip();
                TermRow {
                    term: term.to_string(),
                    estimates,
                    std_errors,
                }
            })
            .collect();

        let footer = vec![
            ("N".to_string(), results.iter().map(|r| r.stats.n_obs.to_string()).collect()),
            ("R2".to_string(), results.iter().map(|r| fmt4(Some(r.stats.r_squared))).collect()),
            ("Adj. R2".to_string(), results.iter().map(|r| fmt4(r.stats.adj_r_squared)).collect()),
            ("SE".to_string(), results.iter().map(|r| r.spec.se.label().to_string()).collect()),
        ];

        RegressionTable {
            models: results.iter().map(|r| r.spec.id.clone()).collect(),
            dependents: results.iter().map(|r| r.spec.dependent.clone()).collect(),
            rows,
            footer,
        }
    }

    pub fn to_latex(&self, caption: &str, label: &str, note: &str) -> String {
        if self.models.is_empty() {
            return "% No results to display.\n".to_string();
        }
        let n = self.models.len();
        let row = |first: &str, cells: &[String], end: &str| {
            let mut parts = vec![first.to_string()];
            parts.extend(cells.iter().cloned());
            format!("{} {end}", parts.join(" & "))
        };

        let mut lines = vec![
            r"\begin{table}[htbp]".to_string(),
            r"\centering".to_string(),
            r"\small".to_string(),
            format!("\\caption{{{caption}}}"),
            format!("\\label{{{label}}}"),
            format!("\\begin{{tabular}}{{l{}}}", "c".repeat(n)),
            r"\hline\hline".to_string(),
            row("", &self.models.iter().map(|m| escape(m)).collect::<Vec<_>>(), r"\\"),
            row(
                "Dep. Variable",
                &self.dependents.iter().map(|d| escape(d)).collect::<Vec<_>>(),
                r"\\",
            ),
            r"\hline".to_string(),
        ];
        for r in &self.rows {
            lines.push(row(&escape(&r.term), &r.estimates, r"\\"));
            lines.push(row("", &r.std_errors, r"\\[3pt]"));
        }
        lines.push(r"\hline".to_string());
        for (label, cells) in &self.footer {
            let label = match label.as_str() {
                "R2" => "$R^2$",
                "Adj. R2" => "Adj. $R^2$",
                other => other,
            };
            lines.push(row(label, cells, r"\\"));
        }
        lines.push(r"\hline\hline".to_string());
        if !note.is_empty() {
            lines.push(format!("\\multicolumn{{{}}}{{l}}{{\\footnotesize {note}}} \\\\", n + 1));
        }
        lines.push(format!(
            "\\multicolumn{{{}}}{{l}}{{\\footnotesize $^{{***}}p<0.01$; $^{{**}}p<0.05$; $^{{*}}p<0.10$}} \\\\",
            n + 1
        ));
        lines.push(r"\end{tabular}".to_string());
        lines.push(r"\end{table}".to_string());
        lines.join("\n") + "\n"
    }

    /// Header and rows for the CSV rendering: each term takes two rows
    /// (estimate, then standard error under an empty label).
    pub fn to_csv_rows(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let mut header = vec!["term".to_string()];
        header.extend(self.models.iter().cloned());

        let labelled = |label: &str, cells: &[String]| {
            let mut v = vec![label.to_string()];
            v.extend(cells.iter().cloned());
            v
        };
        let mut rows = vec![labelled("dependent", &self.dependents)];
        for r in &self.rows {
            rows.push(labelled(&r.term, &r.estimates));
            rows.push(labelled("", &r.std_errors));
        }
        for (label, cells) in &self.footer {
            rows.push(labelled(label, cells));
        }
        (header, rows)
    }
}

/// Plain LaTeX table: first column left-aligned, the rest
/// right-aligned, headers and string cells escaped.
pub fn simple_table(caption: &str, label: &str, header: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = vec![
        r"\begin{table}[htbp]".to_string(),
        r"\centering".to_string(),
        r"\small".to_string(),
        format!("\\caption{{{caption}}}"),
        format!("\\label{{{label}}}"),
        format!("\\begin{{tabular}}{{l{}}}", "r".repeat(header.len().saturating_sub(1))),
        r"\hline\hline".to_string(),
        format!("{} \\\\", header.iter().map(|h| escape(h)).collect::<Vec<_>>().join(" & ")),
        r"\hline".to_string(),
    ];
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape(c)).collect();
        lines.push(format!("{} \\\\", cells.join(" & ")));
    }
    lines.push(r"\hline\hline".to_string());
    lines.push(r"\end{tabular}".to_string());
    lines.push(r"\end{table}".to_string());
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coefficient, EstimatorKind, FitStats, ModelSpec, SePolicy};

    fn result(id: &str, regressors: &[&str], p: f64) -> ModelResult {
        let mut coefficients: Vec<Coefficient> = regressors
            .iter()
            .map(|r| Coefficient {
                term: r.to_string(),
                estimate: 0.25,
                std_error: Some(0.1),
                t_value: Some(2.5),
                p_value: Some(p),
            })
            .collect();
        coefficients.push(Coefficient {
            term: INTERCEPT.to_string(),
            estimate: 1.0,
            std_error: Some(0.5),
            t_value: Some(2.0),
            p_value: Some(0.5),
        });
        ModelResult {
            spec: ModelSpec {
                id: id.into(),
                label: id.into(),
                estimator: EstimatorKind::Ols,
                dependent: "debt_ratio_winsorized".into(),
                regressors: regressors.iter().map(|s| s.to_string()).collect(),
                se: SePolicy::Hc1,
                standardize: false,
            },
            coefficients,
            stats: FitStats {
                n_obs: 100,
                r_squared: 0.1234,
                adj_r_squared: Some(0.1),
                aic: None,
                bic: None,
                alpha: None,
            },
        }
    }

    #[test]
    fn disjoint_regressors_leave_blank_cells() {
        let table = RegressionTable::build(&[result("A", &["x"], 0.001), result("B", &["z"], 0.2)]);
        let terms: Vec<&str> = table.rows.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["x", "z", "const"]);
        assert_eq!(table.rows[0].estimates, vec!["0.2500***".to_string(), String::new()]);
        assert_eq!(table.rows[0].std_errors, vec!["(0.1000)".to_string(), String::new()]);
        assert_eq!(table.rows[1].estimates, vec![String::new(), "0.2500".to_string()]);
        assert!(!table.to_latex("c", "l", "").contains("0.0000"));
    }

    #[test]
    fn star_thresholds() {
        assert_eq!(stars(Some(0.009)), "***");
        assert_eq!(stars(Some(0.01)), "**");
        assert_eq!(stars(Some(0.07)), "*");
        assert_eq!(stars(Some(0.10)), "");
        assert_eq!(stars(None), "");
    }

    #[test]
    fn latex_has_footer_and_escaped_names() {
        let tex = RegressionTable::build(&[result("M1", &["head_siblings"], 0.03)])
            .to_latex("Results", "tab:regression", "Standard errors in parentheses.");
        assert!(tex.starts_with(r"\begin{table}[htbp]"));
        assert!(tex.contains(r"head\_siblings & 0.2500** \\"));
        assert!(tex.contains(r"& (0.1000) \\[3pt]"));
        assert!(tex.contains(r"N & 100 \\"));
        assert!(tex.contains(r"$R^2$ & 0.1234 \\"));
        assert!(tex.contains(r"SE & HC1 \\"));
        assert!(tex.contains(r"$^{***}p<0.01$"));
        assert!(tex.trim_end().ends_with(r"\end{table}"));
    }

    #[test]
    fn escape_covers_latex_specials() {
        assert_eq!(escape("a_b"), r"a\_b");
        assert_eq!(escape("50% & #1 $x$ {y}"), r"50\% \& \#1 \$x\$ \{y\}");
        assert_eq!(escape(r"a~b^c\d"), r"a\textasciitilde{}b\textasciicircum{}c\textbackslash{}d");
    }

    #[test]
    fn special_characters_in_terms_and_models_are_escaped() {
        let tex = RegressionTable::build(&[result("M&1", &["share_%"], 0.5)])
            .to_latex("Results", "tab:regression", "");
        assert!(tex.contains(r"share\_\% & 0.2500 \\"));
        assert!(tex.contains(r" & M\&1 \\"));
    }

    #[test]
    fn csv_rows_pair_estimates_with_standard_errors() {
        let (header, rows) = RegressionTable::build(&[result("M1", &["x"], 0.5)]).to_csv_rows();
        assert_eq!(header, vec!["term", "M1"]);
        assert_eq!(rows[1], vec!["x", "0.2500"]);
        assert_eq!(rows[2], vec!["", "(0.1000)"]);
        assert_eq!(rows.last().unwrap(), &vec!["SE".to_string(), "HC1".to_string()]);
    }
}
