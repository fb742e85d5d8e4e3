use crate::aggregate::{IssueGroup, Report, GRAND_TOTAL};
use crate::error::ReportError;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

/// Consumer of a finished report. Implementations decide the artifact format.
pub trait ReportRenderer {
    fn render(&mut self, report: &Report) -> Result<(), ReportError>;
}

/// Whole report as one JSON document.
pub struct JsonRenderer<W: Write> {
    out: W,
    include_alerts: bool,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, include_alerts: false }
    }

    pub fn include_alerts(mut self, yes: bool) -> Self {
        self.include_alerts = yes;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportRenderer for JsonRenderer<W> {
    fn render(&mut self, report: &Report) -> Result<(), ReportError> {
        let mut v = serde_json::to_value(report)?;
        if !self.include_alerts {
            if let Value::Object(map) = &mut v {
                map.remove("alerts");
            }
        }
        serde_json::to_writer_pretty(&mut self.out, &v)?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// Top issue groups as an aligned text table.
pub struct TableRenderer<W: Write> {
    out: W,
    top: usize,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(out: W, top: usize) -> Self {
        Self { out, top }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportRenderer for TableRenderer<W> {
    fn render(&mut self, report: &Report) -> Result<(), ReportError> {
        writeln!(self.out, "{:<7} {:<16} {:<20} {:<16} {}", "Count", "Source", "Application", "Category", "Example")?;
        for g in report.issue_groups.iter().take(self.top) {
            writeln!(
                self.out,
                "{:<7} {:<16} {:<20} {:<16} {}",
                g.repeat_count, g.source, g.application, g.category, g.example
            )?;
        }
        if let Some(impact) = &report.impact {
            writeln!(self.out)?;
            for row in &impact.eta_business {
                writeln!(
                    self.out,
                    "ETA breach {:<3}  Business {:<6} Non-Business {}",
                    row.eta_breach.label(),
                    row.counts.business,
                    row.counts.non_business
                )?;
            }
        }
        Ok(())
    }
}

/// One CSV file per table, named like the spreadsheet sheets they stand in for.
pub struct CsvDirRenderer {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvDirRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), written: Vec::new() }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_table(&mut self, name: &str, header: &[&str], rows: Vec<Vec<String>>) -> Result<(), ReportError> {
        let path = self.dir.join(format!("{name}.csv"));
        let mut w = csv::Writer::from_path(&path)?;
        w.write_record(header)?;
        for row in rows {
            w.write_record(&row)?;
        }
        w.flush()?;
        self.written.push(path);
        Ok(())
    }
}

const ISSUE_HEADER: &[&str] = &["ipAddress", "applicationName", "category", "example_value", "repeat_count", "signature"];

fn issue_rows(groups: &[IssueGroup]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|g| {
            let mut row = vec![
                g.source.clone(),
                g.application.clone(),
                g.category.clone(),
                g.example.clone(),
                g.repeat_count.to_string(),
                g.signature.clone(),
            ];
            if let Some(b) = g.business {
                row.push(b.label().to_string());
            }
            row
        })
        .collect()
}

/// Sheet-style name for an application: `App_<name>`, at most 31 characters,
/// with characters spreadsheets and file systems reject replaced.
pub fn application_sheet_name(application: &str) -> String {
    format!("App_{application}")
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '[' | ']') { '_' } else { c })
        .take(31)
        .collect()
}

impl ReportRenderer for CsvDirRenderer {
    fn render(&mut self, report: &Report) -> Result<(), ReportError> {
        std::fs::create_dir_all(&self.dir)?;

        self.write_table("All_Alert", ISSUE_HEADER, issue_rows(&report.issue_groups))?;
        self.write_table(
            "Category_Summary",
            &["category", "total_issues", "unique_alerts"],
            report
                .category_summary
                .iter()
                .map(|c| vec![c.category.clone(), c.total_issues.to_string(), c.unique_alerts.to_string()])
                .collect(),
        )?;

        let m = &report.app_category_matrix;
        let mut header: Vec<&str> = vec!["Application Name"];
        header.extend(m.categories.iter().map(|c| c.as_str()));
        header.push(GRAND_TOTAL);
        let rows = m
            .rows
            .iter()
            .chain(std::iter::once(&m.grand_total))
            .map(|r| {
                let mut row = vec![r.application.clone()];
                row.extend(r.counts.iter().map(|c| c.to_string()));
                row.push(r.total.to_string());
                row
            })
            .collect();
        self.write_table("Application_Category_Matrix", &header, rows)?;

        if let Some(impact) = &report.impact {
            let mut header = ISSUE_HEADER.to_vec();
            header.push("Business");
            self.write_table("All_Alert_Business", &header, issue_rows(&impact.business_issue_groups))?;
            self.write_table(
                "Category_Business",
                &["category", "Business", "Non-Business"],
                impact
                    .category_business
                    .iter()
                    .map(|c| vec![c.category.clone(), c.counts.business.to_string(), c.counts.non_business.to_string()])
                    .collect(),
            )?;
            self.write_table(
                "ETA_Ack_Breach",
                &["ETA_Breach", "count"],
                impact.eta_summary.iter().map(|e| vec![e.eta_breach.label().to_string(), e.count.to_string()]).collect(),
            )?;
            self.write_table(
                "ETA_Business",
                &["ETA_Breach", "Business", "Non-Business"],
                impact
                    .eta_business
                    .iter()
                    .map(|e| {
                        vec![
                            e.eta_breach.label().to_string(),
                            e.counts.business.to_string(),
                            e.counts.non_business.to_string(),
                        ]
                    })
                    .collect(),
            )?;
            self.write_table(
                "Daily_ETA_Breach",
                &["createdOn", "Breached_Count"],
                impact
                    .daily_breach_trend
                    .iter()
                    .map(|d| vec![d.date.format("%Y-%m-%d").to_string(), d.breached_count.to_string()])
                    .collect(),
            )?;
            self.write_table(
                "ETA_Alert",
                &["line", "ipAddress", "applicationName", "category", "descriptor", "signature", "createdOn", "ETA_Breach", "Business"],
                report
                    .alerts
                    .iter()
                    .map(|a| {
                        vec![
                            a.line.to_string(),
                            a.source.clone(),
                            a.application.clone(),
                            a.category.clone(),
                            a.descriptor.clone(),
                            a.signature.clone(),
                            a.created_on.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_default(),
                            a.eta_breach.map(|e| e.label().to_string()).unwrap_or_default(),
                            a.business.map(|b| b.label().to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect(),
            )?;
        }

        let mut used = HashSet::new();
        for app in &report.applications {
            let base = application_sheet_name(&app.application);
            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            self.write_table(&name, ISSUE_HEADER, issue_rows(&app.issues))?;
        }
        Ok(())
    }
}
