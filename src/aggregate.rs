use crate::classify::{BusinessFlag, Classification, EtaBreach};
use crate::config::Variant;
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const GRAND_TOTAL: &str = "Grand Total";

/// A record after normalization and (for extended reports) classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedAlert {
    pub line: usize,
    pub source: String,
    pub application: String,
    pub category: String,
    pub descriptor: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_breach: Option<EtaBreach>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessFlag>,
}

impl ClassifiedAlert {
    pub fn classification(&self) -> Option<Classification> {
        match (self.eta_breach, self.business) {
            (Some(eta_breach), Some(business)) => Some(Classification { eta_breach, business }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueGroup {
    pub source: String,
    pub application: String,
    pub category: String,
    /// Descriptor of the first record seen for this group, verbatim.
    pub example: String,
    pub repeat_count: usize,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessFlag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub total_issues: usize,
    pub unique_alerts: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusinessCounts {
    #[serde(rename = "Business")]
    pub business: usize,
    #[serde(rename = "Non-Business")]
    pub non_business: usize,
}

impl BusinessCounts {
    pub fn add(&mut self, flag: BusinessFlag, n: usize) {
        match flag {
            BusinessFlag::Business => self.business += n,
            BusinessFlag::NonBusiness => self.non_business += n,
        }
    }

    pub fn get(&self, flag: BusinessFlag) -> usize {
        match flag {
            BusinessFlag::Business => self.business,
            BusinessFlag::NonBusiness => self.non_business,
        }
    }

    pub fn total(&self) -> usize {
        self.business + self.non_business
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBusiness {
    pub category: String,
    #[serde(flatten)]
    pub counts: BusinessCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EtaCount {
    #[serde(rename = "ETA_Breach")]
    pub eta_breach: EtaBreach,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EtaBusiness {
    #[serde(rename = "ETA_Breach")]
    pub eta_breach: EtaBreach,
    #[serde(flatten)]
    pub counts: BusinessCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyBreach {
    pub date: NaiveDate,
    pub breached_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    pub application: String,
    /// One cell per entry of `AppCategoryMatrix::categories`.
    pub counts: Vec<usize>,
    pub total: usize,
}

/// Repeat counts by application (rows) and category (columns).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppCategoryMatrix {
    pub categories: Vec<String>,
    pub rows: Vec<MatrixRow>,
    pub grand_total: MatrixRow,
}

impl AppCategoryMatrix {
    pub fn cell(&self, application: &str, category: &str) -> Option<usize> {
        let col = self.categories.iter().position(|c| c == category)?;
        let row = if application == GRAND_TOTAL {
            &self.grand_total
        } else {
            self.rows.iter().find(|r| r.application == application)?
        };
        row.counts.get(col).copied()
    }
}

/// Per-application subset the renderer iterates over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSlice {
    pub application: String,
    pub issues: Vec<IssueGroup>,
    pub top_issues: Vec<IssueGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessCounts>,
}

/// Tables that need classified alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessImpact {
    pub business_issue_groups: Vec<IssueGroup>,
    pub business_totals: BusinessCounts,
    pub category_business: Vec<CategoryBusiness>,
    pub eta_summary: Vec<EtaCount>,
    pub eta_business: Vec<EtaBusiness>,
    pub daily_breach_trend: Vec<DailyBreach>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub variant: Variant,
    pub total_alerts: usize,
    pub issue_groups: Vec<IssueGroup>,
    pub category_summary: Vec<CategorySummary>,
    pub app_category_matrix: AppCategoryMatrix,
    pub applications: Vec<ApplicationSlice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<BusinessImpact>,
    pub alerts: Vec<ClassifiedAlert>,
}

#[derive(Debug, Clone)]
pub struct AggregateOpts {
    pub variant: Variant,
    pub top_n: usize,
}

impl Default for AggregateOpts {
    fn default() -> Self {
        Self { variant: Variant::Extended, top_n: 10 }
    }
}

pub fn aggregate(alerts: &[ClassifiedAlert], opts: &AggregateOpts) -> Report {
    let discovered = group_issues(alerts, false);
    let category_summary = summarize_categories(&discovered);
    let app_category_matrix = app_category_matrix(&discovered);
    let issue_groups = sort_by_repeat_count(discovered);

    let impact = match opts.variant {
        Variant::Basic => None,
        Variant::Extended => Some(business_impact(alerts)),
    };
    let applications = application_slices(alerts, &issue_groups, opts);

    tracing::debug!(
        alerts = alerts.len(),
        issue_groups = issue_groups.len(),
        categories = category_summary.len(),
        applications = applications.len(),
        "aggregated alerts"
    );

    Report {
        variant: opts.variant,
        total_alerts: alerts.len(),
        issue_groups,
        category_summary,
        app_category_matrix,
        applications,
        impact,
        alerts: alerts.to_vec(),
    }
}

type IssueKey<'a> = (&'a str, &'a str, &'a str, &'a str, Option<BusinessFlag>);

/// Group alerts in discovery order. With `by_business` the business flag
/// joins the key.
pub fn group_issues(alerts: &[ClassifiedAlert], by_business: bool) -> Vec<IssueGroup> {
    let mut groups: IndexMap<IssueKey<'_>, IssueGroup> = IndexMap::new();
    for a in alerts {
        let business = if by_business { a.business } else { None };
        let key = (a.source.as_str(), a.application.as_str(), a.category.as_str(), a.signature.as_str(), business);
        groups
            .entry(key)
            .and_modify(|g| {
                g.repeat_count += 1;
                // example is the first non-blank descriptor
                if g.example.trim().is_empty() {
                    g.example = a.descriptor.clone();
                }
            })
            .or_insert_with(|| IssueGroup {
                source: a.source.clone(),
                application: a.application.clone(),
                category: a.category.clone(),
                example: a.descriptor.clone(),
                repeat_count: 1,
                signature: a.signature.clone(),
                business,
            });
    }
    groups.into_values().collect()
}

/// Stable: equal counts keep discovery order.
pub fn sort_by_repeat_count(mut groups: Vec<IssueGroup>) -> Vec<IssueGroup> {
    groups.sort_by(|a, b| b.repeat_count.cmp(&a.repeat_count));
    groups
}

pub fn summarize_categories(groups: &[IssueGroup]) -> Vec<CategorySummary> {
    let mut by_category: IndexMap<&str, Vec<&IssueGroup>> = IndexMap::new();
    for g in groups {
        by_category.entry(g.category.as_str()).or_default().push(g);
    }
    let mut out: Vec<CategorySummary> = by_category
        .into_iter()
        .map(|(category, gs)| CategorySummary {
            category: category.to_string(),
            total_issues: gs.iter().map(|g| g.repeat_count).sum(),
            unique_alerts: gs.iter().map(|g| g.signature.as_str()).unique().count(),
        })
        .collect();
    out.sort_by(|a, b| b.total_issues.cmp(&a.total_issues));
    out
}

pub fn app_category_matrix(groups: &[IssueGroup]) -> AppCategoryMatrix {
    let categories: Vec<String> = groups.iter().map(|g| g.category.clone()).collect::<BTreeSet<_>>().into_iter().collect();
    let mut cells: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for g in groups {
        // categories is sorted and holds every group's category
        let col = categories.binary_search(&g.category).unwrap_or_default();
        cells.entry(g.application.as_str()).or_insert_with(|| vec![0; categories.len()])[col] += g.repeat_count;
    }

    let mut column_totals = vec![0usize; categories.len()];
    let rows: Vec<MatrixRow> = cells
        .into_iter()
        .map(|(application, counts)| {
            for (t, c) in column_totals.iter_mut().zip(&counts) {
                *t += c;
            }
            MatrixRow { application: application.to_string(), total: counts.iter().sum(), counts }
        })
        .collect();
    let grand_total = MatrixRow {
        application: GRAND_TOTAL.to_string(),
        total: column_totals.iter().sum(),
        counts: column_totals,
    };
    AppCategoryMatrix { categories, rows, grand_total }
}

pub fn business_impact(alerts: &[ClassifiedAlert]) -> BusinessImpact {
    let classified: Vec<(&ClassifiedAlert, Classification)> =
        alerts.iter().filter_map(|a| a.classification().map(|c| (a, c))).collect();

    let mut category_business: BTreeMap<&str, BusinessCounts> = BTreeMap::new();
    let mut eta_business: BTreeMap<EtaBreach, BusinessCounts> = EtaBreach::ALL.iter().map(|e| (*e, BusinessCounts::default())).collect();
    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for (a, c) in &classified {
        category_business.entry(a.category.as_str()).or_default().add(c.business, 1);
        eta_business.entry(c.eta_breach).or_default().add(c.business, 1);
        if c.eta_breach == EtaBreach::Yes {
            if let Some(ts) = a.created_on {
                *daily.entry(ts.date()).or_insert(0) += 1;
            }
        }
    }

    let business_issue_groups = sort_by_repeat_count(group_issues(alerts, true));
    let mut business_totals = BusinessCounts::default();
    for g in &business_issue_groups {
        if let Some(flag) = g.business {
            business_totals.add(flag, g.repeat_count);
        }
    }

    // Fixed label order: Yes before No.
    let eta_business: Vec<EtaBusiness> = EtaBreach::ALL
        .iter()
        .map(|e| EtaBusiness { eta_breach: *e, counts: eta_business.get(e).copied().unwrap_or_default() })
        .collect();
    let eta_summary = eta_business
        .iter()
        .map(|row| EtaCount { eta_breach: row.eta_breach, count: row.counts.total() })
        .collect();

    BusinessImpact {
        business_issue_groups,
        business_totals,
        category_business: category_business
            .into_iter()
            .map(|(category, counts)| CategoryBusiness { category: category.to_string(), counts })
            .collect(),
        eta_summary,
        eta_business,
        daily_breach_trend: daily
            .into_iter()
            .map(|(date, breached_count)| DailyBreach { date, breached_count })
            .collect(),
    }
}

fn application_slices(alerts: &[ClassifiedAlert], sorted_groups: &[IssueGroup], opts: &AggregateOpts) -> Vec<ApplicationSlice> {
    let mut issues: BTreeMap<&str, Vec<IssueGroup>> = BTreeMap::new();
    for g in sorted_groups {
        issues.entry(g.application.as_str()).or_default().push(g.clone());
    }
    let mut business: BTreeMap<&str, BusinessCounts> = BTreeMap::new();
    if opts.variant == Variant::Extended {
        for a in alerts {
            if let Some(flag) = a.business {
                business.entry(a.application.as_str()).or_default().add(flag, 1);
            }
        }
    }
    issues
        .into_iter()
        .map(|(application, issues)| ApplicationSlice {
            application: application.to_string(),
            top_issues: issues.iter().take(opts.top_n).cloned().collect(),
            business: match opts.variant {
                Variant::Basic => None,
                Variant::Extended => Some(business.get(application).copied().unwrap_or_default()),
            },
            issues,
        })
        .collect()
}
