use crate::aggregate::{self, AggregateOpts, ClassifiedAlert, Report};
use crate::classify;
use crate::config::{ClassifierConfig, ReportConfig};
use crate::error::ReportError;
use crate::ingest::{self, Table};
use crate::normalize::normalize;
use crate::record::AlertRecord;
use tracing::{debug, info, warn};

/// Attach a signature and, when the record carries incident fields, its
/// classification flags.
pub fn prepare_alerts(records: &[AlertRecord], cfg: &ClassifierConfig) -> Vec<ClassifiedAlert> {
    let mut unmapped_ack = 0usize;
    let mut undated = 0usize;
    let alerts: Vec<ClassifiedAlert> = records
        .iter()
        .map(|r| {
            let (created_on, eta_breach, business) = match &r.incident {
                Some(inc) => {
                    if !classify::eta_breach(&inc.ack_status).1 {
                        unmapped_ack += 1;
                    }
                    if inc.created_on.is_none() {
                        undated += 1;
                    }
                    let c = classify::classify(inc, cfg);
                    (inc.created_on, Some(c.eta_breach), Some(c.business))
                }
                None => (None, None, None),
            };
            ClassifiedAlert {
                line: r.line,
                source: r.source.clone(),
                application: r.application.clone(),
                category: r.category.clone(),
                descriptor: r.descriptor.clone(),
                signature: normalize(&r.descriptor),
                created_on,
                eta_breach,
                business,
            }
        })
        .collect();
    if unmapped_ack > 0 {
        warn!(count = unmapped_ack, "unrecognized ackMetStatus codes treated as ETA breach");
    }
    if undated > 0 {
        warn!(count = undated, "alerts without createdOn counted as Non-Business");
    }
    alerts
}

/// Run the whole batch: schema check, record building, normalization,
/// classification and aggregation. Any error aborts with no partial report.
pub fn build_report(table: &Table, cfg: &ReportConfig) -> Result<Report, ReportError> {
    cfg.validate()?;
    ingest::check_schema(table, cfg)?;
    let records = ingest::to_records(table, cfg)?;
    debug!(records = records.len(), descriptor = cfg.descriptor.column(), "built records");

    let alerts = prepare_alerts(&records, &cfg.classifier);
    let opts = AggregateOpts { variant: cfg.variant, top_n: cfg.top_n };
    let report = aggregate::aggregate(&alerts, &opts);
    info!(
        alerts = report.total_alerts,
        issue_groups = report.issue_groups.len(),
        categories = report.category_summary.len(),
        "report built"
    );
    Ok(report)
}
