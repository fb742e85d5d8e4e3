use alertscope::classify::BusinessFlag;
use alertscope::config::{ClassifierConfig, ReportConfig, Variant};
use alertscope::ingest;
use alertscope::{build_report, ReportError};

const ALERTS_CSV: &str = "\
ipAddress,title,kpiName,category,applicationName,ackMetStatus,createdOn,environment,latestUpdCategory
10.0.0.1,CPU usage 95% on node3,cpu,Performance,Billing,Y,2024-05-06 10:00:00,PROD,NONE
10.0.0.1,CPU usage 87% on node9,cpu,Performance,Billing,N,2024-05-06 02:00:00,PROD,NONE
10.0.0.1,CPU usage 91% on node4,cpu,Performance,Billing,y,2024-05-06 12:00:00,DR-EAST,NONE
10.0.0.2,Disk 80% full on host42,disk,Storage,Payments,P,2024-05-07 08:30:00,PROD,SUPPRESSED BY CR
10.0.0.2,Disk 95% full on host17,disk,Storage,Payments,X,2024-05-07 22:59:00,PROD,
";

fn table() -> ingest::Table {
    ingest::read_csv(ALERTS_CSV.as_bytes()).unwrap()
}

#[test]
fn end_to_end_extended_report() {
    let report = build_report(&table(), &ReportConfig::default()).unwrap();
    assert_eq!(report.total_alerts, 5);
    assert_eq!(report.issue_groups.len(), 2);
    assert_eq!(report.issue_groups[0].repeat_count, 3);
    assert_eq!(report.issue_groups[0].example, "CPU usage 95% on node3");

    let impact = report.impact.as_ref().unwrap();
    // Y -> No; N, X and the unknown P -> Yes
    assert_eq!(impact.eta_summary[0].count, 3);
    assert_eq!(impact.eta_summary[1].count, 2);

    let flags: Vec<BusinessFlag> = report.alerts.iter().map(|a| a.business.unwrap()).collect();
    assert_eq!(
        flags,
        vec![
            BusinessFlag::Business,
            BusinessFlag::NonBusiness,
            BusinessFlag::NonBusiness,
            BusinessFlag::NonBusiness,
            BusinessFlag::Business,
        ]
    );
    assert_eq!(impact.business_totals.business, 2);
}

#[test]
fn kpi_descriptor_groups_on_kpi_names() {
    let cfg = ReportConfig { descriptor: alertscope::DescriptorField::KpiName, ..Default::default() };
    let report = build_report(&table(), &cfg).unwrap();
    assert_eq!(report.issue_groups.len(), 2);
    assert_eq!(report.issue_groups[0].example, "cpu");
    assert_eq!(report.issue_groups[0].signature, "cpu");
}

#[test]
fn basic_report_ignores_incident_columns() {
    let csv = "ipAddress,title,category,applicationName\nh1,Job 12 failed,Batch,ETL\nh1,Job 13 failed,Batch,ETL\n";
    let table = ingest::read_csv(csv.as_bytes()).unwrap();
    let cfg = ReportConfig { variant: Variant::Basic, ..Default::default() };
    let report = build_report(&table, &cfg).unwrap();
    assert!(report.impact.is_none());
    assert_eq!(report.issue_groups[0].repeat_count, 2);
    assert_eq!(report.category_summary[0].total_issues, 2);
}

#[test]
fn schema_errors_abort_before_aggregation() {
    let table = ingest::read_csv("ipAddress,title\n1,x\n".as_bytes()).unwrap();
    let err = build_report(&table, &ReportConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::MissingColumns(ref cols) if cols.len() == 6));
    assert!(err.to_string().starts_with("missing columns: category, applicationName"));
}

#[test]
fn bad_timestamp_aborts_the_run() {
    let csv = ALERTS_CSV.replace("2024-05-07 22:59:00", "31/31/2024");
    let table = ingest::read_csv(csv.as_bytes()).unwrap();
    let err = build_report(&table, &ReportConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::InvalidTimestamp { row: 6, .. }));
}

#[test]
fn blank_created_on_is_non_business_and_left_out_of_trend() {
    let csv = ALERTS_CSV.replace("2024-05-07 22:59:00", "");
    let table = ingest::read_csv(csv.as_bytes()).unwrap();
    let report = build_report(&table, &ReportConfig::default()).unwrap();
    assert_eq!(report.total_alerts, 5);
    assert_eq!(report.alerts[4].business, Some(BusinessFlag::NonBusiness));
    assert!(report.alerts[4].created_on.is_none());

    let impact = report.impact.as_ref().unwrap();
    // X on the undated row is still a breach
    assert_eq!(impact.eta_summary[0].count, 3);
    assert_eq!(impact.business_totals.business, 1);
    let trend: Vec<(String, usize)> = impact
        .daily_breach_trend
        .iter()
        .map(|d| (d.date.to_string(), d.breached_count))
        .collect();
    assert_eq!(trend, vec![("2024-05-06".to_string(), 1), ("2024-05-07".to_string(), 1)]);
}

#[test]
fn excel_workbook_builds_a_report() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/alerts.xlsx");
    let table = ingest::load_table(&path, None).unwrap();
    let report = build_report(&table, &ReportConfig::default()).unwrap();
    assert_eq!(report.total_alerts, 4);
    assert_eq!(report.issue_groups.len(), 2);
    assert!(report.issue_groups.iter().all(|g| g.repeat_count == 2));

    let flags: Vec<BusinessFlag> = report.alerts.iter().map(|a| a.business.unwrap()).collect();
    assert_eq!(
        flags,
        vec![BusinessFlag::Business, BusinessFlag::NonBusiness, BusinessFlag::NonBusiness, BusinessFlag::Business]
    );
    let impact = report.impact.as_ref().unwrap();
    assert_eq!((impact.eta_summary[0].count, impact.eta_summary[1].count), (3, 1));
    assert_eq!(impact.daily_breach_trend.len(), 2);
}

#[test]
fn invalid_business_window_is_rejected() {
    let cfg = ReportConfig {
        classifier: ClassifierConfig { business_start_hour: 23, business_end_hour: 7, ..Default::default() },
        ..Default::default()
    };
    assert!(matches!(build_report(&table(), &cfg), Err(ReportError::Config(_))));
}

#[test]
fn config_file_fills_defaults() {
    let cfg = ReportConfig::from_json_str(r#"{"descriptor":"kpi_name","classifier":{"excluded_environments":["STANDBY"]}}"#).unwrap();
    assert_eq!(cfg.descriptor, alertscope::DescriptorField::KpiName);
    assert_eq!(cfg.variant, Variant::Extended);
    assert_eq!(cfg.top_n, 10);
    assert_eq!(cfg.classifier.business_start_hour, 7);
    assert_eq!(cfg.classifier.excluded_environments, vec!["STANDBY".to_string()]);
    assert!(ReportConfig::from_json_str(r#"{"classifier":{"business_end_hour":30}}"#).is_err());
}
