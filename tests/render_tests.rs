use alertscope::config::ReportConfig;
use alertscope::ingest;
use alertscope::render::{self, CsvDirRenderer, JsonRenderer, ReportRenderer, TableRenderer};
use alertscope::{build_report, Report};

const ALERTS_CSV: &str = "\
ipAddress,title,category,applicationName,ackMetStatus,createdOn,environment,latestUpdCategory
10.0.0.1,CPU usage 95% on node3,Performance,Billing/EU,Y,2024-05-06 10:00:00,PROD,NONE
10.0.0.1,CPU usage 87% on node9,Performance,Billing/EU,N,2024-05-06 02:00:00,PROD,NONE
10.0.0.2,Disk 80% full on host42,Storage,Payments,N,2024-05-07 08:30:00,PROD,NONE
";

fn report() -> Report {
    let table = ingest::read_csv(ALERTS_CSV.as_bytes()).unwrap();
    build_report(&table, &ReportConfig::default()).unwrap()
}

#[test]
fn json_output_carries_tables_and_labels() {
    let mut r = JsonRenderer::new(Vec::new());
    r.render(&report()).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&r.into_inner()).unwrap();
    assert_eq!(v["total_alerts"], 3);
    assert_eq!(v["issue_groups"][0]["repeat_count"], 2);
    assert_eq!(v["impact"]["eta_summary"][0]["ETA_Breach"], "Yes");
    assert_eq!(v["impact"]["eta_business"][0]["Non-Business"], 1);
    assert_eq!(v["impact"]["daily_breach_trend"][0]["date"], "2024-05-06");
    assert_eq!(v["app_category_matrix"]["grand_total"]["application"], "Grand Total");
    assert!(v.get("alerts").is_none());
}

#[test]
fn json_output_can_include_alert_rows() {
    let mut r = JsonRenderer::new(Vec::new()).include_alerts(true);
    r.render(&report()).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&r.into_inner()).unwrap();
    assert_eq!(v["alerts"].as_array().unwrap().len(), 3);
    assert_eq!(v["alerts"][1]["signature"], "cpu usage <num> on node<num>");
    assert_eq!(v["alerts"][1]["business"], "Non-Business");
}

#[test]
fn csv_directory_has_one_file_per_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut r = CsvDirRenderer::new(dir.path());
    r.render(&report()).unwrap();
    for name in [
        "All_Alert",
        "Category_Summary",
        "Application_Category_Matrix",
        "All_Alert_Business",
        "Category_Business",
        "ETA_Ack_Breach",
        "ETA_Business",
        "Daily_ETA_Breach",
        "ETA_Alert",
        "App_Billing_EU",
        "App_Payments",
    ] {
        assert!(dir.path().join(format!("{name}.csv")).exists(), "missing {name}.csv");
    }
    assert_eq!(r.written().len(), 11);

    let matrix = std::fs::read_to_string(dir.path().join("Application_Category_Matrix.csv")).unwrap();
    let lines: Vec<&str> = matrix.lines().collect();
    assert_eq!(lines[0], "Application Name,Performance,Storage,Grand Total");
    assert_eq!(lines[1], "Billing/EU,2,0,2");
    assert_eq!(lines[3], "Grand Total,2,1,3");
}

#[test]
fn table_output_lists_top_groups() {
    let mut r = TableRenderer::new(Vec::new(), 1);
    r.render(&report()).unwrap();
    let text = String::from_utf8(r.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("Count"));
    assert!(lines[1].starts_with("2 "));
    assert!(lines[1].ends_with("CPU usage 95% on node3"));
    assert!(text.contains("ETA breach Yes"));
}

#[test]
fn sheet_names_are_prefixed_sanitized_and_truncated() {
    assert_eq!(render::application_sheet_name("Billing"), "App_Billing");
    assert_eq!(render::application_sheet_name("a/b:c"), "App_a_b_c");
    let long = render::application_sheet_name("Customer Relationship Management Suite");
    assert_eq!(long.chars().count(), 31);
    assert_eq!(long, "App_Customer Relationship Manag");
}
