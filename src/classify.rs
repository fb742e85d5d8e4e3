use crate::config::ClassifierConfig;
use crate::record::IncidentFields;
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an alert missed its acknowledgment ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EtaBreach {
    Yes,
    No,
}

impl EtaBreach {
    pub const ALL: [EtaBreach; 2] = [EtaBreach::Yes, EtaBreach::No];

    pub fn label(self) -> &'static str {
        match self {
            EtaBreach::Yes => "Yes",
            EtaBreach::No => "No",
        }
    }
}

impl fmt::Display for EtaBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BusinessFlag {
    Business,
    #[serde(rename = "Non-Business")]
    NonBusiness,
}

impl BusinessFlag {
    pub fn label(self) -> &'static str {
        match self {
            BusinessFlag::Business => "Business",
            BusinessFlag::NonBusiness => "Non-Business",
        }
    }
}

impl fmt::Display for BusinessFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub eta_breach: EtaBreach,
    pub business: BusinessFlag,
}

/// Map an acknowledgment status code to a breach flag.
///
/// Returns the flag and whether the code was one of the known values;
/// unknown codes count as a breach.
pub fn eta_breach(ack_status: &str) -> (EtaBreach, bool) {
    match ack_status.trim().to_uppercase().as_str() {
        "Y" => (EtaBreach::No, true),
        "N" | "X" => (EtaBreach::Yes, true),
        _ => (EtaBreach::Yes, false),
    }
}

pub fn is_business_hour(hour: u32, cfg: &ClassifierConfig) -> bool {
    hour >= cfg.business_start_hour && hour < cfg.business_end_hour
}

pub fn is_excluded_environment(environment: &str, cfg: &ClassifierConfig) -> bool {
    contains_any(environment, &cfg.excluded_environments)
}

pub fn is_suppressed_update(update_category: &str, cfg: &ClassifierConfig) -> bool {
    contains_any(update_category, &cfg.suppressed_update_categories)
}

fn contains_any(value: &str, patterns: &[String]) -> bool {
    let upper = value.to_uppercase();
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| upper.contains(&p.to_uppercase()))
}

/// An alert without a creation time is never inside business hours.
pub fn business_flag(incident: &IncidentFields, cfg: &ClassifierConfig) -> BusinessFlag {
    let in_hours = incident
        .created_on
        .is_some_and(|ts| is_business_hour(ts.hour(), cfg));
    if in_hours
        && !is_excluded_environment(&incident.environment, cfg)
        && !is_suppressed_update(&incident.update_category, cfg)
    {
        BusinessFlag::Business
    } else {
        BusinessFlag::NonBusiness
    }
}

pub fn classify(incident: &IncidentFields, cfg: &ClassifierConfig) -> Classification {
    let (eta_breach, _) = eta_breach(&incident.ack_status);
    Classification { eta_breach, business: business_flag(incident, cfg) }
}
