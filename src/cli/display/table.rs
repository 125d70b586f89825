//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::cluster::{DeviceSetClaims, ProvisionReport};
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};

/// One device-set claim for list display
#[derive(Debug, Clone)]
pub struct ClaimInfo {
    pub identity: String,
    pub claim: Option<String>,
    pub phase: String,
    pub age: String,
    /// Claims sharing this identity
    pub count: usize,
}

impl ClaimInfo {
    /// One row per claim found, or a single placeholder row when the slot is unclaimed.
    pub fn from_slot(slot: &DeviceSetClaims, now: DateTime<Utc>) -> Vec<ClaimInfo> {
        let identity = slot.identity.id();
        if slot.claims.is_empty() {
            return vec![ClaimInfo {
                identity,
                claim: None,
                phase: String::new(),
                age: "-".to_string(),
                count: 0,
            }];
        }

        slot.claims
            .iter()
            .map(|pvc| ClaimInfo {
                identity: identity.clone(),
                claim: pvc.metadata.name.clone(),
                phase: pvc
                    .status
                    .as_ref()
                    .and_then(|s| s.phase.clone())
                    .unwrap_or_default(),
                age: pvc
                    .metadata
                    .creation_timestamp
                    .as_ref()
                    .map(|t| format_age(t.0, now))
                    .unwrap_or_else(|| "-".to_string()),
                count: slot.claims.len(),
            })
            .collect()
    }
}

/// Compact age in the style of `kubectl get`
pub fn format_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created);
    if elapsed.num_days() > 0 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m", elapsed.num_minutes())
    } else {
        format!("{}s", elapsed.num_seconds().max(0))
    }
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render device-set claims as a formatted table
    pub fn render_claims(&self, claims: &[ClaimInfo]) -> String {
        if claims.is_empty() {
            return "No storageClassDeviceSets configured".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("IDENTITY").set_alignment(CellAlignment::Left),
                Cell::new("CLAIM").set_alignment(CellAlignment::Left),
                Cell::new("PHASE").set_alignment(CellAlignment::Center),
                Cell::new("AGE").set_alignment(CellAlignment::Right),
            ]);

        for info in claims {
            let claim_cell = match &info.claim {
                Some(name) if info.count > 1 => {
                    Cell::new(format!("{} {} (ambiguous)", StatusIcon::ERROR, name))
                }
                Some(name) => Cell::new(name),
                None => Cell::new(format!("{} not created", StatusIcon::PENDING)),
            };

            table.add_row(vec![
                Cell::new(&info.identity),
                claim_cell.fg(self.theme.get_claim_count_color(info.count)),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::get_phase_icon(&info.phase),
                    if info.phase.is_empty() { "-" } else { info.phase.as_str() }
                ))
                .fg(self.theme.get_phase_color(&info.phase)),
                Cell::new(&info.age).set_alignment(CellAlignment::Right),
            ]);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Device Set Claims {} ─╮\n",
            format!("[{} claims]", claims.iter().filter(|c| c.claim.is_some()).count())
                .bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "Legend: {} Bound  {} Pending  {} Lost or ambiguous\n",
            StatusIcon::SUCCESS.green(),
            StatusIcon::PENDING.yellow(),
            StatusIcon::ERROR.red()
        ));

        output
    }

    /// Render the outcome of a provisioning or start pass
    pub fn render_report(&self, title: &str, report: &ProvisionReport) -> String {
        let succeeded = report.successes.len();
        let failed = report.errors.len();

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("WORKLOAD").set_alignment(CellAlignment::Left),
                Cell::new("RESULT").set_alignment(CellAlignment::Left),
            ]);

        for name in &report.successes {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!("{} applied", StatusIcon::SUCCESS)).fg(self.theme.success),
            ]);
        }
        for err in &report.errors {
            let (worker, reason) = err.split_once(": ").unwrap_or((err.as_str(), ""));
            table.add_row(vec![
                Cell::new(worker),
                Cell::new(format!("{} {}", StatusIcon::ERROR, reason)).fg(self.theme.error),
            ]);
        }

        let status_color = if failed == 0 {
            Color::Green
        } else if succeeded > 0 {
            Color::Yellow
        } else {
            Color::Red
        };

        let mut summary = Table::new();
        summary.load_preset(UTF8_FULL).add_row(vec![Cell::new(format!(
            "{} {}: {} succeeded, {} failed",
            StatusIcon::get_report_icon(succeeded, failed),
            title,
            succeeded,
            failed
        ))
        .fg(status_color)]);

        let mut output = summary.to_string();
        output.push('\n');
        if succeeded + failed > 0 {
            output.push_str(&table.to_string());
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::osd::ClaimIdentity;
    use chrono::{Duration, TimeZone};
    use k8s_openapi::api::core::v1::{PersistentVolumeClaim, PersistentVolumeClaimStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    #[test]
    fn test_format_age() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(format_age(now - Duration::seconds(42), now), "42s");
        assert_eq!(format_age(now - Duration::minutes(5), now), "5m");
        assert_eq!(format_age(now - Duration::hours(3), now), "3h");
        assert_eq!(format_age(now - Duration::days(2), now), "2d");
    }

    #[test]
    fn test_claim_rows() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let pvc = PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some("set1-0-0-abcde".to_string()),
                creation_timestamp: Some(Time(now - Duration::hours(1))),
                ..Default::default()
            },
            status: Some(PersistentVolumeClaimStatus {
                phase: Some("Bound".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let slot = DeviceSetClaims {
            identity: ClaimIdentity::new("set1", 0, 0),
            claims: vec![pvc],
        };
        let rows = ClaimInfo::from_slot(&slot, now);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].age, "1h");
        assert_eq!(rows[0].phase, "Bound");

        let empty = DeviceSetClaims {
            identity: ClaimIdentity::new("set1", 1, 0),
            claims: vec![],
        };
        let mut all = rows;
        all.extend(ClaimInfo::from_slot(&empty, now));

        let output = TableRenderer::new().render_claims(&all);
        assert!(output.contains("set1-0-0-abcde"));
        assert!(output.contains("set1-1-0"));
        assert!(output.contains("not created"));
    }

    #[test]
    fn test_render_report() {
        let report = ProvisionReport {
            successes: vec!["rook-ceph-osd-prepare-node1".to_string()],
            errors: vec!["node2: empty volumes".to_string()],
        };
        let output = TableRenderer::new().render_report("provision", &report);
        assert!(output.contains("1 succeeded, 1 failed"));
        assert!(output.contains("rook-ceph-osd-prepare-node1"));
        assert!(output.contains("empty volumes"));
    }
}
