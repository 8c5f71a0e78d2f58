use serde::{Deserialize, Serialize};
use tracing::debug;

/// Always treated as a current member state, whatever the table says.
pub const ALWAYS_MEMBER: &str = "USA";

/// One row of the member-state table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStateRecord {
    #[serde(alias = "Member State")]
    pub member_state: String,
    #[serde(default, alias = "End date")]
    pub end_date: Option<String>,
}

impl MemberStateRecord {
    pub fn is_current(&self) -> bool {
        self.end_date
            .as_deref()
            .map(|d| d.trim().is_empty())
            .unwrap_or(true)
    }
}

/// Current member states: rows without an end date, plus `USA`, deduplicated and sorted.
pub fn current_member_states(records: &[MemberStateRecord]) -> Vec<String> {
    let mut members: Vec<String> = records
        .iter()
        .filter(|r| r.is_current())
        .map(|r| r.member_state.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    members.push(ALWAYS_MEMBER.to_string());
    members.sort();
    members.dedup();
    debug!(rows = records.len(), current = members.len(), "Member-state table cleaned");
    members
}

/// Parse the member-state table from a JSON array and keep the current members.
pub fn member_states_from_json(json: &str) -> crate::Result<Vec<String>> {
    let records: Vec<MemberStateRecord> = serde_json::from_str(json)?;
    Ok(current_member_states(&records))
}

/// Parse the member-state table from CSV with a `Member State`/`End date` header.
/// Extra columns are ignored.
pub fn member_states_from_csv(csv: &str) -> crate::Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv.as_bytes());
    let records = reader
        .deserialize::<MemberStateRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(current_member_states(&records))
}
