use std::collections::BTreeSet;
use tracing::warn;

use crate::episode::{Episode, NumberingIssue, check_numbering};

/// Distinct seasons present in `records`, ascending. Records without a season are skipped.
pub fn seasons(records: &[Episode]) -> Vec<u32> {
  records.iter().filter_map(|ep| ep.season).collect::<BTreeSet<_>>().into_iter().collect()
}

/// Index derived from one snapshot of the catalog. Rebuilt from scratch whenever the snapshot changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogIndex {
  pub seasons: Vec<u32>,
  pub issues: Vec<NumberingIssue>,
}

impl CatalogIndex {
  pub fn build(records: &[Episode]) -> Self {
    let issues = check_numbering(records);
    for issue in &issues {
      warn!(issue = %issue, "catalog: numbering conflict");
    }
    Self { seasons: seasons(records), issues }
  }

  pub fn is_consistent(&self) -> bool {
    self.issues.is_empty()
  }
}

/// Resolve a deep link. With duplicated numbers the first record in snapshot order wins.
pub fn find_by_number(records: &[Episode], number: u32) -> Option<&Episode> {
  records.iter().find(|ep| ep.episode_number == Some(number))
}
