use serde::{Deserialize, Serialize};

/// Running counters of a pool.
///
/// While pooling is enabled
/// `free_objects + objects_in_use == pages_in_use * objects_per_page`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
  pub object_size: usize,
  pub page_size: usize,
  pub free_objects: usize,
  pub objects_in_use: usize,
  pub pages_in_use: usize,
  /// High-water mark of `objects_in_use`.
  pub most_objects: usize,
  pub allocations: usize,
  pub deallocations: usize,
}

impl Stats {
  pub(crate) fn record_allocation(&mut self) {
    self.allocations += 1;
    self.objects_in_use += 1;
    self.most_objects = self.most_objects.max(self.objects_in_use);
  }

  pub(crate) fn record_deallocation(&mut self) {
    self.deallocations += 1;
    self.objects_in_use = self.objects_in_use.saturating_sub(1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_high_water_mark() {
    let mut stats = Stats::default();

    stats.record_allocation();
    stats.record_allocation();
    stats.record_deallocation();
    stats.record_allocation();

    assert_eq!(stats.objects_in_use, 2);
    assert_eq!(stats.most_objects, 2);
    assert_eq!(stats.allocations, 3);
    assert_eq!(stats.deallocations, 1);
  }
}
