//! Packing strategies for placing items into bins.
//!
//! The packer seeds a first-fit-decreasing search: bins are ordered from
//! smallest to largest volume, items from largest to smallest. Each item is
//! placed either at the origin of an empty bin or at a pivot adjacent to an
//! item that is already packed. When a bin has no room left, placement
//! escalates to the next bin with strictly more available volume.
//!
//! An optional fewest-boxes pass runs before the greedy pass and prefers
//! bins whose volume matches the remaining demand.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PackError;
use crate::model::{Bin, Item};
use crate::types::{Dimensional, OVERLAP_TOLERANCE, Vec3};

/// How [`Bin::try_place`] chooses among the six rotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Check only the first rotation that stays inside the bin.
    #[default]
    FirstContainment,
    /// Keep trying contained rotations until one is free of overlaps.
    FirstOverlapFree,
}

impl RotationStrategy {
    /// Parses the names used in configuration files and requests.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_containment" => Some(RotationStrategy::FirstContainment),
            "first_overlap_free" => Some(RotationStrategy::FirstOverlapFree),
            _ => None,
        }
    }
}

/// Configuration for the packing algorithm.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Run the fewest-boxes pass before greedy placement
    pub fewest_boxes: bool,
    /// Absolute slack of the overlap test
    pub overlap_tolerance: f64,
    /// Reject placements that would exceed a bin's weight capacity
    pub enforce_weight: bool,
    /// Rotation selection rule
    pub rotation_strategy: RotationStrategy,
}

impl PackingConfig {
    pub const DEFAULT_FEWEST_BOXES: bool = false;
    pub const DEFAULT_OVERLAP_TOLERANCE: f64 = OVERLAP_TOLERANCE;
    pub const DEFAULT_ENFORCE_WEIGHT: bool = false;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            fewest_boxes: Self::DEFAULT_FEWEST_BOXES,
            overlap_tolerance: Self::DEFAULT_OVERLAP_TOLERANCE,
            enforce_weight: Self::DEFAULT_ENFORCE_WEIGHT,
            rotation_strategy: RotationStrategy::default(),
        }
    }
}

/// Builder for [`PackingConfig`].
#[derive(Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn fewest_boxes(mut self, enabled: bool) -> Self {
        self.config.fewest_boxes = enabled;
        self
    }

    pub fn overlap_tolerance(mut self, tolerance: f64) -> Self {
        self.config.overlap_tolerance = tolerance;
        self
    }

    pub fn enforce_weight(mut self, enabled: bool) -> Self {
        self.config.enforce_weight = enabled;
        self
    }

    pub fn rotation_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.config.rotation_strategy = strategy;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Aggregate figures describing a finished packing run.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingSummary {
    /// Bins holding at least one item
    pub bins_used: usize,
    pub packed_items: usize,
    pub unfit_items: usize,
    /// Mean volume utilization (percent) over used bins
    pub average_utilization: f64,
    pub total_packed_weight: f64,
}

/// Packs items into bins.
///
/// Bins and items are registered with the `add_*` methods, then
/// [`Packer::pack`] is called once. Afterwards every item is either inside
/// one of [`Packer::bins`] or listed in [`Packer::unfit_items`].
///
/// # Examples
/// ```
/// use bin_packer_3d::model::{Bin, Item};
/// use bin_packer_3d::packer::Packer;
///
/// let mut packer = Packer::new();
/// packer.add_bin(Bin::new("crate", 10.0, 10.0, 10.0, 100.0).unwrap());
/// packer.add_item(Item::new("box", 5.0, 5.0, 5.0, 1.0).unwrap());
///
/// assert!(packer.pack().is_ok());
/// assert_eq!(packer.bins()[0].items().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Packer {
    config: PackingConfig,
    bins: Vec<Bin>,
    items: Vec<Item>,
    unfit_items: Vec<Item>,
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PackingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    pub fn add_bin(&mut self, bin: Bin) {
        self.bins.push(bin);
    }

    pub fn add_bins(&mut self, bins: impl IntoIterator<Item = Bin>) {
        self.bins.extend(bins);
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn add_items(&mut self, items: impl IntoIterator<Item = Item>) {
        self.items.extend(items);
    }

    /// Registered bins; after packing, sorted by ascending volume.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Items still waiting to be packed.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Items that could not be placed in any bin.
    pub fn unfit_items(&self) -> &[Item] {
        &self.unfit_items
    }

    /// Consumes the packer, returning bins and unfit items.
    pub fn into_parts(self) -> (Vec<Bin>, Vec<Item>) {
        (self.bins, self.unfit_items)
    }

    /// Packs all registered items.
    ///
    /// Runs the fewest-boxes pass when enabled, then greedy
    /// first-fit-decreasing placement. Meant to be called once; a second
    /// call finds no pending items and fails with [`PackError::NoItems`].
    ///
    /// # Errors
    /// * [`PackError::NoBins`] / [`PackError::NoItems`] - nothing to pack with or into
    /// * [`PackError::InvalidBinsVolume`] - volumes are infeasible; nothing is placed
    /// * [`PackError::UnfitItemsExist`] - some items were not placed; the
    ///   rest remain packed and inspectable
    pub fn pack(&mut self) -> Result<(), PackError> {
        self.bins.sort_by(|a, b| a.volume().total_cmp(&b.volume()));
        self.items.sort_by(|a, b| b.volume().total_cmp(&a.volume()));

        let (Some(largest_bin), Some(largest_item)) = (self.bins.last(), self.items.first()) else {
            return Err(if self.bins.is_empty() {
                PackError::NoBins
            } else {
                PackError::NoItems
            });
        };

        if largest_bin.volume() < largest_item.volume() {
            warn!(
                "largest item {} does not fit the volume of the largest bin {}",
                largest_item, largest_bin
            );
            return Err(PackError::InvalidBinsVolume);
        }

        let item_volume = total_volume(&self.items);
        let bin_volume: f64 = self.bins.iter().map(Bin::volume).sum();
        if bin_volume < item_volume {
            warn!(
                "items need a volume of {} but bins only offer {}",
                item_volume, bin_volume
            );
            return Err(PackError::InvalidBinsVolume);
        }

        info!(
            "packing {} items into {} bins (fewest boxes: {})",
            self.items.len(),
            self.bins.len(),
            self.config.fewest_boxes
        );

        let mut pending = std::mem::take(&mut self.items);

        if self.config.fewest_boxes {
            pending = self.fewest_boxes_pass(pending);
        }

        while let Some(first) = pending.first() {
            match self.find_fitted_bin(first) {
                Some(bin) => pending = self.pack_to_bin(bin, pending),
                None => {
                    let item = pending.remove(0);
                    warn!("{} does not fit into any bin", item);
                    self.unfit_items.push(item);
                }
            }
        }

        let summary = self.summary();
        info!(
            "packed {} items into {} bins, {} unfit",
            summary.packed_items, summary.bins_used, summary.unfit_items
        );

        if self.unfit_items.is_empty() {
            Ok(())
        } else {
            Err(PackError::UnfitItemsExist {
                count: self.unfit_items.len(),
            })
        }
    }

    /// Finds the first bin, in the current bin order, whose origin accepts `item`.
    ///
    /// [`Packer::pack`] sorts the bins by ascending volume, so during and
    /// after packing this is the smallest such bin.
    ///
    /// This is a probe; no bin is modified.
    pub fn find_fitted_bin(&self, item: &Item) -> Option<usize> {
        self.bins
            .iter()
            .position(|bin| bin.try_place(item, Vec3::zero(), &self.config).is_some())
    }

    /// Aggregate figures over the current bins and unfit items.
    pub fn summary(&self) -> PackingSummary {
        let used: Vec<&Bin> = self.bins.iter().filter(|bin| !bin.is_empty()).collect();
        let average_utilization = if used.is_empty() {
            0.0
        } else {
            used.iter().map(|bin| bin.volume_utilization()).sum::<f64>() / used.len() as f64
        };

        PackingSummary {
            bins_used: used.len(),
            packed_items: used.iter().map(|bin| bin.items().len()).sum(),
            unfit_items: self.unfit_items.len(),
            average_utilization,
            total_packed_weight: used.iter().map(|bin| bin.total_weight()).sum(),
        }
    }

    /// Prefers bins sized to the remaining demand.
    ///
    /// First, every bin large enough for all remaining items is filled in
    /// ascending order, repeating while that makes progress. Then the bin
    /// whose available volume comes closest to the demand from below is
    /// filled, until no bin qualifies or a round places nothing.
    fn fewest_boxes_pass(&mut self, mut pending: Vec<Item>) -> Vec<Item> {
        loop {
            let mut progressed = false;
            for bin in 0..self.bins.len() {
                if pending.is_empty() {
                    break;
                }
                if self.bins[bin].volume() >= total_volume(&pending) {
                    let before = pending.len();
                    pending = self.pack_to_bin(bin, pending);
                    progressed |= pending.len() < before;
                }
            }
            if pending.is_empty() || !progressed {
                break;
            }
        }

        while !pending.is_empty() {
            let need = total_volume(&pending);
            let mut found: Option<(usize, f64)> = None;
            for (idx, bin) in self.bins.iter().enumerate() {
                let available = bin.available_volume();
                if available >= found.map_or(0.0, |(_, v)| v) && available < need {
                    found = Some((idx, available));
                }
            }

            let Some((bin, _)) = found else {
                break;
            };

            let before = pending.len();
            pending = self.pack_to_bin(bin, pending);
            if pending.len() == before {
                debug!(
                    "fewest-boxes pass made no progress with {}, falling back to greedy",
                    self.bins[bin]
                );
                break;
            }
        }

        pending
    }

    /// Packs `items` into `bin`, escalating to larger bins when it fills up.
    ///
    /// The first item goes to the origin. Every following item goes to the
    /// first free pivot next to an occupant of the current bin; when none is
    /// free, the item is tried in progressively larger bins and the largest
    /// bin reached becomes the current one.
    ///
    /// # Returns
    /// Items that could not be placed anywhere along the chain
    fn pack_to_bin(&mut self, mut bin: usize, items: Vec<Item>) -> Vec<Item> {
        let mut items = items.into_iter();
        let Some(mut first) = items.next() else {
            return Vec::new();
        };

        loop {
            match self.bins[bin].put_item(first, Vec3::zero(), &self.config) {
                Ok(()) => break,
                Err(rejected) => match self.bigger_bin_than(bin) {
                    Some(next) => {
                        debug!(
                            "{} does not fit at the origin of {}, trying {}",
                            rejected, self.bins[bin], self.bins[next]
                        );
                        first = rejected;
                        bin = next;
                    }
                    None => {
                        let mut unplaced = vec![rejected];
                        unplaced.extend(items);
                        return unplaced;
                    }
                },
            }
        }

        let mut unplaced = Vec::new();
        for item in items {
            if let Err(item) = self.place_with_escalation(&mut bin, item) {
                debug!("{} left unplaced", item);
                unplaced.push(item);
            }
        }
        unplaced
    }

    /// Places `item` in `bin`, or in the next larger bins if it is full.
    ///
    /// `bin` is updated to the last bin tried, whether or not placement
    /// succeeded there.
    fn place_with_escalation(&mut self, bin: &mut usize, item: Item) -> Result<(), Item> {
        let mut item = match self.bins[*bin].place_anywhere(item, &self.config) {
            Ok(()) => return Ok(()),
            Err(rejected) => rejected,
        };

        while let Some(next) = self.bigger_bin_than(*bin) {
            debug!("escalating {} from {} to {}", item, self.bins[*bin], self.bins[next]);
            *bin = next;
            match self.bins[next].place_anywhere(item, &self.config) {
                Ok(()) => return Ok(()),
                Err(rejected) => item = rejected,
            }
        }
        Err(item)
    }

    /// First bin whose available volume is strictly greater than that of `bin`.
    fn bigger_bin_than(&self, bin: usize) -> Option<usize> {
        let available = self.bins[bin].available_volume();
        self.bins
            .iter()
            .position(|candidate| candidate.available_volume() > available)
    }
}

fn total_volume(items: &[Item]) -> f64 {
    items.iter().map(Item::volume).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rotation;

    fn cube(name: &str, size: f64) -> Item {
        Item::new(name, size, size, size, 1.0).unwrap()
    }

    fn bin(name: &str, w: f64, h: f64, d: f64) -> Bin {
        Bin::new(name, w, h, d, 100.0).unwrap()
    }

    fn item_names(bin: &Bin) -> Vec<&str> {
        bin.items().iter().map(Item::name).collect()
    }

    #[test]
    fn config_builder_sets_all_fields() {
        let config = PackingConfig::builder()
            .fewest_boxes(true)
            .overlap_tolerance(0.5)
            .enforce_weight(true)
            .rotation_strategy(RotationStrategy::FirstOverlapFree)
            .build();

        assert!(config.fewest_boxes);
        assert_eq!(config.overlap_tolerance, 0.5);
        assert!(config.enforce_weight);
        assert_eq!(config.rotation_strategy, RotationStrategy::FirstOverlapFree);
        assert_eq!(PackingConfig::default().overlap_tolerance, 0.01);
    }

    #[test]
    fn rotation_strategy_parse() {
        assert_eq!(
            RotationStrategy::parse("first_containment"),
            Some(RotationStrategy::FirstContainment)
        );
        assert_eq!(
            RotationStrategy::parse(" First-Overlap-Free "),
            Some(RotationStrategy::FirstOverlapFree)
        );
        assert_eq!(RotationStrategy::parse("best"), None);
    }

    #[test]
    fn sorts_bins_ascending_and_items_descending() {
        let mut packer = Packer::new();
        packer.add_bins([bin("large", 10.0, 10.0, 10.0), bin("small", 2.0, 2.0, 2.0)]);
        packer.add_items([cube("tiny", 1.0), cube("big", 2.0)]);

        packer.pack().unwrap();

        assert_eq!(packer.bins()[0].name(), "small");
        assert_eq!(packer.bins()[1].name(), "large");
        // The big cube fills the small bin; the tiny one escalates to the large bin.
        assert_eq!(item_names(&packer.bins()[0]), vec!["big"]);
        assert_eq!(item_names(&packer.bins()[1]), vec!["tiny"]);
    }

    #[test]
    fn find_fitted_bin_is_a_probe() {
        let mut packer = Packer::new();
        packer.add_bins([
            bin("tiny", 1.0, 1.0, 1.0),
            bin("mid", 5.0, 5.0, 5.0),
            bin("big", 10.0, 10.0, 10.0),
        ]);

        assert_eq!(packer.find_fitted_bin(&cube("c", 3.0)), Some(1));
        assert_eq!(packer.find_fitted_bin(&cube("huge", 11.0)), None);
        assert!(packer.bins().iter().all(Bin::is_empty));
    }

    #[test]
    fn escalates_to_larger_bin_when_current_is_full() {
        let mut packer = Packer::new();
        packer.add_bins([bin("a", 2.0, 1.0, 1.0), bin("b", 3.0, 3.0, 3.0)]);
        packer.add_items([cube("i0", 1.0), cube("i1", 1.0), cube("i2", 1.0)]);

        assert_eq!(packer.pack(), Ok(()));
        assert_eq!(item_names(&packer.bins()[0]), vec!["i0", "i1"]);
        assert_eq!(item_names(&packer.bins()[1]), vec!["i2"]);

        let second = packer.bins()[0].items()[1].placement().unwrap();
        assert_eq!(second.pivot, Vec3::new(1.0, 0.0, 0.0));
        let escalated = packer.bins()[1].items()[0].placement().unwrap();
        assert_eq!(escalated.pivot, Vec3::zero());
    }

    #[test]
    fn first_item_moves_to_roomier_bin_when_origin_rejects_it() {
        let mut packer = Packer::with_config(PackingConfig::builder().fewest_boxes(true).build());
        packer.add_bins([bin("pole", 1.0, 1.0, 10.0), bin("crate", 3.0, 3.0, 3.0)]);
        packer.add_items([cube("block", 2.0), cube("unit", 1.0)]);

        // The pole's volume covers the whole demand, but the block is too wide for it.
        assert_eq!(packer.pack(), Ok(()));
        assert!(packer.bins()[0].is_empty());
        assert_eq!(item_names(&packer.bins()[1]), vec!["block", "unit"]);

        let block = packer.bins()[1].items()[0].placement().unwrap();
        assert_eq!(block.pivot, Vec3::zero());
        assert_eq!(block.rotation, Rotation::Whd);
        let unit = packer.bins()[1].items()[1].placement().unwrap();
        assert_eq!(unit.pivot, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn first_item_is_returned_when_no_roomier_bin_exists() {
        let mut packer = Packer::new();
        packer.add_bins([bin("pole", 1.0, 1.0, 10.0), bin("twin", 1.0, 1.0, 10.0)]);

        let unplaced = packer.pack_to_bin(0, vec![cube("block", 2.0), cube("unit", 1.0)]);

        let names: Vec<&str> = unplaced.iter().map(Item::name).collect();
        assert_eq!(names, vec!["block", "unit"]);
        assert!(packer.bins().iter().all(Bin::is_empty));
    }

    #[test]
    fn greedy_spreads_over_bins_while_fewest_boxes_uses_one() {
        let build = |fewest_boxes| {
            let mut packer =
                Packer::with_config(PackingConfig::builder().fewest_boxes(fewest_boxes).build());
            packer.add_bins([
                bin("small", 5.0, 5.0, 5.0),
                bin("medium", 10.0, 10.0, 10.0),
                bin("large", 20.0, 20.0, 20.0),
            ]);
            packer.add_items((0..4).map(|i| cube(&format!("c{i}"), 5.0)));
            packer
        };

        let mut greedy = build(false);
        assert_eq!(greedy.pack(), Ok(()));
        assert_eq!(greedy.summary().bins_used, 2);
        assert_eq!(greedy.bins()[0].items().len(), 1);
        assert_eq!(greedy.bins()[1].items().len(), 3);

        let mut fewest = build(true);
        assert_eq!(fewest.pack(), Ok(()));
        assert_eq!(fewest.summary().bins_used, 1);
        assert_eq!(fewest.bins()[1].name(), "medium");
        assert_eq!(fewest.bins()[1].items().len(), 4);
    }

    #[test]
    fn fewest_boxes_picks_bin_closest_below_demand() {
        let mut packer = Packer::with_config(PackingConfig::builder().fewest_boxes(true).build());
        packer.add_bins([bin("a", 2.0, 1.0, 1.0), bin("b", 2.0, 2.0, 1.0)]);
        packer.add_items((0..5).map(|i| cube(&format!("u{i}"), 1.0)));

        assert_eq!(packer.pack(), Ok(()));
        assert_eq!(packer.bins()[1].name(), "b");
        assert_eq!(packer.bins()[1].items().len(), 4);
        assert_eq!(packer.bins()[0].items().len(), 1);
    }

    #[test]
    fn fewest_boxes_stops_when_no_bin_can_take_anything() {
        let mut packer = Packer::with_config(PackingConfig::builder().fewest_boxes(true).build());
        packer.add_bins([bin("a", 1.0, 1.0, 10.0), bin("b", 1.0, 1.0, 10.0)]);
        packer.add_item(cube("wide", 2.0));

        assert_eq!(packer.pack(), Err(PackError::UnfitItemsExist { count: 1 }));
        assert_eq!(packer.unfit_items()[0].name(), "wide");
        assert!(packer.bins().iter().all(Bin::is_empty));
    }

    #[test]
    fn fewest_boxes_falls_back_to_greedy_after_a_stalled_round() {
        let mut packer = Packer::with_config(PackingConfig::builder().fewest_boxes(true).build());
        packer.add_bins([bin("a", 1.0, 1.0, 4.0), bin("b", 1.0, 1.0, 5.0)]);
        packer.add_items([
            Item::new("flat", 2.0, 2.0, 1.0, 1.0).unwrap(),
            cube("u0", 1.0),
            cube("u1", 1.0),
        ]);

        assert_eq!(packer.pack(), Err(PackError::UnfitItemsExist { count: 1 }));
        assert_eq!(packer.unfit_items()[0].name(), "flat");
        assert_eq!(item_names(&packer.bins()[0]), vec!["u0", "u1"]);
        assert!(packer.bins()[1].is_empty());
    }

    #[test]
    fn geometric_misfit_becomes_unfit() {
        let mut packer = Packer::new();
        packer.add_bin(bin("tray", 3.0, 3.0, 1.0));
        packer.add_items([
            Item::new("p0", 2.0, 2.0, 1.0, 1.0).unwrap(),
            Item::new("p1", 2.0, 2.0, 1.0, 1.0).unwrap(),
        ]);

        assert_eq!(packer.pack(), Err(PackError::UnfitItemsExist { count: 1 }));
        assert_eq!(item_names(&packer.bins()[0]), vec!["p0"]);
        assert_eq!(packer.unfit_items()[0].name(), "p1");
        assert!(!packer.unfit_items()[0].is_placed());
        assert!(packer.items().is_empty());
    }

    #[test]
    fn weight_enforcement_moves_items_to_other_bins() {
        let config = PackingConfig::builder().enforce_weight(true).build();
        let mut packer = Packer::with_config(config);
        packer.add_bins([
            Bin::new("light", 2.0, 1.0, 1.0, 10.0).unwrap(),
            Bin::new("strong", 3.0, 3.0, 3.0, 100.0).unwrap(),
        ]);
        packer.add_items([
            Item::new("h0", 1.0, 1.0, 1.0, 8.0).unwrap(),
            Item::new("h1", 1.0, 1.0, 1.0, 8.0).unwrap(),
        ]);

        assert_eq!(packer.pack(), Ok(()));
        assert_eq!(item_names(&packer.bins()[0]), vec!["h0"]);
        assert_eq!(item_names(&packer.bins()[1]), vec!["h1"]);
        assert!(packer.bins()[0].total_weight() <= packer.bins()[0].max_weight());
    }

    #[test]
    fn second_pack_reports_no_items() {
        let mut packer = Packer::new();
        packer.add_bin(bin("b", 1.0, 1.0, 1.0));
        packer.add_item(cube("c", 1.0));

        assert_eq!(packer.pack(), Ok(()));
        assert_eq!(packer.pack(), Err(PackError::NoItems));
        assert_eq!(packer.bins()[0].items().len(), 1);
    }

    #[test]
    fn summary_reports_used_bins_only() {
        let mut packer = Packer::new();
        packer.add_bins([bin("used", 2.0, 1.0, 1.0), bin("spare", 4.0, 4.0, 4.0)]);
        packer.add_item(cube("c", 1.0));
        packer.pack().unwrap();

        let summary = packer.summary();
        assert_eq!(summary.bins_used, 1);
        assert_eq!(summary.packed_items, 1);
        assert_eq!(summary.unfit_items, 0);
        assert!((summary.average_utilization - 50.0).abs() < 1e-9);
        assert_eq!(summary.total_packed_weight, 1.0);
    }
}
