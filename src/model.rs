//! Data models for 3D bin packing.
//!
//! - `Item`: a rectangular solid to be packed, with its placement once packed
//! - `Placement`: the rotation and pivot chosen for a packed item
//! - `Bin`: a container that owns the items packed into it
//!
//! Placement is split into a pure query (`Bin::try_place`) and a mutation
//! (`Bin::commit`), so a failed trial never leaves state behind on the item.

use std::fmt;

use log::trace;

use crate::error::ValidationError;
use crate::geometry::{fits_within_bounds, intersects};
use crate::packer::{PackingConfig, RotationStrategy};
use crate::types::{
    Axis, BoundingBox, Dimension, Dimensional, EPSILON_GENERAL, Pivot, Rotation, Vec3, Weighted,
    validation,
};

/// Rotation and pivot chosen for a packed item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub rotation: Rotation,
    pub pivot: Pivot,
}

/// A rectangular item to be packed.
///
/// Dimensions and weight are fixed at construction. The placement is only
/// set once the item has been committed to a bin.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    name: String,
    width: f64,
    height: f64,
    depth: f64,
    weight: f64,
    placement: Option<Placement>,
}

impl Item {
    /// Creates a new item with validation.
    ///
    /// # Parameters
    /// * `name` - Label used in diagnostics
    /// * `width`, `height`, `depth` - Intrinsic dimensions
    /// * `weight` - Weight of the item
    ///
    /// # Examples
    /// ```
    /// use bin_packer_3d::model::Item;
    ///
    /// assert!(Item::new("ok", 10.0, 20.0, 30.0, 5.0).is_ok());
    /// assert!(Item::new("broken", -10.0, 20.0, 30.0, 5.0).is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        width: f64,
        height: f64,
        depth: f64,
        weight: f64,
    ) -> Result<Self, ValidationError> {
        validation::validate_dimensions_3d((width, height, depth))?;
        validation::validate_weight(weight, "Weight")?;
        Ok(Self {
            name: name.into(),
            width,
            height,
            depth,
            weight,
            placement: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Returns the placement, if the item has been packed.
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    /// Extent of the item under `rotation`.
    #[inline]
    pub fn dimension_for(&self, rotation: Rotation) -> Dimension {
        rotation.apply(self.width, self.height, self.depth)
    }

    /// Extent of the item under its chosen rotation.
    ///
    /// Unplaced items report their intrinsic extent.
    pub fn effective_dimension(&self) -> Dimension {
        let rotation = self.placement.map_or(Rotation::Whd, |p| p.rotation);
        self.dimension_for(rotation)
    }

    /// Box occupied by the item inside its bin, if it has been placed.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.placement.map(|p| {
            BoundingBox::from_position_and_dims(p.pivot, self.dimension_for(p.rotation))
        })
    }

    fn place(&mut self, placement: Placement) {
        self.placement = Some(placement);
    }
}

/// Intrinsic extent; the volume does not depend on rotation.
impl Dimensional for Item {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }
}

impl Weighted for Item {
    fn weight(&self) -> f64 {
        self.weight
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Unplaced items print the origin and the identity rotation.
        let placement = self.placement.unwrap_or(Placement {
            rotation: Rotation::Whd,
            pivot: Vec3::zero(),
        });
        write!(
            f,
            "{}({}x{}x{}, weight: {}) pos({}) rt({})",
            self.name,
            self.width,
            self.height,
            self.depth,
            self.weight,
            placement.pivot,
            placement.rotation
        )
    }
}

/// A container with fixed dimensions and weight capacity.
///
/// The bin's box spans `[0, width] x [0, height] x [0, depth]`. Packed items
/// are kept in placement order, which drives pivot generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Bin {
    name: String,
    width: f64,
    height: f64,
    depth: f64,
    max_weight: f64,
    items: Vec<Item>,
}

impl Bin {
    /// Creates a new empty bin with validation.
    ///
    /// # Parameters
    /// * `name` - Label used in diagnostics
    /// * `width`, `height`, `depth` - Interior dimensions
    /// * `max_weight` - Weight capacity
    pub fn new(
        name: impl Into<String>,
        width: f64,
        height: f64,
        depth: f64,
        max_weight: f64,
    ) -> Result<Self, ValidationError> {
        validation::validate_dimension(width, "Bin width")?;
        validation::validate_dimension(height, "Bin height")?;
        validation::validate_dimension(depth, "Bin depth")?;
        validation::validate_weight(max_weight, "Bin max weight")?;
        Ok(Self {
            name: name.into(),
            width,
            height,
            depth,
            max_weight,
            items: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    /// Packed items in placement order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the volumes of all packed items.
    pub fn used_volume(&self) -> f64 {
        self.items.iter().map(Item::volume).sum()
    }

    pub fn available_volume(&self) -> f64 {
        self.volume() - self.used_volume()
    }

    /// Percentage of the bin's volume taken by packed items.
    ///
    /// # Returns
    /// Value between 0.0 and 100.0; 0.0 for a bin without volume
    pub fn volume_utilization(&self) -> f64 {
        let total = self.volume();
        if total <= 0.0 {
            return 0.0;
        }
        (self.used_volume() * 100.0) / total
    }

    /// Total weight of all packed items.
    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(Item::weight).sum()
    }

    pub fn remaining_weight(&self) -> f64 {
        self.max_weight - self.total_weight()
    }

    /// Bounds of the bin as an extent.
    pub fn bounds(&self) -> Dimension {
        Vec3::new(self.width, self.height, self.depth)
    }

    /// Finds a placement for `item` with its minimum corner at `pivot`.
    ///
    /// Rotations are tried in [`Rotation::ALL`] order; only rotations that keep
    /// the item inside the bin are considered. With
    /// [`RotationStrategy::FirstContainment`] the first such rotation is the
    /// only one checked against the occupants. With
    /// [`RotationStrategy::FirstOverlapFree`] the search continues until an
    /// overlap-free rotation is found.
    ///
    /// Nothing is mutated; use [`Bin::commit`] to apply the result.
    pub fn try_place(
        &self,
        item: &Item,
        pivot: Pivot,
        config: &PackingConfig,
    ) -> Option<Placement> {
        if config.enforce_weight
            && self.total_weight() + item.weight() > self.max_weight + EPSILON_GENERAL
        {
            trace!("{} exceeds remaining weight of {}", item.name(), self.name);
            return None;
        }

        let bounds = self.bounds();
        for rotation in Rotation::ALL {
            let extent = item.dimension_for(rotation);
            if !fits_within_bounds(pivot, extent, bounds) {
                continue;
            }

            let candidate = BoundingBox::from_position_and_dims(pivot, extent);
            let collides = self
                .items
                .iter()
                .filter_map(Item::bounding_box)
                .any(|occupied| intersects(&occupied, &candidate, config.overlap_tolerance));

            if !collides {
                return Some(Placement { rotation, pivot });
            }

            match config.rotation_strategy {
                RotationStrategy::FirstContainment => return None,
                RotationStrategy::FirstOverlapFree => continue,
            }
        }
        None
    }

    /// Records `placement` on `item` and appends it to the bin.
    pub fn commit(&mut self, mut item: Item, placement: Placement) {
        trace!(
            "{}: placed {} at ({}) as {}",
            self.name,
            item.name(),
            placement.pivot,
            placement.rotation.code()
        );
        item.place(placement);
        self.items.push(item);
    }

    /// Tries to place `item` at `pivot` and commits on success.
    ///
    /// # Returns
    /// `Ok(())` if the item was packed, otherwise the untouched item
    pub fn put_item(
        &mut self,
        item: Item,
        pivot: Pivot,
        config: &PackingConfig,
    ) -> Result<(), Item> {
        match self.try_place(&item, pivot, config) {
            Some(placement) => {
                self.commit(item, placement);
                Ok(())
            }
            None => Err(item),
        }
    }

    /// Candidate pivots for the next item.
    ///
    /// An empty bin offers only the origin. Otherwise every occupant, in
    /// placement order, offers the three points adjacent to its far faces
    /// along +x, +y and +z.
    pub fn pivot_candidates(&self) -> Vec<Pivot> {
        if self.items.is_empty() {
            return vec![Vec3::zero()];
        }

        self.items
            .iter()
            .filter_map(|occupant| {
                occupant
                    .placement()
                    .map(|p| (p.pivot, occupant.effective_dimension()))
            })
            .flat_map(|(pivot, extent)| {
                Axis::ALL
                    .into_iter()
                    .map(move |axis| pivot.offset_along(axis, extent.component(axis)))
            })
            .collect()
    }

    /// Places `item` at the first candidate pivot that accepts it.
    pub fn place_anywhere(&mut self, item: Item, config: &PackingConfig) -> Result<(), Item> {
        let mut item = item;
        for pivot in self.pivot_candidates() {
            match self.put_item(item, pivot, config) {
                Ok(()) => return Ok(()),
                Err(rejected) => item = rejected,
            }
        }
        Err(item)
    }
}

impl Dimensional for Bin {
    fn dimensions(&self) -> Vec3 {
        self.bounds()
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}x{}x{}, max_weight:{})",
            self.name, self.width, self.height, self.depth, self.max_weight
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, w: f64, h: f64, d: f64) -> Item {
        Item::new(name, w, h, d, 1.0).unwrap()
    }

    #[test]
    fn rejects_invalid_construction() {
        assert!(Item::new("nan", f64::NAN, 1.0, 1.0, 1.0).is_err());
        assert!(Item::new("heavy", 1.0, 1.0, 1.0, -1.0).is_err());
        assert!(Bin::new("inf", 1.0, f64::INFINITY, 1.0, 1.0).is_err());
        assert!(Bin::new("flat", 1.0, 0.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn volumes_and_utilization() {
        let config = PackingConfig::default();
        let mut bin = Bin::new("b", 10.0, 10.0, 10.0, 100.0).unwrap();
        assert_eq!(bin.volume(), 1000.0);
        assert_eq!(bin.volume_utilization(), 0.0);

        bin.put_item(item("a", 5.0, 10.0, 10.0), Vec3::zero(), &config)
            .unwrap();
        assert_eq!(bin.used_volume(), 500.0);
        assert_eq!(bin.available_volume(), 500.0);
        assert!((bin.volume_utilization() - 50.0).abs() < EPSILON_GENERAL);
        assert_eq!(bin.total_weight(), 1.0);
        assert_eq!(bin.remaining_weight(), 99.0);
    }

    #[test]
    fn zero_volume_bin_reports_zero_utilization() {
        let bin = Bin::new("flat", 10.0, 0.0, 10.0, 1.0).unwrap();
        assert_eq!(bin.volume_utilization(), 0.0);
    }

    #[test]
    fn try_place_does_not_mutate() {
        let config = PackingConfig::default();
        let bin = Bin::new("b", 10.0, 10.0, 10.0, 100.0).unwrap();
        let candidate = item("a", 2.0, 3.0, 4.0);

        let placement = bin.try_place(&candidate, Vec3::zero(), &config);
        assert_eq!(
            placement,
            Some(Placement {
                rotation: Rotation::Whd,
                pivot: Vec3::zero()
            })
        );
        assert!(bin.is_empty());
        assert!(!candidate.is_placed());
    }

    #[test]
    fn picks_first_rotation_that_fits_bounds() {
        let config = PackingConfig::default();
        // Only a rotation putting depth (10) on the x axis fits.
        let bin = Bin::new("b", 10.0, 2.0, 1.0, 100.0).unwrap();
        let long = item("long", 1.0, 2.0, 10.0);

        let placement = bin.try_place(&long, Vec3::zero(), &config).unwrap();
        assert_eq!(placement.rotation, Rotation::Dhw);
        assert_eq!(long.dimension_for(placement.rotation), Vec3::new(10.0, 2.0, 1.0));
    }

    #[test]
    fn rejects_item_exceeding_bounds_in_every_rotation() {
        let config = PackingConfig::default();
        let bin = Bin::new("b", 5.0, 5.0, 5.0, 100.0).unwrap();
        assert!(bin.try_place(&item("big", 6.0, 1.0, 1.0), Vec3::zero(), &config).is_none());
    }

    #[test]
    fn first_containment_does_not_retry_other_rotations() {
        let mut bin = Bin::new("b", 4.0, 4.0, 1.0, 100.0).unwrap();
        let default_rules = PackingConfig::default();
        let overlap_free = PackingConfig::builder()
            .rotation_strategy(RotationStrategy::FirstOverlapFree)
            .build();

        // Occupies the strip x in [0, 4], y in [2, 4].
        bin.put_item(item("strip", 4.0, 2.0, 1.0), Vec3::new(0.0, 2.0, 0.0), &default_rules)
            .unwrap();

        // At the origin WHD (1x3x1) is contained but reaches into the strip,
        // while HWD (3x1x1) would be free.
        let probe = item("probe", 1.0, 3.0, 1.0);
        assert!(bin.try_place(&probe, Vec3::zero(), &default_rules).is_none());

        let placement = bin.try_place(&probe, Vec3::zero(), &overlap_free).unwrap();
        assert_eq!(placement.rotation, Rotation::Hwd);
    }

    #[test]
    fn put_item_returns_rejected_item() {
        let config = PackingConfig::default();
        let mut bin = Bin::new("b", 1.0, 1.0, 1.0, 100.0).unwrap();
        bin.put_item(item("first", 1.0, 1.0, 1.0), Vec3::zero(), &config)
            .unwrap();

        let rejected = bin
            .put_item(item("second", 1.0, 1.0, 1.0), Vec3::zero(), &config)
            .unwrap_err();
        assert_eq!(rejected.name(), "second");
        assert!(!rejected.is_placed());
        assert_eq!(bin.items().len(), 1);
    }

    #[test]
    fn weight_is_only_enforced_when_enabled() {
        let heavy = Item::new("heavy", 1.0, 1.0, 1.0, 50.0).unwrap();
        let bin = Bin::new("b", 5.0, 5.0, 5.0, 10.0).unwrap();

        let lenient = PackingConfig::default();
        assert!(bin.try_place(&heavy, Vec3::zero(), &lenient).is_some());

        let strict = PackingConfig::builder().enforce_weight(true).build();
        assert!(bin.try_place(&heavy, Vec3::zero(), &strict).is_none());
    }

    #[test]
    fn pivot_candidates_follow_occupant_then_axis_order() {
        let config = PackingConfig::default();
        let mut bin = Bin::new("b", 10.0, 10.0, 10.0, 100.0).unwrap();
        assert_eq!(bin.pivot_candidates(), vec![Vec3::zero()]);

        bin.put_item(item("a", 2.0, 3.0, 4.0), Vec3::zero(), &config)
            .unwrap();
        bin.put_item(item("b", 1.0, 1.0, 1.0), Vec3::new(2.0, 0.0, 0.0), &config)
            .unwrap();

        assert_eq!(
            bin.pivot_candidates(),
            vec![
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 3.0, 0.0),
                Vec3::new(0.0, 0.0, 4.0),
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
                Vec3::new(2.0, 0.0, 1.0),
            ]
        );
    }

    #[test]
    fn pivot_candidates_use_rotated_extent() {
        let config = PackingConfig::default();
        let mut bin = Bin::new("b", 10.0, 2.0, 1.0, 100.0).unwrap();
        bin.put_item(item("long", 1.0, 2.0, 10.0), Vec3::zero(), &config)
            .unwrap();

        let candidates = bin.pivot_candidates();
        assert_eq!(candidates[0], Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(candidates[1], Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(candidates[2], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn place_anywhere_fills_next_to_occupants() {
        let config = PackingConfig::default();
        let mut bin = Bin::new("b", 2.0, 1.0, 1.0, 100.0).unwrap();
        bin.place_anywhere(item("a", 1.0, 1.0, 1.0), &config).unwrap();
        bin.place_anywhere(item("b", 1.0, 1.0, 1.0), &config).unwrap();
        assert!(bin.place_anywhere(item("c", 1.0, 1.0, 1.0), &config).is_err());

        let pivots: Vec<_> = bin
            .items()
            .iter()
            .map(|i| i.placement().unwrap().pivot)
            .collect();
        assert_eq!(pivots, vec![Vec3::zero(), Vec3::new(1.0, 0.0, 0.0)]);
    }

    #[test]
    fn display_matches_legacy_format() {
        let config = PackingConfig::default();
        let mut bin = Bin::new("box", 10.0, 20.0, 30.0, 40.0).unwrap();
        assert_eq!(bin.to_string(), "box(10x20x30, max_weight:40)");

        let unplaced = Item::new("it", 1.0, 2.0, 3.0, 4.5).unwrap();
        assert_eq!(
            unplaced.to_string(),
            "it(1x2x3, weight: 4.5) pos(0,0,0) rt(RotationType_WHD (w,h,d))"
        );

        bin.put_item(unplaced, Vec3::new(1.0, 0.0, 0.0), &config).unwrap();
        assert_eq!(
            bin.items()[0].to_string(),
            "it(1x2x3, weight: 4.5) pos(1,0,0) rt(RotationType_WHD (w,h,d))"
        );
    }

    #[test]
    fn volume_and_weight_come_from_the_shared_traits() {
        fn total_volume<T: Dimensional>(objects: &[T]) -> f64 {
            objects.iter().map(Dimensional::volume).sum()
        }

        let items = [item("a", 1.0, 2.0, 3.0), item("b", 2.0, 2.0, 2.0)];
        assert_eq!(total_volume(&items), 14.0);
        assert_eq!(Weighted::weight(&items[0]), 1.0);

        let bins = [Bin::new("flat", 10.0, 0.0, 10.0, 1.0).unwrap()];
        assert_eq!(total_volume(&bins), 0.0);
        assert_eq!(bins[0].dimensions(), Vec3::new(10.0, 0.0, 10.0));
    }
}
