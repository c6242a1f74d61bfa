//! Tool classes available for a pass and which one services a transfer.

use serde::{Deserialize, Serialize};

use crate::{CompilerConfig, Deck, PlanError, ToolClass};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMount {
    pub class: ToolClass,
    pub capacity_ul: f64,
    /// Rack variables the instrument draws tips from.
    pub racks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRig {
    low: Option<ToolMount>,
    high: Option<ToolMount>,
}

impl ToolRig {
    pub fn new(low: Option<ToolMount>, high: Option<ToolMount>) -> Self {
        Self { low, high }
    }

    /// Assigns racks to tool classes.
    ///
    /// The low class prefers 200 µL racks and otherwise takes the first rack
    /// declared. The high class is loaded only when 1000 µL racks exist.
    pub fn from_deck(deck: &Deck, config: &CompilerConfig) -> Result<Self, PlanError> {
        let racks: Vec<(&str, String)> = deck.tip_racks().collect();
        if racks.is_empty() {
            return Err(PlanError::NoToolRacks);
        }
        let sized = |needle: &str| -> Vec<String> {
            racks
                .iter()
                .filter(|(size, _)| size.contains(needle))
                .map(|(_, var)| var.clone())
                .collect()
        };

        let mut low_racks = sized("200");
        if low_racks.is_empty() {
            low_racks.push(racks[0].1.clone());
        }
        let high_racks = sized("1000");

        let low = Some(ToolMount {
            class: ToolClass::Low,
            capacity_ul: config.low_capacity_ul,
            racks: low_racks,
        });
        let high = (!high_racks.is_empty()).then(|| ToolMount {
            class: ToolClass::High,
            capacity_ul: config.high_capacity_ul,
            racks: high_racks,
        });
        Ok(Self { low, high })
    }

    pub fn mount(&self, class: ToolClass) -> Option<&ToolMount> {
        match class {
            ToolClass::Low => self.low.as_ref(),
            ToolClass::High => self.high.as_ref(),
        }
    }

    pub fn capacity(&self, class: ToolClass) -> Option<f64> {
        self.mount(class).map(|m| m.capacity_ul)
    }

    /// Loaded mounts, low class first.
    pub fn mounts(&self) -> impl Iterator<Item = &ToolMount> {
        self.low.iter().chain(self.high.iter())
    }

    /// Picks the tool class for a transfer of `volume_ul`.
    ///
    /// The high class takes anything over the low-class cap when it is loaded;
    /// everything else goes to the low class. Returns `None` only when no
    /// class is loaded at all.
    pub fn select(&self, volume_ul: f64) -> Option<ToolClass> {
        match (&self.low, &self.high) {
            (Some(low), Some(_)) if volume_ul > low.capacity_ul => Some(ToolClass::High),
            (Some(_), _) => Some(ToolClass::Low),
            (None, Some(_)) => Some(ToolClass::High),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabwareEntry;

    fn deck(labels: &[(u32, &str)]) -> Deck {
        let config = CompilerConfig::default();
        Deck::new(
            labels
                .iter()
                .map(|(slot, label)| LabwareEntry::classify(*slot, label))
                .collect(),
            &config,
        )
    }

    #[test]
    fn test_no_racks_is_configuration_error() {
        let config = CompilerConfig::default();
        let d = deck(&[(11, "ecmcustom_15_tuberack_14780ul")]);
        assert_eq!(ToolRig::from_deck(&d, &config), Err(PlanError::NoToolRacks));
    }

    #[test]
    fn test_low_class_falls_back_to_first_rack() {
        let config = CompilerConfig::default();
        let d = deck(&[(3, "opentrons_96_tiprack_300ul"), (4, "opentrons_96_tiprack_20ul")]);
        let rig = ToolRig::from_deck(&d, &config).unwrap();
        assert_eq!(
            rig.mount(ToolClass::Low).unwrap().racks,
            vec!["tiprack_300ul_3".to_string()]
        );
        assert!(rig.mount(ToolClass::High).is_none());
    }

    #[test]
    fn test_both_classes_loaded() {
        let config = CompilerConfig::default();
        let d = deck(&[
            (10, "opentrons_96_filtertiprack_200ul"),
            (7, "opentrons_96_tiprack_1000ul"),
        ]);
        let rig = ToolRig::from_deck(&d, &config).unwrap();
        assert_eq!(rig.mounts().count(), 2);
        assert_eq!(rig.select(200.0), Some(ToolClass::Low));
        assert_eq!(rig.select(200.5), Some(ToolClass::High));
    }

    #[test]
    fn test_large_volume_stays_low_without_high_class() {
        let config = CompilerConfig::default();
        let d = deck(&[(10, "opentrons_96_filtertiprack_200ul")]);
        let rig = ToolRig::from_deck(&d, &config).unwrap();
        assert_eq!(rig.select(5000.0), Some(ToolClass::Low));
    }

    #[test]
    fn test_empty_rig_selects_nothing() {
        let rig = ToolRig::new(None, None);
        assert_eq!(rig.select(10.0), None);
    }
}
