use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Storage capacity of the battery shipped with the kit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS,
)]
#[ts(export, export_to = "./kit.ts")]
pub enum BatteryCapacity {
    /// 2.5 kWh, sized for a basic household load.
    #[default]
    #[serde(rename = "2.5")]
    Kwh2_5,
    /// 5 kWh, maximises self-consumption.
    #[serde(rename = "5")]
    Kwh5,
}

impl BatteryCapacity {
    pub fn kwh(self) -> f64 {
        match self {
            BatteryCapacity::Kwh2_5 => 2.5,
            BatteryCapacity::Kwh5 => 5.0,
        }
    }
}

/// Panel technology offered with the kit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "./kit.ts")]
pub enum PanelType {
    /// 430 Wp framed panels, about 2 m² each.
    #[default]
    Rigid,
    /// 220 Wp flexible panels, about 1 m² each.
    Flexible,
}

impl PanelType {
    /// Nameplate power of a single panel in watts.
    pub fn watts_per_panel(self) -> u32 {
        match self {
            PanelType::Rigid => 430,
            PanelType::Flexible => 220,
        }
    }

    /// Surface needed by a single panel in square metres.
    pub fn area_per_panel_sqm(self) -> u32 {
        match self {
            PanelType::Rigid => 2,
            PanelType::Flexible => 1,
        }
    }

    /// Panel counts sold for this panel type.
    pub fn allowed_counts(self) -> &'static [u8] {
        match self {
            PanelType::Rigid => &[4, 6, 8],
            PanelType::Flexible => &[4, 8, 12],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PanelType::Rigid => "rigid",
            PanelType::Flexible => "flexible",
        }
    }
}

impl fmt::Display for PanelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RigidCount {
    Four,
    Six,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlexibleCount {
    Four,
    Eight,
    Twelve,
}

/// Raised when a panel selection coming from outside does not match the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{count} {panel_type} panels are not offered (allowed counts: {allowed:?})")]
    UnsupportedPanelCount {
        panel_type: PanelType,
        count: u8,
        allowed: &'static [u8],
    },
}

/// Wire form of a panel choice, as exchanged with the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./kit.ts")]
pub struct PanelSelection {
    #[serde(rename = "type")]
    pub panel_type: PanelType,
    pub count: u8,
}

/// A panel array from the catalogue.
///
/// Only the counts sold for each panel type can be represented, so every
/// `PanelArray` has a price and a wattage. Raw `(type, count)` pairs are
/// checked once, at the boundary, by [`PanelArray::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PanelSelection", into = "PanelSelection")]
pub enum PanelArray {
    Rigid(RigidCount),
    Flexible(FlexibleCount),
}

impl Default for PanelArray {
    fn default() -> Self {
        PanelArray::Rigid(RigidCount::Four)
    }
}

impl PanelArray {
    pub fn new(panel_type: PanelType, count: u8) -> Result<Self, ConfigurationError> {
        let array = match (panel_type, count) {
            (PanelType::Rigid, 4) => Some(PanelArray::Rigid(RigidCount::Four)),
            (PanelType::Rigid, 6) => Some(PanelArray::Rigid(RigidCount::Six)),
            (PanelType::Rigid, 8) => Some(PanelArray::Rigid(RigidCount::Eight)),
            (PanelType::Flexible, 4) => Some(PanelArray::Flexible(FlexibleCount::Four)),
            (PanelType::Flexible, 8) => Some(PanelArray::Flexible(FlexibleCount::Eight)),
            (PanelType::Flexible, 12) => Some(PanelArray::Flexible(FlexibleCount::Twelve)),
            _ => None,
        };

        array.ok_or(ConfigurationError::UnsupportedPanelCount {
            panel_type,
            count,
            allowed: panel_type.allowed_counts(),
        })
    }

    pub fn panel_type(self) -> PanelType {
        match self {
            PanelArray::Rigid(_) => PanelType::Rigid,
            PanelArray::Flexible(_) => PanelType::Flexible,
        }
    }

    pub fn count(self) -> u8 {
        match self {
            PanelArray::Rigid(RigidCount::Four) => 4,
            PanelArray::Rigid(RigidCount::Six) => 6,
            PanelArray::Rigid(RigidCount::Eight) => 8,
            PanelArray::Flexible(FlexibleCount::Four) => 4,
            PanelArray::Flexible(FlexibleCount::Eight) => 8,
            PanelArray::Flexible(FlexibleCount::Twelve) => 12,
        }
    }

    /// Peak power of the whole array in watts.
    pub fn peak_watts(self) -> u32 {
        u32::from(self.count()) * self.panel_type().watts_per_panel()
    }

    /// Peak power of the whole array in kWp, the unit the projection works in.
    pub fn peak_kw(self) -> f64 {
        f64::from(self.peak_watts()) / 1000.0
    }

    /// Installation surface the user needs to have available.
    pub fn required_area_sqm(self) -> u32 {
        u32::from(self.count()) * self.panel_type().area_per_panel_sqm()
    }

    /// Switches panel technology, keeping the count when the new type sells it.
    ///
    /// Rigid panels are not sold in twelves and flexible panels are not sold in
    /// sixes; those counts move to the nearest count of the new type.
    pub fn switch_type(self, panel_type: PanelType) -> Self {
        match (self, panel_type) {
            (PanelArray::Rigid(_), PanelType::Rigid)
            | (PanelArray::Flexible(_), PanelType::Flexible) => self,
            (PanelArray::Rigid(count), PanelType::Flexible) => PanelArray::Flexible(match count {
                RigidCount::Four | RigidCount::Six => FlexibleCount::Four,
                RigidCount::Eight => FlexibleCount::Eight,
            }),
            (PanelArray::Flexible(count), PanelType::Rigid) => PanelArray::Rigid(match count {
                FlexibleCount::Four => RigidCount::Four,
                FlexibleCount::Eight | FlexibleCount::Twelve => RigidCount::Eight,
            }),
        }
    }
}

impl TryFrom<PanelSelection> for PanelArray {
    type Error = ConfigurationError;

    fn try_from(selection: PanelSelection) -> Result<Self, Self::Error> {
        PanelArray::new(selection.panel_type, selection.count)
    }
}

impl From<PanelArray> for PanelSelection {
    fn from(array: PanelArray) -> Self {
        PanelSelection {
            panel_type: array.panel_type(),
            count: array.count(),
        }
    }
}

/// Where the installer mounts the panels.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "./kit.ts")]
pub enum Installation {
    /// The user mounts the kit themselves.
    #[default]
    None,
    Garden,
    Balcony,
    /// Ground-floor canopy.
    Canopy,
    Roof,
}

impl Installation {
    pub fn label(self) -> &'static str {
        match self {
            Installation::None => "none",
            Installation::Garden => "garden",
            Installation::Balcony => "balcony",
            Installation::Canopy => "canopy",
            Installation::Roof => "roof",
        }
    }
}

/// Optional services bought together with the hardware.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS,
)]
#[ts(export, export_to = "./kit.ts")]
pub struct Services {
    /// Registration of the plant with the grid operator.
    pub registration: bool,
    /// Electrical compliance declaration for the existing wiring.
    pub compliance: bool,
    pub installation: Installation,
}

/// The kit the user is configuring.
///
/// Held for the session only; every user action replaces it with a new value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS,
)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "./kit.ts")]
pub struct Configuration {
    #[serde(rename = "batteryCapacityKwh")]
    pub battery: BatteryCapacity,
    #[schema(value_type = PanelSelection)]
    #[ts(as = "PanelSelection")]
    pub panel: PanelArray,
    pub services: Services,
}

impl Configuration {
    /// Returns the configuration with the panel type switched, re-clamping the count.
    pub fn with_panel_type(self, panel_type: PanelType) -> Self {
        Configuration {
            panel: self.panel.switch_type(panel_type),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();
        assert_eq!(config.battery, BatteryCapacity::Kwh2_5);
        assert_eq!(config.panel.panel_type(), PanelType::Rigid);
        assert_eq!(config.panel.count(), 4);
        assert!(!config.services.registration);
        assert!(!config.services.compliance);
        assert_eq!(config.services.installation, Installation::None);
    }

    #[test]
    fn test_panel_array_rejects_counts_outside_catalogue() {
        assert!(PanelArray::new(PanelType::Rigid, 12).is_err());
        assert!(PanelArray::new(PanelType::Flexible, 6).is_err());
        assert!(PanelArray::new(PanelType::Rigid, 5).is_err());

        let err = PanelArray::new(PanelType::Flexible, 6).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnsupportedPanelCount {
                panel_type: PanelType::Flexible,
                count: 6,
                allowed: &[4, 8, 12],
            }
        );
    }

    #[test]
    fn test_every_allowed_count_round_trips() {
        for panel_type in [PanelType::Rigid, PanelType::Flexible] {
            for &count in panel_type.allowed_counts() {
                let array = PanelArray::new(panel_type, count).unwrap();
                assert_eq!(array.panel_type(), panel_type);
                assert_eq!(array.count(), count);
            }
        }
    }

    #[test]
    fn test_peak_power_and_area() {
        let rigid = PanelArray::new(PanelType::Rigid, 4).unwrap();
        assert_eq!(rigid.peak_watts(), 1720);
        assert_eq!(rigid.peak_kw(), 1.72);
        assert_eq!(rigid.required_area_sqm(), 8);

        let flexible = PanelArray::new(PanelType::Flexible, 12).unwrap();
        assert_eq!(flexible.peak_watts(), 2640);
        assert_eq!(flexible.required_area_sqm(), 12);
    }

    #[test]
    fn test_switch_type_clamps_unsold_counts() {
        let six_rigid = PanelArray::new(PanelType::Rigid, 6).unwrap();
        assert_eq!(six_rigid.switch_type(PanelType::Flexible).count(), 4);

        let twelve_flexible = PanelArray::new(PanelType::Flexible, 12).unwrap();
        let switched = twelve_flexible.switch_type(PanelType::Rigid);
        assert_eq!(switched.panel_type(), PanelType::Rigid);
        assert_eq!(switched.count(), 8);
    }

    #[test]
    fn test_switch_type_preserves_shared_counts() {
        for count in [4, 8] {
            let rigid = PanelArray::new(PanelType::Rigid, count).unwrap();
            let flexible = rigid.switch_type(PanelType::Flexible);
            assert_eq!(flexible.panel_type(), PanelType::Flexible);
            assert_eq!(flexible.count(), count);
            assert_eq!(flexible.switch_type(PanelType::Rigid), rigid);
        }

        let rigid = PanelArray::new(PanelType::Rigid, 6).unwrap();
        assert_eq!(rigid.switch_type(PanelType::Rigid), rigid);
    }

    #[test]
    fn test_configuration_serde_uses_selection_wire_form() {
        let config = Configuration::default().with_panel_type(PanelType::Flexible);
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["batteryCapacityKwh"], "2.5");
        assert_eq!(json["panel"]["type"], "flexible");
        assert_eq!(json["panel"]["count"], 4);
        assert_eq!(json["services"]["installation"], "none");

        let back: Configuration = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_configuration_deserialize_rejects_invalid_panel_pair() {
        let json = r#"{
            "batteryCapacityKwh": "5",
            "panel": { "type": "rigid", "count": 12 },
            "services": { "registration": true, "compliance": false, "installation": "roof" }
        }"#;
        let result: Result<Configuration, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
