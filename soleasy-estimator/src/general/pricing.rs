use soleasy_model::investment::InvestmentCost;
use soleasy_model::kit::{
    BatteryCapacity, Configuration, FlexibleCount, Installation, PanelArray, RigidCount, Services,
};
use tracing::debug;

pub const VAT_RATE: f64 = 0.10;

// Service prices (EUR)
pub const REGISTRATION_PRICE: f64 = 80.0; // Registration with the grid operator
pub const COMPLIANCE_PRICE: f64 = 350.0; // Compliance declaration

pub fn battery_price(capacity: BatteryCapacity) -> f64 {
    match capacity {
        BatteryCapacity::Kwh2_5 => 1400.0,
        BatteryCapacity::Kwh5 => 2200.0,
    }
}

pub fn panel_price(panel: PanelArray) -> f64 {
    match panel {
        PanelArray::Rigid(RigidCount::Four) => 850.0,
        PanelArray::Rigid(RigidCount::Six) => 1275.0,
        PanelArray::Rigid(RigidCount::Eight) => 1700.0,
        PanelArray::Flexible(FlexibleCount::Four) => 850.0,
        PanelArray::Flexible(FlexibleCount::Eight) => 1700.0,
        PanelArray::Flexible(FlexibleCount::Twelve) => 2550.0,
    }
}

pub fn installation_price(installation: Installation) -> f64 {
    match installation {
        Installation::None => 0.0,
        Installation::Garden => 150.0,
        Installation::Balcony => 250.0,
        Installation::Canopy => 300.0,
        Installation::Roof => 400.0,
    }
}

pub fn services_price(services: &Services) -> f64 {
    let registration = if services.registration {
        REGISTRATION_PRICE
    } else {
        0.0
    };
    let compliance = if services.compliance {
        COMPLIANCE_PRICE
    } else {
        0.0
    };
    registration + compliance + installation_price(services.installation)
}

/// Prices a kit configuration: hardware, services and VAT.
pub fn compute_investment(config: &Configuration) -> InvestmentCost {
    let hardware_cost = battery_price(config.battery) + panel_price(config.panel);
    let services_cost = services_price(&config.services);
    let subtotal = hardware_cost + services_cost;
    let total = subtotal * (1.0 + VAT_RATE);
    let vat = total - subtotal;

    debug!(
        hardware_cost,
        services_cost, subtotal, total, "computed investment cost"
    );

    InvestmentCost {
        hardware_cost,
        services_cost,
        subtotal,
        vat,
        total,
    }
}
