use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{audit::AuditEntry, state::BatteryState, submission::Side},
    quantity::{energy::MegawattHours, price::MegawattHourRate},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn price_cell(price: Option<MegawattHourRate>) -> Cell {
    price.map_or_else(
        || Cell::new("-").add_attribute(Attribute::Dim),
        |price| Cell::new(price).set_alignment(CellAlignment::Right),
    )
}

fn energy_cell(energy: MegawattHours) -> Cell {
    Cell::new(energy).set_alignment(CellAlignment::Right)
}

pub fn build_audit_table(trail: &[AuditEntry]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Date", "Start", "Target", "Charge", "Import", "Export", "Bid", "Offer", "Trade", "Volume",
        "Price", "Result",
    ]);
    for entry in trail {
        let pair = &entry.submitted_bid_offer_pair;
        let (trade, volume, price, color) = match pair.side() {
            Some(Side::Bid) => {
                (Cell::new("bid"), pair.bid_volume, Some(pair.bid_price), Color::Green)
            }
            Some(Side::Offer) => {
                (Cell::new("offer"), pair.offer_volume, Some(pair.offer_price), Color::Red)
            }
            None => (Cell::new("-"), MegawattHours::ZERO, None, Color::Reset),
        };
        let accepted = entry.bid_accepted || entry.offer_accepted;
        table.add_row(vec![
            Cell::new(entry.simulation_timestamp.start().format("%b %d"))
                .add_attribute(Attribute::Dim),
            Cell::new(entry.simulation_timestamp.start().format("%H:%M")),
            Cell::new(pair.settlement_period_start_time.start().format("%H:%M"))
                .add_attribute(Attribute::Dim),
            energy_cell(entry.battery_state_of_charge),
            energy_cell(entry.total_energy_imported_on_current_day),
            energy_cell(entry.total_energy_exported_on_current_day),
            price_cell(entry.bid_price_prediction),
            price_cell(entry.offer_price_prediction),
            trade.fg(color),
            energy_cell(volume),
            price_cell(price),
            match (pair.side(), accepted) {
                (None, _) => Cell::new(""),
                (Some(_), true) => Cell::new("accepted").fg(Color::Green),
                (Some(_), false) => Cell::new("rejected").fg(Color::DarkYellow),
            },
        ]);
    }
    table
}

pub fn build_state_table(state: &BatteryState) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Period", "Charge", "Import", "Export", "Total import", "Total export"]);
    table.add_row(vec![
        Cell::new(state.period),
        energy_cell(state.charge_level),
        energy_cell(state.same_day_import),
        energy_cell(state.same_day_export),
        energy_cell(state.cumulative_import),
        energy_cell(state.cumulative_export),
    ]);
    table
}
