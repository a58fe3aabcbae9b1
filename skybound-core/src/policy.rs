use serde::{Deserialize, Serialize};

/// How seat deductions are written back to the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InventoryGuard {
    /// One atomic "decrement where count >= N" per flight. Concurrent bookings
    /// cannot oversell a cabin.
    #[default]
    Conditional,
    /// Write back `validated count - N` computed from the validation snapshot.
    /// Two concurrent bookings can both pass validation and oversell.
    Legacy,
}

/// Tunables of the booking workflow, loaded from the `booking` config section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingPolicy {
    #[serde(default)]
    pub inventory_guard: InventoryGuard,
    /// Give seats back when a booking is cancelled.
    #[serde(default)]
    pub restore_inventory_on_cancel: bool,
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,
    /// Attempts at inserting a booking before a reference collision becomes a failure.
    #[serde(default = "default_reference_attempts")]
    pub reference_attempts: u32,
}

fn default_reference_prefix() -> String {
    "SBJ-".to_string()
}

fn default_reference_attempts() -> u32 {
    3
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            inventory_guard: InventoryGuard::default(),
            restore_inventory_on_cancel: false,
            reference_prefix: default_reference_prefix(),
            reference_attempts: default_reference_attempts(),
        }
    }
}
