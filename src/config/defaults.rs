//! Default value functions for configuration.

pub fn default_name() -> String {
    "Dappcord".to_string()
}

pub fn default_symbol() -> String {
    "DC".to_string()
}

/// Decimal places of the payment unit, as for ether.
pub fn default_decimals() -> u32 {
    18
}

pub fn default_queue_capacity() -> usize {
    256
}
