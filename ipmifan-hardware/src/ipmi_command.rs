//! Vendor raw IPMI commands used to drive the fans
//!
//! The governor only needs three OEM commands (0x30 0x30 family):
//! switching fan control to manual, handing it back to the board, and setting
//! the duty cycle of all fans at once.

use std::fmt;

/// Raw fan-control commands understood by the BMC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpmiCommand {
    /// Take over fan control (`raw 0x30 0x30 0x01 0x00`)
    EnableManual,
    /// Give fan control back to the board (`raw 0x30 0x30 0x01 0x01`)
    RestoreAutomatic,
    /// Set every fan to the given percentage (`raw 0x30 0x30 0x02 0xff 0xNN`)
    SetDutyCycle(u8),
}

/// Encode a percentage the way the BMC expects it: `0x`-prefixed, two hex digits.
///
/// - 9 → `0x09`
/// - 15 → `0x0f`
/// - 100 → `0x64`
#[inline]
pub fn duty_cycle_hex(percent: u8) -> String {
    format!("{:#04x}", percent)
}

impl IpmiCommand {
    /// Arguments passed to `ipmitool`, starting with `raw`.
    pub fn args(&self) -> Vec<String> {
        let bytes: &[&str] = match self {
            IpmiCommand::EnableManual => &["0x30", "0x30", "0x01", "0x00"],
            IpmiCommand::RestoreAutomatic => &["0x30", "0x30", "0x01", "0x01"],
            IpmiCommand::SetDutyCycle(_) => &["0x30", "0x30", "0x02", "0xff"],
        };

        let mut args = Vec::with_capacity(bytes.len() + 2);
        args.push("raw".to_string());
        args.extend(bytes.iter().map(|b| b.to_string()));
        if let IpmiCommand::SetDutyCycle(percent) = self {
            args.push(duty_cycle_hex(*percent));
        }
        args
    }
}

impl fmt::Display for IpmiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}
