//! Error type shared by the driver, the UI and the collaborators.
//!
//! Variants are plain tags so the type is `Copy` and logs through `defmt`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Display
    /// The controller kept its busy flag set for the whole poll budget.
    /// Usually a wiring fault or an unpowered display.
    DisplayTimeout,

    // Network collaborators
    /// Joining the selected Wi-Fi network failed.
    ConnectFailed,

    /// The data request could not be sent or got no response.
    RequestFailed,

    /// The server answered but the snapshot could not be extracted.
    InvalidPayload,

    // UI
    /// Collected keypad digits did not form a number.
    InvalidNumber,

    // Storage
    /// Flash read/write/erase failed.
    Storage,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}
