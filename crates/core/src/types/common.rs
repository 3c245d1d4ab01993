//! Shared traits and display formatting

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns true if the instance is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Formats a millisecond position as `mm:ss`
///
/// Minutes are not wrapped into hours; a 75 minute track shows `75:00`.
pub fn format_time(millis: u64) -> String {
    let total_seconds = millis / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

/// Formats a playback speed for display: `1` for whole values, `1.5` otherwise
pub fn format_speed(speed: f32) -> String {
    if speed.fract() == 0.0 {
        format!("{}", speed as i64)
    } else {
        format!("{}", speed)
    }
}
