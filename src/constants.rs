//! Sensor Constants
//!
//! This module defines constants for the wire format and timing behavior to
//! avoid magic values throughout the codebase.

/// Wire-format constants shared by readings and envelopes
pub mod wire {
    /// Application name stamped on every reading and envelope
    pub const APP_NAME: &str = "VirtualSensorB";

    /// Deployment type reported in reading metadata
    pub const DEPLOYMENT_TYPE: &str = "virtual";

    /// Broker topic readings are published to
    pub const INGEST_TOPIC: &str = "data/ingest";

    /// Display name of the temperature metric
    pub const TEMPERATURE_DISPLAY_NAME: &str = "vtp";

    /// Unit of the temperature metric (degrees Fahrenheit)
    pub const TEMPERATURE_UNIT: &str = "F";

    /// Display name of the distance metric
    pub const DISTANCE_DISPLAY_NAME: &str = "sus";

    /// Unit of the distance metric (centimeters)
    pub const DISTANCE_UNIT: &str = "cm";
}

/// Numeric ranges for synthetic readings
pub mod ranges {
    /// Lower bound of the temperature range, inclusive
    pub const TEMPERATURE_MIN: f64 = 60.0;

    /// Upper bound of the temperature range, exclusive
    pub const TEMPERATURE_MAX: f64 = 80.0;

    /// Upper bound of the distance range in centimeters, exclusive
    pub const DISTANCE_MAX: i64 = 30;
}

/// Timing and capacity defaults
pub mod defaults {
    use std::time::Duration;

    /// Cadence of the publish loop
    pub const PUBLISH_INTERVAL: Duration = Duration::from_millis(5_000);

    /// MQTT keep-alive interval
    pub const KEEP_ALIVE: Duration = Duration::from_secs(30);

    /// Delay before re-polling the MQTT event loop after a connection error
    pub const POLL_RETRY_DELAY: Duration = Duration::from_millis(250);

    /// Capacity of the transport event channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 32;
}

/// Cognito identity-provider protocol constants
pub mod cognito {
    /// Content type for AWS JSON 1.1 requests
    pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

    /// Target header value selecting the InitiateAuth operation
    pub const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";

    /// Authentication flow carrying username and password directly
    pub const AUTH_FLOW: &str = "USER_PASSWORD_AUTH";
}
