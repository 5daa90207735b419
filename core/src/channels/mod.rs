pub mod position;
pub mod rf;
pub mod system;

pub use position::{OrientationReading, PositionReading};
pub use rf::{Band, DeviceType, DirectionEstimate, RfDevice};
pub use system::{SystemTelemetry, Temperature};
