//! Routes change events to sensor state publishes.
//!
//! Every change event produces exactly one publish attempt; values are not
//! deduplicated, so rewriting a file with the same content republishes it.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::sensor::Sensor;
use crate::session::BusSession;
use crate::watcher::ChangeEvent;

/// Resolve a change event to its routing decision.
///
/// Returns the sensor and the trimmed value, or `None` for file names
/// outside the watched set.
pub fn route(event: &ChangeEvent) -> Option<(Sensor, &str)> {
    let sensor = Sensor::from_file_name(&event.file_name)?;
    Some((sensor, event.content.trim()))
}

/// Consume change events until the channel closes.
///
/// Publish failures are logged and never stop the loop; the next event gets
/// its own attempt.
pub async fn run(mut events: mpsc::Receiver<ChangeEvent>, bus: Arc<BusSession>) {
    while let Some(event) = events.recv().await {
        let Some((sensor, value)) = route(&event) else {
            tracing::warn!(file = %event.file_name, "Dropping event for unknown file");
            continue;
        };

        if let Err(e) = bus.publish_state(sensor, value).await {
            tracing::warn!(sensor = %sensor, error = %e, "Failed to publish state");
        }
    }

    tracing::debug!("Change event channel closed, router stopping");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(file_name: &str, content: &str) -> ChangeEvent {
        ChangeEvent {
            file_name: file_name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_route_maps_every_sensor() {
        for sensor in Sensor::ALL {
            let change = event(sensor.file_name(), "value");
            assert_eq!(route(&change), Some((sensor, "value")));
        }
    }

    #[test]
    fn test_route_trims_value() {
        assert_eq!(
            route(&event("CORENAME", "SuperFamicom\n")),
            Some((Sensor::CoreName, "SuperFamicom"))
        );
        assert_eq!(
            route(&event("ACTIVEGAME", "  /media/fat/games/smw.sfc \t\n")),
            Some((Sensor::ActiveGame, "/media/fat/games/smw.sfc"))
        );
    }

    #[test]
    fn test_route_empty_content() {
        assert_eq!(route(&event("RBFNAME", "\n")), Some((Sensor::RbfName, "")));
    }

    #[test]
    fn test_route_rejects_unknown_file() {
        assert_eq!(route(&event("VIDEOMODE", "1080p")), None);
        assert_eq!(route(&event("corename", "lowercase")), None);
    }
}
